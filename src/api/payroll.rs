use std::str::FromStr;

use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

use crate::PayrollEngine;
use crate::auth::AuthUser;
use crate::error::PayrollError;
use crate::model::money::{json_kind, parse_amount, parse_amount_or_zero};
use crate::model::payroll::PaymentInput;
use crate::model::period::PayPeriod;
use crate::model::view::{BatchOutcome, DeletedPayment, DeletedPeriod, MonthlyGroup, PayrollView};
use crate::payroll::period::{parse_date, resolve_period, today_utc};

/// One employee's entry in a batch. Amounts are whole currency units and may
/// be sent as numbers or numeric strings; blank or `null` means omitted.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PaymentInputRequest {
    #[schema(example = 1)]
    pub employee_id: u64,

    #[schema(example = 6, value_type = i64)]
    #[serde(default)]
    pub days_worked: Option<Value>,

    /// Defaults to the employee's weekly allowance when omitted on a six-day week.
    #[schema(example = json!(null), value_type = Option<i64>)]
    #[serde(default)]
    pub base_allowance: Option<Value>,

    #[schema(example = 0, value_type = Option<i64>)]
    #[serde(default)]
    pub extra_allowance: Option<Value>,

    #[schema(example = 0, value_type = Option<i64>)]
    #[serde(default)]
    pub loan_deduction: Option<Value>,
}

impl TryFrom<PaymentInputRequest> for PaymentInput {
    type Error = PayrollError;

    fn try_from(req: PaymentInputRequest) -> Result<Self, Self::Error> {
        Ok(PaymentInput {
            employee_id: req.employee_id,
            days_worked: parse_days_worked(req.days_worked.as_ref())?,
            base_allowance: parse_amount("base_allowance", req.base_allowance.as_ref())?,
            extra_allowance: parse_amount_or_zero("extra_allowance", req.extra_allowance.as_ref())?,
            loan_deduction: parse_amount_or_zero("loan_deduction", req.loan_deduction.as_ref())?,
        })
    }
}

fn parse_days_worked(value: Option<&Value>) -> Result<i64, PayrollError> {
    let invalid = |v: &Value| PayrollError::InvalidDaysWorked(v.to_string());

    match value {
        None | Some(Value::Null) => Err(PayrollError::InvalidDaysWorked("nothing".into())),
        Some(v @ Value::Number(n)) => n
            .as_i64()
            .or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && f.abs() <= 1e9)
                    .map(|f| f as i64)
            })
            .ok_or_else(|| invalid(v)),
        Some(v @ Value::String(s)) => s.trim().parse::<i64>().map_err(|_| invalid(v)),
        Some(v) => Err(PayrollError::InvalidDaysWorked(json_kind(v).to_string())),
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PayrollBatchRequest {
    /// Omit both dates to use the current Monday..Sunday week (UTC).
    #[schema(example = "2025-09-01", nullable = true)]
    pub week_start: Option<String>,

    #[schema(example = "2025-09-07", nullable = true)]
    pub week_end: Option<String>,

    #[serde(default)]
    pub employee_payments: Vec<PaymentInputRequest>,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct PeriodQuery {
    #[schema(example = "2025-09-01")]
    pub week_start: String,

    #[schema(example = "2025-09-07")]
    pub week_end: String,
}

impl PeriodQuery {
    fn period(&self) -> Result<PayPeriod, PayrollError> {
        PayPeriod::new(parse_date(&self.week_start)?, parse_date(&self.week_end)?)
    }
}

/// Target of `DELETE /payrolls/{key}`: a payment id or a period key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayrollKey {
    Payment(u64),
    Period(PayPeriod),
}

impl FromStr for PayrollKey {
    type Err = PayrollError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(id) = s.parse::<u64>() {
            return Ok(PayrollKey::Payment(id));
        }
        if s.contains('_') {
            return s.parse().map(PayrollKey::Period);
        }
        Err(PayrollError::InvalidPeriod(format!(
            "'{s}' is neither a payment id nor a period key"
        )))
    }
}

#[utoipa::path(
    post,
    path = "/api/payrolls",
    request_body = PayrollBatchRequest,
    responses(
        (status = 201, description = "Batch applied; see status for skipped employees", body = BatchOutcome),
        (status = 400, description = "Empty batch, invalid period, days or amounts"),
        (status = 401),
        (status = 403)
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn submit_payroll(
    auth: AuthUser,
    engine: web::Data<PayrollEngine>,
    payload: web::Json<PayrollBatchRequest>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let payload = payload.into_inner();
    if payload.employee_payments.is_empty() {
        return Err(PayrollError::EmptyBatch.into());
    }

    let period = resolve_period(
        payload.week_start.as_deref(),
        payload.week_end.as_deref(),
        today_utc(),
    )?;

    let inputs = payload
        .employee_payments
        .into_iter()
        .map(PaymentInput::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    let outcome = engine.process_batch(&period, &inputs).await?;
    info!(
        user_id = auth.user_id,
        user = %auth.username,
        period = %period,
        status = ?outcome.status,
        "Payroll submitted"
    );

    Ok(HttpResponse::Created().json(outcome))
}

#[utoipa::path(
    get,
    path = "/api/payrolls",
    responses(
        (status = 200, description = "All periods, most recent first", body = [PayrollView])
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn list_payrolls(
    _auth: AuthUser,
    engine: web::Data<PayrollEngine>,
) -> actix_web::Result<impl Responder> {
    let views = engine.list_periods().await?;
    Ok(HttpResponse::Ok().json(views))
}

#[utoipa::path(
    get,
    path = "/api/payrolls/monthly",
    responses(
        (status = 200, description = "Periods grouped by month of week_start", body = [MonthlyGroup])
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn monthly_payrolls(
    _auth: AuthUser,
    engine: web::Data<PayrollEngine>,
) -> actix_web::Result<impl Responder> {
    let groups = engine.monthly_summary().await?;
    Ok(HttpResponse::Ok().json(groups))
}

#[utoipa::path(
    get,
    path = "/api/payrolls/period",
    params(PeriodQuery),
    responses(
        (status = 200, body = PayrollView),
        (status = 400, description = "Invalid period")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn get_payroll_period(
    _auth: AuthUser,
    engine: web::Data<PayrollEngine>,
    query: web::Query<PeriodQuery>,
) -> actix_web::Result<impl Responder> {
    let view = engine.get_period(&query.period()?).await?;
    Ok(HttpResponse::Ok().json(view))
}

#[utoipa::path(
    delete,
    path = "/api/payrolls/period",
    params(PeriodQuery),
    responses(
        (status = 200, body = DeletedPeriod),
        (status = 400, description = "Invalid period")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn delete_payroll_period(
    auth: AuthUser,
    engine: web::Data<PayrollEngine>,
    query: web::Query<PeriodQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let deleted = engine.delete_period(&query.period()?).await?;
    info!(
        user_id = auth.user_id,
        user = %auth.username,
        period = %deleted.id,
        deleted_count = deleted.deleted_count,
        "Payroll period deleted by request"
    );
    Ok(HttpResponse::Ok().json(deleted))
}

#[utoipa::path(
    delete,
    path = "/api/payrolls/{key}",
    params(
        ("key", description = "Payment id, or period key <week_start>_<week_end>")
    ),
    responses(
        (status = 200, description = "Row or period deleted", body = DeletedPayment),
        (status = 400, description = "Key is neither an id nor a period"),
        (status = 404, description = "Payment not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn delete_payroll(
    auth: AuthUser,
    engine: web::Data<PayrollEngine>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let key = path.parse::<PayrollKey>()?;
    info!(user_id = auth.user_id, user = %auth.username, ?key, "Payroll delete requested");

    let response = match key {
        PayrollKey::Payment(id) => {
            let deleted = engine.delete_payment(id).await?;
            HttpResponse::Ok().json(DeletedPayment { deleted })
        }
        PayrollKey::Period(period) => {
            let deleted = engine.delete_period(&period).await?;
            HttpResponse::Ok().json(deleted)
        }
    };

    Ok(response)
}
