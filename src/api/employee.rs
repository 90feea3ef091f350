use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};
use utoipa::ToSchema;

use crate::PayrollEngine;
use crate::auth::AuthUser;
use crate::error::PayrollError;
use crate::model::employee::{Employee, NewEmployee};
use crate::model::money::parse_amount_or_zero;
use crate::store::StoreError;

#[derive(Debug, Deserialize, ToSchema)]
pub struct EmployeeRequest {
    #[schema(example = "Budi Santoso", value_type = String)]
    pub name: Option<String>,

    #[schema(example = "Frontend Developer", value_type = String)]
    pub position: Option<String>,

    #[schema(example = 600000, value_type = i64)]
    #[serde(default)]
    pub daily_rate: Option<Value>,

    #[schema(example = 300000, value_type = i64)]
    #[serde(default)]
    pub weekly_allowance: Option<Value>,

    /// Generated from the name when blank.
    #[schema(example = json!(null), nullable = true)]
    pub image_url: Option<String>,
}

impl TryFrom<EmployeeRequest> for NewEmployee {
    type Error = PayrollError;

    fn try_from(req: EmployeeRequest) -> Result<Self, Self::Error> {
        NewEmployee::new(
            req.name.as_deref().unwrap_or_default(),
            req.position.as_deref().unwrap_or_default(),
            parse_amount_or_zero("daily_rate", req.daily_rate.as_ref())?,
            parse_amount_or_zero("weekly_allowance", req.weekly_allowance.as_ref())?,
            req.image_url.as_deref(),
        )
    }
}

/// List Employees
#[utoipa::path(
    get,
    path = "/api/employees",
    responses(
        (status = 200, description = "Newest first", body = [Employee])
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn list_employees(
    _auth: AuthUser,
    engine: web::Data<PayrollEngine>,
) -> actix_web::Result<impl Responder> {
    let employees = engine
        .employees()
        .find_all()
        .await
        .map_err(PayrollError::from)?;

    Ok(HttpResponse::Ok().json(employees))
}

#[utoipa::path(
    get,
    path = "/api/employees/{id}",
    params(("id" = u64, Path, description = "Employee id")),
    responses(
        (status = 200, body = Employee),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn get_employee(
    _auth: AuthUser,
    engine: web::Data<PayrollEngine>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let id = path.into_inner();
    let employee = engine
        .employees()
        .find_by_id(id)
        .await
        .map_err(PayrollError::from)?
        .ok_or(PayrollError::EmployeeNotFound(id))?;

    Ok(HttpResponse::Ok().json(employee))
}

/// Create Employee
#[utoipa::path(
    post,
    path = "/api/employees",
    request_body = EmployeeRequest,
    responses(
        (status = 201, description = "Employee created", body = Employee),
        (status = 400, description = "Missing name or position, or invalid amount")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn create_employee(
    auth: AuthUser,
    engine: web::Data<PayrollEngine>,
    payload: web::Json<EmployeeRequest>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let new = NewEmployee::try_from(payload.into_inner())?;
    let employee = engine
        .employees()
        .create(new)
        .await
        .map_err(PayrollError::from)?;

    info!(
        user_id = auth.user_id,
        user = %auth.username,
        employee_id = employee.id,
        "Employee created"
    );
    Ok(HttpResponse::Created().json(employee))
}

#[utoipa::path(
    put,
    path = "/api/employees/{id}",
    params(("id" = u64, Path, description = "Employee id")),
    request_body = EmployeeRequest,
    responses(
        (status = 200, body = Employee),
        (status = 400, description = "Missing name or position, or invalid amount"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn update_employee(
    auth: AuthUser,
    engine: web::Data<PayrollEngine>,
    path: web::Path<u64>,
    payload: web::Json<EmployeeRequest>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let id = path.into_inner();
    let changes = NewEmployee::try_from(payload.into_inner())?;
    debug!(user_id = auth.user_id, employee_id = id, ?changes, "Updating employee");

    let employee = engine
        .employees()
        .update(id, changes)
        .await
        .map_err(PayrollError::from)?
        .ok_or(PayrollError::EmployeeNotFound(id))?;

    Ok(HttpResponse::Ok().json(employee))
}

#[utoipa::path(
    delete,
    path = "/api/employees/{id}",
    params(("id" = u64, Path, description = "Employee id")),
    responses(
        (status = 204, description = "Employee deleted"),
        (status = 404, description = "Employee not found"),
        (status = 409, description = "Employee still has payroll rows")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn delete_employee(
    auth: AuthUser,
    engine: web::Data<PayrollEngine>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let id = path.into_inner();
    match engine.employees().delete(id).await {
        Ok(true) => {
            info!(
                user_id = auth.user_id,
                user = %auth.username,
                employee_id = id,
                "Employee deleted"
            );
            Ok(HttpResponse::NoContent().finish())
        }
        Ok(false) => Err(PayrollError::EmployeeNotFound(id).into()),
        Err(StoreError::ForeignKeyViolation(_)) => {
            Err(PayrollError::EmployeeHasPayments(id).into())
        }
        Err(e) => Err(PayrollError::from(e).into()),
    }
}
