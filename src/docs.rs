use crate::api::employee::EmployeeRequest;
use crate::api::payroll::{PaymentInputRequest, PayrollBatchRequest, PeriodQuery};
use crate::model::employee::Employee;
use crate::model::period::PayPeriod;
use crate::model::view::{
    BatchOutcome, BatchStatus, DeletedPayment, DeletedPeriod, MonthlyGroup, PaymentLine,
    PayrollView,
};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Payroll API",
        version = "1.0.0",
        description = r#"
## Weekly Payroll

Records what each employee is owed for a pay period of at most seven days and
reconciles the stored rows back into per-period and per-month summaries.

### Pay rules
- `base_pay = days_worked * daily_rate`
- A six-day week with no `base_allowance` gets the employee's weekly allowance
- `total_pay = base_pay + base_allowance + extra_allowance - loan_deduction`
- One row per employee per period; resubmitting overwrites it

### Security
All `/api` endpoints expect a **JWT Bearer** token. Payroll writes need the
**Admin** or **HR** role, employee writes need **Admin**.

### Amounts
Whole currency units as integers. Numeric strings are accepted on input.
"#,
    ),
    paths(
        crate::api::health::health,

        crate::api::payroll::submit_payroll,
        crate::api::payroll::list_payrolls,
        crate::api::payroll::monthly_payrolls,
        crate::api::payroll::get_payroll_period,
        crate::api::payroll::delete_payroll_period,
        crate::api::payroll::delete_payroll,

        crate::api::employee::list_employees,
        crate::api::employee::get_employee,
        crate::api::employee::create_employee,
        crate::api::employee::update_employee,
        crate::api::employee::delete_employee
    ),
    components(
        schemas(
            PaymentInputRequest,
            PayrollBatchRequest,
            PeriodQuery,
            PayPeriod,
            PaymentLine,
            PayrollView,
            MonthlyGroup,
            BatchStatus,
            BatchOutcome,
            DeletedPayment,
            DeletedPeriod,
            Employee,
            EmployeeRequest
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Payroll", description = "Weekly payroll submission and history"),
        (name = "Employee", description = "Employee master data"),
        (name = "Health", description = "Service health"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
