use std::collections::BTreeMap;

use crate::error::PayrollError;
use crate::model::money::Money;
use crate::model::payroll::PaymentWithEmployee;
use crate::model::period::PayPeriod;
use crate::model::view::{MonthlyGroup, PaymentLine, PayrollView};

/// Build a period view from its stored rows, ordered by ascending payment id.
pub fn build_view(
    period: PayPeriod,
    mut rows: Vec<PaymentWithEmployee>,
) -> Result<PayrollView, PayrollError> {
    rows.sort_by_key(|r| r.payment.id);
    let lines = rows
        .into_iter()
        .map(PaymentLine::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    PayrollView::new(period, lines)
}

/// Group period views by the calendar month of their `week_start`.
///
/// Periods inside a group and the groups themselves are ordered most recent
/// first.
pub fn group_by_month(views: &[PayrollView]) -> Result<Vec<MonthlyGroup>, PayrollError> {
    let mut months: BTreeMap<(i32, u32), Vec<PayrollView>> = BTreeMap::new();
    for view in views {
        months.entry(view.period().month()).or_default().push(view.clone());
    }

    let mut groups = months
        .into_iter()
        .map(|((year, month), mut periods)| {
            periods.sort_by(|a, b| b.period().cmp(&a.period()));
            let label = format!("{year:04}-{month:02}");
            let total_payroll = Money::checked_sum(periods.iter().map(|p| p.total_payroll))
                .ok_or_else(|| PayrollError::overflow(format!("total_payroll for {label}")))?;
            Ok(MonthlyGroup {
                year,
                month,
                label,
                total_payroll,
                periods,
            })
        })
        .collect::<Result<Vec<_>, PayrollError>>()?;

    groups.sort_by(|a, b| latest_start(b).cmp(&latest_start(a)));
    Ok(groups)
}

fn latest_start(group: &MonthlyGroup) -> Option<chrono::NaiveDate> {
    group.periods.iter().map(|p| p.week_start).max()
}
