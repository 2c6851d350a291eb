use jiff::civil::Date;
use tracing::{info, warn};

use crate::calculation::aggregate::aggregate_costs;
use crate::calculation::interval::{
    DateRange, Granularity, interval_start, month_name, split_into_buckets,
};
use crate::calculation::usage_report::{FinalReport, assemble_report};
use crate::config::billing_cycle::{BillingCycle, CostColumns};
use crate::error::Error;
use crate::io::locator::{Container, locate_objects};
use crate::io::store::ObjectStore;
use crate::prelude::*;

/// Everything one report run needs to know, besides the store.
#[derive(Debug, Clone)]
pub struct ReportRequest {
    /// Any date inside the month to report on.
    pub date: Date,
    pub client_id: String,
    pub monthly: Container,
    pub daily: Container,
    pub cycle: BillingCycle,
    pub columns: CostColumns,
}

impl ReportRequest {
    /// Same request, another month.
    pub fn for_date(&self, date: Date) -> Self {
        ReportRequest {
            date,
            ..self.clone()
        }
    }
}

/// Locate, aggregate and merge. Nothing is written anywhere.
pub fn compute_report(store: &dyn ObjectStore, request: &ReportRequest) -> AppResult<FinalReport> {
    let official_files = locate_objects(
        store,
        &request.monthly,
        request.date,
        &request.client_id,
        &request.cycle,
    )?;
    let official = aggregate_costs(
        store,
        &request.monthly,
        &official_files,
        &request.cycle,
        &request.columns,
    )?;

    let daily_files = locate_objects(
        store,
        &request.daily,
        request.date,
        &request.client_id,
        &request.cycle,
    )?;
    let daily = aggregate_costs(
        store,
        &request.daily,
        &daily_files,
        &request.cycle,
        &request.columns,
    )?;

    let report = assemble_report(official, daily, &month_name(request.date))?;

    Ok(report)
}

/// Stores the report as `{prefix}{MonthName}.csv` and returns the object name.
pub fn persist_report(
    store: &dyn ObjectStore,
    container: &str,
    prefix: &str,
    report: &FinalReport,
) -> AppResult<String> {
    let name = format!("{}{}", prefix, report.file_name());
    let content = report.to_csv()?;

    store
        .write(container, &name, content.as_bytes())
        .wrap_err_with(|| format!("Failed to store report '{}'", name))?;

    info!(container, object = %name, total = report.total(), "Report stored");

    Ok(name)
}

/// One report per calendar month touched by `range`.
///
/// A month without any official file has no data, it is logged and left out instead of failing
/// the whole range. Every other error still aborts the run.
pub fn compute_range(
    store: &dyn ObjectStore,
    template: &ReportRequest,
    range: DateRange,
) -> AppResult<Vec<FinalReport>> {
    let mut reports = vec![];
    let first_month = interval_start(range.start(), Granularity::Month)?;

    for bucket in split_into_buckets(first_month, range.end(), 1)? {
        let request = template.for_date(bucket.start());

        match compute_report(store, &request) {
            Ok(report) => reports.push(report),

            Err(report_error)
                if matches!(
                    report_error.downcast_ref::<Error>(),
                    Some(Error::EmptyOfficialMap)
                ) =>
            {
                warn!(
                    month = %month_name(bucket.start()),
                    client = %request.client_id,
                    "No official data for this period"
                );
            }

            Err(report_error) => return Err(report_error),
        }
    }

    Ok(reports)
}
