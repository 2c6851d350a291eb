use std::collections::BTreeMap;

use tracing::{debug, info};

use super::interval::parse_report_date;
use crate::config::billing_cycle::{BillingCycle, CostColumns};
use crate::error::Error;
use crate::io::locator::{Container, DesiredFiles};
use crate::io::store::ObjectStore;
use crate::prelude::*;

/// Cells the usage exports use for "no value".
const MISSING_VALUE_TOKENS: [&str; 19] = [
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Same keys as [`DesiredFiles`] -> summed cost of that file.
pub type CostByKey = BTreeMap<String, f64>;

/// Sums the cost column over the rows dated inside the billing cycle window.
///
/// Empty or missing-value cost cells (`NA`, `NaN`, `null`...) count as nothing, infinite costs
/// are refused. A file without matching rows sums to 0.
pub fn sum_cost_rows(
    object_name: &str,
    content: &[u8],
    cycle: &BillingCycle,
    columns: &CostColumns,
) -> AppResult<f64> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(content);

    let headers = reader
        .headers()
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to read the header row of '{}'", object_name))?
        .clone();

    let column_index = |column: &str| -> Result<usize, Error> {
        headers
            .iter()
            .position(|header| header == column)
            .ok_or_else(|| Error::MissingColumn {
                object: object_name.to_owned(),
                column: column.to_owned(),
            })
    };

    let cost_index = column_index(columns.cost)?;
    let date_index = column_index(columns.date)?;

    reader
        .records()
        .try_fold(0.0, |summed, record| -> AppResult<f64> {
            let record = record
                .into_diagnostic()
                .wrap_err_with(|| format!("Malformed row in '{}'", object_name))?;

            let raw_date = record.get(date_index).unwrap_or_default();
            let day = parse_report_date(raw_date)?.day();

            if !cycle.contains_day(day) {
                return Ok(summed);
            }

            let raw_cost = record.get(cost_index).unwrap_or_default();

            if MISSING_VALUE_TOKENS.contains(&raw_cost) {
                return Ok(summed);
            }

            let cost = raw_cost
                .parse::<f64>()
                .ok()
                .filter(|cost| cost.is_finite())
                .ok_or_else(|| Error::InvalidCost(raw_cost.to_owned()))?;

            Ok(summed + cost)
        })
}

/// Reads every desired file and sums it on its own.
///
/// Files are processed one by one in key order. Any failure aborts the whole run, there is no
/// skipping of broken files.
pub fn aggregate_costs(
    store: &dyn ObjectStore,
    container: &Container,
    desired_files: &DesiredFiles,
    cycle: &BillingCycle,
    columns: &CostColumns,
) -> AppResult<CostByKey> {
    let total = desired_files.len();

    desired_files
        .iter()
        .enumerate()
        .try_fold(
            CostByKey::new(),
            |mut costs, (position, (key, object_name))| -> AppResult<CostByKey> {
                let content = store.read(&container.name, object_name)?;

                debug!(
                    container = %container.name,
                    object = %object_name,
                    "Blob {} of {} read",
                    position + 1,
                    total
                );

                let summed = sum_cost_rows(object_name, &content, cycle, columns)?;
                costs.insert(key.clone(), summed);

                Ok(costs)
            },
        )
        .inspect(|costs| info!(container = %container.name, files = costs.len(), "Costs aggregated"))
}
