use csv::StringRecord;
use itertools::Itertools;

use super::interval::parse_report_date;
use crate::config::billing_cycle::{METER_COLUMN, SUBSCRIPTION_COLUMN, USAGE_DATE_COLUMN};
use crate::error::Error;
use crate::prelude::*;

/// The rows of one usage export that belong to a single subscription, meter and month.
#[derive(Debug, Clone, PartialEq)]
pub struct MeterBatch {
    pub subscription_id: String,
    pub meter_id: String,
    pub year: i16,
    pub month: i8,
    headers: StringRecord,
    rows: Vec<StringRecord>,
}

/// Where the identifying columns sit in a header row.
struct Columns {
    subscription: usize,
    meter: usize,
    date: usize,
}

impl Columns {
    fn find(source: &str, headers: &StringRecord) -> Result<Self, Error> {
        let position = |column: &str| {
            headers
                .iter()
                .position(|header| header == column)
                .ok_or_else(|| Error::MissingColumn {
                    object: source.to_owned(),
                    column: column.to_owned(),
                })
        };

        Ok(Columns {
            subscription: position(SUBSCRIPTION_COLUMN)?,
            meter: position(METER_COLUMN)?,
            date: position(USAGE_DATE_COLUMN)?,
        })
    }

    /// (SubscriptionId, MeterId, year, month) of a row.
    fn key_of(&self, row: &StringRecord) -> Result<(String, String, i16, i8), Error> {
        let date = parse_report_date(row.get(self.date).unwrap_or_default())?;

        Ok((
            row.get(self.subscription).unwrap_or_default().to_owned(),
            row.get(self.meter).unwrap_or_default().to_owned(),
            date.year(),
            date.month(),
        ))
    }
}

impl MeterBatch {
    /// Builds a batch, refusing rows from more than one billing entity.
    ///
    /// A batch ends up as exactly one output file, so mixing subscriptions, meters or months
    /// would silently merge data that must stay apart.
    pub fn try_new(
        source: &str,
        headers: StringRecord,
        rows: Vec<StringRecord>,
    ) -> Result<Self, Error> {
        let columns = Columns::find(source, &headers)?;

        let Some(first_row) = rows.first() else {
            return Err(Error::EmptyBatch);
        };
        let (subscription_id, meter_id, year, month) = columns.key_of(first_row)?;

        check_identifier("SubscriptionId", &subscription_id)?;
        check_identifier("MeterId", &meter_id)?;

        for row in &rows[1..] {
            let (other_subscription, other_meter, other_year, other_month) = columns.key_of(row)?;

            if other_subscription != subscription_id {
                return Err(Error::InconsistentBatch {
                    field: "SubscriptionId",
                    first: subscription_id,
                    other: other_subscription,
                });
            }

            if other_meter != meter_id {
                return Err(Error::InconsistentBatch {
                    field: "MeterId",
                    first: meter_id,
                    other: other_meter,
                });
            }

            if (other_year, other_month) != (year, month) {
                return Err(Error::InconsistentBatch {
                    field: "month",
                    first: format!("{year:04}-{month:02}"),
                    other: format!("{other_year:04}-{other_month:02}"),
                });
            }
        }

        Ok(MeterBatch {
            subscription_id,
            meter_id,
            year,
            month,
            headers,
            rows,
        })
    }

    /// `{SubscriptionId}_{YYYY}{MM}_{MeterId}.csv`
    pub fn file_name(&self) -> String {
        format!(
            "{}_{:04}{:02}_{}.csv",
            self.subscription_id, self.year, self.month, self.meter_id
        )
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// The header row followed by every row of the batch, untouched.
    pub fn to_csv(&self) -> AppResult<String> {
        let mut writer = csv::WriterBuilder::new().from_writer(vec![]);

        writer
            .write_record(&self.headers)
            .into_diagnostic()
            .wrap_err("Failed to write the header row")?;

        for row in &self.rows {
            writer
                .write_record(row)
                .into_diagnostic()
                .wrap_err_with(|| format!("Failed to write a row of {}", self.file_name()))?;
        }

        let data = writer
            .into_inner()
            .into_diagnostic()
            .wrap_err("Failed to get writer data.")?;

        let csv_string = String::from_utf8(data)
            .into_diagnostic()
            .wrap_err("Invalid utf-8")?;

        Ok(csv_string)
    }
}

/// Ids end up in object names, a separator in them would move the file elsewhere.
fn check_identifier(field: &'static str, value: &str) -> Result<(), Error> {
    if value.contains(['/', '\\']) {
        return Err(Error::UnsafeIdentifier {
            field,
            value: value.to_owned(),
        });
    }

    Ok(())
}

/// Splits a usage export into one batch per (SubscriptionId, MeterId, month).
///
/// Batches come out ordered by that key; rows keep their original order inside a batch.
pub fn split_by_meter(source: &str, content: &[u8]) -> AppResult<Vec<MeterBatch>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(content);

    let headers = reader
        .headers()
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to read the header row of '{}'", source))?
        .clone();

    let columns = Columns::find(source, &headers)?;

    let keyed_rows = reader
        .records()
        .map(|row| -> AppResult<_> {
            let row = row
                .into_diagnostic()
                .wrap_err_with(|| format!("Malformed row in '{}'", source))?;
            let key = columns.key_of(&row)?;

            Ok((key, row))
        })
        .collect::<AppResult<Vec<_>>>()?;

    keyed_rows
        .into_iter()
        .into_group_map()
        .into_iter()
        .sorted_by(|(a, _), (b, _)| a.cmp(b))
        .map(|(_key, rows)| -> AppResult<MeterBatch> {
            Ok(MeterBatch::try_new(source, headers.clone(), rows)?)
        })
        .collect()
}
