use std::collections::BTreeMap;

use tracing::info;

use super::aggregate::CostByKey;
use crate::error::Error;
use crate::prelude::*;

/// The label the anchor official entry is published under.
pub const OFFICIAL_LABEL_PREFIX: &str = "Oficial: ";

/// The consolidated month report: label -> cost, ordered by label.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalReport {
    /// Full month name of the source month, it also names the artifact.
    pub month_name: String,

    pub entries: BTreeMap<String, f64>,
}

/// Column layout of the report artifact.
#[derive(Serialize, Deserialize)]
struct CsvRow {
    #[serde(rename = "Label")]
    label: String,
    #[serde(rename = "Cost")]
    cost: f64,
}

/// Merges official and daily sums, anchored on the earliest official key.
///
/// Both maps are ordered, so "earliest" is the first key in iteration order.
pub fn assemble_report(
    official: CostByKey,
    daily: CostByKey,
    month_name: &str,
) -> Result<FinalReport, Error> {
    let anchor = official
        .keys()
        .next()
        .cloned()
        .ok_or(Error::EmptyOfficialMap)?;

    assemble_report_anchored(official, daily, &anchor, month_name)
}

/// Merges official and daily sums with a caller-chosen anchor.
///
/// The anchor entry is relabeled `Oficial: <anchor>`. Remaining official entries go in next,
/// then the daily ones, a daily key overwrites an identical official key.
pub fn assemble_report_anchored(
    mut official: CostByKey,
    daily: CostByKey,
    anchor: &str,
    month_name: &str,
) -> Result<FinalReport, Error> {
    if official.is_empty() {
        return Err(Error::EmptyOfficialMap);
    }

    let anchor_value = official
        .remove(anchor)
        .ok_or_else(|| Error::AnchorNotFound(anchor.to_owned()))?;

    let mut entries = BTreeMap::new();
    entries.insert(format!("{OFFICIAL_LABEL_PREFIX}{anchor}"), anchor_value);
    entries.extend(official);
    entries.extend(daily);

    info!(month = month_name, entries = entries.len(), "Report assembled");

    Ok(FinalReport {
        month_name: month_name.to_owned(),
        entries,
    })
}

impl FinalReport {
    /// Name of the persisted artifact, for example `March.csv`.
    pub fn file_name(&self) -> String {
        format!("{}.csv", self.month_name)
    }

    /// Sum of every entry.
    pub fn total(&self) -> f64 {
        self.entries.values().sum()
    }

    /// The artifact content: a `Label,Cost` header, then one row per entry in key order.
    ///
    /// Costs are written at full precision so [`FinalReport::from_csv`] gets the same numbers
    /// back.
    pub fn to_csv(&self) -> AppResult<String> {
        let mut writer = csv::WriterBuilder::new().from_writer(vec![]);

        for (label, cost) in &self.entries {
            let row = CsvRow {
                label: label.clone(),
                cost: *cost,
            };

            writer
                .serialize(row)
                .into_diagnostic()
                .wrap_err("Failed to serialize report row to CSV format")?;
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

    /// Reads a persisted artifact back.
    pub fn from_csv(month_name: &str, content: &[u8]) -> AppResult<Self> {
        let mut reader = csv::ReaderBuilder::new().from_reader(content);

        let entries = reader
            .deserialize::<CsvRow>()
            .map(|row| -> AppResult<(String, f64)> {
                let row = row
                    .into_diagnostic()
                    .wrap_err("Failed to parse report row")?;

                Ok((row.label, row.cost))
            })
            .collect::<AppResult<BTreeMap<String, f64>>>()?;

        Ok(FinalReport {
            month_name: month_name.to_owned(),
            entries,
        })
    }

    /// Renders the report for people, one `label: cost` line per entry.
    ///
    /// `no_format` keeps full precision and drops the currency symbol, for piping.
    pub fn render(&self, no_format: bool) -> String {
        let width = self
            .entries
            .keys()
            .map(|label| label.chars().count())
            .max()
            .unwrap_or(0);

        let lines: Vec<String> = self
            .entries
            .iter()
            .map(|(label, cost)| {
                if no_format {
                    format!("{label},{cost}")
                } else {
                    format!("{label:<width$}  {}", render_money(*cost))
                }
            })
            .collect();

        let mut rendered = format!("{}\n", self.month_name);
        rendered.push_str(&lines.join("\n"));
        rendered
    }
}

/// example: $1.23
fn render_money(value: f64) -> String {
    format!("${:.2}", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn costs(pairs: &[(&str, f64)]) -> CostByKey {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), *value))
            .collect()
    }

    #[test]
    fn test_assemble_relabels_the_anchor() {
        let report = assemble_report(
            costs(&[("2023-03-01", 500.0)]),
            costs(&[("2023-03-20", 40.0)]),
            "March",
        )
        .unwrap();

        let keys: Vec<&str> = report.entries.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["2023-03-20", "Oficial: 2023-03-01"]);
        assert_eq!(report.entries["Oficial: 2023-03-01"], 500.0);
        assert_eq!(report.entries["2023-03-20"], 40.0);

        // Sorted ascending.
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn test_assemble_takes_earliest_key_as_anchor() {
        let report = assemble_report(
            costs(&[("2023-03-05", 2.0), ("2023-03-01", 1.0)]),
            CostByKey::new(),
            "March",
        )
        .unwrap();

        assert_eq!(report.entries["Oficial: 2023-03-01"], 1.0);
        assert_eq!(report.entries["2023-03-05"], 2.0);
        assert!(!report.entries.contains_key("2023-03-01"));
    }

    #[test]
    fn test_assemble_with_explicit_anchor() {
        let report = assemble_report_anchored(
            costs(&[("2023-03-01", 1.0), ("2023-03-05", 2.0)]),
            CostByKey::new(),
            "2023-03-05",
            "March",
        )
        .unwrap();

        assert_eq!(report.entries["Oficial: 2023-03-05"], 2.0);
        assert_eq!(report.entries["2023-03-01"], 1.0);
    }

    #[test]
    fn test_unknown_anchor() {
        let error = assemble_report_anchored(
            costs(&[("2023-03-01", 1.0)]),
            CostByKey::new(),
            "2023-04-01",
            "March",
        )
        .unwrap_err();

        assert!(matches!(error, Error::AnchorNotFound(_)));
    }

    #[test]
    fn test_empty_official_map() {
        let error =
            assemble_report(CostByKey::new(), costs(&[("2023-03-20", 1.0)]), "March").unwrap_err();

        assert!(matches!(error, Error::EmptyOfficialMap));
    }

    #[test]
    fn test_daily_overwrites_colliding_official_key() {
        let report = assemble_report(
            costs(&[("2023-03-01", 1.0), ("2023-03-20", 2.0)]),
            costs(&[("2023-03-20", 3.0)]),
            "March",
        )
        .unwrap();

        assert_eq!(report.entries["2023-03-20"], 3.0);
        assert_eq!(report.entries.len(), 2);
    }

    #[test]
    fn test_csv_round_trip() {
        let report = assemble_report(
            costs(&[("2023-03-01", 500.125)]),
            costs(&[("2023-03-20", 40.1), ("2023-03-21", 0.0)]),
            "March",
        )
        .unwrap();

        let csv = report.to_csv().unwrap();
        assert!(csv.starts_with("Label,Cost\n"));

        let parsed = FinalReport::from_csv("March", csv.as_bytes()).unwrap();
        assert_eq!(parsed, report);
    }

    #[test]
    fn test_file_name_and_total() {
        let report =
            assemble_report(costs(&[("2023-03-01", 1.5)]), costs(&[("2023-03-20", 2.0)]), "March")
                .unwrap();

        assert_eq!(report.file_name(), "March.csv");
        assert_eq!(report.total(), 3.5);
    }

    #[test]
    fn test_render() {
        let report =
            assemble_report(costs(&[("2023-03-01", 1.5)]), costs(&[("2023-03-20", 2.0)]), "March")
                .unwrap();

        assert_eq!(
            report.render(false),
            "March\n2023-03-20           $2.00\nOficial: 2023-03-01  $1.50"
        );
        assert_eq!(
            report.render(true),
            "March\n2023-03-20,2\nOficial: 2023-03-01,1.5"
        );
    }
}
