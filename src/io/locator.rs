use std::collections::BTreeMap;

use jiff::civil::Date;
use tracing::{debug, info, warn};

use super::store::{ObjectRecord, ObjectStore};
use crate::calculation::interval::month_bucket_tag;
use crate::config::billing_cycle::BillingCycle;
use crate::prelude::*;

/// Creation date (`YYYY-MM-DD`) -> object name.
pub type DesiredFiles = BTreeMap<String, String>;

/// How often a container receives usage files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    /// Intermediate exports, only trusted once the cycle is past its cutoff day.
    Daily,
    /// Closed, official exports.
    Monthly,
}

impl ContainerKind {
    /// Guesses the kind from names like `daily-usage` or `monthly-usage`.
    pub fn from_container_name(name: &str) -> Option<Self> {
        let lowered = name.to_ascii_lowercase();

        if lowered.contains("daily") {
            Some(ContainerKind::Daily)
        } else if lowered.contains("monthly") {
            Some(ContainerKind::Monthly)
        } else {
            None
        }
    }
}

/// A container plus the path prefix its usage files live under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    pub name: String,
    pub prefix: String,
    pub kind: ContainerKind,
}

impl Container {
    pub fn new(name: impl Into<String>, prefix: impl Into<String>, kind: ContainerKind) -> Self {
        Container {
            name: name.into(),
            prefix: prefix.into(),
            kind,
        }
    }

    pub fn daily(name: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self::new(name, prefix, ContainerKind::Daily)
    }

    pub fn monthly(name: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self::new(name, prefix, ContainerKind::Monthly)
    }
}

/// Finds the usage files of `client_id` for the month containing `date`.
///
/// An object qualifies when the filename in its disposition header contains the client id
/// and its name contains the month bucket tag. Daily containers also drop anything created
/// before the cutoff day of its own creation month. Matches are keyed by creation date, a
/// later match on the same day replaces an earlier one.
pub fn locate_objects(
    store: &dyn ObjectStore,
    container: &Container,
    date: Date,
    client_id: &str,
    cycle: &BillingCycle,
) -> AppResult<DesiredFiles> {
    let bucket_tag = month_bucket_tag(date)?;

    info!(
        container = %container.name,
        month = %bucket_tag,
        "Getting desired blobs"
    );

    let listing = store
        .list(&container.name, &container.prefix)
        .wrap_err_with(|| format!("Failed to list container '{}'", container.name))?;

    let desired_files = listing
        .iter()
        .filter(|record| is_desired(record, container.kind, &bucket_tag, client_id, cycle))
        .fold(DesiredFiles::new(), |mut desired, record| {
            let creation_date = record.creation_datetime().date().to_string();

            debug!(object = %record.name, %creation_date, "Matched");

            desired.insert(creation_date, record.name.clone());

            desired
        });

    Ok(desired_files)
}

fn is_desired(
    record: &ObjectRecord,
    kind: ContainerKind,
    bucket_tag: &str,
    client_id: &str,
    cycle: &BillingCycle,
) -> bool {
    if !record.has_disposition() {
        return false;
    }

    let Some(file_name) = record.disposition_filename() else {
        warn!(object = %record.name, "Skipping object with unreadable content disposition");
        return false;
    };

    if !file_name.contains(client_id) || !record.name.contains(bucket_tag) {
        return false;
    }

    match kind {
        ContainerKind::Monthly => true,
        ContainerKind::Daily => record.creation_datetime().day() >= cycle.daily_cutoff_day,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::store::MemoryStore;
    use jiff::civil::date;

    const DAILY_PREFIX: &str = "new/dailyEAUsage/";

    fn daily_record(name: &str, file_name: &str, created: &str) -> ObjectRecord {
        ObjectRecord {
            name: name.to_owned(),
            creation_time: created.parse().unwrap(),
            content_disposition: Some(format!("attachment; filename={}", file_name)),
        }
    }

    fn daily() -> Container {
        Container::daily("daily-usage", DAILY_PREFIX)
    }

    #[test]
    fn test_container_kind_from_name() {
        assert_eq!(
            ContainerKind::from_container_name("daily-usage"),
            Some(ContainerKind::Daily)
        );
        assert_eq!(
            ContainerKind::from_container_name("Monthly-Usage"),
            Some(ContainerKind::Monthly)
        );
        assert_eq!(ContainerKind::from_container_name("reports"), None);
    }

    #[test]
    fn test_daily_file_after_cutoff_is_included() {
        let store = MemoryStore::new();
        store.insert(
            "daily-usage",
            daily_record(
                "new/dailyEAUsage/20230301-20230331/a.csv",
                "123_report.csv",
                "2023-03-20T06:00:00Z",
            ),
            "",
        );

        let found = locate_objects(
            &store,
            &daily(),
            date(2023, 3, 10),
            "123",
            &BillingCycle::default(),
        )
        .unwrap();

        assert_eq!(
            found.get("2023-03-20").map(String::as_str),
            Some("new/dailyEAUsage/20230301-20230331/a.csv")
        );
    }

    #[test]
    fn test_daily_file_before_cutoff_is_excluded() {
        let store = MemoryStore::new();
        store.insert(
            "daily-usage",
            daily_record(
                "new/dailyEAUsage/20230301-20230331/a.csv",
                "123_report.csv",
                "2023-03-15T06:00:00Z",
            ),
            "",
        );

        let found = locate_objects(
            &store,
            &daily(),
            date(2023, 3, 10),
            "123",
            &BillingCycle::default(),
        )
        .unwrap();

        assert!(found.is_empty());
    }

    #[test]
    fn test_monthly_container_skips_the_cutoff() {
        let store = MemoryStore::new();
        store.insert(
            "monthly-usage",
            daily_record(
                "new/monthlyEAUsage/20230301-20230331/a.csv",
                "123_report.csv",
                "2023-03-02T06:00:00Z",
            ),
            "",
        );

        let monthly = Container::monthly("monthly-usage", "new/monthlyEAUsage/");
        let found = locate_objects(
            &store,
            &monthly,
            date(2023, 3, 10),
            "123",
            &BillingCycle::default(),
        )
        .unwrap();

        assert_eq!(found.len(), 1);
        assert!(found.contains_key("2023-03-02"));
    }

    #[test]
    fn test_filters_client_and_month() {
        let store = MemoryStore::new();
        // Other client.
        store.insert(
            "daily-usage",
            daily_record(
                "new/dailyEAUsage/20230301-20230331/a.csv",
                "999_report.csv",
                "2023-03-20T06:00:00Z",
            ),
            "",
        );
        // Other month.
        store.insert(
            "daily-usage",
            daily_record(
                "new/dailyEAUsage/20230201-20230228/b.csv",
                "123_report.csv",
                "2023-03-21T06:00:00Z",
            ),
            "",
        );
        // No disposition at all.
        store.insert(
            "daily-usage",
            ObjectRecord {
                name: "new/dailyEAUsage/20230301-20230331/c.csv".to_owned(),
                creation_time: "2023-03-22T06:00:00Z".parse().unwrap(),
                content_disposition: None,
            },
            "",
        );
        // Malformed disposition.
        store.insert(
            "daily-usage",
            ObjectRecord {
                name: "new/dailyEAUsage/20230301-20230331/d.csv".to_owned(),
                creation_time: "2023-03-23T06:00:00Z".parse().unwrap(),
                content_disposition: Some("attachment".to_owned()),
            },
            "",
        );

        let found = locate_objects(
            &store,
            &daily(),
            date(2023, 3, 10),
            "123",
            &BillingCycle::default(),
        )
        .unwrap();

        assert!(found.is_empty());
    }

    #[test]
    fn test_same_creation_day_last_listed_wins() {
        let store = MemoryStore::new();
        store.insert(
            "daily-usage",
            daily_record(
                "new/dailyEAUsage/20230301-20230331/part-a.csv",
                "123_report.csv",
                "2023-03-20T06:00:00Z",
            ),
            "",
        );
        store.insert(
            "daily-usage",
            daily_record(
                "new/dailyEAUsage/20230301-20230331/part-b.csv",
                "123_report.csv",
                "2023-03-20T01:00:00Z",
            ),
            "",
        );

        let found = locate_objects(
            &store,
            &daily(),
            date(2023, 3, 31),
            "123",
            &BillingCycle::default(),
        )
        .unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(
            found["2023-03-20"],
            "new/dailyEAUsage/20230301-20230331/part-b.csv"
        );
    }

    #[test]
    fn test_custom_cutoff() {
        let store = MemoryStore::new();
        store.insert(
            "daily-usage",
            daily_record(
                "new/dailyEAUsage/20230301-20230331/a.csv",
                "123_report.csv",
                "2023-03-15T06:00:00Z",
            ),
            "",
        );

        let cycle = BillingCycle {
            daily_cutoff_day: 15,
            ..BillingCycle::default()
        };
        let found = locate_objects(&store, &daily(), date(2023, 3, 10), "123", &cycle).unwrap();

        assert_eq!(found.len(), 1);
    }
}
