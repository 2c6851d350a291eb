use std::cell::RefCell;
use std::collections::BTreeMap;

use jiff::Timestamp;
use jiff::tz::TimeZone;

use crate::error::Error;
use crate::prelude::*;

/// Listing metadata of a stored object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectRecord {
    /// Full object name, including its path prefix.
    pub name: String,

    /// When the object was first written.
    pub creation_time: Timestamp,

    /// The raw content-disposition header, e.g. `attachment; filename=123_report.csv`.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub content_disposition: Option<String>,
}

impl ObjectRecord {
    /// The filename embedded in the disposition header.
    ///
    /// It is the value after `=` in the second `;`-separated segment. Returns `None` when the
    /// header is missing, empty or shaped differently.
    pub fn disposition_filename(&self) -> Option<&str> {
        let disposition = self.content_disposition.as_deref()?;

        if disposition.trim().is_empty() {
            return None;
        }

        let segment = disposition.split(';').nth(1)?;
        let (_key, value) = segment.split_once('=')?;

        Some(value.trim().trim_matches('"'))
    }

    pub fn has_disposition(&self) -> bool {
        self.content_disposition
            .as_deref()
            .is_some_and(|disposition| !disposition.trim().is_empty())
    }

    /// Creation time on a UTC wall clock, with the zone dropped.
    pub fn creation_datetime(&self) -> jiff::civil::DateTime {
        self.creation_time.to_zoned(TimeZone::UTC).datetime()
    }
}

/// The storage collaborator: list, read and write named objects inside containers.
///
/// Reads and writes are expected to be idempotent, retries are the caller's business.
pub trait ObjectStore {
    /// Every object in `container` whose name starts with `prefix`, in name order.
    fn list(&self, container: &str, prefix: &str) -> AppResult<Vec<ObjectRecord>>;

    fn read(&self, container: &str, name: &str) -> AppResult<Vec<u8>>;

    fn write(&self, container: &str, name: &str, content: &[u8]) -> AppResult<()>;
}

/// Objects kept in memory. Handy for tests and for embedding the pipeline.
#[derive(Debug, Default)]
pub struct MemoryStore {
    // (container, name) -> (record, content)
    objects: RefCell<BTreeMap<(String, String), (ObjectRecord, Vec<u8>)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Puts an object with explicit listing metadata.
    pub fn insert(&self, container: &str, record: ObjectRecord, content: impl Into<Vec<u8>>) {
        self.objects.borrow_mut().insert(
            (container.to_owned(), record.name.clone()),
            (record, content.into()),
        );
    }

    pub fn is_empty(&self) -> bool {
        self.objects.borrow().is_empty()
    }
}

impl ObjectStore for MemoryStore {
    fn list(&self, container: &str, prefix: &str) -> AppResult<Vec<ObjectRecord>> {
        let records = self
            .objects
            .borrow()
            .iter()
            .filter(|((stored_container, name), _)| {
                stored_container == container && name.starts_with(prefix)
            })
            .map(|(_, (record, _))| record.clone())
            .collect();

        Ok(records)
    }

    fn read(&self, container: &str, name: &str) -> AppResult<Vec<u8>> {
        let objects = self.objects.borrow();
        let (_, content) = objects
            .get(&(container.to_owned(), name.to_owned()))
            .ok_or_else(|| Error::ObjectNotFound {
                container: container.to_owned(),
                name: name.to_owned(),
            })?;

        Ok(content.clone())
    }

    fn write(&self, container: &str, name: &str, content: &[u8]) -> AppResult<()> {
        let key = (container.to_owned(), name.to_owned());
        let mut objects = self.objects.borrow_mut();

        // Overwrites keep the original creation time.
        let record = match objects.remove(&key) {
            Some((record, _)) => record,
            None => ObjectRecord {
                name: name.to_owned(),
                creation_time: Timestamp::now(),
                content_disposition: Some(attachment_disposition(name)),
            },
        };

        objects.insert(key, (record, content.to_vec()));

        Ok(())
    }
}

/// `attachment; filename=<last path segment>`.
pub fn attachment_disposition(name: &str) -> String {
    let file_name = name.rsplit('/').next().unwrap_or(name);

    format!("attachment; filename={}", file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, disposition: Option<&str>) -> ObjectRecord {
        ObjectRecord {
            name: name.to_owned(),
            creation_time: "2023-03-20T08:30:00Z".parse().unwrap(),
            content_disposition: disposition.map(str::to_owned),
        }
    }

    #[test]
    fn test_disposition_filename() {
        let object = record("a", Some("attachment; filename=123_report.csv"));
        assert_eq!(object.disposition_filename(), Some("123_report.csv"));

        let quoted = record("a", Some("attachment; filename=\"123_report.csv\""));
        assert_eq!(quoted.disposition_filename(), Some("123_report.csv"));
    }

    #[test]
    fn test_disposition_filename_absent_or_malformed() {
        assert_eq!(record("a", None).disposition_filename(), None);
        assert_eq!(record("a", Some("")).disposition_filename(), None);
        assert_eq!(record("a", Some("attachment")).disposition_filename(), None);
        assert!(record("a", Some("attachment")).has_disposition());
        assert!(!record("a", Some("  ")).has_disposition());
    }

    #[test]
    fn test_creation_datetime_is_utc_wall_clock() {
        let object = ObjectRecord {
            name: "a".to_owned(),
            creation_time: "2023-03-18T23:30:00-03:00".parse().unwrap(),
            content_disposition: None,
        };

        let wall = object.creation_datetime();
        assert_eq!(wall.day(), 19);
        assert_eq!(wall.hour(), 2);
    }

    #[test]
    fn test_memory_store_lists_by_prefix_in_name_order() {
        let store = MemoryStore::new();
        store.insert("daily", record("new/b.csv", None), "b");
        store.insert("daily", record("new/a.csv", None), "a");
        store.insert("daily", record("old/c.csv", None), "c");
        store.insert("monthly", record("new/d.csv", None), "d");

        let names: Vec<String> = store
            .list("daily", "new/")
            .unwrap()
            .into_iter()
            .map(|record| record.name)
            .collect();

        assert_eq!(names, vec!["new/a.csv", "new/b.csv"]);
    }

    #[test]
    fn test_memory_store_read_missing_object() {
        let store = MemoryStore::new();
        let report = store.read("daily", "nope.csv").unwrap_err();

        assert!(matches!(
            report.downcast_ref::<Error>(),
            Some(Error::ObjectNotFound { .. })
        ));
    }

    #[test]
    fn test_memory_store_write_then_read() {
        let store = MemoryStore::new();
        store.write("out", "split/x.csv", b"a,b\n").unwrap();

        assert_eq!(store.read("out", "split/x.csv").unwrap(), b"a,b\n");

        let listed = store.list("out", "").unwrap();
        assert_eq!(listed[0].disposition_filename(), Some("x.csv"));
    }
}
