use std::fs;
use std::path::{Component, Path, PathBuf};

use jiff::Timestamp;
use tracing::debug;

use super::store::{ObjectRecord, ObjectStore, attachment_disposition};
use crate::error::Error;
use crate::prelude::*;

const MANIFEST_FILE_NAME: &str = ".manifest.json";

/// A directory-backed object store.
///
/// Every container is a directory under `root`, every object a file at its name. The listing
/// metadata a blob service would keep (creation time, content disposition) lives in a
/// `.manifest.json` next to the objects, so a synced copy of a container can be dropped in as is.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        LocalStore { root: root.into() }
    }

    fn container_dir(&self, container: &str) -> AppResult<PathBuf> {
        Ok(self.root.join(contained(container)?))
    }

    fn object_path(&self, container: &str, name: &str) -> AppResult<PathBuf> {
        Ok(self.container_dir(container)?.join(contained(name)?))
    }

    fn manifest_path(&self, container: &str) -> AppResult<PathBuf> {
        Ok(self.container_dir(container)?.join(MANIFEST_FILE_NAME))
    }

    fn read_manifest(&self, container: &str) -> AppResult<Vec<ObjectRecord>> {
        let manifest_path = self.manifest_path(container)?;

        // A container nobody wrote to yet.
        if !manifest_path.try_exists().into_diagnostic()? {
            debug!(container, "No manifest, treating container as empty");
            return Ok(vec![]);
        }

        let content = fs::read_to_string(&manifest_path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to read {}", manifest_path.display()))?;

        let records = serde_json::from_str(&content)
            .into_diagnostic()
            .wrap_err_with(|| format!("Malformed manifest {}", manifest_path.display()))?;

        Ok(records)
    }

    fn write_manifest(&self, container: &str, records: &[ObjectRecord]) -> AppResult<()> {
        let json = serde_json::to_string_pretty(records).into_diagnostic()?;

        fs::write(self.manifest_path(container)?, json).into_diagnostic()?;

        Ok(())
    }
}

/// Only plain relative components, so a name can never resolve outside its parent directory.
fn contained(name: &str) -> Result<&Path, Error> {
    let path = Path::new(name);
    let plain = path
        .components()
        .all(|component| matches!(component, Component::Normal(_)));

    if name.is_empty() || !plain {
        return Err(Error::InvalidObjectName(name.to_owned()));
    }

    Ok(path)
}

impl ObjectStore for LocalStore {
    fn list(&self, container: &str, prefix: &str) -> AppResult<Vec<ObjectRecord>> {
        let mut records: Vec<ObjectRecord> = self
            .read_manifest(container)?
            .into_iter()
            .filter(|record| record.name.starts_with(prefix))
            .collect();

        records.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(records)
    }

    fn read(&self, container: &str, name: &str) -> AppResult<Vec<u8>> {
        let path = self.object_path(container, name)?;

        if !path.try_exists().into_diagnostic()? {
            return Err(Error::ObjectNotFound {
                container: container.to_owned(),
                name: name.to_owned(),
            }
            .into());
        }

        fs::read(&path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to read {}", path.display()))
    }

    fn write(&self, container: &str, name: &str, content: &[u8]) -> AppResult<()> {
        let path = self.object_path(container, name)?;

        // Ensure the directory exists.
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).into_diagnostic()?;
        }

        fs::write(&path, content)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to write {}", path.display()))?;

        let mut records = self.read_manifest(container)?;

        // Overwrites keep the original creation time, like a blob service does.
        if !records.iter().any(|record| record.name == name) {
            records.push(ObjectRecord {
                name: name.to_owned(),
                creation_time: Timestamp::now(),
                content_disposition: Some(attachment_disposition(name)),
            });

            self.write_manifest(container, &records)?;
        }

        Ok(())
    }
}
