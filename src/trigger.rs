use tracing::{debug, info};

use crate::calculation::meter_split::split_by_meter;
use crate::io::store::ObjectStore;
use crate::prelude::*;

/// The notification for a newly created usage export.
#[derive(Debug, Clone)]
pub struct BlobTrigger {
    pub name: String,
    pub length: usize,
    pub content: Vec<u8>,
}

impl BlobTrigger {
    pub fn new(name: impl Into<String>, content: Vec<u8>) -> Self {
        BlobTrigger {
            name: name.into(),
            length: content.len(),
            content,
        }
    }
}

/// Splits the arrived export per meter and stores every piece as
/// `{output_prefix}{SubscriptionId}_{YYYY}{MM}_{MeterId}.csv`.
///
/// All batches are built and checked before the first write, so a bad export leaves nothing
/// half-written behind. Returns the stored object names.
pub fn handle_blob_created(
    store: &dyn ObjectStore,
    output_container: &str,
    output_prefix: &str,
    trigger: &BlobTrigger,
) -> AppResult<Vec<String>> {
    info!(name = %trigger.name, size = trigger.length, "Blob trigger processed blob");

    let batches = split_by_meter(&trigger.name, &trigger.content)
        .wrap_err_with(|| format!("Failed to split '{}' by meter", trigger.name))?;

    let rendered = batches
        .iter()
        .map(|batch| -> AppResult<(String, String)> {
            Ok((format!("{}{}", output_prefix, batch.file_name()), batch.to_csv()?))
        })
        .collect::<AppResult<Vec<_>>>()?;

    let mut stored = vec![];

    for (name, content) in rendered {
        store.write(output_container, &name, content.as_bytes())?;

        debug!(container = output_container, object = %name, "Meter file stored");

        stored.push(name);
    }

    info!(
        name = %trigger.name,
        files = stored.len(),
        "Usage export split by meter"
    );

    Ok(stored)
}
