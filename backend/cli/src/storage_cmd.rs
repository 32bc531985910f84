//! `kippo create-buckets`, `kippo dump` and `kippo load`: database snapshots
//! in the object store.

use anyhow::{bail, Result};
use kippo_core::ObjectStore;
use kippo_store::{dump_to_object_store, load_from_object_store};

use crate::runtime::Runtime;
use crate::terminal_output::{note_info, note_success};

pub async fn create_buckets(runtime: &Runtime) -> Result<()> {
    let objects = runtime.object_store();
    let bucket = runtime.config.dump_bucket();
    if objects.create_bucket(&bucket).await? {
        note_success(&format!("Created bucket '{bucket}'"));
    } else {
        note_info(&format!("Bucket '{bucket}' already exists"));
    }
    Ok(())
}

/// Returns the key the snapshot was written to.
pub async fn dump(runtime: &Runtime) -> Result<String> {
    let store = runtime.open_store()?;
    let objects = runtime.object_store();
    let bucket = runtime.config.dump_bucket();
    let key = dump_to_object_store(
        &store,
        &objects,
        &bucket,
        &runtime.config.dump_key_prefix(),
    )
    .await?;
    note_success(&format!("Dumped database to {bucket}/{key}"));
    Ok(key)
}

/// Load the snapshot at `key`, or the newest one under the dump prefix.
pub async fn load(runtime: &Runtime, key: Option<String>) -> Result<usize> {
    let store = runtime.open_store()?;
    let objects = runtime.object_store();
    let bucket = runtime.config.dump_bucket();
    let key = match key {
        Some(key) => key,
        None => {
            let keys = objects.list(&bucket, &runtime.config.dump_key_prefix()).await?;
            match keys.into_iter().last() {
                Some(key) => key,
                None => bail!("no dumps found in bucket '{bucket}'"),
            }
        }
    };
    let count = load_from_object_store(&store, &objects, &bucket, &key).await?;
    note_success(&format!("Loaded {count} records from {bucket}/{key}"));
    Ok(count)
}
