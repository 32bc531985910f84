//! Persistence for kippo: the SQLite `Store`, a filesystem `ObjectStore`, and
//! gzip JSON snapshots moving between the two.
pub mod object_store;
pub mod snapshot;
pub mod sqlite;

pub use object_store::LocalObjectStore;
pub use snapshot::{
    decode_snapshot, dump_key, dump_to_object_store, encode_snapshot, load_from_object_store,
    Snapshot,
};
pub use sqlite::SqliteStore;
