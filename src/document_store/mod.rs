mod cursor;
mod models;
mod schema;
mod store;
mod trait_def;

pub use cursor::{RecordCursor, DEFAULT_PAGE_SIZE};
pub use models::{
    FieldUpdate, Record, RecordFilter, RunRecord, StoreStats, StoredRecord, TextField,
    UpdateOutcome,
};
pub use store::SqliteDocumentStore;
pub use trait_def::{DocumentStore, RunLog};
