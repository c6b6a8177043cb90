pub mod queries;
pub mod schema;
pub mod sqlite;

pub use rusqlite::types::Value;
pub use sqlite::Database;

/// One row for the sink: column names paired with values, in insertion order.
pub type Row = Vec<(&'static str, Value)>;
