/// Primary keys are read through `::BIGINT` casts regardless of the declared
/// column width.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
