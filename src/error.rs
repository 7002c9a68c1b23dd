use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("schema mismatch; missing columns: [{}]; unexpected columns: [{}]", missing.join(", "), extra.join(", "))]
    SchemaMismatch {
        missing: Vec<String>,
        extra: Vec<String>,
    },

    #[error("could not parse CSV: {0}")]
    Parse(String),

    #[error("invariant violation on '{field}': {rule}")]
    InvariantViolation { field: &'static str, rule: String },

    #[error("unknown missing-value strategy: '{0}'")]
    InvalidStrategy(String),

    #[error("unsupported upload: {0}")]
    UnsupportedUpload(String),

    #[error("shipment data not initialized; upload a data set first")]
    StoreNotInitialized,

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl From<csv::Error> for AnalyticsError {
    fn from(err: csv::Error) -> Self {
        AnalyticsError::Parse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AnalyticsError>;
