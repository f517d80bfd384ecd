use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{table} table is missing required column '{column}'")]
    MissingColumn { table: String, column: String },

    #[error("{table}.{column} column contains non-numeric value '{value}' at row {row}")]
    InvalidNumber {
        table:  String,
        column: String,
        row:    usize,
        value:  String,
    },

    #[error("{table}.{column} column contains unparseable date '{value}' at row {row}")]
    InvalidDate {
        table:  String,
        column: String,
        row:    usize,
        value:  String,
    },

    #[error("transactions.amount column contains negative value {value} at row {row}")]
    NegativeAmount { row: usize, value: f64 },

    #[error("{table}.{column} must be unique, but '{key}' appears more than once")]
    DuplicateKey {
        table:  String,
        column: String,
        key:    String,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type PipelineResult<T> = Result<T, PipelineError>;
