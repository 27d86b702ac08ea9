use thiserror::Error;

pub type TallyResult<T> = Result<T, TallyError>;

#[derive(Error, Debug)]
pub enum TallyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Workbook error: {0}")]
    Workbook(String),

    #[error("Export error: {0}")]
    Export(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid column pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Required column not found: {0}")]
    MissingColumn(String),

    #[error("Sheet '{label}' is not usable: {reason}")]
    UnusableSheet { label: String, reason: String },

    #[error("No yearly quantity/amount data to aggregate")]
    NoTimeSeriesData,

    #[error("Workbook has no sheets: {0}")]
    EmptyWorkbook(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}
