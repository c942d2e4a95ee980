use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Regex error: {0}")]
    RegexError(#[from] regex::Error),

    /// 上游数据源返回错误或没有可用数据
    #[error("Source error ({source_id}): {message}")]
    SourceError { source_id: String, message: String },

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl DashboardError {
    pub fn source_failure(source_id: &str, message: impl Into<String>) -> Self {
        DashboardError::SourceError {
            source_id: source_id.to_string(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;

// 用于从字符串创建错误
impl From<String> for DashboardError {
    fn from(s: String) -> Self {
        DashboardError::Unknown(s)
    }
}

// 用于从&str创建错误
impl From<&str> for DashboardError {
    fn from(s: &str) -> Self {
        DashboardError::Unknown(s.to_string())
    }
}
