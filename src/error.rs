use std::fmt;

#[derive(Debug)]
pub enum RunixError {
    ApiError {
        status: u16,
        message: String,
    },
    ConfigError(String),
    SessionError(String),
    NetworkError(reqwest::Error),
    Timeout,
    IoError(std::io::Error),
    JsonError(serde_json::Error),
    YamlError(serde_yaml::Error),
    Other(String),
}

impl fmt::Display for RunixError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunixError::ApiError { status, message } => {
                write!(f, "API error (status {}): {}", status, message)
            }
            RunixError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            RunixError::SessionError(msg) => write!(f, "Session error: {}", msg),
            RunixError::NetworkError(e) => write!(f, "Network error: {}", e),
            RunixError::Timeout => write!(f, "Stream timeout"),
            RunixError::IoError(e) => write!(f, "IO error: {}", e),
            RunixError::JsonError(e) => write!(f, "JSON error: {}", e),
            RunixError::YamlError(e) => write!(f, "YAML error: {}", e),
            RunixError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for RunixError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RunixError::NetworkError(e) => Some(e),
            RunixError::IoError(e) => Some(e),
            RunixError::JsonError(e) => Some(e),
            RunixError::YamlError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for RunixError {
    fn from(err: reqwest::Error) -> Self {
        RunixError::NetworkError(err)
    }
}

impl From<std::io::Error> for RunixError {
    fn from(err: std::io::Error) -> Self {
        RunixError::IoError(err)
    }
}

impl From<serde_json::Error> for RunixError {
    fn from(err: serde_json::Error) -> Self {
        RunixError::JsonError(err)
    }
}

impl From<serde_yaml::Error> for RunixError {
    fn from(err: serde_yaml::Error) -> Self {
        RunixError::YamlError(err)
    }
}

impl From<anyhow::Error> for RunixError {
    fn from(err: anyhow::Error) -> Self {
        RunixError::Other(err.to_string())
    }
}

impl From<String> for RunixError {
    fn from(msg: String) -> Self {
        RunixError::Other(msg)
    }
}

impl From<&str> for RunixError {
    fn from(msg: &str) -> Self {
        RunixError::Other(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RunixError>;
