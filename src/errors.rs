use thiserror::Error;
use crate::manager_mail::errors::MailError;
use crate::manager_temis::errors::FetchError;
use crate::normalization::Field;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("ConfigError::Missing: {0}")]
    Missing(String),
    #[error("ConfigError::Invalid: {0}")]
    Invalid(String),
    #[error("ConfigError::File: {0}")]
    File(String),
}
impl From<&str> for ConfigError {
    fn from(e: &str) -> Self { ConfigError::Invalid(e.to_string()) }
}
impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self { ConfigError::File(e.to_string()) }
}
impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self { ConfigError::File(e.to_string()) }
}

#[derive(Error, Debug)]
#[error("LoggingError: {0}")]
pub struct LoggingError(pub String);
impl From<std::io::Error> for LoggingError {
    fn from(e: std::io::Error) -> Self { LoggingError(e.to_string()) }
}
impl From<log4rs::config::runtime::ConfigErrors> for LoggingError {
    fn from(e: log4rs::config::runtime::ConfigErrors) -> Self { LoggingError(e.to_string()) }
}
impl From<log::SetLoggerError> for LoggingError {
    fn from(e: log::SetLoggerError) -> Self { LoggingError(e.to_string()) }
}

#[derive(Error, Debug, PartialEq)]
pub enum AdviceError {
    #[error("AdviceError::InvalidIndex: {0}")]
    InvalidIndex(f64),
}

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("ExtractError::TableNotFound: no element matches '{0}', the page structure may have changed")]
    TableNotFound(String),
    #[error("ExtractError::FieldMissing: required column '{0}' not found in table header")]
    FieldMissing(Field),
    #[error("ExtractError::HeaderMissing: table has no header row at index {0}")]
    HeaderMissing(usize),
    #[error("ExtractError::Selector: {0}")]
    Selector(String),
}

#[derive(Error, Debug, PartialEq)]
pub enum NormalizeError {
    #[error("NormalizeError::EmptyFrame: all {0} rows were dropped during normalization")]
    EmptyFrame(usize),
}

#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("HistoryError::Corrupt: {0}")]
    Corrupt(String),
    #[error("HistoryError::Persist: {0}")]
    Persist(String),
}
impl From<csv::Error> for HistoryError {
    fn from(e: csv::Error) -> Self { HistoryError::Persist(e.to_string()) }
}
impl From<serde_json::Error> for HistoryError {
    fn from(e: serde_json::Error) -> Self { HistoryError::Persist(e.to_string()) }
}
impl From<std::io::Error> for HistoryError {
    fn from(e: std::io::Error) -> Self { HistoryError::Persist(e.to_string()) }
}

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("ReportError::EmptyForecast: no forecast records to report")]
    EmptyForecast,
    #[error("ReportError::Advice: {0}")]
    Advice(#[from] AdviceError),
}

/// Terminal failure of a run
#[derive(Error, Debug)]
pub enum UVForecastError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Logging(#[from] LoggingError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
    #[error(transparent)]
    History(#[from] HistoryError),
    #[error(transparent)]
    Report(#[from] ReportError),
    #[error(transparent)]
    Mail(#[from] MailError),
}
