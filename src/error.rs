//! Error types for the WaterSmart to InfluxDB2 forwarder.
//!
//! This module defines typed errors for the portal client, the polling
//! coordinator, the history service and the storage sink, so that callers
//! can map each failure to the right outward category.

use thiserror::Error;

/// Configuration-related errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Environment variable parsing failed
    #[error("failed to parse environment variables: {0}")]
    EnvParse(String),

    /// Configuration value is invalid
    #[error("invalid configuration value for {field}: {message}")]
    Invalid { field: String, message: String },
}

/// WaterSmart portal communication and scraping errors.
#[derive(Error, Debug)]
pub enum PortalError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The portal rejected the credentials and reported these messages
    #[error("authentication failed: {}", .errors.join(", "))]
    Authentication { errors: Vec<String> },

    /// A previous login attempt failed and the freshness window has not elapsed
    #[error("not authenticated: last login attempt failed ({reason})")]
    NotAuthenticated { reason: String },

    /// The page was parsed but the account number has an unexpected format
    #[error("invalid account number: {0}")]
    InvalidAccountNumber(String),

    /// The page layout matches none of the known formats
    #[error("scrape error: {0}")]
    Scrape(#[from] ParseError),

    /// No cached meter has this id
    #[error("meter {0} not found")]
    UnknownMeter(String),

    /// Server returned an error status
    #[error("server error (status {status}): {message}")]
    ServerError { status: u16, message: String },
}

/// HTML parsing errors.
#[derive(Error, Debug)]
pub enum ParseError {
    /// Invalid CSS selector
    #[error("invalid selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },

    /// Unexpected HTML structure
    #[error("{0}")]
    UnexpectedStructure(String),
}

/// Polling coordinator errors.
#[derive(Error, Debug)]
pub enum CoordinatorError {
    /// The fetch did not complete inside the configured timeout
    #[error("update '{name}' timed out after {timeout} seconds")]
    Timeout { name: String, timeout: u64 },

    /// Data source error
    #[error("failed to fetch hourly data: {0}")]
    Source(#[from] PortalError),
}

/// History service errors surfaced to the caller.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// The request names an entry that does not exist
    #[error("Invalid config entry provided. Got {config_entry}")]
    InvalidConfigEntry { config_entry: String },

    /// The entry exists but has not completed its first refresh
    #[error("{title} is not loaded")]
    UnloadedConfigEntry { title: String },

    /// A start or end value could not be interpreted as a date
    #[error("Invalid date provided. Got {date}")]
    InvalidDate { date: String },

    /// Fetching a non-cached meter failed
    #[error("failed to fetch history: {0}")]
    Source(#[from] CoordinatorError),
}

/// InfluxDB storage errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// InfluxDB client error
    #[error("InfluxDB error: {0}")]
    Client(#[from] influxdb2::RequestError),

    /// Invalid data point
    #[error("invalid data point: {0}")]
    InvalidDataPoint(String),
}

impl ConfigError {
    /// Creates a new environment parse error.
    pub fn env_parse(err: impl std::fmt::Display) -> Self {
        Self::EnvParse(err.to_string())
    }

    /// Creates a new invalid configuration error.
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl PortalError {
    /// Creates a server error from HTTP status and response body.
    pub fn server_error(status: reqwest::StatusCode, body: String) -> Self {
        Self::ServerError {
            status: status.as_u16(),
            message: body,
        }
    }

    /// Creates an authentication error from the messages shown by the portal.
    pub fn authentication(errors: Vec<String>) -> Self {
        Self::Authentication { errors }
    }
}

impl ParseError {
    /// Creates an invalid selector error.
    pub fn invalid_selector(selector: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::InvalidSelector {
            selector: selector.into(),
            message: err.to_string(),
        }
    }
}

impl CoordinatorError {
    /// Creates a timeout error.
    pub fn timeout(name: impl Into<String>, timeout: u64) -> Self {
        Self::Timeout {
            name: name.into(),
            timeout,
        }
    }
}

impl ServiceError {
    /// Creates an invalid date error for the offending input.
    pub fn invalid_date(date: impl std::fmt::Display) -> Self {
        Self::InvalidDate {
            date: date.to_string(),
        }
    }
}
