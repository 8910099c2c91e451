//! Validation of user-supplied account settings before an entry is created.

use crate::config::WaterSmartConfig;
use crate::entry::ConfigEntry;
use crate::error::PortalError;
use crate::model::MeterInfo;
use crate::watersmart::Client;
use thiserror::Error;
use tokio::time::{timeout, Duration};

/// Outward category of a failed validation.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupError {
    #[error("cannot_connect")]
    CannotConnect,
    #[error("invalid_auth")]
    InvalidAuth,
    #[error("unknown")]
    Unknown,
}

impl SetupError {
    pub fn as_str(&self) -> &'static str {
        match self {
            SetupError::CannotConnect => "cannot_connect",
            SetupError::InvalidAuth => "invalid_auth",
            SetupError::Unknown => "unknown",
        }
    }
}

impl From<&PortalError> for SetupError {
    fn from(err: &PortalError) -> Self {
        match err {
            PortalError::Http(_) | PortalError::ServerError { .. } => SetupError::CannotConnect,
            PortalError::Authentication { .. }
            | PortalError::NotAuthenticated { .. }
            | PortalError::InvalidAccountNumber(_) => SetupError::InvalidAuth,
            PortalError::Scrape(_) | PortalError::UnknownMeter(_) => SetupError::Unknown,
        }
    }
}

/// Logs in once with `config` and reads the account number.
///
/// Returns the logged-in client for reuse together with the entry to create.
pub async fn validate_input(
    config: WaterSmartConfig,
    login_timeout: Duration,
) -> Result<(Client, ConfigEntry), SetupError> {
    let client = Client::new(config.clone()).map_err(|e| {
        tracing::error!(error = %e, "Invalid WaterSmart settings");
        SetupError::Unknown
    })?;

    let account_number = match timeout(login_timeout, client.get_account_number()).await {
        Ok(Ok(account_number)) => account_number,
        Ok(Err(e)) => {
            let category = SetupError::from(&e);
            tracing::error!(error = %e, category = category.as_str(), "Account validation failed");
            return Err(category);
        }
        Err(_) => {
            tracing::error!(
                timeout = login_timeout.as_secs(),
                "Account validation timed out"
            );
            return Err(SetupError::CannotConnect);
        }
    };

    if account_number.is_none() {
        return Err(SetupError::InvalidAuth);
    }

    let entry = ConfigEntry::new(&config, client.hostname());
    tracing::info!(hostname = client.hostname(), "Validated WaterSmart account");
    Ok((client, entry))
}

/// Lists the meters of the account and activates `meter_id` when given.
pub async fn select_meter(
    client: &Client,
    meter_id: Option<&str>,
) -> Result<Vec<MeterInfo>, PortalError> {
    let meters = client.get_available_meters().await?;
    for meter in &meters {
        tracing::info!(
            meter_id = %meter.meter_id,
            name = %meter.name,
            account_number = %meter.account_number,
            "Available meter"
        );
    }

    if let Some(meter_id) = meter_id.filter(|id| !id.is_empty()) {
        client.switch_meter(meter_id).await?;
    }
    Ok(meters)
}
