use crate::config;
use crate::error::{ConfigError, ParseError, PortalError};
use crate::model::{MeterInfo, UsageHistoryPayload, UsageRecord, UsageSource};
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use reqwest::{Client as HttpClient, Response};
use scraper::Html;
use std::fmt;
use tokio::sync::Mutex;

use crate::watersmart::helper::parse_hostname;
use crate::watersmart::html_parsing::{
    error_messages, extract_account_number, extract_meters, is_valid_account_number,
    login_refresh_token,
};

const DEFAULT_DOMAIN: &str = "watersmart.com";

const LOGIN_PATH: &str = "/index.php/welcome/login?forceEmail=1";
const REALTIME_CHART_PATH: &str = "/index.php/rest/v1/Chart/RealTimeChart";
const USER_PICKER_PATH: &str = "/index.php/userPicker/pick";

/// How long a session is trusted after its last use before the next call
/// logs in again.
const FRESHNESS_WINDOW: TimeDelta = TimeDelta::minutes(10);

/// Client for one WaterSmart account.
///
/// Owns a cookie session with the portal. Every operation that needs a live
/// session first calls `ensure_authenticated`, which logs in when the session
/// is older than the freshness window. The session state is guarded by one
/// async mutex held across login and fetch, so concurrent callers never
/// log in twice.
pub struct Client {
    http_client: HttpClient,
    hostname: String,
    username: String,
    password: String,
    base_url: String,
    session: Mutex<Session>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("hostname", &self.hostname)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
struct Session {
    account_number: Option<String>,
    /// Last login attempt, or last use of a live session
    authenticated_at: Option<DateTime<Utc>>,
    /// Message of the last login failure, cleared by a successful login
    login_failure: Option<String>,
    meters: Vec<MeterInfo>,
    current_meter_id: Option<String>,
}

impl Session {
    fn is_stale(&self, now: DateTime<Utc>) -> bool {
        match self.authenticated_at {
            Some(at) => at < now - FRESHNESS_WINDOW,
            None => true,
        }
    }
}

/// Account metadata read from the page served after login.
struct LandingPage {
    account_number: String,
    meters: Vec<MeterInfo>,
}

impl Client {
    pub fn new(config: config::WaterSmartConfig) -> Result<Self, ConfigError> {
        let (hostname, domain) = parse_hostname(&config.host)?;
        let base_url = match config.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!(
                "https://{}.{}",
                hostname,
                domain.as_deref().unwrap_or(DEFAULT_DOMAIN)
            ),
        };
        let http_client = HttpClient::builder()
            .cookie_store(true)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ConfigError::invalid("http_client", e.to_string()))?;

        Ok(Self {
            http_client,
            hostname,
            username: config.username,
            password: config.password,
            base_url,
            session: Mutex::new(Session::default()),
        })
    }

    /// Portal subdomain, e.g. `bendoregon`.
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Returns the account number detected at the last login.
    pub async fn get_account_number(&self) -> Result<Option<String>, PortalError> {
        let mut session = self.session.lock().await;
        self.ensure_authenticated(&mut session).await?;
        Ok(session.account_number.clone())
    }

    /// Returns the meters offered by the account's user picker.
    pub async fn get_available_meters(&self) -> Result<Vec<MeterInfo>, PortalError> {
        let mut session = self.session.lock().await;
        self.ensure_authenticated(&mut session).await?;
        Ok(session.meters.clone())
    }

    /// Makes `meter_id` the portal's active meter for subsequent fetches.
    pub async fn switch_meter(&self, meter_id: &str) -> Result<(), PortalError> {
        let mut session = self.session.lock().await;
        self.switch_meter_locked(&mut session, meter_id).await
    }

    /// Fetches the hourly usage series of the active meter, or of `meter_id`
    /// when it differs from the active one.
    pub async fn get_hourly_data(
        &self,
        meter_id: Option<&str>,
    ) -> Result<Vec<UsageRecord>, PortalError> {
        let mut session = self.session.lock().await;
        self.ensure_authenticated(&mut session).await?;

        if let Some(meter_id) = meter_id.filter(|id| !id.is_empty()) {
            if session.current_meter_id.as_deref() != Some(meter_id) {
                self.switch_meter_locked(&mut session, meter_id).await?;
            }
        }

        let url = format!("{}{}", self.base_url, REALTIME_CHART_PATH);
        let response = self.http_client.get(&url).send().await?;
        let payload: UsageHistoryPayload = Self::ensure_success(response).await?.json().await?;

        tracing::debug!(
            hostname = %self.hostname,
            records = payload.data.series.len(),
            "Fetched hourly usage"
        );
        Ok(payload.data.series)
    }

    async fn switch_meter_locked(
        &self,
        session: &mut Session,
        meter_id: &str,
    ) -> Result<(), PortalError> {
        let meter = session
            .meters
            .iter()
            .find(|meter| meter.meter_id == meter_id)
            .ok_or_else(|| PortalError::UnknownMeter(meter_id.to_string()))?;

        let url = format!("{}{}", self.base_url, USER_PICKER_PATH);
        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("userID", meter.user_id.as_str()),
                ("residenceID", meter.residence_id.as_str()),
                ("combined", "0"),
                ("returnUrlOverride", ""),
            ])
            .send()
            .await?;
        Self::ensure_success(response).await?;

        tracing::info!(hostname = %self.hostname, meter_id, "Switched active meter");
        session.current_meter_id = Some(meter_id.to_string());
        Ok(())
    }

    /// Logs in when the session is stale; otherwise reuses it.
    ///
    /// Every call on a live session restarts the freshness window. A rejected
    /// login is stamped with its attempt time and reported again from memory
    /// until the window elapses; that window does not slide.
    async fn ensure_authenticated(&self, session: &mut Session) -> Result<(), PortalError> {
        let now = Utc::now();
        if !session.is_stale(now) {
            return match &session.login_failure {
                Some(reason) => Err(PortalError::NotAuthenticated {
                    reason: reason.clone(),
                }),
                None => {
                    session.authenticated_at = Some(now);
                    Ok(())
                }
            };
        }

        let result = self.authenticate(session).await;
        session.authenticated_at = Some(Utc::now());
        session.login_failure = result.as_ref().err().map(|e| e.to_string());

        if let Err(e) = &result {
            tracing::warn!(hostname = %self.hostname, error = %e, "WaterSmart login failed");
        }
        result
    }

    async fn authenticate(&self, session: &mut Session) -> Result<(), PortalError> {
        tracing::debug!(hostname = %self.hostname, "Logging in to WaterSmart");

        let mut body = self.post_login(None).await?;
        if let Some(token) = refresh_token_from(&body)? {
            tracing::debug!(hostname = %self.hostname, "Posting login refresh token");
            body = self.post_login(Some(&token)).await?;
        }

        match self.read_landing_page(&body) {
            Ok(page) => {
                session.account_number = Some(page.account_number);
                session.meters = page.meters;
                tracing::info!(
                    hostname = %self.hostname,
                    meters = session.meters.len(),
                    "Logged in to WaterSmart"
                );
                Ok(())
            }
            Err(e @ PortalError::InvalidAccountNumber(_)) => {
                session.account_number = None;
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    fn read_landing_page(&self, body: &str) -> Result<LandingPage, PortalError> {
        let document = Html::parse_document(body);

        let errors = error_messages(&document)?;
        if !errors.is_empty() {
            return Err(PortalError::authentication(errors));
        }

        let account_number = extract_account_number(&document)?;
        if !is_valid_account_number(&account_number) {
            return Err(PortalError::InvalidAccountNumber(account_number));
        }

        let meters = extract_meters(&document, &self.hostname, Some(&account_number))?;
        Ok(LandingPage {
            account_number,
            meters,
        })
    }

    async fn post_login(&self, refresh_token: Option<&str>) -> Result<String, PortalError> {
        let url = format!("{}{}", self.base_url, LOGIN_PATH);
        let mut form = vec![("token", "")];
        if let Some(token) = refresh_token {
            form.push(("loginRefreshToken", token));
        }
        form.push(("email", self.username.as_str()));
        form.push(("password", self.password.as_str()));

        let response = self.http_client.post(&url).form(&form).send().await?;
        Ok(Self::ensure_success(response).await?.text().await?)
    }

    async fn ensure_success(response: Response) -> Result<Response, PortalError> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await?;
            Err(PortalError::server_error(status, body))
        }
    }
}

fn refresh_token_from(body: &str) -> Result<Option<String>, ParseError> {
    let document = Html::parse_document(body);
    login_refresh_token(&document)
}

#[async_trait]
impl UsageSource for Client {
    async fn get_hourly_data(
        &self,
        meter_id: Option<&str>,
    ) -> Result<Vec<UsageRecord>, PortalError> {
        Client::get_hourly_data(self, meter_id).await
    }
}
