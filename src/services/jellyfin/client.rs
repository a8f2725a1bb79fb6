use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::error::JellyfinError;
use super::types::{AuthenticationResult, Session};

const CLIENT_NAME: &str = "nowplaying-bridge";
const DEVICE_NAME: &str = "Desk HID";

/// Server address and login of the account whose sessions are read.
#[derive(Debug, Clone)]
pub struct JellyfinCredentials {
    /// Base URL, e.g. `http://jellyfin.lan:8096`
    pub server_url: String,
    /// Account name
    pub username: String,
    /// Account password
    pub password: String,
    /// Stable device id announced to the server
    pub device_id: String,
}

/// Jellyfin REST client.
pub struct JellyfinClient {
    credentials: JellyfinCredentials,
    http: Client,
    token: Mutex<Option<String>>,
}

impl JellyfinClient {
    /// Creates a client that shares the given HTTP connection pool.
    pub fn new(http: Client, mut credentials: JellyfinCredentials) -> Self {
        credentials.server_url = credentials.server_url.trim_end_matches('/').to_string();
        Self {
            credentials,
            http,
            token: Mutex::new(None),
        }
    }

    /// Base URL without trailing slash.
    pub fn server_url(&self) -> &str {
        &self.credentials.server_url
    }

    /// Value of the `Authorization` header, with the token once logged in.
    pub fn authorization(&self, token: Option<&str>) -> String {
        let mut header = format!(
            r#"MediaBrowser Client="{CLIENT_NAME}", Device="{DEVICE_NAME}", DeviceId="{}", Version="{}""#,
            self.credentials.device_id,
            env!("CARGO_PKG_VERSION"),
        );
        if let Some(token) = token {
            header.push_str(&format!(r#", Token="{token}""#));
        }
        header
    }

    /// Check the HTTP response for errors and return the body text on failure.
    async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, JellyfinError> {
        if resp.status().is_success() {
            Ok(resp)
        } else {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            warn!(status, "Jellyfin API error");
            Err(JellyfinError::Api {
                status,
                message: body,
            })
        }
    }

    async fn authenticate(&self) -> Result<String, JellyfinError> {
        let resp = self
            .http
            .post(format!("{}/Users/AuthenticateByName", self.server_url()))
            .header("Authorization", self.authorization(None))
            .json(&json!({
                "Username": self.credentials.username,
                "Pw": self.credentials.password,
            }))
            .send()
            .await?;

        if resp.status() == StatusCode::UNAUTHORIZED {
            return Err(JellyfinError::Auth(format!(
                "login rejected for user {}",
                self.credentials.username
            )));
        }

        let resp = Self::check_response(resp).await?;
        let auth: AuthenticationResult = resp
            .json()
            .await
            .map_err(|e| JellyfinError::Parse(e.to_string()))?;

        debug!(user = %self.credentials.username, "authenticated with Jellyfin");
        Ok(auth.access_token)
    }

    async fn session_token(&self) -> Result<String, JellyfinError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            return Ok(token.clone());
        }

        let token = self.authenticate().await?;
        *cached = Some(token.clone());
        Ok(token)
    }

    fn authorized(&self, request: RequestBuilder, token: &str) -> RequestBuilder {
        request.header("Authorization", self.authorization(Some(token)))
    }

    /// All sessions visible to the account.
    ///
    /// A 401 drops the cached token so the next call logs in again.
    ///
    /// # Errors
    /// Returns error on transport, auth or parse failures
    pub async fn sessions(&self) -> Result<Vec<Session>, JellyfinError> {
        let token = self.session_token().await?;

        let resp = self
            .authorized(
                self.http.get(format!("{}/Sessions", self.server_url())),
                &token,
            )
            .send()
            .await?;

        if resp.status() == StatusCode::UNAUTHORIZED {
            *self.token.lock().await = None;
            return Err(JellyfinError::Auth("session token rejected".to_string()));
        }

        let resp = Self::check_response(resp).await?;
        resp.json()
            .await
            .map_err(|e| JellyfinError::Parse(e.to_string()))
    }
}
