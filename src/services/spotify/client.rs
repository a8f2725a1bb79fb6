use std::time::{Duration, Instant};

use reqwest::{Client, StatusCode};
use tokio::sync::Mutex;
use tracing::debug;

use super::error::SpotifyError;
use super::types::{PlaybackState, TokenResponse};

const ACCOUNTS_URL: &str = "https://accounts.spotify.com";
const API_URL: &str = "https://api.spotify.com";

/// Tokens are refreshed this long before they actually expire.
const EXPIRY_MARGIN: Duration = Duration::from_secs(30);

/// Application credentials plus a long-lived refresh token.
#[derive(Debug, Clone)]
pub struct SpotifyCredentials {
    /// OAuth client id
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: String,
    /// Refresh token obtained once through the authorization-code flow
    pub refresh_token: String,
}

#[derive(Debug)]
struct AccessToken {
    value: String,
    refresh_at: Instant,
}

/// Spotify Web API client.
pub struct SpotifyClient {
    credentials: SpotifyCredentials,
    http: Client,
    token: Mutex<Option<AccessToken>>,
    accounts_url: String,
    api_url: String,
}

impl SpotifyClient {
    /// Creates a client that shares the given HTTP connection pool.
    pub fn new(http: Client, credentials: SpotifyCredentials) -> Self {
        Self {
            credentials,
            http,
            token: Mutex::new(None),
            accounts_url: ACCOUNTS_URL.to_string(),
            api_url: API_URL.to_string(),
        }
    }

    /// Points the client at different hosts, e.g. a local mock.
    pub fn with_base_urls(mut self, accounts_url: &str, api_url: &str) -> Self {
        self.accounts_url = accounts_url.trim_end_matches('/').to_string();
        self.api_url = api_url.trim_end_matches('/').to_string();
        self
    }

    /// Check the HTTP response for errors and return the body text on failure.
    async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, SpotifyError> {
        if resp.status().is_success() {
            Ok(resp)
        } else {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(status, "Spotify API error");
            Err(SpotifyError::Api {
                status,
                message: body,
            })
        }
    }

    async fn refresh_access_token(&self) -> Result<AccessToken, SpotifyError> {
        let resp = self
            .http
            .post(format!("{}/api/token", self.accounts_url))
            .basic_auth(
                &self.credentials.client_id,
                Some(&self.credentials.client_secret),
            )
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", self.credentials.refresh_token.as_str()),
            ])
            .send()
            .await?;

        let resp = match Self::check_response(resp).await {
            Ok(resp) => resp,
            Err(SpotifyError::Api { status, message }) => {
                return Err(SpotifyError::Auth(format!("status {status}: {message}")));
            }
            Err(e) => return Err(e),
        };

        let token: TokenResponse = resp
            .json()
            .await
            .map_err(|e| SpotifyError::Parse(e.to_string()))?;

        debug!(expires_in = token.expires_in, "refreshed Spotify access token");

        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(EXPIRY_MARGIN);
        Ok(AccessToken {
            value: token.access_token,
            refresh_at: Instant::now() + lifetime,
        })
    }

    /// Returns a valid access token, refreshing it when close to expiry.
    ///
    /// # Errors
    /// Returns `SpotifyError::Auth` if the refresh grant is rejected
    pub async fn access_token(&self) -> Result<String, SpotifyError> {
        let mut cached = self.token.lock().await;

        if let Some(token) = cached.as_ref().filter(|t| Instant::now() < t.refresh_at) {
            return Ok(token.value.clone());
        }

        let token = self.refresh_access_token().await?;
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }

    async fn forget_token(&self) {
        *self.token.lock().await = None;
    }

    /// Current playback state, `None` when nothing is active (HTTP 204).
    ///
    /// # Errors
    /// Returns error on transport, auth or parse failures
    pub async fn current_playback(&self) -> Result<Option<PlaybackState>, SpotifyError> {
        let token = self.access_token().await?;

        let resp = self
            .http
            .get(format!("{}/v1/me/player", self.api_url))
            .bearer_auth(token)
            .send()
            .await?;

        match resp.status() {
            StatusCode::NO_CONTENT => return Ok(None),
            StatusCode::UNAUTHORIZED => self.forget_token().await,
            _ => {}
        }

        let resp = Self::check_response(resp).await?;
        let state: PlaybackState = resp
            .json()
            .await
            .map_err(|e| SpotifyError::Parse(e.to_string()))?;

        Ok(Some(state))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use axum::{
        Json, Router,
        http::StatusCode,
        routing::{get, post},
    };
    use serde_json::json;
    use tokio::net::TcpListener;

    use super::*;

    fn credentials() -> SpotifyCredentials {
        SpotifyCredentials {
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
            refresh_token: "refresh".to_string(),
        }
    }

    async fn serve(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn idle_account_reports_nothing_and_token_is_reused() {
        let grants = Arc::new(AtomicUsize::new(0));
        let counter = grants.clone();

        let router = Router::new()
            .route(
                "/api/token",
                post(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                    async { Json(json!({ "access_token": "tok", "expires_in": 3600 })) }
                }),
            )
            .route("/v1/me/player", get(|| async { StatusCode::NO_CONTENT }));
        let base = serve(router).await;

        let client = SpotifyClient::new(Client::new(), credentials()).with_base_urls(&base, &base);

        assert!(client.current_playback().await.unwrap().is_none());
        assert!(client.current_playback().await.unwrap().is_none());
        assert_eq!(grants.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn rejected_refresh_is_an_auth_error() {
        let router = Router::new().route(
            "/api/token",
            post(|| async { (StatusCode::BAD_REQUEST, "invalid_grant") }),
        );
        let base = serve(router).await;

        let client = SpotifyClient::new(Client::new(), credentials()).with_base_urls(&base, &base);

        match client.current_playback().await {
            Err(SpotifyError::Auth(message)) => assert!(message.contains("invalid_grant")),
            other => panic!("expected an auth error, got {other:?}"),
        }
    }
}
