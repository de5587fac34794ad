use oauth2::basic::BasicClient;
use oauth2::{
    AuthUrl, ClientId, ClientSecret, HttpRequest, HttpResponse, RequestTokenError, Scope,
    TokenResponse, TokenUrl,
};
use reqwest::Client;
use std::time::{Duration, SystemTime};
use threadmood_core::{CoreError, RedditApiError, RedditCredentials};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

const AUTHORIZE_URL: &str = "https://www.reddit.com/api/v1/authorize";
const TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";

/// Tokens are refreshed this long before Reddit would reject them.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);
const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone)]
pub struct RedditOAuth2Config {
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: String,
}

impl RedditOAuth2Config {
    pub fn new(client_id: String, client_secret: String, user_agent: String) -> Self {
        Self {
            client_id,
            client_secret,
            user_agent,
        }
    }
}

impl From<RedditCredentials> for RedditOAuth2Config {
    fn from(credentials: RedditCredentials) -> Self {
        Self::new(
            credentials.client_id,
            credentials.client_secret,
            credentials.user_agent,
        )
    }
}

#[derive(Debug, Clone)]
pub struct RedditToken {
    pub access_token: String,
    pub expires_at: SystemTime,
    pub scope: Vec<String>,
}

impl RedditToken {
    pub fn is_usable(&self) -> bool {
        SystemTime::now() + EXPIRY_MARGIN < self.expires_at
    }
}

#[derive(Debug, Clone)]
pub enum AuthState {
    NotAuthenticated,
    Authenticated { expires_at: SystemTime },
    TokenExpired { expired_at: SystemTime },
}

/// Application-only OAuth2 (client credentials grant) with a cached token.
#[derive(Debug)]
pub struct TokenManager {
    oauth_client: BasicClient,
    token: Mutex<Option<RedditToken>>,
}

impl TokenManager {
    pub fn new(config: &RedditOAuth2Config) -> Result<Self, CoreError> {
        let auth_url = AuthUrl::new(AUTHORIZE_URL.to_string()).map_err(|e| CoreError::Internal {
            message: format!("Invalid authorize URL: {}", e),
        })?;
        let token_url = TokenUrl::new(TOKEN_URL.to_string()).map_err(|e| CoreError::Internal {
            message: format!("Invalid token URL: {}", e),
        })?;

        let oauth_client = BasicClient::new(
            ClientId::new(config.client_id.clone()),
            Some(ClientSecret::new(config.client_secret.clone())),
            auth_url,
            Some(token_url),
        );

        Ok(Self {
            oauth_client,
            token: Mutex::new(None),
        })
    }

    pub async fn auth_state(&self) -> AuthState {
        match self.token.lock().await.as_ref() {
            None => AuthState::NotAuthenticated,
            Some(token) if token.is_usable() => AuthState::Authenticated {
                expires_at: token.expires_at,
            },
            Some(token) => AuthState::TokenExpired {
                expired_at: token.expires_at,
            },
        }
    }

    pub async fn set_token(&self, token: RedditToken) {
        *self.token.lock().await = Some(token);
    }

    /// Drops the cached token so the next call re-authenticates.
    pub async fn invalidate(&self) {
        if self.token.lock().await.take().is_some() {
            debug!("Cached access token invalidated");
        }
    }

    /// Returns a usable bearer token, exchanging credentials when needed.
    pub async fn access_token(&self, http_client: &Client) -> Result<String, CoreError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.is_usable() {
                return Ok(token.access_token.clone());
            }
            debug!("Access token expired, requesting a new one");
        }

        let token = self.exchange_client_credentials(http_client).await?;
        let access_token = token.access_token.clone();
        *cached = Some(token);
        Ok(access_token)
    }

    async fn exchange_client_credentials(
        &self,
        http_client: &Client,
    ) -> Result<RedditToken, CoreError> {
        info!("Requesting application-only access token");
        let http_client = http_client.clone();
        let response = self
            .oauth_client
            .exchange_client_credentials()
            .add_scope(Scope::new("read".to_string()))
            .request_async(|request| send_oauth_request(http_client, request))
            .await
            .map_err(|e| match e {
                RequestTokenError::Request(e) => CoreError::Network(e),
                RequestTokenError::ServerResponse(response) => {
                    warn!("Token endpoint rejected credentials: {}", response);
                    RedditApiError::AuthenticationFailed {
                        reason: response.to_string(),
                    }
                    .into()
                }
                RequestTokenError::Parse(e, _) => RedditApiError::AuthenticationFailed {
                    reason: format!("Unreadable token response: {}", e),
                }
                .into(),
                RequestTokenError::Other(reason) => {
                    RedditApiError::AuthenticationFailed { reason }.into()
                }
            })?;

        let lifetime = response.expires_in().unwrap_or(DEFAULT_TOKEN_LIFETIME);
        let scope = response
            .scopes()
            .map(|scopes| scopes.iter().map(|s| s.to_string()).collect())
            .unwrap_or_default();

        Ok(RedditToken {
            access_token: response.access_token().secret().clone(),
            expires_at: SystemTime::now() + lifetime,
            scope,
        })
    }
}

/// Sends the token request through our own client so the user agent and
/// timeouts match every other call.
async fn send_oauth_request(
    client: Client,
    request: HttpRequest,
) -> Result<HttpResponse, reqwest::Error> {
    let mut builder = client
        .request(request.method, request.url.as_str())
        .body(request.body);
    for (name, value) in &request.headers {
        builder = builder.header(name, value);
    }

    let response = builder.send().await?;
    let status_code = response.status();
    let headers = response.headers().clone();
    let body = response.bytes().await?.to_vec();

    Ok(HttpResponse {
        status_code,
        headers,
        body,
    })
}
