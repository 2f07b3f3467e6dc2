use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::json;
use types::{Complaint, Credentials, Identity, Role, UserCount};

use crate::{
    Config,
    error::{ApiError, ErrorBody},
};

trait ReqwestExt {
    async fn try_send_empty(self) -> Result<Response, ApiError>;
    async fn try_send<T: DeserializeOwned>(self) -> Result<T, ApiError>;
}

impl ReqwestExt for RequestBuilder {
    async fn try_send_empty(self) -> Result<Response, ApiError> {
        let response = self.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.bytes().await.unwrap_or_default();
        let message = serde_json::from_slice::<ErrorBody>(&body)
            .ok()
            .and_then(|body| body.msg);

        Err(ApiError::Status { status, message })
    }

    async fn try_send<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        let body = self.try_send_empty().await?.bytes().await?;

        match serde_json::from_slice(&body) {
            Ok(r) => Ok(r),
            Err(error) => {
                tracing::debug!(%error, len = body.len(), "failed to parse response");
                Err(error.into())
            }
        }
    }
}

#[derive(Deserialize)]
struct UserEnvelope {
    #[serde(default)]
    user: Option<Identity>,
}

/// Client for the complaint service.
///
/// Cookies set by the service are kept and sent back on every request, so a
/// session established by [`ApiClient::login`] carries over to later calls on
/// the same client (and its clones).
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let mut builder = Client::builder().cookie_store(true);
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: config.api_url.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let url = self.base_url.join(path)?;
        tracing::debug!(%method, %url, "sending request");

        Ok(self.client.request(method, url))
    }

    fn get(&self, path: impl AsRef<str>) -> Result<RequestBuilder, ApiError> {
        self.request(Method::GET, path.as_ref())
    }

    fn post(&self, path: impl AsRef<str>) -> Result<RequestBuilder, ApiError> {
        self.request(Method::POST, path.as_ref())
    }

    /// Sign in on the user or admin side.
    ///
    /// `Ok(None)` means the service accepted the request but sent no user.
    pub async fn login(
        &self,
        role: Role,
        credentials: &Credentials,
    ) -> Result<Option<Identity>, ApiError> {
        let path = match role {
            Role::Admin => "api/auth/admin-login",
            Role::User => "api/auth/login",
        };

        let envelope: UserEnvelope = self.post(path)?.json(credentials).try_send().await?;
        Ok(envelope.user)
    }

    pub async fn logout(&self, role: Role) -> Result<(), ApiError> {
        let path = match role {
            Role::Admin => "api/auth/admin-logout",
            Role::User => "api/auth/logout",
        };

        self.post(path)?.json(&json!({})).try_send_empty().await?;
        Ok(())
    }

    /// Who the service thinks we are, based on the session cookie.
    pub async fn current_user(&self) -> Result<Option<Identity>, ApiError> {
        let envelope: UserEnvelope = self.get("api/auth/me")?.try_send().await?;
        Ok(envelope.user)
    }

    pub async fn list_complaints(&self) -> Result<Vec<Complaint>, ApiError> {
        self.get("api/complaints/all")?.try_send().await
    }

    pub async fn user_count(&self) -> Result<u64, ApiError> {
        let count: UserCount = self.get("api/auth/users/count")?.try_send().await?;
        Ok(count.get())
    }
}
