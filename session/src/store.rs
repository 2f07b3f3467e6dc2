use std::{
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use api::{ApiClient, ApiError};
use secrecy::SecretString;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use types::{Credentials, Identity, Role};

use crate::SessionState;

const LOGIN_FAILED: &str = "Login failed";
const LOGIN_CANCELLED: &str = "Login cancelled";
const LOGIN_SUPERSEDED: &str = "Login superseded by a newer session request";

/// Why a login did not produce a session. The message is meant for display.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct LoginFailure {
    message: String,
}

impl LoginFailure {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    fn from_api_error(error: &ApiError) -> Self {
        Self::new(error.server_message().unwrap_or(LOGIN_FAILED))
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// What to do with the local session when the remote logout fails.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum LogoutPolicy {
    /// Clear local state whatever the service says.
    #[default]
    ForceClear,
    /// Clear local state only once the service confirms the logout.
    ClearOnSuccess,
}

/// Sequence number taken when an operation is issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Ticket(u64);

/// Owns the current session and keeps it in step with the authentication service.
///
/// Only the store's own operations write the state. Readers take snapshots
/// with [`SessionStore::snapshot`] or follow changes through
/// [`SessionStore::subscribe`].
///
/// Operations may overlap. Each takes a ticket when issued and its response is
/// applied only if no other operation was issued after it; later responses to
/// older requests are dropped.
pub struct SessionStore {
    client: ApiClient,
    state: watch::Sender<SessionState>,
    issued: AtomicU64,
    latest_check: AtomicU64,
    shutdown: CancellationToken,
}

impl SessionStore {
    /// A store in the initial state. No session check is run; see [`SessionStore::start`].
    pub fn new(client: ApiClient) -> Self {
        let (state, _) = watch::channel(SessionState::initial());

        Self {
            client,
            state,
            issued: AtomicU64::new(0),
            latest_check: AtomicU64::new(0),
            shutdown: CancellationToken::new(),
        }
    }

    /// Create a store and run the startup session check in the background.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(client: ApiClient) -> Arc<Self> {
        let store = Arc::new(Self::new(client));

        let startup = Arc::clone(&store);
        tokio::spawn(async move {
            startup.check_session().await;
        });

        store
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Wait until a session check has lowered the loading flag and return the
    /// settled state.
    ///
    /// A store begins in the loading state. Call this on a store from
    /// [`SessionStore::start`], or after [`SessionStore::check_session`] has
    /// been issued; on a fresh [`SessionStore::new`] store nothing lowers the
    /// flag and this never returns.
    pub async fn ready(&self) -> SessionState {
        let mut receiver = self.subscribe();
        let settled = receiver
            .wait_for(|state| !state.is_loading())
            .await
            .map(|state| state.clone());

        // The sender lives as long as `self`, so the wait cannot fail.
        settled.unwrap_or_else(|_| self.snapshot())
    }

    /// Cancel every in-flight and future operation of this store.
    pub fn close(&self) {
        self.shutdown.cancel();
    }

    pub async fn login(
        &self,
        email: &str,
        password: &SecretString,
        role: Role,
    ) -> Result<Identity, LoginFailure> {
        self.login_cancellable(email, password, role, &CancellationToken::new())
            .await
    }

    /// Sign in and adopt the returned identity.
    ///
    /// On failure the current session is left as it was.
    pub async fn login_cancellable(
        &self,
        email: &str,
        password: &SecretString,
        role: Role,
        cancel: &CancellationToken,
    ) -> Result<Identity, LoginFailure> {
        let ticket = self.issue();
        let credentials = Credentials::new(email, password.clone());

        let Some(response) = self
            .until_cancelled(cancel, self.client.login(role, &credentials))
            .await
        else {
            tracing::debug!(%role, "login cancelled");
            return Err(LoginFailure::new(LOGIN_CANCELLED));
        };

        let identity = match response {
            Ok(Some(identity)) => identity,
            Ok(None) => {
                tracing::warn!(%role, "login response carried no user");
                return Err(LoginFailure::new(LOGIN_FAILED));
            }
            Err(error) => {
                tracing::warn!(%role, %error, "login failed");
                return Err(LoginFailure::from_api_error(&error));
            }
        };

        if !self.apply(ticket, |state| state.set_identity(Some(identity.clone()))) {
            return Err(LoginFailure::new(LOGIN_SUPERSEDED));
        }

        tracing::info!(user = %identity.email, role = %identity.role, "logged in");
        Ok(identity)
    }

    pub async fn logout(&self, policy: LogoutPolicy) -> bool {
        self.logout_cancellable(policy, &CancellationToken::new())
            .await
    }

    /// Sign out on the side matching the current role.
    ///
    /// Does nothing when nobody is signed in. Returns whether the local session
    /// was cleared. A failed remote call is logged and otherwise handled per
    /// `policy`.
    pub async fn logout_cancellable(
        &self,
        policy: LogoutPolicy,
        cancel: &CancellationToken,
    ) -> bool {
        let role = self.state.borrow().identity().map(|identity| identity.role);
        let Some(role) = role else {
            return false;
        };

        let ticket = self.issue();

        let Some(response) = self
            .until_cancelled(cancel, self.client.logout(role))
            .await
        else {
            tracing::debug!(%role, "logout cancelled");
            return false;
        };

        let confirmed = match response {
            Ok(()) => true,
            Err(error) => {
                tracing::warn!(%role, %error, "logout request failed");
                false
            }
        };

        if !confirmed && policy == LogoutPolicy::ClearOnSuccess {
            return false;
        }

        let cleared = self.apply(ticket, |state| state.set_identity(None));
        if cleared {
            tracing::info!(%role, confirmed, "logged out");
        }
        cleared
    }

    pub async fn check_session(&self) {
        self.check_session_cancellable(&CancellationToken::new())
            .await
    }

    /// Ask the service who is signed in and adopt the answer.
    ///
    /// Anything other than a user in the response clears the session. The
    /// loading flag is raised for the duration and always lowered again once
    /// the most recent check finishes, whether it succeeded, failed or was
    /// cancelled.
    pub async fn check_session_cancellable(&self, cancel: &CancellationToken) {
        let ticket = self.issue();
        self.latest_check.store(ticket.0, Ordering::SeqCst);
        self.state.send_if_modified(|state| {
            let was_loading = state.is_loading();
            state.set_loading(true);
            !was_loading
        });

        let outcome = self
            .until_cancelled(cancel, self.client.current_user())
            .await
            .map(|response| match response {
                Ok(identity) => identity,
                Err(error) => {
                    tracing::warn!(%error, "session check failed");
                    None
                }
            });

        if outcome.is_none() {
            tracing::debug!("session check cancelled");
        }

        self.state.send_if_modified(|state| {
            let before = state.clone();

            if let Some(identity) = outcome {
                if self.is_current(ticket) {
                    state.set_identity(identity);
                } else {
                    tracing::debug!(ticket = ticket.0, "discarding stale session check");
                }
            }

            if self.latest_check.load(Ordering::SeqCst) == ticket.0 {
                state.set_loading(false);
            }

            *state != before
        });
    }

    fn issue(&self) -> Ticket {
        Ticket(self.issued.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn is_current(&self, ticket: Ticket) -> bool {
        self.issued.load(Ordering::SeqCst) == ticket.0
    }

    /// Apply `update` if `ticket` is still the latest. Returns whether it was.
    fn apply(&self, ticket: Ticket, update: impl FnOnce(&mut SessionState)) -> bool {
        let mut applied = false;

        self.state.send_if_modified(|state| {
            if !self.is_current(ticket) {
                tracing::debug!(ticket = ticket.0, "discarding stale response");
                return false;
            }

            applied = true;
            let before = state.clone();
            update(state);
            *state != before
        });

        applied
    }

    async fn until_cancelled<T>(
        &self,
        cancel: &CancellationToken,
        request: impl Future<Output = T>,
    ) -> Option<T> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => None,
            () = self.shutdown.cancelled() => None,
            output = request => Some(output),
        }
    }
}
