//! Authenticated-user ownership and synchronization with the bridge.
//!
//! The coordinator owns the local user value and keeps the server's
//! socket-side identity binding in step with it: whenever a user is
//! present and the shared connection exists, it announces the identity
//! and wires the forced-logout listener. Because a reconnect produces a
//! fresh socket with no memory of the previous binding, [`run_reauth`]
//! watches the bridge's state channel and re-announces on every
//! transition into `Connected`.
//!
//! Faults are values on coordinator state, never panics or errors
//! thrown across the public boundary. A failed session fetch on mount
//! means "anonymous", and logout always succeeds locally even when the
//! remote call fails — client-side sign-out is never blocked by the
//! network.
//!
//! [`run_reauth`]: SessionCoordinator::run_reauth

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::bridge::{self, ConnectionBridge, LinkState};

// =============================================================================
// Collaborator interface
// =============================================================================

/// Authenticated platform user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Server-side user identifier, announced over the duplex link.
    pub id: u64,
    /// Display name.
    pub username: String,
}

/// Login credentials.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Shape of every session API reply.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub user: Option<User>,
    pub message: Option<String>,
    #[serde(default)]
    pub requires_verification: bool,
}

/// Transport-level failure of a session API call.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(String),
}

/// HTTP session collaborator ("who am I" / login / logout). The backend
/// protocol is out of scope; the host implements this over its client.
pub trait SessionApi: Send + Sync {
    fn who_am_i(&self) -> impl Future<Output = Result<ApiResponse, ApiError>> + Send;
    fn login(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<ApiResponse, ApiError>> + Send;
    fn logout(&self) -> impl Future<Output = Result<ApiResponse, ApiError>> + Send;
    fn logout_all(&self) -> impl Future<Output = Result<ApiResponse, ApiError>> + Send;
}

// =============================================================================
// Faults
// =============================================================================

/// Session fault taxonomy. Serialized tags match the platform's UI
/// contract (`"error"` for the uncategorized kind).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
    /// Bad credentials.
    Auth,
    /// Email not yet verified; the UI switches to a verification prompt.
    Verification,
    /// Server-initiated session invalidation.
    ForceLogout,
    /// Uncategorized or network failure.
    #[serde(rename = "error")]
    Other,
}

/// A user-visible session fault, displayed inline by the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionFault {
    #[serde(rename = "type")]
    pub kind: FaultKind,
    pub message: String,
}

/// Outcome of a login attempt. Never an `Err`: failures are typed values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Credentials accepted; the user is set and announced.
    LoggedIn(User),
    /// Credentials accepted but the email is unverified; no user is set.
    VerificationRequired,
    /// Login failed with a typed, displayable fault.
    Failed(SessionFault),
}

#[derive(Debug, Default)]
struct SessionState {
    user: Option<User>,
    fault: Option<SessionFault>,
}

// =============================================================================
// Coordinator
// =============================================================================

/// Owns the authenticated-user value and keeps the bridge in step.
pub struct SessionCoordinator<A: SessionApi> {
    api: A,
    bridge: Arc<ConnectionBridge>,
    state: Arc<Mutex<SessionState>>,
}

impl<A: SessionApi> SessionCoordinator<A> {
    /// Create a coordinator over a session API and the shared bridge.
    #[must_use]
    pub fn new(api: A, bridge: Arc<ConnectionBridge>) -> Self {
        Self {
            api,
            bridge,
            state: Arc::new(Mutex::new(SessionState::default())),
        }
    }

    /// Fetch the current session's user on startup.
    ///
    /// An absent or unfetchable user is anonymous, not an error.
    pub async fn bootstrap(&self) {
        match self.api.who_am_i().await {
            Ok(resp) if resp.success && resp.user.is_some() => {
                let user = resp.user.clone();
                debug!(user_id = user.as_ref().map(|u| u.id), "session restored");
                self.lock().user = user;
            }
            Ok(_) => {
                self.lock().user = None;
            }
            Err(e) => {
                debug!(error = %e, "session fetch failed, treating as anonymous");
                self.lock().user = None;
            }
        }
        self.sync();
    }

    /// Synchronize the bridge with the current user.
    ///
    /// When a user is present and the shared connection exists, announce
    /// the identity and (re-)wire the forced-logout listener. Safe to
    /// call repeatedly; listener attachment dedupes.
    pub fn sync(&self) {
        let Some(conn) = self.bridge.connection() else {
            return;
        };
        let Some(user) = self.current_user() else {
            return;
        };
        bridge::authenticate_user(conn.as_ref(), Some(user.id));
        let state = Arc::clone(&self.state);
        bridge::attach_force_logout(
            conn.as_ref(),
            Arc::new(move |reason| {
                let mut s = state.lock().unwrap_or_else(PoisonError::into_inner);
                s.user = None;
                s.fault = Some(SessionFault {
                    kind: FaultKind::ForceLogout,
                    message: reason,
                });
            }),
        );
    }

    /// Attempt a login. Failures are typed values, never errors.
    pub async fn login(&self, credentials: &Credentials) -> LoginOutcome {
        match self.api.login(credentials).await {
            Ok(resp) if resp.success => match resp.user {
                Some(user) => {
                    info!(user_id = user.id, "logged in");
                    {
                        let mut s = self.lock();
                        s.user = Some(user.clone());
                        s.fault = None;
                    }
                    self.sync();
                    LoginOutcome::LoggedIn(user)
                }
                None => self.fail(FaultKind::Other, "malformed login response".to_string()),
            },
            Ok(resp) if resp.requires_verification => LoginOutcome::VerificationRequired,
            Ok(resp) => self.fail(
                FaultKind::Auth,
                resp.message
                    .unwrap_or_else(|| "invalid credentials".to_string()),
            ),
            Err(e) => self.fail(FaultKind::Other, e.to_string()),
        }
    }

    /// Sign out of this session. The local user is cleared even when the
    /// remote call fails.
    pub async fn logout(&self) {
        if let Err(e) = self.api.logout().await {
            warn!(error = %e, "remote logout failed, clearing locally anyway");
        }
        self.clear_local_session();
    }

    /// Sign out of every session for this user. Local clearing is
    /// unconditional, as with [`Self::logout`].
    pub async fn logout_all(&self) {
        if let Err(e) = self.api.logout_all().await {
            warn!(error = %e, "remote logout-all failed, clearing locally anyway");
        }
        self.clear_local_session();
    }

    /// Re-announce the identity on every transition into `Connected`.
    ///
    /// Runs until the bridge is dropped. Spawn it once from the host
    /// shell; reconnects then re-authenticate without any caller
    /// involvement.
    pub async fn run_reauth(&self) {
        let mut rx = self.bridge.watch_state();
        loop {
            if rx.changed().await.is_err() {
                return;
            }
            if *rx.borrow_and_update() == LinkState::Connected {
                debug!("link up, re-synchronizing identity");
                self.sync();
            }
        }
    }

    /// Current user, if any.
    #[must_use]
    pub fn current_user(&self) -> Option<User> {
        self.lock().user.clone()
    }

    /// Most recent fault, if any.
    #[must_use]
    pub fn last_fault(&self) -> Option<SessionFault> {
        self.lock().fault.clone()
    }

    /// Clear the displayed fault (e.g. after the UI has shown it).
    pub fn clear_fault(&self) {
        self.lock().fault = None;
    }

    fn clear_local_session(&self) {
        if let Some(conn) = self.bridge.connection() {
            bridge::detach_force_logout(conn.as_ref());
        }
        let mut s = self.lock();
        s.user = None;
        info!("local session cleared");
    }

    fn fail(&self, kind: FaultKind, message: String) -> LoginOutcome {
        let fault = SessionFault { kind, message };
        self.lock().fault = Some(fault.clone());
        LoginOutcome::Failed(fault)
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
