//! Single shared duplex connection and its link-state machine.
//!
//! The platform keeps one long-lived, auto-reconnecting duplex link to
//! the server per tab, regardless of how many components want it. The
//! bridge owns that single-instance guarantee: construction goes through
//! an async once-cell, so concurrent acquirers converge on the same
//! in-flight attempt instead of racing to create duplicates.
//!
//! Reconnection itself (bounded attempts, backed-off delay, transport
//! fallback) is executed by the connection library behind
//! [`DuplexConnection`]; the bridge hands over the bounds via
//! [`ConnectOptions`] and mirrors the library's lifecycle events into a
//! [`LinkState`] watch channel that consumers subscribe to.
//!
//! # State machine
//!
//! ```text
//! Disconnected → Connecting → Connected
//!                                 ↓ transient loss
//!                            Reconnecting → Connected
//!                                 ↓ attempts exhausted
//!                            Disconnected
//! ```
//!
//! Every transition into `Connected` (including after a reconnect) gives
//! the server a fresh socket with no memory of the previous identity
//! binding; the session coordinator watches the channel and re-issues
//! [`authenticate_user`].
//!
//! Connection failures are logged and reflected in the channel, never
//! raised to callers — the UI shows a passive connectivity indicator.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use serde_json::{Value, json};
use tokio::sync::{OnceCell, watch};
use tracing::{debug, info, warn};

use crate::config::{ConnectionConfig, Transport};

/// Server-lifecycle event names on the duplex connection.
pub const CONNECT_EVENT: &str = "connect";
pub const DISCONNECT_EVENT: &str = "disconnect";
pub const RECONNECT_FAILED_EVENT: &str = "reconnect_failed";
/// Client → server identity announcement.
pub const AUTHENTICATE_EVENT: &str = "authenticate";
/// Server → client session invalidation.
pub const FORCE_LOGOUT_EVENT: &str = "force_logout";

/// Callback invoked with an event payload.
pub type EventHandler = Arc<dyn Fn(Value) + Send + Sync>;

/// Duplex connection collaborator (socket.io-style client).
///
/// `on` replaces nothing: multiple handlers may be registered per event,
/// which is why [`attach_force_logout`] detaches before attaching.
pub trait DuplexConnection: Send + Sync {
    /// Whether the underlying socket is currently up.
    fn is_connected(&self) -> bool;
    /// Fire-and-forget event emission.
    fn emit(&self, event: &str, payload: Value);
    /// Register a handler for a server-pushed event.
    fn on(&self, event: &str, handler: EventHandler);
    /// Remove all handlers for an event.
    fn off(&self, event: &str);
}

/// Constructs duplex connections. Implemented by the host over the real
/// transport library; tests use mocks.
#[async_trait]
pub trait ConnectionFactory: Send + Sync {
    async fn connect(
        &self,
        url: &str,
        options: &ConnectOptions,
    ) -> crate::Result<Arc<dyn DuplexConnection>>;
}

// =============================================================================
// Options
// =============================================================================

/// Bounds handed to the connection library.
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    /// Maximum reconnection attempts before staying down until reload.
    pub reconnection_attempts: u32,
    /// Initial reconnection delay.
    pub reconnection_delay: Duration,
    /// Cap on the backed-off reconnection delay.
    pub reconnection_delay_max: Duration,
    /// Connection establishment timeout.
    pub timeout: Duration,
    /// Ordered transport preference, low-compatibility first.
    pub transports: Vec<Transport>,
    /// Random jitter range as a fraction of the base delay.
    pub jitter_percent: f64,
}

impl ConnectOptions {
    /// Build options from configuration.
    #[must_use]
    pub fn from_config(config: &ConnectionConfig) -> Self {
        Self {
            reconnection_attempts: config.reconnection_attempts,
            reconnection_delay: Duration::from_millis(config.reconnection_delay_ms),
            reconnection_delay_max: Duration::from_millis(config.reconnection_delay_max_ms),
            timeout: Duration::from_millis(config.connection_timeout_ms),
            transports: config.transports.clone(),
            jitter_percent: config.reconnection_jitter_percent.clamp(0.0, 1.0),
        }
    }

    /// Delay before reconnect attempt `attempt` (0-based): doubled per
    /// attempt, capped at the maximum, with bounded random jitter.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(31);
        let base = self
            .reconnection_delay
            .saturating_mul(2_u32.saturating_pow(exponent))
            .min(self.reconnection_delay_max);
        if self.jitter_percent <= 0.0 {
            return base;
        }
        let spread = base.as_secs_f64() * self.jitter_percent;
        let jitter = rand::rng().random_range(-spread..=spread);
        Duration::from_secs_f64((base.as_secs_f64() + jitter).max(0.0))
    }
}

// =============================================================================
// Link state
// =============================================================================

/// Observable lifecycle of the shared link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// No link, and no attempt in progress.
    Disconnected,
    /// Initial construction in flight.
    Connecting,
    /// Link established.
    Connected,
    /// Transient loss; the library is retrying within its bounds.
    Reconnecting,
}

// =============================================================================
// Bridge
// =============================================================================

/// Owns the single shared connection per tab.
pub struct ConnectionBridge {
    factory: Arc<dyn ConnectionFactory>,
    config: ConnectionConfig,
    cell: OnceCell<Arc<dyn DuplexConnection>>,
    state_tx: Arc<watch::Sender<LinkState>>,
}

impl ConnectionBridge {
    /// Create a bridge. No connection is made until [`Self::acquire`].
    #[must_use]
    pub fn new(factory: Arc<dyn ConnectionFactory>, config: ConnectionConfig) -> Self {
        let (state_tx, _) = watch::channel(LinkState::Disconnected);
        Self {
            factory,
            config,
            cell: OnceCell::new(),
            state_tx: Arc::new(state_tx),
        }
    }

    /// The shared connection, constructing it exactly once.
    ///
    /// Concurrent callers while construction is in flight all await the
    /// same attempt and observe the same instance. A failed attempt
    /// leaves the bridge `Disconnected`; a later call retries
    /// (explicit re-acquisition).
    pub async fn acquire(&self) -> crate::Result<Arc<dyn DuplexConnection>> {
        self.cell
            .get_or_try_init(|| async {
                self.state_tx.send_replace(LinkState::Connecting);
                let url = self.config.socket_url();
                let options = ConnectOptions::from_config(&self.config);
                info!(url, "establishing duplex connection");
                match self.factory.connect(&url, &options).await {
                    Ok(conn) => {
                        self.wire_state_events(conn.as_ref());
                        if conn.is_connected() {
                            self.state_tx.send_replace(LinkState::Connected);
                        }
                        Ok(conn)
                    }
                    Err(e) => {
                        warn!(url, error = %e, "duplex connection failed");
                        self.state_tx.send_replace(LinkState::Disconnected);
                        Err(e)
                    }
                }
            })
            .await
            .cloned()
    }

    /// The shared connection if one has been constructed.
    #[must_use]
    pub fn connection(&self) -> Option<Arc<dyn DuplexConnection>> {
        self.cell.get().cloned()
    }

    /// Current link state.
    #[must_use]
    pub fn state(&self) -> LinkState {
        *self.state_tx.borrow()
    }

    /// Whether the link is currently up.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state() == LinkState::Connected
    }

    /// Subscribe to link-state transitions.
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<LinkState> {
        self.state_tx.subscribe()
    }

    fn wire_state_events(&self, conn: &dyn DuplexConnection) {
        let tx = Arc::clone(&self.state_tx);
        conn.on(
            CONNECT_EVENT,
            Arc::new(move |_| {
                debug!("duplex connection up");
                tx.send_replace(LinkState::Connected);
            }),
        );
        let tx = Arc::clone(&self.state_tx);
        conn.on(
            DISCONNECT_EVENT,
            Arc::new(move |_| {
                debug!("duplex connection lost, library is retrying");
                tx.send_replace(LinkState::Reconnecting);
            }),
        );
        let tx = Arc::clone(&self.state_tx);
        conn.on(
            RECONNECT_FAILED_EVENT,
            Arc::new(move |_| {
                warn!("reconnection attempts exhausted");
                tx.send_replace(LinkState::Disconnected);
            }),
        );
    }
}

// =============================================================================
// Operations over a connection
// =============================================================================

/// Announce the authenticated user identity to the server.
///
/// Fire-and-forget: silently ignored unless the connection is up and an
/// identity is present. Failure is only observable through subsequent
/// server-driven behavior.
pub fn authenticate_user(conn: &dyn DuplexConnection, user_id: Option<u64>) {
    let Some(id) = user_id else { return };
    if !conn.is_connected() {
        return;
    }
    debug!(user_id = id, "announcing identity to server");
    conn.emit(AUTHENTICATE_EVENT, json!({ "userId": id }));
}

/// Register the server-pushed forced-logout listener.
///
/// Detaches any previous listener first so re-attaching never
/// duplicates handlers. The callback receives the server-supplied
/// reason and must clear the local session immediately.
pub fn attach_force_logout(
    conn: &dyn DuplexConnection,
    on_force_logout: Arc<dyn Fn(String) + Send + Sync>,
) {
    conn.off(FORCE_LOGOUT_EVENT);
    conn.on(
        FORCE_LOGOUT_EVENT,
        Arc::new(move |payload| {
            let reason = logout_reason(&payload);
            warn!(reason, "server forced logout");
            on_force_logout(reason);
        }),
    );
}

/// Remove the forced-logout listener.
pub fn detach_force_logout(conn: &dyn DuplexConnection) {
    conn.off(FORCE_LOGOUT_EVENT);
}

fn logout_reason(payload: &Value) -> String {
    match payload {
        Value::String(s) => s.clone(),
        Value::Object(map) => map
            .get("message")
            .or_else(|| map.get("reason"))
            .and_then(Value::as_str)
            .unwrap_or("Session terminated by server")
            .to_string(),
        _ => "Session terminated by server".to_string(),
    }
}
