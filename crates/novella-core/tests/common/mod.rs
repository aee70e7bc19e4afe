//! Shared test doubles for the integration suites.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use novella_core::bridge::{ConnectOptions, ConnectionFactory, DuplexConnection, EventHandler};
use novella_core::scroll::ScrollSurface;

/// Duplex connection double: records emissions, lets tests fire
/// server-pushed events inline.
#[derive(Default)]
pub struct MockConnection {
    connected: AtomicBool,
    handlers: Mutex<HashMap<String, Vec<EventHandler>>>,
    emitted: Mutex<Vec<(String, Value)>>,
}

impl MockConnection {
    pub fn new_connected() -> Arc<Self> {
        let conn = Arc::new(Self::default());
        conn.set_connected(true);
        conn
    }

    pub fn set_connected(&self, up: bool) {
        self.connected.store(up, Ordering::SeqCst);
    }

    /// Invoke every handler registered for `event`, synchronously.
    pub fn fire(&self, event: &str, payload: Value) {
        let handlers = self
            .handlers
            .lock()
            .unwrap()
            .get(event)
            .cloned()
            .unwrap_or_default();
        for h in handlers {
            h(payload.clone());
        }
    }

    pub fn emitted(&self) -> Vec<(String, Value)> {
        self.emitted.lock().unwrap().clone()
    }

    pub fn emitted_named(&self, event: &str) -> Vec<Value> {
        self.emitted()
            .into_iter()
            .filter(|(e, _)| e == event)
            .map(|(_, p)| p)
            .collect()
    }

    pub fn handler_count(&self, event: &str) -> usize {
        self.handlers
            .lock()
            .unwrap()
            .get(event)
            .map_or(0, Vec::len)
    }
}

impl DuplexConnection for MockConnection {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn emit(&self, event: &str, payload: Value) {
        self.emitted
            .lock()
            .unwrap()
            .push((event.to_string(), payload));
    }

    fn on(&self, event: &str, handler: EventHandler) {
        self.handlers
            .lock()
            .unwrap()
            .entry(event.to_string())
            .or_default()
            .push(handler);
    }

    fn off(&self, event: &str) {
        self.handlers.lock().unwrap().remove(event);
    }
}

/// Factory double: counts construction attempts, optionally slow or
/// failing first, and always hands out the same mock connection.
pub struct MockFactory {
    pub conn: Arc<MockConnection>,
    pub calls: AtomicUsize,
    pub delay: Option<Duration>,
    pub fail_first: AtomicBool,
}

impl MockFactory {
    pub fn new(conn: Arc<MockConnection>) -> Self {
        Self {
            conn,
            calls: AtomicUsize::new(0),
            delay: None,
            fail_first: AtomicBool::new(false),
        }
    }

    pub fn with_delay(conn: Arc<MockConnection>, delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::new(conn)
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConnectionFactory for MockFactory {
    async fn connect(
        &self,
        _url: &str,
        _options: &ConnectOptions,
    ) -> novella_core::Result<Arc<dyn DuplexConnection>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_first.swap(false, Ordering::SeqCst) {
            return Err(novella_core::Error::Connection(
                "server unreachable".to_string(),
            ));
        }
        Ok(self.conn.clone())
    }
}

/// Viewport double recording every absolute scroll.
#[derive(Default)]
pub struct MockSurface {
    position: AtomicU32,
    calls: Mutex<Vec<u32>>,
}

impl MockSurface {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Simulate the user scrolling.
    pub fn user_scroll(&self, y: u32) {
        self.position.store(y, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<u32> {
        self.calls.lock().unwrap().clone()
    }
}

impl ScrollSurface for MockSurface {
    fn position(&self) -> u32 {
        self.position.load(Ordering::SeqCst)
    }

    fn scroll_to(&self, y: u32) {
        self.position.store(y, Ordering::SeqCst);
        self.calls.lock().unwrap().push(y);
    }
}

/// Let spawned tasks observe pending wakeups.
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}
