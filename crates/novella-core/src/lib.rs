//! novella-core: Core client logic for Novella
//!
//! This crate provides the client-side core for the Novella web novel
//! reading platform: navigation history tracking with scroll restoration,
//! back-navigation resolution, and the session/connection bridge that
//! keeps a single duplex server link authenticated.
//!
//! # Architecture
//!
//! ```text
//! Router events → NavigationTracker → ScrollPlan → ScrollDriver → ScrollSurface
//!                        ↓
//!              Transition log → BackNavResolver
//!
//! SessionApi ←→ SessionCoordinator ←→ ConnectionBridge → DuplexConnection
//! ```
//!
//! The two halves are independent: the tracker never touches the bridge
//! and vice versa. Both are consumed by the host shell, which implements
//! the collaborator traits (`ScrollSurface`, `ConnectionFactory`,
//! `SessionApi`, `KeyValueStore`) over the real browser/router/socket.
//!
//! # Modules
//!
//! - `navigation`: Route-change tracking and scroll-behavior decisions
//! - `scroll`: Cancellable retry execution of scroll plans
//! - `back_nav`: "Where should back land" policy over the transition log
//! - `bridge`: Single shared duplex connection and its link-state machine
//! - `session`: Authenticated-user ownership and re-auth on reconnect
//! - `preferences`: Small JSON-under-fixed-keys UI preference store
//! - `config`: Configuration management
//! - `logging`: Structured logging setup
//!
//! # Safety
//!
//! This crate forbids unsafe code.

#![forbid(unsafe_code)]

pub mod back_nav;
pub mod bridge;
pub mod config;
pub mod error;
pub mod logging;
pub mod navigation;
pub mod preferences;
pub mod scroll;
pub mod session;

pub use error::{Error, Result};
