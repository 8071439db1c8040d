//! # SchoolHub
//!
//! A multi-tenant school website platform, usable both as a standalone
//! binary and as a library.
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! schoolhub = { version = "0.0.1", default-features = false }
//! ```
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::path::PathBuf;
//! use schoolhub::config::LifecycleConfig;
//! use schoolhub::lifecycle::Lifecycle;
//! use schoolhub::server::{AppState, create_router};
//! use schoolhub::store::{SqliteStore, Store};
//!
//! let store = SqliteStore::new(&PathBuf::from("./data/schoolhub.db")).unwrap();
//! store.initialize().unwrap();
//! let store: Arc<dyn Store> = Arc::new(store);
//!
//! let lifecycle = Lifecycle::new(store.clone(), LifecycleConfig::default(), "schoolhub.site".into());
//! tokio::spawn(lifecycle.worker().run());
//!
//! let state = Arc::new(AppState {
//!     store,
//!     data_dir: PathBuf::from("./data"),
//!     public_host_suffix: "schoolhub.site".into(),
//!     billing: None,
//!     lifecycle,
//! });
//! let router = create_router(state);
//! // Serve with axum...
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Includes the CLI module. Disable with `default-features = false`.

pub mod auth;
pub mod billing;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod dns;
pub mod error;
pub mod features;
pub mod lifecycle;
pub mod server;
pub mod store;
pub mod types;
