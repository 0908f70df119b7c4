//! authsync client
//!
//! Keeps a local copy of the current session's authorization state
//! (permission set and role) in sync with the backend's `/api/me` endpoint,
//! for synchronous gating decisions in the UI shell.
//!
//! Failures are fail-closed: any fetch that does not produce a readable
//! body leaves the store with no permissions and no role.
//!
//! # Example
//!
//! ```no_run
//! use authsync_client::{AuthorizationStore, StoreConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = AuthorizationStore::new(StoreConfig::from_env())?;
//!
//!     // Refresh now, then every 60 seconds
//!     store.start();
//!
//!     // Gate on the cached state without a network call
//!     if store.state().has("CMS_ORDERS") {
//!         println!("orders page unlocked");
//!     }
//!
//!     // React to changes
//!     let mut rx = store.subscribe();
//!     rx.changed().await?;
//!     println!("role is now {:?}", rx.borrow().role);
//!
//!     store.stop();
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod snapshot;
mod source;
mod state;
mod store;

pub use config::{
    StoreConfig, DEFAULT_ENDPOINT_PATH, DEFAULT_SERVER_URL, ENV_REFRESH_SECS, ENV_SERVER_URL,
    ENV_SESSION_COOKIE, ENV_TIMEOUT_SECS,
};
pub use error::FetchError;
pub use snapshot::AuthorizationSnapshot;
pub use source::{AuthorizationSource, HttpSource};
pub use state::AuthorizationState;
pub use store::AuthorizationStore;

/// Re-exported so custom sources can implement [`AuthorizationSource`]
pub use async_trait::async_trait;
