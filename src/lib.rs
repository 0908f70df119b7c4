//! authsync - session authorization sync for the marketplace shell
//!
//! Polls the backend for the signed-in session's permissions and role
//! (see [`client`]) and decides, per application path, which layout to
//! render and whether the page may be shown.

pub mod gate;
pub mod layout;
pub mod routes;

pub use authsync_client as client;
pub use authsync_client::{AuthorizationState, AuthorizationStore, StoreConfig};
pub use gate::{Access, AccessRule, RouteDecision, RouteGate, RuleError};
pub use layout::Layout;
pub use routes::{RouteError, RoutePattern};
