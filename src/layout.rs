//! Shell layout selection

use crate::routes::path_segments;
use serde::Serialize;
use std::fmt;

/// Pages rendered without the storefront header and footer
const AUTH_PAGES: &[&str] = &["login", "register", "forgot-password"];

/// Chrome the application shell wraps a page in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// Admin console: sidebar navigation, no shop chrome
    Admin,
    /// Bare sign-in and registration pages
    Auth,
    /// Shop header, footer and cart
    Storefront,
}

impl Layout {
    /// Pick the layout for a request path
    pub fn for_path(path: &str) -> Self {
        match path_segments(path).first() {
            Some(&"cms") => Layout::Admin,
            Some(first) if AUTH_PAGES.contains(first) => Layout::Auth,
            _ => Layout::Storefront,
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layout::Admin => write!(f, "admin"),
            Layout::Auth => write!(f, "auth"),
            Layout::Storefront => write!(f, "storefront"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_layout() {
        assert_eq!(Layout::for_path("/cms"), Layout::Admin);
        assert_eq!(Layout::for_path("/cms/orders/3"), Layout::Admin);
        assert_eq!(Layout::for_path("/cms/?tab=stats"), Layout::Admin);
    }

    #[test]
    fn test_auth_layout() {
        assert_eq!(Layout::for_path("/login"), Layout::Auth);
        assert_eq!(Layout::for_path("/register"), Layout::Auth);
        assert_eq!(Layout::for_path("/forgot-password?email=a"), Layout::Auth);
    }

    #[test]
    fn test_storefront_is_default() {
        assert_eq!(Layout::for_path("/"), Layout::Storefront);
        assert_eq!(Layout::for_path("/cart"), Layout::Storefront);
        assert_eq!(Layout::for_path("/cmsx"), Layout::Storefront);
        assert_eq!(Layout::for_path("/product/login"), Layout::Storefront);
    }

    #[test]
    fn test_display() {
        assert_eq!(Layout::Admin.to_string(), "admin");
        assert_eq!(Layout::Auth.to_string(), "auth");
        assert_eq!(Layout::Storefront.to_string(), "storefront");
    }
}
