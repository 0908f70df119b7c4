//! Route access rules

use crate::layout::Layout;
use crate::routes::{RouteError, RoutePattern};
use authsync_client::AuthorizationState;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuleError {
    #[error("rule must look like PATTERN=PERMISSION")]
    MissingSeparator,

    #[error("rule has an empty permission")]
    EmptyPermission,

    #[error(transparent)]
    Pattern(#[from] RouteError),
}

/// A single rule: paths matching `pattern` require `permission`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRule {
    pub pattern: RoutePattern,
    pub permission: String,
}

impl AccessRule {
    pub fn new(pattern: RoutePattern, permission: impl Into<String>) -> Self {
        Self {
            pattern,
            permission: permission.into(),
        }
    }

    /// Parse `PATTERN=PERMISSION`, e.g. `/cms/orders/*=CMS_ORDERS`
    pub fn parse(s: &str) -> Result<Self, RuleError> {
        let (pattern, permission) = s.rsplit_once('=').ok_or(RuleError::MissingSeparator)?;
        let permission = permission.trim();
        if permission.is_empty() {
            return Err(RuleError::EmptyPermission);
        }
        Ok(Self::new(RoutePattern::parse(pattern.trim())?, permission))
    }
}

impl fmt::Display for AccessRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.pattern, self.permission)
    }
}

/// Outcome of gating a path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "access", rename_all = "lowercase")]
pub enum Access {
    /// Render the page
    Granted,
    /// A fetch is in flight and may still grant access; show a placeholder
    Pending,
    /// Missing permission. `signed_in` tells the shell whether to send the
    /// user to the login page or show a forbidden notice.
    Denied { required: String, signed_in: bool },
}

impl Access {
    pub fn is_granted(&self) -> bool {
        matches!(self, Access::Granted)
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Access::Granted => write!(f, "granted"),
            Access::Pending => write!(f, "pending"),
            Access::Denied {
                required,
                signed_in: true,
            } => write!(f, "denied (requires {})", required),
            Access::Denied {
                required,
                signed_in: false,
            } => write!(f, "denied (sign in required, needs {})", required),
        }
    }
}

/// Everything the shell needs to render a path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteDecision {
    pub path: String,
    pub layout: Layout,
    #[serde(flatten)]
    pub access: Access,
}

/// An ordered collection of access rules
/// Console sections and the permission each one requires
const ADMIN_CONSOLE_RULES: &[(&str, &str)] = &[
    ("/cms/*", "CMS_DASHBOARD"),
    ("/cms/orders/*", "CMS_ORDERS"),
    ("/cms/products/*", "CMS_PRODUCTS"),
    ("/cms/users/*", "CMS_USERS"),
    ("/cms/content/*", "CMS_CONTENT"),
];

#[derive(Debug, Clone, Default)]
pub struct RouteGate {
    rules: Vec<AccessRule>,
}

impl RouteGate {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Rules for the admin console
    pub fn admin_console() -> Self {
        ADMIN_CONSOLE_RULES
            .iter()
            .map(|(pattern, permission)| {
                let pattern =
                    RoutePattern::parse(pattern).expect("admin console pattern is valid");
                AccessRule::new(pattern, *permission)
            })
            .collect()
    }

    /// Add a rule to the gate
    pub fn add(&mut self, rule: AccessRule) {
        // Avoid duplicates
        if !self.rules.iter().any(|r| r == &rule) {
            self.rules.push(rule);
        }
    }

    /// Add multiple rules
    pub fn add_all(&mut self, rules: impl IntoIterator<Item = AccessRule>) {
        for rule in rules {
            self.add(rule);
        }
    }

    /// The most specific rule covering `path`; earlier rules win ties
    pub fn rule_for(&self, path: &str) -> Option<&AccessRule> {
        self.rules
            .iter()
            .filter(|r| r.pattern.matches(path))
            .fold(None, |best: Option<&AccessRule>, rule| match best {
                Some(b) if b.pattern.specificity() >= rule.pattern.specificity() => Some(b),
                _ => Some(rule),
            })
    }

    /// Decide access to `path` for the given state
    pub fn decide(&self, path: &str, state: &AuthorizationState) -> Access {
        let Some(rule) = self.rule_for(path) else {
            return Access::Granted;
        };

        if state.has(&rule.permission) {
            Access::Granted
        } else if state.loading {
            Access::Pending
        } else {
            Access::Denied {
                required: rule.permission.clone(),
                signed_in: state.is_authenticated(),
            }
        }
    }

    /// Layout and access for `path`
    pub fn resolve(&self, path: &str, state: &AuthorizationState) -> RouteDecision {
        RouteDecision {
            path: path.to_string(),
            layout: Layout::for_path(path),
            access: self.decide(path, state),
        }
    }

    /// Get all rules
    pub fn rules(&self) -> &[AccessRule] {
        &self.rules
    }

    /// Check if the gate has no rules
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl FromIterator<AccessRule> for RouteGate {
    fn from_iter<T: IntoIterator<Item = AccessRule>>(iter: T) -> Self {
        let mut gate = RouteGate::new();
        gate.add_all(iter);
        gate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use authsync_client::AuthorizationSnapshot;

    fn state_with(permissions: &[&str], role: Option<&str>) -> AuthorizationState {
        let snapshot = AuthorizationSnapshot::new(permissions.iter().copied(), role);
        AuthorizationState {
            permissions: snapshot.permissions.into_iter().collect(),
            role: snapshot.role,
            loading: false,
        }
    }

    #[test]
    fn test_rule_parse() {
        let rule = AccessRule::parse("/cms/orders/*=CMS_ORDERS").unwrap();
        assert_eq!(rule.pattern, RoutePattern::parse("/cms/orders/*").unwrap());
        assert_eq!(rule.permission, "CMS_ORDERS");
        assert_eq!(rule.to_string(), "/cms/orders/*=CMS_ORDERS");
    }

    #[test]
    fn test_rule_parse_invalid() {
        assert_eq!(
            AccessRule::parse("/cms/orders"),
            Err(RuleError::MissingSeparator)
        );
        assert_eq!(
            AccessRule::parse("/cms/orders= "),
            Err(RuleError::EmptyPermission)
        );
        assert_eq!(
            AccessRule::parse("cms=CMS_DASHBOARD"),
            Err(RuleError::Pattern(RouteError::MissingLeadingSlash))
        );
    }

    #[test]
    fn test_admin_console_table() {
        let gate = RouteGate::admin_console();
        assert_eq!(gate.rules().len(), 5);

        let required = |path: &str| gate.rule_for(path).map(|r| r.permission.as_str());
        assert_eq!(required("/cms"), Some("CMS_DASHBOARD"));
        assert_eq!(required("/cms/settings"), Some("CMS_DASHBOARD"));
        assert_eq!(required("/cms/orders"), Some("CMS_ORDERS"));
        assert_eq!(required("/cms/orders/991"), Some("CMS_ORDERS"));
        assert_eq!(required("/cms/products/new"), Some("CMS_PRODUCTS"));
        assert_eq!(required("/cms/users"), Some("CMS_USERS"));
        assert_eq!(required("/cms/content/banners"), Some("CMS_CONTENT"));
        assert_eq!(required("/cart"), None);
    }

    #[test]
    fn test_admin_console_patterns_all_parse() {
        for (pattern, permission) in ADMIN_CONSOLE_RULES {
            assert!(RoutePattern::parse(pattern).is_ok(), "bad pattern {}", pattern);
            assert!(!permission.is_empty());
        }

        let gate = RouteGate::admin_console();
        assert_eq!(gate.rules().len(), ADMIN_CONSOLE_RULES.len());
        for (rule, (pattern, permission)) in gate.rules().iter().zip(ADMIN_CONSOLE_RULES) {
            assert_eq!(rule.pattern.to_string(), *pattern);
            assert_eq!(rule.permission, *permission);
        }
    }

    #[test]
    fn test_add_avoids_duplicates() {
        let mut gate = RouteGate::new();
        let rule = AccessRule::parse("/cms/*=CMS_DASHBOARD").unwrap();
        gate.add(rule.clone());
        gate.add(rule);
        assert_eq!(gate.rules().len(), 1);
    }

    #[test]
    fn test_tie_keeps_first_rule() {
        let gate: RouteGate = [
            AccessRule::parse("/cms/reports/*=CMS_REPORTS").unwrap(),
            AccessRule::parse("/cms/reports/*=CMS_DASHBOARD").unwrap(),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            gate.rule_for("/cms/reports/daily").unwrap().permission,
            "CMS_REPORTS"
        );
    }

    #[test]
    fn test_public_route_is_granted() {
        let gate = RouteGate::admin_console();
        let anonymous = AuthorizationState::default();

        assert_eq!(gate.decide("/", &anonymous), Access::Granted);
        assert_eq!(gate.decide("/product/7", &anonymous), Access::Granted);
        assert_eq!(gate.decide("/checkout", &anonymous), Access::Granted);
    }

    #[test]
    fn test_permission_grants_access() {
        let gate = RouteGate::admin_console();
        let admin = state_with(&["CMS_DASHBOARD", "CMS_ORDERS"], Some("admin"));

        assert_eq!(gate.decide("/cms", &admin), Access::Granted);
        assert_eq!(gate.decide("/cms/orders/12", &admin), Access::Granted);
        assert_eq!(
            gate.decide("/cms/users", &admin),
            Access::Denied {
                required: "CMS_USERS".to_string(),
                signed_in: true
            }
        );
    }

    #[test]
    fn test_anonymous_is_sent_to_sign_in() {
        let gate = RouteGate::admin_console();
        let access = gate.decide("/cms/orders", &AuthorizationState::default());

        assert_eq!(
            access,
            Access::Denied {
                required: "CMS_ORDERS".to_string(),
                signed_in: false
            }
        );
        assert_eq!(
            access.to_string(),
            "denied (sign in required, needs CMS_ORDERS)"
        );
    }

    #[test]
    fn test_loading_is_pending() {
        let gate = RouteGate::admin_console();
        let mut state = AuthorizationState::default();
        state.loading = true;

        assert_eq!(gate.decide("/cms/orders", &state), Access::Pending);
        assert_eq!(gate.decide("/", &state), Access::Granted);

        // Already held permissions do not wait for the refresh
        let mut admin = state_with(&["CMS_ORDERS"], Some("admin"));
        admin.loading = true;
        assert_eq!(gate.decide("/cms/orders", &admin), Access::Granted);
    }

    #[test]
    fn test_resolve_combines_layout() {
        let gate = RouteGate::admin_console();
        let admin = state_with(&["CMS_DASHBOARD"], Some("admin"));

        let decision = gate.resolve("/cms", &admin);
        assert_eq!(decision.layout, Layout::Admin);
        assert!(decision.access.is_granted());

        let decision = gate.resolve("/login", &AuthorizationState::default());
        assert_eq!(decision.layout, Layout::Auth);
        assert!(decision.access.is_granted());
    }

    #[test]
    fn test_decision_serializes_flat() {
        let gate = RouteGate::admin_console();
        let decision = gate.resolve("/cms/users", &state_with(&[], Some("customer")));

        let json = serde_json::to_value(&decision).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "path": "/cms/users",
                "layout": "admin",
                "access": "denied",
                "required": "CMS_USERS",
                "signed_in": true
            })
        );
    }
}
