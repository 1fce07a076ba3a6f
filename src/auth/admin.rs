use std::collections::HashSet;
use std::sync::Arc;

use crate::config::{AdminGateKind, SecurityConfig};

/// Whatever the caller presented that an admin gate may inspect
#[derive(Debug, Clone, Default)]
pub struct AdminCredentials {
    /// User id from a verified session token
    pub user_id: Option<String>,
    /// Raw value of the admin session cookie
    pub admin_cookie: Option<String>,
}

impl AdminCredentials {
    /// True when the request carried nothing to judge
    pub fn is_empty(&self) -> bool {
        self.user_id.is_none() && self.admin_cookie.is_none()
    }
}

/// Single admin access predicate, picked at start-up
pub trait AdminGate: Send + Sync {
    fn is_privileged(&self, credentials: &AdminCredentials) -> bool;

    fn name(&self) -> &'static str;
}

/// Privileged when the session's user id is in a fixed set
pub struct AllowListGate {
    user_ids: HashSet<String>,
}

impl AllowListGate {
    pub fn new<I, S>(user_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            user_ids: user_ids
                .into_iter()
                .map(Into::into)
                .filter(|id: &String| !id.is_empty())
                .collect(),
        }
    }
}

impl AdminGate for AllowListGate {
    fn is_privileged(&self, credentials: &AdminCredentials) -> bool {
        credentials
            .user_id
            .as_ref()
            .is_some_and(|id| self.user_ids.contains(id))
    }

    fn name(&self) -> &'static str {
        "allow_list"
    }
}

/// Privileged when the admin cookie carries the expected value
pub struct SessionCookieGate {
    expected: String,
}

impl SessionCookieGate {
    pub fn new(expected: impl Into<String>) -> Self {
        Self {
            expected: expected.into(),
        }
    }
}

impl AdminGate for SessionCookieGate {
    fn is_privileged(&self, credentials: &AdminCredentials) -> bool {
        !self.expected.is_empty() && credentials.admin_cookie.as_deref() == Some(self.expected.as_str())
    }

    fn name(&self) -> &'static str {
        "session_cookie"
    }
}

pub fn build_admin_gate(security: &SecurityConfig) -> Arc<dyn AdminGate> {
    match security.admin_gate {
        AdminGateKind::AllowList => Arc::new(AllowListGate::new(security.admin_user_ids.clone())),
        AdminGateKind::SessionCookie => {
            Arc::new(SessionCookieGate::new(security.admin_cookie_value.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds(user: Option<&str>, cookie: Option<&str>) -> AdminCredentials {
        AdminCredentials {
            user_id: user.map(str::to_string),
            admin_cookie: cookie.map(str::to_string),
        }
    }

    #[test]
    fn allow_list_checks_user_id_only() {
        let gate = AllowListGate::new(["user_admin"]);
        assert!(gate.is_privileged(&creds(Some("user_admin"), None)));
        assert!(!gate.is_privileged(&creds(Some("user_other"), Some("authenticated"))));
        assert!(!gate.is_privileged(&creds(None, None)));
    }

    #[test]
    fn cookie_gate_checks_cookie_only() {
        let gate = SessionCookieGate::new("authenticated");
        assert!(gate.is_privileged(&creds(None, Some("authenticated"))));
        assert!(!gate.is_privileged(&creds(Some("user_admin"), Some("nope"))));
    }

    #[test]
    fn empty_allow_list_admits_nobody() {
        let gate = AllowListGate::new([""]);
        assert!(!gate.is_privileged(&creds(Some(""), None)));
    }

    #[test]
    fn gate_follows_config() {
        let mut security = crate::config::AppConfig::development().security;
        security.admin_gate = AdminGateKind::SessionCookie;
        assert_eq!(build_admin_gate(&security).name(), "session_cookie");
    }
}
