//! Session Context
//!
//! Read-only authentication state injected into controllers and gateways.

use std::fmt;

/// Opaque bearer credential. Never parsed, never logged.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Authentication signal consumed by the controller
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthContext {
    authenticated: bool,
    credential: Option<Credential>,
}

impl AuthContext {
    pub fn signed_in(token: impl Into<String>) -> Self {
        Self {
            authenticated: true,
            credential: Some(Credential::new(token)),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Credential for the transport layer to attach
    pub fn bearer(&self) -> Option<&str> {
        self.credential.as_ref().map(Credential::expose)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_is_redacted() {
        let ctx = AuthContext::signed_in("secret-token");
        assert!(ctx.is_authenticated());
        assert_eq!(ctx.bearer(), Some("secret-token"));
        assert!(!format!("{:?}", ctx).contains("secret-token"));
    }

    #[test]
    fn test_anonymous_has_no_bearer() {
        let ctx = AuthContext::anonymous();
        assert!(!ctx.is_authenticated());
        assert_eq!(ctx.bearer(), None);
    }
}
