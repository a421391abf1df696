//! Authenticated session context.

use std::fmt;

use carelink_proto::{Role, UserId};

use crate::error::ClientError;

/// Who is chatting, and with which credentials.
///
/// Passed explicitly into every chat surface. A context without a bearer
/// token cannot be built, so a surface cannot exist unauthenticated.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionContext {
    viewer: UserId,
    role: Role,
    token: String,
}

impl SessionContext {
    /// Build a context for `viewer`.
    ///
    /// # Errors
    ///
    /// - `ClientError::MissingToken` if `token` is blank
    pub fn new(viewer: UserId, role: Role, token: impl Into<String>) -> Result<Self, ClientError> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(ClientError::MissingToken);
        }
        Ok(Self { viewer, role, token })
    }

    /// Authenticated user.
    pub fn viewer(&self) -> &UserId {
        &self.viewer
    }

    /// Authenticated user's role.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Bearer token.
    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("viewer", &self.viewer)
            .field("role", &self.role)
            .field("token", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_token_is_rejected() {
        assert_eq!(
            SessionContext::new(UserId::from(1), Role::Doctor, "  "),
            Err(ClientError::MissingToken)
        );
    }

    #[test]
    fn debug_hides_token() {
        let ctx = SessionContext::new(UserId::from(1), Role::Patient, "secret").unwrap();
        assert!(!format!("{ctx:?}").contains("secret"));
    }
}
