//! Authentication context attached to requests.

use std::sync::Arc;

use crate::token::ClaimSet;
use crate::types::UserId;

/// Identity attached to a request by the authentication gate.
///
/// Present in request extensions only when the presented token validated
/// against an active user.
#[derive(Debug, Clone)]
pub struct Authenticated {
    /// The resolved subject.
    pub user_id: UserId,

    /// Verified token claims (wrapped in Arc for cheap cloning).
    pub claims: Arc<ClaimSet>,
}

impl Authenticated {
    /// Creates a new authenticated context.
    #[must_use]
    pub fn new(user_id: UserId, claims: ClaimSet) -> Self {
        Self {
            user_id,
            claims: Arc::new(claims),
        }
    }

    /// Returns the token subject.
    #[must_use]
    pub fn subject(&self) -> &str {
        self.claims.subject()
    }
}
