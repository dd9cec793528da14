//! Session issuing and refresh-token rotation.
//!
//! A session is an access/refresh token pair. The refresh token is recorded
//! in the user's directory entry before the session is handed out; rotation
//! accepts a refresh token only if it is literally one of those records.

use std::sync::Arc;
use time::OffsetDateTime;

use crate::AuthResult;
use crate::config::AuthConfig;
use crate::credentials::validator::parse_subject;
use crate::error::AuthError;
use crate::storage::{BoundedUserStorage, User, UserStorage};
use crate::token::{ClaimSet, JwtService};
use crate::types::{RefreshRecord, UserId, token_fingerprint};

/// Upper bound on re-minting a refresh token that a concurrent issue listed first.
const MAX_MINT_ATTEMPTS: u64 = 32;

/// A freshly issued token pair and the user it belongs to.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    /// Short-lived access token.
    pub access_token: String,
    /// Long-lived refresh token, already recorded in the store.
    pub refresh_token: String,
    /// The user as stored after recording the refresh token.
    pub user: User,
}

/// Issues sessions and rotates refresh tokens.
#[derive(Debug, Clone)]
pub struct SessionService {
    config: Arc<AuthConfig>,
    jwt: Arc<JwtService>,
    store: BoundedUserStorage,
}

impl SessionService {
    /// Creates a new session service.
    #[must_use]
    pub fn new(config: Arc<AuthConfig>, jwt: Arc<JwtService>, store: BoundedUserStorage) -> Self {
        Self { config, jwt, store }
    }

    /// Issues a new session for `user_id`.
    ///
    /// The refresh token is appended to the user's records under `label`
    /// (or the configured default label). Nothing is returned unless that
    /// append succeeds. The refresh token expires after every token the user
    /// already lists, so it never repeats one of them.
    ///
    /// # Errors
    ///
    /// Returns an error if signing fails or the store fails the lookup or
    /// rejects the append.
    pub async fn issue_session(
        &self,
        user_id: &UserId,
        label: Option<&str>,
    ) -> AuthResult<IssuedSession> {
        let now = OffsetDateTime::now_utc();
        let identifier = self.session_label(label);
        let mut floor = match self.store.find_active_by_id(user_id).await? {
            Some(user) => self.refresh_floor(&user),
            None => i64::MIN,
        };

        for attempt in 0..MAX_MINT_ATTEMPTS {
            let (access_token, refresh_token, expires_at) = self.mint_pair(user_id, now, floor)?;
            let record = RefreshRecord::new(&refresh_token, &identifier);

            match self.store.append_refresh_token(user_id, record).await {
                Ok(user) => {
                    tracing::info!(
                        user_id = %user_id,
                        session = %identifier,
                        refresh = %token_fingerprint(&refresh_token),
                        "Issued session"
                    );
                    return Ok(IssuedSession {
                        access_token,
                        refresh_token,
                        user,
                    });
                }
                Err(AuthError::DuplicateRefreshToken) => {
                    tracing::debug!(user_id = %user_id, attempt, "Refresh token already listed, re-minting");
                    floor = expires_at.saturating_add(1);
                }
                Err(e) => {
                    tracing::error!(user_id = %user_id, error = %e, "Failed to record refresh token");
                    return Err(e);
                }
            }
        }

        Err(mint_exhausted(user_id))
    }

    /// Exchanges a recorded refresh token for a new session.
    ///
    /// The new refresh token keeps the session label of the record it
    /// supersedes. With rotation enabled the superseded record is replaced
    /// atomically; otherwise the new record is appended and the old one stays
    /// usable.
    ///
    /// # Errors
    ///
    /// - Token errors (`MalformedToken`, `InvalidSignature`, `TokenExpired`,
    ///   `UnknownIssuer`) for a token that does not verify
    /// - `UserNotFoundOrInactive` if the subject is not an active user
    /// - `RefreshTokenNotRecognized` if the token is not among the user's
    ///   records, including when a concurrent rotation consumed it first
    /// - `Internal` or storage errors for dependency failures
    pub async fn rotate(&self, presented: &str) -> AuthResult<IssuedSession> {
        let fingerprint = token_fingerprint(presented);

        let claims = self.jwt.decode(presented).map_err(|e| {
            tracing::debug!(token = %fingerprint, error = %e, "Rejected refresh token");
            AuthError::from(e)
        })?;

        if claims.issuer() != self.config.issuer {
            tracing::warn!(
                token = %fingerprint,
                issuer = %claims.issuer(),
                "Refresh token from foreign issuer"
            );
            return Err(AuthError::unknown_issuer(claims.issuer()));
        }

        let user_id = parse_subject(&claims)?;

        let Some(user) = self.store.find_active_by_id(&user_id).await? else {
            tracing::debug!(user_id = %user_id, "Refresh for unknown or inactive user");
            return Err(AuthError::UserNotFoundOrInactive);
        };

        let Some(record) = user.find_refresh_record(presented) else {
            tracing::warn!(
                user_id = %user_id,
                token = %fingerprint,
                "Signed refresh token is not recorded for user"
            );
            return Err(AuthError::RefreshTokenNotRecognized);
        };
        let identifier = record.identifier.clone();
        let now = OffsetDateTime::now_utc();
        let mut floor = self.refresh_floor(&user);

        for attempt in 0..MAX_MINT_ATTEMPTS {
            let (access_token, refresh_token, expires_at) =
                self.mint_pair(&user_id, now, floor)?;
            let replacement = RefreshRecord::new(&refresh_token, &identifier);

            let stored = if self.config.tokens.refresh_token_rotation {
                self.store
                    .replace_refresh_token(&user_id, presented, replacement)
                    .await
            } else {
                self.store
                    .append_refresh_token(&user_id, replacement)
                    .await
                    .map(Some)
            };

            match stored {
                Ok(Some(user)) => {
                    tracing::info!(
                        user_id = %user_id,
                        session = %identifier,
                        superseded = %fingerprint,
                        refresh = %token_fingerprint(&refresh_token),
                        "Rotated refresh token"
                    );
                    return Ok(IssuedSession {
                        access_token,
                        refresh_token,
                        user,
                    });
                }
                Ok(None) => {
                    tracing::warn!(
                        user_id = %user_id,
                        token = %fingerprint,
                        "Refresh token was superseded concurrently"
                    );
                    return Err(AuthError::RefreshTokenNotRecognized);
                }
                Err(AuthError::DuplicateRefreshToken) => {
                    tracing::debug!(user_id = %user_id, attempt, "Refresh token already listed, re-minting");
                    floor = expires_at.saturating_add(1);
                }
                Err(e) => return Err(e),
            }
        }

        Err(mint_exhausted(&user_id))
    }

    /// Signs an access and a refresh token issued at `now`.
    ///
    /// The access token lives exactly the configured lifetime. The refresh
    /// token lives at least the configured lifetime and expires no earlier
    /// than `floor`, so it differs from every token listed when the floor was
    /// taken. Returns the pair and the refresh token's `exp`.
    fn mint_pair(
        &self,
        user_id: &UserId,
        now: OffsetDateTime,
        floor: i64,
    ) -> AuthResult<(String, String, i64)> {
        let subject = user_id.to_hex();
        let tokens = &self.config.tokens;

        let access = ClaimSet::issue(
            &self.config.issuer,
            &subject,
            now,
            tokens.access_token_lifetime,
        );
        let refresh = ClaimSet::issue(
            &self.config.issuer,
            &subject,
            now,
            tokens.refresh_token_lifetime,
        );
        let refresh = if refresh.expires_at() < floor {
            ClaimSet::new(&self.config.issuer, &subject, refresh.issued_at(), floor)
        } else {
            refresh
        };

        Ok((
            self.jwt.encode(&access)?,
            self.jwt.encode(&refresh)?,
            refresh.expires_at(),
        ))
    }

    /// Earliest `exp` that sets a new refresh token apart from the user's
    /// listed ones.
    ///
    /// Staying above every listed token also keeps a superseded token from
    /// being minted again while a later one is still listed.
    fn refresh_floor(&self, user: &User) -> i64 {
        user.refresh_tokens
            .iter()
            .filter_map(|record| self.jwt.decode_at(&record.token, i64::MIN).ok())
            .map(|claims| claims.expires_at().saturating_add(1))
            .max()
            .unwrap_or(i64::MIN)
    }

    /// Label used when a client does not name its session.
    #[must_use]
    pub fn default_label(&self) -> &str {
        &self.config.sessions.default_label
    }

    fn session_label(&self, label: Option<&str>) -> String {
        match label.map(str::trim) {
            Some(label) if !label.is_empty() => label.to_string(),
            _ => self.config.sessions.default_label.clone(),
        }
    }
}

fn mint_exhausted(user_id: &UserId) -> AuthError {
    tracing::error!(user_id = %user_id, "Could not mint an unlisted refresh token");
    AuthError::internal("could not mint an unlisted refresh token")
}
