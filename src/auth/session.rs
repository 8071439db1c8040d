use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use super::TokenGenerator;
use crate::error::{Error, Result};
use crate::store::{Store, TenantStore};
use crate::types::Token;

/// Lifetime of tokens issued at signup and login.
pub const SESSION_TTL_DAYS: i64 = 30;

const MAX_RETRIES: u32 = 3;

/// Creates a token for `user_id` and returns the raw secret with the stored
/// record. `None` for `expires_at` issues a token that never expires.
pub fn issue_token(
    store: &dyn Store,
    user_id: &str,
    expires_at: Option<DateTime<Utc>>,
) -> Result<(String, Token)> {
    let generator = TokenGenerator::new();

    for _ in 0..MAX_RETRIES {
        let (raw_token, lookup, hash) = generator.generate()?;
        let token = Token {
            id: Uuid::new_v4().to_string(),
            token_hash: hash,
            token_lookup: lookup,
            user_id: user_id.to_string(),
            created_at: Utc::now(),
            expires_at,
            last_used_at: None,
        };

        match store.create_token(&token) {
            Ok(()) => return Ok((raw_token, token)),
            Err(Error::TokenLookupCollision) => continue,
            Err(e) => return Err(e),
        }
    }

    Err(Error::TokenLookupCollision)
}

/// Expiry for a fresh session token.
#[must_use]
pub fn session_expiry() -> DateTime<Utc> {
    Utc::now() + Duration::days(SESSION_TTL_DAYS)
}
