//! Session management for authenticated users.
//!
//! Sessions are stateless: the credential is an HS256-signed token carried
//! by the client in the `session` cookie. Nothing is stored server-side,
//! the only server-held material is the signing secret in [`SessionKeys`].

use anyhow::{ensure, Result};
use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tower_cookies::cookie::SameSite;
use tower_cookies::{Cookie, Cookies};

use crate::config::SessionConfig;

// ---

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "session";

/// Session token time-to-live in seconds (1 hour).
pub const SESSION_TTL_SECONDS: i64 = 3_600;

// ---

/// Claims encoded inside the signed token.
///
/// `userId` and `username` default to empty so that a token signed with the
/// right key but lacking them is reported as missing claims, not malformed.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    //
    #[serde(rename = "userId", default)]
    user_id: String,
    #[serde(default)]
    username: String,
    iat: i64,
    exp: i64,
}

/// Identity recovered from a valid session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub user_id: String,
    pub username: String,
    pub expires: DateTime<Utc>,
}

/// A freshly signed token together with its expiry.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Why a token was rejected.
///
/// Callers outside this module only ever see "no session"; the reason is
/// kept for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyError {
    Absent,
    Malformed,
    Tampered,
    MissingClaims,
    Expired,
}

impl std::fmt::Display for VerifyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reason = match self {
            VerifyError::Absent => "no session token",
            VerifyError::Malformed => "malformed session token",
            VerifyError::Tampered => "session token signature mismatch",
            VerifyError::MissingClaims => "session token missing userId or username",
            VerifyError::Expired => "session token expired",
        };
        f.write_str(reason)
    }
}

impl std::error::Error for VerifyError {}

// ---

/// Signing and verification keys derived from the process secret.
///
/// Built once at startup and shared read-only through `AppState`.
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    secure_cookies: bool,
}

impl SessionKeys {
    // ---

    pub fn new(secret: &[u8], secure_cookies: bool) -> Self {
        // ---
        // Expiry is checked against an explicit clock in `decode_at`.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iat"]);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            secure_cookies,
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        // ---
        Self::new(config.secret.as_bytes(), config.secure_cookies)
    }

    /// Whether cookies written with these keys carry the `Secure` attribute.
    pub fn secure_cookies(&self) -> bool {
        self.secure_cookies
    }

    /// Signs a token for `(user_id, username)` valid for [`SESSION_TTL_SECONDS`].
    ///
    /// # Errors
    /// Fails on empty inputs or if the claims cannot be encoded.
    pub fn issue(&self, user_id: &str, username: &str) -> Result<IssuedToken> {
        // ---
        self.issue_at(user_id, username, Utc::now())
    }

    /// Same as [`issue`](Self::issue) with an explicit issue time.
    pub fn issue_at(&self, user_id: &str, username: &str, now: DateTime<Utc>) -> Result<IssuedToken> {
        // ---
        ensure!(!user_id.is_empty(), "session user id must not be empty");
        ensure!(!username.is_empty(), "session username must not be empty");

        let iat = now.timestamp();
        let exp = iat + SESSION_TTL_SECONDS;
        let claims = Claims {
            user_id: user_id.to_string(),
            username: username.to_string(),
            iat,
            exp,
        };

        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;

        Ok(IssuedToken {
            token,
            expires_at: timestamp_to_utc(exp),
        })
    }

    /// Verifies a token against the current time.
    ///
    /// Never fails: every rejection collapses to `None`.
    pub fn verify(&self, token: Option<&str>) -> Option<SessionInfo> {
        // ---
        self.verify_at(token, Utc::now())
    }

    /// Verifies a token against an explicit clock.
    pub fn verify_at(&self, token: Option<&str>, now: DateTime<Utc>) -> Option<SessionInfo> {
        // ---
        match self.decode_at(token, now) {
            Ok(info) => Some(info),
            Err(VerifyError::Absent) => None,
            Err(VerifyError::Expired) => {
                tracing::debug!("Session token expired");
                None
            }
            Err(reason) => {
                tracing::warn!("Rejected session token: {}", reason);
                None
            }
        }
    }

    /// Decodes a token and reports the precise rejection reason.
    pub fn decode_at(&self, token: Option<&str>, now: DateTime<Utc>) -> Result<SessionInfo, VerifyError> {
        // ---
        let token = match token {
            Some(t) if !t.is_empty() => t,
            _ => return Err(VerifyError::Absent),
        };

        let claims = jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => VerifyError::Tampered,
                ErrorKind::ExpiredSignature => VerifyError::Expired,
                _ => VerifyError::Malformed,
            })?;

        if claims.user_id.is_empty() || claims.username.is_empty() {
            return Err(VerifyError::MissingClaims);
        }
        if now.timestamp() >= claims.exp {
            return Err(VerifyError::Expired);
        }

        Ok(SessionInfo {
            user_id: claims.user_id,
            username: claims.username,
            expires: timestamp_to_utc(claims.exp),
        })
    }
}

fn timestamp_to_utc(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().unwrap_or(DateTime::<Utc>::MIN_UTC)
}

// ============================================================================
// Cookie lifecycle
// ============================================================================

/// Issues a token and stores it in the `session` cookie.
///
/// # Errors
/// Returns an error if the token cannot be issued.
pub fn create_session(
    cookies: &Cookies,
    keys: &SessionKeys,
    user_id: &str,
    username: &str,
) -> Result<SessionInfo> {
    // ---
    let issued = keys.issue(user_id, username)?;
    let expires = OffsetDateTime::from_unix_timestamp(issued.expires_at.timestamp())?;

    let cookie = Cookie::build((SESSION_COOKIE, issued.token))
        .http_only(true)
        .secure(keys.secure_cookies)
        .same_site(SameSite::Lax)
        .path("/")
        .expires(expires)
        .build();
    cookies.add(cookie);

    tracing::info!("Created session for user: {}", username);

    Ok(SessionInfo {
        user_id: user_id.to_string(),
        username: username.to_string(),
        expires: issued.expires_at,
    })
}

/// Reads and verifies the `session` cookie of the current request.
pub fn validate_session(cookies: &Cookies, keys: &SessionKeys) -> Option<SessionInfo> {
    // ---
    let value = cookies.get(SESSION_COOKIE).map(|c| c.value().to_string());
    keys.verify(value.as_deref())
}

/// Overwrites the `session` cookie with an empty, already-expired value.
pub fn clear_session(cookies: &Cookies, keys: &SessionKeys) {
    // ---
    let cookie = Cookie::build((SESSION_COOKIE, ""))
        .http_only(true)
        .secure(keys.secure_cookies)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(time::Duration::ZERO)
        .expires(OffsetDateTime::UNIX_EPOCH)
        .build();
    cookies.add(cookie);

    tracing::debug!("Session cookie cleared");
}

// ============================================================================
// Tests
// ============================================================================
