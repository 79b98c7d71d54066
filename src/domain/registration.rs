use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::Serialize;

/// Minutes a registration code stays usable.
pub const REGISTRATION_CODE_TTL_MINUTES: i64 = 10;

/// One-time code that lets a new administrator register themselves.
///
/// Only one code is outstanding at a time; storing a new one replaces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationCode {
    // ---
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

impl RegistrationCode {
    // ---
    /// A fresh six-digit code valid for [`REGISTRATION_CODE_TTL_MINUTES`].
    pub fn generate(now: DateTime<Utc>) -> Self {
        // ---
        let code = rand::thread_rng().gen_range(100_000..1_000_000u32);
        Self {
            code: code.to_string(),
            expires_at: now + Duration::minutes(REGISTRATION_CODE_TTL_MINUTES),
        }
    }

    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}
