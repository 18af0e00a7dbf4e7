//! One-time verification codes bound to an account row.
//!
//! The functions here only transform an [`OtpState`]; persisting it is the
//! caller's job. Nothing is kept in process memory, so any instance can serve
//! either step of a flow.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use thiserror::Error;

use crate::config::OtpConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum OtpError {
    #[error("Invalid OTP, please try again")]
    InvalidCode,

    #[error("Your OTP has expired, please request a new one")]
    Expired,

    #[error("Maximum OTP resend limit reached")]
    ResendLimitExceeded,
}

/// The OTP-related columns of an account.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OtpState {
    pub code: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_verified: bool,
    pub resend_count: i32,
}

impl OtpState {
    /// True while a code is stored and its window has not lapsed.
    #[must_use]
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.code.is_some() && self.expires_at.is_some_and(|exp| exp > now)
    }
}

#[derive(Debug, Clone)]
pub struct OtpPolicy {
    code_length: usize,
    max_resends: i32,
}

impl OtpPolicy {
    #[must_use]
    pub const fn new(code_length: usize, max_resends: i32) -> Self {
        Self {
            code_length,
            max_resends,
        }
    }

    #[must_use]
    pub const fn from_config(config: &OtpConfig) -> Self {
        Self::new(config.code_length, config.max_resends)
    }

    #[must_use]
    pub const fn max_resends(&self) -> i32 {
        self.max_resends
    }

    /// Generates a numeric code of the configured length. Leading zeros are kept.
    #[must_use]
    pub fn generate(&self) -> String {
        let mut rng = rand::rng();
        (0..self.code_length)
            .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
            .collect()
    }

    /// Stores a fresh code valid for `ttl` and marks the account unverified.
    pub fn issue(&self, state: &mut OtpState, ttl: Duration, now: DateTime<Utc>) -> String {
        let code = self.generate();
        state.code = Some(code.clone());
        state.expires_at = Some(now + ttl);
        state.is_verified = false;
        code
    }

    /// Starts a new verification cycle: resets the resend counter, then issues.
    pub fn restart(&self, state: &mut OtpState, ttl: Duration, now: DateTime<Utc>) -> String {
        state.resend_count = 0;
        self.issue(state, ttl, now)
    }

    /// Checks the resend ceiling, then the code, then the window.
    ///
    /// On success the code is cleared, the account is verified and the resend
    /// counter is reset. On failure `state` is not touched.
    pub fn consume(
        &self,
        state: &mut OtpState,
        presented: &str,
        now: DateTime<Utc>,
    ) -> Result<(), OtpError> {
        if state.resend_count >= self.max_resends {
            return Err(OtpError::ResendLimitExceeded);
        }

        if state.code.as_deref() != Some(presented) {
            return Err(OtpError::InvalidCode);
        }

        if !state.expires_at.is_some_and(|exp| exp > now) {
            return Err(OtpError::Expired);
        }

        state.code = None;
        state.is_verified = true;
        state.resend_count = 0;
        Ok(())
    }

    /// Reissues a code within the current cycle, counting the attempt.
    pub fn resend(
        &self,
        state: &mut OtpState,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<String, OtpError> {
        if state.resend_count >= self.max_resends {
            return Err(OtpError::ResendLimitExceeded);
        }

        let code = self.issue(state, ttl, now);
        state.resend_count += 1;
        Ok(code)
    }
}

impl Default for OtpPolicy {
    fn default() -> Self {
        Self::from_config(&OtpConfig::default())
    }
}
