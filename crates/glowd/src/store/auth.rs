//! Attempts-limited password check in front of the history view.
//!
//! Not a security boundary: the secret is a plaintext config value and the
//! comparison is a plain equality. Only the state-machine shape matters
//! here (attempt counter, lockout, monotonic grant).

use serde::Serialize;

use super::state::AuthState;

/// Wrong guesses allowed before the gate locks for the process lifetime.
pub const MAX_ATTEMPTS: u32 = 5;

/// Result of a single gate attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum AuthOutcome {
    Granted,
    Denied { remaining: u32 },
    /// The attempt budget is spent; every further call answers this until
    /// the process restarts. No unlock operation exists.
    Locked,
}

/// Run one gate attempt against `auth`.
///
/// Granting is monotonic: once authenticated, later calls answer
/// `Granted` without touching the counter. A miss burns one attempt; the
/// counter never passes [`MAX_ATTEMPTS`].
pub fn attempt(auth: &mut AuthState, secret: &str, candidate: &str) -> AuthOutcome {
    if auth.is_authenticated {
        return AuthOutcome::Granted;
    }
    if auth.attempts >= MAX_ATTEMPTS {
        return AuthOutcome::Locked;
    }

    if candidate == secret {
        auth.is_authenticated = true;
        return AuthOutcome::Granted;
    }

    auth.attempts += 1;
    let remaining = MAX_ATTEMPTS - auth.attempts;
    if remaining == 0 {
        AuthOutcome::Locked
    } else {
        AuthOutcome::Denied { remaining }
    }
}
