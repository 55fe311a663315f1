//! Session expiry coordination for clients holding a short-lived access token.
//!
//! [`SessionTimers`] reads the token's `exp` claim and arranges two callbacks:
//! a warning shortly before expiry and an expiry action that first tries a
//! caller-supplied [`SessionRefresher`]. Token storage stays with the caller,
//! who hands in a getter.
//!
//! Token signatures are not verified; that belongs to the server.

mod clock;
mod countdown;
mod error;
mod scheduler;
mod token;

pub use clock::{now_millis, system_clock, Clock};
pub use countdown::Countdown;
pub use error::{RefreshError, TokenError};
pub use scheduler::{
    CancelHandle, ExpireCallback, ExpireReason, SchedulerState, SessionCallbacks,
    SessionOptions, SessionRefresher, SessionTimers, TokenGetter, WarnCallback,
    DEFAULT_WARN_SECONDS,
};
pub use token::{
    decode_payload, expiry_millis, ms_until_expiration_at, ms_until_expiration_from_token,
    token_expiry_millis,
};
