//! `warden-core`: identifiers and time primitives shared by the auth crates.
//!
//! This crate contains no IO and no policy.

pub mod clock;
pub mod id;

pub use clock::{Clock, ManualClock, SystemClock};
pub use id::{IdError, SESSION_ID_LEN, SessionId, UserId};
