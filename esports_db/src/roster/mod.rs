//! Active roster ceiling enforcement.

pub mod errors;
pub mod guard;

pub use errors::{RosterError, RosterResult};
pub use guard::{MAX_ACTIVE_ROSTER, RosterGuard};
