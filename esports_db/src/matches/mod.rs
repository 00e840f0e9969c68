//! Match validator.
//!
//! Every match row is written from a [`ValidatedMatch`], which only
//! [`validate_match`] can produce. The checks run in a fixed order and the
//! first failure is reported:
//!
//! 1. the two teams differ
//! 2. best-of is present and positive
//! 3. no score is negative
//! 4. when a winner is declared: it is one of the two teams, both scores are
//!    present, they are not tied, and the winner has the higher score
//!
//! ## Example
//!
//! ```
//! use esports_db::entities::{TeamId, TournamentId};
//! use esports_db::matches::{MatchRequest, ValidationError, validate_match};
//!
//! let (navi, g2) = (TeamId(1), TeamId(2));
//! let request = MatchRequest::new(TournamentId(1), navi, g2)
//!     .best_of(3)
//!     .scores(1, 2)
//!     .winner(navi);
//!
//! assert!(matches!(
//!     validate_match(request),
//!     Err(ValidationError::WinnerScoreMismatch { .. })
//! ));
//! ```

pub mod validator;

pub use validator::{
    MatchError, MatchRequest, MatchResult, MatchValidator, ValidatedMatch, ValidationError,
    validate_match,
};
