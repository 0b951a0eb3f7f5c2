//! Move arbitration for a chess opponent that answers in free text.
//!
//! The opponent behind [`generate::MoveGenerator`] is untrusted: it may
//! return malformed notation, illegal moves, several moves at once, or
//! nothing usable at all. This crate imposes a strict contract on top of
//! that interface — exactly one verified, legal ply appended to a
//! known-good history — and falls back to a uniformly chosen legal move
//! when the opponent cannot be made to comply.
//!
//! # Pipeline
//!
//! One call to [`Arbiter::arbitrate`] runs:
//!
//! 1. [`threat`] — classify which of the non-moving side's pieces are
//!    currently attacked,
//! 2. [`prompt`] — build one directive string biased by the highest-value
//!    threat,
//! 3. [`generate`] — call the external service,
//! 4. [`sanitize`] — strip formatting noise from the raw reply,
//! 5. [`reconcile`] — check legality and move-count delta, repairing
//!    over-long replies by truncation,
//! 6. retry once with a rejection clause, then fall back to
//!    [`fallback::random_reply`].
//!
//! The engine never mutates the caller's history; it only returns a new
//! movetext for the caller (see [`session::GameSession`]) to adopt.

pub mod arbiter;
pub mod error;
pub mod fallback;
pub mod generate;
pub mod movetext;
pub mod prompt;
pub mod reconcile;
pub mod sanitize;
pub mod session;
pub mod threat;

pub use arbiter::{ArbitratedMove, Arbiter, ArbiterConfig};
pub use error::{ArbiterError, ArbiterResult};
pub use generate::{GeminiClient, GeminiConfig, GenerateError, MoveGenerator};
pub use movetext::{GameStatus, MovetextError, Replay};
pub use reconcile::{reconcile, Outcome};
pub use sanitize::clean_reply;
pub use session::{GameSession, MoveKind, SessionError};
pub use threat::{threats_against, Attacker, ThreatReport};
