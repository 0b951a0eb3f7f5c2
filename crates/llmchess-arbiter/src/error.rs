//! Error types for the arbitration engine
//!
//! Splits failures into the two classes the engine treats differently:
//! precondition violations (surfaced to the caller, never recovered) and
//! locally recovered failures (retry/fallback, invisible to the caller).
//! The latter never appear here — only [`GenerateError`](crate::generate::GenerateError)
//! and rejected replies exist inside one arbitration call and are consumed
//! by the controller.

use crate::movetext::{GameStatus, MovetextError};
use crate::threat::ThreatError;

/// Errors that can escape [`Arbiter::arbitrate`](crate::Arbiter::arbitrate)
#[derive(Debug, thiserror::Error)]
pub enum ArbiterError {
    /// The caller's move history does not replay to a legal position
    #[error("prior movetext is not a legal history: {0}")]
    InvalidHistory(#[from] MovetextError),

    /// The game is already over, so no next move exists
    #[error("game is already over: {0}")]
    GameOver(GameStatus),

    /// Threat analysis could not build a probe position
    #[error("threat analysis failed: {0}")]
    Threat(#[from] ThreatError),

    /// No legal move exists for fallback selection
    ///
    /// Unreachable when the game-over precondition holds; kept explicit so
    /// the controller never panics on a caller contract violation.
    #[error("no legal move available for fallback selection")]
    NoLegalMoves,
}

/// Result type alias for arbitration operations
pub type ArbiterResult<T> = Result<T, ArbiterError>;
