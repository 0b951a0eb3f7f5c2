//! Fallback move selection
//!
//! When the external service cannot be made to produce a usable move, the
//! engine still owes the caller a legal one: a uniform choice over the
//! legal-move set of the prior position. Cannot fail while the game is not
//! over, which the controller checks before ever getting here.

use rand::seq::IndexedRandom;
use rand::Rng;
use shakmaty::{Chess, Move, Position};

use crate::movetext::Replay;

/// Pick one legal move uniformly at random
pub fn random_move<R: Rng + ?Sized>(pos: &Chess, rng: &mut R) -> Option<Move> {
    pos.legal_moves().choose(rng).cloned()
}

/// Extend the replayed history by one uniformly chosen legal move and
/// render the resulting movetext
///
/// `None` only for a terminal position.
pub fn random_reply<R: Rng + ?Sized>(replay: &Replay, rng: &mut R) -> Option<String> {
    let m = random_move(replay.position(), rng)?;
    let mut next = replay.clone();
    next.push(m);
    Some(next.movetext())
}
