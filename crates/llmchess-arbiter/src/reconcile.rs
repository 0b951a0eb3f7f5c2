//! History reconciliation
//!
//! The correctness core of the engine: decides whether a candidate
//! movetext is an acceptable continuation of the prior history, and
//! repairs the one failure mode that is deterministically repairable
//! (more than one appended move).
//!
//! Rules, in order:
//!
//! 1. the candidate must replay as a fully legal game from the start
//!    position, otherwise [`Outcome::RejectedInvalid`];
//! 2. a candidate that does not advance the game (same length or shorter)
//!    is [`Outcome::RejectedWrongDelta`];
//! 3. the candidate's leading plies must equal the prior history move for
//!    move — a silently diverging "continuation" is `RejectedInvalid`;
//! 4. exactly one new ply is accepted verbatim; several new plies are
//!    truncated to the earliest one and re-rendered (truncating a legal
//!    sequence yields a legal prefix, so no second legality check is
//!    needed).

use crate::movetext::{MovetextError, Replay};

/// Result of judging one candidate movetext
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The candidate (possibly truncated) extends the history by one ply
    Accepted { movetext: String },
    /// The candidate is not a legal game, or diverges from the prior history
    RejectedInvalid,
    /// The candidate did not advance the game
    RejectedWrongDelta,
}

/// Judge `candidate` as a continuation of `prior`
///
/// `prior` must itself be a legal history; failing that is a caller
/// precondition violation, not a judgement on the candidate.
pub fn reconcile(prior: &str, candidate: &str) -> Result<Outcome, MovetextError> {
    let prior_replay = Replay::from_movetext(prior)?;
    reconcile_with(&prior_replay, candidate)
}

/// [`reconcile`] against an already replayed prior history
pub fn reconcile_with(prior: &Replay, candidate: &str) -> Result<Outcome, MovetextError> {
    let Ok(cand) = Replay::from_movetext(candidate) else {
        return Ok(Outcome::RejectedInvalid);
    };

    let prior_count = prior.ply_count();
    if cand.ply_count() <= prior_count {
        return Ok(Outcome::RejectedWrongDelta);
    }
    if cand.moves()[..prior_count] != *prior.moves() {
        return Ok(Outcome::RejectedInvalid);
    }

    if cand.ply_count() == prior_count + 1 {
        return Ok(Outcome::Accepted {
            movetext: candidate.to_string(),
        });
    }

    // Over-delta: keep the earliest new ply, discard the rest
    let mut truncated = prior.clone();
    truncated.push(cand.moves()[prior_count].clone());
    Ok(Outcome::Accepted {
        movetext: truncated.movetext(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_candidate_is_rejected_invalid() {
        for junk in ["not chess", "1. e9", "1. e4 e5 2. Ng9", "1. Ke2"] {
            assert_eq!(
                reconcile("", junk).unwrap(),
                Outcome::RejectedInvalid,
                "candidate {junk:?} must be rejected"
            );
        }
    }

    #[test]
    fn test_exact_one_ply_extension_accepted_verbatim() {
        assert_eq!(
            reconcile("1. e4", "1. e4 e5").unwrap(),
            Outcome::Accepted {
                movetext: "1. e4 e5".to_string()
            }
        );
    }

    #[test]
    fn test_first_move_of_game_accepted() {
        assert_eq!(
            reconcile("", "1. e4").unwrap(),
            Outcome::Accepted {
                movetext: "1. e4".to_string()
            }
        );
    }

    #[test]
    fn test_over_delta_truncated_to_first_new_ply() {
        assert_eq!(
            reconcile("1. e4", "1. e4 e5 2. Nf3 Nc6").unwrap(),
            Outcome::Accepted {
                movetext: "1. e4 e5".to_string()
            }
        );
    }

    #[test]
    fn test_truncated_result_is_legal() {
        let outcome = reconcile("1. e4", "1. e4 e5 2. Nf3 Nc6 3. Bb5 a6").unwrap();
        let Outcome::Accepted { movetext } = outcome else {
            panic!("expected acceptance");
        };
        let replay = Replay::from_movetext(&movetext).unwrap();
        assert_eq!(replay.ply_count(), 2);
    }

    #[test]
    fn test_same_history_is_wrong_delta() {
        assert_eq!(
            reconcile("1. e4 e5", "1. e4 e5").unwrap(),
            Outcome::RejectedWrongDelta
        );
    }

    #[test]
    fn test_shorter_history_is_wrong_delta() {
        assert_eq!(
            reconcile("1. e4 e5", "1. e4").unwrap(),
            Outcome::RejectedWrongDelta
        );
    }

    #[test]
    fn test_empty_candidate_on_empty_prior_is_wrong_delta() {
        assert_eq!(reconcile("", "").unwrap(), Outcome::RejectedWrongDelta);
    }

    #[test]
    fn test_divergent_prefix_is_rejected() {
        // Same length as a one-ply extension, but the first ply differs
        assert_eq!(
            reconcile("1. e4", "1. d4 d5").unwrap(),
            Outcome::RejectedInvalid
        );
    }

    #[test]
    fn test_divergent_prefix_with_over_delta_is_rejected() {
        assert_eq!(
            reconcile("1. e4", "1. d4 d5 2. c4 e6").unwrap(),
            Outcome::RejectedInvalid
        );
    }

    #[test]
    fn test_unparsable_prior_is_a_precondition_error() {
        assert!(reconcile("1. zz", "1. e4").is_err());
    }
}
