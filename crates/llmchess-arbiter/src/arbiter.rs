//! Retry/fallback controller
//!
//! Drives one arbitration request end to end: threat analysis, directive
//! composition, the bounded ask-retry loop against the external service,
//! and the random-move fallback. The controller owns no state across
//! calls; the move history is owned by the caller and only ever read.
//!
//! Failure policy (see also [`crate::error`]):
//! - unparsable prior history or a finished game is a caller precondition
//!   violation and surfaces as an error;
//! - a transport/credential failure at any attempt triggers the fallback
//!   immediately, with no transport retry;
//! - a rejected reply is retried once with a rejection clause, then the
//!   fallback takes over. The caller always receives a legal move.

use tracing::{debug, info, warn};

use crate::error::{ArbiterError, ArbiterResult};
use crate::fallback;
use crate::generate::MoveGenerator;
use crate::movetext::Replay;
use crate::prompt::Directive;
use crate::reconcile::{reconcile_with, Outcome};
use crate::sanitize::clean_reply;
use crate::threat::threats_against;

/// Controller configuration
#[derive(Debug, Clone)]
pub struct ArbiterConfig {
    /// Total generation attempts per arbitration (initial ask + retries)
    pub max_attempts: u32,
}

impl Default for ArbiterConfig {
    fn default() -> Self {
        ArbiterConfig { max_attempts: 2 }
    }
}

/// The arbitrated next move
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArbitratedMove {
    /// The prior history extended by exactly one legal ply
    pub movetext: String,
    /// Whether the move came from the external service (false = fallback)
    pub used_external_service: bool,
    /// The directive of the last generation attempt
    pub directive_sent: String,
}

/// Move arbitration engine
///
/// Holds the generator behind a trait object so callers (the backend, the
/// terminal session, tests) inject real and scripted services through the
/// same seam.
pub struct Arbiter {
    generator: Box<dyn MoveGenerator>,
    config: ArbiterConfig,
}

impl Arbiter {
    pub fn new(generator: Box<dyn MoveGenerator>, config: ArbiterConfig) -> Self {
        Arbiter { generator, config }
    }

    /// Convenience constructor: Gemini client configured from the
    /// environment, default retry bound
    pub fn gemini_from_env() -> Self {
        Arbiter::new(
            Box::new(crate::generate::GeminiClient::from_env()),
            ArbiterConfig::default(),
        )
    }

    /// Produce exactly one verified legal move extending `prior`
    ///
    /// Precondition: `prior` replays to a legal, non-terminal position.
    /// Postcondition: the returned movetext is `prior` plus one legal ply.
    pub async fn arbitrate(&self, prior: &str) -> ArbiterResult<ArbitratedMove> {
        let replay = Replay::from_movetext(prior)?;
        let status = replay.status();
        if status.is_over() {
            return Err(ArbiterError::GameOver(status));
        }

        let responder = replay.turn();
        let threatened = !responder;
        let report = threats_against(replay.position(), threatened)?;
        let mut directive = Directive::compose(&report, prior, responder);

        info!(
            "[ARBITER] arbitrating ply {} for {:?} | threat: {}",
            replay.ply_count() + 1,
            responder,
            report
                .most_urgent()
                .map(|(role, piece)| format!("{role:?} at {}", piece.at))
                .unwrap_or_else(|| "none".to_string()),
        );

        for attempt in 1..=self.config.max_attempts {
            debug!("[ARBITER] attempt {attempt} directive: {}", directive.text());

            let raw = match self.generator.generate(directive.text()).await {
                Ok(raw) => raw,
                Err(err) => {
                    warn!("[ARBITER] generation failed on attempt {attempt}: {err}");
                    return self.fall_back(&replay, directive);
                }
            };

            let cleaned = clean_reply(&raw);
            match reconcile_with(&replay, &cleaned)? {
                Outcome::Accepted { movetext } => {
                    info!("[ARBITER] accepted on attempt {attempt}: {movetext:?}");
                    return Ok(ArbitratedMove {
                        movetext,
                        used_external_service: true,
                        directive_sent: directive.into_text(),
                    });
                }
                Outcome::RejectedInvalid => {
                    info!("[ARBITER] attempt {attempt} rejected (invalid): {cleaned:?}");
                    directive = directive.with_rejection(&cleaned);
                }
                Outcome::RejectedWrongDelta => {
                    info!("[ARBITER] attempt {attempt} rejected (wrong delta): {cleaned:?}");
                    directive = directive.with_rejection(&cleaned);
                }
            }
        }

        warn!(
            "[ARBITER] {} attempts exhausted, falling back to a random legal move",
            self.config.max_attempts
        );
        self.fall_back(&replay, directive)
    }

    fn fall_back(&self, replay: &Replay, directive: Directive) -> ArbiterResult<ArbitratedMove> {
        let mut rng = rand::rng();
        let movetext =
            fallback::random_reply(replay, &mut rng).ok_or(ArbiterError::NoLegalMoves)?;
        info!("[ARBITER] fallback move chosen: {movetext:?}");
        Ok(ArbitratedMove {
            movetext,
            used_external_service: false,
            directive_sent: directive.into_text(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::GenerateError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Scripted generator: pops pre-programmed results, counts calls
    struct Scripted {
        replies: Mutex<Vec<Result<String, GenerateError>>>,
        calls: AtomicU32,
    }

    impl Scripted {
        fn new(replies: Vec<Result<String, GenerateError>>) -> Self {
            Scripted {
                replies: Mutex::new(replies),
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl MoveGenerator for Scripted {
        async fn generate(&self, _prompt: &str) -> Result<String, GenerateError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut replies = self.replies.lock().unwrap();
            if replies.is_empty() {
                Err(GenerateError::MalformedResponse("script exhausted".into()))
            } else {
                replies.remove(0)
            }
        }
    }

    fn arbiter_with(replies: Vec<Result<String, GenerateError>>) -> Arbiter {
        Arbiter::new(Box::new(Scripted::new(replies)), ArbiterConfig::default())
    }

    #[tokio::test]
    async fn test_unparsable_prior_is_fatal() {
        let arbiter = arbiter_with(vec![Ok("1. e4".into())]);
        assert!(matches!(
            arbiter.arbitrate("1. zz").await,
            Err(ArbiterError::InvalidHistory(_))
        ));
    }

    #[tokio::test]
    async fn test_finished_game_is_fatal() {
        let arbiter = arbiter_with(vec![Ok("whatever".into())]);
        assert!(matches!(
            arbiter.arbitrate("1. f3 e5 2. g4 Qh4#").await,
            Err(ArbiterError::GameOver(_))
        ));
    }

    #[tokio::test]
    async fn test_transport_failure_skips_remaining_attempts() {
        let generator = Scripted::new(vec![Err(GenerateError::MissingApiKey)]);
        let arbiter = Arbiter::new(
            Box::new(generator),
            ArbiterConfig { max_attempts: 2 },
        );
        let result = arbiter.arbitrate("1. e4").await.unwrap();
        assert!(!result.used_external_service);
        // Transport failures are not retried: the script would have
        // answered a second call with "script exhausted" instead
    }

    #[tokio::test]
    async fn test_retry_directive_names_rejected_reply() {
        // First reply bogus, second legal; the accepted attempt's
        // directive must carry the rejection clause
        let arbiter = arbiter_with(vec![Ok("1. e5".into()), Ok("1. e4 e5".into())]);
        let result = arbiter.arbitrate("1. e4").await.unwrap();
        assert!(result.used_external_service);
        assert_eq!(result.movetext, "1. e4 e5");
        assert!(result.directive_sent.contains("DO NOT RETURN THE FOLLOWING PGN: '1. e5'"));
    }

    #[tokio::test]
    async fn test_respects_attempt_bound() {
        let generator = Scripted::new(vec![
            Ok("garbage one".into()),
            Ok("garbage two".into()),
            Ok("1. e4 e5".into()), // must never be reached
        ]);
        let arbiter = Arbiter::new(
            Box::new(generator),
            ArbiterConfig { max_attempts: 2 },
        );
        let result = arbiter.arbitrate("1. e4").await.unwrap();
        assert!(!result.used_external_service);
    }
}
