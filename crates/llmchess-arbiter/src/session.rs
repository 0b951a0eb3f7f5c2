//! Caller-owned game session
//!
//! The session owns the authoritative move history for one game and is the
//! only place that mutates it. The arbitration engine just proposes; the
//! session verifies the proposal is a one-ply extension before adopting
//! it, so an abandoned arbitration (reset mid-request) can simply be
//! dropped without corrupting anything.
//!
//! Each successful move is classified into a [`MoveKind`] so a front end
//! can cue sounds or effects without re-deriving rules state.

use shakmaty::{Chess, Color, Move, Position, Role, Square};

use crate::movetext::{GameStatus, MovetextError, Replay};

/// Errors from session-level move entry
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// It is not the human's turn
    #[error("not your turn")]
    NotYourTurn,

    /// No moves are accepted once the game is over
    #[error("game is already over: {0}")]
    GameOver(GameStatus),

    /// The entered move is illegal or unparsable in the current position
    #[error("illegal move: {0}")]
    IllegalMove(String),

    /// A proposed movetext does not extend the session history by one ply
    #[error("reply is not a one-ply extension of the game history")]
    NotAnExtension,

    /// A proposed movetext does not replay legally
    #[error(transparent)]
    Movetext(#[from] MovetextError),
}

/// What the last move did, from the human player's point of view
///
/// Ordered by significance: a mating capture is `Win`/`Loss`, not
/// `Capture`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveKind {
    /// Checkmate in the human's favor
    Win,
    /// Checkmate against the human
    Loss,
    /// Any drawing termination
    Draw,
    /// The move gives check
    Check,
    /// Castling
    Castle,
    /// A capture (including en passant)
    Capture,
    /// Anything else
    Normal,
}

/// One game between the human and the arbitrated opponent
#[derive(Debug, Clone)]
pub struct GameSession {
    human: Color,
    replay: Replay,
}

impl GameSession {
    /// Fresh game from the starting position
    pub fn new(human: Color) -> Self {
        GameSession {
            human,
            replay: Replay::new(),
        }
    }

    /// Resume a game from an existing movetext
    pub fn from_movetext(human: Color, movetext: &str) -> Result<Self, MovetextError> {
        Ok(GameSession {
            human,
            replay: Replay::from_movetext(movetext)?,
        })
    }

    /// The human player's color
    pub fn human_color(&self) -> Color {
        self.human
    }

    /// The authoritative movetext
    pub fn movetext(&self) -> String {
        self.replay.movetext()
    }

    /// Position after the last move
    pub fn position(&self) -> &Chess {
        self.replay.position()
    }

    /// Whose turn it is
    pub fn turn(&self) -> Color {
        self.replay.turn()
    }

    /// Whether the opponent is to move
    pub fn awaiting_opponent(&self) -> bool {
        self.replay.turn() != self.human && !self.status().is_over()
    }

    /// Current game state classification
    pub fn status(&self) -> GameStatus {
        self.replay.status()
    }

    /// Start over
    pub fn reset(&mut self) {
        self.replay = Replay::new();
    }

    /// Play the human's move given in SAN, e.g. `Nf3` or `O-O`
    pub fn play_human_san(&mut self, san: &str) -> Result<MoveKind, SessionError> {
        self.ensure_human_turn()?;
        let parsed: shakmaty::san::SanPlus = san
            .trim()
            .parse()
            .map_err(|_| SessionError::IllegalMove(san.trim().to_string()))?;
        let m = parsed
            .san
            .to_move(self.replay.position())
            .map_err(|_| SessionError::IllegalMove(san.trim().to_string()))?;
        Ok(self.apply(m))
    }

    /// Play the human's move as a from/to square pair
    ///
    /// Promotions auto-queen; castling uses the rules library's
    /// king-takes-rook addressing.
    pub fn play_human_from_to(&mut self, from: Square, to: Square) -> Result<MoveKind, SessionError> {
        self.ensure_human_turn()?;
        let m = self
            .replay
            .position()
            .legal_moves()
            .iter()
            .find(|m| {
                m.from() == Some(from)
                    && m.to() == to
                    && (m.promotion().is_none() || m.promotion() == Some(Role::Queen))
            })
            .cloned()
            .ok_or_else(|| SessionError::IllegalMove(format!("{from}{to}")))?;
        Ok(self.apply(m))
    }

    /// Adopt an arbitrated reply
    ///
    /// Accepts only a movetext that replays legally and extends the
    /// current history by exactly one ply with an identical prefix.
    pub fn apply_reply(&mut self, movetext: &str) -> Result<MoveKind, SessionError> {
        if self.status().is_over() {
            return Err(SessionError::GameOver(self.status()));
        }
        let cand = Replay::from_movetext(movetext)?;
        let prior_count = self.replay.ply_count();
        if cand.ply_count() != prior_count + 1
            || cand.moves()[..prior_count] != *self.replay.moves()
        {
            return Err(SessionError::NotAnExtension);
        }
        let m = cand.moves()[prior_count].clone();
        Ok(self.apply(m))
    }

    /// Play a uniformly random legal move for the side to move
    pub fn play_random_move(&mut self) -> Result<MoveKind, SessionError> {
        if self.status().is_over() {
            return Err(SessionError::GameOver(self.status()));
        }
        let mut rng = rand::rng();
        let m = crate::fallback::random_move(self.replay.position(), &mut rng)
            .ok_or(SessionError::GameOver(self.status()))?;
        Ok(self.apply(m))
    }

    fn ensure_human_turn(&self) -> Result<(), SessionError> {
        if self.status().is_over() {
            return Err(SessionError::GameOver(self.status()));
        }
        if self.replay.turn() != self.human {
            return Err(SessionError::NotYourTurn);
        }
        Ok(())
    }

    fn apply(&mut self, m: Move) -> MoveKind {
        let castle = matches!(m, Move::Castle { .. });
        let capture = m.is_capture();
        self.replay.push(m);
        self.classify(castle, capture)
    }

    fn classify(&self, castle: bool, capture: bool) -> MoveKind {
        match self.status() {
            GameStatus::Checkmate { winner } => {
                if winner == self.human {
                    MoveKind::Win
                } else {
                    MoveKind::Loss
                }
            }
            GameStatus::Stalemate
            | GameStatus::InsufficientMaterial
            | GameStatus::ThreefoldRepetition
            | GameStatus::FiftyMoveRule => MoveKind::Draw,
            GameStatus::Playing => {
                if self.replay.position().is_check() {
                    MoveKind::Check
                } else if castle {
                    MoveKind::Castle
                } else if capture {
                    MoveKind::Capture
                } else {
                    MoveKind::Normal
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_human_san_moves_advance_the_history() {
        let mut session = GameSession::new(Color::White);
        assert_eq!(session.play_human_san("e4").unwrap(), MoveKind::Normal);
        assert_eq!(session.movetext(), "1. e4");
        assert!(session.awaiting_opponent());
    }

    #[test]
    fn test_not_your_turn_is_rejected() {
        let mut session = GameSession::from_movetext(Color::White, "1. e4").unwrap();
        assert!(matches!(
            session.play_human_san("e5"),
            Err(SessionError::NotYourTurn)
        ));
    }

    #[test]
    fn test_illegal_san_is_rejected() {
        let mut session = GameSession::new(Color::White);
        assert!(matches!(
            session.play_human_san("Ke2"),
            Err(SessionError::IllegalMove(_))
        ));
        assert_eq!(session.movetext(), "");
    }

    #[test]
    fn test_apply_reply_adopts_one_ply_extension() {
        let mut session = GameSession::from_movetext(Color::White, "1. e4").unwrap();
        let kind = session.apply_reply("1. e4 e5").unwrap();
        assert_eq!(kind, MoveKind::Normal);
        assert_eq!(session.movetext(), "1. e4 e5");
    }

    #[test]
    fn test_apply_reply_rejects_two_ply_extension() {
        let mut session = GameSession::from_movetext(Color::White, "1. e4").unwrap();
        assert!(matches!(
            session.apply_reply("1. e4 e5 2. Nf3"),
            Err(SessionError::NotAnExtension)
        ));
        assert_eq!(session.movetext(), "1. e4");
    }

    #[test]
    fn test_apply_reply_rejects_divergent_history() {
        let mut session = GameSession::from_movetext(Color::White, "1. e4").unwrap();
        assert!(matches!(
            session.apply_reply("1. d4 d5"),
            Err(SessionError::NotAnExtension)
        ));
    }

    #[test]
    fn test_capture_and_check_classification() {
        let mut session = GameSession::from_movetext(Color::White, "1. e4 d5").unwrap();
        assert_eq!(session.play_human_san("exd5").unwrap(), MoveKind::Capture);

        let mut session = GameSession::from_movetext(Color::Black, "1. e4 e5 2. Qh5 Nc6").unwrap();
        assert_eq!(session.apply_reply("1. e4 e5 2. Qh5 Nc6 3. Qxe5+").unwrap(), MoveKind::Check);
    }

    #[test]
    fn test_castle_classification() {
        let mut session =
            GameSession::from_movetext(Color::White, "1. e4 e5 2. Nf3 Nc6 3. Bc4 Bc5").unwrap();
        assert_eq!(session.play_human_san("O-O").unwrap(), MoveKind::Castle);
    }

    #[test]
    fn test_loss_classification() {
        // Fool's mate delivered by the opponent
        let mut session = GameSession::from_movetext(Color::White, "1. f3 e5 2. g4").unwrap();
        assert_eq!(session.apply_reply("1. f3 e5 2. g4 Qh4#").unwrap(), MoveKind::Loss);
        assert!(session.status().is_over());
    }

    #[test]
    fn test_from_to_with_auto_queen_promotion() {
        let mut session =
            GameSession::from_movetext(Color::White, "1. d4 e5 2. dxe5 f6 3. e6 f5 4. e7 f4")
                .unwrap();
        let kind = session
            .play_human_from_to(Square::E7, Square::D8)
            .unwrap();
        // exd8=Q is a capture that also gives check
        assert_eq!(kind, MoveKind::Check);
        assert!(session.movetext().ends_with("exd8=Q+"));
    }

    #[test]
    fn test_reset_restores_start_position() {
        let mut session = GameSession::from_movetext(Color::White, "1. e4 e5").unwrap();
        session.reset();
        assert_eq!(session.movetext(), "");
        assert_eq!(session.turn(), Color::White);
    }

    #[test]
    fn test_random_move_is_legal() {
        let mut session = GameSession::new(Color::White);
        session.play_random_move().unwrap();
        assert_eq!(session.position().fullmoves().get(), 1);
        assert_eq!(session.turn(), Color::Black);
    }
}
