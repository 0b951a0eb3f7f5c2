//! Movetext replay over the rules library
//!
//! The authoritative game state everywhere in this crate is a movetext
//! string: the ordered transcript of SAN moves from the starting position.
//! [`Replay`] is the bridge to `shakmaty` — it parses a movetext into an
//! exact sequence of legal moves, exposes the resulting position, renders
//! the canonical numbered form back out, and classifies terminal states.
//!
//! Parsing is tolerant of the notation noise a free-text opponent emits:
//! move numbers (`1.`, `12...`, glued `1.e4`) and game-result tokens are
//! skipped; everything else must be a legal SAN move or the whole replay
//! fails with the offending token.
//!
//! Threefold repetition is tracked here by counting repeated
//! (board, turn, castling, en-passant) states along the replay, since the
//! rules library itself is deliberately history-free.

use std::collections::HashMap;
use std::fmt;

use shakmaty::fen::Epd;
use shakmaty::san::SanPlus;
use shakmaty::{Chess, Color, EnPassantMode, Move, Position};

/// Errors produced while replaying a movetext
#[derive(Debug, Clone, thiserror::Error)]
pub enum MovetextError {
    /// A token was neither a move number, a result marker, nor SAN
    #[error("unparsable movetext token `{token}`")]
    BadToken { token: String },

    /// A syntactically valid SAN move is illegal (or ambiguous) at its ply
    #[error("illegal move `{san}` at ply {ply}")]
    IllegalMove { san: String, ply: usize },
}

/// Game-result markers that may trail a movetext
const RESULT_TOKENS: [&str; 5] = ["1-0", "0-1", "1/2-1/2", "1/2", "*"];

/// A movetext replayed into positions
///
/// Owns the move list, the canonical SAN for each ply, and the position
/// after the last ply. Cloning is cheap enough for the copy-on-probe rule:
/// nothing in this crate ever mutates a `Replay` it does not own.
#[derive(Debug, Clone)]
pub struct Replay {
    moves: Vec<Move>,
    sans: Vec<SanPlus>,
    position: Chess,
    seen: HashMap<String, u32>,
    threefold: bool,
}

impl Default for Replay {
    fn default() -> Self {
        Self::new()
    }
}

impl Replay {
    /// Starting position, no moves played
    pub fn new() -> Self {
        let position = Chess::default();
        let mut seen = HashMap::new();
        seen.insert(repetition_key(&position), 1);
        Replay {
            moves: Vec::new(),
            sans: Vec::new(),
            position,
            seen,
            threefold: false,
        }
    }

    /// Replay a movetext from the starting position
    ///
    /// Every token must be a move number, a result marker, or a SAN move
    /// that is legal at its ply. An empty (or all-whitespace) movetext is
    /// the starting position.
    pub fn from_movetext(movetext: &str) -> Result<Self, MovetextError> {
        let mut replay = Replay::new();
        for token in movetext.split_whitespace() {
            if RESULT_TOKENS.contains(&token) {
                continue;
            }
            let bare = strip_move_number(token);
            if bare.is_empty() {
                continue;
            }
            let san: SanPlus = bare.parse().map_err(|_| MovetextError::BadToken {
                token: token.to_string(),
            })?;
            let m = san
                .san
                .to_move(&replay.position)
                .map_err(|_| MovetextError::IllegalMove {
                    san: bare.to_string(),
                    ply: replay.ply_count(),
                })?;
            replay.push(m);
        }
        Ok(replay)
    }

    /// Append one move
    ///
    /// The move must be legal in the current position (all call sites take
    /// it from the legal-move set or from a successful SAN resolution).
    pub fn push(&mut self, m: Move) {
        let san = SanPlus::from_move_and_play_unchecked(&mut self.position, &m);
        self.moves.push(m);
        self.sans.push(san);
        let count = self
            .seen
            .entry(repetition_key(&self.position))
            .and_modify(|c| *c += 1)
            .or_insert(1);
        if *count >= 3 {
            self.threefold = true;
        }
    }

    /// Position after the last replayed ply
    pub fn position(&self) -> &Chess {
        &self.position
    }

    /// Number of plies played
    pub fn ply_count(&self) -> usize {
        self.moves.len()
    }

    /// The replayed moves, in order
    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    /// Canonical SAN for each ply, in order
    pub fn sans(&self) -> &[SanPlus] {
        &self.sans
    }

    /// The side to move after the last ply
    pub fn turn(&self) -> Color {
        self.position.turn()
    }

    /// Render the canonical numbered movetext, e.g. `1. e4 e5 2. Nf3`
    pub fn movetext(&self) -> String {
        let mut out = String::new();
        for (ply, san) in self.sans.iter().enumerate() {
            if ply % 2 == 0 {
                if ply > 0 {
                    out.push(' ');
                }
                out.push_str(&format!("{}. ", ply / 2 + 1));
            } else {
                out.push(' ');
            }
            out.push_str(&san.to_string());
        }
        out
    }

    /// Classify the current game state
    pub fn status(&self) -> GameStatus {
        let pos = &self.position;
        if pos.is_checkmate() {
            return GameStatus::Checkmate {
                winner: !pos.turn(),
            };
        }
        if pos.is_stalemate() {
            return GameStatus::Stalemate;
        }
        if pos.is_insufficient_material() {
            return GameStatus::InsufficientMaterial;
        }
        if self.threefold {
            return GameStatus::ThreefoldRepetition;
        }
        if pos.halfmoves() >= 100 {
            return GameStatus::FiftyMoveRule;
        }
        GameStatus::Playing
    }
}

/// Repetition key: board, turn, castling rights and en-passant square,
/// without the move clocks
fn repetition_key(pos: &Chess) -> String {
    Epd::from_position(pos.clone(), EnPassantMode::Legal).to_string()
}

/// Strip a leading move number (`3.`, `3...`, also glued `3.Nf3`)
fn strip_move_number(token: &str) -> &str {
    let digits = token.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return token;
    }
    let rest = &token[digits..];
    if !rest.starts_with('.') {
        return token;
    }
    rest.trim_start_matches('.')
}

/// Terminal (or still running) state of a game
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    /// A king is mated; `winner` delivered the mate
    Checkmate { winner: Color },
    /// The side to move has no legal move and is not in check
    Stalemate,
    /// Neither side can ever mate
    InsufficientMaterial,
    /// The same position occurred three times
    ThreefoldRepetition,
    /// One hundred half-moves without a capture or pawn push
    FiftyMoveRule,
    /// Game still in progress
    Playing,
}

impl GameStatus {
    /// Whether the game has ended
    pub fn is_over(self) -> bool {
        self != GameStatus::Playing
    }

    /// Whether the game ended without a winner
    pub fn is_draw(self) -> bool {
        matches!(
            self,
            GameStatus::Stalemate
                | GameStatus::InsufficientMaterial
                | GameStatus::ThreefoldRepetition
                | GameStatus::FiftyMoveRule
        )
    }

    /// Headline and detail text for announcing this state
    pub fn announcement(self) -> (String, String) {
        match self {
            GameStatus::Checkmate { winner } => {
                let winner = color_name(winner);
                (
                    format!("Checkmate! {winner} wins!"),
                    format!("{winner} has defeated the opponent."),
                )
            }
            GameStatus::Stalemate => (
                "Stalemate!".to_string(),
                "Game over due to stalemate.".to_string(),
            ),
            GameStatus::InsufficientMaterial => (
                "Insufficient material!".to_string(),
                "Game over due to insufficient material.".to_string(),
            ),
            GameStatus::ThreefoldRepetition => (
                "Threefold repetition!".to_string(),
                "Game over due to threefold repetition.".to_string(),
            ),
            GameStatus::FiftyMoveRule => (
                "Draw!".to_string(),
                "Game over due to the fifty-move rule.".to_string(),
            ),
            GameStatus::Playing => (
                "Game in progress".to_string(),
                "The game is still in progress.".to_string(),
            ),
        }
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameStatus::Checkmate { winner } => {
                write!(f, "checkmate, {} wins", color_name(*winner))
            }
            GameStatus::Stalemate => write!(f, "stalemate"),
            GameStatus::InsufficientMaterial => write!(f, "insufficient material"),
            GameStatus::ThreefoldRepetition => write!(f, "threefold repetition"),
            GameStatus::FiftyMoveRule => write!(f, "fifty-move rule"),
            GameStatus::Playing => write!(f, "playing"),
        }
    }
}

fn color_name(color: Color) -> &'static str {
    match color {
        Color::White => "White",
        Color::Black => "Black",
    }
}
