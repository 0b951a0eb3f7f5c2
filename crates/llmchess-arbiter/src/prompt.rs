//! Directive composition
//!
//! Turns a [`ThreatReport`] into the single instruction string sent to the
//! move-generation service. The base directive states the responder's
//! color, the movetext so far, and the reply contract (full history plus
//! exactly one new move, nothing else). At most one threat clause is
//! appended — the highest-priority piece kind under attack per
//! [`ESCALATION`](crate::threat::ESCALATION) — because a short, single
//! threat keeps the reply parseable.
//!
//! A `Directive` is immutable once built; a rejected attempt produces a
//! new one via [`Directive::with_rejection`].

use shakmaty::{Color, Role};

use crate::threat::{Attacker, ThreatReport};

/// The composed instruction for one generation attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    text: String,
}

impl Directive {
    /// Compose the directive for the responder playing `responder` after
    /// `movetext`, biased by the threat report
    pub fn compose(report: &ThreatReport, movetext: &str, responder: Color) -> Directive {
        let color = match responder {
            Color::White => "WHITE",
            Color::Black => "BLACK",
        };
        let base = format!(
            "You are a chess grand master. You will be given the history of moves of a \
             game in PGN format. You will play as {color}. You need to respond with your \
             next move in PGN notation. Make sure the move is valid, the PGN notation is \
             valid and you are not making an illegal move. IF THE PGN MOVE HISTORY IS \
             EMPTY, IT MEANS YOU NEED TO START THE GAME WITH A MOVE. Here is the history \
             of moves in the match in PGN notation: '{movetext}'"
        );
        let contract = "WHAT IS YOUR NEXT MOVE? ONLY MAKE ONE MOVE AND REPLY WITH THE \
                        FULL PGN HISTORY UP TO YOUR NEXT MOVE. DO NOT APPEND OR PREPEND \
                        ANY EXTRA TEXT TO THE PGN STRING";

        let text = match report.most_urgent() {
            Some((role, piece)) => {
                let name = role_name(role).to_uppercase();
                let verb = if role == Role::King {
                    "IS IN CHECK FROM THE FOLLOWING"
                } else {
                    "IS UNDER ATTACK FROM THE FOLLOWING"
                };
                format!(
                    "{base}. YOUR {name} AT SQUARE '{at}' {verb}: '{attackers}'. MAKE \
                     SURE THE {name} IS PROTECTED BY ANOTHER PIECE. IF NOT, MOVE THE \
                     {name} OUT OF DANGER SO THAT YOU WILL NOT BE AT A DISADVANTAGE. \
                     {contract}",
                    at = piece.at,
                    attackers = attacker_sentence(&piece.attackers),
                )
            }
            None => format!("{base} {contract}"),
        };

        Directive { text }
    }

    /// Derive the retry directive, naming the rejected reply
    pub fn with_rejection(&self, rejected: &str) -> Directive {
        Directive {
            text: format!(
                "{}. DO NOT RETURN THE FOLLOWING PGN: '{rejected}'",
                self.text
            ),
        }
    }

    /// The directive text to send
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Consume into the underlying string
    pub fn into_text(self) -> String {
        self.text
    }
}

fn attacker_sentence(attackers: &[Attacker]) -> String {
    attackers
        .iter()
        .map(|a| format!("{} at square {}", role_name(a.role), a.from))
        .collect::<Vec<_>>()
        .join(", ")
}

fn role_name(role: Role) -> &'static str {
    match role {
        Role::King => "King",
        Role::Queen => "Queen",
        Role::Rook => "Rook",
        Role::Bishop => "Bishop",
        Role::Knight => "Knight",
        Role::Pawn => "Pawn",
    }
}
