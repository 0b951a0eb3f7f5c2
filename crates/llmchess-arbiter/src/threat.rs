//! Board threat analysis
//!
//! Before asking the opponent for a move, the engine works out which of the
//! non-moving side's pieces are currently attacked, so the directive can
//! name the single most valuable piece in danger. "Attacked" means: an
//! opposing legal move exists whose destination is the piece's square.
//!
//! The probe position never aliases the caller's position. When the
//! threatened side happens to be the side to move, the probe is rebuilt
//! from a disposable setup with the turn flag flipped; the caller's
//! position is never observably altered.
//!
//! A legal move can never land on a king, so attackers of the king are
//! read off the attack bitboard (the pieces giving check) instead of the
//! legal-move list.

use shakmaty::{CastlingMode, Chess, Color, EnPassantMode, FromSetup, Position, Role, Square};

/// Fixed piece-priority order used for threat escalation
pub const ESCALATION: [Role; 6] = [
    Role::King,
    Role::Queen,
    Role::Rook,
    Role::Bishop,
    Role::Knight,
    Role::Pawn,
];

/// Errors that can occur during threat analysis
#[derive(Debug, Clone, thiserror::Error)]
pub enum ThreatError {
    /// Flipping the side to move produced a position the rules library
    /// refuses to play from
    #[error("side-to-move flip produced an unplayable probe position")]
    ProbeUnavailable,
}

/// One opposing piece able to reach a threatened square
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attacker {
    /// Kind of the attacking piece
    pub role: Role,
    /// Square the attack originates from
    pub from: Square,
}

/// A piece of the threatened color together with everything attacking it
#[derive(Debug, Clone)]
pub struct ThreatenedPiece {
    /// Square the piece stands on
    pub at: Square,
    /// Attackers, deduplicated by kind and origin
    pub attackers: Vec<Attacker>,
}

/// Per-piece-kind threat classification for one color
///
/// Tracks one occupant square per kind. Attacked pieces take precedence
/// over unattacked ones of the same kind; two *attacked* pieces of the
/// same kind collapse to one entry (see DESIGN.md). Built fresh per
/// arbitration call and discarded once the directive is composed.
#[derive(Debug, Clone, Default)]
pub struct ThreatReport {
    slots: [Option<ThreatenedPiece>; 6],
}

impl ThreatReport {
    /// Threat entry for one piece kind, if a piece of that kind is on the board
    pub fn get(&self, role: Role) -> Option<&ThreatenedPiece> {
        self.slots[slot_index(role)].as_ref()
    }

    fn set(&mut self, role: Role, piece: ThreatenedPiece) {
        let slot = &mut self.slots[slot_index(role)];
        // An attacked piece is never displaced by an unattacked one of the
        // same kind; two attacked pieces of the same kind still collapse to
        // the later square in scan order (see DESIGN.md).
        if piece.attackers.is_empty() {
            if matches!(slot, Some(existing) if !existing.attackers.is_empty()) {
                return;
            }
        }
        *slot = Some(piece);
    }

    /// The highest-priority piece kind with at least one attacker
    ///
    /// Priority follows [`ESCALATION`]; lower-priority threats are ignored
    /// even when simultaneously present.
    pub fn most_urgent(&self) -> Option<(Role, &ThreatenedPiece)> {
        ESCALATION.iter().find_map(|&role| {
            self.get(role)
                .filter(|piece| !piece.attackers.is_empty())
                .map(|piece| (role, piece))
        })
    }

    /// Whether any piece has at least one attacker
    pub fn any_threat(&self) -> bool {
        self.most_urgent().is_some()
    }
}

fn slot_index(role: Role) -> usize {
    role as usize - 1
}

/// Classify every attacked piece of `threatened` in `pos`
///
/// Side-effect free: works on a clone, flipping the side to move on the
/// disposable copy when `threatened` is the side to move in `pos`.
pub fn threats_against(pos: &Chess, threatened: Color) -> Result<ThreatReport, ThreatError> {
    let probe = if pos.turn() == threatened {
        flipped(pos)?
    } else {
        pos.clone()
    };

    let moves = probe.legal_moves();
    let board = probe.board();
    let mut report = ThreatReport::default();

    for sq in Square::ALL {
        let Some(piece) = board.piece_at(sq) else {
            continue;
        };
        if piece.color != threatened {
            continue;
        }

        let mut attackers: Vec<Attacker> = Vec::new();
        for m in &moves {
            if m.to() != sq {
                continue;
            }
            let Some(from) = m.from() else { continue };
            push_unique(&mut attackers, Attacker { role: m.role(), from });
        }

        // Checkers never appear in the legal-move list
        if piece.role == Role::King {
            for from in board.attacks_to(sq, !threatened, board.occupied()) {
                if let Some(role) = board.role_at(from) {
                    push_unique(&mut attackers, Attacker { role, from });
                }
            }
        }

        report.set(piece.role, ThreatenedPiece { at: sq, attackers });
    }

    Ok(report)
}

/// Collect the attackers of one move list destination without duplicates
/// (promotion variants would otherwise count four times)
fn push_unique(attackers: &mut Vec<Attacker>, attacker: Attacker) {
    if !attackers.contains(&attacker) {
        attackers.push(attacker);
    }
}

fn flipped(pos: &Chess) -> Result<Chess, ThreatError> {
    let mut setup = pos.clone().into_setup(EnPassantMode::Legal);
    setup.turn = !setup.turn;
    setup.ep_square = None;
    Chess::from_setup(setup, CastlingMode::Standard)
        .or_else(|err| err.ignore_impossible_check())
        .map_err(|_| ThreatError::ProbeUnavailable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movetext::Replay;

    fn position(movetext: &str) -> Chess {
        Replay::from_movetext(movetext).unwrap().position().clone()
    }

    #[test]
    fn test_no_threats_in_start_position() {
        let pos = Chess::default();
        let report = threats_against(&pos, Color::White).unwrap();
        assert!(!report.any_threat());
        assert!(report.most_urgent().is_none());
        // Occupants are still recorded
        assert_eq!(report.get(Role::King).unwrap().at, Square::E1);
    }

    #[test]
    fn test_hanging_pawn_is_reported() {
        // Black to move; d5xe4 is available, so White's e4 pawn hangs
        let pos = position("1. e4 d5 2. Nf3");
        let report = threats_against(&pos, Color::White).unwrap();

        let pawn = report.get(Role::Pawn).unwrap();
        assert!(pawn
            .attackers
            .contains(&Attacker { role: Role::Pawn, from: Square::D5 }));
        let (role, piece) = report.most_urgent().unwrap();
        assert_eq!(role, Role::Pawn);
        assert_eq!(piece.at, Square::E4);
    }

    #[test]
    fn test_king_threat_outranks_everything() {
        // 3. Qxe5+ leaves the black king in check along the e-file and the
        // g7 pawn attacked; the king must win the escalation
        let pos = position("1. e4 e5 2. Qh5 Nc6 3. Qxe5+");
        let report = threats_against(&pos, Color::Black).unwrap();

        let king = report.get(Role::King).unwrap();
        assert_eq!(king.at, Square::E8);
        assert!(king
            .attackers
            .iter()
            .any(|a| a.role == Role::Queen && a.from == Square::E5));

        let (role, _) = report.most_urgent().unwrap();
        assert_eq!(role, Role::King);
    }

    #[test]
    fn test_probe_flip_when_threatened_side_is_to_move() {
        // White just played 2. Nf3; it is Black's turn, yet we ask about
        // Black's pieces, so the probe must flip back to White
        let pos = position("1. e4 e5 2. Nf3");
        let report = threats_against(&pos, Color::Black).unwrap();

        let pawn = report.get(Role::Pawn).unwrap();
        assert!(pawn
            .attackers
            .contains(&Attacker { role: Role::Knight, from: Square::F3 }));
    }

    #[test]
    fn test_probe_does_not_mutate_caller_position() {
        use shakmaty::fen::Fen;

        let pos = position("1. e4 e5 2. Nf3");
        let before = Fen::from_position(pos.clone(), EnPassantMode::Legal).to_string();
        threats_against(&pos, Color::Black).unwrap();
        let after = Fen::from_position(pos, EnPassantMode::Legal).to_string();
        assert_eq!(before, after);
    }

    #[test]
    fn test_attackers_deduplicated_across_promotions() {
        // White pawn on e7 can capture the d8 queen with four promotion
        // variants; the queen must list that pawn exactly once
        let pos = position("1. d4 e5 2. dxe5 f6 3. e6 f5 4. e7 f4");
        let report = threats_against(&pos, Color::Black).unwrap();

        let queen = report.get(Role::Queen).unwrap();
        assert_eq!(queen.at, Square::D8);
        assert_eq!(
            queen.attackers,
            vec![Attacker { role: Role::Pawn, from: Square::E7 }]
        );

        let (role, _) = report.most_urgent().unwrap();
        assert_eq!(role, Role::Queen);
    }
}
