use serde::{Deserialize, Serialize};

use crate::piece::{Color, PieceId, PieceType, Square};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Debug)]
pub enum MoveKind {
    Normal,
    Capture,
    EnPassant,
    CastleKingside,
    CastleQueenside,
    DoublePawnPush,
    /// Pawn reaching the farthest rank; always becomes a queen. May also
    /// capture, in which case the move carries a secondary piece.
    Promotion,
}

impl MoveKind {
    pub fn is_castle(self) -> bool {
        matches!(self, MoveKind::CastleKingside | MoveKind::CastleQueenside)
    }
}

/// The other piece a move affects: the captured piece, or the rook that
/// castles. `square` is where it stood before the move, which for en passant
/// is not the move's target.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Debug)]
pub struct Secondary {
    pub piece: PieceId,
    pub square: Square,
}

/// One ply. Built by the generator from a board without mutating it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Debug)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub piece: PieceId,
    pub piece_type: PieceType,
    pub color: Color,
    pub kind: MoveKind,
    pub secondary: Option<Secondary>,
}

impl Move {
    pub fn is_capture(&self) -> bool {
        match self.kind {
            MoveKind::Capture | MoveKind::EnPassant => true,
            MoveKind::Promotion => self.secondary.is_some(),
            _ => false,
        }
    }

    /// Where the castling rook ends up, for castle moves.
    pub fn rook_target(&self) -> Option<Square> {
        match self.kind {
            MoveKind::CastleKingside => Some(Square::new(5, self.from.rank)),
            MoveKind::CastleQueenside => Some(Square::new(3, self.from.rank)),
            _ => None,
        }
    }

    /// Convert to UCI notation, e.g. "e2e4", "a7a8q"
    pub fn to_uci(&self) -> String {
        let promo = if self.kind == MoveKind::Promotion { "q" } else { "" };
        format!("{}{}{promo}", self.from.name(), self.to.name())
    }
}

/// Split UCI notation into its origin and target squares. The promotion
/// suffix is accepted and ignored since promotion is always to a queen.
pub fn parse_uci(s: &str) -> Option<(Square, Square)> {
    if !(4..=5).contains(&s.len()) || !s.is_ascii() {
        return None;
    }
    let from = s[0..2].parse().ok()?;
    let to = s[2..4].parse().ok()?;
    Some((from, to))
}
