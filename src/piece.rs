use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::SquareError;
use crate::moves::MoveKind;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Debug)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn opposite(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Color::White => 0,
            Color::Black => 1,
        }
    }

    /// Direction pawns of this color advance in, as a rank delta.
    pub fn pawn_direction(self) -> i32 {
        match self {
            Color::White => 1,
            Color::Black => -1,
        }
    }

    /// Rank the pieces of this color start on (rank 0 = rank 1).
    pub fn back_rank(self) -> usize {
        match self {
            Color::White => 0,
            Color::Black => 7,
        }
    }

    pub fn pawn_rank(self) -> usize {
        match self {
            Color::White => 1,
            Color::Black => 6,
        }
    }

    /// The farthest rank, where this color's pawns promote.
    pub fn promotion_rank(self) -> usize {
        self.opposite().back_rank()
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Debug)]
pub enum PieceType {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceType {
    /// Upper-case letter used in FEN and move labels. Pawns have no letter in
    /// move labels but use `P` in FEN.
    pub fn letter(self) -> char {
        match self {
            PieceType::Pawn => 'P',
            PieceType::Knight => 'N',
            PieceType::Bishop => 'B',
            PieceType::Rook => 'R',
            PieceType::Queen => 'Q',
            PieceType::King => 'K',
        }
    }

    pub fn from_letter(c: char) -> Option<PieceType> {
        match c.to_ascii_uppercase() {
            'P' => Some(PieceType::Pawn),
            'N' => Some(PieceType::Knight),
            'B' => Some(PieceType::Bishop),
            'R' => Some(PieceType::Rook),
            'Q' => Some(PieceType::Queen),
            'K' => Some(PieceType::King),
            _ => None,
        }
    }
}

/// A square on the board. File 0 = the a-file, rank 0 = rank 1.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Debug)]
pub struct Square {
    pub file: usize,
    pub rank: usize,
}

impl Square {
    pub const fn new(file: usize, rank: usize) -> Square {
        Square { file, rank }
    }

    /// Offset this square by (file, rank) deltas, or `None` if the result
    /// falls off the board.
    pub fn offset(self, df: i32, dr: i32) -> Option<Square> {
        let f = self.file as i32 + df;
        let r = self.rank as i32 + dr;
        if (0..8).contains(&f) && (0..8).contains(&r) {
            Some(Square::new(f as usize, r as usize))
        } else {
            None
        }
    }

    /// Square name in algebraic form, e.g. "e4".
    pub fn name(self) -> String {
        format!("{}{}", self.file_char(), (b'1' + self.rank as u8) as char)
    }

    pub fn file_char(self) -> char {
        (b'a' + self.file as u8) as char
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Square {
    type Err = SquareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return Err(SquareError::InvalidLength(s.len()));
        }
        let file = bytes[0].to_ascii_lowercase();
        let rank = bytes[1];
        if !(b'a'..=b'h').contains(&file) {
            return Err(SquareError::InvalidFile(file as char));
        }
        if !(b'1'..=b'8').contains(&rank) {
            return Err(SquareError::InvalidRank(rank as char));
        }
        Ok(Square::new((file - b'a') as usize, (rank - b'1') as usize))
    }
}

/// Handle to a piece owned by a [`Board`](crate::board::Board). Stays valid
/// after the piece is captured so moves can refer back to it on undo.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Debug)]
pub struct PieceId(pub usize);

#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct Piece {
    pub piece_type: PieceType,
    pub color: Color,
    /// Last square this piece stood on. Left untouched when the piece is
    /// captured.
    pub square: Square,
    pub has_moved: bool,
    /// Kind of the move that last moved this piece, if any.
    pub last_move: Option<MoveKind>,
}

impl Piece {
    pub fn new(piece_type: PieceType, color: Color, square: Square) -> Self {
        Piece {
            piece_type,
            color,
            square,
            has_moved: false,
            last_move: None,
        }
    }

    /// FEN character: upper case for White, lower case for Black.
    pub fn fen_char(&self) -> char {
        let c = self.piece_type.letter();
        match self.color {
            Color::White => c,
            Color::Black => c.to_ascii_lowercase(),
        }
    }
}
