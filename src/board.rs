use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::FenError;
use crate::fen;
use crate::movegen;
use crate::piece::{Color, Piece, PieceId, PieceType, Square};

const BACK_RANK: [PieceType; 8] = [
    PieceType::Rook,
    PieceType::Knight,
    PieceType::Bishop,
    PieceType::Queen,
    PieceType::King,
    PieceType::Bishop,
    PieceType::Knight,
    PieceType::Rook,
];

pub const STARTING_POSITION_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// The 8×8 grid plus everything needed to answer rules questions about it.
///
/// The board owns every piece that ever existed in the game (including
/// captured ones) and hands out [`PieceId`]s. A piece's recorded square always
/// matches the slot holding it while it is live.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Board {
    pieces: Vec<Piece>,
    /// Indexed `[file][rank]`.
    squares: [[Option<PieceId>; 8]; 8],
    current_turn: Color,
    flipped: bool,
    /// Live pieces per side, kept sorted by id.
    rosters: [Vec<PieceId>; 2],
    kings: [PieceId; 2],
    last_moved: Option<PieceId>,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// Standard 32-piece starting position, White to move.
    pub fn new() -> Self {
        let mut pieces = Vec::with_capacity(32);
        for (file, &pt) in BACK_RANK.iter().enumerate() {
            pieces.push(Piece::new(pt, Color::White, Square::new(file, 0)));
        }
        for file in 0..8 {
            pieces.push(Piece::new(PieceType::Pawn, Color::White, Square::new(file, 1)));
        }
        for file in 0..8 {
            pieces.push(Piece::new(PieceType::Pawn, Color::Black, Square::new(file, 6)));
        }
        for (file, &pt) in BACK_RANK.iter().enumerate() {
            pieces.push(Piece::new(pt, Color::Black, Square::new(file, 7)));
        }
        Self::assemble(pieces, [PieceId(4), PieceId(28)], Color::White, None)
    }

    /// Build a board from a FEN-like position string.
    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        fen::parse_fen(fen)
    }

    pub fn to_fen(&self) -> String {
        fen::generate_fen(self)
    }

    /// Lay out `pieces` on an otherwise empty board. Every piece is placed on
    /// its recorded square and joins its side's roster.
    pub(crate) fn assemble(
        pieces: Vec<Piece>,
        kings: [PieceId; 2],
        current_turn: Color,
        last_moved: Option<PieceId>,
    ) -> Self {
        let mut board = Board {
            pieces,
            squares: [[None; 8]; 8],
            current_turn,
            flipped: false,
            rosters: [Vec::new(), Vec::new()],
            kings,
            last_moved,
        };
        for i in 0..board.pieces.len() {
            let piece = board.pieces[i];
            board.squares[piece.square.file][piece.square.rank] = Some(PieceId(i));
            board.rosters[piece.color.index()].push(PieceId(i));
        }
        board
    }

    pub fn tile_at(&self, sq: Square) -> Option<PieceId> {
        self.squares[sq.file][sq.rank]
    }

    pub fn piece_at(&self, sq: Square) -> Option<&Piece> {
        self.tile_at(sq).map(|id| self.piece(id))
    }

    pub fn piece(&self, id: PieceId) -> &Piece {
        &self.pieces[id.0]
    }

    pub(crate) fn piece_mut(&mut self, id: PieceId) -> &mut Piece {
        &mut self.pieces[id.0]
    }

    /// Overwrite a slot. A placed piece has its recorded square updated; a
    /// piece that was in the slot is left as it was.
    pub fn set_tile(&mut self, sq: Square, piece: Option<PieceId>) {
        self.squares[sq.file][sq.rank] = piece;
        if let Some(id) = piece {
            self.pieces[id.0].square = sq;
        }
    }

    /// Empty a slot without touching any piece's recorded square.
    pub fn reset_tile(&mut self, sq: Square) {
        self.squares[sq.file][sq.rank] = None;
    }

    pub fn turn(&self) -> Color {
        self.current_turn
    }

    pub fn switch_turn(&mut self) {
        self.current_turn = self.current_turn.opposite();
    }

    pub fn is_flipped(&self) -> bool {
        self.flipped
    }

    pub fn flip_board(&mut self) {
        self.flipped = !self.flipped;
    }

    /// Map a board square to the square it is drawn on, honouring the flip
    /// flag. The transform is its own inverse.
    pub fn display_square(&self, sq: Square) -> Square {
        if self.flipped {
            Square::new(7 - sq.file, 7 - sq.rank)
        } else {
            sq
        }
    }

    pub fn king(&self, color: Color) -> PieceId {
        self.kings[color.index()]
    }

    pub fn roster(&self, color: Color) -> &[PieceId] {
        &self.rosters[color.index()]
    }

    pub fn last_moved(&self) -> Option<PieceId> {
        self.last_moved
    }

    pub(crate) fn set_last_moved(&mut self, id: Option<PieceId>) {
        self.last_moved = id;
    }

    pub(crate) fn remove_from_roster(&mut self, id: PieceId) {
        let color = self.pieces[id.0].color;
        let roster = &mut self.rosters[color.index()];
        if let Ok(pos) = roster.binary_search(&id) {
            roster.remove(pos);
        }
    }

    pub(crate) fn add_to_roster(&mut self, id: PieceId) {
        let color = self.pieces[id.0].color;
        let roster = &mut self.rosters[color.index()];
        if let Err(pos) = roster.binary_search(&id) {
            roster.insert(pos, id);
        }
    }

    /// Register a newly created piece. It is not placed or rostered.
    pub(crate) fn push_piece(&mut self, piece: Piece) -> PieceId {
        self.pieces.push(piece);
        PieceId(self.pieces.len() - 1)
    }

    /// Forget the most recently created piece.
    pub(crate) fn pop_piece(&mut self, id: PieceId) {
        debug_assert_eq!(id.0 + 1, self.pieces.len(), "only the newest piece can be dropped");
        if id.0 + 1 == self.pieces.len() {
            self.pieces.pop();
        }
    }

    /// Whether the side to move is in check.
    pub fn king_is_checked(&self) -> bool {
        movegen::is_in_check(self, self.current_turn)
    }

    pub fn is_in_check(&self, color: Color) -> bool {
        movegen::is_in_check(self, color)
    }

    pub fn piece_count(&self, color: Color) -> usize {
        self.rosters[color.index()].len()
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        let squares = (0..8)
            .map(|rank| {
                (0..8)
                    .map(|file| {
                        self.tile_at(Square::new(file, rank)).map(|id| {
                            let p = self.piece(id);
                            TileView {
                                id,
                                piece_type: p.piece_type,
                                color: p.color,
                            }
                        })
                    })
                    .collect()
            })
            .collect();
        BoardSnapshot {
            squares,
            current_turn: self.current_turn,
            flipped: self.flipped,
            in_check: self.king_is_checked(),
        }
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in (0..8).rev() {
            write!(f, "{} ", rank + 1)?;
            for file in 0..8 {
                let c = self
                    .piece_at(Square::new(file, rank))
                    .map(|p| p.fen_char())
                    .unwrap_or('.');
                write!(f, "{c}")?;
            }
            writeln!(f)?;
        }
        write!(f, "  abcdefgh")
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct TileView {
    pub id: PieceId,
    pub piece_type: PieceType,
    pub color: Color,
}

/// Read-only view of a board for the presentation layer. `squares` is
/// indexed `[rank][file]`, rank 0 first.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct BoardSnapshot {
    pub squares: Vec<Vec<Option<TileView>>>,
    pub current_turn: Color,
    pub flipped: bool,
    pub in_check: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(name: &str) -> Square {
        name.parse().unwrap()
    }

    #[test]
    fn starting_position_layout() {
        let board = Board::new();
        assert_eq!(board.piece_count(Color::White), 16);
        assert_eq!(board.piece_count(Color::Black), 16);
        assert_eq!(board.turn(), Color::White);

        let wk = board.piece(board.king(Color::White));
        assert_eq!(wk.piece_type, PieceType::King);
        assert_eq!(wk.square, sq("e1"));
        let bk = board.piece(board.king(Color::Black));
        assert_eq!(bk.square, sq("e8"));

        assert_eq!(board.piece_at(sq("d8")).map(|p| p.piece_type), Some(PieceType::Queen));
        assert_eq!(board.piece_at(sq("g2")).map(|p| p.color), Some(Color::White));
        assert!(board.piece_at(sq("e4")).is_none());
    }

    #[test]
    fn every_piece_records_the_slot_holding_it() {
        let board = Board::new();
        for color in [Color::White, Color::Black] {
            for &id in board.roster(color) {
                assert_eq!(board.tile_at(board.piece(id).square), Some(id));
            }
        }
    }

    #[test]
    fn new_matches_the_standard_fen() {
        let parsed = Board::from_fen(STARTING_POSITION_FEN).unwrap();
        assert_eq!(parsed, Board::new());
        assert_eq!(Board::new().to_fen(), STARTING_POSITION_FEN);
    }

    #[test]
    fn reset_tile_keeps_the_recorded_square() {
        let mut board = Board::new();
        let knight = board.tile_at(sq("g1")).unwrap();
        board.reset_tile(sq("g1"));
        assert!(board.tile_at(sq("g1")).is_none());
        assert_eq!(board.piece(knight).square, sq("g1"));

        board.set_tile(sq("f3"), Some(knight));
        assert_eq!(board.piece(knight).square, sq("f3"));
        assert!(!board.piece(knight).has_moved, "set_tile does not touch move flags");
    }

    #[test]
    fn roster_stays_sorted_across_remove_and_add() {
        let mut board = Board::new();
        let before = board.roster(Color::Black).to_vec();
        let pawn = board.tile_at(sq("d7")).unwrap();
        board.remove_from_roster(pawn);
        assert_eq!(board.piece_count(Color::Black), 15);
        board.add_to_roster(pawn);
        assert_eq!(board.roster(Color::Black), before.as_slice());
    }

    #[test]
    fn flipping_mirrors_display_coordinates() {
        let mut board = Board::new();
        assert_eq!(board.display_square(sq("a1")), sq("a1"));
        board.flip_board();
        assert!(board.is_flipped());
        assert_eq!(board.display_square(sq("a1")), sq("h8"));
        assert_eq!(board.display_square(sq("e2")), sq("d7"));
    }

    #[test]
    fn switch_turn_alternates() {
        let mut board = Board::new();
        board.switch_turn();
        assert_eq!(board.turn(), Color::Black);
        board.switch_turn();
        assert_eq!(board.turn(), Color::White);
    }

    #[test]
    fn snapshot_serializes_rank_major() {
        let snap = Board::new().snapshot();
        assert_eq!(snap.squares.len(), 8);
        let e1 = snap.squares[0][4].unwrap();
        assert_eq!(e1.piece_type, PieceType::King);
        assert!(!snap.in_check);

        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["current_turn"], "White");
        assert_eq!(json["squares"][7][3]["piece_type"], "Queen");
        assert!(json["squares"][3][3].is_null());
    }

    #[test]
    fn display_draws_white_at_the_bottom() {
        let text = Board::new().to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "8 rnbqkbnr");
        assert_eq!(lines[7], "1 RNBQKBNR");
    }
}
