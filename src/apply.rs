// =============================================================================
// Make and unmake
//
// `apply_move` and `undo_move` are the only code that moves pieces for a ply.
// The legality filter, the castling transit test and history navigation all
// go through this pair. `undo_move` must get the `Undo` its `apply_move`
// returned, newest first.
// =============================================================================

use crate::board::Board;
use crate::moves::{Move, MoveKind};
use crate::piece::{Piece, PieceId, PieceType};

/// Move-history flags of one piece.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Flags {
    has_moved: bool,
    last_move: Option<MoveKind>,
}

impl Flags {
    fn of(piece: &Piece) -> Self {
        Flags {
            has_moved: piece.has_moved,
            last_move: piece.last_move,
        }
    }

    fn restore(self, piece: &mut Piece) {
        piece.has_moved = self.has_moved;
        piece.last_move = self.last_move;
    }
}

/// State an applied move overwrote, in the form [`undo_move`] needs.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Undo {
    mover: Flags,
    secondary: Option<Flags>,
    last_moved: Option<PieceId>,
    /// Queen created by a promotion.
    promoted: Option<PieceId>,
}

impl Undo {
    pub fn promoted(&self) -> Option<PieceId> {
        self.promoted
    }
}

/// Play `mv` on `board` and pass the turn.
///
/// `mv` must come from the generator for this exact position.
pub fn apply_move(board: &mut Board, mv: &Move) -> Undo {
    debug_assert_eq!(
        board.tile_at(mv.from),
        Some(mv.piece),
        "moved piece is not on the move's origin square"
    );

    let mut undo = Undo {
        mover: Flags::of(board.piece(mv.piece)),
        secondary: mv.secondary.map(|s| Flags::of(board.piece(s.piece))),
        last_moved: board.last_moved(),
        promoted: None,
    };

    board.reset_tile(mv.from);
    let mut placed = mv.piece;
    match mv.kind {
        MoveKind::Normal | MoveKind::DoublePawnPush => {
            board.set_tile(mv.to, Some(mv.piece));
        }
        MoveKind::Capture => {
            if let Some(victim) = mv.secondary {
                board.remove_from_roster(victim.piece);
            }
            board.set_tile(mv.to, Some(mv.piece));
        }
        MoveKind::EnPassant => {
            if let Some(victim) = mv.secondary {
                board.reset_tile(victim.square);
                board.remove_from_roster(victim.piece);
            }
            board.set_tile(mv.to, Some(mv.piece));
        }
        MoveKind::Promotion => {
            if let Some(victim) = mv.secondary {
                board.remove_from_roster(victim.piece);
            }
            board.remove_from_roster(mv.piece);
            let queen = board.push_piece(Piece::new(PieceType::Queen, mv.color, mv.to));
            board.add_to_roster(queen);
            board.set_tile(mv.to, Some(queen));
            undo.promoted = Some(queen);
            placed = queen;
        }
        MoveKind::CastleKingside | MoveKind::CastleQueenside => {
            if let (Some(rook), Some(rook_to)) = (mv.secondary, mv.rook_target()) {
                board.reset_tile(rook.square);
                board.set_tile(rook_to, Some(rook.piece));
                board.piece_mut(rook.piece).has_moved = true;
            }
            board.set_tile(mv.to, Some(mv.piece));
        }
    }

    let piece = board.piece_mut(placed);
    piece.has_moved = true;
    piece.last_move = Some(mv.kind);
    board.set_last_moved(Some(placed));
    board.switch_turn();
    undo
}

/// Take back `mv`, which must be the last move applied to `board`, using the
/// [`Undo`] that applying it returned.
pub fn undo_move(board: &mut Board, mv: &Move, undo: &Undo) {
    board.switch_turn();
    match mv.kind {
        MoveKind::Normal | MoveKind::DoublePawnPush => {
            board.reset_tile(mv.to);
        }
        MoveKind::Capture => {
            board.reset_tile(mv.to);
            if let Some(victim) = mv.secondary {
                board.set_tile(victim.square, Some(victim.piece));
                board.add_to_roster(victim.piece);
            }
        }
        MoveKind::EnPassant => {
            board.reset_tile(mv.to);
            if let Some(victim) = mv.secondary {
                board.set_tile(victim.square, Some(victim.piece));
                board.add_to_roster(victim.piece);
            }
        }
        MoveKind::Promotion => {
            board.reset_tile(mv.to);
            if let Some(queen) = undo.promoted {
                board.remove_from_roster(queen);
                board.pop_piece(queen);
            }
            if let Some(victim) = mv.secondary {
                board.set_tile(victim.square, Some(victim.piece));
                board.add_to_roster(victim.piece);
            }
            board.add_to_roster(mv.piece);
        }
        MoveKind::CastleKingside | MoveKind::CastleQueenside => {
            board.reset_tile(mv.to);
            if let (Some(rook), Some(rook_to)) = (mv.secondary, mv.rook_target()) {
                board.reset_tile(rook_to);
                board.set_tile(rook.square, Some(rook.piece));
            }
        }
    }
    board.set_tile(mv.from, Some(mv.piece));

    undo.mover.restore(board.piece_mut(mv.piece));
    if let (Some(victim), Some(flags)) = (mv.secondary, undo.secondary) {
        flags.restore(board.piece_mut(victim.piece));
    }
    board.set_last_moved(undo.last_moved);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movegen::legal_moves;
    use crate::piece::{Color, Square};
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;

    fn sq(name: &str) -> Square {
        name.parse().unwrap()
    }

    fn find(board: &mut Board, from: &str, to: &str) -> Move {
        legal_moves(board)
            .into_iter()
            .find(|m| m.from == sq(from) && m.to == sq(to))
            .unwrap_or_else(|| panic!("{from}{to} should be legal"))
    }

    /// Apply then undo, checking the board comes back unchanged.
    fn round_trip(fen: &str, from: &str, to: &str, kind: MoveKind) -> Board {
        let mut board = Board::from_fen(fen).unwrap();
        let before = board.clone();
        let mv = find(&mut board, from, to);
        assert_eq!(mv.kind, kind);
        let undo = apply_move(&mut board, &mv);
        let after = board.clone();
        undo_move(&mut board, &mv, &undo);
        assert_eq!(board, before, "undo of {kind:?} must restore the board");
        after
    }

    #[test]
    fn normal_move_round_trip() {
        let after = round_trip(crate::board::STARTING_POSITION_FEN, "g1", "f3", MoveKind::Normal);
        assert_eq!(after.piece_at(sq("f3")).map(|p| p.piece_type), Some(PieceType::Knight));
        assert!(after.piece_at(sq("f3")).unwrap().has_moved);
        assert_eq!(after.turn(), Color::Black);
    }

    #[test]
    fn double_push_round_trip_records_last_move() {
        let after = round_trip(crate::board::STARTING_POSITION_FEN, "e2", "e4", MoveKind::DoublePawnPush);
        let pawn = after.tile_at(sq("e4")).unwrap();
        assert_eq!(after.last_moved(), Some(pawn));
        assert_eq!(after.piece(pawn).last_move, Some(MoveKind::DoublePawnPush));
    }

    #[test]
    fn capture_round_trip() {
        let after = round_trip("4k3/8/8/3p4/4P3/8/8/4K3 w - - 0 1", "e4", "d5", MoveKind::Capture);
        assert_eq!(after.piece_count(Color::Black), 1);
        assert_eq!(after.piece_at(sq("d5")).map(|p| p.color), Some(Color::White));
    }

    #[test]
    fn en_passant_removes_the_pawn_beside_the_target() {
        let after = round_trip("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1", "e5", "d6", MoveKind::EnPassant);
        assert!(after.tile_at(sq("d5")).is_none());
        assert_eq!(after.piece_count(Color::Black), 1);
    }

    #[test]
    fn castling_moves_both_pieces() {
        let fen = "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1";
        let after = round_trip(fen, "e1", "g1", MoveKind::CastleKingside);
        assert_eq!(after.piece_at(sq("f1")).map(|p| p.piece_type), Some(PieceType::Rook));
        assert!(after.piece_at(sq("f1")).unwrap().has_moved);
        assert!(after.tile_at(sq("h1")).is_none());

        let after = round_trip(fen, "e1", "c1", MoveKind::CastleQueenside);
        assert_eq!(after.piece_at(sq("d1")).map(|p| p.piece_type), Some(PieceType::Rook));
        assert!(after.tile_at(sq("a1")).is_none());
        assert!(after.piece_at(sq("c1")).unwrap().has_moved);
    }

    #[test]
    fn promotion_swaps_pawn_for_queen_and_back() {
        let after = round_trip("4k3/P7/8/8/8/8/8/4K3 w - - 0 1", "a7", "a8", MoveKind::Promotion);
        let queen = after.tile_at(sq("a8")).unwrap();
        assert_eq!(after.piece(queen).piece_type, PieceType::Queen);
        assert_eq!(after.last_moved(), Some(queen));
        assert!(after.roster(Color::White).contains(&queen));
        assert_eq!(after.piece_count(Color::White), 2);

        let after = round_trip("1n2k3/P7/8/8/8/8/8/4K3 w - - 0 1", "a7", "b8", MoveKind::Promotion);
        assert_eq!(after.piece_count(Color::Black), 1);
    }

    #[test]
    fn undo_restores_flags_lost_before_castling_was_possible() {
        // King walked away and back: castling stays gone after apply/undo.
        let mut board = Board::from_fen("4k3/8/8/8/8/8/8/R3K2R w KQ - 0 1").unwrap();
        for (from, to) in [("e1", "f1"), ("e8", "e7"), ("f1", "e1"), ("e7", "e8")] {
            let mv = find(&mut board, from, to);
            apply_move(&mut board, &mv);
        }
        assert!(board.piece(board.king(Color::White)).has_moved);
        let before = board.clone();
        let rook_move = find(&mut board, "h1", "h2");
        let undo = apply_move(&mut board, &rook_move);
        undo_move(&mut board, &rook_move, &undo);
        assert_eq!(board, before);
        assert!(legal_moves(&mut board).iter().all(|m| !m.kind.is_castle()));
    }

    #[test]
    fn random_games_unwind_to_the_start() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for _ in 0..8 {
            let mut board = Board::new();
            let start = board.clone();
            let mut played: Vec<(Move, Undo)> = Vec::new();
            for _ in 0..80 {
                let moves = legal_moves(&mut board);
                let Some(mv) = moves.choose(&mut rng).copied() else {
                    break;
                };
                let snapshot = board.clone();
                let undo = apply_move(&mut board, &mv);
                assert!(
                    !board.is_in_check(mv.color),
                    "{} left its own king in check",
                    mv.to_uci()
                );
                {
                    let mut probe = board.clone();
                    undo_move(&mut probe, &mv, &undo);
                    assert_eq!(probe, snapshot, "undo of {} diverged", mv.to_uci());
                }
                played.push((mv, undo));
            }
            while let Some((mv, undo)) = played.pop() {
                undo_move(&mut board, &mv, &undo);
            }
            assert_eq!(board, start);
        }
    }
}
