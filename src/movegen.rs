// =============================================================================
// Move generation
//
// Pseudo-legal moves come from per-kind movement rules: rays for sliders,
// fixed offsets for knights and kings, and the pawn rules. Castling is only
// produced by the legal generator since it needs check tests of its own.
// Legal moves are pseudo-legal moves that survive being played on the live
// board and taken back again (see `apply`).
//
// Coordinate system: file 0 = a-file, rank 0 = rank 1.
// =============================================================================

use crate::apply::{apply_move, undo_move};
use crate::board::Board;
use crate::moves::{Move, MoveKind, Secondary};
use crate::piece::{Color, PieceId, PieceType, Square};

const KNIGHT_OFFSETS: [(i32, i32); 8] = [
    (-2, -1), (-2, 1), (-1, -2), (-1, 2),
    (1, -2), (1, 2), (2, -1), (2, 1),
];

const KING_OFFSETS: [(i32, i32); 8] = [
    (-1, -1), (-1, 0), (-1, 1), (0, -1),
    (0, 1), (1, -1), (1, 0), (1, 1),
];

const ROOK_DIRS: [(i32, i32); 4] = [(0, 1), (0, -1), (1, 0), (-1, 0)];
const BISHOP_DIRS: [(i32, i32); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];
const QUEEN_DIRS: [(i32, i32); 8] = [
    (0, 1), (0, -1), (1, 0), (-1, 0),
    (1, 1), (1, -1), (-1, 1), (-1, -1),
];

fn push_move(
    board: &Board,
    id: PieceId,
    to: Square,
    kind: MoveKind,
    secondary: Option<Secondary>,
    moves: &mut Vec<Move>,
) {
    let piece = board.piece(id);
    moves.push(Move {
        from: piece.square,
        to,
        piece: id,
        piece_type: piece.piece_type,
        color: piece.color,
        kind,
        secondary,
    });
}

/// Emit a Normal move onto an empty square or a Capture onto an enemy piece.
/// Returns whether the square was empty, so rays know to keep going.
fn push_step(board: &Board, id: PieceId, to: Square, moves: &mut Vec<Move>) -> bool {
    match board.tile_at(to) {
        None => {
            push_move(board, id, to, MoveKind::Normal, None, moves);
            true
        }
        Some(other) => {
            if board.piece(other).color != board.piece(id).color {
                let victim = Secondary { piece: other, square: to };
                push_move(board, id, to, MoveKind::Capture, Some(victim), moves);
            }
            false
        }
    }
}

fn sliding_moves(board: &Board, id: PieceId, directions: &[(i32, i32)], moves: &mut Vec<Move>) {
    let from = board.piece(id).square;
    for &(df, dr) in directions {
        let mut next = from.offset(df, dr);
        while let Some(to) = next {
            if !push_step(board, id, to, moves) {
                break;
            }
            next = to.offset(df, dr);
        }
    }
}

fn stepping_moves(board: &Board, id: PieceId, offsets: &[(i32, i32)], moves: &mut Vec<Move>) {
    let from = board.piece(id).square;
    for &(df, dr) in offsets {
        if let Some(to) = from.offset(df, dr) {
            push_step(board, id, to, moves);
        }
    }
}

fn pawn_moves(board: &Board, id: PieceId, moves: &mut Vec<Move>) {
    let pawn = *board.piece(id);
    let color = pawn.color;
    let dir = color.pawn_direction();
    let promo_rank = color.promotion_rank();

    // Pushes
    if let Some(one) = pawn.square.offset(0, dir) {
        if board.tile_at(one).is_none() {
            let kind = if one.rank == promo_rank { MoveKind::Promotion } else { MoveKind::Normal };
            push_move(board, id, one, kind, None, moves);

            if pawn.square.rank == color.pawn_rank() {
                if let Some(two) = one.offset(0, dir) {
                    if board.tile_at(two).is_none() {
                        push_move(board, id, two, MoveKind::DoublePawnPush, None, moves);
                    }
                }
            }
        }
    }

    // Captures, including en passant
    for df in [-1, 1] {
        let Some(to) = pawn.square.offset(df, dir) else {
            continue;
        };
        match board.tile_at(to) {
            Some(other) => {
                if board.piece(other).color == color {
                    continue;
                }
                let kind = if to.rank == promo_rank { MoveKind::Promotion } else { MoveKind::Capture };
                let victim = Secondary { piece: other, square: to };
                push_move(board, id, to, kind, Some(victim), moves);
            }
            None => {
                if let Some(victim) = en_passant_victim(board, pawn.square, df, color) {
                    push_move(board, id, to, MoveKind::EnPassant, Some(victim), moves);
                }
            }
        }
    }
}

/// The enemy pawn beside `from` on file offset `df`, if it is the piece that
/// moved last and that move was a double push.
fn en_passant_victim(board: &Board, from: Square, df: i32, color: Color) -> Option<Secondary> {
    let beside = from.offset(df, 0)?;
    let other = board.tile_at(beside)?;
    let p = board.piece(other);
    let eligible = p.piece_type == PieceType::Pawn
        && p.color != color
        && board.last_moved() == Some(other)
        && p.last_move == Some(MoveKind::DoublePawnPush);
    eligible.then_some(Secondary { piece: other, square: beside })
}

/// Moves that follow the piece's movement rules and board occupancy, without
/// regard to the mover's own king. Castling is not included.
pub fn pseudo_legal_moves(board: &Board, id: PieceId) -> Vec<Move> {
    let mut moves = Vec::new();
    match board.piece(id).piece_type {
        PieceType::Pawn => pawn_moves(board, id, &mut moves),
        PieceType::Knight => stepping_moves(board, id, &KNIGHT_OFFSETS, &mut moves),
        PieceType::Bishop => sliding_moves(board, id, &BISHOP_DIRS, &mut moves),
        PieceType::Rook => sliding_moves(board, id, &ROOK_DIRS, &mut moves),
        PieceType::Queen => sliding_moves(board, id, &QUEEN_DIRS, &mut moves),
        PieceType::King => stepping_moves(board, id, &KING_OFFSETS, &mut moves),
    }
    moves
}

/// Whether any live piece of the other side has a pseudo-legal move onto
/// `color`'s king. Only raw generation is used here, never the legality
/// filter, which calls back into this function.
pub fn is_in_check(board: &Board, color: Color) -> bool {
    let king_square = board.piece(board.king(color)).square;
    board
        .roster(color.opposite())
        .iter()
        .any(|&id| pseudo_legal_moves(board, id).iter().any(|m| m.to == king_square))
}

/// Whether `mv` would leave the mover's own king in check. The board is
/// restored before returning.
fn leaves_king_in_check(board: &mut Board, mv: &Move) -> bool {
    let undo = apply_move(board, mv);
    let checked = is_in_check(board, mv.color);
    undo_move(board, mv, &undo);
    checked
}

fn castle_moves(board: &mut Board, king: PieceId, moves: &mut Vec<Move>) {
    let k = *board.piece(king);
    let rank = k.color.back_rank();
    if k.piece_type != PieceType::King || k.has_moved || k.square != Square::new(4, rank) {
        return;
    }
    if is_in_check(board, k.color) {
        return;
    }

    let sides: [(MoveKind, usize, &[usize], &[usize]); 2] = [
        (MoveKind::CastleKingside, 7, &[5, 6], &[5, 6]),
        (MoveKind::CastleQueenside, 0, &[1, 2, 3], &[3, 2]),
    ];
    for (kind, rook_file, between, transit) in sides {
        let rook_square = Square::new(rook_file, rank);
        let Some(rook) = board.tile_at(rook_square) else {
            continue;
        };
        let r = board.piece(rook);
        if r.piece_type != PieceType::Rook || r.color != k.color || r.has_moved {
            continue;
        }
        if between.iter().any(|&f| board.tile_at(Square::new(f, rank)).is_some()) {
            continue;
        }

        // Stand the king on each square it crosses, in order.
        let attacked = transit.iter().any(|&f| {
            let step = Move {
                from: k.square,
                to: Square::new(f, rank),
                piece: king,
                piece_type: PieceType::King,
                color: k.color,
                kind: MoveKind::Normal,
                secondary: None,
            };
            leaves_king_in_check(board, &step)
        });
        if attacked {
            continue;
        }

        let target = Square::new(*transit.last().unwrap_or(&4), rank);
        let secondary = Secondary { piece: rook, square: rook_square };
        push_move(board, king, target, kind, Some(secondary), moves);
    }
}

/// Legal moves for one piece.
pub fn legal_moves_for(board: &mut Board, id: PieceId) -> Vec<Move> {
    let mut candidates = pseudo_legal_moves(board, id);
    if board.piece(id).piece_type == PieceType::King {
        castle_moves(board, id, &mut candidates);
    }
    candidates
        .into_iter()
        .filter(|m| !leaves_king_in_check(board, m))
        .collect()
}

/// Every legal move for the side to move.
pub fn legal_moves(board: &mut Board) -> Vec<Move> {
    let roster = board.roster(board.turn()).to_vec();
    roster
        .into_iter()
        .flat_map(|id| legal_moves_for(board, id))
        .collect()
}
