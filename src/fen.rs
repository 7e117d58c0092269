// =============================================================================
// FEN parsing and writing
//
// The board keeps no castling-rights or en-passant fields. Castling letters
// decide whether the king and corner rooks count as unmoved. An en-passant
// square names the pawn that just made a double push. The halfmove and
// fullmove fields are optional and ignored on input.
// =============================================================================

use crate::board::Board;
use crate::errors::FenError;
use crate::moves::MoveKind;
use crate::piece::{Color, Piece, PieceId, PieceType, Square};

pub fn parse_fen(fen: &str) -> Result<Board, FenError> {
    let mut fields = fen.split_whitespace();
    let placement = fields.next().ok_or(FenError::MissingField("piece placement"))?;
    let side = fields.next().ok_or(FenError::MissingField("side to move"))?;
    let castling = fields.next().unwrap_or("-");
    let en_passant = fields.next().unwrap_or("-");

    let mut pieces = parse_placement(placement)?;
    let turn = match side {
        "w" => Color::White,
        "b" => Color::Black,
        other => return Err(FenError::InvalidSide(other.to_string())),
    };

    let kings = [find_king(&pieces, Color::White)?, find_king(&pieces, Color::Black)?];
    apply_castling_field(&mut pieces, castling)?;
    let last_moved = parse_en_passant(&mut pieces, en_passant, turn)?;

    Ok(Board::assemble(pieces, kings, turn, last_moved))
}

/// Pieces in rank-major order (a1, b1, ..., h8), matching [`Board::new`].
fn parse_placement(placement: &str) -> Result<Vec<Piece>, FenError> {
    let ranks: Vec<&str> = placement.split('/').collect();
    if ranks.len() != 8 {
        return Err(FenError::WrongRankCount(ranks.len()));
    }

    let mut pieces = Vec::new();
    for (i, text) in ranks.iter().rev().enumerate() {
        let rank = i;
        let mut file = 0usize;
        for c in text.chars() {
            if let Some(skip) = c.to_digit(10) {
                if skip == 0 || file + skip as usize > 8 {
                    return Err(FenError::BadRankLength { rank: rank + 1 });
                }
                file += skip as usize;
                continue;
            }
            if file >= 8 {
                return Err(FenError::BadRankLength { rank: rank + 1 });
            }
            let piece_type = PieceType::from_letter(c).ok_or(FenError::InvalidPiece(c))?;
            let color = if c.is_ascii_uppercase() { Color::White } else { Color::Black };
            let square = Square::new(file, rank);
            let mut piece = Piece::new(piece_type, color, square);
            piece.has_moved = match piece_type {
                PieceType::Pawn => rank != color.pawn_rank(),
                // Decided by the castling field.
                PieceType::King | PieceType::Rook => true,
                _ => false,
            };
            pieces.push(piece);
            file += 1;
        }
        if file != 8 {
            return Err(FenError::BadRankLength { rank: rank + 1 });
        }
    }
    Ok(pieces)
}

fn find_king(pieces: &[Piece], color: Color) -> Result<PieceId, FenError> {
    let mut kings = pieces
        .iter()
        .enumerate()
        .filter(|(_, p)| p.piece_type == PieceType::King && p.color == color);
    match (kings.next(), kings.next()) {
        (Some((i, _)), None) => Ok(PieceId(i)),
        _ => Err(FenError::KingCount(color)),
    }
}

fn apply_castling_field(pieces: &mut [Piece], field: &str) -> Result<(), FenError> {
    if field == "-" {
        return Ok(());
    }
    for c in field.chars() {
        let (color, rook_file) = match c {
            'K' => (Color::White, 7),
            'Q' => (Color::White, 0),
            'k' => (Color::Black, 7),
            'q' => (Color::Black, 0),
            _ => return Err(FenError::InvalidCastling(field.to_string())),
        };
        let rank = color.back_rank();
        let king = Square::new(4, rank);
        let rook = Square::new(rook_file, rank);
        let has = |p: &Piece, pt: PieceType, sq: Square| {
            p.piece_type == pt && p.color == color && p.square == sq
        };
        // A right whose pieces are not in place is meaningless; skip it.
        let king_there = pieces.iter().any(|p| has(p, PieceType::King, king));
        let rook_there = pieces.iter().any(|p| has(p, PieceType::Rook, rook));
        if !(king_there && rook_there) {
            continue;
        }
        for p in pieces.iter_mut() {
            if has(&*p, PieceType::King, king) || has(&*p, PieceType::Rook, rook) {
                p.has_moved = false;
            }
        }
    }
    Ok(())
}

/// Mark the pawn that skipped over `field` as having just double-pushed.
fn parse_en_passant(pieces: &mut [Piece], field: &str, turn: Color) -> Result<Option<PieceId>, FenError> {
    if field == "-" {
        return Ok(None);
    }
    let invalid = || FenError::InvalidEnPassant(field.to_string());
    let target: Square = field.parse().map_err(|_| invalid())?;
    let mover = turn.opposite();
    let pawn_square = target.offset(0, mover.pawn_direction()).ok_or_else(invalid)?;
    if target.rank != (mover.pawn_rank() as i32 + mover.pawn_direction()) as usize {
        return Err(invalid());
    }
    let (i, pawn) = pieces
        .iter_mut()
        .enumerate()
        .find(|(_, p)| p.square == pawn_square && p.piece_type == PieceType::Pawn && p.color == mover)
        .ok_or_else(invalid)?;
    pawn.has_moved = true;
    pawn.last_move = Some(MoveKind::DoublePawnPush);
    Ok(Some(PieceId(i)))
}

pub fn generate_fen(board: &Board) -> String {
    let mut ranks = Vec::with_capacity(8);
    for rank in (0..8).rev() {
        let mut text = String::new();
        let mut empty = 0u8;
        for file in 0..8 {
            match board.piece_at(Square::new(file, rank)) {
                Some(p) => {
                    if empty > 0 {
                        text.push((b'0' + empty) as char);
                        empty = 0;
                    }
                    text.push(p.fen_char());
                }
                None => empty += 1,
            }
        }
        if empty > 0 {
            text.push((b'0' + empty) as char);
        }
        ranks.push(text);
    }

    let side = match board.turn() {
        Color::White => 'w',
        Color::Black => 'b',
    };

    format!(
        "{} {side} {} {} 0 1",
        ranks.join("/"),
        castling_field(board),
        en_passant_field(board)
    )
}

fn castling_field(board: &Board) -> String {
    let mut text = String::new();
    for (color, letters) in [(Color::White, ['K', 'Q']), (Color::Black, ['k', 'q'])] {
        let rank = color.back_rank();
        let king = board.piece(board.king(color));
        if king.has_moved || king.square != Square::new(4, rank) {
            continue;
        }
        for (rook_file, letter) in [(7, letters[0]), (0, letters[1])] {
            let unmoved_rook = board
                .piece_at(Square::new(rook_file, rank))
                .map(|p| p.piece_type == PieceType::Rook && p.color == color && !p.has_moved)
                .unwrap_or(false);
            if unmoved_rook {
                text.push(letter);
            }
        }
    }
    if text.is_empty() {
        text.push('-');
    }
    text
}

fn en_passant_field(board: &Board) -> String {
    board
        .last_moved()
        .map(|id| board.piece(id))
        .filter(|p| {
            p.piece_type == PieceType::Pawn
                && p.last_move == Some(MoveKind::DoublePawnPush)
                && board.tile_at(p.square).is_some()
        })
        .and_then(|p| p.square.offset(0, -p.color.pawn_direction()))
        .map(|sq| sq.name())
        .unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(name: &str) -> Square {
        name.parse().unwrap()
    }

    #[test]
    fn castling_letters_control_unmoved_flags() {
        let board = parse_fen("r3k2r/8/8/8/8/8/8/R3K2R w Kq - 0 1").unwrap();
        assert!(!board.piece_at(sq("e1")).unwrap().has_moved);
        assert!(!board.piece_at(sq("h1")).unwrap().has_moved);
        assert!(board.piece_at(sq("a1")).unwrap().has_moved);
        assert!(!board.piece_at(sq("a8")).unwrap().has_moved);
        assert!(board.piece_at(sq("h8")).unwrap().has_moved);
        assert_eq!(board.to_fen(), "r3k2r/8/8/8/8/8/8/R3K2R w Kq - 0 1");
    }

    #[test]
    fn en_passant_square_marks_the_double_pushed_pawn() {
        let board =
            parse_fen("rnbqkbnr/ppp1pppp/8/8/3pP3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 3").unwrap();
        let pawn = board.tile_at(sq("e4")).unwrap();
        assert_eq!(board.last_moved(), Some(pawn));
        assert_eq!(board.piece(pawn).last_move, Some(MoveKind::DoublePawnPush));
        assert!(board.to_fen().contains(" b KQkq e3 "));
    }

    #[test]
    fn counters_are_optional() {
        let board = parse_fen("4k3/8/8/8/8/8/8/4K3 b").unwrap();
        assert_eq!(board.turn(), Color::Black);
        assert_eq!(board.piece_count(Color::White), 1);
    }

    #[test]
    fn malformed_positions_are_rejected() {
        assert_eq!(parse_fen(""), Err(FenError::MissingField("piece placement")));
        assert_eq!(
            parse_fen("8/8/8/8/8/8/8 w - -"),
            Err(FenError::WrongRankCount(7))
        );
        assert_eq!(
            parse_fen("4k3/8/8/8/8/8/8/4K2 w - -"),
            Err(FenError::BadRankLength { rank: 1 })
        );
        assert_eq!(
            parse_fen("4k3/8/8/8/8/8/8/4X3 w - -"),
            Err(FenError::InvalidPiece('X'))
        );
        assert_eq!(
            parse_fen("4k3/8/8/8/8/8/8/8 w - -"),
            Err(FenError::KingCount(Color::White))
        );
        assert_eq!(
            parse_fen("4k3/8/8/8/8/8/8/4K3 x - -"),
            Err(FenError::InvalidSide("x".to_string()))
        );
        assert!(matches!(
            parse_fen("4k3/8/8/8/8/8/8/4K3 w - e4"),
            Err(FenError::InvalidEnPassant(_))
        ));
    }

    #[test]
    fn pawns_off_their_start_rank_count_as_moved() {
        let board = parse_fen("4k3/8/8/8/4P3/8/3P4/4K3 w - - 0 1").unwrap();
        assert!(board.piece_at(sq("e4")).unwrap().has_moved);
        assert!(!board.piece_at(sq("d2")).unwrap().has_moved);
    }
}
