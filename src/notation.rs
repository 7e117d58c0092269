// =============================================================================
// Move labels and the flattened move list shown beside the board
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::apply::{apply_move, undo_move, Undo};
use crate::board::Board;
use crate::movegen;
use crate::moves::{Move, MoveKind};
use crate::piece::{Color, PieceType};
use crate::tree::{MoveTree, NodeId};

/// One label in the move list.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct MoveEntry {
    pub node: NodeId,
    pub label: String,
    pub row: usize,
    /// Variation nesting level; the main line is 0.
    pub indent: usize,
}

/// Short algebraic text for `mv`, played from `board` (which must be the
/// position before the move): "Nf3", "exd5", "Rad1", "e8=Q+", "O-O".
pub fn san(board: &mut Board, mv: &Move) -> String {
    let mut text = match mv.kind {
        MoveKind::CastleKingside => "O-O".to_string(),
        MoveKind::CastleQueenside => "O-O-O".to_string(),
        _ if mv.piece_type == PieceType::Pawn => pawn_text(mv),
        _ => piece_text(board, mv),
    };

    let undo = apply_move(board, mv);
    if board.king_is_checked() {
        let mate = movegen::legal_moves(board).is_empty();
        text.push(if mate { '#' } else { '+' });
    }
    undo_move(board, mv, &undo);
    text
}

fn pawn_text(mv: &Move) -> String {
    let mut text = String::new();
    if mv.is_capture() {
        text.push(mv.from.file_char());
        text.push('x');
    }
    text.push_str(&mv.to.name());
    if mv.kind == MoveKind::Promotion {
        text.push_str("=Q");
    }
    text
}

fn piece_text(board: &mut Board, mv: &Move) -> String {
    let rivals: Vec<Move> = movegen::legal_moves(board)
        .into_iter()
        .filter(|m| m.piece_type == mv.piece_type && m.to == mv.to && m.piece != mv.piece)
        .collect();

    let mut text = String::new();
    text.push(mv.piece_type.letter());
    if !rivals.is_empty() {
        if rivals.iter().all(|m| m.from.file != mv.from.file) {
            text.push(mv.from.file_char());
        } else if rivals.iter().all(|m| m.from.rank != mv.from.rank) {
            text.push_str(&(mv.from.rank + 1).to_string());
        } else {
            text.push_str(&mv.from.name());
        }
    }
    if mv.is_capture() {
        text.push('x');
    }
    text.push_str(&mv.to.name());
    text
}

/// Full move number of the move at tree depth `depth` (1 for the first move).
fn move_number(mv: &Move, depth: usize) -> usize {
    let depth = depth.max(1);
    let white_started = (depth % 2 == 1) == (mv.color == Color::White);
    let ply = if white_started { depth - 1 } else { depth };
    ply / 2 + 1
}

/// Label for a move at tree depth `depth`. White moves carry their number
/// ("1.e4"); Black moves carry it only with `show_dots` ("1...e5").
pub fn move_label(board: &mut Board, mv: &Move, depth: usize, show_dots: bool) -> String {
    let text = san(board, mv);
    let number = move_number(mv, depth);
    match mv.color {
        Color::White => format!("{number}.{text}"),
        Color::Black if show_dots => format!("{number}...{text}"),
        Color::Black => text,
    }
}

/// Flatten the tree into panel rows. The main line runs at indent 0. At a
/// branch the main-line move comes first, then each sideline on its own row
/// one level deeper, then the main line picks up again on a fresh row.
pub fn move_list(tree: &MoveTree, start: &Board) -> Vec<MoveEntry> {
    let mut walker = Walker {
        tree,
        board: start.clone(),
        entries: Vec::new(),
        row: 0,
    };
    walker.line(MoveTree::ROOT, 0, 0, true);
    walker.entries
}

struct Walker<'a> {
    tree: &'a MoveTree,
    board: Board,
    entries: Vec<MoveEntry>,
    row: usize,
}

impl Walker<'_> {
    fn emit(&mut self, node: NodeId, mv: &Move, depth: usize, indent: usize, dots: bool) {
        let label = move_label(&mut self.board, mv, depth, dots);
        self.entries.push(MoveEntry {
            node,
            label,
            row: self.row,
            indent,
        });
    }

    /// Emit everything below `from`, which sits at `depth`. The board must
    /// hold the position at `from` and is left there on return.
    fn line(&mut self, from: NodeId, depth: usize, indent: usize, mut dots: bool) {
        let tree = self.tree;
        let mut node = from;
        let mut depth = depth;
        let mut played: Vec<(Move, Undo)> = Vec::new();

        while let Some(main) = tree.child(node, 0) {
            let Some(&mv) = tree.node_move(main) else {
                break;
            };
            self.emit(main, &mv, depth + 1, indent, dots);
            dots = false;

            let sidelines = &tree.children(node)[1..];
            for &side in sidelines {
                let Some(&side_mv) = tree.node_move(side) else {
                    continue;
                };
                self.row += 1;
                self.emit(side, &side_mv, depth + 1, indent + 1, true);
                let undo = apply_move(&mut self.board, &side_mv);
                self.line(side, depth + 1, indent + 1, false);
                undo_move(&mut self.board, &side_mv, &undo);
            }
            if !sidelines.is_empty() {
                self.row += 1;
                dots = true;
            }

            let undo = apply_move(&mut self.board, &mv);
            played.push((mv, undo));
            node = main;
            depth += 1;
        }

        while let Some((mv, undo)) = played.pop() {
            undo_move(&mut self.board, &mv, &undo);
        }
    }
}
