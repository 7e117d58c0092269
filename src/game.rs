use serde::{Deserialize, Serialize};

use crate::apply::{apply_move, undo_move, Undo};
use crate::board::{Board, BoardSnapshot};
use crate::errors::FenError;
use crate::movegen;
use crate::moves::{Move, MoveKind, Secondary};
use crate::notation::{self, MoveEntry};
use crate::piece::{PieceId, Square};
use crate::tree::{Arrow, Cursor, MoveTree, NodeId};

/// Construction-time settings for a [`Game`].
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug, Default)]
#[serde(default)]
pub struct GameConfig {
    /// Position to start from instead of the standard setup.
    pub start_fen: Option<String>,
    /// Draw the board from Black's side.
    pub flipped: bool,
}

/// One piece sliding between two squares.
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct Slide {
    pub piece: PieceId,
    pub from: Square,
    pub to: Square,
}

/// What changed on the board when the cursor moved one edge, in the
/// direction it moved. For an undo the slides run backwards, `captured` is a
/// piece coming back and `promoted` is a queen going away.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct Transition {
    pub undo: bool,
    pub node: NodeId,
    pub kind: MoveKind,
    pub mover: Slide,
    pub rook: Option<Slide>,
    pub captured: Option<Secondary>,
    pub promoted: Option<PieceId>,
    /// The side to move after the transition is in check.
    pub gives_check: bool,
    /// The side to move after the transition has nothing to play.
    pub no_legal_moves: bool,
    /// Arrows recorded for the position the cursor landed on.
    pub arrows: Vec<Arrow>,
}

/// A board, its move history and the cursor into it.
///
/// The board always equals the start position with the moves on the path
/// from the root to the cursor replayed onto it. `undo_stack` holds one
/// [`Undo`] per node on that path.
#[derive(Clone, Debug)]
pub struct Game {
    board: Board,
    start: Board,
    tree: MoveTree,
    cursor: Cursor,
    undo_stack: Vec<Undo>,
    legal: Vec<Move>,
    config: GameConfig,
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl Game {
    pub fn new() -> Self {
        Self::from_board(Board::new(), GameConfig::default())
    }

    pub fn with_config(config: GameConfig) -> Result<Self, FenError> {
        let mut board = match config.start_fen.as_deref() {
            Some(fen) => Board::from_fen(fen)?,
            None => Board::new(),
        };
        if config.flipped {
            board.flip_board();
        }
        Ok(Self::from_board(board, config))
    }

    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        Self::with_config(GameConfig {
            start_fen: Some(fen.to_string()),
            ..GameConfig::default()
        })
    }

    fn from_board(board: Board, config: GameConfig) -> Self {
        let tree = MoveTree::new();
        let mut game = Game {
            start: board.clone(),
            board,
            cursor: tree.begin(),
            tree,
            undo_stack: Vec::new(),
            legal: Vec::new(),
            config,
        };
        game.refresh_legal();
        game
    }

    fn refresh_legal(&mut self) {
        self.legal = movegen::legal_moves(&mut self.board);
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Position the tree is rooted at.
    pub fn start_position(&self) -> &Board {
        &self.start
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        self.board.snapshot()
    }

    pub fn tree(&self) -> &MoveTree {
        &self.tree
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Legal moves for the side to move.
    pub fn legal_moves(&self) -> &[Move] {
        &self.legal
    }

    /// Legal moves of the piece on `square`, empty when it is not that
    /// piece's turn.
    pub fn legal_moves_for(&self, square: Square) -> Vec<Move> {
        self.legal.iter().filter(|m| m.from == square).copied().collect()
    }

    pub fn find_move(&self, from: Square, to: Square) -> Option<Move> {
        self.legal.iter().find(|m| m.from == from && m.to == to).copied()
    }

    pub fn king_is_checked(&self) -> bool {
        self.board.king_is_checked()
    }

    pub fn has_no_legal_moves(&self) -> bool {
        self.legal.is_empty()
    }

    /// Play `mv` from the current position and record it in the tree.
    ///
    /// Returns `None` for a move that is not legal here. Playing a move the
    /// cursor's node already has as a child follows that child instead of
    /// adding a duplicate variation.
    pub fn apply_selected_move(&mut self, mv: &Move) -> Option<Transition> {
        if !self.legal.contains(mv) {
            return None;
        }
        let existing = self
            .tree
            .children(self.cursor.node())
            .iter()
            .position(|&child| self.tree.node_move(child) == Some(mv));
        match existing {
            Some(index) => {
                self.tree.go_to_next_node(index, &mut self.cursor);
            }
            None => {
                self.tree.insert_node(*mv, &mut self.cursor);
            }
        }
        Some(self.play_forward(*mv))
    }

    /// Replay the move at child `child` (main line when `None`) of the
    /// cursor's node. `None` at the end of a line or for a missing child.
    pub fn go_to_next_move(&mut self, child: Option<usize>) -> Option<Transition> {
        if !self.tree.go_to_next_node(child.unwrap_or(0), &mut self.cursor) {
            return None;
        }
        let mv = *self.tree.node_move(self.cursor.node())?;
        Some(self.play_forward(mv))
    }

    /// Take back the move at the cursor. `None` at the root.
    pub fn go_to_previous_move(&mut self) -> Option<Transition> {
        let node = self.cursor.node();
        let mv = *self.tree.node_move(node)?;
        let undo = self.undo_stack.pop();
        debug_assert!(undo.is_some(), "undo stack out of step with the cursor");
        let undo = undo?;

        undo_move(&mut self.board, &mv, &undo);
        self.tree.go_to_previous_node(&mut self.cursor);
        self.refresh_legal();
        Some(self.transition(node, &mv, &undo, true))
    }

    /// Rewind to the start position.
    pub fn go_to_initial_move(&mut self) -> Vec<Transition> {
        let mut steps = Vec::new();
        while let Some(t) = self.go_to_previous_move() {
            steps.push(t);
        }
        steps
    }

    /// Follow the main line from the cursor to its end.
    pub fn go_to_current_move(&mut self) -> Vec<Transition> {
        let mut steps = Vec::new();
        while let Some(t) = self.go_to_next_move(None) {
            steps.push(t);
        }
        steps
    }

    /// Jump to any node: rewind to the deepest node shared with the current
    /// path, then replay down to `target`. False for an unknown node.
    pub fn go_to_node(&mut self, target: NodeId) -> bool {
        if !self.tree.contains(target) {
            return false;
        }
        let here = self.tree.path_to(self.cursor.node());
        let there = self.tree.path_to(target);
        let shared = here.iter().zip(&there).take_while(|(a, b)| a == b).count();

        for _ in shared..here.len() {
            self.go_to_previous_move();
        }
        for &node in &there[shared..] {
            let Some(index) = self.tree.child_index(node) else {
                return false;
            };
            if self.go_to_next_move(Some(index)).is_none() {
                return false;
            }
        }
        true
    }

    /// Swap the cursor's move for the sibling variation `offset` places away.
    /// Returns the step back out of the current move followed by the step into
    /// the sibling, or nothing when there is no other sibling.
    pub fn go_to_sibling(&mut self, offset: isize) -> Vec<Transition> {
        let node = self.cursor.node();
        let (Some(parent), Some(here)) = (self.tree.parent(node), self.tree.child_index(node)) else {
            return Vec::new();
        };
        let count = self.tree.children(parent).len() as isize;
        let next = (here as isize + offset).rem_euclid(count) as usize;
        if next == here {
            return Vec::new();
        }
        let mut steps: Vec<Transition> = self.go_to_previous_move().into_iter().collect();
        steps.extend(self.go_to_next_move(Some(next)));
        steps
    }

    /// Arrows recorded for the current position.
    pub fn arrows(&self) -> &[Arrow] {
        self.tree.arrows(self.cursor.node()).unwrap_or(&[])
    }

    /// Replace the arrows of the current position. They stay with this node
    /// and come back whenever the cursor returns to it.
    pub fn set_arrows(&mut self, arrows: Vec<Arrow>) {
        self.tree.set_arrows(self.cursor.node(), arrows);
    }

    /// Forget the whole history and return to the configured start position.
    /// The flip flag is kept.
    pub fn reset(&mut self) {
        let flipped = self.board.is_flipped();
        self.board = self.start.clone();
        if self.board.is_flipped() != flipped {
            self.board.flip_board();
        }
        self.tree.clear();
        self.cursor = self.tree.begin();
        self.undo_stack.clear();
        self.refresh_legal();
    }

    pub fn flip_board(&mut self) {
        self.board.flip_board();
    }

    /// Labels of the moves that continue from the cursor, in child order.
    pub fn variations(&mut self) -> Vec<String> {
        let depth = self.tree.depth(self.cursor.node()).unwrap_or(0) + 1;
        let children = self.tree.children(self.cursor.node()).to_vec();
        children
            .into_iter()
            .filter_map(|child| self.tree.node_move(child).copied())
            .map(|mv| notation::move_label(&mut self.board, &mv, depth, true))
            .collect()
    }

    /// The whole tree as side-panel rows.
    pub fn move_list(&self) -> Vec<MoveEntry> {
        notation::move_list(&self.tree, &self.start)
    }

    fn play_forward(&mut self, mv: Move) -> Transition {
        let undo = apply_move(&mut self.board, &mv);
        self.undo_stack.push(undo);
        self.refresh_legal();
        self.transition(self.cursor.node(), &mv, &undo, false)
    }

    fn transition(&self, node: NodeId, mv: &Move, undo: &Undo, undoing: bool) -> Transition {
        let slide = |piece: PieceId, from: Square, to: Square| {
            if undoing {
                Slide { piece, from: to, to: from }
            } else {
                Slide { piece, from, to }
            }
        };
        let rook = match (mv.kind.is_castle(), mv.secondary, mv.rook_target()) {
            (true, Some(r), Some(rook_to)) => Some(slide(r.piece, r.square, rook_to)),
            _ => None,
        };
        let captured = if mv.is_capture() { mv.secondary } else { None };
        Transition {
            undo: undoing,
            node,
            kind: mv.kind,
            mover: slide(mv.piece, mv.from, mv.to),
            rook,
            captured,
            promoted: undo.promoted(),
            gives_check: self.board.king_is_checked(),
            no_legal_moves: self.legal.is_empty(),
            arrows: self.arrows().to_vec(),
        }
    }
}
