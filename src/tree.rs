// =============================================================================
// Branching move history
//
// Nodes live in an arena and refer to each other by `NodeId`. Child 0 of a
// node is its main line; later children are variations in insertion order.
// Nodes are only removed by `MoveTree::clear`. An id from before a clear is
// stale: lookups with it return `None` or an empty slice.
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::moves::Move;
use crate::piece::Square;

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Debug)]
pub struct NodeId(pub usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// An arrow drawn on the board, from one square to another.
pub type Arrow = (Square, Square);

#[derive(Clone, PartialEq, Eq, Debug)]
struct Node {
    mv: Option<Move>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// Arrows shown while this node's position is on the board.
    arrows: Vec<Arrow>,
}

impl Node {
    fn new(mv: Option<Move>, parent: Option<NodeId>) -> Self {
        Node {
            mv,
            parent,
            children: Vec::new(),
            arrows: Vec::new(),
        }
    }
}

/// A position in a [`MoveTree`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Cursor {
    node: NodeId,
}

impl Cursor {
    pub fn node(&self) -> NodeId {
        self.node
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct MoveTree {
    nodes: Vec<Node>,
    number_of_moves: usize,
}

impl Default for MoveTree {
    fn default() -> Self {
        Self::new()
    }
}

impl MoveTree {
    pub const ROOT: NodeId = NodeId(0);

    pub fn new() -> Self {
        MoveTree {
            nodes: vec![Node::new(None, None)],
            number_of_moves: 0,
        }
    }

    fn get(&self, node: NodeId) -> Option<&Node> {
        self.nodes.get(node.0)
    }

    pub fn root(&self) -> NodeId {
        Self::ROOT
    }

    /// A cursor at the root.
    pub fn begin(&self) -> Cursor {
        Cursor { node: Self::ROOT }
    }

    pub fn is_at_beginning(&self, cursor: &Cursor) -> bool {
        self.parent(cursor.node).is_none()
    }

    pub fn is_at_end(&self, cursor: &Cursor) -> bool {
        self.children(cursor.node).is_empty()
    }

    /// Whether the cursor's node has more than one continuation.
    pub fn has_variations(&self, cursor: &Cursor) -> bool {
        self.children(cursor.node).len() > 1
    }

    /// Append `mv` as the last child of the cursor's node and move the cursor
    /// onto it. `None`, with nothing inserted, for a stale cursor.
    pub fn insert_node(&mut self, mv: Move, cursor: &mut Cursor) -> Option<NodeId> {
        let id = NodeId(self.nodes.len());
        let parent = self.nodes.get_mut(cursor.node.0)?;
        parent.children.push(id);
        self.nodes.push(Node::new(Some(mv), Some(cursor.node)));
        self.number_of_moves += 1;
        cursor.node = id;
        Some(id)
    }

    /// Descend into child `child`. Returns false, leaving the cursor where it
    /// was, when there is no such child.
    pub fn go_to_next_node(&self, child: usize, cursor: &mut Cursor) -> bool {
        match self.child(cursor.node, child) {
            Some(next) => {
                cursor.node = next;
                true
            }
            None => false,
        }
    }

    /// Ascend to the parent. A no-op returning false at the root.
    pub fn go_to_previous_node(&self, cursor: &mut Cursor) -> bool {
        match self.parent(cursor.node) {
            Some(parent) => {
                cursor.node = parent;
                true
            }
            None => false,
        }
    }

    /// Move to the sibling `offset` places away, wrapping around the parent's
    /// children. Returns false at the root or when there is no other sibling.
    pub fn go_to_sibling(&self, cursor: &mut Cursor, offset: isize) -> bool {
        let Some(parent) = self.parent(cursor.node) else {
            return false;
        };
        let siblings = self.children(parent);
        if siblings.len() < 2 {
            return false;
        }
        let Some(here) = siblings.iter().position(|&c| c == cursor.node) else {
            return false;
        };
        let n = siblings.len() as isize;
        let next = (here as isize + offset).rem_euclid(n) as usize;
        cursor.node = siblings[next];
        next != here
    }

    pub fn node_move(&self, node: NodeId) -> Option<&Move> {
        self.get(node)?.mv.as_ref()
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.get(node)?.parent
    }

    /// Children in order, main line first. Empty for a leaf or a stale id.
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.get(node).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn child(&self, node: NodeId, index: usize) -> Option<NodeId> {
        self.children(node).get(index).copied()
    }

    /// Position of `node` among its parent's children.
    pub fn child_index(&self, node: NodeId) -> Option<usize> {
        let parent = self.parent(node)?;
        self.children(parent).iter().position(|&c| c == node)
    }

    /// Arrows recorded for `node`'s position.
    pub fn arrows(&self, node: NodeId) -> Option<&[Arrow]> {
        self.get(node).map(|n| n.arrows.as_slice())
    }

    /// Replace the arrows of `node`. False for a stale id.
    pub fn set_arrows(&mut self, node: NodeId, arrows: Vec<Arrow>) -> bool {
        match self.nodes.get_mut(node.0) {
            Some(n) => {
                n.arrows = arrows;
                true
            }
            None => false,
        }
    }

    /// Number of ancestors. The root has depth 0, the first move depth 1.
    pub fn depth(&self, node: NodeId) -> Option<usize> {
        self.get(node)?;
        let mut depth = 0;
        let mut at = node;
        while let Some(parent) = self.parent(at) {
            depth += 1;
            at = parent;
        }
        Some(depth)
    }

    /// Nodes from the first move down to `node`, root excluded. Empty for the
    /// root or a stale id.
    pub fn path_to(&self, node: NodeId) -> Vec<NodeId> {
        let mut path = Vec::new();
        let mut at = node;
        while let Some(parent) = self.parent(at) {
            path.push(at);
            at = parent;
        }
        path.reverse();
        path
    }

    /// Child-0 path from the root to the end of the main line.
    pub fn main_line(&self) -> Vec<NodeId> {
        let mut line = Vec::new();
        let mut at = Self::ROOT;
        while let Some(next) = self.child(at, 0) {
            line.push(next);
            at = next;
        }
        line
    }

    /// Moves inserted since the tree was created or last cleared.
    pub fn number_of_moves(&self) -> usize {
        self.number_of_moves
    }

    pub fn contains(&self, node: NodeId) -> bool {
        node.0 < self.nodes.len()
    }

    /// Drop every node except a fresh root.
    pub fn clear(&mut self) {
        *self = Self::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::MoveKind;
    use crate::piece::{Color, PieceId, PieceType};

    fn mv(from: &str, to: &str) -> Move {
        Move {
            from: from.parse().unwrap(),
            to: to.parse().unwrap(),
            piece: PieceId(0),
            piece_type: PieceType::Pawn,
            color: Color::White,
            kind: MoveKind::Normal,
            secondary: None,
        }
    }

    fn sq(name: &str) -> Square {
        name.parse().unwrap()
    }

    #[test]
    fn insert_advances_the_cursor() {
        let mut tree = MoveTree::new();
        let mut cursor = tree.begin();
        assert!(tree.is_at_beginning(&cursor));
        assert!(tree.is_at_end(&cursor));

        let a = tree.insert_node(mv("e2", "e4"), &mut cursor).unwrap();
        assert_eq!(cursor.node(), a);
        assert_eq!(tree.depth(a), Some(1));
        assert!(!tree.is_at_beginning(&cursor));
        let b = tree.insert_node(mv("e7", "e5"), &mut cursor).unwrap();
        assert_eq!(tree.depth(b), Some(2));
        assert_eq!(tree.parent(b), Some(a));
        assert_eq!(tree.number_of_moves(), 2);
    }

    #[test]
    fn second_insert_at_a_node_becomes_a_variation() {
        let mut tree = MoveTree::new();
        let mut cursor = tree.begin();
        let main = tree.insert_node(mv("e2", "e4"), &mut cursor).unwrap();
        tree.go_to_previous_node(&mut cursor);
        let side = tree.insert_node(mv("d2", "d4"), &mut cursor).unwrap();

        assert_eq!(tree.children(MoveTree::ROOT), &[main, side]);
        assert_eq!(tree.child_index(side), Some(1));
        let mut c = tree.begin();
        assert!(tree.has_variations(&c));
        assert!(tree.go_to_next_node(0, &mut c));
        assert_eq!(c.node(), main, "child 0 stays the first-inserted move");

        let mut c = tree.begin();
        assert!(tree.go_to_next_node(1, &mut c));
        assert_eq!(tree.node_move(c.node()).map(|m| m.to.name()), Some("d4".to_string()));
        assert_eq!(tree.main_line(), vec![main]);
    }

    #[test]
    fn descending_past_the_end_fails_without_moving() {
        let mut tree = MoveTree::new();
        let mut cursor = tree.begin();
        tree.insert_node(mv("e2", "e4"), &mut cursor);
        let at = cursor;
        assert!(!tree.go_to_next_node(0, &mut cursor));
        assert_eq!(cursor, at);
        let mut root = tree.begin();
        assert!(!tree.go_to_next_node(3, &mut root));
        assert_eq!(root.node(), MoveTree::ROOT);
    }

    #[test]
    fn ascent_reaches_the_parent_and_stops_at_the_root() {
        let mut tree = MoveTree::new();
        let mut cursor = tree.begin();
        let a = tree.insert_node(mv("e2", "e4"), &mut cursor).unwrap();
        tree.insert_node(mv("e7", "e5"), &mut cursor);
        assert!(tree.go_to_previous_node(&mut cursor));
        assert_eq!(cursor.node(), a);
        assert!(tree.go_to_previous_node(&mut cursor));
        assert!(tree.is_at_beginning(&cursor));
        assert!(!tree.go_to_previous_node(&mut cursor));
        assert_eq!(cursor.node(), MoveTree::ROOT);
    }

    #[test]
    fn sibling_shift_wraps_around() {
        let mut tree = MoveTree::new();
        let mut cursor = tree.begin();
        let mut ids = Vec::new();
        for file in ["e", "d", "c"] {
            cursor = tree.begin();
            let from = format!("{file}2");
            let to = format!("{file}4");
            ids.push(tree.insert_node(mv(&from, &to), &mut cursor).unwrap());
        }
        assert_eq!(cursor.node(), ids[2]);
        assert!(tree.go_to_sibling(&mut cursor, 1));
        assert_eq!(cursor.node(), ids[0]);
        assert!(tree.go_to_sibling(&mut cursor, -1));
        assert_eq!(cursor.node(), ids[2]);

        let mut root = tree.begin();
        assert!(!tree.go_to_sibling(&mut root, 1));
    }

    #[test]
    fn path_and_clear() {
        let mut tree = MoveTree::new();
        let mut cursor = tree.begin();
        let a = tree.insert_node(mv("e2", "e4"), &mut cursor).unwrap();
        let b = tree.insert_node(mv("e7", "e5"), &mut cursor).unwrap();
        assert_eq!(tree.path_to(b), vec![a, b]);
        assert!(tree.path_to(MoveTree::ROOT).is_empty());

        tree.clear();
        assert_eq!(tree.number_of_moves(), 0);
        assert!(tree.children(MoveTree::ROOT).is_empty());
        assert!(!tree.contains(a));
    }

    #[test]
    fn stale_ids_after_clear_are_harmless() {
        let mut tree = MoveTree::new();
        let mut cursor = tree.begin();
        let a = tree.insert_node(mv("e2", "e4"), &mut cursor).unwrap();
        tree.insert_node(mv("e7", "e5"), &mut cursor);
        tree.clear();

        assert!(tree.node_move(a).is_none());
        assert!(tree.parent(a).is_none());
        assert!(tree.children(a).is_empty());
        assert_eq!(tree.depth(a), None);
        assert!(tree.path_to(a).is_empty());
        assert!(tree.arrows(a).is_none());
        assert!(!tree.set_arrows(a, vec![(sq("a1"), sq("a2"))]));

        assert!(tree.is_at_end(&cursor));
        assert!(!tree.go_to_next_node(0, &mut cursor));
        assert!(tree.insert_node(mv("d2", "d4"), &mut cursor).is_none());
        assert_eq!(tree.number_of_moves(), 0);
    }

    #[test]
    fn arrows_belong_to_their_node() {
        let mut tree = MoveTree::new();
        let mut cursor = tree.begin();
        let a = tree.insert_node(mv("e2", "e4"), &mut cursor).unwrap();
        let arrow = (sq("g1"), sq("f3"));
        assert!(tree.set_arrows(a, vec![arrow]));
        assert_eq!(tree.arrows(a), Some(&[arrow][..]));
        assert_eq!(tree.arrows(MoveTree::ROOT), Some(&[][..]));

        let b = tree.insert_node(mv("e7", "e5"), &mut cursor).unwrap();
        assert!(tree.arrows(b).unwrap().is_empty());
        assert_eq!(tree.arrows(a), Some(&[arrow][..]));
    }
}
