pub mod apply;
pub mod board;
pub mod errors;
pub mod fen;
pub mod game;
pub mod movegen;
pub mod moves;
pub mod notation;
pub mod piece;
pub mod tree;

#[cfg(target_arch = "wasm32")]
mod wasm_api;

pub use board::Board;
pub use game::{Game, GameConfig, Transition};
pub use moves::{Move, MoveKind};
pub use tree::{Cursor, MoveTree, NodeId};

/// When this build was made, stamped by `build.rs`.
pub const BUILD_TIMESTAMP: &str = env!("BUILD_TIMESTAMP");
