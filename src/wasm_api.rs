use crate::board::BoardSnapshot;
use crate::game::{Game, GameConfig, Transition};
use crate::moves::MoveKind;
use crate::notation::MoveEntry;
use crate::piece::Square;
use crate::tree::{Arrow, NodeId};
use serde::Serialize;
use wasm_bindgen::prelude::*;

#[derive(Serialize)]
struct BoardState {
    #[serde(flatten)]
    snapshot: BoardSnapshot,
    no_legal_moves: bool,
    fen: String,
    cursor: NodeId,
    at_beginning: bool,
    at_end: bool,
    has_variations: bool,
    last_move: Option<[[usize; 2]; 2]>,
    arrows: Vec<[[usize; 2]; 2]>,
}

#[derive(Serialize)]
struct MoveResult {
    transition: Option<Transition>,
    board_state: Option<BoardState>,
    error: Option<String>,
}

#[derive(Serialize)]
struct SquareMoveJson {
    to: [usize; 2],
    kind: MoveKind,
}

fn to_js<T: Serialize>(value: &T) -> JsValue {
    serde_wasm_bindgen::to_value(value).unwrap_or(JsValue::NULL)
}

fn square(file: usize, rank: usize) -> Option<Square> {
    (file < 8 && rank < 8).then(|| Square::new(file, rank))
}

fn arrow_json(&(from, to): &Arrow) -> [[usize; 2]; 2] {
    [[from.file, from.rank], [to.file, to.rank]]
}

fn build_board_state(game: &Game) -> BoardState {
    let tree = game.tree();
    let cursor = game.cursor();
    let last_move = tree
        .node_move(cursor.node())
        .map(|m| arrow_json(&(m.from, m.to)));
    BoardState {
        snapshot: game.snapshot(),
        no_legal_moves: game.has_no_legal_moves(),
        fen: game.board().to_fen(),
        cursor: cursor.node(),
        at_beginning: tree.is_at_beginning(&cursor),
        at_end: tree.is_at_end(&cursor),
        has_variations: tree.has_variations(&cursor),
        last_move,
        arrows: game.arrows().iter().map(arrow_json).collect(),
    }
}

fn move_result(game: &Game, transition: Option<Transition>, error: &str) -> JsValue {
    let result = match transition {
        Some(t) => MoveResult {
            transition: Some(t),
            board_state: Some(build_board_state(game)),
            error: None,
        },
        None => MoveResult {
            transition: None,
            board_state: None,
            error: Some(error.to_string()),
        },
    };
    to_js(&result)
}

#[wasm_bindgen(js_name = Game)]
pub struct WasmGame {
    game: Game,
}

#[wasm_bindgen(js_class = Game)]
impl WasmGame {
    #[wasm_bindgen(constructor)]
    pub fn new() -> WasmGame {
        WasmGame { game: Game::new() }
    }

    /// Build from a JSON `GameConfig`, e.g. `{"start_fen": "...", "flipped": true}`.
    pub fn with_config(json: &str) -> Result<WasmGame, JsValue> {
        let config: GameConfig =
            serde_json::from_str(json).map_err(|e| JsValue::from_str(&e.to_string()))?;
        let game = Game::with_config(config).map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(WasmGame { game })
    }

    pub fn get_board_state(&self) -> JsValue {
        to_js(&build_board_state(&self.game))
    }

    pub fn get_legal_moves_for_square(&self, file: usize, rank: usize) -> JsValue {
        let moves: Vec<SquareMoveJson> = square(file, rank)
            .map(|sq| self.game.legal_moves_for(sq))
            .unwrap_or_default()
            .iter()
            .map(|m| SquareMoveJson {
                to: [m.to.file, m.to.rank],
                kind: m.kind,
            })
            .collect();
        to_js(&moves)
    }

    pub fn make_move(&mut self, from_file: usize, from_rank: usize, to_file: usize, to_rank: usize) -> JsValue {
        let found = square(from_file, from_rank)
            .zip(square(to_file, to_rank))
            .and_then(|(from, to)| self.game.find_move(from, to));
        let transition = found.and_then(|mv| self.game.apply_selected_move(&mv));
        move_result(&self.game, transition, "Illegal move")
    }

    pub fn go_to_previous_move(&mut self) -> JsValue {
        let transition = self.game.go_to_previous_move();
        move_result(&self.game, transition, "Already at the first position")
    }

    /// Follow child `child` of the current position, or the main line when
    /// omitted.
    pub fn go_to_next_move(&mut self, child: Option<usize>) -> JsValue {
        let transition = self.game.go_to_next_move(child);
        move_result(&self.game, transition, "No move to go forward to")
    }

    /// Both steps of a variation switch: out of the current move, then into
    /// its sibling. Empty when there is no other variation.
    pub fn go_to_sibling(&mut self, offset: isize) -> JsValue {
        to_js(&self.game.go_to_sibling(offset))
    }

    /// Record arrows for the current position, given as
    /// `[[[from_file, from_rank], [to_file, to_rank]], ...]`.
    pub fn set_arrows(&mut self, arrows: JsValue) -> Result<(), JsValue> {
        let raw: Vec<[[usize; 2]; 2]> = serde_wasm_bindgen::from_value(arrows)?;
        let arrows = raw
            .into_iter()
            .map(|[[ff, fr], [tf, tr]]| square(ff, fr).zip(square(tf, tr)))
            .collect::<Option<Vec<Arrow>>>()
            .ok_or_else(|| JsValue::from_str("Arrow square out of range"))?;
        self.game.set_arrows(arrows);
        Ok(())
    }

    pub fn go_to_initial_move(&mut self) -> JsValue {
        to_js(&self.game.go_to_initial_move())
    }

    pub fn go_to_current_move(&mut self) -> JsValue {
        to_js(&self.game.go_to_current_move())
    }

    pub fn go_to_node(&mut self, node: usize) -> bool {
        self.game.go_to_node(NodeId(node))
    }

    pub fn get_move_list(&self) -> JsValue {
        let entries: Vec<MoveEntry> = self.game.move_list();
        to_js(&entries)
    }

    /// Labels of the variations continuing from the current position.
    pub fn variations(&mut self) -> js_sys::Array {
        self.game
            .variations()
            .into_iter()
            .map(JsValue::from)
            .collect()
    }

    pub fn king_is_checked(&self) -> bool {
        self.game.king_is_checked()
    }

    pub fn flip_board(&mut self) {
        self.game.flip_board();
    }

    pub fn reset(&mut self) {
        self.game.reset();
    }

    pub fn build_info() -> String {
        format!(
            "{} {} built {}",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION"),
            crate::BUILD_TIMESTAMP
        )
    }
}

impl Default for WasmGame {
    fn default() -> Self {
        Self::new()
    }
}
