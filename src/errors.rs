use thiserror::Error;

/// Failure to parse a square name such as "e4".
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SquareError {
    #[error("invalid square length: {0}, expected 2")]
    InvalidLength(usize),
    #[error("invalid file character: '{0}'")]
    InvalidFile(char),
    #[error("invalid rank character: '{0}'")]
    InvalidRank(char),
}

/// Failure to build a board from a position string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FenError {
    #[error("position string is missing the {0} field")]
    MissingField(&'static str),
    #[error("expected 8 ranks in piece placement, found {0}")]
    WrongRankCount(usize),
    #[error("rank {rank} does not describe exactly 8 squares")]
    BadRankLength { rank: usize },
    #[error("invalid piece character: '{0}'")]
    InvalidPiece(char),
    #[error("invalid side to move: {0}")]
    InvalidSide(String),
    #[error("invalid castling field: {0}")]
    InvalidCastling(String),
    #[error("invalid en passant square: {0}")]
    InvalidEnPassant(String),
    #[error("expected exactly one {0:?} king")]
    KingCount(crate::piece::Color),
}
