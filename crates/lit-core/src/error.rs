use thiserror::Error;

use crate::dtype::PrimitiveType;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LiteralError {
    #[error("invalid shape: {0}")]
    InvalidShape(String),
    #[error("rank mismatch: shape has rank {expected}, multi-index has {got} entries")]
    RankMismatch { expected: usize, got: usize },
    #[error("index out of range on axis {axis}: {index} not in [0, {bound})")]
    IndexOutOfRange { axis: usize, index: i64, bound: usize },
    #[error("type mismatch: literal holds {expected}, requested {got}")]
    TypeMismatch {
        expected: PrimitiveType,
        got: PrimitiveType,
    },
}

pub type Result<T> = std::result::Result<T, LiteralError>;
