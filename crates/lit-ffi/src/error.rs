use std::cell::RefCell;
use std::ffi::CString;

use lit_core::LiteralError;
use thiserror::Error;

use crate::types::{LitHandle, LitStatus};

#[derive(Error, Debug)]
pub enum FfiError {
    #[error(transparent)]
    Literal(#[from] LiteralError),
    #[error("handle {0} was already released")]
    UseAfterFree(LitHandle),
    #[error("handle {0} was never issued")]
    InvalidHandle(LitHandle),
    #[error("handle {handle} names a {found}, expected a {expected}")]
    WrongKind {
        handle: LitHandle,
        expected: &'static str,
        found: &'static str,
    },
    #[error("unknown element type id {0}")]
    UnknownElementType(i32),
    #[error("{0} is null")]
    NullArgument(&'static str),
    #[error("handle registry lock poisoned")]
    Poisoned,
}

impl FfiError {
    /// Status code reported across the boundary for this error.
    pub fn status(&self) -> LitStatus {
        match self {
            FfiError::Literal(LiteralError::InvalidShape(_)) => LitStatus::ErrorInvalidShape,
            FfiError::Literal(LiteralError::RankMismatch { .. }) => LitStatus::ErrorRankMismatch,
            FfiError::Literal(LiteralError::IndexOutOfRange { .. }) => {
                LitStatus::ErrorIndexOutOfRange
            }
            FfiError::Literal(LiteralError::TypeMismatch { .. }) => LitStatus::ErrorTypeMismatch,
            FfiError::UseAfterFree(_) => LitStatus::ErrorUseAfterFree,
            FfiError::InvalidHandle(_) | FfiError::WrongKind { .. } => {
                LitStatus::ErrorInvalidHandle
            }
            FfiError::UnknownElementType(_) => LitStatus::ErrorInvalidShape,
            FfiError::NullArgument(_) => LitStatus::ErrorInvalidArgument,
            FfiError::Poisoned => LitStatus::ErrorInternal,
        }
    }
}

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Store an error message for later retrieval via `lit_last_error`.
pub fn set_last_error(msg: String) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Take the last error message, leaving `None` in its place.
pub fn take_last_error() -> Option<CString> {
    LAST_ERROR.with(|e| e.borrow_mut().take())
}
