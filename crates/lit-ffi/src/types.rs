/// Opaque handle naming a shape or literal owned by the boundary.
///
/// A handle packs a registry slot and that slot's generation, so a released
/// handle is never issued again even when its slot is; 0 is the null handle.
pub type LitHandle = u64;

/// Status codes returned by all FFI functions.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LitStatus {
    Ok = 0,
    ErrorInvalidArgument = 1,
    ErrorInvalidShape = 2,
    ErrorRankMismatch = 3,
    ErrorIndexOutOfRange = 4,
    ErrorTypeMismatch = 5,
    ErrorUseAfterFree = 6,
    ErrorInvalidHandle = 7,
    ErrorInternal = 8,
}
