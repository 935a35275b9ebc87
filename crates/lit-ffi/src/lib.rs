mod error;
mod registry;
mod types;

pub use error::*;
pub use registry::*;
pub use types::*;

use std::ffi::CString;
use std::os::raw::{c_char, c_int};
use std::panic::AssertUnwindSafe;

use lit_core::{f16, Literal, NativeType, PrimitiveType, Shape};
use log::warn;

/// Execute a closure that returns a `LitStatus`, catching any panics
/// and converting them into `LitStatus::ErrorInternal`.
fn catch_panic<F: FnOnce() -> LitStatus + std::panic::UnwindSafe>(f: F) -> LitStatus {
    match std::panic::catch_unwind(f) {
        Ok(status) => status,
        Err(_) => {
            set_last_error("internal panic".to_string());
            LitStatus::ErrorInternal
        }
    }
}

/// Convert a boundary result into a status, recording the failure message.
fn report(result: Result<(), FfiError>) -> LitStatus {
    match result {
        Ok(()) => LitStatus::Ok,
        Err(e) => {
            warn!("literal boundary call failed: {}", e);
            let status = e.status();
            set_last_error(e.to_string());
            status
        }
    }
}

/// Write `value` through an out-pointer supplied by the caller.
unsafe fn write_out<T>(out: *mut T, name: &'static str, value: T) -> Result<(), FfiError> {
    if out.is_null() {
        return Err(FfiError::NullArgument(name));
    }
    *out = value;
    Ok(())
}

/// Copy `len` entries from a caller-supplied array, treating null as empty
/// only when `len` is zero.
unsafe fn read_array<T: Copy>(
    ptr: *const T,
    len: usize,
    name: &'static str,
) -> Result<Vec<T>, FfiError> {
    if len == 0 {
        return Ok(Vec::new());
    }
    if ptr.is_null() {
        return Err(FfiError::NullArgument(name));
    }
    Ok(std::slice::from_raw_parts(ptr, len).to_vec())
}

/// Read the multi-index for `literal`: exactly `rank` C ints.
unsafe fn read_indices(indices: *const c_int, rank: usize) -> Result<Vec<i64>, FfiError> {
    let raw = read_array(indices, rank, "indices")?;
    Ok(raw.into_iter().map(i64::from).collect())
}

/// Shared body of every `lit_literal_get_*` entry point.
unsafe fn get_element<T: NativeType, C>(
    literal: LitHandle,
    indices: *const c_int,
    out: *mut C,
    convert: fn(T) -> C,
) -> LitStatus {
    catch_panic(AssertUnwindSafe(|| {
        report(with_registry(|reg| {
            let lit = reg.literal(literal)?;
            let index = unsafe { read_indices(indices, lit.shape().rank()) }?;
            let value = lit.get::<T>(&index)?;
            unsafe { write_out(out, "out", convert(value)) }
        }))
    }))
}

/// Shared body of every `lit_literal_set_*` entry point.
unsafe fn set_element<T: NativeType, C>(
    literal: LitHandle,
    indices: *const c_int,
    value: C,
    convert: fn(C) -> T,
) -> LitStatus {
    catch_panic(AssertUnwindSafe(|| {
        report(with_registry(|reg| {
            let lit = reg.literal_mut(literal)?;
            let index = unsafe { read_indices(indices, lit.shape().rank()) }?;
            lit.set::<T>(&index, convert(value))?;
            Ok(())
        }))
    }))
}

/// Create a shape.
///
/// `dims` holds `rank` dimension sizes. `element_type` is a wire id
/// (1 pred, 4 s32, 8 u32, 9 u64, 10 f16, 11 f32, 12 f64). `minor_to_major`
/// is either null (row-major) or `rank` axis numbers. On success writes a
/// handle into `*shape_out`; release it with `lit_shape_delete`.
#[no_mangle]
pub unsafe extern "C" fn lit_shape_new(
    dims: *const i64,
    rank: usize,
    element_type: i32,
    minor_to_major: *const i64,
    shape_out: *mut LitHandle,
) -> LitStatus {
    catch_panic(AssertUnwindSafe(|| {
        report((|| -> Result<(), FfiError> {
            if shape_out.is_null() {
                return Err(FfiError::NullArgument("shape_out"));
            }
            let ty = PrimitiveType::from_id(element_type)
                .ok_or(FfiError::UnknownElementType(element_type))?;
            let dims = unsafe { read_array(dims, rank, "dims") }?;
            let shape = if minor_to_major.is_null() {
                Shape::new(&dims, ty)?
            } else {
                let layout = unsafe { read_array(minor_to_major, rank, "minor_to_major") }?;
                Shape::with_layout(&dims, ty, &layout)?
            };
            let handle = with_registry(|reg| Ok(reg.insert(Entry::Shape(shape))))?;
            unsafe { write_out(shape_out, "shape_out", handle) }
        })())
    }))
}

/// Release a shape. Literals already built from it are unaffected.
///
/// Passing the null handle (0) is a no-op and returns `LitStatus::Ok`.
#[no_mangle]
pub extern "C" fn lit_shape_delete(shape: LitHandle) -> LitStatus {
    if shape == 0 {
        return LitStatus::Ok;
    }
    catch_panic(|| report(with_registry(|reg| reg.release_shape(shape).map(drop))))
}

/// Create a zero-initialized literal for the shape named by `shape`.
///
/// The literal keeps its own copy of the shape. On success writes a handle
/// into `*literal_out`; release it with `lit_literal_delete`.
#[no_mangle]
pub unsafe extern "C" fn lit_literal_new(shape: LitHandle, literal_out: *mut LitHandle) -> LitStatus {
    catch_panic(AssertUnwindSafe(|| {
        report(with_registry(|reg| {
            if literal_out.is_null() {
                return Err(FfiError::NullArgument("literal_out"));
            }
            let literal = Literal::create(reg.shape(shape)?.clone(), true);
            let handle = reg.insert(Entry::Literal(literal));
            unsafe { write_out(literal_out, "literal_out", handle) }
        }))
    }))
}

/// Destroy a literal and free its storage. The handle must not be used
/// again; doing so reports `LitStatus::ErrorUseAfterFree`.
///
/// Passing the null handle (0) is a no-op and returns `LitStatus::Ok`.
#[no_mangle]
pub extern "C" fn lit_literal_delete(literal: LitHandle) -> LitStatus {
    if literal == 0 {
        return LitStatus::Ok;
    }
    catch_panic(|| {
        report(with_registry(|reg| {
            reg.release_literal(literal).map(Literal::destroy)
        }))
    })
}

/// Write the literal's rank into `*rank_out`, i.e. the number of indices
/// every get/set call on it reads.
#[no_mangle]
pub unsafe extern "C" fn lit_literal_rank(literal: LitHandle, rank_out: *mut usize) -> LitStatus {
    catch_panic(AssertUnwindSafe(|| {
        report(with_registry(|reg| {
            let rank = reg.literal(literal)?.shape().rank();
            unsafe { write_out(rank_out, "rank_out", rank) }
        }))
    }))
}

// Per-kind accessors. `indices` must point to exactly `rank` ints.

/// Read a pred element as 0 or 1.
#[no_mangle]
pub unsafe extern "C" fn lit_literal_get_bool(
    literal: LitHandle,
    indices: *const c_int,
    out: *mut c_int,
) -> LitStatus {
    get_element::<bool, c_int>(literal, indices, out, c_int::from)
}

#[no_mangle]
pub unsafe extern "C" fn lit_literal_get_int32_t(
    literal: LitHandle,
    indices: *const c_int,
    out: *mut i32,
) -> LitStatus {
    get_element::<i32, i32>(literal, indices, out, |v| v)
}

#[no_mangle]
pub unsafe extern "C" fn lit_literal_get_uint32_t(
    literal: LitHandle,
    indices: *const c_int,
    out: *mut u32,
) -> LitStatus {
    get_element::<u32, u32>(literal, indices, out, |v| v)
}

#[no_mangle]
pub unsafe extern "C" fn lit_literal_get_uint64_t(
    literal: LitHandle,
    indices: *const c_int,
    out: *mut u64,
) -> LitStatus {
    get_element::<u64, u64>(literal, indices, out, |v| v)
}

/// Read an f16 element widened to float.
#[no_mangle]
pub unsafe extern "C" fn lit_literal_get_half(
    literal: LitHandle,
    indices: *const c_int,
    out: *mut f32,
) -> LitStatus {
    get_element::<f16, f32>(literal, indices, out, f16::to_f32)
}

#[no_mangle]
pub unsafe extern "C" fn lit_literal_get_float(
    literal: LitHandle,
    indices: *const c_int,
    out: *mut f32,
) -> LitStatus {
    get_element::<f32, f32>(literal, indices, out, |v| v)
}

#[no_mangle]
pub unsafe extern "C" fn lit_literal_get_double(
    literal: LitHandle,
    indices: *const c_int,
    out: *mut f64,
) -> LitStatus {
    get_element::<f64, f64>(literal, indices, out, |v| v)
}

/// Write a pred element; any non-zero `value` is stored as true.
#[no_mangle]
pub unsafe extern "C" fn lit_literal_set_bool(
    literal: LitHandle,
    indices: *const c_int,
    value: c_int,
) -> LitStatus {
    set_element::<bool, c_int>(literal, indices, value, |v| v != 0)
}

#[no_mangle]
pub unsafe extern "C" fn lit_literal_set_int32_t(
    literal: LitHandle,
    indices: *const c_int,
    value: i32,
) -> LitStatus {
    set_element::<i32, i32>(literal, indices, value, |v| v)
}

#[no_mangle]
pub unsafe extern "C" fn lit_literal_set_uint32_t(
    literal: LitHandle,
    indices: *const c_int,
    value: u32,
) -> LitStatus {
    set_element::<u32, u32>(literal, indices, value, |v| v)
}

#[no_mangle]
pub unsafe extern "C" fn lit_literal_set_uint64_t(
    literal: LitHandle,
    indices: *const c_int,
    value: u64,
) -> LitStatus {
    set_element::<u64, u64>(literal, indices, value, |v| v)
}

/// Write an f16 element, rounding `value` to the nearest half.
#[no_mangle]
pub unsafe extern "C" fn lit_literal_set_half(
    literal: LitHandle,
    indices: *const c_int,
    value: f32,
) -> LitStatus {
    set_element::<f16, f32>(literal, indices, value, f16::from_f32)
}

#[no_mangle]
pub unsafe extern "C" fn lit_literal_set_float(
    literal: LitHandle,
    indices: *const c_int,
    value: f32,
) -> LitStatus {
    set_element::<f32, f32>(literal, indices, value, |v| v)
}

#[no_mangle]
pub unsafe extern "C" fn lit_literal_set_double(
    literal: LitHandle,
    indices: *const c_int,
    value: f64,
) -> LitStatus {
    set_element::<f64, f64>(literal, indices, value, |v| v)
}

/// Retrieve the last error message.
///
/// Returns a pointer to a C string describing the most recent error on the
/// calling thread, or null if no error has occurred. The caller must free
/// the returned string with `lit_free_string`.
#[no_mangle]
pub extern "C" fn lit_last_error() -> *const c_char {
    match error::take_last_error() {
        Some(e) => e.into_raw(),
        None => std::ptr::null(),
    }
}

/// Free a string previously returned by `lit_last_error`.
#[no_mangle]
pub unsafe extern "C" fn lit_free_string(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CStr;

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn new_shape(dims: &[i64], ty: PrimitiveType) -> LitHandle {
        let mut handle = 0;
        let status = unsafe {
            lit_shape_new(
                dims.as_ptr(),
                dims.len(),
                ty.to_id(),
                std::ptr::null(),
                &mut handle,
            )
        };
        assert_eq!(status, LitStatus::Ok);
        handle
    }

    fn new_literal(shape: LitHandle) -> LitHandle {
        let mut handle = 0;
        assert_eq!(unsafe { lit_literal_new(shape, &mut handle) }, LitStatus::Ok);
        handle
    }

    fn last_error() -> String {
        let ptr = lit_last_error();
        assert!(!ptr.is_null());
        let msg = unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned();
        unsafe { lit_free_string(ptr as *mut c_char) };
        msg
    }

    #[test]
    fn test_double_round_trip() {
        init_logging();
        let shape = new_shape(&[2, 3], PrimitiveType::F64);
        let lit = new_literal(shape);
        let idx: [c_int; 2] = [1, 2];
        let mut out = -1.0;
        unsafe {
            assert_eq!(lit_literal_get_double(lit, idx.as_ptr(), &mut out), LitStatus::Ok);
            assert_eq!(out, 0.0);
            assert_eq!(lit_literal_set_double(lit, idx.as_ptr(), 2.5), LitStatus::Ok);
            assert_eq!(lit_literal_get_double(lit, idx.as_ptr(), &mut out), LitStatus::Ok);
        }
        assert_eq!(out, 2.5);
        assert_eq!(lit_literal_delete(lit), LitStatus::Ok);
        assert_eq!(lit_shape_delete(shape), LitStatus::Ok);
    }

    #[test]
    fn test_bool_marshals_as_int() {
        let shape = new_shape(&[3], PrimitiveType::Pred);
        let lit = new_literal(shape);
        let idx: [c_int; 1] = [2];
        let mut out = -1;
        unsafe {
            assert_eq!(lit_literal_set_bool(lit, idx.as_ptr(), 7), LitStatus::Ok);
            assert_eq!(lit_literal_get_bool(lit, idx.as_ptr(), &mut out), LitStatus::Ok);
        }
        assert_eq!(out, 1);
        assert_eq!(lit_literal_delete(lit), LitStatus::Ok);
        assert_eq!(lit_shape_delete(shape), LitStatus::Ok);
    }

    #[test]
    fn test_integer_kinds() {
        let idx: [c_int; 2] = [0, 1];
        unsafe {
            let lit = new_literal(new_shape(&[1, 2], PrimitiveType::S32));
            let mut s = 0i32;
            assert_eq!(lit_literal_set_int32_t(lit, idx.as_ptr(), -9), LitStatus::Ok);
            assert_eq!(lit_literal_get_int32_t(lit, idx.as_ptr(), &mut s), LitStatus::Ok);
            assert_eq!(s, -9);

            let lit = new_literal(new_shape(&[1, 2], PrimitiveType::U32));
            let mut u = 0u32;
            assert_eq!(lit_literal_set_uint32_t(lit, idx.as_ptr(), u32::MAX), LitStatus::Ok);
            assert_eq!(lit_literal_get_uint32_t(lit, idx.as_ptr(), &mut u), LitStatus::Ok);
            assert_eq!(u, u32::MAX);

            let lit = new_literal(new_shape(&[1, 2], PrimitiveType::U64));
            let mut w = 0u64;
            assert_eq!(lit_literal_set_uint64_t(lit, idx.as_ptr(), u64::MAX), LitStatus::Ok);
            assert_eq!(lit_literal_get_uint64_t(lit, idx.as_ptr(), &mut w), LitStatus::Ok);
            assert_eq!(w, u64::MAX);
        }
    }

    #[test]
    fn test_float_kinds() {
        let idx: [c_int; 1] = [0];
        unsafe {
            let lit = new_literal(new_shape(&[1], PrimitiveType::F32));
            let mut f = 0.0f32;
            assert_eq!(lit_literal_set_float(lit, idx.as_ptr(), -1.5), LitStatus::Ok);
            assert_eq!(lit_literal_get_float(lit, idx.as_ptr(), &mut f), LitStatus::Ok);
            assert_eq!(f, -1.5);

            let lit = new_literal(new_shape(&[1], PrimitiveType::F16));
            let mut h = 0.0f32;
            assert_eq!(lit_literal_set_half(lit, idx.as_ptr(), 0.25), LitStatus::Ok);
            assert_eq!(lit_literal_get_half(lit, idx.as_ptr(), &mut h), LitStatus::Ok);
            assert_eq!(h, 0.25);
        }
    }

    #[test]
    fn test_rank_query() {
        let lit = new_literal(new_shape(&[2, 3, 4], PrimitiveType::U32));
        let mut rank = 0usize;
        assert_eq!(unsafe { lit_literal_rank(lit, &mut rank) }, LitStatus::Ok);
        assert_eq!(rank, 3);
    }

    #[test]
    fn test_scalar_literal_accepts_null_indices() {
        let lit = new_literal(new_shape(&[], PrimitiveType::S32));
        let mut out = 1;
        unsafe {
            assert_eq!(lit_literal_set_int32_t(lit, std::ptr::null(), 4), LitStatus::Ok);
            assert_eq!(
                lit_literal_get_int32_t(lit, std::ptr::null(), &mut out),
                LitStatus::Ok
            );
        }
        assert_eq!(out, 4);
    }

    #[test]
    fn test_type_mismatch_status() {
        let lit = new_literal(new_shape(&[2, 3], PrimitiveType::F64));
        let idx: [c_int; 2] = [0, 0];
        let mut out = 0i32;
        let status = unsafe { lit_literal_get_int32_t(lit, idx.as_ptr(), &mut out) };
        assert_eq!(status, LitStatus::ErrorTypeMismatch);
        assert!(last_error().contains("type mismatch"));
    }

    #[test]
    fn test_index_out_of_range_status() {
        let lit = new_literal(new_shape(&[2, 3], PrimitiveType::S32));
        let mut out = 0i32;
        for idx in [[2 as c_int, 0], [0, 3], [-1, 0]] {
            let status = unsafe { lit_literal_get_int32_t(lit, idx.as_ptr(), &mut out) };
            assert_eq!(status, LitStatus::ErrorIndexOutOfRange);
        }
        let status = unsafe { lit_literal_set_int32_t(lit, [0, -1].as_ptr(), 1) };
        assert_eq!(status, LitStatus::ErrorIndexOutOfRange);
    }

    #[test]
    fn test_use_after_free() {
        let lit = new_literal(new_shape(&[2], PrimitiveType::U64));
        assert_eq!(lit_literal_delete(lit), LitStatus::Ok);
        let idx: [c_int; 1] = [0];
        let mut out = 0u64;
        let status = unsafe { lit_literal_get_uint64_t(lit, idx.as_ptr(), &mut out) };
        assert_eq!(status, LitStatus::ErrorUseAfterFree);
        assert_eq!(
            unsafe { lit_literal_set_uint64_t(lit, idx.as_ptr(), 1) },
            LitStatus::ErrorUseAfterFree
        );
        assert_eq!(lit_literal_delete(lit), LitStatus::ErrorUseAfterFree);
        assert!(last_error().contains("already released"));
    }

    #[test]
    fn test_handle_kind_is_checked() {
        let shape = new_shape(&[2], PrimitiveType::U64);
        let lit = new_literal(shape);
        let idx: [c_int; 1] = [0];
        let mut out = 0u64;
        let status = unsafe { lit_literal_get_uint64_t(shape, idx.as_ptr(), &mut out) };
        assert_eq!(status, LitStatus::ErrorInvalidHandle);
        assert_eq!(lit_shape_delete(lit), LitStatus::ErrorInvalidHandle);
        let mut other = 0;
        assert_eq!(
            unsafe { lit_literal_new(lit, &mut other) },
            LitStatus::ErrorInvalidHandle
        );
        assert_eq!(
            unsafe { lit_literal_new(u64::MAX, &mut other) },
            LitStatus::ErrorInvalidHandle
        );
    }

    #[test]
    fn test_literal_outlives_shape_handle() {
        let shape = new_shape(&[2], PrimitiveType::S32);
        let lit = new_literal(shape);
        assert_eq!(lit_shape_delete(shape), LitStatus::Ok);
        let idx: [c_int; 1] = [1];
        let mut out = -1;
        unsafe {
            assert_eq!(lit_literal_set_int32_t(lit, idx.as_ptr(), 3), LitStatus::Ok);
            assert_eq!(lit_literal_get_int32_t(lit, idx.as_ptr(), &mut out), LitStatus::Ok);
        }
        assert_eq!(out, 3);
        let mut other = 0;
        assert_eq!(
            unsafe { lit_literal_new(shape, &mut other) },
            LitStatus::ErrorUseAfterFree
        );
    }

    #[test]
    fn test_invalid_shapes() {
        let mut handle = 0;
        let dims = [2i64, -3];
        let status = unsafe {
            lit_shape_new(dims.as_ptr(), 2, PrimitiveType::S32.to_id(), std::ptr::null(), &mut handle)
        };
        assert_eq!(status, LitStatus::ErrorInvalidShape);

        let dims = [2i64, 3];
        let status = unsafe { lit_shape_new(dims.as_ptr(), 2, 99, std::ptr::null(), &mut handle) };
        assert_eq!(status, LitStatus::ErrorInvalidShape);

        let layout = [0i64, 0];
        let status = unsafe {
            lit_shape_new(dims.as_ptr(), 2, PrimitiveType::S32.to_id(), layout.as_ptr(), &mut handle)
        };
        assert_eq!(status, LitStatus::ErrorInvalidShape);
    }

    #[test]
    fn test_column_major_shape() {
        let mut shape = 0;
        let dims = [2i64, 3];
        let layout = [0i64, 1];
        let status = unsafe {
            lit_shape_new(dims.as_ptr(), 2, PrimitiveType::S32.to_id(), layout.as_ptr(), &mut shape)
        };
        assert_eq!(status, LitStatus::Ok);
        let lit = new_literal(shape);
        let idx: [c_int; 2] = [1, 2];
        let mut out = 0;
        unsafe {
            assert_eq!(lit_literal_set_int32_t(lit, idx.as_ptr(), 12), LitStatus::Ok);
            assert_eq!(lit_literal_get_int32_t(lit, idx.as_ptr(), &mut out), LitStatus::Ok);
        }
        assert_eq!(out, 12);
    }

    #[test]
    fn test_null_arguments() {
        let lit = new_literal(new_shape(&[2], PrimitiveType::S32));
        let idx: [c_int; 1] = [0];
        unsafe {
            assert_eq!(
                lit_literal_get_int32_t(lit, std::ptr::null(), &mut 0),
                LitStatus::ErrorInvalidArgument
            );
            assert_eq!(
                lit_literal_get_int32_t(lit, idx.as_ptr(), std::ptr::null_mut()),
                LitStatus::ErrorInvalidArgument
            );
            assert_eq!(
                lit_literal_new(new_shape(&[1], PrimitiveType::S32), std::ptr::null_mut()),
                LitStatus::ErrorInvalidArgument
            );
        }
        assert_eq!(lit_literal_delete(0), LitStatus::Ok);
        assert_eq!(lit_shape_delete(0), LitStatus::Ok);
    }

    #[test]
    fn test_last_error_empty_after_take() {
        let _ = error::take_last_error();
        assert!(lit_last_error().is_null());
    }
}
