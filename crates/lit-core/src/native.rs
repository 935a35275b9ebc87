use crate::dtype::PrimitiveType;
use half::f16;
use std::fmt;

/// A single element of any supported kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    Pred(bool),
    S32(i32),
    U32(u32),
    U64(u64),
    F16(f16),
    F32(f32),
    F64(f64),
}

impl Scalar {
    pub fn element_type(&self) -> PrimitiveType {
        match self {
            Scalar::Pred(_) => PrimitiveType::Pred,
            Scalar::S32(_) => PrimitiveType::S32,
            Scalar::U32(_) => PrimitiveType::U32,
            Scalar::U64(_) => PrimitiveType::U64,
            Scalar::F16(_) => PrimitiveType::F16,
            Scalar::F32(_) => PrimitiveType::F32,
            Scalar::F64(_) => PrimitiveType::F64,
        }
    }

    /// The zero value of the given kind.
    pub fn zero(ty: PrimitiveType) -> Scalar {
        match ty {
            PrimitiveType::Pred => Scalar::Pred(false),
            PrimitiveType::S32 => Scalar::S32(0),
            PrimitiveType::U32 => Scalar::U32(0),
            PrimitiveType::U64 => Scalar::U64(0),
            PrimitiveType::F16 => Scalar::F16(f16::ZERO),
            PrimitiveType::F32 => Scalar::F32(0.0),
            PrimitiveType::F64 => Scalar::F64(0.0),
        }
    }

    /// Decode one element of kind `ty` from exactly `ty.byte_width()` bytes.
    ///
    /// Bytes are read in native order. A Pred byte is true when non-zero.
    pub(crate) fn decode(ty: PrimitiveType, bytes: &[u8]) -> Scalar {
        let mut buf = [0u8; 8];
        buf[..bytes.len()].copy_from_slice(bytes);
        match ty {
            PrimitiveType::Pred => Scalar::Pred(buf[0] != 0),
            PrimitiveType::S32 => Scalar::S32(i32::from_ne_bytes([buf[0], buf[1], buf[2], buf[3]])),
            PrimitiveType::U32 => Scalar::U32(u32::from_ne_bytes([buf[0], buf[1], buf[2], buf[3]])),
            PrimitiveType::U64 => Scalar::U64(u64::from_ne_bytes(buf)),
            PrimitiveType::F16 => Scalar::F16(f16::from_ne_bytes([buf[0], buf[1]])),
            PrimitiveType::F32 => Scalar::F32(f32::from_ne_bytes([buf[0], buf[1], buf[2], buf[3]])),
            PrimitiveType::F64 => Scalar::F64(f64::from_ne_bytes(buf)),
        }
    }

    /// Encode into `out`, which must be exactly `element_type().byte_width()`
    /// bytes long.
    pub(crate) fn encode(&self, out: &mut [u8]) {
        match *self {
            Scalar::Pred(v) => out[0] = u8::from(v),
            Scalar::S32(v) => out.copy_from_slice(&v.to_ne_bytes()),
            Scalar::U32(v) => out.copy_from_slice(&v.to_ne_bytes()),
            Scalar::U64(v) => out.copy_from_slice(&v.to_ne_bytes()),
            Scalar::F16(v) => out.copy_from_slice(&v.to_ne_bytes()),
            Scalar::F32(v) => out.copy_from_slice(&v.to_ne_bytes()),
            Scalar::F64(v) => out.copy_from_slice(&v.to_ne_bytes()),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Pred(v) => write!(f, "{}", v),
            Scalar::S32(v) => write!(f, "{}", v),
            Scalar::U32(v) => write!(f, "{}", v),
            Scalar::U64(v) => write!(f, "{}", v),
            Scalar::F16(v) => write!(f, "{}", v),
            Scalar::F32(v) => write!(f, "{}", v),
            Scalar::F64(v) => write!(f, "{}", v),
        }
    }
}

/// Rust types that can be stored in a literal element.
///
/// Sealed: the set of kinds is closed and mirrors `PrimitiveType`.
pub trait NativeType: Copy + Into<Scalar> + sealed::Sealed {
    const TYPE: PrimitiveType;

    /// Extracts the value if `scalar` is of this kind.
    fn from_scalar(scalar: Scalar) -> Option<Self>;
}

mod sealed {
    pub trait Sealed {}
}

macro_rules! native_type {
    ($ty:ty, $variant:ident) => {
        impl sealed::Sealed for $ty {}

        impl From<$ty> for Scalar {
            fn from(v: $ty) -> Self {
                Scalar::$variant(v)
            }
        }

        impl NativeType for $ty {
            const TYPE: PrimitiveType = PrimitiveType::$variant;

            fn from_scalar(scalar: Scalar) -> Option<Self> {
                match scalar {
                    Scalar::$variant(v) => Some(v),
                    _ => None,
                }
            }
        }
    };
}

native_type!(bool, Pred);
native_type!(i32, S32);
native_type!(u32, U32);
native_type!(u64, U64);
native_type!(f16, F16);
native_type!(f32, F32);
native_type!(f64, F64);
