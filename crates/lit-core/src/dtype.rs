use std::fmt;

/// Element kinds a literal can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    /// Boolean, stored as a single byte holding 0 or 1.
    Pred,
    /// 32-bit signed integer.
    S32,
    /// 32-bit unsigned integer.
    U32,
    /// 64-bit unsigned integer.
    U64,
    /// 16-bit floating point (IEEE 754 half-precision, via the `half` crate).
    F16,
    /// 32-bit floating point.
    F32,
    /// 64-bit floating point.
    F64,
}

impl PrimitiveType {
    /// All supported element kinds, in wire-id order.
    pub const ALL: [PrimitiveType; 7] = [
        PrimitiveType::Pred,
        PrimitiveType::S32,
        PrimitiveType::U32,
        PrimitiveType::U64,
        PrimitiveType::F16,
        PrimitiveType::F32,
        PrimitiveType::F64,
    ];

    /// Returns the storage width in bytes of a single element.
    ///
    /// - Pred: 1 byte
    /// - S32, U32, F32: 4 bytes
    /// - U64, F64: 8 bytes
    /// - F16: 2 bytes
    pub fn byte_width(&self) -> usize {
        match self {
            PrimitiveType::Pred => 1,
            PrimitiveType::F16 => 2,
            PrimitiveType::S32 | PrimitiveType::U32 | PrimitiveType::F32 => 4,
            PrimitiveType::U64 | PrimitiveType::F64 => 8,
        }
    }

    /// Converts a wire id (XLA primitive-type numbering) to a `PrimitiveType`.
    ///
    /// Wire ids:
    /// - 1 => Pred
    /// - 4 => S32
    /// - 8 => U32
    /// - 9 => U64
    /// - 10 => F16
    /// - 11 => F32
    /// - 12 => F64
    pub fn from_id(id: i32) -> Option<PrimitiveType> {
        match id {
            1 => Some(PrimitiveType::Pred),
            4 => Some(PrimitiveType::S32),
            8 => Some(PrimitiveType::U32),
            9 => Some(PrimitiveType::U64),
            10 => Some(PrimitiveType::F16),
            11 => Some(PrimitiveType::F32),
            12 => Some(PrimitiveType::F64),
            _ => None,
        }
    }

    /// Returns the wire id for this `PrimitiveType`.
    pub fn to_id(&self) -> i32 {
        match self {
            PrimitiveType::Pred => 1,
            PrimitiveType::S32 => 4,
            PrimitiveType::U32 => 8,
            PrimitiveType::U64 => 9,
            PrimitiveType::F16 => 10,
            PrimitiveType::F32 => 11,
            PrimitiveType::F64 => 12,
        }
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimitiveType::Pred => write!(f, "pred"),
            PrimitiveType::S32 => write!(f, "s32"),
            PrimitiveType::U32 => write!(f, "u32"),
            PrimitiveType::U64 => write!(f, "u64"),
            PrimitiveType::F16 => write!(f, "f16"),
            PrimitiveType::F32 => write!(f, "f32"),
            PrimitiveType::F64 => write!(f, "f64"),
        }
    }
}
