use crate::dtype::PrimitiveType;
use crate::error::{LiteralError, Result};
use crate::native::{NativeType, Scalar};
use crate::shape::Shape;
use crate::storage::LiteralStorage;
use log::{debug, trace};
use std::fmt;

/// A dense, typed, multi-dimensional value with owned storage.
///
/// The storage is always exactly `shape.byte_size()` bytes, laid out
/// according to `shape.layout()`. Elements are read and written one at a
/// time by multi-index; every access checks the element kind against the
/// shape and the index against its dimensions before touching storage.
#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    shape: Shape,
    storage: LiteralStorage,
}

impl Literal {
    /// Create a zero-filled literal for `shape`.
    pub fn new(shape: Shape) -> Self {
        Self::create(shape, true)
    }

    /// Create a literal for `shape`.
    ///
    /// When `zero_init` is false the element values are unspecified and
    /// must be written before they are read. The buffer is still zero-filled
    /// here, so reading early yields zeros rather than garbage.
    pub fn create(shape: Shape, zero_init: bool) -> Self {
        let storage = LiteralStorage::zeroed(shape.byte_size());
        debug!(
            "created literal {} ({} bytes, zero_init={})",
            shape,
            storage.len(),
            zero_init
        );
        Literal { shape, storage }
    }

    /// Rank-0 literal holding `value`.
    pub fn scalar<T: NativeType>(value: T) -> Self {
        let mut literal = Self::new(Shape::scalar(T::TYPE));
        let scalar: Scalar = value.into();
        scalar.encode(literal.storage.element_mut(0, T::TYPE.byte_width()));
        literal
    }

    /// Returns a reference to the literal's shape.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Element kind of every value in the literal.
    pub fn element_type(&self) -> PrimitiveType {
        self.shape.element_type()
    }

    /// Number of elements, 1 for a rank-0 literal.
    pub fn element_count(&self) -> usize {
        self.shape.element_count()
    }

    /// Size of the backing storage in bytes.
    pub fn size_bytes(&self) -> usize {
        self.storage.len()
    }

    /// Read the element at `multi_index` as `T`.
    ///
    /// # Errors
    /// `TypeMismatch` if `T` is not the literal's element type, otherwise
    /// `RankMismatch` / `IndexOutOfRange` from offset computation.
    pub fn get<T: NativeType>(&self, multi_index: &[i64]) -> Result<T> {
        self.check_type(T::TYPE)?;
        let scalar = self.get_scalar(multi_index)?;
        T::from_scalar(scalar).ok_or(LiteralError::TypeMismatch {
            expected: scalar.element_type(),
            got: T::TYPE,
        })
    }

    /// Write `value` to the element at `multi_index`.
    ///
    /// Same failure modes as [`Literal::get`]; on failure storage is untouched.
    pub fn set<T: NativeType>(&mut self, multi_index: &[i64], value: T) -> Result<()> {
        self.set_scalar(multi_index, value.into())
    }

    /// Read the element at `multi_index` in whatever kind the literal holds.
    pub fn get_scalar(&self, multi_index: &[i64]) -> Result<Scalar> {
        let offset = self.shape.flat_offset(multi_index)?;
        let ty = self.element_type();
        let value = Scalar::decode(ty, self.storage.element(offset, ty.byte_width()));
        trace!("get {:?} @ {} -> {}", multi_index, offset, value);
        Ok(value)
    }

    /// Write `value` to the element at `multi_index`.
    ///
    /// # Errors
    /// `TypeMismatch` if `value` is not of the literal's element type,
    /// otherwise `RankMismatch` / `IndexOutOfRange`.
    pub fn set_scalar(&mut self, multi_index: &[i64], value: Scalar) -> Result<()> {
        let ty = value.element_type();
        self.check_type(ty)?;
        let offset = self.shape.flat_offset(multi_index)?;
        trace!("set {:?} @ {} <- {}", multi_index, offset, value);
        value.encode(self.storage.element_mut(offset, ty.byte_width()));
        Ok(())
    }

    /// Release the literal and its storage.
    pub fn destroy(self) {
        debug!(
            "destroyed literal {} ({} bytes)",
            self.shape,
            self.storage.len()
        );
    }

    fn check_type(&self, requested: PrimitiveType) -> Result<()> {
        let held = self.element_type();
        if held != requested {
            return Err(LiteralError::TypeMismatch {
                expected: held,
                got: requested,
            });
        }
        Ok(())
    }

    fn fmt_elements(
        &self,
        f: &mut fmt::Formatter<'_>,
        index: &mut Vec<i64>,
        axis: usize,
    ) -> fmt::Result {
        if axis == self.shape.rank() {
            let value = self.get_scalar(index).map_err(|_| fmt::Error)?;
            return write!(f, "{}", value);
        }
        write!(f, "{{")?;
        for i in 0..self.shape.dimensions()[axis] {
            if i > 0 {
                write!(f, ", ")?;
            }
            index[axis] = i as i64;
            self.fmt_elements(f, index, axis + 1)?;
        }
        write!(f, "}}")
    }
}

/// Renders as `s32[2,3]{1,0} {{1, 2, 3}, {4, 5, 6}}`.
///
/// Elements are always listed in logical row-major order, whatever the
/// physical layout.
impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ", self.shape)?;
        if self.element_count() == 0 {
            return write!(f, "{{}}");
        }
        let mut index = vec![0i64; self.shape.rank()];
        self.fmt_elements(f, &mut index, 0)
    }
}
