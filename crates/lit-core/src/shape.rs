use crate::dtype::PrimitiveType;
use crate::error::{LiteralError, Result};
use crate::layout::Layout;
use std::fmt;

/// Geometry of a literal: dimension sizes, element type and layout.
///
/// Validated once at construction and immutable afterwards. Strides are
/// derived from the layout and cached so that indexing is a single pass
/// over the multi-index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shape {
    dims: Vec<usize>,
    element_type: PrimitiveType,
    layout: Layout,
    strides: Vec<usize>,
}

impl Shape {
    /// Create a shape with the default row-major layout.
    ///
    /// # Errors
    /// Returns `InvalidShape` if a dimension is negative or the total byte
    /// size does not fit in `usize`.
    pub fn new(dims: &[i64], element_type: PrimitiveType) -> Result<Self> {
        let dims = checked_dims(dims)?;
        let layout = Layout::row_major(dims.len());
        Self::assemble(dims, element_type, layout)
    }

    /// Create a shape with an explicit minor-to-major layout.
    ///
    /// # Errors
    /// Returns `InvalidShape` for a negative dimension, an oversized shape,
    /// or a layout that is not a permutation of `[0, rank)`.
    pub fn with_layout(
        dims: &[i64],
        element_type: PrimitiveType,
        minor_to_major: &[i64],
    ) -> Result<Self> {
        let dims = checked_dims(dims)?;
        let layout = Layout::from_minor_to_major(minor_to_major, dims.len())?;
        Self::assemble(dims, element_type, layout)
    }

    /// Rank-0 shape holding a single element.
    pub fn scalar(element_type: PrimitiveType) -> Self {
        Shape {
            dims: vec![],
            element_type,
            layout: Layout::row_major(0),
            strides: vec![],
        }
    }

    fn assemble(dims: Vec<usize>, element_type: PrimitiveType, layout: Layout) -> Result<Self> {
        let too_large = || {
            LiteralError::InvalidShape(format!(
                "{}{:?} exceeds addressable memory",
                element_type, dims
            ))
        };
        // An empty shape has no addressable element, so large sibling
        // dimensions cannot overflow anything.
        let strides = if dims.contains(&0) {
            layout.saturating_strides(&dims)
        } else {
            dims.iter()
                .try_fold(element_type.byte_width(), |acc, &d| acc.checked_mul(d))
                .ok_or_else(too_large)?;
            layout.strides(&dims).ok_or_else(too_large)?
        };
        Ok(Shape {
            dims,
            element_type,
            layout,
            strides,
        })
    }

    /// Number of dimensions (rank).
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Returns the size of dimension `axis`.
    ///
    /// # Errors
    /// Returns `IndexOutOfRange` if `axis >= rank()`.
    pub fn dimension(&self, axis: usize) -> Result<usize> {
        self.dims
            .get(axis)
            .copied()
            .ok_or(LiteralError::IndexOutOfRange {
                axis,
                index: i64::try_from(axis).unwrap_or(i64::MAX),
                bound: self.rank(),
            })
    }

    /// Returns a reference to the underlying dimension sizes.
    pub fn dimensions(&self) -> &[usize] {
        &self.dims
    }

    pub fn element_type(&self) -> PrimitiveType {
        self.element_type
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Per-axis element strides implied by the layout.
    ///
    /// For dims [d0, d1, d2] in row-major order the strides are [d1*d2, d2, 1].
    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    /// Total number of elements (product of all dimension sizes, 1 for rank 0).
    pub fn element_count(&self) -> usize {
        if self.dims.contains(&0) {
            return 0;
        }
        self.dims.iter().product()
    }

    /// Size in bytes of a dense buffer holding this shape.
    pub fn byte_size(&self) -> usize {
        self.element_count() * self.element_type.byte_width()
    }

    /// Linear element offset of `multi_index` within a buffer laid out
    /// according to this shape.
    ///
    /// # Errors
    /// Returns `RankMismatch` if the index has the wrong length and
    /// `IndexOutOfRange` if any entry is negative or not below its dimension.
    pub fn flat_offset(&self, multi_index: &[i64]) -> Result<usize> {
        if multi_index.len() != self.rank() {
            return Err(LiteralError::RankMismatch {
                expected: self.rank(),
                got: multi_index.len(),
            });
        }
        // Validate every axis before accumulating: strides of an empty shape
        // may be saturated and must never be multiplied.
        let indices = multi_index
            .iter()
            .zip(&self.dims)
            .enumerate()
            .map(|(axis, (&index, &bound))| {
                usize::try_from(index)
                    .ok()
                    .filter(|&i| i < bound)
                    .ok_or(LiteralError::IndexOutOfRange { axis, index, bound })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(indices
            .iter()
            .zip(&self.strides)
            .map(|(i, stride)| i * stride)
            .sum())
    }
}

fn checked_dims(dims: &[i64]) -> Result<Vec<usize>> {
    dims.iter()
        .enumerate()
        .map(|(axis, &d)| {
            usize::try_from(d).map_err(|_| {
                LiteralError::InvalidShape(format!("dimension {} has invalid size {}", axis, d))
            })
        })
        .collect()
}

/// Renders as `f64[2,3]{1,0}`: element type, dimensions, minor-to-major.
impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[", self.element_type)?;
        for (i, d) in self.dims.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", d)?;
        }
        write!(f, "]{}", self.layout)
    }
}
