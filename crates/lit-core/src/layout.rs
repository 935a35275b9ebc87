use crate::error::{LiteralError, Result};
use std::fmt;

/// Physical axis order of a dense buffer.
///
/// `minor_to_major[0]` is the axis whose index varies fastest in memory,
/// the last entry the one that varies slowest.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Layout {
    minor_to_major: Vec<usize>,
}

impl Layout {
    /// Row-major layout: the last axis is minor-most.
    ///
    /// For rank 3 this is `{2, 1, 0}`.
    pub fn row_major(rank: usize) -> Self {
        Layout {
            minor_to_major: (0..rank).rev().collect(),
        }
    }

    /// Column-major layout: the first axis is minor-most.
    pub fn column_major(rank: usize) -> Self {
        Layout {
            minor_to_major: (0..rank).collect(),
        }
    }

    /// Build a layout from an explicit minor-to-major order.
    ///
    /// # Errors
    /// Returns `InvalidShape` unless `minor_to_major` is a permutation of
    /// `[0, rank)`.
    pub fn from_minor_to_major(minor_to_major: &[i64], rank: usize) -> Result<Self> {
        if minor_to_major.len() != rank {
            return Err(LiteralError::InvalidShape(format!(
                "layout has {} entries but shape has rank {}",
                minor_to_major.len(),
                rank
            )));
        }
        let mut seen = vec![false; rank];
        let mut axes = Vec::with_capacity(rank);
        for &axis in minor_to_major {
            let slot = usize::try_from(axis)
                .ok()
                .filter(|&a| a < rank)
                .ok_or_else(|| {
                    LiteralError::InvalidShape(format!(
                        "layout axis {} outside [0, {})",
                        axis, rank
                    ))
                })?;
            if seen[slot] {
                return Err(LiteralError::InvalidShape(format!(
                    "layout repeats axis {}",
                    slot
                )));
            }
            seen[slot] = true;
            axes.push(slot);
        }
        Ok(Layout {
            minor_to_major: axes,
        })
    }

    /// Axes ordered from fastest- to slowest-varying.
    pub fn minor_to_major(&self) -> &[usize] {
        &self.minor_to_major
    }

    /// Number of axes this layout orders.
    pub fn rank(&self) -> usize {
        self.minor_to_major.len()
    }

    /// Per-axis element strides for the given dimension sizes.
    ///
    /// The minor-most axis has stride 1; each next-major axis has the
    /// previous stride times the previous axis's size. Returns `None` if a
    /// stride overflows `usize`.
    pub(crate) fn strides(&self, dims: &[usize]) -> Option<Vec<usize>> {
        self.fold_strides(dims, usize::checked_mul)
    }

    /// Like [`strides`](Self::strides) but clamps at `usize::MAX`. Only
    /// meaningful for shapes with no elements, where no stride is applied.
    pub(crate) fn saturating_strides(&self, dims: &[usize]) -> Vec<usize> {
        self.fold_strides(dims, |a, b| Some(a.saturating_mul(b)))
            .unwrap_or_default()
    }

    fn fold_strides(
        &self,
        dims: &[usize],
        mul: impl Fn(usize, usize) -> Option<usize>,
    ) -> Option<Vec<usize>> {
        let mut strides = vec![0usize; dims.len()];
        let mut stride = 1usize;
        for (i, &axis) in self.minor_to_major.iter().enumerate() {
            strides[axis] = stride;
            if i + 1 < self.minor_to_major.len() {
                stride = mul(stride, dims[axis])?;
            }
        }
        Some(strides)
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, axis) in self.minor_to_major.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", axis)?;
        }
        write!(f, "}}")
    }
}
