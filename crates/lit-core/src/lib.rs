//! `lit-core` - Typed multi-dimensional literals with layout-aware indexing.
//!
//! This crate provides:
//! - A `Shape` describing dimensions, element type and minor-to-major layout
//! - A `Literal` owning dense storage for one shape
//! - Bounds- and type-checked element access by multi-index
//! - The closed set of element kinds (`PrimitiveType`, `Scalar`, `NativeType`)

pub mod dtype;
pub mod error;
pub mod layout;
pub mod literal;
pub mod native;
pub mod shape;
pub mod storage;

// Re-export primary types at the crate root for convenience.
pub use dtype::PrimitiveType;
pub use error::{LiteralError, Result};
pub use layout::Layout;
pub use literal::Literal;
pub use native::{NativeType, Scalar};
pub use shape::Shape;
pub use storage::LiteralStorage;

// Re-exported so callers can name the F16 element type without a direct dependency.
pub use half::f16;
