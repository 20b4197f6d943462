//! Batched multi-dimensional FFTs over host buffers and strata tensors.
//!
//! A plan is looked up once from its [FftKey] and then executed any number of
//! times. Transforms are unnormalised in both directions, so
//! `inverse(forward(x)) == n * x`.
#[macro_use]
mod backend;
mod config;
mod plan;

pub use config::*;
pub use plan::*;

use strata::{DType, TensorError};

#[derive(Debug, thiserror::Error)]
pub enum FftError {
    #[error("Invalid transform lengths {lengths:?}: {reason}")]
    InvalidLengths {
        lengths: Vec<usize>,
        reason: &'static str,
    },
    #[error("Buffer holds {actual} elements but the layout reaches {required}.")]
    BufferTooSmall { required: usize, actual: usize },
    #[error("DType mismatch, plan expects {expected:?}, got {actual:?}.")]
    DTypeMismatch { expected: DType, actual: DType },
    #[error("Cannot reinterpret buffer: {0:?}")]
    Layout(bytemuck::PodCastError),
    #[error(transparent)]
    Tensor(#[from] TensorError),
}
