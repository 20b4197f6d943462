use std::ops::RangeInclusive;

use crate::{DType, RVec, Shape};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantError {
    #[error("The step parameter in a slice cannot be zero.")]
    InvalidStep,
    #[error("Slice {start}:{stop}:{step} is empty, start/stop ordering violates the step sign.")]
    InvalidRange { start: isize, stop: isize, step: isize },
    #[error("Slice {start}:{stop} exceeds extent {extent} of axis {axis}.")]
    OutOfBounds {
        axis: usize,
        start: isize,
        stop: isize,
        extent: usize,
    },
    #[error("Index {index} is out of bounds for axis {axis} with extent {extent}.")]
    IndexOutOfBounds {
        axis: usize,
        index: isize,
        extent: usize,
    },
    #[error("Shape mismatch, cannot view {numel} elements as {target:?}.")]
    ShapeMismatch { numel: usize, target: RVec<isize> },
    #[error("Rank mismatch. {accepted:?} != {actual}.")]
    RankMismatch {
        accepted: RangeInclusive<usize>,
        actual: usize,
    },
    #[error("Only one placeholder dimension is allowed in {0:?}.")]
    MultiplePlaceholders(RVec<isize>),
    #[error("Invalid dimension {0}.")]
    InvalidDim(isize),
    #[error("Axis {axis} is out of range for rank {rank}.")]
    AxisOutOfRange { axis: usize, rank: usize },
    #[error("Duplicate dims in permutation.")]
    DuplicateDims,
    #[error("Cannot reshape a non contiguous layout {shape:?} with strides {strides:?}.")]
    NonContiguous { shape: Shape, strides: Vec<isize> },
    #[error("Incompatible shapes {lhs:?} and {rhs:?}.")]
    IncompatibleShapes { lhs: Shape, rhs: Shape },
    #[error("View reaches elements [{lowest}, {highest}] outside of capacity {capacity}.")]
    CapacityExceeded {
        lowest: isize,
        highest: isize,
        capacity: usize,
    },
    #[error("Strides or offset of axis {axis} overflow the address range.")]
    LayoutOverflow { axis: usize },
    #[error("DType mismatch, expected {expected:?}, got {actual:?}.")]
    DTypeMismatch { expected: DType, actual: DType },
}

/// # Enforcer
///
/// Enforcer enforces common invariants on shapes and layouts.
pub struct Enforcer;

impl Enforcer {
    pub fn check_axis(axis: usize, rank: usize) -> Result<(), InvariantError> {
        if axis >= rank {
            return Err(InvariantError::AxisOutOfRange { axis, rank });
        }
        Ok(())
    }

    /// A permutation must name every axis exactly once.
    pub fn check_permutation(axes: &[usize], rank: usize) -> Result<(), InvariantError> {
        if axes.len() != rank {
            return Err(InvariantError::RankMismatch {
                accepted: rank..=rank,
                actual: axes.len(),
            });
        }
        let mut seen: RVec<bool> = smallvec::smallvec![false; rank];
        for &axis in axes {
            Self::check_axis(axis, rank)?;
            if seen[axis] {
                return Err(InvariantError::DuplicateDims);
            }
            seen[axis] = true;
        }
        Ok(())
    }

    pub fn assert_rank(actual: usize, expected: usize) -> Result<(), InvariantError> {
        if actual != expected {
            return Err(InvariantError::RankMismatch {
                accepted: expected..=expected,
                actual,
            });
        }
        Ok(())
    }

    pub fn check_shapes_match(lhs: &Shape, rhs: &Shape) -> Result<(), InvariantError> {
        if lhs != rhs {
            return Err(InvariantError::IncompatibleShapes {
                lhs: lhs.clone(),
                rhs: rhs.clone(),
            });
        }
        Ok(())
    }

    pub fn assert_dtype(actual: DType, expected: DType) -> Result<(), InvariantError> {
        if actual != expected {
            return Err(InvariantError::DTypeMismatch { expected, actual });
        }
        Ok(())
    }
}
