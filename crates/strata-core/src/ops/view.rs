use std::iter;

use crate::{rvec, InvariantError, Layout, Shape, SliceDesc, Strides};

/// Applies `descs` to an input layout of `shape`/`strides`.
///
/// Input axes left over once the descriptors are exhausted are taken whole.
/// The returned offset is relative to the input's origin.
pub fn build_view(
    shape: &Shape,
    strides: &Strides,
    descs: &[SliceDesc],
) -> Result<Layout, InvariantError> {
    let rank = shape.rank();
    let consumed = descs.iter().filter(|d| d.consumes_axis()).count();
    if consumed > rank {
        return Err(InvariantError::RankMismatch {
            accepted: 0..=rank,
            actual: consumed,
        });
    }

    let mut out_shape = rvec![];
    let mut out_strides = rvec![];
    let mut offset = 0isize;
    let mut axis = 0;

    let trailing = iter::repeat(&SliceDesc::All).take(rank - consumed);
    for desc in descs.iter().chain(trailing) {
        match *desc {
            SliceDesc::All => {
                out_shape.push(shape[axis]);
                out_strides.push(strides[axis]);
                axis += 1;
            }
            SliceDesc::Value(index) => {
                let extent = shape[axis];
                let resolved = if index < 0 {
                    index + extent as isize
                } else {
                    index
                };
                if resolved < 0 || resolved >= extent as isize {
                    return Err(InvariantError::IndexOutOfBounds {
                        axis,
                        index,
                        extent,
                    });
                }
                offset = resolved
                    .checked_mul(strides[axis])
                    .and_then(|delta| offset.checked_add(delta))
                    .ok_or(InvariantError::LayoutOverflow { axis })?;
                axis += 1;
            }
            SliceDesc::NewAxis => {
                out_shape.push(1);
                out_strides.push(0);
            }
            SliceDesc::Range(slice) => {
                let resolved = slice.resolve(axis, shape[axis])?;
                let overflow = || InvariantError::LayoutOverflow { axis };
                let stride = strides[axis]
                    .checked_mul(resolved.step)
                    .ok_or_else(overflow)?;
                offset = resolved
                    .start
                    .checked_mul(strides[axis])
                    .and_then(|delta| offset.checked_add(delta))
                    .ok_or_else(overflow)?;
                out_shape.push(resolved.len);
                out_strides.push(stride);
                axis += 1;
            }
        }
    }

    let out_shape = Shape::new(out_shape);
    out_shape.check_rank()?;
    Ok(Layout::new(out_shape, Strides::new(out_strides), offset))
}
