use crate::{InvariantError, Layout, RVec, Shape, Strides};

/// Marks the one dimension of a reshape target that is inferred.
pub const PLACEHOLDER: isize = -1;

/// Resolves `dims` into a concrete shape holding exactly `numel` elements.
pub fn resolve_shape(numel: usize, dims: &[isize]) -> Result<Shape, InvariantError> {
    let mismatch = || InvariantError::ShapeMismatch {
        numel,
        target: dims.iter().copied().collect::<RVec<_>>(),
    };

    let mut placeholder = None;
    let mut known = 1usize;
    for (axis, &dim) in dims.iter().enumerate() {
        match dim {
            PLACEHOLDER if placeholder.is_some() => {
                return Err(InvariantError::MultiplePlaceholders(dims.into()));
            }
            PLACEHOLDER => placeholder = Some(axis),
            d if d < 0 => return Err(InvariantError::InvalidDim(d)),
            d => known = known.checked_mul(d as usize).ok_or_else(mismatch)?,
        }
    }

    let mut shape: Shape = dims.iter().map(|&d| d.max(0) as usize).collect();
    match placeholder {
        Some(axis) => {
            if known == 0 || numel % known != 0 {
                return Err(mismatch());
            }
            shape[axis] = numel / known;
        }
        None if known != numel => return Err(mismatch()),
        None => {}
    }
    shape.check_rank()?;
    Ok(shape)
}

/// Dense layout of the reshaped source. Strides are never carried over, so
/// the source must itself be dense.
pub fn reshape_layout(
    shape: &Shape,
    strides: &Strides,
    dims: &[isize],
) -> Result<Layout, InvariantError> {
    if !strides.is_dense_for(shape) {
        return Err(InvariantError::NonContiguous {
            shape: shape.clone(),
            strides: strides.to_vec(),
        });
    }
    let target = resolve_shape(shape.numel(), dims)?;
    log::debug!("reshape {:?} -> {:?}", shape, target);
    Ok(Layout::dense(target))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{rvec, shape};

    #[test]
    fn placeholder_is_inferred() {
        assert_eq!(resolve_shape(12, &[2, -1]).unwrap(), shape![2, 6]);
        assert_eq!(resolve_shape(12, &[-1]).unwrap(), shape![12]);
        assert_eq!(resolve_shape(12, &[3, -1, 2]).unwrap(), shape![3, 2, 2]);
    }

    #[test]
    fn placeholder_must_divide() {
        assert_eq!(
            resolve_shape(12, &[5, -1]),
            Err(InvariantError::ShapeMismatch {
                numel: 12,
                target: rvec![5, -1],
            })
        );
        assert!(matches!(
            resolve_shape(12, &[0, -1]),
            Err(InvariantError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn explicit_dims_must_match() {
        assert!(resolve_shape(12, &[4, 3]).is_ok());
        assert!(matches!(
            resolve_shape(12, &[4, 4]),
            Err(InvariantError::ShapeMismatch { .. })
        ));
        assert_eq!(resolve_shape(0, &[3, 0]).unwrap(), shape![3, 0]);
    }

    #[test]
    fn overflowing_targets_mismatch() {
        assert!(matches!(
            resolve_shape(12, &[isize::MAX, isize::MAX]),
            Err(InvariantError::ShapeMismatch { numel: 12, .. })
        ));
        assert!(matches!(
            resolve_shape(12, &[isize::MAX, 4, -1]),
            Err(InvariantError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn malformed_targets() {
        assert!(matches!(
            resolve_shape(12, &[-1, -1]),
            Err(InvariantError::MultiplePlaceholders(_))
        ));
        assert_eq!(resolve_shape(12, &[-2, -6]), Err(InvariantError::InvalidDim(-2)));
    }

    #[test]
    fn strided_sources_are_rejected() {
        let shape = shape![3, 2];
        let transposed = Strides::from([2, 1]);
        assert!(matches!(
            reshape_layout(&shape, &transposed, &[6]),
            Err(InvariantError::NonContiguous { .. })
        ));

        let layout = reshape_layout(&shape, &Strides::dense(&shape), &[2, 3]).unwrap();
        assert_eq!(layout, Layout::dense(shape![2, 3]));
    }
}
