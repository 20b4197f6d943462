use crate::{Enforcer, InvariantError, Layout, Shape, Strides};

/// Exchanges axes `a` and `b`. No data moves, the offset stays at the source origin.
pub fn swapaxes_layout(
    shape: &Shape,
    strides: &Strides,
    a: usize,
    b: usize,
) -> Result<Layout, InvariantError> {
    Enforcer::check_axis(a, shape.rank())?;
    Enforcer::check_axis(b, shape.rank())?;
    let (mut shape, mut strides) = (shape.clone(), strides.clone());
    shape.swap(a, b);
    strides.swap(a, b);
    Ok(Layout::new(shape, strides, 0))
}

/// Output axis `i` is input axis `axes[i]`.
pub fn transpose_layout(
    shape: &Shape,
    strides: &Strides,
    axes: &[usize],
) -> Result<Layout, InvariantError> {
    Enforcer::check_permutation(axes, shape.rank())?;
    let permuted_shape = axes.iter().map(|&a| shape[a]).collect();
    let permuted_strides = axes.iter().map(|&a| strides[a]).collect();
    Ok(Layout::new(permuted_shape, permuted_strides, 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_strategy::{proptest, Arbitrary};

    #[derive(Arbitrary, Debug)]
    struct SwapProblem {
        #[any(vec![1..5, 1..5, 1..5, 1..5])]
        shape: Shape,
        #[strategy(0..4usize)]
        a: usize,
        #[strategy(0..4usize)]
        b: usize,
    }

    #[proptest(cases = 64)]
    fn swapaxes_is_an_involution(prob: SwapProblem) {
        let SwapProblem { shape, a, b } = prob;
        let strides = Strides::dense(&shape);
        let once = swapaxes_layout(&shape, &strides, a, b).unwrap();
        let twice = swapaxes_layout(once.shape(), once.strides(), a, b).unwrap();
        assert_eq!(twice.shape(), &shape);
        assert_eq!(twice.strides(), &strides);
        assert_eq!(twice.offset(), 0);
    }

    #[test]
    fn identity_transpose() {
        let shape = crate::shape![2, 3, 4];
        let strides = Strides::dense(&shape);
        let layout = transpose_layout(&shape, &strides, &[0, 1, 2]).unwrap();
        assert_eq!(layout, Layout::dense(shape));
    }

    #[test]
    fn transpose_permutes_strides() {
        let shape = crate::shape![2, 3, 4];
        let strides = Strides::dense(&shape);
        let layout = transpose_layout(&shape, &strides, &[2, 0, 1]).unwrap();
        assert_eq!(layout.shape(), &crate::shape![4, 2, 3]);
        assert_eq!(layout.strides().to_vec(), vec![6, 1, 2]);
    }

    #[test]
    fn invalid_axes() {
        let shape = crate::shape![2, 3];
        let strides = Strides::dense(&shape);
        assert_eq!(
            swapaxes_layout(&shape, &strides, 0, 2),
            Err(InvariantError::AxisOutOfRange { axis: 2, rank: 2 })
        );
        assert_eq!(
            transpose_layout(&shape, &strides, &[1, 1]),
            Err(InvariantError::DuplicateDims)
        );
        assert!(matches!(
            transpose_layout(&shape, &strides, &[1]),
            Err(InvariantError::RankMismatch { .. })
        ));
    }
}
