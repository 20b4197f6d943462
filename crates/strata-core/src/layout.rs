use crate::{InvariantError, RVec, Shape, Strides};

/// Shape, strides and offset of a view, relative to the expression it wraps.
#[derive(Debug, Clone, PartialEq, Eq, derive_new::new)]
pub struct Layout {
    shape: Shape,
    strides: Strides,
    offset: isize,
}

impl Layout {
    /// Dense layout at offset zero.
    pub fn dense(shape: Shape) -> Self {
        let strides = Strides::dense(&shape);
        Self::new(shape, strides, 0)
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn strides(&self) -> &Strides {
        &self.strides
    }

    pub fn offset(&self) -> isize {
        self.offset
    }

    pub fn rank(&self) -> usize {
        self.shape.rank()
    }

    pub fn numel(&self) -> usize {
        self.shape.numel()
    }

    pub fn is_dense(&self) -> bool {
        self.offset == 0 && self.strides.is_dense_for(&self.shape)
    }

    /// Lowest and highest flat positions touched, relative to `origin`.
    ///
    /// `None` when the layout has no elements.
    pub fn reach(&self) -> Option<(isize, isize)> {
        if self.numel() == 0 {
            return None;
        }
        let (lo, hi) = self
            .shape
            .iter()
            .zip(self.strides.iter())
            .fold((0isize, 0isize), |(lo, hi), (&extent, &stride)| {
                let span = (extent as isize - 1).saturating_mul(stride);
                (lo.saturating_add(span.min(0)), hi.saturating_add(span.max(0)))
            });
        Some((lo, hi))
    }

    /// Every element reachable from `origin` must lie inside `[0, capacity)`.
    pub fn check_capacity(&self, origin: isize, capacity: usize) -> Result<(), InvariantError> {
        let Some((lo, hi)) = self.reach() else {
            return Ok(());
        };
        let (lowest, highest) = (origin.saturating_add(lo), origin.saturating_add(hi));
        if lowest < 0 || highest >= capacity as isize {
            return Err(InvariantError::CapacityExceeded {
                lowest,
                highest,
                capacity,
            });
        }
        Ok(())
    }

    /// Whether distinct indices always address distinct elements.
    pub fn is_injective(&self) -> bool {
        is_injective(&self.shape, &self.strides)
    }
}

/// Conservative injectivity test for a strided layout.
///
/// Axes of extent 1 never collide. The rest, sorted by stride magnitude, must
/// each step past everything the smaller axes can reach.
pub fn is_injective(shape: &Shape, strides: &Strides) -> bool {
    if shape.numel() == 0 {
        return true;
    }
    let mut axes: RVec<(usize, usize)> = shape
        .iter()
        .zip(strides.iter())
        .filter(|(extent, _)| **extent > 1)
        .map(|(&extent, &stride)| (extent, stride.unsigned_abs()))
        .collect();
    axes.sort_by_key(|&(_, stride)| stride);

    let mut reach = 0usize;
    for (extent, stride) in axes {
        if stride == 0 || stride <= reach {
            return false;
        }
        reach += (extent - 1) * stride;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape;

    #[test]
    fn reach_of_reversed_axis() {
        let layout = Layout::new(shape![5], Strides::from([-1]), 4);
        assert_eq!(layout.reach(), Some((-4, 0)));
        assert!(layout.check_capacity(4, 5).is_ok());
        assert!(matches!(
            layout.check_capacity(3, 5),
            Err(InvariantError::CapacityExceeded { lowest: -1, .. })
        ));
    }

    #[test]
    fn capacity_ignores_empty_layouts() {
        let layout = Layout::new(shape![3, 0], Strides::from([1, 3]), 100);
        assert_eq!(layout.reach(), None);
        assert!(layout.check_capacity(100, 1).is_ok());
    }

    #[test]
    fn injectivity() {
        assert!(Layout::dense(shape![3, 4]).is_injective());
        // transposed
        assert!(is_injective(&shape![4, 3], &Strides::from([3, 1])));
        // broadcast axis
        assert!(!is_injective(&shape![3, 2], &Strides::from([1, 0])));
        // overlapping windows
        assert!(!is_injective(&shape![3, 3], &Strides::from([1, 2])));
        // new axes have extent 1 and stride 0
        assert!(is_injective(&shape![1, 3], &Strides::from([0, 1])));
    }

    #[test]
    fn dense_layout() {
        let layout = Layout::dense(shape![2, 3]);
        assert!(layout.is_dense());
        assert_eq!(layout.strides().to_vec(), vec![1, 2]);
        let shifted = Layout::new(shape![2, 3], Strides::from([1, 2]), 1);
        assert!(!shifted.is_dense());
    }
}
