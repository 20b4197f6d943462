use crate::{rvec, RVec, Shape};

/// Per-axis steps, in elements.
#[derive(Clone, PartialEq, Eq, Default, Hash)]
pub struct Strides(RVec<isize>);

impl Strides {
    pub fn new(strides: RVec<isize>) -> Self {
        Self(strides)
    }

    /// Dense strides for `shape`: the first axis varies fastest.
    pub fn dense(shape: &Shape) -> Self {
        let mut strides = rvec![];
        let mut stride = 1;
        for size in shape.iter() {
            strides.push(stride);
            stride *= *size as isize;
        }
        Self(strides)
    }

    pub fn to_vec(&self) -> Vec<isize> {
        self.0.to_vec()
    }

    pub fn rank(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &isize> {
        self.0.iter()
    }

    pub fn push(&mut self, stride: isize) {
        self.0.push(stride);
    }

    pub fn swap(&mut self, a: usize, b: usize) {
        self.0.swap(a, b);
    }

    pub fn as_slice(&self) -> &[isize] {
        &self.0
    }

    pub fn is_dense_for(&self, shape: &Shape) -> bool {
        *self == Strides::dense(shape)
    }

    /// Flat position of `index` relative to the origin.
    pub fn ravel(&self, index: &[usize]) -> isize {
        ravel(index, &self.0)
    }
}

/// `Σ index[d] * strides[d]`.
#[inline]
pub fn ravel(index: &[usize], strides: &[isize]) -> isize {
    index
        .iter()
        .zip(strides.iter())
        .map(|(&i, &s)| i as isize * s)
        .sum()
}

/// Recovers the multi-index of `flat` from dense `strides`.
///
/// Works from the highest axis down, so it is the inverse of [ravel] for every
/// `flat` in `[0, numel)`.
pub fn unravel(flat: usize, strides: &[isize]) -> RVec<usize> {
    let mut index = rvec![0; strides.len()];
    unravel_into(flat, strides, &mut index);
    index
}

/// Allocation free [unravel], for use inside kernels.
#[inline]
pub fn unravel_into(mut flat: usize, strides: &[isize], index: &mut [usize]) {
    for d in (0..strides.len()).rev() {
        let stride = strides[d] as usize;
        if stride == 0 {
            index[d] = 0;
            continue;
        }
        index[d] = flat / stride;
        flat %= stride;
    }
}

impl std::fmt::Debug for Strides {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut shape = format!("[{}", self.0.first().unwrap_or(&0));
        for dim in self.0.iter().skip(1) {
            shape.push_str(&format!("x{}", dim));
        }
        write!(f, "{}]", shape)
    }
}

impl std::ops::Index<usize> for Strides {
    type Output = isize;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl std::ops::IndexMut<usize> for Strides {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.0[index]
    }
}

impl From<&Shape> for Strides {
    fn from(shape: &Shape) -> Self {
        Strides::dense(shape)
    }
}

impl From<Vec<isize>> for Strides {
    fn from(strides: Vec<isize>) -> Self {
        Self(strides.into())
    }
}

impl<const N: usize> From<[isize; N]> for Strides {
    fn from(strides: [isize; N]) -> Self {
        Self(strides.iter().copied().collect())
    }
}

impl FromIterator<isize> for Strides {
    fn from_iter<I: IntoIterator<Item = isize>>(iter: I) -> Self {
        Strides(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape;
    use test_strategy::proptest;

    #[test]
    fn test_strides() {
        let shape = shape![2, 3, 4];
        let strides = Strides::from(&shape);
        assert_eq!(strides.to_vec(), vec![1, 2, 6]);
    }

    #[test]
    fn zero_extent_strides() {
        let strides = Strides::dense(&shape![3, 0, 2]);
        assert_eq!(strides.to_vec(), vec![1, 3, 0]);
    }

    #[test]
    fn unravel_first_axis_fastest() {
        let strides = Strides::dense(&shape![3, 2]);
        assert_eq!(unravel(0, strides.as_slice()).to_vec(), vec![0, 0]);
        assert_eq!(unravel(1, strides.as_slice()).to_vec(), vec![1, 0]);
        assert_eq!(unravel(4, strides.as_slice()).to_vec(), vec![1, 1]);
    }

    #[proptest(cases = 64)]
    fn unravel_inverts_ravel(
        #[strategy(proptest::collection::vec(1usize..6, 0..5))] dims: Vec<usize>,
    ) {
        let shape = Shape::from(dims);
        let strides = Strides::dense(&shape);
        for flat in 0..shape.numel() {
            let index = unravel(flat, strides.as_slice());
            proptest::prop_assert_eq!(strides.ravel(&index), flat as isize);
            for (i, extent) in index.iter().zip(shape.iter()) {
                proptest::prop_assert!(i < extent);
            }
        }
    }
}
