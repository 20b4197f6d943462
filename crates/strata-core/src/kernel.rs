//! Kernel descriptors.
//!
//! A kernel descriptor is what an expression turns into right before a launch:
//! a `Copy` value holding raw accessors and an inline layout, cheap to hand to
//! every worker. Descriptors never own data and never move it; the lifetime on
//! [KernelTensor] ties every descriptor to the storage it was projected from.
use std::marker::PhantomData;

use num_traits::NumOps;

use crate::{ravel, unravel_into, BinaryOp, Layout, TensorDType, UnaryOp, MAX_RANK};

/// Fixed-size copy of a [Layout].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelLayout {
    shape: [usize; MAX_RANK],
    strides: [isize; MAX_RANK],
    rank: usize,
    offset: isize,
}

impl KernelLayout {
    pub fn shape(&self) -> &[usize] {
        &self.shape[..self.rank]
    }

    pub fn strides(&self) -> &[isize] {
        &self.strides[..self.rank]
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn offset(&self) -> isize {
        self.offset
    }

    pub fn numel(&self) -> usize {
        self.shape().iter().product()
    }
}

impl From<&Layout> for KernelLayout {
    fn from(layout: &Layout) -> Self {
        let rank = layout.rank();
        assert!(rank <= MAX_RANK, "rank {} exceeds {}", rank, MAX_RANK);
        let mut shape = [0; MAX_RANK];
        let mut strides = [0; MAX_RANK];
        shape[..rank].copy_from_slice(layout.shape().as_slice());
        strides[..rank].copy_from_slice(layout.strides().as_slice());
        Self {
            shape,
            strides,
            rank,
            offset: layout.offset(),
        }
    }
}

/// Evaluated once per element by a launch.
pub trait KernelExpression: Copy + Send + Sync {
    type Elem: TensorDType;

    fn shape(&self) -> &[usize];

    fn at(&self, index: &[usize]) -> Self::Elem;
}

/// Kernels addressable by a flat position relative to their own origin.
pub trait KernelStrided: KernelExpression {
    fn layout(&self) -> &KernelLayout;

    fn data_access(&self, i: isize) -> Self::Elem;
}

/// Writable kernels.
///
/// Stores are unsynchronised: callers guarantee that no two workers write the
/// same element and that nothing reads an element while it is written.
pub trait KernelStore: KernelStrided {
    /// # Safety
    /// `i` must not be written concurrently by another worker.
    unsafe fn data_store(&self, i: isize, value: Self::Elem);

    /// # Safety
    /// See [KernelStore::data_store].
    unsafe fn store(&self, index: &[usize], value: Self::Elem) {
        let i = ravel(index, self.layout().strides());
        self.data_store(i, value)
    }
}

/// Raw accessor into dense tensor storage.
#[derive(Debug, Clone, Copy)]
pub struct KernelTensor<'a, T> {
    ptr: *mut T,
    capacity: usize,
    layout: KernelLayout,
    _storage: PhantomData<&'a T>,
}

// Descriptors are only built from live storage and borrow it for `'a`.
unsafe impl<T: Send> Send for KernelTensor<'_, T> {}
unsafe impl<T: Sync> Sync for KernelTensor<'_, T> {}

impl<'a, T: TensorDType> KernelTensor<'a, T> {
    /// # Safety
    /// `ptr` must be valid for reads and writes of `capacity` elements of `T`
    /// for the whole of `'a`.
    pub unsafe fn new(ptr: *mut T, capacity: usize, layout: KernelLayout) -> Self {
        Self {
            ptr,
            capacity,
            layout,
            _storage: PhantomData,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    fn position(&self, i: isize) -> usize {
        let position = self.layout.offset + i;
        assert!(
            position >= 0 && (position as usize) < self.capacity,
            "flat position {} outside of storage capacity {}",
            position,
            self.capacity
        );
        position as usize
    }
}

impl<T: TensorDType> KernelExpression for KernelTensor<'_, T> {
    type Elem = T;

    fn shape(&self) -> &[usize] {
        self.layout.shape()
    }

    fn at(&self, index: &[usize]) -> T {
        self.data_access(ravel(index, self.layout.strides()))
    }
}

impl<T: TensorDType> KernelStrided for KernelTensor<'_, T> {
    fn layout(&self) -> &KernelLayout {
        &self.layout
    }

    #[inline]
    fn data_access(&self, i: isize) -> T {
        let position = self.position(i);
        unsafe { self.ptr.add(position).read() }
    }
}

impl<T: TensorDType> KernelStore for KernelTensor<'_, T> {
    #[inline]
    unsafe fn data_store(&self, i: isize, value: T) {
        let position = self.position(i);
        self.ptr.add(position).write(value)
    }
}

/// Projection of a view: forwards flat accesses to `inner`, shifted by the
/// view offset.
#[derive(Debug, Clone, Copy)]
pub struct KernelView<K> {
    inner: K,
    layout: KernelLayout,
}

impl<K: KernelStrided> KernelView<K> {
    pub fn new(inner: K, layout: KernelLayout) -> Self {
        Self { inner, layout }
    }

    pub fn inner(&self) -> &K {
        &self.inner
    }
}

impl<K: KernelStrided> KernelExpression for KernelView<K> {
    type Elem = K::Elem;

    fn shape(&self) -> &[usize] {
        self.layout.shape()
    }

    fn at(&self, index: &[usize]) -> K::Elem {
        self.data_access(ravel(index, self.layout.strides()))
    }
}

impl<K: KernelStrided> KernelStrided for KernelView<K> {
    fn layout(&self) -> &KernelLayout {
        &self.layout
    }

    #[inline]
    fn data_access(&self, i: isize) -> K::Elem {
        self.inner.data_access(self.layout.offset + i)
    }
}

impl<K: KernelStore> KernelStore for KernelView<K> {
    #[inline]
    unsafe fn data_store(&self, i: isize, value: K::Elem) {
        self.inner.data_store(self.layout.offset + i, value)
    }
}

/// Gives a kernel without strides a dense flat address space.
#[derive(Debug, Clone, Copy)]
pub struct KernelAdaptor<K> {
    inner: K,
    layout: KernelLayout,
}

impl<K: KernelExpression> KernelAdaptor<K> {
    pub fn new(inner: K, layout: KernelLayout) -> Self {
        Self { inner, layout }
    }
}

impl<K: KernelExpression> KernelExpression for KernelAdaptor<K> {
    type Elem = K::Elem;

    fn shape(&self) -> &[usize] {
        self.layout.shape()
    }

    fn at(&self, index: &[usize]) -> K::Elem {
        self.inner.at(index)
    }
}

impl<K: KernelExpression> KernelStrided for KernelAdaptor<K> {
    fn layout(&self) -> &KernelLayout {
        &self.layout
    }

    fn data_access(&self, i: isize) -> K::Elem {
        let numel = self.layout.numel();
        assert!(
            i >= 0 && (i as usize) < numel,
            "flat position {} outside of {} elements",
            i,
            numel
        );
        let rank = self.layout.rank;
        let mut index = [0usize; MAX_RANK];
        unravel_into(i as usize, self.layout.strides(), &mut index[..rank]);
        self.inner.at(&index[..rank])
    }
}

#[derive(Debug, Clone, Copy)]
pub struct KernelBinary<L, R> {
    lhs: L,
    rhs: R,
    op: BinaryOp,
}

impl<L, R> KernelBinary<L, R> {
    pub fn new(lhs: L, rhs: R, op: BinaryOp) -> Self {
        Self { lhs, rhs, op }
    }
}

impl<L, R> KernelExpression for KernelBinary<L, R>
where
    L: KernelExpression,
    R: KernelExpression<Elem = L::Elem>,
    L::Elem: NumOps,
{
    type Elem = L::Elem;

    fn shape(&self) -> &[usize] {
        self.lhs.shape()
    }

    fn at(&self, index: &[usize]) -> L::Elem {
        self.op.apply(self.lhs.at(index), self.rhs.at(index))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct KernelUnary<K, T> {
    src: K,
    op: UnaryOp<T>,
}

impl<K, T> KernelUnary<K, T> {
    pub fn new(src: K, op: UnaryOp<T>) -> Self {
        Self { src, op }
    }
}

impl<K> KernelExpression for KernelUnary<K, K::Elem>
where
    K: KernelExpression,
    K::Elem: NumOps,
{
    type Elem = K::Elem;

    fn shape(&self) -> &[usize] {
        self.src.shape()
    }

    fn at(&self, index: &[usize]) -> K::Elem {
        self.op.apply(self.src.at(index))
    }
}
