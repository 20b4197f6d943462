use crate::{
    build_view, reshape_layout, swapaxes_layout, transpose_layout, Adaptor, Assignable, Binary,
    Device, Enforcer, Expression, InvariantError, KernelLayout, KernelView, Layout, Shape,
    SliceDesc, StorageId, Strided, Strides, Tensor, TensorDType, TensorError, Unary,
};

/// A strided window onto another expression.
///
/// Views never copy: every access is forwarded to `input`, shifted by the
/// view offset and scaled by the view strides.
#[derive(Debug, Clone)]
pub struct View<E> {
    input: E,
    layout: Layout,
    origin: isize,
}

impl<E: Strided> View<E> {
    /// Applies `descs` to `input`. Either a complete view or an error is returned.
    pub fn build(input: E, descs: &[SliceDesc]) -> Result<Self, InvariantError> {
        let layout = build_view(input.shape(), input.strides(), descs)?;
        Self::from_layout(input, layout)
    }

    /// Wraps `input` with an already resolved layout, checking that every
    /// element it reaches exists.
    pub fn from_layout(input: E, layout: Layout) -> Result<Self, InvariantError> {
        let origin = input.origin().saturating_add(layout.offset());
        #[cfg(not(feature = "unchecked-views"))]
        layout.check_capacity(origin, input.capacity())?;
        log::debug!(
            "view {:?} -> {:?} strides {:?} offset {}",
            input.shape(),
            layout.shape(),
            layout.strides(),
            layout.offset()
        );
        Ok(Self {
            input,
            layout,
            origin,
        })
    }

    pub fn input(&self) -> &E {
        &self.input
    }

    pub fn into_input(self) -> E {
        self.input
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }
}

impl<E: Assignable> View<E> {
    /// Writes `src` into the viewed elements.
    pub fn assign<S>(&self, src: &S) -> Result<(), TensorError>
    where
        S: Expression<Elem = E::Elem>,
    {
        crate::assign(self, src)
    }

    pub fn fill(&self, value: E::Elem) -> Result<(), TensorError> {
        crate::fill(self, value)
    }
}

impl<E: Strided> Expression for View<E> {
    type Elem = E::Elem;
    type Kernel<'a> = KernelView<E::StridedKernel<'a>> where Self: 'a;

    fn shape(&self) -> &Shape {
        self.layout.shape()
    }

    fn device(&self) -> &Device {
        self.input.device()
    }

    fn to_kernel(&self) -> Self::Kernel<'_> {
        KernelView::new(
            self.input.to_strided_kernel(),
            KernelLayout::from(&self.layout),
        )
    }

    fn aliases(&self, id: StorageId) -> bool {
        self.input.aliases(id)
    }
}

impl<E: Strided> Strided for View<E> {
    type StridedKernel<'a> = KernelView<E::StridedKernel<'a>> where Self: 'a;

    fn to_strided_kernel(&self) -> Self::StridedKernel<'_> {
        self.to_kernel()
    }

    fn strides(&self) -> &Strides {
        self.layout.strides()
    }

    fn offset(&self) -> isize {
        self.layout.offset()
    }

    fn origin(&self) -> isize {
        self.origin
    }

    fn capacity(&self) -> usize {
        self.input.capacity()
    }
}

impl<E: Assignable> Assignable for View<E> {
    type KernelMut<'a> = KernelView<E::KernelMut<'a>> where Self: 'a;

    fn to_kernel_mut(&self) -> Self::KernelMut<'_> {
        KernelView::new(self.input.to_kernel_mut(), KernelLayout::from(&self.layout))
    }

    fn storage_id(&self) -> StorageId {
        self.input.storage_id()
    }
}

/// Entry point for indexing, reshaping and permuting.
///
/// Expressions that already carry strides are viewed directly. Those that do
/// not are first wrapped in a dense [Adaptor].
pub trait Viewable: Expression + Sized {
    type Source: Strided<Elem = Self::Elem>;

    fn into_source(self) -> Self::Source;

    fn view(self, descs: &[SliceDesc]) -> Result<View<Self::Source>, InvariantError> {
        View::build(self.into_source(), descs)
    }

    /// Like [Viewable::view], but the caller states the rank it expects back.
    fn view_ranked(
        self,
        descs: &[SliceDesc],
        rank: usize,
    ) -> Result<View<Self::Source>, InvariantError> {
        let view = self.view(descs)?;
        Enforcer::assert_rank(view.rank(), rank)?;
        Ok(view)
    }

    /// `dims` may hold one [crate::PLACEHOLDER], inferred from the element count.
    fn reshape(self, dims: &[isize]) -> Result<View<Self::Source>, InvariantError> {
        let source = self.into_source();
        let layout = reshape_layout(source.shape(), source.strides(), dims)?;
        View::from_layout(source, layout)
    }

    fn swapaxes(self, a: usize, b: usize) -> Result<View<Self::Source>, InvariantError> {
        let source = self.into_source();
        let layout = swapaxes_layout(source.shape(), source.strides(), a, b)?;
        View::from_layout(source, layout)
    }

    fn transpose(self, axes: &[usize]) -> Result<View<Self::Source>, InvariantError> {
        let source = self.into_source();
        let layout = transpose_layout(source.shape(), source.strides(), axes)?;
        View::from_layout(source, layout)
    }
}

macro_rules! strided_viewable {
    ($($t:ty => [$($g:tt)*]),* $(,)?) => {
        $(
            impl<$($g)*> Viewable for $t {
                type Source = Self;

                fn into_source(self) -> Self {
                    self
                }
            }
        )*
    };
}

strided_viewable!(
    Tensor<T> => [T: TensorDType],
    &'a Tensor<T> => ['a, T: TensorDType],
    View<E> => [E: Strided],
    &'a View<E> => ['a, E: Strided],
    Adaptor<E> => [E: Expression],
);

impl<L, R> Viewable for Binary<L, R>
where
    Binary<L, R>: Expression,
{
    type Source = Adaptor<Self>;

    fn into_source(self) -> Adaptor<Self> {
        Adaptor::new(self)
    }
}

impl<E, T> Viewable for Unary<E, T>
where
    Unary<E, T>: Expression,
{
    type Source = Adaptor<Self>;

    fn into_source(self) -> Adaptor<Self> {
        Adaptor::new(self)
    }
}
