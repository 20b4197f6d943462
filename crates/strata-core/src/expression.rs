use crate::{
    assign, Device, KernelAdaptor, KernelExpression, KernelLayout, KernelStore, KernelStrided,
    Layout, Shape, StorageId, Strides, Tensor, TensorDType, TensorError,
};

/// Anything that can be evaluated element by element.
///
/// Expressions are lazy: nothing is computed until a launch evaluates the
/// kernel produced by [Expression::to_kernel].
pub trait Expression {
    type Elem: TensorDType;
    type Kernel<'a>: KernelExpression<Elem = Self::Elem>
    where
        Self: 'a;

    fn shape(&self) -> &Shape;

    fn device(&self) -> &Device;

    /// Projects the expression into a kernel descriptor valid for one launch.
    fn to_kernel(&self) -> Self::Kernel<'_>;

    /// Whether evaluating the expression reads from the storage `id`.
    fn aliases(&self, id: StorageId) -> bool;

    fn rank(&self) -> usize {
        self.shape().rank()
    }

    fn numel(&self) -> usize {
        self.shape().numel()
    }

    /// Evaluates into a fresh dense tensor on the same device.
    fn materialize(&self) -> Result<Tensor<Self::Elem>, TensorError>
    where
        Self: Sized,
    {
        let out = Tensor::zeros(self.shape().clone(), self.device().clone())?;
        assign(&out, self)?;
        Ok(out)
    }

    /// Evaluates on the host, in dense (first axis fastest) order.
    fn to_vec(&self) -> Result<Vec<Self::Elem>, TensorError>
    where
        Self: Sized,
    {
        if !self.device().is_cpu() {
            return self.materialize()?.to(&Device::CPU)?.to_vec();
        }
        let kernel = self.to_kernel();
        let mut out = Vec::with_capacity(self.numel());
        crate::launch_host(self.shape(), |index| out.push(kernel.at(index)));
        Ok(out)
    }
}

/// Expressions that carry their own strides and can be addressed by a flat
/// position.
pub trait Strided: Expression {
    type StridedKernel<'a>: KernelStrided<Elem = Self::Elem>
    where
        Self: 'a;

    fn to_strided_kernel(&self) -> Self::StridedKernel<'_>;

    fn strides(&self) -> &Strides;

    /// Origin relative to the wrapped expression.
    fn offset(&self) -> isize;

    /// Origin relative to the underlying storage.
    fn origin(&self) -> isize;

    /// Number of elements addressable from the underlying storage.
    fn capacity(&self) -> usize;
}

/// Strided expressions that can be written to.
pub trait Assignable: Strided {
    type KernelMut<'a>: KernelStore<Elem = Self::Elem>
    where
        Self: 'a;

    fn to_kernel_mut(&self) -> Self::KernelMut<'_>;

    fn storage_id(&self) -> StorageId;
}

impl<E: Expression> Expression for &E {
    type Elem = E::Elem;
    type Kernel<'a> = E::Kernel<'a> where Self: 'a;

    fn shape(&self) -> &Shape {
        (**self).shape()
    }

    fn device(&self) -> &Device {
        (**self).device()
    }

    fn to_kernel(&self) -> Self::Kernel<'_> {
        (**self).to_kernel()
    }

    fn aliases(&self, id: StorageId) -> bool {
        (**self).aliases(id)
    }
}

impl<E: Strided> Strided for &E {
    type StridedKernel<'a> = E::StridedKernel<'a> where Self: 'a;

    fn to_strided_kernel(&self) -> Self::StridedKernel<'_> {
        (**self).to_strided_kernel()
    }

    fn strides(&self) -> &Strides {
        (**self).strides()
    }

    fn offset(&self) -> isize {
        (**self).offset()
    }

    fn origin(&self) -> isize {
        (**self).origin()
    }

    fn capacity(&self) -> usize {
        (**self).capacity()
    }
}

impl<E: Assignable> Assignable for &E {
    type KernelMut<'a> = E::KernelMut<'a> where Self: 'a;

    fn to_kernel_mut(&self) -> Self::KernelMut<'_> {
        (**self).to_kernel_mut()
    }

    fn storage_id(&self) -> StorageId {
        (**self).storage_id()
    }
}

/// Dense strided wrapper around an expression that has no strides of its own.
///
/// Flat position `i` is unravelled against the dense strides of the wrapped
/// shape and evaluated there.
#[derive(Debug, Clone)]
pub struct Adaptor<E> {
    inner: E,
    layout: Layout,
}

impl<E: Expression> Adaptor<E> {
    pub fn new(inner: E) -> Self {
        let layout = Layout::dense(inner.shape().clone());
        Self { inner, layout }
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }
}

impl<E: Expression> Expression for Adaptor<E> {
    type Elem = E::Elem;
    type Kernel<'a> = KernelAdaptor<E::Kernel<'a>> where Self: 'a;

    fn shape(&self) -> &Shape {
        self.layout.shape()
    }

    fn device(&self) -> &Device {
        self.inner.device()
    }

    fn to_kernel(&self) -> Self::Kernel<'_> {
        KernelAdaptor::new(self.inner.to_kernel(), KernelLayout::from(&self.layout))
    }

    fn aliases(&self, id: StorageId) -> bool {
        self.inner.aliases(id)
    }
}

impl<E: Expression> Strided for Adaptor<E> {
    type StridedKernel<'a> = KernelAdaptor<E::Kernel<'a>> where Self: 'a;

    fn to_strided_kernel(&self) -> Self::StridedKernel<'_> {
        self.to_kernel()
    }

    fn strides(&self) -> &Strides {
        self.layout.strides()
    }

    fn offset(&self) -> isize {
        0
    }

    fn origin(&self) -> isize {
        0
    }

    fn capacity(&self) -> usize {
        self.layout.numel()
    }
}
