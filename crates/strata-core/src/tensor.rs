use std::{marker::PhantomData, sync::Arc};

use derive_new::new;

use crate::{
    ComplexDType, DType, Device, DeviceError, DeviceStorage, Expression, InvariantError,
    KernelLayout, KernelTensor, Layout, Shape, Storage, StorageId, Strided, Strides, TensorDType,
    TensorId,
};
use crate::{Assignable, RVec};

#[cfg(feature = "rand")]
use {rand::prelude::*, rand_distr::StandardNormal};

#[derive(thiserror::Error, Debug)]
pub enum TensorError {
    #[error(transparent)]
    InvariantError(#[from] InvariantError),
    #[error(transparent)]
    DeviceError(#[from] DeviceError),
    #[error("Data of length {len} cannot fill shape {shape:?}")]
    DataLength { len: usize, shape: Shape },
    #[error("Failed to transfer data to host")]
    TransferError,
    #[error("Cannot reinterpret storage: {0:?}")]
    Cast(bytemuck::PodCastError),
}

/// Tensors are just a view into their underlying byte storage.
#[derive(new, Debug, Clone)]
pub struct StorageView {
    shape: Shape,
    dt: DType,
    strides: Strides,
}

impl StorageView {
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn dt(&self) -> DType {
        self.dt
    }

    pub fn strides(&self) -> &Strides {
        &self.strides
    }
}

#[derive(Debug)]
pub struct Inner {
    id: TensorId,
    device: Device,
    view: StorageView,
    storage: Arc<Storage>,
}

/// A dense, owning multi-dimensional array.
///
/// Cloning a tensor is cheap and the clone aliases the same storage. Use
/// [Tensor::deep_clone] for an independent copy.
pub struct Tensor<T> {
    inner: Arc<Inner>,
    _dtype: PhantomData<T>,
}

impl<T> Clone for Tensor<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            _dtype: PhantomData,
        }
    }
}

impl<T: TensorDType> std::fmt::Debug for Tensor<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tensor")
            .field("id", &self.id())
            .field("shape", self.shape())
            .field("device", self.device())
            .field("storage", &self.storage().dump(self.dt(), false))
            .finish()
    }
}

impl<T> PartialEq for Tensor<T> {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl<T: TensorDType> Tensor<T> {
    fn new(shape: Shape, storage: Arc<Storage>, device: Device) -> Self {
        let strides = Strides::dense(&shape);
        let view = StorageView::new(shape, T::dt(), strides);
        Self {
            inner: Arc::new(Inner {
                id: TensorId::new(),
                device,
                view,
                storage,
            }),
            _dtype: PhantomData,
        }
    }

    /// Creates a new tensor from a chunk of data laid out first axis fastest.
    ///
    /// If a non-CPU device is specified, the data will be copied to the device.
    pub fn from_data<U: AsRef<[T]>>(
        data: U,
        shape: Shape,
        device: Device,
    ) -> Result<Self, TensorError> {
        let data = data.as_ref();
        shape.check_rank()?;
        if data.len() != shape.numel() {
            return Err(TensorError::DataLength {
                len: data.len(),
                shape,
            });
        }
        let storage = Storage::from_slice(data, &device)?;
        Ok(Self::new(shape, Arc::new(storage), device))
    }

    pub fn zeros(shape: Shape, device: Device) -> Result<Self, TensorError> {
        shape.check_rank()?;
        let n_bytes = shape.numel() * std::mem::size_of::<T>();
        let storage = Storage::zeros(n_bytes, T::dt().align_of(), &device)?;
        Ok(Self::new(shape, Arc::new(storage), device))
    }

    pub fn full(shape: Shape, value: T, device: Device) -> Result<Self, TensorError> {
        let tensor = Self::zeros(shape, device)?;
        tensor.fill(value)?;
        Ok(tensor)
    }

    #[cfg(feature = "rand")]
    pub fn randn(shape: Shape, device: Device) -> Result<Self, TensorError>
    where
        T: num_traits::Float,
    {
        let mut rng = rand::thread_rng();
        let data = (0..shape.numel())
            .map(|_| {
                let sample: f32 = StandardNormal.sample(&mut rng);
                <T as num_traits::NumCast>::from(sample).unwrap_or_else(T::zero)
            })
            .collect::<Vec<_>>();
        Self::from_data(data, shape, device)
    }

    pub fn id(&self) -> TensorId {
        self.inner.id
    }

    pub fn storage_view(&self) -> &StorageView {
        &self.inner.view
    }

    pub fn rank(&self) -> usize {
        self.inner.view.shape.rank()
    }

    pub fn dt(&self) -> DType {
        self.inner.view.dt
    }

    pub fn shape(&self) -> &Shape {
        &self.inner.view.shape
    }

    pub fn strides(&self) -> &Strides {
        &self.inner.view.strides
    }

    pub fn num_bytes(&self) -> usize {
        self.shape().numel() * self.dt().size_of()
    }

    pub fn device(&self) -> &Device {
        &self.inner.device
    }

    pub fn storage(&self) -> &Storage {
        &self.inner.storage
    }

    pub fn storage_id(&self) -> StorageId {
        self.inner.storage.id()
    }

    /// A new tensor over the same storage, reinterpreted as `U` with `shape`.
    fn reinterpret<U: TensorDType>(&self, shape: Shape) -> Tensor<U> {
        Tensor::<U>::new(shape, self.inner.storage.clone(), self.device().clone())
    }

    /// Transfers the tensor to the specified device.
    ///
    /// If the tensor is already on the specified device, it will be returned as-is,
    /// and the underlying storage will not be copied.
    pub fn to(&self, device: &Device) -> Result<Self, TensorError> {
        if self.device() == device {
            return Ok(self.clone());
        }
        let storage = match (self.storage(), device) {
            (Storage::CPU(c), Device::CPU) => Storage::CPU(c.to_cpu(device)?),
            (Storage::Accelerator(a), Device::CPU) => Storage::CPU(a.to_cpu(device)?),
            (Storage::CPU(c), Device::Accelerator(_)) => Storage::Accelerator(c.to_device(device)?),
            (Storage::Accelerator(a), Device::Accelerator(_)) => {
                Storage::Accelerator(a.to_device(device)?)
            }
        };
        log::debug!("{:?}: {:?} -> {:?}", self.id(), self.device(), device);
        Ok(Self::new(
            self.shape().clone(),
            Arc::new(storage),
            device.clone(),
        ))
    }

    pub fn deep_clone(&self) -> Result<Self, TensorError> {
        let storage = self.storage().deep_clone()?;
        Ok(Self::new(
            self.shape().clone(),
            Arc::new(storage),
            self.device().clone(),
        ))
    }

    pub fn assign<S: Expression<Elem = T>>(&self, src: &S) -> Result<(), TensorError> {
        crate::assign(self, src)
    }

    pub fn fill(&self, value: T) -> Result<(), TensorError> {
        crate::fill(self, value)
    }

    /// Reinterprets pairs along a leading axis of extent 2 as complex numbers.
    ///
    /// The result shares storage with `self`.
    pub fn view_as_complex<C: ComplexDType<Real = T>>(&self) -> Result<Tensor<C>, TensorError> {
        if self.shape().get(0) != Some(&2) {
            return Err(InvariantError::ShapeMismatch {
                numel: self.shape().numel(),
                target: std::iter::once(2)
                    .chain(self.shape().iter().skip(1).map(|&d| d as isize))
                    .collect::<RVec<_>>(),
            }
            .into());
        }
        let n_bytes = self.num_bytes();
        bytemuck::try_cast_slice::<u8, C>(&self.storage().as_bytes()[..n_bytes])
            .map_err(TensorError::Cast)?;
        let shape = self.shape().slice(1..self.rank());
        Ok(self.reinterpret(shape))
    }
}

impl<C: ComplexDType> Tensor<C> {
    /// Reinterprets complex elements as (re, im) pairs along a new leading
    /// axis of extent 2.
    ///
    /// The result shares storage with `self`.
    pub fn view_as_real(&self) -> Result<Tensor<C::Real>, TensorError> {
        let mut shape = self.shape().clone();
        shape.insert(0, 2);
        shape.check_rank()?;
        let n_bytes = self.num_bytes();
        bytemuck::try_cast_slice::<u8, C::Real>(&self.storage().as_bytes()[..n_bytes])
            .map_err(TensorError::Cast)?;
        Ok(self.reinterpret(shape))
    }
}

impl<T: TensorDType> Expression for Tensor<T> {
    type Elem = T;
    type Kernel<'a> = KernelTensor<'a, T> where Self: 'a;

    fn shape(&self) -> &Shape {
        Tensor::shape(self)
    }

    fn device(&self) -> &Device {
        Tensor::device(self)
    }

    fn to_kernel(&self) -> KernelTensor<'_, T> {
        let layout = Layout::new(self.shape().clone(), self.strides().clone(), 0);
        let ptr = self.storage().as_ptr() as *mut T;
        // Storage is allocated for exactly `numel` elements of `T`, aligned
        // for `T`, and lives as long as `self`.
        unsafe { KernelTensor::new(ptr, self.shape().numel(), KernelLayout::from(&layout)) }
    }

    fn aliases(&self, id: StorageId) -> bool {
        self.storage_id() == id
    }
}

impl<T: TensorDType> Strided for Tensor<T> {
    type StridedKernel<'a> = KernelTensor<'a, T> where Self: 'a;

    fn to_strided_kernel(&self) -> KernelTensor<'_, T> {
        self.to_kernel()
    }

    fn strides(&self) -> &Strides {
        Tensor::strides(self)
    }

    fn offset(&self) -> isize {
        0
    }

    fn origin(&self) -> isize {
        0
    }

    fn capacity(&self) -> usize {
        self.shape().numel()
    }
}

impl<T: TensorDType> Assignable for Tensor<T> {
    type KernelMut<'a> = KernelTensor<'a, T> where Self: 'a;

    fn to_kernel_mut(&self) -> KernelTensor<'_, T> {
        self.to_kernel()
    }

    fn storage_id(&self) -> StorageId {
        Tensor::storage_id(self)
    }
}
