mod accelerator_buffer;
mod cpu_buffer;

pub use accelerator_buffer::*;
pub use cpu_buffer::*;

use bytemuck::NoUninit;

use crate::{DType, Device, DeviceError};

/// Unique identifier for an allocation, used to detect aliasing.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct StorageId(usize);

impl std::fmt::Debug for StorageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "S{}", self.0)
    }
}

impl StorageId {
    pub(crate) fn new() -> Self {
        use std::sync::atomic;
        static COUNTER: atomic::AtomicUsize = atomic::AtomicUsize::new(1);
        Self(COUNTER.fetch_add(1, atomic::Ordering::Relaxed))
    }
}

#[derive(Debug)]
pub enum Storage {
    CPU(CPUBuffer),
    Accelerator(AcceleratorBuffer),
}

impl Storage {
    pub fn zeros(n_bytes: usize, alignment: usize, device: &Device) -> Result<Self, DeviceError> {
        match device {
            Device::CPU => Ok(Storage::CPU(CPUBuffer::zeros(n_bytes, alignment)?)),
            Device::Accelerator(a) => Ok(Storage::Accelerator(AcceleratorBuffer::zeros(
                n_bytes, alignment, a,
            )?)),
        }
    }

    pub fn from_slice<T: NoUninit>(data: &[T], device: &Device) -> Result<Self, DeviceError> {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        Self::from_bytes(bytes, std::mem::align_of::<T>(), device)
    }

    pub fn from_bytes(data: &[u8], alignment: usize, device: &Device) -> Result<Self, DeviceError> {
        match device {
            Device::CPU => Ok(Storage::CPU(CPUBuffer::from_bytes(data, alignment)?)),
            Device::Accelerator(a) => Ok(Storage::Accelerator(AcceleratorBuffer::from_bytes(
                data, alignment, a,
            )?)),
        }
    }

    fn raw(&self) -> &RawBuffer {
        match self {
            Storage::CPU(c) => c.inner(),
            Storage::Accelerator(a) => a.inner(),
        }
    }

    /// Raw accessor handed to kernel descriptors.
    pub fn as_ptr(&self) -> *mut u8 {
        self.raw().as_ptr()
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.raw().as_bytes()
    }

    pub fn n_bytes(&self) -> usize {
        self.raw().n_bytes()
    }

    pub fn id(&self) -> StorageId {
        self.raw().id()
    }

    pub fn dump(&self, dt: DType, full: bool) -> String {
        match self {
            Storage::CPU(c) => c.dump(dt, full),
            Storage::Accelerator(a) => a.dump(dt, full),
        }
    }

    pub fn deep_clone(&self) -> Result<Self, DeviceError> {
        match self {
            Storage::CPU(c) => Ok(Storage::CPU(c.deep_clone()?)),
            Storage::Accelerator(a) => Ok(Storage::Accelerator(a.deep_clone()?)),
        }
    }
}

/// Host/device copy primitives.
pub trait DeviceStorage: std::fmt::Debug + 'static {
    /// Creates a copy of the buffer on the accelerator `device`.
    fn to_device(&self, device: &Device) -> Result<AcceleratorBuffer, DeviceError>;
    /// Creates a copy of the buffer on the CPU
    fn to_cpu(&self, device: &Device) -> Result<CPUBuffer, DeviceError>;
    fn n_bytes(&self) -> usize;
    fn dump(&self, dt: DType, full: bool) -> String;
}
