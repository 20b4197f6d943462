use bytemuck::NoUninit;
use half::{bf16, f16};
use num_complex::Complex;

use crate::{
    storage::{DeviceStorage, StorageId},
    AcceleratorBuffer, DType, Device, DeviceError, TensorDType,
};

/// Aligned, zero-initialised host allocation.
#[derive(Debug, PartialEq, Eq)]
pub struct RawBuffer {
    ptr: *mut u8,
    layout: std::alloc::Layout,
    id: StorageId,
}

impl RawBuffer {
    pub fn zeroed(size: usize, alignment: usize) -> Result<Self, DeviceError> {
        let layout = std::alloc::Layout::from_size_align(size, alignment)?;
        let ptr = if size == 0 {
            // dangling but aligned, never dereferenced
            std::ptr::null_mut::<u8>().wrapping_add(layout.align())
        } else {
            let ptr = unsafe { std::alloc::alloc_zeroed(layout) };
            if ptr.is_null() {
                std::alloc::handle_alloc_error(layout);
            }
            ptr
        };
        let id = StorageId::new();
        log::trace!("allocated {:?}: {} bytes at {:p}", id, size, ptr);
        Ok(Self { ptr, layout, id })
    }

    pub fn as_ptr(&self) -> *mut u8 {
        self.ptr
    }

    pub fn id(&self) -> StorageId {
        self.id
    }

    pub fn n_bytes(&self) -> usize {
        self.layout.size()
    }

    pub fn alignment(&self) -> usize {
        self.layout.align()
    }

    pub fn as_bytes(&self) -> &[u8] {
        unsafe { std::slice::from_raw_parts(self.ptr, self.layout.size()) }
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        unsafe { std::slice::from_raw_parts_mut(self.ptr, self.layout.size()) }
    }

    pub fn from_bytes(bytes: &[u8], alignment: usize) -> Result<Self, DeviceError> {
        let mut raw = Self::zeroed(bytes.len(), alignment)?;
        raw.as_bytes_mut().copy_from_slice(bytes);
        Ok(raw)
    }

    pub fn deep_clone(&self) -> Result<Self, DeviceError> {
        let clone = Self::from_bytes(self.as_bytes(), self.alignment())?;
        log::trace!("cloned {:?} -> {:?}", self.id, clone.id);
        Ok(clone)
    }
}

impl Drop for RawBuffer {
    fn drop(&mut self) {
        if self.layout.size() > 0 {
            log::trace!("dropping {:?} at {:p}", self.id, self.ptr);
            unsafe { std::alloc::dealloc(self.ptr, self.layout) }
        }
    }
}

unsafe impl Send for RawBuffer {}
unsafe impl Sync for RawBuffer {}

/// Managed CPU buffer
#[derive(Debug, derive_new::new)]
pub struct CPUBuffer {
    inner: RawBuffer,
}

impl CPUBuffer {
    pub fn from_slice<T: NoUninit>(data: &[T]) -> Result<Self, DeviceError> {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        Self::from_bytes(bytes, std::mem::align_of::<T>())
    }

    pub fn from_bytes(bytes: &[u8], alignment: usize) -> Result<Self, DeviceError> {
        Ok(Self::from(RawBuffer::from_bytes(bytes, alignment)?))
    }

    pub fn zeros(n_bytes: usize, alignment: usize) -> Result<Self, DeviceError> {
        Ok(Self::from(RawBuffer::zeroed(n_bytes, alignment)?))
    }

    pub fn inner(&self) -> &RawBuffer {
        &self.inner
    }

    pub fn deep_clone(&self) -> Result<Self, DeviceError> {
        Ok(Self::from(self.inner.deep_clone()?))
    }
}

impl From<RawBuffer> for CPUBuffer {
    fn from(raw: RawBuffer) -> Self {
        CPUBuffer { inner: raw }
    }
}

impl DeviceStorage for CPUBuffer {
    fn to_device(&self, device: &Device) -> Result<AcceleratorBuffer, DeviceError> {
        let accelerator = device.try_accelerator()?;
        let raw = self.inner();
        AcceleratorBuffer::from_bytes(raw.as_bytes(), raw.alignment(), accelerator)
    }

    fn to_cpu(&self, _device: &Device) -> Result<CPUBuffer, DeviceError> {
        self.deep_clone()
    }

    fn n_bytes(&self) -> usize {
        self.inner().n_bytes()
    }

    fn dump(&self, dtype: DType, full: bool) -> String {
        dump_bytes(self.inner().as_bytes(), dtype, full)
    }
}

/// Formats `bytes` as elements of `dtype`, eliding the middle unless `full`.
pub(crate) fn dump_bytes(bytes: &[u8], dtype: DType, full: bool) -> String {
    fn dump_inner<T: TensorDType>(bytes: &[u8], full: bool) -> String {
        let Ok(data) = bytemuck::try_cast_slice::<u8, T>(bytes) else {
            return format!("<{} unaligned bytes>", bytes.len());
        };
        let length = if data.len() < 64 { data.len() } else { 64 };
        if full || data.len() <= 2 * length {
            format!("{:?}", data)
        } else {
            format!("{:?}...{:?}", &data[..length], &data[data.len() - length..])
        }
    }
    match dtype {
        DType::F16 => dump_inner::<f16>(bytes, full),
        DType::BF16 => dump_inner::<bf16>(bytes, full),
        DType::F32 => dump_inner::<f32>(bytes, full),
        DType::F64 => dump_inner::<f64>(bytes, full),
        DType::I32 => dump_inner::<i32>(bytes, full),
        DType::U32 => dump_inner::<u32>(bytes, full),
        DType::C32 => dump_inner::<Complex<f32>>(bytes, full),
        DType::C64 => dump_inner::<Complex<f64>>(bytes, full),
    }
}
