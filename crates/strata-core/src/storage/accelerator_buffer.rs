use crate::{
    storage::{dump_bytes, DeviceStorage},
    AcceleratorDevice, CPUBuffer, DType, Device, DeviceError, RawBuffer,
};

/// Buffer owned by one accelerator ordinal.
///
/// Accelerator queues execute against host-addressable memory, so the buffer
/// is a [RawBuffer] tagged with the ordinal it belongs to. Moving data between
/// ordinals or to the host always goes through [DeviceStorage].
#[derive(Debug)]
pub struct AcceleratorBuffer {
    inner: RawBuffer,
    ordinal: u32,
}

impl AcceleratorBuffer {
    pub fn from_bytes(
        bytes: &[u8],
        alignment: usize,
        device: &AcceleratorDevice,
    ) -> Result<Self, DeviceError> {
        let inner = RawBuffer::from_bytes(bytes, alignment)?;
        log::trace!("upload {} bytes to {:?}", bytes.len(), device);
        Ok(Self {
            inner,
            ordinal: device.ordinal(),
        })
    }

    pub fn zeros(
        n_bytes: usize,
        alignment: usize,
        device: &AcceleratorDevice,
    ) -> Result<Self, DeviceError> {
        Ok(Self {
            inner: RawBuffer::zeroed(n_bytes, alignment)?,
            ordinal: device.ordinal(),
        })
    }

    pub fn inner(&self) -> &RawBuffer {
        &self.inner
    }

    pub fn ordinal(&self) -> u32 {
        self.ordinal
    }

    pub fn deep_clone(&self) -> Result<Self, DeviceError> {
        Ok(Self {
            inner: self.inner.deep_clone()?,
            ordinal: self.ordinal,
        })
    }
}

impl DeviceStorage for AcceleratorBuffer {
    fn to_device(&self, device: &Device) -> Result<AcceleratorBuffer, DeviceError> {
        let accelerator = device.try_accelerator()?;
        AcceleratorBuffer::from_bytes(self.inner.as_bytes(), self.inner.alignment(), accelerator)
    }

    fn to_cpu(&self, _device: &Device) -> Result<CPUBuffer, DeviceError> {
        log::trace!("download {} bytes from ACC:{}", self.n_bytes(), self.ordinal);
        CPUBuffer::from_bytes(self.inner.as_bytes(), self.inner.alignment())
    }

    fn n_bytes(&self) -> usize {
        self.inner.n_bytes()
    }

    fn dump(&self, dt: DType, full: bool) -> String {
        dump_bytes(self.inner.as_bytes(), dt, full)
    }
}
