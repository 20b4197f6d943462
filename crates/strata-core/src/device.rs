use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("No accelerator with ordinal {ordinal}, {count} available.")]
    NoSuchDevice { ordinal: u32, count: u32 },
    #[error("Device mismatch, requested device: {0:?}, actual device: {1:?}")]
    DeviceMismatch(String, String),
    #[error("Failed to create accelerator queue with error: {0}")]
    QueueCreationFailed(#[from] rayon::ThreadPoolBuildError),
    #[error("Failed to allocate buffer with error: {0}")]
    BufferAllocationFailed(#[from] std::alloc::LayoutError),
}

pub enum DeviceRequest {
    CPU,
    /// The context's current accelerator.
    Accelerator,
}

/// One accelerator ordinal together with the queue work is submitted to.
#[derive(Clone)]
pub struct AcceleratorDevice {
    ordinal: u32,
    queue: Arc<rayon::ThreadPool>,
}

impl AcceleratorDevice {
    pub(crate) fn new(ordinal: u32, queue: Arc<rayon::ThreadPool>) -> Self {
        Self { ordinal, queue }
    }

    pub fn ordinal(&self) -> u32 {
        self.ordinal
    }

    pub fn queue(&self) -> &rayon::ThreadPool {
        &self.queue
    }

    /// Same ordinal, different queue. Work submitted through the returned
    /// device does not wait behind work on this one.
    pub fn with_queue(&self, queue: Arc<rayon::ThreadPool>) -> Self {
        Self::new(self.ordinal, queue)
    }
}

impl PartialEq for AcceleratorDevice {
    fn eq(&self, other: &Self) -> bool {
        self.ordinal == other.ordinal
    }
}

impl std::fmt::Debug for AcceleratorDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ACC:{} ({} threads)",
            self.ordinal,
            self.queue.current_num_threads()
        )
    }
}

#[derive(Clone, Default, PartialEq)]
pub enum Device {
    #[default]
    CPU,
    Accelerator(AcceleratorDevice),
}

impl std::fmt::Debug for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Device::CPU => write!(f, "CPU"),
            Device::Accelerator(a) => write!(f, "ACC:{}", a.ordinal()),
        }
    }
}

impl Device {
    pub fn is_cpu(&self) -> bool {
        matches!(self, Device::CPU)
    }

    pub fn is_accelerator(&self) -> bool {
        matches!(self, Device::Accelerator(_))
    }

    pub fn label(&self) -> String {
        format!("{:?}", self)
    }

    pub fn try_accelerator(&self) -> Result<&AcceleratorDevice, DeviceError> {
        match self {
            Device::Accelerator(a) => Ok(a),
            Device::CPU => Err(DeviceError::DeviceMismatch(
                "ACC".to_string(),
                "CPU".to_string(),
            )),
        }
    }
}
