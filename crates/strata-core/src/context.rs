use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc,
};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::{AcceleratorDevice, Device, DeviceError, DeviceRequest};

/// Settings for an [ExecutionContext].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextConfig {
    device_count: u32,
    threads_per_device: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            device_count: 1,
            threads_per_device: 0,
        }
    }
}

impl ContextConfig {
    pub const DEVICE_COUNT_VAR: &'static str = "STRATA_DEVICE_COUNT";
    pub const THREADS_VAR: &'static str = "STRATA_THREADS_PER_DEVICE";

    /// Defaults, overridden by `STRATA_DEVICE_COUNT` and
    /// `STRATA_THREADS_PER_DEVICE` when they are set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(count) = read_var(Self::DEVICE_COUNT_VAR) {
            config.device_count = count;
        }
        if let Some(threads) = read_var(Self::THREADS_VAR) {
            config.threads_per_device = threads;
        }
        config
    }

    pub fn with_device_count(mut self, device_count: u32) -> Self {
        self.device_count = device_count;
        self
    }

    /// Worker threads per accelerator queue, `0` picks one per core.
    pub fn with_threads_per_device(mut self, threads: usize) -> Self {
        self.threads_per_device = threads;
        self
    }

    pub fn device_count(&self) -> u32 {
        self.device_count
    }

    pub fn threads_per_device(&self) -> usize {
        self.threads_per_device
    }
}

fn read_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    let value = std::env::var(name).ok()?;
    match value.trim().parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            log::warn!("Ignoring {}={:?}, not a valid number", name, value);
            None
        }
    }
}

/// # ExecutionContext
///
/// Owns the accelerator queues. Create one per process and share it by `Arc`.
///
/// Queues are created on first use and cached per ordinal, so every
/// [Device] obtained for the same ordinal submits to the same queue.
/// [ExecutionContext::new_queue] creates an independent queue instead.
pub struct ExecutionContext {
    config: ContextConfig,
    current: AtomicU32,
    queues: Mutex<FxHashMap<u32, Arc<rayon::ThreadPool>>>,
}

impl std::fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("config", &self.config)
            .field("device_id", &self.device_id())
            .field("queues", &self.queues.lock().len())
            .finish()
    }
}

impl ExecutionContext {
    /// Vendor id reported for the host-backed accelerators.
    pub const VENDOR_ID: u32 = 0x5354;

    pub fn new(config: ContextConfig) -> Self {
        log::info!(
            "Execution context with {} accelerator(s), {} thread(s) per queue",
            config.device_count,
            config.threads_per_device
        );
        Self {
            config,
            current: AtomicU32::new(0),
            queues: Mutex::new(FxHashMap::default()),
        }
    }

    pub fn from_env() -> Self {
        Self::new(ContextConfig::from_env())
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    pub fn device_count(&self) -> u32 {
        self.config.device_count
    }

    pub fn device_id(&self) -> u32 {
        self.current.load(Ordering::Acquire)
    }

    /// Selects the accelerator used by [DeviceRequest::Accelerator].
    pub fn set_device_id(&self, ordinal: u32) -> Result<(), DeviceError> {
        self.check_ordinal(ordinal)?;
        self.current.store(ordinal, Ordering::Release);
        log::debug!("Current accelerator is now {}", ordinal);
        Ok(())
    }

    /// Default queue of the current accelerator.
    pub fn queue(&self) -> Result<Arc<rayon::ThreadPool>, DeviceError> {
        self.queue_by_id(self.device_id())
    }

    /// Default queue of `ordinal`, created on first use.
    pub fn queue_by_id(&self, ordinal: u32) -> Result<Arc<rayon::ThreadPool>, DeviceError> {
        self.check_ordinal(ordinal)?;
        let mut queues = self.queues.lock();
        if let Some(queue) = queues.get(&ordinal) {
            return Ok(queue.clone());
        }
        let queue = self.build_queue(ordinal)?;
        queues.insert(ordinal, queue.clone());
        Ok(queue)
    }

    /// A fresh queue for `ordinal`, not shared with anyone.
    pub fn new_queue(&self, ordinal: u32) -> Result<Arc<rayon::ThreadPool>, DeviceError> {
        self.check_ordinal(ordinal)?;
        self.build_queue(ordinal)
    }

    pub fn device(&self, ordinal: u32) -> Result<Device, DeviceError> {
        let queue = self.queue_by_id(ordinal)?;
        Ok(Device::Accelerator(AcceleratorDevice::new(ordinal, queue)))
    }

    /// Identifier of the accelerator behind `ordinal`, unique within the
    /// context: the vendor id in the upper half, the ordinal in the lower.
    pub fn device_vendor_id(&self, ordinal: u32) -> Result<u32, DeviceError> {
        self.check_ordinal(ordinal)?;
        Ok((Self::VENDOR_ID << 16) + (ordinal & 0xffff))
    }

    pub fn request_device(&self, request: DeviceRequest) -> Result<Device, DeviceError> {
        match request {
            DeviceRequest::CPU => Ok(Device::CPU),
            DeviceRequest::Accelerator => self.device(self.device_id()),
        }
    }

    fn check_ordinal(&self, ordinal: u32) -> Result<(), DeviceError> {
        if ordinal >= self.config.device_count {
            return Err(DeviceError::NoSuchDevice {
                ordinal,
                count: self.config.device_count,
            });
        }
        Ok(())
    }

    fn build_queue(&self, ordinal: u32) -> Result<Arc<rayon::ThreadPool>, DeviceError> {
        let queue = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.threads_per_device)
            .thread_name(move |i| format!("strata-acc{}-{}", ordinal, i))
            .build()?;
        log::info!(
            "Created queue for ACC:{} with {} threads",
            ordinal,
            queue.current_num_threads()
        );
        Ok(Arc::new(queue))
    }
}
