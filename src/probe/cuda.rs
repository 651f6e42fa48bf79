use std::sync::OnceLock;

use rustacuda::device::DeviceAttribute;
use rustacuda::error::{CudaError, CudaResult};
use rustacuda::prelude::*;
use rustacuda::CudaApiVersion;
use tracing::{debug, info};

use crate::error::{ProbeError, Result};
use crate::models::{DeviceDescriptor, DeviceDetails};
#[cfg(feature = "nvml")]
use crate::probe::nvml::NvmlSupplement;
use crate::probe::DeviceQueryProvider;

/// Queries devices through the CUDA driver API.
///
/// The driver is initialized on first use and the outcome is kept for the
/// lifetime of the provider.
pub struct CudaProvider {
    selected: u32,
    init: OnceLock<std::result::Result<(), CudaError>>,
    #[cfg(feature = "nvml")]
    nvml: NvmlSupplement,
}

impl CudaProvider {
    pub fn new(selected: u32) -> Self {
        Self {
            selected,
            init: OnceLock::new(),
            #[cfg(feature = "nvml")]
            nvml: NvmlSupplement::default(),
        }
    }

    fn init_result(&self) -> std::result::Result<(), CudaError> {
        self.init
            .get_or_init(|| {
                let result = rustacuda::init(CudaFlags::empty());
                match &result {
                    Ok(()) => debug!("CUDA driver initialized"),
                    Err(e) => debug!(error = %e, "CUDA driver initialization failed"),
                }
                result
            })
            .clone()
    }

    fn initialized(&self) -> Result<()> {
        self.init_result()
            .map_err(|e| ProbeError::RuntimeUnavailable(e.to_string()))
    }

    fn device(&self, index: u32) -> Result<Device> {
        let count = self.device_count()?;
        if index >= count {
            return Err(ProbeError::InvalidDevice { index, count });
        }
        Device::get_device(index).map_err(query("device handle"))
    }
}

fn query(operation: &'static str) -> impl Fn(CudaError) -> ProbeError {
    move |e| ProbeError::query(operation, e)
}

/// Maps the driver init outcome and visible device count to availability.
/// A driver that initialized without devices, or refused to initialize for
/// lack of one, means "not available"; any other init failure means the
/// question could not be answered.
fn availability_from<F>(init: std::result::Result<(), CudaError>, count: F) -> Result<bool>
where
    F: FnOnce() -> CudaResult<u32>,
{
    match init {
        Ok(()) => {}
        Err(CudaError::NoDevice) | Err(CudaError::InvalidDevice) => {
            info!("CUDA driver reports no usable device");
            return Ok(false);
        }
        Err(e) => return Err(ProbeError::RuntimeUnavailable(e.to_string())),
    }

    let count = count().map_err(|e| ProbeError::RuntimeUnavailable(e.to_string()))?;
    info!(count, "CUDA devices visible");
    Ok(count > 0)
}

fn optional_attribute(device: &Device, attribute: DeviceAttribute) -> Option<i32> {
    match device.get_attribute(attribute) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!(?attribute, error = %e, "device attribute unavailable");
            None
        }
    }
}

/// PCI location in the `domain:bus:device.function` form NVML expects.
#[cfg_attr(not(feature = "nvml"), allow(dead_code))]
fn pci_bus_id(domain: i32, bus: i32, device: i32) -> String {
    format!("{:08x}:{:02x}:{:02x}.0", domain, bus, device)
}

impl DeviceQueryProvider for CudaProvider {
    fn device_available(&self) -> Result<bool> {
        availability_from(self.init_result(), Device::num_devices)
    }

    fn device_count(&self) -> Result<u32> {
        self.initialized()?;
        Device::num_devices().map_err(query("device count"))
    }

    fn current_device_index(&self) -> Result<u32> {
        let count = self.device_count()?;
        if self.selected >= count {
            return Err(ProbeError::InvalidDevice {
                index: self.selected,
                count,
            });
        }
        Ok(self.selected)
    }

    fn describe_device(&self, index: u32) -> Result<DeviceDescriptor> {
        let device = self.device(index)?;
        let descriptor = DeviceDescriptor {
            index,
            name: device.name().map_err(query("device name"))?,
            major: device
                .get_attribute(DeviceAttribute::ComputeCapabilityMajor)
                .map_err(query("compute capability"))?,
            minor: device
                .get_attribute(DeviceAttribute::ComputeCapabilityMinor)
                .map_err(query("compute capability"))?,
            total_memory: device.total_memory().map_err(query("total memory"))? as u64,
        };
        debug!(index, name = %descriptor.name, "device described");
        Ok(descriptor)
    }

    fn driver_version(&self) -> Result<Option<(i32, i32)>> {
        self.initialized()?;
        let version = CudaApiVersion::get().map_err(query("driver version"))?;
        Ok(Some((version.major(), version.minor())))
    }

    #[cfg(feature = "nvml")]
    fn driver_release(&self) -> Result<Option<String>> {
        Ok(self.nvml.driver_release())
    }

    fn device_details(&self, index: u32) -> Result<DeviceDetails> {
        let descriptor = self.describe_device(index)?;
        let device = self.device(index)?;
        #[allow(unused_mut)]
        let mut details = DeviceDetails {
            multiprocessors: optional_attribute(&device, DeviceAttribute::MultiprocessorCount),
            threads_per_multiprocessor: optional_attribute(
                &device,
                DeviceAttribute::MaxThreadsPerMultiprocessor,
            ),
            clock_rate: optional_attribute(&device, DeviceAttribute::ClockRate),
            memory_clock_rate: optional_attribute(&device, DeviceAttribute::MemoryClockRate),
            ..DeviceDetails::from(descriptor)
        };

        #[cfg(feature = "nvml")]
        {
            let location = (
                optional_attribute(&device, DeviceAttribute::PciDomainId),
                optional_attribute(&device, DeviceAttribute::PciBusId),
                optional_attribute(&device, DeviceAttribute::PciDeviceId),
            );
            if let (Some(domain), Some(bus), Some(slot)) = location {
                if let Some(info) = self.nvml.device_info(&pci_bus_id(domain, bus, slot)) {
                    details.memory_free = Some(info.memory_free);
                    details.memory_used = Some(info.memory_used);
                    details.serial = info.serial;
                }
            }
        }
        Ok(details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_count() -> CudaResult<u32> {
        panic!("device count must not be queried after a failed init")
    }

    #[test]
    fn test_init_without_device_is_not_available() {
        assert!(!availability_from(Err(CudaError::NoDevice), no_count).unwrap());
        assert!(!availability_from(Err(CudaError::InvalidDevice), no_count).unwrap());
    }

    #[test]
    fn test_zero_devices_is_not_available() {
        assert!(!availability_from(Ok(()), || Ok(0)).unwrap());
        assert!(availability_from(Ok(()), || Ok(2)).unwrap());
    }

    #[test]
    fn test_other_init_failures_are_runtime_errors() {
        assert!(matches!(
            availability_from(Err(CudaError::NotInitialized), no_count),
            Err(ProbeError::RuntimeUnavailable(_))
        ));
        assert!(matches!(
            availability_from(Err(CudaError::UnknownError), no_count),
            Err(ProbeError::RuntimeUnavailable(_))
        ));
    }

    #[test]
    fn test_count_failure_after_init_is_runtime_error() {
        assert!(matches!(
            availability_from(Ok(()), || Err(CudaError::UnknownError)),
            Err(ProbeError::RuntimeUnavailable(_))
        ));
    }

    #[test]
    fn test_pci_bus_id_format() {
        assert_eq!(pci_bus_id(0, 1, 0), "00000000:01:00.0");
        assert_eq!(pci_bus_id(1, 0x3b, 0x1f), "00000001:3b:1f.0");
    }
}
