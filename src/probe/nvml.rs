use std::sync::OnceLock;

use nvml_wrapper::Nvml;
use tracing::debug;

/// Figures only NVML knows about one device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NvmlDeviceInfo {
    pub memory_free: u64,
    pub memory_used: u64,
    pub serial: Option<String>,
}

/// Lazily opened NVML handle. A missing management library only drops the
/// extra fields; CUDA queries carry on without it.
#[derive(Default)]
pub struct NvmlSupplement {
    nvml: OnceLock<Option<Nvml>>,
}

impl NvmlSupplement {
    fn handle(&self) -> Option<&Nvml> {
        self.nvml
            .get_or_init(|| match Nvml::init() {
                Ok(nvml) => Some(nvml),
                Err(e) => {
                    debug!(error = %e, "NVML unavailable");
                    None
                }
            })
            .as_ref()
    }

    /// Installed driver release, e.g. `550.54.15`.
    pub fn driver_release(&self) -> Option<String> {
        match self.handle()?.sys_driver_version() {
            Ok(version) => Some(version),
            Err(e) => {
                debug!(error = %e, "driver release unavailable");
                None
            }
        }
    }

    /// Looks a device up by PCI location, which unlike the index is the same
    /// in CUDA and NVML enumeration order.
    pub fn device_info(&self, pci_bus_id: &str) -> Option<NvmlDeviceInfo> {
        let nvml = self.handle()?;
        let device = match nvml.device_by_pci_bus_id(pci_bus_id) {
            Ok(device) => device,
            Err(e) => {
                debug!(pci_bus_id, error = %e, "device not found in NVML");
                return None;
            }
        };
        let memory = match device.memory_info() {
            Ok(memory) => memory,
            Err(e) => {
                debug!(pci_bus_id, error = %e, "memory info unavailable");
                return None;
            }
        };
        Some(NvmlDeviceInfo {
            memory_free: memory.free,
            memory_used: memory.used,
            serial: device.serial().ok(),
        })
    }
}
