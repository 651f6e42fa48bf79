//! Device query boundary
//!
//! The CUDA runtime keeps a process-wide device context behind global
//! functions. [`DeviceQueryProvider`] wraps those calls so the reporting
//! logic can run against a fake backend without hardware.

pub mod architecture;
#[cfg(feature = "cuda")]
pub mod cuda;
#[cfg(feature = "nvml")]
pub mod nvml;
pub mod report;

use crate::error::Result;
use crate::models::{DeviceDescriptor, DeviceDetails};

#[cfg(feature = "cuda")]
pub use cuda::CudaProvider;

pub trait DeviceQueryProvider {
    /// `true` when at least one usable CUDA device is visible. Fails only
    /// when the question itself cannot be answered.
    fn device_available(&self) -> Result<bool>;

    fn device_count(&self) -> Result<u32>;

    /// Index of the device the runtime currently targets.
    fn current_device_index(&self) -> Result<u32>;

    fn describe_device(&self, index: u32) -> Result<DeviceDescriptor>;

    /// CUDA version supported by the driver as `(major, minor)`, if known.
    fn driver_version(&self) -> Result<Option<(i32, i32)>> {
        Ok(None)
    }

    /// Installed driver release string (e.g. `550.54.15`), if known.
    fn driver_release(&self) -> Result<Option<String>> {
        Ok(None)
    }

    fn device_details(&self, index: u32) -> Result<DeviceDetails> {
        self.describe_device(index).map(DeviceDetails::from)
    }
}

/// Backend for builds without CUDA support: never reports a device.
#[cfg(any(test, not(feature = "cuda")))]
#[derive(Debug, Default)]
pub struct DisabledProvider;

#[cfg(any(test, not(feature = "cuda")))]
impl DisabledProvider {
    fn unsupported() -> crate::error::ProbeError {
        crate::error::ProbeError::RuntimeUnavailable("built without CUDA support".to_string())
    }
}

#[cfg(any(test, not(feature = "cuda")))]
impl DeviceQueryProvider for DisabledProvider {
    fn device_available(&self) -> Result<bool> {
        Ok(false)
    }

    fn device_count(&self) -> Result<u32> {
        Err(Self::unsupported())
    }

    fn current_device_index(&self) -> Result<u32> {
        Err(Self::unsupported())
    }

    fn describe_device(&self, _index: u32) -> Result<DeviceDescriptor> {
        Err(Self::unsupported())
    }
}


#[cfg(test)]
mod tests {
    use super::fake::{gpu, FakeProvider};
    use super::*;
    use crate::error::ProbeError;

    #[test]
    fn test_disabled_provider_reports_no_device() {
        let provider = DisabledProvider;
        assert!(!provider.device_available().unwrap());
        assert!(matches!(
            provider.device_count(),
            Err(ProbeError::RuntimeUnavailable(_))
        ));
    }

    struct SingleDevice;

    impl DeviceQueryProvider for SingleDevice {
        fn device_available(&self) -> Result<bool> {
            Ok(true)
        }

        fn device_count(&self) -> Result<u32> {
            Ok(1)
        }

        fn current_device_index(&self) -> Result<u32> {
            Ok(0)
        }

        fn describe_device(&self, index: u32) -> Result<DeviceDescriptor> {
            Ok(gpu(index, "Test-GPU", 7, 5, 1))
        }
    }

    #[test]
    fn test_default_extended_queries() {
        let provider = SingleDevice;
        let details = provider.device_details(0).unwrap();
        assert_eq!(details.descriptor.name, "Test-GPU");
        assert_eq!(details.multiprocessors, None);
        assert_eq!(provider.driver_version().unwrap(), None);
        assert_eq!(provider.driver_release().unwrap(), None);
    }

    #[test]
    fn test_fake_provider_records_calls() {
        let provider = FakeProvider::with_devices(vec![gpu(0, "Test-GPU", 7, 5, 1)]);
        provider.device_available().unwrap();
        provider.describe_device(0).unwrap();
        assert_eq!(provider.calls(), vec!["device_available", "describe_device"]);
    }
}
