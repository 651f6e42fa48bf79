use serde::Serialize;

const BYTES_PER_GB: f64 = 1e9;

/// Properties of one GPU as reported by the runtime at query time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceDescriptor {
    pub index: u32,
    pub name: String,
    pub major: i32,
    pub minor: i32,
    /// Total memory in bytes
    pub total_memory: u64,
}

impl DeviceDescriptor {
    /// Total memory in decimal gigabytes.
    pub fn total_memory_gb(&self) -> f64 {
        self.total_memory as f64 / BYTES_PER_GB
    }

    /// `major * 10 + minor`, e.g. 86 for an 8.6 device. Diagnostic only.
    pub fn compute_capability_scalar(&self) -> i32 {
        self.major * 10 + self.minor
    }
}

/// Extended per-device attributes for the detailed listing. Attributes the
/// driver refuses to report are left as `None` and skipped on output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceDetails {
    #[serde(flatten)]
    pub descriptor: DeviceDescriptor,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiprocessors: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threads_per_multiprocessor: Option<i32>,
    /// kHz
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clock_rate: Option<i32>,
    /// kHz
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_clock_rate: Option<i32>,
    /// Bytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_free: Option<u64>,
    /// Bytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_used: Option<u64>,
}

impl DeviceDetails {
    pub fn concurrent_threads(&self) -> Option<i64> {
        match (self.multiprocessors, self.threads_per_multiprocessor) {
            (Some(sm), Some(threads)) => Some(i64::from(sm) * i64::from(threads)),
            _ => None,
        }
    }

    pub fn gpu_clock_mhz(&self) -> Option<f64> {
        self.clock_rate.map(|khz| f64::from(khz) / 1000.0)
    }

    pub fn memory_clock_mhz(&self) -> Option<f64> {
        self.memory_clock_rate.map(|khz| f64::from(khz) / 1000.0)
    }
}

impl From<DeviceDescriptor> for DeviceDetails {
    fn from(descriptor: DeviceDescriptor) -> Self {
        Self {
            descriptor,
            serial: None,
            multiprocessors: None,
            threads_per_multiprocessor: None,
            clock_rate: None,
            memory_clock_rate: None,
            memory_free: None,
            memory_used: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(major: i32, minor: i32, total_memory: u64) -> DeviceDescriptor {
        DeviceDescriptor {
            index: 0,
            name: "Test-GPU".to_string(),
            major,
            minor,
            total_memory,
        }
    }

    #[test]
    fn test_total_memory_uses_decimal_gigabytes() {
        assert_eq!(descriptor(7, 5, 16_000_000_000).total_memory_gb(), 16.0);
        assert_eq!(descriptor(7, 5, 8_500_000_000).total_memory_gb(), 8.5);
    }

    #[test]
    fn test_compute_capability_scalar() {
        assert_eq!(descriptor(8, 6, 0).compute_capability_scalar(), 86);
        assert_eq!(descriptor(3, 5, 0).compute_capability_scalar(), 35);
    }

    #[test]
    fn test_details_derived_values() {
        let details = DeviceDetails {
            multiprocessors: Some(40),
            threads_per_multiprocessor: Some(1024),
            clock_rate: Some(1_590_000),
            memory_clock_rate: Some(5_001_000),
            ..DeviceDetails::from(descriptor(7, 5, 0))
        };
        assert_eq!(details.concurrent_threads(), Some(40_960));
        assert_eq!(details.gpu_clock_mhz(), Some(1590.0));
        assert_eq!(details.memory_clock_mhz(), Some(5001.0));

        let bare = DeviceDetails::from(descriptor(7, 5, 0));
        assert_eq!(bare.concurrent_threads(), None);
        assert_eq!(bare.gpu_clock_mhz(), None);
    }

    #[test]
    fn test_details_serialize_flat_and_skip_unknown_fields() {
        let details = DeviceDetails {
            serial: Some("1324021012345".to_string()),
            memory_free: Some(12_000_000_000),
            ..DeviceDetails::from(descriptor(8, 6, 16_000_000_000))
        };
        let value = serde_json::to_value(&details).unwrap();

        assert_eq!(value["name"], "Test-GPU");
        assert_eq!(value["major"], 8);
        assert_eq!(value["serial"], "1324021012345");
        assert_eq!(value["memory_free"], 12_000_000_000u64);
        assert!(value.get("memory_used").is_none());
        assert!(value.get("multiprocessors").is_none());
    }
}
