//! Text and JSON reports over a [`DeviceQueryProvider`]

use std::io::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use crate::models::DeviceDetails;
use crate::probe::DeviceQueryProvider;
use crate::utils::format::{human_bytes, mebibytes};

/// Asks the runtime whether any CUDA device is usable.
pub fn check_availability<P: DeviceQueryProvider + ?Sized>(provider: &P) -> Result<bool> {
    provider.device_available()
}

/// Prints the availability line and, when a device is present, one summary
/// line for the current device. Returns the number of visible devices.
pub fn report_summary<P, W>(provider: &P, out: &mut W) -> Result<u32>
where
    P: DeviceQueryProvider + ?Sized,
    W: Write,
{
    if !check_availability(provider)? {
        writeln!(out, "Cuda is not available")?;
        return Ok(0);
    }
    writeln!(out, "Cuda is available")?;

    let index = provider.current_device_index()?;
    let count = provider.device_count()?;
    let device = provider.describe_device(index)?;
    debug!(
        index,
        compute_capability = device.compute_capability_scalar(),
        "current device"
    );

    writeln!(
        out,
        "Found {} GPUs available. Using GPU {} ({}) of compute capability {}.{} with {:.1}Gb total memory.\n",
        count,
        index,
        device.name,
        device.major,
        device.minor,
        device.total_memory_gb()
    )?;
    Ok(count)
}

/// Summary followed by a block of attributes for every visible device.
pub fn report_devices<P, W>(provider: &P, out: &mut W) -> Result<()>
where
    P: DeviceQueryProvider + ?Sized,
    W: Write,
{
    let count = report_summary(provider, out)?;
    for index in 0..count {
        let details = provider.device_details(index)?;
        write_details(&details, out)?;
    }
    Ok(())
}

fn write_details<W: Write>(details: &DeviceDetails, out: &mut W) -> Result<()> {
    let device = &details.descriptor;
    writeln!(out, "Device: {}", device.index)?;
    writeln!(out, "  Name: {}", device.name)?;
    if let Some(serial) = &details.serial {
        writeln!(out, "  Serial: {}", serial)?;
    }
    writeln!(out, "  Compute Capability: {}.{}", device.major, device.minor)?;
    if let Some(sm) = details.multiprocessors {
        writeln!(out, "  Multiprocessors: {}", sm)?;
    }
    if let Some(threads) = details.concurrent_threads() {
        writeln!(out, "  Concurrent threads: {}", threads)?;
    }
    if let Some(mhz) = details.gpu_clock_mhz() {
        writeln!(out, "  GPU clock: {} MHz", mhz)?;
    }
    if let Some(mhz) = details.memory_clock_mhz() {
        writeln!(out, "  Memory clock: {} MHz", mhz)?;
    }
    writeln!(
        out,
        "  Total Memory: {} MiB ({})",
        mebibytes(device.total_memory),
        human_bytes(device.total_memory)
    )?;
    if let Some(free) = details.memory_free {
        writeln!(out, "  Free Memory: {} MiB", mebibytes(free))?;
    }
    if let Some(used) = details.memory_used {
        writeln!(out, "  Used Memory: {} MiB ({})", mebibytes(used), human_bytes(used))?;
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct JsonReport {
    pub host: String,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cuda_version: Option<String>,
    pub device_count: u32,
    pub current_device: Option<u32>,
    pub queried_at: String,
    pub devices: Vec<DeviceDetails>,
}

/// Name of this machine, or `unknown` when the OS will not say.
pub fn host_name() -> String {
    match hostname::get() {
        Ok(name) => name.to_string_lossy().into_owned(),
        Err(e) => {
            debug!(error = %e, "host name unavailable");
            "unknown".to_string()
        }
    }
}

pub fn build_json_report<P>(
    provider: &P,
    host: &str,
    queried_at: DateTime<Utc>,
) -> Result<JsonReport>
where
    P: DeviceQueryProvider + ?Sized,
{
    let mut report = JsonReport {
        host: host.to_string(),
        available: check_availability(provider)?,
        driver_version: None,
        cuda_version: None,
        device_count: 0,
        current_device: None,
        queried_at: queried_at.to_rfc3339(),
        devices: Vec::new(),
    };
    if !report.available {
        return Ok(report);
    }

    report.driver_version = provider.driver_release()?;
    report.cuda_version = provider
        .driver_version()?
        .map(|(major, minor)| format!("{}.{}", major, minor));
    report.device_count = provider.device_count()?;
    report.current_device = Some(provider.current_device_index()?);
    report.devices = (0..report.device_count)
        .map(|index| provider.device_details(index))
        .collect::<Result<_>>()?;
    Ok(report)
}

pub fn report_json<P, W>(provider: &P, out: &mut W) -> Result<()>
where
    P: DeviceQueryProvider + ?Sized,
    W: Write,
{
    let report = build_json_report(provider, &host_name(), Utc::now())?;
    serde_json::to_writer_pretty(&mut *out, &report)?;
    writeln!(out)?;
    Ok(())
}
