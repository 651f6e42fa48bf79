pub mod device;
pub mod settings;

pub use device::{DeviceDescriptor, DeviceDetails};
pub use settings::{OutputFormat, Settings};
