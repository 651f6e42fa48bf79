use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Device to report on; the runtime default (0) when unset
    pub device: Option<u32>,
    pub format: OutputFormat,
    /// List every visible device after the summary line
    pub all_devices: bool,
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            device: None,
            format: OutputFormat::Text,
            all_devices: false,
            log_level: "warn".to_string(),
        }
    }
}

impl Settings {
    pub fn selected_device(&self) -> u32 {
        self.device.unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_settings_fall_back_to_defaults() {
        let settings: Settings = serde_json::from_str(r#"{ "format": "json" }"#).unwrap();
        assert_eq!(settings.format, OutputFormat::Json);
        assert_eq!(settings.device, None);
        assert_eq!(settings.selected_device(), 0);
        assert!(!settings.all_devices);
        assert_eq!(settings.log_level, "warn");
    }

    #[test]
    fn test_unknown_format_is_rejected() {
        assert!(serde_json::from_str::<Settings>(r#"{ "format": "xml" }"#).is_err());
    }
}
