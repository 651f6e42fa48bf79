use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use tracing::debug;

use crate::error::Result;
use crate::models::settings::Settings;

/// Writes `settings` as pretty JSON, creating missing parent directories.
pub fn save_settings(settings: &Settings, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, settings)?;
    writeln!(writer)?;
    writer.flush()?;
    debug!(path = %path.display(), "settings saved");
    Ok(())
}

/// Reads settings; keys missing from the file keep their defaults.
pub fn load_settings(path: &Path) -> Result<Settings> {
    let reader = BufReader::new(File::open(path)?);
    let settings = serde_json::from_reader(reader)?;
    debug!(path = %path.display(), "settings loaded");
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProbeError;
    use crate::models::settings::OutputFormat;
    use std::io;

    #[test]
    fn test_settings_survive_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("probe.json");
        let settings = Settings {
            device: Some(2),
            format: OutputFormat::Json,
            all_devices: true,
            log_level: "debug".to_string(),
        };

        save_settings(&settings, &path).unwrap();
        assert_eq!(load_settings(&path).unwrap(), settings);
    }

    #[test]
    fn test_save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("etc").join("cuda-probe").join("probe.json");

        save_settings(&Settings::default(), &path).unwrap();
        assert_eq!(load_settings(&path).unwrap(), Settings::default());
    }

    #[test]
    fn test_malformed_settings_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(load_settings(&path), Err(ProbeError::Json(_))));
    }

    #[test]
    fn test_missing_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        match load_settings(&dir.path().join("absent.json")) {
            Err(ProbeError::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::NotFound),
            other => panic!("expected a not-found error, got {:?}", other),
        }
    }
}
