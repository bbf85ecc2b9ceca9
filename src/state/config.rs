//! Capture configuration
//!
//! The initial records and camera options are read once at start-up, either
//! from a JSON file or by scanning a folder of captured images.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

use super::data::{ImageRecord, PreviewMode};

/// Image types the capture folder scan accepts
const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "tif", "tiff"];

const THUMB_SUFFIX: &str = "-thumb";
const FIXED_SUFFIX: &str = "-fixed";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid capture configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Options for the simulated camera
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct CameraOptions {
    /// Where captures are (nominally) written
    pub data_dir: PathBuf,
    /// Filename template; `${cameraID}` and `${captureIndex}` are substituted
    pub filename_template: String,
    /// Number of connected cameras; each capture yields one image per camera
    pub cameras: u32,
    /// Simulated acquisition latency in milliseconds
    pub delay_ms: u64,
}

impl Default for CameraOptions {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("capturedImages"),
            filename_template: "capture-${cameraID}_${captureIndex}.jpg".to_string(),
            cameras: 1,
            delay_ms: 250,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct CaptureConfig {
    #[serde(alias = "thumbs")]
    pub records: Vec<ImageRecord>,
    pub preview_mode: PreviewMode,
    pub camera: CameraOptions,
}

impl CaptureConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a configuration file.
    ///
    /// A missing file is not an error: it yields the empty default configuration.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(json) => Self::from_json(&json),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("no capture configuration at {}, starting empty", path.display());
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Default configuration location
    ///
    /// - Linux: ~/.config/decapod-capture/capture.json
    /// - macOS: ~/Library/Application Support/decapod-capture/capture.json
    /// - Windows: %APPDATA%\decapod-capture\capture.json
    pub fn default_path() -> PathBuf {
        let mut path = dirs::config_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));

        path.push("decapod-capture");
        path.push("capture.json");
        path
    }
}

/// Build records from a folder of captured images.
///
/// `Image0.jpg` is paired with `Image0-thumb.jpg` and `Image0-fixed.jpg` when
/// those exist; a capture without a thumbnail uses itself as the thumbnail.
/// Records come back in filename order.
pub fn records_from_dir(dir: &Path) -> Vec<ImageRecord> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| p.is_file() && is_image(p))
        .collect();
    files.sort();

    let records: Vec<ImageRecord> = files
        .iter()
        .filter(|p| !has_suffix(p, THUMB_SUFFIX) && !has_suffix(p, FIXED_SUFFIX))
        .map(|full| {
            let thumb = find_variant(&files, full, THUMB_SUFFIX).unwrap_or(full);
            let record = ImageRecord::new(path_string(full), path_string(thumb));
            match find_variant(&files, full, FIXED_SUFFIX) {
                Some(fixed) => record.with_fixed(path_string(fixed)),
                None => record,
            }
        })
        .collect();

    log::info!("found {} captured images in {}", records.len(), dir.display());
    records
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

fn has_suffix(path: &Path, suffix: &str) -> bool {
    path.file_stem()
        .is_some_and(|stem| stem.to_string_lossy().ends_with(suffix))
}

/// Find `<stem><suffix>.<any image ext>` next to `full`
fn find_variant<'a>(files: &'a [PathBuf], full: &Path, suffix: &str) -> Option<&'a PathBuf> {
    let stem = full.file_stem()?.to_string_lossy();
    let wanted = format!("{}{}", stem, suffix);
    files.iter().find(|p| {
        p.parent() == full.parent()
            && p.file_stem().is_some_and(|s| s.to_string_lossy() == wanted)
    })
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_from_json_with_thumbs_key() {
        let json = r#"{
            "thumbs": [
                {
                    "fullImage": "capturedImages/Image0.jpg",
                    "thumbImage": "capturedImages/Image0-thumb.jpg",
                    "fixedImage": "capturedImages/Image0.jpg"
                },
                {
                    "fullImage": "capturedImages/Image1.jpg",
                    "thumbImage": "capturedImages/Image1-thumb.jpg"
                }
            ],
            "serverOn": false,
            "cameraOn": false
        }"#;

        let config = CaptureConfig::from_json(json).unwrap();
        assert_eq!(config.records.len(), 2);
        assert!(config.records[0].is_fixed());
        assert!(!config.records[1].is_fixed());
        assert_eq!(config.preview_mode, PreviewMode::PreferFixed);
        assert_eq!(config.camera, CameraOptions::default());
    }

    #[test]
    fn test_from_json_camera_and_preview() {
        let json = r#"{
            "previewMode": "original",
            "camera": { "cameras": 2, "delayMs": 0 }
        }"#;

        let config = CaptureConfig::from_json(json).unwrap();
        assert!(config.records.is_empty());
        assert_eq!(config.preview_mode, PreviewMode::Original);
        assert_eq!(config.camera.cameras, 2);
        assert_eq!(config.camera.delay_ms, 0);
        assert_eq!(config.camera.filename_template, "capture-${cameraID}_${captureIndex}.jpg");
    }

    #[test]
    fn test_invalid_json() {
        let err = CaptureConfig::from_json("{ \"records\": 3 }").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = CaptureConfig::load(&dir.path().join("capture.json")).unwrap();
        assert_eq!(config, CaptureConfig::default());
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("capture.json");
        fs::write(&path, r#"{ "records": [ { "fullImage": "a.jpg", "thumbImage": "a-t.jpg" } ] }"#)
            .unwrap();

        let config = CaptureConfig::load(&path).unwrap();
        assert_eq!(config.records, vec![ImageRecord::new("a.jpg", "a-t.jpg")]);
    }

    #[test]
    fn test_default_path() {
        let path = CaptureConfig::default_path();
        assert!(path.ends_with("decapod-capture/capture.json"));
    }

    #[test]
    fn test_records_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "Image1.jpg",
            "Image0.jpg",
            "Image0-thumb.jpg",
            "Image1-thumb.jpg",
            "Image1-fixed.jpg",
            "Image2.png",
            "notes.txt",
        ] {
            fs::write(dir.path().join(name), b"").unwrap();
        }

        let records = records_from_dir(dir.path());
        assert_eq!(records.len(), 3);

        assert!(records[0].full_image.ends_with("Image0.jpg"));
        assert!(records[0].thumb_image.ends_with("Image0-thumb.jpg"));
        assert!(!records[0].is_fixed());

        assert!(records[1].full_image.ends_with("Image1.jpg"));
        assert!(records[1].fixed_image.as_deref().unwrap().ends_with("Image1-fixed.jpg"));

        // No thumbnail on disk: the capture stands in for itself
        assert_eq!(records[2].thumb_image, records[2].full_image);
    }

    #[test]
    fn test_records_from_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(records_from_dir(&dir.path().join("nope")).is_empty());
    }
}
