//! Collaborators that feed the capture session
//!
//! The session never talks to hardware. An `ImageSource` produces already
//! resolved records and a `Fixer` produces a post-processed reference; the
//! caller hands the results to the session once the futures complete.
//! The mock implementations only make up path references, nothing is written.

use std::future::Future;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::state::config::CameraOptions;
use crate::state::data::ImageRecord;

/// Failures reported by collaborators. These never reach the session.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("camera timed out: {0}")]
    Timeout(String),
    #[error("capture failed: {0}")]
    Capture(String),
    #[error("fixing failed: {0}")]
    Fix(String),
}

/// Produces captured images, one per connected camera
pub trait ImageSource: Clone + Send + 'static {
    fn acquire(
        self,
        capture_index: u32,
    ) -> impl Future<Output = Result<Vec<ImageRecord>, SourceError>> + Send;
}

/// Post-processes a full image and returns the reference to the fixed version
pub trait Fixer: Clone + Send + 'static {
    fn fix(self, full_image: String) -> impl Future<Output = Result<String, SourceError>> + Send;
}

/// Running capture counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureStatus {
    /// Index substituted into the next capture's filename
    pub index: u32,
    /// Images produced across all cameras
    pub total_captures: u32,
}

impl CaptureStatus {
    /// Claim the index for a capture that is about to start.
    ///
    /// Called when the capture is dispatched, so overlapping captures never share an index.
    pub fn next_index(&mut self) -> u32 {
        let index = self.index;
        self.index = self.index.saturating_add(1);
        index
    }

    /// Account for a finished capture that produced `images` images
    pub fn record(&mut self, images: usize) {
        let images = u32::try_from(images).unwrap_or(u32::MAX);
        self.total_captures = self.total_captures.saturating_add(images);
    }
}

/// Simulated camera rig
#[derive(Debug, Clone)]
pub struct MockCamera {
    options: CameraOptions,
    /// Fail every capture from this index on (simulates a camera dropping off)
    fail_after: Option<u32>,
}

impl MockCamera {
    pub fn new(options: CameraOptions) -> Self {
        Self {
            options,
            fail_after: None,
        }
    }

    pub fn fail_after(mut self, capture_index: u32) -> Self {
        self.fail_after = Some(capture_index);
        self
    }

    /// Substitute the camera and capture index into the filename template
    pub fn filename(&self, camera_id: u32, capture_index: u32) -> String {
        self.options
            .filename_template
            .replace("${cameraID}", &camera_id.to_string())
            .replace("${captureIndex}", &capture_index.to_string())
    }

    fn record_for(&self, camera_id: u32, capture_index: u32) -> ImageRecord {
        let full = self.options.data_dir.join(self.filename(camera_id, capture_index));
        let thumb = full.with_file_name(format!(
            "{}-thumb.{}",
            file_stem(&full),
            file_extension(&full)
        ));
        ImageRecord::new(full.to_string_lossy(), thumb.to_string_lossy())
    }
}

impl ImageSource for MockCamera {
    async fn acquire(self, capture_index: u32) -> Result<Vec<ImageRecord>, SourceError> {
        if self.options.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.options.delay_ms)).await;
        }

        if self.options.cameras == 0 {
            return Err(SourceError::Capture("no cameras connected".to_string()));
        }
        if self.fail_after.is_some_and(|limit| capture_index >= limit) {
            return Err(SourceError::Timeout(format!(
                "no response for capture {}",
                capture_index
            )));
        }

        let records: Vec<ImageRecord> = (0..self.options.cameras)
            .map(|camera_id| self.record_for(camera_id, capture_index))
            .collect();

        log::info!("captured {} images (capture {})", records.len(), capture_index);
        Ok(records)
    }
}

/// Simulated post-processing pipeline
#[derive(Debug, Clone)]
pub struct MockFixer {
    delay: Duration,
}

impl MockFixer {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Fixer for MockFixer {
    async fn fix(self, full_image: String) -> Result<String, SourceError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let path = Path::new(&full_image);
        if path.file_stem().is_none() {
            return Err(SourceError::Fix(format!("not an image: {:?}", full_image)));
        }

        let fixed = path.with_file_name(format!(
            "{}-fixed.{}",
            file_stem(path),
            file_extension(path)
        ));
        log::info!("fixed {}", full_image);
        Ok(fixed.to_string_lossy().to_string())
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn file_extension(path: &Path) -> String {
    path.extension()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "jpg".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn options(cameras: u32) -> CameraOptions {
        CameraOptions {
            data_dir: PathBuf::from("data"),
            cameras,
            delay_ms: 0,
            ..CameraOptions::default()
        }
    }

    #[test]
    fn test_filename_template() {
        let camera = MockCamera::new(options(1));
        assert_eq!(camera.filename(1, 7), "capture-1_7.jpg");
    }

    #[tokio::test]
    async fn test_acquire_one_image_per_camera() {
        let records = MockCamera::new(options(2)).acquire(3).await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].full_image, Path::new("data").join("capture-0_3.jpg").to_string_lossy());
        assert_eq!(records[1].thumb_image, Path::new("data").join("capture-1_3-thumb.jpg").to_string_lossy());
        assert!(records.iter().all(|r| !r.is_fixed()));
    }

    #[tokio::test]
    async fn test_acquire_failures() {
        let err = MockCamera::new(options(0)).acquire(0).await.unwrap_err();
        assert!(matches!(err, SourceError::Capture(_)));

        let camera = MockCamera::new(options(1)).fail_after(2);
        assert!(camera.clone().acquire(1).await.is_ok());
        let err = camera.acquire(2).await.unwrap_err();
        assert!(matches!(err, SourceError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_fixer_names_fixed_version() {
        let fixed = MockFixer::new(Duration::ZERO)
            .fix("capturedImages/Image2.jpg".to_string())
            .await
            .unwrap();
        assert_eq!(fixed, Path::new("capturedImages").join("Image2-fixed.jpg").to_string_lossy());
    }

    #[tokio::test]
    async fn test_fixer_rejects_empty_reference() {
        let err = MockFixer::new(Duration::ZERO).fix(String::new()).await.unwrap_err();
        assert!(matches!(err, SourceError::Fix(_)));
    }

    #[test]
    fn test_status_counters() {
        let mut status = CaptureStatus::default();
        assert_eq!(status.next_index(), 0);
        assert_eq!(status.next_index(), 1);
        status.record(2);
        status.record(2);
        assert_eq!(status, CaptureStatus { index: 2, total_captures: 4 });
    }

    #[test]
    fn test_status_counters_saturate() {
        let mut status = CaptureStatus {
            index: u32::MAX,
            total_captures: u32::MAX - 1,
        };
        assert_eq!(status.next_index(), u32::MAX);
        status.record(usize::MAX);
        assert_eq!(status, CaptureStatus { index: u32::MAX, total_captures: u32::MAX });
    }

    #[tokio::test]
    async fn test_overlapping_captures_get_distinct_images() {
        let camera = MockCamera::new(options(1));
        let mut status = CaptureStatus::default();

        // Both requests leave before either result comes back
        let first = camera.clone().acquire(status.next_index());
        let second = camera.clone().acquire(status.next_index());
        let first = first.await.unwrap();
        let second = second.await.unwrap();

        assert_ne!(first[0].full_image, second[0].full_image);
        assert!(second[0].full_image.ends_with("capture-0_1.jpg"));
    }
}
