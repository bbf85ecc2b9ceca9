//! The capture session: an ordered set of image records with a single selection.
//!
//! A record's position is its identity. Every successful mutation hands a fresh
//! `Snapshot` to the subscribed render sinks; a failed call changes nothing and
//! notifies no one.

use std::cell::RefCell;
use std::rc::Rc;
use thiserror::Error;

use super::config::CaptureConfig;
use super::data::{ImageRecord, PreviewMode, Snapshot, ViewState};

/// Errors raised by session operations.
///
/// Both indicate a caller bug rather than a transient condition.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("index {index} is out of range for {len} images")]
    OutOfRange { index: usize, len: usize },
    #[error("no image is selected")]
    EmptyModel,
}

/// Receives a snapshot after every successful mutation
pub trait RenderSink {
    fn refresh(&mut self, snapshot: &Snapshot);
}

impl<F> RenderSink for F
where
    F: FnMut(&Snapshot),
{
    fn refresh(&mut self, snapshot: &Snapshot) {
        self(snapshot)
    }
}

/// Sink that only logs what changed
#[derive(Debug, Default)]
pub struct LogSink;

impl RenderSink for LogSink {
    fn refresh(&mut self, snapshot: &Snapshot) {
        log::debug!(
            "refresh: {} images, selected {:?}, delete buttons={}, fix={} compare={}",
            snapshot.records.len(),
            snapshot.selected,
            snapshot.view.delete_affordance_count(),
            snapshot.view.fix_enabled,
            snapshot.view.compare_enabled,
        );
    }
}

/// Shared slot holding the most recent snapshot a session pushed.
///
/// Clones share the slot: subscribe one clone and drain another with `take`.
#[derive(Debug, Clone, Default)]
pub struct LatestSnapshot(Rc<RefCell<Option<Snapshot>>>);

impl LatestSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the pending snapshot, if a refresh arrived since the last call
    pub fn take(&self) -> Option<Snapshot> {
        self.0.borrow_mut().take()
    }
}

impl RenderSink for LatestSnapshot {
    fn refresh(&mut self, snapshot: &Snapshot) {
        *self.0.borrow_mut() = Some(snapshot.clone());
    }
}

pub struct CaptureSession {
    records: Vec<ImageRecord>,
    selected: Option<usize>,
    preview_mode: PreviewMode,
    sinks: Vec<(String, Box<dyn RenderSink>)>,
}

impl CaptureSession {
    /// Create a session over the initial records.
    ///
    /// The most recent (last) image starts out selected.
    pub fn new(records: Vec<ImageRecord>, preview_mode: PreviewMode) -> Self {
        let selected = records.len().checked_sub(1);
        Self {
            records,
            selected,
            preview_mode,
            sinks: Vec::new(),
        }
    }

    pub fn from_config(config: CaptureConfig) -> Self {
        Self::new(config.records, config.preview_mode)
    }

    pub fn records(&self) -> &[ImageRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_record(&self) -> Option<&ImageRecord> {
        self.selected.and_then(|i| self.records.get(i))
    }

    pub fn preview_mode(&self) -> PreviewMode {
        self.preview_mode
    }

    /// Register a sink under `name`, replacing any sink already using that name
    pub fn subscribe(&mut self, name: impl Into<String>, sink: impl RenderSink + 'static) {
        let name = name.into();
        let sink: Box<dyn RenderSink> = Box::new(sink);
        match self.sinks.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = sink,
            None => self.sinks.push((name, sink)),
        }
    }

    /// Remove the sink registered under `name`. Returns false if there was none.
    pub fn unsubscribe(&mut self, name: &str) -> bool {
        let before = self.sinks.len();
        self.sinks.retain(|(n, _)| n != name);
        self.sinks.len() != before
    }

    /// Append a newly captured image and select it
    pub fn add_record(&mut self, record: ImageRecord) {
        log::debug!("adding image {}", record.full_image);
        self.records.push(record);
        self.selected = Some(self.records.len() - 1);
        self.notify();
    }

    pub fn select_index(&mut self, index: usize) -> Result<(), CaptureError> {
        if index >= self.records.len() {
            return Err(CaptureError::OutOfRange {
                index,
                len: self.records.len(),
            });
        }
        if self.selected == Some(index) {
            return Ok(());
        }

        self.selected = Some(index);
        self.notify();
        Ok(())
    }

    /// Remove the selected image and return it.
    ///
    /// The selection stays on the same index (now the following image) unless
    /// the last image was removed, in which case the new last image is selected.
    pub fn delete_selected(&mut self) -> Result<ImageRecord, CaptureError> {
        let index = match self.selected {
            Some(i) if i < self.records.len() => i,
            _ => return Err(CaptureError::EmptyModel),
        };

        let removed = self.records.remove(index);
        self.selected = if self.records.is_empty() {
            None
        } else {
            Some(index.min(self.records.len() - 1))
        };

        log::debug!("deleted image {} at {}", removed.full_image, index);
        self.notify();
        Ok(removed)
    }

    /// Attach a post-processed version to the selected image, replacing any earlier one
    pub fn mark_fixed(&mut self, fixed_image: impl Into<String>) -> Result<(), CaptureError> {
        let record = self
            .selected
            .and_then(|i| self.records.get_mut(i))
            .ok_or(CaptureError::EmptyModel)?;

        record.fixed_image = Some(fixed_image.into());
        self.notify();
        Ok(())
    }

    pub fn set_preview_mode(&mut self, mode: PreviewMode) {
        if self.preview_mode != mode {
            self.preview_mode = mode;
            self.notify();
        }
    }

    pub fn view_state(&self) -> ViewState {
        let Some(record) = self.selected_record() else {
            return ViewState::default();
        };

        let (preview_image, compare_image) = match (&record.fixed_image, self.preview_mode) {
            (Some(fixed), PreviewMode::PreferFixed) => {
                (fixed.clone(), Some(record.full_image.clone()))
            }
            (Some(fixed), PreviewMode::Original) => {
                (record.full_image.clone(), Some(fixed.clone()))
            }
            (None, _) => (record.full_image.clone(), None),
        };

        ViewState {
            preview_image: Some(preview_image),
            compare_image,
            delete_affordance: self.selected,
            fix_enabled: !record.is_fixed(),
            compare_enabled: record.is_fixed(),
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            records: self.records.clone(),
            selected: self.selected,
            view: self.view_state(),
        }
    }

    fn notify(&mut self) {
        if self.sinks.is_empty() {
            return;
        }
        let snapshot = self.snapshot();
        for (_, sink) in self.sinks.iter_mut() {
            sink.refresh(&snapshot);
        }
    }
}

impl Default for CaptureSession {
    fn default() -> Self {
        Self::new(Vec::new(), PreviewMode::default())
    }
}

// Sinks are opaque closures, so only the model is shown
impl std::fmt::Debug for CaptureSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureSession")
            .field("records", &self.records)
            .field("selected", &self.selected)
            .field("preview_mode", &self.preview_mode)
            .field("sinks", &self.sinks.len())
            .finish()
    }
}
