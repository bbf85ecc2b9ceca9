use iced::{Element, Task, Theme};
use rfd::FileDialog;
use std::path::PathBuf;
use std::time::Duration;
use chrono::Local;

use decapod_capture::capture::{CaptureStatus, Fixer, ImageSource, MockCamera, MockFixer, SourceError};
use decapod_capture::state::config::{self, CaptureConfig};
use decapod_capture::state::data::{ImageRecord, PreviewMode, Snapshot};
use decapod_capture::state::session::{CaptureSession, LatestSnapshot, LogSink};

mod ui;

/// Simulated post-processing time for "Fix Image"
const FIX_DELAY: Duration = Duration::from_millis(400);

/// Main application state
struct CaptureApp {
    /// The working set of captured images
    session: CaptureSession,
    camera: MockCamera,
    fixer: MockFixer,
    /// Capture counters for filename generation
    status: CaptureStatus,
    /// Whether the preview currently shows the other version of the image
    comparing: bool,
    /// Status line shown under the thumbnails
    message: String,
    /// Refreshes pushed by the session, drained after each update
    latest: LatestSnapshot,
    /// What the view renders
    snapshot: Snapshot,
}

/// Application messages (events)
#[derive(Debug, Clone)]
enum Message {
    /// User clicked "Take Picture"
    TakePicture,
    /// Camera finished (or gave up) the capture with this index
    Captured {
        index: u32,
        result: Result<Vec<ImageRecord>, SourceError>,
    },
    /// User clicked a thumbnail
    Select(usize),
    /// User clicked the delete button on the selected thumbnail
    Delete,
    /// User clicked "Fix Image"
    Fix,
    /// Fixer finished for the image at `full_image`
    Fixed {
        full_image: String,
        result: Result<String, SourceError>,
    },
    /// User toggled "Compare Before/After"
    Compare,
    /// User switched between previewing the fixed and the original version
    TogglePreviewMode,
    /// User clicked "Open Folder"
    OpenFolder,
}

impl CaptureApp {
    fn new() -> (Self, Task<Message>) {
        let path = std::env::args()
            .nth(1)
            .map(PathBuf::from)
            .unwrap_or_else(CaptureConfig::default_path);

        let config = CaptureConfig::load(&path).unwrap_or_else(|e| {
            log::warn!("ignoring capture configuration: {}", e);
            CaptureConfig::default()
        });

        let camera = MockCamera::new(config.camera.clone());
        let latest = LatestSnapshot::new();
        let session = Self::open_session(CaptureSession::from_config(config), &latest);
        log::info!("capture session started with {} images", session.len());

        let message = format!("Ready. {} images in session.", session.len());
        // A new session emits nothing until its first mutation
        let snapshot = session.snapshot();

        (
            CaptureApp {
                latest,
                snapshot,
                session,
                camera,
                fixer: MockFixer::new(FIX_DELAY),
                status: CaptureStatus::default(),
                comparing: false,
                message,
            },
            Task::none(),
        )
    }

    fn open_session(mut session: CaptureSession, latest: &LatestSnapshot) -> CaptureSession {
        session.subscribe("log", LogSink);
        session.subscribe("view", latest.clone());
        session
    }

    fn set_message(&mut self, message: impl AsRef<str>) {
        self.message = format!("[{}] {}", Local::now().format("%H:%M:%S"), message.as_ref());
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        let task = self.apply(message);
        if let Some(snapshot) = self.latest.take() {
            self.snapshot = snapshot;
        }
        task
    }

    fn apply(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::TakePicture => {
                let index = self.status.next_index();
                self.set_message("Taking picture...");
                return Task::perform(
                    self.camera.clone().acquire(index),
                    move |result| Message::Captured { index, result },
                );
            }
            Message::Captured { index, result: Ok(records) } => {
                log::debug!("capture {} returned {} images", index, records.len());
                self.status.record(records.len());
                for record in records {
                    self.session.add_record(record);
                }
                self.comparing = false;
                self.set_message(format!(
                    "Captured. {} pictures taken, {} images in session.",
                    self.status.total_captures,
                    self.session.len()
                ));
            }
            Message::Captured { index, result: Err(e) } => {
                log::warn!("capture {}: {}", index, e);
                self.set_message(e.to_string());
            }
            Message::Select(index) => {
                if self.session.selected_index() != Some(index) {
                    self.comparing = false;
                }
                if let Err(e) = self.session.select_index(index) {
                    log::error!("select: {}", e);
                }
            }
            Message::Delete => match self.session.delete_selected() {
                Ok(removed) => {
                    self.comparing = false;
                    self.set_message(format!("Deleted {}", removed.full_image));
                }
                Err(e) => log::error!("delete: {}", e),
            },
            Message::Fix => {
                if let Some(record) = self.session.selected_record() {
                    let full_image = record.full_image.clone();
                    self.set_message("Fixing image...");
                    return Task::perform(
                        self.fixer.clone().fix(full_image.clone()),
                        move |result| Message::Fixed { full_image: full_image.clone(), result },
                    );
                }
            }
            Message::Fixed { full_image, result } => match result {
                // Positions shift on delete, so make sure the fixed image still belongs
                // to the selection before attaching it
                Ok(fixed) => {
                    let still_selected = self
                        .session
                        .selected_record()
                        .is_some_and(|r| r.full_image == full_image);
                    if still_selected {
                        if let Err(e) = self.session.mark_fixed(fixed) {
                            log::error!("mark fixed: {}", e);
                        }
                        self.set_message("Image fixed.");
                    } else {
                        log::warn!("selection changed while fixing {}, result dropped", full_image);
                    }
                }
                Err(e) => {
                    log::warn!("{}", e);
                    self.set_message(e.to_string());
                }
            },
            Message::Compare => {
                if self.session.view_state().compare_enabled {
                    self.comparing = !self.comparing;
                }
            }
            Message::TogglePreviewMode => {
                let mode = match self.session.preview_mode() {
                    PreviewMode::PreferFixed => PreviewMode::Original,
                    PreviewMode::Original => PreviewMode::PreferFixed,
                };
                self.session.set_preview_mode(mode);
                self.comparing = false;
            }
            Message::OpenFolder => {
                let folder = FileDialog::new()
                    .set_title("Select Folder with Captured Images")
                    .pick_folder();

                if let Some(folder_path) = folder {
                    let records = config::records_from_dir(&folder_path);
                    let mode = self.session.preview_mode();
                    self.session =
                        Self::open_session(CaptureSession::new(records, mode), &self.latest);
                    self.snapshot = self.session.snapshot();
                    self.comparing = false;
                    self.set_message(format!(
                        "Opened {} ({} images)",
                        folder_path.display(),
                        self.session.len()
                    ));
                }
            }
        }

        Task::none()
    }

    /// Build the user interface
    fn view(&self) -> Element<Message> {
        ui::thumbs::view(
            &self.snapshot,
            self.session.preview_mode(),
            self.comparing,
            &self.message,
        )
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

fn main() -> iced::Result {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    iced::application(
        "Decapod Capture",
        CaptureApp::update,
        CaptureApp::view,
    )
    .theme(CaptureApp::theme)
    .centered()
    .run_with(CaptureApp::new)
}

