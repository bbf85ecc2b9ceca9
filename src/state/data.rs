//! Shared data structures for the capture session
//!
//! These structs represent the data model that flows between
//! the session and the UI layer.

use serde::{Deserialize, Serialize};

/// Represents a single captured image and its processing variants
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ImageRecord {
    /// Reference to the full-resolution capture
    pub full_image: String,
    /// Reference to the thumbnail shown in the strip
    pub thumb_image: String,
    /// Post-processed version (None until the image has been fixed)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_image: Option<String>,
}

impl ImageRecord {
    pub fn new(full_image: impl Into<String>, thumb_image: impl Into<String>) -> Self {
        Self {
            full_image: full_image.into(),
            thumb_image: thumb_image.into(),
            fixed_image: None,
        }
    }

    /// Builder-style helper for records that arrive already fixed
    pub fn with_fixed(mut self, fixed_image: impl Into<String>) -> Self {
        self.fixed_image = Some(fixed_image.into());
        self
    }

    /// Whether a post-processed version exists
    pub fn is_fixed(&self) -> bool {
        self.fixed_image.is_some()
    }
}

/// Which version of the selected image the preview pane shows
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PreviewMode {
    /// Show the fixed version when there is one
    #[default]
    PreferFixed,
    /// Always show the original; "compare" swaps in the fixed version
    Original,
}

/// Read-only projection of the session used for rendering decisions
#[derive(Serialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    /// Image to show in the preview pane
    pub preview_image: Option<String>,
    /// The other version of the selected image, when it has been fixed
    pub compare_image: Option<String>,
    /// Index of the record carrying the delete button
    pub delete_affordance: Option<usize>,
    pub fix_enabled: bool,
    pub compare_enabled: bool,
}

impl ViewState {
    /// Number of delete buttons the view should render (0 or 1)
    pub fn delete_affordance_count(&self) -> usize {
        usize::from(self.delete_affordance.is_some())
    }
}

/// Everything a view needs to redraw after a mutation
#[derive(Serialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub records: Vec<ImageRecord>,
    pub selected: Option<usize>,
    pub view: ViewState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_fixed_follows_fixed_image() {
        let record = ImageRecord::new("Image0.jpg", "Image0-thumb.jpg");
        assert!(!record.is_fixed());

        let record = record.with_fixed("Image0-fixed.jpg");
        assert!(record.is_fixed());
    }

    #[test]
    fn test_camel_case_keys() {
        let json = r#"{
            "fullImage": "capturedImages/Image0.jpg",
            "thumbImage": "capturedImages/Image0-thumb.jpg"
        }"#;

        let record: ImageRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.full_image, "capturedImages/Image0.jpg");
        assert_eq!(record.thumb_image, "capturedImages/Image0-thumb.jpg");
        assert!(!record.is_fixed());

        // Unfixed records don't carry a fixedImage key at all
        let out = serde_json::to_string(&record).unwrap();
        assert!(!out.contains("fixedImage"));
    }

    #[test]
    fn test_delete_affordance_count() {
        let mut view = ViewState::default();
        assert_eq!(view.delete_affordance_count(), 0);

        view.delete_affordance = Some(3);
        assert_eq!(view.delete_affordance_count(), 1);
    }
}
