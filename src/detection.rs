use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One detected object instance: bounding box in source-media pixel
/// coordinates (`[x, y, width, height]`), predicted class and confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    #[serde(rename = "box")]
    pub bbox: [f32; 4],
    pub class_name: String,
    pub confidence: f32,
    /// Frame index the detection belongs to (video results only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame: Option<u32>,
}

impl Detection {
    #[must_use]
    pub fn new(bbox: [f32; 4], class_name: impl Into<String>, confidence: f32) -> Self {
        Self {
            bbox,
            class_name: class_name.into(),
            confidence,
            frame: None,
        }
    }

    /// Label text as rendered on the overlay: `"plastic 92%"`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} {}%", self.class_name, (self.confidence * 100.0).round() as i32)
    }
}

/// A complete detection run result as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub detections: Vec<Detection>,
    pub processing_time: f32,
    pub class_counts: HashMap<String, u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fps: Option<f32>,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResultInvariantError {
    #[error("processing_time is negative or not finite")]
    InvalidProcessingTime,

    #[error("confidence {confidence} for '{class_name}' outside [0, 1]")]
    ConfidenceOutOfRange { class_name: String, confidence: String },

    #[error("class_counts total {counted} does not match {detected} detections")]
    CountMismatch { counted: u64, detected: usize },

    #[error("class_counts key '{0}' has no matching detection")]
    UnknownClassCount(String),

    #[error("frame_count and fps must be present together")]
    PartialVideoMetadata,

    #[error("frame_count and fps must both be positive")]
    NonPositiveVideoMetadata,
}

impl DetectionResult {
    /// Checks the cross-field invariants the backend contract promises.
    ///
    /// Live payloads are validated before they are accepted; a mismatch fails
    /// the run rather than propagating inconsistent counts into the UI.
    pub fn validate(&self) -> Result<(), ResultInvariantError> {
        if !self.processing_time.is_finite() || self.processing_time < 0.0 {
            return Err(ResultInvariantError::InvalidProcessingTime);
        }

        for det in &self.detections {
            if !det.confidence.is_finite() || !(0.0..=1.0).contains(&det.confidence) {
                return Err(ResultInvariantError::ConfidenceOutOfRange {
                    class_name: det.class_name.clone(),
                    confidence: det.confidence.to_string(),
                });
            }
        }

        let counted: u64 = self.class_counts.values().map(|c| u64::from(*c)).sum();
        if counted != self.detections.len() as u64 {
            return Err(ResultInvariantError::CountMismatch {
                counted,
                detected: self.detections.len(),
            });
        }

        for key in self.class_counts.keys() {
            if !self.detections.iter().any(|d| &d.class_name == key) {
                return Err(ResultInvariantError::UnknownClassCount(key.clone()));
            }
        }

        match (self.frame_count, self.fps) {
            (None, None) => Ok(()),
            (Some(frames), Some(fps)) if frames > 0 && fps > 0.0 => Ok(()),
            (Some(_), Some(_)) => Err(ResultInvariantError::NonPositiveVideoMetadata),
            _ => Err(ResultInvariantError::PartialVideoMetadata),
        }
    }

    #[must_use]
    pub fn is_video(&self) -> bool {
        self.frame_count.is_some() && self.fps.is_some()
    }

    /// Tallies `detections` by class name. Used to build `class_counts` for
    /// mock results so they satisfy [`DetectionResult::validate`] by
    /// construction.
    #[must_use]
    pub fn tally_classes(detections: &[Detection]) -> HashMap<String, u32> {
        let mut counts = HashMap::new();
        for det in detections {
            *counts.entry(det.class_name.clone()).or_insert(0) += 1;
        }
        counts
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    #[default]
    Image,
    Video,
}

impl MediaType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
        }
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What kind of media a model accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    Image,
    Video,
    Both,
}

impl ModelKind {
    #[must_use]
    pub const fn accepts(self, media: MediaType) -> bool {
        matches!(
            (self, media),
            (Self::Image, MediaType::Image) | (Self::Video, MediaType::Video) | (Self::Both, _)
        )
    }

    /// MIME filter string handed to the shell's file picker.
    #[must_use]
    pub const fn accepted_mime_types(self) -> &'static str {
        match self {
            Self::Image => "image/*",
            Self::Video => "video/*",
            Self::Both => "image/*,video/*",
        }
    }

    /// The media type a single-kind model forces on upload, if any.
    #[must_use]
    pub const fn forced_media_type(self) -> Option<MediaType> {
        match self {
            Self::Image => Some(MediaType::Image),
            Self::Video => Some(MediaType::Video),
            Self::Both => None,
        }
    }
}

/// A catalog entry for a remotely-served detection model. The catalog is
/// static; entries are never mutated at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub kind: ModelKind,
    pub icon: &'static str,
}

pub const MODEL_CATALOG: &[ModelInfo] = &[
    ModelInfo {
        id: "yolo",
        name: "Waste Segmentation",
        description: "Detects and classifies waste in images",
        kind: ModelKind::Image,
        icon: "trash",
    },
    ModelInfo {
        id: "best2",
        name: "Drone Analysis",
        description: "Analyzes drone footage for objects and activities",
        kind: ModelKind::Video,
        icon: "drone",
    },
];

/// Looks a model up by id, falling back to the first catalog entry the way
/// the selector does when its selection is stale.
#[must_use]
pub fn model_by_id(id: &str) -> &'static ModelInfo {
    MODEL_CATALOG
        .iter()
        .find(|m| m.id == id)
        .unwrap_or(&MODEL_CATALOG[0])
}

/// Canned image result for exercising the interface without a backend.
#[must_use]
pub fn mock_image_result() -> DetectionResult {
    let detections = vec![
        Detection::new([50.0, 50.0, 200.0, 150.0], "plastic", 0.92),
        Detection::new([300.0, 100.0, 150.0, 200.0], "paper", 0.87),
        Detection::new([150.0, 300.0, 100.0, 100.0], "glass", 0.76),
    ];
    let class_counts = DetectionResult::tally_classes(&detections);
    DetectionResult {
        detections,
        processing_time: 0.45,
        class_counts,
        frame_count: None,
        fps: None,
    }
}

/// Canned video result with frame metadata for the playback controller.
#[must_use]
pub fn mock_video_result() -> DetectionResult {
    let detections = vec![
        Detection::new([100.0, 100.0, 200.0, 150.0], "drone", 0.95),
        Detection::new([400.0, 200.0, 100.0, 100.0], "person", 0.88),
        Detection::new([250.0, 350.0, 150.0, 100.0], "vehicle", 0.82),
    ];
    let class_counts = DetectionResult::tally_classes(&detections);
    DetectionResult {
        detections,
        processing_time: 2.3,
        class_counts,
        frame_count: Some(150),
        fps: Some(30.0),
    }
}
