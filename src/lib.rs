#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::too_many_lines)]

pub mod capabilities;
pub mod detection;
pub mod history;
pub mod overlay;
pub mod playback;

use serde::{Deserialize, Serialize};

pub use app::App;
pub use capabilities::{Capabilities, Effect};
pub use crux_core::{render::Render, App as CruxApp};

use capabilities::{HttpError, HttpResult, MultipartForm, ValidatedUrl};
use detection::{DetectionResult, MediaType, ModelInfo, ModelKind, MODEL_CATALOG};
use history::{HistoryItem, HistoryStore};
use playback::PlaybackController;

pub const DEFAULT_API_URL: &str = "http://localhost:5000/detect";
pub const MOCK_DELAY_MS: u64 = 1500;
pub const DEFAULT_CONFIDENCE: f32 = 0.25;
pub const MAX_FILE_NAME_LENGTH: usize = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Network,
    Timeout,
    Validation,
    Deserialization,
    Upload,
    InvalidState,
    Internal,
    Unknown,
}

impl ErrorKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Network => "NETWORK_ERROR",
            Self::Timeout => "TIMEOUT",
            Self::Validation => "VALIDATION_ERROR",
            Self::Deserialization => "DESERIALIZATION_ERROR",
            Self::Upload => "UPLOAD_ERROR",
            Self::InvalidState => "INVALID_STATE",
            Self::Internal => "INTERNAL_ERROR",
            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::Network | Self::Timeout | Self::Upload)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppError {
    pub kind: ErrorKind,
    pub message: String,
    pub internal_message: Option<String>,
}

impl AppError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            internal_message: None,
        }
    }

    #[must_use]
    pub fn with_internal(mut self, internal: impl Into<String>) -> Self {
        self.internal_message = Some(internal.into());
        self
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }

    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    /// Message shown to the user. Validation and upload errors surface their
    /// own text; the rest get a generic phrase per kind.
    #[must_use]
    pub fn user_facing_message(&self) -> String {
        match self.kind {
            ErrorKind::Network => {
                "Unable to reach the detection service. Check that the backend is running and try again."
                    .into()
            }
            ErrorKind::Timeout => "The request timed out. Please try again.".into(),
            ErrorKind::Validation | ErrorKind::Upload | ErrorKind::Deserialization => {
                self.message.clone()
            }
            ErrorKind::InvalidState => {
                "The dashboard is in an unexpected state. Please reload the page.".into()
            }
            ErrorKind::Internal | ErrorKind::Unknown => {
                "An unexpected error occurred. Please try again.".into()
            }
        }
    }
}

impl From<HttpError> for AppError {
    fn from(e: HttpError) -> Self {
        let kind = match &e {
            HttpError::Timeout => ErrorKind::Timeout,
            HttpError::Connection { .. } => ErrorKind::Network,
            HttpError::InvalidResponse { .. } => ErrorKind::Deserialization,
            HttpError::InvalidUrl { .. }
            | HttpError::InvalidHeader { .. }
            | HttpError::BodyTooLarge { .. }
            | HttpError::InvalidRequest { .. } => ErrorKind::Validation,
        };
        AppError::new(kind, e.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code(), self.message)?;
        if let Some(internal) = &self.internal_message {
            write!(f, " (internal: {internal})")?;
        }
        Ok(())
    }
}

impl std::error::Error for AppError {}

#[must_use]
pub fn get_current_time_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Where a detection run currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum RunPhase {
    #[default]
    Idle,
    Processing,
    Complete,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Tab {
    #[default]
    Upload,
    History,
    Settings,
}

/// A file the user has picked but not necessarily submitted yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagedMedia {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug)]
pub struct Model {
    pub phase: RunPhase,
    pub active_tab: Tab,
    pub staged_media: Option<StagedMedia>,
    pub media_type: MediaType,
    pub results: Option<DetectionResult>,
    pub history: HistoryStore,
    pub selected_history_id: Option<String>,
    pub playback: PlaybackController,
    pub selected_model_id: String,
    pub confidence: f32,
    pub use_mock_data: bool,
    pub api_url: String,
    pub active_error: Option<AppError>,
    /// Monotonic run counter. Responses carry the value they were issued
    /// with; anything older than the current value is discarded.
    pub run_seq: u64,
    pub view_timestamp_ms: u64,
}

impl Default for Model {
    fn default() -> Self {
        Self {
            phase: RunPhase::Idle,
            active_tab: Tab::Upload,
            staged_media: None,
            media_type: MediaType::Image,
            results: None,
            history: HistoryStore::new(),
            selected_history_id: None,
            playback: PlaybackController::for_result_fps(None),
            selected_model_id: MODEL_CATALOG[0].id.to_string(),
            confidence: DEFAULT_CONFIDENCE,
            use_mock_data: false,
            api_url: DEFAULT_API_URL.to_string(),
            active_error: None,
            run_seq: 0,
            view_timestamp_ms: get_current_time_ms(),
        }
    }
}

impl Model {
    pub fn update_timestamp(&mut self) {
        self.view_timestamp_ms = get_current_time_ms();
    }

    pub fn set_error(&mut self, error: AppError) {
        self.active_error = Some(error);
    }

    pub fn clear_error(&mut self) {
        self.active_error = None;
    }

    #[must_use]
    pub fn selected_model(&self) -> &'static ModelInfo {
        detection::model_by_id(&self.selected_model_id)
    }

    #[must_use]
    pub fn is_processing(&self) -> bool {
        self.phase == RunPhase::Processing
    }

    /// Drops everything tied to the current run: staged file, results,
    /// error, and playback position. History survives.
    pub fn reset_run_state(&mut self) {
        self.phase = RunPhase::Idle;
        self.staged_media = None;
        self.results = None;
        self.active_error = None;
        self.playback = PlaybackController::for_result_fps(None);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    Noop,

    MediaSelected {
        file_name: String,
        mime_type: String,
        bytes: Vec<u8>,
    },
    MediaCleared,

    ModelSelected {
        model_id: String,
    },
    ConfidenceSet {
        value: f32,
    },

    DetectRequested,
    MockDelayElapsed {
        run: u64,
    },
    DetectionResponse {
        run: u64,
        result: Box<HttpResult>,
    },

    DismissError,
    MockModeSet {
        enabled: bool,
    },
    ApiUrlSet {
        url: String,
    },
    ApiUrlReset,
    TabSelected {
        tab: Tab,
    },

    HistoryItemSelected {
        id: String,
    },
    HistoryDetailClosed,

    VideoMetadataLoaded {
        duration_seconds: f64,
    },
    SeekRequested {
        frame: u32,
    },
    SkipForwardRequested,
    SkipBackwardRequested,
    TogglePlayRequested,
    PlaybackStateChanged {
        playing: bool,
    },
    PlaybackTimeUpdated {
        seconds: f64,
    },
    PlaybackEnded,
}

impl Event {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Noop => "noop",
            Self::MediaSelected { .. } => "media_selected",
            Self::MediaCleared => "media_cleared",
            Self::ModelSelected { .. } => "model_selected",
            Self::ConfidenceSet { .. } => "confidence_set",
            Self::DetectRequested => "detect_requested",
            Self::MockDelayElapsed { .. } => "mock_delay_elapsed",
            Self::DetectionResponse { .. } => "detection_response",
            Self::DismissError => "dismiss_error",
            Self::MockModeSet { .. } => "mock_mode_set",
            Self::ApiUrlSet { .. } => "api_url_set",
            Self::ApiUrlReset => "api_url_reset",
            Self::TabSelected { .. } => "tab_selected",
            Self::HistoryItemSelected { .. } => "history_item_selected",
            Self::HistoryDetailClosed => "history_detail_closed",
            Self::VideoMetadataLoaded { .. } => "video_metadata_loaded",
            Self::SeekRequested { .. } => "seek_requested",
            Self::SkipForwardRequested => "skip_forward_requested",
            Self::SkipBackwardRequested => "skip_backward_requested",
            Self::TogglePlayRequested => "toggle_play_requested",
            Self::PlaybackStateChanged { .. } => "playback_state_changed",
            Self::PlaybackTimeUpdated { .. } => "playback_time_updated",
            Self::PlaybackEnded => "playback_ended",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionView {
    pub class_name: String,
    pub confidence: f32,
    pub bbox: [f32; 4],
    pub label: String,
    pub color: String,
    pub frame: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassCountView {
    pub class_name: String,
    pub count: u32,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultsView {
    pub detections: Vec<DetectionView>,
    pub detection_count: usize,
    pub processing_time: f32,
    pub class_counts: Vec<ClassCountView>,
    pub is_video: bool,
    pub frame_count: Option<u32>,
    pub fps: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackView {
    pub current_frame: u32,
    pub total_frames: u32,
    pub is_playing: bool,
    pub fps: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaView {
    pub file_name: String,
    pub mime_type: String,
    pub media_type: MediaType,
    pub size_bytes: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryItemView {
    pub id: String,
    pub media: String,
    pub media_type: MediaType,
    pub timestamp_ms: u64,
    pub detection_count: usize,
    pub model_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryDetailView {
    pub item: HistoryItemView,
    pub results: ResultsView,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub kind: ModelKind,
    pub icon: String,
    pub accepted_mime_types: String,
}

impl From<&ModelInfo> for ModelView {
    fn from(info: &ModelInfo) -> Self {
        Self {
            id: info.id.to_string(),
            name: info.name.to_string(),
            description: info.description.to_string(),
            kind: info.kind,
            icon: info.icon.to_string(),
            accepted_mime_types: info.kind.accepted_mime_types().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorView {
    pub code: String,
    pub message: String,
    pub is_retryable: bool,
}

impl From<&AppError> for ErrorView {
    fn from(e: &AppError) -> Self {
        Self {
            code: e.code().to_string(),
            message: e.user_facing_message(),
            is_retryable: e.is_retryable(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewModel {
    pub phase: RunPhase,
    pub active_tab: Tab,
    pub can_detect: bool,
    pub media: Option<MediaView>,
    pub results: Option<ResultsView>,
    pub playback: Option<PlaybackView>,
    pub history: Vec<HistoryItemView>,
    pub selected_history: Option<HistoryDetailView>,
    pub models: Vec<ModelView>,
    pub selected_model_id: String,
    pub confidence: f32,
    pub use_mock_data: bool,
    pub api_url: String,
    pub error: Option<ErrorView>,
}

pub mod app {
    use super::{
        detection, AppError, Capabilities, ClassCountView, DetectionResult, DetectionView,
        ErrorKind, Event, HistoryDetailView, HistoryItem, HistoryItemView, HistoryStore,
        MediaType, MediaView, Model, ModelView, MultipartForm, PlaybackController, PlaybackView,
        ResultsView, RunPhase, Tab, ValidatedUrl, ViewModel, DEFAULT_API_URL, MOCK_DELAY_MS,
        MODEL_CATALOG,
    };
    use tracing::{debug, warn};

    #[derive(Default)]
    pub struct App;

    impl App {
        fn start_run(model: &mut Model, caps: &Capabilities) {
            if model.staged_media.is_none() {
                model.set_error(AppError::new(
                    ErrorKind::Validation,
                    "Please select a file first",
                ));
                caps.render().render();
                return;
            }

            model.run_seq += 1;
            let run = model.run_seq;
            model.phase = RunPhase::Processing;
            model.results = None;
            model.clear_error();
            model.playback = PlaybackController::for_result_fps(None);

            if model.use_mock_data {
                debug!(run, "starting mock detection run");
                caps.time()
                    .delay_ms(MOCK_DELAY_MS, move |_| Event::MockDelayElapsed { run });
            } else if let Some(media) = model.staged_media.as_ref() {
                debug!(run, url = %model.api_url, "starting live detection run");
                let form = MultipartForm::new()
                    .file("file", &media.file_name, &media.mime_type, &media.bytes)
                    .text("model", &model.selected_model_id)
                    .text("media_type", model.media_type.as_str())
                    .text("confidence", &model.confidence.to_string());

                caps.http()
                    .post(model.api_url.clone())
                    .multipart(form)
                    .send(move |result| Event::DetectionResponse {
                        run,
                        result: Box::new(result),
                    });
            }

            caps.render().render();
        }

        /// Stale-run guard. A response belongs to the run it was issued for;
        /// anything else raced a clear or a newer submission and is dropped.
        fn is_current_run(model: &Model, run: u64) -> bool {
            run == model.run_seq && model.phase == RunPhase::Processing
        }

        fn complete_run(model: &mut Model, caps: &Capabilities, results: DetectionResult) {
            if results.is_video() {
                model.playback =
                    PlaybackController::for_result(results.fps, results.frame_count);
            }

            let media_name = model
                .staged_media
                .as_ref()
                .map_or_else(String::new, |m| m.file_name.clone());

            model.history.append(HistoryItem::new(
                media_name,
                model.media_type,
                model.view_timestamp_ms,
                results.clone(),
                model.selected_model_id.clone(),
            ));

            debug!(
                detections = results.detections.len(),
                history_len = model.history.len(),
                "detection run complete"
            );

            model.results = Some(results);
            model.phase = RunPhase::Complete;
            caps.render().render();
        }

        fn fail_run(model: &mut Model, caps: &Capabilities, error: AppError) {
            warn!(code = error.code(), message = %error.message, "detection run failed");
            model.phase = RunPhase::Failed;
            model.set_error(error);
            caps.render().render();
        }

        fn build_results_view(results: &DetectionResult) -> ResultsView {
            let detections = results
                .detections
                .iter()
                .map(|d| DetectionView {
                    class_name: d.class_name.clone(),
                    confidence: d.confidence,
                    bbox: d.bbox,
                    label: d.label(),
                    color: crate::overlay::class_color_hex(&d.class_name),
                    frame: d.frame,
                })
                .collect();

            let mut class_counts: Vec<ClassCountView> = results
                .class_counts
                .iter()
                .map(|(name, count)| ClassCountView {
                    class_name: name.clone(),
                    count: *count,
                    color: crate::overlay::class_color_hex(name),
                })
                .collect();
            // HashMap order is arbitrary; sort for a stable summary.
            class_counts.sort_by(|a, b| {
                b.count
                    .cmp(&a.count)
                    .then_with(|| a.class_name.cmp(&b.class_name))
            });

            ResultsView {
                detection_count: results.detections.len(),
                detections,
                processing_time: results.processing_time,
                class_counts,
                is_video: results.is_video(),
                frame_count: results.frame_count,
                fps: results.fps,
            }
        }

        fn build_history_item_view(item: &HistoryItem) -> HistoryItemView {
            HistoryItemView {
                id: item.id.clone(),
                media: item.media.clone(),
                media_type: item.media_type,
                timestamp_ms: item.timestamp_ms,
                detection_count: item.results.detections.len(),
                model_name: detection::model_by_id(&item.model_id).name.to_string(),
            }
        }

        fn build_history_views(history: &HistoryStore) -> Vec<HistoryItemView> {
            history.items().map(Self::build_history_item_view).collect()
        }
    }

    impl crux_core::App for App {
        type Event = Event;
        type Model = Model;
        type ViewModel = ViewModel;
        type Capabilities = Capabilities;

        fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
            model.update_timestamp();
            debug!(event = event.name(), "handling event");

            match event {
                Event::Noop => {}

                Event::MediaSelected {
                    file_name,
                    mime_type,
                    bytes,
                } => {
                    // Accepted from any state. Staging during an active run
                    // resets the phase, so the in-flight response fails the
                    // stale-run check and is discarded.
                    let inferred = if mime_type.starts_with("image/") {
                        Some(MediaType::Image)
                    } else if mime_type.starts_with("video/") {
                        Some(MediaType::Video)
                    } else {
                        None
                    };

                    let model_info = model.selected_model();
                    match inferred {
                        Some(media_type) if model_info.kind.accepts(media_type) => {
                            model.reset_run_state();
                            model.media_type = media_type;

                            let mut file_name = file_name;
                            if file_name.len() > super::MAX_FILE_NAME_LENGTH {
                                let mut end = super::MAX_FILE_NAME_LENGTH;
                                while !file_name.is_char_boundary(end) {
                                    end -= 1;
                                }
                                file_name.truncate(end);
                            }
                            model.staged_media = Some(super::StagedMedia {
                                file_name,
                                mime_type,
                                bytes,
                            });
                        }
                        Some(media_type) => {
                            model.set_error(AppError::new(
                                ErrorKind::Validation,
                                format!(
                                    "The {} model does not accept {} files",
                                    model_info.name, media_type
                                ),
                            ));
                        }
                        None => {
                            model.set_error(AppError::new(
                                ErrorKind::Validation,
                                format!("Unsupported file type: {mime_type}"),
                            ));
                        }
                    }

                    caps.render().render();
                }

                Event::MediaCleared => {
                    model.reset_run_state();
                    caps.render().render();
                }

                Event::ModelSelected { model_id } => {
                    if model_id == model.selected_model_id {
                        return;
                    }

                    model.selected_model_id = detection::model_by_id(&model_id).id.to_string();
                    // Switching models invalidates the staged file and any
                    // results it produced.
                    model.reset_run_state();
                    if let Some(forced) = model.selected_model().kind.forced_media_type() {
                        model.media_type = forced;
                    }

                    caps.render().render();
                }

                Event::ConfidenceSet { value } => {
                    if value.is_finite() {
                        model.confidence = value.clamp(0.0, 1.0);
                    }
                    caps.render().render();
                }

                Event::DetectRequested => {
                    if model.is_processing() {
                        debug!("detection already in progress");
                        return;
                    }
                    Self::start_run(model, caps);
                }

                Event::MockDelayElapsed { run } => {
                    if !Self::is_current_run(model, run) {
                        debug!(run, current = model.run_seq, "discarding stale mock result");
                        return;
                    }

                    let results = match model.media_type {
                        MediaType::Image => detection::mock_image_result(),
                        MediaType::Video => detection::mock_video_result(),
                    };
                    Self::complete_run(model, caps, results);
                }

                Event::DetectionResponse { run, result } => {
                    if !Self::is_current_run(model, run) {
                        debug!(run, current = model.run_seq, "discarding stale response");
                        return;
                    }

                    match *result {
                        Err(e) => Self::fail_run(model, caps, AppError::from(e)),
                        Ok(response) if !response.is_success() => {
                            let error = AppError::new(
                                ErrorKind::Upload,
                                format!(
                                    "Server responded with status {}: {}",
                                    response.status(),
                                    response.body_text()
                                ),
                            );
                            Self::fail_run(model, caps, error);
                        }
                        Ok(response) => match response.json::<DetectionResult>() {
                            Err(e) => Self::fail_run(
                                model,
                                caps,
                                AppError::new(
                                    ErrorKind::Deserialization,
                                    "The detection service returned an unreadable response",
                                )
                                .with_internal(e.to_string()),
                            ),
                            Ok(results) => match results.validate() {
                                Ok(()) => Self::complete_run(model, caps, results),
                                Err(e) => Self::fail_run(
                                    model,
                                    caps,
                                    AppError::new(
                                        ErrorKind::Deserialization,
                                        "The detection service returned inconsistent results",
                                    )
                                    .with_internal(e.to_string()),
                                ),
                            },
                        },
                    }
                }

                Event::DismissError => {
                    model.clear_error();
                    if model.phase == RunPhase::Failed {
                        model.phase = RunPhase::Idle;
                    }
                    caps.render().render();
                }

                Event::MockModeSet { enabled } => {
                    model.use_mock_data = enabled;
                    caps.render().render();
                }

                Event::ApiUrlSet { url } => {
                    match ValidatedUrl::new(url) {
                        Ok(valid) => model.api_url = valid.as_str().to_string(),
                        Err(e) => model.set_error(AppError::new(ErrorKind::Validation, e.to_string())),
                    }
                    caps.render().render();
                }

                Event::ApiUrlReset => {
                    model.api_url = DEFAULT_API_URL.to_string();
                    caps.render().render();
                }

                Event::TabSelected { tab } => {
                    model.active_tab = tab;
                    if tab != Tab::History {
                        model.selected_history_id = None;
                    }
                    caps.render().render();
                }

                Event::HistoryItemSelected { id } => {
                    if model.history.get(&id).is_some() {
                        model.selected_history_id = Some(id);
                    } else {
                        warn!(%id, "selected history item does not exist");
                    }
                    caps.render().render();
                }

                Event::HistoryDetailClosed => {
                    model.selected_history_id = None;
                    caps.render().render();
                }

                Event::VideoMetadataLoaded { duration_seconds } => {
                    model.playback.on_metadata(duration_seconds);
                    caps.render().render();
                }

                Event::SeekRequested { frame } => {
                    let seconds = model.playback.seek(frame);
                    caps.player().seek_to(seconds);
                    caps.render().render();
                }

                Event::SkipForwardRequested => {
                    let seconds = model.playback.skip_forward();
                    caps.player().seek_to(seconds);
                    caps.render().render();
                }

                Event::SkipBackwardRequested => {
                    let seconds = model.playback.skip_backward();
                    caps.player().seek_to(seconds);
                    caps.render().render();
                }

                Event::TogglePlayRequested => {
                    // The engine confirms through PlaybackStateChanged; the
                    // model does not change until then.
                    if model.playback.is_playing() {
                        caps.player().pause();
                    } else {
                        caps.player().play();
                    }
                }

                Event::PlaybackStateChanged { playing } => {
                    model.playback.set_playing(playing);
                    caps.render().render();
                }

                Event::PlaybackTimeUpdated { seconds } => {
                    model.playback.on_time_update(seconds);
                    caps.render().render();
                }

                Event::PlaybackEnded => {
                    model.playback.set_playing(false);
                    caps.render().render();
                }
            }
        }

        fn view(&self, model: &Model) -> ViewModel {
            let results = model.results.as_ref().map(Self::build_results_view);

            let playback = model
                .results
                .as_ref()
                .filter(|r| r.is_video())
                .map(|_| PlaybackView {
                    current_frame: model.playback.current_frame(),
                    total_frames: model.playback.total_frames(),
                    is_playing: model.playback.is_playing(),
                    fps: model.playback.fps(),
                });

            let media = model.staged_media.as_ref().map(|m| MediaView {
                file_name: m.file_name.clone(),
                mime_type: m.mime_type.clone(),
                media_type: model.media_type,
                size_bytes: m.bytes.len(),
            });

            let selected_history = model
                .selected_history_id
                .as_ref()
                .and_then(|id| model.history.get(id))
                .map(|item| HistoryDetailView {
                    item: Self::build_history_item_view(item),
                    results: Self::build_results_view(&item.results),
                });

            ViewModel {
                phase: model.phase,
                active_tab: model.active_tab,
                can_detect: model.staged_media.is_some() && !model.is_processing(),
                media,
                results,
                playback,
                history: Self::build_history_views(&model.history),
                selected_history,
                models: MODEL_CATALOG.iter().map(ModelView::from).collect(),
                selected_model_id: model.selected_model_id.clone(),
                confidence: model.confidence,
                use_mock_data: model.use_mock_data,
                api_url: model.api_url.clone(),
                error: model.active_error.as_ref().map(super::ErrorView::from),
            }
        }
    }
}
