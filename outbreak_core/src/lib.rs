//! Core of the outbreak map panel.
//!
//! Builds the date timeline from a fixed per-city dataset, projects it into
//! disease-scoped point features for the active date, drives cancellable
//! playback over a date window, and keeps derived statistics in step. The
//! [`MapPanel`] ties these together behind a command interface; rendering is
//! delegated to a [`RenderSink`].

pub mod articles;
pub mod config;
pub mod dataset;
pub mod log_stream;
pub mod panel;
pub mod playback;
pub mod projection;
pub mod scheduler;
pub mod sink;
pub mod stats;
pub mod storage;
pub mod timeline;

pub use articles::{
    image_for_tag, make_id, parse_key_points, Article, ArticleDraft, ArticleShelf, ArticleTotals,
    ARTICLES_KEY,
};
pub use config::{load_panel_config_from_env, ConfigError, PanelConfig};
pub use dataset::{
    load_dataset_from_env, Dataset, DatasetError, DatasetSource, DroppedEntry, LoadReport,
};
pub use log_stream::{log_channel, LogEnvelope, LogForwardLayer, LOG_CHANNEL_CAPACITY};
pub use panel::{MapPanel, PanelCommand, PanelError};
pub use playback::{
    next_playback_index, playback_period, step_index, PlaybackState, SelectionState,
};
pub use projection::{describe_feature, project, Projector};
pub use scheduler::{
    spawn_repeating, ManualTickScheduler, PlaybackTick, RepeatingHandle, TickScheduler,
    TokioTickScheduler,
};
pub use sink::{RecordingSink, RenderSink, SinkBridge, SinkError};
pub use stats::derive_stats;
pub use storage::{load_json, save_json, JsonFileStore, KeyValueStore, MemoryStore, StorageError};
pub use timeline::{DateRange, Timeline};

pub use outbreak_schema::{
    disease_info, CityRecord, Coordinate, DayCounts, DerivedStats, Disease, DiseaseFilter,
    DiseaseInfo, FeatureCollection, ProjectedFeature, RiskLevel, HIGH_RISK_THRESHOLD,
};
