//! The map panel: selection state, playback and derived views in one owner.
//!
//! All mutation goes through [`MapPanel::apply`] and [`MapPanel::on_tick`],
//! so commands and playback ticks interleave in arrival order. Each time
//! playback starts or stops the epoch advances; ticks carrying an older epoch
//! are discarded, which makes a pause take effect immediately even if ticks
//! are still queued.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;
use tracing::{debug, info, trace};

use outbreak_schema::{
    disease_info, DerivedStats, DiseaseFilter, DiseaseInfo, FeatureCollection, ProjectedFeature,
};

use crate::config::PanelConfig;
use crate::dataset::Dataset;
use crate::playback::{next_playback_index, step_index, PlaybackState, SelectionState};
use crate::projection::Projector;
use crate::scheduler::{PlaybackTick, TickScheduler};
use crate::sink::{RenderSink, SinkBridge};
use crate::stats::derive_stats;
use crate::timeline::{DateRange, Timeline};

/// User-driven changes to the panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PanelCommand {
    TogglePlayback,
    Play,
    Pause,
    SetSpeed(f64),
    SelectDisease(DiseaseFilter),
    SetStartDate(Option<NaiveDate>),
    SetEndDate(Option<NaiveDate>),
    /// Jump straight to a timeline index; out-of-range indices are ignored.
    Seek(usize),
    /// Move within the active date window, clamping at its edges.
    Step(i64),
}

#[derive(Debug, Error, PartialEq)]
pub enum PanelError {
    #[error("play speed must be a positive, finite multiplier (got {0})")]
    InvalidSpeed(f64),
}

pub struct MapPanel<S: RenderSink, K: TickScheduler> {
    config: PanelConfig,
    timeline: Timeline,
    projector: Projector,
    selection: SelectionState,
    sink: SinkBridge<S>,
    scheduler: K,
    epoch: u64,
    features: Arc<[ProjectedFeature]>,
    stats: DerivedStats,
    last_refresh_at: Option<DateTime<Utc>>,
}

impl<S: RenderSink, K: TickScheduler> MapPanel<S, K> {
    pub fn new(dataset: Arc<Dataset>, config: PanelConfig, sink: S, scheduler: K) -> Self {
        let timeline = Timeline::build(dataset.cities());
        let selection = SelectionState::initial(&timeline, config.default_disease);
        info!(
            target: "outbreak::panel",
            cities = dataset.cities().len(),
            steps = timeline.len(),
            "panel.initialised"
        );
        let mut panel = Self {
            config,
            timeline,
            projector: Projector::new(dataset),
            selection,
            sink: SinkBridge::new(sink),
            scheduler,
            epoch: 0,
            features: Arc::from(Vec::new()),
            stats: DerivedStats::default(),
            last_refresh_at: None,
        };
        panel.refresh_view();
        panel
    }

    pub fn apply(&mut self, command: PanelCommand) -> Result<(), PanelError> {
        trace!(target: "outbreak::panel", ?command, "panel.command");
        match command {
            PanelCommand::TogglePlayback => {
                if self.selection.playback.is_playing() {
                    self.pause();
                } else {
                    self.play();
                }
            }
            PanelCommand::Play => self.play(),
            PanelCommand::Pause => self.pause(),
            PanelCommand::SetSpeed(speed) => self.set_speed(speed)?,
            PanelCommand::SelectDisease(filter) => {
                if filter != self.selection.disease {
                    self.selection.disease = filter;
                    self.refresh_view();
                }
            }
            PanelCommand::SetStartDate(start) => {
                self.selection.range.start = start;
                debug!(target: "outbreak::panel", range = ?self.selection.range, "panel.range_changed");
            }
            PanelCommand::SetEndDate(end) => {
                self.selection.range.end = end;
                debug!(target: "outbreak::panel", range = ?self.selection.range, "panel.range_changed");
            }
            PanelCommand::Seek(index) => {
                if index < self.timeline.len() {
                    self.set_index(index);
                } else {
                    debug!(target: "outbreak::panel", index, "panel.seek_ignored");
                }
            }
            PanelCommand::Step(delta) => {
                if let Some(index) = step_index(
                    &self.timeline,
                    &self.selection.range,
                    self.selection.time_index,
                    delta,
                ) {
                    self.set_index(index);
                }
            }
        }
        Ok(())
    }

    /// Apply a playback tick. Returns whether the tick was accepted.
    pub fn on_tick(&mut self, tick: PlaybackTick) -> bool {
        if !self.selection.playback.is_playing() || tick.epoch != self.epoch {
            trace!(
                target: "outbreak::playback",
                tick_epoch = tick.epoch,
                epoch = self.epoch,
                "tick.discarded"
            );
            return false;
        }
        if let Some(index) = next_playback_index(
            &self.timeline,
            &self.selection.range,
            self.selection.time_index,
        ) {
            self.set_index(index);
        }
        true
    }

    /// Push the current projection to the sink again, e.g. once it becomes ready.
    pub fn republish(&mut self) -> bool {
        let collection = FeatureCollection::from_projection(&self.features);
        self.sink.publish(&collection)
    }

    pub fn record_refresh(&mut self, at: DateTime<Utc>) {
        self.last_refresh_at = Some(at);
        debug!(target: "outbreak::panel", at = %at, "panel.auto_refresh");
    }

    pub fn last_refresh_at(&self) -> Option<DateTime<Utc>> {
        self.last_refresh_at
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn config(&self) -> &PanelConfig {
        &self.config
    }

    pub fn dataset(&self) -> &Arc<Dataset> {
        self.projector.dataset()
    }

    pub fn current_date(&self) -> Option<NaiveDate> {
        self.selection.current_date(&self.timeline)
    }

    pub fn range(&self) -> DateRange {
        self.selection.range
    }

    pub fn is_playing(&self) -> bool {
        self.selection.playback.is_playing()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn features(&self) -> &[ProjectedFeature] {
        &self.features
    }

    pub fn feature_collection(&self) -> FeatureCollection {
        FeatureCollection::from_projection(&self.features)
    }

    pub fn stats(&self) -> &DerivedStats {
        &self.stats
    }

    pub fn disease_info(&self) -> &'static DiseaseInfo {
        disease_info(self.selection.disease)
    }

    pub fn sink(&self) -> &S {
        self.sink.sink()
    }

    pub fn sink_mut(&mut self) -> &mut S {
        self.sink.sink_mut()
    }

    pub fn scheduler(&self) -> &K {
        &self.scheduler
    }

    fn play(&mut self) {
        if self.selection.playback.is_playing() {
            return;
        }
        self.selection.playback = PlaybackState::Playing;
        self.restart_schedule();
        info!(
            target: "outbreak::playback",
            speed = self.selection.play_speed,
            epoch = self.epoch,
            "playback.started"
        );
    }

    fn pause(&mut self) {
        if !self.selection.playback.is_playing() {
            return;
        }
        self.selection.playback = PlaybackState::Paused;
        self.epoch += 1;
        self.scheduler.stop();
        info!(target: "outbreak::playback", epoch = self.epoch, "playback.paused");
    }

    fn set_speed(&mut self, speed: f64) -> Result<(), PanelError> {
        if !speed.is_finite() || speed <= 0.0 {
            return Err(PanelError::InvalidSpeed(speed));
        }
        self.selection.play_speed = speed;
        if self.selection.playback.is_playing() {
            self.restart_schedule();
        }
        debug!(target: "outbreak::playback", speed, "playback.speed_changed");
        Ok(())
    }

    fn restart_schedule(&mut self) {
        self.epoch += 1;
        let period = self.config.playback_period(self.selection.play_speed);
        self.scheduler.start(period, self.epoch);
    }

    fn set_index(&mut self, index: usize) {
        if index == self.selection.time_index {
            return;
        }
        self.selection.time_index = index;
        self.refresh_view();
    }

    fn refresh_view(&mut self) {
        let date = self.current_date();
        self.features = match date {
            Some(date) => self.projector.project(date, self.selection.disease),
            None => Arc::from(Vec::new()),
        };
        self.stats = derive_stats(date, &self.features);
        if date.is_some() {
            let collection = FeatureCollection::from_projection(&self.features);
            self.sink.publish(&collection);
        }
    }
}

impl<S: RenderSink, K: TickScheduler> Drop for MapPanel<S, K> {
    fn drop(&mut self) {
        self.scheduler.stop();
    }
}
