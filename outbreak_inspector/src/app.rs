use std::time::{Duration, Instant};

use chrono::{DateTime, NaiveDate, Utc};
use color_eyre::Result;
use crossbeam_channel::Receiver;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use outbreak_core::{
    ArticleShelf, JsonFileStore, LogEnvelope, MapPanel, PanelCommand, PlaybackTick,
    TokioTickScheduler,
};
use ratatui::backend::CrosstermBackend;
use ratatui::prelude::*;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{info, trace, warn};

use crate::ui::{draw_ui, TerminalSink, UiState};

pub type InspectorPanel = MapPanel<TerminalSink, TokioTickScheduler>;

const DRAW_INTERVAL: Duration = Duration::from_millis(100);
const INPUT_POLL: Duration = Duration::from_millis(50);

/// Leaves raw mode and shows the cursor when dropped, so an early `?` in the
/// event loop still hands back a usable terminal.
pub struct TerminalRestore {
    restored: bool,
}

impl TerminalRestore {
    pub fn enable() -> Result<Self> {
        crossterm::terminal::enable_raw_mode()?;
        Ok(Self { restored: false })
    }

    pub fn restore(&mut self) -> std::io::Result<()> {
        if self.restored {
            return Ok(());
        }
        self.restored = true;
        crossterm::terminal::disable_raw_mode()?;
        crossterm::execute!(std::io::stdout(), crossterm::cursor::Show)
    }
}

impl Drop for TerminalRestore {
    fn drop(&mut self) {
        if let Err(err) = self.restore() {
            warn!(target: "outbreak::inspector", error = %err, "terminal.restore_failed");
        }
    }
}

pub struct InspectorApp {
    terminal: Terminal<CrosstermBackend<std::io::Stdout>>,
    restore: TerminalRestore,
    panel: InspectorPanel,
    ticks: UnboundedReceiver<PlaybackTick>,
    refreshes: UnboundedReceiver<DateTime<Utc>>,
    log_receiver: Receiver<LogEnvelope>,
    shelf: ArticleShelf<JsonFileStore>,
    ui_state: UiState,
}

impl InspectorApp {
    pub fn new(
        panel: InspectorPanel,
        ticks: UnboundedReceiver<PlaybackTick>,
        refreshes: UnboundedReceiver<DateTime<Utc>>,
        log_receiver: Receiver<LogEnvelope>,
        shelf: ArticleShelf<JsonFileStore>,
    ) -> Result<Self> {
        let stdout = std::io::stdout();
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        let restore = TerminalRestore::enable()?;
        terminal.clear()?;
        terminal.hide_cursor()?;
        Ok(Self {
            terminal,
            restore,
            panel,
            ticks,
            refreshes,
            log_receiver,
            shelf,
            ui_state: UiState::default(),
        })
    }

    pub fn run(mut self) -> Result<()> {
        let mut last_draw: Option<Instant> = None;

        loop {
            // Ticks and refreshes are applied in arrival order, before input.
            while let Ok(tick) = self.ticks.try_recv() {
                self.panel.on_tick(tick);
            }

            while let Ok(at) = self.refreshes.try_recv() {
                self.panel.record_refresh(at);
            }

            while let Ok(envelope) = self.log_receiver.try_recv() {
                self.ui_state.push_log(envelope.display_line());
            }

            if last_draw.map_or(true, |at| at.elapsed() >= DRAW_INTERVAL) {
                self.terminal
                    .draw(|frame| draw_ui(frame, &self.panel, &self.shelf, &self.ui_state))?;
                last_draw = Some(Instant::now());
                if !self.panel.sink().is_attached() {
                    self.panel.sink_mut().attach();
                    self.panel.republish();
                    trace!(target: "outbreak::inspector", "sink.attached");
                }
            }

            if event::poll(INPUT_POLL)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Release {
                        continue;
                    }
                    if !self.handle_key(key.code) {
                        break;
                    }
                }
            }
        }

        self.restore.restore()?;
        info!(target: "outbreak::inspector", "inspector.stopped");
        Ok(())
    }

    /// Returns `false` when the user asked to quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        let selection = self.panel.selection().clone();
        let command = match code {
            KeyCode::Char('q') | KeyCode::Esc => return false,
            KeyCode::Char('p') | KeyCode::Char('P') | KeyCode::Char(' ') => {
                Some(PanelCommand::TogglePlayback)
            }
            KeyCode::Char('.') | KeyCode::Right => Some(PanelCommand::Step(1)),
            KeyCode::Char(',') | KeyCode::Left => Some(PanelCommand::Step(-1)),
            KeyCode::Char(']') | KeyCode::Char('}') => Some(PanelCommand::SetSpeed(
                self.panel
                    .config()
                    .next_speed_preset(selection.play_speed, true),
            )),
            KeyCode::Char('[') | KeyCode::Char('{') => Some(PanelCommand::SetSpeed(
                self.panel
                    .config()
                    .next_speed_preset(selection.play_speed, false),
            )),
            KeyCode::Char('d') => Some(PanelCommand::SelectDisease(selection.disease.cycle(true))),
            KeyCode::Char('D') => Some(PanelCommand::SelectDisease(selection.disease.cycle(false))),
            KeyCode::Char('s') => Some(PanelCommand::SetStartDate(
                self.shift_bound(selection.range.start, 1),
            )),
            KeyCode::Char('S') => Some(PanelCommand::SetStartDate(
                self.shift_bound(selection.range.start, -1),
            )),
            KeyCode::Char('e') => Some(PanelCommand::SetEndDate(
                self.shift_bound(selection.range.end, 1),
            )),
            KeyCode::Char('E') => Some(PanelCommand::SetEndDate(
                self.shift_bound(selection.range.end, -1),
            )),
            KeyCode::Char('r') => {
                let timeline = self.panel.timeline();
                let (first, last) = (timeline.first(), timeline.last());
                self.apply(PanelCommand::SetStartDate(first));
                Some(PanelCommand::SetEndDate(last))
            }
            KeyCode::Home => Some(PanelCommand::Seek(0)),
            KeyCode::End => Some(PanelCommand::Seek(
                self.panel.timeline().len().saturating_sub(1),
            )),
            KeyCode::Up => {
                self.ui_state.select_city(-1, self.panel.features().len());
                None
            }
            KeyCode::Down => {
                self.ui_state.select_city(1, self.panel.features().len());
                None
            }
            KeyCode::Char('n') => {
                self.shelf.next();
                None
            }
            KeyCode::Char('N') => {
                self.shelf.prev();
                None
            }
            _ => None,
        };
        if let Some(command) = command {
            self.apply(command);
        }
        true
    }

    fn apply(&mut self, command: PanelCommand) {
        if let Err(err) = self.panel.apply(command) {
            warn!(target: "outbreak::inspector", error = %err, "command.rejected");
        }
    }

    /// Move a range bound `delta` steps along the timeline, clamped to its ends.
    /// An unset bound starts from the matching end of the timeline.
    fn shift_bound(&self, bound: Option<NaiveDate>, delta: i64) -> Option<NaiveDate> {
        let timeline = self.panel.timeline();
        if timeline.is_empty() {
            return bound;
        }
        let last = timeline.len() - 1;
        let from = bound
            .map(|date| match timeline.position(date) {
                Some(index) => index,
                None => timeline.steps().partition_point(|step| *step < date).min(last),
            })
            .unwrap_or(if delta > 0 { 0 } else { last });
        let target = (from as i64 + delta).clamp(0, last as i64) as usize;
        timeline.get(target)
    }
}
