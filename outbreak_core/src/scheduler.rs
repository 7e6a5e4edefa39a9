//! Repeating, cancellable callbacks and the playback tick source built on them.

use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, trace};

const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Handle to a task started by [`spawn_repeating`]. Dropping it cancels the task.
#[derive(Debug)]
pub struct RepeatingHandle {
    cancelled: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl RepeatingHandle {
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
        self.task.abort();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Drop for RepeatingHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Run `callback` every `period` on `runtime`, first firing one period from now.
///
/// The callback stops the schedule by returning [`ControlFlow::Break`]. After
/// [`RepeatingHandle::cancel`] the callback is never invoked again.
pub fn spawn_repeating<F>(runtime: &Handle, period: Duration, mut callback: F) -> RepeatingHandle
where
    F: FnMut() -> ControlFlow<()> + Send + 'static,
{
    let period = period.max(MIN_PERIOD);
    let cancelled = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancelled);
    let task = runtime.spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if flag.load(Ordering::Acquire) {
                break;
            }
            if callback().is_break() {
                break;
            }
        }
    });
    RepeatingHandle { cancelled, task }
}

/// A playback tick, tagged with the playback epoch that scheduled it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackTick {
    pub epoch: u64,
}

/// Source of playback ticks for [`crate::MapPanel`].
pub trait TickScheduler {
    /// Begin delivering ticks for `epoch` every `period`, replacing any running schedule.
    fn start(&mut self, period: Duration, epoch: u64);
    /// Stop delivering ticks.
    fn stop(&mut self);
}

/// Delivers ticks over a tokio channel from a task on `runtime`.
pub struct TokioTickScheduler {
    runtime: Handle,
    sender: UnboundedSender<PlaybackTick>,
    active: Option<RepeatingHandle>,
}

impl TokioTickScheduler {
    pub fn new(runtime: Handle, sender: UnboundedSender<PlaybackTick>) -> Self {
        Self {
            runtime,
            sender,
            active: None,
        }
    }

    pub fn channel(runtime: Handle) -> (Self, UnboundedReceiver<PlaybackTick>) {
        let (sender, receiver) = unbounded_channel();
        (Self::new(runtime, sender), receiver)
    }

    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }
}

impl TickScheduler for TokioTickScheduler {
    fn start(&mut self, period: Duration, epoch: u64) {
        self.stop();
        let sender = self.sender.clone();
        debug!(target: "outbreak::playback", epoch, period_ms = period.as_millis() as u64, "schedule.start");
        self.active = Some(spawn_repeating(&self.runtime, period, move || {
            match sender.send(PlaybackTick { epoch }) {
                Ok(()) => {
                    trace!(target: "outbreak::playback", epoch, "schedule.tick");
                    ControlFlow::Continue(())
                }
                Err(_) => ControlFlow::Break(()),
            }
        }));
    }

    fn stop(&mut self) {
        if let Some(handle) = self.active.take() {
            handle.cancel();
            debug!(target: "outbreak::playback", "schedule.stop");
        }
    }
}

/// Records schedule requests; the caller delivers ticks itself.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ManualTickScheduler {
    running: Option<(Duration, u64)>,
    pub starts: usize,
    pub stops: usize,
}

impl ManualTickScheduler {
    /// Period and epoch of the running schedule.
    pub fn running(&self) -> Option<(Duration, u64)> {
        self.running
    }

    /// The tick the running schedule would deliver next.
    pub fn next_tick(&self) -> Option<PlaybackTick> {
        self.running.map(|(_, epoch)| PlaybackTick { epoch })
    }
}

impl TickScheduler for ManualTickScheduler {
    fn start(&mut self, period: Duration, epoch: u64) {
        self.running = Some((period, epoch));
        self.starts += 1;
    }

    fn stop(&mut self) {
        if self.running.take().is_some() {
            self.stops += 1;
        }
    }
}
