//! Time drivers.
//!
//! A driver advances a value from a start point to a target over a duration,
//! sampling an easing curve on every frame. The engine never does timing math
//! itself; it registers one [`DriverTransition`] per run and reacts to the
//! samples and the completion the driver reports.
//!
//! [`FrameDriver`] is a deterministic driver stepped explicitly by the host
//! (once per rendered frame, or by a test). Hosts with their own animation
//! clock implement [`AnimationDriver`] instead.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use parking_lot::Mutex;
//! use horizon_lattice_tween::{AnimationDriver, DriverTransition, Easing, FrameDriver};
//!
//! let driver = FrameDriver::new();
//! let last = Arc::new(Mutex::new(0.0));
//!
//! let sink = last.clone();
//! driver.start(
//!     DriverTransition::new(0.0, 10.0, Duration::from_millis(100), Easing::linear())
//!         .on_sample(move |v| *sink.lock() = v),
//! );
//!
//! driver.advance(Duration::from_millis(50));
//! assert_eq!(*last.lock(), 5.0);
//!
//! driver.advance(Duration::from_millis(50));
//! assert_eq!(*last.lock(), 10.0);
//! assert_eq!(driver.active_count(), 0);
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use slotmap::{SlotMap, new_key_type};

use crate::easing::Easing;
use crate::error::Result;
use crate::logging::targets;

new_key_type! {
    /// A unique identifier for a transition registered with a driver.
    pub struct TransitionId;
}

type SampleFn = Arc<dyn Fn(f64) + Send + Sync>;
type CompleteFn = Box<dyn FnOnce() + Send>;

/// A request to move a value from `from` to `to` over `duration`.
pub struct DriverTransition {
    from: f64,
    to: f64,
    duration: Duration,
    easing: Easing,
    on_sample: Option<SampleFn>,
    on_complete: Option<CompleteFn>,
}

impl DriverTransition {
    /// Create a transition with no callbacks.
    pub fn new(from: f64, to: f64, duration: Duration, easing: Easing) -> Self {
        Self {
            from,
            to,
            duration,
            easing,
            on_sample: None,
            on_complete: None,
        }
    }

    /// Set the callback that receives every sampled value.
    pub fn on_sample<F>(mut self, f: F) -> Self
    where
        F: Fn(f64) + Send + Sync + 'static,
    {
        self.on_sample = Some(Arc::new(f));
        self
    }

    /// Set the callback invoked once when the transition runs to completion.
    ///
    /// It is never invoked for a cancelled transition.
    pub fn on_complete<F>(mut self, f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.on_complete = Some(Box::new(f));
        self
    }

    /// Start value.
    pub fn start_value(&self) -> f64 {
        self.from
    }

    /// Target value.
    pub fn target(&self) -> f64 {
        self.to
    }

    /// Duration of the transition.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Normalized time after `elapsed`, clamped to `[0, 1]`.
    pub fn time_ratio(&self, elapsed: Duration) -> f64 {
        if self.duration.is_zero() {
            1.0
        } else {
            (elapsed.as_secs_f64() / self.duration.as_secs_f64()).min(1.0)
        }
    }

    /// The sampled value after `elapsed`.
    ///
    /// Returns exactly `to` once the duration has elapsed, whatever the
    /// easing curve yields at `t = 1`.
    pub fn value_at(&self, elapsed: Duration) -> f64 {
        let t = self.time_ratio(elapsed);
        if t >= 1.0 {
            self.to
        } else {
            self.from + (self.to - self.from) * self.easing.apply(t)
        }
    }

    /// Deliver a sampled value to the sample callback.
    ///
    /// For use by [`AnimationDriver`] implementations.
    pub fn sample(&self, value: f64) {
        if let Some(on_sample) = &self.on_sample {
            on_sample(value);
        }
    }

    /// Consume the transition and invoke its completion callback.
    ///
    /// For use by [`AnimationDriver`] implementations. Dropping a transition
    /// without calling this is how a driver cancels it.
    pub fn complete(self) {
        if let Some(on_complete) = self.on_complete {
            on_complete();
        }
    }
}

impl fmt::Debug for DriverTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverTransition")
            .field("from", &self.from)
            .field("to", &self.to)
            .field("duration", &self.duration)
            .field("easing", &self.easing)
            .finish()
    }
}

/// A scheduler that runs [`DriverTransition`]s.
///
/// Implementations may invoke the sample and completion callbacks from within
/// [`start`](Self::start); callers must not hold locks the callbacks need.
/// After [`cancel`](Self::cancel) returns, neither callback of the cancelled
/// transition may be invoked, even if the driver had already queued it.
pub trait AnimationDriver: Send + Sync {
    /// Register a transition and begin running it.
    fn start(&self, transition: DriverTransition) -> TransitionId;

    /// Cancel a transition in place.
    ///
    /// Returns `true` if the transition was still running.
    fn cancel(&self, id: TransitionId) -> bool;

    /// Check whether a transition is still running.
    fn is_active(&self, id: TransitionId) -> bool;

    /// Number of running transitions.
    fn active_count(&self) -> usize;
}

/// Settings for a [`FrameDriver`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DriverConfig {
    /// Step used by [`FrameDriver::run_for`] and [`FrameDriver::run_until_idle`].
    pub frame_interval_ms: u64,
    /// Upper bound on frames stepped by [`FrameDriver::run_until_idle`].
    pub max_frames: usize,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: 16,
            max_frames: 10_000,
        }
    }
}

impl DriverConfig {
    /// Parse settings from TOML. Missing keys fall back to defaults.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    /// The frame step, never shorter than one millisecond.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms.max(1))
    }
}

struct RunningTransition {
    transition: DriverTransition,
    elapsed: Duration,
    /// Reached its target this frame; waiting for its completion to be delivered.
    finished: bool,
}

/// A driver stepped explicitly by its owner.
///
/// Every call to [`advance`](Self::advance) moves all running transitions
/// forward by the same amount of time. Callbacks are invoked after the
/// internal lock is released, so they may start or cancel transitions.
pub struct FrameDriver {
    config: DriverConfig,
    transitions: Mutex<SlotMap<TransitionId, RunningTransition>>,
}

impl FrameDriver {
    /// Create a driver with default settings.
    pub fn new() -> Self {
        Self::with_config(DriverConfig::default())
    }

    /// Create a driver with custom settings.
    pub fn with_config(config: DriverConfig) -> Self {
        Self {
            config,
            transitions: Mutex::new(SlotMap::with_key()),
        }
    }

    /// The driver settings.
    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Step every running transition forward by `dt`.
    ///
    /// All samples of the frame are delivered first, then the completions of
    /// the transitions that reached their target. A transition cancelled by an
    /// earlier callback of the same frame receives neither. Returns the number
    /// of completions delivered.
    #[tracing::instrument(skip(self), target = "horizon_lattice_tween::driver", level = "trace")]
    pub fn advance(&self, dt: Duration) -> usize {
        let mut samples: Vec<(TransitionId, SampleFn, f64)> = Vec::new();
        let mut finished: Vec<TransitionId> = Vec::new();

        {
            let mut transitions = self.transitions.lock();
            for (id, running) in transitions.iter_mut() {
                if running.finished {
                    continue;
                }
                running.elapsed = running.elapsed.saturating_add(dt);
                let value = running.transition.value_at(running.elapsed);

                if let Some(sample) = &running.transition.on_sample {
                    samples.push((id, sample.clone(), value));
                }
                if running.transition.time_ratio(running.elapsed) >= 1.0 {
                    running.finished = true;
                    finished.push(id);
                }
            }
        }

        for (id, sample, value) in samples {
            let live = self.transitions.lock().contains_key(id);
            if live {
                sample(value);
            }
        }

        let mut completed = 0;
        for id in finished {
            let done = self.transitions.lock().remove(id);
            if let Some(done) = done {
                tracing::trace!(target: targets::DRIVER, ?id, "transition reached target");
                done.transition.complete();
                completed += 1;
            }
        }
        completed
    }

    /// Step frame by frame until `duration` has elapsed.
    ///
    /// The last frame is shortened so the total equals `duration` exactly.
    pub fn run_for(&self, duration: Duration) -> usize {
        let interval = self.config.frame_interval();
        let mut remaining = duration;
        let mut completed = 0;

        while !remaining.is_zero() {
            let step = remaining.min(interval);
            completed += self.advance(step);
            remaining -= step;
        }
        completed
    }

    /// Step frame by frame until no transition is running.
    ///
    /// Returns the number of frames stepped. Gives up after
    /// [`DriverConfig::max_frames`] frames, which only happens when callbacks
    /// keep starting new transitions.
    pub fn run_until_idle(&self) -> usize {
        let interval = self.config.frame_interval();
        let mut frames = 0;

        while self.active_count() > 0 {
            if frames >= self.config.max_frames {
                tracing::warn!(
                    target: targets::DRIVER,
                    frames,
                    active = self.active_count(),
                    "frame limit reached with transitions still running"
                );
                break;
            }
            self.advance(interval);
            frames += 1;
        }
        frames
    }
}

impl Default for FrameDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FrameDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameDriver")
            .field("config", &self.config)
            .field("active", &self.active_count())
            .finish()
    }
}

impl AnimationDriver for FrameDriver {
    fn start(&self, transition: DriverTransition) -> TransitionId {
        let id = self.transitions.lock().insert(RunningTransition {
            transition,
            elapsed: Duration::ZERO,
            finished: false,
        });
        tracing::trace!(target: targets::DRIVER, ?id, "transition started");
        id
    }

    fn cancel(&self, id: TransitionId) -> bool {
        let cancelled = self.transitions.lock().remove(id).is_some();
        if cancelled {
            tracing::trace!(target: targets::DRIVER, ?id, "transition cancelled");
        }
        cancelled
    }

    fn is_active(&self, id: TransitionId) -> bool {
        self.transitions.lock().contains_key(id)
    }

    fn active_count(&self) -> usize {
        self.transitions.lock().len()
    }
}

static_assertions::assert_impl_all!(FrameDriver: Send, Sync);
