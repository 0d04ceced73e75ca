//! The tween engine.
//!
//! A [`TweenEngine`] owns a single progress value and one interpolated
//! [`Output`] per property of its [`AnimationSpec`]. `play` drives progress
//! toward `1.0`, `play_backward` toward `0.0`; both hand the actual timing to
//! an [`AnimationDriver`].
//!
//! At most one transition is live per engine. Each run gets a fresh token, and
//! every sample or completion reported by the driver is checked against the
//! engine's active token before it touches state. A cancelled run therefore
//! never moves progress again and never invokes its finish callback, even if
//! the driver had already queued them.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use horizon_lattice_tween::{AnimationSpec, FrameDriver, TweenEngine};
//!
//! let driver = Arc::new(FrameDriver::new());
//! let spec = AnimationSpec::new(Duration::from_millis(100)).property("height", 116.0, 72.0);
//! let engine = TweenEngine::build(spec, driver.clone()).unwrap();
//!
//! assert_eq!(engine.value("height"), Some(116.0));
//!
//! engine.play();
//! driver.run_until_idle();
//!
//! assert_eq!(engine.progress().get(), 1.0);
//! assert_eq!(engine.value("height"), Some(72.0));
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::config::AnimationSpec;
use crate::driver::{AnimationDriver, DriverTransition, TransitionId};
use crate::error::Result;
use crate::logging::targets;
use crate::property::{Binding, Property};
use crate::signal::{ConnectionGuard, Signal};

type FinishFn = Box<dyn FnOnce() + Send>;

/// Interpolate between two endpoints.
///
/// Equivalent to `from + progress * (to - from)`, but written so that
/// `progress == 0.0` yields exactly `from` and `progress == 1.0` exactly `to`.
#[inline]
pub fn interpolate(from: f64, to: f64, progress: f64) -> f64 {
    from * (1.0 - progress) + to * progress
}

/// The last commanded direction of an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Never played.
    #[default]
    Idle,
    /// Toward progress `1.0`.
    Forward,
    /// Toward progress `0.0`.
    Backward,
}

impl Direction {
    /// The progress value this direction animates toward.
    pub fn target(self) -> Option<f64> {
        match self {
            Self::Idle => None,
            Self::Forward => Some(1.0),
            Self::Backward => Some(0.0),
        }
    }
}

struct ProgressInner {
    value: Property<f64>,
    changed: Arc<Signal<f64>>,
}

/// The master progress value of an engine.
///
/// Cloning yields another handle to the same value.
#[derive(Clone)]
pub struct Progress {
    inner: Arc<ProgressInner>,
}

impl Progress {
    fn new(initial: f64) -> Self {
        Self {
            inner: Arc::new(ProgressInner {
                value: Property::new(initial),
                changed: Arc::new(Signal::new()),
            }),
        }
    }

    /// The latest committed progress value.
    pub fn get(&self) -> f64 {
        self.inner.value.get()
    }

    /// Signal emitted with the new value whenever progress changes.
    pub fn changed(&self) -> &Arc<Signal<f64>> {
        &self.inner.changed
    }

    /// Whether both handles refer to the same progress value.
    pub fn ptr_eq(&self, other: &Progress) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Progress").field(&self.get()).finish()
    }
}

/// One interpolated property, derived from the engine's progress.
pub struct Output {
    name: String,
    from: f64,
    to: f64,
    progress: Progress,
    value: Binding<f64>,
}

impl Output {
    fn new(name: &str, from: f64, to: f64, progress: Progress) -> Self {
        let source = progress.clone();
        Self {
            name: name.to_string(),
            from,
            to,
            progress,
            value: Binding::new(move || interpolate(from, to, source.get())),
        }
    }

    /// The property name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Value at progress `0.0`.
    pub fn start(&self) -> f64 {
        self.from
    }

    /// Value at progress `1.0`.
    pub fn end(&self) -> f64 {
        self.to
    }

    /// The current interpolated value.
    pub fn get(&self) -> f64 {
        self.value.get()
    }

    /// The value this output takes at an arbitrary progress.
    pub fn at(&self, progress: f64) -> f64 {
        interpolate(self.from, self.to, progress)
    }

    /// Call `f` with the new value whenever progress changes.
    ///
    /// The subscription ends when the returned guard is dropped.
    pub fn subscribe<F>(&self, f: F) -> ConnectionGuard<f64>
    where
        F: Fn(f64) + Send + Sync + 'static,
    {
        let (from, to) = (self.from, self.to);
        self.progress
            .changed()
            .connect_scoped(move |&p| f(interpolate(from, to, p)))
    }

    fn invalidate(&self) {
        self.value.invalidate();
    }
}

impl fmt::Debug for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Output")
            .field("name", &self.name)
            .field("from", &self.from)
            .field("to", &self.to)
            .field("value", &self.get())
            .finish()
    }
}

#[derive(Default)]
struct RunState {
    direction: Direction,
    running: bool,
    active_token: Option<u64>,
    active_id: Option<TransitionId>,
    next_token: u64,
}

struct EngineInner {
    spec: AnimationSpec,
    driver: Arc<dyn AnimationDriver>,
    progress: Progress,
    outputs: BTreeMap<String, Output>,
    state: Mutex<RunState>,
    detached: AtomicBool,
}

impl EngineInner {
    fn apply_sample(&self, token: u64, value: f64) {
        if self.state.lock().active_token != Some(token) {
            tracing::trace!(target: targets::ENGINE, token, "dropping stale sample");
            return;
        }
        self.commit_progress(value);
    }

    fn commit_progress(&self, value: f64) {
        if self.progress.inner.value.set(value) {
            for output in self.outputs.values() {
                output.invalidate();
            }
            self.progress.changed().emit(value);
        }
    }

    fn complete(&self, token: u64, on_finish: Option<FinishFn>) {
        {
            let mut state = self.state.lock();
            if state.active_token != Some(token) {
                tracing::trace!(target: targets::ENGINE, token, "dropping stale completion");
                return;
            }
            state.active_token = None;
            state.active_id = None;
            state.running = false;
            tracing::debug!(
                target: targets::ENGINE,
                token,
                direction = ?state.direction,
                "transition finished"
            );
        }

        if let Some(on_finish) = on_finish {
            on_finish();
        }
    }
}

impl Drop for EngineInner {
    fn drop(&mut self) {
        if let Some(id) = self.state.get_mut().active_id.take() {
            self.driver.cancel(id);
        }
    }
}

/// A multi-property tween driven by one progress value.
///
/// `TweenEngine` is a cheap handle; clones control the same engine. Use
/// [`same_instance`](Self::same_instance) to compare identities.
#[derive(Clone)]
pub struct TweenEngine {
    inner: Arc<EngineInner>,
}

impl TweenEngine {
    /// Build an engine from a spec.
    ///
    /// Progress starts at `1.0` if the spec is initially active and at `0.0`
    /// otherwise. Fails if the spec does not validate.
    pub fn build(spec: AnimationSpec, driver: Arc<dyn AnimationDriver>) -> Result<Self> {
        spec.validate()?;

        let progress = Progress::new(spec.resting_progress());
        let outputs: BTreeMap<String, Output> = spec
            .property_names()
            .filter_map(|name| {
                let (from, to) = spec.endpoints(name)?;
                Some((name.to_string(), Output::new(name, from, to, progress.clone())))
            })
            .collect();

        tracing::debug!(
            target: targets::ENGINE,
            properties = outputs.len(),
            duration_ms = spec.duration().as_millis() as u64,
            initially_active = spec.is_initially_active(),
            "built tween engine"
        );

        Ok(Self {
            inner: Arc::new(EngineInner {
                spec,
                driver,
                progress,
                outputs,
                state: Mutex::new(RunState::default()),
                detached: AtomicBool::new(false),
            }),
        })
    }

    /// Animate progress toward `1.0`.
    pub fn play(&self) {
        self.run(Direction::Forward, None);
    }

    /// Animate progress toward `1.0` and call `on_finish` when it gets there.
    ///
    /// `on_finish` is dropped without being called if the run is cancelled.
    pub fn play_with<F>(&self, on_finish: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.run(Direction::Forward, Some(Box::new(on_finish)));
    }

    /// Animate progress toward `0.0`.
    pub fn play_backward(&self) {
        self.run(Direction::Backward, None);
    }

    /// Animate progress toward `0.0` and call `on_finish` when it gets there.
    pub fn play_backward_with<F>(&self, on_finish: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.run(Direction::Backward, Some(Box::new(on_finish)));
    }

    /// Cancel the running transition, freezing progress where it is.
    ///
    /// Does nothing if no transition is running.
    pub fn stop(&self) {
        let mut state = self.inner.state.lock();
        state.active_token = None;
        if let Some(id) = state.active_id.take() {
            self.inner.driver.cancel(id);
        }
        if std::mem::replace(&mut state.running, false) {
            tracing::debug!(
                target: targets::ENGINE,
                progress = self.inner.progress.get(),
                "stopped tween"
            );
        }
    }

    fn run(&self, direction: Direction, on_finish: Option<FinishFn>) {
        if self.is_detached() {
            tracing::warn!(
                target: targets::ENGINE,
                ?direction,
                "ignoring command on a discarded tween engine"
            );
            return;
        }
        let Some(target) = direction.target() else {
            return;
        };

        let token = {
            let mut state = self.inner.state.lock();
            state.active_token = None;
            if let Some(previous) = state.active_id.take() {
                self.inner.driver.cancel(previous);
                tracing::trace!(target: targets::ENGINE, ?previous, "cancelled running transition");
            }
            let token = state.next_token;
            state.next_token += 1;
            state.active_token = Some(token);
            state.direction = direction;
            state.running = true;
            token
        };

        let start = self.inner.progress.get();
        tracing::debug!(target: targets::ENGINE, ?direction, token, start, "playing tween");

        let sample_ref: Weak<EngineInner> = Arc::downgrade(&self.inner);
        let complete_ref = sample_ref.clone();
        let transition = DriverTransition::new(
            start,
            target,
            self.inner.spec.duration(),
            self.inner.spec.easing().clone(),
        )
        .on_sample(move |value| {
            if let Some(inner) = sample_ref.upgrade() {
                inner.apply_sample(token, value);
            }
        })
        .on_complete(move || {
            if let Some(inner) = complete_ref.upgrade() {
                inner.complete(token, on_finish);
            }
        });

        // The driver may finish synchronously; only record the id if this run
        // is still the active one.
        let id = self.inner.driver.start(transition);
        let mut state = self.inner.state.lock();
        if state.active_token == Some(token) {
            state.active_id = Some(id);
        }
    }

    /// The master progress value.
    pub fn progress(&self) -> &Progress {
        &self.inner.progress
    }

    /// An output by property name.
    pub fn output(&self, name: &str) -> Option<&Output> {
        self.inner.outputs.get(name)
    }

    /// All outputs, ordered by property name.
    pub fn outputs(&self) -> impl Iterator<Item = &Output> {
        self.inner.outputs.values()
    }

    /// The current value of one output.
    pub fn value(&self, name: &str) -> Option<f64> {
        self.output(name).map(Output::get)
    }

    /// A snapshot of every output's current value.
    pub fn values(&self) -> BTreeMap<String, f64> {
        self.inner
            .outputs
            .iter()
            .map(|(name, output)| (name.clone(), output.get()))
            .collect()
    }

    /// The last commanded direction.
    pub fn direction(&self) -> Direction {
        self.inner.state.lock().direction
    }

    /// Whether a transition is currently running.
    pub fn is_running(&self) -> bool {
        self.inner.state.lock().running
    }

    /// The spec this engine was built from.
    pub fn spec(&self) -> &AnimationSpec {
        &self.inner.spec
    }

    /// Whether both handles control the same engine.
    pub fn same_instance(&self, other: &TweenEngine) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Whether the owning session has discarded this engine.
    ///
    /// Commands on a discarded engine are ignored.
    pub fn is_detached(&self) -> bool {
        self.inner.detached.load(Ordering::Acquire)
    }

    /// Stop the engine and cut it loose from its observers.
    pub(crate) fn detach(&self) {
        self.stop();
        self.inner.detached.store(true, Ordering::Release);
        let changed = self.inner.progress.changed();
        let observers = changed.connection_count();
        changed.disconnect_all();
        tracing::trace!(target: targets::ENGINE, observers, "detached tween engine");
    }
}

impl fmt::Debug for TweenEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("TweenEngine")
            .field("progress", &self.inner.progress.get())
            .field("direction", &state.direction)
            .field("running", &state.running)
            .field("outputs", &self.inner.outputs.len())
            .field("detached", &self.is_detached())
            .finish()
    }
}

static_assertions::assert_impl_all!(TweenEngine: Send, Sync);
static_assertions::assert_impl_all!(Progress: Send, Sync);
