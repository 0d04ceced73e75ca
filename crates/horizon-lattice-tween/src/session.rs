//! Engine lifecycle across repeated host evaluations.
//!
//! A host UI may run its construction code on every render. A
//! [`TweenSession`] keeps a single engine slot keyed by the caller's
//! dependency tokens and a generation counter. [`TweenSession::use_tween`]
//! returns the cached engine while both match, and otherwise discards it and
//! builds a fresh one from the caller's factory. [`SessionHandle::reset`]
//! bumps the generation to force that rebuild without changing dependencies.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use horizon_lattice_tween::{AnimationSpec, FrameDriver, TweenSession};
//!
//! let driver = Arc::new(FrameDriver::new());
//! let mut session = TweenSession::new(driver.clone());
//! let header = |height: f64| {
//!     move || AnimationSpec::new(Duration::from_millis(250)).property("height", height, 72.0)
//! };
//!
//! let first = session.use_tween(header(116.0), &[116]).unwrap();
//! let again = session.use_tween(header(116.0), &[116]).unwrap();
//! assert!(first.engine().same_instance(again.engine()));
//!
//! let rebuilt = session.use_tween(header(120.0), &[120]).unwrap();
//! assert!(!rebuilt.engine().same_instance(first.engine()));
//! assert!(!first.is_current());
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::config::AnimationSpec;
use crate::driver::AnimationDriver;
use crate::engine::{Output, Progress, TweenEngine};
use crate::error::Result;
use crate::logging::targets;
use crate::signal::Signal;

/// Monotonic counter bumped by every reset.
pub type Generation = u64;

struct SessionSlot<K> {
    deps: Vec<K>,
    generation: Generation,
    engine: TweenEngine,
}

/// Owner of the current engine.
///
/// `K` is the dependency token type; tokens are compared pairwise with
/// `PartialEq`, and a change in length counts as a change.
pub struct TweenSession<K> {
    driver: Arc<dyn AnimationDriver>,
    generation: Arc<AtomicU64>,
    slot: Option<SessionSlot<K>>,
    rebuilt: Signal<Generation>,
}

impl<K: PartialEq + Clone> TweenSession<K> {
    /// Create a session whose engines run on `driver`.
    pub fn new(driver: Arc<dyn AnimationDriver>) -> Self {
        Self {
            driver,
            generation: Arc::new(AtomicU64::new(0)),
            slot: None,
            rebuilt: Signal::new(),
        }
    }

    /// Return the current engine, rebuilding it if needed.
    ///
    /// The engine is rebuilt on the first call, when `deps` differs from the
    /// dependencies it was built with, or after a reset. Rebuilding stops and
    /// discards the previous engine; its pending finish callbacks never run.
    /// `factory` is called only when rebuilding.
    ///
    /// If the new spec does not validate, the error is returned and the
    /// previous engine stays current.
    pub fn use_tween<F>(&mut self, factory: F, deps: &[K]) -> Result<SessionHandle>
    where
        F: FnOnce() -> AnimationSpec,
    {
        let generation = self.generation();

        if let Some(slot) = &self.slot {
            if slot.generation == generation && slot.deps.as_slice() == deps {
                return Ok(self.handle(&slot.engine, slot.generation));
            }
        }

        let engine = TweenEngine::build(factory(), self.driver.clone())?;

        if let Some(previous) = self.slot.take() {
            let reason = if previous.generation != generation {
                "reset"
            } else {
                "dependencies changed"
            };
            tracing::debug!(
                target: targets::SESSION,
                previous_generation = previous.generation,
                generation,
                reason,
                "discarding tween engine"
            );
            previous.engine.detach();
        }

        tracing::debug!(
            target: targets::SESSION,
            generation,
            dependencies = deps.len(),
            "built session engine"
        );

        let handle = self.handle(&engine, generation);
        self.slot = Some(SessionSlot {
            deps: deps.to_vec(),
            generation,
            engine,
        });
        self.rebuilt.emit(generation);
        Ok(handle)
    }

    /// A handle to the current engine, if one has been built.
    pub fn current(&self) -> Option<SessionHandle> {
        self.slot
            .as_ref()
            .map(|slot| self.handle(&slot.engine, slot.generation))
    }

    fn handle(&self, engine: &TweenEngine, generation: Generation) -> SessionHandle {
        SessionHandle {
            engine: engine.clone(),
            generation,
            counter: self.generation.clone(),
        }
    }
}

impl<K> TweenSession<K> {
    /// The current generation.
    pub fn generation(&self) -> Generation {
        self.generation.load(Ordering::Acquire)
    }

    /// Force a rebuild on the next [`use_tween`](Self::use_tween) call.
    ///
    /// The current engine is stopped immediately.
    pub fn reset(&self) {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        if let Some(slot) = &self.slot {
            slot.engine.stop();
        }
        tracing::debug!(target: targets::SESSION, generation, "session reset");
    }

    /// Signal emitted with the new generation whenever an engine is built.
    pub fn rebuilt(&self) -> &Signal<Generation> {
        &self.rebuilt
    }
}

impl<K> Drop for TweenSession<K> {
    fn drop(&mut self) {
        if let Some(slot) = self.slot.take() {
            slot.engine.detach();
        }
    }
}

impl<K: fmt::Debug> fmt::Debug for TweenSession<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TweenSession")
            .field("generation", &self.generation())
            .field("deps", &self.slot.as_ref().map(|slot| &slot.deps))
            .field("engine", &self.slot.as_ref().map(|slot| &slot.engine))
            .finish()
    }
}

/// Access to the engine a session built.
///
/// Once the session rebuilds, a handle to the old engine goes stale: its
/// commands are ignored and [`is_current`](Self::is_current) returns `false`.
#[derive(Clone)]
pub struct SessionHandle {
    engine: TweenEngine,
    generation: Generation,
    counter: Arc<AtomicU64>,
}

impl SessionHandle {
    /// Animate toward the `to` values.
    pub fn play(&self) {
        self.engine.play();
    }

    /// Animate toward the `to` values, then call `on_finish`.
    pub fn play_with<F>(&self, on_finish: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.engine.play_with(on_finish);
    }

    /// Animate toward the `from` values.
    pub fn play_backward(&self) {
        self.engine.play_backward();
    }

    /// Animate toward the `from` values, then call `on_finish`.
    pub fn play_backward_with<F>(&self, on_finish: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.engine.play_backward_with(on_finish);
    }

    /// Freeze the engine where it is.
    pub fn stop(&self) {
        self.engine.stop();
    }

    /// Stop the engine and force the session to rebuild it on its next
    /// evaluation, even if the dependencies are unchanged.
    ///
    /// Does nothing on a stale handle, and resetting the same handle twice
    /// only bumps the generation once.
    pub fn reset(&self) {
        if self.engine.is_detached() {
            tracing::warn!(
                target: targets::SESSION,
                generation = self.generation,
                "ignoring reset on a stale session handle"
            );
            return;
        }
        let next = self.generation + 1;
        if self
            .counter
            .compare_exchange(self.generation, next, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            tracing::debug!(target: targets::SESSION, generation = next, "session reset");
        }
        self.engine.stop();
    }

    /// The master progress value.
    pub fn progress(&self) -> &Progress {
        self.engine.progress()
    }

    /// An output by property name.
    pub fn output(&self, name: &str) -> Option<&Output> {
        self.engine.output(name)
    }

    /// All outputs, ordered by property name.
    pub fn outputs(&self) -> impl Iterator<Item = &Output> {
        self.engine.outputs()
    }

    /// A snapshot of every output's current value.
    pub fn values(&self) -> BTreeMap<String, f64> {
        self.engine.values()
    }

    /// The engine behind this handle.
    pub fn engine(&self) -> &TweenEngine {
        &self.engine
    }

    /// The generation the engine was built in.
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Whether the engine is still the session's current one.
    pub fn is_current(&self) -> bool {
        !self.engine.is_detached() && self.counter.load(Ordering::Acquire) == self.generation
    }
}

impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHandle")
            .field("generation", &self.generation)
            .field("current", &self.is_current())
            .field("engine", &self.engine)
            .finish()
    }
}

static_assertions::assert_impl_all!(SessionHandle: Send, Sync);
