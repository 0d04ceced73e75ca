//! Stored and derived values.
//!
//! - **Property<T>**: a stored value with change detection. The engine keeps
//!   its progress value in one.
//! - **Binding<T>**: a derived value computed lazily from other values and
//!   cached until invalidated. Each interpolated output is a binding over the
//!   progress property.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

/// A value that tracks changes.
///
/// `set()` compares the new value with the current one and reports whether
/// anything changed, so the owner can decide whether to notify observers.
pub struct Property<T> {
    value: RwLock<T>,
}

impl<T: Clone> Property<T> {
    /// Create a new property with an initial value.
    pub fn new(value: T) -> Self {
        Self {
            value: RwLock::new(value),
        }
    }

    /// Get the current value.
    pub fn get(&self) -> T {
        self.value.read().clone()
    }
}

impl<T: Clone + PartialEq> Property<T> {
    /// Set the value, returning `true` if the value changed.
    pub fn set(&self, value: T) -> bool {
        let mut current = self.value.write();
        if *current != value {
            *current = value;
            true
        } else {
            false
        }
    }
}

impl<T: Clone + fmt::Debug> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("value", &self.get())
            .finish()
    }
}

/// A computed value that derives from other values.
///
/// `Binding<T>` caches its computed value and recalculates only after
/// [`invalidate`](Self::invalidate). The owner of the source values is
/// responsible for invalidating every binding that reads them.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use horizon_lattice_tween::{Binding, Property};
///
/// let progress = Arc::new(Property::new(0.25_f64));
/// let source = progress.clone();
/// let height = Binding::new(move || 64.0 + source.get() * 8.0);
///
/// assert_eq!(height.get(), 66.0);
///
/// progress.set(1.0);
/// height.invalidate();
/// assert_eq!(height.get(), 72.0);
/// ```
pub struct Binding<T> {
    compute: Box<dyn Fn() -> T + Send + Sync>,
    /// The cached value, tagged with the version it was computed at.
    cached: RwLock<Option<(u64, T)>>,
    version: AtomicU64,
}

impl<T: Clone + Send + Sync + 'static> Binding<T> {
    /// Create a new binding with a computation function.
    ///
    /// The function is called lazily when `get()` is first called, and again
    /// after each `invalidate()` call.
    pub fn new<F>(compute: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self {
            compute: Box::new(compute),
            cached: RwLock::new(None),
            version: AtomicU64::new(0),
        }
    }

    /// Get the current value, computing it if necessary.
    ///
    /// An `invalidate()` that races with the computation leaves the binding
    /// dirty, so the next `get()` recomputes.
    pub fn get(&self) -> T {
        let version = self.version.load(Ordering::Acquire);
        if let Some((cached_at, value)) = self.cached.read().as_ref() {
            if *cached_at == version {
                return value.clone();
            }
        }

        let value = (self.compute)();
        *self.cached.write() = Some((version, value.clone()));
        value
    }

    /// Mark the binding as dirty, causing recalculation on next `get()`.
    pub fn invalidate(&self) {
        self.version.fetch_add(1, Ordering::AcqRel);
    }

    /// Check if the binding needs recalculation.
    pub fn is_dirty(&self) -> bool {
        let version = self.version.load(Ordering::Acquire);
        !matches!(self.cached.read().as_ref(), Some((cached_at, _)) if *cached_at == version)
    }
}

impl<T: Clone + fmt::Debug + Send + Sync + 'static> fmt::Debug for Binding<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("dirty", &self.is_dirty())
            .field("cached", &self.cached.read().as_ref().map(|(_, value)| value))
            .finish()
    }
}
