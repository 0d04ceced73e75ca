//! Tween animation engine for Horizon Lattice.
//!
//! This crate drives a named set of numeric properties from a single master
//! progress value:
//!
//! - **AnimationSpec**: named `from`/`to` pairs, duration, easing, resting position
//! - **TweenEngine**: one progress value, N interpolated outputs, and
//!   `play` / `play_backward` / `stop` controls
//! - **TweenSession**: keeps an engine stable across repeated host evaluations
//!   and rebuilds it when its dependencies change or a reset is requested
//! - **AnimationDriver**: the clock that moves progress; [`FrameDriver`] is a
//!   deterministic implementation stepped by the host
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use horizon_lattice_tween::{AnimationSpec, Easing, FrameDriver, TweenSession};
//!
//! let driver = Arc::new(FrameDriver::new());
//! let mut session = TweenSession::new(driver.clone());
//!
//! // Evaluated on every render; the engine is built once.
//! let search = session
//!     .use_tween(
//!         || {
//!             AnimationSpec::new(Duration::from_millis(250))
//!                 .property("header_height", 116.0, 72.0)
//!                 .property("cancel_opacity", 0.0, 1.0)
//!                 .with_easing(Easing::new(|t| t * t * (3.0 - 2.0 * t)))
//!         },
//!         &["portrait"],
//!     )
//!     .unwrap();
//!
//! search.play();
//! driver.run_until_idle();
//! assert_eq!(search.output("cancel_opacity").map(|o| o.get()), Some(1.0));
//!
//! search.play_backward();
//! driver.run_until_idle();
//! assert_eq!(search.output("header_height").map(|o| o.get()), Some(116.0));
//! ```

mod config;
mod driver;
mod easing;
mod engine;
mod error;
pub mod logging;
pub mod property;
mod session;
pub mod signal;

pub use config::{AnimationSpec, TweenConfig};
pub use driver::{AnimationDriver, DriverConfig, DriverTransition, FrameDriver, TransitionId};
pub use easing::Easing;
pub use engine::{Direction, Output, Progress, TweenEngine, interpolate};
pub use error::{Endpoint, Result, TweenError};
pub use property::{Binding, Property};
pub use session::{Generation, SessionHandle, TweenSession};
pub use signal::{ConnectionGuard, ConnectionId, Signal};
