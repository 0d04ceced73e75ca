//! Search header example.
//!
//! A header collapses when its search field gains focus: the title area
//! shrinks, the search field slides up, and a cancel button fades in. Blurring
//! the field runs the same animation backward.
//!
//! There is no window here; the example plays the role of the host, stepping
//! a [`FrameDriver`] once per frame and printing what a renderer would draw.
//!
//! Run with: cargo run -p horizon-lattice-tween --example search_header
//! Set `RUST_LOG=horizon_lattice_tween=debug` to see engine logging.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use horizon_lattice_tween::{
    AnimationDriver, AnimationSpec, DriverConfig, Easing, FrameDriver, SessionHandle,
    TweenSession,
};
use tracing_subscriber::EnvFilter;

const EXPANDED_HEIGHT: f64 = 116.0;
const COLLAPSED_HEIGHT: f64 = 72.0;

fn header_spec(title_height: f64) -> AnimationSpec {
    AnimationSpec::new(Duration::from_millis(240))
        .property("header_height", EXPANDED_HEIGHT, COLLAPSED_HEIGHT)
        .property("search_offset", 0.0, -title_height)
        .property("cancel_opacity", 0.0, 1.0)
        .with_easing(Easing::new(|t| t * t * (3.0 - 2.0 * t)))
}

fn render(frame: usize, header: &SessionHandle) {
    let values = header.values();
    println!(
        "frame {frame:>3}  progress {:.3}  height {:>6.2}  offset {:>6.2}  cancel {:.2}",
        header.progress().get(),
        values["header_height"],
        values["search_offset"],
        values["cancel_opacity"],
    );
}

fn run_frames(driver: &FrameDriver, header: &SessionHandle) {
    let interval = driver.config().frame_interval();
    let mut frame = 0;
    while header.engine().is_running() {
        driver.advance(interval);
        frame += 1;
        render(frame, header);
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let driver = Arc::new(FrameDriver::with_config(DriverConfig {
        frame_interval_ms: 24,
        ..DriverConfig::default()
    }));
    let mut session = TweenSession::new(driver.clone());

    // Each "render" re-evaluates the tween; the title height is the only
    // dependency that changes the animation.
    let mut title_height = 44.0_f64;
    let header = session
        .use_tween(|| header_spec(title_height), &[title_height.to_bits()])
        .expect("header animation is valid");

    println!("-- focus search");
    let focused = Arc::new(AtomicBool::new(false));
    let focused_flag = focused.clone();
    header.play_with(move || focused_flag.store(true, Ordering::SeqCst));
    run_frames(&driver, &header);
    println!("focused: {}", focused.load(Ordering::SeqCst));

    println!("-- re-render, same layout");
    let same = session
        .use_tween(|| header_spec(title_height), &[title_height.to_bits()])
        .expect("header animation is valid");
    println!("same engine: {}", same.engine().same_instance(header.engine()));

    println!("-- blur search, interrupted halfway by a layout change");
    header.play_backward();
    for _ in 0..5 {
        driver.advance(driver.config().frame_interval());
    }
    render(5, &header);

    title_height = 52.0;
    let header = session
        .use_tween(|| header_spec(title_height), &[title_height.to_bits()])
        .expect("header animation is valid");
    println!(
        "rebuilt at rest: height {:.2}, running transitions {}",
        header.values()["header_height"],
        driver.active_count(),
    );

    println!("-- focus search with the new layout");
    header.play();
    run_frames(&driver, &header);
}
