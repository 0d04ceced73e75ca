//! Integration tests for TweenEngine playback semantics.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use horizon_lattice_tween::{
    AnimationDriver, AnimationSpec, Direction, DriverTransition, Easing, FrameDriver,
    TransitionId, TweenEngine, TweenError,
};

fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

fn header_spec() -> AnimationSpec {
    AnimationSpec::new(ms(250))
        .property("height", 116.0, 72.0)
        .property("search_offset", 0.0, -44.0)
        .property("cancel_opacity", 0.0, 1.0)
}

fn counter() -> (Arc<AtomicUsize>, impl FnOnce() + Send + 'static) {
    let count = Arc::new(AtomicUsize::new(0));
    let count_clone = count.clone();
    (count, move || {
        count_clone.fetch_add(1, Ordering::SeqCst);
    })
}

#[test]
fn inactive_engine_rests_at_from_values() {
    let driver = Arc::new(FrameDriver::new());
    let engine = TweenEngine::build(header_spec(), driver).unwrap();

    assert_eq!(engine.progress().get(), 0.0);
    for output in engine.outputs() {
        assert_eq!(output.get(), output.start(), "{}", output.name());
    }
    assert_eq!(engine.direction(), Direction::Idle);
    assert!(!engine.is_running());
}

#[test]
fn active_engine_rests_at_to_values() {
    let driver = Arc::new(FrameDriver::new());
    let engine = TweenEngine::build(header_spec().initially_active(true), driver).unwrap();

    assert_eq!(engine.progress().get(), 1.0);
    let values = engine.values();
    assert_eq!(values["height"], 72.0);
    assert_eq!(values["search_offset"], -44.0);
    assert_eq!(values["cancel_opacity"], 1.0);
}

#[test]
fn mismatched_keys_fail_to_build() {
    let driver = Arc::new(FrameDriver::new());
    let spec = AnimationSpec::from_tables(ms(100), [("x", 0.0)], [("x", 1.0), ("y", 2.0)]);

    let result = TweenEngine::build(spec, driver);
    assert!(matches!(
        result,
        Err(TweenError::MismatchedProperties { .. })
    ));
}

#[test]
fn zero_duration_fails_to_build() {
    let driver = Arc::new(FrameDriver::new());
    let spec = header_spec().with_duration(Duration::ZERO);

    assert!(matches!(
        TweenEngine::build(spec, driver),
        Err(TweenError::InvalidDuration { .. })
    ));
}

#[test]
fn play_runs_to_completion() {
    let driver = Arc::new(FrameDriver::new());
    let engine = TweenEngine::build(header_spec(), driver.clone()).unwrap();
    let (finished, on_finish) = counter();

    engine.play_with(on_finish);
    assert!(engine.is_running());
    assert_eq!(engine.direction(), Direction::Forward);

    driver.run_for(ms(250));

    assert_eq!(engine.progress().get(), 1.0);
    assert_eq!(engine.value("height"), Some(72.0));
    assert_eq!(engine.value("search_offset"), Some(-44.0));
    assert_eq!(engine.value("cancel_opacity"), Some(1.0));
    assert!(!engine.is_running());
    assert_eq!(finished.load(Ordering::SeqCst), 1);

    driver.run_for(ms(500));
    assert_eq!(finished.load(Ordering::SeqCst), 1);
}

#[test]
fn reversing_mid_flight_fires_only_backward_finish() {
    let driver = Arc::new(FrameDriver::new());
    let engine = TweenEngine::build(header_spec(), driver.clone()).unwrap();
    let (forward, on_forward) = counter();
    let (backward, on_backward) = counter();

    engine.play_with(on_forward);
    driver.advance(ms(100));
    engine.play_backward_with(on_backward);
    assert_eq!(driver.active_count(), 1);

    driver.run_until_idle();

    assert_eq!(forward.load(Ordering::SeqCst), 0);
    assert_eq!(backward.load(Ordering::SeqCst), 1);
    assert_eq!(engine.progress().get(), 0.0);
    assert_eq!(engine.direction(), Direction::Backward);
}

#[test]
fn reversing_in_the_same_tick_leaves_one_transition() {
    let driver = Arc::new(FrameDriver::new());
    let engine = TweenEngine::build(header_spec(), driver.clone()).unwrap();
    let (forward, on_forward) = counter();
    let (backward, on_backward) = counter();

    engine.play_with(on_forward);
    engine.play_backward_with(on_backward);
    assert_eq!(driver.active_count(), 1);

    driver.run_until_idle();
    assert_eq!(forward.load(Ordering::SeqCst) + backward.load(Ordering::SeqCst), 1);
    assert_eq!(backward.load(Ordering::SeqCst), 1);
}

#[test]
fn stop_freezes_and_play_resumes_from_frozen_value() {
    let driver = Arc::new(FrameDriver::new());
    let spec = AnimationSpec::new(ms(200)).property("x", 0.0, 100.0);
    let engine = TweenEngine::build(spec, driver.clone()).unwrap();
    let (finished, on_finish) = counter();

    engine.play_with(on_finish);
    driver.advance(ms(50));
    engine.stop();

    let frozen = engine.progress().get();
    assert_eq!(frozen, 0.25);
    assert!(!engine.is_running());

    driver.run_for(ms(400));
    assert_eq!(engine.progress().get(), frozen);
    assert_eq!(finished.load(Ordering::SeqCst), 0);

    // A fresh run starts from the frozen value, not from zero.
    let samples = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let samples_clone = samples.clone();
    let _guard = engine
        .progress()
        .changed()
        .connect_scoped(move |&p| samples_clone.lock().push(p));

    engine.play();
    driver.advance(ms(100));
    let first = samples.lock()[0];
    assert!(first > frozen, "resumed at {first}, frozen at {frozen}");

    driver.run_until_idle();
    assert_eq!(engine.value("x"), Some(100.0));
}

#[test]
fn stop_is_idempotent() {
    let driver = Arc::new(FrameDriver::new());
    let engine = TweenEngine::build(header_spec(), driver.clone()).unwrap();

    engine.stop();
    engine.stop();
    assert!(!engine.is_running());
    assert_eq!(engine.progress().get(), 0.0);

    engine.play();
    engine.stop();
    engine.stop();
    assert_eq!(driver.active_count(), 0);
}

#[test]
fn round_trip_restores_from_values_exactly() {
    let driver = Arc::new(FrameDriver::new());
    let spec = AnimationSpec::new(ms(300))
        .property("a", 0.1, 0.7)
        .property("b", -13.37, 1e6)
        .property("c", 3.0, 3.0)
        .with_easing(Easing::new(|t| 1.0 - (1.0 - t).powi(3)));
    let engine = TweenEngine::build(spec.clone(), driver.clone()).unwrap();
    let original = engine.values();

    engine.play();
    driver.run_until_idle();
    for name in spec.property_names() {
        assert_eq!(engine.value(name), spec.endpoints(name).map(|(_, to)| to));
    }

    engine.play_backward();
    driver.run_until_idle();
    assert_eq!(engine.values(), original);
}

#[test]
fn play_at_target_still_finishes_once() {
    let driver = Arc::new(FrameDriver::new());
    let engine = TweenEngine::build(header_spec().initially_active(true), driver.clone()).unwrap();
    let (finished, on_finish) = counter();

    engine.play_with(on_finish);
    assert!(engine.is_running());

    driver.run_until_idle();
    assert_eq!(engine.progress().get(), 1.0);
    assert_eq!(finished.load(Ordering::SeqCst), 1);
}

#[test]
fn finish_callback_may_chain_the_reverse_run() {
    let driver = Arc::new(FrameDriver::new());
    let engine = TweenEngine::build(header_spec(), driver.clone()).unwrap();
    let (backward, on_backward) = counter();

    let chained = engine.clone();
    engine.play_with(move || chained.play_backward_with(on_backward));

    driver.run_until_idle();
    assert_eq!(backward.load(Ordering::SeqCst), 1);
    assert_eq!(engine.progress().get(), 0.0);
    assert_eq!(engine.direction(), Direction::Backward);
}

#[test]
fn overshoot_easing_leaves_progress_range_transiently() {
    let driver = Arc::new(FrameDriver::new());
    let back_out = Easing::new(|t| {
        let u = t - 1.0;
        1.0 + u * u * (2.70158 * u + 1.70158)
    });
    let spec = AnimationSpec::new(ms(200))
        .property("scale", 1.0, 2.0)
        .with_easing(back_out);
    let engine = TweenEngine::build(spec, driver.clone()).unwrap();

    let peak = Arc::new(parking_lot::Mutex::new(0.0_f64));
    let peak_clone = peak.clone();
    let _guard = engine
        .output("scale")
        .unwrap()
        .subscribe(move |v| {
            let mut peak = peak_clone.lock();
            *peak = peak.max(v);
        });

    engine.play();
    driver.run_until_idle();

    assert!(*peak.lock() > 2.0);
    assert_eq!(engine.value("scale"), Some(2.0));
}

/// A driver that completes every transition as soon as it is started.
struct ImmediateDriver;

impl AnimationDriver for ImmediateDriver {
    fn start(&self, transition: DriverTransition) -> TransitionId {
        transition.sample(transition.value_at(transition.duration()));
        transition.complete();
        TransitionId::default()
    }

    fn cancel(&self, _id: TransitionId) -> bool {
        false
    }

    fn is_active(&self, _id: TransitionId) -> bool {
        false
    }

    fn active_count(&self) -> usize {
        0
    }
}

#[test]
fn synchronous_driver_completes_inside_play() {
    let engine = TweenEngine::build(header_spec(), Arc::new(ImmediateDriver)).unwrap();
    let (finished, on_finish) = counter();

    engine.play_with(on_finish);

    assert_eq!(finished.load(Ordering::SeqCst), 1);
    assert!(!engine.is_running());
    assert_eq!(engine.value("height"), Some(72.0));

    // Nothing to cancel; stop stays a no-op.
    engine.stop();
    assert_eq!(engine.progress().get(), 1.0);
}
