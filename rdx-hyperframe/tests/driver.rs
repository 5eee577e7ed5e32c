mod common;

use common::{async_recorder, recorder, scheduler, step, CallLog, RecordingSink, SharedScene};
use hyperframe::components::{step as sequence_step, FnComponent, Interval, RepetitionPolicy, Sequence};
use hyperframe::prelude::*;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn run_until_paces_frames_and_clears_on_shutdown() {
    let config = SchedulerConfig {
        frame_rate: FrameRate::Custom {
            frames_per_second: 10,
        },
        ..SchedulerConfig::default()
    };
    let sink = RecordingSink::default();
    let mut scheduler = Scheduler::new(config).with_error_sink(sink.clone());
    let mut system_events = scheduler.subscribe_system_events();
    let log = CallLog::default();
    let id = scheduler.register("pulse", recorder("pulse", &log)).unwrap();

    let reason = scheduler
        .run_until(async {
            tokio::time::sleep(Duration::from_millis(250)).await;
            "deadline"
        })
        .await;

    assert_eq!(reason, "deadline");
    assert_eq!(scheduler.frame_count(), 3);
    assert_eq!(log.count("pulse:update"), 3);
    assert_eq!(log.count("pulse:dispose"), 1);
    assert_eq!(scheduler.state(id), None);
    assert!(sink.reports().is_empty());

    assert!(matches!(
        system_events.try_recv().unwrap(),
        SystemEvent::FrameLoopStarted { .. }
    ));
    assert!(matches!(
        system_events.try_recv().unwrap(),
        SystemEvent::Cleared { removed: 1 }
    ));
    assert!(matches!(
        system_events.try_recv().unwrap(),
        SystemEvent::FrameLoopStopped { frames: 3 }
    ));
}

#[tokio::test(start_paused = true)]
async fn driven_deltas_come_from_the_system_clock() {
    let config = SchedulerConfig {
        frame_rate: FrameRate::Custom {
            frames_per_second: 20,
        },
        ..SchedulerConfig::default()
    };
    let mut scheduler = Scheduler::new(config);
    let elapsed = Arc::new(Mutex::new(0.0));
    let total = elapsed.clone();
    scheduler
        .register(
            "stopwatch",
            FnComponent::new().on_update(move |_ctx, delta| {
                *total.lock().unwrap() += delta;
                Ok(())
            }),
        )
        .unwrap();

    scheduler
        .run_until(tokio::time::sleep(Duration::from_millis(520)))
        .await;

    // Eleven frames: one at t=0 and one every 50ms after it.
    assert_eq!(scheduler.frame_count(), 11);
    let measured = *elapsed.lock().unwrap();
    assert!((measured - 0.5).abs() < 1e-6, "measured {measured}");
}

#[test]
fn clear_disposes_live_components_and_abandons_initializing_ones() {
    let (mut scheduler, clock, sink) = scheduler();
    let log = CallLog::default();
    let mut system_events = scheduler.subscribe_system_events();
    let active = scheduler.register("active", recorder("active", &log)).unwrap();
    scheduler.register_child(active, "child", recorder("child", &log)).unwrap();
    let (task, _completer) = InitTask::channel();
    scheduler.register("loading", async_recorder("loading", &log, task)).unwrap();
    step(&mut scheduler, &clock);
    let fresh = scheduler.register("fresh", recorder("fresh", &log)).unwrap();
    log.clear();

    scheduler.clear();

    assert!(scheduler.registry().is_empty());
    assert_eq!(
        log.entries(),
        vec!["active:dispose", "child:dispose", "fresh:dispose"]
    );
    assert_eq!(scheduler.state(fresh), None);
    assert!(sink.reports().is_empty());
    assert!(matches!(
        system_events.try_recv().unwrap(),
        SystemEvent::Cleared { removed: 4 }
    ));

    scheduler.register("active", recorder("active", &log)).unwrap();
    step(&mut scheduler, &clock);
    assert_eq!(log.count("active:start"), 1);
}

#[test]
fn children_spawned_by_a_dispose_hook_are_torn_down_too() {
    let (mut scheduler, clock, _sink) = scheduler();
    let log = CallLog::default();
    let spawn_log = log.clone();
    scheduler
        .register(
            "phoenix",
            FnComponent::new().on_dispose(move |ctx| {
                ctx.spawn_child("ash", common::recorder("ash", &spawn_log))?;
                Ok(())
            }),
        )
        .unwrap();
    step(&mut scheduler, &clock);

    scheduler.clear();

    assert!(scheduler.registry().is_empty());
    assert_eq!(scheduler.lookup("ash"), None);
    assert_eq!(log.entries(), vec!["ash:dispose"]);
}

#[test]
fn render_applies_resizes_before_drawing() {
    let scene = SharedScene::default();
    let clock = ManualClock::new();
    let mut scheduler = Scheduler::default()
        .with_clock(clock.clone())
        .with_scene(scene.clone());

    scheduler.frame();
    assert_eq!(scene.inspect(|s| (s.draws(), s.viewport())), (1, None));

    scheduler.resize(Viewport::new(640, 480));
    scheduler.resize(Viewport::new(1920, 1080));
    assert_eq!(scene.inspect(|s| s.viewport()), None);

    scheduler.frame();
    scheduler.frame();
    assert_eq!(
        scene.inspect(|s| (s.draws(), s.viewport())),
        (3, Some(Viewport::new(1920, 1080)))
    );
    assert_eq!(scheduler.frame_count(), 3);
}

#[test]
fn hooks_reach_the_scene_through_their_context() {
    let scene = SharedScene::default();
    let clock = ManualClock::new();
    let mut scheduler = Scheduler::default()
        .with_clock(clock.clone())
        .with_scene(scene.clone());
    let node = Arc::new(Mutex::new(None));
    let (added, removed) = (node.clone(), node.clone());
    let id = scheduler
        .register(
            "sprite",
            FnComponent::new()
                .on_start(move |ctx| {
                    let label = format!("{}#{}", ctx.name(), ctx.frame().frame);
                    *added.lock().unwrap() = Some(ctx.scene().add_node(&label));
                    Ok(())
                })
                .on_dispose(move |ctx| {
                    if let Some(handle) = removed.lock().unwrap().take() {
                        ctx.scene().remove_node(handle);
                    }
                    Ok(())
                }),
        )
        .unwrap();

    scheduler.frame();
    assert_eq!(
        scene.inspect(|s| s.labels().map(str::to_string).collect::<Vec<_>>()),
        vec!["sprite#0".to_string()]
    );

    scheduler.request_removal(id);
    scheduler.frame();
    assert_eq!(scene.inspect(|s| s.node_count()), 0);
    assert!(node.lock().unwrap().is_none());
}

#[test]
fn a_finished_sequence_removes_itself() {
    let (mut scheduler, clock, _sink) = scheduler();
    let log = CallLog::default();
    let (first, second) = (log.clone(), log.clone());
    let id = scheduler
        .register(
            "intro",
            Sequence::new(
                Duration::from_millis(100),
                vec![
                    sequence_step(move |_ctx| {
                        first.push("fade-in");
                        Ok(())
                    }),
                    sequence_step(move |_ctx| {
                        second.push("title");
                        Ok(())
                    }),
                ],
                RepetitionPolicy::RunOnce,
            ),
        )
        .unwrap();

    for _ in 0..2 {
        clock.advance(Duration::from_millis(100));
        scheduler.update();
    }
    assert_eq!(log.entries(), vec!["fade-in", "title"]);
    assert_eq!(scheduler.state(id), Some(LifecycleState::PendingRemoval));

    clock.advance(Duration::from_millis(100));
    scheduler.update();
    assert_eq!(scheduler.state(id), None);
    assert_eq!(log.entries(), vec!["fade-in", "title"]);
}

#[test]
fn an_interval_only_counts_time_while_enabled() {
    let (mut scheduler, clock, _sink) = scheduler();
    let fired = Arc::new(AtomicU32::new(0));
    let counter = fired.clone();
    let id = scheduler
        .register(
            "autosave",
            Interval::new(Duration::from_millis(300), move |_ctx| {
                counter.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }),
        )
        .unwrap();

    for _ in 0..3 {
        clock.advance(Duration::from_millis(100));
        scheduler.update();
    }
    assert_eq!(fired.load(Ordering::Relaxed), 1);

    scheduler.set_enabled(id, false);
    for _ in 0..10 {
        clock.advance(Duration::from_millis(100));
        scheduler.update();
    }
    assert_eq!(fired.load(Ordering::Relaxed), 1);

    scheduler.set_enabled(id, true);
    clock.advance(Duration::from_millis(100));
    scheduler.update();
    assert_eq!(fired.load(Ordering::Relaxed), 1);
}
