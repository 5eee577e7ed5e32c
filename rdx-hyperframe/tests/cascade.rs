mod common;

use anyhow::bail;
use common::{async_recorder, recorder, scheduler, step, CallLog};
use hyperframe::components::FnComponent;
use hyperframe::prelude::*;
use std::sync::{Arc, Mutex};

#[test]
fn removing_a_parent_disposes_every_descendant_once() {
    let (mut scheduler, clock, _sink) = scheduler();
    let log = CallLog::default();
    let root = scheduler.register("root", recorder("root", &log)).unwrap();
    let arm = scheduler.register_child(root, "arm", recorder("arm", &log)).unwrap();
    let hand = scheduler.register_child(arm, "hand", recorder("hand", &log)).unwrap();
    scheduler.register_child(hand, "finger", recorder("finger", &log)).unwrap();
    scheduler.register_child(root, "leg", recorder("leg", &log)).unwrap();
    let bystander = scheduler.register("bystander", recorder("bystander", &log)).unwrap();
    step(&mut scheduler, &clock);
    assert_eq!(scheduler.registry().descendants(root).len(), 4);
    log.clear();

    scheduler.request_removal(root);
    step(&mut scheduler, &clock);

    assert_eq!(
        log.entries(),
        vec![
            "root:dispose",
            "arm:dispose",
            "leg:dispose",
            "hand:dispose",
            "finger:dispose",
            "bystander:update",
        ]
    );
    assert_eq!(scheduler.registry().len(), 1);
    assert_eq!(scheduler.state(bystander), Some(LifecycleState::Active));

    step(&mut scheduler, &clock);
    for label in ["root", "arm", "hand", "finger", "leg"] {
        assert_eq!(log.count(&format!("{label}:dispose")), 1, "{label}");
    }
}

#[test]
fn removing_a_child_leaves_its_ancestors_alone() {
    let (mut scheduler, clock, _sink) = scheduler();
    let log = CallLog::default();
    let root = scheduler.register("root", recorder("root", &log)).unwrap();
    let mid = scheduler.register_child(root, "mid", recorder("mid", &log)).unwrap();
    let leaf = scheduler.register_child(mid, "leaf", recorder("leaf", &log)).unwrap();
    step(&mut scheduler, &clock);

    scheduler.request_removal(mid);
    step(&mut scheduler, &clock);

    assert_eq!(scheduler.state(root), Some(LifecycleState::Active));
    assert_eq!(scheduler.state(mid), None);
    assert_eq!(scheduler.state(leaf), None);
    assert!(scheduler.registry().children(root).is_empty());
    assert_eq!(log.count("root:dispose"), 0);
}

#[test]
fn children_spawned_in_start_update_no_earlier_than_their_parent() {
    let (mut scheduler, clock, _sink) = scheduler();
    let log = CallLog::default();
    let spawn_log = log.clone();
    let update_log = log.clone();
    let squad = scheduler
        .register(
            "squad",
            FnComponent::new()
                .on_start(move |ctx| {
                    for index in 0..2 {
                        let label = format!("member-{index}");
                        ctx.spawn_child(label.clone(), common::recorder(&label, &spawn_log))?;
                    }
                    Ok(())
                })
                .on_update(move |_ctx, _delta| {
                    update_log.push("squad:update");
                    Ok(())
                }),
        )
        .unwrap();

    step(&mut scheduler, &clock);
    assert_eq!(log.entries(), vec!["squad:update"]);
    let members = scheduler.registry().children(squad).to_vec();
    assert_eq!(members.len(), 2);
    for &member in &members {
        assert_eq!(scheduler.state(member), Some(LifecycleState::PendingStart));
        assert_eq!(scheduler.registry().parent(member), Some(squad));
    }
    log.clear();

    step(&mut scheduler, &clock);
    assert_eq!(
        log.entries(),
        vec![
            "member-0:start",
            "member-1:start",
            "squad:update",
            "member-0:update",
            "member-1:update",
        ]
    );
}

#[test]
fn a_failed_start_takes_its_children_with_it() {
    let (mut scheduler, clock, sink) = scheduler();
    let log = CallLog::default();
    let spawn_log = log.clone();
    let parent = scheduler
        .register(
            "doomed",
            FnComponent::new().on_start(move |ctx| {
                ctx.spawn_child("heir", common::recorder("heir", &spawn_log))?;
                bail!("out of memory")
            }),
        )
        .unwrap();

    step(&mut scheduler, &clock);

    assert_eq!(scheduler.state(parent), None);
    assert_eq!(scheduler.lookup("heir"), None);
    assert_eq!(log.entries(), vec!["heir:dispose"]);
    assert_eq!(sink.kinds(), vec![ErrorKind::StartError]);
}

#[test]
fn registering_under_a_dead_parent_fails() {
    let (mut scheduler, clock, _sink) = scheduler();
    let log = CallLog::default();
    let parent = scheduler.register("parent", recorder("parent", &log)).unwrap();
    step(&mut scheduler, &clock);
    scheduler.request_removal(parent);
    step(&mut scheduler, &clock);

    let err = scheduler
        .register_child(parent, "late", recorder("late", &log))
        .unwrap_err();

    assert_eq!(err, RegistrationError::UnknownParent(parent));
    assert_eq!(scheduler.lookup("late"), None);
}

#[test]
fn dispose_hooks_still_see_their_children() {
    let (mut scheduler, clock, _sink) = scheduler();
    let log = CallLog::default();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let witness = seen.clone();
    let fleet = scheduler
        .register(
            "fleet",
            FnComponent::new().on_dispose(move |ctx| {
                let states = ctx
                    .children()
                    .iter()
                    .map(|&id| ctx.state(id))
                    .collect::<Vec<_>>();
                witness.lock().unwrap().extend(states);
                Ok(())
            }),
        )
        .unwrap();
    scheduler.register_child(fleet, "ship", recorder("ship", &log)).unwrap();
    step(&mut scheduler, &clock);

    scheduler.request_removal(fleet);
    step(&mut scheduler, &clock);

    assert_eq!(
        seen.lock().unwrap().clone(),
        vec![Some(LifecycleState::Active)]
    );
    assert_eq!(log.count("ship:dispose"), 1);
}

#[test]
fn a_self_removing_child_detaches_from_its_parent() {
    let (mut scheduler, clock, _sink) = scheduler();
    let log = CallLog::default();
    let parent = scheduler.register("parent", recorder("parent", &log)).unwrap();
    scheduler
        .register_child(
            parent,
            "mayfly",
            FnComponent::new().on_update(|ctx, _delta| {
                ctx.remove_self();
                Ok(())
            }),
        )
        .unwrap();

    step(&mut scheduler, &clock);
    step(&mut scheduler, &clock);

    assert!(scheduler.registry().children(parent).is_empty());
    assert_eq!(scheduler.lookup("mayfly"), None);
    assert_eq!(scheduler.state(parent), Some(LifecycleState::Active));
}

#[test]
fn a_loading_child_is_abandoned_with_its_parent() {
    let (mut scheduler, clock, sink) = scheduler();
    let log = CallLog::default();
    let mut events = scheduler.subscribe_lifecycle_events();
    let (task, completer) = InitTask::channel();
    let parent = scheduler.register("level", recorder("level", &log)).unwrap();
    let child = scheduler
        .register_child(parent, "streamer", async_recorder("streamer", &log, task))
        .unwrap();
    step(&mut scheduler, &clock);
    assert_eq!(scheduler.state(child), Some(LifecycleState::Initializing));
    while events.try_recv().is_ok() {}

    scheduler.request_removal(parent);
    step(&mut scheduler, &clock);

    assert_eq!(scheduler.state(child), None);
    assert_eq!(scheduler.lookup("streamer"), None);
    assert!(scheduler.registry().is_empty());
    assert_eq!(log.count("streamer:dispose"), 0);
    assert_eq!(log.count("level:dispose"), 1);
    assert!(sink.reports().is_empty());
    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }
    assert!(seen.contains(&LifecycleEvent::Dropped { id: child }));

    // The load finishing later has nothing left to resume.
    completer.succeed();
    step(&mut scheduler, &clock);
    assert_eq!(scheduler.lookup("streamer"), None);
    assert_eq!(log.count("streamer:update"), 0);
}
