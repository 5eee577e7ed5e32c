use anyhow::{bail, Result};
use colored::Colorize;
use hyperframe::assets::FsAssets;
use hyperframe::components::{step, AssetNode, FnComponent, Interval, RepetitionPolicy, Sequence};
use hyperframe::prelude::*;
use hyperframe::{ENGINE_NAME, VERSION};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    info!("{} v{}", ENGINE_NAME.cyan(), VERSION);

    // 2. Load the configuration. A missing file means defaults.
    let config = SchedulerConfig::load("hyperframe.toml")?;

    // 3. Create the scheduler.
    let mut scheduler = Scheduler::new(config);
    scheduler.resize(Viewport::new(1280, 720));

    // 4. Spawn concurrent tasks to listen to the event streams.
    spawn_event_listeners(&scheduler);

    // 5. Register demo components to exercise the lifecycle.
    register_demo_components(&mut scheduler)?;

    // 6. Run the frame loop. It tears everything down on Ctrl+C.
    scheduler.run().await?;

    Ok(())
}

/// Spawns tasks that log the scheduler's event streams.
fn spawn_event_listeners(scheduler: &Scheduler) {
    let mut system_rx = scheduler.subscribe_system_events();
    tokio::spawn(async move {
        while let Ok(event) = system_rx.recv().await {
            info!("[SYSTEM] => {:?}", event);
        }
    });

    let mut lifecycle_rx = scheduler.subscribe_lifecycle_events();
    tokio::spawn(async move {
        while let Ok(event) = lifecycle_rx.recv().await {
            info!("[LIFECYCLE] => {:?}", event);
        }
    });
}

/// Registers one component per interesting lifecycle path.
fn register_demo_components(scheduler: &mut Scheduler) -> Result<()> {
    let heartbeat = Arc::new(AtomicU32::new(0));

    // --- A 2-second heartbeat ---
    let counter = heartbeat.clone();
    scheduler.register(
        "heartbeat",
        Interval::new(Duration::from_secs(2), move |_ctx| {
            let beats = counter.fetch_add(1, Ordering::Relaxed) + 1;
            info!("[HEARTBEAT] => beat #{}", beats);
            Ok(())
        }),
    )?;

    // --- A sequence that runs twice and then removes itself ---
    let steps = vec![
        step(|_ctx| {
            info!("[SEQUENCE] => Step 1: warming up...");
            Ok(())
        }),
        step(|_ctx| {
            info!("[SEQUENCE] => Step 2: working...");
            Ok(())
        }),
        step(|_ctx| {
            info!("[SEQUENCE] => Step 3: cooling down.");
            Ok(())
        }),
    ];
    scheduler.register(
        "sequence",
        Sequence::new(Duration::from_secs(1), steps, RepetitionPolicy::RunNTimes(2)),
    )?;

    // --- An asset-backed node with an asynchronous start ---
    let assets = Arc::new(FsAssets::new(env!("CARGO_MANIFEST_DIR")));
    scheduler.register("manifest", AssetNode::new(assets.clone(), "Cargo.toml"))?;

    // --- The same, pointing at a missing file: dropped without dispose ---
    scheduler.register("missing", AssetNode::new(assets, "no/such/asset.bin"))?;

    // --- A component that fails on its fifth update and gets disabled ---
    let mut updates = 0u32;
    scheduler.register(
        "flaky",
        FnComponent::new().on_update(move |_ctx, _delta| {
            updates += 1;
            if updates == 5 {
                bail!("simulated failure after {updates} updates");
            }
            Ok(())
        }),
    )?;

    // --- A parent that spawns children from its start hook ---
    scheduler.register(
        "squad",
        FnComponent::new()
            .on_start(|ctx| {
                for index in 0..3 {
                    ctx.spawn_child(format!("squad/member-{index}"), FnComponent::new())?;
                }
                Ok(())
            })
            .on_dispose(|ctx| {
                info!("[SQUAD] => disbanding {} member(s)", ctx.children().len());
                Ok(())
            }),
    )?;

    Ok(())
}
