//! Component kinds the shell can register, one per lifecycle path.

use anyhow::{anyhow, bail};
use hyperframe::components::FnComponent;
use hyperframe::prelude::*;
use std::time::Duration;

/// Counts its updates and reports every tenth one.
pub fn ticker() -> FnComponent {
    let mut updates = 0u64;
    FnComponent::new()
        .on_update(move |ctx, _delta| {
            updates += 1;
            if updates % 10 == 0 {
                println!("<-- [TICKER] '{}' reached {} updates", ctx.name(), updates);
            }
            Ok(())
        })
        .on_dispose(|ctx| {
            println!("<-- [TICKER] '{}' disposed", ctx.name());
            Ok(())
        })
}

/// Settles its start after `delay` of wall-clock time.
pub fn loader(delay: Duration) -> FnComponent {
    FnComponent::new()
        .on_start_async(move |_ctx| {
            Ok(InitTask::spawn(async move {
                tokio::time::sleep(delay).await;
                anyhow::Ok(())
            }))
        })
        .on_dispose(|ctx| {
            println!("<-- [LOADER] '{}' disposed", ctx.name());
            Ok(())
        })
}

pub fn broken_start() -> FnComponent {
    FnComponent::new()
        .on_start(|_ctx| bail!("refusing to start"))
        .on_dispose(|ctx| {
            println!("<-- [BROKEN] '{}' disposed (this should never print)", ctx.name());
            Ok(())
        })
}

pub fn broken_async() -> FnComponent {
    FnComponent::new()
        .on_start_async(|_ctx| Ok(InitTask::failed(anyhow!("asset server unreachable"))))
        .on_dispose(|ctx| {
            println!("<-- [BROKEN] '{}' disposed (this should never print)", ctx.name());
            Ok(())
        })
}

/// Fails on its `fail_on`-th update, which disables it.
pub fn flaky(fail_on: u32) -> FnComponent {
    let mut updates = 0u32;
    FnComponent::new().on_update(move |_ctx, _delta| {
        updates += 1;
        if updates == fail_on {
            bail!("update #{updates} went wrong");
        }
        Ok(())
    })
}

/// Spawns `members` tickers as children when it starts.
pub fn group(members: u32) -> FnComponent {
    FnComponent::new().on_start(move |ctx| {
        let prefix = ctx.name().to_string();
        for index in 0..members {
            ctx.spawn_child(format!("{prefix}/{index}"), ticker())?;
        }
        Ok(())
    })
}
