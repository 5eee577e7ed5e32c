use anyhow::{anyhow, Result};
use colored::Colorize;
use hyperframe::prelude::*;
use hyperframe::{ENGINE_NAME, VERSION as LIB_VERSION};
use rustyline::highlight::Highlighter;
use rustyline::Editor;
use rustyline_derive::{Completer, Helper, Hinter, Validator};
use std::borrow::Cow;
use std::env;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod demo;

const SHELL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// A custom helper struct for rustyline that enables syntax highlighting.
#[derive(Completer, Helper, Hinter, Validator)]
struct CommandHighlighter;

impl Highlighter for CommandHighlighter {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if let Some((command, rest)) = line.split_once(' ') {
            let colored_command = command.yellow().bold();
            let colored_rest = rest.yellow();
            Cow::Owned(format!("{} {}", colored_command, colored_rest))
        } else {
            Cow::Owned(line.yellow().bold().to_string())
        }
    }
    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

fn print_banner() {
    if env::var("QUIET_MODE").is_ok() {
        return;
    }
    println!("{}", format!("  {} frameshell", ENGINE_NAME).cyan().bold());

    let version_string = format!(
        "          Shell   v{:<8} Library   v{:<8}",
        SHELL_VERSION, LIB_VERSION
    );
    println!("{}", "-----------------------------------------------------------------".dimmed());

    let license_blurb = "
    This software is provided 'as is', without warranty of any kind.
    Distributed under the MIT OR Apache-2.0 license. Use at your own risk.
    ";

    println!("{}", version_string);
    println!("{}", license_blurb.dimmed());
    println!("{}", "-----------------------------------------------------------------".dimmed());
}

/// Prints lifecycle events as they happen, between prompts.
fn spawn_event_listeners(scheduler: &Scheduler) {
    let mut lifecycle_rx = scheduler.subscribe_lifecycle_events();
    tokio::spawn(async move {
        while let Ok(event) = lifecycle_rx.recv().await {
            println!("{}", format!("<-- [LIFECYCLE] {:?}", event).dimmed());
        }
    });
}

fn print_help() {
    println!("Available commands:");
    println!("  add ticker <NAME> [PARENT]        - Sync component that counts its updates.");
    println!("  add loader <NAME> <S> [PARENT]    - Async start that settles after S seconds.");
    println!("  add broken-start <NAME> [PARENT]  - Start hook fails synchronously.");
    println!("  add broken-async <NAME> [PARENT]  - Async start that fails.");
    println!("  add flaky <NAME> <N> [PARENT]     - Update fails on its N-th call.");
    println!("  add group <NAME> <N> [PARENT]     - Spawns N tickers as children on start.");
    println!("  remove <NAME>                     - Requests removal (cascades to children).");
    println!("  enable <NAME> | disable <NAME>    - Toggles the enabled flag.");
    println!("  step [N]                          - Runs N frames (default 1).");
    println!("  list                              - Shows every component and its state.");
    println!("  clear                             - Tears everything down immediately.");
    println!("  exit                              - Quits the shell.");
}

fn print_list(scheduler: &Scheduler) {
    let entries = scheduler.snapshot();
    println!("Components (frame #{}):", scheduler.frame_count());
    if entries.is_empty() {
        println!("  (none)");
    }
    for entry in entries {
        let parent = entry
            .parent
            .and_then(|id| scheduler.registry().name(id).map(str::to_string))
            .map(|name| format!(" child of '{}'", name))
            .unwrap_or_default();
        let enabled = if entry.enabled { "" } else { " [disabled]" };
        println!(
            "  {:<24} {:<16}{}{}",
            entry.name,
            entry.state.to_string().green(),
            enabled.red(),
            parent.dimmed()
        );
    }
}

/// Resolves an optional parent name argument to a handle.
fn parent_arg(scheduler: &Scheduler, arg: Option<&&str>) -> Result<Option<ComponentId>> {
    match arg {
        Some(name) => scheduler
            .lookup(name)
            .map(Some)
            .ok_or_else(|| anyhow!("no component named '{}'", name)),
        None => Ok(None),
    }
}

fn handle_add(scheduler: &mut Scheduler, args: &[&str]) -> Result<()> {
    let (Some(kind), Some(name)) = (args.first(), args.get(1)) else {
        return Err(anyhow!("usage: add <KIND> <NAME> ..., see 'help'"));
    };
    // The parent name follows the kind-specific arguments.
    let (component, parent_at) = match *kind {
        "ticker" => (demo::ticker(), 2),
        "broken-start" => (demo::broken_start(), 2),
        "broken-async" => (demo::broken_async(), 2),
        "loader" => {
            let seconds: f64 = kind_arg(args, "<SECONDS>")?.parse()?;
            (demo::loader(Duration::try_from_secs_f64(seconds)?), 3)
        }
        "flaky" => (demo::flaky(kind_arg(args, "<N>")?.parse()?), 3),
        "group" => (demo::group(kind_arg(args, "<N>")?.parse()?), 3),
        other => return Err(anyhow!("unknown component kind '{}'", other)),
    };
    let parent = parent_arg(scheduler, args.get(parent_at))?;
    register(scheduler, name, parent, component).map(|_| ())
}

/// The argument after the name, required by some component kinds.
fn kind_arg<'a>(args: &[&'a str], usage: &str) -> Result<&'a str> {
    args.get(2)
        .copied()
        .ok_or_else(|| anyhow!("usage: add {} <NAME> {} [PARENT]", args[0], usage))
}

fn register(
    scheduler: &mut Scheduler,
    name: &str,
    parent: Option<ComponentId>,
    component: impl Component,
) -> Result<ComponentId> {
    let id = match parent {
        Some(parent) => scheduler.register_child(parent, name, component)?,
        None => scheduler.register(name, component)?,
    };
    println!("--> Registered '{}' as {:?}.", name, id);
    Ok(id)
}

fn handle_named(scheduler: &Scheduler, args: &[&str], usage: &str) -> Result<ComponentId> {
    let name = args.first().ok_or_else(|| anyhow!("usage: {}", usage))?;
    scheduler
        .lookup(name)
        .ok_or_else(|| anyhow!("no component named '{}'", name))
}

/// Executes one command line. Returns `false` when the shell should exit.
fn execute(scheduler: &mut Scheduler, line: &str) -> Result<bool> {
    let args = line.split_whitespace().collect::<Vec<_>>();
    let Some((command, rest)) = args.split_first() else {
        return Ok(true);
    };
    match *command {
        "add" => handle_add(scheduler, rest)?,
        "remove" => {
            let id = handle_named(scheduler, rest, "remove <NAME>")?;
            scheduler.request_removal(id);
            println!("--> Removal requested; it happens on the next frame.");
        }
        "enable" | "disable" => {
            let id = handle_named(scheduler, rest, "enable|disable <NAME>")?;
            scheduler.set_enabled(id, *command == "enable");
            println!("--> '{}' is now {}d.", rest[0], command);
        }
        "step" => {
            let frames: u64 = match rest.first() {
                Some(n) => n.parse()?,
                None => 1,
            };
            for _ in 0..frames {
                scheduler.frame();
            }
            println!("--> Advanced to frame #{}.", scheduler.frame_count());
        }
        "list" => print_list(scheduler),
        "clear" => {
            scheduler.clear();
            println!("--> Cleared.");
        }
        "help" => print_help(),
        "exit" => return Ok(false),
        other => println!("Unknown command: '{}'. Type 'help'.", other),
    }
    Ok(true)
}

#[tokio::main]
async fn main() -> Result<()> {
    print_banner();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_target(false)
        .init();

    let config = SchedulerConfig::load("hyperframe.toml")?;
    let mut scheduler = Scheduler::new(config);
    spawn_event_listeners(&scheduler);
    info!("{} scheduler ready.", ENGINE_NAME);

    let mut rl = Editor::new()?;
    rl.set_helper(Some(CommandHighlighter));

    println!(
        "{} frameshell is running. Frames only advance on 'step'. Type 'help' for commands.",
        ENGINE_NAME.cyan()
    );

    loop {
        let prompt = format!("{}", ">> ".cyan().bold());
        match rl.readline(&prompt) {
            Ok(line) => {
                rl.add_history_entry(line.as_str())?;
                match execute(&mut scheduler, line.trim()) {
                    Ok(true) => {}
                    Ok(false) => break,
                    Err(e) => println!("{} {}", "Error:".red().bold(), e),
                }
                // Give the event printer a chance to run before the next prompt.
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            Err(_) => break,
        }
    }

    println!("Exiting frameshell...");
    scheduler.clear();
    Ok(())
}
