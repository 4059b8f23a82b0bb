// Copyright 2025 Lablup Inc. and Jeongkyu Shin
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::sync::{Arc, Mutex};

use chrono::Local;
use clap::Parser;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use nvidia_util::cli::{Cli, Commands, WatchArgs};
use nvidia_util::device::platform_detection::{
    has_nvidia_settings, has_nvidia_smi, has_optirun,
};
use nvidia_util::view::TickFn;
use nvidia_util::{AppContext, PollScheduler, Result, Settings};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nvidia_util=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let path = cli.settings_path()?;

    if let Some(Commands::Toggle(args)) = &cli.command {
        // Overrides are not persisted
        let mut settings = Settings::load(&path)?;
        let active = settings.toggle(args.slot);
        settings.save(&path)?;
        println!(
            "Slot {} is now {}",
            args.slot,
            if active { "active" } else { "inactive" }
        );
        return Ok(());
    }

    let mut settings = Settings::load(&path)?;
    cli.apply_overrides(&mut settings);
    settings.validate()?;

    match cli.command {
        Some(Commands::List) => list(settings),
        Some(Commands::Settings) => open_settings(settings),
        Some(Commands::Watch(args)) => watch(settings, &args).await,
        Some(Commands::Toggle(_)) => Ok(()),
        None => watch(settings, &WatchArgs::default()).await,
    }
}

fn list(settings: Settings) -> Result<()> {
    for (tool, found) in [
        ("nvidia-smi", has_nvidia_smi()),
        ("nvidia-settings", has_nvidia_settings()),
        ("optirun", has_optirun()),
    ] {
        println!("{tool}: {}", if found { "found" } else { "not found" });
    }

    let ctx = AppContext::init(settings)?;
    if let Some(provider) = ctx.provider() {
        println!("provider: {}", provider.name());
    }
    for name in ctx.gpu_names().iter().take(ctx.gpu_count()) {
        println!("{name}");
    }

    Ok(())
}

fn open_settings(settings: Settings) -> Result<()> {
    let mut ctx = AppContext::init(settings)?;
    ctx.open_settings();

    if let Some(notification) = ctx.notifications_mut().take() {
        eprintln!("{notification}");
    }

    Ok(())
}

fn print_tick(ctx: &mut AppContext) {
    println!("[{}]", Local::now().format("%H:%M:%S"));
    for line in ctx.display().render() {
        println!("  {line}");
    }
    if !ctx.display().is_visible() {
        println!("  (no active properties)");
    }
    if let Some(notification) = ctx.notifications_mut().take() {
        eprintln!("{notification}");
    }
}

async fn watch(settings: Settings, args: &WatchArgs) -> Result<()> {
    let interval = settings.refresh_interval();
    let mut ctx = AppContext::init(settings)?;

    let properties = ctx
        .provider()
        .map(|p| p.retrieve_properties().to_vec())
        .unwrap_or_default();
    for (slot, property) in properties.iter().enumerate() {
        let state = if ctx.settings().is_active(slot) { "" } else { " (inactive)" };
        info!("slot {slot}: {}{state}", property.name());
    }

    if args.once {
        ctx.tick();
        print_tick(&mut ctx);
        ctx.teardown();
        return Ok(());
    }

    let ctx = Arc::new(Mutex::new(ctx));
    let tick_ctx = ctx.clone();
    let tick: TickFn = Arc::new(move || match tick_ctx.lock() {
        Ok(mut ctx) => {
            ctx.tick();
            print_tick(&mut ctx);
        }
        Err(e) => error!("Application state is poisoned: {e}"),
    });

    let mut scheduler = PollScheduler::new();
    scheduler.start(interval, tick).await;

    if let Err(e) = signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C: {e}");
    }

    // Stop polling before tearing down
    scheduler.stop().await;
    match ctx.lock() {
        Ok(mut ctx) => ctx.teardown(),
        Err(e) => error!("Application state is poisoned: {e}"),
    }

    Ok(())
}
