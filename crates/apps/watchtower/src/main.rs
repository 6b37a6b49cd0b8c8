//! Watchtower - A console fleet tracker dashboard
//!
//! Polls the Navixy API on an interval, prints each published snapshot and
//! accepts simple commands on stdin.

use anyhow::Result;
use log::{error, info, warn};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracking::{
    AuthParams, EngineOptions, PollScheduler, RequestClient, SchedulerOptions, Settings,
    TrackerFetcher, UreqTransport, resolve,
};

mod commands;
mod render;

use commands::{Command, HELP};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    // Bootstrap config directory
    if let Err(e) = config::init() {
        error!("Failed to initialize config directory: {}", e);
    }

    let mut settings = Settings::load().unwrap_or_else(|e| {
        warn!("Failed to load settings, using defaults: {:#}", e);
        Settings::default()
    });

    if let Some(path) = Settings::default_path() {
        info!("Settings file: {}", path.display());
    }

    let params = AuthParams::from_env();
    let credentials = resolve(&params);

    let options = EngineOptions::from(&settings);
    if !options.thresholds.is_ordered() {
        warn!(
            "Idle threshold ({}m) is not below dwell threshold ({}m); Idle will never be reported",
            options.thresholds.idle_minutes, options.thresholds.dwell_minutes
        );
    }
    let client = RequestClient::new(
        UreqTransport::new(options.request_timeout),
        options.cluster.base_url(),
        credentials,
        params.fallback_key.clone(),
    )
    .with_timeout(options.request_timeout);
    info!(
        "Using {} cluster at {} (auth mode {}, request timeout {}ms)",
        options.cluster,
        client.base_url(),
        client.auth_mode(),
        client.timeout().as_millis()
    );

    let mut scheduler = PollScheduler::new(
        TrackerFetcher::new(client),
        SchedulerOptions::from(&options),
    );
    let mut snapshots = scheduler.subscribe();
    scheduler.start();

    println!("{}", HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("Interrupted");
                break;
            }
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let latest = snapshots.borrow_and_update().clone();
                if let Some(snapshot) = latest {
                    print!("{}", render::render_snapshot(&snapshot));
                }
            }
            line = lines.next_line(), if stdin_open => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => {
                        info!("Stdin closed, polling until interrupted");
                        stdin_open = false;
                        continue;
                    }
                    Err(e) => {
                        warn!("Failed to read stdin: {}", e);
                        stdin_open = false;
                        continue;
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }

                match line.parse::<Command>() {
                    Ok(Command::Refresh) => {
                        if scheduler.is_busy() {
                            println!("Refresh already in progress");
                        } else {
                            scheduler.spawn_trigger();
                        }
                    }
                    Ok(Command::SetInterval(ms)) => {
                        scheduler.set_interval(Duration::from_millis(ms));
                        settings.refresh_ms = scheduler.interval().as_millis() as u64;
                        if let Err(e) = settings.save() {
                            error!("{:#}", e);
                        }
                        println!("Refreshing every {}ms", settings.refresh_ms);
                    }
                    Ok(Command::Probe) => {
                        let probe = scheduler.spawn_probe();
                        tokio::spawn(async move {
                            if let Ok(connected) = probe.await {
                                println!("{}", if connected { "Connected" } else { "Offline" });
                            }
                        });
                    }
                    Ok(Command::Help) => println!("{}", HELP),
                    Ok(Command::Quit) => break,
                    Err(e) => println!("{}\n{}", e, HELP),
                }
            }
        }
    }

    scheduler.stop();
    info!("Watchtower stopped");
    Ok(())
}
