use anyhow::Result;
use magneto::collector::Collector;
use magneto::config::{AppConfig, InputConfig};
use magneto::decoder::EventDecoder;
use magneto::host_cpu::ProcStatSampler;
use magneto::limits::RuncStateLimits;
use magneto::render::Renderer;
use magneto::snapshot::SharedSnapshot;
use magneto::version;
use std::io::Read;
use std::sync::Arc;
use tokio::time::{MissedTickBehavior, interval};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

fn open_input(input: &InputConfig) -> Result<Box<dyn Read + Send>> {
    if input.is_stdin() {
        return Ok(Box::new(std::io::stdin()));
    }
    let file = std::fs::File::open(&input.path)
        .map_err(|e| anyhow::anyhow!("opening input {}: {}", input.path, e))?;
    Ok(Box::new(file))
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(s) => s,
                Err(_) => {
                    let _ = tokio::signal::ctrl_c().await;
                    return;
                }
            };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries the table; logs go to stderr.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let app_config = AppConfig::load()?;
    tracing::info!(
        input = %app_config.input.path,
        refresh_interval_ms = app_config.display.refresh_interval_ms,
        "{} starting",
        version::banner()
    );

    let input = open_input(&app_config.input)?;

    let snapshot = Arc::new(match app_config.collector.stale_after() {
        Some(timeout) => SharedSnapshot::with_stale_after(timeout),
        None => SharedSnapshot::new(),
    });

    let mut collector = Collector::new(
        ProcStatSampler::new(&app_config.collector.host_stat_path),
        snapshot.clone(),
    );
    if let Some(root) = &app_config.limits.state_root {
        tracing::info!(state_root = %root, "Reading memory limits from runtime state");
        collector = collector.with_limits(Arc::new(RuncStateLimits::new(root)));
    }

    // Decoding blocks on the input indefinitely, so it gets its own thread.
    // It is never joined; on shutdown the pending read is abandoned.
    std::thread::Builder::new()
        .name("collector".into())
        .spawn(move || {
            let reason = collector.run(EventDecoder::new(input));
            tracing::info!(?reason, "Input finished; showing last known stats");
        })?;

    let mut renderer = Renderer::new(std::io::stdout(), app_config.display.clear_screen);
    let mut tick = interval(app_config.refresh_interval());
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = tick.tick() => {
                if let Err(e) = renderer.render(&snapshot.read()) {
                    tracing::warn!(error = %e, operation = "render", "render failed");
                }
            }
            _ = &mut shutdown => {
                tracing::info!("Received shutdown signal, exiting");
                break;
            }
        }
    }

    Ok(())
}
