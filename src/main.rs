//! overlay-borders
//!
//! Reads overlay commands from stdin, one per line, and draws a single
//! highlight border. See `overlay_borders::driver::line` for the protocol.
//! The border stays up after stdin closes, until `quit`, SIGTERM or SIGINT.

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter};

use overlay_borders::config::{Config, LoggingConfig};
use overlay_borders::driver::{read_lines, LineDriver};
use overlay_borders::overlay::x11::X11Backend;
use overlay_borders::registry::OverlayRegistry;

/// Command line overrides
#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    display: Option<String>,
    screen: Option<usize>,
}

impl Args {
    fn parse() -> Result<Self> {
        let mut args = Self::default();
        let mut iter = std::env::args().skip(1);
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--config" | "-c" => {
                    args.config = Some(iter.next().context("--config needs a path")?.into());
                }
                "--display" | "-d" => {
                    args.display = Some(iter.next().context("--display needs a name")?);
                }
                "--screen" | "-s" => {
                    let screen = iter.next().context("--screen needs a number")?;
                    args.screen = Some(
                        screen
                            .parse()
                            .with_context(|| format!("Invalid screen number {:?}", screen))?,
                    );
                }
                other => anyhow::bail!("Unknown argument {:?}", other),
            }
        }
        Ok(args)
    }
}

/// RUST_LOG wins over the configured filter
fn log_filter(rust_log: Option<&str>, logging: &LoggingConfig) -> String {
    rust_log.map_or_else(|| logging.filter.clone(), str::to_string)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse()?;

    // Initialize logging (stderr: stdin/stdout belong to the controller).
    // Starts on the default filter so config loading is logged too.
    let rust_log = std::env::var("RUST_LOG").ok();
    let (filter, filter_handle) = reload::Layer::new(EnvFilter::new(log_filter(
        rust_log.as_deref(),
        &LoggingConfig::default(),
    )));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load().context("Failed to load configuration")?,
    };
    if args.display.is_some() {
        config.display.name = args.display;
    }
    if args.screen.is_some() {
        config.display.screen = args.screen;
    }
    filter_handle
        .reload(EnvFilter::new(log_filter(rust_log.as_deref(), &config.logging)))
        .context("Failed to apply configured log filter")?;

    info!("Starting overlay-borders");

    let display = config.display.name.clone();
    let screen = config.display.screen;
    let class = config.window.class.clone();
    let registry = OverlayRegistry::spawn(move || {
        X11Backend::connect(display.as_deref(), screen, &class)
    })
    .context("Failed to start overlay backend")?;

    let mut driver = LineDriver::new(registry);

    // Setup signal handlers for graceful shutdown
    let (shutdown_tx, mut shutdown_rx) = tokio::sync::mpsc::channel::<()>(1);

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;
        let tx = shutdown_tx.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down gracefully");
                    let _ = tx.send(()).await;
                }
                _ = sigint.recv() => {
                    info!("Received SIGINT, shutting down gracefully");
                    let _ = tx.send(()).await;
                }
            }
        });
    }

    let lines = read_lines(std::io::BufReader::new(std::io::stdin()))
        .context("Failed to start stdin reader")?;
    let result = driver
        .serve(lines, async move {
            let _ = shutdown_rx.recv().await;
        })
        .await;

    // Closes whatever is still on screen
    driver.shutdown();
    drop(shutdown_tx);

    match result {
        Ok(exit) => {
            info!("Exiting ({:?})", exit);
            Ok(())
        }
        Err(e) => {
            error!("Failed to read commands: {}", e);
            Err(e).context("Failed to read stdin")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_filter_prefers_rust_log() {
        let logging = LoggingConfig {
            filter: "overlay_borders=trace".to_string(),
        };
        assert_eq!(log_filter(Some("debug"), &logging), "debug");
        assert_eq!(log_filter(None, &logging), "overlay_borders=trace");
    }

    #[test]
    fn test_startup_filter_is_the_default() {
        assert_eq!(
            log_filter(None, &LoggingConfig::default()),
            "overlay_borders=info,warn"
        );
    }
}
