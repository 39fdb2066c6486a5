//! `run` command implementation.

use config_loader::{ConfigLoader, ConfigOverrides};
use contracts::{EventSink, NodeConfig};
use dispatcher::naming::{event_log_path, latest_log_path};
use dispatcher::{FanOutSink, JsonlEventSink, LogEventSink};
use node_runtime::{DriveLoop, LoopConfig, NodeRunner};
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::error::{CliError, Result};

/// Execute the `run` command
pub async fn run_node(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    let config = load_effective_config(args)?;

    if args.metrics_port != 0 {
        observability::init_metrics_only(args.metrics_port)?;
    }

    info!(
        node_id = %config.node_id,
        mode = %config.mode,
        input = config.input.kind.as_str(),
        out_dir = %config.output.out_dir.display(),
        "Configuration loaded"
    );

    let mut runner = NodeRunner::new(config.clone(), &args.config);
    let mut sink = build_sink(&config, args.echo_events);

    let run = runner
        .start(&mut sink)
        .map_err(|e| CliError::runtime("failed to start run", e))?;

    let mut source = ingestion::source_from_config(&config.input);
    if let Err(e) = source.open() {
        runner.stop(&mut sink);
        return Err(CliError::runtime("failed to open input source", e));
    }

    let latest = if config.output.write_latest {
        latest_log_path(&run.out_dir).display().to_string()
    } else {
        "disabled".to_string()
    };
    println!(
        "Events: {} (latest: {latest})",
        event_log_path(&run.out_dir, run.wall_start_time.as_nanos()).display()
    );
    println!(
        "Input: {}  tick_hz={}  heartbeat_every_s={}\n",
        config.input.kind.as_str(),
        config.input.tick_hz,
        config.input.heartbeat_every_s
    );

    let drive = DriveLoop::new(LoopConfig::from_node_config(&config));
    let result = drive
        .run(&runner, &mut sink, source.as_mut(), setup_shutdown_signal())
        .await;

    source.close();
    runner.stop(&mut sink);

    let stats = result.map_err(|e| CliError::runtime("run aborted", e))?;
    info!(
        ticks = stats.ticks,
        frames = stats.frames,
        duration_secs = stats.elapsed.as_secs_f64(),
        fps = format!("{:.2}", stats.fps()),
        "Run completed"
    );
    stats.print_summary();
    println!("OK");
    Ok(())
}

/// Load, apply CLI overrides and re-validate
fn load_effective_config(args: &RunArgs) -> Result<NodeConfig> {
    let overrides = ConfigOverrides {
        mode: args.mode,
        dataset_path: args.dataset.clone(),
        out_dir: args.out_dir.clone(),
        node_id: args.node_id.clone(),
    };
    let path = args.config.display().to_string();

    let mut config = ConfigLoader::load_with_overrides(&args.config, &overrides)
        .map_err(|e| CliError::config_load(&path, e))?;

    if let Some(max_ticks) = args.max_ticks {
        config.input.max_ticks = i64::try_from(max_ticks).unwrap_or(i64::MAX);
        config_loader::validate(&config).map_err(|e| CliError::config_load(&path, e))?;
    }
    Ok(config)
}

fn build_sink(config: &NodeConfig, echo_events: bool) -> Box<dyn EventSink> {
    let jsonl = JsonlEventSink::new().with_latest(config.output.write_latest);
    if echo_events {
        Box::new(FanOutSink::new(vec![
            Box::new(jsonl),
            Box::new(LogEventSink::new("echo")),
        ]))
    } else {
        Box::new(jsonl)
    }
}

/// Resolves on Ctrl+C or SIGTERM.
///
/// A handler that cannot be installed is logged and never fires.
async fn setup_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    warn!("Received shutdown signal, stopping run...");
}
