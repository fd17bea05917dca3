// SPDX-License-Identifier: MPL-2.0
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use timeline_playback::config::{self, EngineConfig};
use timeline_playback::domain::ClipList;
use timeline_playback::error::{Error, Result};
use timeline_playback::infrastructure::{LogCursor, SimulatedSink, StaticLocator};
use timeline_playback::timeline::PlaybackEngine;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const HELP: &str = "\
timeline_playback: play a clip timeline against a simulated media sink

USAGE:
  timeline_playback [OPTIONS] <CLIPS.toml>

OPTIONS:
  --from <SECS>             Start position in timeline seconds [default: 0]
  --track <N>               Only play clips on this track
  --config <PATH>           Engine config file [default: platform config dir]
  --fail <SOURCE_REF>       Make the locator reject this source (repeatable)
  --load-latency-ms <MS>    Simulated sink load latency [default: 150]
  -h, --help                Print this help
";

struct Flags {
    clips_path: PathBuf,
    from_secs: f64,
    track: Option<u32>,
    config_path: Option<PathBuf>,
    failing_refs: Vec<String>,
    load_latency: Duration,
}

fn parse_flags() -> Result<Option<Flags>> {
    let mut args = pico_args::Arguments::from_env();
    if args.contains(["-h", "--help"]) {
        return Ok(None);
    }

    let from_secs = args
        .opt_value_from_str("--from")
        .map_err(cli_error)?
        .unwrap_or(0.0);
    let track = args.opt_value_from_str("--track").map_err(cli_error)?;
    let config_path = args.opt_value_from_str("--config").map_err(cli_error)?;
    let failing_refs = args.values_from_str("--fail").map_err(cli_error)?;
    let load_latency_ms: u64 = args
        .opt_value_from_str("--load-latency-ms")
        .map_err(cli_error)?
        .unwrap_or(150);
    let clips_path = args
        .finish()
        .into_iter()
        .next()
        .map(PathBuf::from)
        .ok_or_else(|| Error::Config("missing clip list path".to_string()))?;

    Ok(Some(Flags {
        clips_path,
        from_secs,
        track,
        config_path,
        failing_refs,
        load_latency: Duration::from_millis(load_latency_ms),
    }))
}

fn cli_error(err: pico_args::Error) -> Error {
    Error::Config(err.to_string())
}

fn load_config(flags: &Flags) -> Result<EngineConfig> {
    let mut config = match &flags.config_path {
        Some(path) => config::load_from_path(path)?,
        None => config::load()?,
    };
    if flags.track.is_some() {
        config.playback.track = flags.track;
    }
    Ok(config)
}

async fn run(flags: Flags) -> Result<()> {
    let config = load_config(&flags)?;
    let clips = ClipList::load_from_path(&flags.clips_path)?;
    info!(
        path = %flags.clips_path.display(),
        clips = clips.clips.len(),
        "loaded clip list"
    );

    let locator = StaticLocator::new("https://media.local");
    for source_ref in &flags.failing_refs {
        locator.reject(source_ref);
    }
    let sink = Arc::new(SimulatedSink::with_load_latency(flags.load_latency));

    let mut engine = PlaybackEngine::new(
        Arc::clone(&sink),
        Arc::new(locator),
        LogCursor::default(),
        &config,
    );
    engine.set_clips(clips.into_shared());
    for overlap in engine.index().overlaps() {
        info!(%overlap, "overlapping clips");
    }

    engine.seek(flags.from_secs);
    engine.start();
    engine.run_until_stopped().await;

    let stats = engine.resolver().stats();
    info!(
        switches = engine.switcher().attempts(),
        corrections = engine.drift_corrections(),
        resolves = stats.requests,
        hit_rate = stats.hit_rate(),
        "playback finished"
    );
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .try_init();

    let flags = match parse_flags() {
        Ok(Some(flags)) => flags,
        Ok(None) => {
            print!("{HELP}");
            return ExitCode::SUCCESS;
        }
        Err(err) => {
            eprintln!("{err}\n\n{HELP}");
            return ExitCode::FAILURE;
        }
    };

    match run(flags).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "playback failed");
            ExitCode::FAILURE
        }
    }
}
