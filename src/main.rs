//! Satscope - Satellite State Engine
//!
//! Headless runner: loads element sets and parametric bodies, drives the
//! engine at a chosen rate and periodically logs every body's position.

use std::path::PathBuf;
use std::time::Duration;

use bevy::app::ScheduleRunnerPlugin;
use bevy::log::LogPlugin;
use bevy::prelude::*;
use clap::{CommandFactory, Parser};

use satscope::engine::{
    RateRequest, SatelliteEngine, SatelliteEnginePlugin, SatelliteEngineSet, SelectRequest,
};
use satscope::selection::SelectionChanged;
use satscope::settings::EngineSettings;

const SAMPLE_TLE: &str = include_str!("../data/sample.tle");
const SAMPLE_MOONLETS: &str = include_str!("../data/moonlets.json");

/// Wall seconds between position reports.
const REPORT_INTERVAL_SECS: f64 = 2.0;

#[derive(Parser, Debug)]
#[command(name = "satscope")]
#[command(about = "Headless satellite state engine")]
struct Args {
    /// TLE file to load instead of the bundled sample
    tle_file: Option<PathBuf>,

    /// Simulated seconds per wall second
    #[arg(default_value_t = 60.0, value_parser = parse_rate)]
    rate: f64,
}

fn parse_rate(arg: &str) -> Result<f64, String> {
    let rate: f64 = arg.parse().map_err(|_| format!("`{}` is not a number", arg))?;
    if !rate.is_finite() || rate < 0.0 {
        return Err(format!("`{}` is not a finite, non-negative rate", arg));
    }
    Ok(rate)
}

#[derive(Resource)]
struct RunOptions {
    tle_text: String,
    rate: f64,
}

fn main() {
    let args = Args::parse();
    let tle_text = match &args.tle_file {
        Some(path) => std::fs::read_to_string(path).unwrap_or_else(|err| {
            Args::command()
                .error(
                    clap::error::ErrorKind::Io,
                    format!("cannot read {}: {}", path.display(), err),
                )
                .exit()
        }),
        None => SAMPLE_TLE.to_string(),
    };

    App::new()
        .add_plugins(MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::from_secs_f64(
            1.0 / 30.0,
        ))))
        .add_plugins(LogPlugin::default())
        // Insert resources before plugins that depend on them
        .insert_resource(EngineSettings::default())
        .insert_resource(RunOptions {
            tle_text,
            rate: args.rate,
        })
        .add_plugins(SatelliteEnginePlugin)
        .add_systems(Startup, load_bodies)
        .add_systems(Update, report_bodies.after(SatelliteEngineSet))
        .run();
}

/// Load bodies and scrub the clock to the newest element-set epoch so the
/// sample sets propagate close to where they are accurate.
fn load_bodies(
    options: Res<RunOptions>,
    time: Res<Time<Real>>,
    mut engine: ResMut<SatelliteEngine>,
    mut rate_requests: MessageWriter<RateRequest>,
    mut select_requests: MessageWriter<SelectRequest>,
) {
    engine.load_tle_text(&options.tle_text);
    let newest_epoch = engine
        .registry()
        .iter()
        .filter_map(|body| body.descriptor().as_element_set())
        .map(|set| set.epoch())
        .reduce(f64::max);
    if let Some(epoch) = newest_epoch {
        engine.clock_mut().reset(epoch, time.elapsed_secs_f64());
    }

    if let Err(err) = engine.load_parametric_json(SAMPLE_MOONLETS) {
        error!("Bundled parametric bodies failed to load: {}", err);
    }
    engine.refresh();

    info!(
        "Starting at {} with {} bodies",
        engine.clock().date_string(),
        engine.registry().len()
    );
    rate_requests.write(RateRequest(options.rate));
    if let Some(first) = engine.registry().ids().next() {
        select_requests.write(SelectRequest(Some(first)));
    }
}

fn report_bodies(
    time: Res<Time<Real>>,
    engine: Res<SatelliteEngine>,
    mut changes: MessageReader<SelectionChanged>,
    mut last_report: Local<f64>,
) {
    for SelectionChanged(selected) in changes.read() {
        match selected.and_then(|id| engine.registry().get(id)) {
            Some(body) => info!("Selected {}", body.name()),
            None => info!("Selection cleared"),
        }
    }

    let now = time.elapsed_secs_f64();
    if now - *last_report < REPORT_INTERVAL_SECS {
        return;
    }
    *last_report = now;

    info!("{}", engine.clock().date_string());
    for view in engine.frame() {
        info!(
            "  {:<16} ({:>7.3}, {:>7.3}, {:>7.3}){}{}",
            view.name,
            view.position.x,
            view.position.y,
            view.position.z,
            if view.selected { " [selected]" } else { "" },
            if view.stale { " [stale]" } else { "" },
        );
    }
}
