use colored::Colorize;
use std::error::Error;
use std::path::Path;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ppg_vitals::config::{load_config, Config};
use ppg_vitals::local::process_file;
use ppg_vitals::local::simulate::{PpgSimulator, SimulationParams};
use ppg_vitals::processing::ChannelExtractor;
use ppg_vitals::utils::log::{log_measurement, log_session, SessionSummary, LOG_DIR};
use ppg_vitals::{Measurement, Pipeline, RawSample};

const DEFAULT_SECONDS: f64 = 60.0;

const USAGE: &str = "usage:
  main simulate [config.yaml] [seconds]
  main process <input.csv> <output.csv> [config.yaml]
  main record <output.csv> [seconds]";

// -----------------------------------------------------------------------------
// RUN CODE
// -----------------------------------------------------------------------------

fn main() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        println!("{}", USAGE);
        return Ok(());
    }

    match args[1].as_str() {
        "simulate" => {
            let config = config_from_arg(args.get(2))?;
            init_tracing(&config);
            let seconds = seconds_from_arg(args.get(3))?;
            simulate(config, seconds)
        }
        "process" => {
            if args.len() < 4 {
                println!("{}", USAGE);
                return Ok(());
            }
            let config = config_from_arg(args.get(4))?;
            init_tracing(&config);
            let logging = config.logging.clone();
            let summary = process_file::run(config, &args[2], &args[3])?;
            for measurement in &summary.measurements {
                print_measurement(measurement);
            }
            if logging.enable_session_log {
                let session = SessionSummary {
                    frames: summary.frames,
                    measurements: summary.measurements.len(),
                    fps: summary.fps,
                    last: summary.measurements.last().copied(),
                };
                log_session(Path::new(LOG_DIR), &logging.session_file, &session)?;
            }
            Ok(())
        }
        "record" => {
            let Some(output) = args.get(2) else {
                println!("{}", USAGE);
                return Ok(());
            };
            let config = Config::default();
            init_tracing(&config);
            record(&config, output, seconds_from_arg(args.get(3))?)
        }
        _ => {
            println!("Invalid argument, please use 'simulate', 'process' or 'record'");
            Ok(())
        }
    }
}

fn config_from_arg(arg: Option<&String>) -> Result<Config, Box<dyn Error>> {
    Ok(match arg {
        Some(path) => load_config(path)?,
        None => Config::default(),
    })
}

fn seconds_from_arg(arg: Option<&String>) -> Result<f64, Box<dyn Error>> {
    Ok(match arg {
        Some(value) => value.parse()?,
        None => DEFAULT_SECONDS,
    })
}

fn init_tracing(config: &Config) {
    let default_level = if config.logging.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn simulate(config: Config, seconds: f64) -> Result<(), Box<dyn Error>> {
    let params = SimulationParams {
        fps: config.pipeline.nominal_fps,
        ..SimulationParams::default()
    };
    let frames = (seconds * params.fps) as usize;
    info!(frames, bpm = params.heart_rate_bpm, "simulating session");

    let logging = config.logging.clone();

    let mut simulator = PpgSimulator::new(params);
    let mut pipeline = Pipeline::new(config)?;
    pipeline.start();

    let mut produced = 0;
    for _ in 0..frames {
        let frame = simulator.next_frame();
        if let Some(measurement) = pipeline.process_frame(&frame)? {
            produced += 1;
            print_measurement(&measurement);
            if logging.enable_measurement_log {
                log_measurement(Path::new(LOG_DIR), &logging.measurement_file, &measurement)?;
            }
        }
    }

    if logging.enable_session_log {
        let session = SessionSummary {
            frames,
            measurements: produced,
            fps: pipeline.fps(),
            last: pipeline.measurement().copied(),
        };
        log_session(Path::new(LOG_DIR), &logging.session_file, &session)?;
    }
    pipeline.stop();
    Ok(())
}

fn record(config: &Config, output: &str, seconds: f64) -> Result<(), Box<dyn Error>> {
    let params = SimulationParams {
        fps: config.pipeline.nominal_fps,
        noise: 0.5,
        ..SimulationParams::default()
    };
    let frames = (seconds * params.fps) as usize;
    let extractor = ChannelExtractor::new(config.extractor.region);
    let mut simulator = PpgSimulator::new(params);

    let mut samples: Vec<RawSample> = Vec::with_capacity(frames);
    for _ in 0..frames {
        samples.push(extractor.extract(&simulator.next_frame())?);
    }
    process_file::write_samples(output, &samples)?;
    info!(frames, output, "recording written");
    Ok(())
}

fn print_measurement(measurement: &Measurement) {
    let show = |value: Option<u32>| value.map_or_else(|| "--".to_string(), |v| v.to_string());
    let quality = format!("{:>3}%", measurement.signal_quality);
    let quality = match measurement.signal_quality {
        q if q > 70 => quality.green(),
        q if q > 40 => quality.yellow(),
        _ => quality.red(),
    };
    println!(
        "[{:>8.2}s] HR {:>3} bpm | SpO2 {:>3} % | quality {}",
        measurement.produced_at,
        show(measurement.heart_rate_bpm).bold(),
        show(measurement.spo2_percent).bold(),
        quality
    );
}
