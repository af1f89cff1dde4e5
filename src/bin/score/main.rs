//! score - plays the engine live on the default output device
//!
//! Run with: cargo run --bin score -- [seconds]
//!
//! Nobody is tracked here, so the autopilot stands in for performers and
//! publishes snapshots at 30 Hz the way the pose tracker would.

mod monitor;

use std::time::Duration;

use clap::Parser;
use color_eyre::eyre::{Result as EyreResult, WrapErr};

use gesture_score::engine::{instrument_ring, AudioContext, Engine, HardwareClock};
use gesture_score::performer::{parameter_feed, Autopilot};
use gesture_score::EngineConfig;
use monitor::Monitor;

const PERFORMERS: usize = 4;
const FRAME_INTERVAL: Duration = Duration::from_millis(33);

/// Play the engine live with simulated performers
#[derive(Parser, Debug)]
#[command(name = "score")]
struct Args {
    /// How long to play, in seconds
    #[arg(default_value_t = 120.0)]
    seconds: f64,
}

fn main() -> EyreResult<()> {
    color_eyre::install()?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let Args { seconds } = Args::parse();

    let (instrument, notes_rx) = instrument_ring(1024);
    let (mut feed_tx, feed_rx) = parameter_feed(64);

    let mut monitor = Monitor::new(notes_rx);
    let audio = AudioContext::open(move |data, block| monitor.render(data, block))
        .wrap_err("failed to open audio output")?;
    let clock = audio.clock();

    let config = EngineConfig::default();
    println!("=== score ===");
    println!("BPM: {}", config.tempo_bpm);
    println!("Sample rate: {} Hz", audio.sample_rate());
    println!("Channels: {}", audio.channels());
    println!("Playing for {seconds:.0}s with {PERFORMERS} simulated performers");
    println!();

    let handle = Engine::start(config, clock.clone(), instrument)
        .wrap_err("failed to start engine")?
        .with_feed(feed_rx)
        .spawn()
        .wrap_err("failed to spawn scheduler thread")?;

    let mut autopilot = Autopilot::new(PERFORMERS, 0x5C0E);
    let start = clock.now();
    while clock.now() - start < seconds {
        feed_tx.publish(autopilot.sample(clock.now() - start));
        std::thread::sleep(FRAME_INTERVAL);
    }

    handle.stop();
    audio.close();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seconds_defaults_to_two_minutes() {
        let args = Args::try_parse_from(["score"]).expect("parses");
        assert_eq!(args.seconds, 120.0);
    }

    #[test]
    fn test_seconds_argument() {
        let args = Args::try_parse_from(["score", "45.5"]).expect("parses");
        assert_eq!(args.seconds, 45.5);
        assert!(Args::try_parse_from(["score", "soon"]).is_err());
    }
}
