//! Desktop simulator for the roombuddy sensor filter.
//!
//! Polls synthetic DHT22 and BMP280 sensors through the core filter on the
//! configured cadence while a separate dashboard thread periodically reads
//! snapshots and logs the JSON payloads a web front-end would receive.
//!
//! ```text
//! roombuddy-simulator [config.json]
//! ```
//!
//! Without an argument the built-in sensor presets are used. Set `RUST_LOG`
//! (e.g. `RUST_LOG=debug`) to see every filter decision.
//!
//! # Key bindings (type the letter, then Enter)
//!
//! | Key | Action                          |
//! |-----|---------------------------------|
//! | r   | Red button: toggle main LED     |
//! | b   | Black button: main LED off      |
//! | q   | Quit                            |

mod dashboard;
mod mock;

use std::io::BufRead;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use anyhow::{Context, anyhow};
use embassy_futures::block_on;
use log::{debug, error, info};

use roombuddy_core::config::FilterConfig;
use roombuddy_core::controls::{Button, LedController};
use roombuddy_core::metrics::QualityLevel;
use roombuddy_core::registry::{SensorRegistry, SharedRegistry};
use roombuddy_core::sampling::{PollResults, Sampler};

use mock::{MockBmp280, MockDht22};

/// How often the main loop checks for due samples and button presses.
const TICK: Duration = Duration::from_millis(50);

/// Interval between dashboard refreshes.
const DASHBOARD_INTERVAL: Duration = Duration::from_secs(10);

enum Command {
    Press(Button),
    Quit,
}

/// Seconds since epoch, saturating at the `u32` width used by the core
/// (early 2106).
fn now_ts() -> u32 {
    epoch_secs_to_ts(
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs(),
    )
}

fn epoch_secs_to_ts(secs: u64) -> u32 {
    u32::try_from(secs).unwrap_or(u32::MAX)
}

fn load_config() -> anyhow::Result<FilterConfig> {
    let Some(path) = std::env::args().nth(1) else {
        info!("No configuration file given, using sensor presets");
        return Ok(FilterConfig::default());
    };

    let text = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
    let config: FilterConfig =
        serde_json::from_str(&text).with_context(|| format!("parsing {path}"))?;
    config
        .validate()
        .map_err(|e| anyhow!("invalid configuration in {path}: {e}"))?;

    info!("Loaded configuration from {}", path);
    Ok(config)
}

fn report<const COUNT: usize>(results: PollResults<COUNT>) {
    for result in results {
        match result {
            Ok(outcome) => debug!("{:?}", outcome),
            Err(e) => error!("Filter error: {}", e),
        }
    }
}

/// Forward simulated button presses typed on stdin to the main loop.
fn spawn_button_reader(commands: Sender<Command>) {
    thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            let command = match line.trim() {
                "r" => Command::Press(Button::Red),
                "b" => Command::Press(Button::Black),
                "q" => Command::Quit,
                other => {
                    info!("Unknown key {:?} (r, b or q)", other);
                    continue;
                }
            };
            if commands.send(command).is_err() {
                break;
            }
        }
    });
}

/// Periodically log the dashboard payloads from a thread of its own.
fn spawn_dashboard(registry: Arc<SharedRegistry>) {
    thread::spawn(move || {
        loop {
            thread::sleep(DASHBOARD_INTERVAL);

            let snapshot = registry.snapshot_all();
            let history = registry.history_snapshot();

            info!("GET /json_measurements -> {}", dashboard::measurements_json(&snapshot));
            info!("GET /status -> {}", dashboard::status_json(&snapshot, &history));

            match snapshot.to_postcard() {
                Ok(bytes) => debug!("Snapshot encodes to {} bytes", bytes.len()),
                Err(e) => error!("{}", e),
            }
        }
    });
}

fn handle_commands(commands: &Receiver<Command>, leds: &mut LedController) -> bool {
    for command in commands.try_iter() {
        match command {
            Command::Press(button) => {
                let state = leds.press(button);
                info!("Main LED {:?} {:?}", state, state.color());
            }
            Command::Quit => return false,
        }
    }
    true
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    info!("Starting roombuddy simulator");
    info!("Keys: r=Red button  b=Black button  q=Quit");

    let config = load_config()?;
    let registry = SensorRegistry::from_config(&config)
        .map_err(|e| anyhow!("cannot build sensor registry: {e}"))?;
    let registry = Arc::new(SharedRegistry::new(registry));

    let dht22_interval = Duration::from_millis(u64::from(config.dht22_interval_ms));
    let bmp280_interval = Duration::from_millis(u64::from(config.bmp280_interval_ms));

    let mut dht22 = Sampler::new(
        MockDht22::new(dht22_interval.as_secs_f64()),
        &registry,
        config.rearm_after_failures,
    );
    let mut bmp280 = Sampler::new(
        MockBmp280::new(bmp280_interval.as_secs_f64()),
        &registry,
        config.rearm_after_failures,
    );

    let (command_tx, command_rx) = mpsc::channel();
    spawn_button_reader(command_tx);
    spawn_dashboard(Arc::clone(&registry));

    let mut leds = LedController::new();
    let mut last_dht22 = Instant::now();
    let mut last_bmp280 = Instant::now();

    while handle_commands(&command_rx, &mut leds) {
        if last_dht22.elapsed() >= dht22_interval {
            if let Ok(results) = block_on(dht22.poll(now_ts())) {
                report(results);
            }
            last_dht22 = Instant::now();
        }

        if last_bmp280.elapsed() >= bmp280_interval {
            if let Ok(results) = block_on(bmp280.poll(now_ts())) {
                report(results);
            }
            last_bmp280 = Instant::now();
        }

        let previous = leds.info();
        let quality = registry.with(|registry| QualityLevel::assess_registry(registry));
        let color = leds.show_quality(quality);
        if color != previous {
            info!(
                "Info LED {:?} ({})",
                color,
                quality.map_or("no data", QualityLevel::label)
            );
        }

        thread::sleep(TICK);
    }

    info!("Simulator exiting");
    Ok(())
}
