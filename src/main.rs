//! Archery trainer demo - headless end-to-end run
//!
//! Discovers a simulated controller, then plays one full round on a fixed
//! tick loop with a scripted gesture driver: countdowns, target spawns,
//! shots, scoring, and the final statistics as JSON on stdout.

use std::time::Duration;

use tokio::time::interval;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use archery_trainer::config::Config;
use archery_trainer::device::{Button, Device, DeviceDiscovery, DeviceId, MotionSample, Radio};
use archery_trainer::game::{GameEvent, GameSession, RoundPhase, SpawnBounds};
use archery_trainer::util::time::{tick_delta, unix_millis, TICK_DURATION_MICROS};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    init_tracing(&config.log_level);

    info!("Starting archery trainer demo");

    // Simulated radio: an IO thread answers the scan after a short delay
    let discovery = DeviceDiscovery::new(SimulatedRadio, config.discovery.clone());
    let reporter = discovery.handle();
    std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(250));
        reporter.device_found(Device::connected(DeviceId::new()));
    });

    let device = tokio::task::spawn_blocking(move || discovery.discover()).await??;
    info!(device_id = %device.id, "Controller connected");

    let mut session = GameSession::new(&config, SpawnBounds::default())?;
    let mut driver = GestureDriver::new();

    for event in session.start_round() {
        log_event(&event);
    }

    let mut tick_interval = interval(Duration::from_micros(TICK_DURATION_MICROS));
    tick_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Demo interrupted");
                return Ok(());
            }
            _ = tick_interval.tick() => {
                driver.drive(&session);

                let events = session.tick(tick_delta());
                let mut shot_released = false;
                for event in &events {
                    log_event(event);
                    if matches!(event, GameEvent::Shot { .. }) {
                        shot_released = true;
                    }
                }

                if shot_released {
                    for event in driver.resolve_shot(&mut session) {
                        log_event(&event);
                    }
                }

                if session.phase() == RoundPhase::Ended {
                    break;
                }
            }
        }
    }

    if let Some(stats) = session.stats() {
        info!(
            score = stats.score,
            training_score = stats.training_score(),
            "Training complete"
        );
        println!("{}", serde_json::to_string_pretty(&stats)?);
    }

    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        }
    }
}

/// Radio stand-in for the demo, only logs its lifecycle
struct SimulatedRadio;

impl Radio for SimulatedRadio {
    fn start_scan(&self) {
        info!("Radio scan started");
    }

    fn stop_scan(&self) {
        info!("Radio scan stopped");
    }

    fn acknowledge(&self, device: &Device) {
        info!(device_id = %device.id, "Indicator lit on controller");
    }
}

/// Scripted player: recenters once, then draws and releases every few
/// seconds, missing every third shot
struct GestureDriver {
    clock: f32,
    next_shot_at: f32,
    shots: u32,
    recentered: bool,
}

impl GestureDriver {
    fn new() -> Self {
        Self {
            clock: 0.0,
            next_shot_at: 1.0,
            shots: 0,
            recentered: false,
        }
    }

    fn drive(&mut self, session: &GameSession) {
        self.clock += tick_delta();

        if !self.recentered {
            self.recentered = true;
            session.on_button_edge(Button::Recenter, true);
            session.on_button_edge(Button::Recenter, false);
            return;
        }

        if self.clock < self.next_shot_at {
            return;
        }
        self.next_shot_at = self.clock + 3.0;
        self.shots += 1;

        let base = unix_millis();
        session.on_button_edge(Button::Trigger, true);
        session.on_motion_sample(sample(0.0, base));
        session.on_motion_sample(sample(150.0, base + 10));
        session.on_motion_sample(sample(110.0, base + 20));
        session.on_button_edge(Button::Trigger, false);
    }

    fn resolve_shot(&self, session: &mut GameSession) -> Vec<GameEvent> {
        let hit_target = if self.shots % 3 == 0 {
            None
        } else {
            session.targets().first().map(|t| (t.id, t.position))
        };

        match hit_target {
            Some((id, position)) => session.on_hit_resolved(id, position),
            None => session.on_miss_resolved(),
        }
    }
}

fn sample(vertical_accel: f32, timestamp_ms: u64) -> MotionSample {
    MotionSample {
        roll_rate: 4.0,
        pitch_rate: -2.0,
        vertical_accel,
        timestamp_ms,
    }
}

fn log_event(event: &GameEvent) {
    match event {
        GameEvent::PhaseChanged { phase } => info!(?phase, "Phase changed"),
        GameEvent::CountdownTick { kind, count } => info!(?kind, count, "Countdown"),
        GameEvent::ScoreChanged { score, bonus } => info!(score, bonus, "Score changed"),
        GameEvent::TimeRemaining { seconds } => info!(seconds, "Time remaining"),
        GameEvent::RoundEnded { stats } => info!(
            score = stats.score,
            shots = stats.shots_total,
            targets = stats.targets_total,
            "Round ended"
        ),
        _ => debug!(?event, "Event"),
    }
}
