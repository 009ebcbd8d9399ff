//! Demo driver: samples a simulated world into the latest-snapshot file.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use pov_recorder::kernel::event::{ActorId, Event, HostEvent};
use pov_recorder::kernel::sink::FileSink;
use pov_recorder::kernel::time::SystemClock;
use pov_recorder::sim::SimWorld;
use pov_recorder::{RecorderConfig, Sampler};

/// Records first-person telemetry snapshots from a simulated world
#[derive(Parser, Debug)]
#[command(name = "pov-recorder", version)]
struct Args {
    /// JSON config file; missing means defaults
    #[arg(short, long, default_value = "pov-recorder.json")]
    config: PathBuf,

    /// Directory relative output paths resolve against
    #[arg(short, long, default_value = ".")]
    base_dir: PathBuf,

    /// Overrides `target-player`
    #[arg(short, long)]
    player: Option<String>,

    /// Stop after this many seconds instead of waiting for Ctrl+C
    #[arg(long)]
    seconds: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("setting default subscriber failed")?;

    let args = Args::parse();
    let mut config = RecorderConfig::load(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    if let Some(player) = args.player {
        config.target_player = player;
    }
    let config = config.normalized();
    let output = config.resolve_output_path(&args.base_dir);
    tracing::info!(output = %output.display(), "pov recorder starting");

    let name = if config.target_player.is_empty() { "Steve" } else { config.target_player.as_str() };
    let (world, actor) = SimWorld::demo(name);
    let world = Arc::new(world);

    let mut sampler = Sampler::new(&config, world.clone(), Arc::new(SystemClock), FileSink::new(output));

    let (tx, rx) = mpsc::channel(64);
    let cancel = CancellationToken::new();
    let driver = tokio::spawn(drive(world, actor, tx, cancel.clone()));

    let stopper = cancel.clone();
    tokio::spawn(async move {
        match args.seconds {
            Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
            None => {
                if let Err(err) = tokio::signal::ctrl_c().await {
                    tracing::warn!("ctrl-c handler failed: {}", err);
                }
            }
        }
        stopper.cancel();
    });

    sampler.run(rx, cancel).await;
    driver.await.context("demo driver panicked")?;
    Ok(())
}

/// Walks the actor in a slow circle and feeds it a rotating set of actions.
async fn drive(world: Arc<SimWorld>, actor: ActorId, tx: mpsc::Sender<Event>, cancel: CancellationToken) {
    let script = |step: u64| -> HostEvent {
        match step % 6 {
            0 => HostEvent::ToggleSprint { actor, sprinting: true },
            1 => HostEvent::BlockBreak { actor, block: "GRASS_BLOCK".into() },
            2 => HostEvent::DamageByEntity { damager: Some(actor), target_kind: "ZOMBIE".into(), damage: 4.5 },
            3 => HostEvent::ToggleSprint { actor, sprinting: false },
            4 => HostEvent::ItemConsume { actor, item: "COOKED_BEEF".into() },
            _ => HostEvent::BlockPlace { actor, block: "OAK_PLANKS".into() },
        }
    };

    let mut cadence = tokio::time::interval(Duration::from_millis(700));
    let mut step = 0u64;
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = cadence.tick() => {
                world.update_actor(&actor, |state| {
                    state.yaw = (state.yaw + 15.0) % 360.0;
                    state.velocity.x = (step as f64 * 0.3).sin() * 0.1;
                    state.velocity.z = (step as f64 * 0.3).cos() * 0.1;
                    state.position = state.position + state.velocity;
                });
                let event = Event::Host { event: script(step), cancelled: false };
                if tx.send(event).await.is_err() {
                    break;
                }
                step += 1;
            }
        }
    }
}
