mod synthetic;

use std::{fs::File, io::BufWriter, path::PathBuf, time::Duration};

use birthday_cake_core::{
    layout, AppConfig, CakeError, FrameBuffer, FrameClock, FrameRecorder, InteractionState,
    InteractionStateMachine, RecordingSettings, RenderSurface,
};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use synthetic::{LoggingPlayback, SyntheticMicrophone};

fn main() -> birthday_cake_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate {
            config,
            candles,
            seconds,
            fps,
            blow_at,
            record,
            seed,
        } => run_simulate(SimulateArgs {
            config,
            candles,
            seconds,
            fps,
            blow_at,
            record,
            seed,
        }),
        Commands::AutoBlow { config, delay_ms } => run_auto_blow(config.as_ref(), delay_ms),
        Commands::Layout { candles } => run_layout(candles),
        Commands::Config => run_config(),
    }
}

struct SimulateArgs {
    config: Option<PathBuf>,
    candles: usize,
    seconds: f32,
    fps: u32,
    blow_at: f32,
    record: Option<PathBuf>,
    seed: Option<u64>,
}

fn load_config(path: Option<&PathBuf>) -> birthday_cake_core::Result<AppConfig> {
    match path {
        Some(path) => {
            tracing::info!(?path, "loading configuration");
            AppConfig::load(path)
        }
        None => Ok(AppConfig::default()),
    }
}

/// Converts a CLI seconds value, treating negatives as zero.
fn seconds(value: f32, message: &'static str) -> birthday_cake_core::Result<Duration> {
    Duration::try_from_secs_f32(value.max(0.0)).map_err(|_| CakeError::InvalidInput(message))
}

fn run_simulate(args: SimulateArgs) -> birthday_cake_core::Result<()> {
    let mut config = load_config(args.config.as_ref())?;
    if args.seed.is_some() {
        config.celebration.seed = args.seed;
    }
    tracing::info!(candles = args.candles, seconds = args.seconds, "starting simulation");

    let blow_at = seconds(args.blow_at, "--blow-at must be a finite number of seconds")?;
    let end = seconds(args.seconds, "--seconds must be a finite number of seconds")?;

    let mut clock = FrameClock::with_fps(args.fps);
    let mut machine = InteractionStateMachine::new(&config, Box::new(LoggingPlayback))?;
    let mut microphone = SyntheticMicrophone::new(clock.step(), args.seed.unwrap_or(0))
        .exhale(blow_at, Duration::from_millis(600));

    pollster::block_on(machine.acquire_microphone(&mut microphone))?;
    for _ in 0..args.candles {
        machine.add_candle();
    }

    let mut surface: Box<dyn RenderSurface> = match &args.record {
        Some(path) => {
            let mut recorder =
                FrameRecorder::new(RecordingSettings::default(), BufWriter::new(File::create(path)?));
            recorder.start();
            Box::new(recorder)
        }
        None => Box::new(FrameBuffer::new()),
    };

    let mut previous = machine.state();
    let mut celebrations = 0;
    while clock.now() <= end {
        let frame = machine.tick(clock.now());
        if frame.state != previous {
            tracing::info!(at = ?frame.time, from = ?previous, to = ?frame.state, "state changed");
            if frame.state == InteractionState::Celebrating {
                celebrations += 1;
            }
            previous = frame.state;
        }
        surface.present(&frame)?;
        clock.advance();
    }

    machine.teardown();
    surface.finish()?;
    tracing::info!(celebrations, state = ?machine.state(), "simulation finished");
    Ok(())
}

/// Local test mode: one candle, then a synthetic blow after `delay_ms`.
fn run_auto_blow(config: Option<&PathBuf>, delay_ms: u64) -> birthday_cake_core::Result<()> {
    let config = load_config(config)?;
    let mut machine =
        InteractionStateMachine::new(&config, Box::new(LoggingPlayback))?.with_test_mode(true);
    let mut clock = FrameClock::with_fps(60);

    if machine.candle_count() == 0 {
        machine.add_candle();
    }

    let blow_at = Duration::from_millis(delay_ms);
    let end = blow_at + config.celebration.duration() + config.celebration.cool_down();
    let mut blown = false;
    while clock.now() <= end {
        if !blown && clock.now() >= blow_at {
            blown = machine.inject_gesture(clock.now());
        }
        machine.tick(clock.now());
        clock.advance();
    }

    machine.teardown();
    tracing::info!(blown, state = ?machine.state(), "auto blow finished");
    Ok(())
}

fn run_layout(candles: usize) -> birthday_cake_core::Result<()> {
    let config = AppConfig::default();
    let count = candles.min(config.candles.max_candles);
    let placements = layout(count, &config.candles.ellipse);
    println!("{}", serde_json::to_string_pretty(&placements)?);
    Ok(())
}

fn run_config() -> birthday_cake_core::Result<()> {
    println!("{}", serde_json::to_string_pretty(&AppConfig::default())?);
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Blow out the candles on a virtual birthday cake", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the cake headless with a synthetic microphone.
    Simulate {
        /// JSON configuration file.
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long, default_value_t = 5)]
        candles: usize,
        /// How long to simulate.
        #[arg(long, default_value_t = 12.0)]
        seconds: f32,
        #[arg(long, default_value_t = 60)]
        fps: u32,
        /// When the synthetic exhale starts, in seconds.
        #[arg(long, default_value_t = 1.0)]
        blow_at: f32,
        /// Write every frame as JSON lines to this file.
        #[arg(long)]
        record: Option<PathBuf>,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Add a candle and blow it out without a microphone.
    AutoBlow {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long, default_value_t = 800)]
        delay_ms: u64,
    },
    /// Print candle placements as JSON.
    Layout {
        #[arg(long, default_value_t = 5)]
        candles: usize,
    },
    /// Print the default configuration as JSON.
    Config,
}
