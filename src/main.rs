use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use image::ImageReader;

use cardtable::bridge::{self, BridgeContext};
use cardtable::debug::DebugDump;
use cardtable::{CalibrationConfig, CardDetector, Frame, console};

#[derive(Parser)]
#[command(name = "cardtable")]
#[command(about = "Recognize cards in table slots from overhead captures")]
struct Cli {
    /// Calibration profile (JSON). Defaults to the SUR40 profile
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze one capture and print the record line
    Analyze {
        /// Image file, or a raw grayscale dump with --raw
        #[arg(value_name = "IMAGE")]
        image_path: PathBuf,

        /// Treat the input as raw row-major 8-bit pixels
        #[arg(long)]
        raw: bool,

        /// Save intermediate images to directory (must be empty)
        #[arg(long, value_name = "DIR")]
        debug_out: Option<PathBuf>,
    },
    /// Receive frames over TCP and forward record lines over UDP
    Serve {
        #[arg(long, default_value = bridge::DEFAULT_LISTEN)]
        listen: SocketAddr,

        #[arg(long, default_value = bridge::DEFAULT_FORWARD)]
        forward: SocketAddr,

        /// Send nothing for frames without cards
        #[arg(long)]
        skip_empty: bool,
    },
    /// Interactively simulate card states and send them over UDP
    Console {
        #[arg(long, default_value = bridge::DEFAULT_FORWARD)]
        forward: SocketAddr,
    },
    /// Print the active calibration as JSON
    PrintConfig,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<CalibrationConfig> {
    match path {
        Some(path) => {
            let config = CalibrationConfig::load(path)?;
            log::info!("loaded calibration {:?} from {}", config.deployment, path.display());
            Ok(config)
        }
        None => {
            log::warn!("no calibration given, using the built-in SUR40 profile");
            Ok(CalibrationConfig::sur40())
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    init_logging(args.verbose);
    let config = load_config(args.config.as_ref())?;

    match args.command {
        Command::Analyze {
            image_path,
            raw,
            debug_out,
        } => {
            log::debug!("loading {}", image_path.display());
            let frame = if raw {
                Frame::from_raw(config.width, config.height, std::fs::read(&image_path)?)?
            } else {
                let img = ImageReader::open(&image_path)?
                    .decode()
                    .map_err(|e| anyhow::anyhow!("Failed to decode image: {}", e))?;
                Frame::from_image(&img, &config)?
            };

            let detector = CardDetector::new(config);
            let report = match debug_out {
                Some(dir) => {
                    let mut dump = DebugDump::create(dir)?;
                    dump.save_input(&frame)?;
                    let report = detector.analyze_observed(&frame, &mut dump);
                    log::info!(
                        "saved {} debug images to {}",
                        dump.saved(),
                        dump.output_dir().display()
                    );
                    report
                }
                None => detector.analyze(&frame),
            };
            println!("{}", report.wire_line());
        }
        Command::Serve {
            listen,
            forward,
            skip_empty,
        } => {
            let ctx = BridgeContext {
                detector: Arc::new(CardDetector::new(config)),
                forward,
                skip_empty,
            };
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(bridge::serve(ctx, listen))?;
        }
        Command::Console { forward } => {
            println!("{}", console::HELP);
            let stdin = std::io::stdin();
            console::run(
                stdin.lock(),
                std::io::stdout(),
                forward,
                config.slots_per_player,
                config.max_rank,
            )?;
        }
        Command::PrintConfig => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
