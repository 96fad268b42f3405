// Command line front-end: connects to a Crazyflie, streams telemetry and flies the scripted flights.
use std::path::PathBuf;
use std::time::Duration;

use cfpilot::command::PilotCommand;
use cfpilot::telemetry::LogConfig;
use cfpilot::{
    config, connect, ConnectedCrazyflie, Direction, Error, FileTocCache, FlightRequest, Pilot,
    PilotConfig,
};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::sleep;

#[derive(Parser)]
#[command(name = "cfpilot", version, about = "Crazyflie telemetry and scripted flights")]
struct Cli {
    /// Link URI
    #[arg(long, global = true, env = config::URI_ENV_VAR)]
    uri: Option<String>,

    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Do not read nor write the TOC cache
    #[arg(long, global = true)]
    no_cache: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Connect, hold the link for 3 seconds and disconnect
    Connect,
    /// Stream the state estimate until the link closes
    Log {
        /// Disconnect after this many seconds
        #[arg(long)]
        seconds: Option<u64>,
    },
    /// Read attitude frames synchronously
    SyncLog {
        #[arg(long, default_value_t = 10)]
        count: usize,
    },
    /// Stream attitude in the background and print every frame
    AsyncLog {
        #[arg(long, default_value_t = 10)]
        seconds: u64,
    },
    /// Thrust ramp take-off
    Fly {
        /// upwards, right, left, forward or backward
        #[arg(default_value = "upwards")]
        direction: String,
        #[arg(long, default_value_t = cfpilot::flight::DEFAULT_TAKE_OFF_THRUST)]
        thrust: u16,
    },
    /// Fly the waypoint sequence
    Sequence,
    /// Velocity take-off
    Climb,
    /// Read commands from the standard input
    Interactive,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env = env_logger::Env::default().default_filter_or("cfpilot=info,warn");
    env_logger::Builder::from_env(env).init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => PilotConfig::from_json_file(path)?,
        None => PilotConfig::default(),
    };
    if let Some(uri) = cli.uri {
        config.uri = uri;
    }
    if cli.no_cache {
        config.cache_dir = None;
    }

    println!("Connecting to {}", config.uri);
    let toc_cache = FileTocCache::from_dir(config.cache_dir.as_deref());
    let crazyflie = match connect(&config.uri, toc_cache).await {
        Ok(crazyflie) => crazyflie,
        Err(e) => {
            println!("{}", e);
            std::process::exit(1);
        }
    };
    println!("Connected to {}", config.uri);

    let pilot = Pilot::new(crazyflie, config);

    match cli.command {
        Command::Connect => {
            println!("Holding the link for 3 seconds");
            sleep(Duration::from_secs(3)).await;
            println!("Disconnecting");
            pilot.disconnect().await;
        }
        Command::Log { seconds } => {
            if start_logging(&pilot, &pilot.config().telemetry.clone()).await {
                if let Some(seconds) = seconds {
                    sleep(Duration::from_secs(seconds)).await;
                    pilot.schedule_disconnect();
                }
            } else {
                pilot.schedule_disconnect();
            }
            pilot.wait_disconnected().await;
        }
        Command::SyncLog { count } => {
            let vehicle = pilot.vehicle().as_ref();
            cfpilot::pilot::read_frames(vehicle, &config::attitude(), count, |frame| {
                for (name, value) in frame.iter() {
                    println!("{}: {}", name, value);
                }
                println!("{:?}", frame.values());
            })
            .await?;
            pilot.disconnect().await;
        }
        Command::AsyncLog { seconds } => {
            pilot.on_frame(|frame| {
                for (name, value) in frame.iter() {
                    println!("{}: {}", name, value);
                }
                println!("The current values are: {:?}", frame.values());
            });
            if start_logging(&pilot, &config::attitude()).await {
                sleep(Duration::from_secs(seconds)).await;
            }
            pilot.disconnect().await;
        }
        Command::Fly { direction, thrust } => {
            let direction: Direction = direction.parse()?;
            start_logging(&pilot, &pilot.config().telemetry.clone()).await;
            let schedule = pilot.fly(FlightRequest::new(direction, thrust)).await?;
            println!(
                "Flew {} setpoints, last state estimate: {:?}",
                schedule.len(),
                pilot.latest()
            );
            pilot.disconnect().await;
        }
        Command::Sequence => {
            start_logging(&pilot, &pilot.config().telemetry.clone()).await;
            pilot.run_sequence().await?;
            pilot.disconnect().await;
        }
        Command::Climb => {
            pilot.climb().await?;
            pilot.disconnect().await;
        }
        Command::Interactive => {
            start_logging(&pilot, &pilot.config().telemetry.clone()).await;
            interactive(&pilot).await?;
        }
    }

    Ok(())
}

/// Start a log block, report configuration errors on the console
async fn start_logging(pilot: &Pilot<ConnectedCrazyflie>, block: &LogConfig) -> bool {
    match pilot.start_logging(block).await {
        Ok(()) => true,
        Err(Error::VariableNotFound(name)) => {
            println!("Could not start log configuration, {} not found in TOC", name);
            false
        }
        Err(Error::InvalidLogConfig(reason)) => {
            println!(
                "Could not add {} log config, bad configuration: {}",
                block.name, reason
            );
            false
        }
        Err(e) => {
            println!("Could not start log configuration {}: {}", block.name, e);
            false
        }
    }
}

async fn interactive(pilot: &Pilot<ConnectedCrazyflie>) -> Result<(), Box<dyn std::error::Error>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    pilot.on_display(|values| println!("The list has been returned: {:?}", values));
    println!("Type a command, 'help' to list them");

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = pilot.wait_disconnected() => break,
        };

        let line = match line {
            Some(line) if line.trim().is_empty() => continue,
            Some(line) => line,
            None => {
                pilot.disconnect().await;
                break;
            }
        };

        let command: PilotCommand = match line.parse() {
            Ok(command) => command,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };

        let result = match command {
            PilotCommand::Show => {
                println!("Latest values: {:?}", pilot.return_list());
                Ok(())
            }
            PilotCommand::Fly { direction, thrust } => pilot.take_off(direction, thrust),
            PilotCommand::Sequence => pilot.run_sequence().await,
            PilotCommand::Climb => pilot.climb().await,
            PilotCommand::Disconnect => {
                pilot.schedule_disconnect();
                Ok(())
            }
            PilotCommand::Quit => {
                pilot.disconnect().await;
                break;
            }
            PilotCommand::Help => {
                println!("show | fly <direction> [thrust] | sequence | climb | disconnect | quit");
                Ok(())
            }
        };

        if let Err(e) = result {
            println!("{}", e);
        }
    }

    Ok(())
}
