// Desktop/tooling crate: unwrap/expect/panic acceptable in non-embedded code.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod check;
mod emulate;
mod flash;
mod step;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Pendant recorder development tasks", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Stage whose start the emulator should fail.
#[derive(Clone, Copy, ValueEnum)]
enum FailStage {
    Transport,
    Codec,
    Microphone,
}

impl FailStage {
    fn as_str(self) -> &'static str {
        match self {
            Self::Transport => "transport",
            Self::Codec => "codec",
            Self::Microphone => "microphone",
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Build and flash firmware to the STM32WB55 via probe-rs
    Flash {
        /// Build and flash release version
        #[arg(short, long)]
        release: bool,
        /// Board/stage features on top of `hardware`
        #[arg(long, default_value = "nucleo")]
        features: String,
    },
    /// Run the firmware core on the desktop
    Emulate {
        /// Make one mandatory stage fail to start
        #[arg(long, value_enum)]
        fail: Option<FailStage>,
        /// tracing filter (RUST_LOG syntax)
        #[arg(long)]
        log: Option<String>,
    },
    /// Check firmware builds for both hardware and emulator targets
    Check,
    /// Run all tests (unit, integration, property and doc)
    Test {
        /// Run only unit tests
        #[arg(long)]
        unit: bool,
        /// Run only integration tests
        #[arg(long)]
        integration: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Flash { release, features } => flash::run(release, &features),
        Commands::Emulate { fail, log } => {
            emulate::run(fail.map(FailStage::as_str), log.as_deref())
        }
        Commands::Check => check::run(),
        Commands::Test { unit, integration } => test::run(unit, integration),
    }
}
