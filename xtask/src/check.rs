use anyhow::Result;
use colored::Colorize;
use std::time::Instant;

use crate::step::{cargo, Severity};

pub fn run() -> Result<()> {
    println!();
    println!("{}", "🔍 Checking firmware builds...".cyan().bold());
    println!();

    let total_start = Instant::now();

    cargo(
        "Hardware target (STM32WB55, Nucleo wiring)",
        &[
            "check",
            "-p",
            "firmware",
            "--target",
            "thumbv7em-none-eabihf",
            "--features",
            "hardware,nucleo",
        ],
        Severity::Fatal,
    )?;
    cargo(
        "Emulator target (host)",
        &["check", "-p", "firmware", "--features", "emulator"],
        Severity::Fatal,
    )?;
    cargo(
        "Platform crate (no_std)",
        &[
            "check",
            "-p",
            "platform",
            "--target",
            "thumbv7em-none-eabihf",
            "--no-default-features",
        ],
        Severity::Fatal,
    )?;
    cargo(
        "Clippy",
        &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"],
        Severity::Advisory,
    )?;
    if cargo("Formatting", &["fmt", "--all", "--check"], Severity::Advisory)?.is_none() {
        eprintln!("     Run 'cargo fmt --all' to fix");
    }

    println!(
        "{}",
        format!(
            "✓ All checks completed in {:.2}s",
            total_start.elapsed().as_secs_f64()
        )
        .green()
        .bold()
    );
    println!();

    Ok(())
}
