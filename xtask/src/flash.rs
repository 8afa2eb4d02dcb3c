use anyhow::{Context, Result};
use colored::Colorize;
use std::process::Command;
use std::time::Instant;

use crate::step::{cargo, Severity};

const TARGET: &str = "thumbv7em-none-eabihf";
const CHIP: &str = "STM32WB55RGVx";

pub fn run(release: bool, features: &str) -> Result<()> {
    let mode = if release { "release" } else { "debug" };
    let features = format!("hardware,{features}");

    println!();
    println!(
        "{}",
        format!("🔨 Building firmware ({mode}, features {features})...")
            .cyan()
            .bold()
    );
    println!();

    let mut args = vec![
        "build",
        "-p",
        "firmware",
        "--bin",
        "firmware",
        "--target",
        TARGET,
        "--features",
        features.as_str(),
    ];
    if release {
        args.push("--release");
    }
    cargo("Firmware build", &args, Severity::Fatal)?;

    let binary = format!("target/{TARGET}/{mode}/firmware");
    show_binary_size(&binary);

    println!("{}", format!("📡 Flashing to {CHIP}...").cyan().bold());
    println!("   {}", "Connecting to probe...".dimmed());
    println!(
        "   {}",
        "CPU2 wireless stack and FUS above 0x080C_B000 are left untouched".dimmed()
    );

    let flash_start = Instant::now();
    let status = Command::new("probe-rs")
        .args(["run", &binary, "--chip", CHIP, "--probe-index", "0"])
        .status()
        .context("Failed to run probe-rs. Is probe-rs installed? (cargo install probe-rs-tools)")?;

    if !status.success() {
        eprintln!("{}", "✗ Flash failed".red().bold());
        anyhow::bail!("Flash failed - check that the probe is connected and the board is powered");
    }

    println!(
        "{}",
        format!(
            "✓ Session ended after {:.2}s",
            flash_start.elapsed().as_secs_f64()
        )
        .green()
    );
    println!();

    Ok(())
}

fn show_binary_size(binary: &str) {
    let output = Command::new("rust-size").args(["-A", binary]).output();
    if let Ok(out) = output {
        if out.status.success() {
            println!("{}", "📊 Binary size:".cyan());
            for line in String::from_utf8_lossy(&out.stdout).lines() {
                println!("   {}", line.dimmed());
            }
            println!();
            return;
        }
    }
    println!(
        "   {}",
        "rust-size not found; install cargo-binutils for size reports".dimmed()
    );
    println!();
}
