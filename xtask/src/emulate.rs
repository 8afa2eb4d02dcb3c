use anyhow::{Context, Result};
use colored::Colorize;
use std::process::Command;

pub fn run(fail: Option<&str>, log: Option<&str>) -> Result<()> {
    println!();
    println!("{}", "🖥  Starting recorder emulator...".cyan().bold());
    if let Some(stage) = fail {
        println!("   {}", format!("{stage} start will fail").yellow());
    }
    println!("   {}", "Ctrl-C to stop".dimmed());
    println!();

    let mut cmd = Command::new("cargo");
    cmd.args([
        "run",
        "-p",
        "firmware",
        "--bin",
        "emulator",
        "--features",
        "emulator",
    ]);
    if let Some(stage) = fail {
        cmd.env("EMULATOR_FAIL", stage);
    }
    if let Some(filter) = log {
        cmd.env("RUST_LOG", filter);
    }

    let status = cmd.status().context("Failed to launch the emulator")?;
    if !status.success() {
        anyhow::bail!("Emulator exited with {status}");
    }
    Ok(())
}
