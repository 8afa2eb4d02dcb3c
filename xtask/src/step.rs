use anyhow::{Context, Result};
use colored::Colorize;
use std::process::{Command, Output};
use std::time::Instant;

/// Whether a failing step stops the task or is only reported.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Fatal,
    Advisory,
}

/// Run one cargo invocation, print a pass/fail line, return its output.
pub fn cargo(label: &str, args: &[&str], severity: Severity) -> Result<Option<Output>> {
    println!("{}", format!("  {label}...").cyan());
    let start = Instant::now();

    let output = Command::new("cargo")
        .args(args)
        .output()
        .with_context(|| format!("Failed to run cargo {}", args.join(" ")))?;

    if output.status.success() {
        println!(
            "{}",
            format!("  ✓ {label} passed in {:.2}s", start.elapsed().as_secs_f64()).green()
        );
        println!();
        return Ok(Some(output));
    }

    match severity {
        Severity::Fatal => {
            eprintln!("{}", format!("  ✗ {label} failed").red().bold());
            eprintln!();
            eprintln!("{}", String::from_utf8_lossy(&output.stderr));
            eprintln!("{}", String::from_utf8_lossy(&output.stdout));
            anyhow::bail!("{label} failed");
        }
        Severity::Advisory => {
            eprintln!("{}", format!("  ⚠ {label} reported problems").yellow().bold());
            eprintln!();
            eprintln!("{}", String::from_utf8_lossy(&output.stderr));
            Ok(None)
        }
    }
}

/// Pull "N passed; M failed" out of libtest output.
pub fn test_summary(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .filter_map(|line| line.split("test result:").nth(1))
        .map(str::trim)
        .last()
        .unwrap_or("(summary not available)")
        .to_string()
}
