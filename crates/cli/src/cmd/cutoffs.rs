//! Preview the cutoffs a rule would use

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use owo_colors::OwoColorize;
use retention_core::{Cutoffs, TimeUnit};
use std::num::NonZeroU32;

pub fn run(unit: TimeUnit, amount: NonZeroU32, now: Option<&str>) -> Result<()> {
    let now = match now {
        Some(raw) => parse_time(raw)?,
        None => Utc::now(),
    };

    let cutoffs = Cutoffs::compute(now, unit, amount);
    let plural = if amount.get() == 1 { "" } else { "s" };

    println!("{} {} {}{}", "Retention window:".bold(), amount, unit, plural);
    println!("{}  {}", "Now:    ".dimmed(), now.to_rfc3339());
    println!("{}  {}", "Expiry: ".yellow(), cutoffs.expiry.to_rfc3339());
    println!("{}  {}", "Warning:".cyan(), cutoffs.warning.to_rfc3339());
    println!();
    println!(
        "{}",
        "Files aged before the expiry cutoff are disposed of; files aged before the warning cutoff are announced."
            .dimmed()
    );

    Ok(())
}

fn parse_time(raw: &str) -> Result<DateTime<Utc>> {
    let parsed = DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("Invalid --now '{}': expected RFC 3339, e.g. 2025-03-31T12:00:00Z", raw))?;
    Ok(parsed.with_timezone(&Utc))
}
