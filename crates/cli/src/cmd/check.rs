//! Validate retention rule rows from a TOML file
//!
//! ```toml
//! [[rule]]
//! tag_id = 42
//! time_unit = 2      # 0 day, 1 week, 2 month, 3 year
//! time_amount = 1
//! time_after = 1     # 0 creation, 1 modification
//! action_type = 2    # 0 delete, 1 move to trash, 2 move to path
//! move_to_path = "archive/2025"
//! ```

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use retention_core::{ActionType, RetentionRule, RuleError, RuleRow, TimeBasis};
use retention_engine::naming::hidden_destination;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RulesFile {
    #[serde(default, rename = "rule")]
    rules: Vec<RuleRow>,
}

/// A rule that passed validation, with its archive folder if it moves files
#[derive(Debug)]
struct CheckedRule {
    rule: RetentionRule,
    destination: Option<String>,
}

impl CheckedRule {
    fn describe(&self) -> String {
        let rule = &self.rule;
        let basis = match rule.time_basis {
            TimeBasis::CreationTime => "creation",
            TimeBasis::ModificationTime => "modification",
        };
        let plural = if rule.time_amount.get() == 1 { "" } else { "s" };

        let mut out = format!(
            "tag {}: {} after {} {}{} (by {} time)",
            rule.tag, rule.action_type, rule.time_amount, rule.time_unit, plural, basis
        );
        if let Some(dest) = &self.destination {
            out.push_str(&format!(" -> {}", dest));
        }
        out
    }
}

fn check_row(row: RuleRow) -> Result<CheckedRule, RuleError> {
    let rule = RetentionRule::try_from(row)?;
    rule.validate()?;

    let destination = match (rule.action_type, rule.move_to_path.as_deref()) {
        (ActionType::MoveToPath, Some(raw)) => Some(format!("/{}", hidden_destination(raw)?.join("/"))),
        _ => None,
    };

    Ok(CheckedRule { rule, destination })
}

pub fn run(path: &Path) -> Result<()> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let file: RulesFile = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    if file.rules.is_empty() {
        println!("{}", "No rules found".dimmed());
        return Ok(());
    }

    let total = file.rules.len();
    let mut invalid = 0;

    for (index, row) in file.rules.into_iter().enumerate() {
        let tag_id = row.tag_id;
        match check_row(row) {
            Ok(checked) => println!("{} {}", "✓".green(), checked.describe()),
            Err(e) => {
                invalid += 1;
                println!("{} rule #{} (tag {}): {}", "✗".red(), index + 1, tag_id, e);
            }
        }
    }

    if invalid > 0 {
        anyhow::bail!("{} of {} rules are invalid", invalid, total);
    }

    println!();
    println!("{} {} rules valid", "All".green().bold(), total);
    Ok(())
}
