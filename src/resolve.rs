//! Turning what the user typed into exactly one server-side resource
//!
//! This module provides the lookup half of most commands:
//! - Picking the single locator option the user supplied (or asking for one)
//! - Building `$filter` lookups with properly quoted values
//! - Reducing a lookup result to one record, failing with a not-found error when
//!   nothing matched and disambiguating when several did
//!
//! Disambiguation either fails listing every candidate id in server order, or,
//! when prompting is enabled, lets the user pick one.

use anyhow::Result;
use serde_json::Value;
use tracing::debug;

use crate::{context::CommandContext, error::CommandError};

/// How the user identified the resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceLocator {
    /// Canonical identifier (GUID or composite key)
    Id(String),
    /// Human-readable name matched against `property`
    Name { property: String, value: String },
    /// Set of participant sign-in names
    Participants(Vec<String>),
}

/// A lookup match: its id, a label for prompts and the full record
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub id: String,
    pub label: String,
    pub record: Value,
}

impl Candidate {
    /// Wraps a record, labelling it with `label_field` (falling back to the id).
    ///
    /// Records without a string `id` are skipped.
    pub fn from_record(record: Value, label_field: &str) -> Option<Self> {
        let id = record.get("id")?.as_str()?.to_string();
        let label = record
            .get(label_field)
            .and_then(Value::as_str)
            .map(|label| format!("{} ({})", label, id))
            .unwrap_or_else(|| id.clone());
        Some(Self { id, label, record })
    }

    /// Wraps each record with [`Candidate::from_record`], keeping server order
    pub fn from_records(records: Vec<Value>, label_field: &str) -> Vec<Self> {
        records
            .into_iter()
            .filter_map(|record| Self::from_record(record, label_field))
            .collect()
    }
}

/// Quotes a value for an OData `$filter` literal and percent-encodes it
pub fn filter_value(value: &str) -> String {
    urlencoding::encode(&value.replace('\'', "''")).into_owned()
}

/// Returns the single locator option that was supplied.
///
/// `options` pairs each flag name with its value. Clap already rejects more than
/// one; with none, prompt mode asks which option to use and for its value, and
/// non-prompt mode fails with a usage error.
pub fn pick_option(
    ctx: &CommandContext,
    options: &[(&str, Option<&str>)],
) -> Result<(String, String)> {
    let provided: Vec<_> = options
        .iter()
        .filter_map(|(name, value)| value.map(|v| (name.to_string(), v.to_string())))
        .collect();
    let names: Vec<String> = options.iter().map(|(name, _)| name.to_string()).collect();

    match provided.len() {
        1 => Ok(provided.into_iter().next().unwrap_or_default()),
        0 if ctx.config.prompt => {
            let index = ctx
                .prompter
                .select("Please specify one of the following options:", &names)?;
            let name = names
                .get(index)
                .cloned()
                .ok_or_else(|| CommandError::Usage("Invalid option selected.".to_string()))?;
            let value = ctx.prompter.input(&format!("{}:", name))?;
            if value.trim().is_empty() {
                return Err(CommandError::Usage(format!("No value specified for {}.", name)).into());
            }
            Ok((name, value.trim().to_string()))
        }
        0 => Err(CommandError::Usage(format!("Specify either {}.", join_options(&names))).into()),
        _ => Err(CommandError::Usage(format!(
            "Specify either {}, but not multiple.",
            join_options(&names)
        ))
        .into()),
    }
}

fn join_options(names: &[String]) -> String {
    match names.split_last() {
        Some((last, rest)) if !rest.is_empty() => format!("{} or {}", rest.join(", "), last),
        Some((last, _)) => last.clone(),
        None => String::new(),
    }
}

/// Reduces lookup results to one candidate.
///
/// No match fails with `not_found`; several go to
/// [`handle_multiple_results_found`] with `ambiguous` as the message.
pub fn resolve_single(
    ctx: &CommandContext,
    mut candidates: Vec<Candidate>,
    not_found: &str,
    ambiguous: &str,
) -> Result<Candidate> {
    match candidates.len() {
        0 => Err(CommandError::NotFound(not_found.to_string()).into()),
        1 => Ok(candidates.remove(0)),
        _ => handle_multiple_results_found(ctx, ambiguous, candidates),
    }
}

/// Picks one of several candidates, or fails listing all of their ids
pub fn handle_multiple_results_found(
    ctx: &CommandContext,
    message: &str,
    mut candidates: Vec<Candidate>,
) -> Result<Candidate> {
    debug!("{} candidates for: {}", candidates.len(), message);

    if !ctx.config.prompt {
        return Err(CommandError::Ambiguous {
            message: message.to_string(),
            ids: candidates.into_iter().map(|c| c.id).collect(),
        }
        .into());
    }

    let labels: Vec<String> = candidates.iter().map(|c| c.label.clone()).collect();
    let index = ctx
        .prompter
        .select(&format!("{} Please choose one:", message), &labels)?;
    if index >= candidates.len() {
        return Err(CommandError::Usage("Invalid option selected.".to_string()).into());
    }
    Ok(candidates.swap_remove(index))
}
