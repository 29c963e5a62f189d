//! `spo search`
//!
//! The search endpoint pages by row offset instead of continuation links: each
//! response reports how many rows it returned and how many exist in total.

use anyhow::Result;
use clap::Args;
use serde_json::{Map, Value};
use tracing::debug;

use crate::{
    context::CommandContext,
    error::CommandError,
    http::{RequestOptions, SPO_JSON},
    validation::{validate_absolute_url, validate_guid},
};

/// Page size used with `--all-results` when `--row-limit` is not given
const ALL_RESULTS_ROW_LIMIT: u32 = 500;

#[derive(Args, Debug, Clone, Default)]
pub struct SearchArgs {
    /// KQL query
    #[arg(short, long)]
    pub query_text: String,

    /// Site to search from
    #[arg(short = 'u', long)]
    pub web_url: String,

    /// Comma-separated managed properties to return
    #[arg(short = 'p', long)]
    pub select_properties: Option<String>,

    #[arg(long)]
    pub refinement_filters: Option<String>,

    #[arg(long)]
    pub sort_list: Option<String>,

    #[arg(long)]
    pub ranking_model_id: Option<String>,

    #[arg(long)]
    pub start_row: Option<u32>,

    #[arg(long)]
    pub row_limit: Option<u32>,

    #[arg(long)]
    pub source_id: Option<String>,

    #[arg(long)]
    pub trim_duplicates: Option<bool>,

    #[arg(long)]
    pub culture: Option<i32>,

    /// Keep requesting pages until every row has been retrieved
    #[arg(long)]
    pub all_results: bool,

    /// Print the raw search response instead of the rows
    #[arg(long)]
    pub raw_output: bool,
}

impl SearchArgs {
    fn validate(&self) -> Result<(), String> {
        validate_absolute_url("--web-url", &self.web_url)?;
        if let Some(id) = &self.ranking_model_id {
            validate_guid("--ranking-model-id", id)?;
        }
        if let Some(id) = &self.source_id {
            validate_guid("--source-id", id)?;
        }
        Ok(())
    }

    fn query_url(&self, start_row: u32) -> String {
        fn quoted(value: &str) -> String {
            urlencoding::encode(&format!("'{}'", value.replace('\'', "''"))).into_owned()
        }

        let mut url = format!(
            "{}/_api/search/query?querytext={}",
            self.web_url.trim_end_matches('/'),
            quoted(&self.query_text)
        );
        let quoted_params = [
            ("selectproperties", &self.select_properties),
            ("refinementfilters", &self.refinement_filters),
            ("sortlist", &self.sort_list),
            ("rankingmodelid", &self.ranking_model_id),
            ("sourceid", &self.source_id),
        ];
        for (name, value) in quoted_params {
            if let Some(value) = value {
                url.push_str(&format!("&{}={}", name, quoted(value)));
            }
        }
        if let Some(trim) = self.trim_duplicates {
            url.push_str(&format!("&trimduplicates={}", trim));
        }
        if let Some(culture) = self.culture {
            url.push_str(&format!("&culture={}", culture));
        }
        if self.start_row.is_some() || self.all_results {
            url.push_str(&format!("&startrow={}", start_row));
        }
        let row_limit = match (self.row_limit, self.all_results) {
            (Some(limit), _) => Some(limit),
            (None, true) => Some(ALL_RESULTS_ROW_LIMIT),
            (None, false) => None,
        };
        if let Some(limit) = row_limit {
            url.push_str(&format!("&rowlimit={}", limit));
        }
        url
    }
}

fn relevant_results(response: &Value) -> Option<&Value> {
    response.pointer("/PrimaryQueryResult/RelevantResults")
}

fn count(results: Option<&Value>, field: &str) -> u64 {
    results
        .and_then(|r| r.get(field))
        .and_then(Value::as_u64)
        .unwrap_or_default()
}

/// Turns each `Cells[{Key, Value}]` row into a `{Key: Value}` object
fn flatten_rows(response: &Value) -> Vec<Value> {
    let Some(rows) = relevant_results(response)
        .and_then(|r| r.pointer("/Table/Rows"))
        .and_then(Value::as_array)
    else {
        return Vec::new();
    };

    rows.iter()
        .map(|row| {
            let record: Map<String, Value> = row
                .get("Cells")
                .and_then(Value::as_array)
                .into_iter()
                .flatten()
                .filter_map(|cell| {
                    let key = cell.get("Key").and_then(Value::as_str)?;
                    Some((key.to_string(), cell.get("Value").cloned().unwrap_or(Value::Null)))
                })
                .collect();
            Value::Object(record)
        })
        .collect()
}

/// Runs a SharePoint search query
///
/// With `--all-results`, pages are fetched one after another, advancing `startrow`
/// by the returned row count until `TotalRows` is reached.
///
/// # Arguments
/// * `ctx` - Command context
/// * `args` - Query and paging options
///
/// # Returns
/// * `Result<Value>` - Flattened rows, or the last raw response with `--raw-output`
pub async fn search(ctx: &CommandContext, args: &SearchArgs) -> Result<Value> {
    args.validate().map_err(CommandError::Usage)?;

    let mut start_row = args.start_row.unwrap_or_default();
    let mut rows = Vec::new();
    loop {
        let response = ctx
            .http
            .get_json(RequestOptions::new(args.query_url(start_row)).header("Accept", SPO_JSON))
            .await?;
        let results = relevant_results(&response);
        let row_count = count(results, "RowCount");
        let total_rows = count(results, "TotalRows");
        rows.extend(flatten_rows(&response));
        debug!(
            "Search returned {} row(s) from {}, {} in total",
            row_count, start_row, total_rows
        );

        // Stop at the largest representable offset rather than wrapping to row 0
        let next_row = u32::try_from(row_count)
            .ok()
            .and_then(|count| start_row.checked_add(count));
        match next_row {
            Some(next) if args.all_results && row_count > 0 && u64::from(next) < total_rows => {
                start_row = next;
            }
            _ if args.raw_output => return Ok(response),
            _ => return Ok(Value::Array(rows)),
        }
    }
}
