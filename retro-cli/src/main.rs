//! retro-cli: command-line front-end for the Retro HTTP API
//!
//! # Subcommands
//! - `submit <text> [--thread <id>]`           : add a daily summary
//! - `retro [--thread <id>]`                   : generate a retrospective
//! - `summaries [-n <count>] [--seed <s>] ...` : mock alerts grouped into summaries
//! - `insights <summary.json> [--index <i>]`   : actionable insights for a summary
//! - `status`                                  : show server health

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde::Deserialize;
use serde_json::{json, Value};

const DEFAULT_SERVER: &str = "http://127.0.0.1:5000";

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Debug, Parser)]
#[command(
    name = "retro-cli",
    version,
    about = "Submit daily summaries and browse alert retrospectives"
)]
struct Cli {
    /// Retro HTTP server URL (overrides RETRO_HTTP_URL env var)
    #[arg(long, env = "RETRO_HTTP_URL", default_value = DEFAULT_SERVER)]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Submit a daily summary
    Submit {
        /// Summary text
        text: String,

        /// Thread to append to (server default when omitted)
        #[arg(long)]
        thread: Option<String>,
    },

    /// Generate a retrospective over a thread's daily summaries
    Retro {
        #[arg(long)]
        thread: Option<String>,
    },

    /// Generate mock alerts and group them into retrospective summaries
    Summaries {
        #[arg(short = 'n', long)]
        count: Option<i64>,

        #[arg(long)]
        seed: Option<u64>,

        #[arg(long)]
        noisy_threshold: Option<i64>,

        #[arg(long)]
        max_per_summary: Option<i64>,

        /// Print the raw JSON response
        #[arg(long)]
        json: bool,
    },

    /// Request actionable insights for a summary read from a JSON file
    Insights {
        /// A summary object, or a `summaries` response
        file: PathBuf,

        /// Which summary to use when the file holds several
        #[arg(long, default_value_t = 0)]
        index: usize,

        #[arg(long)]
        thread: Option<String>,
    },

    /// Show Retro server status
    Status,
}

// ============================================================================
// API Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct TagCount {
    pub tag: String,
    pub count: usize,
}

#[derive(Debug, Deserialize)]
pub struct SummaryStats {
    pub summary_count: usize,
    pub alert_count: usize,
    pub noisy_count: usize,
    pub self_resolved_count: usize,
    #[serde(default)]
    pub top_tags: Vec<TagCount>,
}

// ============================================================================
// Formatting helpers
// ============================================================================

/// First 8 characters of an id.
pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(8) {
        Some((idx, _)) => &id[..idx],
        None => id,
    }
}

/// One line per summary: id, tags, and counts.
pub fn summary_line(summary: &Value) -> String {
    let id = summary["summary_id"].as_str().unwrap_or("?");
    let tags: Vec<&str> = summary["tags"]
        .as_array()
        .map(|t| t.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    let items = summary["items"].as_array().map(Vec::as_slice).unwrap_or(&[]);
    let noisy = items.iter().filter(|a| a["is_noisy"] == true).count();
    let resolved = items.iter().filter(|a| a["is_self_resolved"] == true).count();
    format!(
        "{}  [{}]  {} alerts ({} noisy, {} self-resolved)",
        short_id(id),
        tags.join(", "),
        items.len(),
        noisy,
        resolved
    )
}

pub fn stats_lines(stats: &SummaryStats) -> Vec<String> {
    let mut lines = vec![format!(
        "{} summaries, {} alerts, {} noisy, {} self-resolved",
        stats.summary_count, stats.alert_count, stats.noisy_count, stats.self_resolved_count
    )];
    for t in stats.top_tags.iter().take(5) {
        lines.push(format!("  {:<28} {}", t.tag, t.count));
    }
    lines
}

/// Pick the summary to send: the document itself when it has a
/// `summary_id`, otherwise entry `index` of its `summaries` array.
pub fn select_summary(doc: &Value, index: usize) -> anyhow::Result<Value> {
    if doc.get("summary_id").is_some() {
        return Ok(doc.clone());
    }
    let summaries = doc
        .get("summaries")
        .and_then(Value::as_array)
        .ok_or_else(|| anyhow::anyhow!("expected a summary or a `summaries` array"))?;
    summaries.get(index).cloned().ok_or_else(|| {
        anyhow::anyhow!(
            "summary index {} out of range ({} available)",
            index,
            summaries.len()
        )
    })
}

pub fn retrospective_url(server: &str, thread: Option<&str>) -> String {
    match thread {
        Some(t) => format!("{}/api/retrospective?thread_id={}", server, t),
        None => format!("{}/api/retrospective", server),
    }
}

// ============================================================================
// HTTP Client Calls
// ============================================================================

fn client(timeout_secs: u64) -> anyhow::Result<reqwest::blocking::Client> {
    Ok(reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()?)
}

/// Send a request and return the JSON body, exiting on transport or HTTP errors.
fn expect_json(
    url: &str,
    resp: reqwest::Result<reqwest::blocking::Response>,
) -> anyhow::Result<Value> {
    let resp = match resp {
        Ok(r) => r,
        Err(e) => {
            eprintln!("retro-cli: connection failed to {}: {}", url, e);
            std::process::exit(1);
        }
    };

    let status = resp.status();
    let body: Value = resp.json().unwrap_or(Value::Null);
    if !status.is_success() {
        let msg = body["error"].as_str().unwrap_or("no error message");
        eprintln!("retro-cli: server returned {}: {}", status, msg);
        std::process::exit(1);
    }
    Ok(body)
}

fn do_submit(server: &str, text: &str, thread: Option<String>) -> anyhow::Result<()> {
    let url = format!("{}/api/submit_daily", server);
    let body = json!({ "text": text, "thread_id": thread });
    let resp = expect_json(&url, client(10)?.post(&url).json(&body).send())?;
    println!(
        "{} ({} in thread)",
        resp["message"].as_str().unwrap_or("Submitted."),
        resp["current_summary_count"]
    );
    Ok(())
}

fn do_retro(server: &str, thread: Option<String>) -> anyhow::Result<()> {
    let url = retrospective_url(server, thread.as_deref());
    let resp = expect_json(&url, client(120)?.get(&url).send())?;
    if let Some(n) = resp["source_summary_count"].as_u64() {
        eprintln!("Retrospective over {} daily summaries:\n", n);
    }
    println!("{}", resp["summary"].as_str().unwrap_or(""));
    Ok(())
}

fn do_summaries(
    server: &str,
    count: Option<i64>,
    seed: Option<u64>,
    noisy_threshold: Option<i64>,
    max_per_summary: Option<i64>,
    json_output: bool,
) -> anyhow::Result<()> {
    let url = format!("{}/api/alerts/summaries", server);
    let body = json!({
        "count": count,
        "seed": seed,
        "noisy_threshold_count": noisy_threshold,
        "max_alerts_per_summary": max_per_summary,
    });
    let resp = expect_json(&url, client(30)?.post(&url).json(&body).send())?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&resp)?);
        return Ok(());
    }

    for summary in resp["summaries"].as_array().map(Vec::as_slice).unwrap_or(&[]) {
        println!("{}", summary_line(summary));
    }
    let stats: SummaryStats = serde_json::from_value(resp["stats"].clone())?;
    println!();
    for line in stats_lines(&stats) {
        println!("{}", line);
    }
    Ok(())
}

fn do_insights(
    server: &str,
    file: &Path,
    index: usize,
    thread: Option<String>,
) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(file)?;
    let doc: Value = serde_json::from_str(&raw)?;
    let mut summary = select_summary(&doc, index)?;
    if let (Some(t), Some(obj)) = (thread, summary.as_object_mut()) {
        obj.insert("thread_id".to_string(), json!(t));
    }

    let url = format!("{}/api/insights", server);
    let resp = expect_json(&url, client(120)?.post(&url).json(&summary).send())?;
    eprintln!(
        "Insights for summary {}:\n",
        short_id(resp["summary_id"].as_str().unwrap_or("?"))
    );
    println!("{}", resp["actionable_insights"].as_str().unwrap_or(""));
    Ok(())
}

/// Show the server status by calling GET /health.
fn do_status(server: &str) -> anyhow::Result<()> {
    let url = format!("{}/health", server);
    let resp = client(10)?.get(&url).send();

    match resp {
        Ok(r) if r.status().is_success() => {
            let body: Value = r.json().unwrap_or_default();
            println!("Retro server: {}", body["status"].as_str().unwrap_or("unknown"));
            println!("Version:      {}", body["version"].as_str().unwrap_or("?"));
            println!("Store:        {}", body["store"].as_str().unwrap_or("?"));
            println!("LLM:          {}", body["llm"].as_str().unwrap_or("?"));
        }
        Ok(r) => {
            eprintln!("retro-cli: server unhealthy (HTTP {})", r.status());
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("retro-cli: cannot reach {}: {}", url, e);
            std::process::exit(1);
        }
    }

    Ok(())
}

// ============================================================================
// Main
// ============================================================================

fn main() {
    let cli = Cli::parse();
    let server = cli.server.trim_end_matches('/').to_string();

    let result = match cli.command {
        Commands::Submit { text, thread } => do_submit(&server, &text, thread),
        Commands::Retro { thread } => do_retro(&server, thread),
        Commands::Summaries {
            count,
            seed,
            noisy_threshold,
            max_per_summary,
            json,
        } => do_summaries(&server, count, seed, noisy_threshold, max_per_summary, json),
        Commands::Insights {
            file,
            index,
            thread,
        } => do_insights(&server, &file, index, thread),
        Commands::Status => do_status(&server),
    };

    if let Err(e) = result {
        eprintln!("retro-cli: {}", e);
        std::process::exit(1);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(id: &str, tags: &[&str], flags: &[(bool, bool)]) -> Value {
        let items: Vec<Value> = flags
            .iter()
            .map(|(noisy, resolved)| json!({ "is_noisy": noisy, "is_self_resolved": resolved }))
            .collect();
        json!({ "summary_id": id, "tags": tags, "items": items })
    }

    // ========================================================================
    // TEST 1: short_id truncates to 8 chars, leaves short ids alone
    // ========================================================================
    #[test]
    fn test_short_id() {
        assert_eq!(short_id("7b5c24ab-1234-5678-9abc-def012345678"), "7b5c24ab");
        assert_eq!(short_id("abc"), "abc");
        assert_eq!(short_id(""), "");
    }

    // ========================================================================
    // TEST 2: summary_line counts flags
    // ========================================================================
    #[test]
    fn test_summary_line_counts_flags() {
        let s = summary(
            "deadbeef-0000",
            &["alert_type:noisy", "type:cpu"],
            &[(true, false), (true, true), (false, false)],
        );
        assert_eq!(
            summary_line(&s),
            "deadbeef  [alert_type:noisy, type:cpu]  3 alerts (2 noisy, 1 self-resolved)"
        );
    }

    // ========================================================================
    // TEST 3: summary_line tolerates missing fields
    // ========================================================================
    #[test]
    fn test_summary_line_missing_fields() {
        assert_eq!(summary_line(&json!({})), "?  []  0 alerts (0 noisy, 0 self-resolved)");
    }

    // ========================================================================
    // TEST 4: select_summary accepts a bare summary
    // ========================================================================
    #[test]
    fn test_select_bare_summary() {
        let s = summary("one", &["general"], &[(false, false)]);
        assert_eq!(select_summary(&s, 3).unwrap()["summary_id"], "one");
    }

    // ========================================================================
    // TEST 5: select_summary indexes a summaries response
    // ========================================================================
    #[test]
    fn test_select_from_response() {
        let doc = json!({
            "summaries": [summary("a", &[], &[]), summary("b", &[], &[])],
            "stats": {}
        });
        assert_eq!(select_summary(&doc, 1).unwrap()["summary_id"], "b");
        assert!(select_summary(&doc, 2).is_err());
        assert!(select_summary(&json!({"other": 1}), 0).is_err());
    }

    // ========================================================================
    // TEST 6: stats_lines lists at most five tags
    // ========================================================================
    #[test]
    fn test_stats_lines() {
        let stats: SummaryStats = serde_json::from_value(json!({
            "summary_count": 2,
            "alert_count": 12,
            "noisy_count": 4,
            "self_resolved_count": 1,
            "top_tags": (0..7).map(|i| json!({"tag": format!("t{}", i), "count": 7 - i})).collect::<Vec<_>>()
        }))
        .unwrap();
        let lines = stats_lines(&stats);
        assert_eq!(lines[0], "2 summaries, 12 alerts, 4 noisy, 1 self-resolved");
        assert_eq!(lines.len(), 6);
        assert!(lines[1].trim_start().starts_with("t0"));
    }

    // ========================================================================
    // TEST 7: retrospective_url adds the thread query
    // ========================================================================
    #[test]
    fn test_retrospective_url() {
        assert_eq!(
            retrospective_url("http://h:5000", None),
            "http://h:5000/api/retrospective"
        );
        assert_eq!(
            retrospective_url("http://h:5000", Some("team-a")),
            "http://h:5000/api/retrospective?thread_id=team-a"
        );
    }
}
