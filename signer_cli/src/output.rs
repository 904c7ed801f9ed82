//! Rendering of run results

use anyhow::Result;
use colored::*;
use serde::Serialize;
use signer_core::{PipelineOutcome, ProviderStats, StreamReport};

/// Output format enumeration
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    /// Parse output format from string
    pub fn from_string(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => anyhow::bail!("Unknown output format: {}", s),
        }
    }
}

/// What `signer run` reports
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub inputs: Vec<i64>,
    pub digest: String,
    pub duration_ms: u128,
    pub streams: Vec<StreamReport>,
    pub provider: ProviderStats,
}

impl RunSummary {
    pub fn new(inputs: Vec<i64>, outcome: &PipelineOutcome, provider: ProviderStats) -> Result<Self> {
        Ok(Self {
            inputs,
            digest: outcome.single_output()?.to_string(),
            duration_ms: outcome.duration.as_millis(),
            streams: outcome.streams.clone(),
            provider,
        })
    }
}

/// Format the summary for stdout
///
/// Text output is the bare digest so it can be piped; JSON carries the full
/// summary.
pub fn format_summary(summary: &RunSummary, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(summary.digest.clone()),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(summary)?),
    }
}

/// One-line run statistics for stderr
pub fn format_stats(summary: &RunSummary, use_color: bool) -> String {
    let line = format!(
        "Signed {} value(s) in {:.2}s ({} secure hash call(s), {} overheat(s))",
        summary.inputs.len(),
        summary.duration_ms as f64 / 1000.0,
        summary.provider.secure_hash_calls,
        summary.provider.overheats,
    );
    if !use_color {
        line
    } else if summary.provider.overheats > 0 {
        line.yellow().to_string()
    } else {
        line.green().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> RunSummary {
        RunSummary {
            inputs: vec![0, 1],
            digest: "a_b".to_string(),
            duration_ms: 1500,
            streams: Vec::new(),
            provider: ProviderStats {
                chk_calls: 16,
                secure_hash_calls: 2,
                overheats: 0,
            },
        }
    }

    #[test]
    fn test_parse_format() {
        assert_eq!(OutputFormat::from_string("JSON").unwrap(), OutputFormat::Json);
        assert_eq!(OutputFormat::from_string("text").unwrap(), OutputFormat::Text);
        assert!(OutputFormat::from_string("csv").is_err());
    }

    #[test]
    fn test_text_is_bare_digest() {
        assert_eq!(format_summary(&summary(), OutputFormat::Text).unwrap(), "a_b");
    }

    #[test]
    fn test_json_carries_stats() {
        let json = format_summary(&summary(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["digest"], "a_b");
        assert_eq!(value["inputs"][1], 1);
        assert_eq!(value["provider"]["secure_hash_calls"], 2);
    }

    #[test]
    fn test_plain_stats_line() {
        let line = format_stats(&summary(), false);
        assert_eq!(
            line,
            "Signed 2 value(s) in 1.50s (2 secure hash call(s), 0 overheat(s))"
        );
    }
}
