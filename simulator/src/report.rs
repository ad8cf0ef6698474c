//! JSON-lines output of summaries and step records.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use crate::experiment::RunOutcome;

/// Writes one JSON summary per line.
pub fn write_summaries<W: Write>(mut out: W, outcomes: &[RunOutcome]) -> Result<()> {
    for outcome in outcomes {
        serde_json::to_writer(&mut out, &outcome.summary)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}

/// Writes every step record of every run, one per line, tagged with its
/// mechanism.
pub fn encode_history(outcomes: &[RunOutcome]) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    for outcome in outcomes {
        for record in &outcome.records {
            let mut value = serde_json::to_value(record)?;
            value["mechanism"] = serde_json::to_value(outcome.summary.mechanism)?;
            serde_json::to_writer(&mut buf, &value)?;
            buf.push(b'\n');
        }
    }
    Ok(buf)
}

pub async fn write_history(path: &Path, outcomes: &[RunOutcome]) -> Result<()> {
    let buf = encode_history(outcomes)?;
    tokio::fs::write(path, buf)
        .await
        .with_context(|| format!("failed to write history to {}", path.display()))?;
    tracing::info!(path = %path.display(), "wrote step history");
    Ok(())
}
