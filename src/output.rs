use crate::metrics::MetricsSnapshot;
use serde::Serialize;
use std::io::{self, Write};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Serialize, Debug)]
pub struct SnapshotEntry<'a> {
    pub time: f64,
    pub cluster: &'a str,
    #[serde(flatten)]
    pub snapshot: MetricsSnapshot,
}

impl<'a> SnapshotEntry<'a> {
    pub fn new(cluster: &'a str, snapshot: MetricsSnapshot) -> Self {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs_f64();

        SnapshotEntry {
            time: now,
            cluster,
            snapshot,
        }
    }
}

/// Write the entry as a single JSON line, non-finite ratios become `null`.
pub fn write_jsonl_entry<W: Write>(writer: &mut W, prefix: &str, entry: &SnapshotEntry) -> io::Result<()> {
    let as_json = serde_json::to_string(entry)?;
    writeln!(writer, "{prefix}{as_json}")?;
    writer.flush()
}
