use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Append-only decision journal writer. Writes JSON Lines (one record per
/// line) with an optional hash chain: each record can carry `hash_prev` +
/// `hash_self` so a downstream analytics tool can detect tampering or a
/// truncated file without replaying engine state.
pub struct JournalWriter {
    path: PathBuf,
    hash_chain: bool,
    last_hash: Option<String>,
    /// Monotonically increasing sequence counter used to derive
    /// `record_id`. Starts at 0 and increments on every `append` call.
    seq: u64,
}

impl JournalWriter {
    /// Creates the writer and ensures parent directories exist.
    pub fn new(path: impl AsRef<Path>, hash_chain: bool) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create_dir_all {:?}", parent))?;
        }

        Ok(Self {
            path,
            hash_chain,
            last_hash: None,
            seq: 0,
        })
    }

    /// Restore chain state when resuming an existing log after a restart.
    /// Must be called together with `set_seq`.
    pub fn set_last_hash(&mut self, last_hash: Option<String>) {
        self.last_hash = last_hash;
    }

    pub fn last_hash(&self) -> Option<String> {
        self.last_hash.clone()
    }

    pub fn set_seq(&mut self, seq: u64) {
        self.seq = seq;
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Append one record under the given `topic`/`kind`. `payload` is the
    /// domain record (`EntryDecision`/`PositionEvent`) serialized to JSON.
    pub fn append(
        &mut self,
        run_id: Uuid,
        topic: &str,
        kind: &str,
        payload: Value,
    ) -> Result<JournalRecord> {
        let ts_utc = Utc::now();
        let record_id = derive_record_id(self.last_hash.as_deref(), &payload, self.seq)?;
        self.seq += 1;

        let mut rec = JournalRecord {
            record_id,
            run_id,
            ts_utc,
            topic: topic.to_string(),
            kind: kind.to_string(),
            payload,
            hash_prev: None,
            hash_self: None,
        };

        if self.hash_chain {
            rec.hash_prev = self.last_hash.clone();
            let self_hash = compute_record_hash(&rec)?;
            rec.hash_self = Some(self_hash.clone());
            self.last_hash = Some(self_hash);
        }

        let line = canonical_json_line(&rec)?;
        append_line(&self.path, &line)?;

        Ok(rec)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalRecord {
    pub record_id: Uuid,
    pub run_id: Uuid,
    pub ts_utc: DateTime<Utc>,
    pub topic: String,
    pub kind: String,
    pub payload: Value,
    pub hash_prev: Option<String>,
    pub hash_self: Option<String>,
}

fn derive_record_id(last_hash: Option<&str>, payload: &Value, seq: u64) -> Result<Uuid> {
    let canonical = canonical_json_line(payload)?;
    let seed = format!("{}|{}|{}", last_hash.unwrap_or(""), canonical, seq);
    let mut hasher = Sha256::new();
    hasher.update(seed.as_bytes());
    let digest = hasher.finalize();
    Ok(Uuid::new_v5(&Uuid::NAMESPACE_OID, &digest))
}

fn append_line(path: &Path, line: &str) -> Result<()> {
    let mut f = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open journal {:?}", path))?;
    f.write_all(line.as_bytes()).context("write journal line failed")?;
    f.write_all(b"\n").context("write newline failed")?;
    Ok(())
}

/// Canonicalize by sorting keys recursively and emitting compact JSON. One
/// record == one JSON line.
fn canonical_json_line<T: Serialize>(v: &T) -> Result<String> {
    let raw = serde_json::to_value(v).context("serialize journal record failed")?;
    let sorted = sort_keys(&raw);
    serde_json::to_string(&sorted).context("json stringify failed")
}

fn sort_keys(v: &Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut keys: Vec<_> = map.keys().cloned().collect();
            keys.sort();
            let mut new = serde_json::Map::new();
            for k in keys {
                new.insert(k.clone(), sort_keys(&map[&k]));
            }
            Value::Object(new)
        }
        Value::Array(arr) => Value::Array(arr.iter().map(sort_keys).collect()),
        _ => v.clone(),
    }
}

/// Hash chain is computed from canonical JSON of the record WITHOUT
/// `hash_self` (to avoid self-reference).
pub fn compute_record_hash(rec: &JournalRecord) -> Result<String> {
    let mut clone = rec.clone();
    clone.hash_self = None;
    let canonical = canonical_json_line(&clone)?;
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Verify the hash chain integrity of a journal file.
pub fn verify_hash_chain(path: impl AsRef<Path>) -> Result<VerifyResult> {
    let content = fs::read_to_string(path.as_ref())
        .with_context(|| format!("read journal {:?}", path.as_ref()))?;
    verify_hash_chain_str(&content)
}

/// Same as [`verify_hash_chain`] but operates on an in-memory string —
/// useful for tests.
pub fn verify_hash_chain_str(content: &str) -> Result<VerifyResult> {
    let mut prev_hash: Option<String> = None;
    let mut line_count = 0usize;

    for (i, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let rec: JournalRecord = serde_json::from_str(trimmed)
            .with_context(|| format!("parse journal record at line {}", i + 1))?;
        line_count += 1;

        if rec.hash_prev != prev_hash {
            return Ok(VerifyResult::Broken {
                line: i + 1,
                reason: format!(
                    "hash_prev mismatch: expected {:?}, got {:?}",
                    prev_hash, rec.hash_prev
                ),
            });
        }

        if let Some(ref claimed_hash) = rec.hash_self {
            let recomputed = compute_record_hash(&rec)?;
            if *claimed_hash != recomputed {
                return Ok(VerifyResult::Broken {
                    line: i + 1,
                    reason: format!(
                        "hash_self mismatch: claimed {}, recomputed {}",
                        claimed_hash, recomputed
                    ),
                });
            }
        }

        prev_hash = rec.hash_self.clone();
    }

    Ok(VerifyResult::Valid { lines: line_count })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyResult {
    Valid { lines: usize },
    Broken { line: usize, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn append_then_verify_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("journal.jsonl");
        let run_id = Uuid::new_v4();
        let mut w = JournalWriter::new(&path, true).unwrap();
        w.append(run_id, "decisions", "entry_decision", serde_json::json!({"a": 1}))
            .unwrap();
        w.append(run_id, "decisions", "entry_decision", serde_json::json!({"a": 2}))
            .unwrap();

        let result = verify_hash_chain(&path).unwrap();
        assert_eq!(result, VerifyResult::Valid { lines: 2 });
    }

    #[test]
    fn tampered_line_breaks_the_chain() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("journal.jsonl");
        let run_id = Uuid::new_v4();
        let mut w = JournalWriter::new(&path, true).unwrap();
        w.append(run_id, "decisions", "entry_decision", serde_json::json!({"a": 1}))
            .unwrap();
        w.append(run_id, "decisions", "entry_decision", serde_json::json!({"a": 2}))
            .unwrap();

        let mut content = fs::read_to_string(&path).unwrap();
        content = content.replace("\"a\":2", "\"a\":3");
        fs::write(&path, content).unwrap();

        let result = verify_hash_chain(&path).unwrap();
        assert!(matches!(result, VerifyResult::Broken { .. }));
    }
}
