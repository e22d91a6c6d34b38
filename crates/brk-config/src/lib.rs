//! brk-config
//!
//! Layered YAML configuration: load + deep-merge + canonicalize + hash,
//! reject literal secrets that should have been env var names instead,
//! resolve those names against the environment per run mode, and report
//! config keys a mode declares but never reads.

mod consumption;

pub use consumption::{consumed_pointers, ConfigMode};

use anyhow::{bail, Context, Result};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config_json: Value,
    pub canonical_json: String,
    pub config_hash: String,
}

/// Load + merge YAML files in order, then canonicalize to JSON and hash.
/// Later files override earlier files via deep-merge.
pub fn load_layered_yaml(paths: &[&str]) -> Result<LoadedConfig> {
    let mut sources = Vec::with_capacity(paths.len());
    for p in paths {
        sources.push(fs::read_to_string(p).with_context(|| format!("read config: {p}"))?);
    }
    let refs: Vec<&str> = sources.iter().map(String::as_str).collect();
    load_layered_yaml_from_strings(&refs)
}

/// Same as [`load_layered_yaml`] but operates on in-memory YAML strings —
/// used by tests and by callers that already have config text in hand.
pub fn load_layered_yaml_from_strings(yamls: &[&str]) -> Result<LoadedConfig> {
    let mut merged = Value::Object(Default::default());

    for s in yamls {
        let yaml_val: serde_yaml::Value = serde_yaml::from_str(s).context("parse yaml")?;
        let json_val = serde_json::to_value(yaml_val).context("yaml->json conversion failed")?;
        deep_merge(&mut merged, json_val);
    }

    detect_secret_values(&merged, "")?;

    let canonical = canonicalize_json(&merged);

    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    let hash = hex::encode(hasher.finalize());

    Ok(LoadedConfig {
        config_json: serde_json::from_str(&canonical).context("canonical json parse failed")?,
        canonical_json: canonical,
        config_hash: hash,
    })
}

/// Deep-merge: objects merge recursively; arrays replaced; scalars overwritten.
fn deep_merge(dst: &mut Value, src: Value) {
    match (dst, src) {
        (Value::Object(dst_map), Value::Object(src_map)) => {
            for (k, v) in src_map {
                match dst_map.get_mut(&k) {
                    Some(existing) => deep_merge(existing, v),
                    None => {
                        dst_map.insert(k, v);
                    }
                }
            }
        }
        (dst_slot, src_val) => {
            *dst_slot = src_val;
        }
    }
}

/// Config YAML must store env var *names*, never the secret value itself.
/// Walk every string leaf and reject anything that looks like a live
/// credential rather than a name a caller would pass to `std::env::var`.
fn detect_secret_values(v: &Value, pointer: &str) -> Result<()> {
    match v {
        Value::Object(map) => {
            for (k, val) in map {
                detect_secret_values(val, &format!("{pointer}/{k}"))?;
            }
        }
        Value::Array(arr) => {
            for (i, val) in arr.iter().enumerate() {
                detect_secret_values(val, &format!("{pointer}/{i}"))?;
            }
        }
        Value::String(s) => {
            if looks_like_secret(s) {
                bail!("CONFIG_SECRET_DETECTED: literal secret value at {pointer}, expected an env var name");
            }
        }
        _ => {}
    }
    Ok(())
}

fn looks_like_secret(s: &str) -> bool {
    s.starts_with("sk-") || s.starts_with("AKIA") || s.contains("-----BEGIN")
}

/// Canonicalize JSON by sorting all object keys recursively and emitting compact JSON.
fn canonicalize_json(v: &Value) -> String {
    let sorted = sort_keys(v);
    serde_json::to_string(&sorted).expect("json serialization must not fail")
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

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnusedKeyPolicy {
    Warn,
    Fail,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UnusedKeysReport {
    pub unused_leaf_pointers: Vec<String>,
}

impl UnusedKeysReport {
    pub fn is_clean(&self) -> bool {
        self.unused_leaf_pointers.is_empty()
    }
}

/// Report config leaves that `mode` never reads. `Fail` turns a non-empty
/// report into an error; `Warn` just returns it for the caller to log.
pub fn report_unused_keys(
    mode: ConfigMode,
    config_json: &Value,
    policy: UnusedKeyPolicy,
) -> Result<UnusedKeysReport> {
    let consumed = consumed_pointers(mode);

    let mut leaves = Vec::new();
    collect_leaf_pointers(config_json, String::new(), &mut leaves);
    leaves.sort();

    let unused: Vec<String> = leaves
        .into_iter()
        .filter(|p| !is_consumed(p, consumed))
        .collect();

    let report = UnusedKeysReport {
        unused_leaf_pointers: unused,
    };

    if policy == UnusedKeyPolicy::Fail && !report.is_clean() {
        bail!(
            "CONFIG_UNUSED_KEYS: {} unused key(s) for this mode: {}",
            report.unused_leaf_pointers.len(),
            report.unused_leaf_pointers.join(", "),
        );
    }

    Ok(report)
}

fn is_consumed(pointer: &str, consumed: &[&str]) -> bool {
    consumed
        .iter()
        .any(|c| pointer == *c || pointer.starts_with(&format!("{c}/")))
}

fn collect_leaf_pointers(v: &Value, prefix: String, out: &mut Vec<String>) {
    match v {
        Value::Object(map) if !map.is_empty() => {
            for (k, val) in map {
                collect_leaf_pointers(val, format!("{prefix}/{k}"), out);
            }
        }
        Value::Array(arr) if !arr.is_empty() => {
            for (i, val) in arr.iter().enumerate() {
                collect_leaf_pointers(val, format!("{prefix}/{i}"), out);
            }
        }
        _ => out.push(prefix),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_overrides_earlier_layers() {
        let loaded = load_layered_yaml_from_strings(&["a: 1\nb: 2\n", "b: 3\n"]).unwrap();
        assert_eq!(loaded.config_json.pointer("/a").and_then(Value::as_i64), Some(1));
        assert_eq!(loaded.config_json.pointer("/b").and_then(Value::as_i64), Some(3));
    }

    #[test]
    fn literal_secret_is_rejected() {
        let err = load_layered_yaml_from_strings(&["key: \"sk-live-abc\"\n"]).unwrap_err();
        assert!(err.to_string().contains("CONFIG_SECRET_DETECTED"));
    }

    #[test]
    fn unused_keys_detected_in_warn_mode() {
        let loaded =
            load_layered_yaml_from_strings(&["engine:\n  engine_id: MAIN\nscratch:\n  foo: 1\n"])
                .unwrap();
        let report =
            report_unused_keys(ConfigMode::Backtest, &loaded.config_json, UnusedKeyPolicy::Warn)
                .unwrap();
        assert!(!report.is_clean());
        assert!(report.unused_leaf_pointers.contains(&"/scratch/foo".to_string()));
    }
}
