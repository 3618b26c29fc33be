use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

/// Keys that change on every search run and must never affect comparison.
const VOLATILE_KEYS: [&str; 4] = ["timestamp", "last_updated", "search_time", "search_timestamp"];

/// Compares campground search-result snapshots by normalized content hash.
///
/// Stateless: the previous snapshot lives in the snapshot store, not here.
/// Every decision path fails open — on missing or corrupt baselines the
/// comparator reports "changed" so a notification is sent rather than
/// silently dropped.
#[derive(Debug, Default, Clone)]
pub struct ResultComparator;

/// Diagnostic view of one comparison, for debug logging.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ComparisonSummary {
    /// Whether a previous snapshot existed at all
    pub has_previous: bool,
    /// Outcome of the comparison
    pub changed: bool,
    /// Content hash of the normalized current snapshot
    pub current_hash: String,
    /// Content hash of the normalized previous snapshot, if one existed
    pub previous_hash: Option<String>,
}

impl ResultComparator {
    /// Create a new comparator.
    pub fn new() -> Self {
        Self
    }

    /// Compare current search results against the previously stored results.
    ///
    /// Returns `true` when the results differ, when no previous results
    /// exist, or when the previous results are not a mapping at all.
    pub fn results_changed(&self, current: &Value, previous: Option<&Value>) -> bool {
        let Some(previous) = previous else {
            info!("No previous results found, treating as changed");
            return true;
        };

        if !previous.is_object() {
            warn!("Previous results are malformed (not a mapping), treating as changed");
            return true;
        }

        let current_hash = self.content_hash(&self.normalize(current));
        let previous_hash = self.content_hash(&self.normalize(previous));

        let changed = current_hash != previous_hash;
        if changed {
            info!("Results have changed based on hash comparison");
        } else {
            info!("Results are identical based on hash comparison");
        }
        changed
    }

    /// Normalize search results into a canonical mapping for comparison.
    ///
    /// Keys and string values are trimmed and lower-cased, volatile
    /// timestamp-style keys are dropped at every nesting level, and
    /// homogeneous lists of primitives are sorted ascending. Non-mapping
    /// input normalizes to an empty mapping instead of failing.
    pub fn normalize(&self, results: &Value) -> Value {
        match results {
            Value::Object(map) => Value::Object(normalize_map(map)),
            other => {
                warn!("Results are not a mapping ({}), normalizing to empty", value_kind(other));
                Value::Object(Map::new())
            }
        }
    }

    /// Generate the SHA-256 content hash of a normalized snapshot.
    ///
    /// Serialization is canonical: `serde_json` maps iterate in sorted key
    /// order and `to_string` emits no insignificant whitespace. Always
    /// returns a well-formed lower-hex digest; if serialization fails, a
    /// debug representation of the value is hashed instead.
    pub fn content_hash(&self, normalized: &Value) -> String {
        match serde_json::to_string(normalized) {
            Ok(canonical) => hex_digest(canonical.as_bytes()),
            Err(e) => {
                warn!("Canonical serialization failed, hashing fallback representation: {}", e);
                let repr = match normalized {
                    Value::Object(map) => format!("{:?}", map.iter().collect::<Vec<_>>()),
                    other => format!("error_hash_{}_{}", value_kind(other), other.to_string().len()),
                };
                hex_digest(repr.as_bytes())
            }
        }
    }

    /// Build a detailed summary of one comparison, useful for debugging.
    pub fn comparison_summary(&self, current: &Value, previous: Option<&Value>) -> ComparisonSummary {
        let summary = ComparisonSummary {
            has_previous: previous.is_some(),
            changed: self.results_changed(current, previous),
            current_hash: self.content_hash(&self.normalize(current)),
            previous_hash: previous.map(|p| self.content_hash(&self.normalize(p))),
        };
        debug!(
            "Comparison summary: changed={} current={} previous={:?}",
            summary.changed, summary.current_hash, summary.previous_hash
        );
        summary
    }
}

/// Normalize one mapping level, dropping volatile keys.
fn normalize_map(map: &Map<String, Value>) -> Map<String, Value> {
    let mut normalized = Map::new();
    for (key, value) in map {
        if VOLATILE_KEYS.contains(&key.to_lowercase().as_str()) {
            continue;
        }
        normalized.insert(key.trim().to_lowercase(), normalize_value(value));
    }
    normalized
}

/// Recursively normalize a single value.
fn normalize_value(value: &Value) -> Value {
    match value {
        Value::Null => Value::Null,
        Value::Object(map) => Value::Object(normalize_map(map)),
        Value::Array(items) => {
            let mut normalized: Vec<Value> = items.iter().map(normalize_value).collect();
            if let Some(kind) = homogeneous_primitive_kind(&normalized) {
                sort_primitives(&mut normalized, kind);
            }
            Value::Array(normalized)
        }
        Value::String(s) => Value::String(s.trim().to_lowercase()),
        Value::Number(_) | Value::Bool(_) => value.clone(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PrimitiveKind {
    Str,
    Int,
    Float,
}

/// Classify a value as a sortable primitive, if it is one.
fn primitive_kind(value: &Value) -> Option<PrimitiveKind> {
    match value {
        Value::String(_) => Some(PrimitiveKind::Str),
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(PrimitiveKind::Int),
        Value::Number(_) => Some(PrimitiveKind::Float),
        _ => None,
    }
}

/// The shared primitive kind of a non-empty list, or `None` when the list is
/// empty, heterogeneous, or holds non-primitive elements.
fn homogeneous_primitive_kind(items: &[Value]) -> Option<PrimitiveKind> {
    let first = primitive_kind(items.first()?)?;
    items
        .iter()
        .all(|item| primitive_kind(item) == Some(first))
        .then_some(first)
}

fn sort_primitives(items: &mut [Value], kind: PrimitiveKind) {
    match kind {
        PrimitiveKind::Str => items.sort_by(|a, b| a.as_str().cmp(&b.as_str())),
        PrimitiveKind::Int => items.sort_by_key(|v| integer_key(v)),
        PrimitiveKind::Float => {
            items.sort_by(|a, b| {
                let a = a.as_f64().unwrap_or(f64::NAN);
                let b = b.as_f64().unwrap_or(f64::NAN);
                a.total_cmp(&b)
            });
        }
    }
}

/// Total ordering key for JSON integers, covering the full u64 range.
fn integer_key(value: &Value) -> i128 {
    if let Some(n) = value.as_i64() {
        i128::from(n)
    } else if let Some(n) = value.as_u64() {
        i128::from(n)
    } else {
        0
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn hex_digest(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}
