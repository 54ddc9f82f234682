//! Structural JSON diff for round-trip reports

use serde_json::Value;
use serde::{Deserialize, Serialize};

/// How a path differs between two documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiffKind {
    /// Present only in the right document
    Added,
    /// Present only in the left document
    Removed,
    /// Present in both with different values
    Changed,
}

/// One differing path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffEntry {
    /// Dotted path of the difference
    pub path: String,
    /// Kind of difference
    pub kind: DiffKind,
}

/// Compare two documents structurally
///
/// Scalars and mismatched container kinds compare by equality; objects and
/// arrays recurse. Paths use the dotted form with numeric array indices.
pub fn diff_documents(left: &Value, right: &Value) -> Vec<DiffEntry> {
    let mut out = Vec::new();
    diff_inner(left, right, "", &mut out);
    out
}

fn join(prefix: &str, segment: &str) -> String {
    if prefix.is_empty() {
        segment.to_string()
    } else {
        format!("{}.{}", prefix, segment)
    }
}

fn diff_inner(left: &Value, right: &Value, path: &str, out: &mut Vec<DiffEntry>) {
    match (left, right) {
        (Value::Object(l), Value::Object(r)) => {
            for (key, lv) in l {
                match r.get(key) {
                    Some(rv) => diff_inner(lv, rv, &join(path, key), out),
                    None => out.push(DiffEntry {
                        path: join(path, key),
                        kind: DiffKind::Removed,
                    }),
                }
            }
            for key in r.keys() {
                if !l.contains_key(key) {
                    out.push(DiffEntry {
                        path: join(path, key),
                        kind: DiffKind::Added,
                    });
                }
            }
        }
        (Value::Array(l), Value::Array(r)) => {
            for (index, lv) in l.iter().enumerate() {
                match r.get(index) {
                    Some(rv) => diff_inner(lv, rv, &join(path, &index.to_string()), out),
                    None => out.push(DiffEntry {
                        path: join(path, &index.to_string()),
                        kind: DiffKind::Removed,
                    }),
                }
            }
            for index in l.len()..r.len() {
                out.push(DiffEntry {
                    path: join(path, &index.to_string()),
                    kind: DiffKind::Added,
                });
            }
        }
        (l, r) if l == r => {}
        _ => out.push(DiffEntry {
            path: path.to_string(),
            kind: DiffKind::Changed,
        }),
    }
}
