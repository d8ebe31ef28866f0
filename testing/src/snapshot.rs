//! Snapshot Store - baseline persistence for characterization tests
//!
//! Each snapshot is one pretty-printed JSON file, `<dir>/<name>.snap.json`.
//! Comparison is structural (parsed JSON), so reformatting a baseline by hand
//! does not count as drift.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const SNAPSHOT_EXTENSION: &str = "snap.json";

/// What to do with missing or differing baselines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotUpdate {
    /// Write missing baselines, fail on differences.
    #[default]
    New,
    /// Overwrite every baseline with the current value.
    Always,
    /// Never write; a missing baseline is an error (CI).
    No,
}

impl SnapshotUpdate {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "new" | "" => Some(Self::New),
            "always" | "1" | "true" => Some(Self::Always),
            "no" | "0" | "false" => Some(Self::No),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotOutcome {
    Created,
    Matched,
    Updated,
}

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("invalid snapshot name `{0}` (use letters, digits, `_`, `-`, `.`)")]
    InvalidName(String),

    #[error("snapshot I/O failed for {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("value cannot be serialized: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("baseline {} is not valid JSON: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("no baseline for `{name}` at {} and updates are disabled", path.display())]
    Missing { name: String, path: PathBuf },

    #[error("snapshot `{name}` does not match its baseline:\n{diff}")]
    Mismatch { name: String, diff: String },
}

#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
    update: SnapshotUpdate,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            update: SnapshotUpdate::default(),
        }
    }

    pub fn with_update(mut self, update: SnapshotUpdate) -> Self {
        self.update = update;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn update(&self) -> SnapshotUpdate {
        self.update
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.{SNAPSHOT_EXTENSION}"))
    }

    /// Compare `value` with the stored baseline `name`.
    pub fn check<T: Serialize + ?Sized>(
        &self,
        name: &str,
        value: &T,
    ) -> Result<SnapshotOutcome, SnapshotError> {
        validate_name(name)?;
        let path = self.path_for(name);
        let current = serde_json::to_value(value)?;

        let stored = match fs::read_to_string(&path) {
            Ok(content) => Some(
                serde_json::from_str::<Value>(&content)
                    .map_err(|source| SnapshotError::Corrupt {
                        path: path.clone(),
                        source,
                    })?,
            ),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(source) => return Err(SnapshotError::Io { path, source }),
        };

        match (stored, self.update) {
            (None, SnapshotUpdate::No) => Err(SnapshotError::Missing {
                name: name.to_string(),
                path,
            }),
            (None, _) => {
                self.write(&path, &current)?;
                tracing::info!(snapshot = name, path = %path.display(), "Snapshot created");
                Ok(SnapshotOutcome::Created)
            }
            (Some(stored), _) if stored == current => Ok(SnapshotOutcome::Matched),
            (Some(_), SnapshotUpdate::Always) => {
                self.write(&path, &current)?;
                tracing::info!(snapshot = name, path = %path.display(), "Snapshot updated");
                Ok(SnapshotOutcome::Updated)
            }
            (Some(stored), _) => Err(SnapshotError::Mismatch {
                name: name.to_string(),
                diff: line_diff(&render(&stored)?, &render(&current)?),
            }),
        }
    }

    fn write(&self, path: &Path, value: &Value) -> Result<(), SnapshotError> {
        fs::create_dir_all(&self.dir).map_err(|source| SnapshotError::Io {
            path: self.dir.clone(),
            source,
        })?;
        fs::write(path, render(value)?).map_err(|source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Panic with the diff unless `value` matches (or just created) its baseline.
#[track_caller]
pub fn assert_snapshot<T: Serialize + ?Sized>(store: &SnapshotStore, name: &str, value: &T) {
    if let Err(e) = store.check(name, value) {
        panic!("{e}");
    }
}

fn validate_name(name: &str) -> Result<(), SnapshotError> {
    let ok = !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if ok {
        Ok(())
    } else {
        Err(SnapshotError::InvalidName(name.to_string()))
    }
}

fn render(value: &Value) -> Result<String, SnapshotError> {
    let mut out = serde_json::to_string_pretty(value)?;
    out.push('\n');
    Ok(out)
}

/// Upper bound on LCS table cells before the diff degrades to a full dump.
const MAX_DIFF_CELLS: usize = 1 << 22;

/// Minimal LCS line diff: `-` baseline only, `+` current only.
///
/// Shared leading and trailing lines are matched outright. If the differing
/// middle is still too large for the table, it is dumped as all `-` then
/// all `+`.
fn line_diff(baseline: &str, current: &str) -> String {
    let old: Vec<&str> = baseline.lines().collect();
    let new: Vec<&str> = current.lines().collect();

    let head = old.iter().zip(&new).take_while(|(a, b)| a == b).count();
    let tail = old[head..]
        .iter()
        .rev()
        .zip(new[head..].iter().rev())
        .take_while(|(a, b)| a == b)
        .count();
    let (old_mid, new_mid) = (&old[head..old.len() - tail], &new[head..new.len() - tail]);

    let mut out = String::new();
    for line in &old[..head] {
        push_line(&mut out, "  ", line);
    }
    if old_mid.len().saturating_mul(new_mid.len()) > MAX_DIFF_CELLS {
        for line in old_mid {
            push_line(&mut out, "- ", line);
        }
        for line in new_mid {
            push_line(&mut out, "+ ", line);
        }
    } else {
        lcs_diff(old_mid, new_mid, &mut out);
    }
    for line in &old[old.len() - tail..] {
        push_line(&mut out, "  ", line);
    }
    out
}

fn lcs_diff(old: &[&str], new: &[&str], out: &mut String) {
    let mut lcs = vec![vec![0u32; new.len() + 1]; old.len() + 1];
    for i in (0..old.len()).rev() {
        for j in (0..new.len()).rev() {
            lcs[i][j] = if old[i] == new[j] {
                lcs[i + 1][j + 1] + 1
            } else {
                lcs[i + 1][j].max(lcs[i][j + 1])
            };
        }
    }

    let (mut i, mut j) = (0, 0);
    while i < old.len() || j < new.len() {
        if i < old.len() && j < new.len() && old[i] == new[j] {
            push_line(out, "  ", old[i]);
            i += 1;
            j += 1;
        } else if j < new.len() && (i == old.len() || lcs[i][j + 1] > lcs[i + 1][j]) {
            push_line(out, "+ ", new[j]);
            j += 1;
        } else {
            push_line(out, "- ", old[i]);
            i += 1;
        }
    }
}

fn push_line(out: &mut String, marker: &str, line: &str) {
    out.push_str(marker);
    out.push_str(line);
    out.push('\n');
}
