//! Corpus layout normalization for recording folders.
//!
//! Every `.wav` is renamed to `<stem without underscores>_<folder>.wav` and
//! gets a `<same stem>.txt` transcript seed holding the bare stem. The whole
//! tree is listed and planned before anything is renamed, so renames never
//! race the walk, and a second run plans nothing.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::batch;

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Remove(PathBuf),
    Rename { from: PathBuf, to: PathBuf },
    CreateTranscript { path: PathBuf, text: String },
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LayoutOptions {
    /// Delete files that are neither recordings nor their transcripts.
    pub prune: bool,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LayoutReport {
    pub applied: usize,
    pub failed: usize,
}

/// Lists the tree under `root` and returns the actions that bring it into
/// shape. `root` is resolved first so files directly under `.` still see
/// their folder name.
pub fn plan(root: &Path, options: LayoutOptions) -> anyhow::Result<Vec<Action>> {
    let root = root
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", root.display()))?;
    let files = batch::collect_files_where(&root, |_| true)?;
    let existing: HashSet<&Path> = files.iter().map(PathBuf::as_path).collect();

    let mut by_dir: BTreeMap<&Path, Vec<&Path>> = BTreeMap::new();
    for file in &files {
        if let Some(parent) = file.parent() {
            by_dir.entry(parent).or_default().push(file);
        }
    }

    let mut actions = Vec::new();
    for (dir, files) in by_dir {
        let Some(folder) = dir.file_name().and_then(|name| name.to_str()) else {
            tracing::warn!("Skipping directory with a non UTF-8 name: {}", dir.display());
            continue;
        };

        let mut keep: HashSet<PathBuf> = HashSet::new();
        let mut renames = Vec::new();
        let mut transcripts = Vec::new();
        for &file in files.iter().filter(|file| is_wav(file)) {
            let (Some(stem), Some(ext)) = (
                file.file_stem().and_then(|s| s.to_str()),
                file.extension().and_then(|s| s.to_str()),
            ) else {
                tracing::warn!("Skipping file with a non UTF-8 name: {}", file.display());
                keep.insert(file.to_owned());
                continue;
            };
            let base = canonical_stem(stem, folder);
            let target = dir.join(format!("{base}_{folder}.{ext}"));
            let transcript = dir.join(format!("{base}_{folder}.txt"));

            if target != file {
                if existing.contains(target.as_path()) || keep.contains(&target) {
                    tracing::warn!(
                        "Not renaming {}: {} already exists",
                        file.display(),
                        target.display()
                    );
                    keep.insert(file.to_owned());
                    continue;
                }
                renames.push(Action::Rename {
                    from: file.to_owned(),
                    to: target.clone(),
                });
            }
            if !existing.contains(transcript.as_path()) && !keep.contains(&transcript) {
                transcripts.push(Action::CreateTranscript {
                    path: transcript.clone(),
                    text: base,
                });
            }
            keep.insert(target);
            keep.insert(transcript);
        }

        if options.prune {
            actions.extend(
                files
                    .iter()
                    .filter(|file| !is_wav(file) && !keep.contains(**file))
                    .map(|file| Action::Remove(file.to_path_buf())),
            );
        }
        actions.extend(renames);
        actions.extend(transcripts);
    }
    Ok(actions)
}

/// Carries out `actions` in order. Failures are logged and counted.
pub fn apply(actions: &[Action], dry_run: bool) -> LayoutReport {
    let mut report = LayoutReport::default();
    for action in actions {
        if dry_run {
            tracing::info!("Would {}", describe(action));
            continue;
        }
        match execute(action) {
            Ok(()) => {
                tracing::info!("{}", describe(action));
                report.applied += 1;
            }
            Err(err) => {
                tracing::error!("{err:#}");
                report.failed += 1;
            }
        }
    }
    report
}

fn execute(action: &Action) -> anyhow::Result<()> {
    match action {
        Action::Remove(path) => {
            fs::remove_file(path).with_context(|| format!("Failed to delete {}", path.display()))
        }
        Action::Rename { from, to } => fs::rename(from, to).with_context(|| {
            format!("Failed to rename {} to {}", from.display(), to.display())
        }),
        Action::CreateTranscript { path, text } => {
            fs::write(path, text).with_context(|| format!("Failed to create {}", path.display()))
        }
    }
}

fn describe(action: &Action) -> String {
    match action {
        Action::Remove(path) => format!("delete {}", path.display()),
        Action::Rename { from, to } => format!("rename {} to {}", from.display(), to.display()),
        Action::CreateTranscript { path, .. } => format!("create {}", path.display()),
    }
}

fn is_wav(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"))
}

/// Stem without the folder suffix and without underscores.
fn canonical_stem(stem: &str, folder: &str) -> String {
    let suffix = format!("_{folder}");
    stem.strip_suffix(suffix.as_str()).unwrap_or(stem).replace('_', "")
}
