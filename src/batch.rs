use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;

pub enum Outcome {
    Written(PathBuf),
    /// Nothing to write; no output file was created.
    Empty,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    pub written: usize,
    pub empty: usize,
    pub failed: usize,
}

impl BatchReport {
    pub fn log(&self, what: &str) {
        tracing::info!(
            "{what}: {} written, {} skipped as empty, {} failed",
            self.written,
            self.empty,
            self.failed
        );
    }
}

/// Files under `dir` (recursively) whose extension is exactly `extension`,
/// sorted so runs are reproducible.
pub fn collect_files(dir: &Path, extension: &str) -> anyhow::Result<Vec<PathBuf>> {
    collect_files_where(dir, |path| {
        path.extension().and_then(|ext| ext.to_str()) == Some(extension)
    })
}

/// Every file under `dir` accepted by `keep`, sorted.
pub fn collect_files_where<P>(dir: &Path, keep: P) -> anyhow::Result<Vec<PathBuf>>
where
    P: Fn(&Path) -> bool,
{
    let mut files = Vec::new();
    collect_into(dir, &keep, &mut files)?;
    files.sort();
    Ok(files)
}

fn collect_into<P>(dir: &Path, keep: &P, out: &mut Vec<PathBuf>) -> anyhow::Result<()>
where
    P: Fn(&Path) -> bool,
{
    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory '{}'", dir.display()))?;
    for entry in entries {
        let entry = entry
            .with_context(|| format!("Failed to read directory entry in '{}'", dir.display()))?;
        let path = entry.path();
        if path.is_dir() {
            collect_into(&path, keep, out)?;
            continue;
        }
        if keep(&path) {
            out.push(path);
        }
    }
    Ok(())
}

/// Where the converted form of `file` goes: beside it when there is no
/// output root, otherwise at the same relative location under `output`.
pub fn output_path(
    input: &Path,
    file: &Path,
    output: Option<&Path>,
    extension: &str,
) -> anyhow::Result<PathBuf> {
    let target = file.with_extension(extension);
    let Some(output) = output else {
        return Ok(target);
    };
    let relative = target.strip_prefix(input).with_context(|| {
        format!(
            "'{}' is not inside input directory '{}'",
            file.display(),
            input.display()
        )
    })?;
    Ok(output.join(relative))
}

pub fn write_file(path: &Path, contents: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory '{}'", parent.display()))?;
    }
    fs::write(path, contents).with_context(|| format!("Failed to write '{}'", path.display()))
}

/// Runs `convert` on each file in turn. A failing file is logged and
/// counted; the remaining files are still processed.
pub fn process<F>(files: &[PathBuf], mut convert: F) -> BatchReport
where
    F: FnMut(&Path) -> anyhow::Result<Outcome>,
{
    let mut report = BatchReport::default();
    for file in files {
        match convert(file) {
            Ok(Outcome::Written(out)) => {
                tracing::info!("Converted {} -> {}", file.display(), out.display());
                report.written += 1;
            }
            Ok(Outcome::Empty) => {
                tracing::warn!("Skipping empty file: {}", file.display());
                report.empty += 1;
            }
            Err(err) => {
                tracing::error!("Error processing {}: {err:#}", file.display());
                report.failed += 1;
            }
        }
    }
    report
}
