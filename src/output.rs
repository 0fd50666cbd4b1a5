use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use tempfile::NamedTempFile;

use crate::analysis::AnalysisResult;

/// Serialize `result` as pretty-printed JSON into `w`, followed by a newline.
pub fn write_result<W: Write>(result: &AnalysisResult, w: W) -> Result<()> {
    let mut writer = BufWriter::new(w);
    serde_json::to_writer_pretty(&mut writer, result).context("failed to serialize analysis")?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Write `result` to `path` atomically.
///
/// The payload goes to a temporary file in the destination directory which is then synced and
/// renamed over `path`, so readers never observe a partial file. Parent directories are
/// created when missing.
pub fn write_result_file(result: &AnalysisResult, path: &Path) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output dir: {}", dir.display()))?;

    let mut tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("failed to create temp file in {}", dir.display()))?;

    write_result(result, tmp.as_file_mut())?;
    tmp.as_file().sync_all()?;

    tmp.persist(path)
        .with_context(|| format!("failed to move output into place: {}", path.display()))?;

    Ok(())
}
