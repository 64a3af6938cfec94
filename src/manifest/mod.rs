//! Job partitioning and manifest rendering.
//!
//! Archives are spread round-robin across jobs, each job's range lines are
//! sorted by source utterance for sequential-read friendliness downstream,
//! and everything is staged through `.tmp` paths so an aborted run leaves
//! no manifest behind.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::types::{AllocConfig, Archive};
use crate::{AllocError, Result};

/// What a finished run produced, for reporting.
#[derive(Debug)]
pub struct ManifestSummary {
    pub total_chunks: usize,
    pub category_counts: Vec<u64>,
    pub files_written: Vec<PathBuf>,
}

/// Assign archive indices (0-based) to jobs by `index % num_jobs`.
///
/// Deterministic and independent of the sampling seed; every job ends up
/// with either `ceil` or `floor` of `num_archives / num_jobs` archives.
pub fn partition_archives(num_archives: usize, num_jobs: usize) -> Vec<Vec<usize>> {
    let mut jobs = vec![Vec::new(); num_jobs];
    for archive_index in 0..num_archives {
        jobs[archive_index % num_jobs].push(archive_index);
    }
    jobs
}

/// One line per archive: `<1-based archive> <chunk_length>`.
pub fn render_chunk_lengths(archives: &[Archive]) -> String {
    let mut out = String::new();
    for (i, archive) in archives.iter().enumerate() {
        out.push_str(&format!("{} {}\n", i + 1, archive.chunk_length));
    }
    out
}

/// Render one job's `ranges` manifest.
///
/// Lines are sorted by `(utterance_index, relative_archive_index, offset)`
/// before formatting; consumers rely on all chunks of one utterance being
/// adjacent, so the sort order is part of the file format.
pub fn render_ranges(catalog: &Catalog, archives: &[Archive], job_archives: &[usize]) -> String {
    let mut rows: Vec<(usize, usize, u64)> = Vec::new();
    for (relative, &archive_index) in job_archives.iter().enumerate() {
        for entry in &archives[archive_index].entries {
            rows.push((entry.utterance, relative, entry.offset));
        }
    }
    rows.sort_unstable();

    let mut out = String::new();
    for (utterance, relative, offset) in rows {
        let archive_index = job_archives[relative];
        out.push_str(&format!(
            "{} {} {} {} {} {}\n",
            catalog.id(utterance),
            relative,
            archive_index + 1,
            offset,
            archives[archive_index].chunk_length,
            catalog.category(utterance)
        ));
    }
    out
}

/// One space-joined line of archive payload paths, in relative-archive order.
pub fn render_outputs(egs_dir: &Path, prefix: &str, job_archives: &[usize]) -> String {
    let paths: Vec<String> = job_archives
        .iter()
        .map(|&archive_index| {
            format!(
                "{}/{}egs_temp.{}.ark",
                egs_dir.display(),
                prefix,
                archive_index + 1
            )
        })
        .collect();
    format!("{}\n", paths.join(" "))
}

/// Count chunks per category over all archives, zero-filled across
/// `num_categories` slots. Categories at or above the declared count are
/// dropped (only possible with an explicit override).
pub fn category_histogram(catalog: &Catalog, archives: &[Archive], num_categories: u32) -> Vec<u64> {
    let mut counts = vec![0u64; num_categories as usize];
    for archive in archives {
        for entry in &archive.entries {
            let category = catalog.category(entry.utterance) as usize;
            if category < counts.len() {
                counts[category] += 1;
            }
        }
    }
    counts
}

fn render_histogram(counts: &[u64]) -> String {
    let fields: Vec<String> = counts.iter().map(u64::to_string).collect();
    format!("{}\n", fields.join(" "))
}

/// Render and write every manifest file for the run.
///
/// All contents are rendered up front; each file is written to a `.tmp`
/// sibling and the renames happen only after every write succeeded.
pub fn write_manifests(
    catalog: &Catalog,
    config: &AllocConfig,
    archives: &[Archive],
    egs_dir: &Path,
) -> Result<ManifestSummary> {
    let temp_dir = egs_dir.join("temp");
    fs::create_dir_all(&temp_dir).map_err(|e| AllocError::io(&temp_dir, e))?;

    let prefix = config.file_prefix();
    let jobs = partition_archives(config.num_archives, config.num_jobs);
    let num_categories = config
        .num_categories
        .unwrap_or_else(|| catalog.derived_num_categories());
    let counts = category_histogram(catalog, archives, num_categories);
    let total_chunks: usize = archives.iter().map(|a| a.entries.len()).sum();

    let mut files: Vec<(PathBuf, String)> = Vec::new();
    files.push((
        temp_dir.join(format!("{}archive_chunk_lengths", prefix)),
        render_chunk_lengths(archives),
    ));
    for (job, job_archives) in jobs.iter().enumerate() {
        files.push((
            temp_dir.join(format!("{}ranges.{}", prefix, job + 1)),
            render_ranges(catalog, archives, job_archives),
        ));
        files.push((
            temp_dir.join(format!("{}outputs.{}", prefix, job + 1)),
            render_outputs(egs_dir, &prefix, job_archives),
        ));
    }
    files.push((
        egs_dir.join(format!("{}pdf2num", prefix)),
        render_histogram(&counts),
    ));

    commit_files(&files)?;
    for (path, _) in &files {
        debug!(path = %path.display(), "wrote manifest");
    }
    info!(
        jobs = jobs.len(),
        archives = archives.len(),
        total_chunks,
        "manifests written"
    );

    Ok(ManifestSummary {
        total_chunks,
        category_counts: counts,
        files_written: files.into_iter().map(|(path, _)| path).collect(),
    })
}

fn commit_files(files: &[(PathBuf, String)]) -> Result<()> {
    let mut staged = Vec::new();
    for (path, contents) in files {
        let tmp = tmp_path(path);
        if let Err(e) = fs::write(&tmp, contents) {
            cleanup(&staged);
            return Err(AllocError::io(&tmp, e));
        }
        staged.push(tmp);
    }
    for ((path, _), tmp) in files.iter().zip(&staged) {
        if let Err(e) = fs::rename(tmp, path) {
            cleanup(&staged);
            return Err(AllocError::io(path, e));
        }
    }
    Ok(())
}

fn cleanup(staged: &[PathBuf]) {
    for tmp in staged {
        let _ = fs::remove_file(tmp);
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(".tmp");
    PathBuf::from(os)
}
