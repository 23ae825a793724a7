// src/pipeline.rs

use anyhow::{Context, Result};
use arrow::record_batch::RecordBatch;
use reqwest::Client;
use std::path::{Path, PathBuf};
use tokio::time::Instant;
use tracing::{info, instrument};

use crate::fetch::{fetch_archive, ArchiveReader};
use crate::process::{aggregate, collect_group, write_table};

/// Where the FracFocus bulk CSV download lives.
pub const SOURCE_URL: &str = "http://fracfocusdata.org/digitaldownload/fracfocuscsv.zip";

/// A named slice of the archive and the file it is written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputGroup {
    pub key_word: &'static str,
    pub output_file: &'static str,
}

pub const REGISTRY_UPLOAD: OutputGroup = OutputGroup {
    key_word: "registryupload",
    output_file: "registry_upload_master.csv",
};

pub const FRACFOCUS_REGISTRY: OutputGroup = OutputGroup {
    key_word: "FracFocusRegistry",
    output_file: "fracfocus_registry_master.csv",
};

/// Groups in the order they are aggregated and written.
pub const OUTPUT_GROUPS: &[OutputGroup] = &[REGISTRY_UPLOAD, FRACFOCUS_REGISTRY];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub group: OutputGroup,
    pub path: PathBuf,
    pub files: usize,
    pub rows: usize,
}

/// Classify, aggregate and write every output group from `archive` into `out_dir`.
///
/// All groups are aggregated before anything is written; writes then happen
/// one after another, so a failed write leaves earlier outputs in place.
#[instrument(level = "info", skip(archive, out_dir), fields(out_dir = %out_dir.display(), members = archive.len()))]
pub fn export_groups(archive: &mut ArchiveReader, out_dir: &Path) -> Result<Vec<ExportSummary>> {
    let file_names = archive.file_names();

    let groups: Vec<(OutputGroup, Vec<String>)> = OUTPUT_GROUPS
        .iter()
        .map(|g| (*g, collect_group(&file_names, g.key_word)))
        .collect();
    for (group, files) in &groups {
        info!(key_word = group.key_word, files = files.len(), "classified members");
    }

    let mut tables: Vec<(OutputGroup, usize, RecordBatch)> = Vec::with_capacity(groups.len());
    for (group, files) in &groups {
        let table = aggregate(files, archive)
            .with_context(|| format!("aggregating {} files", group.key_word))?;
        tables.push((*group, files.len(), table));
    }

    let mut summaries = Vec::with_capacity(tables.len());
    for (group, files, table) in tables {
        let path = out_dir.join(group.output_file);
        write_table(&table, &path)?;
        summaries.push(ExportSummary {
            group,
            path,
            files,
            rows: table.num_rows(),
        });
    }

    Ok(summaries)
}

/// Download the archive at `url` and export every group into `out_dir`.
pub async fn run(client: &Client, url: &str, out_dir: &Path) -> Result<Vec<ExportSummary>> {
    let start = Instant::now();

    let mut archive = fetch_archive(client, url).await?;
    info!(members = archive.len(), elapsed = ?start.elapsed(), "archive ready");

    // parsing and writing are blocking work
    let out_dir = out_dir.to_path_buf();
    let summaries =
        tokio::task::spawn_blocking(move || export_groups(&mut archive, &out_dir)).await??;

    for s in &summaries {
        info!(
            path = %s.path.display(),
            files = s.files,
            rows = s.rows,
            "exported"
        );
    }
    info!(elapsed = ?start.elapsed(), "all done");
    Ok(summaries)
}
