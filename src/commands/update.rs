use std::cmp::Reverse;
use std::fs;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use tracing::{info, warn};

use crate::citation::{CitationParser, render_citation};
use crate::cli::UpdateArgs;
use crate::dedupe::TitleIndex;
use crate::extract::PageExtractor;
use crate::model::{AddedPublication, UpdateCounts, UpdateRunManifest};
use crate::rebuild::splice_publications;
use crate::util::{
    ensure_directory, now_utc_string, read_document, sha256_file, utc_compact_string,
    write_json_pretty,
};

pub fn run(args: UpdateArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("run-{}", utc_compact_string(started_ts));

    if !args.site_path.exists() {
        bail!("site document not found: {}", args.site_path.display());
    }
    if !args.citations_path.exists() {
        bail!("citations file not found: {}", args.citations_path.display());
    }

    let manifest_dir = args.cache_root.join("manifests");
    let manifest_path = args.manifest_path.clone().unwrap_or_else(|| {
        manifest_dir.join(format!("update_run_{}.json", utc_compact_string(started_ts)))
    });

    info!(site = %args.site_path.display(), run_id = %run_id, "starting publications update");

    let document = read_document(&args.site_path)?;
    let site_sha256_before = sha256_file(&args.site_path)?;

    let extractor = PageExtractor::new()?;
    let sections = extractor.extract(&document)?;
    let mut titles = TitleIndex::from_titles(
        sections
            .publications
            .iter()
            .map(|publication| publication.title.clone()),
    );

    let mut counts = UpdateCounts {
        existing_count: titles.len(),
        ..UpdateCounts::default()
    };
    let mut warnings = Vec::new();

    info!(existing = counts.existing_count, "indexed existing publications");

    let raw = fs::read_to_string(&args.citations_path)
        .with_context(|| format!("failed to read {}", args.citations_path.display()))?;

    let parser = CitationParser::new(&args.owner)?;
    let mut records = Vec::new();

    for (index, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        counts.candidate_count += 1;

        match parser.parse(line) {
            Ok(record) => {
                if titles.admit(&record.title) {
                    records.push(record);
                } else {
                    counts.duplicate_count += 1;
                }
            }
            Err(error) => {
                counts.parse_failure_count += 1;
                warnings.push(format!("line {}: {error}", index + 1));
                warn!(line = index + 1, error = %error, "skipping citation");
            }
        }
    }

    records.sort_by_key(|record| Reverse(record.year));
    counts.added_count = records.len();

    let added = records
        .iter()
        .map(|record| AddedPublication {
            title: record.title.clone(),
            year: record.year,
            kind: record.kind.as_str().to_string(),
        })
        .collect::<Vec<AddedPublication>>();

    let fragments = records.iter().map(render_citation).collect::<Vec<String>>();
    let rebuilt = splice_publications(&document, &fragments)?;

    info!(
        existing = rebuilt.existing_count,
        added = counts.added_count,
        total = rebuilt.total_count,
        "merged publications"
    );

    if args.dry_run {
        info!("dry-run complete, document and manifest untouched");
        return Ok(());
    }

    fs::write(&args.site_path, &rebuilt.content)
        .with_context(|| format!("failed to write {}", args.site_path.display()))?;
    let site_sha256_after = sha256_file(&args.site_path)?;

    ensure_directory(&manifest_dir)?;
    let manifest = UpdateRunManifest {
        manifest_version: 1,
        run_id,
        status: "completed".to_string(),
        started_at,
        updated_at: now_utc_string(),
        command: render_update_command(&args),
        site_path: args.site_path.display().to_string(),
        site_sha256_before,
        site_sha256_after: Some(site_sha256_after),
        counts,
        added,
        warnings,
        notes: vec![
            "Publications are merged by exact title and sorted by year descending.".to_string(),
        ],
    };
    write_json_pretty(&manifest_path, &manifest)?;

    info!(path = %manifest_path.display(), "wrote update run manifest");
    info!(
        added = manifest.counts.added_count,
        duplicates = manifest.counts.duplicate_count,
        parse_failures = manifest.counts.parse_failure_count,
        "publications update completed"
    );

    Ok(())
}

fn render_update_command(args: &UpdateArgs) -> String {
    let mut command = format!(
        "vitae update --site-path {} --citations-path {} --owner \"{}\" --cache-root {}",
        args.site_path.display(),
        args.citations_path.display(),
        args.owner,
        args.cache_root.display()
    );
    if let Some(path) = &args.manifest_path {
        command.push_str(&format!(" --manifest-path {}", path.display()));
    }
    if args.dry_run {
        command.push_str(" --dry-run");
    }
    command
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn render_update_command_includes_dry_run_flag_when_set() {
        let args = UpdateArgs {
            site_path: PathBuf::from("index.html"),
            citations_path: PathBuf::from("publications.txt"),
            owner: "Wu, Y.".to_string(),
            cache_root: PathBuf::from(".cache/vitae"),
            manifest_path: None,
            dry_run: true,
        };

        let command = render_update_command(&args);
        assert!(command.contains("--citations-path publications.txt"));
        assert!(command.contains("--owner \"Wu, Y.\""));
        assert!(command.ends_with("--dry-run"));
    }

    #[test]
    fn added_publication_manifest_entry_carries_kind_string() {
        let parser = CitationParser::new("Wu, Y.").expect("citation regexes compile");
        let record = parser
            .parse("Wu, Y. (2019). Spatial modeling of transit access (M.A. Thesis, State University).")
            .expect("thesis citation parses");

        let entry = AddedPublication {
            title: record.title.clone(),
            year: record.year,
            kind: record.kind.as_str().to_string(),
        };

        let json = serde_json::to_string(&entry).expect("entry serializes");
        assert!(json.contains("\"kind\":\"thesis\""));
        assert!(json.contains("\"year\":2019"));
    }
}
