use std::cmp::Reverse;
use std::fs;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use tracing::{info, warn};

use crate::citation::render_citation;
use crate::cli::ScholarArgs;
use crate::dedupe::TitleIndex;
use crate::extract::PageExtractor;
use crate::model::{AddedPublication, UpdateCounts, UpdateRunManifest};
use crate::rebuild::splice_publications;
use crate::scholar::{ScholarClient, into_record};
use crate::util::{
    ensure_directory, now_utc_string, read_document, sha256_file, utc_compact_string,
    write_json_pretty,
};

pub fn run(args: ScholarArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("run-{}", utc_compact_string(started_ts));

    if !args.site_path.exists() {
        bail!("site document not found: {}", args.site_path.display());
    }

    let manifest_dir = args.cache_root.join("manifests");
    let manifest_path = args.manifest_path.clone().unwrap_or_else(|| {
        manifest_dir.join(format!(
            "scholar_run_{}.json",
            utc_compact_string(started_ts)
        ))
    });

    info!(
        site = %args.site_path.display(),
        author_id = %args.author_id,
        run_id = %run_id,
        "starting scholar update"
    );

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

    let client = ScholarClient::new(
        &args.base_url,
        Duration::from_millis(args.timeout_ms),
        Duration::from_millis(args.backoff_ms),
    )?;
    let articles =
        client.fetch_author_articles(&args.author_id, args.page_size, args.max_records)?;
    counts.fetched_count = articles.len();

    let mut records = Vec::new();
    for article in &articles {
        counts.candidate_count += 1;

        if !titles.admit(&article.title) {
            counts.duplicate_count += 1;
            continue;
        }

        let detail = match (&article.detail_path, args.fetch_details) {
            (Some(path), true) => {
                client.pause();
                match client.fetch_article_detail(path) {
                    Ok(detail) => Some(detail),
                    Err(error) => {
                        counts.detail_failure_count += 1;
                        warnings.push(format!("{}: {error}", article.title));
                        warn!(
                            title = %article.title,
                            error = %error,
                            "detail fetch failed, keeping listing fields"
                        );
                        None
                    }
                }
            }
            _ => None,
        };

        records.push(into_record(article, detail.as_ref(), &args.owner));
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
        command: render_scholar_command(&args),
        site_path: args.site_path.display().to_string(),
        site_sha256_before,
        site_sha256_after: Some(site_sha256_after),
        counts,
        added,
        warnings,
        notes: vec![
            "Scholar records are merged by exact title; per-record details are fetched only when enabled.".to_string(),
        ],
    };
    write_json_pretty(&manifest_path, &manifest)?;

    info!(path = %manifest_path.display(), "wrote scholar run manifest");
    info!(
        fetched = manifest.counts.fetched_count,
        added = manifest.counts.added_count,
        duplicates = manifest.counts.duplicate_count,
        detail_failures = manifest.counts.detail_failure_count,
        "scholar update completed"
    );

    Ok(())
}

fn render_scholar_command(args: &ScholarArgs) -> String {
    let mut command = format!(
        "vitae scholar --site-path {} --author-id {} --base-url {} --owner \"{}\" --page-size {} --timeout-ms {} --backoff-ms {} --cache-root {}",
        args.site_path.display(),
        args.author_id,
        args.base_url,
        args.owner,
        args.page_size,
        args.timeout_ms,
        args.backoff_ms,
        args.cache_root.display()
    );
    if let Some(limit) = args.max_records {
        command.push_str(&format!(" --max-records {limit}"));
    }
    if args.fetch_details {
        command.push_str(" --fetch-details");
    }
    if let Some(path) = &args.manifest_path {
        command.push_str(&format!(" --manifest-path {}", path.display()));
    }
    if args.dry_run {
        command.push_str(" --dry-run");
    }
    command
}
