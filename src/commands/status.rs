use std::fs;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::extract::PageExtractor;
use crate::model::UpdateRunManifest;
use crate::util::{newest_json_manifest, read_document, sha256_file};

pub fn run(args: StatusArgs) -> Result<()> {
    info!(site = %args.site_path.display(), "status requested");

    if args.site_path.exists() {
        let document = read_document(&args.site_path)?;
        let sha256 = sha256_file(&args.site_path)?;
        let extractor = PageExtractor::new()?;

        match extractor.extract(&document) {
            Ok(sections) => {
                info!(
                    sha256 = %sha256,
                    education = sections.education.len(),
                    appointments = sections.appointments.len(),
                    publications = sections.publications.len(),
                    proceedings = sections.proceedings.len(),
                    awards = sections.awards.len(),
                    presentations = sections.presentations.len(),
                    "site document status"
                );
            }
            Err(error) => warn!(error = %error, "site document failed to extract"),
        }
    } else {
        warn!(path = %args.site_path.display(), "site document missing");
    }

    let manifest_dir = args.cache_root.join("manifests");
    match newest_json_manifest(&manifest_dir)? {
        Some(path) => {
            let raw =
                fs::read(&path).with_context(|| format!("failed to read {}", path.display()))?;
            let manifest: UpdateRunManifest = serde_json::from_slice(&raw)
                .with_context(|| format!("failed to parse {}", path.display()))?;

            info!(
                path = %path.display(),
                run_id = %manifest.run_id,
                status = %manifest.status,
                updated_at = %manifest.updated_at,
                added = manifest.counts.added_count,
                duplicates = manifest.counts.duplicate_count,
                parse_failures = manifest.counts.parse_failure_count,
                "latest run manifest"
            );
        }
        None => warn!(path = %manifest_dir.display(), "no run manifests found"),
    }

    Ok(())
}
