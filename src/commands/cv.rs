use std::fs;

use anyhow::{Context, Result, bail};
use tracing::info;

use crate::cli::CvArgs;
use crate::cv::render_cv;
use crate::extract::PageExtractor;
use crate::util::read_document;

pub fn run(args: CvArgs) -> Result<()> {
    if !args.site_path.exists() {
        bail!("site document not found: {}", args.site_path.display());
    }

    info!(site = %args.site_path.display(), "generating cv page");

    let document = read_document(&args.site_path)?;
    let extractor = PageExtractor::new()?;
    let sections = extractor.extract(&document)?;

    info!(
        education = sections.education.len(),
        appointments = sections.appointments.len(),
        publications = sections.publications.len(),
        proceedings = sections.proceedings.len(),
        awards = sections.awards.len(),
        presentations = sections.presentations.len(),
        "extracted site sections"
    );

    let page = render_cv(&sections);
    fs::write(&args.output_path, page)
        .with_context(|| format!("failed to write {}", args.output_path.display()))?;

    info!(path = %args.output_path.display(), "wrote cv page");

    Ok(())
}
