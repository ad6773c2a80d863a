use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "vitae",
    version,
    about = "Personal-site CV extraction and publication tooling"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Update(UpdateArgs),
    Scholar(ScholarArgs),
    Cv(CvArgs),
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct UpdateArgs {
    #[arg(long, default_value = "index.html")]
    pub site_path: PathBuf,

    #[arg(long, default_value = "publications.txt")]
    pub citations_path: PathBuf,

    #[arg(long, default_value = "Wu, Y.")]
    pub owner: String,

    #[arg(long, default_value = ".cache/vitae")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ScholarArgs {
    #[arg(long, default_value = "index.html")]
    pub site_path: PathBuf,

    #[arg(long)]
    pub author_id: String,

    #[arg(long, default_value = "https://scholar.google.com")]
    pub base_url: String,

    #[arg(long, default_value = "Wu, Y.")]
    pub owner: String,

    #[arg(long, default_value_t = 100)]
    pub page_size: usize,

    #[arg(long)]
    pub max_records: Option<usize>,

    #[arg(long, default_value_t = false)]
    pub fetch_details: bool,

    #[arg(long, default_value_t = 10_000)]
    pub timeout_ms: u64,

    #[arg(long, default_value_t = 1_500)]
    pub backoff_ms: u64,

    #[arg(long, default_value = ".cache/vitae")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct CvArgs {
    #[arg(long, default_value = "index.html")]
    pub site_path: PathBuf,

    #[arg(long, default_value = "cv.html")]
    pub output_path: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = "index.html")]
    pub site_path: PathBuf,

    #[arg(long, default_value = ".cache/vitae")]
    pub cache_root: PathBuf,
}
