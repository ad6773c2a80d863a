use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublicationKind {
    Journal,
    Thesis,
}

impl PublicationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Journal => "journal",
            Self::Thesis => "thesis",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub name: String,
    pub highlighted: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PublicationRecord {
    pub authors: Vec<Author>,
    pub year: i32,
    pub title: String,
    pub venue: String,
    pub volume: Option<String>,
    pub issue: Option<String>,
    pub pages: Option<String>,
    pub doi_url: Option<String>,
    pub kind: PublicationKind,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PublicationView {
    pub year: String,
    pub title: String,
    pub venue: String,
    pub authors: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimelineEntry {
    pub year: String,
    pub label: String,
    pub institution: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct PersonalInfo {
    pub name: Option<String>,
    pub title: Option<String>,
    pub institution: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct PageSections {
    pub info: PersonalInfo,
    pub education: Vec<TimelineEntry>,
    pub appointments: Vec<TimelineEntry>,
    pub publications: Vec<PublicationView>,
    pub proceedings: Vec<PublicationView>,
    pub awards: Vec<TimelineEntry>,
    pub presentations: Vec<TimelineEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCounts {
    pub existing_count: usize,
    pub candidate_count: usize,
    pub parse_failure_count: usize,
    pub duplicate_count: usize,
    pub added_count: usize,
    pub fetched_count: usize,
    pub detail_failure_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddedPublication {
    pub title: String,
    pub year: i32,
    pub kind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub command: String,
    pub site_path: String,
    pub site_sha256_before: String,
    pub site_sha256_after: Option<String>,
    pub counts: UpdateCounts,
    pub added: Vec<AddedPublication>,
    pub warnings: Vec<String>,
    pub notes: Vec<String>,
}
