use anyhow::{Context, Result, bail};
use regex::Regex;

use crate::model::{Author, PublicationKind, PublicationRecord};
use crate::util::collapse_whitespace;

pub struct CitationParser {
    journal: Regex,
    thesis: Regex,
    owner: String,
}

impl CitationParser {
    pub fn new(owner: &str) -> Result<Self> {
        let journal = Regex::new(
            r"^(?P<authors>.+?)\s+\((?P<year>\d{4})\)\.\s+(?P<title>.+?)\.\s+(?P<venue>.+?),\s+(?P<volume>\d+)(?:\((?P<issue>\d+)\))?,\s+(?P<pages>.+?)\.$",
        )
        .context("failed to compile journal citation regex")?;
        let thesis = Regex::new(
            r"^(?P<authors>.+?)\s+\((?P<year>\d{4})\)\.\s+(?P<title>.+?)\s+\((?P<venue>[^)]+)\)\.$",
        )
        .context("failed to compile thesis citation regex")?;

        Ok(Self {
            journal,
            thesis,
            owner: owner.to_string(),
        })
    }

    pub fn parse(&self, line: &str) -> Result<PublicationRecord> {
        let text = line.trim();

        if let Some(captures) = self.journal.captures(text) {
            let pages = captures["pages"].to_string();
            let doi_url = if pages.starts_with('e') {
                Some(format!("https://doi.org/{pages}"))
            } else {
                None
            };

            return Ok(PublicationRecord {
                authors: split_authors(&captures["authors"], &self.owner),
                year: captures["year"]
                    .parse::<i32>()
                    .with_context(|| format!("invalid year in citation: {text}"))?,
                title: captures["title"].to_string(),
                venue: captures["venue"].to_string(),
                volume: Some(captures["volume"].to_string()),
                issue: captures.name("issue").map(|m| m.as_str().to_string()),
                pages: Some(pages),
                doi_url,
                kind: PublicationKind::Journal,
            });
        }

        if let Some(captures) = self.thesis.captures(text) {
            return Ok(PublicationRecord {
                authors: split_authors(&captures["authors"], &self.owner),
                year: captures["year"]
                    .parse::<i32>()
                    .with_context(|| format!("invalid year in citation: {text}"))?,
                title: captures["title"].to_string(),
                venue: captures["venue"].to_string(),
                volume: None,
                issue: None,
                pages: None,
                doi_url: None,
                kind: PublicationKind::Thesis,
            });
        }

        bail!("citation matches no known shape: {text}");
    }
}

pub fn split_authors(raw: &str, owner: &str) -> Vec<Author> {
    let parts = raw.split("., ").collect::<Vec<&str>>();
    let last_index = parts.len().saturating_sub(1);

    parts
        .iter()
        .enumerate()
        .map(|(index, part)| {
            let name = if index < last_index {
                format!("{part}.")
            } else {
                (*part).to_string()
            };
            let highlighted = owner_matches(owner, &name);
            Author { name, highlighted }
        })
        .collect()
}

pub fn owner_matches(owner: &str, name: &str) -> bool {
    collapse_whitespace(owner) == collapse_whitespace(name)
}

pub fn render_citation(record: &PublicationRecord) -> String {
    let authors = record
        .authors
        .iter()
        .map(|author| {
            if author.highlighted {
                format!("<b>{}</b>", author.name)
            } else {
                author.name.clone()
            }
        })
        .collect::<Vec<String>>()
        .join(", ");

    let href = record.doi_url.as_deref().unwrap_or("#");
    let mut citation = format!(
        "{authors} ({year}). <a href=\"{href}\" target=\"_blank\">{title}</a>. <em>{venue}</em>",
        year = record.year,
        title = record.title,
        venue = record.venue,
    );

    if matches!(record.kind, PublicationKind::Journal) {
        if let Some(volume) = &record.volume {
            match &record.issue {
                Some(issue) => citation.push_str(&format!(", {volume}({issue})")),
                None => citation.push_str(&format!(", {volume}")),
            }
        }
        if let Some(pages) = &record.pages {
            citation.push_str(&format!(", {pages}"));
        }
    }

    citation.push('.');
    format!("<li class=\"margin-10\">{citation}</li>")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> CitationParser {
        CitationParser::new("Wu, Y.").expect("citation regexes compile")
    }

    #[test]
    fn parses_journal_citation_with_volume_issue_and_pages() {
        let record = parser()
            .parse("Wu, Y., Smith, J. (2021). Urban growth patterns. Journal of Geography, 12(3), 45-60.")
            .expect("journal citation parses");

        assert_eq!(record.year, 2021);
        assert_eq!(record.title, "Urban growth patterns");
        assert_eq!(record.venue, "Journal of Geography");
        assert_eq!(record.volume.as_deref(), Some("12"));
        assert_eq!(record.issue.as_deref(), Some("3"));
        assert_eq!(record.pages.as_deref(), Some("45-60"));
        assert_eq!(record.doi_url, None);
        assert_eq!(record.kind, PublicationKind::Journal);

        assert_eq!(record.authors.len(), 2);
        assert_eq!(record.authors[0].name, "Wu, Y.");
        assert!(record.authors[0].highlighted);
        assert_eq!(record.authors[1].name, "Smith, J.");
        assert!(!record.authors[1].highlighted);
    }

    #[test]
    fn parses_journal_citation_without_issue() {
        let record = parser()
            .parse("Wu, Y. (2020). Transit deserts. Applied Geography, 44, 101-110.")
            .expect("journal citation parses");

        assert_eq!(record.volume.as_deref(), Some("44"));
        assert_eq!(record.issue, None);
        assert_eq!(record.pages.as_deref(), Some("101-110"));
    }

    #[test]
    fn parses_thesis_citation_with_degree_info_as_venue() {
        let record = parser()
            .parse("Wu, Y. (2019). Spatial modeling of transit access (M.A. Thesis, State University).")
            .expect("thesis citation parses");

        assert_eq!(record.kind, PublicationKind::Thesis);
        assert_eq!(record.year, 2019);
        assert_eq!(record.title, "Spatial modeling of transit access");
        assert_eq!(record.venue, "M.A. Thesis, State University");
        assert_eq!(record.volume, None);
        assert_eq!(record.issue, None);
        assert_eq!(record.pages, None);
        assert_eq!(record.doi_url, None);
    }

    #[test]
    fn infers_doi_url_from_article_number_pages() {
        let record = parser()
            .parse("Wu, Y. (2023). Flood exposure mapping. Remote Sensing, 15(2), e2023RS00123.")
            .expect("journal citation parses");

        assert_eq!(
            record.doi_url.as_deref(),
            Some("https://doi.org/e2023RS00123")
        );
    }

    #[test]
    fn rejects_citation_matching_no_shape() {
        let error = parser()
            .parse("An unstructured line of prose without any citation form")
            .expect_err("unstructured line is rejected");

        assert!(error.to_string().contains("no known shape"));
    }

    #[test]
    fn owner_matching_tolerates_whitespace_variants() {
        assert!(owner_matches("Wu, Y.", "Wu,  Y."));
        assert!(!owner_matches("Wu, Y.", "Wu, H."));
        assert!(!owner_matches("Wu, Y.", "Hsu, Y."));
    }

    #[test]
    fn renders_journal_citation_with_placeholder_link() {
        let record = parser()
            .parse("Wu, Y., Smith, J. (2021). Urban growth patterns. Journal of Geography, 12(3), 45-60.")
            .expect("journal citation parses");

        assert_eq!(
            render_citation(&record),
            "<li class=\"margin-10\"><b>Wu, Y.</b>, Smith, J. (2021). <a href=\"#\" target=\"_blank\">Urban growth patterns</a>. <em>Journal of Geography</em>, 12(3), 45-60.</li>"
        );
    }

    #[test]
    fn renders_thesis_citation_without_volume_or_pages() {
        let record = parser()
            .parse("Wu, Y. (2019). Spatial modeling of transit access (M.A. Thesis, State University).")
            .expect("thesis citation parses");

        assert_eq!(
            render_citation(&record),
            "<li class=\"margin-10\"><b>Wu, Y.</b> (2019). <a href=\"#\" target=\"_blank\">Spatial modeling of transit access</a>. <em>M.A. Thesis, State University</em>.</li>"
        );
    }

    #[test]
    fn round_trips_journal_content_through_parse_and_render() {
        let source =
            "Wu, Y., Smith, J. (2021). Urban growth patterns. Journal of Geography, 12(3), 45-60.";
        let rendered = render_citation(&parser().parse(source).expect("citation parses"));
        let unbolded = rendered.replace("<b>", "").replace("</b>", "");

        assert!(unbolded.contains("Wu, Y., Smith, J. (2021)."));
        assert!(unbolded.contains(">Urban growth patterns</a>. <em>Journal of Geography</em>, 12(3), 45-60."));
    }

    #[test]
    fn author_split_rejoins_to_original_text() {
        let raw = "Wu, Y., Chen, L., & Smith, J.";
        let joined = split_authors(raw, "Wu, Y.")
            .iter()
            .map(|author| author.name.clone())
            .collect::<Vec<String>>()
            .join(", ");

        assert_eq!(joined, raw);
    }
}
