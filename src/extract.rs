use anyhow::{Context, Result, anyhow, bail};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::warn;

use crate::model::{PageSections, PersonalInfo, PublicationView, TimelineEntry};
use crate::util::collapse_whitespace;

pub const EDUCATION_HEADING: &str = "Education";
pub const APPOINTMENTS_HEADING: &str = "Appointments";
pub const PROCEEDINGS_HEADING: &str = "Conference Proceedings";
pub const AWARDS_HEADING: &str = "Awards and Honors";

pub struct PageExtractor {
    heading: Selector,
    entry_block: Selector,
    list_item: Selector,
    publications_list: Selector,
    anchor: Selector,
    emphasis: Selector,
    masthead_heading: Selector,
    mailto: Selector,
    footer_paragraph: Selector,
    year_header: Selector,
    timeline_year: Selector,
    line_break: Regex,
    tag: Regex,
    year_prefix: Regex,
    entry_link: Regex,
    cited_year: Regex,
    bare_year: Regex,
    title_fallback: Regex,
}

impl PageExtractor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            heading: selector("h2")?,
            entry_block: selector("p.large, ul")?,
            list_item: selector("li")?,
            publications_list: selector("ul#publications-list")?,
            anchor: selector("a")?,
            emphasis: selector("em")?,
            masthead_heading: selector("h4")?,
            mailto: selector(r#"a[href^="mailto:"]"#)?,
            footer_paragraph: selector("footer p")?,
            year_header: selector("h3")?,
            timeline_year: selector(".timeline-year")?,
            line_break: Regex::new(r"(?i)<br\s*/?>")
                .context("failed to compile line break regex")?,
            tag: Regex::new(r"<[^>]+>").context("failed to compile tag strip regex")?,
            year_prefix: Regex::new(
                r"^(?P<year>\d{4}(?:\s*[\u{2013}\u{2014}-]\s*(?:\d{4}|now|present))?)\s+(?P<rest>.+)$",
            )
            .context("failed to compile year prefix regex")?,
            entry_link: Regex::new(
                r"(?s)^(?P<before>.*?)<a[^>]*>(?P<institution>[^<]*)</a>(?P<after>.*)$",
            )
            .context("failed to compile entry link regex")?,
            cited_year: Regex::new(r"\((\d{4})\)").context("failed to compile cited year regex")?,
            bare_year: Regex::new(r"\b(19|20)\d{2}\b")
                .context("failed to compile bare year regex")?,
            title_fallback: Regex::new(r"\(\d{4}\)\.\s*(?P<title>[^.]+)\.")
                .context("failed to compile title fallback regex")?,
        })
    }

    pub fn extract(&self, html: &str) -> Result<PageSections> {
        let document = Html::parse_document(html);

        Ok(PageSections {
            info: self.personal_info(&document),
            education: self.timeline_section(&document, EDUCATION_HEADING)?,
            appointments: self.timeline_section(&document, APPOINTMENTS_HEADING)?,
            publications: self.publications(&document)?,
            proceedings: self.proceedings(&document)?,
            awards: self.awards(&document)?,
            presentations: self.presentations(&document),
        })
    }

    fn personal_info(&self, document: &Html) -> PersonalInfo {
        let mut headings = document.select(&self.masthead_heading);

        let name = headings.next().and_then(|element| {
            element
                .text()
                .map(str::trim)
                .find(|text| !text.is_empty())
                .map(collapse_whitespace)
        });
        let title = headings
            .next()
            .map(|element| element_text(&element))
            .filter(|text| !text.is_empty());
        let institution = headings
            .next()
            .map(|element| element_text(&element))
            .filter(|text| !text.is_empty());

        let email = document.select(&self.mailto).next().and_then(|element| {
            element
                .value()
                .attr("href")
                .map(|href| href.trim_start_matches("mailto:").to_string())
        });

        let address = document
            .select(&self.footer_paragraph)
            .next()
            .map(|element| element_text(&element))
            .filter(|text| !text.is_empty());

        if name.is_none() {
            warn!("masthead name heading not found");
        }

        PersonalInfo {
            name,
            title,
            institution,
            email,
            address,
        }
    }

    fn find_heading<'a>(&self, document: &'a Html, text: &str) -> Result<Option<ElementRef<'a>>> {
        let mut matches = document
            .select(&self.heading)
            .filter(|element| element_text(element) == text);

        let first = matches.next();
        if first.is_some() && matches.next().is_some() {
            bail!("section heading appears more than once: {text}");
        }

        Ok(first)
    }

    fn section_block<'a>(
        &self,
        document: &'a Html,
        heading_text: &str,
    ) -> Result<Option<ElementRef<'a>>> {
        let Some(heading) = self.find_heading(document, heading_text)? else {
            warn!(heading = heading_text, "section heading not found");
            return Ok(None);
        };

        for element in elements_after(document, heading) {
            if self.heading.matches(&element) {
                break;
            }
            if self.entry_block.matches(&element) {
                return Ok(Some(element));
            }
        }

        warn!(heading = heading_text, "section has no entry block");
        Ok(None)
    }

    fn timeline_section(&self, document: &Html, heading_text: &str) -> Result<Vec<TimelineEntry>> {
        let Some(block) = self.section_block(document, heading_text)? else {
            return Ok(Vec::new());
        };

        let segments = if block.value().name() == "ul" {
            block
                .select(&self.list_item)
                .map(|item| item.inner_html())
                .collect::<Vec<String>>()
        } else {
            self.line_break
                .split(&block.inner_html())
                .map(ToOwned::to_owned)
                .collect()
        };

        Ok(segments
            .iter()
            .filter_map(|segment| self.timeline_entry(segment))
            .collect())
    }

    fn timeline_entry(&self, segment: &str) -> Option<TimelineEntry> {
        let (institution, location, head) = match self.entry_link.captures(segment) {
            Some(captures) => {
                let institution = collapse_whitespace(&captures["institution"]);
                let location = collapse_whitespace(&self.strip_tags(&captures["after"]));
                let location = location
                    .trim_start_matches([',', ' '])
                    .trim_end_matches('.')
                    .trim()
                    .to_string();

                (
                    (!institution.is_empty()).then_some(institution),
                    (!location.is_empty()).then_some(location),
                    captures["before"].to_string(),
                )
            }
            None => (None, None, segment.to_string()),
        };

        let text = collapse_whitespace(&self.strip_tags(&head));
        let text = text.trim_start_matches(|c: char| c == '\u{2022}' || c.is_whitespace());

        let captures = self.year_prefix.captures(text)?;
        let year = collapse_whitespace(&captures["year"]);
        let mut label = captures["rest"].trim().to_string();
        if let Some(stripped) = label.strip_suffix('.') {
            label = stripped.trim_end().to_string();
        }
        if label.is_empty() {
            return None;
        }

        Some(TimelineEntry {
            year,
            label,
            institution,
            location,
        })
    }

    fn publications(&self, document: &Html) -> Result<Vec<PublicationView>> {
        let mut lists = document.select(&self.publications_list);
        let Some(list) = lists.next() else {
            warn!("publications list not found");
            return Ok(Vec::new());
        };
        if lists.next().is_some() {
            bail!("publications list marker appears more than once");
        }

        let mut publications = Vec::new();
        for item in list.select(&self.list_item) {
            let clean = element_text(&item);
            if clean.is_empty() {
                continue;
            }

            let title = item
                .select(&self.anchor)
                .next()
                .map(|link| element_text(&link))
                .filter(|title| !title.is_empty())
                .or_else(|| {
                    self.title_fallback
                        .captures(&clean)
                        .map(|captures| captures["title"].trim().to_string())
                })
                .unwrap_or_default();

            let venue = item
                .select(&self.emphasis)
                .next()
                .map(|element| element_text(&element))
                .unwrap_or_default();

            let year = self
                .cited_year
                .captures(&clean)
                .and_then(|captures| captures.get(1))
                .map(|found| found.as_str().to_string())
                .unwrap_or_default();

            let authors = clean.split('(').next().unwrap_or("").trim().to_string();

            publications.push(PublicationView {
                year,
                title,
                venue,
                authors,
            });
        }

        Ok(publications)
    }

    fn proceedings(&self, document: &Html) -> Result<Vec<PublicationView>> {
        let Some(block) = self.section_block(document, PROCEEDINGS_HEADING)? else {
            return Ok(Vec::new());
        };

        let mut proceedings = Vec::new();
        for item in block.select(&self.list_item) {
            let clean = element_text(&item);
            if clean.is_empty() {
                continue;
            }

            let title = item
                .select(&self.anchor)
                .next()
                .map(|link| element_text(&link))
                .filter(|title| !title.is_empty())
                .unwrap_or_else(|| clean.clone());

            let year = self
                .bare_year
                .find(&clean)
                .map(|found| found.as_str().to_string())
                .unwrap_or_default();

            let authors = clean.split('(').next().unwrap_or("").trim().to_string();

            proceedings.push(PublicationView {
                year,
                title,
                venue: String::new(),
                authors,
            });
        }

        Ok(proceedings)
    }

    fn awards(&self, document: &Html) -> Result<Vec<TimelineEntry>> {
        let Some(heading) = self.find_heading(document, AWARDS_HEADING)? else {
            warn!(heading = AWARDS_HEADING, "section heading not found");
            return Ok(Vec::new());
        };

        let mut awards = Vec::new();
        let mut current_year: Option<String> = None;

        for element in elements_after(document, heading) {
            if self.heading.matches(&element) {
                break;
            }
            if self.year_header.matches(&element) {
                let year = element_text(&element);
                current_year = (!year.is_empty()).then_some(year);
                continue;
            }
            if self.list_item.matches(&element) {
                let Some(year) = &current_year else { continue };
                let label = element_text(&element);
                if label.is_empty() {
                    continue;
                }
                awards.push(TimelineEntry {
                    year: year.clone(),
                    label,
                    institution: None,
                    location: None,
                });
            }
        }

        Ok(awards)
    }

    fn presentations(&self, document: &Html) -> Vec<TimelineEntry> {
        let mut presentations = Vec::new();
        let mut current_year: Option<String> = None;

        for element in document
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
        {
            if self.heading.matches(&element) {
                current_year = None;
                continue;
            }
            if self.timeline_year.matches(&element) {
                let year = element_text(&element);
                current_year = (!year.is_empty()).then_some(year);
                continue;
            }
            if self.list_item.matches(&element) {
                let Some(year) = &current_year else { continue };
                let label = element_text(&element);
                if label.is_empty() {
                    continue;
                }
                presentations.push(TimelineEntry {
                    year: year.clone(),
                    label,
                    institution: None,
                    location: None,
                });
            }
        }

        presentations
    }

    fn strip_tags(&self, input: &str) -> String {
        self.tag.replace_all(input, "").to_string()
    }
}

pub(crate) fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|error| anyhow!("failed to compile selector {css}: {error}"))
}

pub(crate) fn element_text(element: &ElementRef) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

fn elements_after<'a>(
    document: &'a Html,
    anchor: ElementRef<'a>,
) -> impl Iterator<Item = ElementRef<'a>> {
    let anchor_id = anchor.id();
    document
        .root_element()
        .descendants()
        .skip_while(move |node| node.id() != anchor_id)
        .skip(1)
        .filter_map(ElementRef::wrap)
}
