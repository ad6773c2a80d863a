use std::cmp::Reverse;

use anyhow::{Context, Result};
use regex::Regex;

pub const LIST_OPEN_MARKER: &str = "<ul id=\"publications-list\">";
pub const LIST_CLOSE_MARKER: &str = "</ul>";

const ITEM_INDENT: &str = "                    ";
const CLOSE_INDENT: &str = "                ";

#[derive(Debug)]
pub struct Rebuilt {
    pub content: String,
    pub existing_count: usize,
    pub total_count: usize,
}

pub fn splice_publications(document: &str, new_fragments: &[String]) -> Result<Rebuilt> {
    let open_index = document
        .find(LIST_OPEN_MARKER)
        .context("publications list marker not found in document")?;
    let body_start = open_index + LIST_OPEN_MARKER.len();
    let close_offset = document[body_start..]
        .find(LIST_CLOSE_MARKER)
        .context("publications list closing marker not found in document")?;

    let body = &document[body_start..body_start + close_offset];
    let existing = existing_fragments(body)?;
    let existing_count = existing.len();

    let mut fragments = existing;
    fragments.extend(new_fragments.iter().cloned());

    let mut dated = fragments
        .into_iter()
        .map(|fragment| (fragment_year(&fragment), fragment))
        .collect::<Vec<(i32, String)>>();
    dated.sort_by_key(|(year, _)| Reverse(*year));

    let mut block = String::from(LIST_OPEN_MARKER);
    block.push('\n');
    for (_, fragment) in &dated {
        block.push_str(ITEM_INDENT);
        block.push_str(fragment);
        block.push('\n');
    }
    block.push_str(CLOSE_INDENT);
    block.push_str(LIST_CLOSE_MARKER);

    let mut content = String::with_capacity(document.len() + 256);
    content.push_str(&document[..open_index]);
    content.push_str(&block);
    content.push_str(&document[body_start + close_offset + LIST_CLOSE_MARKER.len()..]);

    Ok(Rebuilt {
        content,
        existing_count,
        total_count: dated.len(),
    })
}

fn existing_fragments(body: &str) -> Result<Vec<String>> {
    let item_pattern =
        Regex::new(r"(?s)<li[^>]*>.*?</li>").context("failed to compile list item regex")?;

    Ok(item_pattern
        .find_iter(body)
        .map(|found| found.as_str().to_string())
        .collect())
}

pub fn fragment_year(fragment: &str) -> i32 {
    let parenthesized = Regex::new(r"\((\d{4})\)").ok();
    if let Some(pattern) = parenthesized {
        if let Some(captures) = pattern.captures(fragment) {
            if let Some(year) = captures.get(1) {
                return year.as_str().parse().unwrap_or(0);
            }
        }
    }

    let bare = Regex::new(r"\b(19|20)\d{2}\b").ok();
    if let Some(pattern) = bare {
        if let Some(found) = pattern.find(fragment) {
            return found.as_str().parse().unwrap_or(0);
        }
    }

    0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(year: i32, title: &str) -> String {
        format!(
            "<li class=\"margin-10\">Wu, Y. ({year}). <a href=\"#\" target=\"_blank\">{title}</a>. <em>Journal</em>, 1(1), 1-2.</li>"
        )
    }

    fn document_with(items: &[String]) -> String {
        let mut body = String::new();
        for entry in items {
            body.push_str(ITEM_INDENT);
            body.push_str(entry);
            body.push('\n');
        }
        format!(
            "<html>\n<body>\n<h2>Publications</h2>\n{LIST_OPEN_MARKER}\n{body}{CLOSE_INDENT}{LIST_CLOSE_MARKER}\n<footer>contact</footer>\n</body>\n</html>\n"
        )
    }

    #[test]
    fn sorts_fragments_by_year_descending() {
        let document = document_with(&[item(2019, "Old"), item(2024, "New")]);

        let rebuilt = splice_publications(&document, &[]).expect("splice succeeds");

        let new_index = rebuilt.content.find("New").expect("new entry present");
        let old_index = rebuilt.content.find("Old").expect("old entry present");
        assert!(new_index < old_index);
        assert_eq!(rebuilt.existing_count, 2);
        assert_eq!(rebuilt.total_count, 2);
    }

    #[test]
    fn equal_years_keep_input_order() {
        let document = document_with(&[
            item(2024, "First"),
            item(2019, "Middle"),
            item(2024, "Second"),
        ]);

        let rebuilt = splice_publications(&document, &[]).expect("splice succeeds");

        let first = rebuilt.content.find("First").expect("entry present");
        let second = rebuilt.content.find("Second").expect("entry present");
        let middle = rebuilt.content.find("Middle").expect("entry present");
        assert!(first < second);
        assert!(second < middle);
    }

    #[test]
    fn existing_fragments_precede_new_fragments_for_equal_years() {
        let document = document_with(&[item(2021, "Existing")]);

        let rebuilt = splice_publications(&document, &[item(2021, "Added")])
            .expect("splice succeeds");

        let existing = rebuilt.content.find("Existing").expect("entry present");
        let added = rebuilt.content.find("Added").expect("entry present");
        assert!(existing < added);
        assert_eq!(rebuilt.existing_count, 1);
        assert_eq!(rebuilt.total_count, 2);
    }

    #[test]
    fn content_outside_markers_is_untouched() {
        let document = document_with(&[item(2020, "Kept")]);

        let rebuilt =
            splice_publications(&document, &[item(2022, "Added")]).expect("splice succeeds");

        let open_index = document.find(LIST_OPEN_MARKER).expect("marker present");
        let tail = "\n<footer>contact</footer>\n</body>\n</html>\n";
        assert_eq!(&rebuilt.content[..open_index], &document[..open_index]);
        assert!(rebuilt.content.ends_with(tail));
    }

    #[test]
    fn splice_with_no_new_fragments_is_a_content_noop() {
        let document = document_with(&[item(2023, "Only")]);

        let rebuilt = splice_publications(&document, &[]).expect("splice succeeds");

        assert_eq!(rebuilt.content, document);
    }

    #[test]
    fn missing_open_marker_aborts_without_output() {
        let document = "<html><body><ul><li>(2020) stray list</li></ul></body></html>";

        let error = splice_publications(document, &[]).expect_err("splice is refused");

        assert!(error.to_string().contains("marker not found"));
    }

    #[test]
    fn missing_close_marker_aborts_without_output() {
        let document = format!("<html><body>{LIST_OPEN_MARKER}<li>(2020) entry</li>");

        let error = splice_publications(&document, &[]).expect_err("splice is refused");

        assert!(error.to_string().contains("closing marker"));
    }

    #[test]
    fn fragment_year_prefers_parenthesized_then_bare_then_zero() {
        assert_eq!(fragment_year("Wu, Y. (2021). Title."), 2021);
        assert_eq!(fragment_year("Presented at the 2019 annual meeting"), 2019);
        assert_eq!(fragment_year("No year in this fragment"), 0);
    }
}
