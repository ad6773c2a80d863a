use crate::model::{PageSections, PublicationView, TimelineEntry};

const STYLE: &str = "\
        body {
            font-family: Arial, sans-serif;
            line-height: 1.6;
            max-width: 800px;
            margin: 0 auto;
            padding: 20px;
        }
        h1 {
            color: #333;
            border-bottom: 2px solid #333;
            padding-bottom: 10px;
        }
        h2 {
            color: #666;
            margin-top: 30px;
            border-bottom: 1px solid #ccc;
            padding-bottom: 5px;
        }
        .contact-info {
            margin-bottom: 20px;
        }
        .publication-item, .education-item, .appointment-item, .award-item, .proceeding-item, .presentation-item {
            margin-bottom: 10px;
            padding-left: 10px;
        }
        .year {
            font-weight: bold;
            color: #333;
        }
        .journal {
            font-style: italic;
        }
        .award-year {
            font-weight: bold;
            color: #666;
            margin-top: 15px;
        }
";

pub fn render_cv(sections: &PageSections) -> String {
    let info = &sections.info;
    let name = info.name.as_deref().unwrap_or("Curriculum Vitae");

    let mut page = String::with_capacity(8192);
    page.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    page.push_str("    <meta charset=\"UTF-8\">\n");
    page.push_str("    <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n");
    page.push_str(&format!("    <title>CV - {name}</title>\n"));
    page.push_str(&format!(
        "    <meta name=\"description\" content=\"Curriculum Vitae of {name}\">\n"
    ));
    page.push_str(&format!("    <meta name=\"author\" content=\"{name}\">\n"));
    page.push_str("    <style>\n");
    page.push_str(STYLE);
    page.push_str("    </style>\n</head>\n<body>\n");
    page.push_str(&format!("    <h1>{name}</h1>\n"));

    page.push_str("    <div class=\"contact-info\">\n");
    if let Some(email) = &info.email {
        page.push_str(&format!("        <p><strong>Email:</strong> {email}</p>\n"));
    }
    if let Some(address) = &info.address {
        page.push_str(&format!(
            "        <p><strong>Address:</strong> {address}</p>\n"
        ));
    }
    if let Some(title) = &info.title {
        page.push_str(&format!(
            "        <p><strong>Position:</strong> {title}</p>\n"
        ));
    }
    if let Some(institution) = &info.institution {
        page.push_str(&format!(
            "        <p><strong>Institution:</strong> {institution}</p>\n"
        ));
    }
    page.push_str("    </div>\n");

    page.push_str("\n    <h2>Education</h2>\n");
    for entry in &sections.education {
        push_timeline_item(&mut page, "education-item", entry);
    }

    page.push_str("\n    <h2>Appointments</h2>\n");
    for entry in &sections.appointments {
        push_timeline_item(&mut page, "appointment-item", entry);
    }

    page.push_str("\n    <h2>Publications</h2>\n");
    for entry in &sections.publications {
        push_publication_item(&mut page, "publication-item", entry, true);
    }

    page.push_str("\n    <h2>Conference Proceedings</h2>\n");
    for entry in &sections.proceedings {
        push_publication_item(&mut page, "proceeding-item", entry, false);
    }

    page.push_str("\n    <h2>Awards &amp; Honors</h2>\n");
    push_year_grouped(&mut page, &sections.awards, "award-item");

    page.push_str("\n    <h2>Presentations</h2>\n");
    push_year_grouped(&mut page, &sections.presentations, "presentation-item");

    page.push_str("</body>\n</html>\n");
    page
}

fn push_timeline_item(page: &mut String, class: &str, entry: &TimelineEntry) {
    page.push_str(&format!(
        "    <div class=\"{class}\">\n        <span class=\"year\">{}</span> - {}",
        entry.year, entry.label
    ));

    let origin = [entry.institution.as_deref(), entry.location.as_deref()]
        .into_iter()
        .flatten()
        .collect::<Vec<&str>>()
        .join(", ");
    if !origin.is_empty() {
        page.push_str(&format!("<br>\n        {origin}"));
    }

    page.push_str("\n    </div>\n");
}

fn push_publication_item(page: &mut String, class: &str, entry: &PublicationView, with_venue: bool) {
    page.push_str(&format!(
        "    <div class=\"{class}\">\n        <span class=\"year\">{}</span> - {}<br>\n        {}",
        entry.year, entry.authors, entry.title
    ));

    if with_venue && !entry.venue.is_empty() {
        page.push_str(&format!(
            "<br>\n        <span class=\"journal\">{}</span>",
            entry.venue
        ));
    }

    page.push_str("\n    </div>\n");
}

fn push_year_grouped(page: &mut String, entries: &[TimelineEntry], item_class: &str) {
    let mut last_year: Option<&str> = None;

    for entry in entries {
        if last_year != Some(entry.year.as_str()) {
            page.push_str(&format!(
                "    <div class=\"award-year\">{}</div>\n",
                entry.year
            ));
            last_year = Some(entry.year.as_str());
        }
        page.push_str(&format!(
            "    <div class=\"{item_class}\">\n        \u{2022} {}\n    </div>\n",
            entry.label
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PersonalInfo;

    fn entry(year: &str, label: &str) -> TimelineEntry {
        TimelineEntry {
            year: year.to_string(),
            label: label.to_string(),
            institution: None,
            location: None,
        }
    }

    fn sample_sections() -> PageSections {
        PageSections {
            info: PersonalInfo {
                name: Some("Yanan Wu".to_string()),
                title: Some("Assistant Professor".to_string()),
                institution: None,
                email: Some("ywu@uca.edu".to_string()),
                address: None,
            },
            education: vec![TimelineEntry {
                year: "2019–2024".to_string(),
                label: "Ph.D. in Geospatial Information Sciences".to_string(),
                institution: Some("The University of Texas at Dallas".to_string()),
                location: Some("Richardson, TX".to_string()),
            }],
            appointments: vec![entry("2025–now", "Assistant Professor")],
            publications: vec![PublicationView {
                year: "2021".to_string(),
                title: "Urban growth patterns".to_string(),
                venue: "Journal of Geography".to_string(),
                authors: "Wu, Y., Smith, J.".to_string(),
            }],
            proceedings: vec![PublicationView {
                year: "2023".to_string(),
                title: "Access to parks".to_string(),
                venue: String::new(),
                authors: "Wu, Y.".to_string(),
            }],
            awards: vec![
                entry("2024", "Outstanding Dissertation Award"),
                entry("2024", "Conference Travel Grant"),
                entry("2022", "Best Student Paper"),
            ],
            presentations: vec![
                entry("2024", "AAG Annual Meeting, Honolulu"),
                entry("2023", "GIScience Conference, Leeds"),
            ],
        }
    }

    #[test]
    fn sections_appear_in_fixed_order() {
        let page = render_cv(&sample_sections());

        let order = [
            "<h2>Education</h2>",
            "<h2>Appointments</h2>",
            "<h2>Publications</h2>",
            "<h2>Conference Proceedings</h2>",
            "<h2>Awards &amp; Honors</h2>",
            "<h2>Presentations</h2>",
        ];
        let positions = order
            .iter()
            .map(|heading| page.find(heading).expect("heading present"))
            .collect::<Vec<usize>>();

        assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn consecutive_awards_share_one_year_header() {
        let page = render_cv(&sample_sections());

        assert_eq!(page.matches("award-year\">2024<").count(), 2);
        let award_headers = page
            .match_indices("<div class=\"award-year\">")
            .count();
        assert_eq!(award_headers, 4);
    }

    #[test]
    fn contact_rows_render_only_known_fields() {
        let page = render_cv(&sample_sections());

        assert!(page.contains("<strong>Email:</strong> ywu@uca.edu"));
        assert!(page.contains("<strong>Position:</strong> Assistant Professor"));
        assert!(!page.contains("<strong>Address:</strong>"));
        assert!(!page.contains("<strong>Institution:</strong>"));
    }

    #[test]
    fn education_item_carries_institution_and_location() {
        let page = render_cv(&sample_sections());

        assert!(page.contains("The University of Texas at Dallas, Richardson, TX"));
    }

    #[test]
    fn page_title_embeds_owner_name() {
        let page = render_cv(&sample_sections());

        assert!(page.contains("<title>CV - Yanan Wu</title>"));
    }
}
