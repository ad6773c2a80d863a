use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use scraper::Html;
use tracing::{info, warn};

use crate::citation::owner_matches;
use crate::extract::{element_text, selector};
use crate::model::{Author, PublicationKind, PublicationRecord};

#[derive(Debug, Clone, PartialEq)]
pub struct ScholarArticle {
    pub title: String,
    pub year: i32,
    pub authors_raw: String,
    pub venue_raw: String,
    pub detail_path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArticleDetail {
    pub venue: Option<String>,
    pub volume: Option<String>,
    pub issue: Option<String>,
    pub pages: Option<String>,
    pub article_url: Option<String>,
}

pub struct ScholarClient {
    client: reqwest::blocking::Client,
    base_url: String,
    backoff: Duration,
}

impl ScholarClient {
    pub fn new(base_url: &str, timeout: Duration, backoff: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent("vitae/0.1 (personal site maintenance)")
            .build()
            .context("failed to build http client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            backoff,
        })
    }

    pub fn fetch_author_articles(
        &self,
        author_id: &str,
        page_size: usize,
        max_records: Option<usize>,
    ) -> Result<Vec<ScholarArticle>> {
        let mut articles = Vec::new();
        let mut start = 0_usize;

        loop {
            let url = format!(
                "{}/citations?user={}&cstart={}&pagesize={}&sortby=pubdate",
                self.base_url, author_id, start, page_size
            );
            info!(start, "fetching author listing page");

            let body = self.get(&url)?;
            let page = parse_listing(&body)?;
            let page_len = page.len();
            articles.extend(page);

            if let Some(limit) = max_records {
                if articles.len() >= limit {
                    articles.truncate(limit);
                    break;
                }
            }
            if page_len < page_size {
                break;
            }

            start += page_size;
            self.pause();
        }

        info!(count = articles.len(), "fetched author listing");
        Ok(articles)
    }

    pub fn fetch_article_detail(&self, detail_path: &str) -> Result<ArticleDetail> {
        let url = if detail_path.starts_with("http") {
            detail_path.to_string()
        } else {
            format!("{}{}", self.base_url, detail_path)
        };

        let body = self.get(&url)?;
        parse_detail(&body)
    }

    pub fn pause(&self) {
        thread::sleep(self.backoff);
    }

    fn get(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .with_context(|| format!("request failed: {url}"))?;

        let status = response.status();
        if !status.is_success() {
            bail!("request returned status {status}: {url}");
        }

        response
            .text()
            .with_context(|| format!("failed to read response body: {url}"))
    }
}

pub fn parse_listing(html: &str) -> Result<Vec<ScholarArticle>> {
    let row = selector("tr.gsc_a_tr")?;
    let title_link = selector("a.gsc_a_at")?;
    let gray_line = selector("div.gs_gray")?;
    let year_cell = selector("td.gsc_a_y")?;

    let document = Html::parse_document(html);
    let mut articles = Vec::new();

    for element in document.select(&row) {
        let Some(link) = element.select(&title_link).next() else {
            warn!("listing row without a title link, skipping");
            continue;
        };

        let title = element_text(&link);
        if title.is_empty() {
            warn!("listing row with an empty title, skipping");
            continue;
        }

        let detail_path = link.value().attr("href").map(ToOwned::to_owned);

        let mut grays = element.select(&gray_line);
        let authors_raw = grays
            .next()
            .map(|line| element_text(&line))
            .unwrap_or_default();
        let venue_raw = grays
            .next()
            .map(|line| element_text(&line))
            .unwrap_or_default();

        let year = element
            .select(&year_cell)
            .next()
            .map(|cell| element_text(&cell))
            .unwrap_or_default()
            .parse::<i32>()
            .unwrap_or(0);

        articles.push(ScholarArticle {
            title,
            year,
            authors_raw,
            venue_raw,
            detail_path,
        });
    }

    Ok(articles)
}

pub fn parse_detail(html: &str) -> Result<ArticleDetail> {
    let field_cell = selector("div.gsc_oci_field")?;
    let value_cell = selector("div.gsc_oci_value")?;
    let title_link = selector("a.gsc_oci_title_link")?;

    let document = Html::parse_document(html);
    let mut detail = ArticleDetail::default();

    let fields = document
        .select(&field_cell)
        .map(|element| element_text(&element).to_lowercase());
    let values = document.select(&value_cell).map(|element| element_text(&element));

    for (field, value) in fields.zip(values) {
        if value.is_empty() {
            continue;
        }
        match field.as_str() {
            "journal" | "conference" | "publisher" | "book" => {
                if detail.venue.is_none() {
                    detail.venue = Some(value);
                }
            }
            "volume" => detail.volume = Some(value),
            "issue" => detail.issue = Some(value),
            "pages" => detail.pages = Some(value),
            _ => {}
        }
    }

    detail.article_url = document
        .select(&title_link)
        .next()
        .and_then(|link| link.value().attr("href").map(ToOwned::to_owned));

    Ok(detail)
}

pub fn split_author_field(raw: &str) -> Vec<String> {
    let separator = if raw.contains(" and ") { " and " } else { ", " };

    raw.split(separator)
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

pub fn format_author_name(raw: &str) -> String {
    let parts = raw.split_whitespace().collect::<Vec<&str>>();

    match parts.as_slice() {
        [] => String::new(),
        [single] => (*single).to_string(),
        [given @ .., family] => {
            let initials = given
                .iter()
                .filter_map(|part| part.chars().next())
                .map(|initial| format!("{initial}."))
                .collect::<String>();
            format!("{family}, {initials}")
        }
    }
}

pub fn into_record(
    article: &ScholarArticle,
    detail: Option<&ArticleDetail>,
    owner: &str,
) -> PublicationRecord {
    let authors = split_author_field(&article.authors_raw)
        .iter()
        .map(|raw| {
            let name = format_author_name(raw);
            let highlighted = owner_matches(owner, &name);
            Author { name, highlighted }
        })
        .collect::<Vec<Author>>();

    let venue = detail
        .and_then(|fetched| fetched.venue.clone())
        .unwrap_or_else(|| listing_venue(&article.venue_raw));

    let kind = if article.title.to_lowercase().contains("thesis")
        || venue.to_lowercase().contains("thesis")
    {
        PublicationKind::Thesis
    } else {
        PublicationKind::Journal
    };

    PublicationRecord {
        authors,
        year: article.year,
        title: article.title.clone(),
        venue,
        volume: detail.and_then(|fetched| fetched.volume.clone()),
        issue: detail.and_then(|fetched| fetched.issue.clone()),
        pages: detail.and_then(|fetched| fetched.pages.clone()),
        doi_url: detail.and_then(|fetched| fetched.article_url.clone()),
        kind,
    }
}

fn listing_venue(raw: &str) -> String {
    let trimmed = raw.trim();
    let cut = trimmed
        .find(|c: char| c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    let head = trimmed[..cut].trim_end_matches([' ', ',']);

    if head.is_empty() {
        trimmed.to_string()
    } else {
        head.to_string()
    }
}
