use std::collections::HashSet;

use tracing::info;

#[derive(Debug, Default)]
pub struct TitleIndex {
    titles: HashSet<String>,
}

impl TitleIndex {
    pub fn from_titles<I, S>(titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            titles: titles.into_iter().map(Into::into).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }

    pub fn admit(&mut self, title: &str) -> bool {
        if self.titles.contains(title) {
            info!(title = %title, "publication already present, skipping");
            return false;
        }

        self.titles.insert(title.to_string());
        true
    }
}
