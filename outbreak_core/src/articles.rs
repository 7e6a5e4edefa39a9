//! Health articles kept in per-user storage under [`ARTICLES_KEY`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::storage::{load_json, save_json, KeyValueStore, StorageError};

pub const ARTICLES_KEY: &str = "healthsight_articles";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Article {
    pub id: String,
    pub tag: String,
    pub title: String,
    pub author: String,
    /// Display date as entered, e.g. `20/10/2025`.
    pub date: String,
    pub views: u64,
    pub excerpt: String,
    pub content: String,
    pub key_points: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Editable fields of an article. Key points are entered as one
/// comma-separated string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleDraft {
    pub tag: String,
    pub title: String,
    pub author: String,
    pub date: String,
    pub views: u64,
    pub excerpt: String,
    pub content: String,
    pub key_points: String,
    pub image: Option<String>,
}

impl ArticleDraft {
    /// Blank draft dated `today`.
    pub fn new(today: DateTime<Utc>) -> Self {
        Self {
            date: today.format("%d/%m/%Y").to_string(),
            ..Self::default()
        }
    }

    pub fn from_article(article: &Article) -> Self {
        Self {
            tag: article.tag.clone(),
            title: article.title.clone(),
            author: article.author.clone(),
            date: article.date.clone(),
            views: article.views,
            excerpt: article.excerpt.clone(),
            content: article.content.clone(),
            key_points: article.key_points.join(", "),
            image: article.image.clone(),
        }
    }

    fn apply_to(self, article: &mut Article) {
        let image = self
            .image
            .filter(|image| !image.is_empty())
            .or_else(|| image_for_tag(&self.tag).map(str::to_string));
        article.key_points = parse_key_points(&self.key_points);
        article.tag = self.tag;
        article.title = self.title;
        article.author = self.author;
        article.date = self.date;
        article.views = self.views;
        article.excerpt = self.excerpt;
        article.content = self.content;
        article.image = image;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArticleTotals {
    pub total: usize,
    pub views: u64,
    /// Mean views per article, rounded half up.
    pub average_views: u64,
}

/// Articles plus a wrapping carousel cursor, persisted on every change.
pub struct ArticleShelf<S: KeyValueStore> {
    store: S,
    articles: Vec<Article>,
    cursor: usize,
}

impl<S: KeyValueStore> ArticleShelf<S> {
    /// Load stored articles, or the sample set when nothing usable is stored.
    pub fn open(store: S) -> Result<Self, StorageError> {
        let articles = match load_json::<Vec<Article>, _>(&store, ARTICLES_KEY)? {
            Some(articles) => articles,
            None => sample_articles(),
        };
        info!(target: "outbreak::articles", count = articles.len(), "articles.loaded");
        Ok(Self {
            store,
            articles,
            cursor: 0,
        })
    }

    pub fn list(&self) -> &[Article] {
        &self.articles
    }

    pub fn get(&self, id: &str) -> Option<&Article> {
        self.articles.iter().find(|article| article.id == id)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Insert a new article at the front and return its id.
    pub fn add(&mut self, draft: ArticleDraft, now: DateTime<Utc>) -> Result<String, StorageError> {
        let title = if draft.title.trim().is_empty() {
            "article"
        } else {
            draft.title.as_str()
        };
        let id = make_id(title, now);
        let mut article = Article {
            id: id.clone(),
            ..Article::default()
        };
        draft.apply_to(&mut article);
        self.articles.insert(0, article);
        self.persist()?;
        info!(target: "outbreak::articles", id = %id, "articles.added");
        Ok(id)
    }

    /// Overwrite the editable fields of `id`. Returns whether it existed.
    pub fn update(&mut self, id: &str, draft: ArticleDraft) -> Result<bool, StorageError> {
        let Some(article) = self.articles.iter_mut().find(|article| article.id == id) else {
            return Ok(false);
        };
        draft.apply_to(article);
        self.persist()?;
        info!(target: "outbreak::articles", id, "articles.updated");
        Ok(true)
    }

    pub fn remove(&mut self, id: &str) -> Result<bool, StorageError> {
        let before = self.articles.len();
        self.articles.retain(|article| article.id != id);
        if self.articles.len() == before {
            return Ok(false);
        }
        if self.cursor >= self.articles.len() {
            self.cursor = 0;
        }
        self.persist()?;
        info!(target: "outbreak::articles", id, "articles.removed");
        Ok(true)
    }

    pub fn totals(&self) -> ArticleTotals {
        let total = self.articles.len();
        let views: u64 = self.articles.iter().map(|article| article.views).sum();
        let divisor = total.max(1) as u64;
        ArticleTotals {
            total,
            views,
            average_views: (views + divisor / 2) / divisor,
        }
    }

    pub fn current(&self) -> Option<&Article> {
        self.articles.get(self.cursor)
    }

    pub fn next(&mut self) -> Option<&Article> {
        if !self.articles.is_empty() {
            self.cursor = (self.cursor + 1) % self.articles.len();
        }
        self.current()
    }

    pub fn prev(&mut self) -> Option<&Article> {
        if !self.articles.is_empty() {
            let len = self.articles.len();
            self.cursor = (self.cursor + len - 1) % len;
        }
        self.current()
    }

    fn persist(&mut self) -> Result<(), StorageError> {
        save_json(&mut self.store, ARTICLES_KEY, &self.articles)
    }
}

/// Split a comma-separated list, trimming entries and dropping empty ones.
pub fn parse_key_points(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|point| !point.is_empty())
        .map(str::to_string)
        .collect()
}

/// Illustration for an article tag, matched by keyword.
pub fn image_for_tag(tag: &str) -> Option<&'static str> {
    let tag = tag.to_lowercase();
    if tag.is_empty() {
        None
    } else if tag.contains("diabetes") {
        Some("/Diabetes.svg")
    } else if tag.contains("heart") || tag.contains("cardio") {
        Some("/Heart.svg")
    } else if ["infect", "cholera", "disease"].iter().any(|k| tag.contains(k)) {
        Some("/Virus.svg")
    } else if tag.contains("exercise") {
        Some("/power.svg")
    } else {
        None
    }
}

/// `title` slugified (lowercase ASCII alphanumerics joined by `-`) plus a
/// millisecond timestamp.
pub fn make_id(title: &str, now: DateTime<Utc>) -> String {
    let mut slug = String::with_capacity(title.len());
    for ch in title.to_lowercase().chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            slug.push(ch);
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_matches('-');
    format!("{slug}-{}", now.timestamp_millis())
}

fn sample_articles() -> Vec<Article> {
    vec![
        Article {
            id: "sample-1".to_string(),
            tag: "Infectious".to_string(),
            title: "Understanding Cholera: Prevention and Treatment".to_string(),
            author: "Dr. Sarah Ahmed".to_string(),
            date: "10/20/2025".to_string(),
            views: 1234,
            excerpt: "Cholera is an acute diarrheal illness caused by infection of the intestine. \
                      Learn about prevention methods and ..."
                .to_string(),
            content: "Full content".to_string(),
            key_points: Vec::new(),
            image: None,
        },
        Article {
            id: "sample-2".to_string(),
            tag: "Public Health".to_string(),
            title: "Vaccination Basics".to_string(),
            author: "Dr. Ali".to_string(),
            date: "09/10/2025".to_string(),
            views: 980,
            excerpt: "Why immunization is important.".to_string(),
            content: "Full content".to_string(),
            key_points: Vec::new(),
            image: None,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 24, 12, 0, 0).unwrap()
    }

    fn draft(title: &str, tag: &str) -> ArticleDraft {
        ArticleDraft {
            title: title.to_string(),
            tag: tag.to_string(),
            key_points: " wash hands, , boil water ".to_string(),
            ..ArticleDraft::new(now())
        }
    }

    #[test]
    fn empty_store_opens_with_samples() {
        let shelf = ArticleShelf::open(MemoryStore::new()).unwrap();
        assert_eq!(shelf.list().len(), 2);
        let totals = shelf.totals();
        assert_eq!(totals.views, 2214);
        assert_eq!(totals.average_views, 1107);
    }

    #[test]
    fn malformed_store_falls_back_to_samples() {
        let mut store = MemoryStore::new();
        store.set(ARTICLES_KEY, "{ nope".to_string()).unwrap();
        let shelf = ArticleShelf::open(store).unwrap();
        assert_eq!(shelf.list()[0].id, "sample-1");
    }

    #[test]
    fn add_prepends_and_persists() {
        let mut shelf = ArticleShelf::open(MemoryStore::new()).unwrap();
        let id = shelf.add(draft("Cholera: What to Know!", "Infectious disease"), now()).unwrap();

        assert_eq!(id, format!("cholera-what-to-know-{}", now().timestamp_millis()));
        let first = &shelf.list()[0];
        assert_eq!(first.id, id);
        assert_eq!(first.key_points, vec!["wash hands", "boil water"]);
        assert_eq!(first.image.as_deref(), Some("/Virus.svg"));
        assert_eq!(first.date, "24/10/2025");

        let reopened = ArticleShelf::open(shelf.store().clone()).unwrap();
        assert_eq!(reopened.list().len(), 3);
    }

    #[test]
    fn update_and_remove_report_missing_ids() {
        let mut shelf = ArticleShelf::open(MemoryStore::new()).unwrap();
        let mut edit = ArticleDraft::from_article(&shelf.list()[1]);
        edit.views = 1000;
        assert!(shelf.update("sample-2", edit.clone()).unwrap());
        assert_eq!(shelf.get("sample-2").map(|a| a.views), Some(1000));
        assert!(!shelf.update("missing", edit).unwrap());

        assert!(shelf.remove("sample-1").unwrap());
        assert!(!shelf.remove("sample-1").unwrap());
        assert_eq!(shelf.totals().total, 1);
    }

    #[test]
    fn carousel_wraps_both_ways() {
        let mut shelf = ArticleShelf::open(MemoryStore::new()).unwrap();
        assert_eq!(shelf.current().map(|a| a.id.as_str()), Some("sample-1"));
        assert_eq!(shelf.prev().map(|a| a.id.as_str()), Some("sample-2"));
        assert_eq!(shelf.next().map(|a| a.id.as_str()), Some("sample-1"));
    }

    #[test]
    fn tag_images_match_keywords() {
        assert_eq!(image_for_tag("Diabetes care"), Some("/Diabetes.svg"));
        assert_eq!(image_for_tag("Cardiology"), Some("/Heart.svg"));
        assert_eq!(image_for_tag("Exercise"), Some("/power.svg"));
        assert_eq!(image_for_tag("Public Health"), None);
        assert_eq!(image_for_tag(""), None);
    }

    #[test]
    fn empty_shelf_totals_are_zero() {
        let mut store = MemoryStore::new();
        store.set(ARTICLES_KEY, "[]".to_string()).unwrap();
        let mut shelf = ArticleShelf::open(store).unwrap();
        assert_eq!(shelf.totals(), ArticleTotals::default());
        assert_eq!(shelf.next(), None);
    }
}
