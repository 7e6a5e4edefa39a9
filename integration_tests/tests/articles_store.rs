use chrono::{TimeZone, Utc};
use outbreak_core::{ArticleDraft, ArticleShelf, JsonFileStore, KeyValueStore, ARTICLES_KEY};

#[test]
fn articles_survive_reopening_the_file_store() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("store.json");
    let now = Utc.with_ymd_and_hms(2025, 10, 24, 9, 30, 0).unwrap();

    let mut shelf = ArticleShelf::open(JsonFileStore::open(&path)?)?;
    let id = shelf.add(
        ArticleDraft {
            title: "Dengue season".to_string(),
            tag: "Infectious".to_string(),
            key_points: "nets, repellent".to_string(),
            views: 12,
            ..ArticleDraft::new(now)
        },
        now,
    )?;
    assert!(shelf.remove("sample-2")?);

    let reopened = ArticleShelf::open(JsonFileStore::open(&path)?)?;
    let ids: Vec<&str> = reopened.list().iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, vec![id.as_str(), "sample-1"]);
    assert_eq!(reopened.totals().views, 1234 + 12);

    let raw = JsonFileStore::open(&path)?
        .get(ARTICLES_KEY)?
        .expect("articles should be stored");
    let stored: serde_json::Value = serde_json::from_str(&raw)?;
    assert_eq!(stored[0]["keyPoints"], serde_json::json!(["nets", "repellent"]));
    assert_eq!(stored[0]["image"], "/Virus.svg");
    Ok(())
}

#[test]
fn malformed_articles_value_falls_back_to_samples() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("store.json");
    let mut store = JsonFileStore::open(&path)?;
    store.set(ARTICLES_KEY, "{\"not\": \"a list\"}".to_string())?;

    let shelf = ArticleShelf::open(JsonFileStore::open(&path)?)?;
    assert_eq!(shelf.list().len(), 2);
    assert_eq!(shelf.totals().average_views, 1107);
    Ok(())
}
