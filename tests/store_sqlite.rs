// tests/store_sqlite.rs
use chrono::{Duration, Utc};

use hotspot_crawler::store::{HotspotStore, NewHotspot, SqliteStore};

fn row(source: &str, rank: i64, at: chrono::DateTime<Utc>) -> NewHotspot {
    NewHotspot {
        source: source.to_string(),
        title: format!("{source} item {rank}"),
        url: format!("https://example.test/{source}/{rank}"),
        rank,
        hot_value: format!("{}", 1000 * rank),
        created_at: at,
    }
}

async fn seeded() -> (SqliteStore, Vec<i64>) {
    let store = SqliteStore::in_memory().await.expect("sqlite");
    let earlier = Utc::now() - Duration::minutes(30);
    let later = Utc::now();

    let mut ids = Vec::new();
    let mut batch = store.begin_batch().await.unwrap();
    for rec in [
        row("微博热搜", 1, earlier),
        row("微博热搜", 2, earlier),
        row("知乎热榜", 1, later),
        row("微博热搜", 1, later),
    ] {
        ids.push(batch.insert(&rec).await.unwrap());
    }
    batch.commit().await.unwrap();
    (store, ids)
}

#[tokio::test]
async fn list_is_newest_first_and_filters_by_source() {
    let (store, ids) = seeded().await;

    let all = store.list(None, 50).await.unwrap();
    assert_eq!(all.len(), 4);
    assert!(all.windows(2).all(|w| w[0].created_at >= w[1].created_at));
    assert_eq!(all[0].id, ids[3]);

    let weibo = store.list(Some("微博热搜"), 50).await.unwrap();
    assert_eq!(weibo.len(), 3);
    assert!(weibo.iter().all(|r| r.source == "微博热搜"));

    assert_eq!(store.list(None, 2).await.unwrap().len(), 2);
    assert!(store.list(Some("nope"), 50).await.unwrap().is_empty());
}

#[tokio::test]
async fn stored_fields_round_trip() {
    let (store, ids) = seeded().await;
    let rec = store.get(ids[1]).await.unwrap().expect("present");
    assert_eq!(rec.source, "微博热搜");
    assert_eq!(rec.rank, 2);
    assert_eq!(rec.hot_value, "2000");
    assert_eq!(rec.url, "https://example.test/微博热搜/2");
    assert!(rec.content.is_none() && rec.media_paths.is_none() && rec.summary.is_none());
    assert!(store.get(9_999).await.unwrap().is_none());
}

#[tokio::test]
async fn sources_are_distinct() {
    let (store, _) = seeded().await;
    let mut sources = store.sources().await.unwrap();
    sources.sort();
    assert_eq!(sources, vec!["微博热搜".to_string(), "知乎热榜".to_string()]);
}

#[tokio::test]
async fn delete_and_delete_many() {
    let (store, ids) = seeded().await;

    assert!(store.delete(ids[0]).await.unwrap());
    assert!(!store.delete(ids[0]).await.unwrap(), "second delete is a miss");

    let removed = store.delete_many(&[ids[1], ids[2], 12_345]).await.unwrap();
    assert_eq!(removed, 2);
    assert_eq!(store.delete_many(&[]).await.unwrap(), 0);

    let left = store.list(None, 50).await.unwrap();
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].id, ids[3]);
}

#[tokio::test]
async fn update_enrichment_patches_only_that_row() {
    let (store, ids) = seeded().await;

    let ok = store
        .update_enrichment(
            ids[2],
            "body text",
            Some("/static/screenshots/screenshot_1.png"),
            "summary",
        )
        .await
        .unwrap();
    assert!(ok);

    let rec = store.get(ids[2]).await.unwrap().unwrap();
    assert_eq!(rec.content.as_deref(), Some("body text"));
    assert_eq!(
        rec.media_paths.as_deref(),
        Some("/static/screenshots/screenshot_1.png")
    );
    assert_eq!(rec.summary.as_deref(), Some("summary"));
    assert_eq!(rec.title, "知乎热榜 item 1");

    let untouched = store.get(ids[3]).await.unwrap().unwrap();
    assert!(untouched.content.is_none());

    assert!(!store
        .update_enrichment(424_242, "x", None, "y")
        .await
        .unwrap());
}

#[tokio::test]
async fn file_database_persists_across_connections() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite:{}?mode=rwc", dir.path().join("hot.db").display());

    {
        let store = SqliteStore::connect(&url).await.unwrap();
        let mut batch = store.begin_batch().await.unwrap();
        batch.insert(&row("百度热搜", 1, Utc::now())).await.unwrap();
        batch.commit().await.unwrap();
    }

    let reopened = SqliteStore::connect(&url).await.unwrap();
    let rows = reopened.list(None, 10).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].source, "百度热搜");
}
