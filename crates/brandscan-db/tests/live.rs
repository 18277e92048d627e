//! Live integration tests for brandscan-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database spun up by the
//! sqlx test harness. They need `DATABASE_URL` pointing at a server the
//! harness can create databases on, so they are ignored by default:
//! `cargo test -p brandscan-db -- --ignored`.

use brandscan_core::{
    AnalysisResult, ItemKind, ProspectConfig, ProspectStatus, ScrapedItem, SentimentBreakdown,
};
use brandscan_db::{
    bulk_insert_items, count_items_for_prospect, get_prospect_by_name, insert_analysis_result,
    insert_discovered_urls, latest_analysis_result, list_analysis_results, list_discovered_urls,
    list_items_for_prospect, list_prospects, mark_urls_processed, seed_prospects,
    set_prospect_status, upsert_prospect, DbError,
};
use chrono::Utc;

fn urls(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|u| (*u).to_string()).collect()
}

fn make_item(prospect_id: i64, source_url: &str, n: usize) -> ScrapedItem {
    ScrapedItem {
        source_url: source_url.to_string(),
        kind: if n == 0 {
            ItemKind::Post
        } else {
            ItemKind::Comment
        },
        external_id: Some(format!("id-{n}")),
        parent_external_id: (n > 0).then(|| "id-0".to_string()),
        author: Some(format!("user{n}")),
        community: Some("r/acme".to_string()),
        score: 1,
        reply_count: 0,
        created_at: Some(Utc::now()),
        text: format!("Acme item number {n} with enough text to matter"),
        brand_name: "Acme".to_string(),
        prospect_id,
    }
}

// ---------------------------------------------------------------------------
// Prospects
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn upsert_prospect_is_get_or_create(pool: sqlx::PgPool) {
    let first = upsert_prospect(&pool, "Acme", Some("Tools"), None, None)
        .await
        .expect("first upsert failed");
    let second = upsert_prospect(&pool, "  acme ", None, None, None)
        .await
        .expect("second upsert failed");

    assert_eq!(first.id, second.id);
    assert_eq!(second.industry_category.as_deref(), Some("Tools"));
    assert_eq!(second.status, "pending");

    let fetched = get_prospect_by_name(&pool, "ACME")
        .await
        .expect("lookup failed")
        .expect("prospect should exist");
    assert_eq!(fetched.id, first.id);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn set_prospect_status_records_and_clears_error(pool: sqlx::PgPool) {
    let row = upsert_prospect(&pool, "Acme", None, None, None)
        .await
        .expect("upsert failed");

    set_prospect_status(&pool, row.id, ProspectStatus::Failed, Some("no sources found"))
        .await
        .expect("set failed");
    let failed = get_prospect_by_name(&pool, "Acme").await.unwrap().unwrap();
    assert_eq!(failed.status, "failed");
    assert_eq!(failed.last_error.as_deref(), Some("no sources found"));

    set_prospect_status(&pool, row.id, ProspectStatus::Done, None)
        .await
        .expect("set done failed");
    let done = get_prospect_by_name(&pool, "Acme").await.unwrap().unwrap();
    assert_eq!(done.status, "done");
    assert!(done.last_error.is_none());
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn set_prospect_status_unknown_id_is_not_found(pool: sqlx::PgPool) {
    let err = set_prospect_status(&pool, 999_999, ProspectStatus::Done, None)
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::NotFound));
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn seed_prospects_is_repeatable(pool: sqlx::PgPool) {
    let seed = vec![
        ProspectConfig {
            brand_name: "Acme".to_string(),
            industry_category: Some("Tools".to_string()),
            website: None,
            notes: None,
        },
        ProspectConfig {
            brand_name: "Globex".to_string(),
            industry_category: None,
            website: Some("https://globex.example".to_string()),
            notes: None,
        },
    ];

    assert_eq!(seed_prospects(&pool, &seed).await.unwrap(), 2);
    assert_eq!(seed_prospects(&pool, &seed).await.unwrap(), 2);

    let all = list_prospects(&pool).await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].brand_name, "Acme");
}

// ---------------------------------------------------------------------------
// Discovered URLs
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn discovering_twice_never_duplicates_urls(pool: sqlx::PgPool) {
    let prospect = upsert_prospect(&pool, "Acme", None, None, None).await.unwrap();
    let found = urls(&[
        "https://www.reddit.com/r/acme/1",
        "https://www.reddit.com/r/acme/2",
    ]);

    assert_eq!(insert_discovered_urls(&pool, prospect.id, &found).await.unwrap(), 2);
    assert_eq!(insert_discovered_urls(&pool, prospect.id, &found).await.unwrap(), 0);

    let stored = list_discovered_urls(&pool, prospect.id, false).await.unwrap();
    let stored: Vec<_> = stored.into_iter().map(|r| r.url).collect();
    assert_eq!(stored, found);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn mark_urls_processed_is_idempotent(pool: sqlx::PgPool) {
    let prospect = upsert_prospect(&pool, "Acme", None, None, None).await.unwrap();
    let found = urls(&[
        "https://www.reddit.com/r/acme/1",
        "https://www.reddit.com/r/acme/2",
    ]);
    insert_discovered_urls(&pool, prospect.id, &found).await.unwrap();

    let first = urls(&["https://www.reddit.com/r/acme/1"]);
    assert_eq!(mark_urls_processed(&pool, prospect.id, &first).await.unwrap(), 1);
    assert_eq!(mark_urls_processed(&pool, prospect.id, &first).await.unwrap(), 0);

    let pending = list_discovered_urls(&pool, prospect.id, true).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].url, "https://www.reddit.com/r/acme/2");
}

// ---------------------------------------------------------------------------
// Scraped items
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn bulk_insert_chunks_and_skips_repeats(pool: sqlx::PgPool) {
    let prospect = upsert_prospect(&pool, "Acme", None, None, None).await.unwrap();
    let items: Vec<_> = (0..7)
        .map(|n| make_item(prospect.id, "https://www.reddit.com/r/acme/1", n))
        .collect();

    assert_eq!(bulk_insert_items(&pool, &items, 3).await.unwrap(), 7);
    assert_eq!(bulk_insert_items(&pool, &items, 3).await.unwrap(), 0);
    assert_eq!(count_items_for_prospect(&pool, prospect.id).await.unwrap(), 7);

    let stored = list_items_for_prospect(&pool, prospect.id).await.unwrap();
    let first = stored[0].clone().into_scraped_item().unwrap();
    assert_eq!(first.kind, ItemKind::Post);
    assert_eq!(first.text, items[0].text);
}

// ---------------------------------------------------------------------------
// Analysis results
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn analysis_results_are_append_only(pool: sqlx::PgPool) {
    let prospect = upsert_prospect(&pool, "Acme", None, None, None).await.unwrap();
    let mut result = AnalysisResult {
        prospect_id: prospect.id,
        key_insight: "first".to_string(),
        themes: vec!["pricing".to_string()],
        recommendations: vec!["lower prices".to_string()],
        sentiment: Some(SentimentBreakdown {
            positive: 40,
            negative: 35,
            neutral: 25,
        }),
        customer_segments: vec!["budget shoppers".to_string()],
        report: None,
        batch_count: 1,
        item_count: 7,
        generated_at: Utc::now(),
    };
    insert_analysis_result(&pool, &result).await.unwrap();

    result.key_insight = "second".to_string();
    result.generated_at = Utc::now();
    insert_analysis_result(&pool, &result).await.unwrap();

    let latest = latest_analysis_result(&pool, prospect.id)
        .await
        .unwrap()
        .expect("result should exist");
    assert_eq!(latest.key_insight, "second");
    assert_eq!(latest.brand_name, "Acme");
    assert_eq!(latest.sentiment_negative, Some(35));
    assert_eq!(latest.customer_segments, vec!["budget shoppers"]);

    let history = list_analysis_results(&pool, Some(prospect.id), 10).await.unwrap();
    assert_eq!(history.len(), 2);
}
