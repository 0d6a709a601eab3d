//! Listing, filtering, sorting and pagination against the in-memory store.

use assert_matches::assert_matches;
use chrono::Utc;
use procura_core::error::CoreError;
use procura_core::lifecycle::{self, NewRfp, RfpPatch};
use procura_core::query::{self, RfpCriteria, RfpListParams};
use procura_core::roles::Actor;
use procura_core::types::DbId;
use procura_db::MemoryStore;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn seed(store: &MemoryStore, vendor: DbId, title: &str, amount: f64, deadline: &str) -> DbId {
    let input = NewRfp {
        title: Some(title.into()),
        description: Some(format!("{title} for the new office")),
        amount: Some(amount),
        submission_deadline: Some(deadline.into()),
        status: None,
    };
    lifecycle::create(store, &Actor::vendor(vendor), input, Utc::now())
        .await
        .unwrap()
        .id
}

fn criteria(params: RfpListParams) -> RfpCriteria {
    RfpCriteria::from_params(params).unwrap()
}

async fn seeded_store() -> MemoryStore {
    let store = MemoryStore::new();
    seed(&store, 1, "Desks", 1000.0, "2025-01-10").await;
    seed(&store, 1, "Chairs", 250.0, "2025-02-10").await;
    seed(&store, 2, "Laptops", 9000.0, "2025-03-10").await;
    seed(&store, 2, "Monitors", 3000.0, "2025-04-10").await;
    seed(&store, 3, "100% recycled paper", 40.0, "2025-05-10").await;
    store
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_admin_sees_everything_vendor_sees_own() {
    let store = seeded_store().await;

    let all = query::list(&store, &Actor::admin(99), RfpCriteria::default())
        .await
        .unwrap();
    assert_eq!(all.pagination.total, 5);

    let own = query::list(&store, &Actor::vendor(2), RfpCriteria::default())
        .await
        .unwrap();
    assert_eq!(own.pagination.total, 2);
    assert!(own.items.iter().all(|r| r.vendor_id == 2));
}

#[tokio::test]
async fn test_vendor_cannot_widen_scope_with_vendor_param() {
    let store = seeded_store().await;
    let params = RfpListParams {
        vendor: Some(1),
        ..Default::default()
    };
    let page = query::list(&store, &Actor::vendor(2), criteria(params))
        .await
        .unwrap();
    assert!(!page.items.is_empty());
    assert!(page.items.iter().all(|r| r.vendor_id == 2));
}

#[tokio::test]
async fn test_admin_can_filter_by_vendor() {
    let store = seeded_store().await;
    let params = RfpListParams {
        vendor: Some(1),
        ..Default::default()
    };
    let page = query::list(&store, &Actor::admin(99), criteria(params))
        .await
        .unwrap();
    assert_eq!(page.pagination.total, 2);
}

#[tokio::test]
async fn test_default_order_is_newest_first() {
    let store = seeded_store().await;
    let page = query::list(&store, &Actor::admin(99), RfpCriteria::default())
        .await
        .unwrap();
    let ids: Vec<DbId> = page.items.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![5, 4, 3, 2, 1]);
}

#[tokio::test]
async fn test_sort_by_amount_ascending() {
    let store = seeded_store().await;
    let params = RfpListParams {
        sort_by: Some("amount".into()),
        sort_order: Some("asc".into()),
        ..Default::default()
    };
    let page = query::list(&store, &Actor::admin(99), criteria(params))
        .await
        .unwrap();
    let amounts: Vec<f64> = page.items.iter().map(|r| r.amount).collect();
    assert_eq!(amounts, vec![40.0, 250.0, 1000.0, 3000.0, 9000.0]);
}

#[tokio::test]
async fn test_amount_and_deadline_ranges_are_inclusive() {
    let store = seeded_store().await;
    let params = RfpListParams {
        min_amount: Some(250.0),
        max_amount: Some(3000.0),
        start_date: Some("2025-01-10".into()),
        end_date: Some("2025-03-10".into()),
        ..Default::default()
    };
    let page = query::list(&store, &Actor::admin(99), criteria(params))
        .await
        .unwrap();
    let mut titles: Vec<&str> = page.items.iter().map(|r| r.title.as_str()).collect();
    titles.sort_unstable();
    assert_eq!(titles, vec!["Chairs", "Desks"]);
}

#[tokio::test]
async fn test_status_filter_matches_exact_status() {
    let store = seeded_store().await;
    let admin = Actor::admin(99);
    lifecycle::update(
        &store,
        &admin,
        3,
        RfpPatch {
            status: Some("Awarded".into()),
            ..Default::default()
        },
        Utc::now(),
    )
    .await
    .unwrap();

    let params = RfpListParams {
        status: Some("Awarded".into()),
        ..Default::default()
    };
    let page = query::list(&store, &admin, criteria(params)).await.unwrap();
    assert_eq!(page.pagination.total, 1);
    assert_eq!(page.items[0].title, "Laptops");
}

#[tokio::test]
async fn test_search_is_case_insensitive_and_literal() {
    let store = seeded_store().await;
    let admin = Actor::admin(99);

    let params = RfpListParams {
        search: Some("DESK".into()),
        ..Default::default()
    };
    let page = query::list(&store, &admin, criteria(params)).await.unwrap();
    assert_eq!(page.pagination.total, 1);

    let params = RfpListParams {
        search: Some("100%".into()),
        ..Default::default()
    };
    let page = query::list(&store, &admin, criteria(params)).await.unwrap();
    assert_eq!(page.pagination.total, 1);
    assert_eq!(page.items[0].vendor_id, 3);
}

#[tokio::test]
async fn test_pagination_reports_total_and_pages() {
    let store = seeded_store().await;
    let params = RfpListParams {
        page: Some(2),
        limit: Some(2),
        ..Default::default()
    };
    let page = query::list(&store, &Actor::admin(99), criteria(params))
        .await
        .unwrap();
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.pagination.total, 5);
    assert_eq!(page.pagination.pages, 3);
    assert_eq!(page.pagination.page, 2);

    let params = RfpListParams {
        page: Some(10),
        limit: Some(2),
        ..Default::default()
    };
    let beyond = query::list(&store, &Actor::admin(99), criteria(params))
        .await
        .unwrap();
    assert!(beyond.items.is_empty());
    assert_eq!(beyond.pagination.total, 5);
}

#[tokio::test]
async fn test_list_for_vendor_checks_access() {
    let store = seeded_store().await;

    let page = query::list_for_vendor(&store, &Actor::vendor(1), 1, RfpCriteria::default())
        .await
        .unwrap();
    assert_eq!(page.pagination.total, 2);

    let page = query::list_for_vendor(&store, &Actor::admin(99), 2, RfpCriteria::default())
        .await
        .unwrap();
    assert_eq!(page.pagination.total, 2);

    assert_matches!(
        query::list_for_vendor(&store, &Actor::vendor(1), 2, RfpCriteria::default()).await,
        Err(CoreError::Forbidden(_))
    );
}
