mod support;

use std::sync::Arc;
use rust_decimal::Decimal;
use support::{harness, harness_with, BrokenFactory, FakeRemote};
use woo_catalog_sync::domain::aggregates::CANCELLED_BY_USER;
use woo_catalog_sync::domain::value_objects::{ErrorCategory, ImportKind, ImportStatus, ProductType, ShopStatus};
use woo_catalog_sync::import::ImportSource;
use woo_catalog_sync::remote::RemoteError;
use woo_catalog_sync::CatalogError;

fn csv(text: &str) -> ImportSource { ImportSource::Csv(text.as_bytes().to_vec()) }

#[tokio::test]
async fn test_parent_import_creates_then_updates() {
    let h = harness();
    let id = h.service
        .run_import(h.shop.id, ImportKind::Parent, "products.csv", csv("sku,post_title,regular_price,tax_product_cat\nW-100,Widget,9.99,Tools|Hardware\n"))
        .await
        .unwrap();

    let batch = h.store.batch(id);
    assert_eq!(batch.status, ImportStatus::Completed);
    assert_eq!((batch.counters.total_rows, batch.counters.processed_rows, batch.counters.successful_rows, batch.counters.error_rows), (1, 1, 1, 0));
    assert!(batch.completed_at.is_some());

    let mirrored = h.store.products(h.shop.id);
    assert_eq!(mirrored.len(), 1);
    assert_eq!(mirrored[0].sku(), Some("W-100"));
    assert_eq!(mirrored[0].fields.regular_price, Some(Decimal::new(999, 2)));
    assert_eq!(mirrored[0].fields.categories.len(), 2);
    let remote_id = mirrored[0].remote_id;

    h.service
        .run_import(h.shop.id, ImportKind::Parent, "products.csv", csv("sku,post_title,regular_price\nW-100,Widget,12.50\n"))
        .await
        .unwrap();

    let mirrored = h.store.products(h.shop.id);
    assert_eq!(mirrored.len(), 1, "re-import must update, not duplicate");
    assert_eq!(mirrored[0].remote_id, remote_id);
    assert_eq!(mirrored[0].fields.regular_price, Some(Decimal::new(1250, 2)));
    assert!(h.remote.calls().contains(&format!("PUT /products/{remote_id} sku=W-100")));
}

#[tokio::test]
async fn test_failing_rows_do_not_stop_the_batch() {
    let h = harness();
    h.remote.state().reject_skus.insert("A-3".into());
    let id = h.service
        .run_import(h.shop.id, ImportKind::Parent, "products.csv", csv("sku,post_title,regular_price\nA-1,First,1\nA-2,,2\nA-3,Third,3\n"))
        .await
        .unwrap();

    let batch = h.store.batch(id);
    assert_eq!(batch.status, ImportStatus::Completed);
    assert_eq!((batch.counters.processed_rows, batch.counters.successful_rows, batch.counters.error_rows), (3, 1, 2));
    assert_eq!(batch.errors.len(), 2);

    let errors = h.store.import_errors(id);
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0].row_number, 2);
    assert_eq!(errors[0].category, ErrorCategory::Validation);
    assert_eq!(errors[0].message, "post_title is required");
    assert_eq!(errors[0].row_data["sku"], "A-2");
    assert_eq!(errors[1].row_number, 3);
    assert_eq!(errors[1].sku.as_deref(), Some("A-3"));
    assert_eq!(errors[1].category, ErrorCategory::WooCommerce);

    assert_eq!(h.store.products(h.shop.id).len(), 1);
}

#[tokio::test]
async fn test_counters_stay_consistent_in_every_commit() {
    let h = harness();
    h.remote.state().reject_skus.insert("C-2".into());
    let rows = "sku,post_title\nC-1,a\nC-2,b\nC-3,c\n,d\nC-5,e\n";
    let id = h.service.run_import(h.shop.id, ImportKind::Parent, "products.csv", csv(rows)).await.unwrap();

    let snapshots = h.store.snapshots();
    assert!(snapshots.len() >= 4);
    let mut last_processed = 0;
    for (_, counters) in &snapshots {
        assert!(counters.is_consistent(), "{counters:?}");
        assert!(counters.processed_rows >= last_processed);
        last_processed = counters.processed_rows;
    }
    assert!(snapshots[..snapshots.len() - 1].iter().all(|(status, _)| *status == ImportStatus::Processing));
    let (status, final_counters) = snapshots.last().copied().unwrap();
    assert_eq!(status, ImportStatus::Completed);
    assert_eq!(final_counters.total_rows, 5);
    assert_eq!(final_counters.error_rows, 2);
    assert_eq!(h.store.import_errors(id).len(), 2);
}

#[tokio::test]
async fn test_variation_import() {
    let h = harness();
    h.service
        .run_import(h.shop.id, ImportKind::Parent, "parents.csv", csv("sku,post_title,tax_product_type\nTS-1,Tee,variable\n"))
        .await
        .unwrap();
    let parent = h.store.products(h.shop.id).remove(0);
    assert_eq!(parent.fields.product_type, ProductType::Variable);

    let id = h.service
        .run_import(
            h.shop.id,
            ImportKind::Variations,
            "variations.csv",
            csv("parent_sku,sku,regular_price,meta_attribute_Size\nTS-1,TS-1-S,5,S\nTS-1,TS-1-M,5,M\nNOPE,X-1,5,S\n"),
        )
        .await
        .unwrap();

    let batch = h.store.batch(id);
    assert_eq!((batch.counters.successful_rows, batch.counters.error_rows), (2, 1));
    let errors = h.store.import_errors(id);
    assert_eq!(errors[0].message, "Parent product not found: NOPE");
    assert_eq!(errors[0].category, ErrorCategory::Validation);

    let variations = h.store.variations(h.shop.id);
    assert_eq!(variations.len(), 2);
    assert!(variations.iter().all(|v| v.product_id == parent.id && v.remote_parent_id == parent.remote_id));
    let small = variations.iter().find(|v| v.sku() == Some("TS-1-S")).unwrap();
    assert_eq!(small.fields.attributes[0].option, "S");

    h.service
        .run_import(h.shop.id, ImportKind::Variations, "variations.csv", csv("parent_sku,sku,regular_price\nTS-1,TS-1-S,6\n"))
        .await
        .unwrap();
    let expected = format!("PUT /products/{}/variations/{} sku=TS-1-S", parent.remote_id, small.remote_id);
    assert!(h.remote.calls().contains(&expected));
    assert_eq!(h.store.variations(h.shop.id).len(), 2);
    let updated = h.store.variations(h.shop.id).into_iter().find(|v| v.sku() == Some("TS-1-S")).unwrap();
    assert_eq!(updated.fields.regular_price, Some(Decimal::new(6, 0)));
}

#[tokio::test]
async fn test_unreadable_file_fails_the_batch() {
    let h = harness();
    let id = h.service
        .run_import(h.shop.id, ImportKind::Parent, "broken.csv", ImportSource::Csv(b"sku,post_title\n\xff\xfe,x\n".to_vec()))
        .await
        .unwrap();

    let batch = h.store.batch(id);
    assert_eq!(batch.status, ImportStatus::Failed);
    assert_eq!(batch.errors.len(), 1);
    assert!(batch.errors[0].message.starts_with("Could not parse import file"));
    assert_eq!(h.remote.calls(), vec!["GET /system_status".to_string()]);
}

#[tokio::test]
async fn test_cancel_stops_at_next_chunk() {
    let h = harness();
    let batch = h.service.start_import(h.shop.id, ImportKind::Parent, "products.csv", None).await.unwrap();
    let (store, batch_id) = (h.store.clone(), batch.id());
    h.remote.state().on_write = Some(Arc::new(move |sku: &str| {
        if sku == "R-3" { store.cancel_now(batch_id); }
    }));

    let done = h.service
        .process_import(batch_id, csv("sku,post_title\nR-1,a\nR-2,b\nR-3,c\nR-4,d\nR-5,e\n"))
        .await
        .unwrap();

    assert_eq!(done.status(), ImportStatus::Failed);
    assert_eq!(done.errors()[0].message, CANCELLED_BY_USER);
    assert_eq!(done.counters().processed_rows, 2);
    let calls = h.remote.calls();
    assert!(calls.iter().any(|c| c.ends_with("sku=R-4")), "the running chunk finishes");
    assert!(!calls.iter().any(|c| c.ends_with("sku=R-5")));
}

#[tokio::test]
async fn test_cancel_pending_and_finished_batches() {
    let h = harness();
    let pending = h.service.start_import(h.shop.id, ImportKind::Parent, "products.csv", Some(10)).await.unwrap();
    let cancelled = h.service.cancel_import(pending.id()).await.unwrap();
    assert_eq!(cancelled.status(), ImportStatus::Failed);
    assert_eq!(cancelled.errors()[0].message, CANCELLED_BY_USER);

    let result = h.service.process_import(pending.id(), csv("sku,post_title\nX-1,a\n")).await;
    assert!(matches!(result, Err(CatalogError::BatchState(_))));
    assert!(h.remote.calls().is_empty());

    let id = h.service.run_import(h.shop.id, ImportKind::Parent, "products.csv", csv("sku,post_title\nX-2,a\n")).await.unwrap();
    assert!(matches!(h.service.cancel_import(id).await, Err(CatalogError::BatchState(_))));
    assert!(matches!(h.service.cancel_import(uuid::Uuid::now_v7()).await, Err(CatalogError::BatchNotFound(_))));
}

#[tokio::test]
async fn test_sync_kind_is_not_a_file_import() {
    let h = harness();
    let result = h.service.start_import(h.shop.id, ImportKind::Sync, "x.csv", None).await;
    assert!(matches!(result, Err(CatalogError::Validation(_))));
    assert!(h.store.batches().is_empty());
}

#[tokio::test]
async fn test_offline_shop_fails_the_import_before_any_row() {
    let h = harness();
    h.remote.state().online = false;
    let batch = h.service.start_import(h.shop.id, ImportKind::Parent, "products.csv", None).await.unwrap();

    let result = h.service.process_import(batch.id(), csv("sku,post_title\nO-1,a\nO-2,b\n")).await;
    assert!(matches!(result, Err(CatalogError::Connectivity(id)) if id == h.shop.id));

    let stored = h.store.batch(batch.id());
    assert_eq!(stored.status, ImportStatus::Failed);
    assert_eq!(stored.errors.len(), 1);
    assert_eq!(stored.errors[0].message, format!("Could not connect to shop {}", h.shop.id));
    assert_eq!(stored.counters.processed_rows, 0);
    assert!(stored.completed_at.is_some());

    let shop = h.store.shop(h.shop.id);
    assert_eq!(shop.status, ShopStatus::Offline);
    assert!(shop.last_ping.is_some());
    assert_eq!(h.remote.calls(), vec!["GET /system_status".to_string()]);
    assert!(h.store.products(h.shop.id).is_empty());
}

#[tokio::test]
async fn test_unusable_credentials_fail_the_batch_instead_of_leaving_it_pending() {
    let h = harness_with(FakeRemote::default(), Arc::new(BrokenFactory));
    let batch = h.service.start_import(h.shop.id, ImportKind::Parent, "products.csv", None).await.unwrap();

    let result = h.service.process_import(batch.id(), csv("sku,post_title\nK-1,a\n")).await;
    assert!(matches!(result, Err(CatalogError::Remote(RemoteError::Config(_)))));

    let stored = h.store.batch(batch.id());
    assert_eq!(stored.status, ImportStatus::Failed);
    assert!(stored.errors[0].message.contains("bad consumer key for Main"), "{:?}", stored.errors);
    assert!(h.remote.calls().is_empty());

    let run = h.service.run_import(h.shop.id, ImportKind::Parent, "again.csv", csv("sku,post_title\nK-2,b\n")).await;
    assert!(run.is_err());
    assert!(h.store.batches().iter().all(|b| b.status == ImportStatus::Failed));
}

#[tokio::test]
async fn test_rejected_update_is_charged_to_its_row_only() {
    let h = harness();
    let rows = "sku,post_title,regular_price\nB-1,One,1\nB-2,Two,2\nB-3,Three,3\n";
    h.service.run_import(h.shop.id, ImportKind::Parent, "products.csv", csv(rows)).await.unwrap();
    let before = h.store.products(h.shop.id).into_iter().find(|p| p.sku() == Some("B-2")).unwrap();

    h.remote.state().reject_skus.insert("B-2".into());
    let id = h.service
        .run_import(h.shop.id, ImportKind::Parent, "products.csv", csv("sku,post_title,regular_price\nB-1,One,10\nB-2,Two,20\nB-3,Three,30\n"))
        .await
        .unwrap();

    let batch = h.store.batch(id);
    assert_eq!(batch.status, ImportStatus::Completed);
    assert_eq!((batch.counters.successful_rows, batch.counters.error_rows), (2, 1));

    let errors = h.store.import_errors(id);
    assert_eq!(errors.len(), 1);
    assert_eq!((errors[0].row_number, errors[0].category), (2, ErrorCategory::WooCommerce));
    assert_eq!(errors[0].message, "WooCommerce responded 400: Invalid or duplicated SKU: B-2");
    assert!(h.remote.calls().contains(&format!("PUT /products/{} sku=B-2", before.remote_id)));

    let prices: Vec<_> = ["B-1", "B-2", "B-3"]
        .iter()
        .map(|sku| h.store.products(h.shop.id).into_iter().find(|p| p.sku() == Some(*sku)).unwrap().fields.regular_price)
        .collect();
    assert_eq!(prices, vec![Some(Decimal::new(10, 0)), Some(Decimal::new(2, 0)), Some(Decimal::new(30, 0))]);
}
