//! Macro-generated test suite for `ItemStore` behaviour over a backend.
//!
//! The macro runs the item store against the given document collection with
//! an in-memory blob store, so every backend is checked for the same listing,
//! image lifecycle and legacy-record behaviour.
//!
//! # Usage
//!
//! ```rust,ignore
//! #[macro_use]
//! mod storage_harness;
//!
//! use storage_harness::*;
//!
//! item_store_tests!(Arc::new(InMemoryDocumentCollection::new()));
//! ```

/// Generate an `ItemStore` behaviour test suite.
///
/// `$factory` must evaluate to a fresh, empty `Arc<dyn DocumentCollection>`
/// (or a type coercing to it). It is re-evaluated for each test.
#[macro_export]
macro_rules! item_store_tests {
    ($factory:expr) => {
        mod item_store_behaviour_tests {
            use super::*;
            use std::sync::Arc;
            use storefront::core::error::{CatalogueError, ValidationError};
            use storefront::core::filter::FilterSelection;
            use storefront::core::item::{ClothingSize, ClothingType, ImageRef, ItemPatch};
            use storefront::core::service::{BlobStore, DocumentCollection};
            use storefront::core::store::{FilterStrategy, ItemStore};
            use storefront::storage::InMemoryBlobStore;

            const MISSING_ID: &str = "000000000000000000000000";

            async fn collection() -> Arc<dyn DocumentCollection> {
                $factory
            }

            async fn store() -> (ItemStore, InMemoryBlobStore) {
                let blobs = InMemoryBlobStore::new();
                let store = ItemStore::new(collection().await, Arc::new(blobs.clone()));
                (store, blobs)
            }

            async fn store_with_blobs(blobs: Arc<dyn BlobStore>) -> ItemStore {
                ItemStore::new(collection().await, blobs)
            }

            /// A mixed catalogue covering every filter dimension
            async fn seed(store: &ItemStore) {
                let items = [
                    fields_with("Oxford Shirt", 8999, ClothingSize::Medium, ClothingType::Shirt, "Royal Essentials", "White"),
                    fields_with("Dress Pants", 12999, ClothingSize::Large, ClothingType::Pants, "Royal Collection", "Black"),
                    fields_with("Blazer", 29999, ClothingSize::Medium, ClothingType::Jacket, "Royal Luxe", "Navy"),
                    fields_with("Summer Dress", 15999, ClothingSize::Small, ClothingType::Dress, "Royal Boutique", "Multicolor"),
                    fields_with("Silk Scarf", 4999, ClothingSize::OneSize, ClothingType::Accessory, "Royal Accessories", "Red"),
                    fields_with("Striped Shirt", 7999, ClothingSize::Medium, ClothingType::Shirt, "Royal Essentials", "Blue"),
                ];
                for (i, fields) in items.into_iter().enumerate() {
                    store
                        .create(fields, vec![jpeg(&format!("item-{}.jpg", i))])
                        .await
                        .unwrap();
                }
            }

            // ==================================================================
            // Listing
            // ==================================================================

            #[tokio::test]
            async fn test_empty_selection_lists_everything_newest_first() {
                let (store, _) = store().await;
                seed(&store).await;

                let all = store.list(None).await.unwrap();
                assert_count(&all, 6);
                assert_newest_first(&all);
                assert_eq!(all[0].name, "Striped Shirt");
                assert_eq!(all[5].name, "Oxford Shirt");

                let empty = store.list(Some(&FilterSelection::new())).await.unwrap();
                assert_eq!(empty, all);
            }

            #[tokio::test]
            async fn test_filtered_listing_is_a_matching_subset() {
                let (store, _) = store().await;
                seed(&store).await;
                let all = store.list(None).await.unwrap();

                let selections = [
                    FilterSelection::new().sizes([ClothingSize::Medium]),
                    FilterSelection::new().types([ClothingType::Shirt, ClothingType::Dress]),
                    FilterSelection::new().brands(["Royal Essentials"]),
                    FilterSelection::new().colors(["Navy", "Red"]),
                    FilterSelection::new()
                        .min_price(rust_decimal::Decimal::new(80, 0))
                        .max_price(rust_decimal::Decimal::new(160, 0)),
                    FilterSelection::new()
                        .max_price(rust_decimal::Decimal::new(100, 0))
                        .sizes([ClothingSize::Medium]),
                ];

                for selection in &selections {
                    let listed = store.list(Some(selection)).await.unwrap();
                    assert_newest_first(&listed);
                    for item in &listed {
                        assert!(selection.matches(item), "{} should match {:?}", item.name, selection);
                        assert!(all.contains(item));
                    }
                    let expected = all.iter().filter(|i| selection.matches(i)).count();
                    assert_eq!(listed.len(), expected, "{:?}", selection);
                }
            }

            #[tokio::test]
            async fn test_server_side_matches_in_memory() {
                let (store, _) = store().await;
                seed(&store).await;
                let server = store.clone().with_strategy(FilterStrategy::ServerSide);

                let selections = [
                    FilterSelection::new().sizes([ClothingSize::Medium]),
                    FilterSelection::new().brands(["Royal Essentials", "Royal Luxe"]),
                    FilterSelection::new()
                        .min_price(rust_decimal::Decimal::new(7999, 2))
                        .colors(["White", "Blue"]),
                    FilterSelection::new().types(Vec::<ClothingType>::new()),
                ];

                for selection in &selections {
                    let local = store.list(Some(selection)).await.unwrap();
                    let remote = server.list(Some(selection)).await.unwrap();
                    assert_eq!(local, remote, "{:?}", selection);
                }
            }

            #[tokio::test]
            async fn test_inverted_price_range_lists_nothing() {
                let (store, _) = store().await;
                seed(&store).await;
                let selection = FilterSelection::new()
                    .min_price(rust_decimal::Decimal::new(200, 0))
                    .max_price(rust_decimal::Decimal::new(100, 0));

                for strategy in [FilterStrategy::InMemory, FilterStrategy::ServerSide] {
                    let store = store.clone().with_strategy(strategy);
                    assert!(store.list(Some(&selection)).await.unwrap().is_empty());
                }
            }

            // ==================================================================
            // Create / Update / Delete scenario
            // ==================================================================

            #[tokio::test]
            async fn test_create_list_delete_scenario() {
                let (store, blobs) = store().await;
                let id = store
                    .create(test_fields("Test Shirt"), vec![jpeg("front.jpg")])
                    .await
                    .unwrap();

                let medium = store
                    .list(Some(&FilterSelection::new().sizes([ClothingSize::Medium])))
                    .await
                    .unwrap();
                assert!(medium.iter().any(|i| i.id == id && i.name == "Test Shirt"));

                let large = store
                    .list(Some(&FilterSelection::new().sizes([ClothingSize::Large])))
                    .await
                    .unwrap();
                assert!(large.iter().all(|i| i.id != id));

                let item = store.get(&id).await.unwrap().unwrap();
                store.delete(&id, &item.images).await.unwrap();

                assert!(store.list(None).await.unwrap().iter().all(|i| i.id != id));
                assert!(blobs.is_empty());
            }

            #[tokio::test]
            async fn test_create_keeps_image_order() {
                let (store, blobs) = store().await;
                let id = store
                    .create(
                        test_fields("Shirt"),
                        vec![jpeg("front.jpg"), jpeg("back.PNG"), jpeg("detail.webp")],
                    )
                    .await
                    .unwrap();

                let item = store.get(&id).await.unwrap().unwrap();
                assert_count(&item.images, 3);
                let extensions: Vec<_> = item
                    .images
                    .iter()
                    .map(|i| i.path.as_deref().unwrap().rsplit('.').next().unwrap().to_string())
                    .collect();
                assert_eq!(extensions, vec!["jpg", "png", "webp"]);
                assert_eq!(item.cover_image(), item.images.first());

                for image in &item.images {
                    let key = image.path.as_deref().unwrap();
                    assert!(key.starts_with("clothing/"));
                    assert!(blobs.get(key).is_some());
                    assert_eq!(blobs.resolve_key(&image.url).as_deref(), Some(key));
                }
            }

            #[tokio::test]
            async fn test_create_without_images_changes_nothing() {
                let (store, blobs) = store().await;
                let err = store.create(test_fields("Shirt"), Vec::new()).await.unwrap_err();
                assert!(matches!(err, CatalogueError::Validation(ValidationError::NoImages)));
                assert!(store.list(None).await.unwrap().is_empty());
                assert!(blobs.is_empty());
            }

            #[tokio::test]
            async fn test_update_appends_new_images() {
                let (store, _) = store().await;
                let id = store
                    .create(test_fields("Shirt"), vec![jpeg("a.jpg")])
                    .await
                    .unwrap();
                let before = store.get(&id).await.unwrap().unwrap();

                store
                    .update(&id, ItemPatch::default(), vec![jpeg("b.jpg"), jpeg("c.jpg")])
                    .await
                    .unwrap();

                let after = store.get(&id).await.unwrap().unwrap();
                assert_count(&after.images, 3);
                assert_eq!(after.images[0], before.images[0]);
                assert_eq!(after.name, before.name);
                assert_eq!(after.created_at, before.created_at);
                assert!(after.updated_at >= before.updated_at);
            }

            #[tokio::test]
            async fn test_update_with_trimmed_list_and_new_images() {
                let (store, blobs) = store().await;
                let id = store
                    .create(test_fields("Shirt"), vec![jpeg("a.jpg"), jpeg("b.jpg"), jpeg("c.jpg")])
                    .await
                    .unwrap();
                let before = store.get(&id).await.unwrap().unwrap();
                let trimmed = vec![before.images[2].clone(), before.images[0].clone()];

                let patch = ItemPatch {
                    name: Some("Renamed Shirt".to_string()),
                    size: Some(ClothingSize::Large),
                    images: Some(trimmed.clone()),
                    ..Default::default()
                };
                store.update(&id, patch, vec![jpeg("d.jpg")]).await.unwrap();

                let after = store.get(&id).await.unwrap().unwrap();
                assert_eq!(after.name, "Renamed Shirt");
                assert_eq!(after.size, ClothingSize::Large);
                assert_eq!(after.brand, before.brand);
                assert_count(&after.images, 3);
                assert_eq!(&after.images[..2], &trimmed[..]);

                // The dropped image is removed from the blob store
                let dropped = before.images[1].path.as_deref().unwrap();
                assert!(blobs.get(dropped).is_none());
                assert_eq!(blobs.len(), 3);
            }

            #[tokio::test]
            async fn test_update_keeping_images_by_url_only() {
                let (store, blobs) = store().await;
                let id = store
                    .create(test_fields("Shirt"), vec![jpeg("a.jpg"), jpeg("b.jpg")])
                    .await
                    .unwrap();
                let before = store.get(&id).await.unwrap().unwrap();

                // Edit forms echo kept images back without their blob keys
                let patch = storefront::core::validation::parse_item_patch(serde_json::json!({
                    "images": [{"url": before.images[0].url}]
                }))
                .unwrap();
                assert_eq!(patch.images.as_ref().unwrap()[0].path, None);
                store.update(&id, patch, vec![jpeg("c.jpg")]).await.unwrap();

                let after = store.get(&id).await.unwrap().unwrap();
                assert_count(&after.images, 2);
                assert_eq!(after.images[0], before.images[0]);
                assert!(after.images[0].path.is_some());

                let kept = before.images[0].path.as_deref().unwrap();
                let dropped = before.images[1].path.as_deref().unwrap();
                assert!(blobs.get(kept).is_some());
                assert!(blobs.get(dropped).is_none());
                assert_eq!(blobs.len(), 2);
            }

            #[tokio::test]
            async fn test_update_with_unchanged_url_only_list_removes_nothing() {
                let (store, blobs) = store().await;
                let id = store
                    .create(test_fields("Shirt"), vec![jpeg("a.jpg")])
                    .await
                    .unwrap();
                let before = store.get(&id).await.unwrap().unwrap();

                let patch = ItemPatch {
                    images: Some(vec![ImageRef::external(before.images[0].url.clone())]),
                    ..Default::default()
                };
                store.update(&id, patch, Vec::new()).await.unwrap();

                let after = store.get(&id).await.unwrap().unwrap();
                assert_eq!(after.images, before.images);
                assert_eq!(blobs.len(), 1);
            }

            #[tokio::test]
            async fn test_unstorable_price_is_rejected_before_upload() {
                let (store, blobs) = store().await;
                let fields = storefront::core::item::ItemFields {
                    price: rust_decimal::Decimal::new(12345678901234567, 2),
                    ..test_fields("Shirt")
                };

                let err = store.create(fields, vec![jpeg("a.jpg")]).await.unwrap_err();
                assert!(err.is_validation());
                assert!(blobs.is_empty());
                assert!(store.list(None).await.unwrap().is_empty());
            }

            #[tokio::test]
            async fn test_largest_storable_price_reads_back_exactly() {
                let (store, _) = store().await;
                let price = rust_decimal::Decimal::new(999_999_999_999_999, 2);
                let fields = storefront::core::item::ItemFields {
                    price,
                    ..test_fields("Gold Shirt")
                };
                let id = store.create(fields, vec![jpeg("a.jpg")]).await.unwrap();

                let item = store.get(&id).await.unwrap().unwrap();
                assert_eq!(item.price, price);

                let patch = ItemPatch {
                    price: Some(rust_decimal::Decimal::new(1, 2)),
                    ..Default::default()
                };
                store.update(&id, patch, Vec::new()).await.unwrap();
                let item = store.get(&id).await.unwrap().unwrap();
                assert_eq!(item.price, rust_decimal::Decimal::new(1, 2));
            }

            #[tokio::test]
            async fn test_update_unknown_id_is_not_found() {
                let (store, blobs) = store().await;
                let err = store
                    .update(MISSING_ID, ItemPatch::default(), vec![jpeg("a.jpg")])
                    .await
                    .unwrap_err();
                assert!(matches!(err, CatalogueError::NotFound { .. }));
                assert_eq!(err.error_code(), "ITEM_NOT_FOUND");
                assert!(blobs.is_empty());
            }

            #[tokio::test]
            async fn test_update_to_empty_image_list_is_rejected() {
                let (store, _) = store().await;
                let id = store
                    .create(test_fields("Shirt"), vec![jpeg("a.jpg")])
                    .await
                    .unwrap();
                let patch = ItemPatch {
                    images: Some(Vec::new()),
                    price: Some(rust_decimal::Decimal::new(1, 0)),
                    ..Default::default()
                };

                let err = store.update(&id, patch, Vec::new()).await.unwrap_err();
                assert!(err.is_validation());

                let item = store.get(&id).await.unwrap().unwrap();
                assert_count(&item.images, 1);
                assert_eq!(item.price, rust_decimal::Decimal::new(1999, 2));
            }

            #[tokio::test]
            async fn test_delete_removes_record_when_image_deletion_fails() {
                let blobs = InMemoryBlobStore::new();
                let store =
                    store_with_blobs(Arc::new(FlakyBlobStore::failing_deletes(blobs.clone()))).await;
                let id = store
                    .create(test_fields("Shirt"), vec![jpeg("a.jpg"), jpeg("b.jpg")])
                    .await
                    .unwrap();
                let item = store.get(&id).await.unwrap().unwrap();

                store.delete(&id, &item.images).await.unwrap();

                assert!(store.get(&id).await.unwrap().is_none());
                // Orphaned blobs are left behind
                assert_eq!(blobs.len(), 2);
            }

            #[tokio::test]
            async fn test_delete_unknown_id_succeeds() {
                let (store, _) = store().await;
                store.delete(MISSING_ID, &[]).await.unwrap();
                store.delete_item(MISSING_ID).await.unwrap();
            }

            #[tokio::test]
            async fn test_get_unknown_id_is_none() {
                let (store, _) = store().await;
                assert!(store.get(MISSING_ID).await.unwrap().is_none());
            }

            // ==================================================================
            // Compensating cleanup
            // ==================================================================

            #[tokio::test]
            async fn test_upload_failure_mid_batch_leaves_nothing_behind() {
                let blobs = InMemoryBlobStore::new();
                let store =
                    store_with_blobs(Arc::new(FlakyBlobStore::failing_after(blobs.clone(), 2))).await;

                let err = store
                    .create(
                        test_fields("Shirt"),
                        vec![jpeg("a.jpg"), jpeg("b.jpg"), jpeg("c.jpg")],
                    )
                    .await
                    .unwrap_err();

                assert_eq!(err.error_code(), "STORE_ERROR");
                assert!(store.list(None).await.unwrap().is_empty());
                assert!(blobs.is_empty(), "Uploaded blobs should be cleaned up: {:?}", blobs.keys());
            }

            #[tokio::test]
            async fn test_insert_failure_cleans_up_uploads() {
                let blobs = InMemoryBlobStore::new();
                let counting = Arc::new(CountingCollection::failing_inserts(collection().await));
                let store = ItemStore::new(counting, Arc::new(blobs.clone()));

                let err = store
                    .create(test_fields("Shirt"), vec![jpeg("a.jpg"), jpeg("b.jpg")])
                    .await
                    .unwrap_err();

                assert!(matches!(err, CatalogueError::Store { operation: "create item", .. }));
                assert!(blobs.is_empty());
            }

            #[tokio::test]
            async fn test_failed_update_upload_keeps_record_unchanged() {
                let blobs = InMemoryBlobStore::new();
                let store =
                    store_with_blobs(Arc::new(FlakyBlobStore::failing_after(blobs.clone(), 2))).await;
                let id = store
                    .create(test_fields("Shirt"), vec![jpeg("a.jpg")])
                    .await
                    .unwrap();

                let patch = ItemPatch {
                    name: Some("Changed".to_string()),
                    ..Default::default()
                };
                let err = store
                    .update(&id, patch, vec![jpeg("b.jpg"), jpeg("c.jpg")])
                    .await
                    .unwrap_err();
                assert_eq!(err.error_code(), "STORE_ERROR");

                let item = store.get(&id).await.unwrap().unwrap();
                assert_eq!(item.name, "Shirt");
                assert_count(&item.images, 1);
                assert_eq!(blobs.len(), 1);
            }

            // ==================================================================
            // Legacy records
            // ==================================================================

            #[tokio::test]
            async fn test_legacy_shapes_read_as_image_lists() {
                let collection = collection().await;
                let single = collection
                    .insert(legacy_single_image_doc(
                        "Navy Blue Blazer",
                        "2023-01-01T00:00:00.000000Z",
                        "https://img.example.com/blazer.jpg",
                    ))
                    .await
                    .unwrap();
                collection
                    .insert(legacy_url_list_doc(
                        "Striped Shirt",
                        "2023-06-01T00:00:00.000000Z",
                        &["https://img.example.com/1.jpg", "https://img.example.com/2.jpg"],
                    ))
                    .await
                    .unwrap();
                let store = ItemStore::new(collection, Arc::new(InMemoryBlobStore::new()));
                store
                    .create(test_fields("New Shirt"), vec![jpeg("new.jpg")])
                    .await
                    .unwrap();

                let all = store.list(None).await.unwrap();
                let names: Vec<_> = all.iter().map(|i| i.name.as_str()).collect();
                assert_eq!(names, vec!["New Shirt", "Striped Shirt", "Navy Blue Blazer"]);

                assert_eq!(
                    all[1].images,
                    vec![
                        ImageRef::external("https://img.example.com/1.jpg"),
                        ImageRef::external("https://img.example.com/2.jpg"),
                    ]
                );
                let blazer = store.get(&single).await.unwrap().unwrap();
                assert_eq!(blazer.images, vec![ImageRef::external("https://img.example.com/blazer.jpg")]);
                assert_eq!(blazer.price, rust_decimal::Decimal::new(29999, 2));
            }

            #[tokio::test]
            async fn test_updating_legacy_record_writes_current_shape() {
                let collection = collection().await;
                let id = collection
                    .insert(legacy_single_image_doc(
                        "Navy Blue Blazer",
                        "2023-01-01T00:00:00.000000Z",
                        "https://img.example.com/blazer.jpg",
                    ))
                    .await
                    .unwrap();
                let store = ItemStore::new(collection.clone(), Arc::new(InMemoryBlobStore::new()));

                store
                    .update(&id, ItemPatch::default(), vec![jpeg("extra.jpg")])
                    .await
                    .unwrap();

                let raw = collection.get(&id).await.unwrap().unwrap();
                assert!(raw.contains_key("images"));
                let item = store.get(&id).await.unwrap().unwrap();
                assert_count(&item.images, 2);
                assert_eq!(item.images[0], ImageRef::external("https://img.example.com/blazer.jpg"));
            }

            #[tokio::test]
            async fn test_delete_item_with_external_images() {
                let collection = collection().await;
                let id = collection
                    .insert(legacy_single_image_doc(
                        "Navy Blue Blazer",
                        "2023-01-01T00:00:00.000000Z",
                        "https://img.example.com/blazer.jpg",
                    ))
                    .await
                    .unwrap();
                let store = ItemStore::new(collection, Arc::new(InMemoryBlobStore::new()));

                store.delete_item(&id).await.unwrap();
                assert!(store.get(&id).await.unwrap().is_none());
            }
        }
    };
}
