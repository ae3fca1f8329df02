//! End-to-end runs over in-memory stores.

use proptest::prelude::*;
use serde_json::json;
use subsync_core::{
    CollectionDescriptor, DescriptorSet, Document, DocumentId, MemoryStore, Scheduler, SyncConfig,
    SyncError,
};

fn doc(value: serde_json::Value) -> Document {
    Document::from_json(value).unwrap()
}

/// Seeds `orders` with open orders and `items` with `per_parent` items per
/// order, returning the order identifiers.
fn seed_orders_and_items(source: &MemoryStore, orders: usize, per_parent: usize) -> Vec<DocumentId> {
    let order_ids = source
        .seed(
            "orders",
            (0..orders)
                .map(|n| doc(json!({"status": "open", "n": n})))
                .collect(),
        )
        .unwrap();
    let items = order_ids
        .iter()
        .flat_map(|id| {
            (0..per_parent).map(move |k| doc(json!({"order_id": id.canonical(), "k": k})))
        })
        .collect();
    source.seed("items", items).unwrap();
    order_ids
}

#[test]
fn orders_and_items_scenario() {
    // 1200 open orders, one item each, plus noise that must not be copied.
    let source = MemoryStore::new();
    seed_orders_and_items(&source, 1200, 1);
    source
        .seed("orders", vec![doc(json!({"status": "closed"}))])
        .unwrap();
    source
        .seed(
            "items",
            vec![doc(json!({"order_id": DocumentId::new().canonical()}))],
        )
        .unwrap();

    let dest = MemoryStore::new();
    let set = DescriptorSet::new(vec![
        CollectionDescriptor::new("orders").with_filter("status", json!("open")),
        CollectionDescriptor::new("items")
            .with_dependency("orders")
            .with_join_key("order_id"),
    ]);

    let stats = Scheduler::new(SyncConfig::new().with_batch_size(500))
        .run(&set, &source, &dest)
        .unwrap();

    assert_eq!(stats.descriptors_processed(), 2);
    assert_eq!(stats.collections[0].collection, "orders");
    assert_eq!(stats.collections[0].inserted, 1200);
    assert_eq!(stats.collections[1].collection, "items");
    assert_eq!(stats.collections[1].inserted, 1200);
    // 1200 parent ids in batches of 500: 500, 500, 200.
    assert_eq!(stats.collections[1].batches, 3);
    assert_eq!(source.find_calls("items"), 3);

    assert_eq!(dest.documents("orders").len(), 1200);
    let items = dest.documents("items");
    assert_eq!(items.len(), 1200);

    // No duplicates among copied items.
    let mut ids: Vec<DocumentId> = items.iter().map(|d| d.id().unwrap()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 1200);
}

#[test]
fn dangling_dependency_aborts_before_any_extraction() {
    let source = MemoryStore::new();
    seed_orders_and_items(&source, 5, 1);

    let dest = MemoryStore::new();
    let set = DescriptorSet::new(vec![
        CollectionDescriptor::new("orders"),
        CollectionDescriptor::new("items")
            .with_dependency("ghosts")
            .with_join_key("order_id"),
    ]);

    let err = Scheduler::new(SyncConfig::new())
        .run(&set, &source, &dest)
        .unwrap_err();
    assert!(matches!(err, SyncError::Scheduling { .. }));

    // Nothing was extracted for any descriptor.
    assert_eq!(source.find_calls("orders"), 0);
    assert_eq!(source.find_calls("items"), 0);
    assert!(dest.collection_names().is_empty());
}

#[test]
fn forest_with_reverse_join_and_independent_root() {
    let source = MemoryStore::new();
    let dest = MemoryStore::new();

    // Two invoices; three open orders referencing the first invoice, the
    // second invoice referenced by a closed order only.
    let invoice_a = DocumentId::new();
    let invoice_b = DocumentId::new();
    source
        .seed(
            "invoices",
            vec![
                doc(json!({"_id": invoice_a.canonical(), "amount": 10})),
                doc(json!({"_id": invoice_b.canonical(), "amount": 20})),
            ],
        )
        .unwrap();
    source
        .seed(
            "orders",
            vec![
                doc(json!({"status": "open", "invoice_id": invoice_a.canonical()})),
                doc(json!({"status": "open", "invoice_id": invoice_a.canonical()})),
                doc(json!({"status": "open", "invoice_id": invoice_a.canonical()})),
                doc(json!({"status": "closed", "invoice_id": invoice_b.canonical()})),
            ],
        )
        .unwrap();
    source
        .seed("settings", vec![doc(json!({"theme": "dark"}))])
        .unwrap();

    let set = DescriptorSet::new(vec![
        CollectionDescriptor::new("invoices")
            .with_dependency("orders")
            .with_reverse_join_field("invoice_id"),
        CollectionDescriptor::new("orders").with_filter("status", json!("open")),
        CollectionDescriptor::new("settings"),
    ]);

    let stats = Scheduler::new(SyncConfig::new())
        .run(&set, &source, &dest)
        .unwrap();

    assert_eq!(stats.descriptors_processed(), 3);
    assert_eq!(dest.documents("orders").len(), 3);
    assert_eq!(dest.documents("settings").len(), 1);

    // Three parents share one invoice reference: deduplicated to a single
    // source query returning one invoice.
    let invoices = dest.documents("invoices");
    assert_eq!(invoices.len(), 1);
    assert_eq!(invoices[0].id(), Some(invoice_a));
    assert_eq!(source.find_calls("invoices"), 1);
}

#[test]
fn registry_drives_joins_not_source_contents() {
    // A filtered parent extraction must constrain the child join to the
    // filtered subset, not everything in the source.
    let source = MemoryStore::new();
    let order_ids = seed_orders_and_items(&source, 4, 2);
    // Make half the orders closed after seeding by re-seeding a fresh store.
    let filtered_source = MemoryStore::new();
    for (n, id) in order_ids.iter().enumerate() {
        let status = if n % 2 == 0 { "open" } else { "closed" };
        filtered_source
            .seed(
                "orders",
                vec![doc(json!({"_id": id.canonical(), "status": status}))],
            )
            .unwrap();
    }
    filtered_source
        .seed("items", source.documents("items"))
        .unwrap();

    let dest = MemoryStore::new();
    let set = DescriptorSet::new(vec![
        CollectionDescriptor::new("orders").with_filter("status", json!("open")),
        CollectionDescriptor::new("items")
            .with_dependency("orders")
            .with_join_key("order_id"),
    ]);

    let stats = Scheduler::new(SyncConfig::new())
        .run(&set, &filtered_source, &dest)
        .unwrap();

    assert_eq!(stats.collections[0].inserted, 2);
    // Only the items of the two open orders.
    assert_eq!(stats.collections[1].inserted, 4);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Batched forward-join extraction equals one unbounded query over the
    /// full identifier list, for arbitrary parent counts and batch sizes.
    #[test]
    fn forward_join_batching_equivalence(parents in 0usize..40, batch_size in 1usize..10) {
        let source = MemoryStore::new();
        seed_orders_and_items(&source, parents, 2);

        let set = DescriptorSet::new(vec![
            CollectionDescriptor::new("orders"),
            CollectionDescriptor::new("items")
                .with_dependency("orders")
                .with_join_key("order_id"),
        ]);

        let dest_batched = MemoryStore::new();
        Scheduler::new(SyncConfig::new().with_batch_size(batch_size))
            .run(&set, &source, &dest_batched)
            .unwrap();

        let dest_unbatched = MemoryStore::new();
        Scheduler::new(SyncConfig::new().with_batch_size(usize::MAX))
            .run(&set, &source, &dest_unbatched)
            .unwrap();

        let key = |d: &Document| serde_json::to_string(d.get("order_id").unwrap()).unwrap();
        let mut batched = dest_batched.documents("items");
        let mut unbatched = dest_unbatched.documents("items");
        batched.sort_by_key(key);
        unbatched.sort_by_key(key);
        prop_assert_eq!(batched.len(), parents * 2);
        prop_assert_eq!(batched, unbatched);
    }
}
