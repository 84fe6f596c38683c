//! A contacts collection driven through every router operation.

use std::collections::HashMap;
use std::sync::Arc;

use proptest::prelude::*;
use rowmap_core::{BackingStore, FlatRecord, ResourceLocator, ScalarKind, TypeDescriptor};
use rowmap_json_store::InMemoryStore;
use rowmap_router::{Cursor, LocatorBinding, Registration, RouterConfig, StoreRouter};
use rowmap_serde::{JsonCodec, DATA_COLUMN};

fn contact() -> TypeDescriptor {
    TypeDescriptor::new()
        .with_scalar("id", ScalarKind::Int)
        .with_scalar("name", ScalarKind::String)
        .with_object(
            "address",
            TypeDescriptor::new().with_scalar("city", ScalarKind::String),
        )
        .with_identity("id")
}

fn router() -> (StoreRouter, ResourceLocator) {
    let locator = ResourceLocator::new("content://people/contacts");
    let mut stores: HashMap<String, Arc<dyn BackingStore>> = HashMap::new();
    stores.insert("people".to_string(), Arc::new(InMemoryStore::new()));

    let registration =
        Registration::new().store("people", [LocatorBinding::typed(locator.clone(), contact())]);
    let router = StoreRouter::new(registration, &stores, RouterConfig::default()).unwrap();
    (router, locator)
}

fn record(pairs: &[(&str, &str)]) -> FlatRecord {
    pairs.iter().copied().collect()
}

fn arg(value: &str) -> Vec<Option<String>> {
    vec![Some(value.to_string())]
}

#[test]
fn insert_query_update_delete() {
    let (router, locator) = router();
    let inserted = record(&[("id", "1"), ("name", "a"), ("address.city", "NY")]);

    assert_eq!(router.insert(&locator, &inserted).unwrap(), locator);
    assert_eq!(router.query(&locator, "", &[]).unwrap(), vec![inserted]);

    let patch = record(&[("address.city", "LA")]);
    assert_eq!(router.update(&locator, &patch, "id=?", &arg("1")).unwrap(), 1);
    assert_eq!(
        router.query(&locator, "", &[]).unwrap(),
        vec![record(&[("id", "1"), ("name", "a"), ("address.city", "LA")])]
    );

    assert_eq!(router.delete(&locator, "id=?", &arg("1")).unwrap(), 1);
    assert!(router.query(&locator, "", &[]).unwrap().is_empty());
}

#[test]
fn unfiltered_delete_resets() {
    let (router, locator) = router();
    let rows: Vec<FlatRecord> = (1..=3)
        .map(|i| {
            let id = i.to_string();
            record(&[("id", id.as_str()), ("name", "n"), ("address.city", "NY")])
        })
        .collect();
    assert_eq!(router.bulk_insert(&locator, &rows).unwrap(), 3);

    assert_eq!(router.delete(&locator, "", &[]).unwrap(), 1);
    assert!(router.query(&locator, "", &[]).unwrap().is_empty());
}

#[test]
fn delete_only_matches() {
    let (router, locator) = router();
    router
        .bulk_insert(
            &locator,
            &[
                record(&[("id", "1"), ("name", "a"), ("address.city", "NY")]),
                record(&[("id", "2"), ("name", "b"), ("address.city", "LA")]),
                record(&[("id", "3"), ("name", "c"), ("address.city", "NY")]),
            ],
        )
        .unwrap();

    router
        .delete(&locator, r#"{"address": {"city": ?}}"#, &arg("NY"))
        .unwrap();

    let remaining = router.query(&locator, "", &[]).unwrap();
    assert_eq!(
        remaining,
        vec![record(&[("id", "2"), ("name", "b"), ("address.city", "LA")])]
    );
}

#[test]
fn update_applies_to_every_match() {
    let (router, locator) = router();
    router
        .bulk_insert(
            &locator,
            &[
                record(&[("id", "1"), ("name", "a"), ("address.city", "NY")]),
                record(&[("id", "2"), ("name", "b"), ("address.city", "NY")]),
                record(&[("id", "3"), ("name", "c"), ("address.city", "SF")]),
            ],
        )
        .unwrap();

    let patch = record(&[("name", "moved")]);
    router
        .update(&locator, &patch, "address.city = ?", &arg("NY"))
        .unwrap();

    let names: Vec<String> = router
        .query(&locator, "", &[])
        .unwrap()
        .iter()
        .map(|row| row.get("name").unwrap_or_default().to_string())
        .collect();
    assert_eq!(names, vec!["moved", "moved", "c"]);
}

#[test]
fn cursor_over_query() {
    let (router, locator) = router();
    router
        .insert(&locator, &record(&[("id", "41"), ("name", "a"), ("address.city", "NY")]))
        .unwrap();

    let mut cursor = router.query_cursor(&locator, "", &[]).unwrap();
    assert_eq!(cursor.count(), 1);
    let id = cursor.column_index("id").unwrap();
    assert!(cursor.move_to_first());
    assert_eq!(cursor.get_int(id).unwrap(), 41);
    assert!(!cursor.move_to_next());
}

#[test]
fn json_codec_router() {
    let locator = ResourceLocator::new("content://people/documents");
    let mut stores: HashMap<String, Arc<dyn BackingStore>> = HashMap::new();
    stores.insert("people".to_string(), Arc::new(InMemoryStore::new()));
    let registration =
        Registration::new().store("people", [LocatorBinding::typed(locator.clone(), contact())]);
    let router =
        StoreRouter::with_codec(registration, &stores, RouterConfig::default(), JsonCodec).unwrap();

    let document = |json: &str| record(&[(DATA_COLUMN, json)]);
    router
        .insert(&locator, &document(r#"{"id": 7, "name": "a", "address": {"city": "NY"}}"#))
        .unwrap();
    router
        .update(&locator, &document(r#"{"address": {"city": "LA"}}"#), "id = ?", &arg("7"))
        .unwrap();

    assert_eq!(
        router.query(&locator, "address.city = ?", &arg("LA")).unwrap(),
        vec![document(r#"{"address":{"city":"LA"},"id":7,"name":"a"}"#)]
    );
    assert!(router
        .insert(&locator, &document(r#"{"id": "seven"}"#))
        .is_err());
}

proptest! {
    #[test]
    fn inserted_rows_query_back(
        id in any::<i32>(),
        name in "[a-zA-Z ]{0,12}",
        city in "[A-Z]{2}",
    ) {
        let (router, locator) = router();
        let id = id.to_string();
        let row = record(&[("id", id.as_str()), ("name", name.as_str()), ("address.city", city.as_str())]);

        router.insert(&locator, &row).unwrap();
        prop_assert_eq!(router.query(&locator, "id = ?", &arg(&id)).unwrap(), vec![row]);
    }
}
