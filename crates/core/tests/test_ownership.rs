//! Tests for purchase ownership evaluation

use purchase_tester_core::model::SubscriberResponse;
use purchase_tester_core::{is_purchased, owned_products, PurchaseKind, SubscriberState};

fn state(json: &str) -> SubscriberState {
    let response: SubscriberResponse = serde_json::from_str(json).unwrap();
    response.subscriber
}

const SNAPSHOT: &str = r#"{
    "subscriber": {
        "original_app_user_id": "user_1",
        "entitlements": {
            "pro": {"expires_date": "2020-02-01T00:00:00Z", "product_identifier": "pri_m"}
        },
        "subscriptions": {
            "pri_m": {"purchase_date": "2020-01-01T00:00:00Z",
                      "expires_date": "2020-02-01T00:00:00Z",
                      "unsubscribe_detected": true}
        },
        "non_subscriptions": {
            "pri_life": [{"id": "a"}, {"id": "b"}]
        },
        "other_purchases": {
            "pri_gift": {"purchase_date": "2021-01-01T00:00:00Z"}
        }
    }
}"#;

#[test]
fn owned_in_any_grouping() {
    let s = state(SNAPSHOT);
    assert!(is_purchased("pri_m", &s));
    assert!(is_purchased("pri_life", &s));
    assert!(is_purchased("pri_gift", &s));
    assert!(!is_purchased("pri_y", &s));
}

/// Intentional, pending product clarification: ownership ignores expiry, so
/// an expired subscription still blocks repurchase even though its
/// entitlement shows inactive.
#[test]
fn expired_subscription_still_counts_as_purchased() {
    let s = state(SNAPSHOT);
    assert!(!s.entitlements["pro"].is_active());
    assert!(is_purchased("pri_m", &s));
}

#[test]
fn evaluation_is_deterministic() {
    let s = state(SNAPSHOT);
    let before = s.clone();
    for product in ["pri_m", "pri_life", "pri_gift", "missing"] {
        assert_eq!(is_purchased(product, &s), is_purchased(product, &s));
    }
    assert_eq!(s, before);
}

#[test]
fn empty_snapshot_owns_nothing() {
    let s = state(r#"{"subscriber": {"original_app_user_id": "new"}}"#);
    assert!(!is_purchased("pri_m", &s));
    assert!(owned_products(&s).is_empty());
}

#[test]
fn owned_products_lists_every_grouping() {
    let s = state(SNAPSHOT);
    let owned = owned_products(&s);
    let kinds: Vec<(&str, PurchaseKind)> = owned.iter().map(|o| (o.product_id, o.kind)).collect();
    assert_eq!(
        kinds,
        vec![
            ("pri_m", PurchaseKind::Subscription),
            ("pri_life", PurchaseKind::NonSubscription),
            ("pri_gift", PurchaseKind::Other),
        ]
    );
    assert_eq!(owned[1].records.events().len(), 2);
}
