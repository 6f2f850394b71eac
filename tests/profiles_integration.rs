use serde_json::json;

use resale_market::error::AppError;
use resale_market::profiles::{self, NewAddress, ProfileEdit, SellerRegistration};
use resale_market::progression;

mod support;

fn address(name: &str, is_default: bool) -> NewAddress {
    serde_json::from_value(json!({
        "name": name,
        "phone": "9000000000",
        "address_line_1": "7 Ring Road",
        "city": "Jaipur",
        "state": "Rajasthan",
        "pincode": "302001",
        "is_default": is_default
    }))
    .expect("address")
}

#[actix_web::test]
async fn new_profile_starts_at_level_one() {
    let Some(test_db) = support::init_test_db().await else {
        return;
    };
    let pool = &test_db.pool;
    let user = support::create_user(pool, "newcomer").await;

    let overview = profiles::profile_overview(pool, user).await.expect("overview");
    assert_eq!(overview.profile.points, 0);
    assert_eq!(overview.profile.level, 1);
    assert_eq!(overview.points_to_next_level, 100);
    assert_eq!(overview.level_progress, 0.0);
    assert!(overview.milestones.is_empty());
    assert_eq!(overview.next_milestone.map(|m| m.points_required), Some(10));
    assert!(overview.seller.is_none());

    progression::grant_points(pool, user, 150).await.expect("grant");
    let overview = profiles::profile_overview(pool, user).await.expect("overview");
    assert_eq!(overview.profile.level, 2);
    assert_eq!(overview.points_to_next_level, 100);
    assert_eq!(overview.milestones.len(), 2);
    assert_eq!(overview.next_milestone.map(|m| m.points_required), Some(250));
}

#[actix_web::test]
async fn edit_keeps_fields_that_are_left_out() {
    let Some(test_db) = support::init_test_db().await else {
        return;
    };
    let pool = &test_db.pool;
    let user = support::create_user(pool, "editor").await;

    let edited = profiles::edit_profile(
        pool,
        user,
        &ProfileEdit {
            city: Some(" Kochi ".to_string()),
            bio: Some("Collector of old radios".to_string()),
            ..Default::default()
        },
    )
    .await
    .expect("first edit");
    assert_eq!(edited.city, "Kochi");

    let edited = profiles::edit_profile(
        pool,
        user,
        &ProfileEdit {
            phone: Some("9123456780".to_string()),
            country: Some(String::new()),
            ..Default::default()
        },
    )
    .await
    .expect("second edit");
    assert_eq!(edited.city, "Kochi");
    assert_eq!(edited.bio, "Collector of old radios");
    assert_eq!(edited.phone, "9123456780");
    assert_eq!(edited.country, "India");
}

#[actix_web::test]
async fn one_default_address_at_a_time() {
    let Some(test_db) = support::init_test_db().await else {
        return;
    };
    let pool = &test_db.pool;
    let user = support::create_user(pool, "mover").await;

    let home = profiles::add_address(pool, user, &address("Home", true)).await.expect("home");
    assert_eq!(home.country, "India");
    let work = profiles::add_address(pool, user, &address("Work", true)).await.expect("work");
    profiles::add_address(pool, user, &address("Spare", false)).await.expect("spare");

    let listed = profiles::list_addresses(pool, user).await.expect("list");
    assert_eq!(listed.len(), 3);
    assert_eq!(listed[0].id, work.id);
    assert_eq!(listed.iter().filter(|a| a.is_default).count(), 1);

    let mut missing = address("", false);
    missing.city = " ".to_string();
    match profiles::add_address(pool, user, &missing).await {
        Err(AppError::Validation(message)) => {
            assert!(message.contains("name") && message.contains("city"), "{message}");
        }
        other => panic!("expected validation error, got {other:?}"),
    }

    let stranger = support::create_user(pool, "stranger").await;
    assert!(matches!(
        profiles::delete_address(pool, stranger, home.id).await,
        Err(AppError::NotFound(_))
    ));
    profiles::delete_address(pool, user, home.id).await.expect("delete");
    assert_eq!(profiles::list_addresses(pool, user).await.expect("list").len(), 2);
}

#[actix_web::test]
async fn seller_profile_is_registered_once() {
    let Some(test_db) = support::init_test_db().await else {
        return;
    };
    let pool = &test_db.pool;
    let user = support::create_user(pool, "vendor").await;

    let registration: SellerRegistration =
        serde_json::from_value(json!({ "business_name": "Second Spin" })).expect("registration");
    let seller = profiles::register_seller(pool, user, &registration)
        .await
        .expect("register");
    assert_eq!(seller.business_name, "Second Spin");
    assert!(!seller.is_verified);

    assert!(matches!(
        profiles::register_seller(pool, user, &registration).await,
        Err(AppError::AlreadyExists(_))
    ));

    let overview = profiles::profile_overview(pool, user).await.expect("overview");
    assert_eq!(overview.seller.map(|s| s.id), Some(seller.id));
}
