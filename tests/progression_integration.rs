use serde_json::json;
use sqlx::{PgPool, Row};

use resale_market::catalog::{self, NewProduct};
use resale_market::error::AppError;
use resale_market::progression;

mod support;

async fn milestone_count(pool: &PgPool, user_id: i32) -> i64 {
    sqlx::query("SELECT COUNT(*) AS n FROM user_milestones WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await
        .expect("count")
        .get("n")
}

async fn milestone_id(pool: &PgPool, points_required: i32) -> i32 {
    sqlx::query("SELECT id FROM milestones WHERE points_required = $1")
        .bind(points_required)
        .fetch_one(pool)
        .await
        .expect("seeded milestone")
        .get("id")
}

#[actix_web::test]
async fn crossing_one_hundred_reaches_level_two_and_awards_once() {
    let Some(test_db) = support::init_test_db().await else {
        return;
    };
    let pool = &test_db.pool;
    let user = support::create_user(pool, "seller").await;

    let first = progression::grant_points(pool, user, 95).await.expect("95 points");
    assert_eq!(first.points, 95);
    assert_eq!(first.level, 1);
    assert_eq!(first.awarded.len(), 1);
    assert_eq!(first.awarded[0].points_required, 10);

    let second = progression::grant_points(pool, user, 10).await.expect("10 points");
    assert_eq!(second.points, 105);
    assert_eq!(second.level, 2);
    assert!(second.leveled_up());
    assert_eq!(second.awarded.len(), 1);
    assert_eq!(second.awarded[0].points_required, 100);

    assert!(progression::check_milestones(pool, user).await.expect("recheck").is_empty());
    assert_eq!(milestone_count(pool, user).await, 2);
}

#[actix_web::test]
async fn concurrent_evaluation_never_duplicates_awards() {
    let Some(test_db) = support::init_test_db().await else {
        return;
    };
    let pool = &test_db.pool;
    let user = support::create_user(pool, "seller").await;

    sqlx::query("UPDATE user_profiles SET points = 105 WHERE user_id = $1")
        .bind(user)
        .execute(pool)
        .await
        .expect("set points");

    let (a, b) = tokio::join!(
        progression::check_milestones(pool, user),
        progression::check_milestones(pool, user)
    );
    let awarded = a.expect("first check").len() + b.expect("second check").len();
    assert_eq!(awarded, 2);
    assert_eq!(milestone_count(pool, user).await, 2);

    let (c, d) = tokio::join!(
        progression::grant_points(pool, user, 100),
        progression::grant_points(pool, user, 100)
    );
    let c = c.expect("grant c");
    let d = d.expect("grant d");
    assert_eq!(c.points.max(d.points), 305);
    assert_eq!(c.awarded.len() + d.awarded.len(), 1);
    assert_eq!(milestone_count(pool, user).await, 3);
}

#[actix_web::test]
async fn negative_grants_are_rejected() {
    let Some(test_db) = support::init_test_db().await else {
        return;
    };
    let pool = &test_db.pool;
    let user = support::create_user(pool, "seller").await;

    assert!(matches!(
        progression::grant_points(pool, user, -5).await,
        Err(AppError::Validation(_))
    ));
}

#[actix_web::test]
async fn claim_checks_points_and_reports_creation() {
    let Some(test_db) = support::init_test_db().await else {
        return;
    };
    let pool = &test_db.pool;
    let user = support::create_user(pool, "seller").await;
    progression::grant_points(pool, user, 120).await.expect("grant");

    let rising_star = milestone_id(pool, 250).await;
    assert!(matches!(
        progression::claim_milestone(pool, user, rising_star).await,
        Err(AppError::InsufficientPoints {
            required: 250,
            available: 120
        })
    ));

    let auto_awarded = milestone_id(pool, 100).await;
    let claim = progression::claim_milestone(pool, user, auto_awarded)
        .await
        .expect("claim awarded");
    assert!(!claim.created);

    let late: i32 = sqlx::query(
        r#"INSERT INTO milestones (name, description, points_required, reward_type)
           VALUES ('Late Bloomer', 'Added after the fact', 50, 'title')
           RETURNING id"#,
    )
    .fetch_one(pool)
    .await
    .expect("insert milestone")
    .get("id");

    let first = progression::claim_milestone(pool, user, late).await.expect("claim new");
    assert!(first.created);
    let again = progression::claim_milestone(pool, user, late).await.expect("claim again");
    assert!(!again.created);

    let claimed: Vec<bool> = progression::user_milestones(pool, user)
        .await
        .expect("user milestones")
        .iter()
        .filter(|m| m.milestone_id == late || m.milestone_id == auto_awarded)
        .map(|m| m.is_claimed)
        .collect();
    assert_eq!(claimed, vec![true, true]);

    sqlx::query("UPDATE milestones SET is_active = FALSE WHERE id = $1")
        .bind(late)
        .execute(pool)
        .await
        .expect("deactivate");
    assert!(matches!(
        progression::claim_milestone(pool, user, late).await,
        Err(AppError::NotFound(_))
    ));
}

#[actix_web::test]
async fn listing_a_product_credits_the_seller() {
    let Some(test_db) = support::init_test_db().await else {
        return;
    };
    let pool = &test_db.pool;
    let seller = support::create_user(pool, "seller").await;
    let category = support::create_category(pool).await;

    let new: NewProduct = serde_json::from_value(json!({
        "title": "Walnut Bookshelf",
        "category_id": category,
        "price": "1500.00",
        "original_price": "2000.00",
        "condition": "excellent"
    }))
    .expect("new product");

    let first = catalog::create_product(pool, seller, &new).await.expect("list");
    assert_eq!(first.product.slug, "walnut-bookshelf");
    assert!(first.product.published_at.is_some());
    assert_eq!(first.product.discount_percentage(), 25);
    assert_eq!(first.progression.points, 10);
    assert_eq!(first.progression.awarded.len(), 1);

    let second = catalog::create_product(pool, seller, &new).await.expect("list again");
    assert_eq!(second.product.slug, "walnut-bookshelf-2");
    assert_eq!(second.progression.points, 20);
    assert!(second.progression.awarded.is_empty());

    let row = sqlx::query("SELECT points, total_products_listed FROM user_profiles WHERE user_id = $1")
        .bind(seller)
        .fetch_one(pool)
        .await
        .expect("profile");
    assert_eq!(row.get::<i32, _>("points"), 20);
    assert_eq!(row.get::<i32, _>("total_products_listed"), 2);

    let missing_category: NewProduct = serde_json::from_value(json!({
        "title": "Orphan",
        "category_id": category + 1000,
        "price": 10,
        "condition": "good"
    }))
    .expect("new product");
    assert!(matches!(
        catalog::create_product(pool, seller, &missing_category).await,
        Err(AppError::NotFound(_))
    ));

    let points: i32 = sqlx::query("SELECT points FROM user_profiles WHERE user_id = $1")
        .bind(seller)
        .fetch_one(pool)
        .await
        .expect("profile")
        .get("points");
    assert_eq!(points, 20);
}
