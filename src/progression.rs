// src/progression.rs

use serde::Serialize;
use sqlx::{PgConnection, PgPool, Row};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::models::{Milestone, UserMilestone};

/// `(level, points)`: reaching `points` completes `level`.
pub const LEVEL_THRESHOLDS: [(i32, i32); 10] = [
    (1, 100),
    (2, 250),
    (3, 500),
    (4, 1000),
    (5, 2000),
    (6, 3500),
    (7, 5000),
    (8, 7500),
    (9, 10000),
    (10, 15000),
];

/// Credited to a seller for every new listing.
pub const LISTING_POINTS: i32 = 10;

pub const MAX_LEVEL: i32 = LEVEL_THRESHOLDS.len() as i32 + 1;

/// Level is always derived from the point total, never stepped.
///
/// The result is one more than the number of thresholds reached, so it is
/// offset by one from the table's level column: 100 points completes level 1
/// and lands on level 2, and the top entry (10, 15000) yields level 11.
pub fn level_for_points(points: i32) -> i32 {
    1 + LEVEL_THRESHOLDS
        .iter()
        .filter(|(_, threshold)| *threshold <= points)
        .count() as i32
}

fn threshold_of(level: i32) -> Option<i32> {
    LEVEL_THRESHOLDS
        .iter()
        .find(|(l, _)| *l == level)
        .map(|(_, threshold)| *threshold)
}

pub fn points_to_next_level(points: i32, level: i32) -> i32 {
    threshold_of(level).map_or(0, |threshold| (threshold - points).max(0))
}

/// Percentage through the current level, 0..=100.
pub fn level_progress(points: i32, level: i32) -> f64 {
    let Some(upper) = threshold_of(level) else {
        return 100.0;
    };
    let lower = threshold_of(level - 1).unwrap_or(0);

    let progress = f64::from(points - lower) / f64::from(upper - lower) * 100.0;
    progress.clamp(0.0, 100.0)
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PointsUpdate {
    pub points: i32,
    pub level: i32,
    pub previous_level: i32,
    /// Milestones this call awarded. Ones awarded earlier are not repeated.
    pub awarded: Vec<Milestone>,
}

impl PointsUpdate {
    pub fn leveled_up(&self) -> bool {
        self.level > self.previous_level
    }
}

/// Adds points, re-derives the level and awards any milestones now in reach.
///
/// Locks the profile row, so run it inside a transaction; [`grant_points`]
/// does that for callers that hold only a pool.
pub async fn add_points(
    conn: &mut PgConnection,
    user_id: i32,
    amount: i32,
) -> Result<PointsUpdate, AppError> {
    if amount < 0 {
        return Err(AppError::validation("Points can only be added"));
    }

    let row = sqlx::query("SELECT points, level FROM user_profiles WHERE user_id = $1 FOR UPDATE")
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(AppError::NotFound("Profile"))?;

    let current: i32 = row.try_get("points")?;
    let previous_level: i32 = row.try_get("level")?;

    let points = current.saturating_add(amount);
    let level = level_for_points(points);

    sqlx::query(
        r#"UPDATE user_profiles
           SET points = $2, level = $3, updated_at = NOW()
           WHERE user_id = $1"#,
    )
    .bind(user_id)
    .bind(points)
    .bind(level)
    .execute(&mut *conn)
    .await?;

    let awarded = award_milestones(conn, user_id, points).await?;

    Ok(PointsUpdate {
        points,
        level,
        previous_level,
        awarded,
    })
}

pub async fn grant_points(pool: &PgPool, user_id: i32, amount: i32) -> Result<PointsUpdate, AppError> {
    let mut tx = pool.begin().await?;
    let update = add_points(&mut tx, user_id, amount).await?;
    tx.commit().await?;
    Ok(update)
}

/// Inserts every active milestone at or under `points` that the user does
/// not hold yet. The (user, milestone) unique key turns a racing duplicate
/// into a no-op, so concurrent callers never double-award.
pub async fn award_milestones(
    conn: &mut PgConnection,
    user_id: i32,
    points: i32,
) -> Result<Vec<Milestone>, AppError> {
    let awarded = sqlx::query_as::<_, Milestone>(
        r#"WITH awarded AS (
               INSERT INTO user_milestones (user_id, milestone_id)
               SELECT $1, m.id
               FROM milestones m
               WHERE m.is_active AND m.points_required <= $2
               ORDER BY m.id
               ON CONFLICT (user_id, milestone_id) DO NOTHING
               RETURNING milestone_id
           )
           SELECT m.id, m.name, m.description, m.points_required, m.reward_type,
                  m.reward_value, m.icon, m.is_active
           FROM milestones m
           JOIN awarded a ON a.milestone_id = m.id
           ORDER BY m.points_required"#,
    )
    .bind(user_id)
    .bind(points)
    .fetch_all(&mut *conn)
    .await?;

    for milestone in &awarded {
        log::info!(
            "milestone awarded user_id={} milestone={} points={}",
            user_id,
            milestone.name,
            points
        );
    }

    Ok(awarded)
}

/// Re-runs milestone evaluation against the stored point total.
pub async fn check_milestones(pool: &PgPool, user_id: i32) -> Result<Vec<Milestone>, AppError> {
    let mut conn = pool.acquire().await?;

    let points: i32 = sqlx::query("SELECT points FROM user_profiles WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(AppError::NotFound("Profile"))?
        .try_get("points")?;

    award_milestones(&mut conn, user_id, points).await
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ClaimOutcome {
    pub milestone: Milestone,
    /// `false` when the milestone had already been awarded automatically or
    /// claimed before.
    pub created: bool,
}

pub async fn claim_milestone(
    pool: &PgPool,
    user_id: i32,
    milestone_id: i32,
) -> Result<ClaimOutcome, AppError> {
    let milestone = sqlx::query_as::<_, Milestone>(
        r#"SELECT id, name, description, points_required, reward_type, reward_value, icon, is_active
           FROM milestones
           WHERE id = $1 AND is_active"#,
    )
    .bind(milestone_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Milestone"))?;

    let available: i32 = sqlx::query("SELECT points FROM user_profiles WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("Profile"))?
        .try_get("points")?;

    if available < milestone.points_required {
        return Err(AppError::InsufficientPoints {
            required: milestone.points_required,
            available,
        });
    }

    // xmax is 0 only on a freshly inserted tuple.
    let created: bool = sqlx::query(
        r#"INSERT INTO user_milestones (user_id, milestone_id, is_claimed)
           VALUES ($1, $2, TRUE)
           ON CONFLICT (user_id, milestone_id) DO UPDATE SET is_claimed = TRUE
           RETURNING (xmax = 0) AS created"#,
    )
    .bind(user_id)
    .bind(milestone_id)
    .fetch_one(pool)
    .await?
    .try_get("created")?;

    Ok(ClaimOutcome { milestone, created })
}

pub async fn list_milestones(pool: &PgPool) -> Result<Vec<Milestone>, AppError> {
    let milestones = sqlx::query_as::<_, Milestone>(
        r#"SELECT id, name, description, points_required, reward_type, reward_value, icon, is_active
           FROM milestones
           WHERE is_active
           ORDER BY points_required, id"#,
    )
    .fetch_all(pool)
    .await?;

    Ok(milestones)
}

pub async fn user_milestones(pool: &PgPool, user_id: i32) -> Result<Vec<UserMilestone>, AppError> {
    let milestones = sqlx::query_as::<_, UserMilestone>(
        r#"SELECT um.milestone_id, m.name, m.points_required, m.reward_type, m.reward_value,
                  um.achieved_at, um.is_claimed
           FROM user_milestones um
           JOIN milestones m ON m.id = um.milestone_id
           WHERE um.user_id = $1
           ORDER BY um.achieved_at DESC, um.id DESC"#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(milestones)
}

/// The cheapest active milestone the user has not been awarded yet.
pub async fn next_milestone(pool: &PgPool, user_id: i32) -> Result<Option<Milestone>, AppError> {
    let milestone = sqlx::query_as::<_, Milestone>(
        r#"SELECT m.id, m.name, m.description, m.points_required, m.reward_type, m.reward_value,
                  m.icon, m.is_active
           FROM milestones m
           WHERE m.is_active
             AND NOT EXISTS (
                 SELECT 1 FROM user_milestones um
                 WHERE um.milestone_id = m.id AND um.user_id = $1
             )
           ORDER BY m.points_required, m.id
           LIMIT 1"#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(milestone)
}
