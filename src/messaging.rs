// src/messaging.rs

use serde::Serialize;
use sqlx::{PgConnection, PgPool, Row};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::models::{Chat, ChatSummary, Message};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct ChatStart {
    pub chat_id: i32,
    /// `false` when an existing thread between the pair was reused.
    pub created: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Participant {
    pub user_id: i32,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ChatThread {
    pub chat: Chat,
    pub other: Participant,
    pub product_title: Option<String>,
    /// Oldest first.
    pub messages: Vec<Message>,
}

async fn is_participant(conn: &mut PgConnection, chat_id: i32, user_id: i32) -> Result<bool, AppError> {
    let row = sqlx::query("SELECT 1 FROM chat_participants WHERE chat_id = $1 AND user_id = $2")
        .bind(chat_id)
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(row.is_some())
}

/// Opens the single thread between two users, reusing it if it exists.
///
/// This is the only writer of `chat_participants`; it always inserts exactly
/// two distinct members. An advisory lock on the ordered pair serializes
/// concurrent starts so the pair never ends up with two threads.
pub async fn start_chat(
    pool: &PgPool,
    user_id: i32,
    other_user_id: i32,
    product_id: Option<i32>,
) -> Result<ChatStart, AppError> {
    if user_id == other_user_id {
        return Err(AppError::InvalidParticipant);
    }

    let mut tx = pool.begin().await?;

    sqlx::query("SELECT pg_advisory_xact_lock($1, $2)")
        .bind(user_id.min(other_user_id))
        .bind(user_id.max(other_user_id))
        .execute(&mut *tx)
        .await?;

    let other_exists = sqlx::query("SELECT 1 FROM users WHERE id = $1")
        .bind(other_user_id)
        .fetch_optional(&mut *tx)
        .await?;
    if other_exists.is_none() {
        return Err(AppError::NotFound("User"));
    }

    let existing = sqlx::query(
        r#"SELECT c.id
           FROM chats c
           WHERE EXISTS (SELECT 1 FROM chat_participants p WHERE p.chat_id = c.id AND p.user_id = $1)
             AND EXISTS (SELECT 1 FROM chat_participants p WHERE p.chat_id = c.id AND p.user_id = $2)
             AND (SELECT COUNT(*) FROM chat_participants p WHERE p.chat_id = c.id) = 2
           ORDER BY c.updated_at DESC
           LIMIT 1"#,
    )
    .bind(user_id)
    .bind(other_user_id)
    .fetch_optional(&mut *tx)
    .await?;

    if let Some(row) = existing {
        let chat_id: i32 = row.try_get("id")?;
        tx.commit().await?;
        return Ok(ChatStart {
            chat_id,
            created: false,
        });
    }

    // An unknown product id just leaves the chat without an anchor.
    let product_id = match product_id {
        Some(id) => sqlx::query("SELECT id FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .map(|r| r.get::<i32, _>("id")),
        None => None,
    };

    let chat_id: i32 = sqlx::query("INSERT INTO chats (product_id) VALUES ($1) RETURNING id")
        .bind(product_id)
        .fetch_one(&mut *tx)
        .await?
        .try_get("id")?;

    sqlx::query("INSERT INTO chat_participants (chat_id, user_id) VALUES ($1, $2), ($1, $3)")
        .bind(chat_id)
        .bind(user_id)
        .bind(other_user_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(ChatStart {
        chat_id,
        created: true,
    })
}

pub async fn send_message(
    pool: &PgPool,
    chat_id: i32,
    sender_id: i32,
    content: &str,
) -> Result<Message, AppError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(AppError::EmptyMessage);
    }

    let mut tx = pool.begin().await?;

    if !is_participant(&mut tx, chat_id, sender_id).await? {
        return Err(AppError::NotParticipant);
    }

    let message = sqlx::query_as::<_, Message>(
        r#"INSERT INTO messages (chat_id, sender_id, content)
           VALUES ($1, $2, $3)
           RETURNING id, chat_id, sender_id, content, is_read, created_at"#,
    )
    .bind(chat_id)
    .bind(sender_id)
    .bind(content)
    .fetch_one(&mut *tx)
    .await?;

    // clock_timestamp so two sends in quick succession still order correctly.
    sqlx::query("UPDATE chats SET updated_at = clock_timestamp() WHERE id = $1")
        .bind(chat_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(message)
}

/// Loads a thread for one of its members and marks the other side's
/// messages read.
pub async fn open_chat(pool: &PgPool, chat_id: i32, viewer_id: i32) -> Result<ChatThread, AppError> {
    let mut conn = pool.acquire().await?;

    if !is_participant(&mut conn, chat_id, viewer_id).await? {
        return Err(AppError::NotParticipant);
    }

    sqlx::query(
        r#"UPDATE messages SET is_read = TRUE
           WHERE chat_id = $1 AND sender_id <> $2 AND NOT is_read"#,
    )
    .bind(chat_id)
    .bind(viewer_id)
    .execute(&mut *conn)
    .await?;

    let chat = sqlx::query_as::<_, Chat>(
        "SELECT id, product_id, is_active, created_at, updated_at FROM chats WHERE id = $1",
    )
    .bind(chat_id)
    .fetch_one(&mut *conn)
    .await?;

    let other_row = sqlx::query(
        r#"SELECT u.id, u.username
           FROM chat_participants p
           JOIN users u ON u.id = p.user_id
           WHERE p.chat_id = $1 AND p.user_id <> $2"#,
    )
    .bind(chat_id)
    .bind(viewer_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(AppError::NotFound("Chat"))?;

    let product_title = match chat.product_id {
        Some(product_id) => sqlx::query("SELECT title FROM products WHERE id = $1")
            .bind(product_id)
            .fetch_optional(&mut *conn)
            .await?
            .map(|r| r.get::<String, _>("title")),
        None => None,
    };

    let messages = sqlx::query_as::<_, Message>(
        r#"SELECT id, chat_id, sender_id, content, is_read, created_at
           FROM messages
           WHERE chat_id = $1
           ORDER BY created_at, id"#,
    )
    .bind(chat_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(ChatThread {
        chat,
        other: Participant {
            user_id: other_row.try_get("id")?,
            username: other_row.try_get("username")?,
        },
        product_title,
        messages,
    })
}

/// The user's threads, most recently active first.
pub async fn list_chats(pool: &PgPool, user_id: i32) -> Result<Vec<ChatSummary>, AppError> {
    let chats = sqlx::query_as::<_, ChatSummary>(
        r#"SELECT c.id AS chat_id,
                  other.user_id AS other_user_id,
                  u.username AS other_username,
                  c.product_id,
                  p.title AS product_title,
                  latest.content AS last_message,
                  latest.created_at AS last_message_at,
                  (SELECT COUNT(*) FROM messages m
                   WHERE m.chat_id = c.id AND m.sender_id <> $1 AND NOT m.is_read) AS unread_count,
                  c.updated_at
           FROM chat_participants me
           JOIN chats c ON c.id = me.chat_id
           JOIN chat_participants other ON other.chat_id = c.id AND other.user_id <> me.user_id
           JOIN users u ON u.id = other.user_id
           LEFT JOIN products p ON p.id = c.product_id
           LEFT JOIN LATERAL (
               SELECT m.content, m.created_at
               FROM messages m
               WHERE m.chat_id = c.id
               ORDER BY m.created_at DESC, m.id DESC
               LIMIT 1
           ) latest ON TRUE
           WHERE me.user_id = $1
           ORDER BY c.updated_at DESC, c.id DESC"#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(chats)
}
