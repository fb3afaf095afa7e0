//! Database operations for feeds, comments, sub-comments and their likes
//!
//! Likes and comments are child tables; their order is the insertion order
//! (`rowid`). Path lookups (`comment_author`, `sub_comment_author`) join back
//! to the parent so an id that exists under a different feed or comment does
//! not resolve.

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use uuid::Uuid;

use crate::shared::feed::{CommentPath, CreateFeedRequest, FeedOrder, FeedPage, SubCommentPath, FEED_PAGE_SIZE};
use crate::shared::UserSummary;

/// A feed row without its child collections
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FeedRow {
    pub id: Uuid,
    pub writer_id: Uuid,
    pub feed_type: String,
    pub type_id: Option<String>,
    pub title: String,
    pub text: String,
    pub images: Json<Vec<String>>,
    pub is_anonymous: bool,
    pub sub_category: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A comment or sub-comment joined with its author
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CommentRow {
    pub id: Uuid,
    pub comment: String,
    pub created_at: DateTime<Utc>,
    pub user_id: Uuid,
    pub uid: String,
    pub name: String,
    pub profile_image: Option<String>,
}

impl CommentRow {
    pub fn author(&self) -> UserSummary {
        UserSummary {
            id: self.user_id,
            uid: self.uid.clone(),
            name: self.name.clone(),
            profile_image: self.profile_image.clone(),
        }
    }
}

const FEED_COLUMNS: &str = "id, writer_id, type AS feed_type, type_id, title, text, images, \
                            is_anonymous, sub_category, created_at";

// Feeds

pub async fn insert_feed(
    conn: &mut SqliteConnection,
    writer_id: Uuid,
    request: &CreateFeedRequest,
    images: &[String],
) -> Result<Uuid, sqlx::Error> {
    let id = Uuid::new_v4();
    let type_id = request
        .type_id
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    sqlx::query(
        r#"
        INSERT INTO feeds (id, writer_id, type, type_id, title, text, images, is_anonymous, sub_category, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id)
    .bind(writer_id)
    .bind(&request.feed_type)
    .bind(type_id)
    .bind(&request.title)
    .bind(&request.text)
    .bind(Json(images.to_vec()))
    .bind(request.is_anonymous)
    .bind(&request.sub_category)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    Ok(id)
}

/// One page of feeds, optionally filtered by type and type id
///
/// A blank `type_id` is treated as absent.
pub async fn list_feeds(
    conn: &mut SqliteConnection,
    feed_type: Option<&str>,
    type_id: Option<&str>,
    page: &FeedPage,
) -> Result<Vec<FeedRow>, sqlx::Error> {
    let mut query: QueryBuilder<Sqlite> =
        QueryBuilder::new(format!("SELECT {} FROM feeds WHERE 1 = 1", FEED_COLUMNS));

    if let Some(feed_type) = feed_type {
        query.push(" AND type = ").push_bind(feed_type.to_string());
    }
    if let Some(type_id) = type_id.map(str::trim).filter(|s| !s.is_empty()) {
        query.push(" AND type_id = ").push_bind(type_id.to_string());
    }

    query.push(match page.order() {
        FeedOrder::NewestFirst => " ORDER BY created_at DESC, rowid DESC",
        FeedOrder::OldestFirst => " ORDER BY created_at ASC, rowid ASC",
    });
    query
        .push(" LIMIT ")
        .push_bind(i64::from(FEED_PAGE_SIZE))
        .push(" OFFSET ")
        .push_bind(page.offset());

    query.build_query_as::<FeedRow>().fetch_all(&mut *conn).await
}

pub async fn get_feed(conn: &mut SqliteConnection, id: Uuid) -> Result<Option<FeedRow>, sqlx::Error> {
    let sql = format!("SELECT {} FROM feeds WHERE id = ?", FEED_COLUMNS);
    sqlx::query_as::<_, FeedRow>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
}

/// Writer of a feed, `None` when the feed does not exist
pub async fn feed_writer(conn: &mut SqliteConnection, id: Uuid) -> Result<Option<Uuid>, sqlx::Error> {
    sqlx::query_scalar::<_, Uuid>("SELECT writer_id FROM feeds WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
}

// Feed likes

/// Every liker of a feed in like order
pub async fn feed_likers(conn: &mut SqliteConnection, feed_id: Uuid) -> Result<Vec<UserSummary>, sqlx::Error> {
    sqlx::query_as::<_, UserSummary>(
        r#"
        SELECT u.id, u.uid, u.name, u.profile_image
        FROM feed_likes l
        JOIN users u ON u.id = l.user_id
        WHERE l.feed_id = ?
        ORDER BY l.rowid
        "#,
    )
    .bind(feed_id)
    .fetch_all(&mut *conn)
    .await
}

pub async fn count_feed_likes(conn: &mut SqliteConnection, feed_id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM feed_likes WHERE feed_id = ?")
        .bind(feed_id)
        .fetch_one(&mut *conn)
        .await
}

/// Add a like; returns `false` when the user already liked the feed
pub async fn insert_feed_like(
    conn: &mut SqliteConnection,
    feed_id: Uuid,
    user_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO feed_likes (feed_id, user_id, created_at)
        VALUES (?, ?, ?)
        ON CONFLICT (feed_id, user_id) DO NOTHING
        "#,
    )
    .bind(feed_id)
    .bind(user_id)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Remove a like; returns `false` when there was none
pub async fn delete_feed_like(
    conn: &mut SqliteConnection,
    feed_id: Uuid,
    user_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM feed_likes WHERE feed_id = ? AND user_id = ?")
        .bind(feed_id)
        .bind(user_id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected() == 1)
}

// Comments

pub async fn comments_for_feed(
    conn: &mut SqliteConnection,
    feed_id: Uuid,
) -> Result<Vec<CommentRow>, sqlx::Error> {
    sqlx::query_as::<_, CommentRow>(
        r#"
        SELECT c.id, c.comment, c.created_at, u.id AS user_id, u.uid, u.name, u.profile_image
        FROM comments c
        JOIN users u ON u.id = c.user_id
        WHERE c.feed_id = ?
        ORDER BY c.rowid
        "#,
    )
    .bind(feed_id)
    .fetch_all(&mut *conn)
    .await
}

pub async fn insert_comment(
    conn: &mut SqliteConnection,
    feed_id: Uuid,
    user_id: Uuid,
    content: &str,
) -> Result<Uuid, sqlx::Error> {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO comments (id, feed_id, user_id, comment, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(id)
    .bind(feed_id)
    .bind(user_id)
    .bind(content)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    Ok(id)
}

/// Author of the comment at `path`, `None` when the path does not resolve
pub async fn comment_author(
    conn: &mut SqliteConnection,
    path: &CommentPath,
) -> Result<Option<Uuid>, sqlx::Error> {
    sqlx::query_scalar::<_, Uuid>("SELECT user_id FROM comments WHERE id = ? AND feed_id = ?")
        .bind(path.comment_id)
        .bind(path.feed_id)
        .fetch_optional(&mut *conn)
        .await
}

pub async fn update_comment(
    conn: &mut SqliteConnection,
    path: &CommentPath,
    content: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE comments SET comment = ? WHERE id = ? AND feed_id = ?")
        .bind(content)
        .bind(path.comment_id)
        .bind(path.feed_id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected() == 1)
}

/// Delete a comment together with its sub-comments and likes
pub async fn delete_comment(conn: &mut SqliteConnection, path: &CommentPath) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM comments WHERE id = ? AND feed_id = ?")
        .bind(path.comment_id)
        .bind(path.feed_id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected() == 1)
}

pub async fn comment_like_ids(conn: &mut SqliteConnection, comment_id: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
    sqlx::query_scalar::<_, Uuid>("SELECT user_id FROM comment_likes WHERE comment_id = ? ORDER BY rowid")
        .bind(comment_id)
        .fetch_all(&mut *conn)
        .await
}

pub async fn insert_comment_like(
    conn: &mut SqliteConnection,
    comment_id: Uuid,
    user_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO comment_likes (comment_id, user_id)
        VALUES (?, ?)
        ON CONFLICT (comment_id, user_id) DO NOTHING
        "#,
    )
    .bind(comment_id)
    .bind(user_id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub async fn delete_comment_like(
    conn: &mut SqliteConnection,
    comment_id: Uuid,
    user_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM comment_likes WHERE comment_id = ? AND user_id = ?")
        .bind(comment_id)
        .bind(user_id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

// Sub-comments

pub async fn sub_comments_for_comment(
    conn: &mut SqliteConnection,
    comment_id: Uuid,
) -> Result<Vec<CommentRow>, sqlx::Error> {
    sqlx::query_as::<_, CommentRow>(
        r#"
        SELECT s.id, s.comment, s.created_at, u.id AS user_id, u.uid, u.name, u.profile_image
        FROM sub_comments s
        JOIN users u ON u.id = s.user_id
        WHERE s.comment_id = ?
        ORDER BY s.rowid
        "#,
    )
    .bind(comment_id)
    .fetch_all(&mut *conn)
    .await
}

pub async fn insert_sub_comment(
    conn: &mut SqliteConnection,
    comment_id: Uuid,
    user_id: Uuid,
    content: &str,
) -> Result<Uuid, sqlx::Error> {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO sub_comments (id, comment_id, user_id, comment, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(id)
    .bind(comment_id)
    .bind(user_id)
    .bind(content)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    Ok(id)
}

/// Author of the sub-comment at `path`, `None` when the path does not resolve
pub async fn sub_comment_author(
    conn: &mut SqliteConnection,
    path: &SubCommentPath,
) -> Result<Option<Uuid>, sqlx::Error> {
    sqlx::query_scalar::<_, Uuid>(
        r#"
        SELECT s.user_id
        FROM sub_comments s
        JOIN comments c ON c.id = s.comment_id
        WHERE s.id = ? AND c.id = ? AND c.feed_id = ?
        "#,
    )
    .bind(path.sub_comment_id)
    .bind(path.comment.comment_id)
    .bind(path.comment.feed_id)
    .fetch_optional(&mut *conn)
    .await
}

/// Update a sub-comment already resolved through `sub_comment_author`
pub async fn update_sub_comment(
    conn: &mut SqliteConnection,
    path: &SubCommentPath,
    content: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE sub_comments SET comment = ? WHERE id = ? AND comment_id = ?")
        .bind(content)
        .bind(path.sub_comment_id)
        .bind(path.comment.comment_id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected() == 1)
}

pub async fn delete_sub_comment(conn: &mut SqliteConnection, path: &SubCommentPath) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM sub_comments WHERE id = ? AND comment_id = ?")
        .bind(path.sub_comment_id)
        .bind(path.comment.comment_id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected() == 1)
}

pub async fn sub_comment_like_ids(
    conn: &mut SqliteConnection,
    sub_comment_id: Uuid,
) -> Result<Vec<Uuid>, sqlx::Error> {
    sqlx::query_scalar::<_, Uuid>(
        "SELECT user_id FROM sub_comment_likes WHERE sub_comment_id = ? ORDER BY rowid",
    )
    .bind(sub_comment_id)
    .fetch_all(&mut *conn)
    .await
}

pub async fn insert_sub_comment_like(
    conn: &mut SqliteConnection,
    sub_comment_id: Uuid,
    user_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO sub_comment_likes (sub_comment_id, user_id)
        VALUES (?, ?)
        ON CONFLICT (sub_comment_id, user_id) DO NOTHING
        "#,
    )
    .bind(sub_comment_id)
    .bind(user_id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub async fn delete_sub_comment_like(
    conn: &mut SqliteConnection,
    sub_comment_id: Uuid,
    user_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM sub_comment_likes WHERE sub_comment_id = ? AND user_id = ?")
        .bind(sub_comment_id)
        .bind(user_id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}
