/**
 * Feed Service
 *
 * Reads assemble a feed with its writer, like display, comments and
 * sub-comments. Mutations address comments by path (feed → comment →
 * sub-comment); a path whose segments do not belong together is `NotFound`.
 *
 * Comment and like mutations that move points run in one transaction with
 * the point change and its log entry.
 */

use std::sync::Arc;

use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::backend::error::{BackendError, BackendResult};
use crate::backend::feed::db::{self, FeedRow};
use crate::backend::images::ImageStore;
use crate::backend::points::{award, PointRule};
use crate::backend::users::db::get_user_summary;
use crate::shared::feed::{
    arrange_likes, validate_comment, CommentPath, CommentView, CreateFeedRequest, FeedPage,
    FeedView, LikeToggle, SubCommentPath, SubCommentView,
};
use crate::shared::{parse_id, Identity, UserSummary};

/// Image bucket feed uploads go to
const FEED_IMAGE_BUCKET: &str = "feed";

#[derive(Clone)]
pub struct FeedService {
    pool: SqlitePool,
    images: Arc<dyn ImageStore>,
}

impl FeedService {
    pub fn new(pool: SqlitePool, images: Arc<dyn ImageStore>) -> Self {
        Self { pool, images }
    }

    /// One page of feeds of a type, optionally narrowed by type id
    pub async fn find_feed_by_type(
        &self,
        caller: &Identity,
        feed_type: &str,
        type_id: Option<&str>,
        page: FeedPage,
    ) -> BackendResult<Vec<FeedView>> {
        let mut conn = self.pool.acquire().await?;
        let rows = db::list_feeds(&mut conn, Some(feed_type), type_id, &page).await?;
        load_views(&mut conn, rows, caller).await
    }

    /// One page of feeds of every type
    pub async fn find_all_feeds(&self, caller: &Identity, page: FeedPage) -> BackendResult<Vec<FeedView>> {
        let mut conn = self.pool.acquire().await?;
        let rows = db::list_feeds(&mut conn, None, None, &page).await?;
        load_views(&mut conn, rows, caller).await
    }

    pub async fn find_feed_by_id(&self, caller: &Identity, id: &str) -> BackendResult<FeedView> {
        let feed_id = parse_id("feedId", id)?;
        let mut conn = self.pool.acquire().await?;
        let row = db::get_feed(&mut conn, feed_id)
            .await?
            .ok_or_else(|| BackendError::not_found("feed", id))?;
        load_view(&mut conn, row, caller).await
    }

    /// Every liker of a feed in like order
    pub async fn find_feed_like_by_id(&self, id: &str) -> BackendResult<Vec<UserSummary>> {
        let feed_id = parse_id("feedId", id)?;
        let mut conn = self.pool.acquire().await?;
        if db::feed_writer(&mut conn, feed_id).await?.is_none() {
            return Err(BackendError::not_found("feed", id));
        }
        Ok(db::feed_likers(&mut conn, feed_id).await?)
    }

    /// Upload the attached images, then store the feed with the caller as writer
    pub async fn create_feed(&self, caller: &Identity, mut request: CreateFeedRequest) -> BackendResult<Uuid> {
        request.validate()?;

        let buffers = std::mem::take(&mut request.buffers);
        let images = if buffers.is_empty() {
            Vec::new()
        } else {
            self.images.upload(FEED_IMAGE_BUCKET, buffers).await?
        };

        let mut conn = self.pool.acquire().await?;
        let id = db::insert_feed(&mut conn, caller.id, &request, &images).await?;
        tracing::info!("Feed {} created by {} with {} image(s)", id, caller.uid, images.len());
        Ok(id)
    }

    /// Add a comment and pay its author
    pub async fn create_comment(&self, caller: &Identity, feed_id: &str, content: &str) -> BackendResult<Uuid> {
        validate_comment(content)?;
        let feed = parse_id("feedId", feed_id)?;

        let mut tx = self.pool.begin().await?;
        if db::feed_writer(&mut tx, feed).await?.is_none() {
            return Err(BackendError::not_found("feed", feed_id));
        }
        let id = db::insert_comment(&mut tx, feed, caller.id, content).await?;
        award(&mut tx, caller.id, PointRule::CommentWritten).await?;
        tx.commit().await?;

        tracing::debug!("Comment {} added to feed {}", id, feed);
        Ok(id)
    }

    pub async fn update_comment(
        &self,
        caller: &Identity,
        feed_id: &str,
        comment_id: &str,
        content: &str,
    ) -> BackendResult<()> {
        validate_comment(content)?;
        let path = CommentPath::parse(feed_id, comment_id)?;

        let mut conn = self.pool.acquire().await?;
        ensure_comment_author(&mut conn, &path, caller).await?;
        db::update_comment(&mut conn, &path, content).await?;
        Ok(())
    }

    pub async fn delete_comment(&self, caller: &Identity, feed_id: &str, comment_id: &str) -> BackendResult<()> {
        let path = CommentPath::parse(feed_id, comment_id)?;

        let mut conn = self.pool.acquire().await?;
        ensure_comment_author(&mut conn, &path, caller).await?;
        db::delete_comment(&mut conn, &path).await?;
        Ok(())
    }

    /// Add the caller to a comment's like set; liking twice is a no-op
    pub async fn create_comment_like(&self, caller: &Identity, feed_id: &str, comment_id: &str) -> BackendResult<()> {
        let path = CommentPath::parse(feed_id, comment_id)?;

        let mut conn = self.pool.acquire().await?;
        resolve_comment(&mut conn, &path).await?;
        db::insert_comment_like(&mut conn, path.comment_id, caller.id).await?;
        Ok(())
    }

    /// Remove the caller from a comment's like set; a no-op when absent
    pub async fn delete_comment_like(&self, caller: &Identity, feed_id: &str, comment_id: &str) -> BackendResult<()> {
        let path = CommentPath::parse(feed_id, comment_id)?;

        let mut conn = self.pool.acquire().await?;
        resolve_comment(&mut conn, &path).await?;
        db::delete_comment_like(&mut conn, path.comment_id, caller.id).await?;
        Ok(())
    }

    pub async fn create_sub_comment(
        &self,
        caller: &Identity,
        feed_id: &str,
        comment_id: &str,
        content: &str,
    ) -> BackendResult<Uuid> {
        validate_comment(content)?;
        let path = CommentPath::parse(feed_id, comment_id)?;

        let mut conn = self.pool.acquire().await?;
        resolve_comment(&mut conn, &path).await?;
        let id = db::insert_sub_comment(&mut conn, path.comment_id, caller.id, content).await?;
        Ok(id)
    }

    pub async fn update_sub_comment(
        &self,
        caller: &Identity,
        feed_id: &str,
        comment_id: &str,
        sub_comment_id: &str,
        content: &str,
    ) -> BackendResult<()> {
        validate_comment(content)?;
        let path = SubCommentPath::parse(feed_id, comment_id, sub_comment_id)?;

        let mut conn = self.pool.acquire().await?;
        ensure_sub_comment_author(&mut conn, &path, caller).await?;
        db::update_sub_comment(&mut conn, &path, content).await?;
        Ok(())
    }

    pub async fn delete_sub_comment(
        &self,
        caller: &Identity,
        feed_id: &str,
        comment_id: &str,
        sub_comment_id: &str,
    ) -> BackendResult<()> {
        let path = SubCommentPath::parse(feed_id, comment_id, sub_comment_id)?;

        let mut conn = self.pool.acquire().await?;
        ensure_sub_comment_author(&mut conn, &path, caller).await?;
        db::delete_sub_comment(&mut conn, &path).await?;
        Ok(())
    }

    pub async fn create_sub_comment_like(
        &self,
        caller: &Identity,
        feed_id: &str,
        comment_id: &str,
        sub_comment_id: &str,
    ) -> BackendResult<()> {
        let path = SubCommentPath::parse(feed_id, comment_id, sub_comment_id)?;

        let mut conn = self.pool.acquire().await?;
        resolve_sub_comment(&mut conn, &path).await?;
        db::insert_sub_comment_like(&mut conn, path.sub_comment_id, caller.id).await?;
        Ok(())
    }

    pub async fn delete_sub_comment_like(
        &self,
        caller: &Identity,
        feed_id: &str,
        comment_id: &str,
        sub_comment_id: &str,
    ) -> BackendResult<()> {
        let path = SubCommentPath::parse(feed_id, comment_id, sub_comment_id)?;

        let mut conn = self.pool.acquire().await?;
        resolve_sub_comment(&mut conn, &path).await?;
        db::delete_sub_comment_like(&mut conn, path.sub_comment_id, caller.id).await?;
        Ok(())
    }

    /// Flip the caller's like on a feed
    ///
    /// Liking pays the feed's writer, un-liking takes back less than was
    /// paid. Membership and points commit together.
    pub async fn toggle_like(&self, caller: &Identity, feed_id: &str) -> BackendResult<LikeToggle> {
        let feed = parse_id("feedId", feed_id)?;

        let mut tx = self.pool.begin().await?;
        let writer = db::feed_writer(&mut tx, feed)
            .await?
            .ok_or_else(|| BackendError::not_found("feed", feed_id))?;

        let liked = if db::delete_feed_like(&mut tx, feed, caller.id).await? {
            award(&mut tx, writer, PointRule::FeedUnliked).await?;
            false
        } else {
            db::insert_feed_like(&mut tx, feed, caller.id).await?;
            award(&mut tx, writer, PointRule::FeedLiked).await?;
            true
        };

        let like_cnt = db::count_feed_likes(&mut tx, feed).await?;
        tx.commit().await?;

        tracing::debug!("{} {} feed {}", caller.uid, if liked { "liked" } else { "un-liked" }, feed);
        Ok(LikeToggle { liked, like_cnt })
    }
}

async fn resolve_comment(conn: &mut SqliteConnection, path: &CommentPath) -> BackendResult<Uuid> {
    db::comment_author(conn, path)
        .await?
        .ok_or_else(|| BackendError::not_found("comment", path.comment_id))
}

async fn resolve_sub_comment(conn: &mut SqliteConnection, path: &SubCommentPath) -> BackendResult<Uuid> {
    db::sub_comment_author(conn, path)
        .await?
        .ok_or_else(|| BackendError::not_found("subComment", path.sub_comment_id))
}

async fn ensure_comment_author(conn: &mut SqliteConnection, path: &CommentPath, caller: &Identity) -> BackendResult<()> {
    if resolve_comment(conn, path).await? != caller.id {
        return Err(BackendError::forbidden("Only the author can change this comment"));
    }
    Ok(())
}

async fn ensure_sub_comment_author(
    conn: &mut SqliteConnection,
    path: &SubCommentPath,
    caller: &Identity,
) -> BackendResult<()> {
    if resolve_sub_comment(conn, path).await? != caller.id {
        return Err(BackendError::forbidden("Only the author can change this comment"));
    }
    Ok(())
}

async fn load_views(conn: &mut SqliteConnection, rows: Vec<FeedRow>, caller: &Identity) -> BackendResult<Vec<FeedView>> {
    let mut views = Vec::with_capacity(rows.len());
    for row in rows {
        views.push(load_view(conn, row, caller).await?);
    }
    Ok(views)
}

/// Populate one feed row with its writer, likes and comment tree
async fn load_view(conn: &mut SqliteConnection, row: FeedRow, caller: &Identity) -> BackendResult<FeedView> {
    let writer = get_user_summary(conn, row.writer_id)
        .await?
        .ok_or_else(|| BackendError::not_found("user", row.writer_id))?;

    let likers = db::feed_likers(conn, row.id).await?;
    let like_cnt = likers.len() as i64;
    let like = arrange_likes(likers, &caller.uid);

    let mut comments = Vec::new();
    for comment in db::comments_for_feed(conn, row.id).await? {
        let mut sub_comments = Vec::new();
        for sub in db::sub_comments_for_comment(conn, comment.id).await? {
            sub_comments.push(SubCommentView {
                id: sub.id,
                user: sub.author(),
                like_list: db::sub_comment_like_ids(conn, sub.id).await?,
                comment: sub.comment,
                created_at: sub.created_at,
            });
        }

        comments.push(CommentView {
            id: comment.id,
            user: comment.author(),
            like_list: db::comment_like_ids(conn, comment.id).await?,
            comment: comment.comment,
            sub_comments,
            created_at: comment.created_at,
        });
    }

    Ok(FeedView {
        id: row.id,
        writer,
        feed_type: row.feed_type,
        type_id: row.type_id,
        title: row.title,
        text: row.text,
        images: row.images.0,
        is_anonymous: row.is_anonymous,
        sub_category: row.sub_category,
        like,
        like_cnt,
        comments,
        created_at: row.created_at,
    })
}
