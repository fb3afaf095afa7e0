/**
 * Chat Service
 *
 * One thread per unordered pair of users. Sending appends to the thread (or
 * creates it) in one transaction, then notifies the recipient on every push
 * channel from a detached task: delivery never delays the sender and its
 * failures are only logged.
 */

use sqlx::SqlitePool;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::backend::chat::db;
use crate::backend::error::{BackendError, BackendResult};
use crate::backend::push::Notifier;
use crate::backend::users::db::{get_user_by_id, get_user_summary};
use crate::shared::chat::{
    canonical_pair, sort_previews, ChatPreview, ChatThread, CreateChatRequest, RecentChat,
};
use crate::shared::notification::FanOutReport;
use crate::shared::{parse_id, Identity};

const NEW_MESSAGE_TITLE: &str = "You received a message!";

#[derive(Clone)]
pub struct ChatService {
    pool: SqlitePool,
    notifier: Notifier,
}

impl ChatService {
    pub fn new(pool: SqlitePool, notifier: Notifier) -> Self {
        Self { pool, notifier }
    }

    /// The caller's thread with another user, `None` when they never talked
    pub async fn get_chat(&self, caller: &Identity, user_id: &str) -> BackendResult<Option<ChatThread>> {
        let other = parse_id("userId", user_id)?;
        let (user1, user2) = canonical_pair(caller.id, other);

        let mut conn = self.pool.acquire().await?;
        let Some(chat_id) = db::find_chat_id(&mut conn, user1, user2).await? else {
            return Ok(None);
        };

        let opponent = get_user_summary(&mut conn, other)
            .await?
            .ok_or_else(|| BackendError::not_found("user", user_id))?;
        let contents = db::chat_contents(&mut conn, chat_id).await?;

        Ok(Some(ChatThread { opponent, contents }))
    }

    /// Every chat of the caller with its latest message, newest first
    pub async fn get_chats(&self, caller: &Identity) -> BackendResult<Vec<ChatPreview>> {
        let mut conn = self.pool.acquire().await?;

        let mut previews = Vec::new();
        for (chat_id, opponent_id) in db::chats_for_user(&mut conn, caller.id).await? {
            let Some(user) = get_user_summary(&mut conn, opponent_id).await? else {
                tracing::warn!("Chat {} refers to missing user {}", chat_id, opponent_id);
                continue;
            };
            let content = db::latest_content(&mut conn, chat_id).await?;
            previews.push(ChatPreview { user, content });
        }

        sort_previews(&mut previews);
        Ok(previews)
    }

    /// Id of the thread between two users, if any
    pub async fn chat_id_between(&self, a: Uuid, b: Uuid) -> BackendResult<Option<Uuid>> {
        let (user1, user2) = canonical_pair(a, b);
        let mut conn = self.pool.acquire().await?;
        Ok(db::find_chat_id(&mut conn, user1, user2).await?)
    }

    pub async fn get_recent_chat(&self, caller: &Identity) -> BackendResult<RecentChat> {
        let mut conn = self.pool.acquire().await?;
        Ok(match db::most_recent_chat(&mut conn, caller.id).await? {
            Some(id) => RecentChat::Found(id),
            None => RecentChat::NoChat,
        })
    }

    /// Append a message to the thread with `to_user_id` and notify them
    ///
    /// # Returns
    /// The handle of the detached notification task. Dropping it leaves the
    /// task running.
    pub async fn create_chat(
        &self,
        caller: &Identity,
        request: CreateChatRequest,
    ) -> BackendResult<JoinHandle<FanOutReport>> {
        let to_user = parse_id("toUserId", &request.to_user_id)?;
        if to_user == caller.id {
            return Err(BackendError::validation("toUserId", "Cannot send a message to yourself"));
        }
        if request.message.trim().is_empty() {
            return Err(BackendError::validation("message", "Message cannot be empty"));
        }

        let mut tx = self.pool.begin().await?;
        let recipient = get_user_by_id(&mut tx, to_user)
            .await?
            .ok_or_else(|| BackendError::not_found("user", &request.to_user_id))?;

        let (user1, user2) = canonical_pair(caller.id, to_user);
        let chat_id = db::upsert_chat(&mut tx, user1, user2).await?;
        db::insert_content(&mut tx, chat_id, caller.id, &request.message).await?;
        tx.commit().await?;

        tracing::debug!("Message from {} stored in chat {}", caller.uid, chat_id);
        Ok(self.dispatch(recipient.uid, request.message))
    }

    fn dispatch(&self, uid: String, message: String) -> JoinHandle<FanOutReport> {
        let notifier = self.notifier.clone();
        tokio::spawn(async move { notifier.notify(&uid, NEW_MESSAGE_TITLE, &message).await })
    }
}
