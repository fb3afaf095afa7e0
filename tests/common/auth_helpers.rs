//! User and identity helpers

use sqlx::SqlitePool;
use uuid::Uuid;

use studyabout::backend::users::db::{create_user, get_user_by_id};
use studyabout::shared::{Identity, User};

/// A stored user and the identity a verified token would yield for them
pub struct TestUser {
    pub user: User,
    pub identity: Identity,
}

impl TestUser {
    pub fn id(&self) -> Uuid {
        self.user.id
    }

    pub fn uid(&self) -> &str {
        &self.user.uid
    }
}

/// Create a user named after its uid
pub async fn create_test_user(pool: &SqlitePool, uid: &str) -> TestUser {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    let user = create_user(&mut conn, uid, &format!("name of {}", uid), None)
        .await
        .expect("Failed to create test user");
    let identity = Identity::new(user.id, user.uid.clone());
    TestUser { user, identity }
}

/// Create `n` users with uids `{prefix}-0` .. `{prefix}-{n-1}`
pub async fn create_test_users(pool: &SqlitePool, prefix: &str, n: usize) -> Vec<TestUser> {
    let mut users = Vec::with_capacity(n);
    for i in 0..n {
        users.push(create_test_user(pool, &format!("{}-{}", prefix, i)).await);
    }
    users
}

/// Current point balance of a user
pub async fn points_of(pool: &SqlitePool, id: Uuid) -> i64 {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    get_user_by_id(&mut conn, id)
        .await
        .expect("Failed to load user")
        .expect("User does not exist")
        .point
}
