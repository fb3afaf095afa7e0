/**
 * Register Service
 *
 * A registration moves pending → approved or pending → rejected. Approval
 * creates the user account in the same transaction. A rejected user may
 * submit again, which puts the form back to pending; an approved user may
 * not.
 */

use sqlx::{SqliteConnection, SqlitePool};

use crate::backend::error::{BackendError, BackendResult};
use crate::backend::register::db;
use crate::backend::users::db::{create_user, get_user_by_uid};
use crate::shared::register::{RegisterForm, Registration, RegistrationStatus};
use crate::shared::{Identity, User};

#[derive(Clone)]
pub struct RegisterService {
    pool: SqlitePool,
}

impl RegisterService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Forms waiting for a decision
    pub async fn get_register(&self) -> BackendResult<Vec<Registration>> {
        let mut conn = self.pool.acquire().await?;
        Ok(db::registrations_with_status(&mut conn, RegistrationStatus::Pending).await?)
    }

    /// Submit the caller's form
    pub async fn register(&self, caller: &Identity, form: RegisterForm) -> BackendResult<()> {
        form.validate()?;

        let mut tx = self.pool.begin().await?;
        if let Some(existing) = db::get_registration(&mut tx, &caller.uid).await? {
            if existing.status == RegistrationStatus::Approved {
                return Err(BackendError::conflict("Registration is already approved"));
            }
        }
        db::upsert_pending(&mut tx, &caller.uid, &form).await?;
        tx.commit().await?;

        tracing::info!("Registration submitted for {}", caller.uid);
        Ok(())
    }

    /// Approve a pending form and create its user account
    pub async fn approve(&self, uid: &str) -> BackendResult<User> {
        let mut tx = self.pool.begin().await?;
        let registration = pending_registration(&mut tx, uid).await?;

        db::set_status(&mut tx, uid, RegistrationStatus::Approved).await?;
        let user = match get_user_by_uid(&mut tx, uid).await? {
            Some(user) => user,
            None => create_user(&mut tx, uid, &registration.form.name, None).await?,
        };
        tx.commit().await?;

        tracing::info!("Registration of {} approved", uid);
        Ok(user)
    }

    /// Reject a pending form
    pub async fn delete_register_user(&self, uid: &str) -> BackendResult<()> {
        let mut tx = self.pool.begin().await?;
        pending_registration(&mut tx, uid).await?;
        db::set_status(&mut tx, uid, RegistrationStatus::Rejected).await?;
        tx.commit().await?;

        tracing::info!("Registration of {} rejected", uid);
        Ok(())
    }
}

async fn pending_registration(conn: &mut SqliteConnection, uid: &str) -> BackendResult<Registration> {
    let registration = db::get_registration(conn, uid)
        .await?
        .ok_or_else(|| BackendError::not_found("registration", uid))?;

    if registration.status != RegistrationStatus::Pending {
        return Err(BackendError::conflict(format!(
            "Registration is {}, not pending",
            registration.status.as_str()
        )));
    }
    Ok(registration)
}
