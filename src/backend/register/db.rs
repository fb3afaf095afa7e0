//! Database operations for registrations

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::types::Json;
use sqlx::{Row, SqliteConnection};

use crate::shared::register::{RegisterForm, Registration, RegistrationStatus};

const REGISTRATION_COLUMNS: &str = "uid, name, location, telephone, birth, gender, mbti, comment, \
                                    majors, interests, status, created_at, updated_at";

fn registration_from_row(row: SqliteRow) -> Registration {
    let majors: Json<Vec<String>> = row.get("majors");
    let interests: Json<Vec<String>> = row.get("interests");
    let status: String = row.get("status");

    Registration {
        uid: row.get("uid"),
        form: RegisterForm {
            name: row.get("name"),
            location: row.get("location"),
            telephone: row.get("telephone"),
            birth: row.get("birth"),
            gender: row.get("gender"),
            mbti: row.get("mbti"),
            comment: row.get("comment"),
            majors: majors.0,
            interests: interests.0,
        },
        status: RegistrationStatus::from_str(&status).unwrap_or_default(),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

pub async fn get_registration(conn: &mut SqliteConnection, uid: &str) -> Result<Option<Registration>, sqlx::Error> {
    let sql = format!("SELECT {} FROM registrations WHERE uid = ?", REGISTRATION_COLUMNS);
    let row = sqlx::query(&sql).bind(uid).fetch_optional(&mut *conn).await?;
    Ok(row.map(registration_from_row))
}

/// Every registration with the given status, oldest first
pub async fn registrations_with_status(
    conn: &mut SqliteConnection,
    status: RegistrationStatus,
) -> Result<Vec<Registration>, sqlx::Error> {
    let sql = format!(
        "SELECT {} FROM registrations WHERE status = ? ORDER BY created_at, rowid",
        REGISTRATION_COLUMNS
    );
    let rows = sqlx::query(&sql).bind(status.as_str()).fetch_all(&mut *conn).await?;
    Ok(rows.into_iter().map(registration_from_row).collect())
}

/// Store a form as pending, replacing an earlier form of the same uid
pub async fn upsert_pending(conn: &mut SqliteConnection, uid: &str, form: &RegisterForm) -> Result<(), sqlx::Error> {
    let now = Utc::now();
    sqlx::query(
        r#"
        INSERT INTO registrations
            (uid, name, location, telephone, birth, gender, mbti, comment, majors, interests, status, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 'pending', ?, ?)
        ON CONFLICT (uid) DO UPDATE SET
            name = excluded.name,
            location = excluded.location,
            telephone = excluded.telephone,
            birth = excluded.birth,
            gender = excluded.gender,
            mbti = excluded.mbti,
            comment = excluded.comment,
            majors = excluded.majors,
            interests = excluded.interests,
            status = 'pending',
            updated_at = excluded.updated_at
        "#,
    )
    .bind(uid)
    .bind(&form.name)
    .bind(&form.location)
    .bind(&form.telephone)
    .bind(&form.birth)
    .bind(&form.gender)
    .bind(&form.mbti)
    .bind(&form.comment)
    .bind(Json(&form.majors))
    .bind(Json(&form.interests))
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub async fn set_status(
    conn: &mut SqliteConnection,
    uid: &str,
    status: RegistrationStatus,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE registrations SET status = ?, updated_at = ? WHERE uid = ?")
        .bind(status.as_str())
        .bind(Utc::now())
        .bind(uid)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected() == 1)
}
