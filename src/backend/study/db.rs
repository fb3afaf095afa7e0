//! Database operations for study groups and daily votes
//!
//! The notification fan-out only reads these records; the writers exist for
//! the parts of the application that manage groups and votes.

use std::collections::{BTreeSet, HashMap};

use chrono::{NaiveDate, Utc};
use sqlx::{Row, SqliteConnection};
use uuid::Uuid;

use crate::shared::study::{Participation, ParticipationStatus};

pub async fn create_group_study(conn: &mut SqliteConnection, id: i64, title: &str) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO group_studies (id, title, created_at) VALUES (?, ?, ?)")
        .bind(id)
        .bind(title)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Add a participation record; the same user may be added more than once
pub async fn add_group_participant(
    conn: &mut SqliteConnection,
    group_id: i64,
    user_id: Uuid,
    role: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO group_study_participants (group_id, user_id, role) VALUES (?, ?, ?)")
        .bind(group_id)
        .bind(user_id)
        .bind(role)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Distinct uids of a group's participants
pub async fn group_member_uids(conn: &mut SqliteConnection, group_id: i64) -> Result<BTreeSet<String>, sqlx::Error> {
    let uids = sqlx::query_scalar::<_, String>(
        r#"
        SELECT u.uid
        FROM group_study_participants p
        JOIN users u ON u.id = p.user_id
        WHERE p.group_id = ?
        "#,
    )
    .bind(group_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(uids.into_iter().collect())
}

pub async fn create_vote(conn: &mut SqliteConnection, date: NaiveDate) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO votes (date) VALUES (?) ON CONFLICT (date) DO NOTHING")
        .bind(date)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

pub async fn add_participation(
    conn: &mut SqliteConnection,
    date: NaiveDate,
    place: &str,
    status: ParticipationStatus,
) -> Result<Uuid, sqlx::Error> {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO vote_participations (id, vote_date, place, status) VALUES (?, ?, ?, ?)")
        .bind(id)
        .bind(date)
        .bind(place)
        .bind(status.as_str())
        .execute(&mut *conn)
        .await?;
    Ok(id)
}

pub async fn add_attendance(
    conn: &mut SqliteConnection,
    participation_id: Uuid,
    user_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO vote_attendances (participation_id, user_id) VALUES (?, ?)")
        .bind(participation_id)
        .bind(user_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Every place of a day's vote with its attendees' uids
///
/// A missing vote yields an empty list.
pub async fn vote_participations(
    conn: &mut SqliteConnection,
    date: NaiveDate,
) -> Result<Vec<Participation>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT id, place, status
        FROM vote_participations
        WHERE vote_date = ?
        ORDER BY rowid
        "#,
    )
    .bind(date)
    .fetch_all(&mut *conn)
    .await?;

    let mut participations: Vec<Participation> = rows
        .into_iter()
        .map(|row| {
            let status: String = row.get("status");
            Participation {
                id: row.get("id"),
                place: row.get("place"),
                status: ParticipationStatus::from_str(&status).unwrap_or(ParticipationStatus::Pending),
                attendees: Vec::new(),
            }
        })
        .collect();

    let attendances = sqlx::query(
        r#"
        SELECT a.participation_id, u.uid
        FROM vote_attendances a
        JOIN vote_participations p ON p.id = a.participation_id
        JOIN users u ON u.id = a.user_id
        WHERE p.vote_date = ?
        ORDER BY a.rowid
        "#,
    )
    .bind(date)
    .fetch_all(&mut *conn)
    .await?;

    let mut by_participation: HashMap<Uuid, Vec<String>> = HashMap::new();
    for row in attendances {
        by_participation
            .entry(row.get("participation_id"))
            .or_default()
            .push(row.get("uid"));
    }
    for participation in &mut participations {
        if let Some(uids) = by_participation.remove(&participation.id) {
            participation.attendees = uids;
        }
    }

    Ok(participations)
}
