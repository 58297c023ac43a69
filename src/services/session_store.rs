use chrono::Utc;
use sea_orm::{
    ConnectionTrait, EntityTrait, QuerySelect, Set, Statement, sea_query::LockType,
    sea_query::OnConflict,
};
use uuid::Uuid;

use crate::{
    checkout_session::CheckoutSession,
    entity::checkout_sessions::{ActiveModel, Column, Entity as CheckoutSessions, Model},
    error::{AppError, AppResult},
};

pub async fn load<C: ConnectionTrait>(conn: &C, user_id: Uuid) -> AppResult<CheckoutSession> {
    let row = CheckoutSessions::find_by_id(user_id).one(conn).await?;
    Ok(decode(user_id, row))
}

/// Load the session and hold a row lock until the surrounding transaction ends.
///
/// An empty row is created first when the user has none, so there is always a
/// row to lock and concurrent first writes serialize as well.
pub async fn load_for_update<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
) -> AppResult<CheckoutSession> {
    let backend = conn.get_database_backend();
    conn.execute(Statement::from_sql_and_values(
        backend,
        "INSERT INTO checkout_sessions (user_id, state) VALUES ($1, $2) ON CONFLICT (user_id) DO NOTHING",
        [user_id.into(), encode(&CheckoutSession::default())?.into()],
    ))
    .await?;

    let row = CheckoutSessions::find_by_id(user_id)
        .lock(LockType::Update)
        .one(conn)
        .await?;
    Ok(decode(user_id, row))
}

pub async fn save<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    session: &CheckoutSession,
) -> AppResult<()> {
    let active = ActiveModel {
        user_id: Set(user_id),
        state: Set(encode(session)?),
        updated_at: Set(Utc::now().into()),
    };
    CheckoutSessions::insert(active)
        .on_conflict(
            OnConflict::column(Column::UserId)
                .update_columns([Column::State, Column::UpdatedAt])
                .to_owned(),
        )
        .exec(conn)
        .await?;
    Ok(())
}

fn encode(session: &CheckoutSession) -> AppResult<serde_json::Value> {
    serde_json::to_value(session).map_err(|e| AppError::Internal(anyhow::anyhow!(e)))
}

// Missing or unreadable rows decode as an empty session.
fn decode(user_id: Uuid, row: Option<Model>) -> CheckoutSession {
    let Some(row) = row else {
        return CheckoutSession::default();
    };
    match serde_json::from_value(row.state) {
        Ok(session) => session,
        Err(err) => {
            tracing::warn!(%user_id, error = %err, "discarding unreadable checkout session");
            CheckoutSession::default()
        }
    }
}
