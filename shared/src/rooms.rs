//! Per-user room configuration stored in Postgres.

use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::models::{NewRoom, Room};
use crate::{Error, Result};

#[derive(Debug, Clone)]
pub struct RoomStore {
    pool: PgPool,
}

impl RoomStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Rooms owned by `user_id`, by name.
    pub async fn list(&self, user_id: Uuid) -> Result<Vec<Room>> {
        let rooms = sqlx::query_as::<_, Room>(
            r#"
            SELECT id, user_id, external_code, name, created_at
            FROM rooms
            WHERE user_id = $1
            ORDER BY name ASC, created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rooms)
    }

    pub async fn create(&self, user_id: Uuid, room: NewRoom) -> Result<Room> {
        room.validate()?;

        let created = sqlx::query_as::<_, Room>(
            r#"
            INSERT INTO rooms (id, user_id, external_code, name)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, external_code, name, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(room.external_code.trim())
        .bind(room.name.trim())
        .fetch_one(&self.pool)
        .await?;

        info!(room_id = %created.id, %user_id, "Room created");
        Ok(created)
    }

    /// Delete one of the user's rooms. Someone else's room is reported as
    /// missing.
    pub async fn delete(&self, user_id: Uuid, room_id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM rooms WHERE id = $1 AND user_id = $2")
            .bind(room_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("Room {}", room_id)));
        }

        info!(%room_id, %user_id, "Room deleted");
        Ok(())
    }
}
