use quiz_core::model::UserId;
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{id_to_i64, ser};
use crate::repository::{LivesStore, StorageError};

#[async_trait::async_trait]
impl LivesStore for SqliteRepository {
    async fn load_lives(&self, user: UserId) -> Result<Option<u32>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT lives FROM user_lives WHERE user_id = ?1
            ",
        )
        .bind(id_to_i64("user_id", user.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        match row {
            Some(row) => {
                let lives: i64 = row.try_get("lives").map_err(ser)?;
                let lives = u32::try_from(lives)
                    .map_err(|_| StorageError::Serialization(format!("invalid lives: {lives}")))?;
                Ok(Some(lives))
            }
            None => Ok(None),
        }
    }

    async fn save_lives(&self, user: UserId, lives: u32) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO user_lives (user_id, lives)
            VALUES (?1, ?2)
            ON CONFLICT(user_id) DO UPDATE SET lives = excluded.lives
            ",
        )
        .bind(id_to_i64("user_id", user.value())?)
        .bind(i64::from(lives))
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }
}
