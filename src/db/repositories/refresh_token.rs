use anyhow::{Context, Result};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use crate::entities::refresh_tokens;

pub struct RefreshTokenRepository {
    conn: DatabaseConnection,
}

impl RefreshTokenRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn insert(&self, token: &str, user_id: i32, expires_at: &str) -> Result<()> {
        refresh_tokens::ActiveModel {
            token: Set(token.to_string()),
            user_id: Set(user_id),
            expires_at: Set(expires_at.to_string()),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert refresh token")?;
        Ok(())
    }

    pub async fn by_token(&self, token: &str) -> Result<Option<refresh_tokens::Model>> {
        refresh_tokens::Entity::find()
            .filter(refresh_tokens::Column::Token.eq(token))
            .one(&self.conn)
            .await
            .context("Failed to query refresh token")
    }

    /// Tokens are single-use: consumed on rotation, removed on expiry.
    pub async fn delete(&self, id: i32) -> Result<()> {
        refresh_tokens::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete refresh token")?;
        Ok(())
    }
}
