use crate::entities::prelude::*;
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Bootstrap admin account. The password is meant to be rotated right after
/// the first deployment.
const ADMIN_EMAIL: &str = "admin@comptoir.local";
const ADMIN_PASSWORD: &str = "ChangeMeInProduction!";

/// Hash the seed password using Argon2id
fn hash_seed_password() -> String {
    use argon2::{
        Argon2,
        password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
    };

    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(ADMIN_PASSWORD.as_bytes(), &salt)
        .expect("Failed to hash seed password")
        .to_string()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let now = chrono::Utc::now().to_rfc3339();
        let password_hash = hash_seed_password();

        let insert = sea_orm_migration::sea_query::Query::insert()
            .into_table(Users)
            .columns([
                crate::entities::users::Column::Email,
                crate::entities::users::Column::PasswordHash,
                crate::entities::users::Column::Role,
                crate::entities::users::Column::CreatedAt,
                crate::entities::users::Column::UpdatedAt,
            ])
            .values_panic([
                ADMIN_EMAIL.into(),
                password_hash.into(),
                "ADMIN".into(),
                now.clone().into(),
                now.into(),
            ])
            .to_owned();

        manager.exec_stmt(insert).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let delete = sea_orm_migration::sea_query::Query::delete()
            .from_table(Users)
            .and_where(
                Expr::col(crate::entities::users::Column::Email).eq(ADMIN_EMAIL),
            )
            .to_owned();

        manager.exec_stmt(delete).await?;

        Ok(())
    }
}
