use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::entities::categories;

#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub slug: String,
    pub parent_id: Option<i32>,
    pub sort_order: i32,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub parent_id: Option<i32>,
    pub sort_order: Option<i32>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
}

pub struct CategoryRepository {
    conn: DatabaseConnection,
}

impl CategoryRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Every non-deleted category ordered by sort_order; the tree is built
    /// in memory by the catalog service.
    pub async fn all(&self) -> Result<Vec<categories::Model>> {
        categories::Entity::find()
            .filter(categories::Column::DeletedAt.is_null())
            .order_by_asc(categories::Column::SortOrder)
            .all(&self.conn)
            .await
            .context("Failed to query categories")
    }

    pub async fn by_id(&self, id: i32) -> Result<Option<categories::Model>> {
        categories::Entity::find_by_id(id)
            .filter(categories::Column::DeletedAt.is_null())
            .one(&self.conn)
            .await
            .context("Failed to query category by id")
    }

    pub async fn by_slug(&self, slug: &str) -> Result<Option<categories::Model>> {
        categories::Entity::find()
            .filter(categories::Column::Slug.eq(slug))
            .filter(categories::Column::DeletedAt.is_null())
            .one(&self.conn)
            .await
            .context("Failed to query category by slug")
    }

    pub async fn create(&self, new: NewCategory) -> Result<categories::Model> {
        let now = chrono::Utc::now().to_rfc3339();
        categories::ActiveModel {
            name: Set(new.name),
            slug: Set(new.slug),
            parent_id: Set(new.parent_id),
            sort_order: Set(new.sort_order),
            meta_title: Set(new.meta_title),
            meta_description: Set(new.meta_description),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            deleted_at: Set(None),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert category")
    }

    pub async fn update(&self, id: i32, patch: CategoryPatch) -> Result<Option<categories::Model>> {
        let Some(existing) = self.by_id(id).await? else {
            return Ok(None);
        };

        let mut active: categories::ActiveModel = existing.into();
        if let Some(v) = patch.name {
            active.name = Set(v);
        }
        if let Some(v) = patch.slug {
            active.slug = Set(v);
        }
        if let Some(v) = patch.parent_id {
            active.parent_id = Set(Some(v));
        }
        if let Some(v) = patch.sort_order {
            active.sort_order = Set(v);
        }
        if let Some(v) = patch.meta_title {
            active.meta_title = Set(Some(v));
        }
        if let Some(v) = patch.meta_description {
            active.meta_description = Set(Some(v));
        }
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let model = active
            .update(&self.conn)
            .await
            .context("Failed to update category")?;
        Ok(Some(model))
    }

    pub async fn soft_delete(&self, id: i32) -> Result<bool> {
        let Some(existing) = self.by_id(id).await? else {
            return Ok(false);
        };

        let now = chrono::Utc::now().to_rfc3339();
        let mut active: categories::ActiveModel = existing.into();
        active.deleted_at = Set(Some(now.clone()));
        active.updated_at = Set(now);
        active
            .update(&self.conn)
            .await
            .context("Failed to soft-delete category")?;
        Ok(true)
    }
}
