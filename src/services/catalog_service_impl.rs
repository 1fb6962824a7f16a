//! SeaORM-backed implementation of [`CatalogService`].

use std::collections::HashMap;

use crate::db::{CategoryPatch, NewCategory, NewProduct, ProductListFilter, ProductPatch, Store};
use crate::entities::{categories, product_images, products};

use super::catalog_service::{
    CatalogError, CatalogService, CategoryNode, CategorySummary, CreateCategory, CreateProduct,
    Page, PageMeta, ProductDto, ProductImageDto, ProductQuery, ProductSort, SortDirection,
    UpdateCategory, UpdateProduct,
};

const MAX_PAGE_SIZE: u64 = 100;
const MAX_RELATED: u64 = 12;

pub struct SeaOrmCatalogService {
    store: Store,
}

impl SeaOrmCatalogService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    /// Joins products with their category summaries and images. Listings
    /// keep only the primary image (lowest sort_order); detail views keep
    /// the full set.
    async fn assemble(
        &self,
        models: Vec<products::Model>,
        all_images: bool,
    ) -> Result<Vec<ProductDto>, CatalogError> {
        let product_ids: Vec<i32> = models.iter().map(|p| p.id).collect();
        let category_ids: Vec<i32> = {
            let mut ids: Vec<i32> = models.iter().filter_map(|p| p.category_id).collect();
            ids.sort_unstable();
            ids.dedup();
            ids
        };

        let category_map: HashMap<i32, categories::Model> = self
            .store
            .categories_by_ids(&category_ids)
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();

        let mut image_map: HashMap<i32, Vec<product_images::Model>> = HashMap::new();
        for image in self.store.product_images(&product_ids).await? {
            image_map.entry(image.product_id).or_default().push(image);
        }

        Ok(models
            .into_iter()
            .map(|p| {
                let category = p
                    .category_id
                    .and_then(|id| category_map.get(&id))
                    .map(|c| CategorySummary {
                        id: c.id,
                        name: c.name.clone(),
                        slug: c.slug.clone(),
                    });
                let mut images: Vec<ProductImageDto> = image_map
                    .remove(&p.id)
                    .unwrap_or_default()
                    .into_iter()
                    .map(|i| ProductImageDto {
                        id: i.id,
                        url: i.url,
                        alt: i.alt,
                        sort_order: i.sort_order,
                    })
                    .collect();
                if !all_images {
                    images.truncate(1);
                }
                product_dto(p, category, images)
            })
            .collect())
    }

    async fn product_dto_by_id(&self, id: i32) -> Result<ProductDto, CatalogError> {
        let model = self
            .store
            .product_by_id(id)
            .await?
            .ok_or(CatalogError::ProductNotFound)?;
        let mut dtos = self.assemble(vec![model], true).await?;
        dtos.pop().ok_or(CatalogError::ProductNotFound)
    }

    async fn ensure_slug_free(
        &self,
        slug: &str,
        exclude_product: Option<i32>,
    ) -> Result<(), CatalogError> {
        if let Some(existing) = self.store.product_by_slug(slug, false).await?
            && exclude_product != Some(existing.id)
        {
            return Err(CatalogError::Conflict(format!(
                "Product slug '{slug}' is already in use"
            )));
        }
        Ok(())
    }

    async fn ensure_category_slug_free(
        &self,
        slug: &str,
        exclude_category: Option<i32>,
    ) -> Result<(), CatalogError> {
        if let Some(existing) = self.store.category_by_slug(slug).await?
            && exclude_category != Some(existing.id)
        {
            return Err(CatalogError::Conflict(format!(
                "Category slug '{slug}' is already in use"
            )));
        }
        Ok(())
    }

    async fn ensure_category_exists(&self, id: i32) -> Result<(), CatalogError> {
        if self.store.category_by_id(id).await?.is_none() {
            return Err(CatalogError::Validation(format!(
                "Category {id} does not exist"
            )));
        }
        Ok(())
    }
}

fn product_dto(
    p: products::Model,
    category: Option<CategorySummary>,
    images: Vec<ProductImageDto>,
) -> ProductDto {
    ProductDto {
        id: p.id,
        name: p.name,
        slug: p.slug,
        description: p.description,
        specs: p.specs.and_then(|s| serde_json::from_str(&s).ok()),
        price: p.price,
        stock: p.stock,
        is_active: p.is_active,
        is_quote_only: p.is_quote_only,
        category,
        images,
        meta_title: p.meta_title,
        meta_description: p.meta_description,
        created_at: p.created_at,
        updated_at: p.updated_at,
    }
}

fn summary(c: &categories::Model) -> CategorySummary {
    CategorySummary {
        id: c.id,
        name: c.name.clone(),
        slug: c.slug.clone(),
    }
}

/// Recursive assembly over a parent-id index; the source list is already
/// ordered by sort_order, so children stay ordered within each node.
fn build_tree(
    parent: Option<i32>,
    by_parent: &HashMap<Option<i32>, Vec<&categories::Model>>,
    parent_summary: Option<CategorySummary>,
) -> Vec<CategoryNode> {
    by_parent.get(&parent).map_or_else(Vec::new, |nodes| {
        nodes
            .iter()
            .map(|c| CategoryNode {
                id: c.id,
                name: c.name.clone(),
                slug: c.slug.clone(),
                sort_order: c.sort_order,
                parent: parent_summary.clone(),
                children: build_tree(Some(c.id), by_parent, Some(summary(c))),
            })
            .collect()
    })
}

fn validate_name_slug(name: &str, slug: &str) -> Result<(), CatalogError> {
    let mut problems = Vec::new();
    if name.trim().is_empty() {
        problems.push("name must not be empty");
    }
    if name.len() > 255 {
        problems.push("name must be at most 255 characters");
    }
    if slug.trim().is_empty() {
        problems.push("slug must not be empty");
    }
    if problems.is_empty() {
        Ok(())
    } else {
        Err(CatalogError::Validation(problems.join(", ")))
    }
}

#[async_trait::async_trait]
impl CatalogService for SeaOrmCatalogService {
    async fn list_products(
        &self,
        query: ProductQuery,
        for_admin: bool,
    ) -> Result<Page<ProductDto>, CatalogError> {
        let page = query.page.max(1);
        let limit = query.limit.clamp(1, MAX_PAGE_SIZE);
        let search = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string);

        let filter = ProductListFilter {
            page,
            limit,
            sort: query.sort.unwrap_or(ProductSort::Name),
            direction: query.order.unwrap_or(SortDirection::Asc),
            search,
            category_slug: query.category,
            include_inactive: for_admin,
        };

        let (models, total) = self.store.list_products(&filter).await?;
        let data = self.assemble(models, false).await?;

        Ok(Page {
            data,
            meta: PageMeta::new(total, page, limit),
        })
    }

    async fn product_by_id(&self, id: i32) -> Result<ProductDto, CatalogError> {
        self.product_dto_by_id(id).await
    }

    async fn product_by_slug(&self, slug: &str, public: bool) -> Result<ProductDto, CatalogError> {
        let model = self
            .store
            .product_by_slug(slug, public)
            .await?
            .ok_or(CatalogError::ProductNotFound)?;
        let mut dtos = self.assemble(vec![model], true).await?;
        dtos.pop().ok_or(CatalogError::ProductNotFound)
    }

    async fn related_products(
        &self,
        slug: &str,
        limit: u64,
    ) -> Result<Vec<ProductDto>, CatalogError> {
        let source = self
            .store
            .product_by_slug(slug, true)
            .await?
            .ok_or(CatalogError::ProductNotFound)?;

        let limit = limit.clamp(1, MAX_RELATED);
        let models = self
            .store
            .related_products(source.id, source.category_id, limit)
            .await?;
        self.assemble(models, false).await
    }

    async fn create_product(&self, input: CreateProduct) -> Result<ProductDto, CatalogError> {
        validate_name_slug(&input.name, &input.slug)?;
        if input.price.is_sign_negative() {
            return Err(CatalogError::Validation(
                "price must not be negative".to_string(),
            ));
        }
        if input.stock.is_some_and(|s| s < 0) {
            return Err(CatalogError::Validation(
                "stock must not be negative".to_string(),
            ));
        }
        self.ensure_slug_free(&input.slug, None).await?;
        if let Some(category_id) = input.category_id {
            self.ensure_category_exists(category_id).await?;
        }

        let new = NewProduct {
            name: input.name,
            slug: input.slug,
            description: input.description,
            specs: input.specs.map(|v| v.to_string()),
            price: input.price.to_string(),
            stock: input.stock.unwrap_or(0),
            is_active: input.is_active.unwrap_or(true),
            is_quote_only: input.is_quote_only.unwrap_or(false),
            category_id: input.category_id,
            meta_title: input.meta_title,
            meta_description: input.meta_description,
        };

        let id = self
            .store
            .create_product(new, input.images.unwrap_or_default())
            .await?;
        self.product_dto_by_id(id).await
    }

    async fn update_product(
        &self,
        id: i32,
        input: UpdateProduct,
    ) -> Result<ProductDto, CatalogError> {
        if let Some(name) = &input.name
            && (name.trim().is_empty() || name.len() > 255)
        {
            return Err(CatalogError::Validation(
                "name must be 1-255 characters".to_string(),
            ));
        }
        if let Some(slug) = &input.slug {
            if slug.trim().is_empty() {
                return Err(CatalogError::Validation(
                    "slug must not be empty".to_string(),
                ));
            }
            self.ensure_slug_free(slug, Some(id)).await?;
        }
        if input.price.is_some_and(|p| p.is_sign_negative()) {
            return Err(CatalogError::Validation(
                "price must not be negative".to_string(),
            ));
        }
        if input.stock.is_some_and(|s| s < 0) {
            return Err(CatalogError::Validation(
                "stock must not be negative".to_string(),
            ));
        }
        if let Some(category_id) = input.category_id {
            self.ensure_category_exists(category_id).await?;
        }

        let patch = ProductPatch {
            name: input.name,
            slug: input.slug,
            description: input.description,
            specs: input.specs.map(|v| v.to_string()),
            price: input.price.map(|p| p.to_string()),
            stock: input.stock,
            is_active: input.is_active,
            is_quote_only: input.is_quote_only,
            category_id: input.category_id,
            meta_title: input.meta_title,
            meta_description: input.meta_description,
            images: input.images,
        };

        let updated = self.store.update_product(id, patch).await?;
        match updated {
            Some(id) => self.product_dto_by_id(id).await,
            None => Err(CatalogError::ProductNotFound),
        }
    }

    async fn delete_product(&self, id: i32) -> Result<(), CatalogError> {
        if self.store.soft_delete_product(id).await? {
            Ok(())
        } else {
            Err(CatalogError::ProductNotFound)
        }
    }

    async fn category_tree(&self) -> Result<Vec<CategoryNode>, CatalogError> {
        let all = self.store.all_categories().await?;
        let mut by_parent: HashMap<Option<i32>, Vec<&categories::Model>> = HashMap::new();
        for c in &all {
            by_parent.entry(c.parent_id).or_default().push(c);
        }
        Ok(build_tree(None, &by_parent, None))
    }

    async fn category_by_slug(&self, slug: &str) -> Result<CategoryNode, CatalogError> {
        let all = self.store.all_categories().await?;
        let node = all
            .iter()
            .find(|c| c.slug == slug)
            .ok_or(CatalogError::CategoryNotFound)?;

        let parent = node
            .parent_id
            .and_then(|pid| all.iter().find(|c| c.id == pid))
            .map(summary);
        let children = all
            .iter()
            .filter(|c| c.parent_id == Some(node.id))
            .map(|c| CategoryNode {
                id: c.id,
                name: c.name.clone(),
                slug: c.slug.clone(),
                sort_order: c.sort_order,
                parent: Some(summary(node)),
                children: Vec::new(),
            })
            .collect();

        Ok(CategoryNode {
            id: node.id,
            name: node.name.clone(),
            slug: node.slug.clone(),
            sort_order: node.sort_order,
            parent,
            children,
        })
    }

    async fn create_category(&self, input: CreateCategory) -> Result<CategoryNode, CatalogError> {
        validate_name_slug(&input.name, &input.slug)?;
        self.ensure_category_slug_free(&input.slug, None).await?;
        if let Some(parent_id) = input.parent_id {
            self.ensure_category_exists(parent_id).await?;
        }

        let model = self
            .store
            .create_category(NewCategory {
                name: input.name,
                slug: input.slug,
                parent_id: input.parent_id,
                sort_order: input.sort_order.unwrap_or(0),
                meta_title: input.meta_title,
                meta_description: input.meta_description,
            })
            .await?;
        self.category_by_slug(&model.slug).await
    }

    async fn update_category(
        &self,
        id: i32,
        input: UpdateCategory,
    ) -> Result<CategoryNode, CatalogError> {
        if let Some(slug) = &input.slug {
            if slug.trim().is_empty() {
                return Err(CatalogError::Validation(
                    "slug must not be empty".to_string(),
                ));
            }
            self.ensure_category_slug_free(slug, Some(id)).await?;
        }
        if let Some(parent_id) = input.parent_id {
            if parent_id == id {
                return Err(CatalogError::Validation(
                    "a category cannot be its own parent".to_string(),
                ));
            }
            self.ensure_category_exists(parent_id).await?;
        }

        let patch = CategoryPatch {
            name: input.name,
            slug: input.slug,
            parent_id: input.parent_id,
            sort_order: input.sort_order,
            meta_title: input.meta_title,
            meta_description: input.meta_description,
        };

        match self.store.update_category(id, patch).await? {
            Some(model) => self.category_by_slug(&model.slug).await,
            None => Err(CatalogError::CategoryNotFound),
        }
    }

    async fn delete_category(&self, id: i32) -> Result<(), CatalogError> {
        if self.store.soft_delete_category(id).await? {
            Ok(())
        } else {
            Err(CatalogError::CategoryNotFound)
        }
    }
}
