use std::collections::HashSet;

use sqlx::PgPool;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::categories::dtos::{
    CategoryOptionDto, CategoryResponseDto, CategoryRowDto, CategoryTreeDto, CreateCategoryDto,
    UpdateCategoryDto,
};
use crate::features::categories::models::Category;
use crate::features::categories::tree::{self, CategoryForest};
use crate::shared::slug::slugify;

const MAX_DESCRIPTION_LENGTH: usize = 2000;

/// Build the category SELECT with an optional WHERE clause.
///
/// `post_count` is aggregated here so every loaded row carries it.
fn select_categories(filter: &str) -> String {
    format!(
        r#"
        SELECT c.id, c.parent_id, c.name, c.slug, c.description, c.is_default,
               COUNT(pc.post_id) AS post_count,
               c.created_at, c.updated_at
        FROM categories c
        LEFT JOIN blog_post_categories pc ON pc.category_id = c.id
        {}
        GROUP BY c.id
        ORDER BY c.name ASC, c.id ASC
        "#,
        filter
    )
}

/// Convert database error to more specific AppError with user-friendly messages
fn handle_db_error(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        // Unique constraint violation
        if db_err.code() == Some(std::borrow::Cow::Borrowed("23505")) {
            if db_err.constraint() == Some("categories_single_default") {
                return AppError::Conflict("Another category is already the default".to_string());
            }
            return AppError::Conflict("A category with this slug already exists".to_string());
        }

        // Foreign key violation
        if db_err.code() == Some(std::borrow::Cow::Borrowed("23503")) {
            return AppError::BadRequest("Referenced category does not exist".to_string());
        }
    }

    tracing::error!("Category query failed: {:?}", e);
    AppError::Database(e)
}

/// Trim a submitted name; a name of only whitespace is rejected
fn normalize_name(raw: &str) -> Result<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(AppError::Validation(
            "Category name must not be blank".to_string(),
        ));
    }
    Ok(name.to_string())
}

/// Resolve the slug for a create/update: explicit override or derived from the name
fn resolve_slug(name: &str, slug_override: Option<String>) -> Result<String> {
    let slug = slug_override.unwrap_or_else(|| slugify(name));
    if slug.is_empty() {
        return Err(AppError::Validation(
            "Category name must contain at least one letter or digit".to_string(),
        ));
    }
    Ok(slug)
}

/// Column values for a new category
#[derive(Debug, PartialEq)]
struct NewCategory {
    name: String,
    slug: String,
    description: Option<String>,
    parent_id: Option<Uuid>,
}

fn prepare_create(dto: CreateCategoryDto) -> Result<NewCategory> {
    let name = normalize_name(&dto.name)?;
    let slug = resolve_slug(&name, dto.slug)?;

    Ok(NewCategory {
        name,
        slug,
        description: dto.description,
        parent_id: dto.parent_id,
    })
}

/// Column values written by an update
#[derive(Debug, PartialEq)]
struct CategoryChanges {
    name: String,
    slug: String,
    description: Option<String>,
    parent_id: Option<Uuid>,
}

/// Merge an update request into the stored category.
///
/// Absent fields keep their stored value, `null` clears `description` or
/// moves the category to the root level. A rename without an explicit slug
/// regenerates the slug.
fn merge_update(
    current: &Category,
    dto: UpdateCategoryDto,
    roots: &[CategoryTreeDto],
) -> Result<CategoryChanges> {
    let name = match dto.name.as_deref() {
        Some(raw) => normalize_name(raw)?,
        None => current.name.clone(),
    };

    let slug = match dto.slug {
        Some(slug) => slug,
        None if name != current.name => resolve_slug(&name, None)?,
        None => current.slug.clone(),
    };

    let description = match dto.description {
        Some(description) => description,
        None => current.description.clone(),
    };
    if description
        .as_ref()
        .is_some_and(|d| d.chars().count() > MAX_DESCRIPTION_LENGTH)
    {
        return Err(AppError::Validation(format!(
            "description must be at most {} characters",
            MAX_DESCRIPTION_LENGTH
        )));
    }

    let parent_id = match dto.parent_id {
        Some(Some(new_parent)) => {
            validate_new_parent(roots, current.id, new_parent)?;
            Some(new_parent)
        }
        Some(None) => None,
        None => current.parent_id,
    };

    Ok(CategoryChanges {
        name,
        slug,
        description,
        parent_id,
    })
}

/// Error for a delete that matched no row: the category either vanished or
/// became the default after the pre-checks
fn unmatched_delete_error(id: Uuid, still_stored: Option<&Category>) -> AppError {
    match still_stored {
        Some(category) if category.is_default => AppError::Forbidden(
            "The default category cannot be deleted".to_string(),
        ),
        _ => AppError::NotFound(format!("Category {} not found", id)),
    }
}

/// Why a category cannot be deleted, if anything prevents it
fn deletion_blocker(category: &Category, all: &[Category]) -> Option<AppError> {
    if category.is_default {
        return Some(AppError::Forbidden(
            "The default category cannot be deleted".to_string(),
        ));
    }
    if category.post_count > 0 {
        return Some(AppError::Conflict(format!(
            "Category '{}' still has {} post(s)",
            category.name, category.post_count
        )));
    }
    if all.iter().any(|c| c.parent_id == Some(category.id)) {
        return Some(AppError::Conflict(format!(
            "Category '{}' still has subcategories",
            category.name
        )));
    }
    None
}

/// Check that `new_parent` can become the parent of `id`.
///
/// The parent has to be reachable from a root, and it cannot be the category
/// itself or one of its descendants, otherwise the update would close a cycle.
fn validate_new_parent(roots: &[CategoryTreeDto], id: Uuid, new_parent: Uuid) -> Result<()> {
    if new_parent == id {
        return Err(AppError::Validation(
            "A category cannot be its own parent".to_string(),
        ));
    }

    if tree::find_node(roots, new_parent).is_none() {
        return Err(AppError::Validation(format!(
            "Parent category {} not found",
            new_parent
        )));
    }

    // A detached category has no reachable descendants to collide with
    if let Some(node) = tree::find_node(roots, id) {
        if tree::descendant_ids(node).contains(&new_parent) {
            return Err(AppError::Validation(
                "A category cannot be moved under one of its own subcategories".to_string(),
            ));
        }
    }

    Ok(())
}

/// Service for blog category operations
pub struct CategoryService {
    pool: PgPool,
}

impl CategoryService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Load every category, ordered by name
    async fn fetch_all(&self) -> Result<Vec<Category>> {
        sqlx::query_as::<_, Category>(&select_categories(""))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list categories: {:?}", e);
                AppError::Database(e)
            })
    }

    async fn fetch_by_id(&self, id: Uuid) -> Result<Option<Category>> {
        sqlx::query_as::<_, Category>(&select_categories("WHERE c.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to get category by id: {:?}", e);
                AppError::Database(e)
            })
    }

    /// Build the forest and report records that could not be placed in it
    fn forest_of(categories: &[Category]) -> CategoryForest {
        let forest = tree::build_forest(categories);
        if !forest.detached.is_empty() {
            tracing::warn!(
                detached = ?forest.detached,
                "{} categories are not reachable from a root and were left out of the tree",
                forest.detached.len()
            );
        }
        forest
    }

    /// List all categories (flat list)
    pub async fn list(&self) -> Result<Vec<CategoryResponseDto>> {
        let categories = self.fetch_all().await?;
        Ok(categories.into_iter().map(|c| c.into()).collect())
    }

    /// List all categories as tree structure
    pub async fn list_tree(&self) -> Result<Vec<CategoryTreeDto>> {
        let categories = self.fetch_all().await?;
        Ok(Self::forest_of(&categories).roots)
    }

    /// Rows for the admin table, honouring the caller's expand state.
    ///
    /// Also returns the number of categories in the tree, collapsed ones included.
    pub async fn list_rows(&self, expanded: &HashSet<Uuid>) -> Result<(Vec<CategoryRowDto>, i64)> {
        let categories = self.fetch_all().await?;
        let forest = Self::forest_of(&categories);

        let rows = tree::flatten_for_listing(&forest.roots, expanded)
            .iter()
            .map(|entry| CategoryRowDto::from_entry(entry, expanded))
            .collect();
        let total = tree::count_nodes(&forest.roots) as i64;

        Ok((rows, total))
    }

    /// Picker entries. When `editing` is set, that category and everything
    /// below it is listed but not selectable.
    pub async fn list_options(
        &self,
        selected: &HashSet<Uuid>,
        editing: Option<Uuid>,
    ) -> Result<Vec<CategoryOptionDto>> {
        let categories = self.fetch_all().await?;
        let forest = Self::forest_of(&categories);

        let disabled = match editing {
            Some(id) => tree::find_node(&forest.roots, id)
                .map(tree::descendant_ids)
                .ok_or_else(|| AppError::NotFound(format!("Category {} not found", id)))?,
            None => HashSet::new(),
        };

        Ok(tree::option_list(&forest.roots, selected, &disabled, editing)
            .iter()
            .map(CategoryOptionDto::from)
            .collect())
    }

    /// Get category by slug
    pub async fn get_by_slug(&self, slug: &str) -> Result<CategoryResponseDto> {
        let category = sqlx::query_as::<_, Category>(&select_categories("WHERE c.slug = $1"))
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to get category by slug: {:?}", e);
                AppError::Database(e)
            })?;

        category
            .map(|c| c.into())
            .ok_or_else(|| AppError::NotFound(format!("Category '{}' not found", slug)))
    }

    /// Get category by id
    pub async fn get_by_id(&self, id: Uuid) -> Result<CategoryResponseDto> {
        self.fetch_by_id(id)
            .await?
            .map(|c| c.into())
            .ok_or_else(|| AppError::NotFound(format!("Category {} not found", id)))
    }

    /// Create a category. New categories are never the default.
    pub async fn create(&self, dto: CreateCategoryDto) -> Result<CategoryResponseDto> {
        let new = prepare_create(dto)?;

        if let Some(parent_id) = new.parent_id {
            let parent_exists: bool =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM categories WHERE id = $1)")
                    .bind(parent_id)
                    .fetch_one(&self.pool)
                    .await
                    .map_err(handle_db_error)?;

            if !parent_exists {
                return Err(AppError::Validation(format!(
                    "Parent category {} not found",
                    parent_id
                )));
            }
        }

        let category = sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (parent_id, name, slug, description)
            VALUES ($1, $2, $3, $4)
            RETURNING id, parent_id, name, slug, description, is_default,
                      0::BIGINT AS post_count, created_at, updated_at
            "#,
        )
        .bind(new.parent_id)
        .bind(&new.name)
        .bind(&new.slug)
        .bind(&new.description)
        .fetch_one(&self.pool)
        .await
        .map_err(handle_db_error)?;

        tracing::info!(category_id = %category.id, slug = %category.slug, "Category created");

        Ok(category.into())
    }

    /// Update name, slug, description and/or parent.
    ///
    /// Renaming without an explicit slug regenerates the slug from the new name.
    pub async fn update(&self, id: Uuid, dto: UpdateCategoryDto) -> Result<CategoryResponseDto> {
        let categories = self.fetch_all().await?;
        let current = categories
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Category {} not found", id)))?;

        let changes = merge_update(current, dto, &tree::build_tree(&categories))?;

        let result = sqlx::query(
            r#"
            UPDATE categories
            SET name = $1,
                slug = $2,
                description = $3,
                parent_id = $4,
                updated_at = NOW()
            WHERE id = $5
            "#,
        )
        .bind(&changes.name)
        .bind(&changes.slug)
        .bind(&changes.description)
        .bind(changes.parent_id)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(handle_db_error)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Category {} not found", id)));
        }

        tracing::info!(category_id = %id, slug = %changes.slug, "Category updated");

        self.get_by_id(id).await
    }

    /// Delete a category that is not the default and has no posts or subcategories
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let categories = self.fetch_all().await?;
        let category = categories
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Category {} not found", id)))?;

        if let Some(blocker) = deletion_blocker(category, &categories) {
            return Err(blocker);
        }

        let result = sqlx::query("DELETE FROM categories WHERE id = $1 AND is_default = FALSE")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| match handle_db_error(e) {
                // A post or subcategory was attached after the checks above
                AppError::BadRequest(_) => {
                    AppError::Conflict("Category is still in use".to_string())
                }
                other => other,
            })?;

        if result.rows_affected() == 0 {
            let still_stored = self.fetch_by_id(id).await?;
            return Err(unmatched_delete_error(id, still_stored.as_ref()));
        }

        tracing::info!(category_id = %id, "Category deleted");

        Ok(())
    }

    /// Make `id` the one and only default category
    pub async fn set_default(&self, id: Uuid) -> Result<CategoryResponseDto> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        sqlx::query(
            r#"
            UPDATE categories
            SET is_default = FALSE, updated_at = NOW()
            WHERE is_default = TRUE AND id <> $1
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(handle_db_error)?;

        let result = sqlx::query(
            r#"
            UPDATE categories
            SET is_default = TRUE, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(handle_db_error)?;

        if result.rows_affected() == 0 {
            // Dropping the transaction rolls back the first update
            return Err(AppError::NotFound(format!("Category {} not found", id)));
        }

        tx.commit().await.map_err(AppError::Database)?;
        tracing::info!(category_id = %id, "Default category changed");

        self.get_by_id(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn category(n: u128, name: &str, parent: Option<u128>) -> Category {
        let now = Utc::now();
        Category {
            id: Uuid::from_u128(n),
            parent_id: parent.map(Uuid::from_u128),
            name: name.to_string(),
            slug: slugify(name),
            description: None,
            is_default: false,
            post_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    fn sample() -> Vec<Category> {
        let mut categories = vec![
            category(1, "Genel", None),
            category(2, "Teknoloji", None),
            category(3, "Web", Some(2)),
            category(4, "SEO", Some(2)),
            category(5, "Frontend", Some(3)),
        ];
        categories[0].is_default = true;
        categories[3].post_count = 2;
        categories
    }

    fn no_changes() -> UpdateCategoryDto {
        UpdateCategoryDto {
            name: None,
            slug: None,
            description: None,
            parent_id: None,
        }
    }

    fn web_with_description() -> Category {
        let mut web = category(3, "Web", Some(2));
        web.description = Some("Sites and apps".to_string());
        web
    }

    #[test]
    fn test_create_rejects_blank_name_even_with_slug() {
        let dto = CreateCategoryDto {
            name: "   ".to_string(),
            slug: Some("x".to_string()),
            description: None,
            parent_id: None,
        };
        assert!(matches!(prepare_create(dto), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_create_trims_name_and_derives_slug() {
        let parent = Uuid::from_u128(2);
        let dto = CreateCategoryDto {
            name: "  Web Tasarım ".to_string(),
            slug: None,
            description: Some("Design".to_string()),
            parent_id: Some(parent),
        };

        let new = prepare_create(dto).unwrap();
        assert_eq!(
            new,
            NewCategory {
                name: "Web Tasarım".to_string(),
                slug: "web-tasar-m".to_string(),
                description: Some("Design".to_string()),
                parent_id: Some(parent),
            }
        );
    }

    #[test]
    fn test_update_rejects_blank_name_even_with_slug() {
        let roots = tree::build_tree(&sample());
        let dto = UpdateCategoryDto {
            name: Some("  ".to_string()),
            slug: Some("x".to_string()),
            ..no_changes()
        };

        let result = merge_update(&web_with_description(), dto, &roots);
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_update_without_fields_keeps_everything() {
        let roots = tree::build_tree(&sample());
        let current = web_with_description();

        let changes = merge_update(&current, no_changes(), &roots).unwrap();
        assert_eq!(
            changes,
            CategoryChanges {
                name: "Web".to_string(),
                slug: "web".to_string(),
                description: Some("Sites and apps".to_string()),
                parent_id: Some(Uuid::from_u128(2)),
            }
        );
    }

    #[test]
    fn test_rename_regenerates_slug() {
        let roots = tree::build_tree(&sample());
        let dto = UpdateCategoryDto {
            name: Some("Web Geliştirme".to_string()),
            ..no_changes()
        };

        let changes = merge_update(&web_with_description(), dto, &roots).unwrap();
        assert_eq!(changes.name, "Web Geliştirme");
        assert_eq!(changes.slug, "web-geli-tirme");
    }

    #[test]
    fn test_rename_with_slug_override_keeps_override() {
        let roots = tree::build_tree(&sample());
        let dto = UpdateCategoryDto {
            name: Some("Web Geliştirme".to_string()),
            slug: Some("web-gelistirme".to_string()),
            ..no_changes()
        };

        let changes = merge_update(&web_with_description(), dto, &roots).unwrap();
        assert_eq!(changes.slug, "web-gelistirme");
    }

    #[test]
    fn test_same_name_keeps_slug() {
        let roots = tree::build_tree(&sample());
        let mut current = web_with_description();
        current.slug = "web-custom".to_string();
        let dto = UpdateCategoryDto {
            name: Some(" Web ".to_string()),
            ..no_changes()
        };

        let changes = merge_update(&current, dto, &roots).unwrap();
        assert_eq!(changes.slug, "web-custom");
    }

    #[test]
    fn test_null_description_clears_and_value_replaces() {
        let roots = tree::build_tree(&sample());

        let cleared = UpdateCategoryDto {
            description: Some(None),
            ..no_changes()
        };
        let changes = merge_update(&web_with_description(), cleared, &roots).unwrap();
        assert_eq!(changes.description, None);

        let replaced = UpdateCategoryDto {
            description: Some(Some("Frontend and backend".to_string())),
            ..no_changes()
        };
        let changes = merge_update(&web_with_description(), replaced, &roots).unwrap();
        assert_eq!(changes.description.as_deref(), Some("Frontend and backend"));
    }

    #[test]
    fn test_description_length_limit() {
        let roots = tree::build_tree(&sample());

        let at_limit = UpdateCategoryDto {
            description: Some(Some("a".repeat(MAX_DESCRIPTION_LENGTH))),
            ..no_changes()
        };
        assert!(merge_update(&web_with_description(), at_limit, &roots).is_ok());

        let too_long = UpdateCategoryDto {
            description: Some(Some("a".repeat(MAX_DESCRIPTION_LENGTH + 1))),
            ..no_changes()
        };
        let result = merge_update(&web_with_description(), too_long, &roots);
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_null_parent_moves_to_root_and_value_reparents() {
        let roots = tree::build_tree(&sample());

        let to_root = UpdateCategoryDto {
            parent_id: Some(None),
            ..no_changes()
        };
        let changes = merge_update(&web_with_description(), to_root, &roots).unwrap();
        assert_eq!(changes.parent_id, None);

        let under_genel = UpdateCategoryDto {
            parent_id: Some(Some(Uuid::from_u128(1))),
            ..no_changes()
        };
        let changes = merge_update(&web_with_description(), under_genel, &roots).unwrap();
        assert_eq!(changes.parent_id, Some(Uuid::from_u128(1)));
    }

    #[test]
    fn test_reparent_under_own_descendant_is_rejected() {
        let roots = tree::build_tree(&sample());
        let dto = UpdateCategoryDto {
            parent_id: Some(Some(Uuid::from_u128(5))),
            ..no_changes()
        };

        let result = merge_update(&web_with_description(), dto, &roots);
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_unmatched_delete_error() {
        let id = Uuid::from_u128(3);
        let mut became_default = web_with_description();
        became_default.is_default = true;

        assert!(matches!(
            unmatched_delete_error(id, Some(&became_default)),
            AppError::Forbidden(_)
        ));
        assert!(matches!(
            unmatched_delete_error(id, None),
            AppError::NotFound(_)
        ));
    }

    #[test]
    fn test_resolve_slug() {
        assert_eq!(resolve_slug("Web Tasarım", None).unwrap(), "web-tasar-m");
        assert_eq!(
            resolve_slug("Web Tasarım", Some("web-tasarim".to_string())).unwrap(),
            "web-tasarim"
        );
        assert!(matches!(
            resolve_slug("!!!", None),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_deletion_blockers() {
        let all = sample();

        assert!(matches!(
            deletion_blocker(&all[0], &all),
            Some(AppError::Forbidden(_))
        ));
        assert!(matches!(
            deletion_blocker(&all[3], &all),
            Some(AppError::Conflict(_))
        ));
        // Web has Frontend below it
        assert!(matches!(
            deletion_blocker(&all[2], &all),
            Some(AppError::Conflict(_))
        ));
        assert!(deletion_blocker(&all[4], &all).is_none());
    }

    #[test]
    fn test_new_parent_cannot_be_self_or_descendant() {
        let roots = tree::build_tree(&sample());
        let teknoloji = Uuid::from_u128(2);

        assert!(validate_new_parent(&roots, teknoloji, teknoloji).is_err());
        assert!(validate_new_parent(&roots, teknoloji, Uuid::from_u128(3)).is_err());
        assert!(validate_new_parent(&roots, teknoloji, Uuid::from_u128(5)).is_err());
        assert!(validate_new_parent(&roots, teknoloji, Uuid::from_u128(1)).is_ok());
    }

    #[test]
    fn test_new_parent_must_exist() {
        let roots = tree::build_tree(&sample());
        let result = validate_new_parent(&roots, Uuid::from_u128(3), Uuid::from_u128(99));
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_moving_sideways_is_allowed() {
        let roots = tree::build_tree(&sample());
        // Frontend from under Web to under SEO
        assert!(validate_new_parent(&roots, Uuid::from_u128(5), Uuid::from_u128(4)).is_ok());
    }

    #[test]
    fn test_select_categories_places_filter_before_group_by() {
        let sql = select_categories("WHERE c.slug = $1");
        let filter = sql.find("WHERE c.slug").unwrap();
        let group = sql.find("GROUP BY").unwrap();
        assert!(filter < group);
    }
}
