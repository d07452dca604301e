use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::auth::guards::{RequireAdmin, RequireSuperAdmin};
use crate::features::categories::dtos::{
    CategoryOptionDto, CategoryOptionsQuery, CategoryResponseDto, CategoryRowDto,
    CategoryRowsQuery, CreateCategoryDto, ListCategoriesQuery, UpdateCategoryDto,
};
use crate::features::categories::services::CategoryService;
use crate::shared::types::{parse_id_list, ApiResponse, Meta};

/// List all categories
///
/// Returns categories as flat list or tree structure based on `tree` query param.
#[utoipa::path(
    get,
    path = "/api/categories",
    params(ListCategoriesQuery),
    responses(
        (status = 200, description = "List of categories; nested `CategoryTreeDto` items when tree=true", body = ApiResponse<Vec<CategoryResponseDto>>),
    ),
    tag = "categories"
)]
pub async fn list_categories(
    State(service): State<Arc<CategoryService>>,
    Query(query): Query<ListCategoriesQuery>,
) -> Result<Json<ApiResponse<serde_json::Value>>> {
    let value = if query.tree {
        serde_json::to_value(service.list_tree().await?)
    } else {
        serde_json::to_value(service.list().await?)
    }
    .map_err(|e| AppError::Internal(format!("Failed to serialize categories: {}", e)))?;

    Ok(Json(ApiResponse::success(Some(value), None, None)))
}

/// Get category by slug
#[utoipa::path(
    get,
    path = "/api/categories/{slug}",
    params(
        ("slug" = String, Path, description = "Category slug")
    ),
    responses(
        (status = 200, description = "Category found", body = ApiResponse<CategoryResponseDto>),
        (status = 404, description = "Category not found")
    ),
    tag = "categories"
)]
pub async fn get_category(
    State(service): State<Arc<CategoryService>>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<CategoryResponseDto>>> {
    let category = service.get_by_slug(&slug).await?;
    Ok(Json(ApiResponse::success(Some(category), None, None)))
}

/// Rows of the admin category table (admin only)
///
/// Root categories are always listed; children appear only below ids named in `expanded`.
#[utoipa::path(
    get,
    path = "/api/admin/categories/rows",
    params(CategoryRowsQuery),
    responses(
        (status = 200, description = "Visible rows in display order", body = ApiResponse<Vec<CategoryRowDto>>),
        (status = 400, description = "Malformed id list"),
        (status = 403, description = "Forbidden - admin only")
    ),
    tag = "admin-categories",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_category_rows(
    RequireAdmin(_user): RequireAdmin,
    State(service): State<Arc<CategoryService>>,
    Query(query): Query<CategoryRowsQuery>,
) -> Result<Json<ApiResponse<Vec<CategoryRowDto>>>> {
    let expanded = parse_id_list(query.expanded.as_deref(), "expanded")?;

    let (rows, total) = service.list_rows(&expanded).await?;
    Ok(Json(ApiResponse::success(
        Some(rows),
        None,
        Some(Meta { total }),
    )))
}

/// Entries of the nested category picker (admin only)
#[utoipa::path(
    get,
    path = "/api/admin/categories/options",
    params(CategoryOptionsQuery),
    responses(
        (status = 200, description = "Every category in pre-order with selection state", body = ApiResponse<Vec<CategoryOptionDto>>),
        (status = 400, description = "Malformed id list"),
        (status = 404, description = "Edited category not found"),
        (status = 403, description = "Forbidden - admin only")
    ),
    tag = "admin-categories",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_category_options(
    RequireAdmin(_user): RequireAdmin,
    State(service): State<Arc<CategoryService>>,
    Query(query): Query<CategoryOptionsQuery>,
) -> Result<Json<ApiResponse<Vec<CategoryOptionDto>>>> {
    let selected = parse_id_list(query.selected.as_deref(), "selected")?;

    let options = service.list_options(&selected, query.editing).await?;
    Ok(Json(ApiResponse::success(Some(options), None, None)))
}

/// Create a new category (admin only)
#[utoipa::path(
    post,
    path = "/api/admin/categories",
    request_body = CreateCategoryDto,
    responses(
        (status = 201, description = "Category created successfully", body = ApiResponse<CategoryResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Slug already in use"),
        (status = 403, description = "Forbidden - admin only")
    ),
    tag = "admin-categories",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_category(
    RequireAdmin(_user): RequireAdmin,
    State(service): State<Arc<CategoryService>>,
    AppJson(dto): AppJson<CreateCategoryDto>,
) -> Result<(StatusCode, Json<ApiResponse<CategoryResponseDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let category = service.create(dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(category), None, None)),
    ))
}

/// Get a category by ID (admin only)
#[utoipa::path(
    get,
    path = "/api/admin/categories/{id}",
    params(
        ("id" = Uuid, Path, description = "Category ID")
    ),
    responses(
        (status = 200, description = "Category retrieved successfully", body = ApiResponse<CategoryResponseDto>),
        (status = 404, description = "Category not found"),
        (status = 403, description = "Forbidden - admin only")
    ),
    tag = "admin-categories",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_category_by_id(
    RequireAdmin(_user): RequireAdmin,
    State(service): State<Arc<CategoryService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<CategoryResponseDto>>> {
    let category = service.get_by_id(id).await?;
    Ok(Json(ApiResponse::success(Some(category), None, None)))
}

/// Update a category (admin only)
///
/// Omitted fields are left unchanged; `"parent_id": null` moves the category to the root level.
#[utoipa::path(
    put,
    path = "/api/admin/categories/{id}",
    params(
        ("id" = Uuid, Path, description = "Category ID")
    ),
    request_body = UpdateCategoryDto,
    responses(
        (status = 200, description = "Category updated successfully", body = ApiResponse<CategoryResponseDto>),
        (status = 400, description = "Validation error or invalid parent"),
        (status = 404, description = "Category not found"),
        (status = 409, description = "Slug already in use"),
        (status = 403, description = "Forbidden - admin only")
    ),
    tag = "admin-categories",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_category(
    RequireAdmin(_user): RequireAdmin,
    State(service): State<Arc<CategoryService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<UpdateCategoryDto>,
) -> Result<Json<ApiResponse<CategoryResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let category = service.update(id, dto).await?;
    Ok(Json(ApiResponse::success(Some(category), None, None)))
}

/// Delete a category (admin only)
#[utoipa::path(
    delete,
    path = "/api/admin/categories/{id}",
    params(
        ("id" = Uuid, Path, description = "Category ID")
    ),
    responses(
        (status = 200, description = "Category deleted successfully"),
        (status = 404, description = "Category not found"),
        (status = 409, description = "Category still has posts or subcategories"),
        (status = 403, description = "Forbidden - admin only, default category cannot be deleted")
    ),
    tag = "admin-categories",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_category(
    RequireAdmin(_user): RequireAdmin,
    State(service): State<Arc<CategoryService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>> {
    service.delete(id).await?;
    Ok(Json(ApiResponse::success(None, None, None)))
}

/// Make a category the default (super admin only)
#[utoipa::path(
    put,
    path = "/api/admin/categories/{id}/default",
    params(
        ("id" = Uuid, Path, description = "Category ID")
    ),
    responses(
        (status = 200, description = "Default category changed", body = ApiResponse<CategoryResponseDto>),
        (status = 404, description = "Category not found"),
        (status = 403, description = "Forbidden - super admin only")
    ),
    tag = "admin-categories",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn set_default_category(
    RequireSuperAdmin(user): RequireSuperAdmin,
    State(service): State<Arc<CategoryService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<CategoryResponseDto>>> {
    tracing::info!(account_id = %user.account_id, category_id = %id, "Changing default category");

    let category = service.set_default(id).await?;
    Ok(Json(ApiResponse::success(Some(category), None, None)))
}
