use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::features::categories::models::Category;
use crate::features::categories::tree::{TreeEntry, TreeOption};
use crate::shared::validation::SLUG_REGEX;

/// Distinguish an absent field (`None`) from an explicit `null` (`Some(None)`)
fn deserialize_some<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Response DTO for category
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryResponseDto {
    pub id: Uuid,
    pub parent_id: Option<Uuid>,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub is_default: bool,
    pub post_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Category> for CategoryResponseDto {
    fn from(c: Category) -> Self {
        Self {
            id: c.id,
            parent_id: c.parent_id,
            name: c.name,
            slug: c.slug,
            description: c.description,
            is_default: c.is_default,
            post_count: c.post_count,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

/// Category node of the hierarchy: the flat record plus its direct children
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(no_recursion)]
pub struct CategoryTreeDto {
    pub id: Uuid,
    pub parent_id: Option<Uuid>,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub is_default: bool,
    pub post_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub children: Vec<CategoryTreeDto>,
}

impl CategoryTreeDto {
    /// Copy a flat record into a node without children
    pub fn leaf(c: &Category) -> Self {
        Self {
            id: c.id,
            parent_id: c.parent_id,
            name: c.name.clone(),
            slug: c.slug.clone(),
            description: c.description.clone(),
            is_default: c.is_default,
            post_count: c.post_count,
            created_at: c.created_at,
            updated_at: c.updated_at,
            children: Vec::new(),
        }
    }

    /// The default category, categories with posts, and categories with
    /// subcategories cannot be deleted
    pub fn is_deletable(&self) -> bool {
        !self.is_default && self.post_count == 0 && self.children.is_empty()
    }
}

/// Row of the admin category table
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryRowDto {
    pub id: Uuid,
    pub parent_id: Option<Uuid>,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub is_default: bool,
    pub post_count: i64,
    /// Nesting level, 0 for root categories (indentation only)
    pub depth: usize,
    pub has_children: bool,
    pub is_expanded: bool,
    pub can_delete: bool,
}

impl CategoryRowDto {
    pub fn from_entry(entry: &TreeEntry<'_>, expanded: &HashSet<Uuid>) -> Self {
        let node = entry.node;
        Self {
            id: node.id,
            parent_id: node.parent_id,
            name: node.name.clone(),
            slug: node.slug.clone(),
            description: node.description.clone(),
            is_default: node.is_default,
            post_count: node.post_count,
            depth: entry.depth,
            has_children: !node.children.is_empty(),
            is_expanded: expanded.contains(&node.id),
            can_delete: node.is_deletable(),
        }
    }
}

/// Entry of the nested category picker
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryOptionDto {
    pub id: Uuid,
    pub parent_id: Option<Uuid>,
    pub name: String,
    pub slug: String,
    pub depth: usize,
    pub selectable: bool,
    pub selected: bool,
}

impl From<&TreeOption<'_>> for CategoryOptionDto {
    fn from(option: &TreeOption<'_>) -> Self {
        Self {
            id: option.node.id,
            parent_id: option.node.parent_id,
            name: option.node.name.clone(),
            slug: option.node.slug.clone(),
            depth: option.depth,
            selectable: option.selectable,
            selected: option.selected,
        }
    }
}

/// Query params for listing categories
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListCategoriesQuery {
    /// If true, return tree structure. Default: false (flat list)
    #[serde(default)]
    pub tree: bool,
}

/// Query params for the admin category table
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CategoryRowsQuery {
    /// Comma separated ids of categories whose children are shown
    pub expanded: Option<String>,
}

/// Query params for the category picker
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CategoryOptionsQuery {
    /// Comma separated ids of pre-selected categories
    pub selected: Option<String>,
    /// Category being edited; it and its descendants become non-selectable
    pub editing: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCategoryDto {
    #[validate(length(min = 1, max = 200))]
    pub name: String,

    /// Optional slug override; derived from `name` when omitted
    #[validate(length(min = 1, max = 200), regex(path = *SLUG_REGEX, message = "slug must be lowercase alphanumeric segments separated by single hyphens (e.g., 'web-tasarim')"))]
    pub slug: Option<String>,

    #[validate(length(max = 2000))]
    pub description: Option<String>,

    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateCategoryDto {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,

    #[validate(length(min = 1, max = 200), regex(path = *SLUG_REGEX, message = "slug must be lowercase alphanumeric segments separated by single hyphens (e.g., 'web-tasarim')"))]
    pub slug: Option<String>,

    /// Absent keeps the description, `null` clears it
    #[serde(default, deserialize_with = "deserialize_some")]
    #[schema(value_type = Option<String>, nullable)]
    pub description: Option<Option<String>>,

    /// Absent keeps the parent, `null` makes the category a root
    #[serde(default, deserialize_with = "deserialize_some")]
    #[schema(value_type = Option<Uuid>, nullable)]
    pub parent_id: Option<Option<Uuid>>,
}
