use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::shared::constants::MAX_ID_LIST_LENGTH;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub meta: Option<Meta>,
    pub errors: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Meta {
    pub total: i64,
}

impl<T> ApiResponse<T> {
    pub fn success(data: Option<T>, message: Option<String>, meta: Option<Meta>) -> Self {
        Self {
            success: true,
            data,
            message,
            meta,
            errors: None,
        }
    }

    pub fn error(message: Option<String>, errors: Option<Vec<String>>) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            message,
            meta: None,
            errors,
        }
    }
}

// =============================================================================
// ID LISTS
// =============================================================================

/// Parse a comma separated list of UUIDs from a query parameter.
///
/// Missing or blank input yields an empty set. Empty segments (`a,,b`) are skipped.
pub fn parse_id_list(raw: Option<&str>, field: &str) -> Result<HashSet<Uuid>> {
    let Some(raw) = raw else {
        return Ok(HashSet::new());
    };

    let segments: Vec<&str> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    if segments.len() > MAX_ID_LIST_LENGTH {
        return Err(AppError::BadRequest(format!(
            "{} accepts at most {} ids",
            field, MAX_ID_LIST_LENGTH
        )));
    }

    segments
        .into_iter()
        .map(|s| {
            Uuid::parse_str(s)
                .map_err(|_| AppError::BadRequest(format!("{} contains an invalid id: {}", field, s)))
        })
        .collect()
}
