//! Read-only access to the fixed descriptor registries (icons, roles, styles).

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    api::common::ApiResponse,
    errors::AppError,
    flyweights::{
        icon::Icon,
        role::{Role, RoleId},
        style::{Style, StyleId},
    },
    InnerState,
};

/// Unknown names answer with the fallback icon rather than an error.
pub async fn get_icon(
    State(inner): State<InnerState>,
    Path(name): Path<String>,
) -> Json<ApiResponse<Arc<Icon>>> {
    Json(ApiResponse::success(inner.flyweights.icons.get(&name)))
}

pub async fn get_role(
    State(inner): State<InnerState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Arc<Role>>>, AppError> {
    let id = RoleId::from_str(&id)?;
    Ok(Json(ApiResponse::success(inner.flyweights.roles.get(id))))
}

pub async fn get_style(
    State(inner): State<InnerState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Arc<Style>>>, AppError> {
    let id = StyleId::from_str(&id)?;
    Ok(Json(ApiResponse::success(inner.flyweights.styles.get(id))))
}
