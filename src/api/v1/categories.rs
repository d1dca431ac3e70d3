use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::{
    api::common::{keys, ApiResponse},
    entities::category::Category,
    errors::AppError,
    InnerState,
};

/// Lists categories and feeds them through the category flyweights, so the
/// response carries the shared instances (see the preload policy).
#[tracing::instrument(name = "List categories", skip(inner))]
pub async fn list_categories(
    State(inner): State<InnerState>,
) -> Result<Json<ApiResponse<Vec<Arc<Category>>>>, AppError> {
    let InnerState {
        store,
        cache,
        flyweights,
        ..
    } = inner;

    let rows = cache
        .get_or_load(&keys::categories_list(), || async move { store.list_categories().await })
        .await?;

    let categories = flyweights.categories.preload(rows);
    tracing::debug!(
        "Serving {} categories ({} cached flyweights)",
        categories.len(),
        flyweights.categories.len()
    );
    Ok(Json(ApiResponse::success(categories)))
}

#[tracing::instrument(name = "Get category", skip(inner), fields(category_id = %id))]
pub async fn get_category(
    State(inner): State<InnerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Arc<Category>>>, AppError> {
    if let Some(category) = inner.flyweights.categories.get(id) {
        return Ok(Json(ApiResponse::success(category)));
    }

    let row = inner
        .store
        .get_category(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Category {} not found", id)))?;

    let category = inner
        .flyweights
        .categories
        .preload(vec![row])
        .pop()
        .ok_or_else(|| AppError::Unexpected(anyhow::anyhow!("Category preload returned nothing")))?;
    Ok(Json(ApiResponse::success(category)))
}
