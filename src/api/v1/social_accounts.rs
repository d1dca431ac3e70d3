use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    api::common::{
        keys,
        middleware::AuthUser,
        validation::{validate_new_social_account, validate_social_account_changes},
        ApiResponse,
    },
    entities::social_account::{NewSocialAccount, SocialAccountChanges, UserSocialAccount},
    errors::AppError,
    flyweights::{icon::Icon, Flyweights},
    store::Store,
    InnerState,
};

/// A social link with the icon the client renders next to it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialAccountView {
    #[serde(flatten)]
    pub account: UserSocialAccount,
    pub icon: Arc<Icon>,
}

fn with_icon(flyweights: &Flyweights, account: UserSocialAccount) -> SocialAccountView {
    SocialAccountView {
        icon: flyweights.icons.for_platform(&account.platform),
        account,
    }
}

async fn owned_account(store: &dyn Store, id: Uuid, user_id: Uuid) -> Result<UserSocialAccount, AppError> {
    let account = store
        .get_social_account(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Social account {} not found", id)))?;
    if account.user_id != user_id {
        return Err(AppError::Permission(anyhow::anyhow!(
            "This social account belongs to another user"
        )));
    }
    Ok(account)
}

#[tracing::instrument(name = "List social accounts", skip(inner), fields(user_id = %user_id))]
pub async fn list_social_accounts(
    State(inner): State<InnerState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<SocialAccountView>>>, AppError> {
    let InnerState {
        store,
        cache,
        flyweights,
        ..
    } = inner;

    let accounts = cache
        .get_or_load(&keys::user_social_accounts(user_id), || async move {
            store.list_social_accounts(user_id).await
        })
        .await?;

    let views = accounts
        .into_iter()
        .map(|account| with_icon(&flyweights, account))
        .collect();
    Ok(Json(ApiResponse::success(views)))
}

#[tracing::instrument(name = "Create social account", skip(inner, user, payload), fields(user_id = %user.id))]
pub async fn create_social_account(
    State(inner): State<InnerState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<NewSocialAccount>,
) -> Result<Json<ApiResponse<SocialAccountView>>, AppError> {
    let payload = NewSocialAccount {
        platform: payload.platform.trim().to_ascii_lowercase(),
        url: payload.url.trim().to_string(),
    };
    validate_new_social_account(&payload)?;

    let account = inner.store.insert_social_account(user.id, payload).await?;

    inner.cache.invalidate([keys::USER_SOCIAL_ACCOUNTS]);
    Ok(Json(
        ApiResponse::success(with_icon(&inner.flyweights, account)).with_message("Social account added!"),
    ))
}

#[tracing::instrument(name = "Update social account", skip(inner, user, changes), fields(user_id = %user.id, account_id = %id))]
pub async fn update_social_account(
    State(inner): State<InnerState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(changes): Json<SocialAccountChanges>,
) -> Result<Json<ApiResponse<SocialAccountView>>, AppError> {
    let changes = SocialAccountChanges {
        platform: changes.platform.map(|p| p.trim().to_ascii_lowercase()),
        url: changes.url.map(|u| u.trim().to_string()),
    };
    validate_social_account_changes(&changes)?;
    owned_account(inner.store.as_ref(), id, user.id).await?;

    let account = inner.store.update_social_account(id, changes).await?;

    inner.cache.invalidate([keys::USER_SOCIAL_ACCOUNTS]);
    Ok(Json(
        ApiResponse::success(with_icon(&inner.flyweights, account)).with_message("Social account updated!"),
    ))
}

#[tracing::instrument(name = "Delete social account", skip(inner, user), fields(user_id = %user.id, account_id = %id))]
pub async fn delete_social_account(
    State(inner): State<InnerState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Uuid>>, AppError> {
    owned_account(inner.store.as_ref(), id, user.id).await?;

    inner.store.delete_social_account(id).await?;

    inner.cache.invalidate([keys::USER_SOCIAL_ACCOUNTS]);
    Ok(Json(ApiResponse::success(id).with_message("Social account removed!")))
}
