use axum::{extract::State, Json};

use crate::{
    api::common::{validation::SignUpForm, ApiResponse},
    errors::AppError,
    InnerState,
};

/// Checks a sign-up form before the client hands it to the hosted auth
/// service, including whether the username is still free.
#[tracing::instrument(name = "Validate sign-up", skip(inner, form))]
pub async fn validate_sign_up(
    State(inner): State<InnerState>,
    Json(form): Json<SignUpForm>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    form.validate()?;

    let username = form.username.trim();
    if inner.store.get_profile_by_username(username).await?.is_some() {
        return Err(AppError::Conflict(format!("Username '{}' is already taken", username)));
    }

    Ok(Json(ApiResponse::success(()).with_message("Sign-up details look good")))
}
