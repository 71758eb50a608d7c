//! POST /api/signin

use crate::error::AppError;
use crate::extractors::FormFields;
use crate::response::{send, success, Envelope};
use crate::service::{find_or_create_user, SignInOutcome};
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse};

pub async fn sign_in(
    State(state): State<AppState>,
    form: FormFields,
) -> Result<impl IntoResponse, AppError> {
    let (Some(username), Some(password)) = (form.get("username"), form.get("password")) else {
        return Err(AppError::validation("Username and password are required."));
    };

    let outcome = find_or_create_user(state.store.as_ref(), state.sign_in, username, password)
        .await
        .map_err(|e| AppError::internal("Server error during authentication/registration.", e))?;

    match outcome {
        SignInOutcome::SignedIn { user_id } => {
            tracing::debug!(user_id, "signed in");
            Ok(success("Sign-in successful."))
        }
        SignInOutcome::Registered { user_id } => Ok(send(
            StatusCode::OK,
            Envelope::success("New user created and signed in successfully.").with_user_id(user_id),
        )),
        SignInOutcome::Rejected => {
            tracing::warn!(username, "sign-in rejected");
            Err(AppError::Auth("Invalid username or password.".into()))
        }
    }
}
