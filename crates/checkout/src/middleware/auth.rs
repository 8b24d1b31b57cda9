//! Authentication extractors.
//!
//! The session only carries the user id. The identity (role and dealer tier)
//! is loaded from storage on every request so tier changes apply at once.

use axum::{extract::FromRequestParts, http::request::Parts};
use tierstore_core::{UserId, UserIdentity};
use tower_sessions::Session;
use tracing::warn;

use crate::error::{AppError, set_sentry_user};
use crate::state::AppState;
use crate::store::{CheckoutStore, UserDirectory};

/// Session key under which the authentication service stores the user id.
pub const SESSION_USER_ID: &str = "user_id";

/// Extractor that requires a signed-in user.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(RequireUser(user): RequireUser) -> String {
///     format!("Hello, {}!", user.id)
/// }
/// ```
pub struct RequireUser(pub UserIdentity);

/// Extractor that resolves the user if one is signed in.
pub struct OptionalUser(pub Option<UserIdentity>);

/// Extractor that requires a signed-in administrator.
pub struct RequireAdmin(pub UserIdentity);

/// Resolve the identity behind the request's session, if any.
async fn session_identity<S: CheckoutStore>(
    parts: &Parts,
    state: &AppState<S>,
) -> Result<Option<UserIdentity>, AppError> {
    let Some(session) = parts.extensions.get::<Session>() else {
        return Ok(None);
    };

    let user_id = match session.get::<UserId>(SESSION_USER_ID).await {
        Ok(id) => id,
        Err(e) => {
            warn!(error = %e, "Failed to read session");
            None
        }
    };
    let Some(user_id) = user_id else {
        return Ok(None);
    };

    let identity = state.store().identity(user_id).await?;
    if let Some(identity) = &identity {
        set_sentry_user(&identity.id, identity.user_type.as_str());
    } else {
        warn!(user_id = %user_id, "Session references unknown user");
    }
    Ok(identity)
}

impl<S: CheckoutStore> FromRequestParts<AppState<S>> for RequireUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<S>,
    ) -> Result<Self, Self::Rejection> {
        session_identity(parts, state)
            .await?
            .map(Self)
            .ok_or(AppError::Unauthorized)
    }
}

impl<S: CheckoutStore> FromRequestParts<AppState<S>> for OptionalUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<S>,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self(session_identity(parts, state).await?))
    }
}

impl<S: CheckoutStore> FromRequestParts<AppState<S>> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<S>,
    ) -> Result<Self, Self::Rejection> {
        let identity = session_identity(parts, state)
            .await?
            .ok_or(AppError::Unauthorized)?;
        if !identity.is_admin() {
            warn!(user_id = %identity.id, "Non-admin attempted admin route");
            return Err(AppError::Forbidden);
        }
        Ok(Self(identity))
    }
}

/// Store the signed-in user id in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_session_user(
    session: &Session,
    user_id: UserId,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(SESSION_USER_ID, user_id).await
}
