use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::{
    error::AppError,
    models::system_user::SystemUser,
    repositories::system_user as system_user_repo,
    state::AppState,
    utils::jwt::verify_access_token,
};

/// Resolves the bearer token to an active [`SystemUser`] request extension.
pub async fn auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = extract_auth_header(request.headers());
    let user = authenticate_request(auth_header.as_deref(), &state).await?;
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

fn parse_bearer_token(header: &str) -> Option<&str> {
    if let Some(rest) = header.strip_prefix("Bearer ") {
        return Some(rest);
    }
    if let Some(space_idx) = header.find(' ') {
        let (scheme, rest) = header.split_at(space_idx);
        if scheme.eq_ignore_ascii_case("bearer") {
            return Some(rest.trim_start());
        }
    }
    None
}

async fn authenticate_request(
    auth_header: Option<&str>,
    state: &AppState,
) -> Result<SystemUser, AppError> {
    let unauthorized = || AppError::Unauthorized("Authentication required".into());

    let token = auth_header
        .and_then(parse_bearer_token)
        .filter(|token| !token.is_empty())
        .ok_or_else(unauthorized)?;

    let claims = verify_access_token(token, &state.config.jwt_secret).map_err(|err| {
        tracing::debug!(error = %err, "Rejected access token");
        unauthorized()
    })?;
    let user_id = claims.user_id().map_err(|_| unauthorized())?;

    let user = system_user_repo::find_by_id(&state.pool, user_id)
        .await?
        .ok_or_else(unauthorized)?;
    if !user.is_active {
        return Err(AppError::Unauthorized("Account is disabled".into()));
    }

    Ok(user)
}

fn extract_auth_header(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim().to_owned())
}
