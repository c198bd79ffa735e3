use axum::{
    extract::Request,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

use crate::auth::{validar_token, Claims};

/// Authenticated user context extracted from the session token.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: i32,
    pub email: String,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.uid,
            email: claims.correo,
        }
    }
}

/// Token middleware for the protected routes. The token travels in the
/// `x-token` header, as the existing clients send it.
pub async fn validar_jwt(
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, impl IntoResponse> {
    let token = match headers.get("x-token").and_then(|v| v.to_str().ok()) {
        Some(t) if !t.trim().is_empty() => t.trim().to_string(),
        _ => {
            return Err((
                StatusCode::UNAUTHORIZED,
                Json(json!({"ok": false, "msg": "No hay token en la petición"})),
            ))
        }
    };

    let claims = match validar_token(&token) {
        Ok(claims) => claims,
        Err(err) => {
            tracing::debug!("token rechazado: {}", err);
            return Err((
                StatusCode::UNAUTHORIZED,
                Json(json!({"ok": false, "msg": "Token no válido"})),
            ));
        }
    };

    request.extensions_mut().insert(AuthUser::from(claims));
    Ok(next.run(request).await)
}
