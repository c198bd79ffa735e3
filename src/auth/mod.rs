use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Session-token claims. `uid`/`correo` match what the legacy clients
/// already decode, so issued tokens stay interchangeable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub uid: i32,
    pub correo: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("JWT secret not configured")]
    SecretMissing,
    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

/// Issue a token for the given user with the configured secret and expiry.
pub fn generar_token(uid: i32, correo: &str) -> Result<String, AuthError> {
    let security = &crate::config::config().security;
    if security.jwt_secret.is_empty() {
        return Err(AuthError::SecretMissing);
    }
    firmar(uid, correo, &security.jwt_secret, security.jwt_expiry_hours)
}

/// Validate a token with the configured secret.
pub fn validar_token(token: &str) -> Result<Claims, AuthError> {
    let security = &crate::config::config().security;
    if security.jwt_secret.is_empty() {
        return Err(AuthError::SecretMissing);
    }
    verificar(token, &security.jwt_secret)
}

fn firmar(uid: i32, correo: &str, secreto: &str, horas: i64) -> Result<String, AuthError> {
    let ahora = Utc::now();
    let claims = Claims {
        uid,
        correo: correo.to_string(),
        iat: ahora.timestamp(),
        exp: (ahora + Duration::hours(horas)).timestamp(),
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secreto.as_bytes()),
    )?;
    Ok(token)
}

fn verificar(token: &str, secreto: &str) -> Result<Claims, AuthError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secreto.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn firmar_y_verificar_ida_y_vuelta() {
        let token = firmar(7, "registro@parroquia.bo", "secreto-de-prueba", 7).unwrap();
        let claims = verificar(&token, "secreto-de-prueba").unwrap();
        assert_eq!(claims.uid, 7);
        assert_eq!(claims.correo, "registro@parroquia.bo");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn secreto_distinto_no_valida() {
        let token = firmar(7, "a@b.c", "secreto-a", 7).unwrap();
        assert!(verificar(&token, "secreto-b").is_err());
    }

    #[test]
    fn token_corrupto_no_valida() {
        assert!(verificar("no-es-un-jwt", "secreto").is_err());
    }
}
