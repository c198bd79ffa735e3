use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::Json,
};
use chrono::NaiveDate;
use rand_core::OsRng;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::generar_token;
use crate::database::manager::DatabaseManager;
use crate::database::models::Usuario;
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::search::{respuesta_paginada, Paginacion};

fn hashear_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            tracing::error!("no se pudo derivar la contraseña: {}", e);
            ApiError::internal_server_error("Hable con el administrador")
        })
}

fn password_valida(password: &str, digest: &str) -> bool {
    match PasswordHash::new(digest) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::error!("digest de contraseña ilegible: {}", e);
            false
        }
    }
}

fn token_o_error(uid: i32, correo: &str) -> Result<String, ApiError> {
    generar_token(uid, correo).map_err(|e| {
        tracing::error!("no se pudo generar el token: {}", e);
        ApiError::internal_server_error("Error al generar el token")
    })
}

/// GET /api/usuarios - paginated listing of active accounts
pub async fn listar(Query(paginacion): Query<Paginacion>) -> Result<Json<Value>, ApiError> {
    let pagina = paginacion.validar();
    let pool = DatabaseManager::pool().await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM usuario WHERE activo = TRUE")
        .fetch_one(&pool)
        .await?;
    let usuarios: Vec<Usuario> = sqlx::query_as(&format!(
        "SELECT * FROM usuario WHERE activo = TRUE ORDER BY id_usuario LIMIT {} OFFSET {}",
        pagina.limit, pagina.offset
    ))
    .fetch_all(&pool)
    .await?;

    Ok(Json(respuesta_paginada("usuarios", &usuarios, total, &pagina)))
}

/// GET /api/usuarios/all - listing including deactivated accounts
pub async fn listar_todos(Query(paginacion): Query<Paginacion>) -> Result<Json<Value>, ApiError> {
    let pagina = paginacion.validar();
    let pool = DatabaseManager::pool().await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM usuario")
        .fetch_one(&pool)
        .await?;
    let usuarios: Vec<Usuario> = sqlx::query_as(&format!(
        "SELECT * FROM usuario ORDER BY id_usuario LIMIT {} OFFSET {}",
        pagina.limit, pagina.offset
    ))
    .fetch_all(&pool)
    .await?;

    Ok(Json(respuesta_paginada("usuarios", &usuarios, total, &pagina)))
}

#[derive(Debug, Deserialize)]
pub struct CrearUsuarioBody {
    pub nombre: String,
    pub apellido_paterno: String,
    pub apellido_materno: String,
    pub email: String,
    pub password: Option<String>,
    pub fecha_nacimiento: NaiveDate,
    pub rol: String,
}

/// POST /api/usuarios/new - registration. The password is optional: when
/// absent a random temporary one is generated so the column stays NOT NULL.
pub async fn crear(
    Json(body): Json<CrearUsuarioBody>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let pool = DatabaseManager::pool().await?;

    let existe: Option<(i32,)> = sqlx::query_as("SELECT id_usuario FROM usuario WHERE email = $1")
        .bind(&body.email)
        .fetch_optional(&pool)
        .await?;
    if existe.is_some() {
        return Err(ApiError::bad_request("El email ya está registrado"));
    }

    let password = match body.password.as_deref().filter(|p| !p.trim().is_empty()) {
        Some(p) => p.to_string(),
        None => format!("{}Aa1!", Uuid::new_v4().simple()),
    };
    let digest = hashear_password(&password)?;

    let usuario: Usuario = sqlx::query_as(
        "INSERT INTO usuario \
         (nombre, apellido_paterno, apellido_materno, email, password, fecha_nacimiento, activo, rol) \
         VALUES ($1, $2, $3, $4, $5, $6, TRUE, $7) \
         RETURNING *",
    )
    .bind(&body.nombre)
    .bind(&body.apellido_paterno)
    .bind(&body.apellido_materno)
    .bind(&body.email)
    .bind(&digest)
    .bind(body.fecha_nacimiento)
    .bind(&body.rol)
    .fetch_one(&pool)
    .await?;

    let token = token_o_error(usuario.id_usuario, &usuario.email)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({"ok": true, "usuario": usuario, "token": token})),
    ))
}

#[derive(Debug, Deserialize)]
pub struct LoginBody {
    pub email: String,
    pub password: String,
}

/// POST /api/usuarios/login
pub async fn login(Json(body): Json<LoginBody>) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;

    let usuario: Option<Usuario> =
        sqlx::query_as("SELECT * FROM usuario WHERE email = $1 AND activo = TRUE")
            .bind(&body.email)
            .fetch_optional(&pool)
            .await?;
    let usuario = usuario.ok_or_else(|| ApiError::bad_request("Usuario no existe"))?;

    if !password_valida(&body.password, &usuario.password) {
        return Err(ApiError::bad_request("Contraseña incorrecta"));
    }

    let token = token_o_error(usuario.id_usuario, &usuario.email)?;

    Ok(Json(json!({
        "ok": true,
        "uid": usuario.id_usuario,
        "email": usuario.email,
        "nombre": usuario.nombre,
        "rol": usuario.rol,
        "token": token,
    })))
}

/// GET /api/usuarios/renew - fresh token for the current session
pub async fn renovar(Extension(usuario): Extension<AuthUser>) -> Result<Json<Value>, ApiError> {
    let token = token_o_error(usuario.user_id, &usuario.email)?;
    Ok(Json(json!({
        "ok": true,
        "uid": usuario.user_id,
        "email": usuario.email,
        "token": token,
    })))
}

/// GET /api/usuarios/:id
pub async fn obtener(Path(id): Path<i32>) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let usuario: Option<Usuario> =
        sqlx::query_as("SELECT * FROM usuario WHERE id_usuario = $1 AND activo = TRUE")
            .bind(id)
            .fetch_optional(&pool)
            .await?;

    match usuario {
        Some(usuario) => Ok(Json(json!({"ok": true, "usuario": usuario}))),
        None => Err(ApiError::not_found("Usuario no encontrado")),
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ActualizarUsuarioBody {
    pub nombre: Option<String>,
    pub apellido_paterno: Option<String>,
    pub apellido_materno: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub fecha_nacimiento: Option<NaiveDate>,
    pub rol: Option<String>,
}

/// PUT /api/usuarios/:id - partial update; the password only changes when a
/// new one arrives
pub async fn actualizar(
    Path(id): Path<i32>,
    Json(body): Json<ActualizarUsuarioBody>,
) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;

    let actual: Option<Usuario> =
        sqlx::query_as("SELECT * FROM usuario WHERE id_usuario = $1 AND activo = TRUE")
            .bind(id)
            .fetch_optional(&pool)
            .await?;
    let actual = actual.ok_or_else(|| ApiError::not_found("Usuario no encontrado"))?;

    if let Some(email) = body.email.as_deref().filter(|e| *e != actual.email.as_str()) {
        let en_uso: Option<(i32,)> =
            sqlx::query_as("SELECT id_usuario FROM usuario WHERE email = $1 AND id_usuario <> $2")
                .bind(email)
                .bind(id)
                .fetch_optional(&pool)
                .await?;
        if en_uso.is_some() {
            return Err(ApiError::bad_request("El email ya está en uso"));
        }
    }

    let digest = match body.password.as_deref().filter(|p| !p.trim().is_empty()) {
        Some(p) => Some(hashear_password(p)?),
        None => None,
    };

    let usuario: Usuario = sqlx::query_as(
        "UPDATE usuario SET \
           nombre = COALESCE($1, nombre), \
           apellido_paterno = COALESCE($2, apellido_paterno), \
           apellido_materno = COALESCE($3, apellido_materno), \
           email = COALESCE($4, email), \
           password = COALESCE($5, password), \
           fecha_nacimiento = COALESCE($6, fecha_nacimiento), \
           rol = COALESCE($7, rol) \
         WHERE id_usuario = $8 \
         RETURNING *",
    )
    .bind(&body.nombre)
    .bind(&body.apellido_paterno)
    .bind(&body.apellido_materno)
    .bind(&body.email)
    .bind(&digest)
    .bind(body.fecha_nacimiento)
    .bind(&body.rol)
    .bind(id)
    .fetch_one(&pool)
    .await?;

    Ok(Json(json!({"ok": true, "usuario": usuario})))
}

/// PATCH /api/usuarios/:id - logical deletion
pub async fn eliminar(Path(id): Path<i32>) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let resultado = sqlx::query(
        "UPDATE usuario SET activo = FALSE WHERE id_usuario = $1 AND activo = TRUE",
    )
    .bind(id)
    .execute(&pool)
    .await?;

    if resultado.rows_affected() == 0 {
        return Err(ApiError::not_found("Usuario no encontrado"));
    }
    Ok(Json(json!({"ok": true, "msg": "Usuario eliminado correctamente"})))
}
