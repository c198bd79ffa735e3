use axum::{
    extract::{Path, Query},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::database::manager::DatabaseManager;
use crate::database::models::RolSacramento;
use crate::error::ApiError;
use crate::search::{respuesta_paginada, Paginacion};

/// GET /api/rolsacramentos
pub async fn listar(Query(paginacion): Query<Paginacion>) -> Result<Json<Value>, ApiError> {
    let pagina = paginacion.validar();
    let pool = DatabaseManager::pool().await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM rol_sacramento")
        .fetch_one(&pool)
        .await?;
    let roles: Vec<RolSacramento> = sqlx::query_as(&format!(
        "SELECT * FROM rol_sacramento ORDER BY id_rol_sacra LIMIT {} OFFSET {}",
        pagina.limit, pagina.offset
    ))
    .fetch_all(&pool)
    .await?;

    Ok(Json(respuesta_paginada("roles_sacramento", &roles, total, &pagina)))
}

#[derive(Debug, Deserialize)]
pub struct CrearRolBody {
    pub nombre: String,
}

/// POST /api/rolsacramentos/new
pub async fn crear(Json(body): Json<CrearRolBody>) -> Result<(StatusCode, Json<Value>), ApiError> {
    let pool = DatabaseManager::pool().await?;

    let existe: Option<(i32,)> =
        sqlx::query_as("SELECT id_rol_sacra FROM rol_sacramento WHERE nombre = $1")
            .bind(&body.nombre)
            .fetch_optional(&pool)
            .await?;
    if existe.is_some() {
        return Err(ApiError::bad_request("El rol del sacramento ya está registrado"));
    }

    let rol: RolSacramento =
        sqlx::query_as("INSERT INTO rol_sacramento (nombre) VALUES ($1) RETURNING *")
            .bind(&body.nombre)
            .fetch_one(&pool)
            .await?;

    Ok((StatusCode::CREATED, Json(json!({"ok": true, "rol_sacramento": rol}))))
}

/// GET /api/rolsacramentos/:id
pub async fn obtener(Path(id): Path<i32>) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let rol: Option<RolSacramento> =
        sqlx::query_as("SELECT * FROM rol_sacramento WHERE id_rol_sacra = $1")
            .bind(id)
            .fetch_optional(&pool)
            .await?;

    match rol {
        Some(rol) => Ok(Json(json!({"ok": true, "rol_sacramento": rol}))),
        None => Err(ApiError::not_found("Rol del sacramento no encontrado")),
    }
}

#[derive(Debug, Deserialize)]
pub struct ActualizarRolBody {
    pub nombre: Option<String>,
}

/// PUT /api/rolsacramentos/:id
pub async fn actualizar(
    Path(id): Path<i32>,
    Json(body): Json<ActualizarRolBody>,
) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let rol: Option<RolSacramento> = sqlx::query_as(
        "UPDATE rol_sacramento SET nombre = COALESCE($1, nombre) \
         WHERE id_rol_sacra = $2 RETURNING *",
    )
    .bind(&body.nombre)
    .bind(id)
    .fetch_optional(&pool)
    .await?;

    match rol {
        Some(rol) => Ok(Json(json!({"ok": true, "rol_sacramento": rol}))),
        None => Err(ApiError::not_found("Rol del sacramento no encontrado")),
    }
}
