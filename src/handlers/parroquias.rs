use axum::{
    extract::{Path, Query},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::database::manager::DatabaseManager;
use crate::database::models::Parroquia;
use crate::error::ApiError;
use crate::search::{respuesta_paginada, Paginacion};

/// GET /api/parroquias
pub async fn listar(Query(paginacion): Query<Paginacion>) -> Result<Json<Value>, ApiError> {
    let pagina = paginacion.validar();
    let pool = DatabaseManager::pool().await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM institucion_parroquia")
        .fetch_one(&pool)
        .await?;
    let parroquias: Vec<Parroquia> = sqlx::query_as(&format!(
        "SELECT * FROM institucion_parroquia ORDER BY id_parroquia LIMIT {} OFFSET {}",
        pagina.limit, pagina.offset
    ))
    .fetch_all(&pool)
    .await?;

    Ok(Json(respuesta_paginada("parroquias", &parroquias, total, &pagina)))
}

#[derive(Debug, Deserialize)]
pub struct CrearParroquiaBody {
    pub nombre: String,
    pub direccion: String,
    pub telefono: String,
    pub email: String,
}

/// POST /api/parroquias/new
pub async fn crear(
    Json(body): Json<CrearParroquiaBody>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let pool = DatabaseManager::pool().await?;

    let existe: Option<(i32,)> =
        sqlx::query_as("SELECT id_parroquia FROM institucion_parroquia WHERE email = $1")
            .bind(&body.email)
            .fetch_optional(&pool)
            .await?;
    if existe.is_some() {
        return Err(ApiError::bad_request("El email ya está registrado"));
    }

    let parroquia: Parroquia = sqlx::query_as(
        "INSERT INTO institucion_parroquia (nombre, direccion, telefono, email) \
         VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(&body.nombre)
    .bind(&body.direccion)
    .bind(&body.telefono)
    .bind(&body.email)
    .fetch_one(&pool)
    .await?;

    Ok((StatusCode::CREATED, Json(json!({"ok": true, "parroquia": parroquia}))))
}

/// GET /api/parroquias/:id
pub async fn obtener(Path(id): Path<i32>) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let parroquia: Option<Parroquia> =
        sqlx::query_as("SELECT * FROM institucion_parroquia WHERE id_parroquia = $1")
            .bind(id)
            .fetch_optional(&pool)
            .await?;

    match parroquia {
        Some(parroquia) => Ok(Json(json!({"ok": true, "parroquia": parroquia}))),
        None => Err(ApiError::not_found("Parroquia no encontrada")),
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ActualizarParroquiaBody {
    pub nombre: Option<String>,
    pub direccion: Option<String>,
    pub telefono: Option<String>,
    pub email: Option<String>,
}

/// PUT /api/parroquias/:id
pub async fn actualizar(
    Path(id): Path<i32>,
    Json(body): Json<ActualizarParroquiaBody>,
) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let parroquia: Option<Parroquia> = sqlx::query_as(
        "UPDATE institucion_parroquia SET \
           nombre = COALESCE($1, nombre), \
           direccion = COALESCE($2, direccion), \
           telefono = COALESCE($3, telefono), \
           email = COALESCE($4, email) \
         WHERE id_parroquia = $5 \
         RETURNING *",
    )
    .bind(&body.nombre)
    .bind(&body.direccion)
    .bind(&body.telefono)
    .bind(&body.email)
    .bind(id)
    .fetch_optional(&pool)
    .await?;

    match parroquia {
        Some(parroquia) => Ok(Json(json!({"ok": true, "parroquia": parroquia}))),
        None => Err(ApiError::not_found("Parroquia no encontrada")),
    }
}
