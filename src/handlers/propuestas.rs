use axum::{
    extract::{Path, Query},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::database::manager::DatabaseManager;
use crate::database::models::Propuesta;
use crate::error::ApiError;
use crate::search::{respuesta_paginada, Paginacion};

/// GET /api/propuestas - non-deleted proposals, newest first
pub async fn listar(Query(paginacion): Query<Paginacion>) -> Result<Json<Value>, ApiError> {
    let pagina = paginacion.validar();
    let pool = DatabaseManager::pool().await?;

    let total: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM propuesta WHERE \"isDeleted\" = FALSE")
            .fetch_one(&pool)
            .await?;
    let propuestas: Vec<Propuesta> = sqlx::query_as(&format!(
        "SELECT * FROM propuesta WHERE \"isDeleted\" = FALSE \
         ORDER BY fecha DESC LIMIT {} OFFSET {}",
        pagina.limit, pagina.offset
    ))
    .fetch_all(&pool)
    .await?;

    Ok(Json(respuesta_paginada("propuestas", &propuestas, total, &pagina)))
}

#[derive(Debug, Deserialize)]
pub struct CrearPropuestaBody {
    pub propuesta: String,
}

/// POST /api/propuestas/new
pub async fn crear(
    Json(body): Json<CrearPropuestaBody>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    if body.propuesta.trim().is_empty() {
        return Err(ApiError::bad_request("La propuesta no puede estar vacía"));
    }

    let pool = DatabaseManager::pool().await?;
    let propuesta: Propuesta = sqlx::query_as(
        "INSERT INTO propuesta (propuesta, fecha, \"isDeleted\", publicado) \
         VALUES ($1, NOW(), FALSE, FALSE) RETURNING *",
    )
    .bind(&body.propuesta)
    .fetch_one(&pool)
    .await?;

    Ok((StatusCode::CREATED, Json(json!({"ok": true, "propuesta": propuesta}))))
}

/// PATCH /api/propuestas/:id/publicar - toggle publication
pub async fn publicar(Path(id): Path<i32>) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let propuesta: Option<Propuesta> = sqlx::query_as(
        "UPDATE propuesta SET publicado = NOT publicado \
         WHERE id_propuesta = $1 AND \"isDeleted\" = FALSE RETURNING *",
    )
    .bind(id)
    .fetch_optional(&pool)
    .await?;

    match propuesta {
        Some(propuesta) => Ok(Json(json!({"ok": true, "propuesta": propuesta}))),
        None => Err(ApiError::not_found("Propuesta no encontrada")),
    }
}

/// PATCH /api/propuestas/:id - logical deletion; unpublishes as well
pub async fn eliminar(Path(id): Path<i32>) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;

    let propuesta: Option<Propuesta> =
        sqlx::query_as("SELECT * FROM propuesta WHERE id_propuesta = $1")
            .bind(id)
            .fetch_optional(&pool)
            .await?;
    let propuesta = propuesta.ok_or_else(|| ApiError::not_found("Propuesta no encontrada"))?;

    if propuesta.is_deleted {
        return Err(ApiError::bad_request("La propuesta ya fue eliminada previamente"));
    }

    sqlx::query(
        "UPDATE propuesta SET \"isDeleted\" = TRUE, publicado = FALSE WHERE id_propuesta = $1",
    )
    .bind(id)
    .execute(&pool)
    .await?;

    Ok(Json(json!({"ok": true, "msg": "Propuesta eliminada correctamente"})))
}
