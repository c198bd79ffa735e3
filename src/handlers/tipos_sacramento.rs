use axum::{
    extract::{Path, Query},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::database::manager::DatabaseManager;
use crate::database::models::TipoSacramento;
use crate::error::ApiError;
use crate::search::{respuesta_paginada, Paginacion};

/// GET /api/tiposacramentos
pub async fn listar(Query(paginacion): Query<Paginacion>) -> Result<Json<Value>, ApiError> {
    let pagina = paginacion.validar();
    let pool = DatabaseManager::pool().await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tipo_sacramento")
        .fetch_one(&pool)
        .await?;
    let tipos: Vec<TipoSacramento> = sqlx::query_as(&format!(
        "SELECT * FROM tipo_sacramento ORDER BY id_tipo LIMIT {} OFFSET {}",
        pagina.limit, pagina.offset
    ))
    .fetch_all(&pool)
    .await?;

    Ok(Json(respuesta_paginada("tipo_sacramento", &tipos, total, &pagina)))
}

#[derive(Debug, Deserialize)]
pub struct CrearTipoBody {
    pub nombre: String,
    pub descripcion: Option<String>,
}

/// POST /api/tiposacramentos/new
pub async fn crear(Json(body): Json<CrearTipoBody>) -> Result<(StatusCode, Json<Value>), ApiError> {
    let pool = DatabaseManager::pool().await?;

    let existe: Option<(i32,)> =
        sqlx::query_as("SELECT id_tipo FROM tipo_sacramento WHERE nombre = $1")
            .bind(&body.nombre)
            .fetch_optional(&pool)
            .await?;
    if existe.is_some() {
        return Err(ApiError::bad_request("El tipo de sacramento ya está registrado"));
    }

    let tipo: TipoSacramento = sqlx::query_as(
        "INSERT INTO tipo_sacramento (nombre, descripcion) VALUES ($1, $2) RETURNING *",
    )
    .bind(&body.nombre)
    .bind(&body.descripcion)
    .fetch_one(&pool)
    .await?;

    Ok((StatusCode::CREATED, Json(json!({"ok": true, "tipo": tipo}))))
}

/// GET /api/tiposacramentos/:id
pub async fn obtener(Path(id): Path<i32>) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let tipo: Option<TipoSacramento> =
        sqlx::query_as("SELECT * FROM tipo_sacramento WHERE id_tipo = $1")
            .bind(id)
            .fetch_optional(&pool)
            .await?;

    match tipo {
        Some(tipo) => Ok(Json(json!({"ok": true, "tipo": tipo}))),
        None => Err(ApiError::not_found("Tipo de sacramento no encontrado")),
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ActualizarTipoBody {
    pub nombre: Option<String>,
    pub descripcion: Option<String>,
}

/// PUT /api/tiposacramentos/:id
pub async fn actualizar(
    Path(id): Path<i32>,
    Json(body): Json<ActualizarTipoBody>,
) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let tipo: Option<TipoSacramento> = sqlx::query_as(
        "UPDATE tipo_sacramento SET \
           nombre = COALESCE($1, nombre), \
           descripcion = COALESCE($2, descripcion) \
         WHERE id_tipo = $3 \
         RETURNING *",
    )
    .bind(&body.nombre)
    .bind(&body.descripcion)
    .bind(id)
    .fetch_optional(&pool)
    .await?;

    match tipo {
        Some(tipo) => Ok(Json(json!({"ok": true, "tipo": tipo}))),
        None => Err(ApiError::not_found("Tipo de sacramento no encontrado")),
    }
}
