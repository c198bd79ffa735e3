use axum::{
    extract::{Path, Query},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::database::manager::DatabaseManager;
use crate::database::models::MatrimonioDetalle;
use crate::error::ApiError;
use crate::search::{respuesta_paginada, Paginacion};

/// GET /api/matrimoniodetalles
pub async fn listar(Query(paginacion): Query<Paginacion>) -> Result<Json<Value>, ApiError> {
    let pagina = paginacion.validar();
    let pool = DatabaseManager::pool().await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM matrimonio_detalle")
        .fetch_one(&pool)
        .await?;
    let detalles: Vec<MatrimonioDetalle> = sqlx::query_as(&format!(
        "SELECT * FROM matrimonio_detalle ORDER BY sacramento_id_sacramento \
         LIMIT {} OFFSET {}",
        pagina.limit, pagina.offset
    ))
    .fetch_all(&pool)
    .await?;

    Ok(Json(respuesta_paginada("matrimonio_detalle", &detalles, total, &pagina)))
}

#[derive(Debug, Deserialize)]
pub struct CrearDetalleBody {
    pub sacramento_id_sacramento: i32,
    pub reg_civil: String,
    pub lugar_ceremonia: String,
    pub numero_acta: i32,
}

/// POST /api/matrimoniodetalles/new - at most one annex per marriage
pub async fn crear(
    Json(body): Json<CrearDetalleBody>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let pool = DatabaseManager::pool().await?;

    let existe: Option<(i32,)> = sqlx::query_as(
        "SELECT sacramento_id_sacramento FROM matrimonio_detalle \
         WHERE sacramento_id_sacramento = $1",
    )
    .bind(body.sacramento_id_sacramento)
    .fetch_optional(&pool)
    .await?;
    if existe.is_some() {
        return Err(ApiError::bad_request("El detalle de matrimonio ya está registrado"));
    }

    let detalle: MatrimonioDetalle = sqlx::query_as(
        "INSERT INTO matrimonio_detalle \
         (sacramento_id_sacramento, reg_civil, lugar_ceremonia, numero_acta) \
         VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(body.sacramento_id_sacramento)
    .bind(&body.reg_civil)
    .bind(&body.lugar_ceremonia)
    .bind(body.numero_acta)
    .fetch_one(&pool)
    .await?;

    Ok((StatusCode::CREATED, Json(json!({"ok": true, "matrimonioDetalle": detalle}))))
}

/// GET /api/matrimoniodetalles/:id - keyed by sacrament id
pub async fn obtener(Path(id): Path<i32>) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let detalle: Option<MatrimonioDetalle> =
        sqlx::query_as("SELECT * FROM matrimonio_detalle WHERE sacramento_id_sacramento = $1")
            .bind(id)
            .fetch_optional(&pool)
            .await?;

    match detalle {
        Some(detalle) => Ok(Json(json!({"ok": true, "matrimonioDetalle": detalle}))),
        None => Err(ApiError::not_found("Detalle de matrimonio no encontrado")),
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ActualizarDetalleBody {
    pub reg_civil: Option<String>,
    pub lugar_ceremonia: Option<String>,
    pub numero_acta: Option<i32>,
}

/// PUT /api/matrimoniodetalles/:id
pub async fn actualizar(
    Path(id): Path<i32>,
    Json(body): Json<ActualizarDetalleBody>,
) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let detalle: Option<MatrimonioDetalle> = sqlx::query_as(
        "UPDATE matrimonio_detalle SET \
           reg_civil = COALESCE($1, reg_civil), \
           lugar_ceremonia = COALESCE($2, lugar_ceremonia), \
           numero_acta = COALESCE($3, numero_acta) \
         WHERE sacramento_id_sacramento = $4 \
         RETURNING *",
    )
    .bind(&body.reg_civil)
    .bind(&body.lugar_ceremonia)
    .bind(body.numero_acta)
    .bind(id)
    .fetch_optional(&pool)
    .await?;

    match detalle {
        Some(detalle) => Ok(Json(json!({"ok": true, "matrimonioDetalle": detalle}))),
        None => Err(ApiError::not_found("Detalle de matrimonio no encontrado")),
    }
}
