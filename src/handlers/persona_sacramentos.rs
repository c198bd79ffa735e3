use axum::{
    extract::{Path, Query},
    http::StatusCode,
    response::Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::FromRow;

use crate::database::manager::DatabaseManager;
use crate::database::models::PersonaSacramento;
use crate::error::ApiError;
use crate::search::{respuesta_paginada, Paginacion};

#[derive(Debug, FromRow)]
struct FilaParticipacion {
    persona_id_persona: i32,
    rol_sacramento_id_rol_sacra: i32,
    sacramento_id_sacramento: i32,
    persona_nombre: String,
    apellido_paterno: String,
    apellido_materno: String,
    fecha_sacramento: NaiveDate,
    numero: i32,
    foja: String,
    rol_nombre: String,
}

impl FilaParticipacion {
    fn como_json(&self) -> Value {
        json!({
            "persona": {
                "id_persona": self.persona_id_persona,
                "nombre": self.persona_nombre,
                "apellido_paterno": self.apellido_paterno,
                "apellido_materno": self.apellido_materno,
            },
            "sacramento": {
                "id_sacramento": self.sacramento_id_sacramento,
                "fecha_sacramento": self.fecha_sacramento,
                "numero": self.numero,
                "foja": self.foja,
            },
            "rolSacramento": {
                "id_rol_sacra": self.rol_sacramento_id_rol_sacra,
                "nombre": self.rol_nombre,
            },
        })
    }
}

const SELECT_PARTICIPACION: &str =
    "SELECT ps.persona_id_persona, ps.rol_sacramento_id_rol_sacra, ps.sacramento_id_sacramento, \
            pe.nombre AS persona_nombre, pe.apellido_paterno, pe.apellido_materno, \
            s.fecha_sacramento, s.numero, s.foja, \
            rs.nombre AS rol_nombre \
     FROM persona_sacramento ps \
     JOIN persona pe ON pe.id_persona = ps.persona_id_persona \
     JOIN sacramento s ON s.id_sacramento = ps.sacramento_id_sacramento \
     JOIN rol_sacramento rs ON rs.id_rol_sacra = ps.rol_sacramento_id_rol_sacra";

/// GET /api/personasacramentos - paginated association listing with
/// person/sacrament/role summaries
pub async fn listar(Query(paginacion): Query<Paginacion>) -> Result<Json<Value>, ApiError> {
    let pagina = paginacion.validar();
    let pool = DatabaseManager::pool().await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM persona_sacramento")
        .fetch_one(&pool)
        .await?;
    let filas: Vec<FilaParticipacion> = sqlx::query_as(&format!(
        "{} ORDER BY ps.sacramento_id_sacramento, ps.rol_sacramento_id_rol_sacra \
         LIMIT {} OFFSET {}",
        SELECT_PARTICIPACION, pagina.limit, pagina.offset
    ))
    .fetch_all(&pool)
    .await?;

    let resumen: Vec<Value> = filas.iter().map(FilaParticipacion::como_json).collect();
    Ok(Json(respuesta_paginada("persona_sacramentos", &resumen, total, &pagina)))
}

#[derive(Debug, Deserialize)]
pub struct CrearParticipacionBody {
    pub persona_id_persona: i32,
    pub rol_sacramento_id_rol_sacra: i32,
    pub sacramento_id_sacramento: i32,
}

/// POST /api/personasacramentos/new - single association row; the complete
/// sacrament routes are the usual way to write these
pub async fn crear(
    Json(body): Json<CrearParticipacionBody>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let pool = DatabaseManager::pool().await?;

    let existe: Option<(i32,)> = sqlx::query_as(
        "SELECT 1 FROM persona_sacramento \
         WHERE persona_id_persona = $1 AND rol_sacramento_id_rol_sacra = $2 \
           AND sacramento_id_sacramento = $3",
    )
    .bind(body.persona_id_persona)
    .bind(body.rol_sacramento_id_rol_sacra)
    .bind(body.sacramento_id_sacramento)
    .fetch_optional(&pool)
    .await?;
    if existe.is_some() {
        return Err(ApiError::bad_request("Esta relación persona-sacramento ya existe"));
    }

    let fila: PersonaSacramento = sqlx::query_as(
        "INSERT INTO persona_sacramento \
         (persona_id_persona, rol_sacramento_id_rol_sacra, sacramento_id_sacramento) \
         VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(body.persona_id_persona)
    .bind(body.rol_sacramento_id_rol_sacra)
    .bind(body.sacramento_id_sacramento)
    .fetch_one(&pool)
    .await?;

    Ok((StatusCode::CREATED, Json(json!({"ok": true, "personaSacramento": fila}))))
}

/// GET /api/personasacramentos/sacramento/:id - participants of one event
pub async fn por_sacramento(Path(id): Path<i32>) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let filas: Vec<FilaParticipacion> = sqlx::query_as(&format!(
        "{} WHERE ps.sacramento_id_sacramento = $1 ORDER BY ps.rol_sacramento_id_rol_sacra",
        SELECT_PARTICIPACION
    ))
    .bind(id)
    .fetch_all(&pool)
    .await?;

    let resumen: Vec<Value> = filas.iter().map(FilaParticipacion::como_json).collect();
    Ok(Json(json!({"ok": true, "personaSacramentos": resumen})))
}

/// GET /api/personasacramentos/persona/:id - sacramental history of one
/// person
pub async fn por_persona(Path(id): Path<i32>) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let filas: Vec<FilaParticipacion> = sqlx::query_as(&format!(
        "{} WHERE ps.persona_id_persona = $1 ORDER BY s.fecha_sacramento",
        SELECT_PARTICIPACION
    ))
    .bind(id)
    .fetch_all(&pool)
    .await?;

    let resumen: Vec<Value> = filas.iter().map(FilaParticipacion::como_json).collect();
    Ok(Json(json!({"ok": true, "personaSacramentos": resumen})))
}
