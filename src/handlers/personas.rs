use axum::{
    extract::{Path, Query},
    http::StatusCode,
    response::Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::database::manager::DatabaseManager;
use crate::database::models::Persona;
use crate::error::ApiError;
use crate::rules::TipoRegla;
use crate::search::{clausula_ilike, patron_ilike, respuesta_paginada, Paginacion};
use crate::services::personas::buscar_candidatas;

const CAMPOS_BUSQUEDA: &[&str] = &[
    "nombre",
    "apellido_paterno",
    "apellido_materno",
    "carnet_identidad",
    "fecha_nacimiento",
    "lugar_nacimiento",
    "nombre_padre",
    "nombre_madre",
    "estado",
];

#[derive(Debug, Default, Deserialize)]
pub struct FiltrosPersona {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    pub nombre: Option<String>,
    pub apellido_paterno: Option<String>,
    pub apellido_materno: Option<String>,
    pub carnet_identidad: Option<String>,
    pub fecha_nacimiento: Option<String>,
    pub lugar_nacimiento: Option<String>,
    pub nombre_padre: Option<String>,
    pub nombre_madre: Option<String>,
    pub estado: Option<String>,
    pub activo: Option<bool>,
}

/// GET /api/personas - paginated listing of active persons, with free-text
/// search plus per-field filters
pub async fn listar(Query(filtros): Query<FiltrosPersona>) -> Result<Json<Value>, ApiError> {
    let pagina = Paginacion { page: filtros.page, limit: filtros.limit }.validar();
    let pool = DatabaseManager::pool().await?;

    let mut condiciones = vec![format!("activo = {}", filtros.activo.unwrap_or(true))];
    let mut argumentos: Vec<String> = Vec::new();

    if let Some(search) = filtros.search.as_deref().filter(|s| !s.trim().is_empty()) {
        argumentos.push(patron_ilike(search));
        condiciones.push(clausula_ilike(CAMPOS_BUSQUEDA, argumentos.len()));
    }

    let por_campo = [
        ("nombre", &filtros.nombre),
        ("apellido_paterno", &filtros.apellido_paterno),
        ("apellido_materno", &filtros.apellido_materno),
        ("carnet_identidad", &filtros.carnet_identidad),
        ("fecha_nacimiento", &filtros.fecha_nacimiento),
        ("lugar_nacimiento", &filtros.lugar_nacimiento),
        ("nombre_padre", &filtros.nombre_padre),
        ("nombre_madre", &filtros.nombre_madre),
        ("estado", &filtros.estado),
    ];
    for (campo, valor) in por_campo {
        if let Some(valor) = valor.as_deref().filter(|v| !v.trim().is_empty()) {
            argumentos.push(patron_ilike(valor));
            condiciones.push(format!("CAST({} AS TEXT) ILIKE ${}", campo, argumentos.len()));
        }
    }

    let donde = condiciones.join(" AND ");

    let sql_total = format!("SELECT COUNT(*) FROM persona WHERE {}", donde);
    let mut consulta_total = sqlx::query_scalar::<_, i64>(&sql_total);
    for arg in &argumentos {
        consulta_total = consulta_total.bind(arg);
    }
    let total = consulta_total.fetch_one(&pool).await?;

    let sql_filas = format!(
        "SELECT * FROM persona WHERE {} \
         ORDER BY apellido_paterno ASC, apellido_materno ASC, nombre ASC \
         LIMIT {} OFFSET {}",
        donde, pagina.limit, pagina.offset
    );
    let mut consulta_filas = sqlx::query_as::<_, Persona>(&sql_filas);
    for arg in &argumentos {
        consulta_filas = consulta_filas.bind(arg);
    }
    let personas = consulta_filas.fetch_all(&pool).await?;

    Ok(Json(respuesta_paginada("personas", &personas, total, &pagina)))
}

/// GET /api/personas/all - listing including logically deleted rows
pub async fn listar_todas(Query(paginacion): Query<Paginacion>) -> Result<Json<Value>, ApiError> {
    let pagina = paginacion.validar();
    let pool = DatabaseManager::pool().await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM persona")
        .fetch_one(&pool)
        .await?;
    let personas: Vec<Persona> = sqlx::query_as(&format!(
        "SELECT * FROM persona ORDER BY id_persona LIMIT {} OFFSET {}",
        pagina.limit, pagina.offset
    ))
    .fetch_all(&pool)
    .await?;

    Ok(Json(respuesta_paginada("personas", &personas, total, &pagina)))
}

#[derive(Debug, Deserialize)]
pub struct CrearPersonaBody {
    pub nombre: String,
    pub apellido_paterno: String,
    pub apellido_materno: String,
    pub carnet_identidad: String,
    pub fecha_nacimiento: NaiveDate,
    pub lugar_nacimiento: String,
    pub nombre_padre: String,
    pub nombre_madre: String,
    pub estado: String,
}

/// POST /api/personas/new
pub async fn crear(
    Json(body): Json<CrearPersonaBody>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let pool = DatabaseManager::pool().await?;

    let existe: Option<(i32,)> =
        sqlx::query_as("SELECT id_persona FROM persona WHERE carnet_identidad = $1")
            .bind(&body.carnet_identidad)
            .fetch_optional(&pool)
            .await?;
    if existe.is_some() {
        return Err(ApiError::bad_request("El carnet de identidad ya está registrado"));
    }

    let persona: Persona = sqlx::query_as(
        "INSERT INTO persona \
         (nombre, apellido_paterno, apellido_materno, carnet_identidad, fecha_nacimiento, \
          lugar_nacimiento, nombre_padre, nombre_madre, estado, activo) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, TRUE) \
         RETURNING *",
    )
    .bind(&body.nombre)
    .bind(&body.apellido_paterno)
    .bind(&body.apellido_materno)
    .bind(&body.carnet_identidad)
    .bind(body.fecha_nacimiento)
    .bind(&body.lugar_nacimiento)
    .bind(&body.nombre_padre)
    .bind(&body.nombre_madre)
    .bind(&body.estado)
    .fetch_one(&pool)
    .await?;

    Ok((StatusCode::CREATED, Json(json!({"ok": true, "persona": persona}))))
}

/// GET /api/personas/:id
pub async fn obtener(Path(id): Path<i32>) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let persona: Option<Persona> =
        sqlx::query_as("SELECT * FROM persona WHERE id_persona = $1 AND activo = TRUE")
            .bind(id)
            .fetch_optional(&pool)
            .await?;

    match persona {
        Some(persona) => Ok(Json(json!({"ok": true, "persona": persona}))),
        None => Err(ApiError::not_found("Persona no encontrada")),
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ActualizarPersonaBody {
    pub nombre: Option<String>,
    pub apellido_paterno: Option<String>,
    pub apellido_materno: Option<String>,
    pub carnet_identidad: Option<String>,
    pub fecha_nacimiento: Option<NaiveDate>,
    pub lugar_nacimiento: Option<String>,
    pub nombre_padre: Option<String>,
    pub nombre_madre: Option<String>,
    pub estado: Option<String>,
    pub activo: Option<bool>,
    pub sacerdote: Option<bool>,
}

impl ActualizarPersonaBody {
    fn sin_cambios(&self) -> bool {
        self.nombre.is_none()
            && self.apellido_paterno.is_none()
            && self.apellido_materno.is_none()
            && self.carnet_identidad.is_none()
            && self.fecha_nacimiento.is_none()
            && self.lugar_nacimiento.is_none()
            && self.nombre_padre.is_none()
            && self.nombre_madre.is_none()
            && self.estado.is_none()
            && self.activo.is_none()
            && self.sacerdote.is_none()
    }
}

/// PUT /api/personas/:id - partial update
pub async fn actualizar(
    Path(id): Path<i32>,
    Json(body): Json<ActualizarPersonaBody>,
) -> Result<Json<Value>, ApiError> {
    if body.sin_cambios() {
        return Err(ApiError::bad_request("No se enviaron campos a actualizar"));
    }

    let pool = DatabaseManager::pool().await?;

    let existe: Option<(i32,)> = sqlx::query_as("SELECT id_persona FROM persona WHERE id_persona = $1")
        .bind(id)
        .fetch_optional(&pool)
        .await?;
    if existe.is_none() {
        return Err(ApiError::not_found("Persona no encontrada"));
    }

    if let Some(carnet) = &body.carnet_identidad {
        let en_uso: Option<(i32,)> = sqlx::query_as(
            "SELECT id_persona FROM persona WHERE carnet_identidad = $1 AND id_persona <> $2",
        )
        .bind(carnet)
        .bind(id)
        .fetch_optional(&pool)
        .await?;
        if en_uso.is_some() {
            return Err(ApiError::bad_request("El carnet de identidad ya está en uso"));
        }
    }

    let persona: Persona = sqlx::query_as(
        "UPDATE persona SET \
           nombre = COALESCE($1, nombre), \
           apellido_paterno = COALESCE($2, apellido_paterno), \
           apellido_materno = COALESCE($3, apellido_materno), \
           carnet_identidad = COALESCE($4, carnet_identidad), \
           fecha_nacimiento = COALESCE($5, fecha_nacimiento), \
           lugar_nacimiento = COALESCE($6, lugar_nacimiento), \
           nombre_padre = COALESCE($7, nombre_padre), \
           nombre_madre = COALESCE($8, nombre_madre), \
           estado = COALESCE($9, estado), \
           activo = COALESCE($10, activo), \
           sacerdote = COALESCE($11, sacerdote) \
         WHERE id_persona = $12 \
         RETURNING *",
    )
    .bind(&body.nombre)
    .bind(&body.apellido_paterno)
    .bind(&body.apellido_materno)
    .bind(&body.carnet_identidad)
    .bind(body.fecha_nacimiento)
    .bind(&body.lugar_nacimiento)
    .bind(&body.nombre_padre)
    .bind(&body.nombre_madre)
    .bind(&body.estado)
    .bind(body.activo)
    .bind(body.sacerdote)
    .bind(id)
    .fetch_one(&pool)
    .await?;

    Ok(Json(json!({"ok": true, "persona": persona})))
}

/// PATCH /api/personas/:id - logical deletion
pub async fn eliminar(Path(id): Path<i32>) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let resultado = sqlx::query(
        "UPDATE persona SET activo = FALSE WHERE id_persona = $1 AND activo = TRUE",
    )
    .bind(id)
    .execute(&pool)
    .await?;

    if resultado.rows_affected() == 0 {
        return Err(ApiError::not_found("Persona no encontrada"));
    }
    Ok(Json(json!({"ok": true, "msg": "Persona eliminada correctamente"})))
}

#[derive(Debug, Deserialize)]
pub struct BusquedaCandidatas {
    pub search: Option<String>,
    pub rol: Option<String>,
    pub tipo: Option<String>,
}

/// GET /api/personas/buscar-sacramento?search=&rol=&tipo= - eligible
/// candidates for a sacrament or a ceremonial role
pub async fn buscar_para_sacramento(
    Query(query): Query<BusquedaCandidatas>,
) -> Result<Json<Value>, ApiError> {
    let search = query
        .search
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Faltan parámetros"))?;
    let clave = query
        .rol
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Faltan parámetros"))?;

    let tipo = match query.tipo.as_deref().map(str::to_lowercase).as_deref() {
        None | Some("sacramento") => TipoRegla::Sacramento,
        Some("rol") => TipoRegla::Rol,
        Some(_) => return Err(ApiError::bad_request("Tipo inválido (sacramento | rol)")),
    };

    let pool = DatabaseManager::pool().await?;
    let personas = buscar_candidatas(&pool, search, clave, tipo).await?;

    Ok(Json(json!({"ok": true, "personas": personas})))
}
