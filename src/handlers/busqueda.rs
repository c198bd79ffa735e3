use axum::{extract::Query, response::Json};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use sqlx::{FromRow, PgPool};

use crate::database::manager::DatabaseManager;
use crate::error::ApiError;
use crate::search::{clausula_ilike, patron_ilike};

const LIMITE_POR_ENTIDAD: i64 = 5;

#[derive(Debug, Deserialize)]
pub struct BusquedaGlobal {
    pub q: Option<String>,
}

#[derive(Debug, Serialize, FromRow)]
struct PersonaResumen {
    id_persona: i32,
    nombre: String,
    apellido_paterno: String,
    apellido_materno: String,
    carnet_identidad: String,
}

#[derive(Debug, Serialize, FromRow)]
struct SacramentoResumen {
    id_sacramento: i32,
    fecha_sacramento: NaiveDate,
    foja: String,
    numero: i32,
    tipo_sacramento: String,
    parroquia: String,
}

#[derive(Debug, Serialize, FromRow)]
struct ParroquiaResumen {
    id_parroquia: i32,
    nombre: String,
    direccion: String,
    email: String,
}

#[derive(Debug, Serialize, FromRow)]
struct TipoResumen {
    id_tipo: i32,
    nombre: String,
    descripcion: Option<String>,
}

#[derive(Debug, Serialize, FromRow)]
struct RolResumen {
    id_rol_sacra: i32,
    nombre: String,
}

#[derive(Debug, Serialize, FromRow)]
struct UsuarioResumen {
    id_usuario: i32,
    nombre: String,
    apellido_paterno: String,
    apellido_materno: String,
    email: String,
    rol: String,
}

async fn seccion<T>(pool: &PgPool, sql: &str, patron: &str) -> Result<Vec<T>, ApiError>
where
    T: for<'r> FromRow<'r, sqlx::postgres::PgRow> + Send + Unpin,
{
    Ok(sqlx::query_as(sql).bind(patron).fetch_all(pool).await?)
}

/// GET /api/busqueda?q= - cross-entity lookup, a handful of matches per
/// entity
pub async fn busqueda_global(Query(query): Query<BusquedaGlobal>) -> Result<Json<Value>, ApiError> {
    let termino = query
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ApiError::bad_request("Debe proporcionar un término de búsqueda"))?;

    let pool = DatabaseManager::pool().await?;
    let patron = patron_ilike(termino);
    let mut resultados = Map::new();

    let personas: Vec<PersonaResumen> = seccion(
        &pool,
        &format!(
            "SELECT id_persona, nombre, apellido_paterno, apellido_materno, carnet_identidad \
             FROM persona WHERE {} LIMIT {}",
            clausula_ilike(
                &["nombre", "apellido_paterno", "apellido_materno", "carnet_identidad", "lugar_nacimiento"],
                1
            ),
            LIMITE_POR_ENTIDAD
        ),
        &patron,
    )
    .await?;
    if !personas.is_empty() {
        resultados.insert("personas".into(), json!(personas));
    }

    let sacramentos: Vec<SacramentoResumen> = seccion(
        &pool,
        &format!(
            "SELECT s.id_sacramento, s.fecha_sacramento, s.foja, s.numero, \
                    t.nombre AS tipo_sacramento, pa.nombre AS parroquia \
             FROM sacramento s \
             JOIN tipo_sacramento t ON t.id_tipo = s.tipo_sacramento_id_tipo \
             JOIN institucion_parroquia pa ON pa.id_parroquia = s.institucion_parroquia_id_parroquia \
             WHERE {} LIMIT {}",
            clausula_ilike(&["s.foja", "s.numero"], 1),
            LIMITE_POR_ENTIDAD
        ),
        &patron,
    )
    .await?;
    if !sacramentos.is_empty() {
        resultados.insert("sacramentos".into(), json!(sacramentos));
    }

    let parroquias: Vec<ParroquiaResumen> = seccion(
        &pool,
        &format!(
            "SELECT id_parroquia, nombre, direccion, email FROM institucion_parroquia \
             WHERE {} LIMIT {}",
            clausula_ilike(&["nombre", "direccion", "email"], 1),
            LIMITE_POR_ENTIDAD
        ),
        &patron,
    )
    .await?;
    if !parroquias.is_empty() {
        resultados.insert("parroquias".into(), json!(parroquias));
    }

    let tipos: Vec<TipoResumen> = seccion(
        &pool,
        &format!(
            "SELECT id_tipo, nombre, descripcion FROM tipo_sacramento WHERE {} LIMIT {}",
            clausula_ilike(&["nombre", "descripcion"], 1),
            LIMITE_POR_ENTIDAD
        ),
        &patron,
    )
    .await?;
    if !tipos.is_empty() {
        resultados.insert("tipos_sacramento".into(), json!(tipos));
    }

    let roles: Vec<RolResumen> = seccion(
        &pool,
        &format!(
            "SELECT id_rol_sacra, nombre FROM rol_sacramento WHERE {} LIMIT {}",
            clausula_ilike(&["nombre"], 1),
            LIMITE_POR_ENTIDAD
        ),
        &patron,
    )
    .await?;
    if !roles.is_empty() {
        resultados.insert("roles_sacramento".into(), json!(roles));
    }

    let usuarios: Vec<UsuarioResumen> = seccion(
        &pool,
        &format!(
            "SELECT id_usuario, nombre, apellido_paterno, apellido_materno, email, rol \
             FROM usuario WHERE {} LIMIT {}",
            clausula_ilike(&["nombre", "apellido_paterno", "apellido_materno", "email"], 1),
            LIMITE_POR_ENTIDAD
        ),
        &patron,
    )
    .await?;
    if !usuarios.is_empty() {
        resultados.insert("usuarios".into(), json!(usuarios));
    }

    let total: usize = resultados
        .values()
        .filter_map(|v| v.as_array().map(Vec::len))
        .sum();

    Ok(Json(json!({
        "ok": true,
        "termino_busqueda": termino,
        "resultados": resultados,
        "total_resultados": total,
    })))
}
