use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::database::manager::DatabaseManager;
use crate::database::models::Sacramento;
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::search::{respuesta_paginada, Paginacion};
use crate::services::sacramentos::{
    actualizar_completo, buscar_por_persona, crear_completo, obtener_completo,
    SacramentoCompletoBody,
};

/// GET /api/sacramentos - paginated listing of active sacraments
pub async fn listar(Query(paginacion): Query<Paginacion>) -> Result<Json<Value>, ApiError> {
    let pagina = paginacion.validar();
    let pool = DatabaseManager::pool().await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sacramento WHERE activo = TRUE")
        .fetch_one(&pool)
        .await?;
    let sacramentos: Vec<Sacramento> = sqlx::query_as(&format!(
        "SELECT * FROM sacramento WHERE activo = TRUE \
         ORDER BY id_sacramento LIMIT {} OFFSET {}",
        pagina.limit, pagina.offset
    ))
    .fetch_all(&pool)
    .await?;

    Ok(Json(respuesta_paginada("sacramento", &sacramentos, total, &pagina)))
}

/// GET /api/sacramentos/all - listing including logically deleted rows
pub async fn listar_todos(Query(paginacion): Query<Paginacion>) -> Result<Json<Value>, ApiError> {
    let pagina = paginacion.validar();
    let pool = DatabaseManager::pool().await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sacramento")
        .fetch_one(&pool)
        .await?;
    let sacramentos: Vec<Sacramento> = sqlx::query_as(&format!(
        "SELECT * FROM sacramento ORDER BY id_sacramento LIMIT {} OFFSET {}",
        pagina.limit, pagina.offset
    ))
    .fetch_all(&pool)
    .await?;

    Ok(Json(respuesta_paginada("sacramento", &sacramentos, total, &pagina)))
}

#[derive(Debug, Deserialize)]
pub struct CrearSacramentoBody {
    pub fecha_sacramento: NaiveDate,
    pub foja: String,
    pub numero: i32,
    pub usuario_id_usuario: i32,
    pub institucion_parroquia_id_parroquia: i32,
    pub tipo_sacramento_id_tipo: i32,
}

/// POST /api/sacramentos/new - plain create, without participants
pub async fn crear(
    Json(body): Json<CrearSacramentoBody>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let pool = DatabaseManager::pool().await?;
    let sacramento: Sacramento = sqlx::query_as(
        "INSERT INTO sacramento \
         (fecha_sacramento, foja, numero, fecha_registro, fecha_actualizacion, activo, \
          usuario_id_usuario, institucion_parroquia_id_parroquia, tipo_sacramento_id_tipo) \
         VALUES ($1, $2, $3, NOW(), NOW(), TRUE, $4, $5, $6) \
         RETURNING *",
    )
    .bind(body.fecha_sacramento)
    .bind(&body.foja)
    .bind(body.numero)
    .bind(body.usuario_id_usuario)
    .bind(body.institucion_parroquia_id_parroquia)
    .bind(body.tipo_sacramento_id_tipo)
    .fetch_one(&pool)
    .await?;

    Ok((StatusCode::CREATED, Json(json!({"ok": true, "sacramento": sacramento}))))
}

/// GET /api/sacramentos/:id
pub async fn obtener(Path(id): Path<i32>) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let sacramento: Option<Sacramento> =
        sqlx::query_as("SELECT * FROM sacramento WHERE id_sacramento = $1 AND activo = TRUE")
            .bind(id)
            .fetch_optional(&pool)
            .await?;

    match sacramento {
        Some(sacramento) => Ok(Json(json!({"ok": true, "sacramento": sacramento}))),
        None => Err(ApiError::not_found("Sacramento no encontrado")),
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ActualizarSacramentoBody {
    pub fecha_sacramento: Option<NaiveDate>,
    pub foja: Option<String>,
    pub numero: Option<i32>,
    pub usuario_id_usuario: Option<i32>,
    pub institucion_parroquia_id_parroquia: Option<i32>,
    pub tipo_sacramento_id_tipo: Option<i32>,
}

impl ActualizarSacramentoBody {
    fn sin_cambios(&self) -> bool {
        self.fecha_sacramento.is_none()
            && self.foja.is_none()
            && self.numero.is_none()
            && self.usuario_id_usuario.is_none()
            && self.institucion_parroquia_id_parroquia.is_none()
            && self.tipo_sacramento_id_tipo.is_none()
    }
}

/// PUT /api/sacramentos/:id - partial update of the event fields
pub async fn actualizar(
    Path(id): Path<i32>,
    Json(body): Json<ActualizarSacramentoBody>,
) -> Result<Json<Value>, ApiError> {
    if body.sin_cambios() {
        return Err(ApiError::bad_request("No se enviaron campos a actualizar"));
    }

    let pool = DatabaseManager::pool().await?;
    let sacramento: Option<Sacramento> = sqlx::query_as(
        "UPDATE sacramento SET \
           fecha_sacramento = COALESCE($1, fecha_sacramento), \
           foja = COALESCE($2, foja), \
           numero = COALESCE($3, numero), \
           usuario_id_usuario = COALESCE($4, usuario_id_usuario), \
           institucion_parroquia_id_parroquia = COALESCE($5, institucion_parroquia_id_parroquia), \
           tipo_sacramento_id_tipo = COALESCE($6, tipo_sacramento_id_tipo), \
           fecha_actualizacion = NOW() \
         WHERE id_sacramento = $7 AND activo = TRUE \
         RETURNING *",
    )
    .bind(body.fecha_sacramento)
    .bind(&body.foja)
    .bind(body.numero)
    .bind(body.usuario_id_usuario)
    .bind(body.institucion_parroquia_id_parroquia)
    .bind(body.tipo_sacramento_id_tipo)
    .bind(id)
    .fetch_optional(&pool)
    .await?;

    match sacramento {
        Some(sacramento) => Ok(Json(json!({"ok": true, "sacramento": sacramento}))),
        None => Err(ApiError::not_found("Sacramento no encontrado")),
    }
}

/// PATCH /api/sacramentos/:id - logical deletion
pub async fn eliminar(Path(id): Path<i32>) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let resultado = sqlx::query(
        "UPDATE sacramento SET activo = FALSE WHERE id_sacramento = $1 AND activo = TRUE",
    )
    .bind(id)
    .execute(&pool)
    .await?;

    if resultado.rows_affected() == 0 {
        return Err(ApiError::not_found("Sacramento no encontrado"));
    }
    Ok(Json(json!({"ok": true, "msg": "Sacramento eliminado correctamente"})))
}

fn usuario_de_sesion(sesion: Option<Extension<AuthUser>>) -> Result<AuthUser, ApiError> {
    match sesion {
        Some(Extension(usuario)) => Ok(usuario),
        None => Err(ApiError::missing_session("No hay usuario autenticado")),
    }
}

/// POST /api/sacramentos/completo - sacrament plus its full participant
/// roster, one atomic unit
pub async fn crear_sacramento_completo(
    sesion: Option<Extension<AuthUser>>,
    Json(body): Json<SacramentoCompletoBody>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let usuario = usuario_de_sesion(sesion)?;
    let pool = DatabaseManager::pool().await?;
    let sacramento = crear_completo(&pool, usuario.user_id, &body).await?;
    Ok((StatusCode::CREATED, Json(json!({"ok": true, "sacramento": sacramento}))))
}

/// PUT /api/sacramentos/completo/:id - reconcile the sacrament and its
/// roster against the incoming relations
pub async fn actualizar_sacramento_completo(
    sesion: Option<Extension<AuthUser>>,
    Path(id): Path<i32>,
    Json(body): Json<SacramentoCompletoBody>,
) -> Result<Json<Value>, ApiError> {
    let usuario = usuario_de_sesion(sesion)?;
    let pool = DatabaseManager::pool().await?;
    let sacramento = actualizar_completo(&pool, usuario.user_id, id, &body).await?;
    Ok(Json(json!({"ok": true, "sacramento": sacramento})))
}

/// GET /api/sacramentos/completo/:id - aggregate shaped for the edit form
pub async fn obtener_sacramento_completo(Path(id): Path<i32>) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let completo = obtener_completo(&pool, id).await?;

    let mut cuerpo = serde_json::to_value(&completo)
        .map_err(|e| {
            tracing::error!("no se pudo serializar el sacramento completo: {}", e);
            ApiError::internal_server_error("Hable con el administrador")
        })?;
    cuerpo["ok"] = json!(true);
    Ok(Json(cuerpo))
}

#[derive(Debug, Deserialize)]
pub struct BusquedaPorPersona {
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// GET /api/sacramentos/busqueda-persona - sacraments located through
/// participant attributes; the recording user never matches as participant
pub async fn busqueda_por_persona(
    Query(query): Query<BusquedaPorPersona>,
) -> Result<Json<Value>, ApiError> {
    let search = query
        .search
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Debe proporcionar un término de búsqueda"))?;

    let pagina = Paginacion { page: query.page, limit: query.limit }.validar();
    let pool = DatabaseManager::pool().await?;
    let respuesta = buscar_por_persona(&pool, search, &pagina).await?;
    Ok(Json(respuesta))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sin_sesion_se_rechaza_antes_de_escribir() {
        let err = usuario_de_sesion(None).unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.message(), "No hay usuario autenticado");
    }

    #[test]
    fn con_sesion_se_obtiene_el_usuario() {
        let sesion = Some(Extension(AuthUser {
            user_id: 3,
            email: "registro@parroquia.bo".to_string(),
        }));
        let usuario = usuario_de_sesion(sesion).unwrap();
        assert_eq!(usuario.user_id, 3);
    }
}
