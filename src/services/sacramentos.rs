//! Transactional "complete sacrament" workflows: a sacrament row and its
//! full participant roster written or reconciled as one atomic unit, plus
//! the read paths that reconstruct the aggregate.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{FromRow, PgPool, Postgres, Transaction};

use crate::database::models::Sacramento;
use crate::error::ApiError;
use crate::search::{clausula_ilike, patron_ilike, respuesta_paginada, Pagina};

/// Body of the complete create/update routes. Field names are the wire
/// names the clients already send.
#[derive(Debug, Deserialize)]
pub struct SacramentoCompletoBody {
    pub fecha_sacramento: chrono::NaiveDate,
    pub foja: String,
    pub numero: i32,
    pub tipo_sacramento_id_tipo: i32,
    #[serde(rename = "parroquiaId")]
    pub parroquia_id: i32,
    /// Arrives as a JSON array or as a JSON-encoded string; normalized by
    /// [`normalizar_relaciones`] before any validation runs.
    pub relaciones: Option<Value>,
}

/// One participant link: a person in a ceremonial role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relacion {
    pub persona_id: i32,
    pub rol_sacramento_id: i32,
}

/// Normalizes the two accepted payload shapes into one typed list. Anything
/// else (absent, wrong type, or an unparseable string) is a client error.
pub fn normalizar_relaciones(valor: Option<&Value>) -> Result<Vec<Relacion>, ApiError> {
    const MSG: &str = "El formato de las relaciones no es válido";
    match valor {
        Some(arreglo @ Value::Array(_)) => {
            serde_json::from_value(arreglo.clone()).map_err(|_| ApiError::bad_request(MSG))
        }
        Some(Value::String(texto)) => {
            serde_json::from_str(texto).map_err(|_| ApiError::bad_request(MSG))
        }
        _ => Err(ApiError::bad_request(MSG)),
    }
}

/// Reconciliation plan for update-complete, keyed by role id. One
/// participant per role per sacrament: a role currently held by a different
/// person is re-pointed in place, a role with no current row gets an
/// insert, and current roles missing from the incoming set are removed.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct PlanReconciliacion {
    pub actualizar: Vec<Relacion>,
    pub insertar: Vec<Relacion>,
    pub eliminar: Vec<i32>,
}

pub fn planificar_reconciliacion(
    actuales: &[(i32, i32)], // (rol_id, persona_id)
    entrantes: &[Relacion],
) -> PlanReconciliacion {
    use std::collections::BTreeMap;

    let mut por_rol: BTreeMap<i32, i32> = actuales.iter().copied().collect();
    let mut plan = PlanReconciliacion::default();

    for rel in entrantes {
        match por_rol.get(&rel.rol_sacramento_id) {
            Some(persona_actual) if *persona_actual == rel.persona_id => {}
            Some(_) => {
                plan.actualizar.push(*rel);
                por_rol.insert(rel.rol_sacramento_id, rel.persona_id);
            }
            None => {
                plan.insertar.push(*rel);
                por_rol.insert(rel.rol_sacramento_id, rel.persona_id);
            }
        }
    }

    let roles_entrantes: std::collections::BTreeSet<i32> =
        entrantes.iter().map(|r| r.rol_sacramento_id).collect();
    plan.eliminar = actuales
        .iter()
        .map(|(rol, _)| *rol)
        .filter(|rol| !roles_entrantes.contains(rol))
        .collect();

    plan
}

/// Create-complete: sacrament row plus one participation row per relation,
/// all inside one transaction. Nothing persists unless every insert lands.
pub async fn crear_completo(
    pool: &PgPool,
    usuario_id: i32,
    body: &SacramentoCompletoBody,
) -> Result<Sacramento, ApiError> {
    let relaciones = normalizar_relaciones(body.relaciones.as_ref())?;

    let mut tx = pool.begin().await?;
    match insertar_agregado(&mut tx, usuario_id, body, &relaciones).await {
        Ok(sacramento) => {
            tx.commit().await?;
            Ok(sacramento)
        }
        Err(err) => {
            if let Err(rb) = tx.rollback().await {
                tracing::error!("rollback tras fallo de registro completo: {}", rb);
            }
            Err(err)
        }
    }
}

async fn insertar_agregado(
    tx: &mut Transaction<'_, Postgres>,
    usuario_id: i32,
    body: &SacramentoCompletoBody,
    relaciones: &[Relacion],
) -> Result<Sacramento, ApiError> {
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
    .bind(usuario_id)
    .bind(body.parroquia_id)
    .bind(body.tipo_sacramento_id_tipo)
    .fetch_one(&mut **tx)
    .await?;

    for rel in relaciones {
        sqlx::query(
            "INSERT INTO persona_sacramento \
             (persona_id_persona, rol_sacramento_id_rol_sacra, sacramento_id_sacramento) \
             VALUES ($1, $2, $3)",
        )
        .bind(rel.persona_id)
        .bind(rel.rol_sacramento_id)
        .bind(sacramento.id_sacramento)
        .execute(&mut **tx)
        .await?;
    }

    Ok(sacramento)
}

/// Update-complete: sacrament fields plus the diff-by-role reconciliation
/// of its roster, one transaction. Roles omitted from the incoming set are
/// removed from the sacrament.
pub async fn actualizar_completo(
    pool: &PgPool,
    usuario_id: i32,
    id_sacramento: i32,
    body: &SacramentoCompletoBody,
) -> Result<Sacramento, ApiError> {
    let relaciones = normalizar_relaciones(body.relaciones.as_ref())?;

    let existe: Option<(i32,)> =
        sqlx::query_as("SELECT id_sacramento FROM sacramento WHERE id_sacramento = $1 AND activo = TRUE")
            .bind(id_sacramento)
            .fetch_optional(pool)
            .await?;
    if existe.is_none() {
        return Err(ApiError::not_found("Sacramento no encontrado"));
    }

    let mut tx = pool.begin().await?;
    match reconciliar_agregado(&mut tx, usuario_id, id_sacramento, body, &relaciones).await {
        Ok(sacramento) => {
            tx.commit().await?;
            Ok(sacramento)
        }
        Err(err) => {
            if let Err(rb) = tx.rollback().await {
                tracing::error!("rollback tras fallo de actualización completa: {}", rb);
            }
            Err(err)
        }
    }
}

async fn reconciliar_agregado(
    tx: &mut Transaction<'_, Postgres>,
    usuario_id: i32,
    id_sacramento: i32,
    body: &SacramentoCompletoBody,
    relaciones: &[Relacion],
) -> Result<Sacramento, ApiError> {
    let sacramento: Sacramento = sqlx::query_as(
        "UPDATE sacramento \
         SET fecha_sacramento = $1, foja = $2, numero = $3, \
             tipo_sacramento_id_tipo = $4, institucion_parroquia_id_parroquia = $5, \
             usuario_id_usuario = $6, fecha_actualizacion = NOW() \
         WHERE id_sacramento = $7 \
         RETURNING *",
    )
    .bind(body.fecha_sacramento)
    .bind(&body.foja)
    .bind(body.numero)
    .bind(body.tipo_sacramento_id_tipo)
    .bind(body.parroquia_id)
    .bind(usuario_id)
    .bind(id_sacramento)
    .fetch_one(&mut **tx)
    .await?;

    let actuales: Vec<(i32, i32)> = sqlx::query_as(
        "SELECT rol_sacramento_id_rol_sacra, persona_id_persona \
         FROM persona_sacramento \
         WHERE sacramento_id_sacramento = $1 \
         ORDER BY rol_sacramento_id_rol_sacra",
    )
    .bind(id_sacramento)
    .fetch_all(&mut **tx)
    .await?;

    let plan = planificar_reconciliacion(&actuales, relaciones);

    for rel in &plan.actualizar {
        sqlx::query(
            "UPDATE persona_sacramento SET persona_id_persona = $1 \
             WHERE sacramento_id_sacramento = $2 AND rol_sacramento_id_rol_sacra = $3",
        )
        .bind(rel.persona_id)
        .bind(id_sacramento)
        .bind(rel.rol_sacramento_id)
        .execute(&mut **tx)
        .await?;
    }

    for rel in &plan.insertar {
        sqlx::query(
            "INSERT INTO persona_sacramento \
             (persona_id_persona, rol_sacramento_id_rol_sacra, sacramento_id_sacramento) \
             VALUES ($1, $2, $3)",
        )
        .bind(rel.persona_id)
        .bind(rel.rol_sacramento_id)
        .bind(id_sacramento)
        .execute(&mut **tx)
        .await?;
    }

    for rol in &plan.eliminar {
        sqlx::query(
            "DELETE FROM persona_sacramento \
             WHERE sacramento_id_sacramento = $1 AND rol_sacramento_id_rol_sacra = $2",
        )
        .bind(id_sacramento)
        .bind(rol)
        .execute(&mut **tx)
        .await?;
    }

    Ok(sacramento)
}

/// Flat participant record for the edit form.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ParticipanteDetalle {
    pub persona_id: i32,
    pub nombre_completo: String,
    pub carnet_identidad: String,
    pub rol_id: i32,
    pub rol_nombre: String,
}

#[derive(Debug, Serialize)]
pub struct SacramentoCompleto {
    pub sacramento: Sacramento,
    pub parroquia: String,
    pub tipo_sacramento: String,
    pub registrador: String,
    pub participantes: Vec<ParticipanteDetalle>,
}

/// Reconstructs the aggregate for display/edit. The recording user never
/// appears among the participants even when a participation row points at
/// them.
pub async fn obtener_completo(pool: &PgPool, id_sacramento: i32) -> Result<SacramentoCompleto, ApiError> {
    let sacramento: Option<Sacramento> =
        sqlx::query_as("SELECT * FROM sacramento WHERE id_sacramento = $1 AND activo = TRUE")
            .bind(id_sacramento)
            .fetch_optional(pool)
            .await?;
    let sacramento = sacramento.ok_or_else(|| ApiError::not_found("Sacramento no encontrado"))?;

    let (parroquia, tipo_sacramento, registrador): (String, String, String) = sqlx::query_as(
        "SELECT pa.nombre, t.nombre, \
                u.nombre || ' ' || u.apellido_paterno || ' ' || u.apellido_materno \
         FROM sacramento s \
         JOIN institucion_parroquia pa ON pa.id_parroquia = s.institucion_parroquia_id_parroquia \
         JOIN tipo_sacramento t ON t.id_tipo = s.tipo_sacramento_id_tipo \
         JOIN usuario u ON u.id_usuario = s.usuario_id_usuario \
         WHERE s.id_sacramento = $1",
    )
    .bind(id_sacramento)
    .fetch_one(pool)
    .await?;

    let mut participantes: Vec<ParticipanteDetalle> = sqlx::query_as(
        "SELECT ps.persona_id_persona AS persona_id, \
                pe.nombre || ' ' || pe.apellido_paterno || ' ' || pe.apellido_materno AS nombre_completo, \
                pe.carnet_identidad, \
                ps.rol_sacramento_id_rol_sacra AS rol_id, \
                rs.nombre AS rol_nombre \
         FROM persona_sacramento ps \
         JOIN persona pe ON pe.id_persona = ps.persona_id_persona \
         JOIN rol_sacramento rs ON rs.id_rol_sacra = ps.rol_sacramento_id_rol_sacra \
         WHERE ps.sacramento_id_sacramento = $1 \
         ORDER BY ps.rol_sacramento_id_rol_sacra",
    )
    .bind(id_sacramento)
    .fetch_all(pool)
    .await?;

    participantes.retain(|p| p.persona_id != sacramento.usuario_id_usuario);

    Ok(SacramentoCompleto {
        sacramento,
        parroquia,
        tipo_sacramento,
        registrador,
        participantes,
    })
}

/// One row of the search-by-participant listing.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct FilaBusquedaPersona {
    pub id_sacramento: i32,
    pub fecha_sacramento: chrono::NaiveDate,
    pub foja: String,
    pub numero: i32,
    #[serde(skip_serializing)]
    pub usuario_id_usuario: i32,
    pub tipo_sacramento: String,
    pub parroquia: String,
    pub persona_id: i32,
    pub nombre_completo: String,
    pub carnet_identidad: String,
    pub rol_nombre: String,
}

/// A person must never surface as a participant of a sacrament they
/// themselves recorded. Applied in memory over the full candidate set so
/// pagination counts reflect the filtered result.
pub fn excluir_autoregistro(filas: Vec<FilaBusquedaPersona>) -> Vec<FilaBusquedaPersona> {
    filas
        .into_iter()
        .filter(|f| f.persona_id != f.usuario_id_usuario)
        .collect()
}

/// Searches sacraments by participant attributes (names / national id).
pub async fn buscar_por_persona(
    pool: &PgPool,
    search: &str,
    pagina: &Pagina,
) -> Result<Value, ApiError> {
    let sql = format!(
        "SELECT s.id_sacramento, s.fecha_sacramento, s.foja, s.numero, s.usuario_id_usuario, \
                t.nombre AS tipo_sacramento, pa.nombre AS parroquia, \
                ps.persona_id_persona AS persona_id, \
                pe.nombre || ' ' || pe.apellido_paterno || ' ' || pe.apellido_materno AS nombre_completo, \
                pe.carnet_identidad, \
                rs.nombre AS rol_nombre \
         FROM sacramento s \
         JOIN persona_sacramento ps ON ps.sacramento_id_sacramento = s.id_sacramento \
         JOIN persona pe ON pe.id_persona = ps.persona_id_persona \
         JOIN rol_sacramento rs ON rs.id_rol_sacra = ps.rol_sacramento_id_rol_sacra \
         JOIN tipo_sacramento t ON t.id_tipo = s.tipo_sacramento_id_tipo \
         JOIN institucion_parroquia pa ON pa.id_parroquia = s.institucion_parroquia_id_parroquia \
         WHERE s.activo = TRUE AND pe.activo = TRUE AND {} \
         ORDER BY s.fecha_sacramento DESC, s.id_sacramento ASC",
        clausula_ilike(
            &["pe.nombre", "pe.apellido_paterno", "pe.apellido_materno", "pe.carnet_identidad"],
            1
        )
    );

    let filas: Vec<FilaBusquedaPersona> = sqlx::query_as(&sql)
        .bind(patron_ilike(search))
        .fetch_all(pool)
        .await?;

    let filtradas = excluir_autoregistro(filas);
    let total = filtradas.len() as i64;

    let desde = (pagina.offset as usize).min(filtradas.len());
    let hasta = (desde + pagina.limit as usize).min(filtradas.len());
    Ok(respuesta_paginada("resultados", &filtradas[desde..hasta], total, pagina))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rel(persona_id: i32, rol_sacramento_id: i32) -> Relacion {
        Relacion { persona_id, rol_sacramento_id }
    }

    #[test]
    fn relaciones_como_arreglo() {
        let valor = json!([{"persona_id": 5, "rol_sacramento_id": 1}]);
        let rels = normalizar_relaciones(Some(&valor)).unwrap();
        assert_eq!(rels, vec![rel(5, 1)]);
    }

    #[test]
    fn relaciones_como_cadena_codificada() {
        let valor = json!("[{\"persona_id\": 5, \"rol_sacramento_id\": 1}]");
        let rels = normalizar_relaciones(Some(&valor)).unwrap();
        assert_eq!(rels, vec![rel(5, 1)]);
    }

    #[test]
    fn arreglo_vacio_es_valido() {
        let valor = json!([]);
        assert_eq!(normalizar_relaciones(Some(&valor)).unwrap(), vec![]);
    }

    #[test]
    fn relaciones_ausentes_o_malformadas_se_rechazan() {
        assert!(normalizar_relaciones(None).is_err());
        assert!(normalizar_relaciones(Some(&json!(42))).is_err());
        assert!(normalizar_relaciones(Some(&json!({"persona_id": 5}))).is_err());
        assert!(normalizar_relaciones(Some(&json!("esto no es json"))).is_err());
        assert!(normalizar_relaciones(Some(&json!([{"persona_id": "x"}]))).is_err());
    }

    #[test]
    fn plan_conserva_actualiza_inserta_y_elimina() {
        // actuales {A:p1, B:p2}, entrantes [{A,p1},{C,p3}]
        // => A queda intacta, C se inserta, B se elimina
        let actuales = vec![(1, 10), (2, 20)];
        let entrantes = vec![rel(10, 1), rel(30, 3)];
        let plan = planificar_reconciliacion(&actuales, &entrantes);
        assert!(plan.actualizar.is_empty());
        assert_eq!(plan.insertar, vec![rel(30, 3)]);
        assert_eq!(plan.eliminar, vec![2]);
    }

    #[test]
    fn plan_reapunta_el_rol_cuando_cambia_la_persona() {
        let actuales = vec![(1, 10)];
        let entrantes = vec![rel(99, 1)];
        let plan = planificar_reconciliacion(&actuales, &entrantes);
        assert_eq!(plan.actualizar, vec![rel(99, 1)]);
        assert!(plan.insertar.is_empty());
        assert!(plan.eliminar.is_empty());
    }

    #[test]
    fn omitir_todos_los_roles_vacia_el_sacramento() {
        let actuales = vec![(1, 10), (2, 20)];
        let plan = planificar_reconciliacion(&actuales, &[]);
        assert!(plan.actualizar.is_empty());
        assert!(plan.insertar.is_empty());
        assert_eq!(plan.eliminar, vec![1, 2]);
    }

    #[test]
    fn un_solo_participante_por_rol() {
        // Dos entrantes con el mismo rol: la segunda reapunta a la primera,
        // nunca coexisten dos filas para el mismo rol.
        let actuales: Vec<(i32, i32)> = vec![];
        let entrantes = vec![rel(10, 1), rel(20, 1)];
        let plan = planificar_reconciliacion(&actuales, &entrantes);
        assert_eq!(plan.insertar, vec![rel(10, 1)]);
        assert_eq!(plan.actualizar, vec![rel(20, 1)]);
        assert!(plan.eliminar.is_empty());
    }

    #[test]
    fn plan_sin_cambios_es_vacio() {
        let actuales = vec![(1, 10), (2, 20)];
        let entrantes = vec![rel(10, 1), rel(20, 2)];
        let plan = planificar_reconciliacion(&actuales, &entrantes);
        assert_eq!(plan, PlanReconciliacion::default());
    }

    fn fila(id_sacramento: i32, persona_id: i32, registrador: i32) -> FilaBusquedaPersona {
        FilaBusquedaPersona {
            id_sacramento,
            fecha_sacramento: chrono::NaiveDate::from_ymd_opt(2024, 5, 12).unwrap(),
            foja: "12-B".to_string(),
            numero: 44,
            usuario_id_usuario: registrador,
            tipo_sacramento: "Bautizo".to_string(),
            parroquia: "San Miguel".to_string(),
            persona_id,
            nombre_completo: "Ana Mamani Quispe".to_string(),
            carnet_identidad: "4567123".to_string(),
            rol_nombre: "BAUTIZADO".to_string(),
        }
    }

    #[test]
    fn el_registrador_no_aparece_como_participante() {
        let filas = vec![fila(1, 7, 7), fila(2, 8, 7), fila(3, 7, 9)];
        let filtradas = excluir_autoregistro(filas);
        let ids: Vec<i32> = filtradas.iter().map(|f| f.id_sacramento).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn el_total_refleja_la_exclusion() {
        let filas = vec![fila(1, 7, 7), fila(2, 8, 7)];
        let filtradas = excluir_autoregistro(filas);
        assert_eq!(filtradas.len(), 1);
    }
}
