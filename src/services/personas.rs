//! Candidate search for sacrament registration: who may receive a given
//! sacrament, or serve in a given ceremonial role, based on their whole
//! sacramental history.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use sqlx::{FromRow, PgPool};

use crate::error::ApiError;
use crate::rules::{buscar_regla, es_elegible, normalizar_rol, ReglaElegibilidad, TipoRegla};
use crate::search::{clausula_ilike, patron_ilike};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CandidataSacramento {
    pub id_persona: i32,
    pub nombre: String,
    pub apellido_paterno: String,
    pub apellido_materno: String,
    pub carnet_identidad: String,
}

/// Finds active persons matching `search` by name or national id and keeps
/// only those whose historical role set satisfies the rule behind `clave`.
///
/// The history is system-wide: every participation the person ever had
/// counts, not just the ones on a particular sacrament. Store ordering is
/// preserved through the filter.
pub async fn buscar_candidatas(
    pool: &PgPool,
    search: &str,
    clave: &str,
    tipo: TipoRegla,
) -> Result<Vec<CandidataSacramento>, ApiError> {
    let regla = buscar_regla(tipo, clave)
        .ok_or_else(|| ApiError::bad_request("Rol o sacramento inválido"))?;

    let sql = format!(
        "SELECT id_persona, nombre, apellido_paterno, apellido_materno, carnet_identidad \
         FROM persona \
         WHERE activo = TRUE AND {} \
         ORDER BY apellido_paterno ASC, apellido_materno ASC, nombre ASC",
        clausula_ilike(
            &["nombre", "apellido_paterno", "apellido_materno", "carnet_identidad"],
            1
        )
    );

    let candidatas: Vec<CandidataSacramento> = sqlx::query_as(&sql)
        .bind(patron_ilike(search))
        .fetch_all(pool)
        .await?;

    if candidatas.is_empty() {
        return Ok(candidatas);
    }

    let historiales = historiales_de_roles(pool, &candidatas).await?;
    Ok(filtrar_por_regla(candidatas, &historiales, regla))
}

/// One bulk query for the whole candidate set: every ceremonial role each
/// person has ever held, folded to canonical uppercase.
async fn historiales_de_roles(
    pool: &PgPool,
    candidatas: &[CandidataSacramento],
) -> Result<HashMap<i32, HashSet<String>>, ApiError> {
    let ids: Vec<i32> = candidatas.iter().map(|c| c.id_persona).collect();

    let filas: Vec<(i32, String)> = sqlx::query_as(
        "SELECT ps.persona_id_persona, rs.nombre \
         FROM persona_sacramento ps \
         JOIN rol_sacramento rs ON rs.id_rol_sacra = ps.rol_sacramento_id_rol_sacra \
         WHERE ps.persona_id_persona = ANY($1)",
    )
    .bind(&ids)
    .fetch_all(pool)
    .await?;

    let mut historiales: HashMap<i32, HashSet<String>> = HashMap::new();
    for (persona_id, rol) in filas {
        historiales
            .entry(persona_id)
            .or_default()
            .insert(normalizar_rol(&rol));
    }
    Ok(historiales)
}

fn filtrar_por_regla(
    candidatas: Vec<CandidataSacramento>,
    historiales: &HashMap<i32, HashSet<String>>,
    regla: &ReglaElegibilidad,
) -> Vec<CandidataSacramento> {
    static SIN_HISTORIAL: once_cell::sync::Lazy<HashSet<String>> =
        once_cell::sync::Lazy::new(HashSet::new);

    candidatas
        .into_iter()
        .filter(|c| {
            let roles = historiales.get(&c.id_persona).unwrap_or(&SIN_HISTORIAL);
            es_elegible(roles, regla)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidata(id: i32, nombre: &str) -> CandidataSacramento {
        CandidataSacramento {
            id_persona: id,
            nombre: nombre.to_string(),
            apellido_paterno: "Mamani".to_string(),
            apellido_materno: "Quispe".to_string(),
            carnet_identidad: format!("{}00123", id),
        }
    }

    fn historial(entradas: &[(i32, &[&str])]) -> HashMap<i32, HashSet<String>> {
        entradas
            .iter()
            .map(|(id, roles)| {
                (*id, roles.iter().map(|r| normalizar_rol(r)).collect())
            })
            .collect()
    }

    const BAUTIZO: ReglaElegibilidad = ReglaElegibilidad {
        requeridos: &[],
        excluidos: &["BAUTIZADO"],
    };

    const PADRINO: ReglaElegibilidad = ReglaElegibilidad {
        requeridos: &["BAUTIZADO"],
        excluidos: &[],
    };

    #[test]
    fn excluye_a_quien_ya_tiene_el_rol_excluido() {
        let candidatas = vec![candidata(1, "Ana"), candidata(2, "Berta")];
        let historiales = historial(&[(1, &["BAUTIZADO"]), (2, &[])]);
        let elegibles = filtrar_por_regla(candidatas, &historiales, &BAUTIZO);
        assert_eq!(elegibles.len(), 1);
        assert_eq!(elegibles[0].id_persona, 2);
    }

    #[test]
    fn persona_sin_historial_cuenta_como_conjunto_vacio() {
        // id 3 no aparece en el mapa: apta para bautizo, no apta de padrino
        let historiales = historial(&[]);
        let para_bautizo =
            filtrar_por_regla(vec![candidata(3, "Carla")], &historiales, &BAUTIZO);
        assert_eq!(para_bautizo.len(), 1);
        let de_padrino =
            filtrar_por_regla(vec![candidata(3, "Carla")], &historiales, &PADRINO);
        assert!(de_padrino.is_empty());
    }

    #[test]
    fn conserva_el_orden_de_la_consulta() {
        let candidatas = vec![candidata(5, "Elena"), candidata(1, "Ana"), candidata(9, "Irma")];
        let historiales = historial(&[(5, &[]), (1, &["BAUTIZADO"]), (9, &[])]);
        let elegibles = filtrar_por_regla(candidatas, &historiales, &BAUTIZO);
        let ids: Vec<i32> = elegibles.iter().map(|c| c.id_persona).collect();
        assert_eq!(ids, vec![5, 9]);
    }
}
