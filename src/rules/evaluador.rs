use std::collections::HashSet;

use super::catalogo::ReglaElegibilidad;

/// Canonical form for role-name comparison. Role names originate from
/// free-form catalog entry, so both the rules and the candidate's history
/// must pass through the same fold before any comparison.
pub fn normalizar_rol(nombre: &str) -> String {
    nombre.trim().to_uppercase()
}

/// Decides whether a candidate with the given historical role set may
/// receive the sacrament / hold the role the rule describes.
///
/// Both checks are evaluated unconditionally; an audit of a rejection can
/// always tell which side failed.
pub fn es_elegible(roles: &HashSet<String>, regla: &ReglaElegibilidad) -> bool {
    let cumple_requeridos = regla
        .requeridos
        .iter()
        .all(|req| roles.contains(&normalizar_rol(req)));
    let sin_excluidos = !regla
        .excluidos
        .iter()
        .any(|exc| roles.contains(&normalizar_rol(exc)));
    cumple_requeridos && sin_excluidos
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roles(nombres: &[&str]) -> HashSet<String> {
        nombres.iter().map(|n| normalizar_rol(n)).collect()
    }

    const BAUTIZO: ReglaElegibilidad = ReglaElegibilidad {
        requeridos: &[],
        excluidos: &["BAUTIZADO"],
    };

    const CONFIRMACION: ReglaElegibilidad = ReglaElegibilidad {
        requeridos: &["BAUTIZADO", "COMULGADO"],
        excluidos: &["CONFIRMADO"],
    };

    #[test]
    fn bautizo_rechaza_a_quien_ya_fue_bautizado() {
        assert!(!es_elegible(&roles(&["BAUTIZADO"]), &BAUTIZO));
        assert!(es_elegible(&roles(&[]), &BAUTIZO));
    }

    #[test]
    fn confirmacion_exige_historial_completo() {
        // falta COMULGADO
        assert!(!es_elegible(&roles(&["BAUTIZADO"]), &CONFIRMACION));
        assert!(es_elegible(&roles(&["BAUTIZADO", "COMULGADO"]), &CONFIRMACION));
        // ya confirmado
        assert!(!es_elegible(
            &roles(&["BAUTIZADO", "COMULGADO", "CONFIRMADO"]),
            &CONFIRMACION
        ));
    }

    #[test]
    fn roles_ajenos_no_afectan_el_resultado() {
        assert!(es_elegible(
            &roles(&["BAUTIZADO", "COMULGADO", "PADRINO", "CASADO"]),
            &CONFIRMACION
        ));
    }

    #[test]
    fn la_comparacion_es_por_forma_canonica() {
        let historial: HashSet<String> =
            ["bautizado", " Comulgado "].iter().map(|r| normalizar_rol(r)).collect();
        assert!(es_elegible(&historial, &CONFIRMACION));
    }

    #[test]
    fn reevaluar_es_idempotente() {
        let historial = roles(&["BAUTIZADO", "COMULGADO"]);
        let primera = es_elegible(&historial, &CONFIRMACION);
        let segunda = es_elegible(&historial, &CONFIRMACION);
        assert_eq!(primera, segunda);
    }

    #[test]
    fn equivalencia_con_la_definicion_de_conjuntos() {
        // isEligible(R) == (required ⊆ R) && (excluded ∩ R == ∅)
        let casos: Vec<HashSet<String>> = vec![
            roles(&[]),
            roles(&["BAUTIZADO"]),
            roles(&["COMULGADO"]),
            roles(&["BAUTIZADO", "COMULGADO"]),
            roles(&["BAUTIZADO", "COMULGADO", "CONFIRMADO"]),
            roles(&["CONFIRMADO"]),
        ];
        for r in casos {
            let requeridos: HashSet<String> =
                CONFIRMACION.requeridos.iter().map(|s| normalizar_rol(s)).collect();
            let excluidos: HashSet<String> =
                CONFIRMACION.excluidos.iter().map(|s| normalizar_rol(s)).collect();
            let esperado = requeridos.is_subset(&r) && excluidos.is_disjoint(&r);
            assert_eq!(es_elegible(&r, &CONFIRMACION), esperado, "historial: {:?}", r);
        }
    }
}
