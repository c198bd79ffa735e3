use once_cell::sync::Lazy;
use std::collections::BTreeMap;

/// Required/excluded role-history precondition attached to a sacrament type
/// or a ceremonial role. Role names are stored in their canonical uppercase
/// form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReglaElegibilidad {
    /// Every one of these roles must appear in the candidate's history.
    pub requeridos: &'static [&'static str],
    /// None of these roles may appear in the candidate's history.
    pub excluidos: &'static [&'static str],
}

impl ReglaElegibilidad {
    /// A rule that both requires and excludes the same role is a modeling
    /// contradiction and must never be served.
    pub fn es_consistente(&self) -> bool {
        !self
            .requeridos
            .iter()
            .any(|r| self.excluidos.contains(r))
    }
}

/// Which of the two catalogs a lookup targets: eligibility to *receive* a
/// sacrament, or eligibility to *serve* in a ceremonial role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TipoRegla {
    Sacramento,
    Rol,
}

static REGLAS_SACRAMENTO: Lazy<BTreeMap<&'static str, ReglaElegibilidad>> = Lazy::new(|| {
    BTreeMap::from([
        (
            "Bautizo",
            ReglaElegibilidad {
                requeridos: &[],
                excluidos: &["BAUTIZADO"],
            },
        ),
        (
            "Comunion",
            ReglaElegibilidad {
                requeridos: &["BAUTIZADO"],
                excluidos: &["COMULGADO"],
            },
        ),
        (
            "Confirmacion",
            ReglaElegibilidad {
                requeridos: &["BAUTIZADO", "COMULGADO"],
                excluidos: &["CONFIRMADO"],
            },
        ),
        (
            "Matrimonio",
            ReglaElegibilidad {
                requeridos: &["BAUTIZADO"],
                excluidos: &["CASADO"],
            },
        ),
    ])
});

static REGLAS_ROL: Lazy<BTreeMap<&'static str, ReglaElegibilidad>> = Lazy::new(|| {
    BTreeMap::from([
        (
            "padrino",
            ReglaElegibilidad {
                requeridos: &["BAUTIZADO"],
                excluidos: &[],
            },
        ),
        (
            "ministro",
            ReglaElegibilidad {
                requeridos: &["BAUTIZADO", "CONFIRMADO"],
                excluidos: &[],
            },
        ),
    ])
});

fn catalogo(tipo: TipoRegla) -> &'static BTreeMap<&'static str, ReglaElegibilidad> {
    match tipo {
        TipoRegla::Sacramento => &REGLAS_SACRAMENTO,
        TipoRegla::Rol => &REGLAS_ROL,
    }
}

/// Case-insensitive rule lookup. Catalog keys come from free-form data
/// entry, so the caller's key is folded to lowercase and matched against
/// folded catalog keys; `None` means the caller must reject the request.
pub fn buscar_regla(tipo: TipoRegla, clave: &str) -> Option<&'static ReglaElegibilidad> {
    let clave = clave.to_lowercase();
    catalogo(tipo)
        .iter()
        .find(|(nombre, _)| nombre.to_lowercase() == clave)
        .map(|(_, regla)| regla)
}

/// Startup check: every rule in both catalogs must keep its required and
/// excluded sets disjoint. Serving a contradictory rule would silently
/// reject every candidate, so the server refuses to start instead.
pub fn validar_catalogos() -> Result<(), String> {
    for tipo in [TipoRegla::Sacramento, TipoRegla::Rol] {
        for (clave, regla) in catalogo(tipo) {
            if !regla.es_consistente() {
                return Err(format!(
                    "regla '{}' requiere y excluye el mismo rol",
                    clave
                ));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requeridos_y_excluidos_disjuntos_en_ambos_catalogos() {
        assert!(validar_catalogos().is_ok());
        for tipo in [TipoRegla::Sacramento, TipoRegla::Rol] {
            for regla in catalogo(tipo).values() {
                assert!(regla.es_consistente());
            }
        }
    }

    #[test]
    fn busqueda_ignora_mayusculas() {
        let a = buscar_regla(TipoRegla::Sacramento, "BAUTIZO").unwrap();
        let b = buscar_regla(TipoRegla::Sacramento, "bautizo").unwrap();
        let c = buscar_regla(TipoRegla::Sacramento, "Bautizo").unwrap();
        assert_eq!(a, b);
        assert_eq!(b, c);
    }

    #[test]
    fn clave_desconocida_no_resuelve() {
        assert!(buscar_regla(TipoRegla::Sacramento, "Extremauncion").is_none());
        assert!(buscar_regla(TipoRegla::Rol, "bautizo").is_none());
    }

    #[test]
    fn los_catalogos_son_independientes() {
        assert!(buscar_regla(TipoRegla::Rol, "padrino").is_some());
        assert!(buscar_regla(TipoRegla::Sacramento, "padrino").is_none());
    }

    #[test]
    fn contenido_de_confirmacion() {
        let regla = buscar_regla(TipoRegla::Sacramento, "confirmacion").unwrap();
        assert_eq!(regla.requeridos, &["BAUTIZADO", "COMULGADO"]);
        assert_eq!(regla.excluidos, &["CONFIRMADO"]);
    }

    #[test]
    fn regla_contradictoria_es_inconsistente() {
        let regla = ReglaElegibilidad {
            requeridos: &["BAUTIZADO"],
            excluidos: &["BAUTIZADO"],
        };
        assert!(!regla.es_consistente());
    }
}
