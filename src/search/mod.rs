use serde::Deserialize;
use serde_json::{json, Value};

/// Query-string pagination accepted by every listing route.
#[derive(Debug, Default, Deserialize)]
pub struct Paginacion {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagina {
    pub page: i64,
    pub limit: i64,
    pub offset: i64,
}

impl Paginacion {
    pub fn validar(&self) -> Pagina {
        let cfg = &crate::config::config().pagination;
        clamp(self.page, self.limit, cfg.default_limit, cfg.max_limit)
    }
}

fn clamp(page: Option<i64>, limit: Option<i64>, default_limit: i64, max_limit: i64) -> Pagina {
    let page = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(default_limit).clamp(1, max_limit);
    Pagina {
        page,
        limit,
        offset: (page - 1) * limit,
    }
}

pub fn total_paginas(total_items: i64, limit: i64) -> i64 {
    if total_items <= 0 {
        0
    } else {
        (total_items + limit - 1) / limit
    }
}

/// Standard paginated envelope: `{ok, <clave>: filas, totalItems,
/// totalPages, currentPage}`.
pub fn respuesta_paginada<T: serde::Serialize>(
    clave: &str,
    filas: &[T],
    total_items: i64,
    pagina: &Pagina,
) -> Value {
    json!({
        "ok": true,
        clave: filas,
        "totalItems": total_items,
        "totalPages": total_paginas(total_items, pagina.limit),
        "currentPage": pagina.page,
    })
}

/// Parameterized multi-column substring match:
/// `(CAST(c1 AS TEXT) ILIKE $n OR CAST(c2 AS TEXT) ILIKE $n ...)`.
/// The caller binds one `%term%` value at position `n`.
pub fn clausula_ilike(campos: &[&str], indice_param: usize) -> String {
    let condiciones: Vec<String> = campos
        .iter()
        .map(|campo| format!("CAST({} AS TEXT) ILIKE ${}", campo, indice_param))
        .collect();
    format!("({})", condiciones.join(" OR "))
}

pub fn patron_ilike(termino: &str) -> String {
    format!("%{}%", termino.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagina_por_defecto() {
        let p = clamp(None, None, 10, 100);
        assert_eq!(p, Pagina { page: 1, limit: 10, offset: 0 });
    }

    #[test]
    fn limite_acotado_al_maximo() {
        let p = clamp(Some(3), Some(1000), 10, 100);
        assert_eq!(p.limit, 100);
        assert_eq!(p.offset, 200);
    }

    #[test]
    fn pagina_y_limite_minimos() {
        let p = clamp(Some(0), Some(0), 10, 100);
        assert_eq!(p.page, 1);
        assert_eq!(p.limit, 1);
        assert_eq!(p.offset, 0);
    }

    #[test]
    fn total_de_paginas_redondea_hacia_arriba() {
        assert_eq!(total_paginas(0, 10), 0);
        assert_eq!(total_paginas(1, 10), 1);
        assert_eq!(total_paginas(10, 10), 1);
        assert_eq!(total_paginas(11, 10), 2);
    }

    #[test]
    fn clausula_con_varios_campos() {
        let sql = clausula_ilike(&["nombre", "carnet_identidad"], 2);
        assert_eq!(
            sql,
            "(CAST(nombre AS TEXT) ILIKE $2 OR CAST(carnet_identidad AS TEXT) ILIKE $2)"
        );
    }

    #[test]
    fn patron_recorta_espacios() {
        assert_eq!(patron_ilike("  ana "), "%ana%");
    }

    #[test]
    fn envelope_paginado() {
        let filas = vec![json!({"id": 1})];
        let pagina = Pagina { page: 2, limit: 10, offset: 10 };
        let v = respuesta_paginada("personas", &filas, 25, &pagina);
        assert_eq!(v["ok"], json!(true));
        assert_eq!(v["totalItems"], json!(25));
        assert_eq!(v["totalPages"], json!(3));
        assert_eq!(v["currentPage"], json!(2));
        assert!(v["personas"].is_array());
    }
}
