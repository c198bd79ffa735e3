use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Identity record of the registry. Soft-deleted via `activo`, never removed
/// while participation rows reference it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Persona {
    pub id_persona: i32,
    pub nombre: String,
    pub apellido_paterno: String,
    pub apellido_materno: String,
    pub carnet_identidad: String,
    pub fecha_nacimiento: NaiveDate,
    pub lugar_nacimiento: String,
    pub nombre_padre: String,
    pub nombre_madre: String,
    pub activo: bool,
    pub estado: String,
    pub sacerdote: Option<bool>,
}

impl Persona {
    pub fn nombre_completo(&self) -> String {
        format!(
            "{} {} {}",
            self.nombre, self.apellido_paterno, self.apellido_materno
        )
    }
}
