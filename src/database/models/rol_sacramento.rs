use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Ceremonial role catalog (BAUTIZADO, PADRINO, MINISTRO, ...). Static
/// reference data; role names feed the eligibility rules in uppercase form.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RolSacramento {
    pub id_rol_sacra: i32,
    pub nombre: String,
}
