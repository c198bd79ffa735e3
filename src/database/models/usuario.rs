use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Usuario {
    pub id_usuario: i32,
    pub nombre: String,
    pub apellido_paterno: String,
    pub apellido_materno: String,
    pub email: String,
    /// Argon2 digest. Never serialized into responses.
    #[serde(skip_serializing)]
    pub password: String,
    pub fecha_nacimiento: NaiveDate,
    pub activo: bool,
    pub rol: String,
}
