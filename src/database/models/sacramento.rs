use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A dated ceremonial event. Created once per ceremony, logically deleted
/// via `activo = false`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Sacramento {
    pub id_sacramento: i32,
    pub fecha_sacramento: NaiveDate,
    pub fecha_registro: DateTime<Utc>,
    pub fecha_actualizacion: DateTime<Utc>,
    pub activo: bool,
    pub foja: String,
    pub numero: i32,
    pub usuario_id_usuario: i32,
    pub institucion_parroquia_id_parroquia: i32,
    pub tipo_sacramento_id_tipo: i32,
}
