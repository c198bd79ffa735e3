use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Propuesta {
    pub id_propuesta: i32,
    pub propuesta: String,
    pub fecha: DateTime<Utc>,
    #[sqlx(rename = "isDeleted")]
    #[serde(rename = "isDeleted")]
    pub is_deleted: bool,
    pub publicado: bool,
}
