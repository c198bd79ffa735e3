use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Parroquia {
    pub id_parroquia: i32,
    pub nombre: String,
    pub direccion: String,
    pub telefono: String,
    pub email: String,
}
