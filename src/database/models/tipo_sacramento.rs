use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Sacrament-type catalog: Bautizo, Comunion, Confirmacion, Matrimonio.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TipoSacramento {
    pub id_tipo: i32,
    pub nombre: String,
    pub descripcion: Option<String>,
}
