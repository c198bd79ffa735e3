use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Three-way association: one person holds one role in one sacrament event.
/// Identity is the composite triple; there is no surrogate key.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PersonaSacramento {
    pub persona_id_persona: i32,
    pub rol_sacramento_id_rol_sacra: i32,
    pub sacramento_id_sacramento: i32,
}
