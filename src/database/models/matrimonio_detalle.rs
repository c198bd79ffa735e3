use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Civil-registry annex of a marriage sacrament, one row per sacrament.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MatrimonioDetalle {
    pub sacramento_id_sacramento: i32,
    pub reg_civil: String,
    pub lugar_ceremonia: String,
    pub numero_acta: i32,
}
