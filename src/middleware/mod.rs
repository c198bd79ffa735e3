pub mod auth;
pub mod correlation;

pub use auth::{validar_jwt, AuthUser};
pub use correlation::correlacionar_peticion;
