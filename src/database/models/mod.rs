pub mod matrimonio_detalle;
pub mod parroquia;
pub mod persona;
pub mod persona_sacramento;
pub mod propuesta;
pub mod rol_sacramento;
pub mod sacramento;
pub mod tipo_sacramento;
pub mod usuario;

pub use matrimonio_detalle::MatrimonioDetalle;
pub use parroquia::Parroquia;
pub use persona::Persona;
pub use persona_sacramento::PersonaSacramento;
pub use propuesta::Propuesta;
pub use rol_sacramento::RolSacramento;
pub use sacramento::Sacramento;
pub use tipo_sacramento::TipoSacramento;
pub use usuario::Usuario;
