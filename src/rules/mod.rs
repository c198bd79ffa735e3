pub mod catalogo;
pub mod evaluador;

pub use catalogo::{buscar_regla, validar_catalogos, ReglaElegibilidad, TipoRegla};
pub use evaluador::{es_elegible, normalizar_rol};
