pub mod busqueda;
pub mod matrimonio_detalles;
pub mod parroquias;
pub mod persona_sacramentos;
pub mod personas;
pub mod propuestas;
pub mod roles_sacramento;
pub mod sacramentos;
pub mod tipos_sacramento;
pub mod usuarios;
