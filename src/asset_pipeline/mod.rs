pub mod materials;
pub mod mesh_assembler;
