mod loader;
mod material;
mod mesh;
pub mod primitives;
mod texture;
mod vertex;

pub use loader::{parse_mtl, parse_obj, MaterialData, MeshData, Model, ObjModel};
pub use material::Material;
pub use mesh::Mesh;
pub use texture::{load_cube_faces, Texture};
pub use vertex::{ModelVertex, QuadVertex, SkyboxVertex};
