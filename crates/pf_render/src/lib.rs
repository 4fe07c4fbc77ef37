pub mod camera;
pub mod gpu_context;
pub mod gpu_mesh;
pub mod mesh;
pub mod mesh_pipeline;
pub mod pick;
pub mod texture;
pub mod vertex;

pub use camera::{Camera3D, Lighting, OrbitCamera, SceneUniform};
pub use gpu_context::GpuContext;
pub use gpu_mesh::GpuMesh;
pub use mesh::MeshData;
pub use mesh_pipeline::{DrawItem, MeshPipeline, ObjectBinding, ObjectUniform};
pub use pick::{Hit, Ray};
pub use texture::{DepthTexture, Texture};
pub use vertex::MeshVertex;
