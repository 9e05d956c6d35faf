//! 碰撞代理
//!
//! 几何接口、三类代理记录，以及一个参考蒙皮网格几何实现。

mod geometry;
mod levelset;
mod skinned_mesh;
mod triangle_mesh;

pub use geometry::{MlLevelSetGeometry, SkinnedLevelSetGeometry, SkinnedTriangleMeshGeometry};
pub use levelset::{MlLevelSetProxy, SkinnedLevelSetProxy};
pub use skinned_mesh::{BoundingBox, VertexBoneWeights, WeightedMeshGeometry};
pub use triangle_mesh::SkinnedTriangleMeshProxy;
