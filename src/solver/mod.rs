//! 求解器对接层
//!
//! 碰撞粒子范围的只读视图与骨骼数据提取类型。

mod bone_data;
mod particles;

pub use bone_data::{BoneDataHandle, BoneDataMap, ComplexColliderBoneData};
pub use particles::{CollisionParticlesRange, CollisionParticlesView, CollisionRangeId};
