//! 布料求解器的复杂碰撞体运动学库
//!
//! 从骨架姿态驱动一组蒙皮碰撞几何（levelset / ML levelset /
//! 蒙皮三角网格），在模拟子步之间插值出平滑的碰撞体位置、
//! 速度、旋转与角速度，供布料求解器做连续碰撞处理。
//!
//! 主要入口：
//! - [`ComplexColliders`]：每个碰撞范围一个控制器，持有子骨骼
//!   存储与代理集合，按帧/子步节奏推进
//! - [`SubBoneStore`]：SoA 子骨骼运动学状态
//! - [`CollisionParticlesView`]：求解器侧实时粒子的只读接口
//! - [`extract_bone_data`](ComplexColliders::extract_bone_data) /
//!   [`resolve_bone_data`](ComplexColliders::resolve_bone_data)：
//!   带代数校验的零拷贝骨骼数据导出

use thiserror::Error;

pub mod collider;
pub mod proxy;
pub mod solver;
pub mod transform;

pub use collider::config::{get_config, reset_config, set_config, ColliderConfig};
pub use collider::{ComplexColliders, SubBoneStore};
pub use proxy::{
    BoundingBox, MlLevelSetGeometry, MlLevelSetProxy, SkinnedLevelSetGeometry,
    SkinnedLevelSetProxy, SkinnedTriangleMeshGeometry, SkinnedTriangleMeshProxy,
    VertexBoneWeights, WeightedMeshGeometry,
};
pub use solver::{
    BoneDataHandle, BoneDataMap, CollisionParticlesRange, CollisionParticlesView,
    CollisionRangeId, ComplexColliderBoneData,
};
pub use transform::{angular_velocity, RigidTransform};

/// 碰撞体库错误类型
#[derive(Error, Debug)]
pub enum ColliderError {
    /// 骨骼数据句柄已过期（提取后子骨骼存储发生过结构变更）
    #[error("stale bone data view: taken at generation {taken}, store is at generation {current}")]
    StaleBoneData { taken: u64, current: u64 },

    /// 句柄槽位超出当前代理数量（句柄来自其他控制器或已损坏）
    #[error("bone data slot {slot} is out of range ({count} skinned level set proxies)")]
    BoneDataSlotOutOfRange { slot: usize, count: usize },
}

/// 库内统一 Result 类型
pub type Result<T> = std::result::Result<T, ColliderError>;
