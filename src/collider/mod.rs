//! 复杂碰撞体运动学模块
//!
//! 子骨骼存储、碰撞体控制器与全局配置。

pub mod config;

mod complex_colliders;
mod sub_bones;

pub use complex_colliders::ComplexColliders;
pub use sub_bones::SubBoneStore;
