//! 碰撞几何接口
//!
//! 几何对象由外部资产系统持有，本子系统只通过共享句柄调用
//! 其变形接口，不获取所有权也不销毁。接口全部为 &self 方法，
//! 内部同步由几何实现自行负责。

use glam::Vec3;

use crate::transform::RigidTransform;

/// 蒙皮 levelset 几何接口
pub trait SkinnedLevelSetGeometry: Send + Sync {
    /// 按子骨骼相对根变换变形控制点
    fn deform_points(&self, relative_transforms: &[RigidTransform]);

    /// 重建内部空间层级（开销由几何自行摊销）
    fn update_spatial_hierarchy(&self);
}

/// ML levelset 几何接口（学习得到的加权格点参数化）
pub trait MlLevelSetGeometry: Send + Sync {
    /// 按子骨骼相对根变换更新活动骨骼
    fn update_active_bones(&self, relative_transforms: &[RigidTransform]);

    /// 重建内部空间层级
    fn update_spatial_hierarchy(&self);
}

/// 蒙皮三角网格几何接口
pub trait SkinnedTriangleMeshGeometry: Send + Sync {
    /// 骨骼权重数据的顶点数
    fn vertex_count(&self) -> usize;

    /// 静止姿态局部顶点位置
    fn local_positions(&self) -> &[Vec3];

    /// 按相对变换蒙皮出局部空间顶点位置
    fn skin_positions(&self, relative_transforms: &[RigidTransform], out_positions: &mut [Vec3]);

    /// 按求解器空间位置与速度更新包围盒
    fn update_bounding_box(&self, solver_positions: &[Vec3], solver_velocities: &[Vec3]);

    /// 重建内部空间层级
    fn update_spatial_hierarchy(&self);
}
