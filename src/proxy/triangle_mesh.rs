//! 蒙皮三角网格碰撞代理记录

use std::mem;
use std::sync::Arc;

use glam::Vec3;

use super::geometry::SkinnedTriangleMeshGeometry;

/// 蒙皮三角网格代理
///
/// 除映射关系外还持有按顶点对齐的局部位置双缓冲与求解器空间
/// 速度，缓冲大小在注册时按几何的权重顶点数分配，之后不再变化。
pub struct SkinnedTriangleMeshProxy {
    pub(crate) index: usize,
    pub(crate) mapped_sub_bones: Vec<usize>,
    pub(crate) geometry: Arc<dyn SkinnedTriangleMeshGeometry>,
    /// 上一整帧局部顶点位置
    pub(crate) old_positions: Vec<Vec3>,
    /// 当前整帧局部顶点位置
    pub(crate) positions: Vec<Vec3>,
    /// 求解器空间顶点速度
    pub(crate) solver_space_velocities: Vec<Vec3>,
    /// 子步蒙皮结果（求解器空间，复用内存）
    pub(crate) solver_positions: Vec<Vec3>,
}

impl SkinnedTriangleMeshProxy {
    /// 按几何的权重顶点数分配缓冲，局部位置以静止姿态初始化
    pub(crate) fn new(
        index: usize,
        mapped_sub_bones: Vec<usize>,
        geometry: Arc<dyn SkinnedTriangleMeshGeometry>,
    ) -> Self {
        let vertex_count = geometry.vertex_count();
        let positions = geometry.local_positions().to_vec();
        debug_assert_eq!(positions.len(), vertex_count, "local positions length mismatch");

        Self {
            index,
            mapped_sub_bones,
            geometry,
            old_positions: positions.clone(),
            positions,
            solver_space_velocities: vec![Vec3::ZERO; vertex_count],
            solver_positions: vec![Vec3::ZERO; vertex_count],
        }
    }

    /// 以当前位置为新模拟帧的起点，求解器空间速度清零
    pub(crate) fn reset_start_pose(&mut self) {
        self.old_positions.copy_from_slice(&self.positions);
        self.solver_space_velocities.fill(Vec3::ZERO);
    }

    /// 交换局部位置双缓冲（指针交换，无拷贝）
    pub(crate) fn swap_buffers(&mut self) {
        mem::swap(&mut self.old_positions, &mut self.positions);
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub fn mapped_sub_bones(&self) -> &[usize] {
        &self.mapped_sub_bones
    }

    #[inline]
    pub fn geometry(&self) -> &Arc<dyn SkinnedTriangleMeshGeometry> {
        &self.geometry
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// 上一整帧局部顶点位置
    #[inline]
    pub fn old_positions(&self) -> &[Vec3] {
        &self.old_positions
    }

    /// 当前整帧局部顶点位置
    #[inline]
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    /// 求解器空间顶点速度
    #[inline]
    pub fn solver_space_velocities(&self) -> &[Vec3] {
        &self.solver_space_velocities
    }

    /// 最近一次子步蒙皮的求解器空间顶点位置
    #[inline]
    pub fn solver_positions(&self) -> &[Vec3] {
        &self.solver_positions
    }
}
