//! 参考蒙皮网格几何
//!
//! 用最多 4 个骨骼影响的加权混合蒙皮实现三角网格几何接口，
//! 顶点数达到配置阈值时走 rayon 并行路径。
//! 不维护真实空间层级，只跟踪包围盒与层级重建请求计数。

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use glam::Vec3;
use rayon::prelude::*;

use crate::collider::config::get_config;
use crate::transform::RigidTransform;

use super::geometry::SkinnedTriangleMeshGeometry;

/// 轴对齐包围盒
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoundingBox {
    /// 空包围盒（min > max，并入任意点后变为有效）
    pub const EMPTY: Self = Self {
        min: Vec3::splat(f32::MAX),
        max: Vec3::splat(f32::MIN),
    };

    /// 包含一组点的最小包围盒
    pub fn from_points(points: &[Vec3]) -> Self {
        let mut bounds = Self::EMPTY;
        for &point in points {
            bounds.merge_point(point);
        }
        bounds
    }

    /// 并入一个点
    #[inline]
    pub fn merge_point(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    /// 各轴向外扩张
    #[inline]
    pub fn expand(&mut self, amount: Vec3) {
        self.min -= amount;
        self.max += amount;
    }

    /// 是否包含点（闭区间）
    #[inline]
    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// 是否有效（并入过至少一个点）
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.min.cmple(self.max).all()
    }
}

/// 单个顶点的骨骼权重（最多 4 个影响）
#[derive(Debug, Clone, Copy)]
pub struct VertexBoneWeights {
    /// 映射子骨骼槽位（相对变换数组的下标，负数无效）
    pub bones: [i32; 4],
    /// 权重，未用槽位为 0
    pub weights: [f32; 4],
}

impl VertexBoneWeights {
    /// 单骨骼全权重
    pub fn single(bone: i32) -> Self {
        Self {
            bones: [bone, -1, -1, -1],
            weights: [1.0, 0.0, 0.0, 0.0],
        }
    }
}

/// 参考蒙皮网格几何
pub struct WeightedMeshGeometry {
    /// 静止姿态局部顶点位置
    rest_positions: Vec<Vec3>,
    /// 每顶点骨骼权重
    bone_weights: Vec<VertexBoneWeights>,
    /// 最近一次更新的包围盒
    bounds: RwLock<BoundingBox>,
    /// 空间层级重建请求计数
    hierarchy_updates: AtomicU64,
}

impl WeightedMeshGeometry {
    /// 从静止位置与骨骼权重创建，两个数组长度必须一致
    pub fn new(rest_positions: Vec<Vec3>, bone_weights: Vec<VertexBoneWeights>) -> Self {
        assert_eq!(
            rest_positions.len(),
            bone_weights.len(),
            "rest positions and bone weights must have the same length"
        );
        Self {
            rest_positions,
            bone_weights,
            bounds: RwLock::new(BoundingBox::EMPTY),
            hierarchy_updates: AtomicU64::new(0),
        }
    }

    /// 最近一次更新的包围盒
    pub fn bounds(&self) -> BoundingBox {
        *self.bounds.read().unwrap_or_else(|e| e.into_inner())
    }

    /// 已请求的空间层级重建次数
    pub fn hierarchy_update_count(&self) -> u64 {
        self.hierarchy_updates.load(Ordering::Relaxed)
    }

    /// 蒙皮单个顶点
    ///
    /// 无效骨骼槽位按静止位置计入权重；全零权重的顶点保持静止位置。
    fn skin_vertex(&self, relative_transforms: &[RigidTransform], vertex: usize) -> Vec3 {
        let rest = self.rest_positions[vertex];
        let influences = &self.bone_weights[vertex];

        let mut skinned = Vec3::ZERO;
        let mut total_weight = 0.0f32;
        for k in 0..4 {
            let weight = influences.weights[k];
            if weight == 0.0 {
                continue;
            }
            total_weight += weight;
            let bone = influences.bones[k];
            if bone >= 0 && (bone as usize) < relative_transforms.len() {
                skinned += relative_transforms[bone as usize].transform_point(rest) * weight;
            } else {
                skinned += rest * weight;
            }
        }

        if total_weight == 0.0 {
            rest
        } else {
            skinned
        }
    }
}

impl SkinnedTriangleMeshGeometry for WeightedMeshGeometry {
    fn vertex_count(&self) -> usize {
        self.rest_positions.len()
    }

    fn local_positions(&self) -> &[Vec3] {
        &self.rest_positions
    }

    fn skin_positions(&self, relative_transforms: &[RigidTransform], out_positions: &mut [Vec3]) {
        debug_assert_eq!(
            out_positions.len(),
            self.rest_positions.len(),
            "output buffer length mismatch"
        );

        if self.rest_positions.len() >= get_config().parallel_skinning_threshold {
            out_positions
                .par_iter_mut()
                .enumerate()
                .for_each(|(vertex, out)| *out = self.skin_vertex(relative_transforms, vertex));
        } else {
            for (vertex, out) in out_positions.iter_mut().enumerate() {
                *out = self.skin_vertex(relative_transforms, vertex);
            }
        }
    }

    fn update_bounding_box(&self, solver_positions: &[Vec3], solver_velocities: &[Vec3]) {
        let mut bounds = BoundingBox::from_points(solver_positions);

        // 按配置时间窗内的预估位移外扩
        let margin = get_config().bounds_velocity_margin;
        if margin > 0.0 && bounds.is_valid() {
            let mut extent = Vec3::ZERO;
            for &velocity in solver_velocities {
                extent = extent.max(velocity.abs());
            }
            bounds.expand(extent * margin);
        }

        *self.bounds.write().unwrap_or_else(|e| e.into_inner()) = bounds;
    }

    fn update_spatial_hierarchy(&self) {
        self.hierarchy_updates.fetch_add(1, Ordering::Relaxed);
    }
}
