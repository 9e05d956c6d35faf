//! 复杂碰撞体控制器
//!
//! 维护子骨骼存储与三类碰撞代理，从外部骨架姿态推进运动学
//! 状态并把变形推送到代理几何。
//! 流程：正常帧 [swap_buffers_for_frame_flip → update]，首帧或
//! 瞬移 [update → reset_start_pose]，随后
//! [apply_pre_simulation_transforms → 每子步 kinematic_update →
//! extract_bone_data]，由外部求解器循环同步调用。

use std::sync::Arc;

use glam::Vec3;

use crate::proxy::{
    MlLevelSetGeometry, MlLevelSetProxy, SkinnedLevelSetGeometry, SkinnedLevelSetProxy,
    SkinnedTriangleMeshGeometry, SkinnedTriangleMeshProxy,
};
use crate::solver::{
    BoneDataHandle, BoneDataMap, CollisionParticlesView, CollisionRangeId,
    ComplexColliderBoneData,
};
use crate::transform::RigidTransform;
use crate::{ColliderError, Result};

use super::config::get_config;
use super::sub_bones::SubBoneStore;

/// 复杂碰撞体运动学控制器
///
/// 独占持有子骨骼存储与每代理缓冲；几何对象是共享句柄，
/// 生命周期由外部资产系统管理，这里只调用其变形接口。
pub struct ComplexColliders {
    /// 所属碰撞范围标识（构造时分配，不可变）
    collision_range_id: CollisionRangeId,
    /// 子骨骼存储
    sub_bones: SubBoneStore,
    /// 蒙皮 levelset 代理
    skinned_level_sets: Vec<SkinnedLevelSetProxy>,
    /// ML levelset 代理
    ml_level_sets: Vec<MlLevelSetProxy>,
    /// 蒙皮三角网格代理
    skinned_triangle_meshes: Vec<SkinnedTriangleMeshProxy>,
    /// 跳过三角网格的子步更新
    skip_skinned_triangle_mesh_update: bool,

    // --- 预分配缓冲区（避免每子步堆分配） ---

    /// 相对变换缓冲区（复用内存）
    relative_transform_buf: Vec<RigidTransform>,
}

impl ComplexColliders {
    /// 创建空控制器
    pub fn new(collision_range_id: CollisionRangeId) -> Self {
        Self {
            collision_range_id,
            sub_bones: SubBoneStore::new(),
            skinned_level_sets: Vec::new(),
            ml_level_sets: Vec::new(),
            skinned_triangle_meshes: Vec::new(),
            skip_skinned_triangle_mesh_update: false,
            relative_transform_buf: Vec::new(),
        }
    }

    #[inline]
    pub fn collision_range_id(&self) -> CollisionRangeId {
        self.collision_range_id
    }

    #[inline]
    pub fn sub_bones(&self) -> &SubBoneStore {
        &self.sub_bones
    }

    #[inline]
    pub fn skinned_level_sets(&self) -> &[SkinnedLevelSetProxy] {
        &self.skinned_level_sets
    }

    #[inline]
    pub fn ml_level_sets(&self) -> &[MlLevelSetProxy] {
        &self.ml_level_sets
    }

    #[inline]
    pub fn skinned_triangle_meshes(&self) -> &[SkinnedTriangleMeshProxy] {
        &self.skinned_triangle_meshes
    }

    /// 是否跳过三角网格的子步更新
    #[inline]
    pub fn skip_skinned_triangle_mesh_update(&self) -> bool {
        self.skip_skinned_triangle_mesh_update
    }

    /// 设置是否跳过三角网格的子步更新
    pub fn set_skip_skinned_triangle_mesh_update(&mut self, skip: bool) {
        self.skip_skinned_triangle_mesh_update = skip;
    }

    // ==================== 子骨骼管理 ====================

    /// 追加 count 个子骨骼，返回首个新条目的索引
    pub fn add_sub_bones(&mut self, count: usize) -> usize {
        self.sub_bones.add_sub_bones(count)
    }

    /// 按骨架骨骼索引批量追加子骨骼，返回首个新条目的索引
    pub fn add_sub_bone_indices(&mut self, bone_indices: &[i32]) -> usize {
        self.sub_bones.add_sub_bone_indices(bone_indices)
    }

    /// 设置子骨骼的骨架骨骼索引
    pub fn set_bone_index(&mut self, sub_bone: usize, bone_index: i32) {
        self.sub_bones.set_bone_index(sub_bone, bone_index);
    }

    /// 设置子骨骼的基础偏移变换
    pub fn set_base_transform(&mut self, sub_bone: usize, base_transform: RigidTransform) {
        self.sub_bones.set_base_transform(sub_bone, base_transform);
    }

    // ==================== 代理注册 ====================

    /// 注册蒙皮 levelset 代理
    pub fn add_skinned_level_set(
        &mut self,
        index: usize,
        mapped_sub_bones: Vec<usize>,
        geometry: Arc<dyn SkinnedLevelSetGeometry>,
    ) {
        self.check_mapped_sub_bones(&mapped_sub_bones);
        if mapped_sub_bones.is_empty() {
            log::warn!("[ClothCollider] 蒙皮 levelset 代理 {} 未映射任何子骨骼", index);
        }
        if get_config().debug_log {
            log::debug!(
                "[ClothCollider] 注册蒙皮 levelset 代理: index={}, 子骨骼数={}",
                index,
                mapped_sub_bones.len()
            );
        }
        self.skinned_level_sets
            .push(SkinnedLevelSetProxy::new(index, mapped_sub_bones, geometry));
    }

    /// 注册 ML levelset 代理
    pub fn add_ml_level_set(
        &mut self,
        index: usize,
        mapped_sub_bones: Vec<usize>,
        geometry: Arc<dyn MlLevelSetGeometry>,
    ) {
        self.check_mapped_sub_bones(&mapped_sub_bones);
        if mapped_sub_bones.is_empty() {
            log::warn!("[ClothCollider] ML levelset 代理 {} 未映射任何子骨骼", index);
        }
        if get_config().debug_log {
            log::debug!(
                "[ClothCollider] 注册 ML levelset 代理: index={}, 子骨骼数={}",
                index,
                mapped_sub_bones.len()
            );
        }
        self.ml_level_sets
            .push(MlLevelSetProxy::new(index, mapped_sub_bones, geometry));
    }

    /// 注册蒙皮三角网格代理
    ///
    /// 按几何的权重顶点数分配该代理的局部位置双缓冲与
    /// 求解器空间速度缓冲，局部位置以静止姿态初始化。
    pub fn add_skinned_triangle_mesh(
        &mut self,
        index: usize,
        mapped_sub_bones: Vec<usize>,
        geometry: Arc<dyn SkinnedTriangleMeshGeometry>,
    ) {
        self.check_mapped_sub_bones(&mapped_sub_bones);
        if mapped_sub_bones.is_empty() {
            log::warn!("[ClothCollider] 蒙皮三角网格代理 {} 未映射任何子骨骼", index);
        }
        if get_config().debug_log {
            log::debug!(
                "[ClothCollider] 注册蒙皮三角网格代理: index={}, 子骨骼数={}, 顶点数={}",
                index,
                mapped_sub_bones.len(),
                geometry.vertex_count()
            );
        }
        self.skinned_triangle_meshes
            .push(SkinnedTriangleMeshProxy::new(index, mapped_sub_bones, geometry));
    }

    /// 映射索引必须落在当前子骨骼存储范围内
    fn check_mapped_sub_bones(&self, mapped_sub_bones: &[usize]) {
        debug_assert!(
            mapped_sub_bones.iter().all(|&i| i < self.sub_bones.len()),
            "mapped sub-bone index out of range"
        );
    }

    // ==================== 每帧流程 ====================

    /// 整帧姿态更新
    ///
    /// 用最新骨架姿态重算全部子骨骼变换，随后对每个三角网格
    /// 代理求子骨骼相对根变换并蒙皮出新的局部顶点位置。
    /// collision_range_transforms 按代理 index 下标给出每范围根变换。
    pub fn update(
        &mut self,
        bone_transforms: &[RigidTransform],
        component_to_local: &RigidTransform,
        collision_range_transforms: &[RigidTransform],
    ) {
        self.sub_bones.update_pose(bone_transforms, component_to_local);

        let transforms = self.sub_bones.transforms();
        for proxy in &mut self.skinned_triangle_meshes {
            debug_assert!(
                proxy.index < collision_range_transforms.len(),
                "proxy index out of range"
            );
            let root = collision_range_transforms[proxy.index];
            Self::collect_relative_transforms(
                &mut self.relative_transform_buf,
                &root,
                &proxy.mapped_sub_bones,
                |i| transforms[i],
            );
            proxy
                .geometry
                .skin_positions(&self.relative_transform_buf, &mut proxy.positions);
        }
    }

    /// 以当前整帧姿态为新模拟帧的起点
    ///
    /// 每模拟帧（非子步）调用一次，须先于该帧首个 kinematic_update。
    pub fn reset_start_pose(&mut self) {
        self.sub_bones.reset_start_pose();
        for proxy in &mut self.skinned_triangle_meshes {
            proxy.reset_start_pose();
        }
    }

    /// 帧翻转双缓冲交换
    ///
    /// 重跑一帧时把上帧的新姿态当作下帧的旧姿态，指针交换无拷贝。
    pub fn swap_buffers_for_frame_flip(&mut self) {
        self.sub_bones.swap_buffers();
        for proxy in &mut self.skinned_triangle_meshes {
            proxy.swap_buffers();
        }
    }

    /// 子步运动学更新
    ///
    /// 推进子骨骼位置/速度/旋转/角速度到 alpha 处，再推送变形：
    /// levelset 类代理按子步位置/旋转相对实时粒子根变换变形并
    /// 重建空间层级；三角网格代理按 alpha 插值局部位置、变换到
    /// 求解器空间后更新包围盒与空间层级。
    ///
    /// particles 的范围标识必须与本控制器一致。
    pub fn kinematic_update(
        &mut self,
        particles: &dyn CollisionParticlesView,
        dt: f32,
        alpha: f32,
    ) {
        assert_eq!(
            particles.range_id(),
            self.collision_range_id,
            "collision particles range id mismatch"
        );

        self.sub_bones.kinematic_update(dt, alpha);

        let positions = self.sub_bones.positions();
        let rotations = self.sub_bones.rotations();

        for proxy in &self.skinned_level_sets {
            debug_assert!(particles.is_valid_index(proxy.index), "proxy index out of range");
            let root = RigidTransform::new(
                particles.position(proxy.index),
                particles.rotation(proxy.index),
            );
            Self::collect_relative_transforms(
                &mut self.relative_transform_buf,
                &root,
                &proxy.mapped_sub_bones,
                |i| RigidTransform::new(positions[i], rotations[i]),
            );
            proxy.geometry.deform_points(&self.relative_transform_buf);
            proxy.geometry.update_spatial_hierarchy();
        }

        for proxy in &self.ml_level_sets {
            debug_assert!(particles.is_valid_index(proxy.index), "proxy index out of range");
            let root = RigidTransform::new(
                particles.position(proxy.index),
                particles.rotation(proxy.index),
            );
            Self::collect_relative_transforms(
                &mut self.relative_transform_buf,
                &root,
                &proxy.mapped_sub_bones,
                |i| RigidTransform::new(positions[i], rotations[i]),
            );
            proxy.geometry.update_active_bones(&self.relative_transform_buf);
            proxy.geometry.update_spatial_hierarchy();
        }

        if !self.skip_skinned_triangle_mesh_update {
            for proxy in &mut self.skinned_triangle_meshes {
                debug_assert!(particles.is_valid_index(proxy.index), "proxy index out of range");
                let root = RigidTransform::new(
                    particles.position(proxy.index),
                    particles.rotation(proxy.index),
                );
                for vertex in 0..proxy.positions.len() {
                    let local = proxy.old_positions[vertex].lerp(proxy.positions[vertex], alpha);
                    proxy.solver_positions[vertex] = root.transform_point(local);
                }
                proxy
                    .geometry
                    .update_bounding_box(&proxy.solver_positions, &proxy.solver_space_velocities);
                proxy.geometry.update_spatial_hierarchy();
            }
        }
    }

    /// 模拟空间重定基
    ///
    /// 子骨骼的上一帧姿态重表达到新的局部空间并重推位置/旋转。
    /// 三角网格代理的求解器空间速度由粒子自身的新旧根变换与
    /// 新旧局部顶点位置直接重算（其速度定义在粒子系，与子骨骼
    /// 层级无关），旧根变换通过撤销重定基从实时粒子推回。
    pub fn apply_pre_simulation_transforms(
        &mut self,
        particles: &dyn CollisionParticlesView,
        pre_simulation_transform: &RigidTransform,
        delta_location: Vec3,
        dt: f32,
    ) {
        assert_eq!(
            particles.range_id(),
            self.collision_range_id,
            "collision particles range id mismatch"
        );
        debug_assert!(dt > 0.0, "dt must be positive");

        self.sub_bones
            .apply_pre_simulation_transforms(pre_simulation_transform, delta_location);

        let inverse_pre_sim = pre_simulation_transform.inverse();
        for proxy in &mut self.skinned_triangle_meshes {
            debug_assert!(particles.is_valid_index(proxy.index), "proxy index out of range");
            let new_frame = RigidTransform::new(
                particles.position(proxy.index),
                particles.rotation(proxy.index),
            );
            let old_frame = inverse_pre_sim
                * RigidTransform::new(new_frame.translation + delta_location, new_frame.rotation);
            for vertex in 0..proxy.positions.len() {
                let new_solver = new_frame.transform_point(proxy.positions[vertex]);
                let old_solver = old_frame.transform_point(proxy.old_positions[vertex]);
                proxy.solver_space_velocities[vertex] = (new_solver - old_solver) / dt;
            }
        }
    }

    /// 清空全部子骨骼与代理
    ///
    /// 代理集合整体重建，碰撞体集变化时由上层重新注册。
    pub fn reset(&mut self) {
        if get_config().debug_log {
            log::debug!(
                "[ClothCollider] 重置: {} 子骨骼, {} 蒙皮 levelset, {} ML levelset, {} 三角网格",
                self.sub_bones.len(),
                self.skinned_level_sets.len(),
                self.ml_level_sets.len(),
                self.skinned_triangle_meshes.len()
            );
        }
        self.sub_bones.reset();
        self.skinned_level_sets.clear();
        self.ml_level_sets.clear();
        self.skinned_triangle_meshes.clear();
        self.relative_transform_buf.clear();
    }

    // ==================== 骨骼数据提取 ====================

    /// 提取骨骼数据句柄
    ///
    /// 为每个蒙皮 levelset 代理插入一个句柄，键为
    /// (碰撞范围标识, 代理粒子索引)，句柄携带当前存储代数。
    pub fn extract_bone_data(&self, out: &mut BoneDataMap) {
        let generation = self.sub_bones.generation();
        for (slot, proxy) in self.skinned_level_sets.iter().enumerate() {
            out.insert(
                (self.collision_range_id, proxy.index),
                BoneDataHandle::new(slot, generation),
            );
        }
    }

    /// 解析骨骼数据句柄为零拷贝视图
    ///
    /// 句柄代数与存储当前代数不一致（提取之后发生过
    /// add_sub_bones / reset）时返回 StaleBoneData。
    pub fn resolve_bone_data(&self, handle: &BoneDataHandle) -> Result<ComplexColliderBoneData<'_>> {
        let current = self.sub_bones.generation();
        if handle.generation != current {
            return Err(ColliderError::StaleBoneData {
                taken: handle.generation,
                current,
            });
        }
        let proxy = self.skinned_level_sets.get(handle.slot).ok_or(
            ColliderError::BoneDataSlotOutOfRange {
                slot: handle.slot,
                count: self.skinned_level_sets.len(),
            },
        )?;
        Ok(ComplexColliderBoneData {
            mapped_sub_bones: &proxy.mapped_sub_bones,
            positions: self.sub_bones.positions(),
            velocities: self.sub_bones.velocities(),
            rotations: self.sub_bones.rotations(),
            angular_velocities: self.sub_bones.angular_velocities(),
        })
    }

    /// 收集 mapped 子骨骼的相对根变换（root⁻¹ * 子骨骼），写入复用缓冲
    fn collect_relative_transforms(
        buf: &mut Vec<RigidTransform>,
        root: &RigidTransform,
        mapped_sub_bones: &[usize],
        sub_bone_transform: impl Fn(usize) -> RigidTransform,
    ) {
        buf.clear();
        buf.reserve(mapped_sub_bones.len());
        let root_inverse = root.inverse();
        for &sub_bone in mapped_sub_bones {
            buf.push(root_inverse * sub_bone_transform(sub_bone));
        }
    }
}
