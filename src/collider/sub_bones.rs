//! 子骨骼存储
//!
//! 按索引对齐的 SoA 布局，保存碰撞专用辅助骨骼的绑定关系、
//! 整帧双缓冲姿态和子步插值运动学状态（位置/速度/旋转/角速度）。

use glam::{Quat, Vec3};

use crate::transform::{angular_velocity, RigidTransform};

use super::config::get_config;

/// 子骨骼存储（SoA，索引对齐）
///
/// 所有数组长度始终一致。改变数量的操作（add_sub_bones / reset）
/// 会递增 generation，使之前提取的骨骼数据句柄失效。
#[derive(Debug, Clone, Default)]
pub struct SubBoneStore {
    /// 外部骨架骨骼索引（负数或越界视为未匹配）
    bone_indices: Vec<i32>,
    /// 基础偏移变换（叠加在匹配骨骼之上）
    base_transforms: Vec<RigidTransform>,
    /// 上一整帧姿态
    old_transforms: Vec<RigidTransform>,
    /// 当前整帧姿态
    transforms: Vec<RigidTransform>,
    /// 子步插值位置
    positions: Vec<Vec3>,
    /// 子步线速度
    velocities: Vec<Vec3>,
    /// 子步插值旋转
    rotations: Vec<Quat>,
    /// 子步角速度
    angular_velocities: Vec<Vec3>,
    /// 数量变更代数
    generation: u64,
}

impl SubBoneStore {
    /// 创建空存储
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bone_indices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bone_indices.is_empty()
    }

    /// 当前数量变更代数
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[inline]
    pub fn bone_indices(&self) -> &[i32] {
        &self.bone_indices
    }

    #[inline]
    pub fn base_transforms(&self) -> &[RigidTransform] {
        &self.base_transforms
    }

    #[inline]
    pub fn old_transforms(&self) -> &[RigidTransform] {
        &self.old_transforms
    }

    #[inline]
    pub fn transforms(&self) -> &[RigidTransform] {
        &self.transforms
    }

    #[inline]
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    #[inline]
    pub fn velocities(&self) -> &[Vec3] {
        &self.velocities
    }

    #[inline]
    pub fn rotations(&self) -> &[Quat] {
        &self.rotations
    }

    #[inline]
    pub fn angular_velocities(&self) -> &[Vec3] {
        &self.angular_velocities
    }

    /// 清空全部子骨骼
    pub fn reset(&mut self) {
        self.bone_indices.clear();
        self.base_transforms.clear();
        self.old_transforms.clear();
        self.transforms.clear();
        self.positions.clear();
        self.velocities.clear();
        self.rotations.clear();
        self.angular_velocities.clear();
        self.generation += 1;
    }

    /// 追加 count 个子骨骼，返回首个新条目的索引
    ///
    /// 新条目零值/恒等初始化，骨骼索引为 -1（未匹配）。
    /// count 为 0 时不改变任何状态，代数保持不变。
    pub fn add_sub_bones(&mut self, count: usize) -> usize {
        let offset = self.bone_indices.len();
        if count == 0 {
            return offset;
        }

        let new_len = offset + count;
        self.bone_indices.resize(new_len, -1);
        self.base_transforms.resize(new_len, RigidTransform::IDENTITY);
        self.old_transforms.resize(new_len, RigidTransform::IDENTITY);
        self.transforms.resize(new_len, RigidTransform::IDENTITY);
        self.positions.resize(new_len, Vec3::ZERO);
        self.velocities.resize(new_len, Vec3::ZERO);
        self.rotations.resize(new_len, Quat::IDENTITY);
        self.angular_velocities.resize(new_len, Vec3::ZERO);
        self.generation += 1;
        offset
    }

    /// 按骨架骨骼索引批量追加子骨骼，返回首个新条目的索引
    pub fn add_sub_bone_indices(&mut self, bone_indices: &[i32]) -> usize {
        let offset = self.add_sub_bones(bone_indices.len());
        self.bone_indices[offset..].copy_from_slice(bone_indices);
        offset
    }

    /// 设置子骨骼的骨架骨骼索引
    pub fn set_bone_index(&mut self, sub_bone: usize, bone_index: i32) {
        self.bone_indices[sub_bone] = bone_index;
    }

    /// 设置子骨骼的基础偏移变换
    pub fn set_base_transform(&mut self, sub_bone: usize, base_transform: RigidTransform) {
        self.base_transforms[sub_bone] = base_transform;
    }

    /// 从整帧骨架姿态重算全部子骨骼变换
    ///
    /// 匹配的子骨骼：transform = component_to_local * 骨架骨骼 * 基础偏移。
    /// 骨骼索引未匹配（负数或越界）时静默回退为
    /// component_to_local * 基础偏移，部分绑定的骨架照常降级运行。
    pub fn update_pose(
        &mut self,
        bone_transforms: &[RigidTransform],
        component_to_local: &RigidTransform,
    ) {
        let mut unmatched = 0usize;
        for i in 0..self.bone_indices.len() {
            let bone_index = self.bone_indices[i];
            let matched =
                bone_index >= 0 && (bone_index as usize) < bone_transforms.len();
            self.transforms[i] = if matched {
                *component_to_local
                    * bone_transforms[bone_index as usize]
                    * self.base_transforms[i]
            } else {
                unmatched += 1;
                *component_to_local * self.base_transforms[i]
            };
        }

        if unmatched > 0 && get_config().log_unmatched_bones {
            log::debug!(
                "[ClothCollider] 姿态更新: {} 个子骨骼未匹配到骨架骨骼，使用基础偏移回退",
                unmatched
            );
        }
    }

    /// 以当前整帧姿态为新模拟帧的起点
    ///
    /// 当前姿态复制到上一帧缓冲，位置/旋转取自当前姿态，速度清零。
    pub fn reset_start_pose(&mut self) {
        self.old_transforms.copy_from_slice(&self.transforms);
        for i in 0..self.transforms.len() {
            self.positions[i] = self.transforms[i].translation;
            self.rotations[i] = self.transforms[i].rotation;
        }
        self.velocities.fill(Vec3::ZERO);
        self.angular_velocities.fill(Vec3::ZERO);
    }

    /// 交换整帧双缓冲（指针交换，无拷贝）
    pub fn swap_buffers(&mut self) {
        std::mem::swap(&mut self.old_transforms, &mut self.transforms);
    }

    /// 子步运动学更新
    ///
    /// 在上一帧与当前帧姿态之间按 alpha 插值得到新的位置/旋转。
    /// 速度相对上一次子步采样差分，得到的是子步速度而非整帧平均速度；
    /// 角速度取两次子步旋转之差的最短弧轴角除以 dt。
    pub fn kinematic_update(&mut self, dt: f32, alpha: f32) {
        debug_assert!(dt > 0.0, "dt must be positive");
        debug_assert!((0.0..=1.0).contains(&alpha), "alpha must be in [0, 1]");

        for i in 0..self.transforms.len() {
            let new_position = self.old_transforms[i]
                .translation
                .lerp(self.transforms[i].translation, alpha);
            self.velocities[i] = (new_position - self.positions[i]) / dt;
            self.positions[i] = new_position;

            let new_rotation = self.old_transforms[i]
                .rotation
                .slerp(self.transforms[i].rotation, alpha);
            self.angular_velocities[i] = angular_velocity(self.rotations[i], new_rotation, dt);
            self.rotations[i] = new_rotation;
        }
    }

    /// 模拟空间重定基时重表达上一帧姿态
    ///
    /// old = pre_simulation_transform * old，平移再减去 delta_location，
    /// 位置/旋转从重定基后的 old 重新推导。速度保持不变。
    pub fn apply_pre_simulation_transforms(
        &mut self,
        pre_simulation_transform: &RigidTransform,
        delta_location: Vec3,
    ) {
        for i in 0..self.old_transforms.len() {
            let mut old = *pre_simulation_transform * self.old_transforms[i];
            old.translation -= delta_location;
            self.old_transforms[i] = old;
            self.positions[i] = old.translation;
            self.rotations[i] = old.rotation;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn translation(x: f32, y: f32, z: f32) -> RigidTransform {
        RigidTransform::from_translation(Vec3::new(x, y, z))
    }

    #[test]
    fn test_array_alignment() {
        let mut store = SubBoneStore::new();
        store.add_sub_bones(2);
        store.add_sub_bone_indices(&[3, 4, 5]);

        assert_eq!(store.len(), 5);
        assert_eq!(store.bone_indices().len(), 5);
        assert_eq!(store.base_transforms().len(), 5);
        assert_eq!(store.old_transforms().len(), 5);
        assert_eq!(store.transforms().len(), 5);
        assert_eq!(store.positions().len(), 5);
        assert_eq!(store.velocities().len(), 5);
        assert_eq!(store.rotations().len(), 5);
        assert_eq!(store.angular_velocities().len(), 5);
    }

    #[test]
    fn test_reset_idempotence() {
        let mut store = SubBoneStore::new();
        store.add_sub_bone_indices(&[0, 1]);

        store.reset();
        assert!(store.is_empty());
        assert_eq!(store.transforms().len(), 0);

        store.reset();
        assert!(store.is_empty());
        assert_eq!(store.transforms().len(), 0);
    }

    #[test]
    fn test_add_returns_offsets() {
        let mut store = SubBoneStore::new();
        assert_eq!(store.add_sub_bone_indices(&[5, 6]), 0);
        assert_eq!(store.add_sub_bone_indices(&[7]), 2);
        assert_eq!(store.len(), 3);
        assert_eq!(store.bone_indices(), &[5, 6, 7]);
    }

    #[test]
    fn test_generation_tracking() {
        let mut store = SubBoneStore::new();
        let initial = store.generation();

        // 零增量不改变状态，代数不变
        store.add_sub_bones(0);
        assert_eq!(store.generation(), initial);

        store.add_sub_bones(1);
        assert!(store.generation() > initial);

        let before_reset = store.generation();
        store.reset();
        assert!(store.generation() > before_reset);
    }

    #[test]
    fn test_update_pose_matched_and_fallback() {
        let mut store = SubBoneStore::new();
        store.add_sub_bone_indices(&[0, 7, -1]);
        store.set_base_transform(0, translation(0.0, 1.0, 0.0));
        store.set_base_transform(1, translation(0.0, 1.0, 0.0));

        let bones = [translation(0.0, 0.0, 2.0)];
        let component_to_local = translation(1.0, 0.0, 0.0);
        store.update_pose(&bones, &component_to_local);

        // 匹配: component_to_local * 骨骼 * 基础偏移
        let expected_matched = component_to_local * bones[0] * translation(0.0, 1.0, 0.0);
        assert_eq!(store.transforms()[0], expected_matched);
        assert_eq!(store.transforms()[0].translation, Vec3::new(1.0, 1.0, 2.0));

        // 越界与负索引都回退为 component_to_local * 基础偏移，无骨架贡献
        let expected_fallback = component_to_local * translation(0.0, 1.0, 0.0);
        assert_eq!(store.transforms()[1], expected_fallback);
        assert_eq!(store.transforms()[2], component_to_local);
    }

    #[test]
    fn test_update_pose_empty_bone_array() {
        let mut store = SubBoneStore::new();
        store.add_sub_bones(1);

        store.update_pose(&[], &translation(1.0, 0.0, 0.0));
        assert_eq!(store.transforms()[0].translation, Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_interpolation_boundaries() {
        let mut store = SubBoneStore::new();
        store.add_sub_bone_indices(&[0]);

        store.update_pose(&[translation(0.0, 0.0, 1.0)], &RigidTransform::IDENTITY);
        store.reset_start_pose();
        store.update_pose(&[translation(0.0, 0.0, 3.0)], &RigidTransform::IDENTITY);

        store.kinematic_update(1.0 / 60.0, 0.0);
        assert!((store.positions()[0] - store.old_transforms()[0].translation).length() < 1e-6);

        store.kinematic_update(1.0 / 60.0, 1.0);
        assert!((store.positions()[0] - store.transforms()[0].translation).length() < 1e-6);
    }

    #[test]
    fn test_substep_velocity() {
        let mut store = SubBoneStore::new();
        store.add_sub_bone_indices(&[0]);
        let d = 0.6;
        let dt = 0.1;

        store.update_pose(&[RigidTransform::IDENTITY], &RigidTransform::IDENTITY);
        store.reset_start_pose();
        store.update_pose(&[translation(0.0, 0.0, d)], &RigidTransform::IDENTITY);

        // 第一次子步停在帧起点，速度为零
        store.kinematic_update(dt, 0.0);
        assert!(store.velocities()[0].length() < 1e-6);

        // 第二次子步相对上一次采样差分，速度为 d/dt 而非整帧平均
        store.kinematic_update(dt, 1.0);
        assert!((store.velocities()[0] - Vec3::new(0.0, 0.0, d / dt)).length() < 1e-4);
    }

    #[test]
    fn test_angular_velocity_quarter_turn() {
        let mut store = SubBoneStore::new();
        store.add_sub_bone_indices(&[0]);

        store.update_pose(&[RigidTransform::IDENTITY], &RigidTransform::IDENTITY);
        store.reset_start_pose();
        store.update_pose(
            &[RigidTransform::from_rotation(Quat::from_rotation_z(FRAC_PI_2))],
            &RigidTransform::IDENTITY,
        );

        store.kinematic_update(1.0, 1.0);
        assert!((store.angular_velocities()[0] - Vec3::new(0.0, 0.0, FRAC_PI_2)).length() < 1e-4);
    }

    #[test]
    fn test_swap_buffers_roundtrip() {
        let mut store = SubBoneStore::new();
        store.add_sub_bone_indices(&[0]);

        store.update_pose(&[translation(1.0, 0.0, 0.0)], &RigidTransform::IDENTITY);
        store.reset_start_pose();
        store.update_pose(&[translation(2.0, 0.0, 0.0)], &RigidTransform::IDENTITY);

        let old_before = store.old_transforms().to_vec();
        let new_before = store.transforms().to_vec();

        store.swap_buffers();
        assert_eq!(store.old_transforms(), &new_before[..]);
        assert_eq!(store.transforms(), &old_before[..]);

        store.swap_buffers();
        assert_eq!(store.old_transforms(), &old_before[..]);
        assert_eq!(store.transforms(), &new_before[..]);
    }

    #[test]
    fn test_apply_pre_simulation_transforms() {
        let mut store = SubBoneStore::new();
        store.add_sub_bone_indices(&[0]);

        store.update_pose(&[translation(1.0, 0.0, 0.0)], &RigidTransform::IDENTITY);
        store.reset_start_pose();

        let pre_sim = RigidTransform::new(
            Vec3::new(0.0, 2.0, 0.0),
            Quat::from_rotation_z(FRAC_PI_2),
        );
        store.apply_pre_simulation_transforms(&pre_sim, Vec3::new(0.0, 0.0, 3.0));

        // pre_sim * (1,0,0) = (0,3,0)，再减去 delta_location
        assert!((store.old_transforms()[0].translation - Vec3::new(0.0, 3.0, -3.0)).length() < 1e-5);
        assert!((store.positions()[0] - Vec3::new(0.0, 3.0, -3.0)).length() < 1e-5);
        assert!(store.rotations()[0].dot(pre_sim.rotation).abs() > 1.0 - 1e-5);
    }

    #[test]
    fn test_reset_start_pose_zeroes_velocities() {
        let mut store = SubBoneStore::new();
        store.add_sub_bone_indices(&[0]);

        store.update_pose(&[RigidTransform::IDENTITY], &RigidTransform::IDENTITY);
        store.reset_start_pose();
        store.update_pose(
            &[RigidTransform::new(
                Vec3::new(0.0, 0.0, 1.0),
                Quat::from_rotation_z(FRAC_PI_2),
            )],
            &RigidTransform::IDENTITY,
        );
        store.kinematic_update(0.1, 1.0);
        assert!(store.velocities()[0].length() > 0.0);
        assert!(store.angular_velocities()[0].length() > 0.0);

        store.reset_start_pose();
        assert_eq!(store.velocities()[0], Vec3::ZERO);
        assert_eq!(store.angular_velocities()[0], Vec3::ZERO);
        assert_eq!(store.old_transforms()[0], store.transforms()[0]);
        assert_eq!(store.positions()[0], store.transforms()[0].translation);
    }
}
