//! 骨骼数据提取类型
//!
//! 把子骨骼运动学数组打包成外部约束求解器可按
//! (碰撞范围标识, 代理粒子索引) 查找的结构。句柄只携带代理槽位
//! 与提取时的存储代数，数量变更后解析会明确失败，而不是读到
//! 已重分配的数组。

use std::collections::HashMap;

use glam::{Quat, Vec3};

use super::particles::CollisionRangeId;

/// 骨骼数据查询表，键为 (碰撞范围标识, 代理粒子索引)
pub type BoneDataMap = HashMap<(CollisionRangeId, usize), BoneDataHandle>;

/// 骨骼数据句柄
///
/// 通过 ComplexColliders::resolve_bone_data 换取实际视图。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoneDataHandle {
    pub(crate) slot: usize,
    pub(crate) generation: u64,
}

impl BoneDataHandle {
    pub(crate) fn new(slot: usize, generation: u64) -> Self {
        Self { slot, generation }
    }

    /// 代理槽位（按蒙皮 levelset 注册顺序）
    #[inline]
    pub fn slot(&self) -> usize {
        self.slot
    }

    /// 提取时的存储代数
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// 子骨骼运动学数据视图（零拷贝，借用存储的实时数组）
#[derive(Debug, Clone, Copy)]
pub struct ComplexColliderBoneData<'a> {
    /// 驱动该代理的子骨骼索引列表
    pub mapped_sub_bones: &'a [usize],
    /// 子步插值位置
    pub positions: &'a [Vec3],
    /// 子步线速度
    pub velocities: &'a [Vec3],
    /// 子步插值旋转
    pub rotations: &'a [Quat],
    /// 子步角速度
    pub angular_velocities: &'a [Vec3],
}
