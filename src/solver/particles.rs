//! 碰撞粒子范围接口
//!
//! 外部粒子求解器按范围管理碰撞粒子，本子系统只读取范围标识
//! 与每粒子的实时位置/旋转作为代理根变换来源。

use std::fmt;

use glam::{Quat, Vec3};

/// 碰撞范围标识
///
/// 由外部求解器在构造时分配，之后不可变。作为独立类型出现在
/// API 边界上，编译期就排除把别的范围的粒子传进来的调用错误。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CollisionRangeId(pub u32);

impl fmt::Display for CollisionRangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 碰撞粒子只读视图
pub trait CollisionParticlesView {
    /// 所属碰撞范围标识
    fn range_id(&self) -> CollisionRangeId;

    /// 粒子索引是否有效
    fn is_valid_index(&self, index: usize) -> bool;

    /// 粒子实时位置
    fn position(&self, index: usize) -> Vec3;

    /// 粒子实时旋转
    fn rotation(&self, index: usize) -> Quat;
}

/// 碰撞粒子范围（SoA 具体实现，供宿主与测试使用）
#[derive(Debug, Clone)]
pub struct CollisionParticlesRange {
    range_id: CollisionRangeId,
    positions: Vec<Vec3>,
    rotations: Vec<Quat>,
}

impl CollisionParticlesRange {
    /// 创建 count 个恒等状态的粒子
    pub fn new(range_id: CollisionRangeId, count: usize) -> Self {
        Self {
            range_id,
            positions: vec![Vec3::ZERO; count],
            rotations: vec![Quat::IDENTITY; count],
        }
    }

    /// 设置单个粒子的位置与旋转
    pub fn set_particle(&mut self, index: usize, position: Vec3, rotation: Quat) {
        self.positions[index] = position;
        self.rotations[index] = rotation;
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

impl CollisionParticlesView for CollisionParticlesRange {
    fn range_id(&self) -> CollisionRangeId {
        self.range_id
    }

    fn is_valid_index(&self, index: usize) -> bool {
        index < self.positions.len()
    }

    fn position(&self, index: usize) -> Vec3 {
        self.positions[index]
    }

    fn rotation(&self, index: usize) -> Quat {
        self.rotations[index]
    }
}
