//! 刚体变换
//!
//! 平移 + 旋转（无缩放），碰撞体运动学的基础数学类型。
//! 组合约定与矩阵一致：`a * b` 先应用 `b` 再应用 `a`。

use glam::{Quat, Vec3};

/// 刚体变换（平移 + 旋转）
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RigidTransform {
    /// 平移
    pub translation: Vec3,
    /// 旋转（单位四元数）
    pub rotation: Quat,
}

impl Default for RigidTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl RigidTransform {
    /// 恒等变换
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    /// 从平移和旋转创建
    #[inline]
    pub fn new(translation: Vec3, rotation: Quat) -> Self {
        Self { translation, rotation }
    }

    /// 纯平移变换
    #[inline]
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            rotation: Quat::IDENTITY,
        }
    }

    /// 纯旋转变换
    #[inline]
    pub fn from_rotation(rotation: Quat) -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation,
        }
    }

    /// 逆变换
    #[inline]
    pub fn inverse(&self) -> Self {
        let inv_rotation = self.rotation.inverse();
        Self {
            translation: -(inv_rotation * self.translation),
            rotation: inv_rotation,
        }
    }

    /// 变换一个点
    #[inline]
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.rotation * point + self.translation
    }

    /// 两个变换之间插值（平移线性插值，旋转 SLERP）
    #[inline]
    pub fn interpolate(old: &Self, new: &Self, alpha: f32) -> Self {
        Self {
            translation: old.translation.lerp(new.translation, alpha),
            rotation: old.rotation.slerp(new.rotation, alpha),
        }
    }
}

impl std::ops::Mul for RigidTransform {
    type Output = Self;

    /// 组合两个变换，先应用 `rhs` 再应用 `self`
    #[inline]
    fn mul(self, rhs: Self) -> Self {
        Self {
            translation: self.rotation * rhs.translation + self.translation,
            rotation: self.rotation * rhs.rotation,
        }
    }
}

/// 从两帧旋转提取角速度（轴角形式）
///
/// delta = next * prev⁻¹，w < 0 时取反保证最短弧，角度除以 dt。
pub fn angular_velocity(prev: Quat, next: Quat, dt: f32) -> Vec3 {
    let mut delta = next * prev.inverse();
    if delta.w < 0.0 {
        delta = -delta;
    }
    let (axis, angle) = delta.to_axis_angle();
    axis * (angle / dt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_mul_applies_rhs_first() {
        let a = RigidTransform::from_translation(Vec3::new(1.0, 0.0, 0.0));
        let b = RigidTransform::from_rotation(Quat::from_rotation_z(FRAC_PI_2));
        let point = Vec3::new(1.0, 0.0, 0.0);

        let composed = (a * b).transform_point(point);
        let nested = a.transform_point(b.transform_point(point));

        assert!((composed - nested).length() < 1e-6);
        assert!((composed - Vec3::new(1.0, 1.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_inverse_roundtrip() {
        let transform = RigidTransform::new(
            Vec3::new(1.0, 2.0, 3.0),
            Quat::from_axis_angle(Vec3::new(1.0, 2.0, 0.5).normalize(), 0.7),
        );
        let point = Vec3::new(0.3, -1.0, 2.0);

        let roundtrip = transform
            .inverse()
            .transform_point(transform.transform_point(point));
        assert!((roundtrip - point).length() < 1e-5);

        let identity = transform.inverse() * transform;
        assert!(identity.translation.length() < 1e-5);
        assert!(identity.rotation.dot(Quat::IDENTITY).abs() > 1.0 - 1e-5);
    }

    #[test]
    fn test_interpolate_endpoints() {
        let old = RigidTransform::from_translation(Vec3::new(0.0, 1.0, 0.0));
        let new = RigidTransform::new(
            Vec3::new(2.0, 1.0, 0.0),
            Quat::from_rotation_z(FRAC_PI_2),
        );

        let at_zero = RigidTransform::interpolate(&old, &new, 0.0);
        assert!((at_zero.translation - old.translation).length() < 1e-6);
        assert!(at_zero.rotation.dot(old.rotation).abs() > 1.0 - 1e-6);

        let at_one = RigidTransform::interpolate(&old, &new, 1.0);
        assert!((at_one.translation - new.translation).length() < 1e-6);
        assert!(at_one.rotation.dot(new.rotation).abs() > 1.0 - 1e-6);
    }

    #[test]
    fn test_interpolate_midpoint_rotation() {
        let old = RigidTransform::IDENTITY;
        let new = RigidTransform::from_rotation(Quat::from_rotation_z(FRAC_PI_2));

        let mid = RigidTransform::interpolate(&old, &new, 0.5);
        let rotated = mid.transform_point(Vec3::new(1.0, 0.0, 0.0));
        let sqrt_half = 0.5_f32.sqrt();
        assert!((rotated - Vec3::new(sqrt_half, sqrt_half, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_angular_velocity_quarter_turn() {
        let w = angular_velocity(Quat::IDENTITY, Quat::from_rotation_z(FRAC_PI_2), 1.0);
        assert!((w - Vec3::new(0.0, 0.0, FRAC_PI_2)).length() < 1e-5);

        // dt 减半，角速度翻倍
        let w_fast = angular_velocity(Quat::IDENTITY, Quat::from_rotation_z(FRAC_PI_2), 0.5);
        assert!((w_fast - Vec3::new(0.0, 0.0, PI)).length() < 1e-5);
    }

    #[test]
    fn test_angular_velocity_shortest_arc() {
        // 270° 正向等价于 90° 反向，取最短弧
        let w = angular_velocity(Quat::IDENTITY, Quat::from_rotation_z(1.5 * PI), 1.0);
        assert!((w - Vec3::new(0.0, 0.0, -FRAC_PI_2)).length() < 1e-4);
    }

    #[test]
    fn test_angular_velocity_no_rotation() {
        let rotation = Quat::from_rotation_z(0.5);
        let w = angular_velocity(rotation, rotation, 1.0 / 60.0);
        assert!(w.length() < 1e-4);
    }
}
