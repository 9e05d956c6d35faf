//! 碰撞体运动学配置
//!
//! 所有参数扁平化，直接在代码中修改默认值即可。

use once_cell::sync::Lazy;
use std::sync::RwLock;

/// 运动学配置（扁平化，不嵌套）
#[derive(Debug, Clone)]
pub struct ColliderConfig {
    // ========== 调试 ==========
    /// 是否输出调试日志，默认 false
    pub debug_log: bool,
    /// 是否记录姿态更新中未匹配的子骨骼数量，默认 false
    pub log_unmatched_bones: bool,

    // ========== 蒙皮 ==========
    /// 顶点数达到该阈值时参考网格蒙皮走并行路径，默认 1024
    /// 低于阈值时并行调度开销大于收益
    pub parallel_skinning_threshold: usize,

    // ========== 包围盒 ==========
    /// 包围盒速度外扩时间窗（秒），默认 1/60
    /// 按该时间窗内的预估位移外扩包围盒，0 关闭外扩
    pub bounds_velocity_margin: f32,
}

impl Default for ColliderConfig {
    fn default() -> Self {
        Self {
            // ====== 调试 ======
            debug_log: false,
            log_unmatched_bones: false,

            // ====== 蒙皮 ======
            parallel_skinning_threshold: 1024,

            // ====== 包围盒 ======
            // 约一帧的位移量
            bounds_velocity_margin: 1.0 / 60.0,
        }
    }
}

/// 全局配置实例
static COLLIDER_CONFIG: Lazy<RwLock<ColliderConfig>> = Lazy::new(|| {
    RwLock::new(ColliderConfig::default())
});

/// 获取当前配置（只读）
pub fn get_config() -> ColliderConfig {
    COLLIDER_CONFIG.read().unwrap_or_else(|e| e.into_inner()).clone()
}

/// 手动设置配置（用于运行时调试）
pub fn set_config(config: ColliderConfig) {
    *COLLIDER_CONFIG.write().unwrap_or_else(|e| e.into_inner()) = config;
}

/// 重置为默认配置
pub fn reset_config() {
    *COLLIDER_CONFIG.write().unwrap_or_else(|e| e.into_inner()) = ColliderConfig::default();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_roundtrip() {
        assert!(!get_config().debug_log);
        assert_eq!(get_config().parallel_skinning_threshold, 1024);

        set_config(ColliderConfig {
            debug_log: true,
            log_unmatched_bones: true,
            ..Default::default()
        });
        assert!(get_config().debug_log);
        assert!(get_config().log_unmatched_bones);

        reset_config();
        assert!(!get_config().debug_log);
        assert!(!get_config().log_unmatched_bones);
    }
}
