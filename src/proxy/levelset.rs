//! Levelset 碰撞代理记录

use std::sync::Arc;

use super::geometry::{MlLevelSetGeometry, SkinnedLevelSetGeometry};

/// 蒙皮 levelset 代理
///
/// index 是外部碰撞粒子范围中的槽位，mapped_sub_bones 是驱动
/// 该几何变形的子骨骼在共享存储中的索引列表。
pub struct SkinnedLevelSetProxy {
    pub(crate) index: usize,
    pub(crate) mapped_sub_bones: Vec<usize>,
    pub(crate) geometry: Arc<dyn SkinnedLevelSetGeometry>,
}

impl SkinnedLevelSetProxy {
    pub(crate) fn new(
        index: usize,
        mapped_sub_bones: Vec<usize>,
        geometry: Arc<dyn SkinnedLevelSetGeometry>,
    ) -> Self {
        Self {
            index,
            mapped_sub_bones,
            geometry,
        }
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
    pub fn geometry(&self) -> &Arc<dyn SkinnedLevelSetGeometry> {
        &self.geometry
    }
}

/// ML levelset 代理
pub struct MlLevelSetProxy {
    pub(crate) index: usize,
    pub(crate) mapped_sub_bones: Vec<usize>,
    pub(crate) geometry: Arc<dyn MlLevelSetGeometry>,
}

impl MlLevelSetProxy {
    pub(crate) fn new(
        index: usize,
        mapped_sub_bones: Vec<usize>,
        geometry: Arc<dyn MlLevelSetGeometry>,
    ) -> Self {
        Self {
            index,
            mapped_sub_bones,
            geometry,
        }
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
    pub fn geometry(&self) -> &Arc<dyn MlLevelSetGeometry> {
        &self.geometry
    }
}
