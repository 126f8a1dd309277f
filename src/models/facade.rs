use serde::{Deserialize, Serialize};

use crate::models::{
    common::Point3D,
    traits::IObstacle,
};

/// 風を遮る矩形ファサード
///
/// 原点（左下隅）から幅・高さ分だけXY平面に広がる軸平行矩形で、
/// 高さ方向は `origin.z` に固定されます。生成後は変更されません。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Facade {
    /// 左下隅
    pub origin: Point3D,
    /// X方向の幅
    pub width: f64,
    /// Y方向の高さ
    pub height: f64,
}

impl Facade {
    pub fn new(origin: Point3D, width: f64, height: f64) -> Self {
        Self { origin, width, height }
    }

    /// 矩形の4隅（原点から反時計回り）
    pub fn corners(&self) -> [Point3D; 4] {
        let o = self.origin;
        [
            o,
            Point3D::new(o.x + self.width, o.y, o.z),
            Point3D::new(o.x + self.width, o.y + self.height, o.z),
            Point3D::new(o.x, o.y + self.height, o.z),
        ]
    }
}

impl Default for Facade {
    fn default() -> Self {
        Self::new(Point3D::new(-5.0, -5.0, 0.0), 15.0, 10.0)
    }
}

impl IObstacle for Facade {
    /// 軸ごとのクランプによる射影
    ///
    /// 点が矩形内部にある場合は点自身（z = origin.z）を返します。
    fn closest_point(&self, point: &Point3D) -> Point3D {
        Point3D::new(
            point.x.max(self.origin.x).min(self.origin.x + self.width),
            point.y.max(self.origin.y).min(self.origin.y + self.height),
            self.origin.z,
        )
    }
}
