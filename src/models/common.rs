use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul, Sub};

/// 回避時の押し出し係数
pub const AVOID_PUSH_FACTOR: f64 = 0.5;
/// 回避時にファサードから離れる方向へ加える速度成分
pub const AVOID_OUTWARD_SPEED: f64 = 0.1;
/// 右方向ドリフトの下限（velocity.x が負になったときに設定する値）
pub const DRIFT_FLOOR_X: f64 = 0.1;
/// 誘引時の慣性ブレンド率
pub const ATTRACT_INERTIA: f64 = 0.9;

/// 3次元座標を表す構造体
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3D {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// 3次元ユークリッド距離
    pub fn distance_to(&self, other: &Point3D) -> f64 {
        (*self - *other).length()
    }
}

impl Add<Vector3D> for Point3D {
    type Output = Self;

    fn add(self, v: Vector3D) -> Self::Output {
        Self::new(self.x + v.x, self.y + v.y, self.z + v.z)
    }
}

impl AddAssign<Vector3D> for Point3D {
    fn add_assign(&mut self, v: Vector3D) {
        *self = *self + v;
    }
}

impl Sub for Point3D {
    type Output = Vector3D;

    fn sub(self, other: Self) -> Self::Output {
        Vector3D::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

/// 3次元ベクトル（速度・方向）
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3D {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// ベクトルの長さ
    pub fn length(&self) -> f64 {
        (self.x.powi(2) + self.y.powi(2) + self.z.powi(2)).sqrt()
    }

    /// 単位ベクトル化
    ///
    /// 長さが0（または非有限）の場合は `GeometryError::DegenerateVector` を返します。
    /// 呼び出し側はそのフレームの操舵を省略して回復します。
    pub fn try_normalize(&self) -> Result<Self, GeometryError> {
        let len = self.length();
        if len > 0.0 && len.is_finite() {
            Ok(Self::new(self.x / len, self.y / len, self.z / len))
        } else {
            Err(GeometryError::DegenerateVector)
        }
    }

    /// XY平面上で90度回転させた接線方向（z成分は0）
    pub fn perpendicular_xy(&self) -> Self {
        Self::new(-self.y, self.x, 0.0)
    }
}

impl Add for Vector3D {
    type Output = Self;

    fn add(self, other: Self) -> Self::Output {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl Mul<f64> for Vector3D {
    type Output = Self;

    fn mul(self, scalar: f64) -> Self::Output {
        Self::new(self.x * scalar, self.y * scalar, self.z * scalar)
    }
}

/// シミュレーション領域
///
/// `min.x <= max.x` かつ `min.y <= max.y`（XY方向の端点・幅は有限）が不変条件です。
/// z方向は制約しません。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Point3D,
    pub max: Point3D,
}

impl BoundingBox {
    pub const fn new(min: Point3D, max: Point3D) -> Self {
        Self { min, max }
    }

    /// XY方向の不変条件を満たしているか
    ///
    /// 端点と幅がすべて有限であることも要求します。
    /// 幅が f64 で表せない領域では粒子の生成位置を決められません。
    pub fn is_well_formed(&self) -> bool {
        let ends = [self.min.x, self.max.x, self.min.y, self.max.y];
        ends.iter().all(|v| v.is_finite())
            && (self.max.x - self.min.x).is_finite()
            && (self.max.y - self.min.y).is_finite()
            && self.min.x <= self.max.x
            && self.min.y <= self.max.y
    }

    pub fn contains_xy(&self, p: &Point3D) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// XY方向のみ領域内にクランプ
    pub fn clamp_xy(&self, p: Point3D) -> Point3D {
        Point3D::new(
            p.x.max(self.min.x).min(self.max.x),
            p.y.max(self.min.y).min(self.max.y),
            p.z,
        )
    }
}

/// 幾何計算エラー
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GeometryError {
    /// 長さ0のベクトルを正規化しようとした
    DegenerateVector,
}

impl std::fmt::Display for GeometryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeometryError::DegenerateVector => write!(f, "長さ0のベクトルは正規化できません"),
        }
    }
}

impl std::error::Error for GeometryError {}

/// 右方向ドリフト下限を適用
pub fn apply_drift_floor(velocity: &mut Vector3D) {
    if velocity.x < 0.0 {
        velocity.x = DRIFT_FLOOR_X;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_vector_arithmetic() {
        let p = Point3D::new(1.0, 2.0, 3.0);
        let q = p + Vector3D::new(0.5, -1.0, 0.0);
        assert_eq!(q, Point3D::new(1.5, 1.0, 3.0));
        assert_eq!(q - p, Vector3D::new(0.5, -1.0, 0.0));
        assert!((Point3D::new(0.0, 0.0, 0.0).distance_to(&Point3D::new(3.0, 4.0, 0.0)) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_normalize() {
        let v = Vector3D::new(0.0, 3.0, 4.0).try_normalize().unwrap();
        assert!((v.length() - 1.0).abs() < 1e-12);
        assert_eq!(Vector3D::default().try_normalize(), Err(GeometryError::DegenerateVector));
        assert!(Vector3D::new(f64::NAN, 0.0, 0.0).try_normalize().is_err());
    }

    #[test]
    fn test_perpendicular_xy() {
        let t = Vector3D::new(0.0, 1.0, 0.7).perpendicular_xy();
        assert_eq!(t, Vector3D::new(-1.0, 0.0, 0.0));
    }

    #[test]
    fn test_bounding_box() {
        let bb = BoundingBox::new(Point3D::new(-30.0, -20.0, -5.0), Point3D::new(30.0, 20.0, 5.0));
        assert!(bb.is_well_formed());
        assert_eq!(bb.clamp_xy(Point3D::new(-34.7, 25.0, 9.0)), Point3D::new(-30.0, 20.0, 9.0));
        assert!(!bb.contains_xy(&Point3D::new(31.0, 0.0, 0.0)));

        let flipped = BoundingBox::new(Point3D::new(1.0, 0.0, 0.0), Point3D::new(0.0, 1.0, 0.0));
        assert!(!flipped.is_well_formed());
    }

    #[test]
    fn test_bounding_box_rejects_non_finite_extent() {
        let infinite = BoundingBox::new(
            Point3D::new(-30.0, f64::NEG_INFINITY, 0.0),
            Point3D::new(30.0, f64::INFINITY, 0.0),
        );
        assert!(!infinite.is_well_formed());

        // 端点は有限でも幅がオーバーフローする
        let too_wide = BoundingBox::new(Point3D::new(-30.0, -f64::MAX, 0.0), Point3D::new(30.0, f64::MAX, 0.0));
        assert!(!too_wide.is_well_formed());

        let nan = BoundingBox::new(Point3D::new(f64::NAN, 0.0, 0.0), Point3D::new(1.0, 1.0, 0.0));
        assert!(!nan.is_well_formed());

        let flat = BoundingBox::new(Point3D::new(-30.0, 3.0, 0.0), Point3D::new(30.0, 3.0, 0.0));
        assert!(flat.is_well_formed());
    }

    #[test]
    fn test_drift_floor() {
        let mut v = Vector3D::new(-0.5, 0.2, 0.0);
        apply_drift_floor(&mut v);
        assert_eq!(v.x, DRIFT_FLOOR_X);

        let mut w = Vector3D::new(0.0, 0.2, 0.0);
        apply_drift_floor(&mut w);
        assert_eq!(w.x, 0.0);
    }
}
