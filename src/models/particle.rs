use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::models::{
    common::*,
    traits::{IMovable, IObstacle, ISteerable},
};

/// 粒子ごとの調整パラメータ
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleParams {
    /// 障害物回避が作動する距離
    pub interaction_range: f64,
    /// 目標点への誘引の重み（0〜1）
    pub attraction_strength: f64,
}

impl Default for ParticleParams {
    fn default() -> Self {
        Self {
            interaction_range: 2.0,
            attraction_strength: 0.05,
        }
    }
}

/// 風粒子エージェント
///
/// 速度に従って移動し、ファサードを接線方向に回り込みながら
/// 目標点へ弱く引き寄せられます。訪れた位置はすべて軌跡として保持されます。
#[derive(Debug, Clone)]
pub struct WindParticle {
    /// 現在位置
    pub position: Point3D,
    /// 現在速度（1フレームあたりの変位）
    pub velocity: Vector3D,
    /// 障害物回避の作動距離
    pub interaction_range: f64,
    /// 誘引の重み
    pub attraction_strength: f64,
    /// 軌跡（初期位置から始まり、1フレームごとに1点追加）
    trail: Vec<Point3D>,
}

impl WindParticle {
    /// 新しい粒子を作成
    ///
    /// 軌跡は初期位置の1点から始まります。
    pub fn new(position: Point3D, velocity: Vector3D, params: ParticleParams) -> Self {
        Self {
            position,
            velocity,
            interaction_range: params.interaction_range,
            attraction_strength: params.attraction_strength,
            trail: vec![position],
        }
    }

    /// ポリライン描画用の軌跡
    ///
    /// 軌跡は上限なく伸び続けるため、長時間の実行では呼び出し側で
    /// リセット等により制限してください。
    pub fn trail(&self) -> &[Point3D] {
        &self.trail
    }
}

impl IMovable for WindParticle {
    fn advance(&mut self) {
        self.position += self.velocity;
        self.trail.push(self.position);
        apply_drift_floor(&mut self.velocity);
    }

    fn get_position(&self) -> Point3D {
        self.position
    }
}

impl ISteerable for WindParticle {
    fn avoid(&mut self, obstacle: &dyn IObstacle) {
        let closest = obstacle.closest_point(&self.position);
        let distance = self.position.distance_to(&closest);

        if distance >= self.interaction_range {
            return;
        }

        // 障害物内部では離脱方向が定まらないため、このフレームは回避しない
        let away = match (self.position - closest).try_normalize() {
            Ok(away) => away,
            Err(e) => {
                trace!("回避をスキップ: {} (位置: {:?})", e, self.position);
                return;
            }
        };

        let push = (self.interaction_range - distance) * AVOID_PUSH_FACTOR;
        self.position += away * push;

        match away.perpendicular_xy().try_normalize() {
            Ok(tangent) => {
                let speed = self.velocity.length();
                self.velocity = tangent * speed + away * AVOID_OUTWARD_SPEED;
                apply_drift_floor(&mut self.velocity);
            }
            Err(e) => {
                trace!("接線方向の偏向をスキップ: {}", e);
            }
        }
    }

    fn attract_to(&mut self, target: &Point3D) {
        let direction = match (*target - self.position).try_normalize() {
            Ok(direction) => direction,
            Err(e) => {
                trace!("誘引をスキップ: {}", e);
                return;
            }
        };

        self.velocity = self.velocity * ATTRACT_INERTIA + direction * self.attraction_strength;
        apply_drift_floor(&mut self.velocity);
    }

    fn clamp_to_bounds(&mut self, bounds: &BoundingBox) {
        self.position = bounds.clamp_xy(self.position);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::facade::Facade;

    const EPS: f64 = 1e-12;

    fn particle_at(x: f64, y: f64, velocity: Vector3D) -> WindParticle {
        WindParticle::new(Point3D::new(x, y, 0.0), velocity, ParticleParams::default())
    }

    #[test]
    fn test_new_particle_trail_starts_at_position() {
        let p = particle_at(-35.0, 1.0, Vector3D::new(0.3, 0.0, 0.0));
        assert_eq!(p.trail(), &[Point3D::new(-35.0, 1.0, 0.0)]);
    }

    #[test]
    fn test_advance_appends_trail_and_floors_velocity() {
        let mut p = particle_at(0.0, 0.0, Vector3D::new(-0.4, 0.2, 0.0));
        p.advance();

        assert_eq!(p.position, Point3D::new(-0.4, 0.2, 0.0));
        assert_eq!(p.trail().len(), 2);
        assert_eq!(*p.trail().last().unwrap(), p.position);
        assert_eq!(p.velocity.x, DRIFT_FLOOR_X);
        assert_eq!(p.velocity.y, 0.2);
    }

    #[test]
    fn test_avoid_noop_outside_range() {
        let facade = Facade::default();
        let mut p = particle_at(-34.7, 2.0, Vector3D::new(0.3, 0.0, 0.0));
        p.avoid(&facade);

        assert_eq!(p.position, Point3D::new(-34.7, 2.0, 0.0));
        assert_eq!(p.velocity, Vector3D::new(0.3, 0.0, 0.0));
    }

    #[test]
    fn test_avoid_exactly_at_range_is_noop() {
        let facade = Facade::default();
        let mut p = particle_at(0.0, 7.0, Vector3D::new(0.3, 0.0, 0.0));
        p.avoid(&facade);
        assert_eq!(p.position, Point3D::new(0.0, 7.0, 0.0));
    }

    #[test]
    fn test_avoid_pushes_out_and_deflects() {
        // 上辺 y=5 から距離1.0
        let facade = Facade::default();
        let mut p = particle_at(0.0, 6.0, Vector3D::new(0.3, 0.0, 0.0));
        p.avoid(&facade);

        // (2.0 - 1.0) * 0.5 = 0.5 だけ外側へ
        assert!((p.position.x - 0.0).abs() < EPS);
        assert!((p.position.y - 6.5).abs() < EPS);

        // 接線 (-1,0,0)*0.3 + 離脱 (0,1,0)*0.1 = (-0.3, 0.1, 0) → x を下限へ
        assert!((p.velocity.x - DRIFT_FLOOR_X).abs() < EPS);
        assert!((p.velocity.y - 0.1).abs() < EPS);
        assert_eq!(p.velocity.z, 0.0);
    }

    #[test]
    fn test_avoid_left_side_preserves_speed_direction() {
        // 左辺 x=-5 から距離1.0、接線は (0,-1,0)
        let facade = Facade::default();
        let mut p = particle_at(-6.0, 0.0, Vector3D::new(0.3, 0.4, 0.0));
        p.avoid(&facade);

        assert!((p.position.x + 6.5).abs() < EPS);
        assert!((p.velocity.x - DRIFT_FLOOR_X).abs() < EPS);
        assert!((p.velocity.y + 0.5).abs() < EPS);
    }

    #[test]
    fn test_avoid_inside_facade_is_skipped() {
        let facade = Facade::default();
        let mut p = particle_at(1.0, 1.0, Vector3D::new(0.3, 0.0, 0.0));
        p.avoid(&facade);

        assert_eq!(p.position, Point3D::new(1.0, 1.0, 0.0));
        assert_eq!(p.velocity, Vector3D::new(0.3, 0.0, 0.0));
    }

    #[test]
    fn test_avoid_degenerate_tangent_keeps_velocity() {
        // XYが矩形内で z 方向だけ離れている場合、接線が定まらない
        let facade = Facade::default();
        let mut p = WindParticle::new(
            Point3D::new(1.0, 1.0, 1.0),
            Vector3D::new(0.3, 0.0, 0.0),
            ParticleParams::default(),
        );
        p.avoid(&facade);

        assert!((p.position.z - 1.5).abs() < EPS);
        assert_eq!(p.velocity, Vector3D::new(0.3, 0.0, 0.0));
    }

    #[test]
    fn test_attract_blends_toward_target() {
        let mut p = particle_at(0.0, 0.0, Vector3D::new(0.3, 0.0, 0.0));
        p.attract_to(&Point3D::new(0.0, 10.0, 0.0));

        assert!((p.velocity.x - 0.27).abs() < EPS);
        assert!((p.velocity.y - 0.05).abs() < EPS);
    }

    #[test]
    fn test_attract_behind_applies_floor() {
        let mut p = particle_at(10.0, 0.0, Vector3D::new(0.01, 0.0, 0.0));
        p.attract_to(&Point3D::new(0.0, 0.0, 0.0));
        assert_eq!(p.velocity.x, DRIFT_FLOOR_X);
    }

    #[test]
    fn test_attract_on_target_is_skipped() {
        let mut p = particle_at(30.0, 0.0, Vector3D::new(0.3, 0.1, 0.0));
        p.attract_to(&Point3D::new(30.0, 0.0, 0.0));
        assert_eq!(p.velocity, Vector3D::new(0.3, 0.1, 0.0));
    }

    #[test]
    fn test_clamp_to_bounds_keeps_velocity() {
        let bounds = BoundingBox::new(Point3D::new(-30.0, -20.0, -5.0), Point3D::new(30.0, 20.0, 5.0));
        let mut p = WindParticle::new(
            Point3D::new(-34.7, 21.0, 8.0),
            Vector3D::new(0.3, 0.5, 0.0),
            ParticleParams::default(),
        );
        p.clamp_to_bounds(&bounds);

        assert_eq!(p.position, Point3D::new(-30.0, 20.0, 8.0));
        assert_eq!(p.velocity, Vector3D::new(0.3, 0.5, 0.0));
    }
}
