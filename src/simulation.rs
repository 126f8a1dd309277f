//! # Simulation モジュール
//!
//! 風粒子シミュレーションの中核となるエンジンを提供します。
//!
//! エンジンは領域・ファサード・誘引目標・粒子集合を所有し、
//! `step()` の呼び出し1回で1フレーム分だけ全粒子を更新します。
//! 時間刻みの概念はなく、1フレーム = 1回の更新です。
//!
//! ## フレーム処理順序
//!
//! 各粒子について、以下の順序で処理が実行されます：
//!
//! 1. **移動**: 速度分だけ位置を進め、軌跡に追加
//! 2. **回避**: 移動後の位置でファサードとの距離を判定し、接線方向へ偏向
//! 3. **誘引**: 目標点へ速度をブレンド
//! 4. **クランプ**: 位置を領域内へ制限（最終的な決定権を持つ）
//!
//! 粒子間の相互作用はないため、粒子の処理順は結果に影響しません。
//!
//! ## 使用例
//!
//! ```rust
//! use windsim::models::{BoundingBox, Point3D};
//! use windsim::simulation::SimulationEngine;
//!
//! let bounds = BoundingBox::new(Point3D::new(-30.0, -20.0, -5.0), Point3D::new(30.0, 20.0, 5.0));
//! let mut engine = SimulationEngine::new(bounds, 10, 42)?;
//! engine.step();
//! assert_eq!(engine.trails().next().map(|t| t.len()), Some(2));
//! # Ok::<(), windsim::simulation::SimulationError>(())
//! ```

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, info, trace};

use crate::models::*;
use crate::scenario::ScenarioConfig;

/// エンジン構築時の環境設定
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvironmentSettings {
    /// 障害物（領域に依存しない固定配置）
    pub facade: Facade,
    /// 全粒子に共通の初期パラメータ
    pub particle: ParticleParams,
    /// 初期速度
    pub initial_velocity: Vector3D,
    /// 領域左端からの生成位置のオフセット
    pub spawn_offset: f64,
}

impl Default for EnvironmentSettings {
    fn default() -> Self {
        Self {
            facade: Facade::default(),
            particle: ParticleParams::default(),
            initial_velocity: Vector3D::new(0.3, 0.0, 0.0),
            spawn_offset: 5.0,
        }
    }
}

impl EnvironmentSettings {
    fn validate(&self) -> Result<(), SimulationError> {
        if !(self.facade.width > 0.0 && self.facade.height > 0.0) {
            return Err(SimulationError::InvalidParameter(format!(
                "facade size must be positive: {} x {}",
                self.facade.width, self.facade.height
            )));
        }
        if !(self.particle.interaction_range > 0.0) {
            return Err(SimulationError::InvalidParameter(format!(
                "interaction_range must be positive: {}",
                self.particle.interaction_range
            )));
        }
        let strength = self.particle.attraction_strength;
        if !(strength > 0.0 && strength < 1.0) {
            return Err(SimulationError::InvalidParameter(format!(
                "attraction_strength must be in (0, 1): {}",
                strength
            )));
        }
        Ok(())
    }
}

pub struct SimulationEngine {
    pub frame_count: u64,
    pub seed: u64,

    bounds: BoundingBox,
    facade: Facade,
    attraction_target: Point3D,
    particles: Vec<WindParticle>,

    particle_count: usize,
    settings: EnvironmentSettings,
}

impl SimulationEngine {
    /// 既定の環境設定でエンジンを作成
    ///
    /// ファサードは原点 (-5, -5, 0)、15 x 10 の固定配置です。
    ///
    /// # 引数
    ///
    /// * `bounds` - シミュレーション領域
    /// * `particle_count` - 生成する粒子数（0も可）
    /// * `seed` - 粒子の生成位置を決める乱数シード
    ///
    /// # 戻り値
    ///
    /// 作成されたエンジン、領域が不正な場合は `SimulationError::InvalidBounds`
    pub fn new(bounds: BoundingBox, particle_count: usize, seed: u64) -> Result<Self, SimulationError> {
        Self::with_settings(bounds, particle_count, seed, EnvironmentSettings::default())
    }

    /// 環境設定を指定してエンジンを作成
    ///
    /// 同じ `bounds`・`particle_count`・`seed`・`settings` からは常に同じ初期状態が得られます。
    ///
    /// # 引数
    ///
    /// * `bounds` - シミュレーション領域（XY方向の端点と幅が有限であること）
    /// * `particle_count` - 生成する粒子数
    /// * `seed` - 乱数シード
    /// * `settings` - ファサード・粒子パラメータ・初期速度・生成オフセット
    ///
    /// # 戻り値
    ///
    /// 作成されたエンジン、領域が不正な場合は `SimulationError::InvalidBounds`、
    /// 設定値が範囲外の場合は `SimulationError::InvalidParameter`
    pub fn with_settings(
        bounds: BoundingBox,
        particle_count: usize,
        seed: u64,
        settings: EnvironmentSettings,
    ) -> Result<Self, SimulationError> {
        if !bounds.is_well_formed() {
            return Err(SimulationError::InvalidBounds {
                min: bounds.min,
                max: bounds.max,
            });
        }
        settings.validate()?;

        // 右端の中点
        let attraction_target = Point3D::new(bounds.max.x, (bounds.max.y + bounds.min.y) / 2.0, 0.0);
        let particles = generate_particles(&bounds, particle_count, seed, &settings);

        info!(
            "シミュレーションエンジンを初期化: 粒子 {}個, シード {}",
            particle_count, seed
        );
        debug!(
            "領域: {:?} - {:?}, 目標点: {:?}",
            bounds.min, bounds.max, attraction_target
        );

        Ok(Self {
            frame_count: 0,
            seed,
            bounds,
            facade: settings.facade,
            attraction_target,
            particles,
            particle_count,
            settings,
        })
    }

    /// シナリオ設定からエンジンを作成
    pub fn from_scenario(scenario: &ScenarioConfig) -> Result<Self, SimulationError> {
        Self::with_settings(
            scenario.world.bounds,
            scenario.sim.particle_count,
            scenario.sim.seed,
            scenario.environment_settings(),
        )
    }

    /// 1フレーム分の更新
    ///
    /// 各粒子に対して 移動 → 回避 → 誘引 → クランプ の順で処理し、
    /// 全粒子の位置・速度・軌跡をその場で更新します。
    /// 軌跡は粒子ごとに1点ずつ伸びます。同時に2つの `step()` を
    /// 呼び出さないよう、呼び出し側で直列化してください。
    pub fn step(&mut self) {
        for particle in &mut self.particles {
            particle.advance();
            particle.avoid(&self.facade);
            particle.attract_to(&self.attraction_target);
            particle.clamp_to_bounds(&self.bounds);
        }

        self.frame_count += 1;
        trace!("フレーム {} 完了", self.frame_count);
    }

    /// 指定フレーム数だけ連続実行
    pub fn run(&mut self, frames: u64) {
        info!("=== シミュレーション実行開始 ({}フレーム) ===", frames);

        for i in 1..=frames {
            self.step();

            if i % 100 == 0 {
                let progress = i as f64 / frames as f64 * 100.0;
                info!("進行状況: {:.1}% ({}/{}フレーム)", progress, i, frames);
            }
        }

        info!("=== シミュレーション完了 ===");
        info!("総フレーム数: {}", self.frame_count);
        info!("軌跡の総点数: {}", self.total_trail_points());
    }

    /// 粒子を再生成し、軌跡を破棄
    ///
    /// 保持しているシード・粒子数・環境設定をそのまま使うため、
    /// リセット直後の状態は構築直後と一致します。フレーム数は0に戻ります。
    pub fn reset(&mut self) {
        self.particles = generate_particles(&self.bounds, self.particle_count, self.seed, &self.settings);
        self.frame_count = 0;
        info!("シミュレーションをリセット: 粒子 {}個", self.particle_count);
    }

    /// 粒子数とシードを変更してリセット
    ///
    /// # 引数
    ///
    /// * `particle_count` - 新しい粒子数
    /// * `seed` - 新しい乱数シード
    pub fn reset_with(&mut self, particle_count: usize, seed: u64) {
        self.particle_count = particle_count;
        self.seed = seed;
        self.reset();
    }

    pub fn particles(&self) -> &[WindParticle] {
        &self.particles
    }

    /// 粒子の現在位置（粒子の格納順）
    pub fn positions(&self) -> Vec<Point3D> {
        self.particles.iter().map(|p| p.get_position()).collect()
    }

    pub fn trails(&self) -> impl Iterator<Item = &[Point3D]> {
        self.particles.iter().map(|p| p.trail())
    }

    pub fn facade(&self) -> &Facade {
        &self.facade
    }

    pub fn bounds(&self) -> &BoundingBox {
        &self.bounds
    }

    pub fn attraction_target(&self) -> Point3D {
        self.attraction_target
    }

    pub fn particle_count(&self) -> usize {
        self.particle_count
    }

    pub fn total_trail_points(&self) -> usize {
        self.particles.iter().map(|p| p.trail().len()).sum()
    }

    /// 描画用の出力一式
    pub fn snapshot(&self) -> FrameSnapshot {
        FrameSnapshot {
            frame: self.frame_count,
            positions: self.positions(),
            trails: self.trails().map(|t| t.to_vec()).collect(),
            facade: FacadeGeometry {
                origin: self.facade.origin,
                width: self.facade.width,
                height: self.facade.height,
                corners: self.facade.corners(),
            },
            bounds: self.bounds,
            target: self.attraction_target,
        }
    }
}

/// 領域左端の外側に粒子を生成
///
/// y座標のみ `[min.y, max.y]` の一様乱数で決まります。
fn generate_particles(
    bounds: &BoundingBox,
    count: usize,
    seed: u64,
    settings: &EnvironmentSettings,
) -> Vec<WindParticle> {
    let mut rng = StdRng::seed_from_u64(seed);
    let x = bounds.min.x - settings.spawn_offset;

    (0..count)
        .map(|_| {
            let y = rng.gen_range(bounds.min.y..=bounds.max.y);
            WindParticle::new(Point3D::new(x, y, 0.0), settings.initial_velocity, settings.particle)
        })
        .collect()
}

/// ファサードの描画用ジオメトリ
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FacadeGeometry {
    pub origin: Point3D,
    pub width: f64,
    pub height: f64,
    pub corners: [Point3D; 4],
}

/// 1フレーム分の描画出力
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameSnapshot {
    pub frame: u64,
    pub positions: Vec<Point3D>,
    pub trails: Vec<Vec<Point3D>>,
    pub facade: FacadeGeometry,
    pub bounds: BoundingBox,
    pub target: Point3D,
}

impl FrameSnapshot {
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

/// エンジン構築エラー
#[derive(Debug, Clone, PartialEq)]
pub enum SimulationError {
    InvalidBounds { min: Point3D, max: Point3D },
    InvalidParameter(String),
}

impl std::fmt::Display for SimulationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimulationError::InvalidBounds { min, max } => {
                write!(
                    f,
                    "不正な領域: min ({}, {}) / max ({}, {})",
                    min.x, min.y, max.x, max.y
                )
            }
            SimulationError::InvalidParameter(msg) => {
                write!(f, "不正なパラメータ: {}", msg)
            }
        }
    }
}

impl std::error::Error for SimulationError {}
