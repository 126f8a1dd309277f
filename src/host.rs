//! # Host モジュール
//!
//! 描画ホストからの呼び出しごとに1フレームだけ進めるセッション管理。
//!
//! ホストは毎回 `HostControl`（粒子数とリセット要求）を渡し、
//! 戻り値の `FrameSnapshot` を描画に使います。エンジンが未作成、
//! またはリセットが要求された場合はその場で作り直してから1フレーム進めます。

use tracing::info;

use crate::models::BoundingBox;
use crate::simulation::{EnvironmentSettings, FrameSnapshot, SimulationEngine, SimulationError};

/// ホストから受け取る制御入力
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostControl {
    pub particle_count: usize,
    pub reset_requested: bool,
}

/// 呼び出しをまたいでエンジンを保持するセッション
pub struct WindHost {
    bounds: BoundingBox,
    seed: u64,
    settings: EnvironmentSettings,
    engine: Option<SimulationEngine>,
}

impl WindHost {
    pub fn new(bounds: BoundingBox, seed: u64) -> Self {
        Self::with_settings(bounds, seed, EnvironmentSettings::default())
    }

    pub fn with_settings(bounds: BoundingBox, seed: u64, settings: EnvironmentSettings) -> Self {
        Self {
            bounds,
            seed,
            settings,
            engine: None,
        }
    }

    /// 1回の呼び出し分の処理
    ///
    /// エンジンが未作成、またはリセットが要求された場合は作り直してから
    /// 1フレームだけ進めます。粒子数の変更はリセット時にのみ反映されます。
    ///
    /// # 引数
    ///
    /// * `control` - ホストからの粒子数とリセット要求
    ///
    /// # 戻り値
    ///
    /// 進めた後のフレームの描画出力、エンジンを作成できない場合は
    /// `SimulationError`（このときセッションはエンジンを保持しません）
    pub fn update(&mut self, control: &HostControl) -> Result<FrameSnapshot, SimulationError> {
        let engine = match self.engine.take() {
            Some(engine) if !control.reset_requested => engine,
            previous => {
                if previous.is_some() {
                    info!("リセット要求によりエンジンを再構築");
                }
                SimulationEngine::with_settings(
                    self.bounds,
                    control.particle_count,
                    self.seed,
                    self.settings,
                )?
            }
        };

        let engine = self.engine.insert(engine);
        engine.step();
        Ok(engine.snapshot())
    }

    /// 次回以降のリセットで使うシード
    pub fn set_seed(&mut self, seed: u64) {
        self.seed = seed;
    }

    pub fn engine(&self) -> Option<&SimulationEngine> {
        self.engine.as_ref()
    }
}
