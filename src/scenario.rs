use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::models::{BoundingBox, Facade, ParticleParams, Point3D, Vector3D};
use crate::simulation::EnvironmentSettings;

/// シナリオメタデータ
#[derive(Debug, Deserialize, Serialize)]
pub struct ScenarioMeta {
    pub version: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// シミュレーション設定
#[derive(Debug, Deserialize, Serialize)]
pub struct SimulationConfig {
    #[serde(default = "default_seed")]
    pub seed: u64,
    pub frames: u64,
    pub particle_count: usize,
}

fn default_seed() -> u64 {
    42
}

/// 世界設定
#[derive(Debug, Deserialize, Serialize)]
pub struct WorldConfig {
    pub bounds: BoundingBox,
}

/// 粒子設定（省略時は既定値）
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct ParticleConfig {
    #[serde(flatten)]
    pub params: ParticleParams,
    pub initial_velocity: Vector3D,
    pub spawn_offset: f64,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        let defaults = EnvironmentSettings::default();
        Self {
            params: defaults.particle,
            initial_velocity: defaults.initial_velocity,
            spawn_offset: defaults.spawn_offset,
        }
    }
}

/// スナップショット出力設定
#[derive(Debug, Deserialize, Serialize)]
pub struct OutputConfig {
    pub path: String,
    /// 指定時はこのフレーム間隔ごとにも書き出す（0は不可）
    #[serde(default)]
    pub every_n_frames: Option<u64>,
}

/// 完全なシナリオ設定
#[derive(Debug, Deserialize, Serialize)]
pub struct ScenarioConfig {
    pub meta: ScenarioMeta,
    pub sim: SimulationConfig,
    pub world: WorldConfig,
    #[serde(default)]
    pub facade: Facade,
    #[serde(default)]
    pub particle: ParticleConfig,
    #[serde(default)]
    pub output: Option<OutputConfig>,
}

impl ScenarioConfig {
    /// YAMLファイルからシナリオ設定を読み込み
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.to_path_buf()));
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| ScenarioError::IoError(path.to_path_buf(), e))?;

        let config: ScenarioConfig = serde_yaml::from_str(&contents)
            .map_err(|e| ScenarioError::ParseError(path.to_path_buf(), e))?;

        config.validate()?;

        Ok(config)
    }

    /// 組み込みの既定シナリオ
    pub fn builtin() -> Self {
        Self {
            meta: ScenarioMeta {
                version: "1.0".to_string(),
                name: "facade_wind".to_string(),
                description: "ファサード周りの風粒子（既定設定）".to_string(),
            },
            sim: SimulationConfig {
                seed: default_seed(),
                frames: 200,
                particle_count: 100,
            },
            world: WorldConfig {
                bounds: BoundingBox::new(Point3D::new(-30.0, -20.0, -5.0), Point3D::new(30.0, 20.0, 5.0)),
            },
            facade: Facade::default(),
            particle: ParticleConfig::default(),
            output: None,
        }
    }

    /// 設定の基本的な検証
    pub fn validate(&self) -> Result<(), ScenarioError> {
        let bounds = &self.world.bounds;
        if !bounds.is_well_formed() {
            return Err(ScenarioError::ValidationError("Invalid world bounds".to_string()));
        }

        if !(self.facade.width > 0.0 && self.facade.height > 0.0) {
            return Err(ScenarioError::ValidationError(
                "facade width and height must be positive".to_string(),
            ));
        }

        let params = &self.particle.params;
        if !(params.interaction_range > 0.0) {
            return Err(ScenarioError::ValidationError(
                "interaction_range must be positive".to_string(),
            ));
        }
        if !(params.attraction_strength > 0.0 && params.attraction_strength < 1.0) {
            return Err(ScenarioError::ValidationError(format!(
                "attraction_strength {} must be in (0, 1)",
                params.attraction_strength
            )));
        }

        if let Some(OutputConfig { every_n_frames: Some(0), .. }) = &self.output {
            return Err(ScenarioError::ValidationError(
                "every_n_frames must be positive".to_string(),
            ));
        }

        Ok(())
    }

    /// エンジン構築用の環境設定
    pub fn environment_settings(&self) -> EnvironmentSettings {
        EnvironmentSettings {
            facade: self.facade,
            particle: self.particle.params,
            initial_velocity: self.particle.initial_velocity,
            spawn_offset: self.particle.spawn_offset,
        }
    }

    /// シナリオの概要を表示
    pub fn print_summary(&self) {
        println!("=== シナリオ情報 ===");
        println!("名前: {}", self.meta.name);
        println!("説明: {}", self.meta.description);
        println!("バージョン: {}", self.meta.version);
        println!();

        println!("=== シミュレーション設定 ===");
        println!("フレーム数: {}", self.sim.frames);
        println!("粒子数: {}", self.sim.particle_count);
        println!("シード値: {}", self.sim.seed);
        println!();

        let b = &self.world.bounds;
        println!("=== 環境 ===");
        println!("領域: ({:.1}, {:.1}) - ({:.1}, {:.1})", b.min.x, b.min.y, b.max.x, b.max.y);
        println!(
            "ファサード: 原点 ({:.1}, {:.1}, {:.1}), {:.1} x {:.1}",
            self.facade.origin.x, self.facade.origin.y, self.facade.origin.z,
            self.facade.width, self.facade.height
        );
        println!(
            "粒子: 作動距離 {:.2}, 誘引 {:.3}",
            self.particle.params.interaction_range, self.particle.params.attraction_strength
        );

        if let Some(output) = &self.output {
            println!("出力先: {}", output.path);
        }
    }
}

/// シナリオ読み込みエラー
#[derive(Debug)]
pub enum ScenarioError {
    FileNotFound(std::path::PathBuf),
    IoError(std::path::PathBuf, std::io::Error),
    ParseError(std::path::PathBuf, serde_yaml::Error),
    ValidationError(String),
}

impl std::fmt::Display for ScenarioError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScenarioError::FileNotFound(path) => {
                write!(f, "シナリオファイルが見つかりません: {}", path.display())
            }
            ScenarioError::IoError(path, err) => {
                write!(f, "ファイル読み込みエラー {}: {}", path.display(), err)
            }
            ScenarioError::ParseError(path, err) => {
                write!(f, "YAML解析エラー {}: {}", path.display(), err)
            }
            ScenarioError::ValidationError(msg) => {
                write!(f, "設定検証エラー: {}", msg)
            }
        }
    }
}

impl std::error::Error for ScenarioError {}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
meta:
  version: "1.0"
  name: minimal
sim:
  frames: 50
  particle_count: 12
world:
  bounds:
    min: { x: -30.0, y: -20.0, z: -5.0 }
    max: { x: 30.0, y: 20.0, z: 5.0 }
"#;

    #[test]
    fn test_minimal_scenario_uses_defaults() {
        let config: ScenarioConfig = serde_yaml::from_str(MINIMAL).unwrap();
        config.validate().unwrap();

        assert_eq!(config.sim.seed, 42);
        assert_eq!(config.facade, Facade::default());
        assert_eq!(config.particle.params, ParticleParams::default());
        assert_eq!(config.environment_settings(), EnvironmentSettings::default());
        assert!(config.output.is_none());
    }

    #[test]
    fn test_full_scenario() {
        let yaml = r#"
meta:
  version: "1.1"
  name: tall_facade
  description: taller obstacle
sim:
  seed: 7
  frames: 10
  particle_count: 3
world:
  bounds:
    min: { x: -10.0, y: -10.0, z: 0.0 }
    max: { x: 10.0, y: 10.0, z: 0.0 }
facade:
  origin: { x: -2.0, y: -6.0, z: 0.0 }
  width: 4.0
  height: 12.0
particle:
  interaction_range: 3.0
  attraction_strength: 0.1
  initial_velocity: { x: 0.5, y: 0.0, z: 0.0 }
  spawn_offset: 1.0
output:
  path: out/frame.yaml
  every_n_frames: 5
"#;
        let config: ScenarioConfig = serde_yaml::from_str(yaml).unwrap();
        config.validate().unwrap();

        let settings = config.environment_settings();
        assert_eq!(settings.facade.height, 12.0);
        assert_eq!(settings.particle.interaction_range, 3.0);
        assert_eq!(settings.initial_velocity.x, 0.5);
        assert_eq!(settings.spawn_offset, 1.0);
        assert_eq!(config.output.as_ref().and_then(|o| o.every_n_frames), Some(5));
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = ScenarioConfig::builtin();
        config.world.bounds.min.x = 100.0;
        assert!(matches!(config.validate(), Err(ScenarioError::ValidationError(_))));

        let mut config = ScenarioConfig::builtin();
        config.world.bounds.min.y = f64::NEG_INFINITY;
        assert!(config.validate().is_err());

        let mut config = ScenarioConfig::builtin();
        config.particle.params.attraction_strength = 1.0;
        assert!(config.validate().is_err());

        let mut config = ScenarioConfig::builtin();
        config.facade.width = 0.0;
        assert!(config.validate().is_err());

        let mut config = ScenarioConfig::builtin();
        config.output = Some(OutputConfig { path: "x.yaml".to_string(), every_n_frames: Some(0) });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file() {
        let result = ScenarioConfig::from_file("does/not/exist.yaml");
        assert!(matches!(result, Err(ScenarioError::FileNotFound(_))));
    }

    #[test]
    fn test_builtin_is_valid() {
        ScenarioConfig::builtin().validate().unwrap();
    }
}
