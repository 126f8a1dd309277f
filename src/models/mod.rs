// 基本的なデータ型と幾何ユーティリティ
pub mod common;

// エージェントの基本インターフェース（trait）定義
pub mod traits;

// 障害物と粒子の実装
pub mod facade;
pub mod particle;

// 便利な re-export
pub use common::*;
pub use traits::*;
pub use facade::Facade;
pub use particle::{ParticleParams, WindParticle};
