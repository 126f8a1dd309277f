//! # windsim
//!
//! ファサード（矩形障害物）を回避しながら目標点へ引き寄せられる
//! 風粒子のエージェントベースシミュレーション。
//!
//! 1回の `step()` が1フレームに相当し、各粒子は
//! 移動 → 回避 → 誘引 → 境界クランプ の順で更新されます。

pub mod host;
pub mod logging;
pub mod models;
pub mod scenario;
pub mod simulation;
