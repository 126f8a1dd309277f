use crate::models::common::*;

/// 移動可能なエージェントのインターフェース
pub trait IMovable {
    /// 1フレーム分の移動処理
    fn advance(&mut self);

    /// 現在位置の取得
    fn get_position(&self) -> Point3D;
}

/// 障害物のインターフェース
pub trait IObstacle {
    /// 指定点に最も近い障害物上の点
    fn closest_point(&self, point: &Point3D) -> Point3D;
}

/// 操舵ルールに従うエージェントのインターフェース
pub trait ISteerable: IMovable {
    /// 障害物の回避
    fn avoid(&mut self, obstacle: &dyn IObstacle);

    /// 目標点への誘引
    fn attract_to(&mut self, target: &Point3D);

    /// 領域内へのクランプ（位置のみ、速度は変更しない）
    fn clamp_to_bounds(&mut self, bounds: &BoundingBox);
}
