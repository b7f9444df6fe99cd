/// 研修レコメンド: テキスト関連度のみ
pub const FORMATION_WEIGHTS: Weights = Weights {
    text: 1.0,
    skill: 0.0,
    location: 0.0,
};

/// 求人レコメンド: スキル（テキスト）重視、勤務地で補正
pub const OFFRE_WEIGHTS: Weights = Weights {
    text: 0.0,
    skill: 0.7,
    location: 0.3,
};

const SUM_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weights {
    pub text: f64,
    pub skill: f64,
    pub location: f64,
}

impl Weights {
    pub fn sum(&self) -> f64 {
        self.text + self.skill + self.location
    }

    /// 非負かつ合計 1.0 なら、[0,1] の成分スコアの加重和も [0,1] に収まる
    pub fn is_bounded(&self) -> bool {
        self.text >= 0.0
            && self.skill >= 0.0
            && self.location >= 0.0
            && (self.sum() - 1.0).abs() < SUM_TOLERANCE
    }
}
