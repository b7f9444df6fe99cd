pub mod api;
pub mod db;
pub mod logging;
pub mod matching;
pub mod schema;

// Commonly used data models for the scoring pipelines.
// 全てリクエスト単位で組み立て直す一時的なスナップショット（状態は保持しない）。

/// 候補者
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Candidate {
    pub id: i64,
    /// 自由記述の居住地（例: "Casablanca"）
    pub location: Option<String>,
}

/// 研修（formation）。複数の (formation, competence) 行を 1 件にまとめたもの
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Formation {
    pub id: i64,
    pub titre: String,
    pub description: String,
    pub plateforme: String,
    /// 不足スキルのうち、この研修がカバーするもの（初出順・重複なし）
    pub competences: Vec<String>,
}

/// 求人（offre d'emploi）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Offre {
    pub id: i64,
    pub titre: String,
    pub description: String,
    pub experience: Option<String>,
    pub localisation: Option<String>,
    pub salaire: Option<String>,
}
