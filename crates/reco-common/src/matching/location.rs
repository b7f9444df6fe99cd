use strsim::normalized_levenshtein;

/// 勤務地ラベル同士の近さ（0.0〜1.0）
///
/// ジオコーディングはせず、小文字化した文字列の正規化編集距離で近似する
/// (1 − levenshtein / 長い方の文字数)。どちらかが空なら信号なしとして 0.0。
pub fn location_similarity(a: &str, b: &str) -> f64 {
    let a = a.trim();
    let b = b.trim();
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    normalized_levenshtein(&a.to_lowercase(), &b.to_lowercase())
}

/// 欠損を許す版。候補者の location や求人の localisation は NULL があり得る
pub fn optional_location_similarity(a: Option<&str>, b: Option<&str>) -> f64 {
    match (a, b) {
        (Some(a), Some(b)) => location_similarity(a, b),
        _ => 0.0,
    }
}
