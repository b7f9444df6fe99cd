/// コサイン類似度（0.0〜1.0）
///
/// TF-IDF ベクトル（非負）前提。ゼロベクトルとの比較は NaN ではなく 0.0 と定義する。
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() {
        tracing::warn!(
            left = a.len(),
            right = b.len(),
            "tf-idf vectors differ in length; similarity forced to zero"
        );
        return 0.0;
    }

    let (dot, sq_a, sq_b) = a
        .iter()
        .zip(b)
        .fold((0.0, 0.0, 0.0), |(dot, sq_a, sq_b), (x, y)| {
            (dot + x * y, sq_a + x * x, sq_b + y * y)
        });

    if sq_a == 0.0 || sq_b == 0.0 {
        return 0.0;
    }

    // 丸め誤差で 1.0 をわずかに超えることがある
    (dot / (sq_a.sqrt() * sq_b.sqrt())).clamp(0.0, 1.0)
}
