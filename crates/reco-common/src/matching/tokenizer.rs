use once_cell::sync::Lazy;
use regex::Regex;

/// これより短いトークンは捨てる（1 文字語はノイズ扱い）
pub const MIN_TOKEN_CHARS: usize = 2;

static RE_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").unwrap());

/// 小文字化して単語境界で分割する。外部状態を持たない決定論的な処理
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();

    RE_WORD
        .find_iter(&lowered)
        .map(|m| m.as_str())
        .filter(|token| token.chars().count() >= MIN_TOKEN_CHARS)
        .map(str::to_string)
        .collect()
}
