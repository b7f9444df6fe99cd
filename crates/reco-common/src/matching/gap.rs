use std::collections::{BTreeSet, HashSet};

/// 名前の集合に正規化する（trim・空文字除外・重複排除）
fn competency_set<S: AsRef<str>>(names: &[S]) -> HashSet<&str> {
    names
        .iter()
        .map(|name| name.as_ref().trim())
        .filter(|name| !name.is_empty())
        .collect()
}

/// ギャップ分析: 母集合にあって候補者が持っていないスキル
///
/// 入力は多重集合でも集合として扱う。戻り値の順序に意味はなく、
/// 後段はメンバーシップ判定にのみ使うこと（BTreeSet なのは出力の再現性のため）。
/// 空なら呼び出し側で空のランキングを返す。
pub fn competency_gap<S: AsRef<str>, U: AsRef<str>>(
    candidate_competences: &[S],
    universe_competences: &[U],
) -> BTreeSet<String> {
    let candidate = competency_set(candidate_competences);
    let universe = competency_set(universe_competences);

    universe
        .difference(&candidate)
        .map(|name| name.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disjoint_sets_return_whole_universe() {
        let gap = competency_gap(&["Rust", "Go"], &["Python", "SQL"]);

        assert_eq!(
            gap,
            BTreeSet::from(["Python".to_string(), "SQL".to_string()])
        );
    }

    #[test]
    fn identical_sets_return_empty_gap() {
        let gap = competency_gap(&["SQL", "Python"], &["Python", "SQL"]);
        assert!(gap.is_empty());
    }

    #[test]
    fn duplicates_are_collapsed() {
        let gap = competency_gap(&["Python", "Python"], &["Python", "SQL", "SQL", " SQL "]);

        assert_eq!(gap, BTreeSet::from(["SQL".to_string()]));
    }

    #[test]
    fn empty_universe_has_no_gap() {
        let universe: [&str; 0] = [];
        assert!(competency_gap(&["Python"], &universe).is_empty());
    }

    #[test]
    fn names_are_compared_exactly() {
        // 大文字小文字は別名として扱う（語彙は管理されている前提）
        let gap = competency_gap(&["sql"], &["SQL"]);
        assert_eq!(gap, BTreeSet::from(["SQL".to_string()]));
    }
}
