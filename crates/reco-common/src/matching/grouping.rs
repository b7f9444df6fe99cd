use std::collections::{BTreeSet, HashMap};

use crate::{Formation, schema::FormationRow};

/// 不足スキルを含む行だけ残し、formation id ごとに 1 件へまとめる
///
/// 出力は id の初出順。competences は初出順で重複なし。
/// 同じ id でタイトル等が食い違う場合は最初の行を採用する。
pub fn group_formation_rows(rows: Vec<FormationRow>, missing: &BTreeSet<String>) -> Vec<Formation> {
    let mut grouped: Vec<Formation> = Vec::new();
    let mut positions: HashMap<i64, usize> = HashMap::new();

    for row in rows {
        if !missing.contains(&row.competence) {
            continue;
        }

        match positions.get(&row.id) {
            Some(&position) => {
                let formation = &mut grouped[position];
                if !formation.competences.contains(&row.competence) {
                    formation.competences.push(row.competence);
                }
            }
            None => {
                positions.insert(row.id, grouped.len());
                grouped.push(Formation {
                    id: row.id,
                    titre: row.titre,
                    description: row.description,
                    plateforme: row.plateforme,
                    competences: vec![row.competence],
                });
            }
        }
    }

    grouped
}

/// ベクトル化に使う 1 件分のテキスト（タイトル・説明・スキル一覧）
pub fn formation_text(formation: &Formation) -> String {
    format!(
        "{} {} {}",
        formation.titre,
        formation.description,
        formation.competences.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: i64, competence: &str) -> FormationRow {
        FormationRow {
            id,
            titre: format!("Formation {id}"),
            description: "desc".into(),
            plateforme: "Coursera".into(),
            competence: competence.into(),
        }
    }

    fn missing(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn groups_rows_by_id_in_first_seen_order() {
        let rows = vec![row(2, "SQL"), row(1, "Docker"), row(2, "Spark"), row(1, "SQL")];

        let grouped = group_formation_rows(rows, &missing(&["SQL", "Spark", "Docker"]));

        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].id, 2);
        assert_eq!(grouped[0].competences, vec!["SQL", "Spark"]);
        assert_eq!(grouped[1].id, 1);
        assert_eq!(grouped[1].competences, vec!["Docker", "SQL"]);
    }

    #[test]
    fn drops_rows_outside_the_gap() {
        let rows = vec![row(1, "Python"), row(2, "SQL"), row(3, "Python"), row(3, "SQL")];

        let grouped = group_formation_rows(rows, &missing(&["SQL"]));

        let ids: Vec<i64> = grouped.iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![2, 3]);
        assert_eq!(grouped[1].competences, vec!["SQL"]);
    }

    #[test]
    fn repeated_competences_are_listed_once() {
        let rows = vec![row(1, "SQL"), row(1, "SQL")];

        let grouped = group_formation_rows(rows, &missing(&["SQL"]));

        assert_eq!(grouped[0].competences, vec!["SQL"]);
    }

    #[test]
    fn text_concatenates_title_description_and_competences() {
        let formation = Formation {
            id: 1,
            titre: "Data".into(),
            description: "Analyse".into(),
            plateforme: "Udemy".into(),
            competences: vec!["SQL".into(), "Spark".into()],
        };

        assert_eq!(formation_text(&formation), "Data Analyse SQL, Spark");
    }
}
