use std::{cmp::Ordering, collections::HashMap};

use super::weights::Weights;
use crate::{Formation, Offre};

/// ランキング対象。成分スコアは item_id で引く
pub trait Ranked {
    fn item_id(&self) -> i64;
}

impl Ranked for Formation {
    fn item_id(&self) -> i64 {
        self.id
    }
}

impl Ranked for Offre {
    fn item_id(&self) -> i64 {
        self.id
    }
}

/// 成分スコア（いずれも 0.0〜1.0）。使わない成分は 0.0 のまま
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ComponentScores {
    pub text: f64,
    pub skill: f64,
    pub location: f64,
}

impl ComponentScores {
    pub fn combine(&self, weights: &Weights) -> f64 {
        self.text * weights.text + self.skill * weights.skill + self.location * weights.location
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredItem<T> {
    pub item: T,
    pub components: ComponentScores,
    pub combined: f64,
}

/// 加重和で総合スコアを出し、降順に並べて必要なら上位 `limit` 件に切る
///
/// 同点は入力順を保つ（安定ソート）。スコア表にない item は全成分 0.0 扱い。
pub fn rank<T: Ranked>(
    items: Vec<T>,
    component_scores: &HashMap<i64, ComponentScores>,
    weights: &Weights,
    limit: Option<usize>,
) -> Vec<ScoredItem<T>> {
    let mut ranked: Vec<ScoredItem<T>> = items
        .into_iter()
        .map(|item| {
            let components = match component_scores.get(&item.item_id()) {
                Some(scores) => *scores,
                None => {
                    tracing::warn!(item_id = item.item_id(), "no component scores; ranking as zero");
                    ComponentScores::default()
                }
            };
            let combined = components.combine(weights);

            ScoredItem {
                item,
                components,
                combined,
            }
        })
        .collect();

    // slice::sort_by は安定ソート
    ranked.sort_by(|a, b| b.combined.partial_cmp(&a.combined).unwrap_or(Ordering::Equal));

    if let Some(limit) = limit {
        ranked.truncate(limit);
    }

    ranked
}
