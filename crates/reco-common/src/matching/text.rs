use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::{similarity::cosine_similarity, tokenizer::tokenize};

/// TF-IDF の語彙と idf をまとめたもの
///
/// リクエストごとに fit して使い捨てる。プロセス全体で共有すると、同時に来た
/// 別リクエストのコーパスで idf がずれて同じ求人のスコアが変わってしまう。
#[derive(Debug, Clone)]
pub struct TfIdfModel {
    /// term → 次元インデックス（辞書順で採番）
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
}

impl TfIdfModel {
    /// トークン化済みの文書群から語彙と smoothed idf を求める
    ///
    /// idf(t) = ln((1 + n) / (1 + df(t))) + 1
    pub fn fit(documents: &[Vec<String>]) -> Self {
        let mut document_frequency: BTreeMap<&str, usize> = BTreeMap::new();
        for document in documents {
            let unique: BTreeSet<&str> = document.iter().map(String::as_str).collect();
            for term in unique {
                *document_frequency.entry(term).or_insert(0) += 1;
            }
        }

        let n = documents.len() as f64;
        let mut vocabulary = HashMap::with_capacity(document_frequency.len());
        let mut idf = Vec::with_capacity(document_frequency.len());

        for (index, (term, df)) in document_frequency.into_iter().enumerate() {
            vocabulary.insert(term.to_string(), index);
            idf.push(((1.0 + n) / (1.0 + df as f64)).ln() + 1.0);
        }

        Self { vocabulary, idf }
    }

    pub fn dimension(&self) -> usize {
        self.idf.len()
    }

    /// 生の出現回数 × idf を L2 正規化したベクトル。語彙外の語は無視
    pub fn transform(&self, tokens: &[String]) -> Vec<f64> {
        let mut vector = vec![0.0f64; self.dimension()];

        for token in tokens {
            if let Some(&index) = self.vocabulary.get(token) {
                vector[index] += 1.0;
            }
        }

        for (value, idf) in vector.iter_mut().zip(&self.idf) {
            *value *= idf;
        }

        let norm: f64 = vector.iter().map(|x| x * x).sum::<f64>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }

        vector
    }
}

/// コーパス各文書とクエリのテキスト類似度（0.0〜1.0、コーパス順）
///
/// クエリはコーパス末尾の文書として一緒に fit するので、クエリにしか
/// 出てこない語も語彙と df に含まれる。空コーパスなら何も計算せず空を返す。
pub fn text_relevance<S: AsRef<str>>(corpus: &[S], query: &str) -> Vec<f64> {
    if corpus.is_empty() {
        return Vec::new();
    }

    let mut documents: Vec<Vec<String>> = corpus.iter().map(|doc| tokenize(doc.as_ref())).collect();
    documents.push(tokenize(query));

    let model = TfIdfModel::fit(&documents);
    let vectors: Vec<Vec<f64>> = documents.iter().map(|doc| model.transform(doc)).collect();

    let Some((query_vector, corpus_vectors)) = vectors.split_last() else {
        return Vec::new();
    };

    tracing::debug!(
        documents = corpus_vectors.len(),
        vocabulary = model.dimension(),
        "text relevance model fitted"
    );

    corpus_vectors
        .iter()
        .map(|vector| cosine_similarity(query_vector, vector))
        .collect()
}
