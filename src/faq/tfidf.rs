//! TF-IDF vectors and cosine similarity over a fixed document set.

use std::collections::HashMap;

use super::stop_words::is_stop_word;

/// Sparse, L2-normalized term vector keyed by vocabulary index.
type TermVector = HashMap<usize, f64>;

/// TF-IDF index fitted once over a set of documents.
///
/// Weights use raw term counts and smoothed inverse document frequency,
/// `ln((1 + n) / (1 + df)) + 1`. Document and query vectors are
/// L2-normalized, so similarity is a plain dot product.
#[derive(Debug, Clone, Default)]
pub struct TfidfIndex {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    documents: Vec<TermVector>,
}

impl TfidfIndex {
    /// Build the vocabulary and document vectors.
    pub fn fit<S: AsRef<str>>(documents: &[S]) -> Self {
        let tokenized: Vec<Vec<String>> = documents.iter().map(|d| tokenize(d.as_ref())).collect();

        let mut vocabulary = HashMap::new();
        let mut document_frequency: Vec<usize> = Vec::new();
        for tokens in &tokenized {
            let mut seen = Vec::new();
            for token in tokens {
                let next = vocabulary.len();
                let index = *vocabulary.entry(token.clone()).or_insert(next);
                if index == document_frequency.len() {
                    document_frequency.push(0);
                }
                if !seen.contains(&index) {
                    seen.push(index);
                    document_frequency[index] += 1;
                }
            }
        }

        let n = documents.len() as f64;
        let idf = document_frequency
            .iter()
            .map(|&df| ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0)
            .collect();

        let mut index = Self {
            vocabulary,
            idf,
            documents: Vec::with_capacity(tokenized.len()),
        };
        index.documents = tokenized.iter().map(|t| index.vectorize(t)).collect();
        index
    }

    /// Cosine similarity of `query` against every document, in document order.
    pub fn similarities(&self, query: &str) -> Vec<f64> {
        let query = self.vectorize(&tokenize(query));
        self.documents
            .iter()
            .map(|document| {
                query
                    .iter()
                    .filter_map(|(term, weight)| document.get(term).map(|w| w * weight))
                    .sum::<f64>()
            })
            .collect()
    }

    /// Terms outside the vocabulary are dropped.
    fn vectorize(&self, tokens: &[String]) -> TermVector {
        let mut vector = TermVector::new();
        for token in tokens {
            if let Some(&index) = self.vocabulary.get(token) {
                *vector.entry(index).or_insert(0.0) += 1.0;
            }
        }
        for (index, weight) in &mut vector {
            *weight *= self.idf[*index];
        }

        let norm = vector.values().map(|w| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for weight in vector.values_mut() {
                *weight /= norm;
            }
        }
        vector
    }
}

/// Lowercase runs of two or more word characters, minus stop words.
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|token| token.chars().count() >= 2 && !is_stop_word(token))
        .map(str::to_string)
        .collect()
}
