//! FAQ matching for the chat endpoint.
//!
//! Questions from the FAQ file are indexed with TF-IDF. A user query is
//! answered with the closest entry's answer when its similarity clears
//! the configured threshold, and escalated otherwise.
//!
//! # Example
//!
//! ```rust
//! use unibot::faq::{FaqEntry, FaqId, FaqResponder, Verdict};
//!
//! let entries = vec![FaqEntry {
//!     id: FaqId::Number(1),
//!     question: "What are the tuition fees?".to_string(),
//!     answer: "Tuition is 1,20,000 per year.".to_string(),
//! }];
//! let responder = FaqResponder::new(entries, 0.35);
//!
//! assert!(matches!(responder.respond("tuition fees"), Verdict::Answered { .. }));
//! ```

mod stop_words;
mod tfidf;

pub use tfidf::TfidfIndex;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::error::Result;

/// Default minimum similarity for answering without escalation.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.35;

/// FAQ identifier, numeric or textual as written in the FAQ file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FaqId {
    Number(i64),
    Text(String),
}

impl fmt::Display for FaqId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// One question/answer pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqEntry {
    pub id: FaqId,
    pub question: String,
    pub answer: String,
}

/// Closest FAQ entry for a query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaqMatch<'a> {
    pub entry: &'a FaqEntry,
    pub score: f64,
}

/// How a query should be handled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Verdict<'a> {
    /// Query was blank after trimming.
    Empty,
    /// Similar enough to an entry to answer with it.
    Answered(FaqMatch<'a>),
    /// Not similar enough; forward to an administrator.
    Escalate {
        score: f64,
        best: Option<&'a FaqEntry>,
    },
}

/// Answers queries from a fixed set of FAQ entries.
#[derive(Debug, Clone)]
pub struct FaqResponder {
    entries: Vec<FaqEntry>,
    index: TfidfIndex,
    threshold: f64,
}

impl FaqResponder {
    /// Index `entries` by question.
    pub fn new(entries: Vec<FaqEntry>, threshold: f64) -> Self {
        let questions: Vec<&str> = entries.iter().map(|e| e.question.as_str()).collect();
        let index = TfidfIndex::fit(&questions[..]);
        Self {
            entries,
            index,
            threshold,
        }
    }

    /// Load entries from a JSON array file and index them.
    pub async fn load(path: impl AsRef<Path>, threshold: f64) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path.as_ref()).await?;
        let entries: Vec<FaqEntry> = serde_json::from_str(&raw)?;
        Ok(Self::new(entries, threshold))
    }

    #[must_use]
    pub fn entries(&self) -> &[FaqEntry] {
        &self.entries
    }

    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Highest-scoring entry. The earliest entry wins ties, so a query
    /// that matches nothing still yields the first entry with score 0.
    pub fn best_match(&self, query: &str) -> Option<FaqMatch<'_>> {
        let scores = self.index.similarities(query);
        let mut best: Option<(usize, f64)> = None;
        for (i, score) in scores.into_iter().enumerate() {
            if best.is_none_or(|(_, top)| score > top) {
                best = Some((i, score));
            }
        }
        best.map(|(i, score)| FaqMatch {
            entry: &self.entries[i],
            score,
        })
    }

    /// Entries without an answer are never used to answer, however close.
    pub fn respond(&self, query: &str) -> Verdict<'_> {
        let query = query.trim();
        if query.is_empty() {
            return Verdict::Empty;
        }

        match self.best_match(query) {
            Some(found) if found.score >= self.threshold && !found.entry.answer.is_empty() => {
                Verdict::Answered(found)
            }
            Some(found) => Verdict::Escalate {
                score: found.score,
                best: Some(found.entry),
            },
            None => Verdict::Escalate {
                score: 0.0,
                best: None,
            },
        }
    }
}
