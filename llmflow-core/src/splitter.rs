//! `DataSplitter::split_if_needed`: fits an oversized payload into
//! token-budgeted chunks while never splitting an atom (paragraph, list
//! item, or map entry).
//!
//! No teacher equivalent exists (the teacher always sends a whole prompt
//! in one request); grounded on `spec.md` §4.2's budget formula and
//! greedy-pack algorithm, reusing [`crate::token::TokenCalculator`] for
//! the token counts the formula needs.

use llmflow_provider::model::ModelInfo;

use crate::token::TokenCalculator;

/// The payload shape `split_if_needed` accepts — a string, an ordered
/// sequence of atoms, or a mapping of key/value atoms, each splittable
/// only at its own atom boundaries.
#[derive(Debug, Clone)]
pub enum SplittableData {
    Text(String),
    Sequence(Vec<String>),
    Mapping(Vec<(String, String)>),
}

/// One chunk of a (possibly unsplit) payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataChunk {
    pub content: String,
    pub token_count: u64,
    pub chunk_index: u32,
    pub total_chunks: u32,
}

pub struct SplitRequest<'a> {
    pub message: &'a str,
    pub data: &'a SplittableData,
    pub ending_message: &'a str,
    pub model_info: &'a ModelInfo,
    pub max_response_tokens: u64,
    pub max_chars_per_chunk: Option<usize>,
}

/// Computes the token budget available for `data` given the fixed
/// overhead of the surrounding message, ending message, reserved
/// response tokens, and a 50-token safety margin.
fn budget(req: &SplitRequest<'_>, counter: &TokenCalculator) -> i64 {
    let tokenization_model = req.model_info.tokenization_model.as_deref();
    let message_tokens = counter.count(req.message, tokenization_model);
    let ending_tokens = counter.count(req.ending_message, tokenization_model);
    req.model_info.max_request_tokens as i64
        - message_tokens as i64
        - ending_tokens as i64
        - req.max_response_tokens as i64
        - 50
}

/// Splits `req.data` into budget-fitting chunks, or returns a single
/// chunk unsplit if it already fits.
pub fn split_if_needed(req: SplitRequest<'_>, counter: &TokenCalculator) -> Vec<DataChunk> {
    let tokenization_model = req.model_info.tokenization_model.as_deref();
    let budget = budget(&req, counter).max(0) as u64;

    let whole = data_as_text(req.data);
    if counter.count(&whole, tokenization_model) <= budget {
        return vec![DataChunk { content: whole.clone(), token_count: counter.count(&whole, tokenization_model), chunk_index: 0, total_chunks: 1 }];
    }

    let raw_chunks: Vec<String> = match req.data {
        SplittableData::Text(text) => pack_atoms(split_paragraphs(text), "\n\n", budget, counter, tokenization_model),
        SplittableData::Sequence(items) => pack_atoms(items.clone(), "\n", budget, counter, tokenization_model),
        SplittableData::Mapping(entries) => {
            let rendered: Vec<String> = entries.iter().map(|(k, v)| format!("{k}: {v}")).collect();
            pack_atoms(rendered, "\n", budget, counter, tokenization_model)
        }
    };

    let total = raw_chunks.len() as u32;
    raw_chunks
        .into_iter()
        .enumerate()
        .map(|(i, content)| {
            let token_count = counter.count(&content, tokenization_model);
            DataChunk { content, token_count, chunk_index: i as u32, total_chunks: total }
        })
        .collect()
}

fn data_as_text(data: &SplittableData) -> String {
    match data {
        SplittableData::Text(text) => text.clone(),
        SplittableData::Sequence(items) => items.join("\n"),
        SplittableData::Mapping(entries) => entries.iter().map(|(k, v)| format!("{k}: {v}")).collect::<Vec<_>>().join("\n"),
    }
}

fn split_paragraphs(text: &str) -> Vec<String> {
    text.split("\n\n").map(str::to_string).collect()
}

/// Greedily packs atoms into chunks that each stay within `budget`
/// tokens, joining packed atoms with `separator`. Never splits an atom;
/// an oversized atom is emitted alone with its overrun token count.
fn pack_atoms(atoms: Vec<String>, separator: &str, budget: u64, counter: &TokenCalculator, tokenization_model: Option<&str>) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut current_tokens: u64 = 0;

    for atom in atoms {
        let atom_tokens = counter.count(&atom, tokenization_model);
        let separator_tokens = if current.is_empty() { 0 } else { counter.count(separator, tokenization_model) };

        if !current.is_empty() && current_tokens + separator_tokens + atom_tokens > budget {
            chunks.push(current.join(separator));
            current = Vec::new();
            current_tokens = 0;
        }

        current_tokens += atom_tokens + if current.is_empty() { 0 } else { counter.count(separator, tokenization_model) };
        current.push(atom);
    }

    if !current.is_empty() {
        chunks.push(current.join(separator));
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use llmflow_provider::model::{Capabilities, Characteristics};

    fn model_info(max_request_tokens: u64) -> ModelInfo {
        ModelInfo {
            name: "m".into(),
            input_price_per_million: 1.0,
            input_cached_price_per_million: None,
            output_price_per_million: 1.0,
            max_request_tokens,
            max_response_tokens: 100,
            tokenization_model: None,
            capabilities: Capabilities::default(),
            characteristics: Characteristics { quality_index: 50, output_speed: 50.0, first_token_latency: 500.0 },
        }
    }

    #[test]
    fn fits_in_one_chunk_when_within_budget() {
        let counter = TokenCalculator::new();
        let info = model_info(100_000);
        let data = SplittableData::Text("short text".into());
        let chunks = split_if_needed(
            SplitRequest { message: "m", data: &data, ending_message: "e", model_info: &info, max_response_tokens: 100, max_chars_per_chunk: None },
            &counter,
        );
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].total_chunks, 1);
    }

    #[test]
    fn splits_oversized_text_on_paragraph_boundaries() {
        let counter = TokenCalculator::new();
        let info = model_info(150);
        let paragraphs: Vec<String> = (0..20).map(|i| format!("paragraph number {i} with some extra padding words here")).collect();
        let data = SplittableData::Text(paragraphs.join("\n\n"));
        let chunks = split_if_needed(
            SplitRequest { message: "m", data: &data, ending_message: "e", model_info: &info, max_response_tokens: 10, max_chars_per_chunk: None },
            &counter,
        );
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert_eq!(chunk.total_chunks, chunks.len() as u32);
        }
        let reassembled = chunks.iter().map(|c| c.content.clone()).collect::<Vec<_>>().join("\n\n");
        assert_eq!(reassembled, data_as_text(&data));
    }

    #[test]
    fn never_splits_a_sequence_item() {
        let counter = TokenCalculator::new();
        let info = model_info(120);
        let items: Vec<String> = (0..10).map(|i| format!("item-{i}-with-long-content-padding")).collect();
        let data = SplittableData::Sequence(items.clone());
        let chunks = split_if_needed(
            SplitRequest { message: "m", data: &data, ending_message: "e", model_info: &info, max_response_tokens: 10, max_chars_per_chunk: None },
            &counter,
        );
        for item in &items {
            assert!(chunks.iter().any(|c| c.content.contains(item.as_str())));
        }
    }

    #[test]
    fn oversized_single_atom_is_emitted_with_overrun() {
        let counter = TokenCalculator::new();
        let info = model_info(20);
        let huge_item = "x".repeat(1000);
        let data = SplittableData::Sequence(vec![huge_item.clone()]);
        let chunks = split_if_needed(
            SplitRequest { message: "m", data: &data, ending_message: "e", model_info: &info, max_response_tokens: 1, max_chars_per_chunk: None },
            &counter,
        );
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, huge_item);
    }
}
