//! Best-path result decoding.
//!
//! Walks the engine's result graph and flattens the best recognition path
//! into an ordered word list. Path order is spoken order and is preserved
//! exactly. Any decode step that answers zero size is treated as corruption
//! of this result, not of the session.

use parlance_core::types::RecognizedWord;
use parlance_engine::{fetch_sized, NodeId, ResultGraph, WordNodeMeta};

use crate::error::GrammarError;

/// A decoded phrase: the matched rule's parse tag (if any) plus the ordered
/// word list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPhrase {
    pub rule_tag: Option<u32>,
    pub words: Vec<RecognizedWord>,
}

/// Decode the best recognition path of `graph` into a word sequence.
///
/// Fails with [`GrammarError::InvalidResult`] on any decoding corruption:
/// an empty best path, a word node with no size, or text that is not valid
/// UTF-8. The caller still owns the graph and releases it by dropping it.
pub fn decode_best_path(graph: &dyn ResultGraph) -> Result<DecodedPhrase, GrammarError> {
    let path: Vec<NodeId> = fetch_sized(|buf| graph.best_path(buf))
        .map_err(|e| GrammarError::InvalidResult(format!("best path query failed: {e}")))?;

    if path.is_empty() {
        return Err(GrammarError::InvalidResult(
            "result has an empty best path".to_string(),
        ));
    }

    let mut words = Vec::with_capacity(path.len());
    let mut rule_tag = None;

    for node in path {
        let mut meta = WordNodeMeta::default();
        let text_bytes = fetch_sized(|buf| graph.word_node(node, &mut meta, buf))
            .map_err(|e| GrammarError::InvalidResult(format!("word node {node} failed: {e}")))?;

        if text_bytes.is_empty() {
            return Err(GrammarError::InvalidResult(format!(
                "word node {node} has no size"
            )));
        }

        let text = String::from_utf8(text_bytes).map_err(|_| {
            GrammarError::InvalidResult(format!("word node {node} text is not valid UTF-8"))
        })?;

        // The first tagged node names the rule that matched; later tags
        // belong to nested sub-rules and stay per-word only.
        if rule_tag.is_none() && meta.parse_tag != 0 {
            rule_tag = Some(meta.parse_tag);
        }

        words.push(RecognizedWord {
            id: meta.word_id,
            text,
            parse_tag: (meta.parse_tag != 0).then_some(meta.parse_tag),
        });
    }

    Ok(DecodedPhrase { rule_tag, words })
}
