//! The engine's recognition-result graph.
//!
//! After a phrase finishes, the engine exposes the recognition alternatives
//! as a graph; the "best path" is the selected word sequence. Both queries
//! follow the size-then-fill protocol (see [`crate::buffer::fetch_sized`]).

use crate::error::EngineResult;

/// Identifier of one node in a result graph's best path.
pub type NodeId = u32;

/// Fixed-size portion of a word-node record, filled by
/// [`ResultGraph::word_node`] on a successful fetch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WordNodeMeta {
    /// Engine-assigned numeric word id.
    pub word_id: u32,
    /// Parse tag of the grammar rule this node matched; zero when the engine
    /// reported none.
    pub parse_tag: u32,
}

/// One recognition result, owned for the duration of a single phrase-finish
/// notification.
///
/// Dropping the value releases the engine-side result handle; the grammar
/// layer must let that happen on every path, including decode failures.
pub trait ResultGraph: Send {
    /// Copy the best-path node ids into `buf` in path order and return the
    /// number of entries written. A too-small buffer fails with
    /// [`crate::error::EngineCallError::BufferTooSmall`] and writes nothing.
    fn best_path(&self, buf: &mut [NodeId]) -> EngineResult<usize>;

    /// Fetch one word node: fill `meta` and copy the word's UTF-8 text into
    /// `text`, returning the number of bytes written. Sized like
    /// [`ResultGraph::best_path`].
    fn word_node(&self, node: NodeId, meta: &mut WordNodeMeta, text: &mut [u8])
        -> EngineResult<usize>;
}
