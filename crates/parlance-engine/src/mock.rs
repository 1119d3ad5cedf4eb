//! Scriptable in-memory engine for tests and demos.
//!
//! `MockEngine` implements every engine capability, records invocations, and
//! can be scripted to fail specific calls with specific diagnostic codes.
//! `MockResultGraph` speaks the real size-then-fill protocol so decoder
//! tests exercise the same paths a live engine would.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use parlance_core::types::WindowHandle;

use crate::capability::{CapabilityError, CapabilityHandle, CapabilityId, CapabilityProvider};
use crate::error::{codes, EngineCallError, EngineCode, EngineResult};
use crate::recognizer::{
    EngineControl, EngineVersion, GrammarChannel, GrammarFormat, Recognizer, SpeakerInfo,
    WindowSystem,
};
use crate::result::{NodeId, ResultGraph, WordNodeMeta};
use crate::sink::{EngineSink, GrammarSink};

#[derive(Default)]
struct MockState {
    loads: Mutex<Vec<(GrammarFormat, Vec<u8>)>>,
    fail_next_load: Mutex<Option<EngineCode>>,
    fail_next_activate: Mutex<Option<EngineCode>>,
    fail_next_deactivate: Mutex<Option<EngineCode>>,
    activate_calls: Mutex<Vec<(Option<WindowHandle>, bool, String)>>,
    deactivate_calls: Mutex<Vec<String>>,
    special_calls: Mutex<Vec<bool>>,
    resume_cookies: Mutex<Vec<u64>>,
    released_channels: AtomicUsize,
    grammar_sinks: Mutex<Vec<Arc<dyn GrammarSink>>>,
    engine_sink: Mutex<Option<Arc<dyn EngineSink>>>,
    profile: Mutex<Option<String>>,
}

/// In-memory speech engine. Clones share state, so a clone can be handed to
/// the code under test while the original scripts failures and reads
/// counters.
#[derive(Clone, Default)]
pub struct MockEngine {
    state: Arc<MockState>,
}

impl MockEngine {
    pub fn new() -> Self {
        let engine = Self::default();
        *engine.state.profile.lock().expect("mock mutex poisoned") =
            Some("Default Profile".to_string());
        engine
    }

    /// Script the next `grammar_load` to fail with `code`.
    pub fn fail_next_load(&self, code: EngineCode) {
        *self.state.fail_next_load.lock().expect("mock mutex poisoned") = Some(code);
    }

    /// Script the next `activate` to fail with `code`.
    pub fn fail_next_activate(&self, code: EngineCode) {
        *self
            .state
            .fail_next_activate
            .lock()
            .expect("mock mutex poisoned") = Some(code);
    }

    /// Script the next `deactivate` to fail with `code`.
    pub fn fail_next_deactivate(&self, code: EngineCode) {
        *self
            .state
            .fail_next_deactivate
            .lock()
            .expect("mock mutex poisoned") = Some(code);
    }

    /// Set the speaker profile reported by the `SpeakerInfo` capability.
    pub fn set_profile(&self, name: Option<&str>) {
        *self.state.profile.lock().expect("mock mutex poisoned") = name.map(str::to_string);
    }

    pub fn load_count(&self) -> usize {
        self.state.loads.lock().expect("mock mutex poisoned").len()
    }

    pub fn activate_count(&self) -> usize {
        self.state
            .activate_calls
            .lock()
            .expect("mock mutex poisoned")
            .len()
    }

    pub fn deactivate_count(&self) -> usize {
        self.state
            .deactivate_calls
            .lock()
            .expect("mock mutex poisoned")
            .len()
    }

    pub fn special_calls(&self) -> Vec<bool> {
        self.state
            .special_calls
            .lock()
            .expect("mock mutex poisoned")
            .clone()
    }

    pub fn resume_cookies(&self) -> Vec<u64> {
        self.state
            .resume_cookies
            .lock()
            .expect("mock mutex poisoned")
            .clone()
    }

    pub fn released_channel_count(&self) -> usize {
        self.state.released_channels.load(Ordering::SeqCst)
    }

    /// The sink installed by the most recent `grammar_load`, for injecting
    /// notifications from tests.
    pub fn last_grammar_sink(&self) -> Option<Arc<dyn GrammarSink>> {
        self.state
            .grammar_sinks
            .lock()
            .expect("mock mutex poisoned")
            .last()
            .cloned()
    }

    /// Deliver a pause notification through the registered engine sink.
    pub fn fire_paused(&self, cookie: u64) {
        let sink = self
            .state
            .engine_sink
            .lock()
            .expect("mock mutex poisoned")
            .clone();
        if let Some(sink) = sink {
            sink.paused(cookie);
        }
    }
}

impl Recognizer for MockEngine {
    fn grammar_load(
        &self,
        format: GrammarFormat,
        bytes: &[u8],
        sink: Arc<dyn GrammarSink>,
    ) -> EngineResult<Arc<dyn GrammarChannel>> {
        if let Some(code) = self
            .state
            .fail_next_load
            .lock()
            .expect("mock mutex poisoned")
            .take()
        {
            return Err(EngineCallError::failed(code, "scripted load failure"));
        }

        self.state
            .loads
            .lock()
            .expect("mock mutex poisoned")
            .push((format, bytes.to_vec()));
        self.state
            .grammar_sinks
            .lock()
            .expect("mock mutex poisoned")
            .push(sink);

        Ok(Arc::new(MockGrammarChannel {
            state: Arc::clone(&self.state),
        }))
    }

    fn register_engine_sink(&self, sink: Arc<dyn EngineSink>) -> EngineResult<()> {
        *self.state.engine_sink.lock().expect("mock mutex poisoned") = Some(sink);
        Ok(())
    }
}

impl EngineControl for MockEngine {
    fn resume(&self, cookie: u64) -> EngineResult<()> {
        self.state
            .resume_cookies
            .lock()
            .expect("mock mutex poisoned")
            .push(cookie);
        Ok(())
    }

    fn version(&self) -> EngineResult<EngineVersion> {
        Ok(EngineVersion {
            major: 15,
            minor: 0,
            patch: 1,
        })
    }
}

impl SpeakerInfo for MockEngine {
    fn profile_name(&self, buf: &mut [u16]) -> EngineResult<usize> {
        let profile = self.state.profile.lock().expect("mock mutex poisoned");
        let name = profile.as_ref().ok_or_else(|| {
            EngineCallError::failed(codes::NO_PROFILE_SELECTED, "no speaker profile selected")
        })?;

        let units: Vec<u16> = name.encode_utf16().collect();
        if units.is_empty() {
            return Ok(0);
        }
        if buf.len() < units.len() {
            return Err(EngineCallError::BufferTooSmall {
                needed: units.len(),
            });
        }
        buf[..units.len()].copy_from_slice(&units);
        Ok(units.len())
    }
}

/// Per-grammar channel handed out by [`MockEngine::grammar_load`]. Its drop
/// increments the engine's released-channel counter.
pub struct MockGrammarChannel {
    state: Arc<MockState>,
}

impl GrammarChannel for MockGrammarChannel {
    fn activate(
        &self,
        window: Option<WindowHandle>,
        exclusive: bool,
        rule: &str,
    ) -> EngineResult<()> {
        if let Some(code) = self
            .state
            .fail_next_activate
            .lock()
            .expect("mock mutex poisoned")
            .take()
        {
            return Err(EngineCallError::failed(code, "scripted activate failure"));
        }
        self.state
            .activate_calls
            .lock()
            .expect("mock mutex poisoned")
            .push((window, exclusive, rule.to_string()));
        Ok(())
    }

    fn deactivate(&self, rule: &str) -> EngineResult<()> {
        if let Some(code) = self
            .state
            .fail_next_deactivate
            .lock()
            .expect("mock mutex poisoned")
            .take()
        {
            return Err(EngineCallError::failed(code, "scripted deactivate failure"));
        }
        self.state
            .deactivate_calls
            .lock()
            .expect("mock mutex poisoned")
            .push(rule.to_string());
        Ok(())
    }

    fn set_special(&self, exclusive: bool) -> EngineResult<()> {
        self.state
            .special_calls
            .lock()
            .expect("mock mutex poisoned")
            .push(exclusive);
        Ok(())
    }
}

impl Drop for MockGrammarChannel {
    fn drop(&mut self) {
        self.state.released_channels.fetch_add(1, Ordering::SeqCst);
    }
}

/// One word fixture inside a [`MockResultGraph`].
#[derive(Debug, Clone)]
pub struct MockWord {
    pub id: u32,
    pub parse_tag: u32,
    pub text: String,
}

/// Result graph backed by a fixture word list, answering both queries with
/// the real two-phase sized protocol.
pub struct MockResultGraph {
    words: Vec<MockWord>,
    zero_size_words: bool,
    released: Option<Arc<AtomicBool>>,
}

impl MockResultGraph {
    /// Build a graph from `(word_id, parse_tag, text)` fixtures; best-path
    /// order is fixture order.
    pub fn from_words(words: &[(u32, u32, &str)]) -> Self {
        Self {
            words: words
                .iter()
                .map(|&(id, parse_tag, text)| MockWord {
                    id,
                    parse_tag,
                    text: text.to_string(),
                })
                .collect(),
            zero_size_words: false,
            released: None,
        }
    }

    /// Corruption mode: every word-node size query answers zero bytes.
    pub fn with_zero_size_words(mut self) -> Self {
        self.zero_size_words = true;
        self
    }

    /// Set `flag` to true when this graph is dropped (handle released).
    pub fn with_release_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.released = Some(flag);
        self
    }
}

impl ResultGraph for MockResultGraph {
    fn best_path(&self, buf: &mut [NodeId]) -> EngineResult<usize> {
        let needed = self.words.len();
        if needed == 0 {
            return Ok(0);
        }
        if buf.len() < needed {
            return Err(EngineCallError::BufferTooSmall { needed });
        }
        for (i, slot) in buf.iter_mut().take(needed).enumerate() {
            *slot = i as NodeId;
        }
        Ok(needed)
    }

    fn word_node(
        &self,
        node: NodeId,
        meta: &mut WordNodeMeta,
        text: &mut [u8],
    ) -> EngineResult<usize> {
        let word = self.words.get(node as usize).ok_or_else(|| {
            EngineCallError::failed(codes::GRAMMAR_ERROR, format!("no node {node} in path"))
        })?;

        if self.zero_size_words {
            return Ok(0);
        }

        let bytes = word.text.as_bytes();
        if text.len() < bytes.len() {
            return Err(EngineCallError::BufferTooSmall {
                needed: bytes.len(),
            });
        }
        text[..bytes.len()].copy_from_slice(bytes);
        meta.word_id = word.id;
        meta.parse_tag = word.parse_tag;
        Ok(bytes.len())
    }
}

impl Drop for MockResultGraph {
    fn drop(&mut self) {
        if let Some(flag) = &self.released {
            flag.store(true, Ordering::SeqCst);
        }
    }
}

/// Window probe with a fixed answer.
pub struct MockWindowSystem {
    pub valid: bool,
}

impl WindowSystem for MockWindowSystem {
    fn is_window_valid(&self, _window: WindowHandle) -> bool {
        self.valid
    }
}

/// Capability provider backed by one shared [`MockEngine`].
pub struct MockProvider {
    engine: MockEngine,
    missing: Option<CapabilityId>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            engine: MockEngine::new(),
            missing: None,
        }
    }

    /// Provider that reports `id` as unsupported.
    pub fn without(id: CapabilityId) -> Self {
        Self {
            engine: MockEngine::new(),
            missing: Some(id),
        }
    }

    /// The engine behind every handle this provider serves.
    pub fn engine(&self) -> &MockEngine {
        &self.engine
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl CapabilityProvider for MockProvider {
    fn query(&self, id: CapabilityId) -> Result<CapabilityHandle, CapabilityError> {
        if self.missing == Some(id) {
            return Err(CapabilityError::Unsupported(id));
        }
        Ok(match id {
            CapabilityId::Recognizer => CapabilityHandle::Recognizer(Arc::new(self.engine.clone())),
            CapabilityId::EngineControl => {
                CapabilityHandle::EngineControl(Arc::new(self.engine.clone()))
            }
            CapabilityId::SpeakerInfo => {
                CapabilityHandle::SpeakerInfo(Arc::new(self.engine.clone()))
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::PhraseFlags;

    struct CountingSink(AtomicUsize);

    impl GrammarSink for CountingSink {
        fn phrase_finish(&self, _flags: PhraseFlags, _result: Option<Box<dyn ResultGraph>>) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_grammar_load_records_and_returns_channel() {
        let engine = MockEngine::new();
        let sink = Arc::new(CountingSink(AtomicUsize::new(0)));
        let channel = engine
            .grammar_load(GrammarFormat::Compiled, b"bytes", sink)
            .unwrap();

        assert_eq!(engine.load_count(), 1);
        channel.activate(None, false, "rule_a").unwrap();
        assert_eq!(engine.activate_count(), 1);
    }

    #[test]
    fn test_scripted_load_failure_fires_once() {
        let engine = MockEngine::new();
        engine.fail_next_load(codes::GRAMMAR_ERROR);

        let sink = Arc::new(CountingSink(AtomicUsize::new(0)));
        let err = engine
            .grammar_load(GrammarFormat::Compiled, b"bytes", sink.clone())
            .err()
            .expect("scripted load should fail");
        assert_eq!(err.code(), Some(codes::GRAMMAR_ERROR));
        assert_eq!(engine.load_count(), 0);

        // Next load succeeds again.
        assert!(engine
            .grammar_load(GrammarFormat::Compiled, b"bytes", sink)
            .is_ok());
    }

    #[test]
    fn test_channel_drop_counts_as_release() {
        let engine = MockEngine::new();
        let sink = Arc::new(CountingSink(AtomicUsize::new(0)));
        let channel = engine
            .grammar_load(GrammarFormat::Compiled, b"bytes", sink)
            .unwrap();

        assert_eq!(engine.released_channel_count(), 0);
        drop(channel);
        assert_eq!(engine.released_channel_count(), 1);
    }

    #[test]
    fn test_injected_notification_reaches_sink() {
        let engine = MockEngine::new();
        let sink = Arc::new(CountingSink(AtomicUsize::new(0)));
        engine
            .grammar_load(GrammarFormat::Compiled, b"bytes", sink.clone())
            .unwrap();

        let delivered = engine.last_grammar_sink().unwrap();
        delivered.phrase_finish(PhraseFlags::RECOGNIZED, None);
        assert_eq!(sink.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_result_graph_two_phase_protocol() {
        let graph = MockResultGraph::from_words(&[(10, 1, "HELLO"), (11, 0, "WORLD")]);

        let mut path = [0u32; 0];
        let err = graph.best_path(&mut path).unwrap_err();
        assert!(matches!(err, EngineCallError::BufferTooSmall { needed: 2 }));

        let mut path = [0u32; 2];
        assert_eq!(graph.best_path(&mut path).unwrap(), 2);

        let mut meta = WordNodeMeta::default();
        let err = graph.word_node(path[0], &mut meta, &mut []).unwrap_err();
        assert!(matches!(err, EngineCallError::BufferTooSmall { needed: 5 }));

        let mut text = vec![0u8; 5];
        let written = graph.word_node(path[0], &mut meta, &mut text).unwrap();
        assert_eq!(&text[..written], b"HELLO");
        assert_eq!(meta.word_id, 10);
        assert_eq!(meta.parse_tag, 1);
    }

    #[test]
    fn test_result_graph_release_flag() {
        let flag = Arc::new(AtomicBool::new(false));
        let graph =
            MockResultGraph::from_words(&[(1, 0, "go")]).with_release_flag(Arc::clone(&flag));
        assert!(!flag.load(Ordering::SeqCst));
        drop(graph);
        assert!(flag.load(Ordering::SeqCst));
    }

    #[test]
    fn test_fire_paused_reaches_engine_sink() {
        struct PauseSink(Mutex<Vec<u64>>);
        impl EngineSink for PauseSink {
            fn paused(&self, cookie: u64) {
                self.0.lock().unwrap().push(cookie);
            }
        }

        let engine = MockEngine::new();
        let sink = Arc::new(PauseSink(Mutex::new(Vec::new())));
        engine.register_engine_sink(sink.clone()).unwrap();
        engine.fire_paused(99);
        assert_eq!(*sink.0.lock().unwrap(), vec![99]);
    }
}
