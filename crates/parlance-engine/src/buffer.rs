//! Owned-buffer wrapper for the engine's size-then-fill protocol.
//!
//! Several engine queries answer variable-length data the same way: a call
//! with a too-small buffer fails with the required size, and the caller
//! retries with a buffer of exactly that size. Every decode site used to
//! repeat this dance; `fetch_sized` performs it once and hands back an owned
//! buffer.

use crate::error::{EngineCallError, EngineResult};

/// Run a sized engine query and return its answer as an owned `Vec`.
///
/// `call` receives the destination buffer and returns the number of entries
/// written. The first invocation probes with an empty buffer; on
/// [`EngineCallError::BufferTooSmall`] the query is retried exactly once with
/// a buffer of the reported size. Any other error, including a second
/// size signal, is propagated to the caller.
///
/// An answer of zero entries yields an empty `Vec`; whether that is valid is
/// the caller's call.
pub fn fetch_sized<T, F>(mut call: F) -> EngineResult<Vec<T>>
where
    T: Default + Clone,
    F: FnMut(&mut [T]) -> EngineResult<usize>,
{
    match call(&mut []) {
        Ok(_) => Ok(Vec::new()),
        Err(EngineCallError::BufferTooSmall { needed }) => {
            let mut buf = vec![T::default(); needed];
            let written = call(&mut buf)?;
            buf.truncate(written);
            Ok(buf)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::codes;

    #[test]
    fn test_two_phase_fetch() {
        let data: Vec<u32> = vec![10, 20, 30];
        let mut calls = 0;

        let out = fetch_sized(|buf: &mut [u32]| {
            calls += 1;
            if buf.len() < data.len() {
                return Err(EngineCallError::BufferTooSmall { needed: data.len() });
            }
            buf[..data.len()].copy_from_slice(&data);
            Ok(data.len())
        })
        .unwrap();

        assert_eq!(out, vec![10, 20, 30]);
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_zero_size_answer_is_empty_vec() {
        let out: Vec<u32> = fetch_sized(|_buf| Ok(0)).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_failure_propagates() {
        let result: EngineResult<Vec<u32>> =
            fetch_sized(|_buf| Err(EngineCallError::failed(codes::GRAMMAR_ERROR, "bad")));
        assert!(matches!(result, Err(EngineCallError::Failed { .. })));
    }

    #[test]
    fn test_failure_on_fill_call_propagates() {
        let mut calls = 0;
        let result: EngineResult<Vec<u32>> = fetch_sized(|_buf| {
            calls += 1;
            if calls == 1 {
                Err(EngineCallError::BufferTooSmall { needed: 4 })
            } else {
                Err(EngineCallError::failed(codes::GRAMMAR_ERROR, "gone"))
            }
        });
        assert!(result.is_err());
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_no_second_retry_on_repeated_size_signal() {
        let mut calls = 0;
        let result: EngineResult<Vec<u32>> = fetch_sized(|_buf| {
            calls += 1;
            Err(EngineCallError::BufferTooSmall { needed: 8 })
        });
        assert!(matches!(
            result,
            Err(EngineCallError::BufferTooSmall { needed: 8 })
        ));
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_partial_fill_truncates() {
        let out = fetch_sized(|buf: &mut [u32]| {
            if buf.is_empty() {
                return Err(EngineCallError::BufferTooSmall { needed: 8 });
            }
            buf[0] = 7;
            buf[1] = 9;
            Ok(2)
        })
        .unwrap();
        assert_eq!(out, vec![7, 9]);
    }
}
