//! Unary completion boundary: encoded Location in, encoded results out
//!
//! Transport is left to the caller; this only decodes the request,
//! asks the completer for candidates and encodes the answer.

use tracing::debug;

use super::{CodeCompleteResults, CompletionString};
use crate::error::Result;
use crate::symbol::{Location, LocationView};

/// Produces completion candidates at a cursor position
pub trait CodeCompleter {
    type Candidate: CompletionString;

    fn complete_at(&self, file_name: &str, line: u32, col: u32) -> Vec<Self::Candidate>;
}

/// Handler for `Completion(Location) -> CodeCompleteResults`
pub struct CompletionService<C> {
    completer: C,
}

impl<C: CodeCompleter> CompletionService<C> {
    pub fn new(completer: C) -> Self {
        Self { completer }
    }

    /// Decode a request produced by `Location::serialize_request` and
    /// return the encoded results. A malformed request is a decode error.
    pub fn handle(&self, request: &[u8]) -> Result<Vec<u8>> {
        let loc = LocationView::open(request)?;
        let results = self.complete(&loc.unmarshal()?);
        Ok(results.serialize())
    }

    pub fn complete(&self, loc: &Location) -> CodeCompleteResults {
        let candidates = self.completer.complete_at(&loc.file_name, loc.line, loc.col);
        debug!(
            "Completion at {}:{}:{} produced {} candidates",
            loc.file_name,
            loc.line,
            loc.col,
            candidates.len()
        );
        CodeCompleteResults::from_candidates(&candidates)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::completion::{ChunkKind, CodeCompleteResultsView, CompletionCandidate};

    #[derive(Default)]
    struct FakeCompleter {
        seen: RefCell<Vec<(String, u32, u32)>>,
    }

    impl CodeCompleter for FakeCompleter {
        type Candidate = CompletionCandidate;

        fn complete_at(&self, file_name: &str, line: u32, col: u32) -> Vec<CompletionCandidate> {
            self.seen
                .borrow_mut()
                .push((file_name.to_string(), line, col));
            if line == 0 {
                return Vec::new();
            }
            vec![
                CompletionCandidate::new([
                    (ChunkKind::ResultType, "size_t"),
                    (ChunkKind::TypedText, "size"),
                    (ChunkKind::Other, "()"),
                ]),
                CompletionCandidate::new([
                    (ChunkKind::ResultType, "bool"),
                    (ChunkKind::TypedText, "empty"),
                    (ChunkKind::Other, "()"),
                ]),
            ]
        }
    }

    #[test]
    fn test_handle_roundtrip() {
        let service = CompletionService::new(FakeCompleter::default());
        let request = Location::new("vec.cc", 12, 9, 0, "").serialize_request();

        let response = service.handle(&request).unwrap();
        let view = CodeCompleteResultsView::open(&response).unwrap();
        let items = view.unmarshal().unwrap().results;

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].word, "size");
        assert_eq!(items[0].abbr, "size()");
        assert_eq!(items[1].kind, "bool");
        assert_eq!(
            service.completer.seen.borrow().as_slice(),
            &[("vec.cc".to_string(), 12, 9)]
        );
    }

    #[test]
    fn test_no_candidates() {
        let service = CompletionService::new(FakeCompleter::default());
        let request = Location::new("vec.cc", 0, 1, 0, "").serialize_request();
        let response = service.handle(&request).unwrap();
        let view = CodeCompleteResultsView::open(&response).unwrap();
        assert!(view.results().unwrap().is_empty());
    }

    #[test]
    fn test_malformed_request() {
        let service = CompletionService::new(FakeCompleter::default());
        assert!(service.handle(&[1, 2]).is_err());
        assert!(service.completer.seen.borrow().is_empty());
    }
}
