//! Code-completion results
//!
//! Converts parser completion strings into vim-style complete-items and
//! encodes them as a `CodeCompleteResults` buffer.

pub mod service;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::encoding::schema::{code_complete_results, complete_item};
use crate::encoding::{Builder, Offset, Table};
use crate::error::Result;

/// Kind of one chunk of a completion string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkKind {
    /// Text the user is expected to type
    TypedText,
    /// Type of the completed entity
    ResultType,
    /// Placeholders, punctuation and everything else
    Other,
}

/// One completion candidate as produced by the parser
pub trait CompletionString {
    fn chunk_count(&self) -> usize;
    fn chunk(&self, index: usize) -> (ChunkKind, &str);
}

/// Owned candidate, for callers that already extracted the chunks
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionCandidate {
    pub chunks: Vec<(ChunkKind, String)>,
}

impl CompletionCandidate {
    pub fn new<I, S>(chunks: I) -> Self
    where
        I: IntoIterator<Item = (ChunkKind, S)>,
        S: Into<String>,
    {
        Self {
            chunks: chunks
                .into_iter()
                .map(|(kind, text)| (kind, text.into()))
                .collect(),
        }
    }
}

impl CompletionString for CompletionCandidate {
    fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    fn chunk(&self, index: usize) -> (ChunkKind, &str) {
        let (kind, text) = &self.chunks[index];
        (*kind, text)
    }
}

/// A vim complete-items dictionary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompleteItem {
    /// Text that will be inserted
    pub word: String,
    /// Shown in the menu instead of `word` when not empty
    pub abbr: String,
    /// Extra text shown after `word` or `abbr`
    pub menu: String,
    /// Preview window text
    pub info: String,
    pub kind: String,
    pub icase: bool,
    pub dup: bool,
}

impl CompleteItem {
    /// Typed text goes into the word and the placeholder, the result type
    /// becomes the kind, everything else only extends the placeholder.
    pub fn from_completion<S: CompletionString + ?Sized>(cs: &S) -> Self {
        let mut word = String::new();
        let mut typ = String::new();
        let mut placeholder = String::new();

        for i in 0..cs.chunk_count() {
            match cs.chunk(i) {
                (ChunkKind::TypedText, text) => {
                    word.push_str(text);
                    placeholder.push_str(text);
                }
                (ChunkKind::ResultType, text) => typ.push_str(text),
                (ChunkKind::Other, text) => placeholder.push_str(text),
            }
        }

        Self {
            word,
            abbr: placeholder.clone(),
            menu: String::new(),
            info: placeholder,
            kind: typ,
            icase: true,
            dup: true,
        }
    }

    pub(crate) fn encode(&self, builder: &mut Builder) -> Offset {
        let word = builder.create_string(&self.word);
        let abbr = builder.create_string(&self.abbr);
        let menu = builder.create_string(&self.menu);
        let info = builder.create_string(&self.info);
        let kind = builder.create_string(&self.kind);

        builder.start_table(complete_item::FIELD_COUNT);
        builder.add_offset(complete_item::WORD, word);
        builder.add_offset(complete_item::ABBR, abbr);
        builder.add_offset(complete_item::MENU, menu);
        builder.add_offset(complete_item::INFO, info);
        builder.add_offset(complete_item::KIND, kind);
        builder.add_bool(complete_item::ICASE, self.icase, false);
        builder.add_bool(complete_item::DUP, self.dup, false);
        builder.end_table()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CompleteItemView<'a> {
    table: Table<'a>,
}

impl<'a> CompleteItemView<'a> {
    pub fn word(&self) -> Result<&'a str> {
        self.table.required_str(complete_item::WORD, "Word")
    }

    pub fn abbr(&self) -> Result<&'a str> {
        self.optional_str(complete_item::ABBR, "Abbr")
    }

    pub fn menu(&self) -> Result<&'a str> {
        self.optional_str(complete_item::MENU, "Menu")
    }

    pub fn info(&self) -> Result<&'a str> {
        self.optional_str(complete_item::INFO, "Info")
    }

    pub fn kind(&self) -> Result<&'a str> {
        self.optional_str(complete_item::KIND, "Kind")
    }

    pub fn icase(&self) -> Result<bool> {
        self.table.get_bool(complete_item::ICASE, false)
    }

    pub fn dup(&self) -> Result<bool> {
        self.table.get_bool(complete_item::DUP, false)
    }

    fn optional_str(&self, slot: usize, field: &'static str) -> Result<&'a str> {
        Ok(self.table.get_str(slot, field)?.unwrap_or_default())
    }

    pub fn unmarshal(&self) -> Result<CompleteItem> {
        Ok(CompleteItem {
            word: self.word()?.to_string(),
            abbr: self.abbr()?.to_string(),
            menu: self.menu()?.to_string(),
            info: self.info()?.to_string(),
            kind: self.kind()?.to_string(),
            icase: self.icase()?,
            dup: self.dup()?,
        })
    }
}

/// Ordered list of complete-items answering one completion request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeCompleteResults {
    pub results: Vec<CompleteItem>,
}

impl CodeCompleteResults {
    /// One item per candidate, in candidate order
    pub fn from_candidates<'c, S, I>(candidates: I) -> Self
    where
        S: CompletionString + ?Sized + 'c,
        I: IntoIterator<Item = &'c S>,
    {
        Self {
            results: candidates
                .into_iter()
                .map(CompleteItem::from_completion)
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Encode as a root buffer. No results leaves the Results field absent.
    pub fn serialize(&self) -> Vec<u8> {
        let mut builder = Builder::new();

        let results = if self.results.is_empty() {
            None
        } else {
            let offsets: Vec<Offset> = self
                .results
                .iter()
                .map(|item| item.encode(&mut builder))
                .collect();
            Some(builder.create_vector(&offsets))
        };

        builder.start_table(code_complete_results::FIELD_COUNT);
        if let Some(results) = results {
            builder.add_offset(code_complete_results::RESULTS, results);
        }
        let root = builder.end_table();
        builder.finish(root);

        let buf = builder.into_bytes();
        debug!("Encoded {} completion results, {} bytes", self.len(), buf.len());
        buf
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CodeCompleteResultsView<'a> {
    table: Table<'a>,
}

impl<'a> CodeCompleteResultsView<'a> {
    pub fn open(buf: &'a [u8]) -> Result<Self> {
        Table::root(buf, 0, code_complete_results::TABLE).map(|table| Self { table })
    }

    pub fn results(&self) -> Result<Vec<CompleteItemView<'a>>> {
        match self.table.get_vector(code_complete_results::RESULTS)? {
            Some(vector) => Ok(vector
                .tables(complete_item::TABLE)?
                .into_iter()
                .map(|table| CompleteItemView { table })
                .collect()),
            None => Ok(Vec::new()),
        }
    }

    pub fn unmarshal(&self) -> Result<CodeCompleteResults> {
        Ok(CodeCompleteResults {
            results: self
                .results()?
                .iter()
                .map(CompleteItemView::unmarshal)
                .collect::<Result<_>>()?,
        })
    }
}
