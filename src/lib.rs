//! symdb: persistent symbol index for C/C++ code intelligence
//!
//! Records, per source file, every declaration of a symbol, its current
//! definition, the sites that reference it and the headers the file
//! depends on, and stores all of it in a single zero-copy binary buffer.
//!
//! ## Features
//!
//! - Content-addressed identity: symbols keyed by the hash of their USR,
//!   headers by the hash of their cleaned path
//! - Incremental merge: declarations and callers accumulate, the newest
//!   definition wins
//! - Offset-table encoding: one buffer per file, read lazily without a
//!   decoding pass
//! - Completion results: parser candidates converted to vim complete-items
//!
//! ## Example
//!
//! ```
//! use symdb::{File, FileView, Location, SymbolIndex};
//!
//! let mut file = File::new("main.c", vec!["-Iinclude".to_string()]);
//! file.add_decl(Location::new("util.h", 3, 5, 40, "c:@F@util"));
//! file.add_caller(Location::new("main.c", 10, 3, 120, "c:@F@util"), true);
//!
//! let buf = file.serialize();
//! let view = FileView::open(&buf).unwrap();
//! let info = view.lookup_usr("c:@F@util").unwrap().unwrap();
//! assert_eq!(info.decls().len(), 1);
//! assert_eq!(info.callers().len(), 1);
//! ```

pub mod cli;
pub mod completion;
pub mod config;
pub mod encoding;
pub mod error;
pub mod id;
pub mod symbol;

pub use completion::service::{CodeCompleter, CompletionService};
pub use completion::{
    ChunkKind, CodeCompleteResults, CodeCompleteResultsView, CompleteItem, CompleteItemView,
    CompletionCandidate, CompletionString,
};
pub use config::Config;
pub use error::{DecodeError, Result};
pub use id::{FileId, SymbolId};
pub use symbol::{
    needs_reindex, Caller, CallerView, File, FileView, Header, HeaderFile, HeaderView, Info,
    InfoView, Location, LocationView, ResolvedHeader, SymbolFile, SymbolIndex,
};
