//! Persisted schema: slot numbers and table names
//!
//! ```text
//! table File {
//!   Name: string (required);
//!   Flags: [string];
//!   TranslationUnit: [ubyte];
//!   Symbols: [Info];
//!   Headers: [Header];
//!   Includes: [string];
//! }
//!
//! table Info {
//!   ID: string (required, key);
//!   Decls: [Location];
//!   Def: Location;
//!   Callers: [Caller];
//! }
//!
//! table Header {
//!   FileID: string (required, key);
//!   Mtime: long;
//! }
//!
//! table Caller {
//!   Location: Location (required);
//!   FuncCall: bool = false;
//! }
//!
//! table Location {
//!   FileName: string;
//!   Line: uint;
//!   Col: uint = 0;
//!   Offset: uint;
//!   USR: string;
//! }
//!
//! table CompleteItem {
//!   Word: string (required);
//!   Abbr: string;
//!   Menu: string;
//!   Info: string;
//!   Kind: string;
//!   Icase: bool;
//!   Dup: bool;
//! }
//!
//! table CodeCompleteResults {
//!   Results: [CompleteItem];
//! }
//! ```

pub mod file {
    pub const TABLE: &str = "File";
    pub const NAME: usize = 0;
    pub const FLAGS: usize = 1;
    pub const TRANSLATION_UNIT: usize = 2;
    pub const SYMBOLS: usize = 3;
    pub const HEADERS: usize = 4;
    pub const INCLUDES: usize = 5;
    pub const FIELD_COUNT: usize = 6;
}

pub mod info {
    pub const TABLE: &str = "Info";
    pub const ID: usize = 0;
    pub const DECLS: usize = 1;
    pub const DEF: usize = 2;
    pub const CALLERS: usize = 3;
    pub const FIELD_COUNT: usize = 4;
}

pub mod header {
    pub const TABLE: &str = "Header";
    pub const FILE_ID: usize = 0;
    pub const MTIME: usize = 1;
    pub const FIELD_COUNT: usize = 2;
}

pub mod caller {
    pub const TABLE: &str = "Caller";
    pub const LOCATION: usize = 0;
    pub const FUNC_CALL: usize = 1;
    pub const FIELD_COUNT: usize = 2;
}

pub mod location {
    pub const TABLE: &str = "Location";
    pub const FILE_NAME: usize = 0;
    pub const LINE: usize = 1;
    pub const COL: usize = 2;
    pub const OFFSET: usize = 3;
    pub const USR: usize = 4;
    pub const FIELD_COUNT: usize = 5;
}

pub mod complete_item {
    pub const TABLE: &str = "CompleteItem";
    pub const WORD: usize = 0;
    pub const ABBR: usize = 1;
    pub const MENU: usize = 2;
    pub const INFO: usize = 3;
    pub const KIND: usize = 4;
    pub const ICASE: usize = 5;
    pub const DUP: usize = 6;
    pub const FIELD_COUNT: usize = 7;
}

pub mod code_complete_results {
    pub const TABLE: &str = "CodeCompleteResults";
    pub const RESULTS: usize = 0;
    pub const FIELD_COUNT: usize = 1;
}
