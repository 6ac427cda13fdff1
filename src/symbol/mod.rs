//! Symbol database for one C/C++ source file
//!
//! A `File` is built up by an indexer walking one compilation:
//! - `add_decl` / `add_definition`: declarations and the current definition
//! - `add_caller`: references to a symbol
//! - `add_header`: included headers with their mtimes
//! - `add_translation_unit`: opaque parser snapshot
//!
//! `serialize` encodes the whole file into one buffer. `FileView` opens
//! such a buffer without decoding it; `FileView::unmarshal` turns it back
//! into a mutable `File` for incremental re-indexing.

mod header;
mod info;
mod location;

use std::collections::HashMap;

use tracing::{debug, trace, warn};

use crate::encoding::schema::{file, header as header_schema, info as info_schema};
use crate::encoding::{Builder, Offset, Table};
use crate::error::Result;
use crate::id::{FileId, SymbolId};

pub(crate) use header::unix_seconds;
pub use header::{Header, HeaderFile, HeaderView, ResolvedHeader};
pub use info::{Info, InfoView};
pub use location::{Caller, CallerView, Location, LocationView};

/// Read access shared by build-mode and view-mode files
pub trait SymbolIndex {
    fn name(&self) -> Result<&str>;
    fn flags(&self) -> Result<Vec<&str>>;
    fn translation_unit(&self) -> Result<&[u8]>;
    fn includes(&self) -> Result<Vec<&str>>;
    fn symbol_ids(&self) -> Result<Vec<SymbolId>>;
    fn lookup(&self, id: &SymbolId) -> Result<Option<Info>>;
    fn headers(&self) -> Result<Vec<Header>>;

    fn lookup_usr(&self, usr: &str) -> Result<Option<Info>> {
        self.lookup(&SymbolId::from_usr(usr))
    }

    /// Most recently recorded header entry with this identity
    fn latest_header(&self, file_id: &FileId) -> Result<Option<Header>> {
        Ok(self
            .headers()?
            .into_iter()
            .rev()
            .find(|h| &h.file_id == file_id))
    }
}

// =============================================================================
// Build mode
// =============================================================================

/// Mutable symbol table for one source file
#[derive(Debug, Clone, Default)]
pub struct File {
    name: String,
    flags: Vec<String>,
    translation_unit: Vec<u8>,
    includes: Vec<String>,
    symbols: HashMap<SymbolId, Info>,
    headers: Vec<Header>,
    locations: HashMap<Location, SymbolId>,
}

impl File {
    pub fn new(name: impl Into<String>, flags: Vec<String>) -> Self {
        Self {
            name: name.into(),
            flags,
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn flags(&self) -> &[String] {
        &self.flags
    }

    pub fn translation_unit(&self) -> &[u8] {
        &self.translation_unit
    }

    pub fn includes(&self) -> &[String] {
        &self.includes
    }

    pub fn headers(&self) -> &[Header] {
        &self.headers
    }

    pub fn symbol(&self, id: &SymbolId) -> Option<&Info> {
        self.symbols.get(id)
    }

    /// Symbols in no particular order
    pub fn symbols(&self) -> impl Iterator<Item = &Info> {
        self.symbols.values()
    }

    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }

    /// Symbol recorded for a declaration location
    pub fn symbol_at(&self, loc: &Location) -> Option<&SymbolId> {
        self.locations.get(loc)
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Record a declaration with no definition
    pub fn add_decl(&mut self, loc: Location) {
        self.add_definition(loc, Location::default());
    }

    /// Record a declaration and, when `def` exists, replace the definition
    pub fn add_definition(&mut self, loc: Location, def: Location) {
        let id = SymbolId::from_usr(&loc.usr);
        trace!(usr = %loc.usr, line = loc.line, has_def = def.exists(), "add decl");

        let info = self.symbols.entry(id).or_insert_with(|| Info::new(id));
        info.push_decl(loc.clone());
        if def.exists() {
            info.set_def(def);
        }

        self.locations.insert(loc, id);
    }

    /// Record a reference to the symbol at `sym`. Creates the symbol's
    /// record if no declaration has been seen yet.
    ///
    /// Takes no definition: a caller fact never touches the decls or the
    /// def of the symbol it references.
    pub fn add_caller(&mut self, sym: Location, func_call: bool) {
        let id = SymbolId::from_usr(&sym.usr);
        trace!(usr = %sym.usr, line = sym.line, func_call, "add caller");

        self.symbols
            .entry(id)
            .or_insert_with(|| Info::new(id))
            .push_caller(Caller::new(sym, func_call));
    }

    /// Append an included header. Duplicates are kept.
    pub fn add_header<H: HeaderFile + ?Sized>(&mut self, include_path: &str, file: &H) {
        let header = Header::capture(include_path, file);
        trace!(include_path, file_id = %header.file_id, mtime = header.mtime, "add header");
        self.headers.push(header);
    }

    /// Replace the stored parser snapshot
    pub fn add_translation_unit(&mut self, buf: Vec<u8>) {
        self.translation_unit = buf;
    }

    pub fn add_include(&mut self, path: impl Into<String>) {
        self.includes.push(path.into());
    }

    // =========================================================================
    // Encoding
    // =========================================================================

    pub fn serialize(&self) -> Vec<u8> {
        self.serialize_with(Builder::new())
    }

    pub fn serialize_with(&self, mut builder: Builder) -> Vec<u8> {
        let root = self.encode(&mut builder);
        builder.finish(root);
        let buf = builder.into_bytes();
        debug!(
            "Serialized {}: {} symbols, {} headers, {} bytes",
            self.name,
            self.symbols.len(),
            self.headers.len(),
            buf.len()
        );
        buf
    }

    fn encode(&self, builder: &mut Builder) -> Offset {
        let name = builder.create_string(&self.name);
        let translation_unit = builder.create_bytes(&self.translation_unit);
        let flags = builder.create_string_vector(&self.flags);

        // Ascending ID order keeps the output deterministic
        let mut infos: Vec<&Info> = self.symbols.values().collect();
        infos.sort_by_key(|info| info.id());
        let symbol_offsets: Vec<Offset> = infos.iter().map(|info| info.encode(builder)).collect();
        let symbols = builder.create_vector(&symbol_offsets);

        let header_offsets: Vec<Offset> = self.headers.iter().map(|h| h.encode(builder)).collect();
        let headers = builder.create_vector(&header_offsets);

        let includes = builder.create_string_vector(&self.includes);

        builder.start_table(file::FIELD_COUNT);
        builder.add_offset(file::NAME, name);
        builder.add_offset(file::FLAGS, flags);
        builder.add_offset(file::TRANSLATION_UNIT, translation_unit);
        builder.add_offset(file::SYMBOLS, symbols);
        builder.add_offset(file::HEADERS, headers);
        builder.add_offset(file::INCLUDES, includes);
        builder.end_table()
    }
}

impl SymbolIndex for File {
    fn name(&self) -> Result<&str> {
        Ok(&self.name)
    }

    fn flags(&self) -> Result<Vec<&str>> {
        Ok(self.flags.iter().map(String::as_str).collect())
    }

    fn translation_unit(&self) -> Result<&[u8]> {
        Ok(&self.translation_unit)
    }

    fn includes(&self) -> Result<Vec<&str>> {
        Ok(self.includes.iter().map(String::as_str).collect())
    }

    fn symbol_ids(&self) -> Result<Vec<SymbolId>> {
        Ok(self.symbols.keys().copied().collect())
    }

    fn lookup(&self, id: &SymbolId) -> Result<Option<Info>> {
        Ok(self.symbols.get(id).cloned())
    }

    fn headers(&self) -> Result<Vec<Header>> {
        Ok(self.headers.clone())
    }
}

// =============================================================================
// View mode
// =============================================================================

/// Read-only file backed by an encoded buffer. Fields are decoded on access.
#[derive(Debug, Clone, Copy)]
pub struct FileView<'a> {
    table: Table<'a>,
}

impl<'a> FileView<'a> {
    pub fn open(buf: &'a [u8]) -> Result<Self> {
        Self::from_buffer(buf, 0)
    }

    /// Open a buffer whose root uoffset is stored at `offset`
    pub fn from_buffer(buf: &'a [u8], offset: usize) -> Result<Self> {
        let table = Table::root(buf, offset, file::TABLE)?;
        debug!("Opened file buffer of {} bytes", buf.len());
        Ok(Self { table })
    }

    pub fn name(&self) -> Result<&'a str> {
        self.table.required_str(file::NAME, "Name")
    }

    pub fn flags(&self) -> Result<Vec<&'a str>> {
        match self.table.get_vector(file::FLAGS)? {
            Some(vector) => vector.strs("Flags"),
            None => Ok(Vec::new()),
        }
    }

    pub fn translation_unit(&self) -> Result<&'a [u8]> {
        Ok(self
            .table
            .get_bytes(file::TRANSLATION_UNIT)?
            .unwrap_or_default())
    }

    pub fn includes(&self) -> Result<Vec<&'a str>> {
        match self.table.get_vector(file::INCLUDES)? {
            Some(vector) => vector.strs("Includes"),
            None => Ok(Vec::new()),
        }
    }

    pub fn symbols(&self) -> Result<Vec<InfoView<'a>>> {
        match self.table.get_vector(file::SYMBOLS)? {
            Some(vector) => Ok(vector
                .tables(info_schema::TABLE)?
                .into_iter()
                .map(InfoView::new)
                .collect()),
            None => Ok(Vec::new()),
        }
    }

    /// Find one symbol by ID, decoding only the IDs it passes over
    pub fn symbol(&self, id: &SymbolId) -> Result<Option<InfoView<'a>>> {
        let wanted = id.to_hex();
        for info in self.symbols()? {
            if info.raw_id()? == wanted {
                return Ok(Some(info));
            }
        }
        Ok(None)
    }

    pub fn headers(&self) -> Result<Vec<HeaderView<'a>>> {
        match self.table.get_vector(file::HEADERS)? {
            Some(vector) => Ok(vector
                .tables(header_schema::TABLE)?
                .into_iter()
                .map(HeaderView::new)
                .collect()),
            None => Ok(Vec::new()),
        }
    }

    /// Decode everything into a build-mode `File`
    pub fn unmarshal(&self) -> Result<File> {
        let mut file = File::new(
            FileView::name(self)?,
            FileView::flags(self)?.into_iter().map(str::to_string).collect(),
        );
        file.translation_unit = FileView::translation_unit(self)?.to_vec();
        file.includes = FileView::includes(self)?
            .into_iter()
            .map(str::to_string)
            .collect();

        for view in self.symbols()? {
            let info = view.unmarshal()?;
            for decl in info.decls() {
                file.locations.insert(decl.clone(), info.id());
            }
            if file.symbols.insert(info.id(), info).is_some() {
                debug!("Duplicate symbol entry in {}", file.name);
            }
        }

        file.headers = FileView::headers(self)?
            .iter()
            .map(HeaderView::unmarshal)
            .collect::<Result<_>>()?;

        debug!(
            "Unmarshaled {}: {} symbols, {} headers",
            file.name,
            file.symbols.len(),
            file.headers.len()
        );
        Ok(file)
    }
}

impl SymbolIndex for FileView<'_> {
    fn name(&self) -> Result<&str> {
        FileView::name(self)
    }

    fn flags(&self) -> Result<Vec<&str>> {
        FileView::flags(self)
    }

    fn translation_unit(&self) -> Result<&[u8]> {
        FileView::translation_unit(self)
    }

    fn includes(&self) -> Result<Vec<&str>> {
        FileView::includes(self)
    }

    fn symbol_ids(&self) -> Result<Vec<SymbolId>> {
        self.symbols()?.iter().map(InfoView::id).collect()
    }

    fn lookup(&self, id: &SymbolId) -> Result<Option<Info>> {
        self.symbol(id)?.map(|view| view.unmarshal()).transpose()
    }

    fn headers(&self) -> Result<Vec<Header>> {
        FileView::headers(self)?
            .iter()
            .map(HeaderView::unmarshal)
            .collect()
    }
}

// =============================================================================
// Either mode
// =============================================================================

/// A file that is either being built or read from a stored buffer
#[derive(Debug, Clone)]
pub enum SymbolFile<'a> {
    Build(File),
    View(FileView<'a>),
}

impl<'a> SymbolFile<'a> {
    pub fn open(buf: &'a [u8]) -> Result<Self> {
        FileView::open(buf).map(SymbolFile::View)
    }

    pub fn is_view(&self) -> bool {
        matches!(self, SymbolFile::View(_))
    }

    /// Mutable access, materializing a view first so new facts replace
    /// rather than shadow the stored state
    pub fn build_mut(&mut self) -> Result<&mut File> {
        if let SymbolFile::View(view) = *self {
            *self = SymbolFile::Build(view.unmarshal()?);
        }
        match self {
            SymbolFile::Build(file) => Ok(file),
            SymbolFile::View(_) => unreachable!("view was materialized above"),
        }
    }

    pub fn into_build(self) -> Result<File> {
        match self {
            SymbolFile::Build(file) => Ok(file),
            SymbolFile::View(view) => view.unmarshal(),
        }
    }
}

impl From<File> for SymbolFile<'_> {
    fn from(file: File) -> Self {
        SymbolFile::Build(file)
    }
}

impl<'a> From<FileView<'a>> for SymbolFile<'a> {
    fn from(view: FileView<'a>) -> Self {
        SymbolFile::View(view)
    }
}

impl SymbolIndex for SymbolFile<'_> {
    fn name(&self) -> Result<&str> {
        match self {
            SymbolFile::Build(file) => SymbolIndex::name(file),
            SymbolFile::View(view) => SymbolIndex::name(view),
        }
    }

    fn flags(&self) -> Result<Vec<&str>> {
        match self {
            SymbolFile::Build(file) => SymbolIndex::flags(file),
            SymbolFile::View(view) => SymbolIndex::flags(view),
        }
    }

    fn translation_unit(&self) -> Result<&[u8]> {
        match self {
            SymbolFile::Build(file) => SymbolIndex::translation_unit(file),
            SymbolFile::View(view) => SymbolIndex::translation_unit(view),
        }
    }

    fn includes(&self) -> Result<Vec<&str>> {
        match self {
            SymbolFile::Build(file) => SymbolIndex::includes(file),
            SymbolFile::View(view) => SymbolIndex::includes(view),
        }
    }

    fn symbol_ids(&self) -> Result<Vec<SymbolId>> {
        match self {
            SymbolFile::Build(file) => file.symbol_ids(),
            SymbolFile::View(view) => view.symbol_ids(),
        }
    }

    fn lookup(&self, id: &SymbolId) -> Result<Option<Info>> {
        match self {
            SymbolFile::Build(file) => file.lookup(id),
            SymbolFile::View(view) => view.lookup(id),
        }
    }

    fn headers(&self) -> Result<Vec<Header>> {
        match self {
            SymbolFile::Build(file) => SymbolIndex::headers(file),
            SymbolFile::View(view) => SymbolIndex::headers(view),
        }
    }
}

/// Whether a stored file must be rebuilt from scratch because its buffer
/// cannot be fully decoded
pub fn needs_reindex(buf: &[u8]) -> bool {
    match FileView::open(buf).and_then(|view| view.unmarshal()) {
        Ok(_) => false,
        Err(err) => {
            warn!("Stored symbol file is corrupt, needs full re-index: {}", err);
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, UNIX_EPOCH};

    use super::*;

    const USR: &str = "c:@F@compute#I#";

    fn loc(file: &str, line: u32) -> Location {
        Location::new(file, line, 1, line * 10, USR)
    }

    #[test]
    fn test_add_decl_creates_symbol() {
        let mut f = File::new("a.c", vec![]);
        f.add_decl(loc("a.h", 3));
        let info = f.symbol(&SymbolId::from_usr(USR)).unwrap();
        assert_eq!(info.decls(), &[loc("a.h", 3)]);
        assert!(info.def().is_none());
        assert_eq!(f.symbol_count(), 1);
    }

    #[test]
    fn test_definition_overwrite() {
        let mut f = File::new("a.c", vec![]);
        let def1 = loc("a.c", 20);
        let def2 = loc("b.c", 40);
        f.add_definition(loc("a.h", 3), def1);
        f.add_definition(loc("b.h", 5), def2.clone());

        assert_eq!(f.symbol_count(), 1);
        let info = f.symbol(&SymbolId::from_usr(USR)).unwrap();
        assert_eq!(info.def(), Some(&def2));
        assert_eq!(info.decls(), &[loc("a.h", 3), loc("b.h", 5)]);
    }

    #[test]
    fn test_absent_definition_keeps_previous() {
        let mut f = File::new("a.c", vec![]);
        f.add_definition(loc("a.h", 3), loc("a.c", 20));
        f.add_decl(loc("a.h", 9));
        let info = f.symbol(&SymbolId::from_usr(USR)).unwrap();
        assert_eq!(info.def(), Some(&loc("a.c", 20)));
        assert_eq!(info.decls().len(), 2);
    }

    #[test]
    fn test_caller_before_decl() {
        let mut f = File::new("a.c", vec![]);
        f.add_caller(loc("main.c", 12), true);

        assert_eq!(f.symbol_count(), 1);
        let info = f.symbol(&SymbolId::from_usr(USR)).unwrap();
        assert!(info.decls().is_empty());
        assert!(info.def().is_none());
        assert_eq!(info.callers(), &[Caller::new(loc("main.c", 12), true)]);
        assert!(f.symbol_at(&loc("main.c", 12)).is_none());
    }

    #[test]
    fn test_location_index() {
        let mut f = File::new("a.c", vec![]);
        f.add_decl(loc("a.h", 3));
        assert_eq!(f.symbol_at(&loc("a.h", 3)), Some(&SymbolId::from_usr(USR)));
        assert!(f.symbol_at(&loc("a.h", 4)).is_none());
    }

    #[test]
    fn test_empty_usr_shares_a_record() {
        let mut f = File::new("a.c", vec![]);
        f.add_decl(Location::new("x.c", 1, 1, 0, ""));
        f.add_decl(Location::new("y.c", 2, 1, 0, ""));
        assert_eq!(f.symbol_count(), 1);
        assert_eq!(f.symbol(&SymbolId::from_usr("")).unwrap().decls().len(), 2);
    }

    #[test]
    fn test_headers_keep_duplicates_in_order() {
        let mut f = File::new("a.c", vec![]);
        let old = ResolvedHeader {
            name: "/inc/a.h".to_string(),
            time: UNIX_EPOCH + Duration::from_secs(100),
        };
        let new = ResolvedHeader {
            name: "/inc/a.h".to_string(),
            time: UNIX_EPOCH + Duration::from_secs(200),
        };
        f.add_header("a.h", &old);
        f.add_header("a.h", &new);

        assert_eq!(f.headers().len(), 2);
        let latest = f
            .latest_header(&FileId::from_path("/inc/a.h"))
            .unwrap()
            .unwrap();
        assert_eq!(latest.mtime, 200);
    }

    #[test]
    fn test_translation_unit_is_replaced() {
        let mut f = File::new("a.c", vec![]);
        f.add_translation_unit(vec![1, 2, 3]);
        f.add_translation_unit(vec![9]);
        assert_eq!(f.translation_unit(), &[9]);
    }

    #[test]
    fn test_symbol_ids_match_between_modes() {
        let mut f = File::new("a.c", vec![]);
        f.add_decl(loc("a.h", 3));
        f.add_decl(Location::new("a.h", 8, 1, 0, "c:@F@other"));
        f.add_caller(Location::new("a.c", 12, 1, 0, "c:@F@only_called"), true);

        let mut built = SymbolIndex::symbol_ids(&f).unwrap();
        built.sort();

        let buf = f.serialize();
        let view = FileView::open(&buf).unwrap();
        let stored = SymbolIndex::symbol_ids(&view).unwrap();

        assert_eq!(built.len(), 3);
        assert_eq!(stored, built);
        assert!(stored.contains(&SymbolId::from_usr("c:@F@only_called")));
    }

    #[test]
    fn test_view_reads_back() {
        let mut f = File::new("a.c", vec!["-I/inc".to_string(), "-DX=1".to_string()]);
        f.add_definition(loc("a.h", 3), loc("a.c", 20));
        f.add_caller(loc("main.c", 12), false);
        f.add_include("/inc");
        f.add_translation_unit(b"tu".to_vec());

        let buf = f.serialize();
        let view = FileView::open(&buf).unwrap();
        assert_eq!(view.name().unwrap(), "a.c");
        assert_eq!(view.flags().unwrap(), vec!["-I/inc", "-DX=1"]);
        assert_eq!(view.includes().unwrap(), vec!["/inc"]);
        assert_eq!(view.translation_unit().unwrap(), b"tu");

        let info = view.symbol(&SymbolId::from_usr(USR)).unwrap().unwrap();
        assert_eq!(info.callers().unwrap().len(), 1);
        assert!(view.symbol(&SymbolId::from_usr("other")).unwrap().is_none());
    }

    #[test]
    fn test_serialize_is_deterministic() {
        let mut f = File::new("a.c", vec![]);
        for i in 0..50 {
            f.add_decl(Location::new("a.h", i, 1, 0, format!("c:@F@f{}", i)));
        }
        assert_eq!(f.serialize(), f.clone().serialize());
        assert_eq!(f.serialize(), f.serialize_with(Builder::with_capacity(16)));
    }

    #[test]
    fn test_symbol_file_build_mut_materializes() {
        let mut f = File::new("a.c", vec![]);
        f.add_decl(loc("a.h", 3));
        let buf = f.serialize();

        let mut sf = SymbolFile::open(&buf).unwrap();
        assert!(sf.is_view());
        sf.build_mut().unwrap().add_decl(loc("a.h", 7));
        assert!(!sf.is_view());

        let info = sf.lookup_usr(USR).unwrap().unwrap();
        assert_eq!(info.decls(), &[loc("a.h", 3), loc("a.h", 7)]);
    }

    #[test]
    fn test_needs_reindex() {
        let f = File::new("a.c", vec![]);
        let buf = f.serialize();
        assert!(!needs_reindex(&buf));
        assert!(needs_reindex(&buf[..buf.len() / 2]));
        assert!(needs_reindex(&[]));
    }
}
