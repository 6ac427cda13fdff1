//! Source locations and the call sites that reference a symbol

use serde::{Deserialize, Serialize};

use crate::encoding::schema::{caller, location};
use crate::encoding::{Builder, Offset, Table};
use crate::error::Result;

/// A position in a source file, tagged with the USR of the symbol found there
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub file_name: String,
    pub line: u32,
    pub col: u32,
    pub offset: u32,
    pub usr: String,
}

impl Location {
    pub fn new(
        file_name: impl Into<String>,
        line: u32,
        col: u32,
        offset: u32,
        usr: impl Into<String>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            line,
            col,
            offset,
            usr: usr.into(),
        }
    }

    /// A location is absent only when every field holds its zero value
    pub fn exists(&self) -> bool {
        *self != Location::default()
    }

    pub(crate) fn encode(&self, builder: &mut Builder) -> Offset {
        let file_name = builder.create_string(&self.file_name);
        let usr = builder.create_string(&self.usr);

        builder.start_table(location::FIELD_COUNT);
        builder.add_offset(location::FILE_NAME, file_name);
        builder.add_u32(location::LINE, self.line, 0);
        builder.add_u32(location::COL, self.col, 0);
        builder.add_u32(location::OFFSET, self.offset, 0);
        builder.add_offset(location::USR, usr);
        builder.end_table()
    }

    /// Standalone buffer holding only file name, line and column.
    /// This is the body of a completion request.
    pub fn serialize_request(&self) -> Vec<u8> {
        let mut builder = Builder::new();
        let file_name = builder.create_string(&self.file_name);

        builder.start_table(location::FIELD_COUNT);
        builder.add_offset(location::FILE_NAME, file_name);
        builder.add_u32(location::LINE, self.line, 0);
        builder.add_u32(location::COL, self.col, 0);
        let root = builder.end_table();

        builder.finish(root);
        builder.into_bytes()
    }
}

/// Read-only location backed by an encoded buffer
#[derive(Debug, Clone, Copy)]
pub struct LocationView<'a> {
    table: Table<'a>,
}

impl<'a> LocationView<'a> {
    pub(crate) fn new(table: Table<'a>) -> Self {
        Self { table }
    }

    /// Open a buffer whose root is a Location
    pub fn open(buf: &'a [u8]) -> Result<Self> {
        Table::root(buf, 0, location::TABLE).map(Self::new)
    }

    pub fn file_name(&self) -> Result<&'a str> {
        Ok(self
            .table
            .get_str(location::FILE_NAME, "FileName")?
            .unwrap_or_default())
    }

    pub fn line(&self) -> Result<u32> {
        self.table.get_u32(location::LINE, 0)
    }

    pub fn col(&self) -> Result<u32> {
        self.table.get_u32(location::COL, 0)
    }

    pub fn offset(&self) -> Result<u32> {
        self.table.get_u32(location::OFFSET, 0)
    }

    pub fn usr(&self) -> Result<&'a str> {
        Ok(self.table.get_str(location::USR, "USR")?.unwrap_or_default())
    }

    pub fn exists(&self) -> Result<bool> {
        Ok(self.unmarshal()?.exists())
    }

    pub fn unmarshal(&self) -> Result<Location> {
        Ok(Location {
            file_name: self.file_name()?.to_string(),
            line: self.line()?,
            col: self.col()?,
            offset: self.offset()?,
            usr: self.usr()?.to_string(),
        })
    }
}

/// A site that references a symbol
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub location: Location,
    /// Whether the reference is a direct function call
    pub func_call: bool,
}

impl Caller {
    pub fn new(location: Location, func_call: bool) -> Self {
        Self {
            location,
            func_call,
        }
    }

    pub(crate) fn encode(&self, builder: &mut Builder) -> Offset {
        let location = self.location.encode(builder);

        builder.start_table(caller::FIELD_COUNT);
        builder.add_offset(caller::LOCATION, location);
        builder.add_bool(caller::FUNC_CALL, self.func_call, false);
        builder.end_table()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CallerView<'a> {
    table: Table<'a>,
}

impl<'a> CallerView<'a> {
    pub(crate) fn new(table: Table<'a>) -> Self {
        Self { table }
    }

    pub fn location(&self) -> Result<LocationView<'a>> {
        self.table
            .required_table(caller::LOCATION, "Location", location::TABLE)
            .map(LocationView::new)
    }

    pub fn func_call(&self) -> Result<bool> {
        self.table.get_bool(caller::FUNC_CALL, false)
    }

    pub fn unmarshal(&self) -> Result<Caller> {
        Ok(Caller {
            location: self.location()?.unmarshal()?,
            func_call: self.func_call()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DecodeError;

    fn encode_root(f: impl FnOnce(&mut Builder) -> Offset) -> Vec<u8> {
        let mut builder = Builder::new();
        let root = f(&mut builder);
        builder.finish(root);
        builder.into_bytes()
    }

    #[test]
    fn test_exists() {
        assert!(!Location::default().exists());
        assert!(Location::new("", 0, 1, 0, "").exists());
        assert!(Location::new("", 0, 0, 0, "c:@F@f").exists());
    }

    #[test]
    fn test_location_view() {
        let loc = Location::new("src/main.c", 10, 4, 120, "c:@F@main");
        let buf = encode_root(|b| loc.encode(b));
        let view = LocationView::open(&buf).unwrap();
        assert_eq!(view.file_name().unwrap(), "src/main.c");
        assert_eq!(view.line().unwrap(), 10);
        assert_eq!(view.col().unwrap(), 4);
        assert_eq!(view.offset().unwrap(), 120);
        assert_eq!(view.usr().unwrap(), "c:@F@main");
        assert_eq!(view.unmarshal().unwrap(), loc);
    }

    #[test]
    fn test_empty_location_reads_as_absent() {
        let buf = encode_root(|b| Location::default().encode(b));
        let view = LocationView::open(&buf).unwrap();
        assert!(!view.exists().unwrap());
    }

    #[test]
    fn test_request_carries_position_only() {
        let loc = Location::new("a.cc", 3, 7, 99, "c:@F@g");
        let buf = loc.serialize_request();
        let view = LocationView::open(&buf).unwrap();
        assert_eq!(view.file_name().unwrap(), "a.cc");
        assert_eq!(view.line().unwrap(), 3);
        assert_eq!(view.col().unwrap(), 7);
        assert_eq!(view.offset().unwrap(), 0);
        assert_eq!(view.usr().unwrap(), "");
    }

    #[test]
    fn test_caller_view() {
        let caller = Caller::new(Location::new("b.c", 2, 1, 5, "c:@F@h"), true);
        let buf = encode_root(|b| caller.encode(b));
        let table = Table::root(&buf, 0, "Caller").unwrap();
        let view = CallerView::new(table);
        assert!(view.func_call().unwrap());
        assert_eq!(view.unmarshal().unwrap(), caller);
    }

    #[test]
    fn test_caller_without_location_is_corrupt() {
        let buf = encode_root(|b| {
            b.start_table(caller::FIELD_COUNT);
            b.add_bool(caller::FUNC_CALL, true, false);
            b.end_table()
        });
        let view = CallerView::new(Table::root(&buf, 0, "Caller").unwrap());
        assert!(matches!(
            view.unmarshal(),
            Err(DecodeError::MissingField {
                table: "Caller",
                field: "Location"
            })
        ));
    }
}
