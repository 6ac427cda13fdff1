//! Included headers and their modification times

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::encoding::schema::header;
use crate::encoding::{Builder, Offset, Table};
use crate::error::Result;
use crate::id::FileId;

/// A file handle as reported by the parser for an included header
pub trait HeaderFile {
    /// Resolved path, empty when the header has no filesystem identity
    fn name(&self) -> &str;

    /// Last modification time
    fn time(&self) -> SystemTime;
}

/// Plain `HeaderFile` for callers that already resolved name and mtime
#[derive(Debug, Clone)]
pub struct ResolvedHeader {
    pub name: String,
    pub time: SystemTime,
}

impl HeaderFile for ResolvedHeader {
    fn name(&self) -> &str {
        &self.name
    }

    fn time(&self) -> SystemTime {
        self.time
    }
}

/// Unix seconds, negative before the epoch
pub(crate) fn unix_seconds(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs() as i64,
        Err(e) => -(e.duration().as_secs() as i64),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub file_id: FileId,
    /// Unix seconds
    pub mtime: i64,
}

impl Header {
    pub fn new(file_id: FileId, mtime: i64) -> Self {
        Self { file_id, mtime }
    }

    /// Derive identity and mtime for an included header.
    ///
    /// Headers without a resolved name get a synthetic identity built from
    /// the include path and are stamped with the capture time.
    pub fn capture<H: HeaderFile + ?Sized>(include_path: &str, file: &H) -> Self {
        if file.name().is_empty() {
            Self {
                file_id: FileId::synthetic(include_path),
                mtime: unix_seconds(SystemTime::now()),
            }
        } else {
            Self {
                file_id: FileId::from_path(file.name()),
                mtime: unix_seconds(file.time()),
            }
        }
    }

    pub fn is_stale(&self, current_mtime: i64) -> bool {
        self.mtime != current_mtime
    }

    pub(crate) fn encode(&self, builder: &mut Builder) -> Offset {
        let file_id = builder.create_string(&self.file_id.to_hex());

        builder.start_table(header::FIELD_COUNT);
        builder.add_i64(header::MTIME, self.mtime, 0);
        builder.add_offset(header::FILE_ID, file_id);
        builder.end_table()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct HeaderView<'a> {
    table: Table<'a>,
}

impl<'a> HeaderView<'a> {
    pub(crate) fn new(table: Table<'a>) -> Self {
        Self { table }
    }

    pub fn file_id(&self) -> Result<FileId> {
        FileId::from_hex(self.table.required_str(header::FILE_ID, "FileID")?)
    }

    pub fn mtime(&self) -> Result<i64> {
        self.table.get_i64(header::MTIME, 0)
    }

    pub fn unmarshal(&self) -> Result<Header> {
        Ok(Header {
            file_id: self.file_id()?,
            mtime: self.mtime()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_capture_real_header() {
        let file = ResolvedHeader {
            name: "/usr/include/./stdio.h".to_string(),
            time: UNIX_EPOCH + Duration::from_secs(1_500_000_000),
        };
        let hdr = Header::capture("stdio.h", &file);
        assert_eq!(hdr.file_id, FileId::from_path("/usr/include/stdio.h"));
        assert_eq!(hdr.mtime, 1_500_000_000);
    }

    #[test]
    fn test_capture_synthetic_header() {
        let file = ResolvedHeader {
            name: String::new(),
            time: UNIX_EPOCH,
        };
        let before = unix_seconds(SystemTime::now());
        let hdr = Header::capture("include/builtin.h", &file);
        let after = unix_seconds(SystemTime::now());

        assert_eq!(hdr.file_id, FileId::synthetic("include/builtin.h"));
        assert_ne!(hdr.file_id, FileId::from_path("include/builtin.h"));
        assert!(hdr.mtime >= before && hdr.mtime <= after);
    }

    #[test]
    fn test_unix_seconds_before_epoch() {
        assert_eq!(unix_seconds(UNIX_EPOCH - Duration::from_secs(10)), -10);
    }

    #[test]
    fn test_is_stale() {
        let hdr = Header::new(FileId::from_path("/a.h"), 100);
        assert!(!hdr.is_stale(100));
        assert!(hdr.is_stale(101));
    }

    #[test]
    fn test_header_view() {
        let hdr = Header::new(FileId::from_path("/x/y.h"), 1_700_000_000);
        let mut builder = Builder::new();
        let root = hdr.encode(&mut builder);
        builder.finish(root);
        let buf = builder.into_bytes();

        let view = HeaderView::new(Table::root(&buf, 0, header::TABLE).unwrap());
        assert_eq!(view.unmarshal().unwrap(), hdr);
    }
}
