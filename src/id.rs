//! Content-addressed identifiers
//!
//! Symbols are keyed by the SHA-256 digest of their USR and headers by the
//! digest of their cleaned path. Both are fixed-width and persisted as
//! lowercase hex strings.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::DecodeError;

/// Marker prepended to the base name of headers that have no filesystem identity
pub const SYNTHETIC_HEADER_PREFIX: &str = "IDoNotReallyExist-";

/// Width of every identifier in bytes
pub const ID_LEN: usize = 32;

fn digest(input: &[u8]) -> [u8; ID_LEN] {
    let mut hasher = Sha256::new();
    hasher.update(input);
    hasher.finalize().into()
}

macro_rules! hashed_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name([u8; ID_LEN]);

        impl $name {
            /// Parse the hex form written into encoded buffers
            pub fn from_hex(value: &str) -> Result<Self, DecodeError> {
                let mut bytes = [0u8; ID_LEN];
                hex::decode_to_slice(value, &mut bytes).map_err(|_| DecodeError::InvalidId {
                    kind: $kind,
                    value: value.to_string(),
                })?;
                Ok(Self(bytes))
            }

            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.to_hex())
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), &self.to_hex()[..12])
            }
        }

        impl TryFrom<String> for $name {
            type Error = DecodeError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::from_hex(&value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> String {
                id.to_hex()
            }
        }
    };
}

hashed_id!(
    /// Identity of a symbol, derived from its USR
    SymbolId,
    "symbol ID"
);

hashed_id!(
    /// Identity of a header file, derived from its cleaned path
    FileId,
    "file ID"
);

impl SymbolId {
    /// Hash a USR. An empty USR is hashed like any other string.
    pub fn from_usr(usr: &str) -> Self {
        Self(digest(usr.as_bytes()))
    }
}

impl FileId {
    /// Identity of a real file: the digest of its cleaned path
    pub fn from_path(path: &str) -> Self {
        Self(digest(clean_path(path).as_bytes()))
    }

    /// Identity of a header without a resolvable name
    pub fn synthetic(include_path: &str) -> Self {
        Self(digest(synthetic_header_name(include_path).as_bytes()))
    }
}

/// Sentinel name for a header that does not exist on disk
pub fn synthetic_header_name(include_path: &str) -> String {
    format!(
        "{}{}",
        SYNTHETIC_HEADER_PREFIX,
        base_name(&clean_path(include_path))
    )
}

/// Lexically clean a slash-separated path: collapse repeated separators,
/// drop `.` elements and resolve `..` against preceding elements.
pub fn clean_path(path: &str) -> String {
    if path.is_empty() {
        return ".".to_string();
    }

    let rooted = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();

    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                if parts.last().is_some_and(|p| *p != "..") {
                    parts.pop();
                } else if !rooted {
                    parts.push("..");
                }
            }
            _ => parts.push(part),
        }
    }

    let joined = parts.join("/");
    if rooted {
        format!("/{}", joined)
    } else if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}

/// Last element of a path, ignoring trailing separators
pub fn base_name(path: &str) -> &str {
    if path.is_empty() {
        return ".";
    }
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return "/";
    }
    match trimmed.rfind('/') {
        Some(i) => &trimmed[i + 1..],
        None => trimmed,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_symbol_id_deterministic() {
        let usr = "c:@F@main";
        assert_eq!(SymbolId::from_usr(usr), SymbolId::from_usr(usr));
        assert_ne!(SymbolId::from_usr(usr), SymbolId::from_usr("c:@F@mainx"));
    }

    #[test]
    fn test_symbol_id_no_collisions_over_corpus() {
        let ids: HashSet<SymbolId> = (0..20_000)
            .map(|i| SymbolId::from_usr(&format!("c:@N@ns@F@fn{}#I#", i)))
            .collect();
        assert_eq!(ids.len(), 20_000);
    }

    #[test]
    fn test_symbol_id_is_not_the_input() {
        let id = SymbolId::from_usr("c:@S@Foo");
        assert_ne!(id.to_hex(), "c:@S@Foo");
        assert_eq!(id.to_hex().len(), ID_LEN * 2);
    }

    #[test]
    fn test_empty_usr_hashes() {
        assert_eq!(SymbolId::from_usr(""), SymbolId::from_usr(""));
        assert_ne!(SymbolId::from_usr(""), SymbolId::from_usr(" "));
    }

    #[test]
    fn test_hex_roundtrip() {
        let id = FileId::from_path("/usr/include/stdio.h");
        assert_eq!(FileId::from_hex(&id.to_hex()).unwrap(), id);
    }

    #[test]
    fn test_from_hex_rejects_garbage() {
        assert!(matches!(
            SymbolId::from_hex("not-hex"),
            Err(DecodeError::InvalidId { kind: "symbol ID", .. })
        ));
        assert!(SymbolId::from_hex("abcd").is_err());
    }

    #[test]
    fn test_file_id_cleans_path() {
        assert_eq!(
            FileId::from_path("/usr//include/./sys/../stdio.h"),
            FileId::from_path("/usr/include/stdio.h")
        );
    }

    #[test]
    fn test_synthetic_name() {
        assert_eq!(
            synthetic_header_name("/opt/sdk/include/builtin.h"),
            "IDoNotReallyExist-builtin.h"
        );
        assert_eq!(synthetic_header_name(""), "IDoNotReallyExist-.");
    }

    #[test]
    fn test_synthetic_id_differs_from_real_file() {
        let real = FileId::from_path("/opt/sdk/include/builtin.h");
        let synthetic = FileId::synthetic("/opt/sdk/include/builtin.h");
        assert_ne!(real, synthetic);
        assert_eq!(
            synthetic,
            FileId(digest(b"IDoNotReallyExist-builtin.h"))
        );
    }

    #[test]
    fn test_clean_path() {
        assert_eq!(clean_path(""), ".");
        assert_eq!(clean_path("/"), "/");
        assert_eq!(clean_path("a/b/../c"), "a/c");
        assert_eq!(clean_path("a/../.."), "..");
        assert_eq!(clean_path("/../a"), "/a");
        assert_eq!(clean_path("./a//b/"), "a/b");
        assert_eq!(clean_path("../../x"), "../../x");
    }

    #[test]
    fn test_base_name() {
        assert_eq!(base_name(""), ".");
        assert_eq!(base_name("/"), "/");
        assert_eq!(base_name("a/b.h"), "b.h");
        assert_eq!(base_name("a/b/"), "b");
        assert_eq!(base_name("stdio.h"), "stdio.h");
    }

    #[test]
    fn test_id_serde_as_hex() {
        let id = SymbolId::from_usr("c:@F@f");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.to_hex()));
        let parsed: SymbolId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }
}
