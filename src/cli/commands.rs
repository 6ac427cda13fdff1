//! Command implementations for CLI operations

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use crate::completion::CodeCompleteResultsView;
use crate::config::Config;
use crate::encoding::Builder;
use crate::id::FileId;
use crate::symbol::{needs_reindex, Info, SymbolIndex};

use super::index_utils::{canonicalize_path, file_mtime, load_index, open_index, read_buffer, write_buffer};

/// Summary of a stored index
pub fn inspect_command(path: &str, config: &Config) -> Result<()> {
    let buf = read_buffer(path)?;
    let view = open_index(&buf, path)?;

    let name = view.name()?;
    let flags = view.flags()?;
    let includes = view.includes()?;
    let tu_len = view.translation_unit()?.len();
    let symbols = view.symbols()?.len();
    let headers = view.headers()?.len();

    if config.json {
        let out = json!({
            "name": name,
            "flags": flags,
            "includes": includes,
            "translation_unit_bytes": tu_len,
            "symbols": symbols,
            "headers": headers,
            "buffer_bytes": buf.len(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("symdb Index");
    println!("===========");
    println!("Index: {}", path);
    println!("File: {}", name);
    println!("Size: {:.2} KB", buf.len() as f64 / 1024.0);
    println!("Symbols: {}", symbols);
    println!("Headers: {}", headers);
    println!("Translation unit: {} bytes", tu_len);

    if !flags.is_empty() {
        println!("\nFlags:");
        for flag in &flags {
            println!("  {}", flag);
        }
    }

    if !includes.is_empty() {
        println!("\nInclude paths:");
        for include in &includes {
            println!("  {}", include);
        }
    }

    Ok(())
}

/// Look up one symbol by USR
pub fn symbol_command(path: &str, usr: &str, config: &Config) -> Result<Option<Info>> {
    let buf = read_buffer(path)?;
    let view = open_index(&buf, path)?;
    let found = view.lookup_usr(usr)?;

    let info = match found {
        Some(info) => info,
        None => {
            println!("No symbol with USR '{}' in {}", usr, view.name()?);
            return Ok(None);
        }
    };

    if config.json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(Some(info));
    }

    println!("Symbol {}", usr);
    println!("  ID: {}", info.id());

    match info.def() {
        Some(def) => println!("  Definition: {}:{}:{}", def.file_name, def.line, def.col),
        None => println!("  Definition: (none)"),
    }

    println!("\n  Declarations ({}):", info.decls().len());
    for decl in info.decls() {
        println!("    {}:{}:{}", decl.file_name, decl.line, decl.col);
    }

    println!("\n  Callers ({}):", info.callers().len());
    for caller in info.callers() {
        let kind = if caller.func_call { "call" } else { "ref" };
        println!(
            "    {} {}:{}:{}",
            kind, caller.location.file_name, caller.location.line, caller.location.col
        );
    }

    Ok(Some(info))
}

/// Full materialized index as JSON
pub fn dump_command(path: &str) -> Result<()> {
    let file = load_index(path)?;

    let mut symbols: Vec<&Info> = file.symbols().collect();
    symbols.sort_by_key(|info| info.id());

    let out = json!({
        "name": file.name(),
        "flags": file.flags(),
        "includes": file.includes(),
        "translation_unit_bytes": file.translation_unit().len(),
        "symbols": symbols,
        "headers": file.headers(),
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

/// Fully decode an index. Returns false when it needs a full re-index.
pub fn check_command(path: &str) -> Result<bool> {
    let buf = read_buffer(path)?;
    if needs_reindex(&buf) {
        println!("{}: corrupt, needs full re-index", path);
        return Ok(false);
    }
    println!("{}: ok", path);
    Ok(true)
}

/// Freshness of one header relative to an index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderStatus {
    /// Recorded mtime matches the filesystem
    Fresh,
    /// Recorded mtime differs, or the file is gone
    Stale,
    /// The index has no entry for this header
    Unknown,
}

impl HeaderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HeaderStatus::Fresh => "fresh",
            HeaderStatus::Stale => "stale",
            HeaderStatus::Unknown => "unknown",
        }
    }
}

/// Compare the latest recorded entry for `header_path` with `current_mtime`
pub fn header_status<I: SymbolIndex + ?Sized>(
    index: &I,
    header_path: &str,
    current_mtime: Option<i64>,
) -> Result<HeaderStatus> {
    let file_id = FileId::from_path(header_path);
    let status = match (index.latest_header(&file_id)?, current_mtime) {
        (None, _) => HeaderStatus::Unknown,
        (Some(_), None) => HeaderStatus::Stale,
        (Some(header), Some(mtime)) if header.is_stale(mtime) => HeaderStatus::Stale,
        (Some(_), Some(_)) => HeaderStatus::Fresh,
    };
    Ok(status)
}

/// Check each header path against the index and the filesystem
pub fn stale_command(
    path: &str,
    headers: &[String],
    config: &Config,
) -> Result<Vec<(String, HeaderStatus)>> {
    let buf = read_buffer(path)?;
    let view = open_index(&buf, path)?;

    let mut report = Vec::with_capacity(headers.len());
    for header in headers {
        let resolved = match canonicalize_path(header) {
            Ok(p) => p,
            Err(err) => {
                warn!("{:#}", err);
                header.clone()
            }
        };
        let status = header_status(&view, &resolved, file_mtime(&resolved))?;
        report.push((header.clone(), status));
    }

    if config.json {
        let out: Vec<_> = report
            .iter()
            .map(|(header, status)| json!({ "header": header, "status": status }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        for (header, status) in &report {
            println!("  {:<8} {}", status.as_str(), header);
        }
    }

    Ok(report)
}

/// Print the items of a CodeCompleteResults buffer
pub fn completions_command(path: &str, config: &Config) -> Result<usize> {
    let buf = read_buffer(path)?;
    let view = CodeCompleteResultsView::open(&buf)
        .with_context(|| format!("{} is not a completion response", path))?;
    let results = view.unmarshal()?;

    if config.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(results.len());
    }

    println!("{} completion items:\n", results.len());
    for item in &results.results {
        if item.kind.is_empty() {
            println!("  {}", item.abbr);
        } else {
            println!("  {:<40} {}", item.abbr, item.kind);
        }
    }

    Ok(results.len())
}

/// Decode an index and write it back with symbols in ID order
pub fn normalize_command(path: &str, out: &str, config: &Config) -> Result<()> {
    let file = load_index(path)?;
    let buf = file.serialize_with(Builder::with_capacity(config.builder_capacity));
    write_buffer(out, &buf)?;
    info!("Wrote {} ({} bytes)", out, buf.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, UNIX_EPOCH};

    use super::*;
    use crate::symbol::{File, ResolvedHeader};

    fn index_with_header(name: &str, mtime: u64) -> File {
        let mut file = File::new("main.c", vec![]);
        file.add_header(
            "h.h",
            &ResolvedHeader {
                name: name.to_string(),
                time: UNIX_EPOCH + Duration::from_secs(mtime),
            },
        );
        file
    }

    #[test]
    fn test_header_status() {
        let file = index_with_header("/inc/h.h", 500);
        assert_eq!(
            header_status(&file, "/inc/h.h", Some(500)).unwrap(),
            HeaderStatus::Fresh
        );
        assert_eq!(
            header_status(&file, "/inc/h.h", Some(501)).unwrap(),
            HeaderStatus::Stale
        );
        assert_eq!(
            header_status(&file, "/inc/h.h", None).unwrap(),
            HeaderStatus::Stale
        );
        assert_eq!(
            header_status(&file, "/inc/other.h", Some(500)).unwrap(),
            HeaderStatus::Unknown
        );
    }

    #[test]
    fn test_header_status_before_epoch() {
        let mut file = File::new("main.c", vec![]);
        file.add_header(
            "old.h",
            &ResolvedHeader {
                name: "/inc/old.h".to_string(),
                time: UNIX_EPOCH - Duration::from_secs(3600),
            },
        );
        assert_eq!(
            header_status(&file, "/inc/old.h", Some(-3600)).unwrap(),
            HeaderStatus::Fresh
        );
    }

    #[test]
    fn test_header_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&HeaderStatus::Stale).unwrap(),
            "\"stale\""
        );
        assert_eq!(HeaderStatus::Fresh.as_str(), "fresh");
    }
}
