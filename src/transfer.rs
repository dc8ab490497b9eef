/// Import and export of the link list as a JSON document

use crate::error::SidebarError;
use crate::links::validate_url;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

pub const EXPORT_VERSION: &str = "1.0";

/// Exported file layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub urls: Vec<String>,
    pub export_date: String,
    pub version: String,
}

impl ExportDocument {
    pub fn new(urls: &[String], export_date: &str) -> Self {
        ExportDocument {
            urls: urls.to_vec(),
            export_date: export_date.to_string(),
            version: EXPORT_VERSION.to_string(),
        }
    }

    /// File name derived from the date part of the export timestamp
    pub fn file_name(&self) -> String {
        let day = self.export_date.get(..10).unwrap_or("export");
        format!("sidebar-links-{}.json", day)
    }

    pub fn to_json(&self) -> Result<String, SidebarError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| SidebarError::Format(format!("Failed to serialize export: {}", e)))
    }
}

/// Counts reported after an import
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped_invalid: usize,
    pub skipped_duplicate: usize,
}

impl ImportReport {
    pub fn summary(&self) -> String {
        if self.imported == 0 {
            let mut message = "No new links to import".to_string();
            if self.skipped_invalid + self.skipped_duplicate > 0 {
                message.push_str(&format!(
                    " ({} invalid, {} already saved)",
                    self.skipped_invalid, self.skipped_duplicate
                ));
            }
            return message;
        }

        let noun = if self.imported == 1 { "link" } else { "links" };
        let mut parts = vec![format!("Imported {} {}", self.imported, noun)];
        if self.skipped_invalid > 0 {
            parts.push(format!("skipped {} invalid", self.skipped_invalid));
        }
        if self.skipped_duplicate > 0 {
            let noun = if self.skipped_duplicate == 1 { "duplicate" } else { "duplicates" };
            parts.push(format!("skipped {} {}", self.skipped_duplicate, noun));
        }
        parts.join(", ")
    }
}

/// Pull the `urls` entries out of an import file
///
/// Entries are returned untyped so non-string items can be counted as
/// invalid rather than failing the whole file.
pub fn parse_import(text: &str) -> Result<Vec<Value>, SidebarError> {
    let document: Value = serde_json::from_str(text)
        .map_err(|e| SidebarError::Format(format!("Import file is not valid JSON: {}", e)))?;

    match document.get("urls") {
        Some(Value::Array(urls)) => Ok(urls.clone()),
        Some(_) => Err(SidebarError::Format(
            "Import file field \"urls\" must be a list".to_string(),
        )),
        None => Err(SidebarError::Format(
            "Import file is missing the \"urls\" field".to_string(),
        )),
    }
}

/// Append the valid new entries to `links`, in file order
pub fn merge_import(links: &[String], candidates: &[Value]) -> (Vec<String>, ImportReport) {
    let existing: HashSet<&str> = links.iter().map(String::as_str).collect();
    let mut in_file: HashSet<String> = HashSet::new();
    let mut merged = links.to_vec();
    let mut report = ImportReport::default();

    for candidate in candidates {
        let url = match candidate.as_str().map(validate_url) {
            Some(Ok(url)) => url,
            _ => {
                report.skipped_invalid += 1;
                continue;
            }
        };

        // Repeats within the file collapse into their first occurrence
        if !in_file.insert(url.clone()) {
            continue;
        }

        if existing.contains(url.as_str()) {
            report.skipped_duplicate += 1;
        } else {
            merged.push(url);
            report.imported += 1;
        }
    }

    (merged, report)
}

/// Parse and merge an import file in one step
pub fn import_links(links: &[String], text: &str) -> Result<(Vec<String>, ImportReport), SidebarError> {
    let candidates = parse_import(text)?;
    Ok(merge_import(links, &candidates))
}

/// Minimal description of a picked or dropped file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMeta {
    pub name: String,
    pub mime_type: String,
}

/// Accept exactly one JSON file before anything is read
pub fn check_import_files(files: &[FileMeta]) -> Result<Option<&FileMeta>, SidebarError> {
    match files {
        [] => Ok(None),
        [file] => {
            let is_json = file.mime_type == "application/json"
                || file.name.to_lowercase().ends_with(".json");
            if is_json {
                Ok(Some(file))
            } else {
                Err(SidebarError::Format(format!(
                    "Unsupported file type: {} (expected a .json export)",
                    file.name
                )))
            }
        }
        _ => Err(SidebarError::Format(
            "Please drop a single file to import".to_string(),
        )),
    }
}
