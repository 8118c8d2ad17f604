//! Storage result types
//!
//! Defines result structures returned by the read-only storage reports.

use serde::Serialize;

/// Units used by human-readable sizes, in 1024 steps.
pub const SIZE_UNITS: [&str; 4] = ["bytes", "KB", "MB", "GB"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    File,
    Folder,
}

/// One row of a directory listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EntryType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_human: Option<String>,
}

impl DirectoryEntry {
    pub fn new(name: String, kind: EntryType, size: Option<u64>) -> Self {
        Self {
            name,
            kind,
            size,
            size_human: size.map(human_size),
        }
    }
}

/// Result of a disk usage query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiskUsage {
    pub total: String,
    pub used: String,
    pub free: String,
}

impl DiskUsage {
    pub fn from_bytes(total: u64, used: u64, free: u64) -> Self {
        Self {
            total: human_size(total),
            used: human_size(used),
            free: human_size(free),
        }
    }
}

/// Render a byte count as bytes/KB/MB/GB.
pub fn human_size(bytes: u64) -> String {
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, SIZE_UNITS[0])
    } else {
        format!("{:.2} {}", value, SIZE_UNITS[unit])
    }
}
