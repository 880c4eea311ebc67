//! Identifier generation: GUIDs and timestamp-based unique ids.

use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// A fresh random GUID in uppercase hyphenated form,
/// e.g. `550E8400-E29B-41D4-A716-446655440000`.
#[must_use]
pub fn new_guid() -> String {
    Uuid::new_v4().to_string().to_uppercase()
}

/// A 13-hex-digit id derived from the current time (seconds plus
/// microseconds), optionally prefixed. Ids generated in the same
/// microsecond collide; use [`new_unique_id_among`] when that matters.
#[must_use]
pub fn new_unique_id(prefix: Option<&str>) -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    let id = format!("{:08x}{:05x}", now.as_secs() as u32, now.subsec_micros());
    match prefix {
        Some(prefix) => format!("{prefix}{id}"),
        None => id,
    }
}

/// Generates GUIDs until one is absent from `existing`.
#[must_use]
pub fn new_guid_among(existing: &[String]) -> String {
    loop {
        let guid = new_guid();
        if !existing.contains(&guid) {
            return guid;
        }
    }
}

/// Generates unique ids until one is absent from `existing`.
#[must_use]
pub fn new_unique_id_among(existing: &[String], prefix: Option<&str>) -> String {
    loop {
        let id = new_unique_id(prefix);
        if !existing.contains(&id) {
            return id;
        }
    }
}
