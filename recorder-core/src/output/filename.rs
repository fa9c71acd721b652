//! Output file naming: timestamp slugs, character sanitizing, and
//! existence-probing collision resolution against the vault.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::models::device::UNKNOWN_DEVICE_LABEL;
use crate::models::error::RecorderError;
use crate::traits::vault::Vault;

/// Characters never allowed in a file name component.
const FORBIDDEN: [char; 9] = ['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// RFC 3339 UTC timestamp with `:` and `.` replaced by `-`, safe for file
/// names on every platform.
pub fn timestamp_slug(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-")
}

/// Replace path-hostile characters with `-`.
pub fn sanitize_component(name: &str) -> String {
    name.chars()
        .map(|c| if FORBIDDEN.contains(&c) { '-' } else { c })
        .collect()
}

/// Reduce a device label to alphanumerics; an unresolvable label becomes
/// `UnknownDevice`.
pub fn sanitize_source_label(label: &str) -> String {
    let cleaned: String = label.chars().filter(|c| c.is_alphanumeric()).collect();
    if cleaned.is_empty() {
        UNKNOWN_DEVICE_LABEL.to_string()
    } else {
        cleaned
    }
}

/// File name for the merged stereo bounce.
pub fn mixdown_file_name(prefix: &str, timestamp: &str) -> String {
    format!("{}-multitrack-{}.wav", sanitize_component(prefix), timestamp)
}

/// File name for one track persisted in its native captured format.
pub fn track_file_name(prefix: &str, source_label: &str, timestamp: &str, ext: &str) -> String {
    format!(
        "{}-{}-{}.{}",
        sanitize_component(prefix),
        sanitize_source_label(source_label),
        timestamp,
        ext
    )
}

/// Join the configured save folder and a file name into a vault path.
pub fn vault_path(folder: &str, file_name: &str) -> String {
    let folder = folder.trim_end_matches('/');
    if folder.is_empty() {
        file_name.to_string()
    } else {
        format!("{}/{}", folder, file_name)
    }
}

/// Probe the vault and append `_{n}` before the extension until the path is
/// free. The caller serializes persistence, so probe-then-write is not racy
/// from the vault's perspective.
pub fn resolve_collision(vault: &dyn Vault, path: &str) -> Result<String, RecorderError> {
    if !vault.exists(path)? {
        return Ok(path.to_string());
    }

    let (stem, ext) = split_extension(path);
    let mut n = 1;
    loop {
        let candidate = format!("{}_{}{}", stem, n, ext);
        if !vault.exists(&candidate)? {
            return Ok(candidate);
        }
        n += 1;
    }
}

/// Split a path into `(stem, extension-with-dot)`. A dot inside a folder
/// name does not count as an extension.
fn split_extension(path: &str) -> (&str, &str) {
    let file_start = path.rfind('/').map(|i| i + 1).unwrap_or(0);
    match path[file_start..].rfind('.') {
        Some(dot) => path.split_at(file_start + dot),
        None => (path, ""),
    }
}
