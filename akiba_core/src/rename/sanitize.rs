//! Path segment sanitizing

use std::path::PathBuf;

/// Replacement for characters that are not allowed in file names
pub const REPLACEMENT: char = '_';

const RESERVED: [char; 9] = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Escape path separators so a value stays inside one segment
pub fn escape_separators(value: &str) -> String {
    value.replace(['/', '\\'], &REPLACEMENT.to_string())
}

/// Make one path segment safe on common filesystems
///
/// Reserved and control characters are replaced and trailing dots removed.
pub fn sanitize_segment(segment: &str) -> String {
    let replaced: String = segment
        .chars()
        .map(|c| {
            if RESERVED.contains(&c) || c.is_control() {
                REPLACEMENT
            } else {
                c
            }
        })
        .collect();
    replaced.trim_end_matches('.').to_string()
}

/// Sanitize every `/` separated segment of a rendered template
///
/// Segments that end up empty are dropped, which also removes `.` and `..`.
pub fn sanitize_path(rendered: &str) -> PathBuf {
    rendered
        .split('/')
        .map(sanitize_segment)
        .filter(|segment| !segment.is_empty())
        .collect()
}
