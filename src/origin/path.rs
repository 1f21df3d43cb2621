use percent_encoding::percent_decode_str;
use std::borrow::Cow;
use std::path::{Path, PathBuf};

pub fn decode_segment(segment: &str) -> Option<Cow<'_, str>> {
    percent_decode_str(segment).decode_utf8().ok()
}

/// Maps a request path onto a file below `root`.
///
/// `..` can never climb above `root`: it only pops segments that were pushed
/// by this same path. Segments that could be reinterpreted by the OS
/// (backslashes, NUL) reject the whole path.
pub fn resolve(root: &Path, request_path: &str) -> Option<PathBuf> {
    let decoded = percent_decode_str(request_path).decode_utf8().ok()?;

    let mut segments = Vec::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s if s.contains(['\\', '\0']) => return None,
            s => segments.push(s),
        }
    }

    let mut path = root.to_path_buf();
    path.extend(segments);
    Some(path)
}

/// Strips a mount prefix like `/sites/` (or `sites`) from a request path,
/// requiring it to end on a segment boundary. An empty prefix mounts at the root.
pub fn strip_mount<'a>(mount: &str, request_path: &'a str) -> Option<&'a str> {
    let mount = mount.trim_matches('/');
    if mount.is_empty() {
        return Some(request_path);
    }
    match request_path.strip_prefix('/')?.strip_prefix(mount)? {
        "" => Some("/"),
        rest if rest.starts_with('/') => Some(rest),
        _ => None,
    }
}
