/// Prepend a caller supplied prefix to a drive key.
///
/// The prefix is kept verbatim, so every result starts with it; only the separator between
/// prefix and key is deduplicated.
pub fn prefixed_key(prefix: &str, path: &str) -> String {
    if prefix.is_empty() {
        return path.to_string();
    }
    let path = path.trim_start_matches('/');
    if prefix.ends_with(['/', '\\']) {
        format!("{prefix}{path}")
    } else {
        format!("{prefix}/{path}")
    }
}

/// Directory portion of a key, always ending in `/`.
pub fn dirname(path: &str) -> &str {
    match path.rfind('/') {
        Some(index) => &path[..=index],
        None => "/",
    }
}

/// Final segment of a key.
pub fn basename(path: &str) -> &str {
    match path.rfind('/') {
        Some(index) => &path[index + 1..],
        None => path,
    }
}

/// Resolve a relative or absolute specifier against a base directory.
///
/// `.` and `..` segments are folded; climbing above the root stays at the root. A trailing
/// slash on the specifier is dropped.
pub fn join_specifier(base_dir: &str, specifier: &str) -> String {
    let combined = if specifier.starts_with('/') {
        specifier.to_string()
    } else {
        format!("{}/{}", base_dir.trim_end_matches('/'), specifier)
    };

    let mut segments: Vec<&str> = Vec::new();
    for segment in combined.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    format!("/{}", segments.join("/"))
}
