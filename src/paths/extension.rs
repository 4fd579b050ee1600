use super::join::basename;

/// Extension of the final path segment including the leading dot.
///
/// Dots inside directory names are ignored, as is a leading dot on the file name itself
/// (`/.env` has no extension).
pub fn extension(path: &str) -> Option<&str> {
    let name = basename(path);
    match name.rfind('.') {
        Some(0) | None => None,
        Some(index) => Some(&name[index..]),
    }
}

/// Returns `true` when the extension of `path` is one of `extensions`.
pub fn has_extension_in(path: &str, extensions: &[String]) -> bool {
    extension(path).is_some_and(|ext| extensions.iter().any(|candidate| candidate == ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_extension_of_final_segment() {
        assert_eq!(extension("/prebuilds/linux-x64/addon.node"), Some(".node"));
        assert_eq!(extension("/lib.d/readme"), None);
        assert_eq!(extension("/.env"), None);
        assert_eq!(extension("/archive.tar.gz"), Some(".gz"));
    }

    #[test]
    fn matches_against_extension_lists() {
        let native = vec![".node".to_string(), ".bare".to_string()];
        assert!(has_extension_in("/a/b.bare", &native));
        assert!(!has_extension_in("/a/b.js", &native));
        assert!(!has_extension_in("/a/node", &native));
    }
}
