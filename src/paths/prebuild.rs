use super::extension::extension;

const PREBUILDS_SEGMENT: &str = "prebuilds";

/// A native binary path split into the parts that matter for content addressing.
///
/// `/node_modules/addon/prebuilds/linux-x64/addon.node` splits into the package directory
/// `["node_modules", "addon"]`, the host directories `["linux-x64"]` and the file name
/// `addon.node`. Paths without a `prebuilds` directory keep an empty host list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrebuildPath<'a> {
    /// Segments preceding the `prebuilds` directory.
    pub package_dir: Vec<&'a str>,
    /// Segments between `prebuilds` and the file name.
    pub host_dirs: Vec<&'a str>,
    /// Final segment.
    pub file_name: &'a str,
}

impl<'a> PrebuildPath<'a> {
    /// Split `path` at its first `prebuilds` directory.
    pub fn parse(path: &'a str) -> Self {
        let mut segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let file_name = segments.pop().unwrap_or_default();

        match segments.iter().position(|segment| *segment == PREBUILDS_SEGMENT) {
            Some(index) => Self {
                package_dir: segments[..index].to_vec(),
                host_dirs: segments[index + 1..].to_vec(),
                file_name,
            },
            None => Self {
                package_dir: segments,
                host_dirs: Vec::new(),
                file_name,
            },
        }
    }

    /// Canonical content-addressed location: the package directory is dropped and the file
    /// name is replaced by `digest`, keeping host directories and the extension.
    pub fn canonical(&self, digest: &str) -> String {
        let ext = extension(self.file_name).unwrap_or_default();
        let mut segments = vec![PREBUILDS_SEGMENT];
        segments.extend(self.host_dirs.iter().copied());
        format!("/{}/{}{}", segments.join("/"), digest, ext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIGEST: &str = "ab12";

    #[test]
    fn splits_package_host_and_file() {
        let parsed = PrebuildPath::parse("/node_modules/addon/prebuilds/linux-x64/addon.node");
        assert_eq!(parsed.package_dir, vec!["node_modules", "addon"]);
        assert_eq!(parsed.host_dirs, vec!["linux-x64"]);
        assert_eq!(parsed.file_name, "addon.node");
    }

    #[test]
    fn canonical_path_drops_package_directory() {
        let root = PrebuildPath::parse("/prebuilds/linux-x64/addon.node");
        let nested = PrebuildPath::parse("/node_modules/a/node_modules/b/prebuilds/linux-x64/b.node");
        assert_eq!(root.canonical(DIGEST), "/prebuilds/linux-x64/ab12.node");
        assert_eq!(nested.canonical(DIGEST), "/prebuilds/linux-x64/ab12.node");
    }

    #[test]
    fn canonical_path_keeps_deeper_host_directories() {
        let parsed = PrebuildPath::parse("/pkg/prebuilds/linux-x64/glibc/pkg.bare");
        assert_eq!(parsed.canonical(DIGEST), "/prebuilds/linux-x64/glibc/ab12.bare");
    }

    #[test]
    fn binaries_outside_prebuilds_land_at_the_prebuilds_root() {
        let parsed = PrebuildPath::parse("/build/Release/addon.node");
        assert!(parsed.host_dirs.is_empty());
        assert_eq!(parsed.canonical(DIGEST), "/prebuilds/ab12.node");
    }

    #[test]
    fn prebuilds_named_file_is_not_a_directory() {
        let parsed = PrebuildPath::parse("/lib/prebuilds");
        assert_eq!(parsed.file_name, "prebuilds");
        assert_eq!(parsed.package_dir, vec!["lib"]);
    }
}
