//! # Static Product Configuration
//!
//! Everything identity-related about the generated installer lives here:
//! product GUID, display name, version, icon, the name of the executable
//! that receives the Start Menu shortcut, and the table of file extensions
//! the application registers itself for.
//!
//! None of this is configurable at runtime. The values are compiled in, but
//! they are carried in a struct (rather than scattered literals) so that the
//! scanner and renderer can be exercised in tests with alternate values.

/// File extensions the application registers as openable, paired with their
/// MIME content type. Order matters: the first extension of each content
/// type names the ProgId for the whole group.
pub const EXTENSIONS: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("avif", "image/avif"),
    ("heic", "image/heic"),
    ("webp", "image/webp"),
    ("svg", "image/svg+xml"),
    ("svgz", "image/svg+xml"),
    ("pdf", "application/pdf"),
    ("epub", "application/epub+zip"),
];

/// Fixed identity constants for the product being packaged.
///
/// Passed explicitly into [`crate::scanner::scan`] and
/// [`crate::manifest::generate`] so the pipeline stays reentrant and
/// testable with substitute values.
#[derive(Debug, Clone)]
pub struct ProductConfig {
    /// Stable MSI Product GUID. Changing this makes Windows treat the
    /// package as a different product entirely.
    pub product_id: &'static str,
    /// Display name. Also names the install folder, the Start Menu group,
    /// and the ProgId prefix for file associations.
    pub name: &'static str,
    /// Four-part MSI version string.
    pub version: &'static str,
    /// MSI language id (1033 = en-US).
    pub language: &'static str,
    pub manufacturer: &'static str,
    /// WiX Icon element id, referenced by ARPPRODUCTICON.
    pub icon_id: &'static str,
    /// File element id of the icon copied next to the executable.
    pub icon_file_id: &'static str,
    /// Source path of the .ico file, relative to where WiX runs.
    pub icon_source: &'static str,
    /// Name of the main executable. Matched case-insensitively, and only
    /// inside a directory path containing a "bin" segment.
    pub executable: &'static str,
    pub shortcut_description: &'static str,
    /// HKCU key holding the install-state marker for the shortcut component.
    pub registry_key: &'static str,
    /// Output filename used when none is given on the command line.
    pub default_output: &'static str,
}

impl Default for ProductConfig {
    fn default() -> Self {
        Self {
            product_id: "69c966bc-c892-421f-a9d0-749e21a0745a",
            name: "MView6",
            version: "1.0.0.0",
            language: "1033",
            manufacturer: "NewInnovations",
            icon_id: "MView6Icon",
            icon_file_id: "File_MView6Icon",
            icon_source: "resources/mview6.ico",
            executable: "MView6.exe",
            shortcut_description: "Launch MView6 Application",
            registry_key: "Software\\MView6",
            default_output: "mview6.wxs",
        }
    }
}

/// Groups [`EXTENSIONS`] by content type, preserving first-seen order.
///
/// Each group becomes one ProgId in the manifest; every extension lands in
/// exactly one group.
pub fn extensions_by_content_type() -> Vec<(&'static str, Vec<&'static str>)> {
    let mut groups: Vec<(&'static str, Vec<&'static str>)> = Vec::new();
    for &(ext, content_type) in EXTENSIONS {
        match groups.iter_mut().find(|(ct, _)| *ct == content_type) {
            Some((_, exts)) => exts.push(ext),
            None => groups.push((content_type, vec![ext])),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn groups_cover_every_extension_exactly_once() {
        let groups = extensions_by_content_type();

        let distinct_types: HashSet<&str> = EXTENSIONS.iter().map(|&(_, ct)| ct).collect();
        assert_eq!(groups.len(), distinct_types.len());

        let total: usize = groups.iter().map(|(_, exts)| exts.len()).sum();
        assert_eq!(total, EXTENSIONS.len());
    }

    #[test]
    fn groups_preserve_first_seen_order() {
        let groups = extensions_by_content_type();
        assert_eq!(groups[0], ("image/jpeg", vec!["jpg", "jpeg"]));

        let svg = groups
            .iter()
            .find(|(ct, _)| *ct == "image/svg+xml")
            .expect("svg group present");
        // "svg" leads the group, so the ProgId is named after it
        assert_eq!(svg.1, vec!["svg", "svgz"]);
    }
}
