//! # XML Emission
//!
//! A minimal owned element tree plus a pretty printer, enough to produce a
//! well-formed WXS document. The manifest is attribute-only, so there is no
//! text-node support.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Context, Result};

/// One XML element: tag, ordered attributes, ordered children.
#[derive(Debug, Clone)]
pub struct Element {
    tag: &'static str,
    attrs: Vec<(&'static str, String)>,
    children: Vec<Element>,
}

impl Element {
    pub fn new(tag: &'static str) -> Self {
        Self { tag, attrs: Vec::new(), children: Vec::new() }
    }

    /// Appends an attribute, builder-style.
    pub fn attr(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.attrs.push((name, value.into()));
        self
    }

    pub fn push(&mut self, child: Element) {
        self.children.push(child);
    }

    /// Renders the full document: XML declaration, two-space indentation,
    /// self-closing empty elements, one trailing newline.
    pub fn to_document(&self) -> String {
        let mut out = String::from("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
        self.render(&mut out, 0);
        out
    }

    fn render(&self, out: &mut String, depth: usize) {
        let pad = "  ".repeat(depth);
        out.push_str(&pad);
        out.push('<');
        out.push_str(self.tag);
        for (name, value) in &self.attrs {
            let _ = write!(out, " {}=\"{}\"", name, escape_attr(value));
        }
        if self.children.is_empty() {
            out.push_str("/>\n");
        } else {
            out.push_str(">\n");
            for child in &self.children {
                child.render(out, depth + 1);
            }
            let _ = writeln!(out, "{}</{}>", pad, self.tag);
        }
    }
}

fn escape_attr(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Writes `contents` to `path` via a sibling temp file and a rename.
///
/// A failure mid-write leaves the previous output (if any) untouched; the
/// target path never holds a truncated document.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let mut tmp_name = path.as_os_str().to_os_string();
    tmp_name.push(".tmp");
    let tmp = PathBuf::from(tmp_name);

    fs::write(&tmp, contents)
        .with_context(|| format!("failed to write {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("failed to move manifest into place at {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_nested_elements_with_indentation() {
        let mut product = Element::new("Product").attr("Name", "Demo");
        product.push(Element::new("Package").attr("Compressed", "yes"));
        let mut root = Element::new("Wix").attr("xmlns", "ns");
        root.push(product);

        let expected = "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
                        <Wix xmlns=\"ns\">\n\
                        \x20 <Product Name=\"Demo\">\n\
                        \x20   <Package Compressed=\"yes\"/>\n\
                        \x20 </Product>\n\
                        </Wix>\n";
        assert_eq!(root.to_document(), expected);
    }

    #[test]
    fn escapes_attribute_values() {
        let el = Element::new("File").attr("Source", r#"a "b" <c> & d"#);
        assert!(el
            .to_document()
            .contains(r#"Source="a &quot;b&quot; &lt;c&gt; &amp; d""#));
    }

    #[test]
    fn write_atomic_replaces_existing_output() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.wxs");
        fs::write(&target, "old").unwrap();

        write_atomic(&target, "new contents").unwrap();

        assert_eq!(fs::read_to_string(&target).unwrap(), "new contents");
        // the temp file must not linger
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
