//! # Manifest Rendering
//!
//! Turns a [`ScanTree`] into the final WXS document. The document shape is
//! fixed: one Product with packaging options, an icon, one Feature listing
//! every component, and a directory skeleton of
//!
//! ```text
//! TARGETDIR
//! ├── ProgramFilesFolder
//! │   └── INSTALLFOLDER          (the mirrored application tree)
//! └── ProgramMenuFolder
//!     └── ApplicationProgramsFolder
//!         └── ApplicationShortcut component
//! ```
//!
//! When the main executable was found, its component additionally carries
//! the application icon, one ProgId per content type with the extension and
//! open-verb records, and the HKCR command keys that make Windows route
//! double-clicks to the executable. The shortcut component gains the Start
//! Menu shortcut, an HKCU install-state marker, and a RemoveFolder cleanup
//! directive for uninstall.

use std::path::Path;
use anyhow::{Result, bail};
use log::{debug, info, warn};
use uuid::Uuid;

use crate::config::{ProductConfig, extensions_by_content_type};
use crate::scanner::{self, DirectoryNode, ExecutableRef, FileEntry, ROOT_KEY, ScanTree};
use crate::xml::{Element, write_atomic};

/// Component id of the Start Menu shortcut bundle. Always present in the
/// document, even when the executable was not found.
const SHORTCUT_COMPONENT_ID: &str = "ApplicationShortcut";

/// Runs the whole pipeline: validate, scan, render, write.
///
/// # Arguments
///
/// * `root` - Directory tree to package. Must exist.
/// * `output` - Where the manifest lands. Overwritten if present.
/// * `config` - Product identity constants.
/// * `dry_run` - Print the document to stdout instead of writing it.
///
/// # Returns
///
/// The number of component references in the generated feature (files plus
/// the shortcut component).
pub fn generate(
    root: &Path,
    output: &Path,
    config: &ProductConfig,
    dry_run: bool,
) -> Result<usize> {
    if !root.is_dir() {
        bail!("{} is not a valid directory", root.display());
    }

    let tree = scanner::scan(root, config)?;
    if tree.executable.is_none() {
        warn!(
            "Could not find {} under a bin directory; skipping shortcut and file associations",
            config.executable
        );
    }

    let document = render(&tree, config);
    let component_count = tree.component_refs.len() + 1;
    let text = document.to_document();

    if dry_run {
        print!("{text}");
    } else {
        write_atomic(output, &text)?;
        info!("Wrote {} ({} components)", output.display(), component_count);
    }

    Ok(component_count)
}

/// Assembles the full document tree.
fn render(tree: &ScanTree, config: &ProductConfig) -> Element {
    let mut product = Element::new("Product")
        .attr("Id", config.product_id)
        .attr("Name", config.name)
        .attr("Language", config.language)
        .attr("Version", config.version)
        .attr("Manufacturer", config.manufacturer)
        .attr("UpgradeCode", Uuid::new_v4().to_string());

    product.push(
        Element::new("Package")
            .attr("InstallerVersion", "200")
            .attr("Compressed", "yes")
            .attr("InstallScope", "perMachine"),
    );
    product.push(Element::new("MediaTemplate").attr("EmbedCab", "yes"));
    product.push(
        Element::new("Icon")
            .attr("Id", config.icon_id)
            .attr("SourceFile", config.icon_source),
    );
    // Shows the icon in the Add/Remove Programs list
    product.push(
        Element::new("Property")
            .attr("Id", "ARPPRODUCTICON")
            .attr("Value", config.icon_id),
    );

    let mut feature = Element::new("Feature")
        .attr("Id", "ProductFeature")
        .attr("Title", config.name)
        .attr("Level", "1");
    feature.push(Element::new("ComponentRef").attr("Id", SHORTCUT_COMPONENT_ID));
    for comp_id in &tree.component_refs {
        feature.push(Element::new("ComponentRef").attr("Id", comp_id.clone()));
    }
    product.push(feature);

    let mut target_dir = Element::new("Directory")
        .attr("Id", "TARGETDIR")
        .attr("Name", "SourceDir");

    let mut program_files = Element::new("Directory").attr("Id", "ProgramFilesFolder");
    if let Some(install_root) = tree.dir(ROOT_KEY) {
        program_files.push(render_directory(tree, install_root, config));
    }
    target_dir.push(program_files);

    let mut program_menu = Element::new("Directory").attr("Id", "ProgramMenuFolder");
    let mut app_menu = Element::new("Directory")
        .attr("Id", "ApplicationProgramsFolder")
        .attr("Name", config.name);
    app_menu.push(shortcut_component(tree.executable.as_ref(), config));
    program_menu.push(app_menu);
    target_dir.push(program_menu);

    product.push(target_dir);

    let mut wix = Element::new("Wix").attr("xmlns", "http://schemas.microsoft.com/wix/2006/wi");
    wix.push(product);
    wix
}

/// Renders one mirrored directory: its file components first, then its
/// subdirectories, recursively.
fn render_directory(tree: &ScanTree, node: &DirectoryNode, config: &ProductConfig) -> Element {
    let mut dir = Element::new("Directory")
        .attr("Id", node.id.clone())
        .attr("Name", node.name.clone());

    for file in &node.files {
        dir.push(file_component(file, tree.executable.as_ref(), config));
    }
    for key in &node.subdirs {
        if let Some(child) = tree.dir(key) {
            dir.push(render_directory(tree, child, config));
        }
    }
    dir
}

/// One component wrapping one file. The executable's component also takes
/// the icon and association records.
fn file_component(
    file: &FileEntry,
    executable: Option<&ExecutableRef>,
    config: &ProductConfig,
) -> Element {
    let mut component = Element::new("Component")
        .attr("Id", format!("Comp_{}", file.id))
        .attr("Guid", "*");
    component.push(
        Element::new("File")
            .attr("Id", file.id.clone())
            .attr("Source", file.source.display().to_string())
            .attr("KeyPath", "yes"),
    );

    if let Some(exe) = executable.filter(|exe| exe.file_id == file.id) {
        attach_associations(&mut component, exe, config);
    }

    component
}

/// Adds the icon file plus, per content-type group, a ProgId with its
/// extension and open-verb records and the matching HKCR command key.
fn attach_associations(component: &mut Element, exe: &ExecutableRef, config: &ProductConfig) {
    component.push(
        Element::new("File")
            .attr("Id", config.icon_file_id)
            .attr("Source", config.icon_source),
    );

    let open_command = format!("[INSTALLFOLDER]{} \"%1\"", exe.install_path);
    let groups = extensions_by_content_type();
    debug!("Registering {} file association groups", groups.len());

    for (content_type, extensions) in groups {
        // The first extension names the ProgId for the whole group.
        let prog_id_name = format!("{}.{}file", config.name, extensions[0]);

        let mut prog_id = Element::new("ProgId")
            .attr("Id", prog_id_name.clone())
            .attr("Description", config.name)
            .attr("Icon", config.icon_file_id);
        for ext in &extensions {
            let mut extension = Element::new("Extension")
                .attr("Id", *ext)
                .attr("ContentType", content_type);
            extension.push(
                Element::new("Verb")
                    .attr("Id", format!("open_{ext}"))
                    .attr("Command", "Open")
                    .attr("TargetFile", exe.file_id.clone())
                    .attr("Argument", "\"%1\""),
            );
            prog_id.push(extension);
        }
        component.push(prog_id);

        // Explicit command key so the shell resolves the association even
        // when the ProgId advertisement is not processed.
        let mut registry_key = Element::new("RegistryKey")
            .attr("Root", "HKCR")
            .attr("Key", format!("{prog_id_name}\\shell\\open\\command"));
        registry_key.push(
            Element::new("RegistryValue")
                .attr("Type", "string")
                .attr("Value", open_command.clone()),
        );
        component.push(registry_key);
    }
}

/// The Start Menu component. Its inner records exist only when the
/// executable was found; the empty component keeps the document shape (and
/// the feature's reference) stable either way.
fn shortcut_component(executable: Option<&ExecutableRef>, config: &ProductConfig) -> Element {
    let mut component = Element::new("Component")
        .attr("Id", SHORTCUT_COMPONENT_ID)
        .attr("Guid", "*");

    let Some(exe) = executable else {
        return component;
    };

    component.push(
        Element::new("Shortcut")
            .attr("Id", "ApplicationStartMenuShortcut")
            .attr("Name", config.name)
            .attr("Description", config.shortcut_description)
            .attr("Target", format!("[INSTALLFOLDER]{}", exe.install_path))
            .attr("WorkingDirectory", "INSTALLFOLDER"),
    );
    // Shortcuts cannot be a component's key path; an HKCU marker tracks
    // install state instead.
    component.push(
        Element::new("RegistryValue")
            .attr("Root", "HKCU")
            .attr("Key", config.registry_key)
            .attr("Name", "installed")
            .attr("Type", "integer")
            .attr("Value", "1")
            .attr("KeyPath", "yes"),
    );
    component.push(
        Element::new("RemoveFolder")
            .attr("Id", "RemoveApplicationProgramsFolder")
            .attr("Directory", "ApplicationProgramsFolder")
            .attr("On", "uninstall"),
    );

    component
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"").unwrap();
    }

    fn sample_app() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "bin/MView6.exe");
        touch(dir.path(), "bin/lib.dll");
        touch(dir.path(), "share/icon.png");
        let out = dir.path().join("out.wxs");
        (dir, out)
    }

    #[test]
    fn generates_a_complete_manifest() {
        let (dir, out) = sample_app();
        let config = ProductConfig::default();

        let count = generate(dir.path(), &out, &config, false).unwrap();
        assert_eq!(count, 4); // 3 files + the shortcut component

        let doc = fs::read_to_string(&out).unwrap();
        assert!(doc.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>"));
        assert!(doc.contains(r#"<Wix xmlns="http://schemas.microsoft.com/wix/2006/wi">"#));
        assert_eq!(doc.matches("<ComponentRef ").count(), 4);

        // shortcut and association commands both point at the installed exe
        assert!(doc.contains(r#"Target="[INSTALLFOLDER]bin\MView6.exe""#));
        assert!(doc.contains(r#"Value="[INSTALLFOLDER]bin\MView6.exe &quot;%1&quot;""#));
        assert!(doc.contains(r#"TargetFile="File_MView6""#));

        // one ProgId per distinct content type
        let expected_groups = extensions_by_content_type().len();
        assert_eq!(doc.matches("<ProgId ").count(), expected_groups);
        assert_eq!(doc.matches("<RegistryKey ").count(), expected_groups);
    }

    #[test]
    fn missing_executable_still_writes_a_manifest() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "docs/readme.txt");
        let out = dir.path().join("out.wxs");

        let count = generate(dir.path(), &out, &ProductConfig::default(), false).unwrap();
        assert_eq!(count, 2); // 1 file + the shortcut component

        let doc = fs::read_to_string(&out).unwrap();
        assert!(!doc.contains("<Shortcut "));
        assert!(!doc.contains("<ProgId "));
        // the (empty) shortcut component and its reference are still there
        assert_eq!(doc.matches("\"ApplicationShortcut\"").count(), 2);
    }

    #[test]
    fn rejects_a_root_that_is_not_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("not-a-dir");
        fs::write(&file, b"").unwrap();
        let out = dir.path().join("out.wxs");

        assert!(generate(&file, &out, &ProductConfig::default(), false).is_err());
        assert!(!out.exists());
    }

    #[test]
    fn dry_run_writes_nothing() {
        let (dir, out) = sample_app();

        let count = generate(dir.path(), &out, &ProductConfig::default(), true).unwrap();
        assert_eq!(count, 4);
        assert!(!out.exists());
    }

    #[test]
    fn every_input_file_appears_exactly_once() {
        let (dir, out) = sample_app();

        generate(dir.path(), &out, &ProductConfig::default(), false).unwrap();
        let doc = fs::read_to_string(&out).unwrap();

        for rel in ["bin/MView6.exe", "bin/lib.dll", "share/icon.png"] {
            let needle = format!("Source=\"{}\"", dir.path().join(rel).display());
            assert_eq!(
                doc.matches(&needle).count(),
                1,
                "expected exactly one component for {rel}"
            );
        }
        // three file records plus the icon record inside the exe component
        assert_eq!(doc.matches("<File ").count(), 4);
    }
}
