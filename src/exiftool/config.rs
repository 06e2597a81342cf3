use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::error::ConfigError;
use super::{tag_name, Namespace};
use crate::mediavalet::AttributeCatalog;

/// Default file name of the generated config, relative to the working
/// directory.
pub const DEFAULT_CONFIG_FILE: &str = "ExifTool_config";

/// Map each XMP tag to the attribute display name it was derived from.
///
/// Distinct display names that normalize to the same tag are rejected so
/// one file never receives two values for the same tag.
pub fn declared_tags(catalog: &AttributeCatalog) -> Result<BTreeMap<String, String>, ConfigError> {
    let mut tags: BTreeMap<String, String> = BTreeMap::new();
    for name in catalog.names() {
        let tag = tag_name(name);
        if tag.is_empty() {
            return Err(ConfigError::EmptyTag(name.to_string()));
        }
        match tags.entry(tag) {
            Entry::Vacant(slot) => {
                slot.insert(name.to_string());
            }
            Entry::Occupied(slot) => {
                if slot.get() != name {
                    return Err(ConfigError::TagCollision {
                        tag: slot.key().clone(),
                        first: slot.get().clone(),
                        second: name.to_string(),
                    });
                }
            }
        }
    }
    Ok(tags)
}

/// Render the ExifTool user-defined tag table for the namespace.
///
/// The output depends only on the namespace and the catalog's name set;
/// tags are listed in sorted order.
pub fn render_config(catalog: &AttributeCatalog, namespace: &Namespace) -> Result<String, ConfigError> {
    let tags = declared_tags(catalog)?;
    let prefix = &namespace.prefix;

    let mut lines = vec![
        format!("%Image::ExifTool::UserDefined::{prefix} = ("),
        format!(
            "    GROUPS        => {{ 0 => 'XMP', 1 => '{}', 2 => 'Image' }},",
            namespace.group()
        ),
        format!("    NAMESPACE     => {{ '{prefix}' => '{}' }},", namespace.uri),
        "    WRITABLE      => 'string',".to_string(),
    ];
    lines.extend(tags.keys().map(|tag| format!("    {tag} => {{ }},")));
    lines.push(");".to_string());
    lines.push(String::new());

    lines.extend([
        "%Image::ExifTool::UserDefined = (".to_string(),
        "    'Image::ExifTool::XMP::Main' => {".to_string(),
        format!("        {prefix} => {{"),
        "            SubDirectory => {".to_string(),
        format!("                TagTable => 'Image::ExifTool::UserDefined::{prefix}',"),
        "            },".to_string(),
        "        },".to_string(),
        "    },".to_string(),
        ");".to_string(),
        String::new(),
        "#------------------------------------------------------------------------------".to_string(),
        "1;  #end".to_string(),
    ]);

    Ok(lines.join("\n"))
}

/// Generate the config and overwrite `path` with it.
///
/// Returns the absolute path of the written file, which is what ExifTool
/// is later pointed at.
pub fn write_config(
    catalog: &AttributeCatalog,
    namespace: &Namespace,
    path: &Path,
) -> Result<PathBuf, ConfigError> {
    let content = render_config(catalog, namespace)?;
    let write_err = |source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    };

    std::fs::write(path, content).map_err(write_err)?;
    let absolute = std::path::absolute(path).map_err(write_err)?;

    tracing::info!(
        "ExifTool configuration file successfully written to: {}",
        absolute.display()
    );
    Ok(absolute)
}
