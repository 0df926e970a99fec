//! # Naming Convention Module
//!
//! Trasformazioni pure dei nomi: segmenti di directory e varianti 2x.
//! Nessun I/O, nessuno stato.
//!
//! ## Varianti 2x
//!
//! Nell'albero di input una variante ad alta densità è marcata con il suffisso
//! `@2x` sul nome base (`hero@2x.png`). Nell'output viene rinominata con il
//! suffisso canonico `_2x` (`hero_2x.webp`), che è sicuro negli URL.
//!
//! - `hero` → `transform_variant_name` → `hero_2x`
//! - `hero@2x`, `hero@2x-dark` e `hero_2x` sono varianti, `hero` no
//! - `hero@2x-dark` → `hero_2x-dark`: il marker diventa il suffisso della base
//!
//! ## Directory
//!
//! I file direttamente sotto la root non cambiano directory. Per le directory
//! annidate ogni segmento passa attraverso una [`DirectoryNaming`] policy:
//! - `Identity`: `Summer Trip/Day_1` → `Summer Trip/Day_1`
//! - `Lowercase`: `Summer Trip/Day_1` → `summer trip/day_1`
//! - `KebabCase`: `Summer Trip/Day_1` → `summer-trip/day-1`

use crate::error::ConvertError;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

/// Marker carried by 2x variants in the input tree
pub const SOURCE_VARIANT_MARKER: &str = "@2x";

/// Suffix given to 2x variants in the output tree
pub const VARIANT_SUFFIX: &str = "_2x";

/// Rewrite rule applied to every nested directory segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum DirectoryNaming {
    #[default]
    Identity,
    Lowercase,
    KebabCase,
}

impl DirectoryNaming {
    /// Rewrite a single directory segment
    pub fn rewrite_segment(&self, segment: &str) -> Result<String, ConvertError> {
        let rewritten = match self {
            Self::Identity => segment.to_string(),
            Self::Lowercase => segment.to_lowercase(),
            Self::KebabCase => kebab_case(segment),
        };

        if rewritten.is_empty() {
            return Err(ConvertError::InvalidName(segment.to_string()));
        }
        Ok(rewritten)
    }
}

fn kebab_case(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    let mut pending_dash = false;

    for ch in segment.chars() {
        if ch.is_whitespace() || ch == '_' || ch == '.' || ch == '-' {
            pending_dash = true;
            continue;
        }
        if pending_dash && !out.is_empty() {
            out.push('-');
        }
        pending_dash = false;
        out.extend(ch.to_lowercase());
    }

    out
}

/// Map a root-relative directory to its output-relative equivalent.
///
/// An empty path (file directly under the root) maps to an empty path.
pub fn transform_directory(relative_dir: &Path, naming: DirectoryNaming) -> Result<PathBuf, ConvertError> {
    let mut out = PathBuf::new();

    for component in relative_dir.components() {
        match component {
            Component::Normal(segment) => {
                let segment = segment
                    .to_str()
                    .ok_or_else(|| ConvertError::InvalidName(segment.to_string_lossy().into_owned()))?;
                out.push(naming.rewrite_segment(segment)?);
            }
            Component::CurDir => {}
            other => {
                return Err(ConvertError::InvalidName(
                    other.as_os_str().to_string_lossy().into_owned(),
                ));
            }
        }
    }

    Ok(out)
}

/// Name of the 2x counterpart of a base asset
pub fn transform_variant_name(base_name: &str) -> Result<String, ConvertError> {
    if base_name.is_empty() {
        return Err(ConvertError::InvalidName(base_name.to_string()));
    }
    Ok(format!("{}{}", base_name, VARIANT_SUFFIX))
}

/// Split a stem around its first `@2x` marker: `hero@2x-dark` gives `("hero", "-dark")`.
///
/// `None` when there is no marker or nothing precedes it.
pub fn split_source_marker(name: &str) -> Option<(&str, &str)> {
    name.split_once(SOURCE_VARIANT_MARKER)
        .filter(|(base, _)| !base.is_empty())
}

/// Whether a file stem carries the input-tree `@2x` marker
pub fn has_source_marker(name: &str) -> bool {
    split_source_marker(name).is_some()
}

/// Output stem of a 2x source: the base gets the `_2x` suffix, the rest is kept
pub fn variant_output_stem(name: &str) -> Result<Option<String>, ConvertError> {
    match split_source_marker(name) {
        Some((base, rest)) => Ok(Some(format!("{}{}", transform_variant_name(base)?, rest))),
        None => Ok(None),
    }
}

/// Name of a 2x variant with its marker removed, `None` if `name` is a base asset
pub fn strip_variant_marker(name: &str) -> Option<String> {
    if let Some((base, rest)) = split_source_marker(name) {
        return Some(format!("{}{}", base, rest));
    }
    name.strip_suffix(VARIANT_SUFFIX)
        .filter(|base| !base.is_empty())
        .map(str::to_string)
}

/// Whether a file stem names a 2x variant, in the input or the output tree
pub fn is_variant_name(name: &str) -> bool {
    strip_variant_marker(name).is_some()
}
