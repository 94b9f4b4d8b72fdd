//! Durable spec storage.
//!
//! One record per spec, named `<name>.kavaspec.json`, with auxiliary files
//! written as plain text under a `viri/` subdirectory next to it. The record
//! holds `{files, tests}` only; the spec's name is the filename key.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::errors::KavaError;
use crate::spec::Spec;

pub const SPEC_SUFFIX: &str = "kavaspec.json";
pub const SOURCES_DIR: &str = "viri";

fn record_path(root: &Path, name: &str) -> PathBuf {
    root.join(format!("{name}.{SPEC_SUFFIX}"))
}

/// Writes the spec record and its auxiliary files under `root`.
pub fn save(spec: &Spec, root: &Path) -> Result<(), KavaError> {
    let path = record_path(root, &spec.name);
    let payload = serde_json::to_string_pretty(spec).map_err(|source| KavaError::EncodeSpec {
        name: spec.name.clone(),
        source,
    })?;
    fs::write(&path, payload).map_err(|e| KavaError::io(&path, e))?;

    let sources = root.join(SOURCES_DIR);
    if !sources.exists() {
        fs::create_dir_all(&sources).map_err(|e| KavaError::io(&sources, e))?;
    }
    for file in &spec.files {
        let file_path = sources.join(&file.filename);
        fs::write(&file_path, &file.content).map_err(|e| KavaError::io(&file_path, e))?;
    }
    Ok(())
}

/// Reads a stored spec back by name.
///
/// A missing record is [`KavaError::SpecNotFound`]; a record that no longer
/// decodes is [`KavaError::CorruptSpec`].
pub fn restore(root: &Path, name: &str) -> Result<Spec, KavaError> {
    let path = record_path(root, name);
    let payload = match fs::read_to_string(&path) {
        Ok(payload) => payload,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(KavaError::SpecNotFound {
                name: name.to_string(),
                dir: root.to_path_buf(),
            })
        }
        Err(e) => return Err(KavaError::io(&path, e)),
    };

    let mut spec: Spec = serde_json::from_str(&payload).map_err(|source| KavaError::CorruptSpec {
        name: name.to_string(),
        source,
    })?;
    spec.name = name.to_string();
    Ok(spec)
}
