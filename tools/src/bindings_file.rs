// Copyright 2021-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::aliases::dedup_type_aliases;
use std::fs::{self, Permissions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::string::FromUtf8Error;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum FixError {
    #[error("Bindings file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("failed to read {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{} is not valid UTF-8", path.display())]
    Encoding {
        path: PathBuf,
        #[source]
        source: FromUtf8Error,
    },
    #[error("failed to write {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, Default)]
pub struct FixOptions {
    /// Bindings file to clean up.
    pub input: PathBuf,
    /// Where to write the result. Defaults to overwriting `input`.
    pub output: Option<PathBuf>,
    /// Only report duplicates, never write.
    pub dry_run: bool,
}

impl FixOptions {
    pub fn in_place(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            ..Default::default()
        }
    }

    fn destination(&self) -> &Path {
        self.output.as_deref().unwrap_or(&self.input)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixReport {
    /// Names of the dropped aliases, one entry per dropped line.
    pub removed: Vec<String>,
    pub input_lines: usize,
    pub output_lines: usize,
    /// `None` on a dry run.
    pub written_to: Option<PathBuf>,
}

/// Removes duplicated `pub type` aliases from a bindgen output file.
///
/// The cleaned text goes to a temporary file next to the destination which is
/// then renamed over it, so a failed write leaves the destination as it was.
/// The destination is rewritten even if nothing was removed.
pub fn fix_bindings_file(options: &FixOptions) -> Result<FixReport, FixError> {
    let input = &options.input;
    if !input.exists() {
        return Err(FixError::NotFound(input.clone()));
    }

    let content = read_source(input)?;
    let deduped = dedup_type_aliases(&content);
    debug!(
        path = %input.display(),
        lines = deduped.input_line_count(),
        duplicates = deduped.removed().len(),
        "deduplicated type aliases"
    );

    let written_to = if options.dry_run {
        None
    } else {
        let destination = options.destination();
        // A fresh destination takes the input's mode.
        let input_permissions = fs::metadata(input).ok().map(|m| m.permissions());
        write_atomically(
            destination,
            deduped.to_text().as_bytes(),
            input_permissions,
        )?;
        debug!(path = %destination.display(), "wrote bindings");
        Some(destination.to_path_buf())
    };

    Ok(FixReport {
        removed: deduped
            .removed()
            .iter()
            .map(|r| r.name.to_owned())
            .collect(),
        input_lines: deduped.input_line_count(),
        output_lines: deduped.lines().len(),
        written_to,
    })
}

fn read_source(path: &Path) -> Result<String, FixError> {
    let bytes = fs::read(path).map_err(|source| FixError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    String::from_utf8(bytes).map_err(|source| FixError::Encoding {
        path: path.to_path_buf(),
        source,
    })
}

fn write_atomically(
    path: &Path,
    contents: &[u8],
    fallback_permissions: Option<Permissions>,
) -> Result<(), FixError> {
    let wrap = |source| FixError::Write {
        path: path.to_path_buf(),
        source,
    };
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(wrap)?;
    tmp.write_all(contents).map_err(wrap)?;
    tmp.as_file().sync_all().map_err(wrap)?;
    // Keep the mode of the file being replaced, tempfile creates 0600.
    let permissions = fs::metadata(path)
        .map(|m| m.permissions())
        .ok()
        .or(fallback_permissions);
    if let Some(permissions) = permissions {
        tmp.as_file().set_permissions(permissions).map_err(wrap)?;
    }
    tmp.persist(path).map_err(|e| wrap(e.error))?;
    Ok(())
}
