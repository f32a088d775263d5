//! Project discovery: source files to parse and directories to search for headers.

use std::path::{Path, PathBuf};

use ignore::overrides::{Override, OverrideBuilder};
use ignore::WalkBuilder;

use crate::config::Config;
use crate::languages::is_source_file;
use crate::{CallTreeError, Result};

/// Files and include directories of one project.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectLayout {
    root: PathBuf,
    source_files: Vec<PathBuf>,
    include_dirs: Vec<PathBuf>,
}

impl ProjectLayout {
    /// Walk `root` once, collecting `.c` files and candidate include directories.
    ///
    /// Directories named in the exclusion list (default `build`) are skipped at
    /// any depth, together with everything below them.
    pub fn discover(root: &Path, config: &Config) -> Result<Self> {
        if !root.exists() {
            return Err(CallTreeError::ProjectNotFound {
                path: root.to_path_buf(),
            });
        }
        if !root.is_dir() {
            return Err(CallTreeError::NotADirectory {
                path: root.to_path_buf(),
            });
        }

        let overrides = exclusion_overrides(root, &config.excluded_dirs())?;

        let mut builder = WalkBuilder::new(root);
        builder
            .hidden(false)
            .git_ignore(config.respect_gitignore)
            .git_global(config.respect_gitignore)
            .git_exclude(config.respect_gitignore)
            .require_git(false)
            .ignore(config.respect_gitignore)
            .parents(config.respect_gitignore)
            .overrides(overrides);

        let mut layout = Self {
            root: root.to_path_buf(),
            ..Self::default()
        };

        for entry in builder.build() {
            match entry {
                Ok(entry) => {
                    let path = entry.path();
                    match entry.file_type() {
                        Some(ft) if ft.is_dir() => layout.include_dirs.push(path.to_path_buf()),
                        Some(ft) if ft.is_file() && is_source_file(path) => {
                            layout.source_files.push(path.to_path_buf())
                        }
                        _ => {}
                    }
                }
                Err(err) => {
                    tracing::warn!("Error walking directory: {}", err);
                }
            }
        }

        layout.source_files.sort();
        layout.include_dirs.sort();
        tracing::debug!(
            "Discovered {} source files and {} include directories under {}",
            layout.source_files.len(),
            layout.include_dirs.len(),
            root.display()
        );
        Ok(layout)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute paths of all `.c` files, sorted.
    pub fn source_files(&self) -> &[PathBuf] {
        &self.source_files
    }

    /// The root and every non-excluded subdirectory, sorted.
    pub fn include_dirs(&self) -> &[PathBuf] {
        &self.include_dirs
    }
}

/// `!dir/` overrides mean "do not include this directory" at any depth.
fn exclusion_overrides(root: &Path, exclude_dirs: &[&str]) -> Result<Override> {
    let mut override_builder = OverrideBuilder::new(root);
    for dir in exclude_dirs {
        let pattern = format!("!{}/", dir);
        if let Err(e) = override_builder.add(&pattern) {
            tracing::warn!("Invalid exclude pattern '{}': {}", pattern, e);
        }
    }
    Ok(override_builder.build()?)
}
