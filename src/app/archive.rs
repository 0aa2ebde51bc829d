//! Selective extraction of archive members
//!
//! Only the members named by the manifest are extracted. A member that is
//! not in the archive is skipped with a warning rather than failing the
//! download; only an archive that cannot be opened or read is an error.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};
use zip::result::ZipError;
use zip::ZipArchive;

use crate::constants::files;
use crate::errors::{ArchiveError, ArchiveResult};

/// One member to pull out of an archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractInstruction {
    /// Exact member path inside the archive
    pub member: String,
    /// Where the member is written
    pub destination: PathBuf,
}

/// What an extraction actually produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractReport {
    /// Destinations that were written
    pub extracted: Vec<PathBuf>,
    /// Members that were not found in the archive
    pub missing: Vec<String>,
}

/// Zip archive extractor
#[derive(Debug, Clone, Copy, Default)]
pub struct ArchiveExtractor;

impl ArchiveExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract the named members of `archive_path`.
    ///
    /// Blocking; callers on the async runtime should use `spawn_blocking`.
    pub fn extract(
        &self,
        archive_path: &Path,
        instructions: &[ExtractInstruction],
    ) -> ArchiveResult<ExtractReport> {
        let file = fs::File::open(archive_path).map_err(|source| ArchiveError::Open {
            path: archive_path.to_path_buf(),
            source,
        })?;
        let mut archive = ZipArchive::new(file).map_err(|source| ArchiveError::Zip {
            path: archive_path.to_path_buf(),
            source,
        })?;

        let mut report = ExtractReport::default();
        for instruction in instructions {
            let mut member = match archive.by_name(&instruction.member) {
                Ok(member) => member,
                Err(ZipError::FileNotFound) => {
                    warn!(
                        "Member '{}' not found in {}; skipping",
                        instruction.member,
                        archive_path.display()
                    );
                    report.missing.push(instruction.member.clone());
                    continue;
                }
                Err(source) => {
                    return Err(ArchiveError::Zip {
                        path: archive_path.to_path_buf(),
                        source,
                    })
                }
            };

            if member.is_dir() {
                report.missing.push(instruction.member.clone());
                continue;
            }

            let destination = &instruction.destination;
            if let Some(parent) = destination.parent() {
                fs::create_dir_all(parent).map_err(|source| ArchiveError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
            let mut outfile = fs::File::create(destination).map_err(|source| ArchiveError::Io {
                path: destination.clone(),
                source,
            })?;
            io::copy(&mut member, &mut outfile).map_err(|source| ArchiveError::Io {
                path: destination.clone(),
                source,
            })?;

            debug!(
                "Extracted {} -> {}",
                instruction.member,
                destination.display()
            );
            report.extracted.push(destination.clone());
        }

        Ok(report)
    }
}

/// Join a manifest `dst` onto `dir`, refusing absolute paths and `..`.
///
/// `dir` also holds the staged archive itself, so `dst` may not name it or
/// look like a temp file.
pub fn resolve_destination(dir: &Path, dst: &str) -> ArchiveResult<PathBuf> {
    let relative = Path::new(dst);
    let safe = relative
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    let normalized: PathBuf = relative
        .components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .collect();
    if !safe || normalized.as_os_str().is_empty() {
        return Err(ArchiveError::UnsafeDestination {
            dst: dst.to_string(),
        });
    }

    if normalized == Path::new(files::DATASET_FILE_NAME) || dst.ends_with(files::TEMP_FILE_SUFFIX) {
        return Err(ArchiveError::ReservedDestination {
            dst: dst.to_string(),
        });
    }
    Ok(dir.join(normalized))
}
