//! Triplet discovery across the three modality directories.
//!
//! Directory listing order is never trusted: each listing is sorted
//! byte-wise by filename before the three listings are zipped
//! positionally. That sort order silently decides shard membership later
//! in the pipeline, so it must be stable across runs and filesystems.

use crate::types::Sample;
use std::ffi::{OsStr, OsString};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Errors that abort enumeration of a split.
#[derive(Debug, Error)]
pub enum EnumerateError {
    /// A triplet's basenames disagree. This is a dataset defect, not a
    /// per-sample skip; the whole split fails.
    #[error("aligned files disagree on basename: image '{image}', label '{label}', depth '{depth}'")]
    Alignment {
        image: String,
        label: String,
        depth: String,
    },

    /// The three directories do not contain the same number of files.
    #[error("directory listings differ in length: {images} images, {labels} labels, {depths} depth maps")]
    CountMismatch {
        images: usize,
        labels: usize,
        depths: usize,
    },

    /// A modality directory could not be listed.
    #[error("failed to list {}: {source}", path.display())]
    List {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// List the filenames in `dir`, sorted byte-wise.
fn list_file_names(dir: &Path) -> Result<Vec<OsString>, EnumerateError> {
    let list_err = |source| EnumerateError::List {
        path: dir.to_path_buf(),
        source,
    };

    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(list_err)? {
        names.push(entry.map_err(list_err)?.file_name());
    }
    names.sort();
    Ok(names)
}

/// Filename minus its extension; files without an extension keep their
/// full name.
fn file_stem(name: &OsStr) -> &OsStr {
    Path::new(name).file_stem().unwrap_or(name)
}

/// Enumerate the aligned (image, label, depth) triplets of one split.
///
/// The three directories must hold the same number of files, and at every
/// sorted position the three filenames must share a basename. Any
/// violation fails the whole enumeration; nothing is skipped.
pub fn enumerate_samples(
    image_dir: &Path,
    label_dir: &Path,
    depth_dir: &Path,
) -> Result<Vec<Sample>, EnumerateError> {
    let images = list_file_names(image_dir)?;
    let labels = list_file_names(label_dir)?;
    let depths = list_file_names(depth_dir)?;

    if images.len() != labels.len() || images.len() != depths.len() {
        return Err(EnumerateError::CountMismatch {
            images: images.len(),
            labels: labels.len(),
            depths: depths.len(),
        });
    }

    let mut samples = Vec::with_capacity(images.len());
    for ((image, label), depth) in images.iter().zip(&labels).zip(&depths) {
        let stem = file_stem(image);
        if stem != file_stem(label) || stem != file_stem(depth) {
            return Err(EnumerateError::Alignment {
                image: image.to_string_lossy().into_owned(),
                label: label.to_string_lossy().into_owned(),
                depth: depth.to_string_lossy().into_owned(),
            });
        }

        samples.push(Sample {
            stem: stem.to_string_lossy().into_owned(),
            image_path: image_dir.join(image),
            label_path: label_dir.join(label),
            depth_path: depth_dir.join(depth),
        });
    }

    debug!("Enumerated {} aligned triplets", samples.len());
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"").unwrap();
    }

    struct Dirs {
        _root: tempfile::TempDir,
        image: PathBuf,
        label: PathBuf,
        depth: PathBuf,
    }

    fn make_dirs() -> Dirs {
        let root = tempfile::tempdir().unwrap();
        let image = root.path().join("images");
        let label = root.path().join("annotations");
        let depth = root.path().join("depth");
        for dir in [&image, &label, &depth] {
            fs::create_dir(dir).unwrap();
        }
        Dirs {
            _root: root,
            image,
            label,
            depth,
        }
    }

    #[test]
    fn test_enumerates_in_sorted_order() {
        let dirs = make_dirs();
        // Written out of order on purpose; enumeration must sort
        for stem in ["b2", "a1", "c3"] {
            touch(&dirs.image, &format!("{stem}.jpg"));
            touch(&dirs.label, &format!("{stem}.png"));
            touch(&dirs.depth, &format!("{stem}.jpg"));
        }

        let samples = enumerate_samples(&dirs.image, &dirs.label, &dirs.depth).unwrap();
        let stems: Vec<&str> = samples.iter().map(|s| s.stem.as_str()).collect();
        assert_eq!(stems, ["a1", "b2", "c3"]);
        assert_eq!(samples[0].image_path, dirs.image.join("a1.jpg"));
        assert_eq!(samples[0].label_path, dirs.label.join("a1.png"));
        assert_eq!(samples[0].depth_path, dirs.depth.join("a1.jpg"));
    }

    #[test]
    fn test_differing_extensions_share_a_stem() {
        let dirs = make_dirs();
        touch(&dirs.image, "cat1.jpg");
        touch(&dirs.label, "cat1.png");
        touch(&dirs.depth, "cat1.jpeg");

        let samples = enumerate_samples(&dirs.image, &dirs.label, &dirs.depth).unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].stem, "cat1");
    }

    #[test]
    fn test_basename_mismatch_is_an_alignment_error() {
        let dirs = make_dirs();
        touch(&dirs.image, "cat1.jpg");
        touch(&dirs.label, "cat2.png");
        touch(&dirs.depth, "cat1.jpg");

        let err = enumerate_samples(&dirs.image, &dirs.label, &dirs.depth).unwrap_err();
        match err {
            EnumerateError::Alignment {
                image,
                label,
                depth,
            } => {
                assert_eq!(image, "cat1.jpg");
                assert_eq!(label, "cat2.png");
                assert_eq!(depth, "cat1.jpg");
            }
            other => panic!("expected alignment error, got {other:?}"),
        }
    }

    #[test]
    fn test_count_mismatch() {
        let dirs = make_dirs();
        touch(&dirs.image, "cat1.jpg");
        touch(&dirs.label, "cat1.png");
        touch(&dirs.label, "cat2.png");
        touch(&dirs.depth, "cat1.jpg");

        let err = enumerate_samples(&dirs.image, &dirs.label, &dirs.depth).unwrap_err();
        assert!(matches!(
            err,
            EnumerateError::CountMismatch {
                images: 1,
                labels: 2,
                depths: 1
            }
        ));
    }

    #[test]
    fn test_empty_directories_yield_no_samples() {
        let dirs = make_dirs();
        let samples = enumerate_samples(&dirs.image, &dirs.label, &dirs.depth).unwrap();
        assert!(samples.is_empty());
    }

    #[test]
    fn test_missing_directory_is_a_list_error() {
        let dirs = make_dirs();
        let missing = dirs.image.join("nope");
        let err = enumerate_samples(&missing, &dirs.label, &dirs.depth).unwrap_err();
        assert!(matches!(err, EnumerateError::List { .. }));
    }
}
