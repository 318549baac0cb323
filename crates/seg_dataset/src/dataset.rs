//! Indexing and loading of paired image/mask directories.

use crate::transform::TransformConfig;
use crate::types::{DatasetResult, DatasetSummary, PairEntry, SegDatasetError, SegSample};
use std::fs;
use std::path::Path;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tif", "tiff"];

fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Locate the mask for an image: same file name first, then the same stem
/// with any known image extension.
fn find_mask(masks_dir: &Path, image_path: &Path) -> Option<std::path::PathBuf> {
    if let Some(name) = image_path.file_name() {
        let candidate = masks_dir.join(name);
        if candidate.exists() {
            return Some(candidate);
        }
    }
    let stem = image_path.file_stem()?.to_str()?;
    for ext in IMAGE_EXTENSIONS {
        let candidate = masks_dir.join(format!("{stem}.{ext}"));
        if candidate.exists() {
            return Some(candidate);
        }
    }
    None
}

/// Fixed-length, randomly indexable collection of image/mask pairs.
///
/// Each subset (train/validation) owns its own dataset value with its own
/// transform; nothing is shared mutably between subsets.
#[derive(Debug, Clone)]
pub struct SegmentationDataset {
    entries: Vec<PairEntry>,
    transform: TransformConfig,
}

impl SegmentationDataset {
    /// Index an images directory against a parallel masks directory.
    ///
    /// Every image must have a mask; a missing mask is an error, not a skip.
    /// Entries are sorted by path so pair ids are stable across runs.
    pub fn index(images_dir: &Path, masks_dir: &Path) -> DatasetResult<Vec<PairEntry>> {
        let read = fs::read_dir(images_dir).map_err(|source| SegDatasetError::Io {
            path: images_dir.to_path_buf(),
            source,
        })?;

        let mut image_paths = Vec::new();
        for entry in read {
            let entry = entry.map_err(|source| SegDatasetError::Io {
                path: images_dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            if path.is_file() && is_image_file(&path) {
                image_paths.push(path);
            }
        }
        image_paths.sort();

        if image_paths.is_empty() {
            return Err(SegDatasetError::EmptyDataset {
                path: images_dir.to_path_buf(),
            });
        }

        let mut entries = Vec::with_capacity(image_paths.len());
        for (i, image_path) in image_paths.into_iter().enumerate() {
            let mask_path = find_mask(masks_dir, &image_path)
                .ok_or_else(|| SegDatasetError::MissingMask {
                    image: image_path.clone(),
                })?;
            entries.push(PairEntry {
                image_path,
                mask_path,
                pair_id: i as u64,
            });
        }
        Ok(entries)
    }

    pub fn new(entries: Vec<PairEntry>, transform: TransformConfig) -> Self {
        Self { entries, transform }
    }

    pub fn from_dirs(
        images_dir: &Path,
        masks_dir: &Path,
        transform: TransformConfig,
    ) -> DatasetResult<Self> {
        Ok(Self::new(Self::index(images_dir, masks_dir)?, transform))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[PairEntry] {
        &self.entries
    }

    /// Decode and transform the pair at `index`. A missing or corrupt file is
    /// a fatal error for this access.
    pub fn get(&self, index: usize) -> DatasetResult<SegSample> {
        let entry = &self.entries[index];
        let img = image::open(&entry.image_path)
            .map_err(|source| SegDatasetError::Image {
                path: entry.image_path.clone(),
                source,
            })?
            .to_rgb8();
        let mask = image::open(&entry.mask_path)
            .map_err(|source| SegDatasetError::Image {
                path: entry.mask_path.clone(),
                source,
            })?
            .to_luma8();
        Ok(self.transform.apply(&img, &mask, entry.pair_id))
    }
}

/// QA pass over a directory pair: counts images, resolvable masks, and pairs
/// that fail to decode. Unlike training access, nothing here is fatal.
pub fn summarize(images_dir: &Path, masks_dir: &Path) -> DatasetResult<DatasetSummary> {
    let read = fs::read_dir(images_dir).map_err(|source| SegDatasetError::Io {
        path: images_dir.to_path_buf(),
        source,
    })?;

    let mut summary = DatasetSummary::default();
    for entry in read {
        let entry = entry.map_err(|source| SegDatasetError::Io {
            path: images_dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if !path.is_file() || !is_image_file(&path) {
            continue;
        }
        summary.images += 1;
        let Some(mask_path) = find_mask(masks_dir, &path) else {
            summary.missing_mask += 1;
            continue;
        };
        if image::open(&path).is_err() || image::open(&mask_path).is_err() {
            summary.undecodable += 1;
            continue;
        }
        summary.paired += 1;
    }
    Ok(summary)
}
