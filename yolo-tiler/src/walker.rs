//! Discovery of processing units in a dataset directory.

use crate::{common::*, options::TileOptions};

/// An `images/` and `labels/` folder pair processed as a whole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetUnit {
    /// The subfolder name in a nested dataset, `None` for a flat dataset.
    pub subfolder: Option<PathBuf>,
    pub images_dir: PathBuf,
    pub labels_dir: PathBuf,
}

impl DatasetUnit {
    fn at(root: &Path, subfolder: Option<PathBuf>) -> Self {
        let dir = match &subfolder {
            Some(subfolder) => root.join(subfolder),
            None => root.to_owned(),
        };
        Self {
            images_dir: dir.join("images"),
            labels_dir: dir.join("labels"),
            subfolder,
        }
    }

    /// Where this unit is mirrored to under an output root.
    pub fn output_root(&self, root: &Path) -> PathBuf {
        match &self.subfolder {
            Some(subfolder) => root.join(subfolder),
            None => root.to_owned(),
        }
    }

    /// List the images of the unit, sorted by path.
    ///
    /// Images whose stem was already taken by a preceding image are returned
    /// separately, since their tiles would overwrite each other.
    pub fn list_images(&self, options: &TileOptions) -> Result<ImageList> {
        let paths = glob_files(&self.images_dir, &options.image_extensions)?;

        let mut stems = HashSet::new();
        let (images, duplicates) = paths
            .into_iter()
            .partition(|path| stems.insert(path.file_stem().map(ToOwned::to_owned)));

        Ok(ImageList { images, duplicates })
    }
}

/// List the files in `dir` with one of the `extensions`, ignoring case,
/// sorted by path.
pub fn glob_files<S>(dir: &Path, extensions: &[S]) -> Result<Vec<PathBuf>>
where
    S: AsRef<str>,
{
    let options = MatchOptions {
        case_sensitive: false,
        ..MatchOptions::new()
    };
    let dir_pattern = Pattern::escape(&dir.to_string_lossy());

    let mut paths = vec![];
    for ext in extensions {
        let pattern = format!("{}/*.{}", dir_pattern, Pattern::escape(ext.as_ref()));
        let matches = glob::glob_with(&pattern, options)?;
        for path in matches {
            let path = path.with_context(|| format!("failed to list '{}'", dir.display()))?;
            if path.is_file() {
                paths.push(path);
            }
        }
    }
    paths.sort();
    paths.dedup();

    Ok(paths)
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ImageList {
    pub images: Vec<PathBuf>,
    pub duplicates: Vec<PathBuf>,
}

/// A subfolder of a nested dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitEntry {
    Ready(DatasetUnit),
    Skipped { subfolder: PathBuf, reason: String },
}

/// The shape of a dataset directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetLayout {
    /// `images/` and `labels/` directly under the dataset directory.
    Flat(DatasetUnit),
    /// Every subdirectory is a candidate unit, in name order.
    Nested(Vec<UnitEntry>),
}

impl DatasetLayout {
    pub fn discover(dataset_dir: impl AsRef<Path>) -> Result<Self> {
        let dataset_dir = dataset_dir.as_ref();
        ensure!(
            dataset_dir.is_dir(),
            "dataset directory '{}' does not exist",
            dataset_dir.display()
        );

        let flat = DatasetUnit::at(dataset_dir, None);
        if flat.images_dir.is_dir() && flat.labels_dir.is_dir() {
            return Ok(Self::Flat(flat));
        }

        let pattern = format!("{}/*", Pattern::escape(&dataset_dir.to_string_lossy()));
        let mut subfolders: Vec<PathBuf> = glob::glob(&pattern)?
            .filter_ok(|path| path.is_dir())
            .map_ok(|path| PathBuf::from(path.file_name().unwrap_or_default()))
            .collect::<Result<_, _>>()
            .with_context(|| format!("failed to list '{}'", dataset_dir.display()))?;
        subfolders.sort();

        let entries = subfolders
            .into_iter()
            .map(|subfolder| {
                let unit = DatasetUnit::at(dataset_dir, Some(subfolder.clone()));
                let missing: Vec<_> = [("images", &unit.images_dir), ("labels", &unit.labels_dir)]
                    .into_iter()
                    .filter(|(_, dir)| !dir.is_dir())
                    .map(|(name, _)| name)
                    .collect();

                if missing.is_empty() {
                    UnitEntry::Ready(unit)
                } else {
                    UnitEntry::Skipped {
                        subfolder,
                        reason: format!("missing '{}' folder", missing.join("' and '")),
                    }
                }
            })
            .collect();

        Ok(Self::Nested(entries))
    }

    pub fn entries(&self) -> Vec<UnitEntry> {
        match self {
            Self::Flat(unit) => vec![UnitEntry::Ready(unit.clone())],
            Self::Nested(entries) => entries.clone(),
        }
    }
}
