use super::CocoDataset;
use crate::common::*;

/// A list of a COCO file that carries ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Images,
    Annotations,
    Categories,
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Images => "images",
            Self::Annotations => "annotations",
            Self::Categories => "categories",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CocoIssue {
    /// The smallest id of the section is not 1.
    IdsNotFromOne { section: Section, min_id: i64 },
    /// Annotations refer to images that do not exist.
    PhantomImageIds(Vec<i64>),
    /// Annotations refer to categories that do not exist.
    PhantomCategoryIds(Vec<i64>),
}

impl fmt::Display for CocoIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IdsNotFromOne { section, min_id } => {
                write!(f, "ids in '{}' start from {} instead of 1", section, min_id)
            }
            Self::PhantomImageIds(ids) => write!(
                f,
                "annotations refer to missing image ids {}",
                ids.iter().join(", ")
            ),
            Self::PhantomCategoryIds(ids) => write!(
                f,
                "annotations refer to missing category ids {}",
                ids.iter().join(", ")
            ),
        }
    }
}

/// The outcome of [CocoDataset::verify].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Verification {
    pub issues: Vec<CocoIssue>,
    /// Sections whose ids were renumbered.
    pub fixed: Vec<Section>,
}

impl Verification {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }
}

impl CocoDataset {
    /// Check that ids of every section start from 1 and that annotations
    /// only refer to existing images and categories.
    ///
    /// With `fix`, sections whose ids do not start from 1 are renumbered
    /// densely from 1 in id order, and annotation references follow.
    /// Dangling references are never fixed.
    pub fn verify(&mut self, fix: bool) -> Verification {
        let mut verification = Verification::default();

        for section in [Section::Images, Section::Annotations, Section::Categories] {
            let min_id = match self.ids(section).min() {
                Some(min_id) => min_id,
                None => continue,
            };
            if min_id == 1 {
                continue;
            }

            if fix {
                self.renumber(section);
                verification.fixed.push(section);
            } else {
                verification
                    .issues
                    .push(CocoIssue::IdsNotFromOne { section, min_id });
            }
        }

        let image_ids: HashSet<_> = self.ids(Section::Images).collect();
        let category_ids: HashSet<_> = self.ids(Section::Categories).collect();

        let phantom_images: Vec<_> = self
            .annotations
            .iter()
            .map(|ann| ann.image_id)
            .filter(|id| !image_ids.contains(id))
            .sorted()
            .dedup()
            .collect();
        if !phantom_images.is_empty() {
            verification
                .issues
                .push(CocoIssue::PhantomImageIds(phantom_images));
        }

        let phantom_categories: Vec<_> = self
            .annotations
            .iter()
            .map(|ann| ann.category_id)
            .filter(|id| !category_ids.contains(id))
            .sorted()
            .dedup()
            .collect();
        if !phantom_categories.is_empty() {
            verification
                .issues
                .push(CocoIssue::PhantomCategoryIds(phantom_categories));
        }

        verification
    }

    fn ids(&self, section: Section) -> Box<dyn Iterator<Item = i64> + '_> {
        match section {
            Section::Images => Box::new(self.images.iter().map(|image| image.id)),
            Section::Annotations => Box::new(self.annotations.iter().map(|ann| ann.id)),
            Section::Categories => Box::new(self.categories.iter().map(|cat| cat.id)),
        }
    }

    fn renumber(&mut self, section: Section) {
        let mapping: HashMap<i64, i64> = self
            .ids(section)
            .sorted()
            .dedup()
            .zip(1..)
            .collect();

        match section {
            Section::Images => {
                self.images
                    .iter_mut()
                    .for_each(|image| image.id = mapping[&image.id]);
                self.annotations.iter_mut().for_each(|ann| {
                    if let Some(&id) = mapping.get(&ann.image_id) {
                        ann.image_id = id;
                    }
                });
            }
            Section::Annotations => {
                self.annotations
                    .iter_mut()
                    .for_each(|ann| ann.id = mapping[&ann.id]);
            }
            Section::Categories => {
                self.categories
                    .iter_mut()
                    .for_each(|cat| cat.id = mapping[&cat.id]);
                self.annotations.iter_mut().for_each(|ann| {
                    if let Some(&id) = mapping.get(&ann.category_id) {
                        ann.category_id = id;
                    }
                });
            }
        }
    }
}

/// Verify a COCO file. With `fix`, a valid result is written next to the
/// input as `<name>_fixed.json` and its path is returned.
pub fn verify_coco_file(
    path: impl AsRef<Path>,
    fix: bool,
) -> Result<(Verification, Option<PathBuf>)> {
    let path = path.as_ref();
    info!("verifying '{}'", path.display());

    let mut dataset = CocoDataset::open(path)?;
    let verification = dataset.verify(fix);

    for section in &verification.fixed {
        info!("renumbered ids in '{}' to start from 1", section);
    }
    for issue in &verification.issues {
        warn!("{}", issue);
    }

    if !(fix && verification.is_valid()) {
        return Ok((verification, None));
    }

    let mut file_name = path.file_stem().unwrap_or_default().to_os_string();
    file_name.push("_fixed.json");
    let fixed_path = path.with_file_name(file_name);
    dataset.save(&fixed_path)?;
    info!("fixed COCO file written to '{}'", fixed_path.display());

    Ok((verification, Some(fixed_path)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset(text: &str) -> CocoDataset {
        serde_json::from_str(text).unwrap()
    }

    const SHIFTED: &str = r#"{
        "images": [{"id": 10, "file_name": "a.jpg"}, {"id": 0, "file_name": "b.jpg"}],
        "annotations": [
            {"id": 1, "image_id": 10, "category_id": 0},
            {"id": 2, "image_id": 0, "category_id": 5}
        ],
        "categories": [{"id": 0}, {"id": 5}]
    }"#;

    #[test]
    fn valid_dataset_passes() {
        let mut coco = dataset(
            r#"{
                "images": [{"id": 1}, {"id": 2}],
                "annotations": [{"id": 1, "image_id": 2, "category_id": 1}],
                "categories": [{"id": 1}]
            }"#,
        );
        let verification = coco.verify(false);
        assert!(verification.is_valid());
        assert!(verification.fixed.is_empty());
    }

    #[test]
    fn report_ids_not_starting_from_one() {
        let mut coco = dataset(SHIFTED);
        let verification = coco.verify(false);
        assert_eq!(
            verification.issues,
            vec![
                CocoIssue::IdsNotFromOne {
                    section: Section::Images,
                    min_id: 0
                },
                CocoIssue::IdsNotFromOne {
                    section: Section::Categories,
                    min_id: 0
                },
            ]
        );
    }

    #[test]
    fn fix_renumbers_and_remaps() {
        let mut coco = dataset(SHIFTED);
        let verification = coco.verify(true);
        assert!(verification.is_valid());
        assert_eq!(verification.fixed, vec![Section::Images, Section::Categories]);

        let image_ids: Vec<_> = coco.images.iter().map(|image| image.id).collect();
        assert_eq!(image_ids, vec![2, 1]);
        let refs: Vec<_> = coco
            .annotations
            .iter()
            .map(|ann| (ann.image_id, ann.category_id))
            .collect();
        assert_eq!(refs, vec![(2, 1), (1, 2)]);
    }

    #[test]
    fn report_phantom_references() {
        let mut coco = dataset(
            r#"{
                "images": [{"id": 1}],
                "annotations": [
                    {"id": 1, "image_id": 7, "category_id": 1},
                    {"id": 2, "image_id": 3, "category_id": 9},
                    {"id": 3, "image_id": 7, "category_id": 1}
                ],
                "categories": [{"id": 1}]
            }"#,
        );
        let verification = coco.verify(true);
        assert_eq!(
            verification.issues,
            vec![
                CocoIssue::PhantomImageIds(vec![3, 7]),
                CocoIssue::PhantomCategoryIds(vec![9]),
            ]
        );
    }

    #[test]
    fn write_fixed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("train.json");
        fs::write(&path, SHIFTED).unwrap();

        let (verification, fixed_path) = verify_coco_file(&path, false).unwrap();
        assert!(!verification.is_valid());
        assert!(fixed_path.is_none());

        let (verification, fixed_path) = verify_coco_file(&path, true).unwrap();
        assert!(verification.is_valid());
        let fixed_path = fixed_path.unwrap();
        assert_eq!(fixed_path, dir.path().join("train_fixed.json"));

        let mut fixed = CocoDataset::open(&fixed_path).unwrap();
        assert!(fixed.verify(false).is_valid());
    }
}
