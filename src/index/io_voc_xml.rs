//! Per-image Pascal VOC XML corpus reader.
//!
//! One XML file per image, scanned flat from an annotation directory. The
//! image identity is the numeric XML file stem; the matching image file is
//! `{id:05}.png` under the image directory. Files with a non-numeric stem,
//! a missing image file, or unparsable content are skipped with a warning
//! and excluded from the corpus; only a bad directory aborts the run.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use roxmltree::Node;
use walkdir::WalkDir;

use super::{BBoxXYXY, ImageId, Pixel};
use crate::error::ConvertError;

const VOC_XML_EXTENSION: &str = "xml";

/// All usable per-image annotation files of one corpus, in sorted file
/// order. `skipped_files` counts files that were excluded with a warning.
#[derive(Debug, Default)]
pub struct VocCorpus {
    pub files: Vec<VocFile>,
    pub skipped_files: usize,
}

impl VocCorpus {
    /// Distinct category names across the whole corpus, sorted. This is the
    /// registry pre-pass input.
    pub fn category_names(&self) -> BTreeSet<String> {
        self.files
            .iter()
            .flat_map(|file| file.objects.iter().map(|object| object.name.clone()))
            .collect()
    }
}

/// One parsed per-image annotation file.
#[derive(Debug)]
pub struct VocFile {
    /// Numeric identity derived from the XML file stem.
    pub image_id: ImageId,

    /// Base image file name, `{id:05}.png`.
    pub file_name: String,

    /// Image location on disk, image directory joined with `file_name`.
    pub image_path: PathBuf,

    pub width: u32,
    pub height: u32,

    pub objects: Vec<VocObject>,
}

/// One `<object>` node: a named box, with the optional `<truncated>` level.
#[derive(Debug)]
pub struct VocObject {
    pub name: String,
    pub bbox: BBoxXYXY<Pixel>,
    pub truncated: Option<u32>,
}

/// Read a directory of per-image VOC XML files into a corpus.
///
/// `annotations_dir` is scanned flat for `*.xml`; `images_dir` is where the
/// corresponding `{id:05}.png` files are expected. Per-file problems warn
/// and skip; the run continues.
pub fn read_voc_dir(annotations_dir: &Path, images_dir: &Path) -> Result<VocCorpus, ConvertError> {
    if !annotations_dir.is_dir() {
        return Err(ConvertError::VocLayoutInvalid {
            path: annotations_dir.to_path_buf(),
            message: "annotation input must be a directory".to_string(),
        });
    }

    let xml_files = collect_xml_files(annotations_dir)?;

    let mut corpus = VocCorpus::default();

    for xml_path in xml_files {
        let rel = rel_string(annotations_dir, &xml_path);

        let stem = xml_path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or_default();
        let Ok(id) = stem.parse::<u64>() else {
            eprintln!("Warning: skipping '{rel}': non-numeric file stem '{stem}'");
            corpus.skipped_files += 1;
            continue;
        };

        let parsed = match parse_voc_xml(&xml_path) {
            Ok(parsed) => parsed,
            Err(error) => {
                eprintln!("Warning: skipping '{rel}': {error}");
                corpus.skipped_files += 1;
                continue;
            }
        };

        let file_name = format!("{id:05}.png");
        let image_path = images_dir.join(&file_name);
        if !image_path.is_file() {
            eprintln!("Warning: skipping '{rel}': corresponding image '{file_name}' not found");
            corpus.skipped_files += 1;
            continue;
        }

        corpus.files.push(VocFile {
            image_id: ImageId::new(id),
            file_name,
            image_path,
            width: parsed.width,
            height: parsed.height,
            objects: parsed.objects,
        });
    }

    Ok(corpus)
}

/// Parse VOC XML from a UTF-8 string.
///
/// Primarily useful for testing parse behavior in-memory.
pub fn parse_voc_xml_str(xml: &str, path: &Path) -> Result<ParsedVocAnnotation, ConvertError> {
    let document = roxmltree::Document::parse(xml).map_err(|source| ConvertError::VocLayoutInvalid {
        path: path.to_path_buf(),
        message: source.to_string(),
    })?;

    let annotation = document.root_element();
    if annotation.tag_name().name() != "annotation" {
        return Err(ConvertError::VocLayoutInvalid {
            path: path.to_path_buf(),
            message: "missing <annotation> root element".to_string(),
        });
    }

    // <filename> is required by the schema, but image identity comes from
    // the XML file stem, so its value is not used.
    required_child_text(annotation, "filename", path, "<annotation>")?;

    let size = required_child_element(annotation, "size", path, "<annotation>")?;
    let width = parse_required_u32(size, "width", path, "<size>")?;
    let height = parse_required_u32(size, "height", path, "<size>")?;

    let mut objects = Vec::new();
    for object in annotation
        .children()
        .filter(|node| node.is_element() && node.tag_name().name() == "object")
    {
        let name = required_child_text(object, "name", path, "<object>")?;
        let bndbox = required_child_element(object, "bndbox", path, "<object>")?;

        let xmin = parse_required_f64(bndbox, "xmin", path, "<bndbox>")?;
        let ymin = parse_required_f64(bndbox, "ymin", path, "<bndbox>")?;
        let xmax = parse_required_f64(bndbox, "xmax", path, "<bndbox>")?;
        let ymax = parse_required_f64(bndbox, "ymax", path, "<bndbox>")?;

        let truncated = optional_child_text(object, "truncated")
            .map(|raw| {
                raw.parse::<u32>().map_err(|_| ConvertError::VocLayoutInvalid {
                    path: path.to_path_buf(),
                    message: format!("invalid <truncated> value '{raw}' in <object>; expected u32"),
                })
            })
            .transpose()?;

        objects.push(VocObject {
            name,
            bbox: BBoxXYXY::<Pixel>::from_xyxy(xmin, ymin, xmax, ymax),
            truncated,
        });
    }

    Ok(ParsedVocAnnotation {
        width,
        height,
        objects,
    })
}

/// The content of one parsed annotation file, before it is joined with its
/// on-disk image.
#[derive(Debug)]
pub struct ParsedVocAnnotation {
    pub width: u32,
    pub height: u32,
    pub objects: Vec<VocObject>,
}

fn parse_voc_xml(path: &Path) -> Result<ParsedVocAnnotation, ConvertError> {
    let xml = fs::read_to_string(path).map_err(ConvertError::Io)?;
    parse_voc_xml_str(&xml, path)
}

fn collect_xml_files(dir: &Path) -> Result<Vec<PathBuf>, ConvertError> {
    let mut files = Vec::new();

    for entry in fs::read_dir(dir).map_err(ConvertError::Io)? {
        let entry = entry.map_err(ConvertError::Io)?;
        let path = entry.path();
        if path.is_file() && has_xml_extension(&path) {
            files.push(path);
        }
    }

    files.sort_by_cached_key(|path| {
        path.file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| rel_string(dir, path))
    });

    let mut nested_xml = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true).min_depth(2) {
        let entry = entry.map_err(|source| ConvertError::VocLayoutInvalid {
            path: dir.to_path_buf(),
            message: format!("failed while traversing annotation directory: {source}"),
        })?;

        if entry.file_type().is_file() && has_xml_extension(entry.path()) {
            nested_xml.push(entry.path().to_path_buf());
        }
    }

    if !nested_xml.is_empty() {
        nested_xml.sort_by_cached_key(|path| rel_string(dir, path));
        let sample = rel_string(dir, &nested_xml[0]);
        eprintln!(
            "Warning: annotation directory is scanned flat (non-recursive); skipping {} nested .xml file(s), e.g. {}",
            nested_xml.len(),
            sample
        );
    }

    Ok(files)
}

fn required_child_element<'a, 'input>(
    node: Node<'a, 'input>,
    tag: &str,
    path: &Path,
    context: &str,
) -> Result<Node<'a, 'input>, ConvertError> {
    child_element(node, tag).ok_or_else(|| ConvertError::VocLayoutInvalid {
        path: path.to_path_buf(),
        message: format!("missing <{tag}> in {context}"),
    })
}

fn required_child_text(
    node: Node<'_, '_>,
    tag: &str,
    path: &Path,
    context: &str,
) -> Result<String, ConvertError> {
    optional_child_text(node, tag).ok_or_else(|| ConvertError::VocLayoutInvalid {
        path: path.to_path_buf(),
        message: format!("missing <{tag}> in {context}"),
    })
}

fn parse_required_u32(
    node: Node<'_, '_>,
    tag: &str,
    path: &Path,
    context: &str,
) -> Result<u32, ConvertError> {
    let raw = required_child_text(node, tag, path, context)?;
    raw.parse::<u32>().map_err(|_| ConvertError::VocLayoutInvalid {
        path: path.to_path_buf(),
        message: format!("invalid <{tag}> value '{raw}' in {context}; expected u32"),
    })
}

fn parse_required_f64(
    node: Node<'_, '_>,
    tag: &str,
    path: &Path,
    context: &str,
) -> Result<f64, ConvertError> {
    let raw = required_child_text(node, tag, path, context)?;
    raw.parse::<f64>().map_err(|_| ConvertError::VocLayoutInvalid {
        path: path.to_path_buf(),
        message: format!("invalid <{tag}> value '{raw}' in {context}; expected floating-point number"),
    })
}

fn child_element<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|child| child.is_element() && child.tag_name().name() == tag)
}

fn optional_child_text(node: Node<'_, '_>, tag: &str) -> Option<String> {
    child_element(node, tag)
        .and_then(|child| child.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(ToOwned::to_owned)
}

fn has_xml_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(VOC_XML_EXTENSION))
        .unwrap_or(false)
}

fn rel_string(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_XML: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<annotation>
  <filename>00007.png</filename>
  <size>
    <width>100</width>
    <height>200</height>
  </size>
  <object>
    <name>car</name>
    <truncated>1</truncated>
    <bndbox>
      <xmin>10</xmin>
      <ymin>20</ymin>
      <xmax>30</xmax>
      <ymax>50</ymax>
    </bndbox>
  </object>
</annotation>"#;

    #[test]
    fn parse_extracts_size_and_objects() {
        let parsed = parse_voc_xml_str(SAMPLE_XML, Path::new("00007.xml")).expect("parse xml");

        assert_eq!(parsed.width, 100);
        assert_eq!(parsed.height, 200);
        assert_eq!(parsed.objects.len(), 1);

        let object = &parsed.objects[0];
        assert_eq!(object.name, "car");
        assert_eq!(object.truncated, Some(1));
        assert_eq!(object.bbox.to_xywh(), (10.0, 20.0, 20.0, 30.0));
    }

    #[test]
    fn parse_requires_filename_and_size() {
        let no_size = r#"<annotation><filename>1.png</filename></annotation>"#;
        assert!(parse_voc_xml_str(no_size, Path::new("1.xml")).is_err());

        let no_filename = r#"<annotation><size><width>10</width><height>10</height></size></annotation>"#;
        assert!(parse_voc_xml_str(no_filename, Path::new("1.xml")).is_err());
    }

    #[test]
    fn truncated_is_optional() {
        let xml = r#"<annotation>
  <filename>1.png</filename>
  <size><width>10</width><height>10</height></size>
  <object>
    <name>dog</name>
    <bndbox><xmin>1</xmin><ymin>1</ymin><xmax>5</xmax><ymax>5</ymax></bndbox>
  </object>
</annotation>"#;

        let parsed = parse_voc_xml_str(xml, Path::new("1.xml")).expect("parse xml");
        assert_eq!(parsed.objects[0].truncated, None);
    }

    fn write_corpus_file(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).expect("write xml");
    }

    #[test]
    fn read_dir_skips_bad_files_without_aborting() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let annotations = temp.path().join("Annotation");
        let images = temp.path().join("rgb");
        fs::create_dir_all(&annotations).expect("create annotations dir");
        fs::create_dir_all(&images).expect("create images dir");

        write_corpus_file(&annotations, "00007.xml", SAMPLE_XML);
        fs::write(images.join("00007.png"), b"png").expect("write image");

        // Non-numeric stem: skipped.
        write_corpus_file(&annotations, "abc.xml", SAMPLE_XML);
        // Unparsable content: skipped.
        write_corpus_file(&annotations, "00008.xml", "<annotation><broken");
        fs::write(images.join("00008.png"), b"png").expect("write image");
        // Missing image on disk: skipped.
        write_corpus_file(&annotations, "00009.xml", SAMPLE_XML);

        let corpus = read_voc_dir(&annotations, &images).expect("read corpus");

        assert_eq!(corpus.files.len(), 1);
        assert_eq!(corpus.skipped_files, 3);
        assert_eq!(corpus.files[0].image_id, ImageId::new(7));
        assert_eq!(corpus.files[0].file_name, "00007.png");
    }

    #[test]
    fn read_dir_orders_files_by_name() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let annotations = temp.path().join("Annotation");
        let images = temp.path().join("rgb");
        fs::create_dir_all(&annotations).expect("create annotations dir");
        fs::create_dir_all(&images).expect("create images dir");

        for id in [12u64, 3, 7] {
            write_corpus_file(&annotations, &format!("{id:05}.xml"), SAMPLE_XML);
            fs::write(images.join(format!("{id:05}.png")), b"png").expect("write image");
        }

        let corpus = read_voc_dir(&annotations, &images).expect("read corpus");
        let ids: Vec<u64> = corpus.files.iter().map(|f| f.image_id.as_u64()).collect();
        assert_eq!(ids, vec![3, 7, 12]);
    }

    #[test]
    fn category_names_are_distinct_and_sorted() {
        let corpus = VocCorpus {
            files: vec![
                VocFile {
                    image_id: ImageId::new(1),
                    file_name: "00001.png".to_string(),
                    image_path: PathBuf::from("00001.png"),
                    width: 10,
                    height: 10,
                    objects: vec![
                        VocObject {
                            name: "truck".to_string(),
                            bbox: BBoxXYXY::from_xyxy(0.0, 0.0, 1.0, 1.0),
                            truncated: None,
                        },
                        VocObject {
                            name: "car".to_string(),
                            bbox: BBoxXYXY::from_xyxy(0.0, 0.0, 1.0, 1.0),
                            truncated: None,
                        },
                    ],
                },
                VocFile {
                    image_id: ImageId::new(2),
                    file_name: "00002.png".to_string(),
                    image_path: PathBuf::from("00002.png"),
                    width: 10,
                    height: 10,
                    objects: vec![VocObject {
                        name: "car".to_string(),
                        bbox: BBoxXYXY::from_xyxy(0.0, 0.0, 1.0, 1.0),
                        truncated: None,
                    }],
                },
            ],
            skipped_files: 0,
        };

        let names: Vec<String> = corpus.category_names().into_iter().collect();
        assert_eq!(names, vec!["car".to_string(), "truck".to_string()]);
    }
}
