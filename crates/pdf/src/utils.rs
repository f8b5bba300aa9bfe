use crate::PdfError;
use blackline_core::PageBox;
use lopdf::{content::Content, Document, Object, ObjectId, Stream};

/// US Letter, used when a page carries no usable box at all.
const LETTER: [f64; 4] = [0.0, 0.0, 612.0, 792.0];

/// Parent chain depth limit; guards against cyclic page trees.
const MAX_INHERIT_DEPTH: usize = 32;

/// Numeric value of an Integer or Real object.
pub fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

/// Four numbers of a box array, normalized so that ll < ur.
pub fn box_values(doc: &Document, obj: &Object) -> Option<[f64; 4]> {
    let arr = match resolve(doc, obj) {
        Object::Array(arr) => arr,
        _ => return None,
    };
    let values: Vec<f64> = arr
        .iter()
        .filter_map(|o| number(resolve(doc, o)))
        .collect();
    if values.len() != 4 {
        return None;
    }
    Some([
        values[0].min(values[2]),
        values[1].min(values[3]),
        values[0].max(values[2]),
        values[1].max(values[3]),
    ])
}

/// Look up a page attribute, walking up the `Parent` chain for inheritable keys.
///
/// The returned object has references resolved one level.
pub fn inherited_attribute(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut current = page_id;
    for _ in 0..MAX_INHERIT_DEPTH {
        let dict = match doc.get_object(current) {
            Ok(Object::Dictionary(dict)) => dict,
            _ => return None,
        };
        if let Ok(value) = dict.get(key) {
            return Some(resolve(doc, value).clone());
        }
        match dict.get(b"Parent") {
            Ok(Object::Reference(parent)) => current = *parent,
            _ => return None,
        }
    }
    None
}

/// Page rotation in degrees, inherited if absent on the page itself.
pub fn page_rotation(doc: &Document, page_id: ObjectId) -> i32 {
    inherited_attribute(doc, page_id, b"Rotate")
        .as_ref()
        .and_then(number)
        .map(|r| r as i32)
        .unwrap_or(0)
}

pub fn media_box(doc: &Document, page_id: ObjectId) -> Option<[f64; 4]> {
    inherited_attribute(doc, page_id, b"MediaBox").and_then(|obj| box_values(doc, &obj))
}

pub fn crop_box(doc: &Document, page_id: ObjectId) -> Option<[f64; 4]> {
    inherited_attribute(doc, page_id, b"CropBox").and_then(|obj| box_values(doc, &obj))
}

/// The visible page box: CropBox if present, otherwise MediaBox, otherwise Letter.
pub fn page_box(doc: &Document, page_id: ObjectId) -> PageBox {
    let rotation = page_rotation(doc, page_id);
    let [llx, lly, urx, ury] = match crop_box(doc, page_id).or_else(|| media_box(doc, page_id)) {
        Some(values) => values,
        None => {
            log::warn!("[Compositor] page {:?} has no MediaBox, assuming Letter", page_id);
            LETTER
        }
    };
    PageBox::new(llx, lly, urx, ury).with_rotation(rotation)
}

/// Stream payload, decompressed when the filter is supported.
pub fn stream_content(stream: &Stream) -> Vec<u8> {
    match stream.decompressed_content() {
        Ok(data) => data,
        Err(_) => stream.content.clone(),
    }
}

/// Concatenated content stream data of a page.
pub fn page_content(doc: &Document, page_id: ObjectId) -> Result<Vec<u8>, PdfError> {
    let page = match doc.get_object(page_id) {
        Ok(Object::Dictionary(dict)) => dict,
        _ => return Err(PdfError::Structure(format!("object {:?} is not a page", page_id))),
    };

    let contents = match page.get(b"Contents") {
        Ok(contents) => contents,
        Err(_) => return Ok(Vec::new()),
    };

    match resolve(doc, contents) {
        Object::Stream(stream) => Ok(stream_content(stream)),
        Object::Array(arr) => {
            let mut all_content = Vec::new();
            for item in arr {
                if let Object::Stream(stream) = resolve(doc, item) {
                    all_content.extend(stream_content(stream));
                    all_content.push(b'\n');
                }
            }
            Ok(all_content)
        }
        _ => Err(PdfError::Structure(format!(
            "page {:?} has unreadable contents",
            page_id
        ))),
    }
}

/// Number of text-showing operators in a content stream.
pub fn count_text_operators(content_data: &[u8]) -> usize {
    match Content::decode(content_data) {
        Ok(content) => content
            .operations
            .iter()
            .filter(|op| matches!(op.operator.as_str(), "Tj" | "TJ" | "'" | "\""))
            .count(),
        Err(_) => 0,
    }
}

/// Whether the page dictionary carries a non-empty `Annots` entry.
pub fn has_annotations(doc: &Document, page_id: ObjectId) -> bool {
    match doc.get_object(page_id) {
        Ok(Object::Dictionary(dict)) => match dict.get(b"Annots") {
            Ok(annots) => match resolve(doc, annots) {
                Object::Array(arr) => !arr.is_empty(),
                _ => true,
            },
            Err(_) => false,
        },
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{create_rotated_pdf, create_test_pdf};

    #[test]
    fn test_box_values_normalizes_order() {
        let doc = Document::with_version("1.7");
        let arr = Object::Array(vec![
            Object::Integer(612),
            Object::Real(792.0),
            Object::Integer(0),
            Object::Integer(0),
        ]);
        assert_eq!(box_values(&doc, &arr), Some([0.0, 0.0, 612.0, 792.0]));
        assert_eq!(box_values(&doc, &Object::Array(vec![Object::Integer(1)])), None);
        assert_eq!(box_values(&doc, &Object::Null), None);
    }

    #[test]
    fn test_page_box_from_page() {
        let doc = Document::load_mem(&create_test_pdf(2)).unwrap();
        let page_id = doc.get_pages()[&1];
        let page = page_box(&doc, page_id);
        assert_eq!(page.width(), 612.0);
        assert_eq!(page.height(), 792.0);
        assert_eq!(page.rotation, 0);
    }

    #[test]
    fn test_page_box_inherits_from_parent() {
        let doc = Document::load_mem(&create_rotated_pdf()).unwrap();
        let page_id = doc.get_pages()[&1];
        let page = page_box(&doc, page_id);
        assert_eq!(page.rotation, 90);
        // CropBox on the page wins over the inherited MediaBox
        assert_eq!(page.llx, 10.0);
        assert_eq!(page.urx, 590.0);
        assert_eq!(media_box(&doc, page_id), Some([0.0, 0.0, 612.0, 792.0]));
    }

    #[test]
    fn test_page_content_and_text_operators() {
        let doc = Document::load_mem(&create_test_pdf(1)).unwrap();
        let page_id = doc.get_pages()[&1];
        let content = page_content(&doc, page_id).unwrap();
        assert_eq!(count_text_operators(&content), 1);
        assert_eq!(count_text_operators(b"q 0 0 1 1 re f Q"), 0);
        assert!(!has_annotations(&doc, page_id));
    }
}
