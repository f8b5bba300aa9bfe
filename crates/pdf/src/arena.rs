//! Pages of a loaded document, addressed by stable object identity.
//!
//! Page numbers are resolved to object ids once at load time. Replacing a page
//! writes a new dictionary under the same id, so no other page's number or id
//! moves while the document is being edited.

use crate::image::image_xobject;
use crate::metadata::stamp_redaction_metadata;
use crate::overlay::replacement_content;
use crate::utils;
use crate::PdfError;
use blackline_core::{PageBox, Rect};
use image::RgbImage;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::collections::BTreeMap;

const IMAGE_NAME: &str = "Im0";

pub struct PageArena {
    doc: Document,
    pages: BTreeMap<u32, ObjectId>,
    replaced: Vec<u32>,
}

impl PageArena {
    pub fn load(bytes: &[u8]) -> Result<Self, PdfError> {
        let doc = Document::load_mem(bytes).map_err(|e| PdfError::Load(e.to_string()))?;
        let pages = doc.get_pages();
        log::debug!("[Compositor] loaded document with {} pages", pages.len());
        Ok(Self {
            doc,
            pages,
            replaced: Vec::new(),
        })
    }

    pub fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    pub fn page_id(&self, page_number: u32) -> Result<ObjectId, PdfError> {
        self.pages
            .get(&page_number)
            .copied()
            .ok_or(PdfError::PageNotFound {
                page: page_number,
                page_count: self.page_count(),
            })
    }

    /// Visible box and rotation of a page.
    pub fn page_box(&self, page_number: u32) -> Result<PageBox, PdfError> {
        Ok(utils::page_box(&self.doc, self.page_id(page_number)?))
    }

    pub fn media_box(&self, page_number: u32) -> Result<Option<[f64; 4]>, PdfError> {
        Ok(utils::media_box(&self.doc, self.page_id(page_number)?))
    }

    /// Decoded content streams of a page.
    pub fn page_content(&self, page_number: u32) -> Result<Vec<u8>, PdfError> {
        utils::page_content(&self.doc, self.page_id(page_number)?)
    }

    pub fn has_annotations(&self, page_number: u32) -> Result<bool, PdfError> {
        Ok(utils::has_annotations(&self.doc, self.page_id(page_number)?))
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Pages replaced so far, in replacement order.
    pub fn replaced_pages(&self) -> &[u32] {
        &self.replaced
    }

    /// Replace a page with a full-page image plus vector overlays.
    ///
    /// Nothing of the old page dictionary survives except its parent link and
    /// its geometry (MediaBox, CropBox, Rotate), which are resolved through
    /// inheritance and written explicitly.
    pub fn replace_page(&mut self, page_number: u32, image: &RgbImage, overlays: &[Rect]) -> Result<(), PdfError> {
        let page_id = self.page_id(page_number)?;
        let page_box = utils::page_box(&self.doc, page_id);

        let media_box = utils::inherited_attribute(&self.doc, page_id, b"MediaBox")
            .filter(|obj| utils::box_values(&self.doc, obj).is_some())
            .unwrap_or_else(|| {
                Object::Array(
                    [page_box.llx, page_box.lly, page_box.urx, page_box.ury]
                        .iter()
                        .map(|v| Object::Real(*v as f32))
                        .collect(),
                )
            });
        let crop_box = utils::inherited_attribute(&self.doc, page_id, b"CropBox")
            .filter(|obj| utils::box_values(&self.doc, obj).is_some());
        let parent = match self.doc.get_object(page_id) {
            Ok(Object::Dictionary(dict)) => dict.get(b"Parent").ok().cloned(),
            _ => None,
        }
        .ok_or_else(|| PdfError::Structure(format!("page {} has no parent", page_number)))?;

        let image_id = self.doc.add_object(image_xobject(image));
        let content = replacement_content(&page_box, IMAGE_NAME, overlays)?;
        let content_id = self.doc.add_object(Stream::new(Dictionary::new(), content));

        let xobjects = Dictionary::from_iter(vec![(IMAGE_NAME, Object::Reference(image_id))]);
        let resources = Dictionary::from_iter(vec![("XObject", Object::Dictionary(xobjects))]);

        let mut page = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", parent),
            ("MediaBox", media_box),
            ("Resources", Object::Dictionary(resources)),
            ("Contents", Object::Reference(content_id)),
        ]);
        if let Some(crop_box) = crop_box {
            page.set("CropBox", crop_box);
        }
        if page_box.rotation != 0 {
            page.set("Rotate", Object::Integer(page_box.rotation as i64));
        }

        self.doc.objects.insert(page_id, Object::Dictionary(page));
        self.replaced.push(page_number);

        log::info!(
            "[Compositor] page {} replaced ({}x{} px image, {} overlays)",
            page_number,
            image.width(),
            image.height(),
            overlays.len()
        );
        Ok(())
    }

    /// Serialize the document. Orphans left behind by replaced pages are
    /// pruned and the metadata stamp applied only if a page was replaced.
    pub fn save(mut self) -> Result<Vec<u8>, PdfError> {
        if !self.replaced.is_empty() {
            stamp_redaction_metadata(&mut self.doc);
            let pruned = self.doc.prune_objects();
            log::debug!("[Compositor] pruned {} orphaned objects", pruned.len());
        }
        self.doc.compress();

        let mut buffer = Vec::new();
        self.doc
            .save_to(&mut buffer)
            .map_err(|e| PdfError::Save(e.to_string()))?;
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{create_rotated_pdf, create_test_pdf};

    fn white(width: u32, height: u32) -> RgbImage {
        RgbImage::from_pixel(width, height, image::Rgb([255, 255, 255]))
    }

    #[test]
    fn test_page_lookup() {
        let arena = PageArena::load(&create_test_pdf(3)).unwrap();
        assert_eq!(arena.page_count(), 3);
        assert!(arena.page_id(3).is_ok());
        assert!(matches!(
            arena.page_id(4),
            Err(PdfError::PageNotFound { page: 4, page_count: 3 })
        ));
        assert!(arena.page_id(0).is_err());
    }

    #[test]
    fn test_load_rejects_garbage() {
        assert!(matches!(PageArena::load(b"not a pdf"), Err(PdfError::Load(_))));
    }

    #[test]
    fn test_replace_page_keeps_identity() {
        let mut arena = PageArena::load(&create_test_pdf(3)).unwrap();
        let before = arena.page_id(2).unwrap();

        arena
            .replace_page(2, &white(1224, 1584), &[Rect::new(9.0, 696.0, 152.0, 14.0)])
            .unwrap();

        assert_eq!(arena.page_id(2).unwrap(), before);
        assert_eq!(arena.replaced_pages(), &[2]);
        let content = arena.page_content(2).unwrap();
        assert_eq!(utils::count_text_operators(&content), 0);

        let doc = Document::load_mem(&arena.save().unwrap()).unwrap();
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[&2], before);
        let page = doc.get_dictionary(pages[&2]).unwrap();
        let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
        let xobjects = resources.get(b"XObject").unwrap().as_dict().unwrap();
        assert!(xobjects.get(b"Im0").is_ok());
        assert_eq!(utils::media_box(&doc, pages[&2]), Some([0.0, 0.0, 612.0, 792.0]));
    }

    #[test]
    fn test_replace_page_writes_inherited_geometry() {
        let mut arena = PageArena::load(&create_rotated_pdf()).unwrap();
        arena.replace_page(1, &white(580, 770), &[]).unwrap();

        let doc = Document::load_mem(&arena.save().unwrap()).unwrap();
        let page_id = doc.get_pages()[&1];
        let page = doc.get_dictionary(page_id).unwrap();

        assert_eq!(page.get(b"Rotate").unwrap().as_i64().unwrap(), 90);
        assert!(page.get(b"MediaBox").is_ok());
        assert!(page.get(b"Annots").is_err());
        assert_eq!(utils::crop_box(&doc, page_id), Some([10.0, 10.0, 590.0, 780.0]));
        assert_eq!(utils::media_box(&doc, page_id), Some([0.0, 0.0, 612.0, 792.0]));
    }

    #[test]
    fn test_save_without_replacement_skips_stamp() {
        let arena = PageArena::load(&create_test_pdf(2)).unwrap();
        let doc = Document::load_mem(&arena.save().unwrap()).unwrap();
        assert_eq!(doc.get_pages().len(), 2);
        assert!(doc.trailer.get(b"Info").is_err());
    }
}
