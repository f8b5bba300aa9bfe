//! Content stream of a replacement page.

use crate::PdfError;
use blackline_core::{PageBox, Rect};
use lopdf::content::{Content, Operation};
use lopdf::Object;

fn real(v: f64) -> Object {
    Object::Real(v as f32)
}

/// Draw `image_name` over the whole page box, then paint each overlay as an
/// opaque black rectangle in page space.
pub fn replacement_content(page: &PageBox, image_name: &str, overlays: &[Rect]) -> Result<Vec<u8>, PdfError> {
    let mut operations = vec![
        Operation::new("q", vec![]),
        Operation::new(
            "cm",
            vec![
                real(page.width()),
                real(0.0),
                real(0.0),
                real(page.height()),
                real(page.llx),
                real(page.lly),
            ],
        ),
        Operation::new("Do", vec![Object::Name(image_name.as_bytes().to_vec())]),
        Operation::new("Q", vec![]),
    ];

    if !overlays.is_empty() {
        operations.push(Operation::new("q", vec![]));
        operations.push(Operation::new("rg", vec![real(0.0), real(0.0), real(0.0)]));
        operations.push(Operation::new("RG", vec![real(0.0), real(0.0), real(0.0)]));
        for rect in overlays {
            log::debug!(
                "[Compositor] overlay x={:.2}, y={:.2}, w={:.2}, h={:.2}",
                rect.x,
                rect.y,
                rect.width,
                rect.height
            );
            operations.push(Operation::new(
                "re",
                vec![real(rect.x), real(rect.y), real(rect.width), real(rect.height)],
            ));
            operations.push(Operation::new("f", vec![]));
        }
        operations.push(Operation::new("Q", vec![]));
    }

    Content { operations }
        .encode()
        .map_err(|e| PdfError::Structure(e.to_string()))
}
