use blackline_render::PixelRect;
use image::{Rgba, RgbImage, RgbaImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use lopdf::{Dictionary, Object, Stream};

const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Paint opaque black rectangles into the bitmap.
pub fn burn_rects(image: &mut RgbaImage, rects: &[PixelRect]) {
    let (img_width, img_height) = image.dimensions();

    for rect in rects {
        if rect.x >= img_width || rect.y >= img_height {
            continue;
        }
        let w = rect.width.min(img_width - rect.x);
        let h = rect.height.min(img_height - rect.y);
        if w == 0 || h == 0 {
            continue;
        }
        draw_filled_rect_mut(image, Rect::at(rect.x as i32, rect.y as i32).of_size(w, h), BLACK);
        log::debug!("[Compositor] burned ({}, {}, {}, {})", rect.x, rect.y, w, h);
    }
}

/// Lossless image XObject for an RGB bitmap.
pub fn image_xobject(image: &RgbImage) -> Stream {
    let (width, height) = image.dimensions();
    let dict = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"XObject".to_vec())),
        ("Subtype", Object::Name(b"Image".to_vec())),
        ("Width", Object::Integer(width as i64)),
        ("Height", Object::Integer(height as i64)),
        ("ColorSpace", Object::Name(b"DeviceRGB".to_vec())),
        ("BitsPerComponent", Object::Integer(8)),
    ]);

    let mut stream = Stream::new(dict, image.as_raw().clone());
    if let Err(e) = stream.compress() {
        log::debug!("[Compositor] image stream left uncompressed: {}", e);
    }
    stream
}
