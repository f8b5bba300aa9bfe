use chrono::Local;
use lopdf::{Document, Object, StringFormat};

pub struct BrandInfo {
    pub name: &'static str,
    pub version: &'static str,
}

pub const BRAND: BrandInfo = BrandInfo {
    name: "Blackline",
    version: env!("CARGO_PKG_VERSION"),
};

fn literal(value: &str) -> Object {
    Object::String(value.as_bytes().to_vec(), StringFormat::Literal)
}

/// Stamp the Info dictionary with the producing tool and redaction time.
pub fn stamp_redaction_metadata(doc: &mut Document) {
    let info_id = match doc.trailer.get(b"Info") {
        Ok(Object::Reference(id)) => *id,
        _ => {
            let new_id = doc.add_object(Object::Dictionary(lopdf::Dictionary::new()));
            doc.trailer.set(b"Info", Object::Reference(new_id));
            new_id
        }
    };

    let pdf_date = format!("D:{}", Local::now().format("%Y%m%d%H%M%S%z"));
    let producer = format!("{} v{}", BRAND.name, BRAND.version);

    if let Ok(Object::Dictionary(ref mut info_dict)) = doc.get_object_mut(info_id) {
        info_dict.set(b"Producer", literal(&producer));
        info_dict.set(b"Creator", literal(BRAND.name));
        info_dict.set(b"ModDate", literal(&pdf_date));
        info_dict.set(b"Redacted", literal("true"));
        info_dict.set(b"RedactedBy", literal(&producer));
        info_dict.set(b"RedactedAt", literal(&pdf_date));
    } else {
        log::warn!("[Compositor] Info {:?} is not a dictionary, metadata not stamped", info_id);
        return;
    }

    log::info!("[Compositor] metadata stamped: Producer={}, ModDate={}", producer, pdf_date);
}
