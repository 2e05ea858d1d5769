use crate::config::MetadataFormat;
use crate::error::{AtlasError, Result};
use crate::model::{Atlas, FlipTransform};
use serde_json::{Value, json};

/// Serialize the atlas as a JSON object with a frame array, suitable for
/// generic tooling and simple consumption.
pub fn to_json_array(atlas: &Atlas, page_name: &str) -> Value {
    let frames: Vec<Value> = atlas.frames.iter().map(|fr| frame_value(fr)).collect();
    json!({
        "image": page_name,
        "width": atlas.width,
        "height": atlas.height,
        "method": atlas.method.to_string(),
        "frames": frames,
        "meta": &atlas.meta,
    })
}

/// Flatten frames keyed by name. Compatible with engine pipelines expecting
/// TexturePacker-like JSON hash.
pub fn to_json_hash(atlas: &Atlas, page_name: &str) -> Value {
    let mut frames = serde_json::Map::new();
    for fr in &atlas.frames {
        let mut v = frame_value(fr);
        if let Some(obj) = v.as_object_mut() {
            obj.remove("key");
        }
        frames.insert(fr.key.clone(), v);
    }
    json!({
        "image": page_name,
        "size": {"w": atlas.width, "h": atlas.height},
        "method": atlas.method.to_string(),
        "frames": frames,
        "meta": &atlas.meta,
    })
}

fn frame_value(fr: &crate::model::Frame) -> Value {
    json!({
        "key": fr.key,
        "frame": {"x": fr.frame.x, "y": fr.frame.y, "w": fr.frame.w, "h": fr.frame.h},
        "rotated": fr.rotated,
        "trimmed": fr.trimmed,
        "flip": flip_name(fr.flip),
        "flipOf": fr.flip_of,
        "spriteSourceSize": {"x": fr.source.x, "y": fr.source.y, "w": fr.source.w, "h": fr.source.h},
        "sourceSize": {"w": fr.source_size.0, "h": fr.source_size.1},
        "pivot": {"x": 0.5, "y": 0.5},
    })
}

fn flip_name(t: FlipTransform) -> &'static str {
    match t {
        FlipTransform::None => "none",
        FlipTransform::Horizontal => "horizontal",
        FlipTransform::Vertical => "vertical",
        FlipTransform::Both => "both",
    }
}

/// Build an Apple plist (XML) with frames in a dict keyed by name.
pub fn to_plist(atlas: &Atlas, page_name: &str) -> String {
    let mut s = String::new();
    s.push_str(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
  <key>frames</key>
  <dict>
"#,
    );
    for fr in &atlas.frames {
        let frame = format!(
            "{{{{{},{}}},{{{},{}}}}}",
            fr.frame.x, fr.frame.y, fr.frame.w, fr.frame.h
        );
        let source = format!(
            "{{{{{},{}}},{{{},{}}}}}",
            fr.source.x, fr.source.y, fr.source.w, fr.source.h
        );
        s.push_str(&format!(
            "    <key>{}</key>\n    <dict>\n      <key>frame</key><string>{}</string>\n      <key>rotated</key><{} />\n      <key>trimmed</key><{} />\n      <key>spriteSourceSize</key><string>{}</string>\n      <key>sourceSize</key><string>{{{}, {}}}</string>\n    </dict>\n",
            xml_escape(&fr.key),
            frame,
            if fr.rotated { "true" } else { "false" },
            if fr.trimmed { "true" } else { "false" },
            source,
            fr.source_size.0,
            fr.source_size.1,
        ));
    }
    s.push_str("  </dict>\n  <key>metadata</key>\n  <dict>\n");
    s.push_str(&format!(
        "    <key>textureFileName</key><string>{}</string>\n    <key>realTextureFileName</key><string>{}</string>\n    <key>size</key><string>{{{}, {}}}</string>\n    <key>format</key><integer>2</integer>\n",
        xml_escape(page_name),
        xml_escape(page_name),
        atlas.width,
        atlas.height,
    ));
    s.push_str("  </dict>\n</dict>\n</plist>\n");
    s
}

/// Build a Sparrow/Starling `TextureAtlas` XML document. Trim offsets map to
/// the negative `frameX`/`frameY` convention; the format carries neither
/// rotation nor flip metadata, which config validation enforces up front.
pub fn to_sparrow_xml(atlas: &Atlas, page_name: &str) -> String {
    let mut s = String::new();
    s.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    s.push_str(&format!(
        "<TextureAtlas imagePath=\"{}\">\n",
        xml_escape(page_name)
    ));
    for fr in &atlas.frames {
        let mut line = format!(
            "  <SubTexture name=\"{}\" x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\"",
            xml_escape(&fr.key),
            fr.frame.x,
            fr.frame.y,
            fr.frame.w,
            fr.frame.h,
        );
        if fr.trimmed {
            line.push_str(&format!(
                " frameX=\"-{}\" frameY=\"-{}\" frameWidth=\"{}\" frameHeight=\"{}\"",
                fr.source.x, fr.source.y, fr.source_size.0, fr.source_size.1,
            ));
        }
        line.push_str("/>\n");
        s.push_str(&line);
    }
    s.push_str("</TextureAtlas>\n");
    s
}

/// Render the atlas metadata in the given format. `page_name` is the image
/// filename referenced from the metadata.
pub fn render_metadata(atlas: &Atlas, format: MetadataFormat, page_name: &str) -> Result<String> {
    match format {
        MetadataFormat::JsonArray => serde_json::to_string_pretty(&to_json_array(atlas, page_name))
            .map_err(|e| AtlasError::Encode(e.to_string())),
        MetadataFormat::JsonHash => serde_json::to_string_pretty(&to_json_hash(atlas, page_name))
            .map_err(|e| AtlasError::Encode(e.to_string())),
        MetadataFormat::Plist => Ok(to_plist(atlas, page_name)),
        MetadataFormat::SparrowXml => Ok(to_sparrow_xml(atlas, page_name)),
    }
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
