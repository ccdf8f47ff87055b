use std::collections::HashMap;
use std::convert::Infallible;
use std::str::FromStr;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "bmp", "tga", "ktx", "dds"];

/// Region table for a single-page texture atlas.
#[derive(Clone, Debug, Default)]
pub struct Atlas {
    pub page: AtlasPage,
    pub regions: HashMap<String, AtlasRegion>,
}

impl Atlas {
    /// Parses the line-oriented atlas description.
    ///
    /// The format is lenient: unknown keys are ignored and malformed integer pairs leave the
    /// field at its default. An empty document yields an atlas without regions.
    pub fn parse(input: &str) -> Self {
        parse_atlas(input)
    }

    pub fn region(&self, name: &str) -> Option<&AtlasRegion> {
        self.regions.get(name)
    }
}

impl FromStr for Atlas {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(parse_atlas(s))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AtlasPage {
    /// Image filename from the header line.
    pub name: String,
    pub width: i32,
    pub height: i32,
    pub format: Option<String>,
    pub filter: Option<String>,
    pub repeat: Option<String>,
}

/// A packed sub-rectangle of the atlas texture.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AtlasRegion {
    pub name: String,
    /// Packing rotation. Parsed but not applied when compositing.
    pub degrees: u16,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub offset_x: i32,
    pub offset_y: i32,
    pub original_width: i32,
    pub original_height: i32,
}

impl AtlasRegion {
    pub fn is_rotated(&self) -> bool {
        self.degrees != 0
    }
}

fn parse_atlas(input: &str) -> Atlas {
    let mut page: Option<AtlasPage> = None;
    let mut regions = HashMap::new();
    let mut current_region: Option<AtlasRegion> = None;

    fn finalize_region(mut region: AtlasRegion) -> AtlasRegion {
        if region.original_width <= 0 {
            region.original_width = region.width;
        }
        if region.original_height <= 0 {
            region.original_height = region.height;
        }
        region
    }

    for raw_line in input.lines() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        // Indentation carries no meaning: any line without a key starts a region unless it
        // names the page image.
        if !line.contains(':') {
            match page.as_ref() {
                None if is_image_filename(line) => {
                    page = Some(AtlasPage {
                        name: line.to_string(),
                        ..AtlasPage::default()
                    });
                }
                Some(p) if line.contains(p.name.as_str()) => {}
                _ => {
                    if let Some(region) = current_region.take() {
                        let region = finalize_region(region);
                        regions.insert(region.name.clone(), region);
                    }
                    current_region = Some(AtlasRegion {
                        name: line.to_string(),
                        ..AtlasRegion::default()
                    });
                }
            }
            continue;
        }

        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim();
        let value = value.trim();

        if let Some(region) = current_region.as_mut() {
            match key {
                "rotate" => region.degrees = parse_degrees(value),
                "xy" => {
                    if let Some((x, y)) = parse_pair_i32(value) {
                        region.x = x;
                        region.y = y;
                    }
                }
                "size" => {
                    if let Some((w, h)) = parse_pair_i32(value) {
                        region.width = w;
                        region.height = h;
                    }
                }
                "orig" => {
                    if let Some((w, h)) = parse_pair_i32(value) {
                        region.original_width = w;
                        region.original_height = h;
                    }
                }
                "offset" => {
                    if let Some((x, y)) = parse_pair_i32(value) {
                        region.offset_x = x;
                        region.offset_y = y;
                    }
                }
                _ => {}
            }
        } else if let Some(page) = page.as_mut() {
            match key {
                "size" => {
                    if let Some((w, h)) = parse_pair_i32(value) {
                        page.width = w;
                        page.height = h;
                    }
                }
                "format" => page.format = Some(value.to_string()),
                "filter" => page.filter = Some(value.to_string()),
                "repeat" => page.repeat = Some(value.to_string()),
                _ => {}
            }
        }
    }

    if let Some(region) = current_region.take() {
        let region = finalize_region(region);
        regions.insert(region.name.clone(), region);
    }

    log::debug!(
        "parsed atlas page '{}' with {} regions",
        page.as_ref().map(|p| p.name.as_str()).unwrap_or(""),
        regions.len()
    );

    Atlas {
        page: page.unwrap_or_default(),
        regions,
    }
}

fn is_image_filename(line: &str) -> bool {
    line.rsplit_once('.').is_some_and(|(stem, ext)| {
        !stem.is_empty()
            && IMAGE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
    })
}

fn parse_pair_i32(value: &str) -> Option<(i32, i32)> {
    let (a, b) = value.split_once(',')?;
    let a = a.trim().parse().ok()?;
    let b = b.trim().parse().ok()?;
    Some((a, b))
}

fn parse_degrees(value: &str) -> u16 {
    match value {
        "true" => 90,
        "false" => 0,
        _ => {
            let Ok(raw) = value.parse::<i32>() else {
                return 0;
            };
            raw.rem_euclid(360) as u16
        }
    }
}
