//! Skeleton definition loader.
//!
//! Walks a decoded [`Value`] tree into [`SkeletonData`]. The source format is Y-up with
//! counter-clockwise rotations; bone and attachment `y`/`rotation` and rotate/translate keys are
//! negated here, once, to match the Y-down screen convention. Scale values are left untouched.

use crate::{
    Animation, AttachmentData, AttachmentFrame, AttachmentTimeline, BoneData, BoneTimeline, Curve,
    Error, RotateFrame, RotateTimeline, ScaleTimeline, SkeletonData, SkinData, SlotData,
    TranslateTimeline, Value, Vec2Frame,
};
use std::collections::HashMap;

const Y_FLIP: f32 = -1.0;
const DEFAULT_SKIN: &str = "default";

impl SkeletonData {
    pub fn from_json_str(input: &str) -> Result<Self, Error> {
        let root = Value::parse(input)?;
        Self::from_value(&root)
    }

    pub fn from_value(root: &Value) -> Result<Self, Error> {
        let bones_def = required(root, "bones", Value::as_array, "an array")?;
        let slots_def = required(root, "slots", Value::as_array, "an array")?;
        let skins_def = required(root, "skins", Value::as_object, "an object")?;

        // Parents may be declared after their children, so names are collected before any
        // parent link is resolved.
        let mut bones = Vec::new();
        let mut parent_names = Vec::new();
        let mut bone_index = HashMap::<String, usize>::new();
        for bone in bones_def.iter().filter(|b| b.is_object()) {
            let name = bone.str_field("name").unwrap_or_default().to_string();
            parent_names.push(bone.str_field("parent").unwrap_or_default().to_string());
            bone_index.insert(name.clone(), bones.len());
            bones.push(BoneData {
                name,
                parent: None,
                x: bone.number_or("x", 0.0),
                y: bone.number_or("y", 0.0) * Y_FLIP,
                rotation: bone.number_or("rotation", 0.0) * Y_FLIP,
                scale_x: bone.number_or("scaleX", 1.0),
                scale_y: bone.number_or("scaleY", 1.0),
            });
        }
        for (bone, parent_name) in bones.iter_mut().zip(&parent_names) {
            if parent_name.is_empty() {
                continue;
            }
            bone.parent = bone_index.get(parent_name).copied();
            if bone.parent.is_none() {
                log::debug!(
                    "bone '{}' references unknown parent '{}'; treating it as a root",
                    bone.name,
                    parent_name
                );
            }
        }

        let mut slots = Vec::new();
        for slot in slots_def.iter().filter(|s| s.is_object()) {
            let name = slot.str_field("name").unwrap_or_default().to_string();
            let bone_name = slot.str_field("bone").unwrap_or_default();
            let bone = bone_index.get(bone_name).copied();
            if bone.is_none() {
                log::debug!("slot '{name}' references unknown bone '{bone_name}'; it will not draw");
            }
            slots.push(SlotData {
                name,
                bone,
                attachment: slot
                    .str_field("attachment")
                    .filter(|a| !a.is_empty())
                    .map(str::to_string),
            });
        }
        let slot_index: HashMap<&str, usize> = slots
            .iter()
            .enumerate()
            .map(|(i, s)| (s.name.as_str(), i))
            .collect();

        let mut skin = SkinData {
            name: DEFAULT_SKIN.to_string(),
            attachments: HashMap::new(),
        };
        if let Some(default_skin) = skins_def.get(DEFAULT_SKIN).and_then(Value::as_object) {
            for (slot_name, slot_attachments) in default_skin {
                let Some(slot_attachments) = slot_attachments.as_object() else {
                    continue;
                };
                for (attachment_name, def) in slot_attachments {
                    if !def.is_object() {
                        continue;
                    }
                    skin.insert(
                        slot_name.clone(),
                        AttachmentData {
                            name: attachment_name.clone(),
                            x: def.number_or("x", 0.0),
                            y: def.number_or("y", 0.0) * Y_FLIP,
                            rotation: def.number_or("rotation", 0.0) * Y_FLIP,
                            scale_x: def.number_or("scaleX", 1.0),
                            scale_y: def.number_or("scaleY", 1.0),
                            width: def.number_or("width", 0.0),
                            height: def.number_or("height", 0.0),
                        },
                    );
                }
            }
        }

        let mut animations = Vec::new();
        if let Some(animations_def) = root.get("animations").and_then(Value::as_object) {
            for (name, def) in animations_def {
                if !def.is_object() {
                    continue;
                }
                animations.push(parse_animation(name, def, &bone_index, &slot_index));
            }
        }

        let data = SkeletonData::new(bones, slots, skin, animations);
        log::debug!(
            "loaded skeleton: {} bones, {} slots, {} attachments, {} animations",
            data.bones.len(),
            data.slots.len(),
            data.skin.attachments.values().map(HashMap::len).sum::<usize>(),
            data.animations.len()
        );
        Ok(data)
    }
}

fn required<'a, T: ?Sized>(
    root: &'a Value,
    field: &str,
    cast: impl Fn(&'a Value) -> Option<&'a T>,
    expected: &str,
) -> Result<&'a T, Error> {
    let value = root.get(field).ok_or_else(|| Error::MissingField {
        field: field.to_string(),
    })?;
    cast(value).ok_or_else(|| Error::InvalidField {
        field: field.to_string(),
        expected: expected.to_string(),
    })
}

fn parse_animation(
    name: &str,
    def: &Value,
    bone_index: &HashMap<String, usize>,
    slot_index: &HashMap<&str, usize>,
) -> Animation {
    let mut duration = 0.0f32;
    let mut bone_timelines = Vec::new();
    let mut attachment_timelines = Vec::new();

    if let Some(slots) = def.get("slots").and_then(Value::as_object) {
        for (slot_name, slot_def) in slots {
            let Some(&slot) = slot_index.get(slot_name.as_str()) else {
                continue;
            };
            let Some(keys) = slot_def.get("attachment").and_then(Value::as_array) else {
                continue;
            };
            let frames: Vec<AttachmentFrame> = keys
                .iter()
                .filter(|k| k.is_object())
                .map(|k| AttachmentFrame {
                    time: k.number_or("time", 0.0),
                    name: k.str_field("name").map(str::to_string),
                })
                .collect();
            if frames.is_empty() {
                continue;
            }
            duration = frames.iter().fold(duration, |d, f| d.max(f.time));
            attachment_timelines.push(AttachmentTimeline {
                slot_index: slot,
                frames,
            });
        }
    }

    if let Some(bones) = def.get("bones").and_then(Value::as_object) {
        for (bone_name, bone_def) in bones {
            let Some(&bone) = bone_index.get(bone_name) else {
                continue;
            };
            if !bone_def.is_object() {
                continue;
            }

            if let Some(keys) = bone_def.get("rotate").and_then(Value::as_array) {
                let frames: Vec<RotateFrame> = keys
                    .iter()
                    .filter(|k| k.is_object())
                    .map(|k| RotateFrame {
                        time: k.number_or("time", 0.0),
                        angle: k.number_or("angle", 0.0) * Y_FLIP,
                        curve: parse_curve(k),
                    })
                    .collect();
                if !frames.is_empty() {
                    duration = frames.iter().fold(duration, |d, f| d.max(f.time));
                    bone_timelines.push(BoneTimeline::Rotate(RotateTimeline {
                        bone_index: bone,
                        frames,
                    }));
                }
            }

            if let Some(keys) = bone_def.get("translate").and_then(Value::as_array) {
                let frames = parse_vec2_frames(keys, 0.0, Y_FLIP);
                if !frames.is_empty() {
                    duration = frames.iter().fold(duration, |d, f| d.max(f.time));
                    bone_timelines.push(BoneTimeline::Translate(TranslateTimeline {
                        bone_index: bone,
                        frames,
                    }));
                }
            }

            if let Some(keys) = bone_def.get("scale").and_then(Value::as_array) {
                let frames = parse_vec2_frames(keys, 1.0, 1.0);
                if !frames.is_empty() {
                    duration = frames.iter().fold(duration, |d, f| d.max(f.time));
                    bone_timelines.push(BoneTimeline::Scale(ScaleTimeline {
                        bone_index: bone,
                        frames,
                    }));
                }
            }
        }
    }

    Animation {
        name: name.to_string(),
        duration,
        bone_timelines,
        attachment_timelines,
    }
}

fn parse_vec2_frames(keys: &[Value], fallback: f32, y_sign: f32) -> Vec<Vec2Frame> {
    keys.iter()
        .filter(|k| k.is_object())
        .map(|k| Vec2Frame {
            time: k.number_or("time", 0.0),
            x: k.number_or("x", fallback),
            y: k.number_or("y", fallback) * y_sign,
            curve: parse_curve(k),
        })
        .collect()
}

fn parse_curve(key: &Value) -> Curve {
    match key.str_field("curve") {
        Some("stepped") => Curve::Stepped,
        _ => Curve::Linear,
    }
}
