use std::collections::HashMap;

#[derive(Clone, Debug, PartialEq)]
pub struct BoneData {
    pub name: String,
    pub parent: Option<usize>,
    pub x: f32,
    pub y: f32,
    /// Degrees, clockwise-positive (screen convention).
    pub rotation: f32,
    pub scale_x: f32,
    pub scale_y: f32,
}

impl BoneData {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            x: 0.0,
            y: 0.0,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SlotData {
    pub name: String,
    /// `None` when the slot's bone did not resolve; such slots are never drawn.
    pub bone: Option<usize>,
    pub attachment: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AttachmentData {
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub rotation: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    /// Declared size; `0` means "use the atlas region's original size".
    pub width: f32,
    pub height: f32,
}

impl AttachmentData {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            x: 0.0,
            y: 0.0,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            width: 0.0,
            height: 0.0,
        }
    }
}

/// Attachment catalog keyed by slot name, then attachment name.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SkinData {
    pub name: String,
    pub attachments: HashMap<String, HashMap<String, AttachmentData>>,
}

impl SkinData {
    pub fn attachment(&self, slot_name: &str, attachment_name: &str) -> Option<&AttachmentData> {
        self.attachments
            .get(slot_name)
            .and_then(|slot_map| slot_map.get(attachment_name))
    }

    pub fn insert(&mut self, slot_name: impl Into<String>, attachment: AttachmentData) {
        self.attachments
            .entry(slot_name.into())
            .or_default()
            .insert(attachment.name.clone(), attachment);
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Curve {
    /// Interpolate linearly towards the next frame.
    #[default]
    Linear,
    /// Hold this frame's value until the next frame.
    Stepped,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RotateFrame {
    pub time: f32,
    pub angle: f32,
    pub curve: Curve,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Vec2Frame {
    pub time: f32,
    pub x: f32,
    pub y: f32,
    pub curve: Curve,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RotateTimeline {
    pub bone_index: usize,
    pub frames: Vec<RotateFrame>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TranslateTimeline {
    pub bone_index: usize,
    pub frames: Vec<Vec2Frame>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScaleTimeline {
    pub bone_index: usize,
    pub frames: Vec<Vec2Frame>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum BoneTimeline {
    Rotate(RotateTimeline),
    Translate(TranslateTimeline),
    Scale(ScaleTimeline),
}

impl BoneTimeline {
    pub fn bone_index(&self) -> usize {
        match self {
            BoneTimeline::Rotate(t) => t.bone_index,
            BoneTimeline::Translate(t) => t.bone_index,
            BoneTimeline::Scale(t) => t.bone_index,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AttachmentFrame {
    pub time: f32,
    pub name: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AttachmentTimeline {
    pub slot_index: usize,
    pub frames: Vec<AttachmentFrame>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Animation {
    pub name: String,
    /// Largest keyframe time across every timeline; `0` for an animation with no keys.
    pub duration: f32,
    pub bone_timelines: Vec<BoneTimeline>,
    pub attachment_timelines: Vec<AttachmentTimeline>,
}

/// Static, shareable skeleton tables.
#[derive(Clone, Debug, Default)]
pub struct SkeletonData {
    pub bones: Vec<BoneData>,
    pub slots: Vec<SlotData>,
    pub skin: SkinData,
    pub animations: Vec<Animation>,
    pub animation_index: HashMap<String, usize>,
    /// Bone indices ordered so that every parent precedes its children.
    pub(crate) update_order: Vec<usize>,
}

impl SkeletonData {
    /// Builds skeleton tables from already-resolved parts.
    ///
    /// Parent links that would form a cycle are dropped and the bone becomes a root.
    pub fn new(
        mut bones: Vec<BoneData>,
        slots: Vec<SlotData>,
        skin: SkinData,
        animations: Vec<Animation>,
    ) -> Self {
        break_parent_cycles(&mut bones);
        let update_order = compute_update_order(&bones);
        let animation_index = animations
            .iter()
            .enumerate()
            .map(|(i, a)| (a.name.clone(), i))
            .collect();
        Self {
            bones,
            slots,
            skin,
            animations,
            animation_index,
            update_order,
        }
    }

    pub fn find_bone(&self, name: &str) -> Option<usize> {
        self.bones.iter().position(|b| b.name == name)
    }

    pub fn find_slot(&self, name: &str) -> Option<usize> {
        self.slots.iter().position(|s| s.name == name)
    }

    pub fn animation(&self, name: &str) -> Option<(usize, &Animation)> {
        let index = *self.animation_index.get(name)?;
        self.animations.get(index).map(|a| (index, a))
    }
}

fn break_parent_cycles(bones: &mut [BoneData]) {
    let len = bones.len();
    for start in 0..len {
        if bones[start].parent.is_some_and(|p| p >= len) {
            bones[start].parent = None;
            continue;
        }
        // A walk longer than `len` links is stuck in a loop that excludes `start`; that loop is
        // broken when one of its own members is visited.
        let mut current = bones[start].parent;
        let mut steps = 0usize;
        while let Some(index) = current {
            if steps > len {
                break;
            }
            if index == start {
                log::warn!(
                    "bone '{}' parent link forms a cycle; treating it as a root",
                    bones[start].name
                );
                bones[start].parent = None;
                break;
            }
            current = bones.get(index).and_then(|b| b.parent);
            steps += 1;
        }
    }
}

fn compute_update_order(bones: &[BoneData]) -> Vec<usize> {
    fn visit(bones: &[BoneData], index: usize, placed: &mut [bool], order: &mut Vec<usize>) {
        if placed[index] {
            return;
        }
        if let Some(parent) = bones[index].parent {
            visit(bones, parent, placed, order);
        }
        placed[index] = true;
        order.push(index);
    }

    let mut placed = vec![false; bones.len()];
    let mut order = Vec::with_capacity(bones.len());
    for index in 0..bones.len() {
        visit(bones, index, &mut placed, &mut order);
    }
    order
}
