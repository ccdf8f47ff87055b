use crate::{Atlas, AtlasRegion, AttachmentData, BonePose, Pose, SkeletonData};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgba(255, 255, 255, 255);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

/// Integer rectangle inside the atlas texture.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SourceRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl From<&AtlasRegion> for SourceRect {
    fn from(region: &AtlasRegion) -> Self {
        Self {
            x: region.x,
            y: region.y,
            width: region.width,
            height: region.height,
        }
    }
}

/// Screen-space rectangle produced by [`RenderContext::command_rect`].
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ScreenRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// One textured quad, in virtual (design) coordinates.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DrawCommand {
    pub slot_index: usize,
    pub source: SourceRect,
    pub center_x: f32,
    pub center_y: f32,
    pub width: f32,
    pub height: f32,
    /// Degrees, clockwise-positive, about the quad's center.
    pub rotation: f32,
    pub flip_x: bool,
    pub tint: Color,
}

/// Uniform scale and letterbox offset from the virtual design space to the screen.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RenderContext {
    pub scale: f32,
    pub offset_x: i32,
    pub offset_y: i32,
}

impl Default for RenderContext {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset_x: 0,
            offset_y: 0,
        }
    }
}

impl RenderContext {
    /// Fits a `design_width` x `design_height` space into the screen, centred.
    pub fn letterbox(
        screen_width: u32,
        screen_height: u32,
        design_width: u32,
        design_height: u32,
    ) -> Self {
        if design_width == 0 || design_height == 0 {
            return Self::default();
        }
        let scale_x = screen_width as f32 / design_width as f32;
        let scale_y = screen_height as f32 / design_height as f32;
        let scale = scale_x.min(scale_y);
        let scaled_width = (design_width as f32 * scale) as i32;
        let scaled_height = (design_height as f32 * scale) as i32;
        Self {
            scale,
            offset_x: (screen_width as i32 - scaled_width) / 2,
            offset_y: (screen_height as i32 - scaled_height) / 2,
        }
    }

    pub fn world_to_screen_rect(&self, x: f32, y: f32, width: f32, height: f32) -> ScreenRect {
        ScreenRect {
            x: self.offset_x as f32 + x * self.scale,
            y: self.offset_y as f32 + y * self.scale,
            width: width * self.scale,
            height: height * self.scale,
        }
    }

    pub fn screen_to_world(&self, x: i32, y: i32) -> (f32, f32) {
        (
            (x - self.offset_x) as f32 / self.scale,
            (y - self.offset_y) as f32 / self.scale,
        )
    }

    /// Destination rectangle of `command`, with its top-left corner on screen.
    pub fn command_rect(&self, command: &DrawCommand) -> ScreenRect {
        self.world_to_screen_rect(
            command.center_x - command.width * 0.5,
            command.center_y - command.height * 0.5,
            command.width,
            command.height,
        )
    }
}

/// Texture handle as seen by the compositor: only its pixel size matters.
pub trait Texture {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
}

/// The collaborator that owns pixel output.
pub trait RenderTarget {
    type Texture: Texture + ?Sized;

    /// Copies `command.source` from `texture` into `dest`, rotated by `command.rotation` about
    /// the center of `dest`, mirrored when `command.flip_x` is set and tinted by `command.tint`.
    fn draw_region(&mut self, texture: &Self::Texture, command: &DrawCommand, dest: ScreenRect);
}

/// Hard-wired per-slot position tweaks for the character art.
///
/// Slots named in `leg_slots` move `leg_y` down in bone space. Slots named in `hand_slots` move
/// `hand_y` down in bone space and `hand_back_x` towards the character's back after flipping.
#[derive(Clone, Debug, PartialEq)]
pub struct SlotNudges {
    pub leg_slots: Vec<String>,
    pub leg_y: f32,
    pub hand_slots: Vec<String>,
    pub hand_y: f32,
    pub hand_back_x: f32,
}

impl Default for SlotNudges {
    fn default() -> Self {
        Self {
            leg_slots: vec!["Lag".to_string(), "Lag2".to_string()],
            leg_y: 9.0,
            hand_slots: vec!["Hand".to_string(), "Hand2".to_string()],
            hand_y: 3.0,
            hand_back_x: 3.0,
        }
    }
}

impl SlotNudges {
    /// No nudges at all.
    pub fn none() -> Self {
        Self {
            leg_slots: Vec::new(),
            leg_y: 0.0,
            hand_slots: Vec::new(),
            hand_y: 0.0,
            hand_back_x: 0.0,
        }
    }

    fn is_leg(&self, slot_name: &str) -> bool {
        self.leg_slots.iter().any(|s| s == slot_name)
    }

    fn is_hand(&self, slot_name: &str) -> bool {
        self.hand_slots.iter().any(|s| s == slot_name)
    }
}

/// Composites `pose` into draw commands, one per visible slot, in slot (draw) order.
///
/// Slots whose bone did not resolve, whose active attachment is missing from the skin, or whose
/// attachment has no atlas region are skipped.
#[allow(clippy::too_many_arguments)]
pub fn build_draw_commands(
    data: &SkeletonData,
    atlas: &Atlas,
    pose: &Pose,
    nudges: &SlotNudges,
    anchor: [f32; 2],
    scale: f32,
    tint: Color,
    flip_x: bool,
) -> Vec<DrawCommand> {
    let mut out = Vec::with_capacity(data.slots.len());
    for (slot_index, slot) in data.slots.iter().enumerate() {
        let Some(bone) = slot.bone.and_then(|b| pose.bones.get(b)) else {
            continue;
        };
        let Some(attachment_name) = pose.attachments.get(slot_index).and_then(Option::as_deref)
        else {
            continue;
        };
        let Some(attachment) = data.skin.attachment(&slot.name, attachment_name) else {
            log::trace!("slot '{}' has no attachment '{attachment_name}'", slot.name);
            continue;
        };
        let Some(region) = atlas.region(&attachment.name) else {
            log::trace!("attachment '{}' has no atlas region", attachment.name);
            continue;
        };

        let leg_y = if nudges.is_leg(&slot.name) { nudges.leg_y } else { 0.0 };
        let is_hand = nudges.is_hand(&slot.name);
        let hand_y = if is_hand { nudges.hand_y } else { 0.0 };

        let mut command = region_command(
            bone,
            attachment,
            region,
            anchor,
            scale,
            leg_y + hand_y,
        );
        command.slot_index = slot_index;
        command.tint = tint;

        if flip_x {
            command.center_x = anchor[0] - (command.center_x - anchor[0]);
            command.rotation = -command.rotation;
            command.flip_x = true;
        }
        if is_hand {
            command.center_x += if flip_x {
                nudges.hand_back_x
            } else {
                -nudges.hand_back_x
            };
        }
        out.push(command);
    }
    out
}

/// Places one region attachment on its bone, unflipped.
fn region_command(
    bone: &BonePose,
    attachment: &AttachmentData,
    region: &AtlasRegion,
    anchor: [f32; 2],
    scale: f32,
    nudge_y: f32,
) -> DrawCommand {
    let packed_w = region.width as f32;
    let packed_h = region.height as f32;
    let orig_w = if region.original_width > 0 {
        region.original_width as f32
    } else {
        packed_w
    };
    let orig_h = if region.original_height > 0 {
        region.original_height as f32
    } else {
        packed_h
    };

    // A declared attachment size stretches the art relative to its original size.
    let base_w = if attachment.width > 0.0 { attachment.width } else { orig_w };
    let base_h = if attachment.height > 0.0 { attachment.height } else { orig_h };
    let region_scale_x = if orig_w > 0.0 { base_w / orig_w } else { 1.0 };
    let region_scale_y = if orig_h > 0.0 { base_h / orig_h } else { 1.0 };

    // The attachment pivots on the center of the untrimmed art. The atlas offset is measured
    // from the bottom-left, so Y runs the other way.
    let center_x = (region.offset_x as f32 + packed_w * 0.5 - orig_w * 0.5)
        * region_scale_x
        * attachment.scale_x;
    let center_y = (orig_h * 0.5 - region.offset_y as f32 - packed_h * 0.5)
        * region_scale_y
        * attachment.scale_y;
    let (sin, cos) = attachment.rotation.to_radians().sin_cos();
    let local_x = attachment.x + center_x * cos - center_y * sin;
    let local_y = attachment.y + center_x * sin + center_y * cos + nudge_y;

    let (world_x, world_y) = bone.transform_point(local_x, local_y);

    DrawCommand {
        slot_index: 0,
        source: SourceRect::from(region),
        center_x: anchor[0] + world_x,
        center_y: anchor[1] + world_y,
        width: packed_w * region_scale_x * attachment.scale_x * scale,
        height: packed_h * region_scale_y * attachment.scale_y * scale,
        rotation: bone.world_rotation() + attachment.rotation,
        flip_x: false,
        tint: Color::WHITE,
    }
}
