use crate::{
    Atlas, AttachmentData, BoneData, Color, DrawCommand, RenderContext, RenderTarget, ScreenRect,
    Skeleton, SkeletonData, SkinData, SlotData, SlotNudges, Texture, build_draw_commands,
    compute_pose,
};
use std::sync::Arc;

fn assert_approx(actual: f32, expected: f32) {
    let diff = (actual - expected).abs();
    assert!(
        diff <= 1.0e-4,
        "expected {expected}, got {actual} (diff {diff})"
    );
}

const ATLAS: &str = "
stickman.png
size: 64,64
format: RGBA8888
filter: Linear,Linear
repeat: none
A
  rotate: false
  xy: 2, 2
  size: 10, 10
  orig: 10, 10
  offset: 0, 0
  index: -1
Trimmed
  rotate: false
  xy: 20, 2
  size: 6, 4
  orig: 10, 10
  offset: 1, 2
  index: -1
";

fn slot(name: &str, bone: Option<usize>, attachment: &str) -> SlotData {
    SlotData {
        name: name.to_string(),
        bone,
        attachment: Some(attachment.to_string()),
    }
}

fn skeleton_with(bones: Vec<BoneData>, slots: Vec<SlotData>, skin: SkinData) -> SkeletonData {
    SkeletonData::new(bones, slots, skin, Vec::new())
}

fn single_slot(slot_name: &str, attachment: AttachmentData) -> SkeletonData {
    let mut skin = SkinData::default();
    let attachment_name = attachment.name.clone();
    skin.insert(slot_name, attachment);
    skeleton_with(
        vec![BoneData::new("root")],
        vec![slot(slot_name, Some(0), &attachment_name)],
        skin,
    )
}

fn commands(data: &SkeletonData, nudges: &SlotNudges, flip_x: bool) -> Vec<DrawCommand> {
    let atlas = Atlas::parse(ATLAS);
    let pose = compute_pose(data, None, 0.0);
    build_draw_commands(
        data,
        &atlas,
        &pose,
        nudges,
        [100.0, 100.0],
        1.0,
        Color::WHITE,
        flip_x,
    )
}

#[test]
fn single_region_centers_on_anchor() {
    let data = single_slot("S", AttachmentData::new("A"));
    let out = commands(&data, &SlotNudges::none(), false);
    assert_eq!(out.len(), 1);
    let cmd = &out[0];
    assert_eq!(cmd.slot_index, 0);
    assert_eq!((cmd.source.x, cmd.source.y), (2, 2));
    assert_eq!((cmd.source.width, cmd.source.height), (10, 10));
    assert_approx(cmd.center_x, 100.0);
    assert_approx(cmd.center_y, 100.0);
    assert_approx(cmd.width, 10.0);
    assert_approx(cmd.height, 10.0);
    assert_approx(cmd.rotation, 0.0);
    assert!(!cmd.flip_x);
    assert_eq!(cmd.tint, Color::WHITE);
}

#[test]
fn trimmed_region_is_recentred() {
    let data = single_slot("S", AttachmentData::new("Trimmed"));
    let cmd = &commands(&data, &SlotNudges::none(), false)[0];
    assert_approx(cmd.center_x, 99.0);
    assert_approx(cmd.center_y, 101.0);
    assert_approx(cmd.width, 6.0);
    assert_approx(cmd.height, 4.0);
}

#[test]
fn declared_size_stretches_relative_to_original() {
    let attachment = AttachmentData {
        width: 20.0,
        height: 5.0,
        ..AttachmentData::new("A")
    };
    let data = single_slot("S", attachment);
    let cmd = &commands(&data, &SlotNudges::none(), false)[0];
    assert_approx(cmd.width, 20.0);
    assert_approx(cmd.height, 5.0);
}

#[test]
fn attachment_offset_follows_bone_rotation() {
    let mut skin = SkinData::default();
    skin.insert(
        "S",
        AttachmentData {
            x: 10.0,
            rotation: 15.0,
            ..AttachmentData::new("A")
        },
    );
    let data = skeleton_with(
        vec![BoneData {
            rotation: 90.0,
            ..BoneData::new("root")
        }],
        vec![slot("S", Some(0), "A")],
        skin,
    );
    let cmd = &commands(&data, &SlotNudges::none(), false)[0];
    assert_approx(cmd.center_x, 100.0);
    assert_approx(cmd.center_y, 110.0);
    assert_approx(cmd.rotation, 105.0);
}

#[test]
fn global_scale_changes_size_not_placement() {
    let mut skin = SkinData::default();
    skin.insert(
        "S",
        AttachmentData {
            x: 5.0,
            ..AttachmentData::new("A")
        },
    );
    let data = skeleton_with(
        vec![BoneData::new("root")],
        vec![slot("S", Some(0), "A")],
        skin,
    );
    let atlas = Atlas::parse(ATLAS);
    let pose = compute_pose(&data, None, 0.0);
    let tint = Color::rgba(10, 20, 30, 40);
    let out = build_draw_commands(
        &data,
        &atlas,
        &pose,
        &SlotNudges::none(),
        [0.0, 0.0],
        2.0,
        tint,
        false,
    );
    assert_approx(out[0].center_x, 5.0);
    assert_approx(out[0].width, 20.0);
    assert_approx(out[0].height, 20.0);
    assert_eq!(out[0].tint, tint);
}

#[test]
fn flip_mirrors_about_anchor_and_negates_rotation() {
    let mut skin = SkinData::default();
    skin.insert(
        "S",
        AttachmentData {
            x: 5.0,
            rotation: 30.0,
            ..AttachmentData::new("A")
        },
    );
    let data = skeleton_with(
        vec![BoneData::new("root")],
        vec![slot("S", Some(0), "A")],
        skin,
    );

    let plain = &commands(&data, &SlotNudges::none(), false)[0];
    assert_approx(plain.center_x, 105.0);
    assert_approx(plain.rotation, 30.0);

    let flipped = &commands(&data, &SlotNudges::none(), true)[0];
    assert_approx(flipped.center_x, 95.0);
    assert_approx(flipped.center_y, plain.center_y);
    assert_approx(flipped.rotation, -30.0);
    assert!(flipped.flip_x);
}

#[test]
fn leg_slots_are_pushed_down() {
    let data = single_slot("Lag", AttachmentData::new("A"));
    let cmd = &commands(&data, &SlotNudges::default(), false)[0];
    assert_approx(cmd.center_x, 100.0);
    assert_approx(cmd.center_y, 109.0);

    let none = &commands(&data, &SlotNudges::none(), false)[0];
    assert_approx(none.center_y, 100.0);
}

#[test]
fn hand_slots_are_pushed_down_and_towards_the_back() {
    let data = single_slot("Hand2", AttachmentData::new("A"));

    let facing_right = &commands(&data, &SlotNudges::default(), false)[0];
    assert_approx(facing_right.center_x, 97.0);
    assert_approx(facing_right.center_y, 103.0);

    let facing_left = &commands(&data, &SlotNudges::default(), true)[0];
    assert_approx(facing_left.center_x, 103.0);
    assert_approx(facing_left.center_y, 103.0);
}

#[test]
fn hand_nudge_is_in_bone_space() {
    let mut skin = SkinData::default();
    skin.insert("Hand", AttachmentData::new("A"));
    let data = skeleton_with(
        vec![BoneData {
            rotation: 90.0,
            ..BoneData::new("root")
        }],
        vec![slot("Hand", Some(0), "A")],
        skin,
    );
    let cmd = &commands(&data, &SlotNudges::default(), false)[0];
    // Bone-space +Y maps to world -X for a bone rotated 90 degrees clockwise.
    assert_approx(cmd.center_x, 100.0 - 3.0 - 3.0);
    assert_approx(cmd.center_y, 100.0);
}

#[test]
fn unresolvable_slots_are_skipped_in_order() {
    let mut skin = SkinData::default();
    skin.insert("First", AttachmentData::new("A"));
    skin.insert("NoBone", AttachmentData::new("A"));
    skin.insert("NoRegion", AttachmentData::new("Missing"));
    skin.insert("Last", AttachmentData::new("Trimmed"));
    let data = skeleton_with(
        vec![BoneData::new("root")],
        vec![
            slot("First", Some(0), "A"),
            slot("NoBone", None, "A"),
            slot("NoSkin", Some(0), "A"),
            slot("NoRegion", Some(0), "Missing"),
            SlotData {
                name: "Empty".to_string(),
                bone: Some(0),
                attachment: None,
            },
            slot("Last", Some(0), "Trimmed"),
        ],
        skin,
    );
    let out = commands(&data, &SlotNudges::none(), false);
    let slots: Vec<usize> = out.iter().map(|c| c.slot_index).collect();
    assert_eq!(slots, [0, 5]);
}

#[test]
fn letterbox_fits_and_centres_design_space() {
    let ctx = RenderContext::letterbox(1600, 900, 800, 600);
    assert_approx(ctx.scale, 1.5);
    assert_eq!((ctx.offset_x, ctx.offset_y), (200, 0));

    let (x, y) = ctx.screen_to_world(200, 0);
    assert_approx(x, 0.0);
    assert_approx(y, 0.0);
    let (x, y) = ctx.screen_to_world(350, 150);
    assert_approx(x, 100.0);
    assert_approx(y, 100.0);

    assert_eq!(RenderContext::letterbox(800, 600, 0, 600), RenderContext::default());
}

#[test]
fn command_rect_places_top_left_corner() {
    let data = single_slot("S", AttachmentData::new("A"));
    let cmd = &commands(&data, &SlotNudges::none(), false)[0];
    let ctx = RenderContext::letterbox(1600, 900, 800, 600);
    let rect = ctx.command_rect(cmd);
    assert_approx(rect.x, 200.0 + 95.0 * 1.5);
    assert_approx(rect.y, 95.0 * 1.5);
    assert_approx(rect.width, 15.0);
    assert_approx(rect.height, 15.0);
}

struct FakeTexture {
    width: u32,
    height: u32,
}

impl Texture for FakeTexture {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }
}

#[derive(Default)]
struct Recorder {
    calls: Vec<(DrawCommand, ScreenRect)>,
}

impl RenderTarget for Recorder {
    type Texture = FakeTexture;

    fn draw_region(&mut self, _texture: &FakeTexture, command: &DrawCommand, dest: ScreenRect) {
        self.calls.push((command.clone(), dest));
    }
}

#[test]
fn draw_submits_every_visible_slot() {
    let data = single_slot("S", AttachmentData::new("A"));
    let atlas = Atlas::parse(ATLAS);
    let skeleton = Skeleton::from_parts(Arc::new(data), Arc::new(atlas));
    let texture = FakeTexture {
        width: 64,
        height: 64,
    };

    let mut target = Recorder::default();
    let ctx = RenderContext::default();
    skeleton.draw(&mut target, &ctx, &texture, 50.0, 60.0, 1.0, Color::WHITE, false);
    assert_eq!(target.calls.len(), 1);
    let (cmd, dest) = &target.calls[0];
    assert_approx(cmd.center_x, 50.0);
    assert_approx(cmd.center_y, 60.0);
    assert_approx(dest.x, 45.0);
    assert_approx(dest.y, 55.0);
    assert_approx(dest.width, 10.0);
}

#[test]
fn draw_is_a_no_op_without_texture_or_data() {
    let data = single_slot("S", AttachmentData::new("A"));
    let atlas = Atlas::parse(ATLAS);
    let skeleton = Skeleton::from_parts(Arc::new(data), Arc::new(atlas));
    let ctx = RenderContext::default();

    let mut target = Recorder::default();
    let empty = FakeTexture {
        width: 0,
        height: 64,
    };
    skeleton.draw(&mut target, &ctx, &empty, 0.0, 0.0, 1.0, Color::WHITE, false);
    assert!(target.calls.is_empty());

    let texture = FakeTexture {
        width: 64,
        height: 64,
    };
    Skeleton::new().draw(&mut target, &ctx, &texture, 0.0, 0.0, 1.0, Color::WHITE, false);
    assert!(target.calls.is_empty());
    assert!(Skeleton::new().draw_commands(0.0, 0.0, 1.0, Color::WHITE, false).is_empty());
}
