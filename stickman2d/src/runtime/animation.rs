use crate::{Animation, AttachmentFrame, BoneData, BoneTimeline, Curve, RotateFrame, Vec2Frame};

/// A keyframe on a numeric timeline.
pub(crate) trait Keyframe {
    fn time(&self) -> f32;
    fn curve(&self) -> Curve;
}

impl Keyframe for RotateFrame {
    fn time(&self) -> f32 {
        self.time
    }

    fn curve(&self) -> Curve {
        self.curve
    }
}

impl Keyframe for Vec2Frame {
    fn time(&self) -> f32 {
        self.time
    }

    fn curve(&self) -> Curve {
        self.curve
    }
}

/// Where a query time falls on a timeline.
enum Segment<'a, K> {
    Hold(&'a K),
    Blend { from: &'a K, to: &'a K, alpha: f32 },
}

fn locate<K: Keyframe>(frames: &[K], time: f32) -> Option<Segment<'_, K>> {
    let first = frames.first()?;
    if time <= first.time() {
        return Some(Segment::Hold(first));
    }
    for pair in frames.windows(2) {
        let (from, to) = (&pair[0], &pair[1]);
        if time < to.time() {
            // Zero-length (or out of order) segments hold rather than divide by zero.
            if from.curve() == Curve::Stepped || to.time() <= from.time() {
                return Some(Segment::Hold(from));
            }
            let alpha = (time - from.time()) / (to.time() - from.time());
            return Some(Segment::Blend { from, to, alpha });
        }
    }
    frames.last().map(Segment::Hold)
}

fn lerp(from: f32, to: f32, alpha: f32) -> f32 {
    from + (to - from) * alpha
}

/// Samples a rotate timeline; `None` for an empty timeline.
pub fn sample_rotate(frames: &[RotateFrame], time: f32) -> Option<f32> {
    Some(match locate(frames, time)? {
        Segment::Hold(frame) => frame.angle,
        Segment::Blend { from, to, alpha } => lerp(from.angle, to.angle, alpha),
    })
}

/// Samples a translate or scale timeline; `None` for an empty timeline.
pub fn sample_vec2(frames: &[Vec2Frame], time: f32) -> Option<(f32, f32)> {
    Some(match locate(frames, time)? {
        Segment::Hold(frame) => (frame.x, frame.y),
        Segment::Blend { from, to, alpha } => {
            (lerp(from.x, to.x, alpha), lerp(from.y, to.y, alpha))
        }
    })
}

/// The frame in effect at `time`: the last frame whose time is `<= time`, or the first frame
/// when `time` precedes every key. Attachment keys never interpolate.
pub fn sample_attachment(frames: &[AttachmentFrame], time: f32) -> Option<&AttachmentFrame> {
    let mut current = frames.first()?;
    for frame in frames {
        if frame.time > time {
            break;
        }
        current = frame;
    }
    Some(current)
}

/// Applies every timeline of `animation` at `time` on top of the bind pose in `bones`.
///
/// Rotation and translation keys are added to the bind values, scale keys are multiplied in,
/// and attachment keys replace the slot's active attachment. Timelines that point past the end
/// of `bones` or `slot_attachments` are ignored.
pub fn apply_animation(
    animation: &Animation,
    bones: &mut [BoneData],
    slot_attachments: &mut [Option<String>],
    time: f32,
) {
    for timeline in &animation.bone_timelines {
        let Some(bone) = bones.get_mut(timeline.bone_index()) else {
            continue;
        };
        match timeline {
            BoneTimeline::Rotate(t) => {
                if let Some(angle) = sample_rotate(&t.frames, time) {
                    bone.rotation += angle;
                }
            }
            BoneTimeline::Translate(t) => {
                if let Some((x, y)) = sample_vec2(&t.frames, time) {
                    bone.x += x;
                    bone.y += y;
                }
            }
            BoneTimeline::Scale(t) => {
                if let Some((x, y)) = sample_vec2(&t.frames, time) {
                    bone.scale_x *= x;
                    bone.scale_y *= y;
                }
            }
        }
    }

    for timeline in &animation.attachment_timelines {
        let Some(slot) = slot_attachments.get_mut(timeline.slot_index) else {
            continue;
        };
        if let Some(frame) = sample_attachment(&timeline.frames, time) {
            slot.clone_from(&frame.name);
        }
    }
}
