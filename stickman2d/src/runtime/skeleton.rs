use crate::{
    Animation, Atlas, BoneData, Color, DrawCommand, Error, RenderContext, RenderTarget,
    SkeletonData, SlotNudges, Texture, apply_animation, build_draw_commands,
};
use std::path::Path;
use std::sync::Arc;

/// Animation auto-started after a successful load, when the skeleton defines it.
pub const DEFAULT_ANIMATION: &str = "Idle";

/// World transform of a bone: a 2x2 rotation/scale matrix `[a b; c d]` plus a translation.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct BonePose {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub world_x: f32,
    pub world_y: f32,
}

impl Default for BonePose {
    fn default() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            world_x: 0.0,
            world_y: 0.0,
        }
    }
}

impl BonePose {
    /// Maps a point from bone space into skeleton space.
    pub fn transform_point(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.world_x + self.a * x + self.b * y,
            self.world_y + self.c * x + self.d * y,
        )
    }

    /// Rotation of the bone's X axis in degrees.
    pub fn world_rotation(&self) -> f32 {
        self.c.atan2(self.a).to_degrees()
    }

    #[cfg(feature = "glam")]
    pub fn to_affine2(&self) -> glam::Affine2 {
        glam::Affine2::from_mat2_translation(
            glam::Mat2::from_cols(glam::vec2(self.a, self.c), glam::vec2(self.b, self.d)),
            glam::vec2(self.world_x, self.world_y),
        )
    }

    #[cfg(feature = "glam")]
    pub fn world_position(&self) -> glam::Vec2 {
        glam::vec2(self.world_x, self.world_y)
    }
}

fn local_pose(bone: &BoneData) -> BonePose {
    let (sin, cos) = bone.rotation.to_radians().sin_cos();
    BonePose {
        a: cos * bone.scale_x,
        b: -sin * bone.scale_y,
        c: sin * bone.scale_x,
        d: cos * bone.scale_y,
        world_x: bone.x,
        world_y: bone.y,
    }
}

/// Evaluated skeleton for one frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Pose {
    pub bones: Vec<BonePose>,
    /// Active attachment per slot after attachment keys are applied.
    pub attachments: Vec<Option<String>>,
}

/// Evaluates `animation` at `time` over the bind pose and composes world transforms.
///
/// Bones are posed in the data's update order, so parents are always resolved before their
/// children regardless of declaration order.
pub fn compute_pose(data: &SkeletonData, animation: Option<&Animation>, time: f32) -> Pose {
    let mut bones = data.bones.clone();
    let mut attachments: Vec<Option<String>> =
        data.slots.iter().map(|s| s.attachment.clone()).collect();
    if let Some(animation) = animation {
        apply_animation(animation, &mut bones, &mut attachments, time);
    }

    let mut poses = vec![BonePose::default(); bones.len()];
    for &index in &data.update_order {
        let bone = &bones[index];
        let local = local_pose(bone);
        let pose = match bone.parent.and_then(|p| poses.get(p)) {
            None => local,
            Some(parent) => {
                let (world_x, world_y) = parent.transform_point(bone.x, bone.y);
                BonePose {
                    a: parent.a * local.a + parent.b * local.c,
                    b: parent.a * local.b + parent.b * local.d,
                    c: parent.c * local.a + parent.d * local.c,
                    d: parent.c * local.b + parent.d * local.d,
                    world_x,
                    world_y,
                }
            }
        };
        poses[index] = pose;
    }

    Pose {
        bones: poses,
        attachments,
    }
}

/// One animated skeleton instance: shared tables plus its own animation cursor.
#[derive(Clone, Debug)]
pub struct Skeleton {
    data: Option<Arc<SkeletonData>>,
    atlas: Option<Arc<Atlas>>,
    current_animation: String,
    time: f32,
    looped: bool,

    pub slot_nudges: SlotNudges,
    pub default_animation: Option<String>,
}

impl Default for Skeleton {
    fn default() -> Self {
        Self::new()
    }
}

impl Skeleton {
    /// An instance with nothing loaded; `update` and `draw` are no-ops until a load succeeds.
    pub fn new() -> Self {
        Self {
            data: None,
            atlas: None,
            current_animation: String::new(),
            time: 0.0,
            looped: true,
            slot_nudges: SlotNudges::default(),
            default_animation: Some(DEFAULT_ANIMATION.to_string()),
        }
    }

    /// An instance sharing already-parsed tables.
    pub fn from_parts(data: Arc<SkeletonData>, atlas: Arc<Atlas>) -> Self {
        let mut skeleton = Self::new();
        skeleton.install(data, atlas);
        skeleton
    }

    /// Reads and parses the skeleton definition and atlas files.
    ///
    /// On failure the instance is left not loaded.
    pub fn load(
        &mut self,
        definition_path: impl AsRef<Path>,
        atlas_path: impl AsRef<Path>,
    ) -> Result<(), Error> {
        let parsed = read_to_string(definition_path.as_ref()).and_then(|definition| {
            let data = SkeletonData::from_json_str(&definition)?;
            let atlas = Atlas::parse(&read_to_string(atlas_path.as_ref())?);
            Ok((data, atlas))
        });
        self.finish_load(parsed)
    }

    /// Same as [`Skeleton::load`] with the documents already in memory.
    pub fn load_from_str(&mut self, definition: &str, atlas: &str) -> Result<(), Error> {
        let parsed =
            SkeletonData::from_json_str(definition).map(|data| (data, Atlas::parse(atlas)));
        self.finish_load(parsed)
    }

    fn finish_load(&mut self, parsed: Result<(SkeletonData, Atlas), Error>) -> Result<(), Error> {
        self.unload();
        match parsed {
            Ok((data, atlas)) => {
                self.install(Arc::new(data), Arc::new(atlas));
                Ok(())
            }
            Err(err) => {
                log::warn!("failed to load skeleton: {err}");
                Err(err)
            }
        }
    }

    fn install(&mut self, data: Arc<SkeletonData>, atlas: Arc<Atlas>) {
        self.data = Some(data);
        self.atlas = Some(atlas);
        let default = self
            .default_animation
            .clone()
            .filter(|name| self.has_animation(name));
        if let Some(name) = default {
            self.current_animation = name;
            self.time = 0.0;
            self.looped = true;
        }
    }

    fn unload(&mut self) {
        self.data = None;
        self.atlas = None;
        self.current_animation.clear();
        self.time = 0.0;
        self.looped = true;
    }

    pub fn is_loaded(&self) -> bool {
        self.data.is_some() && self.atlas.is_some()
    }

    pub fn data(&self) -> Option<&Arc<SkeletonData>> {
        self.data.as_ref()
    }

    pub fn atlas(&self) -> Option<&Arc<Atlas>> {
        self.atlas.as_ref()
    }

    pub fn has_animation(&self, name: &str) -> bool {
        self.data
            .as_ref()
            .is_some_and(|data| data.animation(name).is_some())
    }

    /// Makes `name` the current animation.
    ///
    /// Time restarts at zero when `restart` is set or the animation changes; calling again with
    /// the same name and `restart == false` only updates the loop flag.
    pub fn set_animation(&mut self, name: &str, looped: bool, restart: bool) -> Result<(), Error> {
        if !self.has_animation(name) {
            return Err(Error::UnknownAnimation {
                name: name.to_string(),
            });
        }
        if restart || self.current_animation != name {
            self.time = 0.0;
        }
        if self.current_animation != name {
            self.current_animation = name.to_string();
        }
        self.looped = looped;
        Ok(())
    }

    /// Name of the current animation; empty when none is set.
    pub fn current_animation(&self) -> &str {
        &self.current_animation
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn is_looping(&self) -> bool {
        self.looped
    }

    fn animation(&self) -> Option<&Animation> {
        if self.current_animation.is_empty() {
            return None;
        }
        self.data
            .as_ref()?
            .animation(&self.current_animation)
            .map(|(_, a)| a)
    }

    /// Advances the animation cursor by `delta` seconds.
    pub fn update(&mut self, delta: f32) {
        if !delta.is_finite() {
            return;
        }
        let Some(duration) = self.animation().map(|a| a.duration) else {
            return;
        };
        if duration <= 0.0 {
            self.time = 0.0;
            return;
        }
        self.time += delta;
        if self.looped {
            self.time = self.time.rem_euclid(duration);
            // `rem_euclid` can round up to `duration` for tiny negative inputs.
            if self.time >= duration {
                self.time = 0.0;
            }
        } else if self.time > duration {
            self.time = duration;
        }
    }

    /// Evaluates the pose at the current time; `None` when not loaded.
    pub fn pose(&self) -> Option<Pose> {
        let data = self.data.as_deref()?;
        Some(compute_pose(data, self.animation(), self.time))
    }

    /// Draw commands in virtual space, back to front.
    ///
    /// `x`/`y` is the skeleton's anchor and `scale` multiplies sprite sizes. With `flip_x` the
    /// result is mirrored about `x`.
    pub fn draw_commands(
        &self,
        x: f32,
        y: f32,
        scale: f32,
        tint: Color,
        flip_x: bool,
    ) -> Vec<DrawCommand> {
        let (Some(data), Some(atlas)) = (self.data.as_deref(), self.atlas.as_deref()) else {
            return Vec::new();
        };
        let pose = compute_pose(data, self.animation(), self.time);
        build_draw_commands(
            data,
            atlas,
            &pose,
            &self.slot_nudges,
            [x, y],
            scale,
            tint,
            flip_x,
        )
    }

    /// Composites the current pose and submits every visible slot to `target`.
    #[allow(clippy::too_many_arguments)]
    pub fn draw<R: RenderTarget>(
        &self,
        target: &mut R,
        ctx: &RenderContext,
        texture: &R::Texture,
        x: f32,
        y: f32,
        scale: f32,
        tint: Color,
        flip_x: bool,
    ) {
        if !self.is_loaded() || texture.width() == 0 || texture.height() == 0 {
            return;
        }
        for command in self.draw_commands(x, y, scale, tint, flip_x) {
            let dest = ctx.command_rect(&command);
            target.draw_region(texture, &command, dest);
        }
    }
}

fn read_to_string(path: &Path) -> Result<String, Error> {
    std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })
}
