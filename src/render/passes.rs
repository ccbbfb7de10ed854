//! The two passes drawn every frame.
//!
//! The reflection pass fills all six faces of the dynamic cubemap; the
//! composite pass then draws the visible frame, with the glass sampling
//! what was just captured.

use super::plan::{DepthFunc, FramePlan, FrameRecorder, PlanError, RenderTarget};
use super::reflection::{CubeFace, ReflectionMode};
use super::renderable::{CameraMatrices, Renderable};
use crate::scene::Scene;

/// Per-frame inputs shared by both passes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameParams {
    pub matrices: CameraMatrices,
    pub angle_degrees: f32,
    pub reflection_mode: ReflectionMode,
    pub depth_range: (f32, f32),
    pub clear_color: wgpu::Color,
}

/// Records a full frame: reflection capture, then composite.
pub fn record_frame(scene: &Scene, params: &FrameParams) -> Result<FramePlan, PlanError> {
    let mut recorder = FrameRecorder::new();
    reflection_pass(&mut recorder, scene, params)?;
    composite_pass(&mut recorder, scene, params)?;
    recorder.finish()
}

pub fn reflection_pass(
    recorder: &mut FrameRecorder,
    scene: &Scene,
    params: &FrameParams,
) -> Result<(), PlanError> {
    let origin = scene.reflection_origin();
    for face in CubeFace::ALL {
        let matrices = params
            .reflection_mode
            .face_matrices(face, &params.matrices, origin, params.depth_range);

        recorder.begin_pass(
            format!("Reflection {}", face.label()),
            RenderTarget::ReflectionFace(face),
            Some(params.clear_color),
        )?;
        for model in scene.opaque_models() {
            model.draw(recorder, &matrices, params.angle_degrees)?;
        }
        draw_sky(recorder, &scene.sky, &matrices, params.angle_degrees)?;
        recorder.end_pass()?;
    }
    Ok(())
}

pub fn composite_pass(
    recorder: &mut FrameRecorder,
    scene: &Scene,
    params: &FrameParams,
) -> Result<(), PlanError> {
    recorder.begin_pass("Composite", RenderTarget::Screen, Some(params.clear_color))?;
    for model in scene.opaque_models() {
        model.draw(recorder, &params.matrices, params.angle_degrees)?;
    }
    scene.glass.draw(recorder, &params.matrices, params.angle_degrees)?;
    draw_sky(recorder, &scene.sky, &params.matrices, params.angle_degrees)?;
    recorder.end_pass()
}

/// The sky is drawn at the far plane, so it needs less-or-equal to pass the depth test.
fn draw_sky(
    recorder: &mut FrameRecorder,
    sky: &Renderable,
    matrices: &CameraMatrices,
    angle_degrees: f32,
) -> Result<(), PlanError> {
    let mut depth = recorder.scoped_depth(DepthFunc::LessEqual);
    sky.draw(&mut depth, matrices, angle_degrees)
}
