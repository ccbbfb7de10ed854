//! Frame recording.
//!
//! The passes never touch the GPU directly. They record into a
//! [`FrameRecorder`], which tracks the same pieces of state an immediate-mode
//! API would (the open render target, the depth function, the bound
//! geometry) and produces a [`FramePlan`] for the renderer to execute.

use std::ops::{Deref, DerefMut};

use glam::Mat4;

use super::reflection::CubeFace;
use super::renderable::{Geometry, ShaderKind, TextureBinding, TextureSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DepthFunc {
    Less,
    LessEqual,
}

impl DepthFunc {
    pub fn compare_function(self) -> wgpu::CompareFunction {
        match self {
            DepthFunc::Less => wgpu::CompareFunction::Less,
            DepthFunc::LessEqual => wgpu::CompareFunction::LessEqual,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderTarget {
    Screen,
    ReflectionFace(CubeFace),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawUniforms {
    pub projection: Mat4,
    pub view: Mat4,
    pub model: Mat4,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawCommand {
    pub label: &'static str,
    pub shader: ShaderKind,
    pub geometry: Geometry,
    pub depth_func: DepthFunc,
    pub uniforms: DrawUniforms,
    pub textures: Vec<TextureBinding>,
}

impl DrawCommand {
    pub fn samples(&self, source: TextureSource) -> bool {
        self.textures.iter().any(|t| t.source == source)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PassPlan {
    pub label: String,
    pub target: RenderTarget,
    pub clear: Option<wgpu::Color>,
    pub draws: Vec<DrawCommand>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FramePlan {
    pub passes: Vec<PassPlan>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlanError {
    #[error("render pass '{0}' is still open")]
    PassAlreadyOpen(String),

    #[error("no render pass is open")]
    NoOpenPass,

    #[error("draw '{label}' samples the reflection cubemap before faces {missing:?} were written")]
    ReflectionReadBeforeWrite {
        label: &'static str,
        missing: Vec<CubeFace>,
    },

    #[error("draw '{label}' samples the reflection cubemap while rendering into it")]
    ReflectionFeedback { label: &'static str },
}

impl FramePlan {
    /// Every draw that samples the dynamic reflection must come after all six
    /// faces have been rendered in this frame, and no face pass may sample
    /// the cubemap it is writing.
    pub fn validate(&self) -> Result<(), PlanError> {
        let mut written = [false; 6];
        for pass in &self.passes {
            for draw in &pass.draws {
                if !draw.samples(TextureSource::DynamicReflection) {
                    continue;
                }
                if let RenderTarget::ReflectionFace(_) = pass.target {
                    return Err(PlanError::ReflectionFeedback { label: draw.label });
                }
                let missing: Vec<CubeFace> = CubeFace::ALL
                    .into_iter()
                    .filter(|face| !written[face.index()])
                    .collect();
                if !missing.is_empty() {
                    return Err(PlanError::ReflectionReadBeforeWrite {
                        label: draw.label,
                        missing,
                    });
                }
            }
            if let RenderTarget::ReflectionFace(face) = pass.target {
                written[face.index()] = true;
            }
        }
        Ok(())
    }

    pub fn draw_count(&self) -> usize {
        self.passes.iter().map(|p| p.draws.len()).sum()
    }
}

#[derive(Debug)]
pub struct FrameRecorder {
    passes: Vec<PassPlan>,
    open: Option<PassPlan>,
    depth_func: DepthFunc,
    bound_geometry: Option<Geometry>,
}

impl FrameRecorder {
    pub fn new() -> Self {
        Self {
            passes: Vec::new(),
            open: None,
            depth_func: DepthFunc::Less,
            bound_geometry: None,
        }
    }

    pub fn depth_func(&self) -> DepthFunc {
        self.depth_func
    }

    pub fn bound_geometry(&self) -> Option<Geometry> {
        self.bound_geometry
    }

    pub fn is_pass_open(&self) -> bool {
        self.open.is_some()
    }

    pub fn begin_pass(
        &mut self,
        label: impl Into<String>,
        target: RenderTarget,
        clear: Option<wgpu::Color>,
    ) -> Result<(), PlanError> {
        if let Some(open) = &self.open {
            return Err(PlanError::PassAlreadyOpen(open.label.clone()));
        }
        self.open = Some(PassPlan {
            label: label.into(),
            target,
            clear,
            draws: Vec::new(),
        });
        Ok(())
    }

    pub fn end_pass(&mut self) -> Result<(), PlanError> {
        let pass = self.open.take().ok_or(PlanError::NoOpenPass)?;
        self.passes.push(pass);
        Ok(())
    }

    /// Switches the depth function until the returned guard is dropped.
    pub fn scoped_depth(&mut self, func: DepthFunc) -> DepthScope<'_> {
        let previous = std::mem::replace(&mut self.depth_func, func);
        DepthScope {
            recorder: self,
            previous,
        }
    }

    /// Binds `geometry` until the returned guard is dropped.
    pub fn bind_geometry(&mut self, geometry: Geometry) -> GeometryBinding<'_> {
        self.bound_geometry = Some(geometry);
        GeometryBinding {
            recorder: self,
            geometry,
        }
    }

    pub fn finish(mut self) -> Result<FramePlan, PlanError> {
        if let Some(open) = self.open.take() {
            return Err(PlanError::PassAlreadyOpen(open.label));
        }
        let plan = FramePlan {
            passes: self.passes,
        };
        plan.validate()?;
        Ok(plan)
    }

    fn push_draw(&mut self, command: DrawCommand) -> Result<(), PlanError> {
        let pass = self.open.as_mut().ok_or(PlanError::NoOpenPass)?;
        pass.draws.push(command);
        Ok(())
    }
}

impl Default for FrameRecorder {
    fn default() -> Self {
        Self::new()
    }
}

/// Restores the previous depth function on drop, including on early return.
pub struct DepthScope<'a> {
    recorder: &'a mut FrameRecorder,
    previous: DepthFunc,
}

impl Deref for DepthScope<'_> {
    type Target = FrameRecorder;

    fn deref(&self) -> &FrameRecorder {
        self.recorder
    }
}

impl DerefMut for DepthScope<'_> {
    fn deref_mut(&mut self) -> &mut FrameRecorder {
        self.recorder
    }
}

impl Drop for DepthScope<'_> {
    fn drop(&mut self) {
        self.recorder.depth_func = self.previous;
    }
}

/// Unbinds the geometry on drop so nothing stays bound for the next draw.
pub struct GeometryBinding<'a> {
    recorder: &'a mut FrameRecorder,
    geometry: Geometry,
}

impl GeometryBinding<'_> {
    pub fn draw(
        &mut self,
        label: &'static str,
        shader: ShaderKind,
        uniforms: DrawUniforms,
        textures: &[TextureBinding],
    ) -> Result<(), PlanError> {
        let command = DrawCommand {
            label,
            shader,
            geometry: self.geometry,
            depth_func: self.recorder.depth_func,
            uniforms,
            textures: textures.to_vec(),
        };
        self.recorder.push_draw(command)
    }
}

impl Drop for GeometryBinding<'_> {
    fn drop(&mut self) {
        self.recorder.bound_geometry = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::renderable::VertexBufferHandle;

    const QUAD: Geometry = Geometry::Vertices {
        buffer: VertexBufferHandle(0),
        vertex_count: 4,
    };

    fn uniforms() -> DrawUniforms {
        DrawUniforms {
            projection: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
            model: Mat4::IDENTITY,
        }
    }

    fn reflective_draw(recorder: &mut FrameRecorder) -> Result<(), PlanError> {
        let textures = [TextureBinding::new(0, "environmentMap", TextureSource::DynamicReflection)];
        recorder
            .bind_geometry(QUAD)
            .draw("glass", ShaderKind::BrokenGlass, uniforms(), &textures)
    }

    #[test]
    fn test_depth_scope_restores_on_drop() {
        let mut recorder = FrameRecorder::new();
        assert_eq!(recorder.depth_func(), DepthFunc::Less);
        {
            let scope = recorder.scoped_depth(DepthFunc::LessEqual);
            assert_eq!(scope.depth_func(), DepthFunc::LessEqual);
        }
        assert_eq!(recorder.depth_func(), DepthFunc::Less);
    }

    #[test]
    fn test_depth_scope_restores_on_error() {
        fn failing(recorder: &mut FrameRecorder) -> Result<(), PlanError> {
            let mut scope = recorder.scoped_depth(DepthFunc::LessEqual);
            // No pass is open, so the draw fails and the scope unwinds early
            reflective_draw(&mut scope)?;
            Ok(())
        }

        let mut recorder = FrameRecorder::new();
        assert_eq!(failing(&mut recorder), Err(PlanError::NoOpenPass));
        assert_eq!(recorder.depth_func(), DepthFunc::Less);
    }

    #[test]
    fn test_geometry_released_after_draw() {
        let mut recorder = FrameRecorder::new();
        recorder.begin_pass("p", RenderTarget::Screen, None).unwrap();
        {
            let mut binding = recorder.bind_geometry(QUAD);
            binding.draw("q", ShaderKind::BrokenGlass, uniforms(), &[]).unwrap();
        }
        assert_eq!(recorder.bound_geometry(), None);
    }

    #[test]
    fn test_draw_records_current_depth_func() {
        let mut recorder = FrameRecorder::new();
        recorder.begin_pass("p", RenderTarget::Screen, None).unwrap();
        recorder
            .bind_geometry(QUAD)
            .draw("a", ShaderKind::DrStrange, uniforms(), &[])
            .unwrap();
        {
            let mut scope = recorder.scoped_depth(DepthFunc::LessEqual);
            scope
                .bind_geometry(QUAD)
                .draw("b", ShaderKind::Skybox, uniforms(), &[])
                .unwrap();
        }
        recorder.end_pass().unwrap();

        let plan = recorder.finish().unwrap();
        let funcs: Vec<_> = plan.passes[0].draws.iter().map(|d| d.depth_func).collect();
        assert_eq!(funcs, vec![DepthFunc::Less, DepthFunc::LessEqual]);
    }

    #[test]
    fn test_pass_nesting_is_rejected() {
        let mut recorder = FrameRecorder::new();
        recorder.begin_pass("outer", RenderTarget::Screen, None).unwrap();
        assert_eq!(
            recorder.begin_pass("inner", RenderTarget::Screen, None),
            Err(PlanError::PassAlreadyOpen("outer".into()))
        );
        assert!(recorder.is_pass_open());
        assert_eq!(recorder.finish(), Err(PlanError::PassAlreadyOpen("outer".into())));
    }

    #[test]
    fn test_end_without_begin() {
        let mut recorder = FrameRecorder::new();
        assert_eq!(recorder.end_pass(), Err(PlanError::NoOpenPass));
    }

    #[test]
    fn test_reading_reflection_before_all_faces_written() {
        let mut recorder = FrameRecorder::new();
        for face in &CubeFace::ALL[..5] {
            recorder.begin_pass("face", RenderTarget::ReflectionFace(*face), None).unwrap();
            recorder.end_pass().unwrap();
        }
        recorder.begin_pass("screen", RenderTarget::Screen, None).unwrap();
        reflective_draw(&mut recorder).unwrap();
        recorder.end_pass().unwrap();

        assert_eq!(
            recorder.finish(),
            Err(PlanError::ReflectionReadBeforeWrite {
                label: "glass",
                missing: vec![CubeFace::NegativeZ],
            })
        );
    }

    #[test]
    fn test_reading_reflection_after_all_faces_written() {
        let mut recorder = FrameRecorder::new();
        for face in CubeFace::ALL {
            recorder.begin_pass("face", RenderTarget::ReflectionFace(face), None).unwrap();
            recorder.end_pass().unwrap();
        }
        recorder.begin_pass("screen", RenderTarget::Screen, None).unwrap();
        reflective_draw(&mut recorder).unwrap();
        recorder.end_pass().unwrap();

        let plan = recorder.finish().unwrap();
        assert_eq!(plan.passes.len(), 7);
        assert_eq!(plan.draw_count(), 1);
    }

    #[test]
    fn test_sampling_reflection_inside_face_pass() {
        let mut recorder = FrameRecorder::new();
        recorder
            .begin_pass("face", RenderTarget::ReflectionFace(CubeFace::PositiveX), None)
            .unwrap();
        reflective_draw(&mut recorder).unwrap();
        recorder.end_pass().unwrap();

        assert_eq!(
            recorder.finish(),
            Err(PlanError::ReflectionFeedback { label: "glass" })
        );
    }
}
