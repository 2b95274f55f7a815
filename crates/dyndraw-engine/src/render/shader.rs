//! GLSL stage compilation and program linking.
//!
//! Stages are parsed with naga's GLSL front end and validated on the CPU, so
//! failures come back as `ShaderError` values carrying the diagnostic text
//! instead of surfacing later as device validation panics. Linking checks the
//! interface between the two stages and the renderer's fixed bindings.

use std::fmt;

use naga::valid::{Capabilities, ValidationFlags, Validator};
use thiserror::Error;

/// Built-in point shader, vertex stage.
pub const POINT_VERT: &str = include_str!("shaders/point.vert");

/// Built-in point shader, fragment stage.
pub const POINT_FRAG: &str = include_str!("shaders/point.frag");

/// Name of the transform uniform the renderer writes every frame.
pub const MVP_UNIFORM: &str = "MVP";

/// Attribute location the vertex buffer is bound to.
pub const POSITION_LOCATION: u32 = 0;

/// Entry point name produced by the GLSL front end.
pub const ENTRY_POINT: &str = "main";

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    fn naga(self) -> naga::ShaderStage {
        match self {
            ShaderStage::Vertex => naga::ShaderStage::Vertex,
            ShaderStage::Fragment => naga::ShaderStage::Fragment,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// Compile or link failure. `log` holds the compiler/linker diagnostic.
#[derive(Error, Debug, Clone)]
pub enum ShaderError {
    #[error("{stage} shader failed to compile:\n{log}")]
    Compile { stage: ShaderStage, log: String },

    #[error("shader program failed to link:\n{log}")]
    Link { log: String },
}

impl ShaderError {
    /// Diagnostic text reported by the compiler or linker.
    pub fn log(&self) -> &str {
        match self {
            ShaderError::Compile { log, .. } | ShaderError::Link { log } => log,
        }
    }
}

/// A parsed and validated shader stage.
#[derive(Debug, Clone)]
pub struct CompiledStage {
    stage: ShaderStage,
    module: naga::Module,
}

impl CompiledStage {
    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    pub fn module(&self) -> &naga::Module {
        &self.module
    }

    fn entry_point(&self) -> Option<&naga::EntryPoint> {
        let want = self.stage.naga();
        self.module.entry_points.iter().find(|ep| ep.stage == want)
    }
}

/// Vertex + fragment pair that passed interface checks.
#[derive(Debug, Clone)]
pub struct LinkedProgram {
    pub vertex: CompiledStage,
    pub fragment: CompiledStage,
    /// Binding index of the `MVP` uniform block within group 0.
    pub mvp_binding: u32,
    /// The fragment stage declares `MVP` too, so the binding must be visible to it.
    pub fragment_reads_mvp: bool,
}

/// Links two compiled stages.
///
/// The renderer feeds exactly one attribute (a vec3 position at location 0),
/// binds exactly one resource (the `MVP` block in group 0) and renders to one
/// color target. Anything else in the interface is rejected here. Every
/// problem found is reported, one per line.
pub fn link(vertex: CompiledStage, fragment: CompiledStage) -> Result<LinkedProgram, ShaderError> {
    let mut problems = Vec::new();

    if vertex.stage != ShaderStage::Vertex {
        problems.push(format!("expected a vertex stage, got {}", vertex.stage));
    }
    if fragment.stage != ShaderStage::Fragment {
        problems.push(format!("expected a fragment stage, got {}", fragment.stage));
    }

    let vs_entry = vertex.entry_point();
    let fs_entry = fragment.entry_point();
    if vs_entry.is_none() {
        problems.push("vertex stage has no vertex entry point".to_string());
    }
    if fs_entry.is_none() {
        problems.push("fragment stage has no fragment entry point".to_string());
    }

    if let Some(ep) = vs_entry {
        check_vertex_inputs(&entry_inputs(&vertex.module, ep), &mut problems);
    }

    if let (Some(vs), Some(fs)) = (vs_entry, fs_entry) {
        let outputs = entry_outputs(&vertex.module, vs);
        for (location, ty) in entry_inputs(&fragment.module, fs) {
            match outputs.iter().find(|(loc, _)| *loc == location) {
                Some((_, out_ty)) if *out_ty == ty => {}
                Some((_, out_ty)) => problems.push(format!(
                    "fragment input at location {location} is {ty:?} but vertex output is {out_ty:?}"
                )),
                None => problems.push(format!(
                    "fragment input at location {location} is not written by the vertex stage"
                )),
            }
        }
    }

    if let Some(ep) = fs_entry {
        check_color_outputs(&entry_outputs(&fragment.module, ep), &mut problems);
    }

    let vs_mvp = stage_mvp(&vertex.module, ShaderStage::Vertex, &mut problems);
    let fs_mvp = stage_mvp(&fragment.module, ShaderStage::Fragment, &mut problems);

    let mvp_binding = match (vs_mvp, fs_mvp) {
        (MvpBinding::At(vs), MvpBinding::At(fs)) if vs != fs => {
            problems.push(format!(
                "{MVP_UNIFORM} is at binding {vs} in the vertex stage but {fs} in the fragment stage"
            ));
            None
        }
        (MvpBinding::At(binding), _) => Some(binding),
        (MvpBinding::Missing, _) => {
            problems.push(format!("vertex stage declares no {MVP_UNIFORM} uniform"));
            None
        }
        (MvpBinding::Invalid, _) => None,
    };

    match mvp_binding {
        Some(mvp_binding) if problems.is_empty() => {
            let fragment_reads_mvp = matches!(fs_mvp, MvpBinding::At(_));
            log::debug!(
                "shader program linked (MVP at group 0, binding {mvp_binding}, fragment use: {fragment_reads_mvp})"
            );
            Ok(LinkedProgram {
                vertex,
                fragment,
                mvp_binding,
                fragment_reads_mvp,
            })
        }
        _ => Err(ShaderError::Link {
            log: problems.join("\n"),
        }),
    }
}

/// Compiles both stages and links them.
pub fn build_program(vertex_source: &str, fragment_source: &str) -> Result<LinkedProgram, ShaderError> {
    let vertex = compile(ShaderStage::Vertex, vertex_source)?;
    let fragment = compile(ShaderStage::Fragment, fragment_source)?;
    link(vertex, fragment)
}

fn non_empty(log: String, fallback: impl FnOnce() -> String) -> String {
    if log.trim().is_empty() {
        let fb = fallback();
        if fb.trim().is_empty() {
            "unknown shader error".to_string()
        } else {
            fb
        }
    } else {
        log
    }
}

fn mat4_f32() -> naga::TypeInner {
    naga::TypeInner::Matrix {
        columns: naga::VectorSize::Quad,
        rows: naga::VectorSize::Quad,
        scalar: naga::Scalar::F32,
    }
}

fn vec3_f32() -> naga::TypeInner {
    naga::TypeInner::Vector {
        size: naga::VectorSize::Tri,
        scalar: naga::Scalar::F32,
    }
}

/// Location-bound inputs of an entry point, flattening struct arguments.
fn entry_inputs(module: &naga::Module, ep: &naga::EntryPoint) -> Vec<(u32, naga::TypeInner)> {
    let mut out = Vec::new();
    for arg in &ep.function.arguments {
        collect_locations(module, arg.ty, arg.binding.as_ref(), &mut out);
    }
    out
}

/// Location-bound outputs of an entry point, flattening a struct result.
fn entry_outputs(module: &naga::Module, ep: &naga::EntryPoint) -> Vec<(u32, naga::TypeInner)> {
    let mut out = Vec::new();
    if let Some(result) = &ep.function.result {
        collect_locations(module, result.ty, result.binding.as_ref(), &mut out);
    }
    out
}

fn collect_locations(
    module: &naga::Module,
    ty: naga::Handle<naga::Type>,
    binding: Option<&naga::Binding>,
    out: &mut Vec<(u32, naga::TypeInner)>,
) {
    let inner = &module.types[ty].inner;
    match binding {
        Some(naga::Binding::Location { location, .. }) => out.push((*location, inner.clone())),
        Some(naga::Binding::BuiltIn(_)) => {}
        None => {
            if let naga::TypeInner::Struct { members, .. } = inner {
                for member in members {
                    collect_locations(module, member.ty, member.binding.as_ref(), out);
                }
            }
        }
    }
}

fn vec4_f32() -> naga::TypeInner {
    naga::TypeInner::Vector {
        size: naga::VectorSize::Quad,
        scalar: naga::Scalar::F32,
    }
}

/// Only the position attribute is backed by a vertex buffer.
fn check_vertex_inputs(inputs: &[(u32, naga::TypeInner)], problems: &mut Vec<String>) {
    match inputs.iter().find(|(loc, _)| *loc == POSITION_LOCATION) {
        Some((_, ty)) if *ty == vec3_f32() => {}
        Some((_, ty)) => problems.push(format!(
            "vertex input at location {POSITION_LOCATION} must be vec3, found {ty:?}"
        )),
        None => problems.push(format!(
            "vertex stage declares no position input at location {POSITION_LOCATION}"
        )),
    }

    for (location, _) in inputs.iter().filter(|(loc, _)| *loc != POSITION_LOCATION) {
        problems.push(format!(
            "vertex input at location {location} has no vertex buffer attribute \
             (only the position at location {POSITION_LOCATION} is provided)"
        ));
    }
}

/// One vec4 color output at location 0.
fn check_color_outputs(outputs: &[(u32, naga::TypeInner)], problems: &mut Vec<String>) {
    if outputs.is_empty() {
        problems.push("fragment stage writes no color output at location 0".to_string());
    }

    for (location, ty) in outputs {
        if *location != 0 {
            problems.push(format!(
                "fragment output at location {location} has no color target"
            ));
        } else if *ty != vec4_f32() {
            problems.push(format!("fragment output at location 0 must be vec4, found {ty:?}"));
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum MvpBinding {
    Missing,
    /// Declared but unusable; the problem was already reported.
    Invalid,
    At(u32),
}

/// Finds the `MVP` uniform of one stage and rejects every other resource binding.
fn stage_mvp(module: &naga::Module, stage: ShaderStage, problems: &mut Vec<String>) -> MvpBinding {
    let mut found = MvpBinding::Missing;

    for (_, var) in module.global_variables.iter() {
        let ty = &module.types[var.ty].inner;
        let mvp_ty = if var.space != naga::AddressSpace::Uniform {
            None
        } else if var.name.as_deref() == Some(MVP_UNIFORM) {
            Some(ty)
        } else if let naga::TypeInner::Struct { members, .. } = ty {
            members
                .iter()
                .find(|m| m.name.as_deref() == Some(MVP_UNIFORM))
                .map(|m| &module.types[m.ty].inner)
        } else {
            None
        };

        let Some(mvp_ty) = mvp_ty else {
            if let Some(rb) = &var.binding {
                problems.push(format!(
                    "{stage} stage binds {} at set {}, binding {}; only {MVP_UNIFORM} is bound",
                    var.name.as_deref().unwrap_or("an unnamed resource"),
                    rb.group,
                    rb.binding
                ));
            }
            continue;
        };

        if *mvp_ty != mat4_f32() {
            problems.push(format!(
                "{stage} uniform {MVP_UNIFORM} must be a mat4, found {mvp_ty:?}"
            ));
            found = MvpBinding::Invalid;
            continue;
        }

        found = match &var.binding {
            Some(rb) if rb.group == 0 => MvpBinding::At(rb.binding),
            Some(rb) => {
                problems.push(format!(
                    "{stage} uniform {MVP_UNIFORM} must live in set 0, found set {}",
                    rb.group
                ));
                MvpBinding::Invalid
            }
            None => {
                problems.push(format!("{stage} uniform {MVP_UNIFORM} has no binding"));
                MvpBinding::Invalid
            }
        };
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_OUTPUT_VERT: &str = r#"#version 450 core
layout(location = 0) in vec3 vertex_position;
layout(set = 0, binding = 0) uniform Transform { mat4 MVP; };
void main()
{
    gl_Position = MVP * vec4(vertex_position, 1.0);
}
"#;

    const NO_MVP_VERT: &str = r#"#version 450 core
layout(location = 0) in vec3 vertex_position;
layout(location = 0) out vec3 position;
void main()
{
    position = vertex_position;
    gl_Position = vec4(vertex_position, 1.0);
}
"#;

    const NORMAL_VERT: &str = r#"#version 450 core
layout(location = 0) in vec3 vertex_position;
layout(location = 1) in vec3 normal;
layout(set = 0, binding = 0) uniform Transform { mat4 MVP; };
layout(location = 0) out vec3 position;
void main()
{
    position = vertex_position + normal;
    gl_Position = MVP * vec4(vertex_position, 1.0);
}
"#;

    const MVP_FRAG: &str = r#"#version 450 core
layout(location = 0) in vec3 position;
layout(set = 0, binding = 0) uniform Transform { mat4 MVP; };
layout(location = 0) out vec4 out_colour;
void main()
{
    out_colour = MVP * vec4(position, 1.0);
}
"#;

    const TINT_FRAG: &str = r#"#version 450 core
layout(location = 0) in vec3 position;
layout(set = 0, binding = 1) uniform Tint { vec4 tint; };
layout(location = 0) out vec4 out_colour;
void main()
{
    out_colour = vec4(position, 1.0) * tint;
}
"#;

    const VEC3_OUT_FRAG: &str = r#"#version 450 core
layout(location = 0) in vec3 position;
layout(location = 0) out vec3 out_colour;
void main()
{
    out_colour = position;
}
"#;

    const TWO_TARGET_FRAG: &str = r#"#version 450 core
layout(location = 0) in vec3 position;
layout(location = 0) out vec4 out_colour;
layout(location = 1) out vec4 out_normal;
void main()
{
    out_colour = vec4(position, 1.0);
    out_normal = vec4(0.0, 0.0, 1.0, 0.0);
}
"#;

    #[test]
    fn builtin_program_links() {
        let program = build_program(POINT_VERT, POINT_FRAG).unwrap();
        assert_eq!(program.mvp_binding, 0);
        assert!(!program.fragment_reads_mvp);
        assert_eq!(program.vertex.stage(), ShaderStage::Vertex);
        assert_eq!(program.fragment.stage(), ShaderStage::Fragment);
    }

    #[test]
    fn malformed_source_reports_compile_log() {
        // Misspelled builtin: `glPosition` is an undeclared identifier.
        let bad = "#version 450 core\nlayout(location = 0) in vec3 vpos;\nvoid main()\n{\nglPosition = vpos;\n}\n";
        let err = compile(ShaderStage::Vertex, bad).unwrap_err();
        assert!(matches!(err, ShaderError::Compile { stage: ShaderStage::Vertex, .. }));
        assert!(!err.log().trim().is_empty());
        assert!(err.to_string().contains("vertex shader failed to compile"));
    }

    #[test]
    fn garbage_fragment_fails_in_build_program() {
        let err = build_program(POINT_VERT, "not glsl at all").unwrap_err();
        assert!(matches!(err, ShaderError::Compile { stage: ShaderStage::Fragment, .. }));
        assert!(!err.log().is_empty());
    }

    #[test]
    fn missing_varying_fails_to_link() {
        let err = build_program(NO_OUTPUT_VERT, POINT_FRAG).unwrap_err();
        let ShaderError::Link { log } = err else {
            panic!("expected link error, got {err:?}");
        };
        assert!(log.contains("location 0"));
    }

    #[test]
    fn missing_mvp_fails_to_link() {
        let err = build_program(NO_MVP_VERT, POINT_FRAG).unwrap_err();
        assert!(matches!(err, ShaderError::Link { .. }));
        assert!(err.log().contains(MVP_UNIFORM));
    }

    #[test]
    fn unfed_vertex_input_fails_to_link() {
        let err = build_program(NORMAL_VERT, POINT_FRAG).unwrap_err();
        assert!(matches!(err, ShaderError::Link { .. }));
        assert!(err.log().contains("location 1"));
    }

    #[test]
    fn fragment_may_read_mvp() {
        let program = build_program(POINT_VERT, MVP_FRAG).unwrap();
        assert_eq!(program.mvp_binding, 0);
        assert!(program.fragment_reads_mvp);
    }

    #[test]
    fn extra_resource_binding_fails_to_link() {
        let err = build_program(POINT_VERT, TINT_FRAG).unwrap_err();
        assert!(matches!(err, ShaderError::Link { .. }));
        assert!(err.log().contains("binding 1"), "{}", err.log());
    }

    #[test]
    fn color_output_must_be_one_vec4() {
        let err = build_program(POINT_VERT, VEC3_OUT_FRAG).unwrap_err();
        assert!(err.log().contains("must be vec4"), "{}", err.log());

        let err = build_program(POINT_VERT, TWO_TARGET_FRAG).unwrap_err();
        assert!(err.log().contains("location 1 has no color target"), "{}", err.log());
    }

    #[test]
    fn swapped_stages_fail_to_link() {
        let vs = compile(ShaderStage::Vertex, POINT_VERT).unwrap();
        let fs = compile(ShaderStage::Fragment, POINT_FRAG).unwrap();
        let err = link(fs, vs).unwrap_err();
        assert!(err.log().contains("expected a vertex stage"));
    }
}
