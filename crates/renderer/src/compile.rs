//! Front-end checks for GLSL stages, run through naga before anything reaches
//! the GPU.
//!
//! `wgpu` reports shader problems asynchronously and without the stage that
//! caused them, so stages are parsed and validated here first. This gives the
//! pipeline builder a per-stage compiler log and lets the command line check
//! sources without a device.

use std::collections::BTreeSet;

use wgpu::naga;

use crate::error::BuildError;
use crate::shader::ShaderSource;
use crate::types::ShaderStage;

/// A stage that parsed and validated.
#[derive(Debug)]
pub struct CompiledStage {
    pub stage: ShaderStage,
    pub module: naga::Module,
}

impl CompiledStage {
    /// Locations the stage reads from the previous stage (or vertex buffers).
    pub fn input_locations(&self) -> BTreeSet<u32> {
        let mut locations = BTreeSet::new();
        for entry in &self.module.entry_points {
            for argument in &entry.function.arguments {
                collect_locations(
                    &self.module,
                    argument.binding.as_ref(),
                    argument.ty,
                    &mut locations,
                );
            }
        }
        locations
    }

    /// Locations the stage writes for the next stage.
    pub fn output_locations(&self) -> BTreeSet<u32> {
        let mut locations = BTreeSet::new();
        for entry in &self.module.entry_points {
            if let Some(result) = &entry.function.result {
                collect_locations(
                    &self.module,
                    result.binding.as_ref(),
                    result.ty,
                    &mut locations,
                );
            }
        }
        locations
    }
}

fn collect_locations(
    module: &naga::Module,
    binding: Option<&naga::Binding>,
    ty: naga::Handle<naga::Type>,
    out: &mut BTreeSet<u32>,
) {
    match binding {
        Some(naga::Binding::Location { location, .. }) => {
            out.insert(*location);
        }
        Some(naga::Binding::BuiltIn(_)) => {}
        None => {
            if let naga::TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for member in members {
                    if let Some(naga::Binding::Location { location, .. }) = &member.binding {
                        out.insert(*location);
                    }
                }
            }
        }
    }
}

fn naga_stage(stage: ShaderStage) -> naga::ShaderStage {
    match stage {
        ShaderStage::Vertex => naga::ShaderStage::Vertex,
        ShaderStage::Fragment => naga::ShaderStage::Fragment,
    }
}

/// Parses and validates one GLSL stage.
///
/// On failure the returned string is the compiler log.
pub fn compile_stage(stage: ShaderStage, source: &str) -> Result<CompiledStage, String> {
    let mut frontend = naga::front::glsl::Frontend::default();
    let options = naga::front::glsl::Options::from(naga_stage(stage));
    let module = frontend
        .parse(&options, source)
        .map_err(|errors| errors.to_string())?;

    let has_entry = module
        .entry_points
        .iter()
        .any(|entry| entry.stage == naga_stage(stage));
    if !has_entry {
        return Err(format!("source declares no {stage} entry point"));
    }

    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    )
    .validate(&module)
    .map_err(|err| err.emit_to_string(source))?;

    Ok(CompiledStage { stage, module })
}

/// Checks that every fragment input is produced by the vertex stage.
///
/// On failure the returned string is the linker log.
pub fn link_stages(vertex: &CompiledStage, fragment: &CompiledStage) -> Result<(), String> {
    if vertex.stage != ShaderStage::Vertex || fragment.stage != ShaderStage::Fragment {
        return Err(format!(
            "cannot link a {} stage with a {} stage",
            vertex.stage, fragment.stage
        ));
    }

    let produced = vertex.output_locations();
    let missing: Vec<String> = fragment
        .input_locations()
        .difference(&produced)
        .map(|location| location.to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(format!(
            "fragment inputs at location(s) {} are not written by the vertex stage",
            missing.join(", ")
        ))
    }
}

/// Compiles both stages independently, then links them, without a device.
pub fn validate_source(source: &ShaderSource) -> Result<(), BuildError> {
    let vertex = compile_stage(source.vertex.stage, source.vertex.text).map_err(|log| {
        BuildError::Compile {
            stage: source.vertex.stage,
            log,
        }
    })?;
    let fragment = compile_stage(source.fragment.stage, source.fragment.text).map_err(|log| {
        BuildError::Compile {
            stage: source.fragment.stage,
            log,
        }
    })?;
    link_stages(&vertex, &fragment).map_err(|log| BuildError::Link { log })
}
