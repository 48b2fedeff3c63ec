use naga::valid::{Capabilities, ValidationFlags, Validator};

use super::ShaderStage;

/// One successfully compiled stage, kept only until the program is linked.
pub(crate) struct CompiledStage {
    pub stage: ShaderStage,
    pub source: String,
    pub module: naga::Module,
    /// Index into `module.entry_points`.
    pub entry: usize,
}

impl CompiledStage {
    pub fn entry_point(&self) -> &naga::EntryPoint {
        &self.module.entry_points[self.entry]
    }
}

/// Parses and validates WGSL for `stage`.
///
/// On failure returns the compiler log: the annotated parse or validation
/// error, or a note that the stage's entry point is missing.
pub(crate) fn compile(stage: ShaderStage, source: &str) -> Result<CompiledStage, String> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| e.emit_to_string(source))?;

    Validator::new(ValidationFlags::all(), Capabilities::empty())
        .validate(&module)
        .map_err(|e| e.emit_to_string(source))?;

    let wanted = stage.naga();
    let mut candidates = module
        .entry_points
        .iter()
        .enumerate()
        .filter(|(_, ep)| ep.stage == wanted)
        .map(|(i, _)| i);

    let Some(entry) = candidates.next() else {
        let attr = match stage {
            ShaderStage::Vertex => "@vertex",
            ShaderStage::Fragment => "@fragment",
        };
        return Err(format!("no {attr} entry point in source"));
    };
    if candidates.next().is_some() {
        log::debug!(
            "{stage} declares several entry points; using `{}`",
            module.entry_points[entry].name
        );
    }

    Ok(CompiledStage {
        stage,
        source: source.to_owned(),
        module,
        entry,
    })
}
