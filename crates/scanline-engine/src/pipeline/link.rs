use super::reflect::{self, Resource, ResourceKind};
use super::stage::CompiledStage;
use super::vertex_spec::Attribute;

/// Name of the fragment output written to the color attachment.
pub(crate) const FRAG_COLOR: &str = "fragColor";

/// Everything needed to build the GPU pipeline for two compiled stages.
#[derive(Debug)]
pub(crate) struct LinkPlan {
    /// Resources of both stages, merged by binding number.
    pub resources: Vec<LinkedResource>,
    /// Attributes the vertex stage consumes, with their shader locations.
    pub attributes: Vec<(Attribute, u32)>,
    /// Color attachment slot of `fragColor`.
    pub color_location: u32,
}

#[derive(Debug)]
pub(crate) struct LinkedResource {
    pub resource: Resource,
    pub visibility: wgpu::ShaderStages,
}

/// Checks that `vs` and `fs` form a usable program on a device with
/// `limits`.
///
/// Errors collect every problem found, one per line, like a linker log.
pub(crate) fn link(
    vs: &CompiledStage,
    fs: &CompiledStage,
    limits: &wgpu::Limits,
) -> Result<LinkPlan, String> {
    let mut log = Vec::new();

    let attributes = vertex_attributes(vs, limits, &mut log);
    check_interface(vs, fs, &mut log);
    let color_location = color_output(fs, limits, &mut log);
    let resources = merge_resources(&[vs, fs], &mut log);

    if !log.is_empty() {
        return Err(log.join("\n"));
    }

    Ok(LinkPlan {
        resources,
        attributes,
        color_location: color_location.unwrap_or(0),
    })
}

fn vertex_attributes(
    vs: &CompiledStage,
    limits: &wgpu::Limits,
    log: &mut Vec<String>,
) -> Vec<(Attribute, u32)> {
    let mut out = Vec::new();
    for input in reflect::inputs(&vs.module, vs.entry_point()) {
        if input.location >= limits.max_vertex_attributes {
            log.push(format!(
                "vertex input `{}` at location {} exceeds the device limit of {} attributes",
                input.name, input.location, limits.max_vertex_attributes
            ));
            continue;
        }
        match Attribute::from_name(&input.name) {
            Some(attr) if input.float => out.push((attr, input.location)),
            Some(attr) => log.push(format!(
                "vertex input `{}` must be floating point, found {}",
                attr.name(),
                input.ty
            )),
            None => log.push(format!(
                "vertex input `{}` at location {} has no attribute stream",
                input.name, input.location
            )),
        }
    }
    out
}

fn check_interface(vs: &CompiledStage, fs: &CompiledStage, log: &mut Vec<String>) {
    let outputs = reflect::outputs(&vs.module, vs.entry_point());
    for input in reflect::inputs(&fs.module, fs.entry_point()) {
        match outputs.iter().find(|o| o.location == input.location) {
            None => log.push(format!(
                "fragment input `{}` at location {} is not written by the vertex shader",
                input.name, input.location
            )),
            Some(o) if o.ty != input.ty => log.push(format!(
                "fragment input `{}` at location {} is {}, but the vertex shader writes {}",
                input.name, input.location, input.ty, o.ty
            )),
            Some(_) => {}
        }
    }
}

fn color_output(fs: &CompiledStage, limits: &wgpu::Limits, log: &mut Vec<String>) -> Option<u32> {
    let outputs = reflect::outputs(&fs.module, fs.entry_point());
    let found = outputs
        .iter()
        .find(|o| o.name == FRAG_COLOR)
        .or_else(|| match outputs.as_slice() {
            [single] if single.name.is_empty() => Some(single),
            _ => None,
        });

    let Some(o) = found else {
        log.push(format!("fragment output `{FRAG_COLOR}` not found"));
        return None;
    };
    if !o.float {
        log.push(format!(
            "fragment output `{FRAG_COLOR}` must be floating point, found {}",
            o.ty
        ));
        return None;
    }
    if o.location >= limits.max_color_attachments {
        log.push(format!(
            "fragment output `{FRAG_COLOR}` at location {} exceeds the device limit of {} color attachments",
            o.location, limits.max_color_attachments
        ));
        return None;
    }
    Some(o.location)
}

fn merge_resources(stages: &[&CompiledStage], log: &mut Vec<String>) -> Vec<LinkedResource> {
    let mut merged: Vec<LinkedResource> = Vec::new();

    for stage in stages {
        let found = match reflect::resources(&stage.module) {
            Ok(r) => r,
            Err(e) => {
                log.push(format!("{}: {e}", stage.stage));
                continue;
            }
        };

        for res in found {
            if res.group != 0 {
                log.push(format!(
                    "{}: resource `{}` uses group {}; only group 0 is supported",
                    stage.stage, res.name, res.group
                ));
                continue;
            }

            let Some(existing) = merged
                .iter_mut()
                .find(|m| m.resource.binding == res.binding)
            else {
                merged.push(LinkedResource {
                    resource: res,
                    visibility: stage.stage.visibility(),
                });
                continue;
            };

            match (&mut existing.resource.kind, res.kind) {
                (ResourceKind::Texture, ResourceKind::Texture)
                | (ResourceKind::Sampler, ResourceKind::Sampler) => {}
                (
                    ResourceKind::Uniform { size, fields },
                    ResourceKind::Uniform {
                        size: other_size,
                        fields: other_fields,
                    },
                ) => {
                    *size = (*size).max(other_size);
                    for f in other_fields {
                        match fields.iter().find(|e| e.name == f.name) {
                            None => fields.push(f),
                            Some(e) if (e.offset, e.size) != (f.offset, f.size) => {
                                log.push(format!(
                                    "uniform `{}` has a different layout in each stage",
                                    f.name
                                ));
                            }
                            Some(_) => {}
                        }
                    }
                }
                (kind, other) => {
                    log.push(format!(
                        "binding {} is a {} in one stage and a {} in the other",
                        res.binding,
                        kind.describe(),
                        other.describe()
                    ));
                    continue;
                }
            }
            existing.visibility |= stage.stage.visibility();
        }
    }

    merged.sort_by_key(|m| m.resource.binding);
    merged
}
