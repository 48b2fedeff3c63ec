//! Name-based lookups over a compiled naga module.

use naga::{AddressSpace, Binding, Handle, ImageClass, ImageDimension, ScalarKind, TypeInner};

/// A user-defined stage input or output (`@location(n)`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Varying {
    pub name: String,
    pub location: u32,
    /// Structural type, comparable across modules (e.g. `vec4<f32>`).
    pub ty: String,
    pub float: bool,
}

/// A value addressable by name inside a uniform block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct UniformField {
    pub name: String,
    pub offset: u32,
    pub size: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ResourceKind {
    Uniform { size: u64, fields: Vec<UniformField> },
    Texture,
    Sampler,
}

impl ResourceKind {
    pub fn describe(&self) -> &'static str {
        match self {
            ResourceKind::Uniform { .. } => "uniform block",
            ResourceKind::Texture => "texture",
            ResourceKind::Sampler => "sampler",
        }
    }
}

/// A bound global (`@group(g) @binding(b)`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Resource {
    pub name: String,
    pub group: u32,
    pub binding: u32,
    pub kind: ResourceKind,
}

/// Location inputs of `ep`, flattening struct arguments.
pub(crate) fn inputs(module: &naga::Module, ep: &naga::EntryPoint) -> Vec<Varying> {
    let mut out = Vec::new();
    for arg in &ep.function.arguments {
        collect_varyings(
            module,
            arg.name.as_deref(),
            arg.ty,
            arg.binding.as_ref(),
            &mut out,
        );
    }
    out
}

/// Location outputs of `ep`. A plain (non-struct) result has an empty name.
pub(crate) fn outputs(module: &naga::Module, ep: &naga::EntryPoint) -> Vec<Varying> {
    let mut out = Vec::new();
    if let Some(result) = ep.function.result.as_ref() {
        collect_varyings(module, None, result.ty, result.binding.as_ref(), &mut out);
    }
    out
}

fn collect_varyings(
    module: &naga::Module,
    name: Option<&str>,
    ty: Handle<naga::Type>,
    binding: Option<&Binding>,
    out: &mut Vec<Varying>,
) {
    match binding {
        Some(Binding::Location { location, .. }) => out.push(Varying {
            name: name.unwrap_or_default().to_owned(),
            location: *location,
            ty: type_signature(module, ty),
            float: is_float(module, ty),
        }),
        Some(Binding::BuiltIn(_)) => {}
        None => {
            if let TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for m in members {
                    collect_varyings(module, m.name.as_deref(), m.ty, m.binding.as_ref(), out);
                }
            }
        }
    }
}

/// Every global with a resource binding, in declaration order.
///
/// Returns a description of the first binding that cannot be expressed by
/// the pipeline (storage buffers, depth or storage textures, ...).
pub(crate) fn resources(module: &naga::Module) -> Result<Vec<Resource>, String> {
    let mut out = Vec::new();
    for (_, var) in module.global_variables.iter() {
        let Some(rb) = var.binding.as_ref() else { continue };
        let name = var.name.clone().unwrap_or_default();
        let inner = &module.types[var.ty].inner;

        let kind = match (var.space, inner) {
            (AddressSpace::Uniform, _) => ResourceKind::Uniform {
                size: u64::from(inner.size(module.to_ctx())),
                fields: uniform_fields(module, &name, var.ty),
            },
            (
                AddressSpace::Handle,
                TypeInner::Image {
                    dim: ImageDimension::D2,
                    arrayed: false,
                    class:
                        ImageClass::Sampled {
                            kind: ScalarKind::Float,
                            multi: false,
                        },
                },
            ) => ResourceKind::Texture,
            (AddressSpace::Handle, TypeInner::Sampler { comparison: false }) => {
                ResourceKind::Sampler
            }
            _ => {
                return Err(format!(
                    "resource `{name}` (group {}, binding {}) has unsupported type {}",
                    rb.group,
                    rb.binding,
                    type_signature(module, var.ty)
                ));
            }
        };

        out.push(Resource {
            name,
            group: rb.group,
            binding: rb.binding,
            kind,
        });
    }
    Ok(out)
}

/// Addressable members of a uniform block.
///
/// Struct members are named by member name; array members additionally get
/// `name[i]` entries, with the bare name aliasing element 0. A non-struct
/// block is addressed by the global's own name.
fn uniform_fields(module: &naga::Module, global: &str, ty: Handle<naga::Type>) -> Vec<UniformField> {
    let mut out = Vec::new();
    match &module.types[ty].inner {
        TypeInner::Struct { members, .. } => {
            for m in members {
                let Some(name) = m.name.as_deref() else { continue };
                push_field(module, name, m.offset, m.ty, &mut out);
            }
        }
        _ => push_field(module, global, 0, ty, &mut out),
    }
    out
}

fn push_field(
    module: &naga::Module,
    name: &str,
    offset: u32,
    ty: Handle<naga::Type>,
    out: &mut Vec<UniformField>,
) {
    let inner = &module.types[ty].inner;
    if let TypeInner::Array {
        base,
        size: naga::ArraySize::Constant(count),
        stride,
    } = inner
    {
        let elem = module.types[*base].inner.size(module.to_ctx());
        out.push(UniformField {
            name: name.to_owned(),
            offset,
            size: elem,
        });
        for i in 0..count.get() {
            out.push(UniformField {
                name: format!("{name}[{i}]"),
                offset: offset + i * stride,
                size: elem,
            });
        }
        return;
    }

    out.push(UniformField {
        name: name.to_owned(),
        offset,
        size: inner.size(module.to_ctx()),
    });
}

fn is_float(module: &naga::Module, ty: Handle<naga::Type>) -> bool {
    match &module.types[ty].inner {
        TypeInner::Scalar(s) | TypeInner::Vector { scalar: s, .. } => s.kind == ScalarKind::Float,
        _ => false,
    }
}

/// Human readable, module-independent spelling of a type.
pub(crate) fn type_signature(module: &naga::Module, ty: Handle<naga::Type>) -> String {
    fn scalar(s: naga::Scalar) -> String {
        let prefix = match s.kind {
            ScalarKind::Float => "f",
            ScalarKind::Sint => "i",
            ScalarKind::Uint => "u",
            ScalarKind::Bool => return "bool".to_owned(),
            _ => "?",
        };
        format!("{prefix}{}", u32::from(s.width) * 8)
    }

    match &module.types[ty].inner {
        TypeInner::Scalar(s) => scalar(*s),
        TypeInner::Vector { size, scalar: s } => format!("vec{}<{}>", *size as u8, scalar(*s)),
        TypeInner::Matrix {
            columns,
            rows,
            scalar: s,
        } => format!("mat{}x{}<{}>", *columns as u8, *rows as u8, scalar(*s)),
        TypeInner::Array { base, size, .. } => match size {
            naga::ArraySize::Constant(n) => {
                format!("array<{}, {n}>", type_signature(module, *base))
            }
            _ => format!("array<{}>", type_signature(module, *base)),
        },
        TypeInner::Struct { .. } => module.types[ty]
            .name
            .clone()
            .unwrap_or_else(|| "struct".to_owned()),
        TypeInner::Image { .. } => "texture".to_owned(),
        TypeInner::Sampler { .. } => "sampler".to_owned(),
        other => format!("{other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> naga::Module {
        naga::front::wgsl::parse_str(src).unwrap()
    }

    const BLOCK: &str = r#"
        struct Params {
            modelView: mat4x4<f32>,
            targetSize: vec4<f32>,
            sourceSize: array<vec4<f32>, 2>,
        };
        @group(0) @binding(0) var<uniform> params: Params;
        @group(0) @binding(1) var source: texture_2d<f32>;
        @group(0) @binding(2) var sourceSampler: sampler;

        struct VsIn {
            @location(0) vertex: vec4<f32>,
            @location(2) texCoord: vec2<f32>,
        };
        struct VsOut {
            @builtin(position) pos: vec4<f32>,
            @location(0) uv: vec2<f32>,
        };

        @vertex fn vs(in: VsIn, @location(1) position: vec4<f32>) -> VsOut {
            var out: VsOut;
            out.pos = position;
            out.uv = in.texCoord;
            return out;
        }
    "#;

    // ── varyings ─────────────────────────────────────────────────────────

    #[test]
    fn inputs_flatten_structs_and_keep_plain_arguments() {
        let m = parse(BLOCK);
        let ins = inputs(&m, &m.entry_points[0]);
        let names: Vec<_> = ins.iter().map(|v| (v.name.as_str(), v.location)).collect();
        assert_eq!(names, [("vertex", 0), ("texCoord", 2), ("position", 1)]);
        assert_eq!(ins[1].ty, "vec2<f32>");
        assert!(ins.iter().all(|v| v.float));
    }

    #[test]
    fn outputs_skip_builtins() {
        let m = parse(BLOCK);
        let outs = outputs(&m, &m.entry_points[0]);
        assert_eq!(outs.len(), 1);
        assert_eq!(outs[0].name, "uv");
        assert_eq!(outs[0].location, 0);
    }

    // ── resources ────────────────────────────────────────────────────────

    #[test]
    fn uniform_block_members_are_addressable() {
        let m = parse(BLOCK);
        let res = resources(&m).unwrap();
        assert_eq!(res.len(), 3);

        let ResourceKind::Uniform { size, fields } = &res[0].kind else {
            panic!("expected uniform block, got {:?}", res[0].kind);
        };
        assert_eq!(*size, 64 + 16 + 32);

        let find = |n: &str| fields.iter().find(|f| f.name == n).cloned();
        assert_eq!(find("modelView").map(|f| (f.offset, f.size)), Some((0, 64)));
        assert_eq!(find("targetSize").map(|f| f.offset), Some(64));
        assert_eq!(find("sourceSize").map(|f| f.offset), Some(80));
        assert_eq!(find("sourceSize[0]").map(|f| f.offset), Some(80));
        assert_eq!(find("sourceSize[1]").map(|f| (f.offset, f.size)), Some((96, 16)));
        assert!(find("sourceSize[2]").is_none());
    }

    #[test]
    fn texture_and_sampler_are_recognised() {
        let m = parse(BLOCK);
        let res = resources(&m).unwrap();
        assert_eq!((res[1].name.as_str(), &res[1].kind), ("source", &ResourceKind::Texture));
        assert_eq!((res[2].name.as_str(), res[2].binding), ("sourceSampler", 2));
        assert_eq!(res[2].kind, ResourceKind::Sampler);
    }

    #[test]
    fn bare_uniform_uses_global_name() {
        let m = parse("@group(0) @binding(3) var<uniform> targetSize: vec4<f32>;");
        let res = resources(&m).unwrap();
        let ResourceKind::Uniform { fields, .. } = &res[0].kind else { panic!() };
        assert_eq!(fields[0].name, "targetSize");
        assert_eq!((fields[0].offset, fields[0].size), (0, 16));
    }

    #[test]
    fn storage_buffer_is_rejected() {
        let m = parse("@group(0) @binding(0) var<storage, read> data: array<f32>;");
        let err = resources(&m).unwrap_err();
        assert!(err.contains("data"), "{err}");
    }
}
