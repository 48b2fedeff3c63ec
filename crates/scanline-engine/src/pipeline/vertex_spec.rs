/// Per-vertex attribute streams fed to every program.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Attribute {
    /// Device-space corner, `vec4<f32>`.
    Vertex,
    /// Clip-space corner, `vec4<f32>`.
    Position,
    /// Texture coordinate, `vec2<f32>`.
    TexCoord,
}

impl Attribute {
    pub const ALL: [Attribute; 3] = [Attribute::Vertex, Attribute::Position, Attribute::TexCoord];

    /// Shader-side input name.
    pub fn name(self) -> &'static str {
        match self {
            Attribute::Vertex => "vertex",
            Attribute::Position => "position",
            Attribute::TexCoord => "texCoord",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.name() == name)
    }

    pub fn format(self) -> wgpu::VertexFormat {
        match self {
            Attribute::Vertex | Attribute::Position => wgpu::VertexFormat::Float32x4,
            Attribute::TexCoord => wgpu::VertexFormat::Float32x2,
        }
    }

    /// Byte size of one vertex's value.
    pub fn stride(self) -> u64 {
        self.format().size()
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Vertex-specification object: one buffer per [`Attribute`], sized for the
/// four corners of a quad.
pub(crate) struct VertexSpec {
    buffers: [wgpu::Buffer; 3],
}

impl VertexSpec {
    pub const VERTEX_COUNT: u32 = 4;

    pub fn new(device: &wgpu::Device) -> Self {
        let buffers = Attribute::ALL.map(|attr| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(match attr {
                    Attribute::Vertex => "scanline vertex vbo",
                    Attribute::Position => "scanline position vbo",
                    Attribute::TexCoord => "scanline texcoord vbo",
                }),
                size: attr.stride() * u64::from(Self::VERTEX_COUNT),
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        });
        Self { buffers }
    }

    pub fn buffer(&self, attr: Attribute) -> &wgpu::Buffer {
        &self.buffers[attr.index()]
    }

    pub fn destroy(self) {
        for b in self.buffers {
            b.destroy();
        }
    }
}
