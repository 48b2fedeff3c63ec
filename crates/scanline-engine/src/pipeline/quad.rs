use crate::math::{self, Mat4, Vec4, IDENTITY4};

/// Geometry and uniform values for one full-viewport draw.
///
/// Corners are ordered for a triangle strip: `(0,0)`, `(w,0)`, `(0,h)`,
/// `(w,h)` in target pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct QuadGeometry {
    pub model_view: Mat4,
    pub projection: Mat4,
    pub model_view_projection: Mat4,
    /// Device-space corners (homogeneous).
    pub vertices: [Vec4; 4],
    /// `vertices` transformed by `model_view_projection`.
    pub positions: [Vec4; 4],
    pub tex_coords: [[f32; 2]; 4],
    /// `(w, h, 1/w, 1/h)` of the target rectangle.
    pub target_size: Vec4,
    /// Same as `target_size`; the viewport is the whole output.
    pub output_size: Vec4,
    /// `(w, h, 1/w, 1/h)` of the source image.
    pub source_size: Vec4,
}

impl QuadGeometry {
    pub fn new(source_width: u32, source_height: u32, target_width: u32, target_height: u32) -> Self {
        Self::cropped(
            source_width,
            source_height,
            target_width,
            target_height,
            target_width,
            target_height,
        )
    }

    /// Like [`QuadGeometry::new`] for a viewport showing only the top-left
    /// `visible_width × visible_height` pixels of the target rectangle.
    ///
    /// The projection keeps one target pixel per viewport pixel, so the part
    /// of the quad outside the viewport is clipped rather than squeezed in.
    pub fn cropped(
        source_width: u32,
        source_height: u32,
        target_width: u32,
        target_height: u32,
        visible_width: u32,
        visible_height: u32,
    ) -> Self {
        let (sw, sh) = (source_width as f32, source_height as f32);
        let (tw, th) = (target_width as f32, target_height as f32);

        let model_view = IDENTITY4;
        let mut projection = [0.0f32; 16];
        math::multiply(
            &mut projection,
            &math::ortho_projection(tw, th),
            4,
            4,
            &crop(tw / visible_width as f32, th / visible_height as f32),
            4,
            4,
        );
        let mut model_view_projection = [0.0f32; 16];
        math::multiply(&mut model_view_projection, &model_view, 4, 4, &projection, 4, 4);

        let vertices = [
            [0.0, 0.0, 0.0, 1.0],
            [tw, 0.0, 0.0, 1.0],
            [0.0, th, 0.0, 1.0],
            [tw, th, 0.0, 1.0],
        ];

        let mut positions = [[0.0f32; 4]; 4];
        for (out, v) in positions.iter_mut().zip(&vertices) {
            math::multiply(out, v, 1, 4, &model_view_projection, 4, 4);
        }

        // Source extent over texture extent. The texture is the source, so
        // this is 1 and the quad samples the whole image.
        let u = sw / sw;
        let v = sh / sh;
        let tex_coords = [[0.0, 0.0], [u, 0.0], [0.0, v], [u, v]];

        let target_size = size_vec(tw, th);
        Self {
            model_view,
            projection,
            model_view_projection,
            vertices,
            positions,
            tex_coords,
            target_size,
            output_size: target_size,
            source_size: size_vec(sw, sh),
        }
    }
}

/// Rescales clip space about its top-left corner (`x = -1`, `y = 1`).
fn crop(sx: f32, sy: f32) -> Mat4 {
    [
        sx, 0.0, 0.0, 0.0, //
        0.0, sy, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, //
        sx - 1.0, 1.0 - sy, 0.0, 1.0, //
    ]
}

fn size_vec(w: f32, h: f32) -> Vec4 {
    [w, h, 1.0 / w, 1.0 / h]
}
