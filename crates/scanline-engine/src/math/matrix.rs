/// Row-major 4×4 matrix.
pub type Mat4 = [f32; 16];

/// Homogeneous row vector.
pub type Vec4 = [f32; 4];

pub const IDENTITY4: Mat4 = [
    1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0, //
];

/// Writes the product `A × B` into `output`.
///
/// `a` is `a_rows × a_cols`, `b` is `b_rows × b_cols`, both row-major.
/// `output` receives `a_rows × b_cols` values.
///
/// Non-conformant shapes (`a_cols != b_rows`) leave `output` untouched.
/// Slices too short for the declared shapes are treated the same way.
pub fn multiply(
    output: &mut [f32],
    a: &[f32],
    a_rows: usize,
    a_cols: usize,
    b: &[f32],
    b_rows: usize,
    b_cols: usize,
) {
    if a_cols != b_rows {
        return;
    }
    if a.len() < a_rows * a_cols || b.len() < b_rows * b_cols || output.len() < a_rows * b_cols {
        return;
    }

    for row in 0..a_rows {
        for col in 0..b_cols {
            let mut sum = 0.0f32;
            for k in 0..a_cols {
                sum += a[row * a_cols + k] * b[k * b_cols + col];
            }
            output[row * b_cols + col] = sum;
        }
    }
}

/// Orthographic projection mapping `[0, width] × [0, height]` to `[-1, 1]²`.
///
/// Y is not flipped (device y = 0 lands on clip y = -1). Z is scaled by -1 and
/// no depth range is used.
pub fn ortho_projection(width: f32, height: f32) -> Mat4 {
    [
        2.0 / width, 0.0, 0.0, 0.0, //
        0.0, 2.0 / height, 0.0, 0.0, //
        0.0, 0.0, -1.0, 0.0, //
        -1.0, -1.0, 0.0, 1.0, //
    ]
}

/// Transforms a row vector: `v × m`.
pub fn transform_row(v: &Vec4, m: &Mat4) -> Vec4 {
    let mut out = [0.0f32; 4];
    multiply(&mut out, v, 1, 4, m, 4, 4);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const SENTINEL: f32 = -7777.0;

    fn approx(a: &[f32], b: &[f32]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-5)
    }

    // ── conformant products ──────────────────────────────────────────────

    #[test]
    fn multiply_2x3_by_3x2() {
        let a = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let b = [7.0, 8.0, 9.0, 10.0, 11.0, 12.0];
        let mut out = [0.0; 4];
        multiply(&mut out, &a, 2, 3, &b, 3, 2);
        assert_eq!(out, [58.0, 64.0, 139.0, 154.0]);
    }

    #[test]
    fn multiply_row_vector_by_matrix() {
        let v = [1.0, 2.0, 3.0];
        let m = [1.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        let mut out = [0.0; 2];
        multiply(&mut out, &v, 1, 3, &m, 3, 2);
        assert_eq!(out, [4.0, 5.0]);
    }

    #[test]
    fn multiply_column_vector_produces_outer_product() {
        let a = [1.0, 2.0];
        let b = [3.0, 4.0, 5.0];
        let mut out = [0.0; 6];
        multiply(&mut out, &a, 2, 1, &b, 1, 3);
        assert_eq!(out, [3.0, 4.0, 5.0, 6.0, 8.0, 10.0]);
    }

    #[test]
    fn identity_on_either_side_is_neutral() {
        let m: Mat4 = [
            1.5, -2.0, 0.25, 4.0, //
            9.0, 8.0, 7.0, 6.0, //
            -1.0, 0.0, 3.5, 2.0, //
            0.5, 0.5, -0.5, 1.0, //
        ];
        let mut left = [0.0; 16];
        multiply(&mut left, &IDENTITY4, 4, 4, &m, 4, 4);
        assert_eq!(left, m);

        let mut right = [0.0; 16];
        multiply(&mut right, &m, 4, 4, &IDENTITY4, 4, 4);
        assert_eq!(right, m);
    }

    #[test]
    fn only_the_product_region_is_written() {
        let a = [2.0];
        let b = [3.0];
        let mut out = [SENTINEL; 3];
        multiply(&mut out, &a, 1, 1, &b, 1, 1);
        assert_eq!(out, [6.0, SENTINEL, SENTINEL]);
    }

    // ── non-conformant shapes ────────────────────────────────────────────

    #[test]
    fn non_conformant_leaves_output_untouched() {
        let a = [1.0; 6];
        let b = [1.0; 6];
        let mut out = [SENTINEL; 9];
        multiply(&mut out, &a, 2, 3, &b, 2, 3);
        assert!(out.iter().all(|&v| v == SENTINEL));

        let mut out = [SENTINEL; 16];
        multiply(&mut out, &IDENTITY4, 4, 4, &IDENTITY4, 3, 4);
        assert!(out.iter().all(|&v| v == SENTINEL));
    }

    #[test]
    fn undersized_slices_are_a_noop() {
        let mut out = [SENTINEL; 2];
        multiply(&mut out, &IDENTITY4, 4, 4, &IDENTITY4, 4, 4);
        assert_eq!(out, [SENTINEL; 2]);
    }

    // ── projection ───────────────────────────────────────────────────────

    #[test]
    fn ortho_maps_corners_to_clip_space() {
        let p = ortho_projection(480.0, 270.0);
        assert!(approx(&transform_row(&[0.0, 0.0, 0.0, 1.0], &p), &[-1.0, -1.0, 0.0, 1.0]));
        assert!(approx(&transform_row(&[480.0, 0.0, 0.0, 1.0], &p), &[1.0, -1.0, 0.0, 1.0]));
        assert!(approx(&transform_row(&[0.0, 270.0, 0.0, 1.0], &p), &[-1.0, 1.0, 0.0, 1.0]));
        assert!(approx(&transform_row(&[480.0, 270.0, 0.0, 1.0], &p), &[1.0, 1.0, 0.0, 1.0]));
    }

    #[test]
    fn ortho_flips_z() {
        let p = ortho_projection(10.0, 10.0);
        let v = transform_row(&[5.0, 5.0, 0.5, 1.0], &p);
        assert!(approx(&v, &[0.0, 0.0, -0.5, 1.0]));
    }
}
