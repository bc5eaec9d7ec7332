// Software image operations used by the pipeline stages.
// All of them take a frame by reference and return a freshly allocated one;
// samples are 8-bit and results saturate to 0..=255.

use crate::types::Frame;
use image::imageops;
use std::collections::VecDeque;

/// Fixed 3x3 Sobel taps: derivative [-1, 0, 1], smoothing [1, 2, 1].
const DERIV: [i32; 3] = [-1, 0, 1];
const SMOOTH: [i32; 3] = [1, 2, 1];

// Pre-tabulated kernels used for small sizes when sigma is derived from the size.
const SMALL_GAUSSIAN: [&[f32]; 4] = [
    &[1.0],
    &[0.25, 0.5, 0.25],
    &[0.0625, 0.25, 0.375, 0.25, 0.0625],
    &[0.03125, 0.109375, 0.21875, 0.28125, 0.21875, 0.109375, 0.03125],
];

#[inline]
fn saturate(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// Mirror an out-of-range index without repeating the edge sample: `gfedcb|abcdefgh|gfedcba`.
#[inline]
fn reflect_101(i: isize, n: usize) -> usize {
    if n == 1 {
        return 0;
    }
    let period = 2 * (n as isize - 1);
    let mut i = i.rem_euclid(period);
    if i >= n as isize {
        i = period - i;
    }
    i as usize
}

/// Clamp an out-of-range index to the nearest edge sample: `aaa|abcdefgh|hhh`.
#[inline]
fn replicate(i: isize, n: usize) -> usize {
    i.clamp(0, n as isize - 1) as usize
}

/// 1-D Gaussian weights for an odd `ksize`, normalized to sum 1.
pub fn gaussian_kernel(ksize: usize) -> Vec<f32> {
    if ksize % 2 == 1 && ksize <= 7 {
        return SMALL_GAUSSIAN[ksize / 2].to_vec();
    }
    let sigma = 0.3 * ((ksize as f64 - 1.0) * 0.5 - 1.0) + 0.8;
    let scale = -0.5 / (sigma * sigma);
    let half = (ksize as f64 - 1.0) * 0.5;
    let raw: Vec<f64> = (0..ksize)
        .map(|i| {
            let x = i as f64 - half;
            (scale * x * x).exp()
        })
        .collect();
    let sum: f64 = raw.iter().sum();
    raw.iter().map(|w| (w / sum) as f32).collect()
}

/// Separable Gaussian blur with a `ksize`×`ksize` kernel and mirrored borders.
pub fn gaussian_blur(src: &Frame, ksize: usize) -> Frame {
    let (w, h) = src.dimensions();
    let (w, h) = (w as usize, h as usize);
    let c = src.channels();
    let kernel = gaussian_kernel(ksize);
    let r = (kernel.len() / 2) as isize;
    let data = src.samples();

    /* ---- Pass 1: Horizontal (rows into a float scratch buffer) ---- */
    let mut tmp = vec![0.0f32; w * h * c];
    for y in 0..h {
        let row = y * w;
        for x in 0..w {
            for ch in 0..c {
                let mut acc = 0.0f32;
                for (k, weight) in kernel.iter().enumerate() {
                    let sx = reflect_101(x as isize + k as isize - r, w);
                    acc += weight * data[(row + sx) * c + ch] as f32;
                }
                tmp[(row + x) * c + ch] = acc;
            }
        }
    }

    /* ---- Pass 2: Vertical (scratch into the output frame) ---- */
    let mut out = src.blank_like(w as u32, h as u32);
    let dst = out.samples_mut();
    for y in 0..h {
        for x in 0..w {
            for ch in 0..c {
                let mut acc = 0.0f32;
                for (k, weight) in kernel.iter().enumerate() {
                    let sy = reflect_101(y as isize + k as isize - r, h);
                    acc += weight * tmp[(sy * w + x) * c + ch];
                }
                dst[(y * w + x) * c + ch] = saturate(acc);
            }
        }
    }
    out
}

/// Raw 3x3 Sobel responses (dx, dy) for every sample, unsaturated.
fn sobel_raw(src: &Frame, border: fn(isize, usize) -> usize) -> (Vec<i32>, Vec<i32>) {
    let (w, h) = src.dimensions();
    let (w, h) = (w as usize, h as usize);
    let c = src.channels();
    let data = src.samples();
    let mut gx = vec![0i32; w * h * c];
    let mut gy = vec![0i32; w * h * c];

    for y in 0..h {
        for x in 0..w {
            for ch in 0..c {
                let mut sx = 0i32;
                let mut sy = 0i32;
                for ky in 0..3 {
                    let yy = border(y as isize + ky as isize - 1, h);
                    for kx in 0..3 {
                        let xx = border(x as isize + kx as isize - 1, w);
                        let v = data[(yy * w + xx) * c + ch] as i32;
                        sx += DERIV[kx] * SMOOTH[ky] * v;
                        sy += SMOOTH[kx] * DERIV[ky] * v;
                    }
                }
                let idx = (y * w + x) * c + ch;
                gx[idx] = sx;
                gy[idx] = sy;
            }
        }
    }
    (gx, gy)
}

/// Gradient magnitude approximation: x and y Sobel responses saturated to
/// 8 bits, then averaged with equal weights.
pub fn sobel_gradient(src: &Frame) -> Frame {
    let (gx, gy) = sobel_raw(src, reflect_101);
    let mut out = src.blank_like(src.width(), src.height());
    for ((dst, &dx), &dy) in out.samples_mut().iter_mut().zip(&gx).zip(&gy) {
        let dx = dx.clamp(0, 255) as f32;
        let dy = dy.clamp(0, 255) as f32;
        *dst = saturate(0.5 * dx + 0.5 * dy);
    }
    out
}

/// Canny edge detector with L2 gradient magnitude and a 3x3 aperture.
/// For colour input every pixel takes the gradient of its strongest channel.
/// The result is a single-channel map of 0 and 255.
pub fn canny(src: &Frame, low: f32, high: f32) -> Frame {
    let (w, h) = src.dimensions();
    let (w, h) = (w as usize, h as usize);
    let c = src.channels();
    let (gx, gy) = sobel_raw(src, replicate);

    let mut dx = vec![0i32; w * h];
    let mut dy = vec![0i32; w * h];
    let mut mag = vec![0.0f32; w * h];
    for i in 0..w * h {
        let mut best = -1i64;
        for ch in 0..c {
            let (sx, sy) = (gx[i * c + ch], gy[i * c + ch]);
            let m = (sx as i64) * (sx as i64) + (sy as i64) * (sy as i64);
            if m > best {
                best = m;
                dx[i] = sx;
                dy[i] = sy;
            }
        }
        mag[i] = (best as f32).sqrt();
    }

    let at = |x: isize, y: isize| -> f32 {
        if x < 0 || y < 0 || x >= w as isize || y >= h as isize {
            0.0
        } else {
            mag[y as usize * w + x as usize]
        }
    };

    /* ---- Non-maximum suppression + double threshold ----
       0 = suppressed, 1 = weak candidate, 2 = strong edge. */
    const TAN_22_5: f32 = 0.414_213_57;
    const TAN_67_5: f32 = 2.414_213_6;
    let mut class = vec![0u8; w * h];
    let mut queue = VecDeque::new();
    for y in 0..h {
        for x in 0..w {
            let i = y * w + x;
            let m = mag[i];
            if m <= low {
                continue;
            }
            let (ax, ay) = (dx[i].abs() as f32, dy[i].abs() as f32);
            let (xi, yi) = (x as isize, y as isize);
            let is_max = if ay <= ax * TAN_22_5 {
                m > at(xi - 1, yi) && m >= at(xi + 1, yi)
            } else if ay > ax * TAN_67_5 {
                m > at(xi, yi - 1) && m >= at(xi, yi + 1)
            } else {
                let s: isize = if (dx[i] < 0) != (dy[i] < 0) { -1 } else { 1 };
                m > at(xi - s, yi - 1) && m > at(xi + s, yi + 1)
            };
            if !is_max {
                continue;
            }
            if m > high {
                class[i] = 2;
                queue.push_back(i);
            } else {
                class[i] = 1;
            }
        }
    }

    /* ---- Hysteresis: grow strong edges through 8-connected weak pixels ---- */
    while let Some(i) = queue.pop_front() {
        let (x, y) = ((i % w) as isize, (i / w) as isize);
        for ny in (y - 1)..=(y + 1) {
            for nx in (x - 1)..=(x + 1) {
                if nx < 0 || ny < 0 || nx >= w as isize || ny >= h as isize {
                    continue;
                }
                let j = ny as usize * w + nx as usize;
                if class[j] == 1 {
                    class[j] = 2;
                    queue.push_back(j);
                }
            }
        }
    }

    let mut out = Frame::blank(1, w as u32, h as u32);
    for (dst, &k) in out.samples_mut().iter_mut().zip(&class) {
        *dst = if k == 2 { 255 } else { 0 };
    }
    out
}

/// Per-sample `v * alpha + beta`, rounded and saturated.
pub fn convert_scale(src: &Frame, alpha: f32, beta: f32) -> Frame {
    let mut out = src.clone();
    for v in out.samples_mut() {
        *v = saturate(*v as f32 * alpha + beta);
    }
    out
}

/// Bilinear resize by independent x/y factors. Output size is the scaled size
/// rounded half to even (at least 1), so halving 5 gives 2 and halving 7 gives 4.
/// Sample centres are aligned between the grids.
pub fn resize_linear(src: &Frame, fx: f64, fy: f64) -> Frame {
    let (sw, sh) = src.dimensions();
    let dw = ((sw as f64 * fx).round_ties_even() as u32).max(1);
    let dh = ((sh as f64 * fy).round_ties_even() as u32).max(1);
    let (sw, sh) = (sw as usize, sh as usize);
    let c = src.channels();
    let data = src.samples();

    let taps = |d: usize, inv_scale: f64, n: usize| -> (usize, usize, f32) {
        let s = ((d as f64 + 0.5) * inv_scale - 0.5).max(0.0);
        let i0 = (s.floor() as usize).min(n - 1);
        let i1 = (i0 + 1).min(n - 1);
        (i0, i1, (s - i0 as f64).clamp(0.0, 1.0) as f32)
    };
    let xs: Vec<_> = (0..dw as usize).map(|d| taps(d, 1.0 / fx, sw)).collect();
    let ys: Vec<_> = (0..dh as usize).map(|d| taps(d, 1.0 / fy, sh)).collect();

    let mut out = src.blank_like(dw, dh);
    let dst = out.samples_mut();
    for (dy, &(y0, y1, ty)) in ys.iter().enumerate() {
        for (dx, &(x0, x1, tx)) in xs.iter().enumerate() {
            for ch in 0..c {
                let p = |x: usize, y: usize| data[(y * sw + x) * c + ch] as f32;
                let top = p(x0, y0) * (1.0 - tx) + p(x1, y0) * tx;
                let bottom = p(x0, y1) * (1.0 - tx) + p(x1, y1) * tx;
                dst[(dy * dw as usize + dx) * c + ch] = saturate(top * (1.0 - ty) + bottom * ty);
            }
        }
    }
    out
}

pub fn rotate_90_clockwise(src: &Frame) -> Frame {
    match src {
        Frame::Gray(img) => Frame::Gray(imageops::rotate90(img)),
        Frame::Color(img) => Frame::Color(imageops::rotate90(img)),
    }
}

/// Which axis a mirror flips around.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlipAxis {
    /// Around the horizontal axis: top row becomes bottom row.
    X,
    /// Around the vertical axis: left column becomes right column.
    Y,
    /// Both at once, in a single pass.
    Both,
}

pub fn flip(src: &Frame, axis: FlipAxis) -> Frame {
    match (src, axis) {
        (Frame::Gray(img), FlipAxis::X) => Frame::Gray(imageops::flip_vertical(img)),
        (Frame::Color(img), FlipAxis::X) => Frame::Color(imageops::flip_vertical(img)),
        (Frame::Gray(img), FlipAxis::Y) => Frame::Gray(imageops::flip_horizontal(img)),
        (Frame::Color(img), FlipAxis::Y) => Frame::Color(imageops::flip_horizontal(img)),
        // (x, y) -> (w-1-x, h-1-y)
        (Frame::Gray(img), FlipAxis::Both) => Frame::Gray(imageops::rotate180(img)),
        (Frame::Color(img), FlipAxis::Both) => Frame::Color(imageops::rotate180(img)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    fn gradient_gray(w: u32, h: u32) -> Frame {
        Frame::Gray(GrayImage::from_fn(w, h, |x, y| Luma([(x * 10 + y * 3) as u8])))
    }

    /// Left half black, right half white.
    fn step_gray(w: u32, h: u32) -> Frame {
        Frame::Gray(GrayImage::from_fn(w, h, |x, _| Luma([if x < w / 2 { 0 } else { 255 }])))
    }

    #[test]
    fn reflect_101_mirrors_without_repeating_edges() {
        let got: Vec<usize> = (-3..8).map(|i| reflect_101(i, 5)).collect();
        assert_eq!(got, vec![3, 2, 1, 0, 1, 2, 3, 4, 3, 2, 1]);
        assert_eq!(reflect_101(-7, 1), 0);
        assert_eq!(reflect_101(50, 2), 0);
    }

    #[test]
    fn kernels_sum_to_one() {
        for k in [1, 3, 5, 7, 9, 15, 101] {
            let kernel = gaussian_kernel(k);
            assert_eq!(kernel.len(), k);
            let sum: f32 = kernel.iter().sum();
            assert!((sum - 1.0).abs() < 1e-5, "k={k} sum={sum}");
        }
    }

    #[test]
    fn blur_keeps_uniform_fields_even_with_huge_kernels() {
        let src = Frame::filled(3, 10, 10, 128);
        assert_eq!(gaussian_blur(&src, 3), src);
        assert_eq!(gaussian_blur(&src, 31), src);
    }

    #[test]
    fn blur_smooths_a_single_spike() {
        let mut src = Frame::filled(1, 5, 5, 0);
        src.samples_mut()[12] = 160;
        let out = gaussian_blur(&src, 3);
        // 160 * 0.5 * 0.5 at the centre, 160 * 0.25 * 0.5 beside it.
        assert_eq!(out.samples()[12], 40);
        assert_eq!(out.samples()[11], 20);
        assert_eq!(out.samples()[6], 10);
        assert_eq!(out.samples()[0], 0);
    }

    #[test]
    fn sobel_of_a_flat_frame_is_black() {
        let out = sobel_gradient(&Frame::filled(3, 6, 4, 90));
        assert!(out.samples().iter().all(|&v| v == 0));
        assert_eq!(out.channels(), 3);
    }

    #[test]
    fn sobel_on_a_ramp() {
        // d/dx of 10*x is 80 through the 3x3 kernel; d/dy of 3*y is 24.
        let out = sobel_gradient(&gradient_gray(6, 6));
        let centre = out.samples()[2 * 6 + 2];
        assert_eq!(centre, 52);
    }

    #[test]
    fn canny_on_flat_frame_finds_nothing() {
        let out = canny(&Frame::filled(3, 8, 8, 200), 10.0, 30.0);
        assert_eq!(out.channels(), 1);
        assert!(out.samples().iter().all(|&v| v == 0));
    }

    #[test]
    fn canny_marks_a_vertical_step() {
        let out = canny(&step_gray(10, 6), 85.0, 255.0);
        assert_eq!(out.dimensions(), (10, 6));
        for y in 0..6usize {
            let row = &out.samples()[y * 10..(y + 1) * 10];
            let edges: Vec<usize> = (0..10).filter(|&x| row[x] == 255).collect();
            assert_eq!(edges, vec![4], "row {y}: {row:?}");
        }
    }

    #[test]
    fn canny_keeps_weak_edges_only_when_joined_to_strong_ones() {
        // x < 2: faint band (weak step at x = 1, nothing strong nearby).
        // x >= 6: bright block, 255 above row 4 and 235 below, so the
        // horizontal ridge on row 3 is weak but touches the strong step at x = 5.
        let src = Frame::Gray(GrayImage::from_fn(14, 8, |x, y| {
            Luma([match x {
                0..2 => 20,
                2..6 => 0,
                _ if y < 4 => 255,
                _ => 235,
            }])
        }));
        // Weak magnitude is 80: above low, not above high. The step at x = 5 is ~1000.
        let out = canny(&src, 200.0 / 3.0, 200.0);
        let at = |x: usize, y: usize| out.samples()[y * 14 + x];

        for y in 0..8 {
            assert_eq!(at(1, y), 0, "isolated weak ridge kept at row {y}");
        }
        for x in 7..14 {
            assert_eq!(at(x, 3), 255, "connected weak ridge dropped at x = {x}");
            assert_eq!(at(x, 4), 0);
        }
        for y in [0, 1, 2, 5, 6, 7] {
            assert_eq!(at(5, y), 255, "strong step missing at row {y}");
        }
    }

    #[test]
    fn canny_with_unreachable_threshold_is_empty() {
        let out = canny(&step_gray(10, 6), 4000.0, 12000.0);
        assert!(out.samples().iter().all(|&v| v == 0));
    }

    #[test]
    fn convert_scale_saturates() {
        let mut src = Frame::filled(1, 3, 1, 0);
        src.samples_mut().copy_from_slice(&[0, 100, 250]);
        assert_eq!(convert_scale(&src, 1.0, 10.0).samples(), &[10, 110, 255]);
        assert_eq!(convert_scale(&src, 1.5, 0.0).samples(), &[0, 150, 255]);
        assert_eq!(convert_scale(&src, -1.0, 255.0).samples(), &[255, 155, 5]);
    }

    #[test]
    fn half_width_averages_pixel_pairs() {
        let mut src = Frame::filled(1, 4, 1, 0);
        src.samples_mut().copy_from_slice(&[10, 20, 100, 200]);
        let out = resize_linear(&src, 0.5, 1.0);
        assert_eq!(out.dimensions(), (2, 1));
        assert_eq!(out.samples(), &[15, 150]);
    }

    #[test]
    fn resize_rounds_odd_sizes() {
        let out = resize_linear(&Frame::filled(3, 5, 7, 42), 1.0, 0.5);
        assert_eq!(out.dimensions(), (5, 4));
        assert!(out.samples().iter().all(|&v| v == 42));
        let out = resize_linear(&Frame::filled(1, 1, 1, 9), 0.5, 0.5);
        assert_eq!(out.dimensions(), (1, 1));
    }

    #[test]
    fn halving_rounds_ties_to_even() {
        let out = resize_linear(&Frame::filled(3, 5, 3, 42), 0.5, 1.0);
        assert_eq!(out.dimensions(), (2, 3));
        assert!(out.samples().iter().all(|&v| v == 42));
        let out = resize_linear(&Frame::filled(1, 4, 11, 7), 1.0, 0.5);
        assert_eq!(out.dimensions(), (4, 6));
        let out = resize_linear(&Frame::filled(1, 4, 9, 7), 1.0, 0.5);
        assert_eq!(out.dimensions(), (4, 4));
    }

    #[test]
    fn rotation_moves_top_left_to_top_right() {
        let src = gradient_gray(3, 2);
        let out = rotate_90_clockwise(&src);
        assert_eq!(out.dimensions(), (2, 3));
        let Frame::Gray(img) = &out else { panic!("expected gray") };
        // bottom-left (0,1) ends at top-left, top-left (0,0) ends at top-right
        assert_eq!(img.get_pixel(0, 0)[0], 3);
        assert_eq!(img.get_pixel(1, 0)[0], 0);
        assert_eq!(img.get_pixel(1, 2)[0], 20);
    }

    #[test]
    fn combined_flip_equals_two_single_flips() {
        let src = gradient_gray(5, 3);
        let both = flip(&src, FlipAxis::Both);
        let sequential = flip(&flip(&src, FlipAxis::X), FlipAxis::Y);
        assert_eq!(both, sequential);
        assert_ne!(both, src);
    }
}
