// Core frame type shared by the camera, the pipeline, the windows and the recorder.

use image::{DynamicImage, GrayImage, RgbImage};

/// One captured or processed picture, 8 bits per sample.
/// Gray frames carry one channel, colour frames three (R, G, B).
#[derive(Clone, Debug, PartialEq)]
pub enum Frame {
    Gray(GrayImage),
    Color(RgbImage),
}

// ITU-R BT.601 luma weights.
const LUMA_R: f32 = 0.299;
const LUMA_G: f32 = 0.587;
const LUMA_B: f32 = 0.114;

impl Frame {
    /// A zeroed frame with `channels` (1 or 3) samples per pixel.
    pub fn blank(channels: usize, width: u32, height: u32) -> Self {
        if channels == 1 {
            Frame::Gray(GrayImage::new(width, height))
        } else {
            Frame::Color(RgbImage::new(width, height))
        }
    }

    /// A zeroed frame with the same channel count as `self`.
    pub fn blank_like(&self, width: u32, height: u32) -> Self {
        Self::blank(self.channels(), width, height)
    }

    pub fn from_image(img: DynamicImage) -> Self {
        match img {
            DynamicImage::ImageLuma8(gray) => Frame::Gray(gray),
            other => Frame::Color(other.to_rgb8()),
        }
    }

    pub fn width(&self) -> u32 {
        self.dimensions().0
    }

    pub fn height(&self) -> u32 {
        self.dimensions().1
    }

    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Frame::Gray(img) => img.dimensions(),
            Frame::Color(img) => img.dimensions(),
        }
    }

    pub fn channels(&self) -> usize {
        match self {
            Frame::Gray(_) => 1,
            Frame::Color(_) => 3,
        }
    }

    pub fn is_color(&self) -> bool {
        matches!(self, Frame::Color(_))
    }

    pub fn is_empty(&self) -> bool {
        let (w, h) = self.dimensions();
        w == 0 || h == 0
    }

    /// Interleaved samples, row-major.
    pub fn samples(&self) -> &[u8] {
        match self {
            Frame::Gray(img) => img.as_raw(),
            Frame::Color(img) => img.as_raw(),
        }
    }

    pub fn samples_mut(&mut self) -> &mut [u8] {
        match self {
            Frame::Gray(img) => &mut **img,
            Frame::Color(img) => &mut **img,
        }
    }

    /// Replicate a gray frame into three channels; colour frames pass through.
    pub fn into_color(self) -> Frame {
        match self {
            Frame::Color(_) => self,
            Frame::Gray(gray) => {
                let (w, h) = gray.dimensions();
                let mut out = RgbImage::new(w, h);
                let rgb: &mut [u8] = &mut out;
                for (dst, &v) in rgb.chunks_exact_mut(3).zip(gray.as_raw()) {
                    dst.fill(v);
                }
                Frame::Color(out)
            }
        }
    }

    /// Luminance of a colour frame; gray frames pass through.
    pub fn into_gray(self) -> Frame {
        match self {
            Frame::Gray(_) => self,
            Frame::Color(rgb) => {
                let (w, h) = rgb.dimensions();
                let mut out = GrayImage::new(w, h);
                let luma: &mut [u8] = &mut out;
                for (dst, px) in luma.iter_mut().zip(rgb.as_raw().chunks_exact(3)) {
                    let y = LUMA_R * px[0] as f32 + LUMA_G * px[1] as f32 + LUMA_B * px[2] as f32;
                    *dst = y.round().clamp(0.0, 255.0) as u8;
                }
                Frame::Gray(out)
            }
        }
    }

    /// Pack into 0x00RRGGBB words, the layout minifb expects.
    pub fn to_0rgb(&self) -> Vec<u32> {
        match self {
            Frame::Gray(img) => img
                .as_raw()
                .iter()
                .map(|&v| {
                    let v = v as u32;
                    (v << 16) | (v << 8) | v
                })
                .collect(),
            Frame::Color(img) => img
                .as_raw()
                .chunks_exact(3)
                .map(|p| ((p[0] as u32) << 16) | ((p[1] as u32) << 8) | p[2] as u32)
                .collect(),
        }
    }

    #[cfg(test)]
    pub fn filled(channels: usize, width: u32, height: u32, value: u8) -> Self {
        let mut frame = Self::blank(channels, width, height);
        frame.samples_mut().fill(value);
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gray_expands_to_three_equal_channels() {
        let mut gray = GrayImage::new(2, 1);
        gray.put_pixel(0, 0, image::Luma([7]));
        gray.put_pixel(1, 0, image::Luma([200]));
        let color = Frame::Gray(gray).into_color();
        assert!(color.is_color());
        assert_eq!(color.samples(), &[7, 7, 7, 200, 200, 200]);
    }

    #[test]
    fn luminance_uses_bt601_weights() {
        let mut rgb = RgbImage::new(3, 1);
        rgb.put_pixel(0, 0, image::Rgb([255, 0, 0]));
        rgb.put_pixel(1, 0, image::Rgb([0, 255, 0]));
        rgb.put_pixel(2, 0, image::Rgb([0, 0, 255]));
        let gray = Frame::Color(rgb).into_gray();
        assert_eq!(gray.channels(), 1);
        assert_eq!(gray.samples(), &[76, 150, 29]);
    }

    #[test]
    fn packs_pixels_for_the_window() {
        let mut rgb = RgbImage::new(1, 1);
        rgb.put_pixel(0, 0, image::Rgb([0x12, 0x34, 0x56]));
        assert_eq!(Frame::Color(rgb).to_0rgb(), vec![0x0012_3456]);
        assert_eq!(Frame::filled(1, 1, 1, 0xAB).to_0rgb(), vec![0x00AB_ABAB]);
    }

    #[test]
    fn luma_images_stay_single_channel() {
        let frame = Frame::from_image(DynamicImage::ImageLuma8(GrayImage::new(4, 2)));
        assert_eq!(frame.channels(), 1);
        assert_eq!(frame.dimensions(), (4, 2));
        let frame = Frame::from_image(DynamicImage::ImageRgba8(image::RgbaImage::new(4, 2)));
        assert_eq!(frame.channels(), 3);
    }
}
