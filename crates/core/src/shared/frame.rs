use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, GrayImage, ImageResult, Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use ndarray::{s, ArrayView3};

use crate::shared::face_box::FaceBox;

/// JPEG quality used for every uploaded image.
pub const JPEG_QUALITY: u8 = 90;

const ANNOTATION_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

/// A single camera frame: contiguous pixel bytes in row-major order.
///
/// `channels` is 3 for RGB and 1 for grayscale. `index` is the acquisition
/// tick that produced the frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
        }
    }

    pub fn from_rgb_image(image: RgbImage, index: usize) -> Self {
        let (width, height) = image.dimensions();
        Self::new(image.into_raw(), width, height, 3, index)
    }

    pub fn from_gray_image(image: GrayImage, index: usize) -> Self {
        let (width, height) = image.dimensions();
        Self::new(image.into_raw(), width, height, 1, index)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_grayscale(&self) -> bool {
        self.channels == 1
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    /// Left-right mirror, the display convention for a front camera.
    pub fn mirrored(&self) -> Frame {
        let data = self
            .as_ndarray()
            .slice(s![.., ..;-1, ..])
            .iter()
            .copied()
            .collect();
        Frame::new(data, self.width, self.height, self.channels, self.index)
    }

    pub fn to_grayscale(&self) -> Frame {
        if self.is_grayscale() {
            return self.clone();
        }
        let gray = image::imageops::grayscale(&self.to_rgb_image());
        Frame::from_gray_image(gray, self.index)
    }

    /// Copies out the pixels under `face`, clamped to the frame.
    ///
    /// Returns `None` when the clamped box is empty.
    pub fn crop(&self, face: &FaceBox) -> Option<Frame> {
        let b = face.clamp_to(self.width, self.height)?;
        let (x, y) = (b.x as usize, b.y as usize);
        let (w, h) = (b.width as usize, b.height as usize);
        let data = self
            .as_ndarray()
            .slice(s![y..y + h, x..x + w, ..])
            .iter()
            .copied()
            .collect();
        Some(Frame::new(
            data,
            w as u32,
            h as u32,
            self.channels,
            self.index,
        ))
    }

    /// Draws a 2px green rectangle around `face`.
    ///
    /// Grayscale frames are promoted to RGB so the annotation stays visible.
    pub fn annotated(&self, face: &FaceBox) -> Frame {
        let mut rgb = self.to_rgb_image();
        if let Some(b) = face.clamp_to(self.width, self.height) {
            draw_hollow_rect_mut(
                &mut rgb,
                Rect::at(b.x, b.y).of_size(b.width as u32, b.height as u32),
                ANNOTATION_COLOR,
            );
            if b.width > 2 && b.height > 2 {
                draw_hollow_rect_mut(
                    &mut rgb,
                    Rect::at(b.x + 1, b.y + 1).of_size(b.width as u32 - 2, b.height as u32 - 2),
                    ANNOTATION_COLOR,
                );
            }
        }
        Frame::from_rgb_image(rgb, self.index)
    }

    pub fn encode_jpeg(&self) -> ImageResult<Vec<u8>> {
        let color_type = if self.is_grayscale() {
            ExtendedColorType::L8
        } else {
            ExtendedColorType::Rgb8
        };
        let mut bytes = Vec::new();
        JpegEncoder::new_with_quality(&mut bytes, JPEG_QUALITY).encode(
            &self.data,
            self.width,
            self.height,
            color_type,
        )?;
        Ok(bytes)
    }

    pub fn to_rgb_image(&self) -> RgbImage {
        if self.is_grayscale() {
            let gray = GrayImage::from_raw(self.width, self.height, self.data.clone())
                .expect("Frame data length must match dimensions");
            return image::DynamicImage::ImageLuma8(gray).to_rgb8();
        }
        RgbImage::from_raw(self.width, self.height, self.data.clone())
            .expect("Frame data length must match dimensions")
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}
