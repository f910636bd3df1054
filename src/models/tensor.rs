use crate::error::{GenerationError, Result};
use image::{DynamicImage, GrayImage, Rgb32FImage, RgbImage, RgbaImage};

/// Float image in height × width × channels order, values nominally in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTensor {
    width: u32,
    height: u32,
    channels: usize,
    data: Vec<f32>,
}

impl ImageTensor {
    pub fn new(width: u32, height: u32, channels: usize, data: Vec<f32>) -> Result<Self> {
        if !matches!(channels, 1 | 3 | 4) {
            return Err(GenerationError::Batch(format!(
                "unsupported channel count {}",
                channels
            )));
        }
        let expected = width as usize * height as usize * channels;
        if data.len() != expected {
            return Err(GenerationError::Batch(format!(
                "expected {} values for {}x{}x{}, got {}",
                expected,
                height,
                width,
                channels,
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// Converts any decoded image into 3 normalized float channels.
    ///
    /// Grayscale is replicated across RGB, alpha is discarded without
    /// compositing, and integer samples are divided by their type's maximum.
    pub fn from_dynamic(image: &DynamicImage) -> Self {
        Self::from_rgb32f(image.to_rgb32f())
    }

    pub fn from_rgb32f(image: Rgb32FImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            channels: 3,
            data: image.into_raw(),
        }
    }

    /// Quantize back to 8 bits (`value * 255`, truncated) for encoding.
    pub fn to_dynamic(&self) -> Result<DynamicImage> {
        let bytes: Vec<u8> = self
            .data
            .iter()
            .map(|v| (v.clamp(0.0, 1.0) * 255.0) as u8)
            .collect();
        let mismatch = || GenerationError::Batch("pixel buffer does not match dimensions".into());

        let image = match self.channels {
            1 => DynamicImage::ImageLuma8(
                GrayImage::from_raw(self.width, self.height, bytes).ok_or_else(mismatch)?,
            ),
            3 => DynamicImage::ImageRgb8(
                RgbImage::from_raw(self.width, self.height, bytes).ok_or_else(mismatch)?,
            ),
            _ => DynamicImage::ImageRgba8(
                RgbaImage::from_raw(self.width, self.height, bytes).ok_or_else(mismatch)?,
            ),
        };
        Ok(image)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// `[height, width, channels]`
    pub fn shape(&self) -> [usize; 3] {
        [self.height as usize, self.width as usize, self.channels]
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Channel values at `(x, y)`, or `None` outside the image.
    pub fn pixel(&self, x: u32, y: u32) -> Option<&[f32]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let start = (y as usize * self.width as usize + x as usize) * self.channels;
        self.data.get(start..start + self.channels)
    }
}

/// Ordered stack of same-sized images.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBatch {
    images: Vec<ImageTensor>,
}

impl ImageBatch {
    /// Stack images in order. Fails on an empty list or mismatched shapes.
    pub fn stack(images: Vec<ImageTensor>) -> Result<Self> {
        let first = images
            .first()
            .ok_or_else(|| GenerationError::EmptyOutput("No images were generated".into()))?;
        let shape = first.shape();

        if let Some((index, odd)) = images
            .iter()
            .enumerate()
            .find(|(_, image)| image.shape() != shape)
        {
            return Err(GenerationError::Batch(format!(
                "image {} has shape {:?}, expected {:?}",
                index,
                odd.shape(),
                shape
            )));
        }

        Ok(Self { images })
    }

    /// `[batch, height, width, channels]`
    pub fn shape(&self) -> [usize; 4] {
        let [h, w, c] = self.images[0].shape();
        [self.images.len(), h, w, c]
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ImageTensor> {
        self.images.iter()
    }

    pub fn get(&self, index: usize) -> Option<&ImageTensor> {
        self.images.get(index)
    }

    pub fn into_images(self) -> Vec<ImageTensor> {
        self.images
    }
}
