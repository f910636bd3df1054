use crate::{
    error::{GenerationError, Result},
    models::{ImageTensor, MAX_REFERENCE_IMAGES},
};
use base64::{engine::general_purpose, Engine};
use image::ImageOutputFormat;
use std::io::Cursor;

/// Inline payloads above this size may be rejected by the service.
pub const DATA_URI_WARN_BYTES: usize = 256 * 1024;

/// PNG-encode up to [`MAX_REFERENCE_IMAGES`] images as data URIs, in order.
/// Anything past the limit is ignored.
pub fn encode_reference_images(images: &[ImageTensor]) -> Result<Vec<String>> {
    if images.len() > MAX_REFERENCE_IMAGES {
        log::debug!(
            "Ignoring {} reference images beyond the first {}",
            images.len() - MAX_REFERENCE_IMAGES,
            MAX_REFERENCE_IMAGES
        );
    }

    images
        .iter()
        .take(MAX_REFERENCE_IMAGES)
        .enumerate()
        .map(|(index, image)| encode_data_uri(index, image))
        .collect()
}

fn encode_data_uri(index: usize, image: &ImageTensor) -> Result<String> {
    let mut png = Vec::new();
    image
        .to_dynamic()?
        .write_to(&mut Cursor::new(&mut png), ImageOutputFormat::Png)
        .map_err(GenerationError::Encode)?;

    if png.len() > DATA_URI_WARN_BYTES {
        log::warn!(
            "Image {} is {:.1}KB, may be too large for data URL",
            index,
            png.len() as f64 / 1024.0
        );
    }

    Ok(format!(
        "data:image/png;base64,{}",
        general_purpose::STANDARD.encode(&png)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(value: f32) -> ImageTensor {
        ImageTensor::new(4, 4, 3, vec![value; 4 * 4 * 3]).unwrap()
    }

    fn decode(uri: &str) -> image::DynamicImage {
        let payload = uri
            .strip_prefix("data:image/png;base64,")
            .expect("png data uri prefix");
        let bytes = general_purpose::STANDARD.decode(payload).unwrap();
        image::load_from_memory(&bytes).unwrap()
    }

    #[test]
    fn test_no_images_yields_empty_list() {
        assert!(encode_reference_images(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_caps_at_ten_keeping_first_in_order() {
        let images: Vec<ImageTensor> = (0..12).map(|i| solid(i as f32 / 20.0)).collect();
        let uris = encode_reference_images(&images).unwrap();

        assert_eq!(uris.len(), 10);
        for (i, uri) in uris.iter().enumerate() {
            let expected = ((i as f32 / 20.0) * 255.0) as u8;
            assert_eq!(decode(uri).to_rgb8().get_pixel(0, 0).0, [expected; 3]);
        }
    }

    #[test]
    fn test_round_trips_dimensions() {
        let tensor = ImageTensor::new(5, 3, 4, vec![1.0; 5 * 3 * 4]).unwrap();
        let uris = encode_reference_images(&[tensor]).unwrap();
        let decoded = decode(&uris[0]);
        assert_eq!((decoded.width(), decoded.height()), (5, 3));
    }
}
