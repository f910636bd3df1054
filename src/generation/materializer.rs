use crate::{
    error::{GenerationError, Result},
    logger,
    models::{ImageBatch, ImageTensor, OutputItem},
    replicate::PredictionBackend,
};

/// Download, decode and normalize every output item, then stack them in order.
///
/// The first item that fails to download or decode fails the whole batch.
pub async fn materialize<B: PredictionBackend + ?Sized>(
    backend: &B,
    items: &[OutputItem],
) -> Result<ImageBatch> {
    let _timer = logger::timer("download outputs");
    let mut images = Vec::with_capacity(items.len());

    for (index, item) in items.iter().enumerate() {
        let url = item.url();
        log::debug!("Downloading output {} from {}", index, url);

        let bytes = backend.download(url).await?;
        let decoded = image::load_from_memory(&bytes).map_err(GenerationError::Decode)?;
        log::debug!(
            "Decoded output {}: {}x{} {:?}",
            index,
            decoded.width(),
            decoded.height(),
            decoded.color()
        );

        images.push(ImageTensor::from_dynamic(&decoded));
    }

    ImageBatch::stack(images)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::testing::{png_bytes, prediction, ScriptedBackend};
    use crate::models::PredictionStatus;
    use image::{DynamicImage, GrayImage, Luma, Rgba, RgbaImage};

    fn backend() -> ScriptedBackend {
        ScriptedBackend::new(prediction("p1", PredictionStatus::Succeeded))
    }

    #[tokio::test]
    async fn test_grayscale_output_expands_to_rgb() {
        let gray = DynamicImage::ImageLuma8(GrayImage::from_pixel(100, 100, Luma([255])));
        let backend = backend().with_file("https://x/gray.png", png_bytes(&gray));

        let batch = materialize(&backend, &[OutputItem::Url("https://x/gray.png".into())])
            .await
            .unwrap();

        assert_eq!(batch.shape(), [1, 100, 100, 3]);
        assert!(batch.get(0).unwrap().data().iter().all(|v| *v == 1.0));
    }

    #[tokio::test]
    async fn test_mixed_items_keep_order_and_drop_alpha() {
        let rgba = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([0, 255, 0, 10])));
        let gray = DynamicImage::ImageLuma8(GrayImage::from_pixel(8, 8, Luma([0])));
        let backend = backend()
            .with_file("https://x/a.png", png_bytes(&rgba))
            .with_file("https://x/b.png", png_bytes(&gray));

        let items = vec![
            OutputItem::File {
                url: "https://x/a.png".into(),
            },
            OutputItem::Url("https://x/b.png".into()),
        ];
        let batch = materialize(&backend, &items).await.unwrap();

        assert_eq!(batch.shape(), [2, 8, 8, 3]);
        assert_eq!(batch.get(0).unwrap().pixel(0, 0).unwrap(), &[0.0, 1.0, 0.0]);
        assert_eq!(batch.get(1).unwrap().pixel(7, 7).unwrap(), &[0.0, 0.0, 0.0]);
    }

    #[tokio::test]
    async fn test_fetch_failure_aborts_batch() {
        let gray = DynamicImage::ImageLuma8(GrayImage::from_pixel(4, 4, Luma([9])));
        let backend = backend().with_file("https://x/ok.png", png_bytes(&gray));

        let items = vec![
            OutputItem::Url("https://x/ok.png".into()),
            OutputItem::Url("https://x/missing.png".into()),
        ];
        let err = materialize(&backend, &items).await.unwrap_err();
        assert!(matches!(err, GenerationError::Fetch { .. }));
    }

    #[tokio::test]
    async fn test_undecodable_bytes_fail() {
        let backend = backend().with_file("https://x/bad.png", b"not an image".to_vec());
        let err = materialize(&backend, &[OutputItem::Url("https://x/bad.png".into())])
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::Decode(_)));
    }
}
