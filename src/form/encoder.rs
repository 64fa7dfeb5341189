use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use futures::future::try_join_all;

use super::intake::{ImageIntake, LocalImage};
use crate::{
    error::Result,
    models::{EncodedImage, EncodedRequest, GenerationParameters, DEFAULT_MIME_TYPE},
};

/// Declared type if present, otherwise guessed from the extension.
pub fn mime_type_for(image: &LocalImage) -> String {
    if let Some(declared) = image.mime_type.as_deref() {
        let declared = declared.trim();
        if !declared.is_empty() {
            return declared.to_string();
        }
    }
    let guessed = match image.extension().as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => DEFAULT_MIME_TYPE,
    };
    guessed.to_string()
}

pub async fn encode_image(image: &LocalImage) -> Result<EncodedImage> {
    let bytes = image.read().await?;
    log::trace!("Encoded {} ({} bytes)", image.name, bytes.len());
    Ok(EncodedImage {
        data: BASE64.encode(bytes),
        mime_type: mime_type_for(image),
    })
}

/// Builds the request snapshot for one submission.
///
/// Local files are read concurrently; the result keeps selection order and
/// is only produced once every file has been encoded. The first read
/// failure aborts the whole batch.
pub async fn encode(params: &GenerationParameters, intake: &ImageIntake) -> Result<EncodedRequest> {
    let (encoded_images, remote_url) = if params.mode.uses_reference_images() {
        match intake.remote_url() {
            Some(url) => (Vec::new(), Some(url.to_string())),
            None => {
                let reads = intake.local_files().iter().map(|image| encode_image(image));
                (try_join_all(reads).await?, None)
            }
        }
    } else {
        (Vec::new(), None)
    };

    log::debug!(
        "Encoded request: mode={}, {} images, url={}",
        params.mode,
        encoded_images.len(),
        remote_url.is_some()
    );

    Ok(EncodedRequest::new(
        params.mode,
        params.model,
        params.resolution,
        params.aspect_ratio,
        params.prompt().to_string(),
        encoded_images,
        remote_url,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenerationError;
    use crate::models::Mode;

    fn params(mode: Mode) -> GenerationParameters {
        GenerationParameters::new().with_mode(mode).with_prompt("a banana")
    }

    #[test]
    fn mime_type_resolution() {
        let declared = LocalImage::from_bytes("a.png", vec![]).with_mime_type("image/heic");
        assert_eq!(mime_type_for(&declared), "image/heic");

        let blank = LocalImage::from_bytes("a.JPEG", vec![]).with_mime_type("");
        assert_eq!(mime_type_for(&blank), "image/jpeg");

        let unknown = LocalImage::from_bytes("blob", vec![]);
        assert_eq!(mime_type_for(&unknown), DEFAULT_MIME_TYPE);
    }

    #[tokio::test]
    async fn local_files_round_trip_in_selection_order() {
        let payloads: Vec<Vec<u8>> = vec![b"first".to_vec(), vec![0, 255, 7, 42], b"third!".to_vec()];
        let mut intake = ImageIntake::new();
        intake.select_local_files(
            payloads
                .iter()
                .enumerate()
                .map(|(i, bytes)| LocalImage::from_bytes(format!("{}.webp", i), bytes.clone())),
        );

        let request = encode(&params(Mode::ImageToImage), &intake).await.unwrap();
        assert_eq!(request.encoded_images().len(), 3);
        assert_eq!(request.remote_url(), None);
        for (encoded, original) in request.encoded_images().iter().zip(&payloads) {
            assert_eq!(&BASE64.decode(&encoded.data).unwrap(), original);
            assert_eq!(encoded.mime_type, "image/webp");
        }
    }

    #[tokio::test]
    async fn remote_url_is_forwarded_verbatim() {
        let mut intake = ImageIntake::new();
        intake.set_remote_url("https://cdn.example/ref.png?sig=a%20b");
        let request = encode(&params(Mode::ImageToImage), &intake).await.unwrap();
        assert!(request.encoded_images().is_empty());
        assert_eq!(request.remote_url(), Some("https://cdn.example/ref.png?sig=a%20b"));
    }

    #[tokio::test]
    async fn text_to_image_ignores_the_intake() {
        let mut intake = ImageIntake::new();
        intake.select_local_files(vec![LocalImage::from_bytes("a.png", vec![1, 2])]);
        let request = encode(&params(Mode::TextToImage), &intake).await.unwrap();
        assert!(request.encoded_images().is_empty());
        assert_eq!(request.remote_url(), None);
    }

    #[tokio::test]
    async fn one_unreadable_file_fails_the_batch() {
        let mut intake = ImageIntake::new();
        intake.select_local_files(vec![
            LocalImage::from_bytes("ok.png", vec![1]),
            LocalImage::from_path("/no/such/dir/missing.png"),
            LocalImage::from_bytes("ok2.png", vec![2]),
        ]);
        let result = encode(&params(Mode::ImageToImage), &intake).await;
        assert!(matches!(result, Err(GenerationError::Encode(_))));
    }
}
