use axum::extract::Multipart;
use image::ImageFormat;

use crate::models::session::CachedImage;
use crate::routes::error::ApiError;

/// A validated JPEG or PNG image part.
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
    pub file_name: String,
}

impl ImageUpload {
    pub fn content_type(&self) -> &'static str {
        self.format.to_mime_type()
    }

    pub fn to_cached(&self) -> CachedImage {
        CachedImage {
            bytes: self.bytes.clone(),
            content_type: self.content_type(),
            file_name: self.file_name.clone(),
        }
    }
}

/// The optional `image` part plus one text field pulled from a multipart form.
pub struct UploadForm {
    pub image: Option<ImageUpload>,
    pub text: Option<String>,
}

impl UploadForm {
    pub fn require_image(self) -> Result<(ImageUpload, Option<String>), ApiError> {
        match self.image {
            Some(image) => Ok((image, self.text)),
            None => Err(missing_image()),
        }
    }
}

pub fn missing_image() -> ApiError {
    ApiError::BadRequest("Please upload or capture an image.".to_string())
}

/// Read the `image` part and the text field named `text_field`.
pub async fn read_upload_form(
    mut multipart: Multipart,
    text_field: &str,
) -> Result<UploadForm, ApiError> {
    let mut image = None;
    let mut text = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("image") => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.to_string()))?;

                let format =
                    image::guess_format(&data).map_err(|_| ApiError::UnsupportedMediaType)?;
                if !matches!(format, ImageFormat::Jpeg | ImageFormat::Png) {
                    return Err(ApiError::UnsupportedMediaType);
                }
                image = Some(ImageUpload {
                    bytes: data.to_vec(),
                    format,
                    file_name,
                });
            }
            Some(n) if n == text_field => {
                text = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| ApiError::BadRequest(e.to_string()))?,
                );
            }
            _ => {}
        }
    }

    Ok(UploadForm { image, text })
}
