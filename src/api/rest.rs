use crate::api::traits::PropertyApi;
use crate::api::types::{ImageFile, ImageUpload, LoginRequest};
use crate::draft::PropertyDraft;
use crate::error::{ApiError, ApiResult};
use crate::map::Bounds;
use crate::models::{ImageId, PropertyId, PropertyImage, PropertyRecord, Session};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info, warn};

/// HTTP client for the property notes backend
pub struct RestClient {
    client: Client,
    base_url: String,
}

impl RestClient {
    /// Create a client with the default 30s timeout
    pub fn new(base_url: impl Into<String>) -> ApiResult<Self> {
        Self::with_timeout(base_url, Duration::from_secs(30))
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("maemul-notes/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    /// Send a request and turn any non-2xx into an error
    async fn send(&self, request: RequestBuilder) -> ApiResult<Response> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        warn!("Backend returned status: {}", status);
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ApiError::Unauthorized(body)),
            _ => Err(ApiError::Status { status, body }),
        }
    }

    async fn json<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

fn is_not_found(err: &ApiError) -> bool {
    matches!(err, ApiError::Status { status, .. } if *status == StatusCode::NOT_FOUND)
}

fn property_missing(id: PropertyId) -> impl FnOnce(ApiError) -> ApiError {
    move |err| {
        if is_not_found(&err) {
            ApiError::PropertyNotFound(id)
        } else {
            err
        }
    }
}

fn image_missing(property_id: PropertyId, image_id: ImageId) -> impl FnOnce(ApiError) -> ApiError {
    move |err| {
        if is_not_found(&err) {
            ApiError::ImageNotFound {
                property_id,
                image_id,
            }
        } else {
            err
        }
    }
}

fn image_part(file: ImageFile) -> ApiResult<Part> {
    let mime = file.mime_type();
    Ok(Part::bytes(file.bytes)
        .file_name(file.filename)
        .mime_str(mime)?)
}

#[async_trait]
impl PropertyApi for RestClient {
    async fn login(&self, email: &str, password: &str) -> ApiResult<Session> {
        let url = self.url("/login");
        debug!("POST {}", url);

        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response = self.send(self.client.post(&url).json(&body)).await?;
        let session: Session = Self::json(response).await?;

        info!("Logged in as {}", session.user.email);
        Ok(session)
    }

    async fn list_properties(&self, token: &str) -> ApiResult<Vec<PropertyRecord>> {
        let url = self.url("/properties");
        debug!("GET {}", url);

        let response = self.send(self.client.get(&url).bearer_auth(token)).await?;
        Self::json(response).await
    }

    async fn properties_in_bounds(
        &self,
        token: &str,
        bounds: &Bounds,
    ) -> ApiResult<Vec<PropertyRecord>> {
        let url = self.url("/properties/in-bounds");
        debug!("GET {} {:?}", url, bounds);

        let response = self
            .send(self.client.get(&url).bearer_auth(token).query(bounds))
            .await?;
        Self::json(response).await
    }

    async fn property_detail(&self, token: &str, id: PropertyId) -> ApiResult<PropertyRecord> {
        let url = self.url(&format!("/properties/{}", id));
        debug!("GET {}", url);

        let response = self
            .send(self.client.get(&url).bearer_auth(token))
            .await
            .map_err(property_missing(id))?;
        Self::json(response).await
    }

    async fn create_property(
        &self,
        token: &str,
        draft: &PropertyDraft,
    ) -> ApiResult<PropertyRecord> {
        let url = self.url("/properties");
        debug!("POST {}", url);

        let response = self
            .send(self.client.post(&url).bearer_auth(token).json(draft))
            .await?;
        Self::json(response).await
    }

    async fn update_property(
        &self,
        token: &str,
        id: PropertyId,
        draft: &PropertyDraft,
    ) -> ApiResult<PropertyRecord> {
        let url = self.url(&format!("/properties/{}", id));
        debug!("PUT {}", url);

        let response = self
            .send(self.client.put(&url).bearer_auth(token).json(draft))
            .await
            .map_err(property_missing(id))?;
        Self::json(response).await
    }

    async fn delete_property(&self, token: &str, id: PropertyId) -> ApiResult<()> {
        let url = self.url(&format!("/properties/{}", id));
        debug!("DELETE {}", url);

        self.send(self.client.delete(&url).bearer_auth(token))
            .await
            .map_err(property_missing(id))?;
        Ok(())
    }

    async fn list_images(&self, token: &str, id: PropertyId) -> ApiResult<Vec<PropertyImage>> {
        let url = self.url(&format!("/properties/{}/images", id));
        debug!("GET {}", url);

        let response = self
            .send(self.client.get(&url).bearer_auth(token))
            .await
            .map_err(property_missing(id))?;
        Self::json(response).await
    }

    async fn upload_image(
        &self,
        token: &str,
        id: PropertyId,
        upload: ImageUpload,
    ) -> ApiResult<PropertyImage> {
        let url = self.url(&format!("/properties/{}/images", id));
        debug!("POST {} ({} bytes)", url, upload.file.bytes.len());

        let form = Form::new()
            .part("file", image_part(upload.file)?)
            .text("displayOrder", upload.display_order.to_string())
            .text("isMainImage", upload.is_main_image.to_string());

        let response = self
            .send(self.client.post(&url).bearer_auth(token).multipart(form))
            .await
            .map_err(property_missing(id))?;
        Self::json(response).await
    }

    async fn upload_images(
        &self,
        token: &str,
        id: PropertyId,
        files: Vec<ImageFile>,
    ) -> ApiResult<Vec<PropertyImage>> {
        let url = self.url(&format!("/properties/{}/images/multiple", id));
        debug!("POST {} ({} files)", url, files.len());

        let mut form = Form::new();
        for file in files {
            form = form.part("files", image_part(file)?);
        }

        let response = self
            .send(self.client.post(&url).bearer_auth(token).multipart(form))
            .await
            .map_err(property_missing(id))?;
        Self::json(response).await
    }

    async fn delete_image(
        &self,
        token: &str,
        id: PropertyId,
        image_id: ImageId,
    ) -> ApiResult<()> {
        let url = self.url(&format!("/properties/{}/images/{}", id, image_id));
        debug!("DELETE {}", url);

        self.send(self.client.delete(&url).bearer_auth(token))
            .await
            .map_err(image_missing(id, image_id))?;
        Ok(())
    }

    async fn delete_all_images(&self, token: &str, id: PropertyId) -> ApiResult<()> {
        let url = self.url(&format!("/properties/{}/images", id));
        debug!("DELETE {}", url);

        self.send(self.client.delete(&url).bearer_auth(token))
            .await
            .map_err(property_missing(id))?;
        Ok(())
    }

    async fn set_main_image(
        &self,
        token: &str,
        id: PropertyId,
        image_id: ImageId,
    ) -> ApiResult<()> {
        let url = self.url(&format!("/properties/{}/images/{}/main", id, image_id));
        debug!("PATCH {}", url);

        self.send(self.client.patch(&url).bearer_auth(token))
            .await
            .map_err(image_missing(id, image_id))?;
        Ok(())
    }

    async fn reorder_image(
        &self,
        token: &str,
        id: PropertyId,
        image_id: ImageId,
        order: i32,
    ) -> ApiResult<()> {
        let url = self.url(&format!("/properties/{}/images/{}/order", id, image_id));
        debug!("PATCH {} order={}", url, order);

        self.send(
            self.client
                .patch(&url)
                .bearer_auth(token)
                .query(&[("order", order)]),
        )
        .await
        .map_err(image_missing(id, image_id))?;
        Ok(())
    }

    fn source_name(&self) -> &'static str {
        "REST"
    }
}
