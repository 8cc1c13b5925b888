use crate::api::types::{ImageFile, ImageUpload};
use crate::draft::PropertyDraft;
use crate::error::ApiResult;
use crate::map::Bounds;
use crate::models::{ImageId, PropertyId, PropertyImage, PropertyRecord, Session};
use async_trait::async_trait;

/// Backend operations the client depends on.
///
/// Every call except `login` takes the bearer token of the current session.
#[async_trait]
pub trait PropertyApi: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> ApiResult<Session>;

    async fn list_properties(&self, token: &str) -> ApiResult<Vec<PropertyRecord>>;

    /// Records whose coordinates fall inside `bounds`
    async fn properties_in_bounds(
        &self,
        token: &str,
        bounds: &Bounds,
    ) -> ApiResult<Vec<PropertyRecord>>;

    async fn property_detail(&self, token: &str, id: PropertyId) -> ApiResult<PropertyRecord>;

    async fn create_property(&self, token: &str, draft: &PropertyDraft)
        -> ApiResult<PropertyRecord>;

    /// Full-record replace
    async fn update_property(
        &self,
        token: &str,
        id: PropertyId,
        draft: &PropertyDraft,
    ) -> ApiResult<PropertyRecord>;

    async fn delete_property(&self, token: &str, id: PropertyId) -> ApiResult<()>;

    async fn list_images(&self, token: &str, id: PropertyId) -> ApiResult<Vec<PropertyImage>>;

    async fn upload_image(
        &self,
        token: &str,
        id: PropertyId,
        upload: ImageUpload,
    ) -> ApiResult<PropertyImage>;

    async fn upload_images(
        &self,
        token: &str,
        id: PropertyId,
        files: Vec<ImageFile>,
    ) -> ApiResult<Vec<PropertyImage>>;

    async fn delete_image(&self, token: &str, id: PropertyId, image_id: ImageId)
        -> ApiResult<()>;

    async fn delete_all_images(&self, token: &str, id: PropertyId) -> ApiResult<()>;

    async fn set_main_image(
        &self,
        token: &str,
        id: PropertyId,
        image_id: ImageId,
    ) -> ApiResult<()>;

    async fn reorder_image(
        &self,
        token: &str,
        id: PropertyId,
        image_id: ImageId,
        order: i32,
    ) -> ApiResult<()>;

    /// Name of the backend, for logging
    fn source_name(&self) -> &'static str;
}
