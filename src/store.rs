//! Application state container.
//!
//! [`AppStore`] owns the session, navigation state and the cached property
//! list/detail. Screens call its actions; the actions talk to the backend
//! through [`PropertyApi`] and update local state on success.

use crate::api::{ImageFile, ImageUpload, PropertyApi};
use crate::draft::PropertyDraft;
use crate::error::{ApiError, ApiResult};
use crate::map::MarkerSummary;
use crate::models::{
    ImageId, PropertyId, PropertyImage, PropertyRecord, PropertyStatus, Session, User,
};
use crate::session::SessionStorage;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{info, warn};

/// Which screen is showing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum View {
    #[default]
    List,
    Map,
    Detail,
    Add,
}

pub struct AppStore<A> {
    api: Arc<A>,
    storage: SessionStorage,
    session: Option<Session>,
    current_view: View,
    property_list: Vec<PropertyRecord>,
    selected: Option<PropertyId>,
    details: Option<PropertyRecord>,
    deletions: broadcast::Sender<PropertyId>,
}

impl<A: PropertyApi> AppStore<A> {
    pub fn new(api: Arc<A>, storage: SessionStorage) -> Self {
        let (deletions, _) = broadcast::channel(32);
        Self {
            api,
            storage,
            session: None,
            current_view: View::default(),
            property_list: Vec::new(),
            selected: None,
            details: None,
            deletions,
        }
    }

    pub fn api(&self) -> &Arc<A> {
        &self.api
    }

    /// Restore a persisted session and load the list for it
    pub async fn hydrate(&mut self) -> ApiResult<bool> {
        let Some(session) = self.storage.load().await? else {
            return Ok(false);
        };
        info!("Resuming session for {}", session.user.email);
        self.session = Some(session);
        self.refresh_list_quietly().await;
        Ok(true)
    }

    pub async fn login(&mut self, email: &str, password: &str) -> ApiResult<&User> {
        let session = self.api.login(email, password).await?;
        self.storage.save(&session).await?;
        self.session = Some(session);
        self.refresh_list_quietly().await;

        self.user().ok_or(ApiError::NotLoggedIn)
    }

    /// Forget the session and every piece of derived state
    pub async fn logout(&mut self) -> ApiResult<()> {
        self.session = None;
        self.property_list.clear();
        self.selected = None;
        self.details = None;
        self.current_view = View::List;
        self.storage.clear().await
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn user(&self) -> Option<&User> {
        self.session.as_ref().map(|s| &s.user)
    }

    pub fn token(&self) -> ApiResult<&str> {
        self.session
            .as_ref()
            .map(|s| s.token.as_str())
            .ok_or(ApiError::NotLoggedIn)
    }

    fn owned_token(&self) -> ApiResult<String> {
        self.token().map(str::to_string)
    }

    pub fn current_view(&self) -> View {
        self.current_view
    }

    pub fn set_current_view(&mut self, view: View) {
        self.current_view = view;
    }

    pub fn property_list(&self) -> &[PropertyRecord] {
        &self.property_list
    }

    /// Cached records with the given status
    pub fn filter_by_status(&self, status: PropertyStatus) -> Vec<&PropertyRecord> {
        self.property_list
            .iter()
            .filter(|record| record.status == status)
            .collect()
    }

    pub fn selected(&self) -> Option<PropertyId> {
        self.selected
    }

    pub fn details(&self) -> Option<&PropertyRecord> {
        self.details.as_ref()
    }

    /// Select a record and switch to its detail screen
    pub fn select(&mut self, id: PropertyId) {
        if self.selected != Some(id) {
            self.details = None;
        }
        self.selected = Some(id);
        self.current_view = View::Detail;
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
        self.details = None;
    }

    /// Ids removed through [`AppStore::delete_property`]
    pub fn subscribe_deletions(&self) -> broadcast::Receiver<PropertyId> {
        self.deletions.subscribe()
    }

    pub async fn fetch_property_list(&mut self) -> ApiResult<&[PropertyRecord]> {
        let token = self.owned_token()?;
        self.property_list = self.api.list_properties(&token).await?;
        Ok(&self.property_list)
    }

    async fn refresh_list_quietly(&mut self) {
        if let Err(e) = self.fetch_property_list().await {
            warn!("Failed to fetch property list: {}", e);
        }
    }

    pub async fn fetch_property_detail(&mut self, id: PropertyId) -> ApiResult<&PropertyRecord> {
        let token = self.owned_token()?;
        let detail = self.api.property_detail(&token, id).await?;
        Ok(self.details.insert(detail))
    }

    /// Marker click: select the record and load its detail screen
    pub async fn open_marker(&mut self, marker: &MarkerSummary) -> ApiResult<&PropertyRecord> {
        self.select(marker.id);
        self.fetch_property_detail(marker.id).await
    }

    /// Validate and create; the new record goes to the front of the list
    pub async fn add_property(&mut self, draft: PropertyDraft) -> ApiResult<PropertyRecord> {
        let token = self.owned_token()?;
        let draft = draft.prepare()?;
        let created = self.api.create_property(&token, &draft).await?;

        info!("Created property {} ({})", created.id, created.title);
        self.property_list.insert(0, created.clone());
        self.current_view = View::List;
        Ok(created)
    }

    /// Validate and replace the whole record
    pub async fn update_property(
        &mut self,
        id: PropertyId,
        draft: PropertyDraft,
    ) -> ApiResult<PropertyRecord> {
        let token = self.owned_token()?;
        let draft = draft.prepare()?;
        let updated = self.api.update_property(&token, id, &draft).await?;

        for record in self.property_list.iter_mut().filter(|r| r.id == id) {
            *record = updated.clone();
        }
        self.details = Some(updated.clone());
        Ok(updated)
    }

    /// Delete and drop the id from every cache
    pub async fn delete_property(&mut self, id: PropertyId) -> ApiResult<()> {
        let token = self.owned_token()?;
        self.api.delete_property(&token, id).await?;

        self.property_list.retain(|record| record.id != id);
        if self.selected == Some(id) || self.details.as_ref().map(|d| d.id) == Some(id) {
            self.clear_selection();
        }
        self.current_view = View::List;
        // no subscribers is fine
        let _ = self.deletions.send(id);
        info!("Deleted property {}", id);
        Ok(())
    }

    pub async fn list_images(&mut self, id: PropertyId) -> ApiResult<Vec<PropertyImage>> {
        let token = self.owned_token()?;
        let images = self.api.list_images(&token, id).await?;
        self.with_cached_images(id, |cached| *cached = images.clone());
        Ok(images)
    }

    pub async fn upload_image(
        &mut self,
        id: PropertyId,
        upload: ImageUpload,
    ) -> ApiResult<PropertyImage> {
        let token = self.owned_token()?;
        let image = self.api.upload_image(&token, id, upload).await?;
        self.with_cached_images(id, |cached| {
            if image.is_main_image {
                for other in cached.iter_mut() {
                    other.is_main_image = false;
                }
            }
            cached.push(image.clone());
            cached.sort_by_key(|img| img.display_order);
        });
        Ok(image)
    }

    pub async fn upload_images(
        &mut self,
        id: PropertyId,
        files: Vec<ImageFile>,
    ) -> ApiResult<Vec<PropertyImage>> {
        let token = self.owned_token()?;
        let images = self.api.upload_images(&token, id, files).await?;
        self.with_cached_images(id, |cached| {
            cached.extend(images.iter().cloned());
            cached.sort_by_key(|img| img.display_order);
        });
        Ok(images)
    }

    pub async fn delete_image(&mut self, id: PropertyId, image_id: ImageId) -> ApiResult<()> {
        let token = self.owned_token()?;
        self.api.delete_image(&token, id, image_id).await?;
        self.with_cached_images(id, |cached| cached.retain(|img| img.id != image_id));
        Ok(())
    }

    pub async fn delete_all_images(&mut self, id: PropertyId) -> ApiResult<()> {
        let token = self.owned_token()?;
        self.api.delete_all_images(&token, id).await?;
        self.with_cached_images(id, Vec::clear);
        Ok(())
    }

    /// Mark one image as the cover; the cached copy mirrors the backend rule
    pub async fn set_main_image(&mut self, id: PropertyId, image_id: ImageId) -> ApiResult<()> {
        let token = self.owned_token()?;
        self.api.set_main_image(&token, id, image_id).await?;
        self.with_cached_images(id, |cached| {
            for image in cached.iter_mut() {
                image.is_main_image = image.id == image_id;
            }
        });
        Ok(())
    }

    pub async fn reorder_image(
        &mut self,
        id: PropertyId,
        image_id: ImageId,
        order: i32,
    ) -> ApiResult<()> {
        let token = self.owned_token()?;
        self.api.reorder_image(&token, id, image_id, order).await?;
        self.with_cached_images(id, |cached| {
            if let Some(image) = cached.iter_mut().find(|img| img.id == image_id) {
                image.display_order = order;
            }
            cached.sort_by_key(|img| img.display_order);
        });
        Ok(())
    }

    fn with_cached_images(&mut self, id: PropertyId, f: impl Fn(&mut Vec<PropertyImage>)) {
        if let Some(details) = self.details.as_mut().filter(|d| d.id == id) {
            f(&mut details.property_images);
        }
        for record in self.property_list.iter_mut().filter(|r| r.id == id) {
            f(&mut record.property_images);
        }
    }
}
