//! End-to-end flows through [`AppStore`] and [`ViewportWatcher`] on the
//! in-memory backend.

use assert_matches::assert_matches;
use maemul_notes::api::mock::{MOCK_EMAIL, MOCK_PASSWORD};
use maemul_notes::api::{ImageFile, ImageUpload, MockApi, PropertyApi};
use maemul_notes::draft::PropertyDraft;
use maemul_notes::map::{Bounds, MapSurface, MarkerSummary, RefreshOutcome, ViewportWatcher};
use maemul_notes::models::{GeoPoint, PropertyId, PropertyStatus};
use maemul_notes::session::SessionStorage;
use maemul_notes::store::{AppStore, View};
use maemul_notes::ApiError;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

struct NullMap;

impl MapSurface for NullMap {
    type Marker = PropertyId;

    fn place_marker(&mut self, _at: GeoPoint, summary: &MarkerSummary) -> PropertyId {
        summary.id
    }

    fn remove_marker(&mut self, _marker: PropertyId) {}
}

fn seoul() -> Bounds {
    Bounds::new(37.40, 37.60, 126.90, 127.20)
}

async fn logged_in(dir: &TempDir) -> AppStore<MockApi> {
    let mut store = AppStore::new(Arc::new(MockApi::seeded()), SessionStorage::new(dir.path()));
    store.login(MOCK_EMAIL, MOCK_PASSWORD).await.unwrap();
    store
}

#[tokio::test]
async fn login_with_mock_credentials() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = AppStore::new(Arc::new(MockApi::seeded()), SessionStorage::new(dir.path()));

    let user = store.login(MOCK_EMAIL, MOCK_PASSWORD).await.unwrap();
    assert_eq!(user.name, "김부동산");

    assert!(!store.token().unwrap().is_empty());
    assert_eq!(store.property_list().len(), 4);
}

#[tokio::test]
async fn wrong_credentials_leave_store_logged_out() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = AppStore::new(Arc::new(MockApi::seeded()), SessionStorage::new(dir.path()));

    assert_matches!(
        store.login(MOCK_EMAIL, "letmein").await,
        Err(ApiError::Unauthorized(_))
    );
    assert!(store.session().is_none());
    assert!(store.property_list().is_empty());
}

#[tokio::test]
async fn session_survives_restart_until_logout() {
    let dir = tempfile::tempdir().unwrap();
    logged_in(&dir).await;

    let mut resumed = AppStore::new(Arc::new(MockApi::seeded()), SessionStorage::new(dir.path()));
    assert!(resumed.hydrate().await.unwrap());
    assert_eq!(resumed.user().map(|u| u.email.as_str()), Some(MOCK_EMAIL));
    assert_eq!(resumed.property_list().len(), 4);

    resumed.select(1);
    resumed.fetch_property_detail(1).await.unwrap();
    resumed.logout().await.unwrap();
    assert!(resumed.session().is_none());
    assert!(resumed.property_list().is_empty());
    assert_eq!(resumed.selected(), None);
    assert!(resumed.details().is_none());
    assert_eq!(resumed.current_view(), View::List);

    let mut fresh = AppStore::new(Arc::new(MockApi::seeded()), SessionStorage::new(dir.path()));
    assert!(!fresh.hydrate().await.unwrap());
}

#[tokio::test]
async fn created_record_round_trips_through_detail() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = logged_in(&dir).await;

    let mut draft = PropertyDraft::new(" 성수동 아파트 ", "서울시 성동구 성수동 1가", "9억 5천");
    draft.status = PropertyStatus::Interested;
    draft.latitude = Some(37.5444);
    draft.longitude = Some(127.0557);
    let created = store.add_property(draft).await.unwrap();

    assert_eq!(store.property_list()[0].id, created.id);
    assert_eq!(store.property_list().len(), 5);

    let detail = store.fetch_property_detail(created.id).await.unwrap();
    assert_eq!(detail.title, "성수동 아파트");
    assert_eq!(detail.address, "서울시 성동구 성수동 1가");
    assert_eq!(detail.price, "9억 5천");
    assert_eq!(detail.status, PropertyStatus::Interested);
}

#[tokio::test]
async fn blank_required_field_never_reaches_backend() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = logged_in(&dir).await;

    let result = store.add_property(PropertyDraft::new("제목", "주소", "  ")).await;

    assert_matches!(result, Err(ApiError::Validation(_)));
    let token = store.token().unwrap().to_string();
    let backend = store.api().list_properties(&token).await.unwrap();
    assert_eq!(backend.len(), 4);
}

#[tokio::test]
async fn update_replaces_list_entry_and_detail() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = logged_in(&dir).await;

    let current = store.fetch_property_detail(3).await.unwrap().clone();
    let mut draft = PropertyDraft::from(&current);
    draft.status = PropertyStatus::Interested;
    draft.rating = 4;
    store.update_property(3, draft).await.unwrap();

    let cached = store.property_list().iter().find(|r| r.id == 3).unwrap();
    assert_eq!(cached.status, PropertyStatus::Interested);
    assert_eq!(store.details().map(|d| d.rating), Some(4));
    assert_matches!(
        store.update_property(99, PropertyDraft::from(&current)).await,
        Err(ApiError::PropertyNotFound(99))
    );
}

#[tokio::test]
async fn deleting_a_record_removes_it_from_list_and_map() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = logged_in(&dir).await;

    let token = store.token().unwrap().to_string();
    let watcher = ViewportWatcher::new(Arc::clone(store.api()), token, NullMap);
    let follower = watcher.follow_deletions(store.subscribe_deletions());
    watcher.refresh_now(seoul()).await;
    assert_eq!(watcher.marker_ids().await, vec![1, 2, 3]);

    store.select(2);
    store.delete_property(2).await.unwrap();

    assert_eq!(store.property_list().len(), 3);
    assert!(store.property_list().iter().all(|r| r.id != 2));
    assert_eq!(store.selected(), None);

    for _ in 0..50 {
        if !watcher.marker_ids().await.contains(&2) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(watcher.marker_ids().await, vec![1, 3]);
    follower.abort();
}

#[tokio::test]
async fn clicking_a_marker_opens_its_detail() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = logged_in(&dir).await;
    store.set_current_view(View::Map);

    let token = store.token().unwrap().to_string();
    let watcher = ViewportWatcher::new(Arc::clone(store.api()), token, NullMap);
    watcher.refresh_now(seoul()).await;

    let summary = watcher.marker_summary(3).await.unwrap();
    let detail = store.open_marker(&summary).await.unwrap();

    assert_eq!(detail.id, 3);
    assert_eq!(detail.title, summary.title);
    assert_eq!(store.selected(), Some(3));
    assert_eq!(store.current_view(), View::Detail);
}

#[tokio::test]
async fn unlocated_record_never_reaches_the_map() {
    let dir = tempfile::tempdir().unwrap();
    let store = logged_in(&dir).await;

    let token = store.token().unwrap().to_string();
    let watcher = ViewportWatcher::new(Arc::clone(store.api()), token, NullMap);
    let outcome = watcher
        .refresh_now(Bounds::new(-90.0, 90.0, -180.0, 180.0))
        .await;

    assert_matches!(outcome, RefreshOutcome::Applied(_));
    assert!(!watcher.marker_ids().await.contains(&4));
}

#[tokio::test]
async fn setting_main_image_keeps_a_single_cover() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = logged_in(&dir).await;
    store.select(2);
    store.fetch_property_detail(2).await.unwrap();

    let first = store
        .upload_image(
            2,
            ImageUpload {
                file: ImageFile::new("living.jpg", vec![0xff, 0xd8]),
                display_order: 0,
                is_main_image: true,
            },
        )
        .await
        .unwrap();
    let second = store
        .upload_image(
            2,
            ImageUpload {
                file: ImageFile::new("view.jpg", vec![0xff, 0xd8]),
                display_order: 1,
                is_main_image: false,
            },
        )
        .await
        .unwrap();
    assert!(first.is_main_image);

    store.set_main_image(2, second.id).await.unwrap();

    let cached: Vec<_> = store
        .details()
        .unwrap()
        .property_images
        .iter()
        .filter(|img| img.is_main_image)
        .map(|img| img.id)
        .collect();
    assert_eq!(cached, vec![second.id]);

    let backend = store.list_images(2).await.unwrap();
    let mains: Vec<_> = backend.iter().filter(|img| img.is_main_image).collect();
    assert_eq!(mains.len(), 1);
    assert_eq!(mains[0].id, second.id);
}

#[tokio::test]
async fn reorder_and_delete_images_update_cache() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = logged_in(&dir).await;
    store.fetch_property_detail(1).await.unwrap();

    let stored = store
        .upload_images(
            1,
            vec![
                ImageFile::new("a.png", vec![1]),
                ImageFile::new("b.png", vec![2]),
                ImageFile::new("c.png", vec![3]),
            ],
        )
        .await
        .unwrap();

    store.reorder_image(1, stored[0].id, 5).await.unwrap();
    let order: Vec<_> = store
        .details()
        .unwrap()
        .property_images
        .iter()
        .map(|img| img.original_filename.as_str())
        .collect();
    assert_eq!(order, vec!["b.png", "c.png", "a.png"]);

    store.delete_image(1, stored[1].id).await.unwrap();
    assert_eq!(store.details().unwrap().property_images.len(), 2);

    store.delete_all_images(1).await.unwrap();
    assert!(store.details().unwrap().property_images.is_empty());
    assert!(store.list_images(1).await.unwrap().is_empty());
}
