use crate::api::traits::PropertyApi;
use crate::api::types::{ImageFile, ImageUpload};
use crate::draft::PropertyDraft;
use crate::error::{ApiError, ApiResult};
use crate::map::Bounds;
use crate::models::{
    ImageId, PropertyDetails, PropertyId, PropertyImage, PropertyRecord, PropertyStatus, Session,
    User,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info};

pub const MOCK_EMAIL: &str = "test@test.com";
pub const MOCK_PASSWORD: &str = "password";
pub const MOCK_TOKEN: &str = "mock-jwt-token";
pub const MOCK_USER_NAME: &str = "김부동산";

/// Simulated network latency per operation
#[derive(Debug, Clone, Copy, Default)]
pub struct MockLatency {
    pub login: Duration,
    pub list: Duration,
    pub detail: Duration,
    pub write: Duration,
    pub bounds: Duration,
}

impl MockLatency {
    /// Delays comparable to a real backend on a slow connection
    pub fn realistic() -> Self {
        Self {
            login: Duration::from_millis(1000),
            list: Duration::from_millis(500),
            detail: Duration::from_millis(300),
            write: Duration::from_millis(800),
            bounds: Duration::from_millis(300),
        }
    }
}

#[derive(Default)]
struct MockState {
    properties: BTreeMap<PropertyId, PropertyRecord>,
    images: BTreeMap<PropertyId, Vec<PropertyImage>>,
    next_id: PropertyId,
    next_image_id: ImageId,
    bounds_delays: VecDeque<Duration>,
}

impl MockState {
    fn record(&self, id: PropertyId) -> ApiResult<&PropertyRecord> {
        self.properties.get(&id).ok_or(ApiError::PropertyNotFound(id))
    }

    fn images_mut(&mut self, id: PropertyId) -> ApiResult<&mut Vec<PropertyImage>> {
        if !self.properties.contains_key(&id) {
            return Err(ApiError::PropertyNotFound(id));
        }
        Ok(self.images.entry(id).or_default())
    }

    fn store_image(
        &mut self,
        id: PropertyId,
        file: ImageFile,
        order: i32,
        main: bool,
    ) -> ApiResult<PropertyImage> {
        self.record(id)?;
        let image_id = self.next_image_id;
        self.next_image_id += 1;

        let images = self.images_mut(id)?;
        if main {
            for image in images.iter_mut() {
                image.is_main_image = false;
            }
        }
        let image = PropertyImage {
            id: image_id,
            property_id: id,
            image_path: format!("/uploads/properties/{}/{}", id, file.filename),
            original_filename: file.filename,
            is_main_image: main,
            display_order: order,
        };
        images.push(image.clone());
        Ok(image)
    }

    fn with_images(&self, record: &PropertyRecord) -> PropertyRecord {
        let mut record = record.clone();
        let mut images = self.images.get(&record.id).cloned().unwrap_or_default();
        images.sort_by_key(|img| img.display_order);
        record.property_images = images;
        record
    }
}

/// In-memory backend seeded with sample records.
///
/// Accepts only `test@test.com` / `password` and the matching mock token.
pub struct MockApi {
    state: Mutex<MockState>,
    latency: MockLatency,
    bounds_queries: AtomicUsize,
}

impl MockApi {
    /// Backend holding the sample Seoul listings
    pub fn seeded() -> Self {
        Self::from_records(sample_properties())
    }

    pub fn from_records(records: Vec<PropertyRecord>) -> Self {
        let next_id = records.iter().map(|r| r.id + 1).max().unwrap_or(1);
        let properties = records.into_iter().map(|r| (r.id, r)).collect();
        Self {
            state: Mutex::new(MockState {
                properties,
                next_id,
                next_image_id: 1,
                ..MockState::default()
            }),
            latency: MockLatency::default(),
            bounds_queries: AtomicUsize::new(0),
        }
    }

    pub fn with_latency(mut self, latency: MockLatency) -> Self {
        self.latency = latency;
        self
    }

    /// Queue extra delays applied to the next bounds queries, in call order
    pub async fn delay_bounds_queries(&self, delays: impl IntoIterator<Item = Duration>) {
        self.state.lock().await.bounds_delays.extend(delays);
    }

    /// Number of bounds queries served so far
    pub fn bounds_query_count(&self) -> usize {
        self.bounds_queries.load(Ordering::SeqCst)
    }

    fn authorize(token: &str) -> ApiResult<()> {
        if token == MOCK_TOKEN {
            Ok(())
        } else {
            Err(ApiError::Unauthorized("invalid token".to_string()))
        }
    }

    async fn pause(delay: Duration) {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl PropertyApi for MockApi {
    async fn login(&self, email: &str, password: &str) -> ApiResult<Session> {
        Self::pause(self.latency.login).await;
        if email == MOCK_EMAIL && password == MOCK_PASSWORD {
            info!("Mock login accepted for {}", email);
            return Ok(Session {
                token: MOCK_TOKEN.to_string(),
                user: User {
                    name: MOCK_USER_NAME.to_string(),
                    email: email.to_string(),
                },
            });
        }
        Err(ApiError::Unauthorized("로그인 실패".to_string()))
    }

    async fn list_properties(&self, token: &str) -> ApiResult<Vec<PropertyRecord>> {
        Self::authorize(token)?;
        Self::pause(self.latency.list).await;

        let state = self.state.lock().await;
        Ok(state
            .properties
            .values()
            .map(|record| state.with_images(record))
            .collect())
    }

    async fn properties_in_bounds(
        &self,
        token: &str,
        bounds: &Bounds,
    ) -> ApiResult<Vec<PropertyRecord>> {
        Self::authorize(token)?;
        self.bounds_queries.fetch_add(1, Ordering::SeqCst);

        let extra = self.state.lock().await.bounds_delays.pop_front();
        Self::pause(self.latency.bounds + extra.unwrap_or_default()).await;

        let state = self.state.lock().await;
        let matches: Vec<_> = state
            .properties
            .values()
            .filter(|record| {
                record
                    .location()
                    .map(|point| bounds.contains(point))
                    .unwrap_or(false)
            })
            .cloned()
            .collect();
        debug!("Mock bounds query matched {} records", matches.len());
        Ok(matches)
    }

    async fn property_detail(&self, token: &str, id: PropertyId) -> ApiResult<PropertyRecord> {
        Self::authorize(token)?;
        Self::pause(self.latency.detail).await;

        let state = self.state.lock().await;
        let record = state.record(id)?;
        Ok(state.with_images(record))
    }

    async fn create_property(
        &self,
        token: &str,
        draft: &PropertyDraft,
    ) -> ApiResult<PropertyRecord> {
        Self::authorize(token)?;
        Self::pause(self.latency.write).await;

        let mut state = self.state.lock().await;
        let id = state.next_id;
        state.next_id += 1;

        let record = draft.clone().into_record(id);
        state.properties.insert(id, record.clone());
        info!("Mock created property {}", id);
        Ok(record)
    }

    async fn update_property(
        &self,
        token: &str,
        id: PropertyId,
        draft: &PropertyDraft,
    ) -> ApiResult<PropertyRecord> {
        Self::authorize(token)?;
        Self::pause(self.latency.write).await;

        let mut state = self.state.lock().await;
        state.record(id)?;
        let record = draft.clone().into_record(id);
        state.properties.insert(id, record.clone());
        Ok(state.with_images(&record))
    }

    async fn delete_property(&self, token: &str, id: PropertyId) -> ApiResult<()> {
        Self::authorize(token)?;
        Self::pause(self.latency.write).await;

        let mut state = self.state.lock().await;
        state
            .properties
            .remove(&id)
            .ok_or(ApiError::PropertyNotFound(id))?;
        state.images.remove(&id);
        Ok(())
    }

    async fn list_images(&self, token: &str, id: PropertyId) -> ApiResult<Vec<PropertyImage>> {
        Self::authorize(token)?;
        let state = self.state.lock().await;
        let record = state.record(id)?;
        Ok(state.with_images(record).property_images)
    }

    async fn upload_image(
        &self,
        token: &str,
        id: PropertyId,
        upload: ImageUpload,
    ) -> ApiResult<PropertyImage> {
        Self::authorize(token)?;
        Self::pause(self.latency.write).await;

        let mut state = self.state.lock().await;
        state.store_image(id, upload.file, upload.display_order, upload.is_main_image)
    }

    async fn upload_images(
        &self,
        token: &str,
        id: PropertyId,
        files: Vec<ImageFile>,
    ) -> ApiResult<Vec<PropertyImage>> {
        Self::authorize(token)?;
        Self::pause(self.latency.write).await;

        let mut state = self.state.lock().await;
        let existing = state.images_mut(id)?;
        let mut order = existing.iter().map(|img| img.display_order + 1).max().unwrap_or(0);
        let mut needs_main = !existing.iter().any(|img| img.is_main_image);

        let mut stored = Vec::with_capacity(files.len());
        for file in files {
            stored.push(state.store_image(id, file, order, needs_main)?);
            order += 1;
            needs_main = false;
        }
        Ok(stored)
    }

    async fn delete_image(
        &self,
        token: &str,
        id: PropertyId,
        image_id: ImageId,
    ) -> ApiResult<()> {
        Self::authorize(token)?;
        let mut state = self.state.lock().await;
        let images = state.images_mut(id)?;
        let before = images.len();
        images.retain(|img| img.id != image_id);
        if images.len() == before {
            return Err(ApiError::ImageNotFound {
                property_id: id,
                image_id,
            });
        }
        Ok(())
    }

    async fn delete_all_images(&self, token: &str, id: PropertyId) -> ApiResult<()> {
        Self::authorize(token)?;
        let mut state = self.state.lock().await;
        state.images_mut(id)?.clear();
        Ok(())
    }

    async fn set_main_image(
        &self,
        token: &str,
        id: PropertyId,
        image_id: ImageId,
    ) -> ApiResult<()> {
        Self::authorize(token)?;
        let mut state = self.state.lock().await;
        let images = state.images_mut(id)?;
        if !images.iter().any(|img| img.id == image_id) {
            return Err(ApiError::ImageNotFound {
                property_id: id,
                image_id,
            });
        }
        for image in images.iter_mut() {
            image.is_main_image = image.id == image_id;
        }
        Ok(())
    }

    async fn reorder_image(
        &self,
        token: &str,
        id: PropertyId,
        image_id: ImageId,
        order: i32,
    ) -> ApiResult<()> {
        Self::authorize(token)?;
        let mut state = self.state.lock().await;
        let image = state
            .images_mut(id)?
            .iter_mut()
            .find(|img| img.id == image_id)
            .ok_or(ApiError::ImageNotFound {
                property_id: id,
                image_id,
            })?;
        image.display_order = order;
        Ok(())
    }

    fn source_name(&self) -> &'static str {
        "Mock"
    }
}

fn sample(
    id: PropertyId,
    title: &str,
    address: &str,
    price: &str,
    date: (i32, u32, u32),
    rating: u8,
    status: PropertyStatus,
) -> PropertyRecord {
    PropertyRecord {
        id,
        title: title.to_string(),
        address: address.to_string(),
        price: price.to_string(),
        date: NaiveDate::from_ymd_opt(date.0, date.1, date.2),
        rating,
        status,
        area_pyeong: None,
        area_m2: None,
        room_count: 1,
        bathroom_count: 1,
        floor_number: None,
        total_floors: None,
        direction: None,
        building_type: None,
        build_year: None,
        maintenance_fee: None,
        heating_type: None,
        parking_available: false,
        elevator_available: false,
        nearest_station: None,
        walking_minutes: None,
        advantages: Vec::new(),
        disadvantages: Vec::new(),
        details: PropertyDetails::default(),
        latitude: None,
        longitude: None,
        property_images: Vec::new(),
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Sample listings around Seoul; the last one has no coordinates
pub fn sample_properties() -> Vec<PropertyRecord> {
    let mut yeoksam = sample(
        1,
        "강남구 역삼동 오피스텔",
        "서울시 강남구 역삼동 123-45",
        "5억 2천",
        (2024, 6, 15),
        4,
        PropertyStatus::Reviewing,
    );
    yeoksam.area_m2 = Some(84.0);
    yeoksam.area_pyeong = Some(25.4);
    yeoksam.floor_number = Some(15);
    yeoksam.total_floors = Some(20);
    yeoksam.direction = Some("남향".to_string());
    yeoksam.parking_available = true;
    yeoksam.elevator_available = true;
    yeoksam.maintenance_fee = Some("15만원".to_string());
    yeoksam.nearest_station = Some("역삼역".to_string());
    yeoksam.walking_minutes = Some(5);
    yeoksam.advantages = strings(&["지하철 2호선 역삼역 도보 5분", "주변 상권 발달", "신축 건물"]);
    yeoksam.disadvantages = strings(&["소음 약간 있음", "주차 공간 협소"]);
    yeoksam.details.memo =
        Some("전반적으로 괜찮은 물건. 가격 협상 여지 있어 보임.".to_string());
    yeoksam.latitude = Some(37.5006);
    yeoksam.longitude = Some(127.0364);

    let mut banpo = sample(
        2,
        "서초구 반포동 아파트",
        "서울시 서초구 반포동 67-89",
        "12억",
        (2024, 6, 10),
        5,
        PropertyStatus::Interested,
    );
    banpo.area_m2 = Some(114.0);
    banpo.area_pyeong = Some(34.5);
    banpo.room_count = 3;
    banpo.bathroom_count = 2;
    banpo.floor_number = Some(8);
    banpo.total_floors = Some(15);
    banpo.direction = Some("남동향".to_string());
    banpo.parking_available = true;
    banpo.elevator_available = true;
    banpo.maintenance_fee = Some("25만원".to_string());
    banpo.advantages = strings(&["한강 조망", "학군 우수", "대형 평형", "리모델링 완료"]);
    banpo.disadvantages = strings(&["관리비 높음"]);
    banpo.details.memo = Some("가족이 살기에 완벽한 조건. 투자 가치도 높음.".to_string());
    banpo.latitude = Some(37.5045);
    banpo.longitude = Some(126.9950);

    let mut jamsil = sample(
        3,
        "송파구 잠실동 상가",
        "서울시 송파구 잠실동 100-1",
        "3억 8천",
        (2024, 6, 8),
        3,
        PropertyStatus::OnHold,
    );
    jamsil.area_m2 = Some(45.0);
    jamsil.area_pyeong = Some(13.6);
    jamsil.floor_number = Some(1);
    jamsil.direction = Some("동향".to_string());
    jamsil.maintenance_fee = Some("8만원".to_string());
    jamsil.advantages = strings(&["유동인구 많음", "대로변 위치"]);
    jamsil.disadvantages = strings(&["주차 불가", "임대료 높음", "경쟁업체 많음"]);
    jamsil.details.memo =
        Some("장사하기엔 좋은 위치이지만 주차 문제와 높은 임대료가 걸림돌.".to_string());
    jamsil.latitude = Some(37.5133);
    jamsil.longitude = Some(127.1001);

    let mangwon = sample(
        4,
        "마포구 망원동 빌라",
        "서울시 마포구 망원동 400-2",
        "2억 9천",
        (2024, 6, 20),
        2,
        PropertyStatus::Reviewing,
    );

    vec![yeoksam, banpo, jamsil, mangwon]
}
