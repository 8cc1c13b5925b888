use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use maemul_notes::api::mock::MockLatency;
use maemul_notes::api::{ImageFile, ImageUpload, MockApi, PropertyApi, RestClient};
use maemul_notes::config::Config;
use maemul_notes::draft::PropertyDraft;
use maemul_notes::map::{
    Bounds, MapSurface, MarkerSummary, RefreshOutcome, ViewportWatcher, WatcherSettings,
};
use maemul_notes::models::{GeoPoint, ImageId, PropertyId, PropertyRecord, PropertyStatus};
use maemul_notes::session::SessionStorage;
use maemul_notes::store::{AppStore, View};
use maemul_notes::ApiError;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "maemul-notes", version, about = "매물 기록 노트 command-line client")]
struct Cli {
    /// Use the built-in mock backend instead of the REST API
    #[arg(long, global = true, action = ArgAction::SetTrue)]
    mock: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Log in and remember the session
    Login { email: String, password: String },
    /// Forget the saved session
    Logout,
    /// List saved properties, optionally by status (관심, 검토중, 보류)
    List { status: Option<PropertyStatus> },
    /// Show one property in detail
    Show { id: PropertyId },
    /// Create a property from field=value pairs
    Add { fields: Vec<String> },
    /// Change fields of an existing property
    Edit { id: PropertyId, fields: Vec<String> },
    /// Delete a property
    Delete { id: PropertyId },
    /// Manage the images of a property (lists them by default)
    Images {
        id: PropertyId,
        #[command(subcommand)]
        command: Option<ImagesCommand>,
    },
    /// Show the markers inside a map rectangle (defaults to central Seoul)
    Map {
        /// minLat maxLat minLng maxLng
        #[arg(allow_negative_numbers = true, value_name = "COORD")]
        bounds: Vec<f64>,
        /// Open the detail of a marker after the map loads
        #[arg(long, value_name = "ID")]
        open: Option<PropertyId>,
    },
}

#[derive(Subcommand, Debug)]
enum ImagesCommand {
    List,
    /// Upload one image; the first image of a property becomes the main one
    Upload {
        path: PathBuf,
        #[arg(long, action = ArgAction::SetTrue)]
        main: bool,
    },
    /// Upload several images at once
    UploadMany {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Make an image the main image
    Main { image_id: ImageId },
    /// Move an image to a new display position
    Order { image_id: ImageId, order: i32 },
    Delete { image_id: ImageId },
    /// Delete every image of the property
    Clear,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    if cli.mock {
        let api = MockApi::seeded().with_latency(MockLatency::realistic());
        run(Arc::new(api), &config, cli.command).await
    } else {
        let api = RestClient::with_timeout(&config.base_url, config.http_timeout)
            .context("Failed to create HTTP client")?;
        info!("🏠 Backend URL: {}", api.base_url());
        run(Arc::new(api), &config, cli.command).await
    }
}

fn apply_fields(draft: &mut PropertyDraft, fields: &[String]) -> Result<()> {
    for field in fields {
        let Some((key, value)) = field.split_once('=') else {
            bail!("expected field=value, got {:?}", field);
        };
        draft
            .set_field(key, value)
            .map_err(|e| anyhow::anyhow!(e))?;
    }
    Ok(())
}

async fn run<A: PropertyApi + 'static>(
    api: Arc<A>,
    config: &Config,
    command: Commands,
) -> Result<()> {
    info!("🏠 Using the {} backend", api.source_name());
    let mut store = AppStore::new(api, SessionStorage::new(&config.session_dir));

    if let Commands::Login { email, password } = &command {
        match store.login(email, password).await {
            Ok(user) => {
                let name = user.name.clone();
                println!("✅ {}님 환영합니다", name);
                println!("   {} properties loaded", store.property_list().len());
            }
            Err(ApiError::Unauthorized(_)) => {
                println!("❌ 이메일 또는 비밀번호가 올바르지 않습니다.");
            }
            Err(e) => return Err(e).context("Login failed"),
        }
        return Ok(());
    }

    if !store.hydrate().await? {
        println!("Not logged in. Run `maemul-notes login <email> <password>` first.");
        return Ok(());
    }

    match command {
        Commands::Login { .. } => {}
        Commands::Logout => {
            store.logout().await?;
            println!("👋 Logged out");
        }
        Commands::List { status } => {
            store.fetch_property_list().await?;
            let records: Vec<&PropertyRecord> = match status {
                Some(status) => store.filter_by_status(status),
                None => store.property_list().iter().collect(),
            };
            println!("\n📋 {} properties\n", records.len());
            for record in records {
                print_card(record);
            }
        }
        Commands::Show { id } => {
            store.select(id);
            match store.fetch_property_detail(id).await {
                Ok(record) => print_detail(record),
                Err(ApiError::PropertyNotFound(_)) => println!("데이터를 찾을 수 없습니다."),
                Err(e) => return Err(e).context("Failed to load property"),
            }
        }
        Commands::Add { fields } => {
            store.set_current_view(View::Add);
            let mut draft = PropertyDraft::default();
            apply_fields(&mut draft, &fields)?;
            match store.add_property(draft).await {
                Ok(record) => println!("✅ Created property {} ({})", record.id, record.title),
                Err(ApiError::Validation(msg)) => {
                    println!("❌ 제목, 주소, 가격은 필수 입력 항목입니다. ({})", msg)
                }
                Err(e) => return Err(e).context("매물 기록 저장에 실패했습니다"),
            }
        }
        Commands::Edit { id, fields } => {
            store.select(id);
            let current = store.fetch_property_detail(id).await?;
            let mut draft = PropertyDraft::from(current);
            apply_fields(&mut draft, &fields)?;
            let updated = store.update_property(id, draft).await?;
            println!("✅ Updated property {}", updated.id);
            print_detail(&updated);
        }
        Commands::Delete { id } => {
            store.delete_property(id).await?;
            println!("🗑  Deleted property {}", id);
        }
        Commands::Images { id, command } => {
            run_images(&mut store, id, command.unwrap_or(ImagesCommand::List)).await?;
        }
        Commands::Map { bounds, open } => {
            let bounds = match bounds.as_slice() {
                [] => Bounds::around(SEOUL_CITY_HALL, 0.05, 0.08),
                &[min_lat, max_lat, min_lng, max_lng] => {
                    Bounds::new(min_lat, max_lat, min_lng, max_lng)
                }
                _ => bail!("usage: map [minLat maxLat minLng maxLng]"),
            };
            run_map(&mut store, config, bounds, open).await?;
        }
    }

    Ok(())
}

async fn run_images<A: PropertyApi>(
    store: &mut AppStore<A>,
    id: PropertyId,
    command: ImagesCommand,
) -> Result<()> {
    match command {
        ImagesCommand::List => {
            let images = store.list_images(id).await?;
            println!("\n🖼  {} images\n", images.len());
            for image in images {
                let main = if image.is_main_image { " ★ main" } else { "" };
                println!(
                    "{}. [{}] {}{}",
                    image.display_order, image.id, image.original_filename, main
                );
            }
        }
        ImagesCommand::Upload { path, main } => {
            let file = ImageFile::from_path(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let existing = store.list_images(id).await?.len();
            let image = store
                .upload_image(
                    id,
                    ImageUpload {
                        file,
                        display_order: existing as i32,
                        is_main_image: main || existing == 0,
                    },
                )
                .await?;
            println!("✅ Uploaded image {}", image.id);
        }
        ImagesCommand::UploadMany { paths } => {
            let mut files = Vec::new();
            for path in &paths {
                files.push(
                    ImageFile::from_path(path)
                        .await
                        .with_context(|| format!("Failed to read {}", path.display()))?,
                );
            }
            let images = store.upload_images(id, files).await?;
            println!("✅ Uploaded {} images", images.len());
        }
        ImagesCommand::Main { image_id } => {
            store.set_main_image(id, image_id).await?;
            println!("✅ Image {} is now the main image", image_id);
        }
        ImagesCommand::Order { image_id, order } => {
            store.reorder_image(id, image_id, order).await?;
            println!("✅ Image {} moved to position {}", image_id, order);
        }
        ImagesCommand::Delete { image_id } => {
            store.delete_image(id, image_id).await?;
            println!("🗑  Deleted image {}", image_id);
        }
        ImagesCommand::Clear => {
            store.delete_all_images(id).await?;
            println!("🗑  Deleted all images of property {}", id);
        }
    }
    Ok(())
}

const SEOUL_CITY_HALL: GeoPoint = GeoPoint {
    latitude: 37.5665,
    longitude: 126.9780,
};

/// Map surface that prints marker changes to the terminal
struct TerminalMap;

impl MapSurface for TerminalMap {
    type Marker = PropertyId;

    fn place_marker(&mut self, at: GeoPoint, summary: &MarkerSummary) -> PropertyId {
        println!("  📍 ({:.4}, {:.4}) {}", at.latitude, at.longitude, summary);
        summary.id
    }

    fn remove_marker(&mut self, marker: PropertyId) {
        println!("  ✖ removed marker {}", marker);
    }

    fn set_loading(&mut self, loading: bool) {
        if loading {
            info!("매물 조회 중...");
        }
    }
}

async fn run_map<A: PropertyApi + 'static>(
    store: &mut AppStore<A>,
    config: &Config,
    bounds: Bounds,
    open: Option<PropertyId>,
) -> Result<()> {
    if config.maps_api_key.is_none() {
        warn!("MAEMUL_MAPS_API_KEY is not set; markers are printed instead of drawn");
    }

    store.set_current_view(View::Map);
    let token = store.token()?.to_string();
    let settings = WatcherSettings {
        debounce: config.map_debounce,
        change_threshold: config.map_change_threshold,
    };
    let watcher =
        ViewportWatcher::with_settings(Arc::clone(store.api()), token, TerminalMap, settings);
    let _deletions = watcher.follow_deletions(store.subscribe_deletions());

    watcher.on_viewport_settled(bounds);
    match watcher.settle().await {
        Some(RefreshOutcome::Applied(_)) => {
            let markers = watcher.markers_in_view().await;
            if markers.is_empty() {
                println!("\n현재 지도 범위에 매물이 없습니다");
            } else {
                println!("\n현재 범위: {}개 매물", markers.len());
            }
        }
        Some(RefreshOutcome::Failed) => println!("❌ 매물 조회에 실패했습니다"),
        _ => {}
    }

    if let Some(id) = open {
        match watcher.marker_summary(id).await {
            Some(summary) => {
                println!("\n{}", summary);
                let record = store.open_marker(&summary).await?;
                print_detail(record);
            }
            None => println!("지도에 {}번 매물이 없습니다", id),
        }
    }
    watcher.shutdown();
    Ok(())
}

fn print_card(record: &PropertyRecord) {
    println!("{}. {} [{}]", record.id, record.title, record.status);
    println!("   {}", record.address);
    println!("   {} · ★{}", record.price, record.rating);
    if let Some(date) = record.date {
        println!("   {}", date);
    }
    println!();
}

fn print_detail(record: &PropertyRecord) {
    print_card(record);
    if let (Some(pyeong), Some(m2)) = (record.area_pyeong, record.area_m2) {
        println!("   면적: {}㎡ ({}평)", m2, pyeong);
    }
    println!("   방 {} · 욕실 {}", record.room_count, record.bathroom_count);
    match (record.floor_number, record.total_floors) {
        (Some(floor), Some(total)) => println!("   층: {}층 / {}층", floor, total),
        (Some(floor), None) => println!("   층: {}층", floor),
        _ => {}
    }
    if let Some(direction) = &record.direction {
        println!("   방향: {}", direction);
    }
    if let Some(fee) = &record.maintenance_fee {
        println!("   관리비: {}", fee);
    }
    if let Some(station) = &record.nearest_station {
        let minutes = record
            .walking_minutes
            .map(|m| format!(" (도보 {}분)", m))
            .unwrap_or_default();
        println!("   교통: {}{}", station, minutes);
    }
    println!(
        "   주차 {} · 엘리베이터 {}",
        if record.parking_available { "가능" } else { "불가" },
        if record.elevator_available { "있음" } else { "없음" }
    );
    for pro in &record.advantages {
        println!("   + {}", pro);
    }
    for con in &record.disadvantages {
        println!("   - {}", con);
    }
    if let Some(memo) = &record.details.memo {
        println!("   메모: {}", memo);
    }
    if let Some(point) = record.location() {
        println!("   위치: {:.4}, {:.4}", point.latitude, point.longitude);
    }
    if let Some(image) = record.main_image() {
        println!("   대표 이미지: {}", image.image_path);
    }
    println!("   이미지 {}장", record.property_images.len());
}
