mod common;

use common::{session_with, shade_of, test_config, MockGeocoder, MockTileServer, PRIMARY_SHADE};
use mapdraw::prelude::*;
use std::sync::atomic::Ordering;

#[test]
fn test_new_session_starts_at_default_view() {
    let session = session_with(MockTileServer::new());
    assert_eq!(session.latitude(), 35.689185);
    assert_eq!(session.longitude(), 139.691648);
    assert_eq!(session.zoom(), 16);
    assert_eq!(
        session.map_url(),
        "https://www.openstreetmap.org/#map=16/35.689185/139.691648"
    );
}

#[test]
fn test_set_center_and_zoom_validate_input() {
    let mut session = session_with(MockTileServer::new());

    session.set_center(35.6586, 139.7454).unwrap();
    session.set_zoom(12).unwrap();
    assert_eq!(session.center(), LatLng::new(35.6586, 139.7454));
    assert_eq!(session.zoom(), 12);

    assert!(matches!(
        session.set_center(f64::NAN, 0.0),
        Err(MapError::InvalidCoordinate(_))
    ));
    assert!(matches!(session.set_zoom(30), Err(MapError::InvalidZoom(_))));
    assert_eq!(session.center(), LatLng::new(35.6586, 139.7454));
    assert_eq!(session.zoom(), 12);
}

#[test]
fn test_distance_and_bearing_reporters() {
    let mut session = session_with(MockTileServer::new());

    assert_eq!(
        session.distance_between(35.6586, 139.7454, 35.6812, 139.7671).unwrap(),
        3187.0
    );
    assert_eq!(
        session.distance_between(35.6812, 139.7671, 35.6586, 139.7454).unwrap(),
        3187.0
    );
    assert_eq!(
        session.distance_between(10.0, 10.0, 10.0, 10.0).unwrap(),
        0.0
    );

    let bearing = session.bearing_between(35.6586, 139.7454, 35.6812, 139.7671).unwrap();
    assert!((0.0..360.0).contains(&bearing));
    assert_eq!(bearing, 37.9);

    session.set_center(35.6586, 139.7454).unwrap();
    assert_eq!(session.distance_from_center(35.6812, 139.7671).unwrap(), 3187.0);

    assert!(session.distance_between(95.0, 0.0, 0.0, 0.0).is_err());
    assert!(session.bearing_between(0.0, 0.0, 0.0, f64::INFINITY).is_err());
}

#[test]
fn test_bounding_box_of_view() {
    let mut session = session_with(MockTileServer::new());

    let bbox = session.bounding_box_of_view(480.0, 360.0).unwrap();
    assert!(bbox.south < session.latitude() && session.latitude() < bbox.north);
    assert!(bbox.west < session.longitude() && session.longitude() < bbox.east);

    assert!(matches!(
        session.bounding_box_of_view(0.0, 360.0),
        Err(MapError::InvalidDimensions(_))
    ));

    session.set_center(88.0, 0.0).unwrap();
    assert!(matches!(
        session.bounding_box_of_view(480.0, 360.0),
        Err(MapError::InvalidCoordinate(_))
    ));
}

#[test]
fn test_map_url_for_coordinate() {
    let session = session_with(MockTileServer::new());
    assert_eq!(
        session.map_url_for(35.6586, 139.7454, 16).unwrap(),
        "https://www.openstreetmap.org/#map=16/35.6586/139.7454"
    );
    assert!(session.map_url_for(0.0, 200.0, 3).is_err());
}

#[tokio::test]
async fn test_fetch_tile_image_leaves_view_alone() {
    let server = MockTileServer::new();
    let session = session_with(server.clone());

    let tile = session.fetch_tile_image(35.689185, 139.691648, 16).await.unwrap();
    assert_eq!(tile.coord, TileCoord::new(58198, 25804, 16));
    assert_eq!(shade_of(&tile.image), PRIMARY_SHADE);
    assert_eq!(
        server.last_request().unwrap(),
        "mock://primary/16/58198/25804.png"
    );
    assert_eq!(session.zoom(), 16);

    assert!(matches!(
        session.fetch_tile_image(86.0, 0.0, 3).await,
        Err(MapError::InvalidCoordinate(_))
    ));
    assert_eq!(server.requests.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_sessions_sharing_a_cache_share_tiles() {
    let server = MockTileServer::slow(Duration::from_millis(30));
    let config = test_config();
    let tiles = TileCache::new(&config.tiles, server.clone()).unwrap();
    let geocoder = Arc::new(MockGeocoder::default());
    let a = MapSession::with_services(config.clone(), tiles.clone(), geocoder.clone()).unwrap();
    let b = MapSession::with_services(config, tiles, geocoder).unwrap();

    let (ta, tb) = tokio::join!(
        a.fetch_tile_image(35.6586, 139.7454, 15),
        b.fetch_tile_image(35.6586, 139.7454, 15)
    );
    assert!(Arc::ptr_eq(&ta.unwrap().image, &tb.unwrap().image));
    assert_eq!(server.count("primary"), 1);
}

#[tokio::test]
async fn test_set_center_by_address() {
    let mut session = session_with(MockTileServer::new());

    let center = session.set_center_by_address("Tokyo Tower", 17).await.unwrap();
    assert_eq!(center, LatLng::new(35.6586, 139.7454));
    assert_eq!(session.center(), center);
    assert_eq!(session.zoom(), 17);
}

#[tokio::test]
async fn test_failed_lookups_leave_view_untouched() {
    let mut session = session_with(MockTileServer::new());
    let before = *session.view();

    assert!(matches!(
        session.set_center_by_address("Atlantis", 10).await,
        Err(MapError::GeocodeNotFound(a)) if a == "Atlantis"
    ));
    assert!(matches!(
        session.set_center_by_address("offline", 10).await,
        Err(MapError::GeocodeNotFound(_))
    ));
    assert!(matches!(
        session.set_center_by_address("Tokyo Tower", 99).await,
        Err(MapError::InvalidZoom(_))
    ));
    assert_eq!(*session.view(), before);
}

#[tokio::test]
async fn test_hung_geocoder_counts_as_not_found() {
    let mut session = session_with(MockTileServer::new());
    let before = *session.view();

    let started = std::time::Instant::now();
    assert!(matches!(
        session.set_center_by_address("unresponsive", 10).await,
        Err(MapError::GeocodeNotFound(a)) if a == "unresponsive"
    ));
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(*session.view(), before);
}

#[test]
fn test_map_links_use_configured_host() {
    let config = MapConfig {
        map_link_host: "maps.example.org".to_string(),
        ..test_config()
    };
    let tiles = TileCache::new(&config.tiles, MockTileServer::new()).unwrap();
    let session =
        MapSession::with_services(config, tiles, Arc::new(MockGeocoder::default())).unwrap();

    assert_eq!(
        session.map_url(),
        "https://maps.example.org/#map=16/35.689185/139.691648"
    );
    assert_eq!(
        session.map_url_for(1.5, 2.5, 4).unwrap(),
        "https://maps.example.org/#map=4/1.5/2.5"
    );
}

#[test]
fn test_custom_user_agent_session() {
    let mut config = test_config();
    config.tiles.user_agent = "my-school-lab/2.0".to_string();
    assert!(MapSession::new(config).is_ok());
}

#[tokio::test]
async fn test_zoom_is_checked_before_geocoding() {
    let server = MockTileServer::new();
    let config = test_config();
    let tiles = TileCache::new(&config.tiles, server).unwrap();
    let geocoder = Arc::new(MockGeocoder::default());
    let mut session = MapSession::with_services(config, tiles, geocoder.clone()).unwrap();

    assert!(session.draw_tile_map_by_address("Tokyo Tower", 99).await.is_err());
    assert_eq!(geocoder.lookups.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_draw_tile_map_by_address() {
    let server = MockTileServer::new();
    let mut session = session_with(server.clone());

    let tile = session.draw_tile_map_by_address("Tokyo Station", 16).await.unwrap();
    assert_eq!(session.center(), LatLng::new(35.6812, 139.7671));
    assert_eq!(session.zoom(), 16);
    assert_eq!(
        tile.coord,
        tile_for(&LatLng::new(35.6812, 139.7671), 16).unwrap()
    );
    assert!(session.tile_cache().contains(&tile.coord));

    session.clear_tile_cache();
    assert!(session.tile_cache().is_empty());
}

#[tokio::test]
async fn test_draw_tile_map_reports_fetch_failure() {
    let server = std::sync::Arc::new(MockTileServer {
        primary_down: true,
        fallback_down: true,
        ..Default::default()
    });
    let mut session = session_with(server);

    let err = session.draw_tile_map(51.5074, -0.1278, 10).await.unwrap_err();
    assert!(matches!(err, MapError::TileFetchFailed { .. }));
    // The view still moved; only the image is missing
    assert_eq!(session.center(), LatLng::new(51.5074, -0.1278));
}

#[test]
fn test_zero_capacity_config_is_rejected() {
    let mut config = test_config();
    config.tiles.capacity = 0;
    assert!(matches!(
        MapSession::new(config),
        Err(MapError::CacheCapacityMisconfigured(0))
    ));
}
