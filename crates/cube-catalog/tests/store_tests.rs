//! Catalog loading from a local HTTP endpoint and the disk cache.

use std::time::Duration;

use cube_catalog::CatalogStore;
use test_utils::{feature_collection, feature_json, square_ring, temp_test_dir, urls};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use velocity_common::{QueryPoint, VelocityError};

/// Unroutable endpoint: connections are refused immediately.
const DEAD_URL: &str = "http://127.0.0.1:9/catalog_v02.json";

fn catalog_body(url: &str) -> String {
    let wgs84 = square_ring(-45.0, 75.0, 1.0);
    let projected = square_ring(-50_000.0, -1_650_000.0, 50_000.0);
    feature_collection(vec![feature_json(&wgs84, 3413, &projected, url)]).to_string()
}

/// Serve `body` with `status` to every connection until the test ends.
async fn serve(status: &'static str, body: String) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let mut buf = vec![0u8; 8192];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
    });
    format!("http://{}/catalog_v02.json", addr)
}

fn store(default_url: &str, dir: &tempfile::TempDir) -> CatalogStore {
    CatalogStore::new(
        default_url,
        dir.path().join("itslive_catalog.json"),
        Duration::from_secs(5),
    )
    .unwrap()
}

#[tokio::test]
async fn test_cache_used_for_default_url() {
    let dir = temp_test_dir();
    let store = store(DEAD_URL, &dir);
    tokio::fs::write(store.cache_path(), catalog_body(urls::N70W040))
        .await
        .unwrap();

    let (catalog, source) = store.load(DEAD_URL, false).await.unwrap();
    assert_eq!(source, DEAD_URL);
    assert_eq!(catalog.len(), 1);
    assert_eq!(catalog.features()[0].storage_locator(), urls::N70W040);
}

#[tokio::test]
async fn test_reload_bypasses_cache() {
    let dir = temp_test_dir();
    let store = store(DEAD_URL, &dir);
    tokio::fs::write(store.cache_path(), catalog_body(urls::N70W040))
        .await
        .unwrap();

    let err = store.load(DEAD_URL, true).await.unwrap_err();
    assert!(matches!(err, VelocityError::CatalogUnavailable { .. }));
}

#[tokio::test]
async fn test_unreachable_url_is_catalog_unavailable() {
    let dir = temp_test_dir();
    let store = store("https://example.invalid/catalog.json", &dir);

    let err = store.load(DEAD_URL, false).await.unwrap_err();
    match err {
        VelocityError::CatalogUnavailable { url, .. } => assert_eq!(url, DEAD_URL),
        other => panic!("unexpected error: {}", other),
    }
    assert!(!store.cache_path().exists());
}

#[tokio::test]
async fn test_fetch_default_writes_cache() {
    let dir = temp_test_dir();
    let url = serve("200 OK", catalog_body(urls::N70W040)).await;
    let store = store(&url, &dir);

    let (catalog, source) = store.load(&url, false).await.unwrap();
    assert_eq!(source, url);
    assert_eq!(catalog.len(), 1);
    assert!(store.cache_path().exists());

    let point = QueryPoint::new(-45.1, 75.0).unwrap();
    assert!(catalog.find_by_point(&point).is_some());
}

#[tokio::test]
async fn test_fetch_custom_url_leaves_cache_alone() {
    let dir = temp_test_dir();
    let custom = serve("200 OK", catalog_body(urls::S70W000)).await;
    let store = store(DEAD_URL, &dir);
    tokio::fs::write(store.cache_path(), catalog_body(urls::N70W040))
        .await
        .unwrap();

    let (catalog, source) = store.load(&custom, false).await.unwrap();
    assert_eq!(source, custom);
    assert_eq!(catalog.features()[0].storage_locator(), urls::S70W000);

    let cached = tokio::fs::read_to_string(store.cache_path()).await.unwrap();
    assert!(cached.contains("EPSG3413"));
}

#[tokio::test]
async fn test_http_error_status() {
    let dir = temp_test_dir();
    let url = serve("404 Not Found", "{}".to_string()).await;
    let store = store(&url, &dir);

    let err = store.load(&url, false).await.unwrap_err();
    assert!(err.to_string().contains("404"));
    assert!(!store.cache_path().exists());
}

#[tokio::test]
async fn test_non_json_body() {
    let dir = temp_test_dir();
    let url = serve("200 OK", "<html>maintenance</html>".to_string()).await;
    let store = store(&url, &dir);

    let err = store.load(&url, true).await.unwrap_err();
    assert!(matches!(err, VelocityError::CatalogUnavailable { .. }));
}

#[tokio::test]
async fn test_corrupt_cache_falls_back_to_fetch() {
    let dir = temp_test_dir();
    let url = serve("200 OK", catalog_body(urls::N70W040)).await;
    let store = store(&url, &dir);
    tokio::fs::write(store.cache_path(), "{truncated")
        .await
        .unwrap();

    let (catalog, _) = store.load(&url, false).await.unwrap();
    assert_eq!(catalog.len(), 1);

    let cached = tokio::fs::read_to_string(store.cache_path()).await.unwrap();
    assert!(cached.contains("FeatureCollection"));
}

/// Needs network access to the public ITS_LIVE bucket.
#[tokio::test]
#[ignore]
async fn test_published_catalog() {
    let dir = temp_test_dir();
    let store = CatalogStore::new(
        cube_catalog::DEFAULT_CATALOG_URL,
        dir.path().join("catalog.json"),
        Duration::from_secs(120),
    )
    .unwrap();
    let (catalog, _) = store.load(cube_catalog::DEFAULT_CATALOG_URL, true).await.unwrap();
    assert!(catalog.len() > 100);

    let cases = [
        ((-45.1, 75.0), urls::N70W040),
        ((-10.0, -76.1), urls::S70W000),
        ((76.2, 33.5), urls::N30E070),
    ];
    for ((lon, lat), expected) in cases {
        let feature = catalog
            .find_by_point(&QueryPoint::new(lon, lat).unwrap())
            .unwrap();
        assert_eq!(feature.storage_locator(), expected);
    }
    assert!(catalog
        .find_by_point(&QueryPoint::new(0.0, 0.0).unwrap())
        .is_none());
}
