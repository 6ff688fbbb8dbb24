use geoh::{
    Alphabet, CacheConfig, GeohError, PointRecord, SpatialCache, codec, distance::haversine,
};
use geo::Point;
use tempfile::TempDir;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

const CITIES: [(f64, f64, &str); 6] = [
    (-6.2603, 53.3498, "Dublin"),
    (-0.1278, 51.5074, "London"),
    (2.3522, 48.8566, "Paris"),
    (13.4050, 52.5200, "Berlin"),
    (-74.0060, 40.7128, "New York"),
    (139.6917, 35.6895, "Tokyo"),
];

fn seeded() -> SpatialCache {
    let mut cache = SpatialCache::memory().unwrap();
    for (lon, lat, name) in CITIES {
        cache.add(lon, lat, "city", name).unwrap();
    }
    cache
}

#[test]
fn test_every_added_point_is_found_from_its_own_location() {
    init_logging();
    let cache = seeded();

    for (lon, lat, name) in CITIES {
        let found = cache.get_nearby(lon, lat, Some("city")).unwrap();
        assert!(
            found.iter().any(|n| n.payload().as_ref() == name.as_bytes()),
            "{} not found near itself",
            name
        );
    }
}

#[test]
fn test_closest_city() {
    init_logging();
    let cache = seeded();

    let closest = cache.get_closest(-0.10, 51.52, Some("city")).unwrap().unwrap();
    assert_eq!(closest.nearby.payload().as_ref(), b"London");
    assert!(closest.distance_km < 5.0);

    let origin = Point::new(-0.10, 51.52);
    let expected = haversine(&origin, &closest.nearby.location(), 6371.0);
    assert_eq!(closest.distance_km, expected);
}

#[test]
fn test_isolated_point_is_found_by_widening() {
    init_logging();
    let mut cache = SpatialCache::memory().unwrap();
    cache.add(-149.9003, 61.2181, "city", b"Anchorage").unwrap();

    // Roughly 150 km away; the first rounds come back empty.
    let found = cache.get_nearby(-151.5, 60.0, Some("city")).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].payload().as_ref(), b"Anchorage");
}

#[test]
fn test_category_isolation() {
    let mut cache = seeded();
    cache.add(2.3530, 48.8570, "cafe", b"Cafe de Flore").unwrap();

    let cafes = cache.get_nearby(2.3522, 48.8566, Some("cafe")).unwrap();
    assert_eq!(cafes.len(), 1);
    assert_eq!(cafes[0].category(), "cafe");

    assert!(cache.get_closest(2.3522, 48.8566, Some("museum")).unwrap().is_none());
}

#[test]
fn test_add_many_and_add_agree_on_density() {
    let records: Vec<PointRecord> = (0..40)
        .map(|i| {
            let lon = 8.5417 + (i % 8) as f64 * 0.002;
            let lat = 47.3769 + (i / 8) as f64 * 0.002;
            PointRecord::new(lon, lat, "poi", format!("p{}", i))
        })
        .collect();

    let mut single = SpatialCache::memory().unwrap();
    for record in &records {
        single
            .add(record.lon, record.lat, &record.category, &record.payload)
            .unwrap();
    }

    let mut bulk = SpatialCache::memory().unwrap();
    assert_eq!(bulk.add_many(records.clone()).unwrap(), 40);

    assert_eq!(single.stats().unwrap(), bulk.stats().unwrap());
    assert_eq!(
        single.density_buckets(None).unwrap(),
        bulk.density_buckets(None).unwrap()
    );
    assert_eq!(single.guess_density(8.545, 47.38, Some("poi")).unwrap(), 40);
    assert_eq!(bulk.guess_density(8.545, 47.38, Some("poi")).unwrap(), 40);
}

#[test]
fn test_invalid_categories_are_rejected() {
    let mut cache = SpatialCache::memory().unwrap();
    for bad in ["", "9lives", "has space", "quote'", "dash-ed"] {
        let err = cache.add(0.0, 0.0, bad, b"x").unwrap_err();
        assert!(matches!(err, GeohError::InvalidCategory(_)), "{:?}", bad);
    }
    assert!(cache.categories().unwrap().is_empty());
}

#[test]
fn test_persistence_across_reopen() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("places");

    let mut cache = SpatialCache::open(&path).unwrap();
    cache.add(-6.2603, 53.3498, "city", b"Dublin").unwrap();
    cache.add(-6.2650, 53.3400, "cafe", b"Bewley's").unwrap();
    cache.close().unwrap();

    let stored = dir.path().join("places.gcache");
    assert!(stored.exists());

    let cache = SpatialCache::open(&stored).unwrap();
    assert_eq!(cache.path(), Some(stored.as_path()));
    let found = cache.get_nearby(-6.2603, 53.3498, Some("city")).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(cache.stats().unwrap().points, 2);
}

#[test]
fn test_close_creates_category_views() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("views.gcache");

    let mut cache = SpatialCache::open(&path).unwrap();
    cache.add(1.0, 1.0, "fuel", b"a").unwrap();
    cache.add(1.1, 1.1, "fuel", b"b").unwrap();
    cache.add(2.0, 2.0, "parking", b"c").unwrap();
    cache.close().unwrap();

    let conn = rusqlite::Connection::open(&path).unwrap();
    let mut views: Vec<String> = conn
        .prepare("SELECT name FROM sqlite_master WHERE type = 'view'")
        .unwrap()
        .query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    views.sort();
    assert_eq!(views, vec!["view_fuel", "view_parking"]);

    let fuel: i64 = conn
        .query_row("SELECT COUNT(*) FROM view_fuel", [], |row| row.get(0))
        .unwrap();
    assert_eq!(fuel, 2);
}

fn view_names(conn: &rusqlite::Connection) -> Vec<String> {
    let mut names: Vec<String> = conn
        .prepare("SELECT name FROM sqlite_master WHERE type = 'view'")
        .unwrap()
        .query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    names.sort();
    names
}

#[test]
fn test_close_with_schema_like_category_names() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("schema_names.gcache");
    let names = ["serial", "points", "density", "metadata", "points_serial", "idx_points_serial"];

    let mut cache = SpatialCache::open(&path).unwrap();
    for (i, name) in names.iter().enumerate() {
        cache.add(i as f64, i as f64, name, name).unwrap();
    }
    cache.close().unwrap();
    assert!(cache.is_closed());

    let cache = SpatialCache::open(&path).unwrap();
    assert_eq!(cache.stats().unwrap().points, names.len() as u64);
    let found = cache.get_nearby(0.0, 0.0, Some("serial")).unwrap();
    assert_eq!(found[0].payload().as_ref(), b"serial");
    drop(cache);

    let conn = rusqlite::Connection::open(&path).unwrap();
    let serial_rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM view_serial", [], |row| row.get(0))
        .unwrap();
    assert_eq!(serial_rows, 1);
    assert_eq!(view_names(&conn).len(), names.len());
}

#[test]
fn test_categories_differing_only_by_case_share_one_view() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("case.gcache");

    let mut cache = SpatialCache::open(&path).unwrap();
    cache.add(1.0, 1.0, "Cafe", b"upper").unwrap();
    cache.add(2.0, 2.0, "cafe", b"lower").unwrap();
    cache.add(3.0, 3.0, "bar", b"other").unwrap();
    assert_eq!(cache.categories().unwrap(), vec!["bar", "cafe"]);
    assert_eq!(cache.get_nearby(1.0, 1.0, Some("CAFE")).unwrap().len(), 1);
    cache.close().unwrap();

    let conn = rusqlite::Connection::open(&path).unwrap();
    assert_eq!(view_names(&conn), vec!["view_bar", "view_cafe"]);

    let mut payloads: Vec<Vec<u8>> = conn
        .prepare("SELECT payload FROM view_cafe")
        .unwrap()
        .query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    payloads.sort();
    assert_eq!(payloads, vec![b"lower".to_vec(), b"upper".to_vec()]);
}

#[test]
fn test_taken_view_name_does_not_block_commit() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("taken.gcache");

    let mut cache = SpatialCache::open(&path).unwrap();
    cache.close().unwrap();
    rusqlite::Connection::open(&path)
        .unwrap()
        .execute_batch("CREATE TABLE view_fuel (note TEXT)")
        .unwrap();

    let mut cache = SpatialCache::open(&path).unwrap();
    cache.add(1.0, 1.0, "fuel", b"a").unwrap();
    cache.add(2.0, 2.0, "parking", b"b").unwrap();
    cache.close().unwrap();

    let cache = SpatialCache::open(&path).unwrap();
    assert_eq!(cache.stats().unwrap().points, 2);
    drop(cache);

    let conn = rusqlite::Connection::open(&path).unwrap();
    assert_eq!(view_names(&conn), vec!["view_parking"]);
}

#[test]
fn test_save_makes_writes_durable_before_close() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("saved.gcache");

    let mut cache = SpatialCache::open(&path).unwrap();
    cache.add(1.0, 1.0, "poi", b"saved").unwrap();
    cache.save().unwrap();
    cache.add(2.0, 2.0, "poi", b"lost").unwrap();
    drop(cache);

    let cache = SpatialCache::open(&path).unwrap();
    let stats = cache.stats().unwrap();
    assert_eq!(stats.points, 1);
    assert_eq!(stats.insertions, 1);
}

#[test]
fn test_drop_without_close_rolls_back() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("dropped.gcache");

    let mut cache = SpatialCache::open(&path).unwrap();
    cache.add(1.0, 1.0, "poi", b"x").unwrap();
    drop(cache);

    let cache = SpatialCache::open(&path).unwrap();
    assert_eq!(cache.stats().unwrap().points, 0);
}

#[test]
fn test_reopen_with_different_layout_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("layout.gcache");

    let mut cache = SpatialCache::open(&path).unwrap();
    cache.close().unwrap();

    let config = CacheConfig::default().with_storage_digits(8);
    let err = SpatialCache::open_with_config(&path, config).unwrap_err();
    assert!(matches!(err, GeohError::Config(_)));
}

#[test]
fn test_secret_alphabet_round_trip() {
    let alphabet = Alphabet::from_secret("correct horse battery staple");
    assert_ne!(alphabet, Alphabet::default());

    let config = CacheConfig::default().with_alphabet(alphabet.clone());
    let mut cache = SpatialCache::memory_with_config(config).unwrap();
    cache.add(-6.272877, 53.344606, "poi", b"x").unwrap();

    let found = cache.get_nearby(-6.272877, 53.344606, None).unwrap();
    let stored = &found[0].record.geohash;
    assert_ne!(stored, "gc7x3r04z7");

    let code = codec::from_string(stored, &alphabet).unwrap();
    let plain = codec::from_string("gc7x3r04z7", &Alphabet::default()).unwrap();
    assert_eq!(code, plain);
}

#[test]
fn test_closed_cache() {
    let mut cache = seeded();
    cache.close().unwrap();

    assert!(matches!(
        cache.get_nearby(0.0, 0.0, None),
        Err(GeohError::CacheClosed)
    ));
    assert!(matches!(cache.save(), Err(GeohError::CacheClosed)));
    assert!(cache.close().is_ok());
}
