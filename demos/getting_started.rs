use geoh::{Alphabet, PointRecord, SpatialCache, codec, define_search_area};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (set RUST_LOG=debug to see detailed logs)
    env_logger::init();

    println!("=== geoh - Getting Started ===\n");

    // === CODEC ===
    println!("1. Geohash Codec");
    println!("----------------");

    let code = codec::encode(-6.272877, 53.344606, 50)?;
    println!("   Bits:    {}", code);
    println!("   Geohash: {}", codec::to_string(&code, &Alphabet::default()));

    let secret = Alphabet::from_secret("my secret");
    println!("   Secret:  {}", codec::to_string(&code, &secret));

    let center = codec::decode(&code, true);
    println!(
        "   Decoded: ({:.6}, {:.6}) ± ({:.1e}, {:.1e})\n",
        center.lon, center.lat, center.precision.lon, center.precision.lat
    );

    // === SEARCH AREAS ===
    println!("2. Search Areas");
    println!("---------------");

    let area = define_search_area(-6.2603, 53.3498, 1_000.0)?;
    println!("   1 km around Dublin: {} prefixes of {} bits\n", area.len(), area.depth());

    // === CACHE ===
    println!("3. Spatial Cache");
    println!("----------------");

    let dir = std::env::temp_dir().join("geoh_getting_started");
    std::fs::create_dir_all(&dir)?;
    let mut cache = SpatialCache::open(dir.join("places"))?;
    println!("   Opened {}", cache.path().map(|p| p.display().to_string()).unwrap_or_default());

    cache.add(-6.2603, 53.3498, "city", b"Dublin")?;
    let added = cache.add_many(vec![
        PointRecord::new(-0.1278, 51.5074, "city", b"London"),
        PointRecord::new(2.3522, 48.8566, "city", b"Paris"),
        PointRecord::new(-6.2650, 53.3400, "cafe", b"Bewley's"),
    ])?;
    println!("   Stored {} points", added + 1);

    for nearby in cache.get_nearby(-6.26, 53.35, None)? {
        println!(
            "   Nearby: {} ({}) at {:?}",
            String::from_utf8_lossy(nearby.payload()),
            nearby.category(),
            nearby.location().x_y()
        );
    }

    if let Some(closest) = cache.get_closest(-1.0, 51.0, Some("city"))? {
        println!(
            "   Closest city to (-1, 51): {} at {:.1} km",
            String::from_utf8_lossy(closest.nearby.payload()),
            closest.distance_km
        );
    }

    println!("   {:?}", cache.stats()?);
    let categories = cache.categories()?;
    cache.close()?;
    println!("   Closed; one view per category in {:?}", categories);

    Ok(())
}
