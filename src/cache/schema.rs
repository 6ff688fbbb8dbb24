//! Store layout: point rows, density buckets, metadata and category views.

use super::category::Category;
use crate::config::CacheConfig;
use crate::error::{GeohError, Result};
use rusqlite::{Connection, OptionalExtension, params};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS points (
    geohash  TEXT NOT NULL,
    serial   TEXT NOT NULL,
    category TEXT NOT NULL,
    payload  BLOB NOT NULL,
    UNIQUE (geohash, serial, category)
);
CREATE INDEX IF NOT EXISTS idx_points_serial ON points (serial);
CREATE TABLE IF NOT EXISTS density (
    prefix   TEXT NOT NULL,
    category TEXT NOT NULL,
    count    INTEGER NOT NULL DEFAULT 0,
    UNIQUE (prefix, category)
);
CREATE TABLE IF NOT EXISTS metadata (
    name  TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
";

pub(crate) const INSERT_POINT: &str =
    "INSERT OR REPLACE INTO points (geohash, serial, category, payload) VALUES (?1, ?2, ?3, ?4)";

pub(crate) const SEED_BUCKET: &str =
    "INSERT OR IGNORE INTO density (prefix, category, count) VALUES (?1, ?2, 0)";

pub(crate) const BUMP_BUCKET: &str =
    "UPDATE density SET count = count + ?3 WHERE prefix = ?1 AND category = ?2";

/// Points whose serial starts with a prefix, as the half-open range
/// `[prefix, prefix || '2')`. Serials only hold '0' and '1'.
pub(crate) const SELECT_POINTS_IN_PREFIX: &str = "SELECT geohash, serial, category, payload FROM points \
     WHERE serial >= ?1 AND serial < ?2 AND (?3 IS NULL OR category = ?3) \
     ORDER BY serial, category";

pub(crate) const SUM_DENSITY_IN_PREFIX: &str = "SELECT COALESCE(SUM(count), 0) FROM density \
     WHERE prefix >= ?1 AND prefix < ?2 AND (?3 IS NULL OR category = ?3)";

/// Exclusive upper bound for a range scan over binary serials.
pub(crate) fn prefix_upper_bound(prefix: &str) -> String {
    format!("{}2", prefix)
}

/// Settings that change the meaning of stored rows.
const LAYOUT_KEYS: [&str; 3] = ["storage_bits", "density_prefix_bits", "alphabet"];

fn layout_values(config: &CacheConfig) -> [String; 3] {
    [
        config.storage_bits().to_string(),
        config.density_prefix_bits.to_string(),
        config.alphabet().to_string(),
    ]
}

/// Create missing tables and check that an existing store was written with
/// the same layout settings.
pub(crate) fn ensure(conn: &Connection, config: &CacheConfig) -> Result<()> {
    conn.execute_batch(SCHEMA)?;

    for (name, value) in LAYOUT_KEYS.iter().zip(layout_values(config)) {
        let stored: Option<String> = conn
            .query_row(
                "SELECT value FROM metadata WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;

        match stored {
            Some(stored) if stored != value => {
                return Err(GeohError::Config(format!(
                    "store was written with {} = {}, configured {}",
                    name, stored, value
                )));
            }
            Some(_) => {}
            None => {
                conn.execute(
                    "INSERT INTO metadata (name, value) VALUES (?1, ?2)",
                    params![name, value],
                )?;
            }
        }
    }

    Ok(())
}

/// Materialize the view listing one category's points.
///
/// Views live under the `view_` prefix, which no table or index uses. A name
/// already taken by some other schema object is reported, never replaced.
/// The category is interpolated into the statement; [`Category`] only admits
/// lowercase identifier characters, which keeps the statement well-formed.
pub(crate) fn create_category_view(conn: &Connection, category: &Category) -> Result<()> {
    let view = category.view_name();
    let existing: Option<String> = conn
        .query_row(
            "SELECT type FROM sqlite_master WHERE name = ?1 COLLATE NOCASE",
            params![view],
            |row| row.get(0),
        )
        .optional()?;

    match existing.as_deref() {
        Some("view") => return Ok(()),
        Some(kind) => {
            return Err(GeohError::InvalidCategory(format!(
                "view name {} is already taken by a {}",
                view, kind
            )));
        }
        None => {}
    }

    let sql = format!(
        "CREATE VIEW \"{view}\" AS \
         SELECT geohash, serial, payload FROM points WHERE category = '{name}'",
        view = view,
        name = category.as_str()
    );
    conn.execute_batch(&sql)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        let config = CacheConfig::default();
        ensure(&conn, &config).unwrap();
        ensure(&conn, &config).unwrap();

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 3);
    }

    #[test]
    fn test_ensure_rejects_layout_change() {
        let conn = Connection::open_in_memory().unwrap();
        ensure(&conn, &CacheConfig::default()).unwrap();

        let other = CacheConfig::default().with_storage_digits(12);
        assert!(matches!(ensure(&conn, &other), Err(GeohError::Config(_))));
    }

    #[test]
    fn test_unique_point_rows() {
        let conn = Connection::open_in_memory().unwrap();
        ensure(&conn, &CacheConfig::default()).unwrap();
        for payload in [b"a".as_slice(), b"b".as_slice()] {
            conn.execute(INSERT_POINT, params!["gc7x", "0111", "cafe", payload])
                .unwrap();
        }
        let (count, payload): (i64, Vec<u8>) = conn
            .query_row("SELECT COUNT(*), payload FROM points", [], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(payload, b"b");
    }

    #[test]
    fn test_prefix_range_scan() {
        let conn = Connection::open_in_memory().unwrap();
        ensure(&conn, &CacheConfig::default()).unwrap();
        for serial in ["0110", "0111", "0100", "1110"] {
            conn.execute(INSERT_POINT, params![serial, serial, "cafe", b"x".as_slice()])
                .unwrap();
        }
        let mut stmt = conn.prepare(SELECT_POINTS_IN_PREFIX).unwrap();
        let serials: Vec<String> = stmt
            .query_map(
                params!["011", prefix_upper_bound("011"), Option::<&str>::None],
                |row| row.get(1),
            )
            .unwrap()
            .collect::<rusqlite::Result<_>>()
            .unwrap();
        assert_eq!(serials, vec!["0110", "0111"]);
    }

    #[test]
    fn test_category_view() {
        let conn = Connection::open_in_memory().unwrap();
        ensure(&conn, &CacheConfig::default()).unwrap();
        conn.execute(INSERT_POINT, params!["a", "01", "cafe", b"x".as_slice()])
            .unwrap();
        conn.execute(INSERT_POINT, params!["b", "10", "bar", b"y".as_slice()])
            .unwrap();

        let cafe = Category::parse("cafe").unwrap();
        create_category_view(&conn, &cafe).unwrap();
        create_category_view(&conn, &cafe).unwrap();

        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM view_cafe", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn test_view_never_replaces_other_objects() {
        let conn = Connection::open_in_memory().unwrap();
        ensure(&conn, &CacheConfig::default()).unwrap();
        conn.execute_batch("CREATE TABLE View_Cafe (x INTEGER)").unwrap();

        let cafe = Category::parse("cafe").unwrap();
        let err = create_category_view(&conn, &cafe).unwrap_err();
        assert!(matches!(err, GeohError::InvalidCategory(_)));

        let kind: String = conn
            .query_row(
                "SELECT type FROM sqlite_master WHERE name = 'View_Cafe'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(kind, "table");
    }

    #[test]
    fn test_schema_names_do_not_collide_with_views() {
        let conn = Connection::open_in_memory().unwrap();
        ensure(&conn, &CacheConfig::default()).unwrap();
        for name in ["serial", "points", "density", "metadata", "points_serial", "idx_points_serial"] {
            create_category_view(&conn, &Category::parse(name).unwrap()).unwrap();
        }
    }
}
