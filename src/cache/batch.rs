//! Bulk insertion.

use super::SpatialCache;
use super::category::Category;
use super::schema;
use crate::error::Result;
use bytes::Bytes;
use rusqlite::params;
use rustc_hash::FxHashMap;

/// One point queued for [`SpatialCache::add_many`].
#[derive(Debug, Clone, PartialEq)]
pub struct PointRecord {
    pub lon: f64,
    pub lat: f64,
    pub category: String,
    pub payload: Bytes,
}

impl PointRecord {
    pub fn new(lon: f64, lat: f64, category: impl Into<String>, payload: impl AsRef<[u8]>) -> Self {
        Self {
            lon,
            lat,
            category: category.into(),
            payload: Bytes::copy_from_slice(payload.as_ref()),
        }
    }
}

impl<C: Into<String>, P: AsRef<[u8]>> From<(f64, f64, C, P)> for PointRecord {
    fn from((lon, lat, category, payload): (f64, f64, C, P)) -> Self {
        Self::new(lon, lat, category, payload)
    }
}

impl SpatialCache {
    /// Insert many points at once. All records are stored or none are.
    ///
    /// Density counters end up as if each record had been added on its own;
    /// they are accumulated in memory and written once per bucket.
    /// Returns the number of records inserted.
    pub fn add_many<I, R>(&mut self, records: I) -> Result<usize>
    where
        I: IntoIterator<Item = R>,
        R: Into<PointRecord>,
    {
        let conn = self.conn()?;
        conn.execute_batch("SAVEPOINT add_many")?;

        match self.insert_all(records) {
            Ok(count) => {
                self.conn()?.execute_batch("RELEASE add_many")?;
                log::debug!("bulk insert stored {} points", count);
                Ok(count)
            }
            Err(e) => {
                self.conn()?
                    .execute_batch("ROLLBACK TO add_many; RELEASE add_many")?;
                Err(e)
            }
        }
    }

    fn insert_all<I, R>(&self, records: I) -> Result<usize>
    where
        I: IntoIterator<Item = R>,
        R: Into<PointRecord>,
    {
        let conn = self.conn()?;
        let prefix_bits = self.config.density_prefix_bits as usize;
        let mut insert = conn.prepare_cached(schema::INSERT_POINT)?;
        let mut seed = conn.prepare_cached(schema::SEED_BUCKET)?;
        let mut buckets: FxHashMap<(String, Category), u64> = FxHashMap::default();
        let mut count = 0;

        for record in records {
            let record = record.into();
            let category = Category::parse(record.category)?;
            let placement = self.place(record.lon, record.lat)?;
            let prefix = &placement.serial[..prefix_bits];

            insert.execute(params![
                placement.geohash,
                placement.serial,
                category.as_str(),
                record.payload.as_ref()
            ])?;
            seed.execute(params![prefix, category.as_str()])?;

            *buckets.entry((prefix.to_string(), category)).or_default() += 1;
            count += 1;
        }

        let mut bump = conn.prepare_cached(schema::BUMP_BUCKET)?;
        for ((prefix, category), n) in buckets {
            bump.execute(params![prefix, category.as_str(), n as i64])?;
        }

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GeohError;

    #[test]
    fn test_add_many_matches_repeated_add() {
        let points = vec![
            (4.8952, 52.3702, "city", "a"),
            (4.8960, 52.3710, "city", "b"),
            (4.9000, 52.3600, "cafe", "c"),
            (-74.0060, 40.7128, "city", "d"),
        ];

        let mut one_by_one = SpatialCache::memory().unwrap();
        for (lon, lat, category, payload) in &points {
            one_by_one.add(*lon, *lat, category, payload).unwrap();
        }

        let mut bulk = SpatialCache::memory().unwrap();
        assert_eq!(bulk.add_many(points.clone()).unwrap(), 4);

        assert_eq!(one_by_one.stats().unwrap(), bulk.stats().unwrap());
        for (lon, lat, category, _) in &points {
            assert_eq!(
                one_by_one.guess_density(*lon, *lat, Some(*category)).unwrap(),
                bulk.guess_density(*lon, *lat, Some(*category)).unwrap()
            );
        }
    }

    #[test]
    fn test_add_many_is_all_or_nothing() {
        let mut cache = SpatialCache::memory().unwrap();
        cache.add(0.0, 0.0, "poi", b"kept").unwrap();

        let err = cache
            .add_many(vec![
                PointRecord::new(1.0, 1.0, "poi", b"x"),
                PointRecord::new(2.0, 2.0, "not valid", b"y"),
            ])
            .unwrap_err();
        assert!(matches!(err, GeohError::InvalidCategory(_)));

        let stats = cache.stats().unwrap();
        assert_eq!(stats.points, 1);
        assert_eq!(stats.insertions, 1);

        // The surrounding transaction is still usable.
        cache.add(3.0, 3.0, "poi", b"z").unwrap();
        assert_eq!(cache.stats().unwrap().points, 2);
    }

    #[test]
    fn test_add_many_empty() {
        let mut cache = SpatialCache::memory().unwrap();
        assert_eq!(cache.add_many(Vec::<PointRecord>::new()).unwrap(), 0);
    }
}
