//! Configuration for the spatial cache and search-area tuning.
use crate::alphabet::Alphabet;
use serde::de::Error;

/// Spatial cache configuration
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// Alphabet digits per stored geohash (5 bits each)
    #[serde(default = "CacheConfig::default_storage_digits")]
    pub storage_digits: u32,

    /// Serial bits used to bucket density counters
    #[serde(default = "CacheConfig::default_density_prefix_bits")]
    pub density_prefix_bits: u32,

    /// First search depth when the neighborhood looks empty
    #[serde(default = "CacheConfig::default_sparse_start_depth")]
    pub sparse_start_depth: u32,

    /// First search depth when the neighborhood has points
    #[serde(default = "CacheConfig::default_dense_start_depth")]
    pub dense_start_depth: u32,

    /// Bits dropped between two search rounds
    #[serde(default = "CacheConfig::default_depth_step")]
    pub depth_step: u32,

    /// Sphere radius used to rank results by haversine distance
    #[serde(default = "CacheConfig::default_haversine_radius_km")]
    pub haversine_radius_km: f64,

    /// Alphabet for stored geohash strings, the standard one when absent
    #[serde(default)]
    pub alphabet: Option<Alphabet>,

    #[serde(default)]
    pub search: SearchConfig,
}

/// Tuning for search-area construction.
///
/// `corner_scale`, `corner_divisor` and `extra_depth` are empirical: they make
/// corner sampling plus neighbor rings over-cover rather than under-cover the
/// requested disk.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchConfig {
    #[serde(default = "SearchConfig::default_earth_radius_m")]
    pub earth_radius_m: f64,

    #[serde(default = "SearchConfig::default_corner_scale")]
    pub corner_scale: f64,

    #[serde(default = "SearchConfig::default_corner_divisor")]
    pub corner_divisor: f64,

    /// Bits added past the lookup depth when sampling corners
    #[serde(default = "SearchConfig::default_extra_depth")]
    pub extra_depth: u32,

    /// Deepest lookup depth the radius table covers
    #[serde(default = "SearchConfig::default_max_depth")]
    pub max_depth: u32,
}

impl SearchConfig {
    const fn default_earth_radius_m() -> f64 {
        crate::codec::EARTH_RADIUS_M
    }

    const fn default_corner_scale() -> f64 {
        1.49
    }

    const fn default_corner_divisor() -> f64 {
        3.0
    }

    const fn default_extra_depth() -> u32 {
        6
    }

    const fn default_max_depth() -> u32 {
        64
    }

    pub fn with_corner_scale(mut self, scale: f64) -> Self {
        self.corner_scale = scale;
        self
    }

    pub fn with_extra_depth(mut self, bits: u32) -> Self {
        self.extra_depth = bits;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(self.earth_radius_m.is_finite() && self.earth_radius_m > 0.0) {
            return Err("Earth radius must be a positive number".to_string());
        }
        if !(self.corner_scale.is_finite() && self.corner_scale > 0.0) {
            return Err("Corner scale must be a positive number".to_string());
        }
        if !(self.corner_divisor.is_finite() && self.corner_divisor > 0.0) {
            return Err("Corner divisor must be a positive number".to_string());
        }
        if self.max_depth.saturating_add(self.extra_depth) > geoh_types::geoh::GeoH::MAX_BITS {
            return Err(format!(
                "Max depth plus extra depth must not exceed {} bits",
                geoh_types::geoh::GeoH::MAX_BITS
            ));
        }
        Ok(())
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            earth_radius_m: Self::default_earth_radius_m(),
            corner_scale: Self::default_corner_scale(),
            corner_divisor: Self::default_corner_divisor(),
            extra_depth: Self::default_extra_depth(),
            max_depth: Self::default_max_depth(),
        }
    }
}

impl CacheConfig {
    const fn default_storage_digits() -> u32 {
        10
    }

    const fn default_density_prefix_bits() -> u32 {
        13
    }

    const fn default_sparse_start_depth() -> u32 {
        11
    }

    const fn default_dense_start_depth() -> u32 {
        21
    }

    const fn default_depth_step() -> u32 {
        2
    }

    const fn default_haversine_radius_km() -> f64 {
        6371.0
    }

    /// Bit length of stored codes.
    pub fn storage_bits(&self) -> u32 {
        self.storage_digits
            .saturating_mul(crate::codec::BITS_PER_SYMBOL)
    }

    /// The configured alphabet, or the standard one.
    pub fn alphabet(&self) -> Alphabet {
        self.alphabet.clone().unwrap_or_default()
    }

    pub fn with_storage_digits(mut self, digits: u32) -> Self {
        self.storage_digits = digits;
        self
    }

    pub fn with_start_depths(mut self, sparse: u32, dense: u32) -> Self {
        self.sparse_start_depth = sparse;
        self.dense_start_depth = dense;
        self
    }

    pub fn with_alphabet(mut self, alphabet: Alphabet) -> Self {
        self.alphabet = Some(alphabet);
        self
    }

    pub fn with_search(mut self, search: SearchConfig) -> Self {
        self.search = search;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        let storage_bits = self.storage_bits();
        if storage_bits == 0 || storage_bits > geoh_types::geoh::GeoH::MAX_BITS {
            return Err(format!(
                "Storage digits must be between 1 and {}",
                geoh_types::geoh::GeoH::MAX_BITS / crate::codec::BITS_PER_SYMBOL
            ));
        }
        if self.density_prefix_bits == 0 || self.density_prefix_bits > storage_bits {
            return Err("Density prefix must be between 1 bit and the storage length".to_string());
        }
        if self.depth_step == 0 {
            return Err("Depth step must be greater than zero".to_string());
        }
        if self.dense_start_depth > storage_bits || self.sparse_start_depth > storage_bits {
            return Err("Start depths must not exceed the storage length".to_string());
        }
        if !(self.haversine_radius_km.is_finite() && self.haversine_radius_km > 0.0) {
            return Err("Haversine radius must be a positive number".to_string());
        }
        self.search.validate()
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let config: CacheConfig = serde_json::from_str(json)?;
        if let Err(e) = config.validate() {
            return Err(Error::custom(e));
        }
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    #[cfg(feature = "toml")]
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        let config: CacheConfig = toml::from_str(toml_str)?;
        if let Err(e) = config.validate() {
            return Err(toml::de::Error::custom(e));
        }
        Ok(config)
    }

    #[cfg(feature = "toml")]
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            storage_digits: Self::default_storage_digits(),
            density_prefix_bits: Self::default_density_prefix_bits(),
            sparse_start_depth: Self::default_sparse_start_depth(),
            dense_start_depth: Self::default_dense_start_depth(),
            depth_step: Self::default_depth_step(),
            haversine_radius_km: Self::default_haversine_radius_km(),
            alphabet: None,
            search: SearchConfig::default(),
        }
    }
}
