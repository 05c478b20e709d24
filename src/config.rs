//! Probe configuration
//!
//! [`ProbeConfig`] carries the geometries, counts and oracle inputs shared by
//! all probes. Defaults reproduce the reference suite (4x4 and 100x100
//! arrays, 100 allocations per geometry, flag value 100 as the undefined
//! flag); [`ProbeConfig::from_env`] lets a run override them.

use thiserror::Error;

use crate::hip::{ArrayExtent, ArrayFlags, Platform};

/// Number of arrays allocated per geometry in the size sweep
pub const DEFAULT_ARRAY_COUNT: usize = 100;

/// Upper bound on arrays per geometry; a sweep holds all of them at once
pub const MAX_ARRAY_COUNT: usize = 1 << 20;

/// Small geometry (also used by the basic and negative probes)
pub const SMALL_EXTENT: ArrayExtent = ArrayExtent::new(4, 4);

/// Large geometry of the size sweep
pub const LARGE_EXTENT: ArrayExtent = ArrayExtent::new(100, 100);

/// Flag value with bits outside every documented array flag
pub const DEFAULT_INVALID_FLAG: u32 = 100;

const ARRAY_COUNT_ENV: &str = "HIPPROBE_ARRAY_COUNT";
const PLATFORM_ENV: &str = "HIPPROBE_PLATFORM";
const INVALID_FLAG_ENV: &str = "HIPPROBE_INVALID_FLAG";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("array count must be at least 1")]
    ZeroArrayCount,
    #[error("array count {count} exceeds the maximum of {max}")]
    ArrayCountTooLarge { count: usize, max: usize },
    #[error("size sweep needs at least one geometry")]
    NoGeometries,
    #[error("geometry {0} has zero width")]
    ZeroWidth(ArrayExtent),
    #[error("flag value {0:#x} is a valid 2D array flag and cannot serve as the invalid flag")]
    FlagNotInvalid(u32),
    #[error("invalid value '{value}' for {var}: {reason}")]
    InvalidEnvValue {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Configuration shared by every probe
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeConfig {
    /// Geometries visited by the size sweep, in order
    pub geometries: Vec<ArrayExtent>,

    /// Arrays allocated per geometry before they are all freed
    pub array_count: usize,

    /// Geometry of the per-element-type allocation check
    pub basic_extent: ArrayExtent,

    /// Flag value expected to be rejected
    pub invalid_flag: ArrayFlags,

    /// Overrides the runtime's reported platform for conditional oracles
    pub platform: Option<Platform>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        ProbeConfig {
            geometries: vec![SMALL_EXTENT, LARGE_EXTENT],
            array_count: DEFAULT_ARRAY_COUNT,
            basic_extent: SMALL_EXTENT,
            invalid_flag: ArrayFlags::from_bits(DEFAULT_INVALID_FLAG),
            platform: None,
        }
    }
}

impl ProbeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_geometries(mut self, geometries: Vec<ArrayExtent>) -> Self {
        self.geometries = geometries;
        self
    }

    pub fn with_array_count(mut self, array_count: usize) -> Self {
        self.array_count = array_count;
        self
    }

    pub fn with_basic_extent(mut self, extent: ArrayExtent) -> Self {
        self.basic_extent = extent;
        self
    }

    pub fn with_invalid_flag(mut self, flag: ArrayFlags) -> Self {
        self.invalid_flag = flag;
        self
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = Some(platform);
        self
    }

    /// Defaults overridden by `HIPPROBE_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) with a custom variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(ARRAY_COUNT_ENV) {
            config.array_count =
                value
                    .trim()
                    .parse()
                    .map_err(|e: std::num::ParseIntError| ConfigError::InvalidEnvValue {
                        var: ARRAY_COUNT_ENV,
                        value: value.clone(),
                        reason: e.to_string(),
                    })?;
        }

        if let Some(value) = lookup(PLATFORM_ENV) {
            let platform = value
                .parse::<Platform>()
                .map_err(|reason| ConfigError::InvalidEnvValue {
                    var: PLATFORM_ENV,
                    value: value.clone(),
                    reason,
                })?;
            config.platform = Some(platform);
        }

        if let Some(value) = lookup(INVALID_FLAG_ENV) {
            let bits = parse_flag_bits(&value).ok_or_else(|| ConfigError::InvalidEnvValue {
                var: INVALID_FLAG_ENV,
                value: value.clone(),
                reason: "expected a decimal or 0x-prefixed integer".to_string(),
            })?;
            config.invalid_flag = ArrayFlags::from_bits(bits);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.array_count == 0 {
            return Err(ConfigError::ZeroArrayCount);
        }
        if self.array_count > MAX_ARRAY_COUNT {
            return Err(ConfigError::ArrayCountTooLarge {
                count: self.array_count,
                max: MAX_ARRAY_COUNT,
            });
        }
        if self.geometries.is_empty() {
            return Err(ConfigError::NoGeometries);
        }
        if let Some(extent) = self
            .geometries
            .iter()
            .chain(std::iter::once(&self.basic_extent))
            .find(|e| e.width == 0)
        {
            return Err(ConfigError::ZeroWidth(*extent));
        }
        if self.invalid_flag.is_valid_for_2d() {
            return Err(ConfigError::FlagNotInvalid(self.invalid_flag.bits()));
        }
        Ok(())
    }
}

fn parse_flag_bits(value: &str) -> Option<u32> {
    let value = value.trim();
    match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => value.parse().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_match_reference_suite() {
        let config = ProbeConfig::default();
        assert_eq!(config.geometries, vec![ArrayExtent::new(4, 4), ArrayExtent::new(100, 100)]);
        assert_eq!(config.array_count, 100);
        assert_eq!(config.invalid_flag.bits(), 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = ProbeConfig::from_lookup(lookup_from(&[
            ("HIPPROBE_ARRAY_COUNT", "8"),
            ("HIPPROBE_PLATFORM", "nvidia"),
            ("HIPPROBE_INVALID_FLAG", "0x40"),
        ]))
        .unwrap();
        assert_eq!(config.array_count, 8);
        assert_eq!(config.platform, Some(Platform::Nvidia));
        assert_eq!(config.invalid_flag.bits(), 0x40);
    }

    #[test]
    fn test_from_lookup_rejects_garbage() {
        let err = ProbeConfig::from_lookup(lookup_from(&[("HIPPROBE_ARRAY_COUNT", "lots")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvValue { var: "HIPPROBE_ARRAY_COUNT", .. }));

        let err = ProbeConfig::from_lookup(lookup_from(&[("HIPPROBE_PLATFORM", "intel")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvValue { var: "HIPPROBE_PLATFORM", .. }));
    }

    #[test]
    fn test_validate_bounds_array_count() {
        assert!(ProbeConfig::new()
            .with_array_count(MAX_ARRAY_COUNT)
            .validate()
            .is_ok());
        assert_eq!(
            ProbeConfig::new().with_array_count(usize::MAX).validate(),
            Err(ConfigError::ArrayCountTooLarge {
                count: usize::MAX,
                max: MAX_ARRAY_COUNT,
            })
        );

        let max = usize::MAX.to_string();
        let err = ProbeConfig::from_lookup(lookup_from(&[("HIPPROBE_ARRAY_COUNT", max.as_str())]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::ArrayCountTooLarge { .. }));
    }

    #[test]
    fn test_validate() {
        assert_eq!(
            ProbeConfig::new().with_array_count(0).validate(),
            Err(ConfigError::ZeroArrayCount)
        );
        assert_eq!(
            ProbeConfig::new().with_geometries(vec![]).validate(),
            Err(ConfigError::NoGeometries)
        );
        assert_eq!(
            ProbeConfig::new()
                .with_geometries(vec![ArrayExtent::new(0, 4)])
                .validate(),
            Err(ConfigError::ZeroWidth(ArrayExtent::new(0, 4)))
        );
        assert_eq!(
            ProbeConfig::new()
                .with_invalid_flag(ArrayFlags::SURFACE_LOAD_STORE)
                .validate(),
            Err(ConfigError::FlagNotInvalid(2))
        );
    }
}
