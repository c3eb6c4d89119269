use crate::{env_parse_optional, env_parse_or, ConfigError, FromEnv};

/// Page size used when neither the request nor the environment sets one
pub const DEFAULT_PAGE_SIZE: u64 = 20;

/// Upper bound applied to any requested page size
pub const DEFAULT_MAX_PAGE_SIZE: u64 = 100;

/// Pagination and search defaults shared by list endpoints
///
/// When `default_location_radius` is unset the query layer falls through to
/// its own fixed radius.
#[derive(Clone, Debug, PartialEq)]
pub struct PaginationConfig {
    pub default_page_size: u64,
    pub max_page_size: u64,
    /// Radius in meters for geospatial filters that omit one
    pub default_location_radius: Option<f64>,
}

impl PaginationConfig {
    /// Clamp a requested page size into `1..=max_page_size`, using the
    /// default when nothing was requested
    pub fn page_size(&self, requested: Option<u64>) -> u64 {
        requested
            .filter(|size| *size > 0)
            .unwrap_or(self.default_page_size)
            .clamp(1, self.max_page_size.max(1))
    }
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
            default_location_radius: None,
        }
    }
}

impl FromEnv for PaginationConfig {
    /// Reads:
    /// - PAGINATION_DEFAULT_PAGE_SIZE: defaults to 20
    /// - PAGINATION_MAX_PAGE_SIZE: defaults to 100
    /// - PAGINATION_DEFAULT_LOCATION_RADIUS: optional, meters
    fn from_env() -> Result<Self, ConfigError> {
        let default_page_size = env_parse_or("PAGINATION_DEFAULT_PAGE_SIZE", DEFAULT_PAGE_SIZE)?;
        let max_page_size = env_parse_or("PAGINATION_MAX_PAGE_SIZE", DEFAULT_MAX_PAGE_SIZE)?;
        let default_location_radius =
            env_parse_optional::<f64>("PAGINATION_DEFAULT_LOCATION_RADIUS")?;

        if max_page_size == 0 {
            return Err(ConfigError::Invalid {
                key: "PAGINATION_MAX_PAGE_SIZE".to_string(),
                details: "must be greater than zero".to_string(),
            });
        }

        if let Some(radius) = default_location_radius {
            if !radius.is_finite() || radius <= 0.0 {
                return Err(ConfigError::Invalid {
                    key: "PAGINATION_DEFAULT_LOCATION_RADIUS".to_string(),
                    details: format!("expected a positive number of meters, got {}", radius),
                });
            }
        }

        Ok(Self {
            default_page_size,
            max_page_size,
            default_location_radius,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_config_defaults() {
        temp_env::with_vars(
            [
                ("PAGINATION_DEFAULT_PAGE_SIZE", None::<&str>),
                ("PAGINATION_MAX_PAGE_SIZE", None::<&str>),
                ("PAGINATION_DEFAULT_LOCATION_RADIUS", None::<&str>),
            ],
            || {
                let config = PaginationConfig::from_env().unwrap();
                assert_eq!(config, PaginationConfig::default());
                assert_eq!(config.default_location_radius, None);
            },
        );
    }

    #[test]
    fn test_pagination_config_custom_values() {
        temp_env::with_vars(
            [
                ("PAGINATION_DEFAULT_PAGE_SIZE", Some("15")),
                ("PAGINATION_MAX_PAGE_SIZE", Some("50")),
                ("PAGINATION_DEFAULT_LOCATION_RADIUS", Some("2500")),
            ],
            || {
                let config = PaginationConfig::from_env().unwrap();
                assert_eq!(config.default_page_size, 15);
                assert_eq!(config.max_page_size, 50);
                assert_eq!(config.default_location_radius, Some(2500.0));
            },
        );
    }

    #[test]
    fn test_pagination_config_rejects_bad_radius() {
        temp_env::with_var("PAGINATION_DEFAULT_LOCATION_RADIUS", Some("-3"), || {
            let err = PaginationConfig::from_env().unwrap_err();
            assert!(err.to_string().contains("PAGINATION_DEFAULT_LOCATION_RADIUS"));
        });
    }

    #[test]
    fn test_pagination_config_rejects_zero_max() {
        temp_env::with_var("PAGINATION_MAX_PAGE_SIZE", Some("0"), || {
            assert!(PaginationConfig::from_env().is_err());
        });
    }

    #[test]
    fn test_page_size_clamping() {
        let config = PaginationConfig::default();
        assert_eq!(config.page_size(None), 20);
        assert_eq!(config.page_size(Some(0)), 20);
        assert_eq!(config.page_size(Some(5)), 5);
        assert_eq!(config.page_size(Some(10_000)), 100);
    }
}
