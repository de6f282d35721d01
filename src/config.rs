// Engine configuration
//
// Every numeric rule the engine applies (geofence radius, tier table, bonus
// bands, welcome grant) is carried here instead of being hard-coded at the
// call sites, so tests and deployments can run with different values.

use rust_decimal::Decimal;

/// Geofence configuration for the single restaurant location
#[derive(Debug, Clone)]
pub struct GeofenceConfig {
    pub restaurant_lat: f64,
    pub restaurant_lon: f64,
    pub radius_meters: u32,
}

impl Default for GeofenceConfig {
    fn default() -> Self {
        Self {
            restaurant_lat: 48.8584,
            restaurant_lon: 2.2945,
            radius_meters: 100,
        }
    }
}

/// Loyalty program configuration
///
/// Tier thresholds are inclusive lower bounds on accumulated points. The
/// multiplier applied to an order's points is the one for the customer's tier
/// before that order is credited.
#[derive(Debug, Clone)]
pub struct LoyaltyConfig {
    pub silver_threshold: u64,
    pub gold_threshold: u64,
    pub platinum_threshold: u64,
    pub bronze_multiplier: Decimal,
    pub silver_multiplier: Decimal,
    pub gold_multiplier: Decimal,
    pub platinum_multiplier: Decimal,
    /// (minimum order total, bonus points), highest qualifying band wins
    pub size_bonus_bands: Vec<(Decimal, u64)>,
    /// (minimum account age in 30-day months, bonus fraction), highest wins
    pub tenure_bonus_breakpoints: Vec<(u32, Decimal)>,
    /// One-time grant at account creation
    pub welcome_bonus: u64,
}

impl Default for LoyaltyConfig {
    fn default() -> Self {
        Self {
            silver_threshold: 500,
            gold_threshold: 1500,
            platinum_threshold: 5000,
            bronze_multiplier: Decimal::new(10, 1),   // 1.0
            silver_multiplier: Decimal::new(12, 1),   // 1.2
            gold_multiplier: Decimal::new(15, 1),     // 1.5
            platinum_multiplier: Decimal::new(20, 1), // 2.0
            size_bonus_bands: vec![
                (Decimal::from(50), 5),
                (Decimal::from(100), 20),
                (Decimal::from(200), 50),
            ],
            tenure_bonus_breakpoints: vec![
                (6, Decimal::new(10, 2)),  // 0.10
                (12, Decimal::new(20, 2)), // 0.20
            ],
            welcome_bonus: 50,
        }
    }
}

/// Top-level engine configuration
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub geofence: GeofenceConfig,
    pub loyalty: LoyaltyConfig,
}

impl EngineConfig {
    /// Build configuration from environment variables, falling back to
    /// defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        config.geofence.restaurant_lat =
            env_parse("RESTAURANT_LAT", config.geofence.restaurant_lat);
        config.geofence.restaurant_lon =
            env_parse("RESTAURANT_LON", config.geofence.restaurant_lon);
        config.geofence.radius_meters =
            env_parse("GEOFENCE_RADIUS_METERS", config.geofence.radius_meters);

        config.loyalty.silver_threshold =
            env_parse("LOYALTY_SILVER_THRESHOLD", config.loyalty.silver_threshold);
        config.loyalty.gold_threshold =
            env_parse("LOYALTY_GOLD_THRESHOLD", config.loyalty.gold_threshold);
        config.loyalty.platinum_threshold = env_parse(
            "LOYALTY_PLATINUM_THRESHOLD",
            config.loyalty.platinum_threshold,
        );
        config.loyalty.welcome_bonus =
            env_parse("LOYALTY_WELCOME_BONUS", config.loyalty.welcome_bonus);

        config.loyalty.bronze_multiplier = env_parse(
            "LOYALTY_BRONZE_MULTIPLIER",
            config.loyalty.bronze_multiplier,
        );
        config.loyalty.silver_multiplier = env_parse(
            "LOYALTY_SILVER_MULTIPLIER",
            config.loyalty.silver_multiplier,
        );
        config.loyalty.gold_multiplier =
            env_parse("LOYALTY_GOLD_MULTIPLIER", config.loyalty.gold_multiplier);
        config.loyalty.platinum_multiplier = env_parse(
            "LOYALTY_PLATINUM_MULTIPLIER",
            config.loyalty.platinum_multiplier,
        );

        config.loyalty.size_bonus_bands = env_parse_pairs(
            "LOYALTY_SIZE_BONUS_BANDS",
            config.loyalty.size_bonus_bands,
        );
        config.loyalty.tenure_bonus_breakpoints = env_parse_pairs(
            "LOYALTY_TENURE_BONUS_BREAKPOINTS",
            config.loyalty.tenure_bonus_breakpoints,
        );

        config
    }
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(raw) => raw.parse().unwrap_or(default),
        Err(_) => default,
    }
}

/// Parse a `min:value,min:value,...` table, e.g. `50:5,100:20,200:50`
/// for the size-bonus bands or `6:0.10,12:0.20` for tenure breakpoints.
/// Falls back to the default on any malformed entry.
fn env_parse_pairs<A, B>(name: &str, default: Vec<(A, B)>) -> Vec<(A, B)>
where
    A: std::str::FromStr,
    B: std::str::FromStr,
{
    match std::env::var(name) {
        Ok(raw) => parse_pairs(&raw).unwrap_or(default),
        Err(_) => default,
    }
}

fn parse_pairs<A, B>(raw: &str) -> Option<Vec<(A, B)>>
where
    A: std::str::FromStr,
    B: std::str::FromStr,
{
    raw.split(',')
        .map(|entry| {
            let (minimum, value) = entry.split_once(':')?;
            Some((
                minimum.trim().parse().ok()?,
                value.trim().parse().ok()?,
            ))
        })
        .collect()
}
