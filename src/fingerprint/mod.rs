//! Randomized but internally consistent browser identities.
//!
//! Fingerprint-based detection keys on contradictions (a Kolkata timezone with
//! a Berlin geolocation, a Chrome UA with Firefox navigator fields), so the
//! locale/timezone/geolocation triple is sampled as a single tuple and never
//! mixed across pools.

use rand::Rng;

use crate::core::constants::ACCEPT_LANGUAGE;

/// Desktop user agents observed from real browsers.
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:119.0) Gecko/20100101 Firefox/119.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:120.0) Gecko/20100101 Firefox/120.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.0.0",
];

/// Common desktop viewport sizes.
const VIEWPORTS: &[(u32, u32)] = &[(1920, 1080), (1366, 768), (1440, 900), (1536, 864)];

/// Locale/timezone/geolocation tuples plausible for the target audience.
/// All IST; coordinates are Mumbai, Bengaluru, and Delhi.
const GEO_TUPLES: &[GeoTuple] = &[
    GeoTuple {
        locale: "en-US",
        timezone: "Asia/Kolkata",
        latitude: 19.0760,
        longitude: 72.8777,
    },
    GeoTuple {
        locale: "en-US",
        timezone: "Asia/Kolkata",
        latitude: 12.9716,
        longitude: 77.5946,
    },
    GeoTuple {
        locale: "en-IN",
        timezone: "Asia/Kolkata",
        latitude: 28.6139,
        longitude: 77.2090,
    },
];

#[derive(Debug, Clone, Copy)]
struct GeoTuple {
    locale: &'static str,
    timezone: &'static str,
    latitude: f64,
    longitude: f64,
}

/// A randomized browser identity, bound to one session for its lifetime.
#[derive(Debug, Clone, PartialEq)]
pub struct FingerprintProfile {
    /// The User-Agent string, presented both by the browser and by the
    /// matching network-layer requests.
    pub user_agent: String,
    /// Viewport width in CSS pixels.
    pub viewport_width: u32,
    /// Viewport height in CSS pixels.
    pub viewport_height: u32,
    /// BCP 47 locale tag.
    pub locale: String,
    /// Accept-Language header consistent with the locale.
    pub accept_language: String,
    /// IANA timezone identifier.
    pub timezone: String,
    /// Latitude for the geolocation override.
    pub latitude: f64,
    /// Longitude for the geolocation override.
    pub longitude: f64,
}

impl FingerprintProfile {
    /// Samples a profile from the thread-local RNG.
    #[must_use]
    pub fn random() -> Self {
        Self::generate_with(&mut rand::rng())
    }

    /// Samples a profile from the given RNG. Pure function of its random
    /// source; useful for deterministic tests.
    pub fn generate_with<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let ua = USER_AGENTS[rng.random_range(0..USER_AGENTS.len())];
        let (w, h) = VIEWPORTS[rng.random_range(0..VIEWPORTS.len())];
        let geo = GEO_TUPLES[rng.random_range(0..GEO_TUPLES.len())];

        Self {
            user_agent: ua.to_string(),
            viewport_width: w,
            viewport_height: h,
            locale: geo.locale.to_string(),
            accept_language: ACCEPT_LANGUAGE.to_string(),
            timezone: geo.timezone.to_string(),
            latitude: geo.latitude,
            longitude: geo.longitude,
        }
    }
}
