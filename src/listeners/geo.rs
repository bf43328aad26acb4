use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Deserialize;

/// Country reported whenever a lookup cannot produce a real answer.
pub const UNKNOWN_COUNTRY: &str = "Unknown";

/// ip-api.com compatible endpoint; the address is appended as a path segment.
pub const DEFAULT_GEO_URL: &str = "http://ip-api.com/json";

pub const DEFAULT_GEO_TIMEOUT: Duration = Duration::from_secs(2);

/// Resolved countries kept in memory before the cache is reset.
const CACHE_LIMIT: usize = 4096;

#[derive(Debug, Clone)]
pub struct GeoConfig {
    pub base_url: String,
    /// Hard limit on one lookup, connect through body.
    pub timeout: Duration,
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GEO_URL.to_string(),
            timeout: DEFAULT_GEO_TIMEOUT,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GeoError {
    #[error("failed to build geolocation client: {0}")]
    Client(#[from] reqwest::Error),
}

#[derive(Deserialize)]
struct GeoResponse {
    status: Option<String>,
    country: Option<String>,
}

struct GeoInner {
    client: reqwest::Client,
    base_url: String,
    cache: Mutex<HashMap<IpAddr, String>>,
}

/// Best-effort IP to country resolution against a third-party service.
///
/// Never fails: timeouts, HTTP errors, malformed bodies and non-public addresses
/// all resolve to [`UNKNOWN_COUNTRY`]. Successful answers are cached per address.
#[derive(Clone)]
pub struct GeoLookup {
    inner: Option<Arc<GeoInner>>,
}

impl GeoLookup {
    pub fn new(config: GeoConfig) -> Result<Self, GeoError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            inner: Some(Arc::new(GeoInner {
                client,
                base_url: config.base_url.trim_end_matches('/').to_string(),
                cache: Mutex::new(HashMap::new()),
            })),
        })
    }

    /// A lookup that answers "Unknown" without touching the network.
    pub fn disabled() -> Self {
        Self { inner: None }
    }

    pub async fn resolve_country(&self, ip: &str) -> String {
        let Some(inner) = &self.inner else {
            return UNKNOWN_COUNTRY.to_string();
        };
        let Ok(addr) = ip.parse::<IpAddr>() else {
            tracing::debug!("Not an IP address, skipping geolocation: {:?}", ip);
            return UNKNOWN_COUNTRY.to_string();
        };
        if !is_public(&addr) {
            return UNKNOWN_COUNTRY.to_string();
        }

        let cached = inner
            .cache
            .lock()
            .expect("geo cache lock poisoned")
            .get(&addr)
            .cloned();
        if let Some(country) = cached {
            return country;
        }

        let Some(country) = inner.fetch(&addr).await else {
            return UNKNOWN_COUNTRY.to_string();
        };
        let mut cache = inner.cache.lock().expect("geo cache lock poisoned");
        if cache.len() >= CACHE_LIMIT {
            cache.clear();
        }
        cache.insert(addr, country.clone());
        country
    }
}

impl GeoInner {
    async fn fetch(&self, addr: &IpAddr) -> Option<String> {
        let url = format!("{}/{}", self.base_url, addr);
        let response = match self.client.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!("Geolocation request for {} failed: {}", addr, e);
                return None;
            }
        };
        let body: GeoResponse = match response.error_for_status() {
            Ok(r) => match r.json().await {
                Ok(b) => b,
                Err(e) => {
                    tracing::debug!("Geolocation response for {} unreadable: {}", addr, e);
                    return None;
                }
            },
            Err(e) => {
                tracing::debug!("Geolocation service rejected {}: {}", addr, e);
                return None;
            }
        };

        if body.status.as_deref() == Some("fail") {
            return None;
        }
        body.country.filter(|c| !c.trim().is_empty())
    }
}

/// Addresses a public geolocation service could know about.
fn is_public(addr: &IpAddr) -> bool {
    match addr {
        IpAddr::V4(v4) => {
            !(v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_unspecified()
                || v4.is_broadcast())
        }
        IpAddr::V6(v6) => {
            if let Some(mapped) = v6.to_ipv4_mapped() {
                return is_public(&IpAddr::V4(mapped));
            }
            let first = v6.segments()[0];
            !(v6.is_loopback()
                || v6.is_unspecified()
                || (first & 0xfe00) == 0xfc00
                || (first & 0xffc0) == 0xfe80)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn private_and_loopback_addresses_are_not_public() {
        for ip in ["127.0.0.1", "10.1.2.3", "192.168.0.9", "169.254.1.1", "::1", "fe80::1", "fd00::1", "::ffff:10.0.0.1"] {
            let addr: IpAddr = ip.parse().unwrap();
            assert!(!is_public(&addr), "{ip} should not be public");
        }
    }

    #[test]
    fn routable_addresses_are_public() {
        for ip in ["8.8.8.8", "2001:4860:4860::8888", "::ffff:1.1.1.1"] {
            let addr: IpAddr = ip.parse().unwrap();
            assert!(is_public(&addr), "{ip} should be public");
        }
    }
}
