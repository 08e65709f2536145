//! Client and server location data returned by `/get_geo_info`

use serde::{Deserialize, Serialize};

/// `{ city, country, ip }` for one end of the connection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub ip: String,
}

impl GeoLocation {
    /// `City, Country (IP: a.b.c.d)`
    pub fn describe(&self) -> String {
        format!("{}, {} (IP: {})", self.city, self.country, self.ip)
    }
}

pub type ClientInfo = GeoLocation;
pub type ServerInfo = GeoLocation;

/// Response body of `/get_geo_info`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoInfo {
    pub user: ClientInfo,
    pub server: ServerInfo,
}
