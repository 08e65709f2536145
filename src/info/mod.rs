//! Startup information fetchers
//!
//! Geo information is fetched once in the background and never blocks a
//! run. The network hint is read synchronously and cannot fail.

use crate::{
    models::GeoInfo,
    probe::ProbeContext,
    types::{DisplayField, DisplayValue},
};
use std::sync::{Arc, RwLock};
use tokio::task::JoinHandle;

/// Shown in both location slots when the lookup fails
pub const LOCATION_UNKNOWN: &str = "Could not determine location";

/// Shown when no connection-type hint is available
pub const NETWORK_UNKNOWN: &str = "Unknown";

/// Display strings for the info slots
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InfoPanel {
    pub client: Option<String>,
    pub server: Option<String>,
    pub network: Option<String>,
}

#[derive(Debug, Default)]
struct InfoState {
    panel: InfoPanel,
    client_info: String,
}

/// Info written by the fetchers and read when results are submitted
#[derive(Debug, Clone, Default)]
pub struct SharedInfo {
    inner: Arc<RwLock<InfoState>>,
}

impl SharedInfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Client location string sent with results; empty until the lookup succeeds
    pub fn client_info(&self) -> String {
        self.inner
            .read()
            .map(|state| state.client_info.clone())
            .unwrap_or_default()
    }

    pub fn panel(&self) -> InfoPanel {
        self.inner
            .read()
            .map(|state| state.panel.clone())
            .unwrap_or_default()
    }

    fn update<F: FnOnce(&mut InfoState)>(&self, apply: F) {
        if let Ok(mut state) = self.inner.write() {
            apply(&mut state);
        }
    }
}

/// One-shot lookup of `/get_geo_info`
pub struct GeoInfoFetcher;

impl GeoInfoFetcher {
    /// Fetch and publish client and server locations. Failures are logged
    /// and leave the client string empty.
    pub async fn fetch(ctx: &ProbeContext, info: &SharedInfo) -> Option<GeoInfo> {
        ctx.record("Fetching geo information...");

        match ctx.client.geo_info().await {
            Ok(geo) => {
                let client = geo.user.describe();
                let server = geo.server.describe();
                info.update(|state| {
                    state.client_info = client.clone();
                    state.panel.client = Some(client.clone());
                    state.panel.server = Some(server.clone());
                });
                ctx.show(DisplayField::ClientInfo, DisplayValue::Text(client));
                ctx.show(DisplayField::ServerInfo, DisplayValue::Text(server));
                ctx.record("Geo information loaded.");
                Some(geo)
            }
            Err(error) => {
                info.update(|state| {
                    state.panel.client = Some(LOCATION_UNKNOWN.to_string());
                    state.panel.server = Some(LOCATION_UNKNOWN.to_string());
                });
                ctx.show(DisplayField::ClientInfo, DisplayValue::Text(LOCATION_UNKNOWN.to_string()));
                ctx.show(DisplayField::ServerInfo, DisplayValue::Text(LOCATION_UNKNOWN.to_string()));
                ctx.record(&format!("Error fetching geo info: {}", error));
                None
            }
        }
    }

    /// Run the lookup in the background
    pub fn spawn(ctx: ProbeContext, info: SharedInfo) -> JoinHandle<Option<GeoInfo>> {
        tokio::spawn(async move { Self::fetch(&ctx, &info).await })
    }
}

/// Connection-type hint such as `4g` or `wifi`
pub struct NetworkInfo;

impl NetworkInfo {
    /// `~4g`, `~Wifi`, or `Unknown` without a hint
    pub fn describe(effective_type: Option<&str>) -> String {
        let hint = effective_type.map(str::trim).unwrap_or_default();
        let mut chars = hint.chars();
        match chars.next() {
            Some(first) => format!("~{}{}", first.to_uppercase(), chars.as_str()),
            None => NETWORK_UNKNOWN.to_string(),
        }
    }

    pub fn apply(ctx: &ProbeContext, info: &SharedInfo, effective_type: Option<&str>) -> String {
        let description = Self::describe(effective_type);
        info.update(|state| state.panel.network = Some(description.clone()));
        ctx.show(DisplayField::NetworkInfo, DisplayValue::Text(description.clone()));
        description
    }
}
