// IP Geolocation Client - Data models
// Copyright (C) 2025 Akaere Networks
// SPDX-License-Identifier: AGPL-3.0-or-later

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use serde_with::{DefaultOnNull, serde_as};

/// Lookup parameters supplied by the caller for one call
///
/// `ip` drives a single lookup, `ips` a bulk lookup. An empty `language` means
/// "use the configured default".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupRequest {
    pub ip: String,
    pub ips: Vec<String>,
    pub fields: Vec<String>,
    pub language: String,
    pub include_security: bool,
    pub include_hostname: bool,
    pub include_live_hostname: bool,
    pub include_hostname_fallback_live: bool,
    pub include_user_agent: bool,
}

impl LookupRequest {
    pub fn single(ip: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            ..Self::default()
        }
    }

    pub fn bulk<I, S>(ips: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ips: ips.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }
}

#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Currency {
    #[serde_as(as = "DefaultOnNull")]
    pub code: String,
    #[serde_as(as = "DefaultOnNull")]
    pub name: String,
    #[serde_as(as = "DefaultOnNull")]
    pub symbol: String,
}

#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeZone {
    #[serde_as(as = "DefaultOnNull")]
    pub name: String,
    #[serde_as(as = "DefaultOnNull")]
    pub offset: i64,
    #[serde_as(as = "DefaultOnNull")]
    pub current_time: String,
    #[serde_as(as = "DefaultOnNull")]
    pub current_time_unix: f64,
    #[serde_as(as = "DefaultOnNull")]
    pub is_dst: bool,
    #[serde_as(as = "DefaultOnNull")]
    pub dst_savings: i64,
}

/// Geolocation record returned by the provider
///
/// Latitude and longitude arrive as strings and are kept that way. Keys the
/// provider omits (e.g. when `fields` narrows the reply) and keys sent as
/// `null` decode to empty values.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupResult {
    #[serde_as(as = "DefaultOnNull")]
    pub ip: String,
    #[serde_as(as = "DefaultOnNull")]
    pub hostname: String,
    #[serde_as(as = "DefaultOnNull")]
    pub continent_code: String,
    #[serde_as(as = "DefaultOnNull")]
    pub continent_name: String,
    #[serde_as(as = "DefaultOnNull")]
    pub country_code2: String,
    #[serde_as(as = "DefaultOnNull")]
    pub country_code3: String,
    #[serde_as(as = "DefaultOnNull")]
    pub country_name: String,
    #[serde_as(as = "DefaultOnNull")]
    pub country_capital: String,
    #[serde_as(as = "DefaultOnNull")]
    pub state_prov: String,
    #[serde_as(as = "DefaultOnNull")]
    pub district: String,
    #[serde_as(as = "DefaultOnNull")]
    pub city: String,
    #[serde_as(as = "DefaultOnNull")]
    pub zipcode: String,
    #[serde_as(as = "DefaultOnNull")]
    pub latitude: String,
    #[serde_as(as = "DefaultOnNull")]
    pub longitude: String,
    #[serde_as(as = "DefaultOnNull")]
    pub is_eu: bool,
    #[serde_as(as = "DefaultOnNull")]
    pub calling_code: String,
    #[serde_as(as = "DefaultOnNull")]
    pub country_tld: String,
    #[serde_as(as = "DefaultOnNull")]
    pub languages: String,
    #[serde_as(as = "DefaultOnNull")]
    pub country_flag: String,
    #[serde_as(as = "DefaultOnNull")]
    pub geoname_id: String,
    #[serde_as(as = "DefaultOnNull")]
    pub isp: String,
    #[serde_as(as = "DefaultOnNull")]
    pub connection_type: String,
    #[serde_as(as = "DefaultOnNull")]
    pub organization: String,
    #[serde_as(as = "DefaultOnNull")]
    pub asn: String,
    #[serde_as(as = "DefaultOnNull")]
    pub currency: Currency,
    #[serde_as(as = "DefaultOnNull")]
    pub time_zone: TimeZone,
}

impl LookupResult {
    /// Recover what can be decoded from a body that failed to decode as a whole
    ///
    /// Every top-level key is tried on its own and kept only if it decodes. The
    /// `currency` and `time_zone` records are filtered the same way one level
    /// down, so one bad leaf does not drop its siblings. Anything that is not a
    /// JSON object yields the empty result.
    pub fn salvage(body: &[u8]) -> Self {
        let Ok(Value::Object(mut map)) = serde_json::from_slice::<Value>(body) else {
            return Self::default();
        };

        if let Some(Value::Object(inner)) = map.remove("currency") {
            map.insert("currency".into(), Value::Object(usable_keys::<Currency>(inner)));
        }
        if let Some(Value::Object(inner)) = map.remove("time_zone") {
            map.insert("time_zone".into(), Value::Object(usable_keys::<TimeZone>(inner)));
        }

        serde_json::from_value(Value::Object(usable_keys::<LookupResult>(map))).unwrap_or_default()
    }
}

/// Keep only the entries of `map` that decode into `T` on their own
fn usable_keys<T: DeserializeOwned>(map: Map<String, Value>) -> Map<String, Value> {
    map.into_iter()
        .filter(|(key, value)| {
            let mut single = Map::new();
            single.insert(key.clone(), value.clone());
            serde_json::from_value::<T>(Value::Object(single)).is_ok()
        })
        .collect()
}
