// IP Geolocation Client - Command line lookup tool
// Copyright (C) 2025 Akaere Networks
// SPDX-License-Identifier: AGPL-3.0-or-later

use anyhow::{Context, Result};
use clap::Parser;

use ipgeolocation::config::{API_KEY_ENV, Cli};
use ipgeolocation::core::logger::{self, LogLevel, Logger, LoggerConfig};
use ipgeolocation::{Client, ClientConfig, GeoError, LookupRequest};

fn build_request(args: &Cli) -> (LookupRequest, bool) {
    let bulk = args.bulk || args.ips.len() > 1;
    let mut request = if bulk {
        LookupRequest::bulk(args.ips.iter().cloned())
    } else {
        LookupRequest::single(args.ips[0].clone())
    };

    request.fields = args.fields.clone();
    request.language = args.lang.clone().unwrap_or_default();
    request.include_security = args.security;
    request.include_hostname = args.hostname;
    request.include_live_hostname = args.live_hostname;
    request.include_hostname_fallback_live = args.hostname_fallback_live;
    request.include_user_agent = args.useragent;

    (request, bulk)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let args = Cli::parse();

    Logger::init(LoggerConfig {
        min_level: if args.debug { LogLevel::Debug } else { LogLevel::Warning },
        ..LoggerConfig::default()
    })?;

    let api_key = match args.api_key.clone() {
        Some(key) => key,
        None => std::env::var(API_KEY_ENV)
            .with_context(|| format!("no API key given and {} is not set", API_KEY_ENV))?,
    };

    let mut config = ClientConfig::new(api_key, args.lang.as_deref(), None)?;
    if let Some(endpoint) = args.endpoint.as_deref() {
        config = config.with_endpoint(endpoint)?;
    }
    let client = Client::new(config);

    let (request, bulk) = build_request(&args);
    let task = format!("lookup of {}", args.ips.join(", "));
    let outcome = if bulk {
        client.lookup_bulk(&request).await
    } else {
        client.lookup(&request).await
    };

    match outcome {
        Ok(result) => {
            logger::log_task_complete(&task);
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Err(GeoError::Decode { source, partial }) => {
            logger::log_task_failed(&task, &source.to_string());
            eprintln!("partial result:\n{}", serde_json::to_string_pretty(&partial)?);
            Err(source).context("failed to decode response body")
        }
        Err(err) => {
            logger::log_task_failed(&task, &err.to_string());
            Err(err.into())
        }
    }
}
