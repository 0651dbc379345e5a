//! Store API calls.

use anyhow::{Context, bail};
use bytes::Bytes;
use fleet_sdk::{HttpRequest, Result, poll_failure, push_failure};
use http::Method;
use http::header::{ACCEPT, CONTENT_TYPE};
use serde_json::Value;

use crate::config::Config;
use crate::model::Vehicle;

/// Retrieves the full fleet listing.
///
/// Elements are returned unvalidated so that one malformed entity cannot fail
/// the whole poll.
///
/// # Errors
///
/// Returns a poll failure when the request fails, the store answers with a
/// non-success status, or the body is not a JSON array.
pub async fn vehicles<P: HttpRequest>(provider: &P, config: &Config) -> Result<Vec<Value>> {
    let fetch = async {
        let request = http::Request::builder()
            .method(Method::GET)
            .uri(config.vehicles_url())
            .header(ACCEPT, "application/json")
            .body(Bytes::new())
            .context("building vehicles request")?;

        let body = send(provider, request).await.context("fleet API request failed")?;
        serde_json::from_slice::<Vec<Value>>(&body).context("decoding fleet listing")
    };

    fetch.await.map_err(|e| poll_failure!("{e:#}"))
}

/// Upserts this device's state in the store.
///
/// # Errors
///
/// Returns a push failure when the request fails or the store answers with a
/// non-success status. The response body is ignored.
pub async fn update<P: HttpRequest>(provider: &P, config: &Config, vehicle: &Vehicle) -> Result<()> {
    let push = async {
        let body = serde_json::to_vec(vehicle).context("serializing vehicle")?;
        let request = http::Request::builder()
            .method(Method::POST)
            .uri(config.update_url())
            .header(CONTENT_TYPE, "application/json")
            .body(Bytes::from(body))
            .context("building update request")?;

        send(provider, request).await.with_context(|| format!("updating {}", vehicle.id))?;
        anyhow::Ok(())
    };

    push.await.map_err(|e| push_failure!("{e:#}"))
}

/// Asks the store to forget an entity.
///
/// # Errors
///
/// Returns a push failure when the request fails or the store answers with a
/// non-success status, including `404` for an unknown id.
pub async fn remove<P: HttpRequest>(provider: &P, config: &Config, id: &str) -> Result<()> {
    let remove = async {
        let request = http::Request::builder()
            .method(Method::DELETE)
            .uri(config.remove_url(id))
            .body(Bytes::new())
            .context("building remove request")?;

        send(provider, request).await.with_context(|| format!("removing {id}"))?;
        anyhow::Ok(())
    };

    remove.await.map_err(|e| push_failure!("{e:#}"))
}

async fn send<P: HttpRequest>(provider: &P, request: http::Request<Bytes>) -> anyhow::Result<Bytes> {
    let response = provider.fetch(request).await?;
    if !response.status().is_success() {
        bail!("store returned {}", response.status());
    }
    Ok(response.into_body())
}
