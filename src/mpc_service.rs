//! # Minor Planet Center query service
//!
//! The catalog and observation queries are external collaborators. [`MpcQuery`] is the seam the
//! rest of the crate depends on; [`MpcWebService`] is its HTTP implementation over the public MPC
//! endpoints.
//!
//! ## Endpoints
//! -----------------
//! * **Catalog** – `GET <orbits_url>?orbit_type=<n>&json=1` (basic auth `mpc_ws`), answering a
//!   JSON array of orbit rows. The `comet` class uses the comet orbit endpoint instead.
//! * **Observations** – `GET <observations_url>/<number>.txt`, answering the MPC 80-column
//!   export of the object, turned into a batch by
//!   [`observations_from_80col`](crate::observation::observations_from_80col). A `404` means the
//!   service has nothing for this number and yields a `null` batch.
//!
//! ## Concurrency
//! -----------------
//! Requests are issued one at a time: each call blocks on a private current-thread
//! [`tokio`] runtime until the response body is fully read. There is no retry; transport
//! failures surface as [`XmatchError::ReqwestError`] or [`XmatchError::UpstreamStatus`].
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tokio::runtime::Runtime;
use tracing::debug;

use crate::{
    catalog_record::RawCatalog,
    config::XmatchConfig,
    observation::{observations_from_80col, ObservationBatch},
    xmatch_errors::XmatchError,
};

const MPC_WS_USER: &str = "mpc_ws";
const MPC_WS_PASSWORD: &str = "mpc!!ws";

/// Catalog and observation queries of the upstream minor-planet service.
pub trait MpcQuery {
    /// List every object of `object_class` whose `orbit_type` equals the given filter.
    fn list_objects(&self, object_class: &str, orbit_type: i64) -> Result<RawCatalog, XmatchError>;

    /// List the observations of the object with permanent number `number`.
    fn list_observations(&self, number: &str) -> Result<ObservationBatch, XmatchError>;
}

impl<Q: MpcQuery + ?Sized> MpcQuery for &Q {
    fn list_objects(&self, object_class: &str, orbit_type: i64) -> Result<RawCatalog, XmatchError> {
        (**self).list_objects(object_class, orbit_type)
    }

    fn list_observations(&self, number: &str) -> Result<ObservationBatch, XmatchError> {
        (**self).list_observations(number)
    }
}

/// HTTP implementation of [`MpcQuery`].
#[derive(Debug)]
pub struct MpcWebService {
    http_client: Client,
    runtime: Runtime,
    orbits_url: String,
    comet_orbits_url: String,
    observations_url: String,
}

impl MpcWebService {
    /// Build the service from the endpoints and timeout of `config`.
    pub fn new(config: &XmatchConfig) -> Result<Self, XmatchError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        let http_client = Client::builder()
            .timeout(config.http_timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(MpcWebService {
            http_client,
            runtime,
            orbits_url: config.orbits_url.clone(),
            comet_orbits_url: config.comet_orbits_url.clone(),
            observations_url: config.observations_url.trim_end_matches('/').to_string(),
        })
    }

    fn orbits_endpoint(&self, object_class: &str) -> Result<&str, XmatchError> {
        match object_class {
            "asteroid" => Ok(&self.orbits_url),
            "comet" => Ok(&self.comet_orbits_url),
            other => Err(XmatchError::InvalidConfig(format!(
                "unsupported object class '{other}', expected 'asteroid' or 'comet'"
            ))),
        }
    }
}

/// Interpret the JSON answer of the orbit search as catalog rows.
pub(crate) fn rows_from_json(payload: Value) -> Result<RawCatalog, XmatchError> {
    match payload {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(row) => Ok(row),
                other => Err(XmatchError::UpstreamPayload(format!(
                    "expected an orbit row, got {other}"
                ))),
            })
            .collect(),
        Value::Object(row) => Ok(vec![row]),
        Value::Null => Ok(Vec::new()),
        other => Err(XmatchError::UpstreamPayload(format!(
            "expected a list of orbit rows, got {other}"
        ))),
    }
}

impl MpcQuery for MpcWebService {
    fn list_objects(&self, object_class: &str, orbit_type: i64) -> Result<RawCatalog, XmatchError> {
        let url = self.orbits_endpoint(object_class)?;
        debug!(url, object_class, orbit_type, "querying MPC orbit catalog");

        let payload = self.runtime.block_on(async {
            let response = self
                .http_client
                .get(url)
                .basic_auth(MPC_WS_USER, Some(MPC_WS_PASSWORD))
                .query(&[("orbit_type", orbit_type.to_string()), ("json", "1".into())])
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                return Err(XmatchError::UpstreamStatus {
                    url: url.to_string(),
                    status: status.as_u16(),
                });
            }
            Ok::<Value, XmatchError>(response.json::<Value>().await?)
        })?;

        rows_from_json(payload)
    }

    fn list_observations(&self, number: &str) -> Result<ObservationBatch, XmatchError> {
        let url = format!("{}/{number}.txt", self.observations_url);
        debug!(%url, number, "querying MPC observations");

        let body = self.runtime.block_on(async {
            let response = self.http_client.get(&url).send().await?;

            let status = response.status();
            if status == StatusCode::NOT_FOUND {
                return Ok(None);
            }
            if !status.is_success() {
                return Err(XmatchError::UpstreamStatus {
                    url: url.clone(),
                    status: status.as_u16(),
                });
            }
            Ok::<Option<String>, XmatchError>(Some(response.text().await?))
        })?;

        Ok(body.map_or(Value::Null, |text| observations_from_80col(&text)))
    }
}
