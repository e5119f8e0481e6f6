//! HTTP client for the fleet backend.
//!
//! Every call carries the caller's bearer token. A `401` from the backend is
//! surfaced as [`AppError::Unauthorized`] so the session layer can sign the
//! user out; other failures keep the backend's status and message.

use std::time::{Duration, Instant};

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::AppError;
use crate::models::delivery::{AssignDriver, Delivery, DeliveryPayload};
use crate::models::driver::{Driver, DriverUpdate, NewDriver};
use crate::models::location::LocationLog;
use crate::models::session::{Credentials, LoginResponse};
use crate::observability::metrics::Metrics;

#[derive(Deserialize)]
#[serde(untagged)]
enum Envelope<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Envelope<T> {
    fn into_inner(self) -> T {
        match self {
            Envelope::Wrapped { data } => data,
            Envelope::Bare(value) => value,
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(alias = "error")]
    message: Option<String>,
}

#[derive(Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
    metrics: Metrics,
}

impl BackendClient {
    pub fn new(base_url: &str, timeout: Duration, metrics: Metrics) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| AppError::Internal(format!("failed to build http client: {err}")))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            metrics,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, AppError> {
        let request = self
            .request(Method::POST, "/auth/login", None)
            .json(credentials);
        self.fetch("auth_login", request).await
    }

    pub async fn list_drivers(&self, token: &str) -> Result<Vec<Driver>, AppError> {
        let request = self.request(Method::GET, "/drivers", Some(token));
        self.fetch("drivers_list", request).await
    }

    pub async fn create_driver(&self, token: &str, driver: &NewDriver) -> Result<(), AppError> {
        let request = self.request(Method::POST, "/drivers", Some(token)).json(driver);
        self.execute("drivers_create", request).await
    }

    pub async fn update_driver(
        &self,
        token: &str,
        id: &str,
        update: &DriverUpdate,
    ) -> Result<(), AppError> {
        let path = format!("/drivers/{}", path_segment(id)?);
        let request = self.request(Method::PUT, &path, Some(token)).json(update);
        self.execute("drivers_update", request).await
    }

    pub async fn delete_driver(&self, token: &str, id: &str) -> Result<(), AppError> {
        let path = format!("/drivers/{}", path_segment(id)?);
        let request = self.request(Method::DELETE, &path, Some(token));
        self.execute("drivers_delete", request).await
    }

    pub async fn list_deliveries(&self, token: &str) -> Result<Vec<Delivery>, AppError> {
        let request = self.request(Method::GET, "/deliveries", Some(token));
        self.fetch("deliveries_list", request).await
    }

    pub async fn get_delivery(&self, token: &str, id: &str) -> Result<Delivery, AppError> {
        let path = format!("/deliveries/{}", path_segment(id)?);
        let request = self.request(Method::GET, &path, Some(token));
        self.fetch("deliveries_get", request).await
    }

    pub async fn create_delivery(
        &self,
        token: &str,
        delivery: &DeliveryPayload,
    ) -> Result<(), AppError> {
        let request = self
            .request(Method::POST, "/deliveries", Some(token))
            .json(delivery);
        self.execute("deliveries_create", request).await
    }

    pub async fn update_delivery(
        &self,
        token: &str,
        id: &str,
        delivery: &DeliveryPayload,
    ) -> Result<(), AppError> {
        let path = format!("/deliveries/{}", path_segment(id)?);
        let request = self.request(Method::PUT, &path, Some(token)).json(delivery);
        self.execute("deliveries_update", request).await
    }

    pub async fn delete_delivery(&self, token: &str, id: &str) -> Result<(), AppError> {
        let path = format!("/deliveries/{}", path_segment(id)?);
        let request = self.request(Method::DELETE, &path, Some(token));
        self.execute("deliveries_delete", request).await
    }

    pub async fn assign_delivery(
        &self,
        token: &str,
        id: &str,
        driver_id: &str,
    ) -> Result<(), AppError> {
        let path = format!("/deliveries/{}/assign", path_segment(id)?);
        let body = AssignDriver {
            driver_id: driver_id.to_string(),
        };
        let request = self.request(Method::POST, &path, Some(token)).json(&body);
        self.execute("deliveries_assign", request).await
    }

    pub async fn complete_delivery(&self, token: &str, id: &str) -> Result<(), AppError> {
        let path = format!("/deliveries/{}/complete", path_segment(id)?);
        let request = self.request(Method::POST, &path, Some(token));
        self.execute("deliveries_complete", request).await
    }

    pub async fn approve_delivery(&self, token: &str, id: &str) -> Result<(), AppError> {
        let path = format!("/deliveries/{}/approve", path_segment(id)?);
        let request = self.request(Method::POST, &path, Some(token));
        self.execute("deliveries_approve", request).await
    }

    /// Newest ping per driver.
    pub async fn latest_locations(&self, token: &str) -> Result<Vec<LocationLog>, AppError> {
        let request = self.request(Method::GET, "/locations/latest", Some(token));
        self.fetch("locations_latest", request).await
    }

    pub async fn driver_locations(
        &self,
        token: &str,
        driver_id: &str,
        limit: usize,
    ) -> Result<Vec<LocationLog>, AppError> {
        let path = format!("/locations/driver/{}", path_segment(driver_id)?);
        let request = self
            .request(Method::GET, &path, Some(token))
            .query(&[("limit", limit)]);
        self.fetch("locations_driver", request).await
    }

    fn request(&self, method: Method, path: &str, token: Option<&str>) -> RequestBuilder {
        let request = self.http.request(method, format!("{}{}", self.base_url, path));
        match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn fetch<T>(&self, endpoint: &'static str, request: RequestBuilder) -> Result<T, AppError>
    where
        T: DeserializeOwned,
    {
        let response = self.dispatch(endpoint, request).await?;
        let body = response.json::<Envelope<T>>().await.map_err(|err| {
            warn!(endpoint, error = %err, "backend returned an unreadable body");
            AppError::from(err)
        })?;
        Ok(body.into_inner())
    }

    async fn execute(&self, endpoint: &'static str, request: RequestBuilder) -> Result<(), AppError> {
        self.dispatch(endpoint, request).await.map(|_| ())
    }

    async fn dispatch(
        &self,
        endpoint: &'static str,
        request: RequestBuilder,
    ) -> Result<Response, AppError> {
        let start = Instant::now();
        let result = match request.send().await {
            Ok(response) => check_status(response).await,
            Err(err) => Err(AppError::from(err)),
        };

        let outcome = match &result {
            Ok(_) => "success",
            Err(AppError::Unauthorized(_)) => "unauthorized",
            Err(AppError::Upstream { .. }) => "rejected",
            Err(_) => "error",
        };
        self.metrics
            .observe_backend_call(endpoint, outcome, start.elapsed().as_secs_f64());

        match &result {
            Ok(_) => debug!(endpoint, "backend call succeeded"),
            Err(err) => warn!(endpoint, error = %err, "backend call failed"),
        }

        result
    }
}

async fn check_status(response: Response) -> Result<Response, AppError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .ok()
        .and_then(|body| body.message)
        .unwrap_or_else(|| {
            if text.trim().is_empty() {
                status.canonical_reason().unwrap_or("request failed").to_string()
            } else {
                text.trim().to_string()
            }
        });

    if status == StatusCode::UNAUTHORIZED {
        return Err(AppError::Unauthorized(message));
    }

    Err(AppError::Upstream {
        status: status.as_u16(),
        message,
    })
}

fn path_segment(id: &str) -> Result<&str, AppError> {
    let valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

    if valid {
        Ok(id)
    } else {
        Err(AppError::BadRequest(format!("invalid id: {id:?}")))
    }
}
