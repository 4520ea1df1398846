use crate::http::{HTTPError, HTTPResult};
use crate::reddit::service::Service;
use reqwest::StatusCode;
use std::collections::HashMap;
use std::fs;
use std::sync::Mutex;

pub fn do_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn load_data(file: &str) -> String {
    fs::read_to_string(format!("tests/data/{file}.json")).expect("could not find test data")
}

/// Serves fixtures from `tests/data` instead of talking to Reddit.
///
/// Resources that have not been routed answer with a 404. Every request
/// is recorded as `resource?key=value&...` (unescaped) so tests can check
/// what would have been sent.
#[derive(Debug, Default)]
pub struct TestService {
    routes: HashMap<String, Result<String, StatusCode>>,
    requests: Mutex<Vec<String>>,
}

impl TestService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers requests for `resource` with `tests/data/<fixture>.json`.
    pub fn route(mut self, resource: &str, fixture: &str) -> Self {
        self.routes
            .insert(resource.to_string(), Ok(fixture.to_string()));
        self
    }

    /// Answers requests for `resource` with an HTTP error.
    pub fn fail(mut self, resource: &str, status: StatusCode) -> Self {
        self.routes.insert(resource.to_string(), Err(status));
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().expect("poisoned request log").clone()
    }

    fn record(&self, resource: &str, params: &[(&str, String)]) {
        let request = if params.is_empty() {
            resource.to_string()
        } else {
            let query = params
                .iter()
                .map(|(key, value)| format!("{key}={value}"))
                .collect::<Vec<_>>()
                .join("&");
            format!("{resource}?{query}")
        };
        self.requests
            .lock()
            .expect("poisoned request log")
            .push(request);
    }
}

impl Service for TestService {
    async fn get_resource(&self, resource: &str, params: &[(&str, String)]) -> HTTPResult<String> {
        self.record(resource, params);
        match self.routes.get(resource) {
            Some(Ok(fixture)) => Ok(load_data(fixture)),
            Some(Err(status)) => Err(HTTPError::Http(*status)),
            None => Err(HTTPError::Http(StatusCode::NOT_FOUND)),
        }
    }
}
