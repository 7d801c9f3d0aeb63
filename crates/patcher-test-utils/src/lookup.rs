//! Scripted lookup client

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use patcher_lookup::{LookupClient, LookupError};
use patcher_types::Tenant;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// [`LookupClient`] answering from a per-code script
///
/// Codes without a script answer `Ok(None)`. Tracks every call and the
/// peak number of concurrent lookups.
#[derive(Debug, Default)]
pub struct ScriptedLookup {
    responses: DashMap<String, Result<Option<String>, LookupError>>,
    delay: Option<Duration>,
    readiness: Option<LookupError>,
    calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ScriptedLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `code` with a value
    #[must_use]
    pub fn with_value(self, code: &str, value: &str) -> Self {
        self.responses
            .insert(code.to_string(), Ok(Some(value.to_string())));
        self
    }

    /// Answer `code` with an error
    #[must_use]
    pub fn with_error(self, code: &str, error: LookupError) -> Self {
        self.responses.insert(code.to_string(), Err(error));
        self
    }

    /// Sleep this long inside every lookup
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Fail readiness validation
    #[must_use]
    pub fn not_ready(mut self, error: LookupError) -> Self {
        self.readiness = Some(error);
        self
    }

    /// Codes looked up, in call order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn was_called_for(&self, code: &str) -> bool {
        self.calls.lock().iter().any(|c| c == code)
    }

    /// Peak concurrent lookups observed
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LookupClient for ScriptedLookup {
    fn validate_readiness(&self) -> Result<(), LookupError> {
        match &self.readiness {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    async fn lookup(&self, _tenant: &Tenant, code: &str) -> Result<Option<String>, LookupError> {
        self.calls.lock().push(code.to_string());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = InFlight(&self.in_flight);
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.responses
            .get(code)
            .map_or(Ok(None), |response| response.value().clone())
    }
}
