// tests/support/mocks.rs
use async_trait::async_trait;
use authserver_core::application::{
    ApplicationResult,
    dto::TokenResponse,
    error::ApplicationError,
    ports::{time::Clock, token_endpoint::TokenEndpointClient},
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::{
    Mutex,
    atomic::{AtomicUsize, Ordering},
};

/// Clock frozen at a settable instant.
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn at_epoch_offset(seconds: i64) -> Self {
        Self::new(Utc.timestamp_opt(seconds, 0).single().expect("valid timestamp"))
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().expect("clock lock");
        *now += by;
    }

    pub fn set(&self, at: DateTime<Utc>) {
        *self.now.lock().expect("clock lock") = at;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock lock")
    }
}

/// Token endpoint that answers every refresh with a canned response.
#[derive(Default)]
pub struct StubTokenClient {
    response: Mutex<Option<TokenResponse>>,
    calls: AtomicUsize,
}

impl StubTokenClient {
    pub fn failing() -> Self {
        Self::default()
    }

    pub fn returning(response: TokenResponse) -> Self {
        Self {
            response: Mutex::new(Some(response)),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenEndpointClient for StubTokenClient {
    async fn refresh(
        &self,
        _refresh_token: &str,
        _client_id: &str,
        _client_secret: &str,
    ) -> ApplicationResult<TokenResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.response
            .lock()
            .expect("stub lock")
            .clone()
            .ok_or_else(|| ApplicationError::unauthorized("refresh rejected"))
    }
}
