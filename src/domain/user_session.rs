// src/domain/user_session.rs
use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSessionClient {
    pub id: i64,
    pub user_session_id: i64,
    pub client_id: i64,
    pub started: DateTime<Utc>,
    pub last_accessed: DateTime<Utc>,
}

/// Browser-level login shared by every client the user signs into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSession {
    pub id: i64,
    pub session_identifier: String,
    pub user_id: i64,
    pub started: DateTime<Utc>,
    pub last_accessed: DateTime<Utc>,
    pub auth_time: DateTime<Utc>,
    pub auth_methods: String,
    pub acr_level: String,
    /// Comma-separated list; grows as the session is seen from new addresses.
    pub ip_address: String,
    pub device_name: String,
    pub device_type: String,
    pub device_os: String,
    pub clients: Vec<UserSessionClient>,
}

impl UserSession {
    fn is_valid_since_started(&self, now: DateTime<Utc>, max_lifetime_in_seconds: i64) -> bool {
        now <= self.started + Duration::seconds(max_lifetime_in_seconds)
    }

    fn is_valid_since_last_accessed(&self, now: DateTime<Utc>, idle_timeout_in_seconds: i64) -> bool {
        now <= self.last_accessed + Duration::seconds(idle_timeout_in_seconds)
    }

    fn is_valid_since_auth_time(&self, now: DateTime<Utc>, max_age_in_seconds: i64) -> bool {
        (now - self.auth_time).num_seconds() <= max_age_in_seconds
    }

    /// Idle timeout and absolute lifetime must both hold; a requested
    /// `max_age` additionally bounds the time since authentication.
    pub fn is_valid(
        &self,
        now: DateTime<Utc>,
        idle_timeout_in_seconds: i64,
        max_lifetime_in_seconds: i64,
        requested_max_age_in_seconds: Option<i64>,
    ) -> bool {
        let valid = self.is_valid_since_last_accessed(now, idle_timeout_in_seconds)
            && self.is_valid_since_started(now, max_lifetime_in_seconds);

        match requested_max_age_in_seconds {
            Some(max_age) => valid && self.is_valid_since_auth_time(now, max_age),
            None => valid,
        }
    }

    pub fn same_device(&self, other: &UserSession) -> bool {
        self.device_name == other.device_name
            && self.device_type == other.device_type
            && self.device_os == other.device_os
    }

    /// Appends `ip` unless the stored string already contains it.
    pub fn record_ip_address(&mut self, ip: &str) {
        if ip.is_empty() || self.ip_address.contains(ip) {
            return;
        }
        if self.ip_address.is_empty() {
            self.ip_address = ip.to_string();
        } else {
            self.ip_address = format!("{},{}", self.ip_address, ip);
        }
    }

    /// Advances `last_accessed` for the session and for `client_id`,
    /// attaching the client when it is new to this session.
    pub fn touch_client(&mut self, client_id: i64, now: DateTime<Utc>) {
        if now > self.last_accessed {
            self.last_accessed = now;
        }

        if let Some(existing) = self.clients.iter_mut().find(|c| c.client_id == client_id) {
            if now > existing.last_accessed {
                existing.last_accessed = now;
            }
            return;
        }

        self.clients.push(UserSessionClient {
            id: 0,
            user_session_id: self.id,
            client_id,
            started: now,
            last_accessed: now,
        });
    }
}
