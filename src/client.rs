use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// `SHA256:...` fingerprint the server key must match, if set.
    pub host_key_fingerprint: Option<String>,
    pub inactivity_timeout: Option<Duration>,
}
