// src/application/dto/request.rs

/// Per-request facts captured at the HTTP edge and used to fingerprint
/// the device behind a user session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub ip_address: String,
    pub user_agent: String,
}

impl RequestContext {
    pub fn new(ip_address: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            ip_address: strip_port(&ip_address.into()),
            user_agent: user_agent.into(),
        }
    }

    /// Browser name and major version, e.g. `Firefox 120`.
    pub fn device_name(&self) -> String {
        let ua = self.user_agent.as_str();
        // Order matters: Edge and Opera also advertise Chrome, Chrome advertises Safari.
        const BROWSERS: [(&str, &str); 6] = [
            ("Edg/", "Edge"),
            ("OPR/", "Opera"),
            ("Firefox/", "Firefox"),
            ("Chrome/", "Chrome"),
            ("Version/", "Safari"),
            ("curl/", "curl"),
        ];
        for (marker, name) in BROWSERS {
            if let Some(pos) = ua.find(marker) {
                let version = &ua[pos + marker.len()..];
                let major: String = version.chars().take_while(char::is_ascii_digit).collect();
                return if major.is_empty() {
                    name.to_string()
                } else {
                    format!("{name} {major}")
                };
            }
        }
        if ua.trim().is_empty() {
            "Unknown".to_string()
        } else {
            ua.split('/').next().unwrap_or(ua).trim().to_string()
        }
    }

    pub fn device_type(&self) -> String {
        let ua = self.user_agent.as_str();
        let kind = if ua.contains("iPad") || ua.contains("Tablet") {
            "tablet"
        } else if ua.contains("Mobi") || ua.contains("iPhone") || ua.contains("Android") {
            "mobile"
        } else if ua.contains("Windows") || ua.contains("Macintosh") || ua.contains("X11") {
            "computer"
        } else {
            "unknown"
        };
        kind.to_string()
    }

    pub fn device_os(&self) -> String {
        let ua = self.user_agent.as_str();
        let os = if ua.contains("Android") {
            "Android"
        } else if ua.contains("iPhone") || ua.contains("iPad") {
            "iOS"
        } else if ua.contains("Windows") {
            "Windows"
        } else if ua.contains("Mac OS X") || ua.contains("Macintosh") {
            "macOS"
        } else if ua.contains("Linux") || ua.contains("X11") {
            "Linux"
        } else {
            "Unknown"
        };
        os.to_string()
    }
}

/// `1.2.3.4:5678` → `1.2.3.4`, `[::1]:80` → `::1`; bare addresses pass through.
fn strip_port(addr: &str) -> String {
    let addr = addr.trim();
    if let Some(rest) = addr.strip_prefix('[') {
        return rest.split(']').next().unwrap_or(rest).to_string();
    }
    match addr.rsplit_once(':') {
        Some((host, port)) if !host.contains(':') && port.chars().all(|c| c.is_ascii_digit()) => {
            host.to_string()
        }
        _ => addr.to_string(),
    }
}
