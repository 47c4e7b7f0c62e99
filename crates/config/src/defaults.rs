pub fn default_host() -> String {
    "0.0.0.0".to_string()
}

/// MT-SICS over TCP
pub fn default_tcp_port() -> u16 {
    4305
}

pub fn default_http_port() -> u16 {
    8081
}

pub fn default_shutdown_grace_secs() -> u64 {
    10
}

pub fn default_initial_weight() -> f64 {
    0.0
}

pub fn default_stable() -> bool {
    true
}

pub fn default_log_level() -> String {
    "info".to_string()
}

pub fn default_log_format() -> String {
    "pretty".to_string()
}
