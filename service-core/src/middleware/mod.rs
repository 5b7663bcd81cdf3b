pub mod client_ip;
pub mod ip_allowlist;
pub mod rate_limit;
pub mod security_headers;
pub mod tracing;
