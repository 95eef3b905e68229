//! Serde default functions for config fields.

pub(super) fn default_data_dir() -> String {
    "~/.chapchap".to_string()
}
pub(super) fn default_log_level() -> String {
    "info".to_string()
}
pub(super) fn default_base_url() -> String {
    "https://api.liabluck.com".to_string()
}
pub(super) fn default_integration() -> String {
    "WHATSAPP-BAILEYS".to_string()
}
pub(super) fn default_request_timeout_secs() -> u64 {
    30
}
pub(super) fn default_qr_initial_delay_ms() -> u64 {
    1000
}
pub(super) fn default_qr_retry_interval_ms() -> u64 {
    2000
}
pub(super) fn default_qr_max_retries() -> u32 {
    3
}
pub(super) fn default_qr_max_retries_not_ready() -> u32 {
    10
}
pub(super) fn default_poll_interval_ms() -> u64 {
    2000
}
pub(super) fn default_link_timeout_secs() -> u64 {
    300
}
pub(super) fn default_db_path() -> String {
    "~/.chapchap/data/chapchap.db".to_string()
}
pub(super) fn default_send_delay_ms() -> u64 {
    1200
}
pub(super) fn default_presence() -> String {
    "composing".to_string()
}
