pub mod home;
pub mod login;
pub mod reports;
pub mod settings;
pub mod users;

pub fn make_path(base: &str, suffix: &str) -> String {
    if suffix.is_empty() {
        return base.to_string();
    }
    let base = base.trim_end_matches('/');
    format!("{}{}", base, suffix)
}

pub fn limit_label(daily_limit: Option<i32>) -> String {
    match common::effective_limit(daily_limit) {
        0 => "Ilimitado".to_string(),
        limit => limit.to_string(),
    }
}
