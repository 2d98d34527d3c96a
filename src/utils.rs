pub fn format_duration(duration: chrono::Duration) -> String {
    let hours = duration.num_hours();
    let minutes = duration.num_minutes() % 60;
    let seconds = duration.num_seconds() % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

/// `m:ss` for short countdowns.
pub fn format_rest(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
