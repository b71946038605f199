/// Milliseconds since the Unix epoch, used for participant join times.
pub fn unix_millis_now() -> u64 {
    let dur = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    dur.as_millis() as u64
}
