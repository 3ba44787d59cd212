use super::session::RecordingSession;

/// Renders a session as CSV: a header row, then one row per sample. The
/// converted column uses the unit the session was sealed with.
pub fn to_csv(session: &RecordingSession) -> String {
    let unit_column = session.unit.speed_label().replace('/', "");
    let mut out = format!(
        "timestamp,elapsed_s,speed_mps,speed_{},latitude,longitude,accuracy_m\n",
        unit_column
    );

    for sample in &session.samples {
        let elapsed = (sample.timestamp - session.start_time).num_milliseconds() as f64 / 1000.0;
        let accuracy = sample
            .accuracy_m
            .map(|a| format!("{:.1}", a))
            .unwrap_or_default();
        out.push_str(&format!(
            "{},{:.3},{:.3},{:.3},{:.6},{:.6},{}\n",
            sample.timestamp.to_rfc3339(),
            elapsed,
            sample.speed_mps,
            session.unit.to_display_speed(sample.speed_mps),
            sample.latitude,
            sample.longitude,
            accuracy
        ));
    }

    out
}

/// File name embedding the session start, with ':' swapped for '-'.
pub fn export_filename(session: &RecordingSession) -> String {
    format!(
        "speed-session-{}.csv",
        session.start_time.to_rfc3339().replace(':', "-")
    )
}
