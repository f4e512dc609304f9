pub fn format_minutes(minutes: i64) -> String {
    let minutes = minutes.max(0);
    let hours = minutes / 60;
    let rest = minutes % 60;
    match (hours, rest) {
        (0, rest) => format!("{rest}m"),
        (hours, 0) => format!("{hours}h"),
        (hours, rest) => format!("{hours}h {rest}m"),
    }
}

pub(crate) fn exclusion_footnote(excluded_minutes: i64, excluded_entries: usize) -> String {
    let noun = if excluded_entries == 1 { "entry" } else { "entries" };
    format!(
        "Excluding {} ({excluded_entries} {noun}) without a start time",
        format_minutes(excluded_minutes)
    )
}
