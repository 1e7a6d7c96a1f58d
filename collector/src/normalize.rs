/// Split a fetched report body into candidate record lines.
///
/// The first line is always dropped: every feed starts with a CSV header
/// row, and we do not want to publish or dedup it. Remaining lines are
/// trimmed, and lines that are empty after trimming are dropped too.
/// Pure function of the input, so a body with zero or one line yields an
/// empty iterator.
pub fn record_lines(body: &str) -> impl Iterator<Item = &str> {
    body.lines()
        .skip(1)
        .map(str::trim)
        .filter(|line| !line.is_empty())
}
