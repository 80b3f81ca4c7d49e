/// Non-empty lines of command output with surrounding double quotes removed.
///
/// `sinfo -o` echoes the quotes of a quoted format string back, so every
/// record gets the same treatment.
pub fn records(output: &str) -> impl Iterator<Item = &str> {
    output
        .lines()
        .filter(|line| !line.is_empty())
        .map(|line| line.trim_matches('"'))
}
