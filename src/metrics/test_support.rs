//! Helpers for asserting on rendered exposition text.

/// Sums every series of `name` whose labels include all of `labels`.
/// Label order in the text does not matter.
pub fn sample_value(text: &str, name: &str, labels: &[(&str, &str)]) -> f64 {
    text.lines()
        .filter(|line| !line.starts_with('#'))
        .filter_map(parse_line)
        .filter(|(series, series_labels, _)| {
            *series == name
                && labels
                    .iter()
                    .all(|(k, v)| series_labels.iter().any(|(sk, sv)| sk == k && sv == v))
        })
        .map(|(_, _, value)| value)
        .sum()
}

/// Drops `process_*` series, which change between scrapes on their own.
pub fn without_process_metrics(text: &str) -> String {
    text.lines()
        .filter(|line| !line.contains("process_"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn parse_line(line: &str) -> Option<(&str, Vec<(&str, &str)>, f64)> {
    let (head, value) = line.rsplit_once(' ')?;
    let value = value.parse().ok()?;
    let Some((name, rest)) = head.split_once('{') else {
        return Some((head, Vec::new(), value));
    };
    let labels = rest
        .trim_end_matches('}')
        .split("\",")
        .filter_map(|pair| {
            let (k, v) = pair.split_once("=\"")?;
            Some((k, v.trim_end_matches('"')))
        })
        .collect();
    Some((name, labels, value))
}
