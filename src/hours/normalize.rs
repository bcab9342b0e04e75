//! Canonical whitespace and dashes for provider hours text.

/// Collapse dash variants to `-`, exotic spaces to ` `, whitespace runs to a
/// single space, and trim.
///
/// Providers emit "9:00\u{202f}AM\u{2009}\u{2013}\u{2009}5:00\u{202f}PM"; after this
/// it reads "9:00 AM - 5:00 PM".
pub fn normalize_hours_text(input: &str) -> String {
    let mapped: String = input
        .chars()
        .map(|c| match c {
            // hyphen, non-breaking hyphen, figure dash, en dash, em dash, bar
            '\u{2010}'..='\u{2015}' | '\u{2212}' => '-',
            '\u{00a0}' | '\u{2007}' | '\u{2009}' | '\u{200a}' | '\u{202f}' => ' ',
            other => other,
        })
        .collect();

    mapped.split_whitespace().collect::<Vec<_>>().join(" ")
}
