//! Text normalization applied before matching and extraction

/// Fold full-width ASCII to half-width and trim surrounding whitespace.
///
/// `下さい` is rewritten to `ください` so the kanji is not read as a direction.
pub fn normalize(text: &str) -> String {
    let folded: String = text.chars().map(fold_width).collect();
    folded.trim().replace("下さい", "ください")
}

fn fold_width(c: char) -> char {
    match c {
        '\u{FF01}'..='\u{FF5E}' => char::from_u32(c as u32 - 0xFEE0).unwrap_or(c),
        '\u{3000}' => ' ',
        '\u{2212}' => '-',
        _ => c,
    }
}
