use crate::model::{NormalizedPoint, RecognizedWord};

pub const DEFAULT_HIT_TOLERANCE: f64 = 0.01;

/// Pick the word under `point`.
///
/// Candidates are words whose box, grown by `tolerance`, contains the point.
/// The candidate with the nearest centroid wins; equal distances keep the
/// earlier word.
pub fn select_word(
    words: &[RecognizedWord],
    point: NormalizedPoint,
    tolerance: f64,
) -> Option<&RecognizedWord> {
    let mut best: Option<(&RecognizedWord, f64)> = None;
    for word in words {
        if word.text.trim().is_empty() || !word.bounds.expanded(tolerance).contains(point) {
            continue;
        }
        let centroid = word.bounds.centroid();
        let dist_sq = (centroid.x - point.x).powi(2) + (centroid.y - point.y).powi(2);
        match best {
            Some((_, best_dist)) if dist_sq >= best_dist => {}
            _ => best = Some((word, dist_sq)),
        }
    }
    best.map(|(word, _)| word)
}

/// Strip surrounding punctuation from an OCR token, keeping inner
/// apostrophes and hyphens. Returns `None` when nothing readable is left.
pub fn lookup_token(raw: &str) -> Option<String> {
    let token = raw
        .trim()
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_string();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

#[cfg(test)]
mod tests {
    use super::lookup_token;

    #[test]
    fn trims_punctuation_around_token() {
        assert_eq!(lookup_token("\"hello,\"").as_deref(), Some("hello"));
        assert_eq!(lookup_token("(don't)").as_deref(), Some("don't"));
        assert_eq!(lookup_token("well-known.").as_deref(), Some("well-known"));
        assert_eq!(lookup_token(" -- "), None);
    }
}
