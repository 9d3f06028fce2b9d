//! Candidate word forms for dictionary lookup.
//!
//! The rules are shallow. They produce plausible base forms for
//! common English inflections and leave the dictionary to decide which one
//! exists. Earlier candidates win, so the surface form always comes first.

pub fn candidate_forms(word: &str) -> Vec<String> {
    let mut forms = Vec::new();
    let token = word.trim();
    if token.is_empty() {
        return forms;
    }
    push(&mut forms, token.to_string());

    let lower = token.to_lowercase();
    push(&mut forms, lower.clone());
    if !lower
        .chars()
        .all(|c| c.is_ascii_alphabetic() || c == '\'' || c == '-')
    {
        return forms;
    }

    let base = strip_possessive(&lower);
    push(&mut forms, base.clone());
    for stem in inflection_stems(&base) {
        push(&mut forms, stem);
    }
    forms
}

fn push(forms: &mut Vec<String>, form: String) {
    if !form.is_empty() && !forms.contains(&form) {
        forms.push(form);
    }
}

fn strip_possessive(word: &str) -> String {
    word.strip_suffix("'s")
        .or_else(|| word.strip_suffix('\''))
        .unwrap_or(word)
        .to_string()
}

fn inflection_stems(word: &str) -> Vec<String> {
    let mut out = Vec::new();

    // plurals and third person
    if let Some(s) = word.strip_suffix('s') {
        if s.len() >= 2 && !s.ends_with('s') {
            out.push(s.to_string());
        }
    }
    if let Some(s) = word.strip_suffix("es") {
        if s.len() >= 2 && ends_with_sibilant(s) {
            out.push(s.to_string());
        }
    }
    if let Some(s) = word.strip_suffix("ies") {
        if s.len() >= 2 {
            out.push(format!("{s}y"));
        }
    }

    // past tense
    if let Some(s) = word.strip_suffix("ied") {
        if s.len() >= 2 {
            out.push(format!("{s}y"));
        }
    }
    if let Some(s) = word.strip_suffix("ed") {
        if s.len() >= 2 {
            out.push(format!("{s}e"));
            out.push(s.to_string());
            if let Some(single) = undouble(s) {
                out.push(single);
            }
        }
    }

    // progressive
    if let Some(s) = word.strip_suffix("ing") {
        if s.len() >= 2 {
            out.push(s.to_string());
            out.push(format!("{s}e"));
            if let Some(single) = undouble(s) {
                out.push(single);
            }
        }
    }

    // comparative and superlative
    for suffix in ["ier", "iest"] {
        if let Some(s) = word.strip_suffix(suffix) {
            if s.len() >= 2 {
                out.push(format!("{s}y"));
            }
        }
    }
    for suffix in ["er", "est"] {
        if let Some(s) = word.strip_suffix(suffix) {
            if s.len() >= 2 {
                out.push(s.to_string());
                out.push(format!("{s}e"));
                if let Some(single) = undouble(s) {
                    out.push(single);
                }
            }
        }
    }

    // adverbs
    if let Some(s) = word.strip_suffix("ily") {
        if s.len() >= 2 {
            out.push(format!("{s}y"));
        }
    }
    if let Some(s) = word.strip_suffix("ly") {
        if s.len() >= 3 {
            out.push(s.to_string());
        }
    }

    out
}

fn ends_with_sibilant(s: &str) -> bool {
    s.ends_with(['s', 'x', 'z']) || s.ends_with("ch") || s.ends_with("sh")
}

/// `stopp` -> `stop`, for doubled final consonants.
fn undouble(s: &str) -> Option<String> {
    let mut chars = s.chars().rev();
    let last = chars.next()?;
    let prev = chars.next()?;
    if last == prev && !matches!(last, 'a' | 'e' | 'i' | 'o' | 'u') {
        Some(s[..s.len() - last.len_utf8()].to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::candidate_forms;

    fn first_base(word: &str, expected: &str) {
        let forms = candidate_forms(word);
        assert!(
            forms.iter().any(|f| f == expected),
            "{word}: expected {expected} in {forms:?}"
        );
    }

    #[test]
    fn surface_form_comes_first() {
        let forms = candidate_forms("Running");
        assert_eq!(forms[0], "Running");
        assert_eq!(forms[1], "running");
    }

    #[test]
    fn common_inflections_produce_base_forms() {
        first_base("running", "run");
        first_base("stopped", "stop");
        first_base("used", "use");
        first_base("cities", "city");
        first_base("boxes", "box");
        first_base("horses", "horse");
        first_base("happier", "happy");
        first_base("quickly", "quick");
        first_base("driver's", "driver");
    }

    #[test]
    fn e_restoring_form_precedes_bare_stem_for_past_tense() {
        let forms = candidate_forms("used");
        let use_idx = forms.iter().position(|f| f == "use").unwrap();
        let us_idx = forms.iter().position(|f| f == "us").unwrap();
        assert!(use_idx < us_idx);
    }

    #[test]
    fn non_latin_tokens_are_left_alone() {
        assert_eq!(candidate_forms("翻译"), vec!["翻译".to_string()]);
        assert!(candidate_forms("   ").is_empty());
    }

    #[test]
    fn candidates_are_unique() {
        let forms = candidate_forms("books");
        let mut deduped = forms.clone();
        deduped.dedup();
        assert_eq!(forms, deduped);
        assert_eq!(forms, vec!["books".to_string(), "book".to_string()]);
    }
}
