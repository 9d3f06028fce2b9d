use crate::session::primary_subtag;

/// Writing systems the resolver needs to tell apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    Han,
    /// Japanese: kana or kanji.
    Japanese,
    Hangul,
    Cyrillic,
    Arabic,
    Greek,
    Thai,
    Latin,
}

pub fn script_for_language(code: &str) -> Script {
    match primary_subtag(code).as_str() {
        "zh" | "yue" => Script::Han,
        "ja" => Script::Japanese,
        "ko" => Script::Hangul,
        "ru" | "uk" | "bg" | "sr" | "be" | "mk" | "kk" => Script::Cyrillic,
        "ar" | "fa" | "ur" => Script::Arabic,
        "el" => Script::Greek,
        "th" => Script::Thai,
        _ => Script::Latin,
    }
}

pub fn char_in_script(c: char, script: Script) -> bool {
    let cp = c as u32;
    match script {
        Script::Han => is_han(cp),
        Script::Japanese => is_han(cp) || (0x3040..=0x30FF).contains(&cp),
        Script::Hangul => {
            (0xAC00..=0xD7AF).contains(&cp)
                || (0x1100..=0x11FF).contains(&cp)
                || (0x3130..=0x318F).contains(&cp)
        }
        Script::Cyrillic => (0x0400..=0x04FF).contains(&cp),
        Script::Arabic => (0x0600..=0x06FF).contains(&cp),
        Script::Greek => (0x0370..=0x03FF).contains(&cp),
        Script::Thai => (0x0E00..=0x0E7F).contains(&cp),
        Script::Latin => c.is_ascii_alphabetic() || ((0x00C0..=0x024F).contains(&cp) && c.is_alphabetic()),
    }
}

fn is_han(cp: u32) -> bool {
    (0x4E00..=0x9FFF).contains(&cp)
        || (0x3400..=0x4DBF).contains(&cp)
        || (0xF900..=0xFAFF).contains(&cp)
        || (0x20000..=0x2A6DF).contains(&cp)
}

pub fn contains_script(text: &str, script: Script) -> bool {
    text.chars().any(|c| char_in_script(c, script))
}

/// Whether `text` has any content written in `language`'s script.
pub fn has_content_in(text: &str, language: &str) -> bool {
    contains_script(text, script_for_language(language))
}
