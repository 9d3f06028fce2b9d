use serde::{Deserialize, Serialize};

/// A point in logical screen units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An axis aligned rectangle in logical screen units, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScreenRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ScreenRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle of the given size centred on `center`.
    pub fn centered_on(center: ScreenPoint, width: f64, height: f64) -> Self {
        Self {
            x: center.x - width / 2.0,
            y: center.y - height / 2.0,
            width,
            height,
        }
    }

    pub fn contains(&self, point: ScreenPoint) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.width
            && point.y >= self.y
            && point.y <= self.y + self.height
    }

    /// Map a screen point into unit coordinates local to this rectangle.
    ///
    /// Returns `None` for degenerate rectangles or points outside the rect.
    pub fn normalize(&self, point: ScreenPoint) -> Option<NormalizedPoint> {
        if self.width <= 0.0 || self.height <= 0.0 || !self.contains(point) {
            return None;
        }
        Some(NormalizedPoint {
            x: (point.x - self.x) / self.width,
            y: (point.y - self.y) / self.height,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NormalizedPoint {
    pub x: f64,
    pub y: f64,
}

/// Unit rectangle in capture-local coordinates, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NormalizedRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl NormalizedRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn expanded(&self, tolerance: f64) -> Self {
        Self {
            x: self.x - tolerance,
            y: self.y - tolerance,
            width: self.width + tolerance * 2.0,
            height: self.height + tolerance * 2.0,
        }
    }

    pub fn contains(&self, point: NormalizedPoint) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.width
            && point.y >= self.y
            && point.y <= self.y + self.height
    }

    pub fn centroid(&self) -> NormalizedPoint {
        NormalizedPoint {
            x: self.x + self.width / 2.0,
            y: self.y + self.height / 2.0,
        }
    }
}

/// A word produced by text recognition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognizedWord {
    pub text: String,
    pub bounds: NormalizedRect,
}

/// Pixels captured around the cursor, PNG encoded, plus where they came from.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedImage {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub region: ScreenRect,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phonetic {
    #[serde(default)]
    pub region: Option<String>,
    pub transcription: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Definition {
    #[serde(default)]
    pub part_of_speech: Option<String>,
    pub meaning: String,
    #[serde(default)]
    pub translation: Option<String>,
    #[serde(default)]
    pub examples: Vec<String>,
}

impl Definition {
    pub fn new(part_of_speech: Option<&str>, meaning: &str) -> Self {
        Self {
            part_of_speech: part_of_speech.map(str::to_string),
            meaning: meaning.to_string(),
            translation: None,
            examples: Vec::new(),
        }
    }
}

/// Structured entry returned by the local dictionary backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DictionaryEntry {
    pub headword: String,
    #[serde(default)]
    pub phonetics: Vec<Phonetic>,
    #[serde(default)]
    pub definitions: Vec<Definition>,
    #[serde(default)]
    pub rich_content: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranslationBackend {
    OnDevice,
    Cloud,
}

/// The resolved result shown in the overlay.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupOutcome {
    pub headword: String,
    pub phonetics: Vec<Phonetic>,
    pub translation: String,
    pub definitions: Vec<Definition>,
    pub rich_content: Option<String>,
    pub translated_by: Option<TranslationBackend>,
    pub detected_language: Option<String>,
}
