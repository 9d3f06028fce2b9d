use hover_translate::collaborators::Dictionary;
use hover_translate::dictionary::{
    load_dictionary, save_dictionary, DictionaryFile, DictionaryRecord, JsonDictionary, SCHEMA_VERSION,
};
use hover_translate::model::{Definition, DictionaryEntry};
use hover_translate::stems::candidate_forms;
use tempfile::tempdir;

const SAMPLE: &str = r#"{
  "schema_version": 1,
  "entries": [
    {
      "language": "en",
      "headword": "run",
      "phonetics": [{ "region": "US", "transcription": "rʌn" }],
      "definitions": [
        { "partOfSpeech": "verb", "meaning": "move swiftly on foot", "translation": "跑" },
        { "partOfSpeech": "noun", "meaning": "an act of running" }
      ]
    },
    { "language": "fr", "headword": "chat", "definitions": [{ "meaning": "animal domestique" }] },
    { "language": "en", "headword": "chat", "definitions": [{ "meaning": "talk informally" }] }
  ]
}"#;

fn sample_dictionary() -> JsonDictionary {
    let dir = tempdir().unwrap();
    let path = dir.path().join("dict.json");
    std::fs::write(&path, SAMPLE).unwrap();
    JsonDictionary::open(path.to_str().unwrap()).unwrap()
}

#[test]
fn loads_entries_with_optional_fields() {
    let dictionary = sample_dictionary();
    assert_eq!(dictionary.len(), 2);

    let entry = dictionary.find(&["run".to_string()], "en").unwrap();
    assert_eq!(entry.phonetics[0].transcription, "rʌn");
    assert_eq!(entry.definitions[0].part_of_speech.as_deref(), Some("verb"));
    assert_eq!(entry.definitions[0].translation.as_deref(), Some("跑"));
    assert_eq!(entry.definitions[1].translation, None);
}

#[test]
fn inflected_forms_reach_the_base_entry() {
    let dictionary = sample_dictionary();
    let entry = dictionary.find(&candidate_forms("Running"), "en").unwrap();
    assert_eq!(entry.headword, "run");
}

#[test]
fn preferred_language_wins_then_any() {
    let dictionary = sample_dictionary();
    let words = vec!["chat".to_string()];
    assert_eq!(
        dictionary.find(&words, "fr").unwrap().definitions[0].meaning,
        "animal domestique"
    );
    assert_eq!(
        dictionary.find(&words, "en-US").unwrap().definitions[0].meaning,
        "talk informally"
    );
    assert!(dictionary.find(&words, "de").is_some());
    assert!(dictionary.find(&["walk".to_string()], "en").is_none());
}

#[tokio::test]
async fn lookup_clones_matching_entry() {
    let dictionary = sample_dictionary();
    let entry = dictionary
        .lookup(&["RUN".to_string()], "en")
        .await
        .unwrap();
    assert_eq!(entry.headword, "run");
}

#[test]
fn empty_or_missing_file_is_an_empty_dictionary() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("missing.json");
    let file = load_dictionary(path.to_str().unwrap()).unwrap();
    assert_eq!(file, DictionaryFile::default());
}

#[test]
fn rejects_unknown_schema_version() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("dict.json");
    std::fs::write(&path, r#"{ "schema_version": 99, "entries": [] }"#).unwrap();
    assert!(load_dictionary(path.to_str().unwrap()).is_err());
}

#[test]
fn saved_dictionary_loads_back() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("dict.json");
    let file = DictionaryFile {
        schema_version: 0,
        entries: vec![DictionaryRecord {
            language: "en".into(),
            entry: DictionaryEntry {
                headword: "tree".into(),
                phonetics: Vec::new(),
                definitions: vec![Definition::new(Some("noun"), "a woody plant")],
                rich_content: None,
            },
        }],
    };
    save_dictionary(path.to_str().unwrap(), &file).unwrap();

    let loaded = load_dictionary(path.to_str().unwrap()).unwrap();
    assert_eq!(loaded.schema_version, SCHEMA_VERSION);
    assert_eq!(loaded.entries, file.entries);
}
