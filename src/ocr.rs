//! Word recognition through an external OCR command producing Tesseract TSV.

use crate::collaborators::WordRecognizer;
use crate::error::BackendError;
use crate::model::{CapturedImage, NormalizedRect, RecognizedWord};
use crate::session::primary_subtag;
use anyhow::{anyhow, Context};
use async_trait::async_trait;
use std::io::Write;
use std::time::Duration;
use tokio::process::Command;

/// Tesseract traineddata name for a language code.
pub fn tesseract_language(code: &str) -> &'static str {
    let lower = code.trim().to_ascii_lowercase().replace('_', "-");
    match lower.as_str() {
        "zh-hant" | "zh-tw" | "zh-hk" => return "chi_tra",
        "zh" | "zh-hans" | "zh-cn" => return "chi_sim",
        _ => {}
    }
    match primary_subtag(&lower).as_str() {
        "zh" => "chi_sim",
        "ja" => "jpn",
        "ko" => "kor",
        "fr" => "fra",
        "de" => "deu",
        "es" => "spa",
        "it" => "ita",
        "pt" => "por",
        "ru" => "rus",
        "nl" => "nld",
        _ => "eng",
    }
}

/// Parse Tesseract TSV output into words with boxes normalised to the image
/// size. Rows that are not words, have no text or negative confidence are
/// skipped.
pub fn parse_tsv(tsv: &str, width: u32, height: u32) -> Vec<RecognizedWord> {
    if width == 0 || height == 0 {
        return Vec::new();
    }
    let (w, h) = (f64::from(width), f64::from(height));
    tsv.lines()
        .filter_map(|line| {
            let cols: Vec<&str> = line.split('\t').collect();
            if cols.len() < 12 || cols[0] != "5" {
                return None;
            }
            let conf: f64 = cols[10].trim().parse().ok()?;
            let text = cols[11..].join("\t");
            let text = text.trim();
            if conf < 0.0 || text.is_empty() {
                return None;
            }
            let left: f64 = cols[6].parse().ok()?;
            let top: f64 = cols[7].parse().ok()?;
            let bw: f64 = cols[8].parse().ok()?;
            let bh: f64 = cols[9].parse().ok()?;
            Some(RecognizedWord {
                text: text.to_string(),
                bounds: NormalizedRect::new(left / w, top / h, bw / w, bh / h),
            })
        })
        .collect()
}

pub struct TesseractRecognizer {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl TesseractRecognizer {
    /// `command` is split like a shell would; the first word is the program.
    pub fn new(command: &str, timeout: Duration) -> anyhow::Result<Self> {
        let mut parts = shlex::split(command)
            .ok_or_else(|| anyhow!("cannot parse OCR command {command:?}"))?
            .into_iter();
        let program = parts
            .next()
            .ok_or_else(|| anyhow!("OCR command is empty"))?;
        Ok(Self {
            program,
            args: parts.collect(),
            timeout,
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    async fn run(&self, image: &CapturedImage, language_hint: &str) -> Result<String, BackendError> {
        let mut file = tempfile::Builder::new()
            .prefix("hover_translate")
            .suffix(".png")
            .tempfile()
            .context("create OCR input file")?;
        file.write_all(&image.png).context("write OCR input file")?;
        file.flush().context("write OCR input file")?;

        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg(file.path())
            .arg("stdout")
            .arg("-l")
            .arg(tesseract_language(language_hint))
            .arg("tsv")
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, command.output()).await {
            Err(_) => return Err(BackendError::Timeout(self.timeout)),
            Ok(Err(err)) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(BackendError::Unavailable(format!(
                    "OCR program {} not found",
                    self.program
                )));
            }
            Ok(Err(err)) if err.kind() == std::io::ErrorKind::PermissionDenied => {
                return Err(BackendError::PermissionDenied(err.to_string()));
            }
            Ok(result) => result.with_context(|| format!("run {}", self.program))?,
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BackendError::Failed(anyhow!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl WordRecognizer for TesseractRecognizer {
    async fn recognize_words(
        &self,
        image: &CapturedImage,
        language_hint: &str,
    ) -> Result<Vec<RecognizedWord>, BackendError> {
        let tsv = self.run(image, language_hint).await?;
        let words = parse_tsv(&tsv, image.width, image.height);
        tracing::debug!(words = words.len(), "text recognition finished");
        Ok(words)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext
1\t1\t0\t0\t0\t0\t0\t0\t400\t100\t-1\t
4\t1\t1\t1\t1\t0\t10\t20\t380\t30\t-1\t
5\t1\t1\t1\t1\t1\t10\t20\t100\t30\t96.5\tHello
5\t1\t1\t1\t1\t2\t120\t20\t90\t30\t91.0\tworld
5\t1\t1\t1\t1\t3\t220\t20\t10\t30\t95.0\t ";

    #[test]
    fn parses_word_rows_only() {
        let words = parse_tsv(SAMPLE, 400, 100);
        assert_eq!(words.len(), 2);
        assert_eq!(words[0].text, "Hello");
        assert_eq!(words[0].bounds, NormalizedRect::new(0.025, 0.2, 0.25, 0.3));
        assert_eq!(words[1].text, "world");
    }

    #[test]
    fn zero_sized_image_yields_nothing() {
        assert!(parse_tsv(SAMPLE, 0, 100).is_empty());
    }

    #[test]
    fn maps_language_codes() {
        assert_eq!(tesseract_language("en"), "eng");
        assert_eq!(tesseract_language("zh-Hans"), "chi_sim");
        assert_eq!(tesseract_language("zh-Hant"), "chi_tra");
        assert_eq!(tesseract_language("pt-BR"), "por");
        assert_eq!(tesseract_language("xx"), "eng");
    }

    #[test]
    fn splits_command_line() {
        let recognizer =
            TesseractRecognizer::new("\"/opt/ocr/tesseract\" --psm 6", Duration::from_secs(1)).unwrap();
        assert_eq!(recognizer.program(), "/opt/ocr/tesseract");
        assert_eq!(recognizer.args, vec!["--psm", "6"]);
    }
}
