//! Project language detection
//!
//! A project's language is inferred from marker files in its root directory,
//! such as `setup.py` for Python or `pom.xml` for Maven. The markers come from
//! the `detect` globs of each language in the default manifest.

use std::fs;
use std::path::Path;

use regex::Regex;

use crate::defaults::LanguageDefaults;
use crate::error::{Error, ResolutionError, Result};
use crate::model::Language;

/// Matches project root entries against each language's detection globs.
#[derive(Debug, Clone)]
pub struct LanguageDetector {
    languages: Vec<(String, Vec<Regex>)>,
}

impl LanguageDetector {
    /// Build a detector from language defaults, compiling their globs.
    pub fn new<'a>(defaults: impl IntoIterator<Item = &'a LanguageDefaults>) -> Result<Self> {
        let mut languages = Vec::new();
        for language in defaults {
            let patterns = language
                .detect
                .iter()
                .map(String::as_str)
                .map(glob_to_regex)
                .collect::<Result<Vec<_>>>()?;
            languages.push((language.name.clone(), patterns));
        }
        Ok(Self { languages })
    }

    /// Detect the language of the project rooted at `root`.
    ///
    /// Returns [`Language::NoDefaults`] when no marker matches or the
    /// directory cannot be read. When markers of more than one language
    /// match, returns [`ResolutionError::LanguageDetectionAmbiguous`]; callers
    /// treat that as "no language defaults".
    pub fn detect(&self, root: &Path) -> std::result::Result<Language, ResolutionError> {
        let entries = match fs::read_dir(root) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!(?root, error = %e, "Cannot list project root; no language detected");
                return Ok(Language::NoDefaults);
            }
        };
        let names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();

        let matched: Vec<String> = self
            .languages
            .iter()
            .filter(|(_, patterns)| {
                patterns
                    .iter()
                    .any(|re| names.iter().any(|name| re.is_match(name)))
            })
            .map(|(language, _)| language.clone())
            .collect();

        match matched.as_slice() {
            [] => Ok(Language::NoDefaults),
            [language] => {
                tracing::debug!(%language, ?root, "Detected project language");
                Ok(Language::named(language.clone()))
            }
            _ => Err(ResolutionError::LanguageDetectionAmbiguous {
                candidates: matched,
            }),
        }
    }
}

/// Translate a file name glob (`*`, `?`) into an anchored regex.
fn glob_to_regex(glob: &str) -> Result<Regex> {
    let mut pattern = String::from("^");
    for ch in glob.chars() {
        match ch {
            '*' => pattern.push_str("[^/]*"),
            '?' => pattern.push_str("[^/]"),
            other => pattern.push_str(&regex::escape(&other.to_string())),
        }
    }
    pattern.push('$');
    Regex::new(&pattern).map_err(|e| Error::InvalidDefaults {
        message: format!("bad detection glob '{}': {}", glob, e),
    })
}
