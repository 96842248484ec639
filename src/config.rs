//! Application configuration.
//!
//! Read from a TOML file (default `config.toml`). Every section and key is
//! optional; a missing file means all defaults. Relative paths are resolved
//! against the directory holding the config file.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::nlp::conllu::ConlluParser;
use crate::pipeline::diagnosis_time::{
    DiagnosisTimeError, DiagnosisTimeResult, ExtractionSettings, Lexicon,
};

/// Application-level constants
pub const APP_NAME: &str = "diagtime";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Log filter used when neither `RUST_LOG` nor the config sets one.
pub fn default_log_filter() -> &'static str {
    "info"
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub data_locations: DataLocations,
    #[serde(default)]
    pub extraction: ExtractionSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where the static inputs live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataLocations {
    /// Prioritized diagnosis patterns, one per line.
    #[serde(default = "default_diagnosis_patterns")]
    pub diagnosis_patterns: PathBuf,
    /// Context vocabulary confirming a mention, one per line.
    #[serde(default = "default_context_words")]
    pub context_words: PathBuf,
    /// Pre-computed dependency parses. Without it, `parsing` degrades to proximity.
    #[serde(default)]
    pub conllu: Option<PathBuf>,
}

fn default_diagnosis_patterns() -> PathBuf {
    PathBuf::from("data/diagnosis_patterns.txt")
}

fn default_context_words() -> PathBuf {
    PathBuf::from("data/depression_words.txt")
}

impl Default for DataLocations {
    fn default() -> Self {
        Self {
            diagnosis_patterns: default_diagnosis_patterns(),
            context_words: default_context_words(),
            conllu: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_filter")]
    pub filter: String,
}

fn default_filter() -> String {
    default_log_filter().to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `path`, or defaults when the file does not exist.
    pub fn load(path: &Path) -> DiagnosisTimeResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let mut config = Self::from_file(path)?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        Ok(config)
    }

    /// Parse a TOML config file (paths are kept as written).
    pub fn from_file(path: &Path) -> DiagnosisTimeResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            DiagnosisTimeError::Config(format!(
                "Failed to read config file {}: {e}",
                path.display()
            ))
        })?;
        toml::from_str(&content).map_err(|e| {
            DiagnosisTimeError::Config(format!(
                "Failed to parse config file {}: {e}",
                path.display()
            ))
        })
    }

    /// Make relative data paths relative to `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        resolve(&mut self.data_locations.diagnosis_patterns);
        resolve(&mut self.data_locations.context_words);
        if let Some(conllu) = self.data_locations.conllu.as_mut() {
            resolve(conllu);
        }
    }

    /// Load the pattern list and context vocabulary.
    pub fn load_lexicon(&self) -> DiagnosisTimeResult<Lexicon> {
        let patterns = load_lexicon_file(&self.data_locations.diagnosis_patterns)?;
        let context_words = load_lexicon_file(&self.data_locations.context_words)?;
        if patterns.is_empty() {
            return Err(DiagnosisTimeError::Config(format!(
                "No diagnosis patterns in {}",
                self.data_locations.diagnosis_patterns.display()
            )));
        }
        tracing::info!(
            patterns = patterns.len(),
            context_words = context_words.len(),
            "Lexicon loaded"
        );
        Ok(Lexicon::new(patterns, context_words))
    }

    /// Dependency parser over the configured CoNLL-U file, or an empty one.
    pub fn load_parser(&self) -> DiagnosisTimeResult<ConlluParser> {
        match &self.data_locations.conllu {
            Some(path) => ConlluParser::from_path(path),
            None => {
                tracing::warn!("No CoNLL-U parses configured; parsing method will use proximity");
                Ok(ConlluParser::new())
            }
        }
    }
}

/// Read a word list: one entry per line, trimmed and lowercased.
/// Blank lines and `#` comments are skipped.
pub fn load_lexicon_file(path: &Path) -> DiagnosisTimeResult<Vec<String>> {
    let content = fs::read_to_string(path).map_err(|e| {
        DiagnosisTimeError::Config(format!("Failed to read word list {}: {e}", path.display()))
    })?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_lowercase)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ExtractionMethod;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.extraction, ExtractionSettings::default());
        assert_eq!(config.logging.filter, "info");
        assert_eq!(
            config.data_locations.diagnosis_patterns,
            PathBuf::from("data/diagnosis_patterns.txt")
        );
        assert!(config.data_locations.conllu.is_none());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "config.toml",
            "[extraction]\nmethod = \"char_dist\"\nworkers = 4\n",
        );
        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.extraction.method, ExtractionMethod::CharDist);
        assert_eq!(config.extraction.workers, 4);
        assert_eq!(config.extraction.context_before, 50);
        assert_eq!(config.extraction.context_after, 100);
        assert_eq!(config.extraction.record_timeout_secs, None);
    }

    #[test]
    fn relative_paths_resolve_against_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "config.toml",
            "[data_locations]\ndiagnosis_patterns = \"lists/patterns.txt\"\nconllu = \"/abs/parses.conllu\"\n",
        );
        let config = AppConfig::load(&path).unwrap();
        assert_eq!(
            config.data_locations.diagnosis_patterns,
            dir.path().join("lists/patterns.txt")
        );
        assert_eq!(
            config.data_locations.context_words,
            dir.path().join("data/depression_words.txt")
        );
        assert_eq!(config.data_locations.conllu, Some(PathBuf::from("/abs/parses.conllu")));
    }

    #[test]
    fn unknown_method_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "config.toml", "[extraction]\nmethod = \"nearest\"\n");
        assert!(matches!(
            AppConfig::load(&path),
            Err(DiagnosisTimeError::Config(_))
        ));
    }

    #[test]
    fn word_list_skips_blanks_and_comments() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "words.txt",
            "# context words\nDepression\n\n   \n  anxiety  \n",
        );
        assert_eq!(
            load_lexicon_file(&path).unwrap(),
            vec!["depression".to_string(), "anxiety".to_string()]
        );
    }

    #[test]
    fn lexicon_loads_from_configured_paths() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "p.txt", "diagnosed with depression\ndiagnosed with\n");
        write(dir.path(), "w.txt", "depression\n");
        let path = write(
            dir.path(),
            "config.toml",
            "[data_locations]\ndiagnosis_patterns = \"p.txt\"\ncontext_words = \"w.txt\"\n",
        );
        let lexicon = AppConfig::load(&path).unwrap().load_lexicon().unwrap();
        assert_eq!(lexicon.patterns().len(), 2);
        assert_eq!(lexicon.context_words(), &["depression".to_string()]);
    }

    #[test]
    fn empty_pattern_list_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "p.txt", "# nothing yet\n");
        write(dir.path(), "w.txt", "depression\n");
        let path = write(
            dir.path(),
            "config.toml",
            "[data_locations]\ndiagnosis_patterns = \"p.txt\"\ncontext_words = \"w.txt\"\n",
        );
        let err = AppConfig::load(&path).unwrap().load_lexicon().unwrap_err();
        assert!(matches!(err, DiagnosisTimeError::Config(_)));
    }

    #[test]
    fn missing_word_list_names_the_file() {
        let err = load_lexicon_file(Path::new("/definitely/not/here.txt")).unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.txt"));
    }

    #[test]
    fn no_conllu_gives_empty_parser() {
        let parser = AppConfig::default().load_parser().unwrap();
        assert!(parser.is_empty());
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
        assert_eq!(APP_NAME, "diagtime");
    }
}
