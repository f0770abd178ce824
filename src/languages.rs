//! Language configuration for compilation and execution

use std::collections::HashMap;

use serde::Deserialize;

use crate::error::JudgeError;

/// Configuration for a supported programming language
#[derive(Debug, Clone)]
pub struct LanguageProfile {
    /// Name of the source file (e.g., "solution.py")
    pub source_file: String,
    /// Compile command (None for interpreted languages)
    pub compile_command: Option<Vec<String>>,
    /// Run command
    pub run_command: Vec<String>,
    /// Default wall-clock limit per test case in milliseconds
    pub time_limit_ms: u64,
    /// Rewrite the submitted public class to the canonical name before
    /// writing (toolchains that bind the runnable unit to the file name)
    pub rename_public_class: bool,
}

impl LanguageProfile {
    pub fn needs_compile(&self) -> bool {
        self.compile_command.is_some()
    }
}

/// Raw TOML configuration for a language
#[derive(Debug, Deserialize)]
struct RawLanguageProfile {
    source_file: String,
    compile_command: Option<String>,
    run_command: String,
    #[serde(default = "default_time_limit_ms")]
    time_limit_ms: u64,
    #[serde(default)]
    rename_public_class: bool,
    #[serde(default)]
    aliases: Vec<String>,
}

fn default_time_limit_ms() -> u64 {
    10_000
}

/// Immutable table of supported languages, built once at startup and
/// passed by reference into the components that need it.
#[derive(Debug, Clone)]
pub struct LanguageRegistry {
    languages: HashMap<String, LanguageProfile>,
}

impl LanguageRegistry {
    /// Registry built from the language table embedded at compile time
    pub fn builtin() -> anyhow::Result<Self> {
        let content = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/files/languages.toml"));
        Self::from_toml_str(content)
    }

    /// Parse a registry from TOML content
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let raw_profiles: HashMap<String, RawLanguageProfile> = toml::from_str(content)?;

        let mut languages = HashMap::new();

        for (name, raw) in raw_profiles {
            let profile = LanguageProfile {
                source_file: raw.source_file,
                compile_command: raw.compile_command.map(|cmd| into_command(&cmd)),
                run_command: into_command(&raw.run_command),
                time_limit_ms: raw.time_limit_ms,
                rename_public_class: raw.rename_public_class,
            };

            // Add main language name
            languages.insert(name.to_lowercase(), profile.clone());

            // Add aliases
            for alias in raw.aliases {
                languages.insert(alias.to_lowercase(), profile.clone());
            }
        }

        Ok(Self { languages })
    }

    /// Look up a language profile, failing for unknown identifiers
    pub fn get(&self, language: &str) -> Result<&LanguageProfile, JudgeError> {
        self.languages
            .get(&language.to_lowercase())
            .ok_or_else(|| JudgeError::UnsupportedLanguage(language.to_string()))
    }

    /// All supported language names (including aliases)
    pub fn supported_languages(&self) -> Vec<String> {
        self.languages.keys().cloned().collect()
    }
}

fn into_command(command: &str) -> Vec<String> {
    command.split_whitespace().map(|s| s.to_string()).collect()
}
