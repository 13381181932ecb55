//! Repository configuration
//!
//! Ini-style key/value configuration. The model keeps sections and keys in
//! file order so unknown entries written by other tooling survive a
//! parse/serialize round trip verbatim.

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur while parsing configuration text
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config syntax error on line {line}: {text:?}")]
    Syntax { line: usize, text: String },
}

/// The single storage format version this implementation understands
pub const SUPPORTED_FORMAT_VERSION: u32 = 0;

/// Section holding the storage format version and behavioral flags
pub const CORE_SECTION: &str = "core";

#[derive(Debug, Clone, PartialEq, Eq)]
struct Section {
    name: String,
    entries: Vec<(String, String)>,
}

/// Parsed repository configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoConfig {
    sections: Vec<Section>,
}

impl RepoConfig {
    /// The canonical initial configuration: format version 0, file mode
    /// tracking disabled, non-bare.
    pub fn default_config() -> Self {
        let mut config = Self {
            sections: Vec::new(),
        };
        config.set(
            CORE_SECTION,
            "repositoryformatversion",
            &SUPPORTED_FORMAT_VERSION.to_string(),
        );
        config.set(CORE_SECTION, "filemode", "false");
        config.set(CORE_SECTION, "bare", "false");
        config
    }

    /// Parse ini-style text
    pub fn parse(text: &str) -> Result<Self> {
        let mut sections: Vec<Section> = Vec::new();
        for (idx, raw) in text.lines().enumerate() {
            let syntax = || ConfigError::Syntax {
                line: idx + 1,
                text: raw.to_string(),
            };
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }
            if let Some(header) = line.strip_prefix('[') {
                let name = header.strip_suffix(']').ok_or_else(syntax)?.trim();
                if name.is_empty() {
                    return Err(syntax());
                }
                sections.push(Section {
                    name: name.to_string(),
                    entries: Vec::new(),
                });
                continue;
            }
            let (key, value) = line.split_once('=').ok_or_else(syntax)?;
            let section = sections.last_mut().ok_or_else(syntax)?;
            section
                .entries
                .push((key.trim().to_string(), value.trim().to_string()));
        }
        Ok(Self { sections })
    }

    /// Render back to ini text. Inverse of `parse` for anything this
    /// system writes; unknown sections and keys are emitted unchanged.
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        for section in &self.sections {
            out.push('[');
            out.push_str(&section.name);
            out.push_str("]\n");
            for (key, value) in &section.entries {
                out.push('\t');
                out.push_str(key);
                out.push_str(" = ");
                out.push_str(value);
                out.push('\n');
            }
        }
        out
    }

    /// Look up a value
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .iter()
            .find(|s| s.name == section)?
            .entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set a value, creating the section if absent
    pub fn set(&mut self, section: &str, key: &str, value: &str) {
        let Some(section) = self.sections.iter_mut().find(|s| s.name == section) else {
            self.sections.push(Section {
                name: section.to_string(),
                entries: vec![(key.to_string(), value.to_string())],
            });
            return;
        };
        match section.entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) => *existing = value.to_string(),
            None => section.entries.push((key.to_string(), value.to_string())),
        }
    }

    /// The declared storage format version, if present and well-formed
    pub fn format_version(&self) -> Option<&str> {
        self.get(CORE_SECTION, "repositoryformatversion")
    }

    /// Whether file mode changes are tracked
    pub fn filemode(&self) -> bool {
        self.flag(CORE_SECTION, "filemode")
    }

    /// Whether the repository has no working tree
    pub fn bare(&self) -> bool {
        self.flag(CORE_SECTION, "bare")
    }

    fn flag(&self, section: &str, key: &str) -> bool {
        matches!(self.get(section, key), Some("true") | Some("1"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        let config = RepoConfig::default_config();
        assert_eq!(config.get("core", "repositoryformatversion"), Some("0"));
        assert_eq!(config.get("core", "filemode"), Some("false"));
        assert_eq!(config.get("core", "bare"), Some("false"));
    }

    #[test]
    fn test_serialize_parse_roundtrip() {
        let config = RepoConfig::default_config();
        let text = config.serialize();
        let parsed = RepoConfig::parse(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_unknown_sections_preserved() {
        let text = "[core]\n\trepositoryformatversion = 0\n[remote \"origin\"]\n\turl = https://example.org/r.git\n";
        let parsed = RepoConfig::parse(text).unwrap();
        assert_eq!(
            parsed.get("remote \"origin\"", "url"),
            Some("https://example.org/r.git")
        );
        // Round trip keeps the unknown section.
        let again = RepoConfig::parse(&parsed.serialize()).unwrap();
        assert_eq!(again, parsed);
    }

    #[test]
    fn test_comments_and_blank_lines_skipped() {
        let text = "# comment\n\n[core]\n; another\n\tbare = true\n";
        let parsed = RepoConfig::parse(text).unwrap();
        assert_eq!(parsed.get("core", "bare"), Some("true"));
    }

    #[test]
    fn test_key_before_section_is_syntax_error() {
        let err = RepoConfig::parse("bare = true\n").unwrap_err();
        let ConfigError::Syntax { line, .. } = err;
        assert_eq!(line, 1);
    }

    #[test]
    fn test_unterminated_section_header_is_syntax_error() {
        assert!(RepoConfig::parse("[core\nbare = true\n").is_err());
    }

    #[test]
    fn test_line_without_separator_is_syntax_error() {
        assert!(RepoConfig::parse("[core]\njustakey\n").is_err());
    }

    #[test]
    fn test_flag_accessors() {
        let mut config = RepoConfig::default_config();
        assert!(!config.filemode());
        assert!(!config.bare());
        config.set("core", "bare", "true");
        assert!(config.bare());
    }

    #[test]
    fn test_set_overwrites_existing_key() {
        let mut config = RepoConfig::default_config();
        config.set("core", "bare", "true");
        assert_eq!(config.get("core", "bare"), Some("true"));
    }
}
