use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid wrapper tag {0:?}")]
    InvalidTag(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Class applied to the outer wrapper element
    pub wrapper_class: String,
    /// Tag (or component name) of the outer wrapper element, written into
    /// the markup unescaped
    pub wrapper_tag: String,
    /// BEM block name the exchange, speaker, name and speech classes derive from
    pub block_class: String,
    /// Speaker label lookup, matched in order
    pub icons: Vec<Icon>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            wrapper_class: String::new(),
            wrapper_tag: "Conversation".to_string(),
            block_class: "wpdtrt-conversation".to_string(),
            icons: vec![
                Icon {
                    code: "(MN)".to_string(),
                    title: "Mongolia".to_string(),
                    icon: "/site/.vuepress/theme/images/flaticon/mongolia.svg".to_string(),
                },
                Icon {
                    code: "(NZ)".to_string(),
                    title: "New Zealand".to_string(),
                    icon: "/site/.vuepress/theme/images/flaticon/new-zealand.svg".to_string(),
                },
            ],
        }
    }
}

/// A country marker that may appear in a speaker label, e.g. `Host (NZ)`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Icon {
    pub code: String,
    pub title: String,
    pub icon: String,
}

impl Config {
    /// Parse config from TOML text. Missing keys keep their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject wrapper tags that are not a plain element or component name.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut chars = self.wrapper_tag.chars();
        let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
            && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':'));
        if valid {
            Ok(())
        } else {
            Err(ConfigError::InvalidTag(self.wrapper_tag.clone()))
        }
    }

    /// Load config from a TOML file, or return defaults if it does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(content) => Self::from_toml_str(&content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Class for an element of the conversation block, e.g. `exchange`.
    pub fn element_class(&self, element: &str) -> String {
        format!("{}__{}", self.block_class, element)
    }

    /// First icon whose code appears in `label`, with the byte offset of the match.
    pub fn match_icon(&self, label: &str) -> Option<(usize, &Icon)> {
        self.icons
            .iter()
            .filter(|icon| !icon.code.is_empty())
            .find_map(|icon| label.find(&icon.code).map(|at| (at, icon)))
    }
}
