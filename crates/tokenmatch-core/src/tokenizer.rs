//! Tokenizers
//!
//! Turn a raw string into a [`TokenBag`]. The engine only needs the
//! [`Tokenizer`] trait; the implementations here cover the common cases
//! (character q-grams, whitespace words, single characters).

use crate::bag::TokenBag;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Deterministic string → multiset transform
pub trait Tokenizer: fmt::Debug + Send + Sync {
    fn tokenize(&self, input: &str) -> TokenBag;
}

/// Character q-grams, optionally padded with start/stop symbols
///
/// With `q = 2` and the default `$`/`#` markers, `"cat"` becomes
/// `$c ca at t#`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QGrams {
    qval: usize,
    start_stop: Option<(char, char)>,
}

impl QGrams {
    pub const DEFAULT_START: char = '$';
    pub const DEFAULT_STOP: char = '#';

    pub fn new(qval: usize) -> Result<Self, ConfigError> {
        if qval == 0 {
            return Err(ConfigError::InvalidQval(qval));
        }
        Ok(Self {
            qval,
            start_stop: Some((Self::DEFAULT_START, Self::DEFAULT_STOP)),
        })
    }

    /// Replace the padding symbols, or disable padding with `None`
    pub fn with_start_stop(mut self, start_stop: Option<(char, char)>) -> Self {
        self.start_stop = start_stop;
        self
    }

    pub fn qval(&self) -> usize {
        self.qval
    }
}

impl Default for QGrams {
    fn default() -> Self {
        Self {
            qval: 2,
            start_stop: Some((Self::DEFAULT_START, Self::DEFAULT_STOP)),
        }
    }
}

impl Tokenizer for QGrams {
    fn tokenize(&self, input: &str) -> TokenBag {
        if input.is_empty() {
            return TokenBag::new();
        }

        let mut chars: Vec<char> = Vec::with_capacity(input.len() + 2 * self.qval);
        if let Some((start, _)) = self.start_stop {
            chars.extend(std::iter::repeat(start).take(self.qval - 1));
        }
        chars.extend(input.chars());
        if let Some((_, stop)) = self.start_stop {
            chars.extend(std::iter::repeat(stop).take(self.qval - 1));
        }

        if chars.len() < self.qval {
            return TokenBag::new();
        }
        chars
            .windows(self.qval)
            .map(|w| w.iter().collect::<String>())
            .collect()
    }
}

/// Whitespace-separated words
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Whitespace;

impl Tokenizer for Whitespace {
    fn tokenize(&self, input: &str) -> TokenBag {
        input.split_whitespace().collect()
    }
}

/// Single characters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Characters;

impl Tokenizer for Characters {
    fn tokenize(&self, input: &str) -> TokenBag {
        input.chars().map(String::from).collect()
    }
}

/// Serializable tokenizer selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TokenizerConfig {
    Qgrams {
        #[serde(default = "default_qval")]
        qval: usize,
        #[serde(default = "default_start_stop")]
        start_stop: Option<(char, char)>,
    },
    Whitespace,
    Characters,
}

fn default_qval() -> usize {
    2
}

fn default_start_stop() -> Option<(char, char)> {
    Some((QGrams::DEFAULT_START, QGrams::DEFAULT_STOP))
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self::Qgrams {
            qval: default_qval(),
            start_stop: default_start_stop(),
        }
    }
}

impl TokenizerConfig {
    pub fn build(&self) -> Result<Box<dyn Tokenizer>, ConfigError> {
        Ok(match self {
            Self::Qgrams { qval, start_stop } => {
                Box::new(QGrams::new(*qval)?.with_start_stop(*start_stop))
            }
            Self::Whitespace => Box::new(Whitespace),
            Self::Characters => Box::new(Characters),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bigrams_with_markers() {
        let bag = QGrams::default().tokenize("cat");
        let tokens: Vec<&str> = bag.tokens().collect();
        assert_eq!(tokens, vec!["$c", "at", "ca", "t#"]);
        assert_eq!(bag.card(), 4.0);
    }

    #[test]
    fn test_bigrams_without_markers() {
        let bag = QGrams::default().with_start_stop(None).tokenize("cat");
        let tokens: Vec<&str> = bag.tokens().collect();
        assert_eq!(tokens, vec!["at", "ca"]);
    }

    #[test]
    fn test_repeated_grams_are_counted() {
        let bag = QGrams::new(2)
            .unwrap()
            .with_start_stop(None)
            .tokenize("aaa");
        assert_eq!(bag.get("aa"), 2.0);
    }

    #[test]
    fn test_trigram_padding() {
        let bag = QGrams::new(3).unwrap().tokenize("ab");
        let tokens: Vec<&str> = bag.tokens().collect();
        assert_eq!(tokens, vec!["$$a", "$ab", "ab#", "b##"]);
    }

    #[test]
    fn test_short_input_without_markers() {
        let bag = QGrams::new(3).unwrap().with_start_stop(None).tokenize("ab");
        assert!(bag.is_empty());
    }

    #[test]
    fn test_empty_input() {
        assert!(QGrams::default().tokenize("").is_empty());
        assert!(Whitespace.tokenize("").is_empty());
        assert!(Characters.tokenize("").is_empty());
    }

    #[test]
    fn test_zero_qval_rejected() {
        assert_eq!(QGrams::new(0), Err(ConfigError::InvalidQval(0)));
    }

    #[test]
    fn test_whitespace_and_characters() {
        let words = Whitespace.tokenize("the cat  the");
        assert_eq!(words.get("the"), 2.0);
        assert_eq!(words.get("cat"), 1.0);

        let chars = Characters.tokenize("noon");
        assert_eq!(chars.get("n"), 2.0);
        assert_eq!(chars.get("o"), 2.0);
    }

    #[test]
    fn test_config_deserialize() {
        let config: TokenizerConfig = serde_json::from_str(r#"{"kind":"qgrams","qval":3}"#).unwrap();
        assert_eq!(
            config,
            TokenizerConfig::Qgrams {
                qval: 3,
                start_stop: Some(('$', '#'))
            }
        );
        let config: TokenizerConfig = serde_json::from_str(r#"{"kind":"whitespace"}"#).unwrap();
        assert_eq!(config, TokenizerConfig::Whitespace);
    }
}
