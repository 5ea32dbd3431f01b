//! Comparison and expected-output conventions

use serde::{Deserialize, Serialize};

/// How formatter output is compared against the golden file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ComparePolicy {
    /// Byte-for-byte, trailing newline included
    #[default]
    Exact,
    /// `\r\n` and lone `\r` become `\n` on both sides before comparing
    LineEndings,
}

impl ComparePolicy {
    /// Apply the policy to one side of the comparison.
    pub fn normalize<'a>(self, text: &'a str) -> std::borrow::Cow<'a, str> {
        match self {
            ComparePolicy::Exact => std::borrow::Cow::Borrowed(text),
            ComparePolicy::LineEndings if text.contains('\r') => {
                std::borrow::Cow::Owned(text.replace("\r\n", "\n").replace('\r', "\n"))
            }
            ComparePolicy::LineEndings => std::borrow::Cow::Borrowed(text),
        }
    }
}

impl std::str::FromStr for ComparePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "exact" | "bytes" => Ok(ComparePolicy::Exact),
            "line-endings" | "line_endings" | "eol" => Ok(ComparePolicy::LineEndings),
            _ => Err(format!("Unknown compare policy: {}", s)),
        }
    }
}

pub const DEFAULT_SIBLING_MARKER: &str = "after";
pub const DEFAULT_SECTION_SEPARATOR: &str = "// ---- expected ----";

/// Where the expected output of a fixture lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ExpectedConvention {
    /// `Name.kt` is paired with `Name.<marker>.kt` in the same directory
    Sibling { marker: String },
    /// One file holds the input, a separator line, then the expected output
    Sectioned { separator: String },
}

impl Default for ExpectedConvention {
    fn default() -> Self {
        ExpectedConvention::Sibling {
            marker: DEFAULT_SIBLING_MARKER.to_string(),
        }
    }
}

impl ExpectedConvention {
    pub fn sectioned() -> Self {
        ExpectedConvention::Sectioned {
            separator: DEFAULT_SECTION_SEPARATOR.to_string(),
        }
    }
}

impl std::str::FromStr for ExpectedConvention {
    type Err = String;

    /// Accepts `sibling`, `sibling:<marker>`, `sectioned` or `sectioned:<separator>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, arg) = match s.split_once(':') {
            Some((kind, arg)) => (kind, Some(arg)),
            None => (s, None),
        };
        match kind.to_lowercase().as_str() {
            "sibling" => Ok(ExpectedConvention::Sibling {
                marker: arg.unwrap_or(DEFAULT_SIBLING_MARKER).to_string(),
            }),
            "sectioned" => Ok(ExpectedConvention::Sectioned {
                separator: arg.unwrap_or(DEFAULT_SECTION_SEPARATOR).to_string(),
            }),
            _ => Err(format!("Unknown expected-output convention: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_keeps_carriage_returns() {
        let text = "a\r\nb";
        assert_eq!(ComparePolicy::Exact.normalize(text), "a\r\nb");
    }

    #[test]
    fn test_line_endings_normalized() {
        assert_eq!(ComparePolicy::LineEndings.normalize("a\r\nb\rc\n"), "a\nb\nc\n");
        assert_eq!(ComparePolicy::LineEndings.normalize("a  \n"), "a  \n");
    }

    #[test]
    fn test_parse_convention() {
        assert_eq!(
            "sibling".parse::<ExpectedConvention>().unwrap(),
            ExpectedConvention::default()
        );
        assert_eq!(
            "sibling:expected".parse::<ExpectedConvention>().unwrap(),
            ExpectedConvention::Sibling {
                marker: "expected".into()
            }
        );
        assert_eq!(
            "sectioned".parse::<ExpectedConvention>().unwrap(),
            ExpectedConvention::sectioned()
        );
        assert!("inline".parse::<ExpectedConvention>().is_err());
    }

    #[test]
    fn test_parse_compare_policy() {
        assert_eq!("EOL".parse::<ComparePolicy>(), Ok(ComparePolicy::LineEndings));
        assert!("fuzzy".parse::<ComparePolicy>().is_err());
    }
}
