//! Locating a fixture's input and its recorded expected output.

use std::fs;
use std::path::Path;

use goldenfmt_config::ExpectedConvention;
use goldenfmt_fixture::FixturePath;

use crate::outcome::CaseError;

/// Input text and golden text of one case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseFiles {
    pub source: String,
    pub expected: String,
    /// File the expected text was read from
    pub expected_path: FixturePath,
}

/// Path of the golden file for `fixture` under the sibling convention:
/// `If.kt` with marker `after` becomes `If.after.kt`.
pub fn sibling_path(fixture: &FixturePath, marker: &str) -> FixturePath {
    let name = match fixture.extension() {
        Some(ext) => format!("{}.{marker}.{ext}", fixture.stem()),
        None => format!("{}.{marker}", fixture.stem()),
    };
    fixture.with_file_name(&name)
}

/// Split a sectioned fixture at the first line equal to `separator`
/// (ignoring the line terminator). Returns `(input, expected)`.
pub fn split_sections<'a>(text: &'a str, separator: &str) -> Option<(&'a str, &'a str)> {
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        if line.trim_end_matches(['\r', '\n']) == separator {
            let rest = offset + line.len();
            return Some((&text[..offset], &text[rest..]));
        }
        offset += line.len();
    }
    None
}

/// Read both sides of a case. Nothing is ever written back.
pub fn load_case(
    root: &Path,
    fixture: &FixturePath,
    convention: &ExpectedConvention,
) -> Result<CaseFiles, CaseError> {
    let text =
        fs::read_to_string(fixture.to_path(root)).map_err(|err| CaseError::FixtureMissing {
            path: fixture.clone(),
            message: err.to_string(),
        })?;

    match convention {
        ExpectedConvention::Sibling { marker } => {
            let expected_path = sibling_path(fixture, marker);
            let expected = fs::read_to_string(expected_path.to_path(root)).map_err(|err| {
                CaseError::ExpectedMissing {
                    path: expected_path.clone(),
                    message: err.to_string(),
                }
            })?;
            Ok(CaseFiles {
                source: text,
                expected,
                expected_path,
            })
        }
        ExpectedConvention::Sectioned { separator } => {
            let Some((source, expected)) = split_sections(&text, separator) else {
                return Err(CaseError::ExpectedMissing {
                    path: fixture.clone(),
                    message: format!("no `{separator}` line separating input and expected output"),
                });
            };
            Ok(CaseFiles {
                source: source.to_string(),
                expected: expected.to_string(),
                expected_path: fixture.clone(),
            })
        }
    }
}
