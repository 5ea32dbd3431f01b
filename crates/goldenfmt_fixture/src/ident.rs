use crate::path::{FixturePath, TestIdentifier};

pub const IDENTIFIER_PREFIX: &str = "test";

/// Derive the test identifier of a fixture.
///
/// Every directory segment and the file stem are split on non-alphanumeric
/// characters, each word gets an upper-case first letter, and the words are
/// joined behind `test`: `idioms/block_for.kt` becomes `testIdiomsBlockFor`.
pub fn derive_identifier(path: &FixturePath) -> TestIdentifier {
    let mut id = String::from(IDENTIFIER_PREFIX);
    let parent = path.parent();
    let segments = parent
        .split('/')
        .filter(|segment| !segment.is_empty())
        .chain(std::iter::once(path.stem()));

    for segment in segments {
        for word in segment
            .split(|ch: char| !ch.is_alphanumeric())
            .filter(|word| !word.is_empty())
        {
            push_capitalized(&mut id, word);
        }
    }

    TestIdentifier::new(id)
}

fn push_capitalized(out: &mut String, word: &str) {
    let mut chars = word.chars();
    if let Some(first) = chars.next() {
        out.extend(first.to_uppercase());
        out.push_str(chars.as_str());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(path: &str) -> String {
        derive_identifier(&FixturePath::new(path)).as_str().to_string()
    }

    #[test]
    fn test_simple_stem() {
        assert_eq!(id("Alpha.src"), "testAlpha");
        assert_eq!(id("BlockFor.kt"), "testBlockFor");
    }

    #[test]
    fn test_separators_removed() {
        assert_eq!(id("block_for.kt"), "testBlockFor");
        assert_eq!(id("remove-spaces around.kt"), "testRemoveSpacesAround");
    }

    #[test]
    fn test_directories_included() {
        assert_eq!(id("idioms/If.kt"), "testIdiomsIf");
        assert_eq!(id("a/b-c/D.kt"), "testABCD");
    }

    #[test]
    fn test_digits_and_unicode() {
        assert_eq!(id("2fold.kt"), "test2fold");
        assert_eq!(id("über.kt"), "testÜber");
    }

    #[test]
    fn test_degenerate_stem_is_total() {
        assert_eq!(id("_.kt"), "test");
        assert_eq!(id(""), "test");
    }

    #[test]
    fn test_case_only_difference_collides() {
        // derivation is not injective on its own; the consistency checker reports these
        assert_eq!(id("if.kt"), id("If.kt"));
    }
}
