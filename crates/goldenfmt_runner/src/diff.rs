//! Line-oriented diff between expected and actual formatter output.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LineTag {
    Equal,
    /// Only in the expected text
    Removed,
    /// Only in the actual text
    Added,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffLine {
    pub tag: LineTag,
    /// 1-based line number in the expected text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_line: Option<usize>,
    /// 1-based line number in the actual text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_line: Option<usize>,
    /// Line content including its terminator, if any
    pub text: String,
}

impl DiffLine {
    /// Content made printable: the line break is dropped, carriage returns
    /// are spelled out and a missing final newline is called out.
    pub fn display_text(&self) -> String {
        match self.text.strip_suffix('\n') {
            Some(body) => body.replace('\r', "\\r"),
            None => format!("{} \\ no newline at end", self.text.replace('\r', "\\r")),
        }
    }
}

/// Diff of two texts, line by line. Lines keep their terminators so that a
/// missing trailing newline or a `\r\n` shows up as a changed line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextDiff {
    pub lines: Vec<DiffLine>,
}

pub const DEFAULT_CONTEXT: usize = 3;

impl TextDiff {
    pub fn compute(expected: &str, actual: &str) -> Self {
        let old: Vec<&str> = expected.split_inclusive('\n').collect();
        let new: Vec<&str> = actual.split_inclusive('\n').collect();

        let prefix = old.iter().zip(&new).take_while(|(a, b)| a == b).count();
        let suffix = old[prefix..]
            .iter()
            .rev()
            .zip(new[prefix..].iter().rev())
            .take_while(|(a, b)| a == b)
            .count();

        let mut lines = Vec::with_capacity(old.len().max(new.len()));
        for (idx, text) in old[..prefix].iter().enumerate() {
            lines.push(equal(idx, idx, text));
        }

        let old_mid = &old[prefix..old.len() - suffix];
        let new_mid = &new[prefix..new.len() - suffix];
        for (tag, old_idx, new_idx) in lcs_script(old_mid, new_mid) {
            let (expected_line, actual_line, text) = match tag {
                LineTag::Equal => (
                    Some(prefix + old_idx + 1),
                    Some(prefix + new_idx + 1),
                    old_mid[old_idx],
                ),
                LineTag::Removed => (Some(prefix + old_idx + 1), None, old_mid[old_idx]),
                LineTag::Added => (None, Some(prefix + new_idx + 1), new_mid[new_idx]),
            };
            lines.push(DiffLine {
                tag,
                expected_line,
                actual_line,
                text: text.to_string(),
            });
        }

        for offset in 0..suffix {
            let old_idx = old.len() - suffix + offset;
            let new_idx = new.len() - suffix + offset;
            lines.push(equal(old_idx, new_idx, old[old_idx]));
        }

        Self { lines }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.iter().all(|line| line.tag == LineTag::Equal)
    }

    pub fn changed_lines(&self) -> usize {
        self.lines
            .iter()
            .filter(|line| line.tag != LineTag::Equal)
            .count()
    }

    /// Lines to show: every change plus up to `context` equal lines around it.
    /// `None` marks a gap of omitted lines.
    pub fn hunks(&self, context: usize) -> Vec<Option<&DiffLine>> {
        let len = self.lines.len();
        let mut keep = vec![false; len];
        for (idx, line) in self.lines.iter().enumerate() {
            if line.tag != LineTag::Equal {
                let start = idx.saturating_sub(context);
                let end = (idx + context + 1).min(len);
                keep[start..end].iter_mut().for_each(|flag| *flag = true);
            }
        }

        let mut shown = Vec::new();
        let mut skipped = false;
        for (idx, line) in self.lines.iter().enumerate() {
            if keep[idx] {
                if skipped && !shown.is_empty() {
                    shown.push(None);
                }
                skipped = false;
                shown.push(Some(line));
            } else {
                skipped = true;
            }
        }
        shown
    }
}

impl fmt::Display for TextDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- expected")?;
        writeln!(f, "+++ actual")?;
        for line in self.hunks(DEFAULT_CONTEXT) {
            match line {
                None => writeln!(f, "@@ ... @@")?,
                Some(line) => {
                    let sign = match line.tag {
                        LineTag::Equal => ' ',
                        LineTag::Removed => '-',
                        LineTag::Added => '+',
                    };
                    writeln!(f, "{sign}{}", line.display_text())?;
                }
            }
        }
        Ok(())
    }
}

fn equal(old_idx: usize, new_idx: usize, text: &str) -> DiffLine {
    DiffLine {
        tag: LineTag::Equal,
        expected_line: Some(old_idx + 1),
        actual_line: Some(new_idx + 1),
        text: text.to_string(),
    }
}

/// Largest LCS table built before falling back to a block replacement
/// (16 MiB of `u32` cells).
const MAX_TABLE_CELLS: usize = 4 * 1024 * 1024;

/// Edit script from a longest-common-subsequence table.
fn lcs_script(old: &[&str], new: &[&str]) -> Vec<(LineTag, usize, usize)> {
    let (n, m) = (old.len(), new.len());
    if (n + 1).saturating_mul(m + 1) > MAX_TABLE_CELLS {
        return block_script(n, m);
    }
    let mut table = vec![vec![0u32; m + 1]; n + 1];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            table[i][j] = if old[i] == new[j] {
                table[i + 1][j + 1] + 1
            } else {
                table[i + 1][j].max(table[i][j + 1])
            };
        }
    }

    let mut script = Vec::with_capacity(n + m);
    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if old[i] == new[j] {
            script.push((LineTag::Equal, i, j));
            i += 1;
            j += 1;
        } else if table[i + 1][j] >= table[i][j + 1] {
            script.push((LineTag::Removed, i, j));
            i += 1;
        } else {
            script.push((LineTag::Added, i, j));
            j += 1;
        }
    }
    script.extend((i..n).map(|i| (LineTag::Removed, i, j)));
    script.extend((j..m).map(|j| (LineTag::Added, i, j)));
    script
}

/// Every old line removed, then every new line added.
fn block_script(n: usize, m: usize) -> Vec<(LineTag, usize, usize)> {
    let mut script = Vec::with_capacity(n + m);
    script.extend((0..n).map(|i| (LineTag::Removed, i, 0)));
    script.extend((0..m).map(|j| (LineTag::Added, n, j)));
    script
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(diff: &TextDiff) -> Vec<LineTag> {
        diff.lines.iter().map(|line| line.tag).collect()
    }

    #[test]
    fn test_equal_texts() {
        let diff = TextDiff::compute("a\nb\n", "a\nb\n");
        assert!(diff.is_empty());
        assert_eq!(diff.changed_lines(), 0);
    }

    #[test]
    fn test_operator_spacing_change() {
        let diff = TextDiff::compute("a+b\n", "a + b\n");
        assert_eq!(tags(&diff), vec![LineTag::Removed, LineTag::Added]);
        let rendered = diff.to_string();
        assert!(rendered.contains("-a+b"));
        assert!(rendered.contains("+a + b"));
    }

    #[test]
    fn test_insertion_does_not_cascade() {
        let diff = TextDiff::compute("one\ntwo\nthree\n", "one\ninserted\ntwo\nthree\n");
        assert_eq!(diff.changed_lines(), 1);
        let added = diff
            .lines
            .iter()
            .find(|line| line.tag == LineTag::Added)
            .unwrap();
        assert_eq!(added.actual_line, Some(2));
        assert_eq!(added.text, "inserted\n");
    }

    #[test]
    fn test_missing_trailing_newline_is_visible() {
        let diff = TextDiff::compute("val x = 1\n", "val x = 1");
        assert_eq!(diff.changed_lines(), 2);
        assert!(diff.to_string().contains("no newline at end"));
    }

    #[test]
    fn test_carriage_return_is_visible() {
        let diff = TextDiff::compute("a\r\n", "a\n");
        assert!(diff.to_string().contains("-a\\r"));
    }

    #[test]
    fn test_large_rewrite_stays_bounded() {
        let expected: String = (0..6000).map(|i| format!("old {i}\n")).collect();
        let actual: String = (0..6000).map(|i| format!("new {i}\n")).collect();
        let diff = TextDiff::compute(&expected, &actual);

        assert_eq!(diff.lines.len(), 12_000);
        assert_eq!(diff.changed_lines(), 12_000);
        assert_eq!(diff.lines[0].tag, LineTag::Removed);
        assert_eq!(diff.lines[0].expected_line, Some(1));
        assert_eq!(diff.lines[6000].tag, LineTag::Added);
        assert_eq!(diff.lines[6000].actual_line, Some(1));
        assert_eq!(diff.lines[11_999].text, "new 5999\n");
    }

    #[test]
    fn test_context_is_limited() {
        let expected: String = (0..20).map(|i| format!("line {i}\n")).collect();
        let actual = expected.replace("line 10\n", "line ten\n");
        let diff = TextDiff::compute(&expected, &actual);
        let shown = diff.hunks(2);
        // 2 context lines on each side of one removed and one added line
        assert_eq!(shown.len(), 6);
        let rendered = diff.to_string();
        assert!(!rendered.contains("line 1\n"));
        assert!(rendered.contains("line 7"));
    }

    #[test]
    fn test_gap_marker_between_distant_changes() {
        let expected: String = (0..30).map(|i| format!("{i}\n")).collect();
        let actual: String = (0..30)
            .map(|i| match i {
                2 => "two\n".to_string(),
                25 => "twenty-five\n".to_string(),
                _ => format!("{i}\n"),
            })
            .collect();
        let diff = TextDiff::compute(&expected, &actual);
        assert!(diff.hunks(1).contains(&None));
    }
}
