//! Line-oriented parser for the parts of Gherkin that cost estimation needs.
//!
//! Recognized (English keywords only):
//! - `Feature:`, `Rule:`, `Background:`
//! - `Scenario:` / `Example:`, `Scenario Outline:` / `Scenario Template:`
//! - `Examples:` / `Scenarios:` followed by a table (header + rows)
//! - Steps: `Given`, `When`, `Then`, `And`, `But`, `*`
//! - `@tag` lines, `#` comments, doc strings, data tables, free-text descriptions

use std::sync::LazyLock;

use regex::Regex;
use testsplit_shared::{Result, TestSplitError};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A parsed feature file.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    /// Text after `Feature:`.
    pub name: String,
    /// 1-based line of the `Feature:` keyword.
    pub line: usize,
    /// Tags on the feature itself.
    pub tags: Vec<String>,
    /// Backgrounds and scenarios in file order, rules flattened.
    pub children: Vec<Child>,
}

/// What kind of section a [`Child`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildKind {
    Background,
    Scenario,
    Outline,
}

/// A background or scenario.
#[derive(Debug, Clone, PartialEq)]
pub struct Child {
    pub kind: ChildKind,
    pub name: String,
    pub line: usize,
    /// Own tags followed by the enclosing rule's tags.
    pub tags: Vec<String>,
    /// Number of steps.
    pub steps: usize,
    /// Examples tables (outlines only).
    pub examples: Vec<Examples>,
}

/// An `Examples:` block of a scenario outline.
#[derive(Debug, Clone, PartialEq)]
pub struct Examples {
    pub line: usize,
    pub tags: Vec<String>,
    /// Lines of the table body rows; each row is one scenario.
    pub rows: Vec<usize>,
    header_seen: bool,
}

impl Feature {
    /// Scenarios and outlines, without backgrounds.
    pub fn scenarios(&self) -> impl Iterator<Item = &Child> {
        self.children
            .iter()
            .filter(|c| c.kind != ChildKind::Background)
    }
}

// ---------------------------------------------------------------------------
// Regex patterns (compiled once)
// ---------------------------------------------------------------------------

/// Matches a section keyword and its title.
static KEYWORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(Feature|Rule|Background|Scenario Outline|Scenario Template|Scenario|Example|Examples|Scenarios):\s*(.*)$",
    )
    .expect("keyword regex")
});

/// Matches a step line.
static STEP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(Given|When|Then|And|But|\*)(\s|$)").expect("step regex")
});

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// The block the parser is in; decides how plain lines are read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Section {
    /// `Feature:` or `Rule:` header. Everything up to the next child is
    /// description, step-like lines included.
    #[default]
    Header,
    /// Background or scenario body.
    Child,
    /// `Examples:` block of the last child: description, header row, body rows.
    Examples,
}

#[derive(Default)]
struct ParseState {
    feature: Option<Feature>,
    section: Section,
    pending_tags: Vec<String>,
    rule_tags: Vec<String>,
    /// Delimiter of the open doc string and the line it opened on.
    doc_string: Option<(&'static str, usize)>,
}

/// Parse feature file content.
///
/// Errors carry the 1-based line number of the offending line.
pub fn parse_feature(content: &str) -> Result<Feature> {
    let mut state = ParseState::default();

    for (index, raw) in content.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim();

        // --- Doc string bodies are opaque ---
        if let Some((delimiter, _)) = state.doc_string {
            if line.starts_with(delimiter) {
                state.doc_string = None;
            }
            continue;
        }

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.starts_with('@') {
            state.pending_tags.extend(parse_tags(line));
            continue;
        }

        if let Some(caps) = KEYWORD_RE.captures(line) {
            let title = caps[2].trim().to_string();
            state.keyword(&caps[1], title, line_no)?;
            continue;
        }

        let Some(feature) = state.feature.as_mut() else {
            return Err(line_error(line_no, "expected `Feature:` before any other content"));
        };

        match state.section {
            Section::Header => {
                if line.starts_with('|') {
                    return Err(line_error(line_no, "table outside of a scenario"));
                }
                if doc_string_delimiter(line).is_some() {
                    return Err(line_error(line_no, "doc string without a preceding step"));
                }
            }
            Section::Child => {
                let child = current_child(feature, line_no)?;
                if STEP_RE.is_match(line) {
                    child.steps += 1;
                } else if let Some(delimiter) = doc_string_delimiter(line) {
                    if child.steps == 0 {
                        return Err(line_error(line_no, "doc string without a preceding step"));
                    }
                    state.doc_string = Some((delimiter, line_no));
                } else if line.starts_with('|') {
                    // data table argument of the last step
                    if child.steps == 0 {
                        return Err(line_error(line_no, "table without a preceding step"));
                    }
                } else if child.steps > 0 {
                    return Err(line_error(line_no, format!("unexpected text `{line}`")));
                }
            }
            Section::Examples => {
                let examples = current_child(feature, line_no)?
                    .examples
                    .last_mut()
                    .ok_or_else(|| line_error(line_no, "no open `Examples:` block"))?;
                if line.starts_with('|') {
                    if examples.header_seen {
                        examples.rows.push(line_no);
                    } else {
                        examples.header_seen = true;
                    }
                } else if examples.header_seen {
                    if STEP_RE.is_match(line) {
                        return Err(line_error(line_no, "step after an `Examples:` table"));
                    }
                    return Err(line_error(line_no, format!("unexpected text `{line}`")));
                }
            }
        }
    }

    if let Some((_, opened)) = state.doc_string {
        return Err(line_error(opened, "unterminated doc string"));
    }
    state.close_examples()?;

    state
        .feature
        .ok_or_else(|| TestSplitError::parse("no `Feature:` found"))
}

impl ParseState {
    fn keyword(&mut self, keyword: &str, title: String, line: usize) -> Result<()> {
        self.close_examples()?;
        let tags = std::mem::take(&mut self.pending_tags);

        if keyword == "Feature" {
            if self.feature.is_some() {
                return Err(line_error(line, "a file may only contain one `Feature:`"));
            }
            self.feature = Some(Feature {
                name: title,
                line,
                tags,
                children: Vec::new(),
            });
            self.section = Section::Header;
            return Ok(());
        }

        let Some(feature) = self.feature.as_mut() else {
            return Err(line_error(line, format!("`{keyword}:` before `Feature:`")));
        };

        match keyword {
            "Rule" => {
                self.rule_tags = tags;
                self.section = Section::Header;
            }
            "Background" => {
                feature.children.push(Child {
                    kind: ChildKind::Background,
                    name: title,
                    line,
                    tags: self.rule_tags.clone(),
                    steps: 0,
                    examples: Vec::new(),
                });
                self.section = Section::Child;
            }
            "Examples" | "Scenarios" => {
                let in_scenario = self.section != Section::Header;
                let child = feature
                    .children
                    .last_mut()
                    .filter(|c| in_scenario && c.kind != ChildKind::Background)
                    .ok_or_else(|| line_error(line, "`Examples:` outside of a scenario outline"))?;
                // A plain `Scenario:` with examples behaves as an outline.
                child.kind = ChildKind::Outline;
                child.examples.push(Examples {
                    line,
                    tags,
                    rows: Vec::new(),
                    header_seen: false,
                });
                self.section = Section::Examples;
            }
            _ => {
                let kind = if keyword.starts_with("Scenario ") {
                    ChildKind::Outline
                } else {
                    ChildKind::Scenario
                };
                let mut child_tags = tags;
                child_tags.extend(self.rule_tags.iter().cloned());
                feature.children.push(Child {
                    kind,
                    name: title,
                    line,
                    tags: child_tags,
                    steps: 0,
                    examples: Vec::new(),
                });
                self.section = Section::Child;
            }
        }
        Ok(())
    }

    /// Fail if the block being left is an `Examples:` without a header row.
    fn close_examples(&self) -> Result<()> {
        if self.section != Section::Examples {
            return Ok(());
        }
        let open = self
            .feature
            .as_ref()
            .and_then(|f| f.children.last())
            .and_then(|c| c.examples.last());
        match open {
            Some(examples) if !examples.header_seen => Err(line_error(
                examples.line,
                "`Examples:` without a header row",
            )),
            _ => Ok(()),
        }
    }
}

fn current_child(feature: &mut Feature, line: usize) -> Result<&mut Child> {
    feature
        .children
        .last_mut()
        .ok_or_else(|| line_error(line, "text outside of a scenario or background"))
}

fn doc_string_delimiter(line: &str) -> Option<&'static str> {
    ["\"\"\"", "```"]
        .into_iter()
        .find(|delimiter| line.starts_with(delimiter))
}

/// Split a tag line into `@tags`, stopping at a trailing comment.
fn parse_tags(line: &str) -> impl Iterator<Item = String> + '_ {
    line.split_whitespace()
        .take_while(|token| !token.starts_with('#'))
        .filter(|token| token.starts_with('@'))
        .map(str::to_string)
}

fn line_error(line: usize, msg: impl std::fmt::Display) -> TestSplitError {
    TestSplitError::parse(format!("line {line}: {msg}"))
}
