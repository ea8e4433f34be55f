//! # Error Suggestions
//!
//! This module provides helper functions for generating helpful error
//! messages with hints and suggestions. Errors should tell users what went
//! wrong AND how to fix it.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tag_compare::suggestions;
//!
//! // Instead of:
//! anyhow::bail!("Tag not found: {}", tag);
//!
//! // Use:
//! return Err(suggestions::unknown_tag(tag, &known));
//! ```
//!
//! [`with_hints`] converts any library error into its hinted form and is what
//! the commands use at their boundary.

use crate::error::Error;

/// Generate an error for a repository location that cannot be opened.
///
/// Includes hints about:
/// - Passing a local path or remote URL with --repo
/// - Using the REPO_URL environment variable
pub fn repository_not_found(source: &str, error: &Error) -> anyhow::Error {
    anyhow::anyhow!(
        "Cannot open repository: {source}\n\
         error: {error}\n\n\
         hint: Use --repo with a local repository path or a remote URL\n\
         hint: Set the REPO_URL environment variable"
    )
}

/// Generate an error for a repository without usable tags.
///
/// Includes hints about tag filters and tag naming.
pub fn no_tags(filter: Option<&str>) -> anyhow::Error {
    let filter_hint = filter
        .map(|f| format!("\nhint: No tag matches --tag-filter {f:?}; loosen or drop the filter"))
        .unwrap_or_default();

    anyhow::anyhow!(
        "No tags found in repository{filter_hint}\n\n\
         hint: Tags are read from refs/tags; fetch them with 'git fetch --tags'\n\
         hint: Tag names should end in -v<number>, e.g. '2.10-v3877'"
    )
}

/// Generate an error for a tag that is not in the catalog.
///
/// Suggests a known tag with a similar name.
pub fn unknown_tag(tag: &str, known: &[&str]) -> anyhow::Error {
    let did_you_mean = find_similar(tag, known)
        .map(|s| format!("\nhint: Did you mean '{s}'?"))
        .unwrap_or_default();

    anyhow::anyhow!(
        "Tag not found: {tag}{did_you_mean}\n\n\
         hint: Run 'tag-compare tags' to list known tags"
    )
}

/// Generate an error for a tag name without a version ordinal.
pub fn invalid_tag_format(tag: &str, message: &str) -> anyhow::Error {
    anyhow::anyhow!(
        "Tag {tag:?} has no version ordinal: {message}\n\n\
         hint: Tag names should end in -v<number>, e.g. '2.10-v3877'\n\
         hint: Drop --strict-versions to order such tags first with a warning\n\
         hint: Use --tag-filter to leave such tags out"
    )
}

/// Generate an error for two tags sharing an ordinal.
pub fn duplicate_ordinal(ordinal: u64, first: &str, second: &str) -> anyhow::Error {
    anyhow::anyhow!(
        "Tags {first} and {second} share the version ordinal {ordinal}\n\n\
         hint: Every tag needs a distinct -v<number> suffix\n\
         hint: Use --tag-filter to compare one release line at a time"
    )
}

/// Generate an error for an invalid regex pattern.
///
/// Includes hints about common regex mistakes.
pub fn invalid_regex(pattern: &str, error: &regex::Error) -> anyhow::Error {
    let hint = match error {
        regex::Error::Syntax(msg) if msg.contains("unclosed") => {
            "hint: Check for unclosed brackets, parentheses, or braces"
        }
        regex::Error::Syntax(msg) if msg.contains("repetition") => {
            "hint: Repetition operators (+, *, ?) must follow a pattern"
        }
        _ => "hint: Anchor the pattern with ^ to match tag name prefixes",
    };

    anyhow::anyhow!(
        "Invalid regex pattern: {pattern}\n\
         error: {error}\n\n\
         {hint}\n\
         hint: Test patterns at https://regex101.com (select Rust flavor)"
    )
}

/// Generate an error for an invalid glob pattern.
///
/// Includes hints about glob syntax.
pub fn invalid_glob(pattern: &str, error: &glob::PatternError) -> anyhow::Error {
    anyhow::anyhow!(
        "Invalid glob pattern: {pattern}\n\
         error: {error}\n\n\
         hint: Use * for single path component, ** for recursive matching\n\
         hint: Use [abc] for character classes, [!abc] to negate\n\
         hint: Escape special characters with backslash"
    )
}

/// Wraps a library error with hints where one applies.
///
/// `known_tags` feeds the "did you mean" hint of unknown tags.
pub fn with_hints(error: Error, known_tags: &[&str]) -> anyhow::Error {
    match &error {
        Error::EmptyCatalog { filter } => no_tags(filter.as_deref()),
        Error::TagNotFound { tag } => unknown_tag(tag, known_tags),
        Error::Format { tag, message } => invalid_tag_format(tag, message),
        Error::DuplicateOrdinal {
            ordinal,
            first,
            second,
        } => duplicate_ordinal(*ordinal, first, second),
        _ => error.into(),
    }
}

/// Find a similar string from a list of candidates using edit distance.
///
/// Returns Some(candidate) if a close match is found (edit distance <= 2).
fn find_similar<'a>(input: &str, candidates: &[&'a str]) -> Option<&'a str> {
    candidates
        .iter()
        .filter_map(|&candidate| {
            let distance = edit_distance(input, candidate);
            if distance <= 2 && distance < input.len() {
                Some((candidate, distance))
            } else {
                None
            }
        })
        .min_by_key(|(_, distance)| *distance)
        .map(|(candidate, _)| candidate)
}

/// Calculate the Levenshtein edit distance between two strings.
fn edit_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    if a_chars.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a_chars.len();
    }

    // Single rolling row
    let mut row: Vec<usize> = (0..=b_chars.len()).collect();
    for (i, a_char) in a_chars.iter().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, b_char) in b_chars.iter().enumerate() {
            let cost = usize::from(a_char != b_char);
            let next = (row[j + 1] + 1).min(row[j] + 1).min(diagonal + cost);
            diagonal = row[j + 1];
            row[j + 1] = next;
        }
    }

    row[b_chars.len()]
}
