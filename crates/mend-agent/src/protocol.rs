//! Response-protocol parser
//!
//! The model is asked to answer with triple-backtick fenced blocks whose
//! header line is either `run` (body: shell commands for operator review) or
//! a `branch=<name>, path=<file>` pair (body: full file content), plus at
//! most one `summary=<text>` line anywhere in the response.
//!
//! Parsing is a two-step pipeline: a fence lexer slices the raw text into
//! `CodeBlock`s (header line + body), then each header is classified into a
//! typed directive. Blocks that match no known shape are returned as
//! [`SkippedBlock`]s rather than silently vanishing, so the caller can warn.
//!
//! Known limitation: fences pair non-greedily, so a body that itself
//! contains the fence marker terminates its block early. The model is
//! instructed not to nest fences.

use mend_core::{Directive, ParsedResponse, SkippedBlock};

const FENCE: &str = "```";

/// One fenced span: header line plus unmodified body
#[derive(Debug, Clone, PartialEq, Eq)]
struct CodeBlock {
    header: String,
    body: String,
}

/// Typed classification of a block header
#[derive(Debug, Clone, PartialEq, Eq)]
enum HeaderClass {
    /// Header starts with `run` (prefix match; trailing text is ignored)
    Run,
    /// Header carries both `branch=` and `path=` key/value pairs
    FileChange { branch: String, path: String },
    /// Neither shape matched
    Unrecognized,
}

/// Parse a raw model response into directives, a summary, and skipped blocks
///
/// Directives come back in the order their blocks appear. The summary is
/// extracted independently of block structure; only the first `summary=`
/// line in the whole text counts, and it may be absent (empty string).
pub fn parse_response(raw: &str) -> ParsedResponse {
    let mut directives = Vec::new();
    let mut skipped = Vec::new();

    for block in lex_blocks(raw) {
        match classify_header(&block.header) {
            HeaderClass::Run => {
                directives.push(Directive::RunCommand {
                    commands: block.body.trim().to_string(),
                });
            }
            HeaderClass::FileChange { branch, path } => {
                // Body stays verbatim: leading/trailing blank lines are part
                // of the file content.
                directives.push(Directive::FileChange {
                    branch,
                    path,
                    content: block.body,
                });
            }
            HeaderClass::Unrecognized => {
                skipped.push(SkippedBlock {
                    header: block.header,
                });
            }
        }
    }

    ParsedResponse {
        directives,
        summary: extract_summary(raw),
        skipped,
    }
}

/// Slice the raw text into fenced blocks
///
/// Each fence opener pairs with the *nearest* following closer. The span
/// splits on its first line break: everything before is the header,
/// everything after is the body, untouched. A span with no line break is all
/// header and has an empty body. An unpaired trailing fence is ignored.
fn lex_blocks(text: &str) -> Vec<CodeBlock> {
    let mut blocks = Vec::new();
    let mut remaining = text;

    while let Some(start) = remaining.find(FENCE) {
        let span_start = start + FENCE.len();

        match remaining[span_start..].find(FENCE) {
            Some(end) => {
                let span = &remaining[span_start..span_start + end];
                let (header, body) = match span.split_once('\n') {
                    Some((header, body)) => (header, body),
                    None => (span, ""),
                };

                blocks.push(CodeBlock {
                    header: header.to_string(),
                    body: body.to_string(),
                });

                remaining = &remaining[span_start + end + FENCE.len()..];
            }
            None => break,
        }
    }

    blocks
}

/// Classify a block header (case-sensitive; `run` wins over key/value pairs)
fn classify_header(header: &str) -> HeaderClass {
    if header.trim().starts_with("run") {
        return HeaderClass::Run;
    }

    let branch = extract_key_value(header, "branch");
    let path = extract_key_value(header, "path");

    match (branch, path) {
        (Some(branch), Some(path)) => HeaderClass::FileChange { branch, path },
        _ => HeaderClass::Unrecognized,
    }
}

/// Find `key = value` in a header line
///
/// Whitespace is allowed around `=`; the value is the longest run of
/// non-whitespace, non-comma characters. An occurrence of `key` without a
/// following `=` or with an empty value is passed over and the search
/// continues.
fn extract_key_value(header: &str, key: &str) -> Option<String> {
    let mut search = header;

    while let Some(pos) = search.find(key) {
        let after = &search[pos + key.len()..];
        let at_eq = after.trim_start_matches([' ', '\t']);

        if let Some(rest) = at_eq.strip_prefix('=') {
            let value: String = rest
                .trim_start_matches([' ', '\t'])
                .chars()
                .take_while(|c| !c.is_whitespace() && *c != ',')
                .collect();
            if !value.is_empty() {
                return Some(value);
            }
        }

        search = after;
    }

    None
}

/// Extract the first `summary=` line from the whole text
///
/// Independent of block structure; the remainder of the matching line is
/// captured and trimmed. Later `summary=` lines are ignored. Absent means
/// empty.
fn extract_summary(text: &str) -> String {
    let mut search = text;

    while let Some(pos) = search.find("summary") {
        let after = &search[pos + "summary".len()..];
        let at_eq = after.trim_start_matches([' ', '\t']);

        if let Some(rest) = at_eq.strip_prefix('=') {
            let line = rest.lines().next().unwrap_or("");
            return line.trim().to_string();
        }

        search = after;
    }

    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_change_block_with_summary_line() {
        let raw = "```branch=backend, path=backend/app.py\nprint(\"hi\")\n```\nsummary=Fixed a null check\n";
        let parsed = parse_response(raw);

        assert_eq!(parsed.directives.len(), 1);
        assert_eq!(
            parsed.directives[0],
            Directive::FileChange {
                branch: "backend".to_string(),
                path: "backend/app.py".to_string(),
                content: "print(\"hi\")\n".to_string(),
            }
        );
        assert_eq!(parsed.summary, "Fixed a null check");
        assert!(parsed.skipped.is_empty());
    }

    #[test]
    fn run_block_without_summary() {
        let raw = "```run\npip install foo\n```\n";
        let parsed = parse_response(raw);

        assert_eq!(parsed.directives.len(), 1);
        assert_eq!(
            parsed.directives[0],
            Directive::RunCommand {
                commands: "pip install foo".to_string(),
            }
        );
        assert_eq!(parsed.summary, "");
    }

    #[test]
    fn directives_keep_source_order() {
        let raw = "```run\nmake test\n```\ntext between\n```branch=a, path=f.txt\nhello\n```\n```run\nmake lint\n```\n";
        let parsed = parse_response(raw);

        assert_eq!(parsed.directives.len(), 3);
        assert!(matches!(parsed.directives[0], Directive::RunCommand { .. }));
        assert!(matches!(parsed.directives[1], Directive::FileChange { .. }));
        assert!(matches!(parsed.directives[2], Directive::RunCommand { .. }));
    }

    #[test]
    fn file_content_is_verbatim() {
        let raw = "```branch=a, path=f.txt\n\n  indented\n\ntrailing blank below\n\n```";
        let parsed = parse_response(raw);

        assert_eq!(
            parsed.directives[0],
            Directive::FileChange {
                branch: "a".to_string(),
                path: "f.txt".to_string(),
                content: "\n  indented\n\ntrailing blank below\n\n".to_string(),
            }
        );
    }

    #[test]
    fn run_commands_are_trimmed() {
        let raw = "```run\n\n  pip install foo\n\n```";
        let parsed = parse_response(raw);
        assert_eq!(
            parsed.directives[0],
            Directive::RunCommand {
                commands: "pip install foo".to_string(),
            }
        );
    }

    #[test]
    fn run_header_with_trailing_text_still_matches() {
        let raw = "```run these after merging\necho done\n```";
        let parsed = parse_response(raw);
        assert_eq!(
            parsed.directives[0],
            Directive::RunCommand {
                commands: "echo done".to_string(),
            }
        );
    }

    #[test]
    fn branch_without_path_is_skipped() {
        let raw = "```branch=backend\nsome content\n```";
        let parsed = parse_response(raw);

        assert!(parsed.directives.is_empty());
        assert_eq!(parsed.skipped.len(), 1);
        assert_eq!(parsed.skipped[0].header, "branch=backend");
    }

    #[test]
    fn path_without_branch_is_skipped() {
        let raw = "```path=src/main.rs\nfn main() {}\n```";
        let parsed = parse_response(raw);
        assert!(parsed.directives.is_empty());
        assert_eq!(parsed.skipped.len(), 1);
    }

    #[test]
    fn unrecognized_header_is_skipped_not_dropped() {
        let raw = "```python\nprint(1)\n```";
        let parsed = parse_response(raw);
        assert!(parsed.directives.is_empty());
        assert_eq!(parsed.skipped.len(), 1);
        assert_eq!(parsed.skipped[0].header, "python");
    }

    #[test]
    fn header_match_is_case_sensitive() {
        let raw = "```Run\necho hi\n```";
        let parsed = parse_response(raw);
        assert!(parsed.directives.is_empty());
        assert_eq!(parsed.skipped.len(), 1);
    }

    #[test]
    fn whitespace_around_equals_is_accepted() {
        let raw = "```branch = backend , path = backend/app.py\ncontent\n```";
        let parsed = parse_response(raw);
        assert_eq!(
            parsed.directives[0],
            Directive::FileChange {
                branch: "backend".to_string(),
                path: "backend/app.py".to_string(),
                content: "content\n".to_string(),
            }
        );
    }

    #[test]
    fn first_summary_line_wins() {
        let raw = "summary=first one\nsome text\nsummary=second one\n";
        let parsed = parse_response(raw);
        assert_eq!(parsed.summary, "first one");
    }

    #[test]
    fn summary_found_outside_blocks_with_spacing() {
        let raw = "intro\nsummary  =   Rebuilt the login flow  \noutro\n";
        let parsed = parse_response(raw);
        assert_eq!(parsed.summary, "Rebuilt the login flow");
    }

    #[test]
    fn summary_with_no_value_is_empty() {
        let raw = "summary=\n";
        let parsed = parse_response(raw);
        assert_eq!(parsed.summary, "");
    }

    #[test]
    fn nested_fence_truncates_the_block() {
        let raw = "```branch=a, path=f.txt\nline1\n```inner text";
        let parsed = parse_response(raw);

        // The inner fence closes the block early; the tail is unpaired and
        // ignored.
        assert_eq!(parsed.directives.len(), 1);
        assert_eq!(
            parsed.directives[0],
            Directive::FileChange {
                branch: "a".to_string(),
                path: "f.txt".to_string(),
                content: "line1\n".to_string(),
            }
        );
    }

    #[test]
    fn unpaired_fence_yields_nothing() {
        let raw = "no blocks here ``` just one fence\n";
        let parsed = parse_response(raw);
        assert!(parsed.directives.is_empty());
        assert!(parsed.skipped.is_empty());
    }

    #[test]
    fn header_only_block_has_empty_body() {
        let raw = "```run```";
        let parsed = parse_response(raw);
        assert_eq!(
            parsed.directives[0],
            Directive::RunCommand {
                commands: String::new(),
            }
        );
    }

    #[test]
    fn multiline_run_commands_stay_opaque() {
        let raw = "```run\npip install foo\npython manage.py migrate\n```";
        let parsed = parse_response(raw);
        assert_eq!(
            parsed.directives[0],
            Directive::RunCommand {
                commands: "pip install foo\npython manage.py migrate".to_string(),
            }
        );
    }
}
