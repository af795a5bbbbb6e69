//! Fenced-block response parsing.
//!
//! Generated responses are loosely structured text; this module is the one
//! place that knows how to pull code out of them. The scan is a heuristic
//! (there is no robust alternative short of a full parser per language),
//! so every outcome is a `ParsedArtifact`: clean blocks become artifacts,
//! malformed ones become failures instead of disappearing.
//!
//! Conventions recognized:
//! - fences open with ```` ```lang ```` and close with a bare ```` ``` ````
//! - a `filename:` annotation comment in the first lines of a block names
//!   the file (`//`, `/* */`, `#`, and `<!-- -->` comment forms)
//! - failing an annotation, an exported-symbol declaration names the file

use genloom_core::artifact::{
    CodeArtifact, FileCategory, FileSpec, ParseFailure, ParsedArtifact,
};

/// How many leading block lines are searched for a filename annotation.
const ANNOTATION_WINDOW: usize = 3;

/// Scan text for fenced code blocks.
///
/// A fence line inside an open block that carries its own language tag is
/// treated as literal content: the outer block stays open until a bare
/// closing fence. An unterminated fence at end of input yields a
/// `Failure` entry.
pub fn parse_blocks(text: &str) -> Vec<ParsedArtifact> {
    let mut results = Vec::new();
    let mut language: Option<String> = None;
    let mut body: Vec<&str> = Vec::new();
    let mut fence_line = "";

    for line in text.lines() {
        let trimmed = line.trim_start();
        match &language {
            None => {
                if let Some(rest) = trimmed.strip_prefix("```") {
                    language = Some(rest.trim().split_whitespace().next().unwrap_or("").to_string());
                    body.clear();
                    fence_line = trimmed;
                }
            }
            Some(lang) => {
                if trimmed.trim_end() == "```" {
                    results.push(make_artifact(lang, &body));
                    language = None;
                } else {
                    body.push(line);
                }
            }
        }
    }

    if language.is_some() {
        results.push(ParsedArtifact::Failure(ParseFailure {
            reason: "unterminated fence".into(),
            snippet: snippet_of(fence_line),
        }));
    }

    results
}

fn make_artifact(language: &str, body: &[&str]) -> ParsedArtifact {
    let code = body.join("\n");
    if code.trim().is_empty() {
        return ParsedArtifact::Failure(ParseFailure {
            reason: "empty block".into(),
            snippet: format!("```{language}"),
        });
    }

    let filename = annotation_filename(body).or_else(|| symbol_filename(&code, language));

    ParsedArtifact::Artifact(CodeArtifact {
        language: language.to_string(),
        code,
        filename,
    })
}

fn snippet_of(text: &str) -> String {
    text.chars().take(40).collect()
}

/// Look for a `filename:` annotation comment in the leading block lines.
fn annotation_filename(body: &[&str]) -> Option<String> {
    for line in body.iter().take(ANNOTATION_WINDOW) {
        let trimmed = line.trim();
        let is_comment = trimmed.starts_with("//")
            || trimmed.starts_with("/*")
            || trimmed.starts_with('#')
            || trimmed.starts_with("<!--");
        if !is_comment {
            continue;
        }

        let lower = trimmed.to_lowercase();
        let Some(at) = lower.find("filename:") else {
            continue;
        };
        let after = &trimmed[at + "filename:".len()..];
        let name = after
            .trim()
            .trim_end_matches("*/")
            .trim_end_matches("-->")
            .trim()
            .split_whitespace()
            .next()?;
        if !name.is_empty() {
            return Some(name.to_string());
        }
    }
    None
}

/// Infer a filename from the first exported symbol declaration.
fn symbol_filename(code: &str, language: &str) -> Option<String> {
    const PATTERNS: &[&str] = &[
        "export default function ",
        "export default class ",
        "export function ",
        "export class ",
        "export const ",
        "pub fn ",
    ];

    for line in code.lines() {
        let trimmed = line.trim_start();
        for pattern in PATTERNS {
            if let Some(rest) = trimmed.strip_prefix(pattern) {
                let name: String = rest
                    .chars()
                    .take_while(|c| c.is_alphanumeric() || *c == '_')
                    .collect();
                if !name.is_empty() {
                    return Some(format!("{name}{}", extension_for(language)));
                }
            }
        }
    }
    None
}

fn extension_for(language: &str) -> &'static str {
    match language.to_lowercase().as_str() {
        "tsx" | "typescriptreact" => ".tsx",
        "ts" | "typescript" => ".ts",
        "jsx" => ".jsx",
        "js" | "javascript" => ".js",
        "css" => ".css",
        "scss" => ".scss",
        "html" => ".html",
        "rust" | "rs" => ".rs",
        "python" | "py" => ".py",
        _ => "",
    }
}

/// Derive concrete file specs from artifacts that carry a filename.
pub fn file_specs(artifacts: &[CodeArtifact]) -> Vec<FileSpec> {
    artifacts
        .iter()
        .filter_map(|artifact| {
            let path = artifact.filename.clone()?;
            Some(FileSpec {
                category: categorize(&path),
                content: artifact.code.clone(),
                path,
            })
        })
        .collect()
}

/// Categorize a file by its path and name.
fn categorize(path: &str) -> FileCategory {
    let lower = path.to_lowercase();
    let basename = lower.rsplit('/').next().unwrap_or(&lower);

    if basename.contains(".test.") || basename.contains(".spec.") || lower.contains("__tests__") {
        FileCategory::Test
    } else if basename.ends_with(".css")
        || basename.ends_with(".scss")
        || basename.ends_with(".sass")
        || basename.ends_with(".less")
    {
        FileCategory::Style
    } else if basename.starts_with("use")
        && basename
            .chars()
            .nth(3)
            .is_some_and(|c| c.is_ascii_uppercase())
    {
        FileCategory::Hook
    } else if lower.contains("util") || lower.contains("helper") || lower.contains("lib/") {
        FileCategory::Util
    } else {
        FileCategory::Component
    }
}
