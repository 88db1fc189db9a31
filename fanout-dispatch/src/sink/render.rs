use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("code block opened on line {0} is never closed")]
    UnclosedFence(usize),
}

/// Turns result text into terminal markup.
pub trait Renderer: Send + Sync {
    fn render(&self, text: &str) -> Result<String, RenderError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PlainRenderer;

impl Renderer for PlainRenderer {
    fn render(&self, text: &str) -> Result<String, RenderError> {
        Ok(text.to_string())
    }
}

const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";

/// Small Markdown subset: headings, bullets, `**bold**` and fenced code.
#[derive(Debug, Default, Clone, Copy)]
pub struct MarkdownRenderer;

impl Renderer for MarkdownRenderer {
    fn render(&self, text: &str) -> Result<String, RenderError> {
        let mut out = Vec::new();
        let mut fence_opened_at: Option<usize> = None;

        for (index, line) in text.lines().enumerate() {
            if line.trim_start().starts_with("```") {
                fence_opened_at = match fence_opened_at {
                    Some(_) => None,
                    None => Some(index + 1),
                };
                continue;
            }
            if fence_opened_at.is_some() {
                out.push(format!("{DIM}    {line}{RESET}"));
                continue;
            }

            let trimmed = line.trim_start();
            if let Some(heading) = strip_heading(trimmed) {
                out.push(format!("{BOLD}{heading}{RESET}"));
            } else if let Some(item) = trimmed
                .strip_prefix("- ")
                .or_else(|| trimmed.strip_prefix("* "))
            {
                let indent = &line[..line.len() - trimmed.len()];
                out.push(format!("{indent}• {}", bold_spans(item)));
            } else {
                out.push(bold_spans(line));
            }
        }

        if let Some(line) = fence_opened_at {
            return Err(RenderError::UnclosedFence(line));
        }
        Ok(out.join("\n"))
    }
}

fn strip_heading(line: &str) -> Option<&str> {
    let hashes = line.chars().take_while(|c| *c == '#').count();
    if (1..=6).contains(&hashes) {
        line[hashes..].strip_prefix(' ')
    } else {
        None
    }
}

fn bold_spans(line: &str) -> String {
    let parts: Vec<&str> = line.split("**").collect();
    // An odd count of markers leaves the line untouched.
    if parts.len() % 2 == 0 {
        return line.to_string();
    }
    parts
        .iter()
        .enumerate()
        .map(|(i, part)| {
            if i % 2 == 1 {
                format!("{BOLD}{part}{RESET}")
            } else {
                part.to_string()
            }
        })
        .collect()
}
