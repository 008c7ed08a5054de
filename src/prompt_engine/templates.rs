// prompt_engine/templates.rs — Category policy table and prompt templates

use super::types::{ContentCategory, PromptSpec, TransformationKind};

/// Content embedded in prompts is cut to this many characters.
pub const MAX_CONTENT_CHARS: usize = 12_000;
const TRUNCATION_MARKER: &str = "...[TRUNCATED]";

struct Template {
    title: &'static str,
    description: &'static str,
    system_prompt: &'static str,
    instruction: &'static str,
    /// `Some(lang)` wraps the content in a fenced block.
    fence: Option<&'static str>,
}

/// Kinds planned for a category, before the trailing explanation.
pub fn kinds_for(category: ContentCategory) -> &'static [TransformationKind] {
    match category {
        ContentCategory::Code => &[
            TransformationKind::LanguageConversion,
            TransformationKind::Cleanup,
        ],
        ContentCategory::Text | ContentCategory::Email => &[
            TransformationKind::Enhancement,
            TransformationKind::Summarization,
        ],
        ContentCategory::Json => &[TransformationKind::FormatConversion],
        ContentCategory::Url | ContentCategory::Html | ContentCategory::Markdown => &[],
    }
}

fn template(kind: TransformationKind) -> Template {
    match kind {
        TransformationKind::LanguageConversion => Template {
            title: "Convert to TypeScript",
            description: "Convert code to TypeScript with proper types",
            system_prompt: "You are a code conversion expert. Convert code to TypeScript while preserving functionality and adding proper type annotations. Only return the converted code, no explanations.",
            instruction: "Convert this code to TypeScript:",
            fence: Some(""),
        },
        TransformationKind::Cleanup => Template {
            title: "Clean & Format",
            description: "Clean up and format the code with best practices",
            system_prompt: "You are a code formatter. Improve code quality, formatting, and readability while preserving functionality. Only return the improved code, no explanations.",
            instruction: "Clean and format this code:",
            fence: Some(""),
        },
        TransformationKind::Enhancement => Template {
            title: "Professional Tone",
            description: "Rewrite in a professional, business-appropriate tone",
            system_prompt: "You are a professional writing assistant. Rewrite text to be more professional and business-appropriate while preserving the core message. Only return the rewritten text.",
            instruction: "Make this text more professional:",
            fence: None,
        },
        TransformationKind::Summarization => Template {
            title: "Summarize",
            description: "Create a concise summary of the content",
            system_prompt: "You are a summarization expert. Create clear, concise summaries that capture the key points. Only return the summary.",
            instruction: "Summarize this text:",
            fence: None,
        },
        TransformationKind::FormatConversion => Template {
            title: "Convert to CSV",
            description: "Convert JSON data to CSV format",
            system_prompt: "You are a data conversion expert. Convert JSON to CSV format while preserving all information. Only return the CSV data.",
            instruction: "Convert this JSON to CSV format:",
            fence: Some("json"),
        },
        TransformationKind::Explanation => Template {
            title: "Explain Content",
            description: "Provide a clear explanation of what this content does or means",
            system_prompt: "You are an expert explainer. Break down complex content into easy-to-understand explanations.",
            instruction: "Explain what this content does or means:",
            fence: None,
        },
        TransformationKind::Translation => Template {
            title: "Translate to English",
            description: "Translate the content into clear, natural English",
            system_prompt: "You are a professional translator. Translate text into natural English while preserving meaning and tone. Only return the translation.",
            instruction: "Translate this text to English:",
            fence: None,
        },
        TransformationKind::Validation => Template {
            title: "Check for Problems",
            description: "Point out errors, inconsistencies or invalid syntax",
            system_prompt: "You are a meticulous reviewer. Identify errors, inconsistencies and invalid syntax in the content. List each problem on its own line, or reply that no problems were found.",
            instruction: "Check this content for problems:",
            fence: Some(""),
        },
    }
}

/// Render the spec for `kind` around `content`.
pub fn render(kind: TransformationKind, content: &str) -> PromptSpec {
    let template = template(kind);
    let content = truncate_content(content);

    let user_prompt = match template.fence {
        Some(lang) => format!("{}\n```{}\n{}\n```", template.instruction, lang, content),
        None => format!("{}\n\n{}", template.instruction, content),
    };

    PromptSpec {
        kind,
        title: template.title.to_string(),
        description: template.description.to_string(),
        system_prompt: template.system_prompt.to_string(),
        user_prompt,
    }
}

pub fn truncate_content(content: &str) -> std::borrow::Cow<'_, str> {
    match content.char_indices().nth(MAX_CONTENT_CHARS) {
        Some((cut, _)) => format!("{}{}", &content[..cut], TRUNCATION_MARKER).into(),
        None => content.into(),
    }
}
