// orchestrator/custom.rs — Single-shot custom instruction requests

use super::TransformationResult;
use crate::backend::{BackendError, BackendGateway};
use crate::config::BackendConfig;
use crate::prompt_engine::{truncate_content, TransformationKind};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Custom results are not ranked against alternatives, so they get a fixed score.
pub const CUSTOM_CONFIDENCE: f64 = 0.8;

const SYSTEM_PROMPT: &str = "You are an AI assistant that helps transform clipboard content. Be helpful, accurate, and preserve important information while following the user's request.";
const DEFAULT_SYSTEM_PROMPT: &str = "You are an AI assistant that helps improve and transform text. Make the content more professional and well-formatted.";

#[derive(Debug, thiserror::Error)]
pub enum CustomError {
    #[error(transparent)]
    Backend(#[from] BackendError),
}

pub struct CustomInstructionProcessor {
    gateway: Arc<dyn BackendGateway>,
}

impl CustomInstructionProcessor {
    pub fn new(gateway: Arc<dyn BackendGateway>) -> Self {
        Self { gateway }
    }

    /// Run `instruction` against `content`. A missing or blank instruction
    /// falls back to a general "improve and format" rewrite.
    ///
    /// Backend failures are returned to the caller. A cancelled request
    /// yields `Ok(None)`.
    pub async fn process(
        &self,
        content: &str,
        instruction: Option<&str>,
        context_snippets: &[String],
        config: &BackendConfig,
        cancel: &CancellationToken,
    ) -> Result<Option<TransformationResult>, CustomError> {
        let instruction = instruction.map(str::trim).filter(|i| !i.is_empty());

        let (system_prompt, user_prompt, title, description) = match instruction {
            Some(instruction) => (
                SYSTEM_PROMPT,
                build_prompt(content, instruction, context_snippets),
                "Custom Instruction",
                instruction,
            ),
            None => (
                DEFAULT_SYSTEM_PROMPT,
                build_default_prompt(content, context_snippets),
                "AI Enhancement",
                "AI-improved version of your content",
            ),
        };

        tracing::info!(
            content_chars = content.chars().count(),
            snippets = context_snippets.len(),
            has_instruction = instruction.is_some(),
            "Processing custom instruction"
        );

        let text = match self
            .gateway
            .complete(system_prompt, &user_prompt, config, cancel)
            .await
        {
            Ok(text) => text,
            Err(e) if e.is_cancelled() => {
                tracing::info!("Custom instruction cancelled");
                return Ok(None);
            }
            Err(e) => {
                tracing::error!(error = %e, kind = e.kind(), "Custom instruction failed");
                return Err(e.into());
            }
        };

        if cancel.is_cancelled() {
            return Ok(None);
        }

        Ok(Some(TransformationResult {
            id: super::result_id(TransformationKind::Enhancement, chrono::Utc::now().timestamp_millis(), 0),
            title: title.to_string(),
            description: description.to_string(),
            result: text,
            confidence: CUSTOM_CONFIDENCE,
            is_applied: false,
            kind: TransformationKind::Enhancement,
        }))
    }
}

/// Content block, then context snippets in caller order, then the instruction.
pub fn build_prompt(content: &str, instruction: &str, context_snippets: &[String]) -> String {
    let mut prompt = format!(
        "Here is the clipboard content:\n```\n{}\n```\n\n",
        truncate_content(content)
    );

    push_context(&mut prompt, context_snippets);

    prompt.push_str(&format!(
        "User's request: {}\n\nPlease process the content according to the user's request:",
        instruction
    ));
    prompt
}

/// Prompt used when no instruction was given.
pub fn build_default_prompt(content: &str, context_snippets: &[String]) -> String {
    let mut prompt = format!(
        "Please improve and format this content:\n\n{}\n\n",
        truncate_content(content)
    );
    push_context(&mut prompt, context_snippets);
    prompt.trim_end().to_string()
}

fn push_context(prompt: &mut String, context_snippets: &[String]) {
    let snippets: Vec<&str> = context_snippets
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();
    if !snippets.is_empty() {
        prompt.push_str("Additional context:\n");
        prompt.push_str(&snippets.join("\n\n"));
        prompt.push_str("\n\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testing::ScriptedGateway;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    #[tokio::test]
    async fn translation_returns_single_fixed_confidence_result() {
        let gateway = Arc::new(ScriptedGateway::ready().with_responses(vec![Ok("hola".to_string())]));
        let processor = CustomInstructionProcessor::new(gateway.clone());

        let result = processor
            .process("hello", Some("translate to Spanish"), &[], &BackendConfig::default(), &CancellationToken::new())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(result.result, "hola");
        assert_eq!(result.confidence, 0.8);
        assert_eq!(result.kind, TransformationKind::Enhancement);
        assert!(!result.is_applied);
        assert_eq!(gateway.complete_calls.load(Ordering::SeqCst), 1);
        assert_eq!(gateway.probe_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn backend_failure_propagates() {
        let gateway = Arc::new(ScriptedGateway::ready().with_responses(vec![Err(
            BackendError::MalformedResponse("missing content".to_string()),
        )]));
        let processor = CustomInstructionProcessor::new(gateway);

        let result = processor
            .process("hello", Some("shorten"), &[], &BackendConfig::default(), &CancellationToken::new())
            .await;

        assert!(matches!(
            result,
            Err(CustomError::Backend(BackendError::MalformedResponse(_)))
        ));
    }

    #[tokio::test]
    async fn cancellation_is_a_silent_no_op() {
        let gateway = Arc::new(ScriptedGateway::ready().with_responses(vec![Ok("unused".to_string())]));
        let processor = CustomInstructionProcessor::new(gateway);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = processor
            .process("hello", Some("shorten"), &[], &BackendConfig::default(), &cancel)
            .await
            .unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn cancellation_while_pending_returns_none() {
        let gateway = Arc::new(
            ScriptedGateway::ready()
                .with_responses(vec![Ok("late".to_string())])
                .with_delay(Duration::from_secs(5)),
        );
        let processor = CustomInstructionProcessor::new(gateway.clone());
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let started = std::time::Instant::now();
        let result = processor
            .process("hello", Some("shorten"), &[], &BackendConfig::default(), &cancel)
            .await;

        assert!(matches!(result, Ok(None)));
        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(gateway.complete_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn missing_instruction_runs_default_enhancement() {
        let gateway = Arc::new(ScriptedGateway::ready().with_responses(vec![
            Ok("Polished text.".to_string()),
            Ok("Polished again.".to_string()),
        ]));
        let processor = CustomInstructionProcessor::new(gateway.clone());
        let config = BackendConfig::default();
        let cancel = CancellationToken::new();

        let none = processor.process("rough draft", None, &[], &config, &cancel).await.unwrap().unwrap();
        let blank = processor.process("rough draft", Some("  "), &[], &config, &cancel).await.unwrap().unwrap();

        for result in [&none, &blank] {
            assert_eq!(result.title, "AI Enhancement");
            assert_eq!(result.confidence, CUSTOM_CONFIDENCE);
            assert_eq!(result.kind, TransformationKind::Enhancement);
        }
        assert_eq!(
            gateway.user_prompts(),
            vec![
                "Please improve and format this content:\n\nrough draft".to_string(),
                "Please improve and format this content:\n\nrough draft".to_string(),
            ]
        );
        assert_eq!(gateway.system_prompts()[0], DEFAULT_SYSTEM_PROMPT);
    }

    #[tokio::test]
    async fn default_enhancement_errors_propagate() {
        let gateway = Arc::new(ScriptedGateway::ready().with_responses(vec![Err(BackendError::Timeout)]));
        let processor = CustomInstructionProcessor::new(gateway);

        let result = processor
            .process("rough draft", None, &[], &BackendConfig::default(), &CancellationToken::new())
            .await;

        assert!(matches!(result, Err(CustomError::Backend(BackendError::Timeout))));
    }

    #[test]
    fn prompt_keeps_snippet_order() {
        let snippets = vec!["first note".to_string(), " ".to_string(), "second note".to_string()];
        let prompt = build_prompt("body", "merge them", &snippets);

        let content_at = prompt.find("```\nbody\n```").unwrap();
        let first_at = prompt.find("first note").unwrap();
        let second_at = prompt.find("second note").unwrap();
        let instruction_at = prompt.find("User's request: merge them").unwrap();

        assert!(content_at < first_at);
        assert!(first_at < second_at);
        assert!(second_at < instruction_at);
    }
}
