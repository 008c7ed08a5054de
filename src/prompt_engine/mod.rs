// prompt_engine/mod.rs - Prompt planner

mod detection;
mod templates;
mod types;

pub use detection::{
    fallback_category, is_code_like, is_json_like, ContentClassifier, HeuristicClassifier,
};
pub use templates::{kinds_for, truncate_content, MAX_CONTENT_CHARS};
pub use types::{ContentCategory, PlannerError, PromptSpec, TransformationKind};

/// Maps classified content to the ordered list of transformations to request.
///
/// Planning is pure: identical content and category always yield the same
/// specs in the same order, and the list always ends with an explanation.
#[derive(Default)]
pub struct PromptPlanner {
    classifier: Option<Box<dyn ContentClassifier>>,
}

impl PromptPlanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `classifier` for content that arrives without a category label.
    pub fn with_classifier(classifier: Box<dyn ContentClassifier>) -> Self {
        Self {
            classifier: Some(classifier),
        }
    }

    /// Caller label first, then the classifier, then the built-in heuristics.
    pub fn resolve_category(&self, content: &str, category: Option<ContentCategory>) -> ContentCategory {
        category.unwrap_or_else(|| match &self.classifier {
            Some(classifier) => classifier.classify(content),
            None => fallback_category(content),
        })
    }

    pub fn plan(&self, content: &str, category: Option<ContentCategory>) -> Vec<PromptSpec> {
        let category = self.resolve_category(content, category);

        let specs: Vec<PromptSpec> = kinds_for(category)
            .iter()
            .copied()
            .chain(std::iter::once(TransformationKind::Explanation))
            .map(|kind| templates::render(kind, content))
            .collect();

        tracing::debug!(
            category = %category,
            kinds = ?specs.iter().map(|s| s.kind).collect::<Vec<_>>(),
            "Planned transformations"
        );

        specs
    }

    /// Spec for a single transformation, outside the category table.
    pub fn spec(&self, kind: TransformationKind, content: &str) -> PromptSpec {
        templates::render(kind, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(specs: &[PromptSpec]) -> Vec<TransformationKind> {
        specs.iter().map(|s| s.kind).collect()
    }

    #[test]
    fn code_plan_matches_policy_table() {
        let planner = PromptPlanner::new();
        let specs = planner.plan("function add(a,b){return a+b}", Some(ContentCategory::Code));

        assert_eq!(
            kinds(&specs),
            vec![
                TransformationKind::LanguageConversion,
                TransformationKind::Cleanup,
                TransformationKind::Explanation,
            ]
        );
        assert!(specs[0].user_prompt.contains("function add(a,b){return a+b}"));
    }

    #[test]
    fn json_plan_converts_then_explains() {
        let specs = PromptPlanner::new().plan(r#"{"a":1}"#, Some(ContentCategory::Json));

        assert_eq!(
            kinds(&specs),
            vec![TransformationKind::FormatConversion, TransformationKind::Explanation]
        );
    }

    #[test]
    fn text_and_email_share_writing_plan() {
        let planner = PromptPlanner::new();
        let expected = vec![
            TransformationKind::Enhancement,
            TransformationKind::Summarization,
            TransformationKind::Explanation,
        ];

        assert_eq!(kinds(&planner.plan("hi team", Some(ContentCategory::Text))), expected);
        assert_eq!(kinds(&planner.plan("hi team", Some(ContentCategory::Email))), expected);
    }

    #[test]
    fn every_category_plan_is_deterministic_and_ends_with_explanation() {
        let planner = PromptPlanner::new();
        let categories = [
            ContentCategory::Code,
            ContentCategory::Text,
            ContentCategory::Email,
            ContentCategory::Json,
            ContentCategory::Url,
            ContentCategory::Html,
            ContentCategory::Markdown,
        ];

        for category in categories {
            let first = planner.plan("let x = 1;", Some(category));
            let second = planner.plan("let x = 1;", Some(category));

            assert_eq!(first, second, "plan for {} changed between calls", category);
            assert_eq!(
                first.last().map(|s| s.kind),
                Some(TransformationKind::Explanation)
            );
        }
    }

    #[test]
    fn unlabeled_content_uses_heuristics() {
        let planner = PromptPlanner::new();

        assert_eq!(
            kinds(&planner.plan("[1, 2, 3]", None)),
            vec![TransformationKind::FormatConversion, TransformationKind::Explanation]
        );
        assert_eq!(
            kinds(&planner.plan("import os", None))[0],
            TransformationKind::LanguageConversion
        );
        assert_eq!(
            kinds(&planner.plan("see you soon", None))[0],
            TransformationKind::Enhancement
        );
    }

    #[test]
    fn classifier_is_consulted_only_without_label() {
        let planner = PromptPlanner::with_classifier(Box::new(HeuristicClassifier));

        assert_eq!(
            planner.resolve_category("https://example.com", None),
            ContentCategory::Url
        );
        assert_eq!(
            planner.resolve_category("https://example.com", Some(ContentCategory::Text)),
            ContentCategory::Text
        );
    }

    #[test]
    fn category_labels_parse() {
        assert_eq!("JSON".parse::<ContentCategory>().unwrap(), ContentCategory::Json);
        assert!("spreadsheet".parse::<ContentCategory>().is_err());
        assert_eq!(
            "Language-Conversion".parse::<TransformationKind>().unwrap(),
            TransformationKind::LanguageConversion
        );
        assert!("poetry".parse::<TransformationKind>().is_err());
    }
}
