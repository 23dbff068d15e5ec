//! Query suggestions for a topic.

use tracing::error;

use policyrag_core::traits::LanguageModel;

use crate::prompt::suggestions_prompt;

/// Ask the model for up to `count` candidate questions about `topic`.
/// Failures degrade to an empty list with an error log; suggestions are a
/// convenience, never a hard dependency.
pub async fn query_suggestions(
    llm: &dyn LanguageModel,
    topic: &str,
    count: usize,
) -> Vec<String> {
    let prompt = suggestions_prompt(topic, count);
    match llm.complete(&prompt).await {
        Ok(response) => response
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .take(count)
            .map(ToString::to_string)
            .collect(),
        Err(err) => {
            error!(error = %err, "failed to generate query suggestions");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use policyrag_core::error::{RagError, Result};

    struct LineLm(&'static str);

    #[async_trait]
    impl LanguageModel for LineLm {
        fn id(&self) -> &str {
            "lines"
        }
        async fn complete(&self, _prompt: &str) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct FailingLm;

    #[async_trait]
    impl LanguageModel for FailingLm {
        fn id(&self) -> &str {
            "failing"
        }
        async fn complete(&self, _prompt: &str) -> Result<String> {
            Err(RagError::ServiceTimeout {
                endpoint: "http://localhost:11434".to_string(),
                seconds: 1,
            })
        }
    }

    #[tokio::test]
    async fn takes_up_to_count_non_empty_lines() {
        let lm = LineLm("What is the DSR ceiling?\n\nWhich documents verify income?\nHow are thin files scored?\n");
        let suggestions = query_suggestions(&lm, "underwriting", 2).await;
        assert_eq!(
            suggestions,
            vec!["What is the DSR ceiling?", "Which documents verify income?"]
        );
    }

    #[tokio::test]
    async fn model_failure_degrades_to_empty() {
        let suggestions = query_suggestions(&FailingLm, "underwriting", 5).await;
        assert!(suggestions.is_empty());
    }
}
