//! Marketing-copy generation: a fixed prompt template plus a best-effort
//! parse of the labeled reply.

use std::sync::Arc;

use super::{AiError, TextModel};

pub const COPY_SYSTEM_PROMPT: &str =
    "You are an expert at creating persuasive e-commerce product listing content.";

pub struct ContentGenerator {
    model: Arc<dyn TextModel>,
}

impl ContentGenerator {
    pub fn new(model: Arc<dyn TextModel>) -> Self {
        Self { model }
    }

    /// Generate a `(title, description)` pair for a product.
    pub async fn generate(
        &self,
        product_type: &str,
        key_features: Option<&str>,
    ) -> Result<(String, String), AiError> {
        let prompt = build_prompt(product_type, key_features);
        let reply = self.model.complete(COPY_SYSTEM_PROMPT, &prompt).await?;
        Ok(parse_reply(&reply))
    }
}

/// Deterministic prompt template. The key-features line appears only when
/// features were supplied.
pub fn build_prompt(product_type: &str, key_features: Option<&str>) -> String {
    let features_line = match key_features {
        Some(f) => format!("Key features: {f}\n"),
        None => String::new(),
    };
    format!(
        "Create premium product listing content for a {product_type}.\n\
         {features_line}\n\
         Provide:\n\
         1. A compelling product title (max 200 characters)\n\
         2. A detailed product description (3-4 paragraphs)\n\
         \n\
         Format:\n\
         TITLE: [your title]\n\
         DESCRIPTION: [your description]"
    )
}

/// Split the raw reply on the literal `DESCRIPTION:` marker. Title is the
/// text before it with the `TITLE:` label stripped; description is the text
/// after. A reply without the marker becomes `(whole reply, "")`.
///
/// This is a best-effort parse, not a grammar; kept exactly for
/// compatibility with existing clients.
pub fn parse_reply(raw: &str) -> (String, String) {
    match raw.split_once("DESCRIPTION:") {
        Some((head, tail)) => (
            head.replace("TITLE:", "").trim().to_string(),
            tail.trim().to_string(),
        ),
        None => (raw.replace("TITLE:", "").trim().to_string(), String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct CannedModel(&'static str);

    #[async_trait]
    impl TextModel for CannedModel {
        async fn complete(&self, _system: &str, _prompt: &str) -> Result<String, AiError> {
            Ok(self.0.to_string())
        }
    }

    struct FailingModel;

    #[async_trait]
    impl TextModel for FailingModel {
        async fn complete(&self, _system: &str, _prompt: &str) -> Result<String, AiError> {
            Err(AiError::Transport("connection refused".into()))
        }
    }

    #[test]
    fn prompt_embeds_product_type_and_features() {
        let p = build_prompt("ceramic mug", Some("dishwasher safe, 350ml"));
        assert!(p.contains("for a ceramic mug"));
        assert!(p.contains("Key features: dishwasher safe, 350ml"));
        assert!(p.contains("TITLE:"));
        assert!(p.contains("DESCRIPTION:"));
    }

    #[test]
    fn prompt_omits_features_line_when_absent() {
        let p = build_prompt("ceramic mug", None);
        assert!(!p.contains("Key features"));
    }

    #[test]
    fn labeled_reply_parses_into_pair() {
        let (title, description) = parse_reply("TITLE: Foo\nDESCRIPTION: Bar baz");
        assert_eq!(title, "Foo");
        assert_eq!(description, "Bar baz");
    }

    #[test]
    fn missing_marker_yields_empty_description() {
        let (title, description) = parse_reply("Just some text");
        assert_eq!(title, "Just some text");
        assert_eq!(description, "");
    }

    #[test]
    fn title_label_is_stripped_even_without_marker() {
        let (title, description) = parse_reply("TITLE: Only a title");
        assert_eq!(title, "Only a title");
        assert_eq!(description, "");
    }

    #[test]
    fn whitespace_is_trimmed_on_both_sides() {
        let (title, description) = parse_reply("  TITLE:  Spaced  \nDESCRIPTION:\n\n  Body  \n");
        assert_eq!(title, "Spaced");
        assert_eq!(description, "Body");
    }

    #[tokio::test]
    async fn generator_returns_parsed_pair() {
        let generator = ContentGenerator::new(std::sync::Arc::new(CannedModel(
            "TITLE: Steel Bottle\nDESCRIPTION: Keeps drinks cold.",
        )));
        let (title, description) = generator
            .generate("bottle", Some("insulated"))
            .await
            .expect("generate");
        assert_eq!(title, "Steel Bottle");
        assert_eq!(description, "Keeps drinks cold.");
    }

    #[tokio::test]
    async fn model_failure_surfaces_unchanged() {
        let generator = ContentGenerator::new(std::sync::Arc::new(FailingModel));
        let err = generator.generate("bottle", None).await.unwrap_err();
        assert!(matches!(err, AiError::Transport(_)));
    }
}
