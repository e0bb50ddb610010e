use serde::Deserialize;
use validator::Validate;

pub const DEFAULT_CATEGORY: &str = "General";

pub mod create {
    use super::*;

    #[derive(Debug, Deserialize, Validate)]
    #[serde(rename_all = "camelCase")]
    pub struct Request {
        #[validate(length(min = 1, max = 100, message = "Title cannot be more than 100 characters"))]
        pub title: String,
        #[validate(length(min = 1, message = "Content is required"))]
        pub content: String,
        #[serde(default)]
        pub tags: Vec<String>,
        pub category: Option<String>,
    }

    impl Request {
        #[must_use]
        pub fn category(&self) -> &str {
            self.category.as_deref().unwrap_or(DEFAULT_CATEGORY)
        }
    }
}

pub mod update {
    use super::*;

    /// Full overwrite; callers must resend every field they intend
    /// to keep. `version` (optional) makes the write conditional.
    #[derive(Debug, Deserialize, Validate)]
    #[serde(rename_all = "camelCase")]
    pub struct Request {
        #[validate(length(min = 1, max = 100, message = "Title cannot be more than 100 characters"))]
        pub title: String,
        #[validate(length(min = 1, message = "Content is required"))]
        pub content: String,
        #[serde(default)]
        pub tags: Vec<String>,
        pub category: Option<String>,
        pub version: Option<i64>,
    }

    impl Request {
        #[must_use]
        pub fn category(&self) -> &str {
            self.category.as_deref().unwrap_or(DEFAULT_CATEGORY)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_is_bounded_at_100_chars() {
        let form = create::Request {
            title: "x".repeat(101),
            content: "hello".into(),
            tags: vec![],
            category: None,
        };
        assert!(form.validate().is_err());

        let form = create::Request {
            title: "x".repeat(100),
            content: "hello".into(),
            tags: vec![],
            category: None,
        };
        assert!(form.validate().is_ok());
    }

    #[test]
    fn category_defaults_to_general() {
        let form: create::Request =
            serde_json::from_str(r#"{"title": "Hi", "content": "Body"}"#).unwrap();
        assert_eq!(form.category(), "General");
        assert!(form.tags.is_empty());
    }

    #[test]
    fn empty_content_is_rejected() {
        let form: create::Request =
            serde_json::from_str(r#"{"title": "Hi", "content": ""}"#).unwrap();
        assert!(form.validate().is_err());
    }
}
