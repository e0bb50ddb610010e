use serde::Deserialize;
use validator::Validate;

use crate::types::id::{marker::CommentMarker, Id};

pub mod create {
    use super::*;

    #[derive(Debug, Deserialize, Validate)]
    #[serde(rename_all = "camelCase")]
    pub struct Request {
        #[validate(length(min = 1, message = "Content is required"))]
        pub content: String,
        /// When set the new comment becomes a reply to that comment.
        #[serde(default)]
        pub parent_comment_id: Option<Id<CommentMarker>>,
    }
}

pub mod update {
    use super::*;

    #[derive(Debug, Deserialize, Validate)]
    #[serde(rename_all = "camelCase")]
    pub struct Request {
        #[validate(length(min = 1, message = "Content is required"))]
        pub content: String,
        pub version: Option<i64>,
    }
}

pub mod reply {
    use super::*;

    #[derive(Debug, Deserialize, Validate)]
    pub struct Request {
        #[validate(length(min = 1, message = "Content is required"))]
        pub content: String,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parent_comment_id_is_optional() {
        let form: create::Request = serde_json::from_str(r#"{"content": "nice"}"#).unwrap();
        assert!(form.parent_comment_id.is_none());
        assert!(form.validate().is_ok());

        let form: create::Request =
            serde_json::from_str(r#"{"content": "nice", "parentCommentId": "4"}"#).unwrap();
        assert_eq!(form.parent_comment_id, Some(Id::new(4)));
    }

    #[test]
    fn blank_comment_is_rejected() {
        let form: create::Request = serde_json::from_str(r#"{"content": ""}"#).unwrap();
        assert!(form.validate().is_err());
    }
}
