//! Rename template errors

use thiserror::Error;

/// Raised while compiling a rename template, before any file is touched
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("The tag {{{tag}}} is not known, available tags: {available}")]
    UnknownTag { tag: String, available: String },

    #[error(
        "The modifier '{modifier}' on {{{tag}}} is not known, available modifiers: upper, lower, upper_first, lower_first, number, or a list index"
    )]
    UnknownModifier { tag: String, modifier: String },
}

impl TemplateError {
    pub fn unknown_tag(tag: &str) -> Self {
        Self::UnknownTag {
            tag: tag.to_string(),
            available: crate::rename::template::Tag::names().join(", "),
        }
    }

    pub fn unknown_modifier(tag: &str, modifier: &str) -> Self {
        Self::UnknownModifier {
            tag: tag.to_string(),
            modifier: modifier.to_string(),
        }
    }
}
