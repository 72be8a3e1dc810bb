use std::str::FromStr;

use huddle_core::AppError;
use serde::{Deserialize, Serialize};

/// Deprecated post editing policy superseded by `PostEditTimeLimit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllowEditPost {
    /// Posts can always be edited.
    Always,
    /// Posts can never be edited.
    Never,
    /// Posts can be edited for a limited time.
    TimeLimit,
}

impl AllowEditPost {
    /// Returns a stable storage value for this policy.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Always => "always",
            Self::Never => "never",
            Self::TimeLimit => "time_limit",
        }
    }
}

impl FromStr for AllowEditPost {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "always" => Ok(Self::Always),
            "never" => Ok(Self::Never),
            "time_limit" => Ok(Self::TimeLimit),
            _ => Err(AppError::invalid_input(
                "AllowEditPost.FromStr",
                "model.config.is_valid.allow_edit_post.app_error",
                format!("unknown AllowEditPost value '{value}'"),
            )),
        }
    }
}

/// Unlimited post edit window.
pub const UNLIMITED_POST_EDIT_TIME: i64 = -1;

/// Post editing settings touched by the legacy permissions migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostEditSettings {
    /// Deprecated policy, absent on installs that never set it.
    pub allow_edit_post: Option<AllowEditPost>,
    /// Edit window in seconds, or [`UNLIMITED_POST_EDIT_TIME`].
    pub post_edit_time_limit: i64,
}

impl Default for PostEditSettings {
    fn default() -> Self {
        Self {
            allow_edit_post: None,
            post_edit_time_limit: UNLIMITED_POST_EDIT_TIME,
        }
    }
}

impl PostEditSettings {
    /// Folds `AllowEditPost = always` into an unlimited edit window.
    /// Returns whether anything changed.
    pub fn retire_allow_edit_post(&mut self) -> bool {
        if self.allow_edit_post != Some(AllowEditPost::Always)
            || self.post_edit_time_limit == UNLIMITED_POST_EDIT_TIME
        {
            return false;
        }

        self.post_edit_time_limit = UNLIMITED_POST_EDIT_TIME;
        true
    }
}
