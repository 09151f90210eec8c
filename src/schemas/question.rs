use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::db::models::{Question, QuestionOption};
use crate::db::types::QuestionType;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct OptionCreate {
    #[validate(length(min = 1, message = "option content must not be empty"))]
    pub(crate) content: String,
    #[serde(default, alias = "isCorrect")]
    pub(crate) is_correct: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuestionCreate {
    #[validate(length(min = 1, message = "content must not be empty"))]
    pub(crate) content: String,
    #[validate(range(min = 1, message = "marks must be positive"))]
    pub(crate) marks: i32,
    #[serde(alias = "questionType")]
    pub(crate) question_type: QuestionType,
    #[serde(default)]
    #[validate(nested)]
    pub(crate) options: Vec<OptionCreate>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuestionUpdate {
    #[serde(default)]
    #[validate(length(min = 1, message = "content must not be empty"))]
    pub(crate) content: Option<String>,
    #[serde(default)]
    #[validate(range(min = 1, message = "marks must be positive"))]
    pub(crate) marks: Option<i32>,
    #[serde(default, alias = "questionType")]
    pub(crate) question_type: Option<QuestionType>,
    /// When present, replaces the whole option set.
    #[serde(default)]
    #[validate(nested)]
    pub(crate) options: Option<Vec<OptionCreate>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct OptionResponse {
    pub(crate) id: String,
    pub(crate) content: String,
    /// Omitted for students so answers are not leaked with the question.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) is_correct: Option<bool>,
}

impl OptionResponse {
    pub(crate) fn from_db(option: QuestionOption, include_correct: bool) -> Self {
        Self {
            id: option.id,
            content: option.content,
            is_correct: include_correct.then_some(option.is_correct),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct QuestionResponse {
    pub(crate) id: String,
    pub(crate) exam_id: String,
    pub(crate) content: String,
    pub(crate) marks: i32,
    pub(crate) question_type: QuestionType,
    pub(crate) options: Vec<OptionResponse>,
}

impl QuestionResponse {
    pub(crate) fn from_db(
        question: Question,
        options: Vec<QuestionOption>,
        include_correct: bool,
    ) -> Self {
        Self {
            id: question.id,
            exam_id: question.exam_id,
            content: question.content,
            marks: question.marks,
            question_type: question.question_type,
            options: options
                .into_iter()
                .map(|option| OptionResponse::from_db(option, include_correct))
                .collect(),
        }
    }
}
