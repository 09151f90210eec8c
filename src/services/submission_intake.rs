//! Validation of a submitted answer sheet against the exam's live
//! question set. The caller runs this inside the same transaction as the
//! submission insert so a failure leaves nothing behind.

use std::collections::{HashMap, HashSet};

use thiserror::Error;
use time::PrimitiveDateTime;

use crate::db::models::{Question, QuestionOption};
use crate::db::types::QuestionType;

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum IntakeError {
    #[error("all questions must be answered")]
    IncompleteAnswerSet,
    #[error("essay and short answer questions require a text answer")]
    MissingTextAnswer,
    #[error("multiple choice questions require at least one selected option")]
    NoOptionSelected,
    #[error("single choice and true/false questions require exactly one selected option")]
    ExactlyOneOptionRequired,
    #[error("selected options must belong to the question")]
    ForeignOption,
}

#[derive(Debug, Clone)]
pub(crate) struct AnswerInput {
    pub(crate) question_id: String,
    pub(crate) text_answer: Option<String>,
    pub(crate) selected_option_ids: Vec<String>,
}

/// Both boundary instants count as inside the window.
pub(crate) fn within_window(
    now: PrimitiveDateTime,
    start_time: PrimitiveDateTime,
    end_time: PrimitiveDateTime,
) -> bool {
    !(now < start_time || now > end_time)
}

pub(crate) fn validate_answer_sheet(
    questions: &[Question],
    options_by_question: &HashMap<String, Vec<QuestionOption>>,
    answers: &[AnswerInput],
) -> Result<(), IntakeError> {
    let exam_question_ids: HashSet<&str> =
        questions.iter().map(|question| question.id.as_str()).collect();
    let answered_question_ids: HashSet<&str> =
        answers.iter().map(|answer| answer.question_id.as_str()).collect();

    // No omissions, no extras, no duplicate answers for one question.
    if exam_question_ids != answered_question_ids || answers.len() != answered_question_ids.len() {
        return Err(IntakeError::IncompleteAnswerSet);
    }

    let questions_by_id: HashMap<&str, &Question> =
        questions.iter().map(|question| (question.id.as_str(), question)).collect();

    for answer in answers {
        let question = questions_by_id
            .get(answer.question_id.as_str())
            .ok_or(IntakeError::IncompleteAnswerSet)?;

        match question.question_type {
            QuestionType::Essay | QuestionType::ShortAnswer => {
                let blank =
                    answer.text_answer.as_deref().map(str::trim).unwrap_or_default().is_empty();
                if blank {
                    return Err(IntakeError::MissingTextAnswer);
                }
            }
            QuestionType::MultipleChoice => {
                if answer.selected_option_ids.is_empty() {
                    return Err(IntakeError::NoOptionSelected);
                }
                check_option_membership(question, options_by_question, answer)?;
            }
            QuestionType::SingleChoice | QuestionType::TrueFalse => {
                if answer.selected_option_ids.len() != 1 {
                    return Err(IntakeError::ExactlyOneOptionRequired);
                }
                check_option_membership(question, options_by_question, answer)?;
            }
        }
    }

    Ok(())
}

fn check_option_membership(
    question: &Question,
    options_by_question: &HashMap<String, Vec<QuestionOption>>,
    answer: &AnswerInput,
) -> Result<(), IntakeError> {
    let known: HashSet<&str> = options_by_question
        .get(&question.id)
        .map(|options| options.iter().map(|option| option.id.as_str()).collect())
        .unwrap_or_default();

    let all_known =
        answer.selected_option_ids.iter().all(|option_id| known.contains(option_id.as_str()));

    if all_known {
        Ok(())
    } else {
        Err(IntakeError::ForeignOption)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::time::primitive_now_utc;
    use time::Duration;

    fn question(id: &str, question_type: QuestionType) -> Question {
        let now = primitive_now_utc();
        Question {
            id: id.to_string(),
            exam_id: "exam-1".to_string(),
            content: "?".to_string(),
            marks: 10,
            question_type,
            created_at: now,
            updated_at: now,
        }
    }

    fn option(id: &str, question_id: &str) -> QuestionOption {
        QuestionOption {
            id: id.to_string(),
            question_id: question_id.to_string(),
            content: id.to_string(),
            is_correct: false,
        }
    }

    fn answer(question_id: &str, text: Option<&str>, selected: &[&str]) -> AnswerInput {
        AnswerInput {
            question_id: question_id.to_string(),
            text_answer: text.map(str::to_string),
            selected_option_ids: selected.iter().map(|id| id.to_string()).collect(),
        }
    }

    fn single_choice_fixture() -> (Vec<Question>, HashMap<String, Vec<QuestionOption>>) {
        let questions = vec![question("q1", QuestionType::SingleChoice)];
        let mut options = HashMap::new();
        options.insert("q1".to_string(), vec![option("o1", "q1"), option("o2", "q1")]);
        (questions, options)
    }

    #[test]
    fn window_boundaries_are_inclusive() {
        let start = primitive_now_utc();
        let end = start + Duration::hours(2);

        assert!(within_window(start, start, end));
        assert!(within_window(end, start, end));
        assert!(within_window(start + Duration::minutes(30), start, end));
        assert!(!within_window(start - Duration::seconds(1), start, end));
        assert!(!within_window(end + Duration::seconds(1), start, end));
    }

    #[test]
    fn missing_answer_is_incomplete() {
        let (questions, options) = single_choice_fixture();
        assert_eq!(
            validate_answer_sheet(&questions, &options, &[]),
            Err(IntakeError::IncompleteAnswerSet)
        );
    }

    #[test]
    fn extra_answer_is_incomplete() {
        let (questions, options) = single_choice_fixture();
        let answers =
            vec![answer("q1", None, &["o1"]), answer("q-unknown", None, &["o1"])];
        assert_eq!(
            validate_answer_sheet(&questions, &options, &answers),
            Err(IntakeError::IncompleteAnswerSet)
        );
    }

    #[test]
    fn duplicate_answers_for_a_question_are_rejected() {
        let (questions, options) = single_choice_fixture();
        let answers = vec![answer("q1", None, &["o1"]), answer("q1", None, &["o2"])];
        assert_eq!(
            validate_answer_sheet(&questions, &options, &answers),
            Err(IntakeError::IncompleteAnswerSet)
        );
    }

    #[test]
    fn essay_requires_non_blank_text() {
        let questions = vec![question("q1", QuestionType::Essay)];
        let options = HashMap::new();

        assert_eq!(
            validate_answer_sheet(&questions, &options, &[answer("q1", Some("   "), &[])]),
            Err(IntakeError::MissingTextAnswer)
        );
        assert_eq!(
            validate_answer_sheet(&questions, &options, &[answer("q1", None, &[])]),
            Err(IntakeError::MissingTextAnswer)
        );
        assert_eq!(
            validate_answer_sheet(&questions, &options, &[answer("q1", Some("Because."), &[])]),
            Ok(())
        );
    }

    #[test]
    fn single_choice_requires_exactly_one_selection() {
        let (questions, options) = single_choice_fixture();

        assert_eq!(
            validate_answer_sheet(&questions, &options, &[answer("q1", None, &[])]),
            Err(IntakeError::ExactlyOneOptionRequired)
        );
        assert_eq!(
            validate_answer_sheet(&questions, &options, &[answer("q1", None, &["o1", "o2"])]),
            Err(IntakeError::ExactlyOneOptionRequired)
        );
        assert_eq!(
            validate_answer_sheet(&questions, &options, &[answer("q1", None, &["o2"])]),
            Ok(())
        );
    }

    #[test]
    fn multiple_choice_requires_a_selection() {
        let questions = vec![question("q1", QuestionType::MultipleChoice)];
        let mut options = HashMap::new();
        options.insert("q1".to_string(), vec![option("o1", "q1"), option("o2", "q1")]);

        assert_eq!(
            validate_answer_sheet(&questions, &options, &[answer("q1", None, &[])]),
            Err(IntakeError::NoOptionSelected)
        );
        assert_eq!(
            validate_answer_sheet(&questions, &options, &[answer("q1", None, &["o1", "o2"])]),
            Ok(())
        );
    }

    #[test]
    fn foreign_option_is_rejected() {
        let (questions, options) = single_choice_fixture();
        assert_eq!(
            validate_answer_sheet(&questions, &options, &[answer("q1", None, &["other"])]),
            Err(IntakeError::ForeignOption)
        );
    }
}
