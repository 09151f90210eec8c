//! Structural rules on a question's option set, checked at create/update
//! time. Options submitted with free-text question types are ignored by
//! the caller rather than rejected.

use thiserror::Error;

use crate::db::types::QuestionType;

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum QuestionRuleError {
    #[error("choice questions require at least one option")]
    OptionsRequired,
    #[error("true/false questions must have exactly 2 options")]
    TrueFalseOptionCount,
    #[error("exactly one correct option is required")]
    ExactlyOneCorrectRequired,
    #[error("at least one correct option is required")]
    CorrectOptionRequired,
}

pub(crate) fn validate_option_set(
    question_type: QuestionType,
    correct_flags: &[bool],
) -> Result<(), QuestionRuleError> {
    let total = correct_flags.len();
    let correct = correct_flags.iter().filter(|flag| **flag).count();

    match question_type {
        QuestionType::MultipleChoice => {
            if total == 0 {
                return Err(QuestionRuleError::OptionsRequired);
            }
            if correct == 0 {
                return Err(QuestionRuleError::CorrectOptionRequired);
            }
            Ok(())
        }
        QuestionType::SingleChoice => {
            if total == 0 {
                return Err(QuestionRuleError::OptionsRequired);
            }
            if correct != 1 {
                return Err(QuestionRuleError::ExactlyOneCorrectRequired);
            }
            Ok(())
        }
        QuestionType::TrueFalse => {
            if total != 2 {
                return Err(QuestionRuleError::TrueFalseOptionCount);
            }
            if correct != 1 {
                return Err(QuestionRuleError::ExactlyOneCorrectRequired);
            }
            Ok(())
        }
        QuestionType::ShortAnswer | QuestionType::Essay => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiple_choice_needs_options_and_a_correct_one() {
        assert_eq!(
            validate_option_set(QuestionType::MultipleChoice, &[]),
            Err(QuestionRuleError::OptionsRequired)
        );
        assert_eq!(
            validate_option_set(QuestionType::MultipleChoice, &[false, false, false]),
            Err(QuestionRuleError::CorrectOptionRequired)
        );
        assert_eq!(validate_option_set(QuestionType::MultipleChoice, &[true, false]), Ok(()));
        assert_eq!(validate_option_set(QuestionType::MultipleChoice, &[true, true]), Ok(()));
    }

    #[test]
    fn single_choice_needs_exactly_one_correct() {
        assert_eq!(
            validate_option_set(QuestionType::SingleChoice, &[true, true, false]),
            Err(QuestionRuleError::ExactlyOneCorrectRequired)
        );
        assert_eq!(
            validate_option_set(QuestionType::SingleChoice, &[false, false]),
            Err(QuestionRuleError::ExactlyOneCorrectRequired)
        );
        assert_eq!(validate_option_set(QuestionType::SingleChoice, &[false, true]), Ok(()));
    }

    #[test]
    fn true_false_needs_two_options_one_correct() {
        assert_eq!(
            validate_option_set(QuestionType::TrueFalse, &[true, false, false]),
            Err(QuestionRuleError::TrueFalseOptionCount)
        );
        assert_eq!(
            validate_option_set(QuestionType::TrueFalse, &[true, true]),
            Err(QuestionRuleError::ExactlyOneCorrectRequired)
        );
        assert_eq!(validate_option_set(QuestionType::TrueFalse, &[true, false]), Ok(()));
    }

    #[test]
    fn free_text_types_take_no_option_rules() {
        assert_eq!(validate_option_set(QuestionType::Essay, &[]), Ok(()));
        assert_eq!(validate_option_set(QuestionType::ShortAnswer, &[true]), Ok(()));
    }
}
