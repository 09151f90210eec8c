//! Scoring of objective answers and derivation of the grade outcome.
//!
//! Single choice and true/false are all-or-nothing on exact set equality.
//! Multiple choice earns partial credit by selection accuracy:
//! TP / (TP + FP + FN), rounded half away from zero against the question
//! marks. Free-text answers contribute nothing until a human grades them.

use std::collections::HashSet;

use crate::db::models::{GradeBand, GradingScale, Question};
use crate::db::types::{QuestionType, ScoreStatus};

pub(crate) const DEFAULT_SCALE_NAME: &str = "Standard percentage scale";
pub(crate) const DEFAULT_PASSING_SCORE: f64 = 60.0;

/// (name, min, max, grade point) over the percentage score, the stock
/// banding seeded at bootstrap.
pub(crate) const DEFAULT_BANDS: &[(&str, f64, f64, f64)] = &[
    ("Excellent", 90.0, 100.0, 4.0),
    ("Very Good", 80.0, 90.0, 3.5),
    ("Good", 70.0, 80.0, 3.0),
    ("Satisfactory", 60.0, 70.0, 2.0),
    ("Marginal", 50.0, 60.0, 1.0),
    ("Unsatisfactory", 0.0, 50.0, 0.0),
];

#[derive(Debug, Clone)]
pub(crate) struct AnswerToGrade {
    pub(crate) question_type: QuestionType,
    pub(crate) marks: i32,
    pub(crate) correct_option_ids: HashSet<String>,
    pub(crate) selected_option_ids: HashSet<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct GradeOutcome {
    pub(crate) percentage_score: f64,
    pub(crate) reading: String,
    pub(crate) status: ScoreStatus,
    pub(crate) grade_point: Option<f64>,
}

pub(crate) fn answer_score(
    question_type: QuestionType,
    marks: i32,
    correct: &HashSet<String>,
    selected: &HashSet<String>,
) -> f64 {
    match question_type {
        QuestionType::SingleChoice | QuestionType::TrueFalse => {
            if correct == selected {
                f64::from(marks)
            } else {
                0.0
            }
        }
        QuestionType::MultipleChoice => {
            let true_positives = selected.intersection(correct).count();
            let false_positives = selected.len() - true_positives;
            let false_negatives = correct.len() - true_positives;
            let accuracy = choice_accuracy(true_positives, false_positives, false_negatives);
            (accuracy * f64::from(marks)).round()
        }
        QuestionType::ShortAnswer | QuestionType::Essay => 0.0,
    }
}

fn choice_accuracy(true_positives: usize, false_positives: usize, false_negatives: usize) -> f64 {
    let total = true_positives + false_positives + false_negatives;
    if total > 0 {
        true_positives as f64 / total as f64
    } else {
        0.0
    }
}

pub(crate) fn total_auto_score(answers: &[AnswerToGrade]) -> f64 {
    answers
        .iter()
        .map(|answer| {
            answer_score(
                answer.question_type,
                answer.marks,
                &answer.correct_option_ids,
                &answer.selected_option_ids,
            )
        })
        .sum()
}

/// The whole exam can be auto-graded only when no question needs a human:
/// an essay anywhere leaves the submission ungraded for manual review.
pub(crate) fn is_auto_gradable<I>(question_types: I) -> bool
where
    I: IntoIterator<Item = QuestionType>,
{
    question_types.into_iter().all(|question_type| question_type != QuestionType::Essay)
}

pub(crate) fn exam_total_marks(questions: &[Question]) -> f64 {
    questions.iter().map(|question| f64::from(question.marks)).sum()
}

/// Maps a total score to percentage, pass/fail and the grade band of the
/// scale. Bands are matched against the percentage, highest floor first,
/// bounds inclusive.
pub(crate) fn derive_outcome(
    total_score: f64,
    exam_total_marks: f64,
    scale: &GradingScale,
    bands: &[GradeBand],
) -> GradeOutcome {
    let percentage_score = if exam_total_marks > 0.0 {
        total_score / exam_total_marks * 100.0
    } else {
        0.0
    };

    let status = if percentage_score >= scale.passing_score {
        ScoreStatus::Pass
    } else {
        ScoreStatus::Fail
    };

    let mut ordered: Vec<&GradeBand> = bands.iter().collect();
    ordered.sort_by(|a, b| {
        b.min_score.partial_cmp(&a.min_score).unwrap_or(std::cmp::Ordering::Equal)
    });

    let band = ordered
        .iter()
        .find(|band| percentage_score >= band.min_score && percentage_score <= band.max_score)
        .or_else(|| ordered.last())
        .copied();

    GradeOutcome {
        percentage_score,
        reading: band.map(|band| band.name.clone()).unwrap_or_else(|| "Unclassified".to_string()),
        status,
        grade_point: band.and_then(|band| band.grade_point),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::time::primitive_now_utc;

    fn set(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    fn default_scale() -> (GradingScale, Vec<GradeBand>) {
        let now = primitive_now_utc();
        let scale = GradingScale {
            id: "scale-1".to_string(),
            name: DEFAULT_SCALE_NAME.to_string(),
            description: None,
            passing_score: DEFAULT_PASSING_SCORE,
            is_default: true,
            created_at: now,
            updated_at: now,
        };
        let bands = DEFAULT_BANDS
            .iter()
            .enumerate()
            .map(|(index, (name, min, max, point))| GradeBand {
                id: format!("band-{index}"),
                scale_id: scale.id.clone(),
                name: name.to_string(),
                min_score: *min,
                max_score: *max,
                grade_point: Some(*point),
                description: None,
            })
            .collect();
        (scale, bands)
    }

    #[test]
    fn single_choice_is_all_or_nothing() {
        let correct = set(&["b"]);
        assert_eq!(answer_score(QuestionType::SingleChoice, 10, &correct, &set(&["b"])), 10.0);
        assert_eq!(answer_score(QuestionType::SingleChoice, 10, &correct, &set(&["a"])), 0.0);
        assert_eq!(answer_score(QuestionType::TrueFalse, 5, &correct, &set(&["b"])), 5.0);
        assert_eq!(answer_score(QuestionType::TrueFalse, 5, &correct, &set(&["a"])), 0.0);
    }

    #[test]
    fn single_choice_superset_earns_nothing() {
        // Exact set equality, not subset/superset.
        let correct = set(&["b"]);
        assert_eq!(answer_score(QuestionType::SingleChoice, 10, &correct, &set(&["a", "b"])), 0.0);
    }

    #[test]
    fn multiple_choice_full_match_earns_full_marks() {
        let correct = set(&["1", "2"]);
        assert_eq!(answer_score(QuestionType::MultipleChoice, 10, &correct, &set(&["1", "2"])), 10.0);
    }

    #[test]
    fn multiple_choice_half_accuracy_rounds_half_up() {
        // TP=1, FP=0, FN=1 -> accuracy 0.5; 0.5 * 5 = 2.5 rounds to 3.
        let correct = set(&["1", "2"]);
        assert_eq!(answer_score(QuestionType::MultipleChoice, 5, &correct, &set(&["1"])), 3.0);
        assert_eq!(answer_score(QuestionType::MultipleChoice, 10, &correct, &set(&["1"])), 5.0);
    }

    #[test]
    fn multiple_choice_wrong_extra_costs_accuracy() {
        // TP=1, FP=1, FN=1 -> accuracy 1/3; 10 marks round to 3.
        let correct = set(&["1", "2"]);
        assert_eq!(answer_score(QuestionType::MultipleChoice, 10, &correct, &set(&["1", "3"])), 3.0);
    }

    #[test]
    fn multiple_choice_empty_sets_score_zero() {
        assert_eq!(answer_score(QuestionType::MultipleChoice, 10, &set(&[]), &set(&[])), 0.0);
    }

    #[test]
    fn free_text_contributes_zero() {
        assert_eq!(answer_score(QuestionType::Essay, 10, &set(&[]), &set(&[])), 0.0);
        assert_eq!(answer_score(QuestionType::ShortAnswer, 10, &set(&[]), &set(&[])), 0.0);
    }

    #[test]
    fn total_sums_per_answer_scores() {
        let answers = vec![
            AnswerToGrade {
                question_type: QuestionType::SingleChoice,
                marks: 10,
                correct_option_ids: set(&["b"]),
                selected_option_ids: set(&["b"]),
            },
            AnswerToGrade {
                question_type: QuestionType::MultipleChoice,
                marks: 10,
                correct_option_ids: set(&["1", "2"]),
                selected_option_ids: set(&["1"]),
            },
            AnswerToGrade {
                question_type: QuestionType::Essay,
                marks: 20,
                correct_option_ids: set(&[]),
                selected_option_ids: set(&[]),
            },
        ];
        assert_eq!(total_auto_score(&answers), 15.0);
    }

    #[test]
    fn essay_blocks_auto_grading_short_answer_does_not() {
        assert!(is_auto_gradable([QuestionType::SingleChoice, QuestionType::MultipleChoice]));
        assert!(is_auto_gradable([QuestionType::ShortAnswer, QuestionType::TrueFalse]));
        assert!(!is_auto_gradable([QuestionType::SingleChoice, QuestionType::Essay]));
    }

    #[test]
    fn outcome_bands_match_fixed_thresholds() {
        let (scale, bands) = default_scale();

        let outcome = derive_outcome(85.0, 100.0, &scale, &bands);
        assert_eq!(outcome.percentage_score, 85.0);
        assert_eq!(outcome.reading, "Very Good");
        assert_eq!(outcome.status, ScoreStatus::Pass);

        let outcome = derive_outcome(45.0, 100.0, &scale, &bands);
        assert_eq!(outcome.reading, "Unsatisfactory");
        assert_eq!(outcome.status, ScoreStatus::Fail);
    }

    #[test]
    fn marginal_band_fails_below_passing_score() {
        let (scale, bands) = default_scale();

        let outcome = derive_outcome(55.0, 100.0, &scale, &bands);
        assert_eq!(outcome.reading, "Marginal");
        assert_eq!(outcome.status, ScoreStatus::Fail);

        let outcome = derive_outcome(60.0, 100.0, &scale, &bands);
        assert_eq!(outcome.reading, "Satisfactory");
        assert_eq!(outcome.status, ScoreStatus::Pass);
    }

    #[test]
    fn band_floors_are_inclusive() {
        let (scale, bands) = default_scale();

        assert_eq!(derive_outcome(90.0, 100.0, &scale, &bands).reading, "Excellent");
        assert_eq!(derive_outcome(100.0, 100.0, &scale, &bands).reading, "Excellent");
        assert_eq!(derive_outcome(80.0, 100.0, &scale, &bands).reading, "Very Good");
    }

    #[test]
    fn zero_total_marks_yields_zero_percentage() {
        let (scale, bands) = default_scale();
        let outcome = derive_outcome(0.0, 0.0, &scale, &bands);
        assert_eq!(outcome.percentage_score, 0.0);
        assert_eq!(outcome.status, ScoreStatus::Fail);
    }

    #[test]
    fn percentage_scales_with_exam_total() {
        let (scale, bands) = default_scale();
        let outcome = derive_outcome(10.0, 10.0, &scale, &bands);
        assert_eq!(outcome.percentage_score, 100.0);
        assert_eq!(outcome.status, ScoreStatus::Pass);
        assert_eq!(outcome.grade_point, Some(4.0));
    }
}
