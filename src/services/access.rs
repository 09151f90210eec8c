//! Allow/deny decisions over a principal and the ownership chain of the
//! resource. Admins pass every check; everything else is ownership-gated.
//! The authenticated user is always an explicit argument, handlers resolve
//! NotFound before calling into these.

use crate::db::models::{Course, User};
use crate::db::types::UserRole;

pub(crate) fn is_admin(user: &User) -> bool {
    user.role == UserRole::Admin
}

pub(crate) fn can_create_course(user: &User) -> bool {
    matches!(user.role, UserRole::Admin | UserRole::Teacher)
}

pub(crate) fn can_manage_course(user: &User, course: &Course) -> bool {
    is_admin(user) || course.teacher_id == user.id
}

/// Students see an exam only when it is published and they are enrolled.
pub(crate) fn can_view_exam(user: &User, course: &Course, published: bool, enrolled: bool) -> bool {
    can_manage_course(user, course) || (published && enrolled)
}

pub(crate) fn can_view_submission(
    user: &User,
    submission_student_id: &str,
    course_teacher_id: &str,
) -> bool {
    user.id == submission_student_id || user.id == course_teacher_id || is_admin(user)
}

pub(crate) fn can_grade_submission(user: &User, course_teacher_id: &str) -> bool {
    user.id == course_teacher_id || is_admin(user)
}

/// Only the submitting student, and only while the submission is ungraded.
pub(crate) fn can_modify_answer(
    user: &User,
    submission_student_id: &str,
    submission_graded: bool,
) -> bool {
    user.id == submission_student_id && !submission_graded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::time::primitive_now_utc;

    fn user(id: &str, role: UserRole) -> User {
        let now = primitive_now_utc();
        User {
            id: id.to_string(),
            email: format!("{id}@example.com"),
            hashed_password: "x".to_string(),
            full_name: id.to_string(),
            role,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn course(id: &str, teacher_id: &str) -> Course {
        let now = primitive_now_utc();
        Course {
            id: id.to_string(),
            title: "Algebra".to_string(),
            description: None,
            teacher_id: teacher_id.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn admin_passes_every_check() {
        let admin = user("a1", UserRole::Admin);
        let c = course("c1", "t1");

        assert!(can_manage_course(&admin, &c));
        assert!(can_view_exam(&admin, &c, false, false));
        assert!(can_view_submission(&admin, "s1", "t1"));
        assert!(can_grade_submission(&admin, "t1"));
    }

    #[test]
    fn owning_teacher_manages_course_other_teacher_does_not() {
        let owner = user("t1", UserRole::Teacher);
        let other = user("t2", UserRole::Teacher);
        let c = course("c1", "t1");

        assert!(can_manage_course(&owner, &c));
        assert!(!can_manage_course(&other, &c));
    }

    #[test]
    fn student_sees_exam_only_when_published_and_enrolled() {
        let student = user("s1", UserRole::Student);
        let c = course("c1", "t1");

        assert!(can_view_exam(&student, &c, true, true));
        assert!(!can_view_exam(&student, &c, false, true));
        assert!(!can_view_exam(&student, &c, true, false));
    }

    #[test]
    fn submission_visible_to_student_teacher_and_admin_only() {
        let student = user("s1", UserRole::Student);
        let outsider = user("s2", UserRole::Student);
        let teacher = user("t1", UserRole::Teacher);

        assert!(can_view_submission(&student, "s1", "t1"));
        assert!(can_view_submission(&teacher, "s1", "t1"));
        assert!(!can_view_submission(&outsider, "s1", "t1"));
    }

    #[test]
    fn only_owning_teacher_or_admin_grades() {
        let teacher = user("t1", UserRole::Teacher);
        let other = user("t2", UserRole::Teacher);
        let student = user("s1", UserRole::Student);

        assert!(can_grade_submission(&teacher, "t1"));
        assert!(!can_grade_submission(&other, "t1"));
        assert!(!can_grade_submission(&student, "t1"));
    }

    #[test]
    fn answer_mutation_locked_after_grading() {
        let student = user("s1", UserRole::Student);

        assert!(can_modify_answer(&student, "s1", false));
        assert!(!can_modify_answer(&student, "s1", true));
        assert!(!can_modify_answer(&student, "s2", false));
    }
}
