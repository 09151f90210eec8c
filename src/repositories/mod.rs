pub(crate) mod answers;
pub(crate) mod courses;
pub(crate) mod enrollments;
pub(crate) mod exams;
pub(crate) mod grading_scales;
pub(crate) mod questions;
pub(crate) mod scores;
pub(crate) mod submissions;
pub(crate) mod users;
