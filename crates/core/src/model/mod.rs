mod certificate;
mod course;
mod dashboard;
mod enrollment;
mod ids;
mod lesson;
mod progress;
mod webinar;

pub use ids::{CategoryId, CourseId, LessonId, MAX_ID, ParseIdError, UserId, WebinarId};

pub use certificate::{
    Certificate, CertificateError, CertificateTemplate, DEFAULT_CERTIFICATE_BASE_URL,
};
pub use course::{
    Category, Course, CourseDetail, CourseDraft, CourseError, CoursePatch, CourseQuery,
    CourseSummary, DEFAULT_PAGE_SIZE, Difficulty, MAX_PAGE_SIZE, NewCategory, NewCourse,
};
pub use dashboard::{Dashboard, DashboardStats};
pub use enrollment::{EnrolledCourse, Enrollment};
pub use lesson::{Lesson, LessonDraft, LessonError, NewLesson};
pub use progress::{
    CompletionOutcome, CourseTally, LessonProgress, ProgressEntry, ProgressError, ProgressReport,
};
pub use webinar::{Countdown, EnrolledWebinar, NewWebinar, Webinar, WebinarDraft, WebinarError};
