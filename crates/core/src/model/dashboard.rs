use serde::Serialize;

use crate::model::enrollment::EnrolledCourse;
use crate::model::webinar::EnrolledWebinar;

/// Headline counters for a learner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_courses: u32,
    pub completed_courses: u32,
    pub total_certificates: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub stats: DashboardStats,
    pub enrolled_courses: Vec<EnrolledCourse>,
    pub enrolled_webinars: Vec<EnrolledWebinar>,
}
