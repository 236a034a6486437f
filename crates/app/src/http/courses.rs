use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use lms_core::model::{
    Category, CategoryId, Course, CourseDetail, CourseDraft, CourseId, CoursePatch, CourseQuery,
    CourseSummary, Difficulty, Lesson, LessonDraft,
};
use serde::{Deserialize, Serialize};
use services::AppServices;

use super::error::{ApiResponse, ApiResult, double_option};

//
// ─── CATALOG ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    search: Option<String>,
    #[serde(default)]
    limit: Option<u32>,
    #[serde(default)]
    offset: Option<u32>,
}

pub async fn list(
    State(app): State<AppServices>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<ApiResponse<Vec<CourseSummary>>> {
    let Query(query) = query?;
    let query = CourseQuery::new(query.category, query.search, query.limit, query.offset);
    let courses = app.courses().list_courses(&query).await?;
    let total = courses.len();
    Ok(ApiResponse::ok(courses).with_total(total))
}

pub async fn get_one(
    State(app): State<AppServices>,
    id: Result<Path<CourseId>, PathRejection>,
) -> ApiResult<ApiResponse<CourseDetail>> {
    let Path(id) = id?;
    Ok(ApiResponse::ok(app.courses().get_course(id).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseBody {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    instructor: Option<String>,
    #[serde(default, alias = "thumbnail_url")]
    thumbnail_url: Option<String>,
    #[serde(default, alias = "category_id")]
    category_id: Option<CategoryId>,
    #[serde(default, alias = "duration_hours")]
    duration_hours: Option<f64>,
    #[serde(default, alias = "difficultyLevel", alias = "difficulty_level")]
    difficulty: Option<Difficulty>,
    #[serde(default, alias = "is_published")]
    is_published: bool,
}

impl From<CourseBody> for CourseDraft {
    fn from(body: CourseBody) -> Self {
        Self {
            title: body.title,
            description: body.description,
            instructor: body.instructor,
            thumbnail_url: body.thumbnail_url,
            category_id: body.category_id,
            duration_hours: body.duration_hours,
            difficulty: body.difficulty,
            is_published: body.is_published,
        }
    }
}

pub async fn create(
    State(app): State<AppServices>,
    payload: Result<Json<CourseBody>, JsonRejection>,
) -> ApiResult<(StatusCode, ApiResponse<Course>)> {
    let Json(body) = payload?;
    let course = app.courses().create_course(body.into()).await?;
    Ok(ApiResponse::ok(course)
        .with_message("Course created")
        .created())
}

/// Partial update; explicit `null` clears a nullable field.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoursePatchBody {
    #[serde(default)]
    title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    description: Option<Option<String>>,
    #[serde(default)]
    instructor: Option<String>,
    #[serde(default, alias = "thumbnail_url", deserialize_with = "double_option")]
    thumbnail_url: Option<Option<String>>,
    #[serde(default, alias = "category_id", deserialize_with = "double_option")]
    category_id: Option<Option<CategoryId>>,
    #[serde(default, alias = "duration_hours", deserialize_with = "double_option")]
    duration_hours: Option<Option<f64>>,
    #[serde(
        default,
        alias = "difficultyLevel",
        alias = "difficulty_level",
        deserialize_with = "double_option"
    )]
    difficulty: Option<Option<Difficulty>>,
    #[serde(default, alias = "is_published")]
    is_published: Option<bool>,
}

impl From<CoursePatchBody> for CoursePatch {
    fn from(body: CoursePatchBody) -> Self {
        Self {
            title: body.title,
            description: body.description,
            instructor: body.instructor,
            thumbnail_url: body.thumbnail_url,
            category_id: body.category_id,
            duration_hours: body.duration_hours,
            difficulty: body.difficulty,
            is_published: body.is_published,
        }
    }
}

pub async fn update(
    State(app): State<AppServices>,
    id: Result<Path<CourseId>, PathRejection>,
    payload: Result<Json<CoursePatchBody>, JsonRejection>,
) -> ApiResult<ApiResponse<Course>> {
    let Path(id) = id?;
    let Json(body) = payload?;
    let course = app.courses().update_course(id, body.into()).await?;
    Ok(ApiResponse::ok(course).with_message("Course updated"))
}

#[derive(Debug, Serialize)]
pub struct Deleted {
    id: CourseId,
}

pub async fn delete(
    State(app): State<AppServices>,
    id: Result<Path<CourseId>, PathRejection>,
) -> ApiResult<ApiResponse<Deleted>> {
    let Path(id) = id?;
    app.courses().delete_course(id).await?;
    Ok(ApiResponse::ok(Deleted { id }).with_message("Course deleted"))
}

//
// ─── LESSONS & CATEGORIES ──────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonBody {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default, alias = "video_url")]
    video_url: Option<String>,
    #[serde(default, alias = "duration_minutes")]
    duration_minutes: Option<u32>,
    #[serde(default, alias = "lesson_order")]
    lesson_order: Option<u32>,
    #[serde(default, alias = "is_published")]
    is_published: bool,
}

pub async fn add_lesson(
    State(app): State<AppServices>,
    course_id: Result<Path<CourseId>, PathRejection>,
    payload: Result<Json<LessonBody>, JsonRejection>,
) -> ApiResult<(StatusCode, ApiResponse<Lesson>)> {
    let Path(course_id) = course_id?;
    let Json(body) = payload?;
    let draft = LessonDraft {
        title: body.title,
        description: body.description,
        video_url: body.video_url,
        duration_minutes: body.duration_minutes,
        lesson_order: body.lesson_order,
        is_published: body.is_published,
    };
    let lesson = app.courses().add_lesson(course_id, draft).await?;
    Ok(ApiResponse::ok(lesson).created())
}

#[derive(Debug, Deserialize)]
pub struct CategoryBody {
    #[serde(default)]
    name: String,
    #[serde(default)]
    color: Option<String>,
}

pub async fn create_category(
    State(app): State<AppServices>,
    payload: Result<Json<CategoryBody>, JsonRejection>,
) -> ApiResult<(StatusCode, ApiResponse<Category>)> {
    let Json(body) = payload?;
    let category = app
        .courses()
        .create_category(body.name, body.color)
        .await?;
    Ok(ApiResponse::ok(category).created())
}
