use actix_web::{get, web, HttpResponse, Scope};

use coursedeck::repo::CoursesRepo;

use sqlx::PgPool;

use crate::controller::{decline, ok};
use crate::error::RestResult;

pub fn scope() -> Scope {
    web::scope("/courses").service(list).service(fetch)
}

#[tracing::instrument(name = "List published courses", skip(pool))]
#[get("")]
async fn list(pool: web::Data<PgPool>) -> RestResult<HttpResponse> {
    let courses = CoursesRepo::fetch_published(pool.get_ref()).await?;
    Ok(ok(courses))
}

#[tracing::instrument(name = "Fetch course by slug", skip(pool))]
#[get("/{slug}")]
async fn fetch(pool: web::Data<PgPool>, path: web::Path<String>) -> RestResult<HttpResponse> {
    let slug = path.into_inner();

    match CoursesRepo::fetch_by_slug(pool.get_ref(), &slug).await? {
        Some(course) if course.is_published() => Ok(ok(course)),
        _ => Ok(decline("COURSE_NOT_FOUND", "Course not found")),
    }
}
