use sqlx::PgExecutor;

use uuid::Uuid;

use crate::model::{Course, CourseStatus, NewCourse};

/// Postgres course repository
#[derive(Debug)]
pub struct CoursesRepo;

impl CoursesRepo {
    #[tracing::instrument(name = "Insert course", skip(executor))]
    pub async fn insert<'con>(
        executor: impl PgExecutor<'con>,
        new_course: &NewCourse,
    ) -> sqlx::Result<Uuid> {
        let row: (Uuid,) = sqlx::query_as(
            "insert into courses(slug, title, price, discount_price, status) \
             values ($1, $2, $3, $4, $5) returning id",
        )
        .bind(&new_course.slug)
        .bind(&new_course.title)
        .bind(new_course.price)
        .bind(new_course.discount_price)
        .bind(new_course.status)
        .fetch_one(executor)
        .await?;

        Ok(row.0)
    }

    #[tracing::instrument(name = "Fetch course by id", skip(executor))]
    pub async fn fetch_by_id<'con>(
        executor: impl PgExecutor<'con>,
        id: Uuid,
    ) -> sqlx::Result<Option<Course>> {
        sqlx::query_as::<_, Course>("select * from courses where id=$1")
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    #[tracing::instrument(name = "Fetch course by slug", skip(executor))]
    pub async fn fetch_by_slug<'con>(
        executor: impl PgExecutor<'con>,
        slug: &str,
    ) -> sqlx::Result<Option<Course>> {
        sqlx::query_as::<_, Course>("select * from courses where slug=$1")
            .bind(slug)
            .fetch_optional(executor)
            .await
    }

    #[tracing::instrument(name = "Fetch published courses", skip(executor))]
    pub async fn fetch_published<'con>(
        executor: impl PgExecutor<'con>,
    ) -> sqlx::Result<Vec<Course>> {
        sqlx::query_as::<_, Course>(
            "select * from courses where status=$1 order by created_at desc",
        )
        .bind(CourseStatus::Published)
        .fetch_all(executor)
        .await
    }

    /// Adjust the denormalized seat counter. Only the entitlement writer
    /// calls this, inside the same transaction as the enrollment change.
    #[tracing::instrument(name = "Adjust course student count", skip(executor))]
    pub async fn adjust_students_count<'con>(
        executor: impl PgExecutor<'con>,
        id: Uuid,
        delta: i32,
    ) -> sqlx::Result<()> {
        sqlx::query("update courses set students_count = students_count + $2 where id=$1")
            .bind(id)
            .bind(delta)
            .execute(executor)
            .await?;
        Ok(())
    }
}
