use sqlx::PgExecutor;

use uuid::Uuid;

use crate::model::Enrollment;

/// Postgres enrollment repository
#[derive(Debug)]
pub struct EnrollmentsRepo;

impl EnrollmentsRepo {
    /// Insert an enrollment at progress 0. A unique-constraint violation
    /// on (student_id, course_id) surfaces as a `sqlx::Error`; the
    /// entitlement writer maps it to its already-enrolled outcome.
    #[tracing::instrument(name = "Insert enrollment", skip(executor))]
    pub async fn insert<'con>(
        executor: impl PgExecutor<'con>,
        student_id: Uuid,
        course_id: Uuid,
    ) -> sqlx::Result<Uuid> {
        let row: (Uuid,) = sqlx::query_as(
            "insert into enrollments(student_id, course_id) values ($1, $2) returning id",
        )
        .bind(student_id)
        .bind(course_id)
        .fetch_one(executor)
        .await?;

        Ok(row.0)
    }

    #[tracing::instrument(name = "Check enrollment exists", skip(executor))]
    pub async fn exists<'con>(
        executor: impl PgExecutor<'con>,
        student_id: Uuid,
        course_id: Uuid,
    ) -> sqlx::Result<bool> {
        let row: Option<(Uuid,)> = sqlx::query_as(
            "select id from enrollments where student_id=$1 and course_id=$2",
        )
        .bind(student_id)
        .bind(course_id)
        .fetch_optional(executor)
        .await?;

        Ok(row.is_some())
    }

    #[tracing::instrument(name = "Fetch enrollment by id", skip(executor))]
    pub async fn fetch_by_id<'con>(
        executor: impl PgExecutor<'con>,
        id: Uuid,
    ) -> sqlx::Result<Option<Enrollment>> {
        sqlx::query_as::<_, Enrollment>("select * from enrollments where id=$1")
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    #[tracing::instrument(name = "Fetch enrollments by student", skip(executor))]
    pub async fn fetch_by_student<'con>(
        executor: impl PgExecutor<'con>,
        student_id: Uuid,
    ) -> sqlx::Result<Vec<Enrollment>> {
        sqlx::query_as::<_, Enrollment>(
            "select * from enrollments where student_id=$1 order by created_at desc",
        )
        .bind(student_id)
        .fetch_all(executor)
        .await
    }

    /// Delete an enrollment, returning the course it referenced so the
    /// caller can decrement the seat counter in the same transaction.
    #[tracing::instrument(name = "Delete enrollment", skip(executor))]
    pub async fn delete<'con>(
        executor: impl PgExecutor<'con>,
        id: Uuid,
    ) -> sqlx::Result<Option<Uuid>> {
        let row: Option<(Uuid,)> =
            sqlx::query_as("delete from enrollments where id=$1 returning course_id")
                .bind(id)
                .fetch_optional(executor)
                .await?;

        Ok(row.map(|row| row.0))
    }
}
