use secrecy::Secret;

use sqlx::PgExecutor;

use uuid::Uuid;

use crate::domain::{EmailAddress, Role};
use crate::model::{NewUser, User};

#[derive(Debug)]
pub struct UserCredentials {
    pub id: Uuid,
    pub password_hash: Secret<String>,
    pub blocked: bool,
}

pub struct UsersRepo;

impl UsersRepo {
    #[tracing::instrument(name = "Insert a new user record", skip(executor, new_user))]
    pub async fn insert<'con>(
        executor: impl PgExecutor<'con>,
        new_user: &NewUser,
    ) -> sqlx::Result<Uuid> {
        let row: (Uuid,) = sqlx::query_as(
            "insert into users(email, name, password_hash, role, is_super_admin) \
             values ($1, $2, $3, $4, $5) returning id",
        )
        .bind(new_user.email.as_ref())
        .bind(&new_user.name)
        .bind(&new_user.password_hash)
        .bind(new_user.role)
        .bind(new_user.is_super_admin)
        .fetch_one(executor)
        .await?;

        Ok(row.0)
    }

    pub async fn fetch_credentials_by_email<'con>(
        executor: impl PgExecutor<'con>,
        email: &EmailAddress,
    ) -> sqlx::Result<Option<UserCredentials>> {
        let row: Option<(Uuid, String, bool)> =
            sqlx::query_as("select id, password_hash, blocked from users where email=$1")
                .bind(email.as_ref())
                .fetch_optional(executor)
                .await?;

        Ok(row.map(|(id, password_hash, blocked)| UserCredentials {
            id,
            password_hash: Secret::new(password_hash),
            blocked,
        }))
    }

    #[tracing::instrument(name = "Fetch user by id", skip(executor))]
    pub async fn fetch_by_id<'con>(
        executor: impl PgExecutor<'con>,
        id: Uuid,
    ) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>("select * from users where id=$1")
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    #[tracing::instrument(name = "Update user role", skip(executor))]
    pub async fn update_role<'con>(
        executor: impl PgExecutor<'con>,
        id: Uuid,
        role: Role,
    ) -> sqlx::Result<bool> {
        let result = sqlx::query("update users set role=$2 where id=$1")
            .bind(id)
            .bind(role)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() == 1)
    }
}
