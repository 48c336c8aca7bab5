use std::future::Future;
use std::pin::Pin;

use actix_web::{dev, web, FromRequest, HttpRequest};

use anyhow::Context;

use argon2::{Argon2, PasswordHash, PasswordVerifier};

use coursedeck::domain::{EmailAddress, Role};
use coursedeck::model::User;
use coursedeck::repo::UsersRepo;

use secrecy::Secret;

use sqlx::PgPool;

use uuid::Uuid;

use crate::auth::{Credentials, LeaderPrincipal};
use crate::error::{RestError, RestResult};
use crate::telemetry::spawn_blocking_with_tracing;

/// Any authenticated, non-blocked account. Student-facing operations
/// (checkout, free enrollment, coupon validation) require no more.
#[derive(Debug)]
pub struct Student {
    pub id: Uuid,
}

impl FromRequest for Student {
    type Error = RestError;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _: &mut dev::Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move {
            let user = authenticate(&req).await?;
            Ok(Student { id: user.id })
        })
    }
}

/// An authenticated account holding at least the ADMIN role.
/// Super-admin and leader-only operations layer further checks on top.
#[derive(Debug)]
pub struct Administrator {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub is_super_admin: bool,
}

impl Administrator {
    pub fn require_super_admin(&self) -> RestResult<()> {
        if self.is_super_admin {
            Ok(())
        } else {
            Err(RestError::Forbidden("Super admin access required".into()))
        }
    }

    /// Leader-only capability: super admin AND the fixed leader identity.
    pub fn require_leader(&self, leader: &LeaderPrincipal) -> RestResult<()> {
        self.require_super_admin()?;
        if leader.matches(&self.email) {
            Ok(())
        } else {
            Err(RestError::Forbidden("Only the leader may do this".into()))
        }
    }
}

impl FromRequest for Administrator {
    type Error = RestError;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _: &mut dev::Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move {
            let user = authenticate(&req).await?;
            if !user.role.is_admin() {
                return Err(RestError::Forbidden("Admin access required".into()));
            }
            Ok(Administrator {
                id: user.id,
                email: user.email,
                role: user.role,
                is_super_admin: user.is_super_admin,
            })
        })
    }
}

async fn authenticate(req: &HttpRequest) -> RestResult<User> {
    // NOTE: Must be registered with the application at startup
    let pool: &PgPool = req
        .app_data::<web::Data<PgPool>>()
        .expect("PgPool not registered for application");
    // Pull the credentials from the headers
    let creds = Credentials::from_headers(req.headers())
        .map_err(RestError::FailedToAuthenticate)?;
    // Get the user and verify the credentials
    let user_id = validate_credentials(pool, &creds).await?;

    let user = UsersRepo::fetch_by_id(pool, user_id)
        .await?
        .context("Authenticated user vanished")
        .map_err(RestError::FailedToAuthenticate)?;
    if user.blocked {
        return Err(RestError::FailedToAuthenticate(anyhow::anyhow!(
            "Account is blocked"
        )));
    }
    Ok(user)
}

#[tracing::instrument("Validate credentials", skip(credentials, pool))]
async fn validate_credentials(pool: &PgPool, credentials: &Credentials) -> RestResult<Uuid> {
    let email: EmailAddress = credentials.email.parse().map_err(RestError::from)?;
    let password = credentials.password.clone();

    let user = UsersRepo::fetch_credentials_by_email(pool, &email)
        .await?
        .context("No user stored for email")
        .map_err(RestError::FailedToAuthenticate)?;

    spawn_blocking_with_tracing(move || verify_password_hash(password, user.password_hash))
        .await
        .context("Failed to spawn blocking task")??;

    Ok(user.id)
}

#[tracing::instrument("Verify password hash", skip(password, password_hash))]
fn verify_password_hash(password: Secret<String>, password_hash: Secret<String>) -> RestResult<()> {
    use secrecy::ExposeSecret;

    let password_hash = PasswordHash::new(password_hash.expose_secret())
        .context("Failed to parse stored password hash")?;

    Argon2::default()
        .verify_password(password.expose_secret().as_bytes(), &password_hash)
        .context("Failed to verify password hash")
        .map_err(RestError::FailedToAuthenticate)?;

    Ok(())
}
