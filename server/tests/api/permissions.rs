use reqwest::StatusCode;

use serde_json::json;

use sqlx::PgPool;

use uuid::Uuid;

use coursedeck::domain::Role;
use coursedeck::repo::UsersRepo;

use crate::helpers::{response_json, TestApp, TestUser, LEADER_EMAIL};

async fn leader(pool: &PgPool) -> TestUser {
    TestUser::register(pool, LEADER_EMAIL, "password", Role::Leader).await
}

#[sqlx::test(migrations = "../migrations")]
async fn leader_can_promote_a_user_to_admin(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    let leader = leader(&pool).await;
    let target = TestUser::register(&pool, "user@test.com", "password", Role::User).await;

    let res = app
        .update_role(Some(&leader.credentials()), target.id, "ADMIN")
        .await
        .expect("Failed to execute request");

    assert!(res.status().is_success());
    assert_eq!(json!(true), response_json(res).await["success"]);

    let user = UsersRepo::fetch_by_id(&pool, target.id)
        .await?
        .expect("User not found");
    assert_eq!(Role::Admin, user.role);

    Ok(())
}

#[sqlx::test(migrations = "../migrations")]
async fn leader_can_demote_an_admin(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    let leader = leader(&pool).await;
    let target = TestUser::register(&pool, "admin@test.com", "password", Role::Admin).await;

    let res = app
        .update_role(Some(&leader.credentials()), target.id, "USER")
        .await
        .expect("Failed to execute request");

    assert!(res.status().is_success());

    let user = UsersRepo::fetch_by_id(&pool, target.id)
        .await?
        .expect("User not found");
    assert_eq!(Role::User, user.role);

    Ok(())
}

#[sqlx::test(migrations = "../migrations")]
async fn leader_role_cannot_be_granted_to_another_identity(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    let leader = leader(&pool).await;
    let target = TestUser::register(&pool, "user@test.com", "password", Role::User).await;

    let res = app
        .update_role(Some(&leader.credentials()), target.id, "LEADER")
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::FORBIDDEN, res.status());

    let user = UsersRepo::fetch_by_id(&pool, target.id)
        .await?
        .expect("User not found");
    assert_eq!(Role::User, user.role);

    Ok(())
}

#[sqlx::test(migrations = "../migrations")]
async fn leader_cannot_be_demoted(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    let leader = leader(&pool).await;

    let res = app
        .update_role(Some(&leader.credentials()), leader.id, "ADMIN")
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::FORBIDDEN, res.status());

    let user = UsersRepo::fetch_by_id(&pool, leader.id)
        .await?
        .expect("User not found");
    assert_eq!(Role::Leader, user.role);

    Ok(())
}

#[sqlx::test(migrations = "../migrations")]
async fn non_leader_admin_cannot_change_roles(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    let admin = TestUser::register(&pool, "admin@test.com", "password", Role::Admin).await;
    let target = TestUser::register(&pool, "user@test.com", "password", Role::User).await;

    let res = app
        .update_role(Some(&admin.credentials()), target.id, "ADMIN")
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::FORBIDDEN, res.status());

    let user = UsersRepo::fetch_by_id(&pool, target.id)
        .await?
        .expect("User not found");
    assert_eq!(Role::User, user.role);

    Ok(())
}

#[sqlx::test(migrations = "../migrations")]
async fn regular_users_cannot_reach_role_administration(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    let student = TestUser::register(&pool, "user@test.com", "password", Role::User).await;

    let res = app
        .update_role(Some(&student.credentials()), Uuid::new_v4(), "ADMIN")
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::FORBIDDEN, res.status());

    Ok(())
}

#[sqlx::test(migrations = "../migrations")]
async fn changing_an_unknown_user_is_declined(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    let leader = leader(&pool).await;

    let res = app
        .update_role(Some(&leader.credentials()), Uuid::new_v4(), "ADMIN")
        .await
        .expect("Failed to execute request");

    let body = response_json(res).await;
    assert_eq!(json!(false), body["success"]);
    assert_eq!(json!("USER_NOT_FOUND"), body["code"]);

    Ok(())
}
