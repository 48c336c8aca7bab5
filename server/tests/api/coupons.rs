use chrono::{Duration, Utc};

use reqwest::StatusCode;

use rust_decimal_macros::dec;

use serde_json::json;

use sqlx::PgPool;

use uuid::Uuid;

use coursedeck::domain::Role;
use coursedeck::model::DiscountType;
use coursedeck::repo::CouponsRepo;

use crate::helpers::{coupon_payload, response_json, seed_coupon, seed_course, TestApp, TestUser};

#[sqlx::test(migrations = "../migrations")]
async fn percentage_coupon_reports_a_rounded_discount(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    let student = TestUser::register(&pool, "student@test.com", "password", Role::User).await;
    let course_id = seed_course(&pool, dec!(49.99), None).await;
    seed_coupon(
        &pool,
        &coupon_payload("WELCOME20", DiscountType::Percentage, dec!(20)),
    )
    .await;

    let res = app
        .validate_coupon(
            Some(&student.credentials()),
            &json!({ "code": "WELCOME20", "course_id": course_id }),
        )
        .await
        .expect("Failed to execute request");

    let body = response_json(res).await;
    assert_eq!(json!(true), body["success"]);
    assert_eq!(json!("WELCOME20"), body["data"]["code"]);
    assert_eq!(json!("PERCENTAGE"), body["data"]["discount_type"]);
    assert_eq!(json!("10.00"), body["data"]["discount_amount"]);
    assert_eq!(json!("39.99"), body["data"]["final_amount"]);

    Ok(())
}

#[sqlx::test(migrations = "../migrations")]
async fn fixed_coupon_reports_its_face_value(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    let student = TestUser::register(&pool, "student@test.com", "password", Role::User).await;
    let course_id = seed_course(&pool, dec!(49.99), None).await;
    seed_coupon(
        &pool,
        &coupon_payload("TENOFF", DiscountType::Fixed, dec!(10.00)),
    )
    .await;

    let res = app
        .validate_coupon(
            Some(&student.credentials()),
            &json!({ "code": "TENOFF", "course_id": course_id }),
        )
        .await
        .expect("Failed to execute request");

    let body = response_json(res).await;
    assert_eq!(json!(true), body["success"]);
    assert_eq!(json!("10.00"), body["data"]["discount_amount"]);
    assert_eq!(json!("39.99"), body["data"]["final_amount"]);

    Ok(())
}

#[sqlx::test(migrations = "../migrations")]
async fn lowercase_codes_are_normalized(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    let student = TestUser::register(&pool, "student@test.com", "password", Role::User).await;
    let course_id = seed_course(&pool, dec!(49.99), None).await;
    seed_coupon(
        &pool,
        &coupon_payload("WELCOME20", DiscountType::Percentage, dec!(20)),
    )
    .await;

    let res = app
        .validate_coupon(
            Some(&student.credentials()),
            &json!({ "code": "welcome20", "course_id": course_id }),
        )
        .await
        .expect("Failed to execute request");

    assert_eq!(json!(true), response_json(res).await["success"]);

    Ok(())
}

#[sqlx::test(migrations = "../migrations")]
async fn expired_coupon_is_declined(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    let student = TestUser::register(&pool, "student@test.com", "password", Role::User).await;
    let course_id = seed_course(&pool, dec!(49.99), None).await;

    let mut expired = coupon_payload("OLDNEWS", DiscountType::Fixed, dec!(10.00));
    expired.valid_from = Some(Utc::now() - Duration::days(30));
    expired.valid_until = Some(Utc::now() - Duration::days(1));
    seed_coupon(&pool, &expired).await;

    let res = app
        .validate_coupon(
            Some(&student.credentials()),
            &json!({ "code": "OLDNEWS", "course_id": course_id }),
        )
        .await
        .expect("Failed to execute request");

    let body = response_json(res).await;
    assert_eq!(json!(false), body["success"]);
    assert_eq!(json!("EXPIRED"), body["code"]);

    Ok(())
}

#[sqlx::test(migrations = "../migrations")]
async fn coupon_restricted_to_another_course_is_declined(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    let student = TestUser::register(&pool, "student@test.com", "password", Role::User).await;
    let course_id = seed_course(&pool, dec!(49.99), None).await;
    let other_course_id = seed_course(&pool, dec!(99.99), None).await;

    let mut restricted = coupon_payload("OTHERONLY", DiscountType::Fixed, dec!(10.00));
    restricted.course_ids = vec![other_course_id];
    seed_coupon(&pool, &restricted).await;

    let res = app
        .validate_coupon(
            Some(&student.credentials()),
            &json!({ "code": "OTHERONLY", "course_id": course_id }),
        )
        .await
        .expect("Failed to execute request");

    let body = response_json(res).await;
    assert_eq!(json!(false), body["success"]);
    assert_eq!(json!("NOT_VALID_FOR_COURSE"), body["code"]);

    Ok(())
}

#[sqlx::test(migrations = "../migrations")]
async fn purchase_below_the_minimum_is_declined(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    let student = TestUser::register(&pool, "student@test.com", "password", Role::User).await;
    let course_id = seed_course(&pool, dec!(49.99), None).await;

    let mut high_roller = coupon_payload("BIGSPENDER", DiscountType::Fixed, dec!(25.00));
    high_roller.min_purchase_amount = Some(dec!(100.00));
    seed_coupon(&pool, &high_roller).await;

    let res = app
        .validate_coupon(
            Some(&student.credentials()),
            &json!({ "code": "BIGSPENDER", "course_id": course_id }),
        )
        .await
        .expect("Failed to execute request");

    let body = response_json(res).await;
    assert_eq!(json!(false), body["success"]);
    assert_eq!(json!("BELOW_MINIMUM"), body["code"]);

    Ok(())
}

#[sqlx::test(migrations = "../migrations")]
async fn unknown_code_is_declined(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    let student = TestUser::register(&pool, "student@test.com", "password", Role::User).await;
    let course_id = seed_course(&pool, dec!(49.99), None).await;

    let res = app
        .validate_coupon(
            Some(&student.credentials()),
            &json!({ "code": "NOSUCHCODE", "course_id": course_id }),
        )
        .await
        .expect("Failed to execute request");

    let body = response_json(res).await;
    assert_eq!(json!(false), body["success"]);
    assert_eq!(json!("INVALID_CODE"), body["code"]);

    Ok(())
}

#[sqlx::test(migrations = "../migrations")]
async fn validation_requires_authentication(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;

    let res = app
        .validate_coupon(
            None,
            &json!({ "code": "WELCOME20", "course_id": Uuid::new_v4() }),
        )
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::UNAUTHORIZED, res.status());

    Ok(())
}

#[sqlx::test(migrations = "../migrations")]
async fn admin_can_create_a_coupon(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    let admin = TestUser::register(&pool, "admin@test.com", "password", Role::Admin).await;

    let res = app
        .create_coupon(
            Some(&admin.credentials()),
            &json!({
                "code": "LAUNCH50",
                "discount_type": "PERCENTAGE",
                "discount_value": "50",
                "max_uses": 100,
            }),
        )
        .await
        .expect("Failed to execute request");

    let body = response_json(res).await;
    assert_eq!(json!(true), body["success"]);

    let mut conn = pool.acquire().await?;
    let coupon = CouponsRepo::fetch_by_code(&mut conn, &"LAUNCH50".parse().unwrap())
        .await?
        .expect("Coupon not stored");
    assert_eq!(dec!(50), coupon.discount_value);
    assert_eq!(Some(100), coupon.max_uses);
    assert!(coupon.is_active);

    Ok(())
}

#[sqlx::test(migrations = "../migrations")]
async fn duplicate_coupon_codes_are_declined(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    let admin = TestUser::register(&pool, "admin@test.com", "password", Role::Admin).await;
    seed_coupon(
        &pool,
        &coupon_payload("LAUNCH50", DiscountType::Percentage, dec!(50)),
    )
    .await;

    let res = app
        .create_coupon(
            Some(&admin.credentials()),
            &json!({
                "code": "LAUNCH50",
                "discount_type": "FIXED",
                "discount_value": "5",
            }),
        )
        .await
        .expect("Failed to execute request");

    let body = response_json(res).await;
    assert_eq!(json!(false), body["success"]);
    assert_eq!(json!("DUPLICATE_CODE"), body["code"]);

    Ok(())
}

#[sqlx::test(migrations = "../migrations")]
async fn coupon_creation_requires_the_admin_role(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    let student = TestUser::register(&pool, "student@test.com", "password", Role::User).await;

    let res = app
        .create_coupon(
            Some(&student.credentials()),
            &json!({
                "code": "SNEAKY",
                "discount_type": "PERCENTAGE",
                "discount_value": "100",
            }),
        )
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::FORBIDDEN, res.status());

    Ok(())
}

#[sqlx::test(migrations = "../migrations")]
async fn toggled_off_coupon_stops_validating(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    let admin = TestUser::register(&pool, "admin@test.com", "password", Role::Admin).await;
    let student = TestUser::register(&pool, "student@test.com", "password", Role::User).await;
    let course_id = seed_course(&pool, dec!(49.99), None).await;
    let coupon_id = seed_coupon(
        &pool,
        &coupon_payload("WELCOME20", DiscountType::Percentage, dec!(20)),
    )
    .await;

    let res = app
        .authorized_request(
            reqwest::Method::POST,
            &format!("admin/coupons/{}/toggle", coupon_id),
            Some(&admin.credentials()),
        )
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(json!(true), response_json(res).await["success"]);

    let res = app
        .validate_coupon(
            Some(&student.credentials()),
            &json!({ "code": "WELCOME20", "course_id": course_id }),
        )
        .await
        .expect("Failed to execute request");

    let body = response_json(res).await;
    assert_eq!(json!(false), body["success"]);
    assert_eq!(json!("INACTIVE"), body["code"]);

    Ok(())
}

#[sqlx::test(migrations = "../migrations")]
async fn redeemed_coupon_can_still_be_deleted(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    let admin = TestUser::register(&pool, "admin@test.com", "password", Role::Admin).await;
    let student = TestUser::register(&pool, "student@test.com", "password", Role::User).await;
    let course_id = seed_course(&pool, dec!(10.00), None).await;
    let coupon_id = seed_coupon(
        &pool,
        &coupon_payload("FULLRIDE", DiscountType::Fixed, dec!(10.00)),
    )
    .await;

    // Consume a use; the payment row now references the coupon.
    let res = app
        .enroll_free(
            Some(&student.credentials()),
            &json!({ "course_id": course_id, "coupon_code": "FULLRIDE" }),
        )
        .await
        .expect("Failed to execute request");
    assert_eq!(json!(true), response_json(res).await["success"]);

    let res = app
        .authorized_request(
            reqwest::Method::DELETE,
            &format!("admin/coupons/{}", coupon_id),
            Some(&admin.credentials()),
        )
        .send()
        .await
        .expect("Failed to execute request");

    assert!(res.status().is_success());
    assert_eq!(json!(true), response_json(res).await["success"]);

    // The audit row outlives the coupon, with its reference cleared.
    let row: (Option<Uuid>,) =
        sqlx::query_as("select coupon_id from payments where student_id=$1")
            .bind(student.id)
            .fetch_one(&pool)
            .await?;
    assert_eq!(None, row.0);

    Ok(())
}

#[sqlx::test(migrations = "../migrations")]
async fn admin_can_delete_a_coupon(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    let admin = TestUser::register(&pool, "admin@test.com", "password", Role::Admin).await;
    let coupon_id = seed_coupon(
        &pool,
        &coupon_payload("SHORTLIVED", DiscountType::Fixed, dec!(5.00)),
    )
    .await;

    let res = app
        .authorized_request(
            reqwest::Method::DELETE,
            &format!("admin/coupons/{}", coupon_id),
            Some(&admin.credentials()),
        )
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(json!(true), response_json(res).await["success"]);

    let mut conn = pool.acquire().await?;
    assert!(
        CouponsRepo::fetch_by_code(&mut conn, &"SHORTLIVED".parse().unwrap())
            .await?
            .is_none()
    );

    Ok(())
}
