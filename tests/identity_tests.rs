//! End-to-end identity flows against a temp-file sqlite database.

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use orgid::config::Config;
use orgid::db::Store;
use orgid::db::migrator::{
    BOOTSTRAP_ADMIN_EMAIL, BOOTSTRAP_ADMIN_PASSWORD, BOOTSTRAP_ADMIN_USERNAME,
};
use orgid::domain::{AccountId, DepartmentId, Role};
use orgid::models::account::{
    EmployeeFields, ManagerFields, NewManagerRequest, NewProfile, Profile, RegisterRequest,
};
use orgid::services::{
    IdentityError, IdentityService, ManualClock, MemoryNotificationSender, NotificationSender,
    SeaOrmIdentityService, TokenIssuer,
};

const SECRET: &str = "integration-test-secret-0123456789abcdef";

struct Harness {
    service: SeaOrmIdentityService,
    store: Store,
    mail: MemoryNotificationSender,
    clock: ManualClock,
    tokens: Arc<TokenIssuer>,
}

fn test_config() -> Config {
    let db_path =
        std::env::temp_dir().join(format!("orgid-identity-test-{}.db", uuid::Uuid::new_v4()));

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", db_path.display());
    config.security.jwt_secret = SECRET.to_string();
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;
    config
}

async fn harness_with(config: Config, mail: MemoryNotificationSender) -> Harness {
    let store = Store::new(&config.general.database_path)
        .await
        .expect("failed to open store");

    let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap());
    let tokens = Arc::new(TokenIssuer::from_config(&config.security));
    let notifier: Arc<dyn NotificationSender> = Arc::new(mail.clone());

    let service = SeaOrmIdentityService::new(
        store.clone(),
        &config,
        tokens.clone(),
        notifier,
        Arc::new(clock.clone()),
    )
    .expect("failed to build identity service");

    Harness {
        service,
        store,
        mail,
        clock,
        tokens,
    }
}

async fn harness() -> Harness {
    harness_with(test_config(), MemoryNotificationSender::new()).await
}

fn manager_request(username: &str, email: &str, department_id: i32) -> RegisterRequest {
    RegisterRequest {
        username: username.to_string(),
        email: email.to_string(),
        password: "manager-pass".to_string(),
        role: Role::Manager,
        profile: NewProfile::Manager(ManagerFields {
            department_id: DepartmentId(department_id),
            name: format!("{username} Manager"),
            salary: 5000,
            age: 45,
            phone: "555-0100".to_string(),
            address: "1 Head Office".to_string(),
        }),
    }
}

fn employee_request(username: &str, email: &str, manager_id: AccountId) -> RegisterRequest {
    RegisterRequest {
        username: username.to_string(),
        email: email.to_string(),
        password: "alice-pass".to_string(),
        role: Role::Employee,
        profile: NewProfile::Employee(EmployeeFields {
            manager_id,
            name: format!("{username} Employee"),
            salary: 3000,
            age: 29,
            phone: "555-0101".to_string(),
            address: "2 Side Street".to_string(),
            designation: "Engineer".to_string(),
        }),
    }
}

/// Department plus an appointed manager for it.
async fn seed_manager(h: &Harness, username: &str) -> AccountId {
    let department = h
        .store
        .create_department(&format!("{username} dept"))
        .await
        .unwrap();

    h.service
        .register(manager_request(
            username,
            &format!("{username}@corp.com"),
            department.id,
        ))
        .await
        .unwrap()
        .id
}

async fn seed_alice(h: &Harness) -> AccountId {
    let manager = seed_manager(h, "boss").await;
    h.service
        .register(employee_request("alice", "alice@x.com", manager))
        .await
        .unwrap()
        .id
}

async fn stored_code(h: &Harness, email: &str) -> Option<String> {
    h.store.get_user_by_email(email).await.unwrap().unwrap().otp
}

// ============================================================================
// Registration
// ============================================================================

#[tokio::test]
async fn register_employee_then_login() {
    let h = harness().await;
    let alice = seed_alice(&h).await;

    let login = h.service.login("alice", "alice-pass").await.unwrap();
    assert!(!login.token.is_empty());
    assert_eq!(login.id, alice);
    assert_eq!(login.role, Role::Employee);
    assert_eq!(login.expires_in_secs, 24 * 60 * 60);

    let claims = h.tokens.validate(&login.token).unwrap();
    assert_eq!(claims.account_id().unwrap(), alice);
    assert_eq!(claims.name, "alice");

    assert!(matches!(
        h.service.login("alice", "wrong-pass").await,
        Err(IdentityError::InvalidCredential)
    ));
    assert!(matches!(
        h.service.login("nobody", "alice-pass").await,
        Err(IdentityError::NotFound(_))
    ));
}

#[tokio::test]
async fn registration_sends_welcome_without_password() {
    let h = harness().await;
    seed_alice(&h).await;

    let welcome = h.mail.last_to("alice@x.com").expect("welcome mail");
    assert!(welcome.subject.contains("Employee Registration"));
    assert!(welcome.body.contains("alice"));
    assert!(!welcome.body.contains("alice-pass"));
}

#[tokio::test]
async fn registered_account_is_verified_and_profiled() {
    let h = harness().await;
    let alice = seed_alice(&h).await;

    let info = h.service.get_account(alice).await.unwrap();
    assert!(info.is_verified);
    assert_eq!(info.email, "alice@x.com");
    match info.profile {
        Some(Profile::Employee(profile)) => {
            assert_eq!(profile.designation, "Engineer");
        }
        other => panic!("unexpected profile: {other:?}"),
    }
}

#[tokio::test]
async fn duplicate_username_in_any_case_conflicts() {
    let h = harness().await;
    let manager = seed_manager(&h, "boss").await;

    h.service
        .register(employee_request("alice", "alice@x.com", manager))
        .await
        .unwrap();

    let err = h
        .service
        .register(employee_request("ALICE", "other@x.com", manager))
        .await
        .unwrap_err();
    assert!(matches!(err, IdentityError::Conflict(_)), "{err:?}");

    let err = h
        .service
        .register(employee_request("alice2", "Alice@X.com", manager))
        .await
        .unwrap_err();
    assert!(matches!(err, IdentityError::Conflict(_)), "{err:?}");

    let accounts = h.service.list_accounts().await.unwrap();
    let alices = accounts
        .iter()
        .filter(|a| {
            a.username.eq_ignore_ascii_case("alice") || a.email.eq_ignore_ascii_case("alice@x.com")
        })
        .count();
    assert_eq!(alices, 1);
}

#[tokio::test]
async fn second_manager_for_department_conflicts_without_account() {
    let h = harness().await;
    let department = h.store.create_department("Sales").await.unwrap();

    h.service
        .register(manager_request("first", "first@corp.com", department.id))
        .await
        .unwrap();

    let err = h
        .service
        .register(manager_request("second", "second@corp.com", department.id))
        .await
        .unwrap_err();
    assert!(matches!(err, IdentityError::Conflict(_)), "{err:?}");

    assert!(h.store.get_user_by_username("second").await.unwrap().is_none());
}

#[tokio::test]
async fn missing_references_leave_no_account() {
    let h = harness().await;

    let err = h
        .service
        .register(employee_request("orphan", "orphan@x.com", AccountId::new(999)))
        .await
        .unwrap_err();
    assert!(matches!(err, IdentityError::NotFound(_)), "{err:?}");

    let err = h
        .service
        .register(manager_request("nodept", "nodept@x.com", 999))
        .await
        .unwrap_err();
    assert!(matches!(err, IdentityError::NotFound(_)), "{err:?}");

    assert!(h.store.get_user_by_username("orphan").await.unwrap().is_none());
    assert!(h.store.get_user_by_username("nodept").await.unwrap().is_none());
}

#[tokio::test]
async fn malformed_registrations_are_rejected() {
    let h = harness().await;
    let manager = seed_manager(&h, "boss").await;

    let bad_email = employee_request("bob", "not-an-email", manager);
    let mut short_password = employee_request("bob", "bob@x.com", manager);
    short_password.password = "123".to_string();
    let mut admin = employee_request("bob", "bob@x.com", manager);
    admin.role = Role::Admin;
    let mut mismatched = employee_request("bob", "bob@x.com", manager);
    mismatched.role = Role::Manager;
    let empty_username = employee_request("  ", "bob@x.com", manager);

    for request in [bad_email, short_password, admin, mismatched, empty_username] {
        let err = h.service.register(request).await.unwrap_err();
        assert!(matches!(err, IdentityError::Validation(_)), "{err:?}");
    }

    assert!(h.store.get_user_by_username("bob").await.unwrap().is_none());
}

#[tokio::test]
async fn racing_registrations_have_one_winner() {
    let h = harness().await;
    let manager = seed_manager(&h, "boss").await;

    let (a, b) = tokio::join!(
        h.service
            .register(employee_request("racer", "racer-a@x.com", manager)),
        h.service
            .register(employee_request("Racer", "racer-b@x.com", manager)),
    );

    let outcomes = [a, b];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(
        outcomes
            .iter()
            .any(|r| matches!(r, Err(IdentityError::Conflict(_))))
    );
}

#[tokio::test]
async fn notification_failure_does_not_fail_registration() {
    let h = harness_with(test_config(), MemoryNotificationSender::failing()).await;
    let alice = seed_alice(&h).await;

    assert!(h.service.get_account(alice).await.is_ok());
    assert!(h.mail.last_to("alice@x.com").is_some());
}

// ============================================================================
// Codes and password reset
// ============================================================================

#[tokio::test]
async fn forgot_password_then_verify_consumes_code_once() {
    let h = harness().await;
    seed_alice(&h).await;

    h.service.forgot_password("alice@x.com").await.unwrap();

    let row = h.store.get_user_by_email("alice@x.com").await.unwrap().unwrap();
    let code = row.otp.clone().expect("code stored");
    assert_eq!(code.len(), 6);
    assert!(!row.is_verified);
    assert_eq!(row.otp_expires_at, Some(h.clock_now() + Duration::minutes(3)));

    let mail = h.mail.last_to("alice@x.com").unwrap();
    assert!(mail.subject.contains("Password Reset"));
    assert!(mail.body.contains(&code));

    h.clock.advance(Duration::minutes(2));
    h.service.verify("alice@x.com", &code).await.unwrap();

    let row = h.store.get_user_by_email("alice@x.com").await.unwrap().unwrap();
    assert!(row.otp.is_none());
    assert!(row.is_verified);

    assert!(matches!(
        h.service.verify("alice@x.com", &code).await,
        Err(IdentityError::InvalidCode)
    ));
}

#[tokio::test]
async fn correct_code_after_expiry_is_rejected() {
    let h = harness().await;
    seed_alice(&h).await;

    h.service.forgot_password("alice@x.com").await.unwrap();
    let code = stored_code(&h, "alice@x.com").await.unwrap();

    h.clock.advance(Duration::minutes(3) + Duration::seconds(1));
    assert!(matches!(
        h.service.verify("alice@x.com", &code).await,
        Err(IdentityError::Expired)
    ));

    let row = h.store.get_user_by_email("alice@x.com").await.unwrap().unwrap();
    assert!(!row.is_verified);
    assert_eq!(row.otp.as_deref(), Some(code.as_str()));
}

#[tokio::test]
async fn wrong_code_leaves_state_untouched() {
    let h = harness().await;
    seed_alice(&h).await;

    h.service.forgot_password("alice@x.com").await.unwrap();
    let code = stored_code(&h, "alice@x.com").await.unwrap();
    let wrong = if code == "000000" { "111111" } else { "000000" };

    assert!(matches!(
        h.service.verify("alice@x.com", wrong).await,
        Err(IdentityError::InvalidCode)
    ));
    assert_eq!(stored_code(&h, "alice@x.com").await, Some(code.clone()));

    h.service.verify("alice@x.com", &code).await.unwrap();
}

#[tokio::test]
async fn resend_ceiling_blocks_resend_and_verify() {
    let h = harness().await;
    seed_alice(&h).await;

    h.service.forgot_password("alice@x.com").await.unwrap();
    for _ in 0..3 {
        h.service.resend_otp("alice@x.com").await.unwrap();
    }

    let row = h.store.get_user_by_email("alice@x.com").await.unwrap().unwrap();
    assert_eq!(row.otp_resend_count, 3);
    let code = row.otp.unwrap();

    assert!(matches!(
        h.service.resend_otp("alice@x.com").await,
        Err(IdentityError::ResendLimitExceeded)
    ));
    assert!(matches!(
        h.service.verify("alice@x.com", &code).await,
        Err(IdentityError::ResendLimitExceeded)
    ));
}

#[tokio::test]
async fn forgot_password_starts_a_fresh_resend_cycle() {
    let h = harness().await;
    seed_alice(&h).await;

    h.service.forgot_password("alice@x.com").await.unwrap();
    for _ in 0..3 {
        h.service.resend_otp("alice@x.com").await.unwrap();
    }

    h.service.forgot_password("alice@x.com").await.unwrap();
    let row = h.store.get_user_by_email("alice@x.com").await.unwrap().unwrap();
    assert_eq!(row.otp_resend_count, 0);

    h.service
        .verify("alice@x.com", &row.otp.unwrap())
        .await
        .unwrap();
}

#[tokio::test]
async fn resend_extends_window_and_mails_new_code() {
    let h = harness().await;
    seed_alice(&h).await;

    h.service.forgot_password("alice@x.com").await.unwrap();
    h.clock.advance(Duration::minutes(10));

    h.service.resend_otp("alice@x.com").await.unwrap();
    let row = h.store.get_user_by_email("alice@x.com").await.unwrap().unwrap();
    assert_eq!(row.otp_expires_at, Some(h.clock_now() + Duration::minutes(3)));
    assert_eq!(row.otp_resend_count, 1);

    let code = row.otp.unwrap();
    let mail = h.mail.last_to("alice@x.com").unwrap();
    assert!(mail.body.contains(&code));

    h.service.verify("alice@x.com", &code).await.unwrap();
}

#[tokio::test]
async fn code_flows_validate_email() {
    let h = harness().await;

    assert!(matches!(
        h.service.forgot_password("bogus").await,
        Err(IdentityError::Validation(_))
    ));
    assert!(matches!(
        h.service.forgot_password("ghost@x.com").await,
        Err(IdentityError::NotFound(_))
    ));
    assert!(matches!(
        h.service.resend_otp("ghost@x.com").await,
        Err(IdentityError::NotFound(_))
    ));
    assert!(matches!(
        h.service.verify("bogus", "123456").await,
        Err(IdentityError::Validation(_))
    ));
}

#[tokio::test]
async fn reset_requires_verification_then_replaces_password() {
    let h = harness().await;
    seed_alice(&h).await;

    h.service.forgot_password("alice@x.com").await.unwrap();
    assert!(matches!(
        h.service
            .reset_password(Some("alice@x.com"), "brand-new-pass")
            .await,
        Err(IdentityError::Unverified)
    ));

    let code = stored_code(&h, "alice@x.com").await.unwrap();
    h.service.verify("alice@x.com", &code).await.unwrap();
    h.clock.advance(Duration::minutes(1));

    h.service
        .reset_password(Some("alice@x.com"), "brand-new-pass")
        .await
        .unwrap();

    assert!(matches!(
        h.service.login("alice", "alice-pass").await,
        Err(IdentityError::InvalidCredential)
    ));
    assert!(h.service.login("alice", "brand-new-pass").await.is_ok());

    let row = h.store.get_user_by_email("alice@x.com").await.unwrap().unwrap();
    assert!(row.otp.is_none());
    assert!(row.otp_expires_at.is_none());

    // Window is closed once used.
    assert!(matches!(
        h.service
            .reset_password(Some("alice@x.com"), "another-pass")
            .await,
        Err(IdentityError::Expired)
    ));
}

#[tokio::test]
async fn reset_after_window_lapses_is_expired() {
    let h = harness().await;
    seed_alice(&h).await;

    // Verified at registration but no window was ever opened.
    assert!(matches!(
        h.service
            .reset_password(Some("alice@x.com"), "brand-new-pass")
            .await,
        Err(IdentityError::Expired)
    ));

    h.service.forgot_password("alice@x.com").await.unwrap();
    let code = stored_code(&h, "alice@x.com").await.unwrap();
    h.service.verify("alice@x.com", &code).await.unwrap();

    h.clock.advance(Duration::minutes(5));
    assert!(matches!(
        h.service
            .reset_password(Some("alice@x.com"), "brand-new-pass")
            .await,
        Err(IdentityError::Expired)
    ));
    assert!(h.service.login("alice", "alice-pass").await.is_ok());
}

#[tokio::test]
async fn reset_input_validation() {
    let h = harness().await;
    seed_alice(&h).await;

    assert!(matches!(
        h.service.reset_password(None, "brand-new-pass").await,
        Err(IdentityError::Validation(_))
    ));
    assert!(matches!(
        h.service.reset_password(Some("  "), "brand-new-pass").await,
        Err(IdentityError::Validation(_))
    ));
    assert!(matches!(
        h.service.reset_password(Some("alice@x.com"), "123").await,
        Err(IdentityError::Validation(_))
    ));
    assert!(matches!(
        h.service
            .reset_password(Some("ghost@x.com"), "brand-new-pass")
            .await,
        Err(IdentityError::NotFound(_))
    ));
}

// ============================================================================
// Deletion and appointment
// ============================================================================

#[tokio::test]
async fn deleting_employee_removes_account_and_profile() {
    let h = harness().await;
    let alice = seed_alice(&h).await;

    h.service.delete_account(alice).await.unwrap();

    assert!(h.store.get_user_by_id(alice.value()).await.unwrap().is_none());
    assert!(h.store.get_employee(alice.value()).await.unwrap().is_none());
    assert!(matches!(
        h.service.delete_account(alice).await,
        Err(IdentityError::NotFound(_))
    ));
}

#[tokio::test]
async fn deleting_manager_vacates_slot_and_hides_login() {
    let h = harness().await;
    let manager = seed_manager(&h, "boss").await;
    assert!(h.service.login("boss", "manager-pass").await.is_ok());

    h.service.delete_account(manager).await.unwrap();

    assert!(h.store.get_user_by_id(manager.value()).await.unwrap().is_some());
    let profile = h.store.get_manager(manager.value()).await.unwrap().unwrap();
    assert!(!profile.is_appointed);

    let vacant = h.service.login("boss", "manager-pass").await.unwrap_err();
    let missing = h.service.login("nobody", "manager-pass").await.unwrap_err();
    assert!(matches!(vacant, IdentityError::NotFound(_)));
    assert_eq!(vacant.to_string(), missing.to_string());
}

#[tokio::test]
async fn admin_cannot_be_deleted() {
    let h = harness().await;
    let admin = h
        .store
        .get_user_by_username(BOOTSTRAP_ADMIN_USERNAME)
        .await
        .unwrap()
        .unwrap();

    assert!(matches!(
        h.service.delete_account(AccountId::new(admin.id)).await,
        Err(IdentityError::Validation(_))
    ));
}

fn replacement(username: &str, email: &str) -> NewManagerRequest {
    NewManagerRequest {
        username: username.to_string(),
        email: email.to_string(),
        password: "fresh-manager-pass".to_string(),
        name: "Replacement".to_string(),
        salary: 6000,
        age: 40,
        phone: "555-0199".to_string(),
        address: "3 New Road".to_string(),
    }
}

#[tokio::test]
async fn appointing_new_manager_reuses_account_id() {
    let h = harness().await;
    let manager = seed_manager(&h, "boss").await;
    let alice = h
        .service
        .register(employee_request("alice", "alice@x.com", manager))
        .await
        .unwrap()
        .id;

    h.service.delete_account(manager).await.unwrap();

    let info = h
        .service
        .appoint_new_manager(manager, replacement("newboss", "newboss@corp.com"))
        .await
        .unwrap();

    assert_eq!(info.id, manager);
    assert_eq!(info.username, "newboss");
    assert!(info.is_verified);
    match info.profile {
        Some(Profile::Manager(profile)) => {
            assert!(profile.is_appointed);
            assert_eq!(profile.name, "Replacement");
        }
        other => panic!("unexpected profile: {other:?}"),
    }

    let login = h
        .service
        .login("newboss", "fresh-manager-pass")
        .await
        .unwrap();
    assert_eq!(login.id, manager);
    assert!(matches!(
        h.service.login("boss", "manager-pass").await,
        Err(IdentityError::NotFound(_))
    ));

    let employee = h.store.get_employee(alice.value()).await.unwrap().unwrap();
    assert_eq!(employee.manager_id, manager.value());

    let mail = h.mail.last_to("newboss@corp.com").expect("appointment mail");
    assert!(mail.subject.contains("Manager Appointment"));
    assert!(!mail.body.contains("fresh-manager-pass"));
}

#[tokio::test]
async fn appointment_guards() {
    let h = harness().await;
    let manager = seed_manager(&h, "boss").await;
    let alice = h
        .service
        .register(employee_request("alice", "alice@x.com", manager))
        .await
        .unwrap()
        .id;

    assert!(matches!(
        h.service
            .appoint_new_manager(AccountId::new(999), replacement("x", "x@corp.com"))
            .await,
        Err(IdentityError::NotFound(_))
    ));
    assert!(matches!(
        h.service
            .appoint_new_manager(alice, replacement("x", "x@corp.com"))
            .await,
        Err(IdentityError::NotFound(_))
    ));
    assert!(matches!(
        h.service
            .appoint_new_manager(manager, replacement("x", "broken"))
            .await,
        Err(IdentityError::Validation(_))
    ));
    assert!(matches!(
        h.service
            .appoint_new_manager(manager, replacement("Alice", "x@corp.com"))
            .await,
        Err(IdentityError::Conflict(_))
    ));

    // Keeping its own username is not a conflict.
    h.service
        .appoint_new_manager(manager, replacement("boss", "boss2@corp.com"))
        .await
        .unwrap();
}

// ============================================================================
// Accessors and policy switches
// ============================================================================

#[tokio::test]
async fn bootstrap_admin_can_log_in() {
    let h = harness().await;

    let login = h
        .service
        .login(BOOTSTRAP_ADMIN_USERNAME, BOOTSTRAP_ADMIN_PASSWORD)
        .await
        .unwrap();
    assert_eq!(login.role, Role::Admin);

    let accounts = h.service.list_accounts().await.unwrap();
    assert_eq!(accounts.len(), 1);
    assert!(accounts[0].profile.is_none());
}

#[tokio::test]
async fn bootstrap_admin_can_reset_default_password() {
    let h = harness().await;

    h.service
        .forgot_password(BOOTSTRAP_ADMIN_EMAIL)
        .await
        .unwrap();
    let code = stored_code(&h, BOOTSTRAP_ADMIN_EMAIL).await.unwrap();
    assert!(h.mail.last_to(BOOTSTRAP_ADMIN_EMAIL).unwrap().body.contains(&code));

    h.service.verify(BOOTSTRAP_ADMIN_EMAIL, &code).await.unwrap();
    h.service
        .reset_password(Some(BOOTSTRAP_ADMIN_EMAIL), "admin-rotated-pass")
        .await
        .unwrap();

    assert!(matches!(
        h.service
            .login(BOOTSTRAP_ADMIN_USERNAME, BOOTSTRAP_ADMIN_PASSWORD)
            .await,
        Err(IdentityError::InvalidCredential)
    ));
    let login = h
        .service
        .login(BOOTSTRAP_ADMIN_USERNAME, "admin-rotated-pass")
        .await
        .unwrap();
    assert_eq!(login.role, Role::Admin);
}

#[tokio::test]
async fn account_view_serializes_without_secrets() {
    let h = harness().await;
    let alice = seed_alice(&h).await;

    let info = h.service.get_account(alice).await.unwrap();
    let json = serde_json::to_value(&info).unwrap();

    assert_eq!(json["username"], "alice");
    assert_eq!(json["role"], "Employee");
    assert!(json.get("password_hash").is_none());
    assert!(json.get("otp").is_none());

    assert!(matches!(
        h.service.get_account(AccountId::new(999)).await,
        Err(IdentityError::NotFound(_))
    ));
}

#[tokio::test]
async fn required_email_verification_gates_login() {
    let mut config = test_config();
    config.otp.require_email_verification = true;
    let h = harness_with(config, MemoryNotificationSender::new()).await;

    let alice = seed_alice(&h).await;
    let row = h.store.get_user_by_id(alice.value()).await.unwrap().unwrap();
    assert!(!row.is_verified);
    assert_eq!(row.otp_expires_at, Some(h.clock_now() + Duration::minutes(2)));
    let code = row.otp.unwrap();

    let welcome = h.mail.last_to("alice@x.com").unwrap();
    assert!(welcome.body.contains(&code));

    assert!(matches!(
        h.service.login("alice", "alice-pass").await,
        Err(IdentityError::Unverified)
    ));

    h.service.verify("alice@x.com", &code).await.unwrap();
    assert!(h.service.login("alice", "alice-pass").await.is_ok());
}

impl Harness {
    fn clock_now(&self) -> chrono::DateTime<Utc> {
        use orgid::services::Clock;
        self.clock.now()
    }
}
