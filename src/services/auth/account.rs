use tracing::{error, info, warn};

use crate::error::AppError;
use crate::repos::user_repo::{UserRow, UserStore};
use crate::services::auth::{password, role::Role, token_codec::TokenCodec};

/// Register a user and return their bearer credential.
pub async fn signup(
    users: &dyn UserStore,
    codec: &TokenCodec,
    email: &str,
    plain_password: &str,
    role: Role,
) -> Result<String, AppError> {
    let row = users.create(email, &password::hash(plain_password), role).await?;
    info!(user_id = row.id, role = %row.role, "user signed up");
    issue_for(codec, &row)
}

/// Check credentials and return a fresh bearer credential.
pub async fn signin(
    users: &dyn UserStore,
    codec: &TokenCodec,
    email: &str,
    plain_password: &str,
) -> Result<String, AppError> {
    let row = users
        .find_by_email(email)
        .await
        .ok_or_else(|| AppError::bad_request("UNKNOWN_USER", "user is not registered"))?;

    if !password::verify(plain_password, &row.password_hash) {
        warn!(user_id = row.id, "signin with wrong password");
        return Err(AppError::Unauthenticated);
    }

    issue_for(codec, &row)
}

/// Replace the caller's password after checking the current one.
///
/// The new password must differ from the stored one; that is checked first.
pub async fn change_password(
    users: &dyn UserStore,
    user_id: i64,
    old_password: &str,
    new_password: &str,
) -> Result<(), AppError> {
    let row = users
        .get(user_id)
        .await
        .ok_or(AppError::not_found("user"))?;

    if password::verify(new_password, &row.password_hash) {
        return Err(AppError::bad_request(
            "SAME_PASSWORD",
            "new password must differ from the current one",
        ));
    }
    if !password::verify(old_password, &row.password_hash) {
        warn!(user_id, "password change with wrong current password");
        return Err(AppError::bad_request("WRONG_PASSWORD", "current password is wrong"));
    }

    users
        .update_password(user_id, &password::hash(new_password))
        .await
        .ok_or(AppError::not_found("user"))?;
    info!(user_id, "password changed");
    Ok(())
}

fn issue_for(codec: &TokenCodec, row: &UserRow) -> Result<String, AppError> {
    codec.issue(row.id, &row.email, row.role).map_err(|e| {
        error!(error = %e, user_id = row.id, "failed to issue access token");
        AppError::Internal
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repos::user_repo::InMemoryUserStore;

    fn codec() -> TokenCodec {
        TokenCodec::new(b"account-test-secret-account-test-secret", 3600)
    }

    #[tokio::test]
    async fn signup_issues_token_for_new_user() {
        let users = InMemoryUserStore::new();
        let codec = codec();

        let token = signup(&users, &codec, "asd@asd.com", "pass", Role::User)
            .await
            .unwrap();

        let verified = codec.verify(&token).unwrap();
        assert_eq!(verified.user_id, 1);
        assert_eq!(verified.email, "asd@asd.com");
        assert_eq!(verified.role, Role::User);
    }

    #[tokio::test]
    async fn signup_rejects_existing_email() {
        let users = InMemoryUserStore::new();
        let codec = codec();
        signup(&users, &codec, "asd@asd.com", "pass", Role::User)
            .await
            .unwrap();

        let err = signup(&users, &codec, "asd@asd.com", "pass", Role::Admin)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest { code: "EMAIL_TAKEN", .. }));
    }

    #[tokio::test]
    async fn signin_checks_user_and_password() {
        let users = InMemoryUserStore::new();
        let codec = codec();
        signup(&users, &codec, "asd@asd.com", "pass", Role::Admin)
            .await
            .unwrap();

        let token = signin(&users, &codec, "asd@asd.com", "pass").await.unwrap();
        assert_eq!(codec.verify(&token).unwrap().role, Role::Admin);

        let unknown = signin(&users, &codec, "nobody@asd.com", "pass").await.unwrap_err();
        assert!(matches!(unknown, AppError::BadRequest { code: "UNKNOWN_USER", .. }));

        let wrong = signin(&users, &codec, "asd@asd.com", "otherpass").await.unwrap_err();
        assert!(matches!(wrong, AppError::Unauthenticated));
    }

    #[tokio::test]
    async fn change_password_replaces_stored_hash() {
        let users = InMemoryUserStore::new();
        let codec = codec();
        signup(&users, &codec, "asd@asd.com", "oldPassword", Role::User)
            .await
            .unwrap();
        let before = users.get(1).await.unwrap().password_hash;

        change_password(&users, 1, "oldPassword", "newPassword")
            .await
            .unwrap();

        let after = users.get(1).await.unwrap().password_hash;
        assert_ne!(before, after);
        assert!(password::verify("newPassword", &after));
        assert!(signin(&users, &codec, "asd@asd.com", "newPassword").await.is_ok());
    }

    #[tokio::test]
    async fn change_password_rejects_reusing_current_password() {
        let users = InMemoryUserStore::new();
        signup(&users, &codec(), "asd@asd.com", "password", Role::User)
            .await
            .unwrap();

        let err = change_password(&users, 1, "password", "password")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest { code: "SAME_PASSWORD", .. }));
    }

    #[tokio::test]
    async fn change_password_rejects_wrong_current_password() {
        let users = InMemoryUserStore::new();
        signup(&users, &codec(), "asd@asd.com", "pass", Role::User)
            .await
            .unwrap();
        let before = users.get(1).await.unwrap().password_hash;

        let err = change_password(&users, 1, "password", "newPassword")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest { code: "WRONG_PASSWORD", .. }));
        assert_eq!(users.get(1).await.unwrap().password_hash, before);
    }

    #[tokio::test]
    async fn change_password_for_unknown_user_is_not_found() {
        let users = InMemoryUserStore::new();
        let err = change_password(&users, 5, "a", "b").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { resource: "user" }));
    }
}
