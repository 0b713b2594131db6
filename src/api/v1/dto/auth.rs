/*
 * Responsibility
 * - Signup / signin request and token response DTOs
 * - Field names follow the public JSON contract (camelCase)
 */
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    // Parsed case-insensitively into `Role` by the handler.
    pub user_role: String,
}

#[derive(Debug, Deserialize)]
pub struct SigninRequest {
    pub email: String,
    pub password: String,
}

impl SignupRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        validate_credentials(&self.email, &self.password)
    }
}

impl SigninRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        validate_credentials(&self.email, &self.password)
    }
}

fn validate_credentials(email: &str, password: &str) -> Result<(), &'static str> {
    if email.trim().is_empty() || !email.contains('@') {
        return Err("email must be a valid address");
    }
    if password.is_empty() {
        return Err("password is required");
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    /// `"Bearer <jwt>"`, ready to be sent back as the Authorization header.
    pub bearer_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signup_reads_camel_case_role() {
        let req: SignupRequest = serde_json::from_str(
            r#"{"email":"asd@asd.com","password":"pass","userRole":"admin"}"#,
        )
        .unwrap();
        assert_eq!(req.user_role, "admin");
        assert!(req.validate().is_ok());
    }

    #[test]
    fn rejects_blank_credentials() {
        let req = SigninRequest {
            email: "not-an-email".to_string(),
            password: "pass".to_string(),
        };
        assert!(req.validate().is_err());

        let req = SigninRequest {
            email: "asd@asd.com".to_string(),
            password: String::new(),
        };
        assert_eq!(req.validate(), Err("password is required"));
    }

    #[test]
    fn token_response_uses_bearer_token_key() {
        let body = serde_json::to_value(TokenResponse {
            bearer_token: "Bearer abc".to_string(),
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({ "bearerToken": "Bearer abc" }));
    }
}
