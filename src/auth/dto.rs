use serde::{Deserialize, Serialize};

use super::role::Role;

// Request fields are optional so that absent fields reach validation
// instead of failing deserialization.

/// Request body for dummy login.
#[derive(Debug, Default, Deserialize)]
pub struct DummyLoginRequest {
    pub role: Option<String>,
}

/// Request body for user registration.
#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

/// Request body for login.
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Public part of a freshly registered user.
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisteredUser {
    pub email: String,
    pub role: Role,
}
