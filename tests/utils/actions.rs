//! Request builders shared by the workflow tests
#![allow(dead_code)]

use gatekeeper::auth::types::{LoginRequest, RegisterRequest};

/// Registration input matching the canonical example user
pub fn register_request(login: &str, email: &str) -> RegisterRequest {
    RegisterRequest {
        email: Some(email.to_string()),
        login: Some(login.to_string()),
        password: Some("Aa1!aaaa".to_string()),
        name: Some("A".to_string()),
        age: Some(20),
        gender: Some("Male".to_string()),
    }
}

pub fn login_request(login: &str, password: &str) -> LoginRequest {
    LoginRequest {
        login: Some(login.to_string()),
        password: Some(password.to_string()),
    }
}
