use std::str::FromStr;

use super::hasher::MAX_PASSWORD_BYTES;
use super::types::{Gender, LoginRequest, RegisterRequest};
use crate::shared::AppError;

const OP: &str = "auth.validate";

/// Registration input that passed shape validation; the password is still plaintext
#[derive(Debug, Clone)]
pub struct ValidRegistration {
    pub email: String,
    pub login: String,
    pub password: String,
    pub name: String,
    pub age: i32,
    pub gender: Gender,
}

/// Login input that passed shape validation
#[derive(Debug, Clone)]
pub struct ValidLogin {
    pub login: String,
    pub password: String,
}

fn required(value: Option<String>, field: &str) -> Result<String, AppError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(AppError::incorrect_data(format!("{field} is required"), OP)),
    }
}

/// Passwords are taken verbatim, so whitespace counts as content
fn required_password(value: Option<String>) -> Result<String, AppError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AppError::incorrect_data("password is required", OP)),
    }
}

pub fn validate_registration(request: RegisterRequest) -> Result<ValidRegistration, AppError> {
    let email = required(request.email, "email")?;
    let login = required(request.login, "login")?;
    let password = required_password(request.password)?;
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(AppError::incorrect_data(
            format!("password must be at most {MAX_PASSWORD_BYTES} bytes"),
            OP,
        ));
    }
    let name = required(request.name, "name")?;

    let age = match request.age {
        Some(age) if age > 0 => age,
        Some(_) => return Err(AppError::incorrect_data("age must be positive", OP)),
        None => return Err(AppError::incorrect_data("age is required", OP)),
    };

    let gender = required(request.gender, "gender")?;
    let gender = Gender::from_str(&gender).map_err(|_| {
        AppError::incorrect_data("gender must be one of Male, Female, Unknown", OP)
    })?;

    Ok(ValidRegistration {
        email: email.trim().to_string(),
        login: login.trim().to_string(),
        password,
        name: name.trim().to_string(),
        age,
        gender,
    })
}

pub fn validate_login(request: LoginRequest) -> Result<ValidLogin, AppError> {
    Ok(ValidLogin {
        login: required(request.login, "login")?.trim().to_string(),
        password: required_password(request.password)?,
    })
}
