use tracing::info;

use todolist_core::{format_timestamp, new_id, now_utc};
use todolist_sql::{Row, Value};

use crate::model::{SignUp, User};
use crate::service::password::hash_password;
use crate::service::{row_timestamp, AuthError, AuthService};

const NAME_MAX: usize = 100;
const PASSWORD_MIN: usize = 8;

/// Emails compare case-insensitively; store them normalized.
pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validate_sign_up(input: &SignUp) -> Result<(), AuthError> {
    let name = input.name.trim();
    if name.is_empty() {
        return Err(AuthError::Validation("Name is required".into()));
    }
    if name.chars().count() > NAME_MAX {
        return Err(AuthError::Validation(format!(
            "Name must be {NAME_MAX} characters or less"
        )));
    }
    let email = normalize_email(&input.email);
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {}
        _ => return Err(AuthError::Validation("Email must be a valid address".into())),
    }
    if input.password.chars().count() < PASSWORD_MIN {
        return Err(AuthError::Validation(format!(
            "Password must be at least {PASSWORD_MIN} characters"
        )));
    }
    Ok(())
}

fn row_to_user(row: &Row) -> Result<User, AuthError> {
    Ok(User {
        id: row.require_str("id")?.to_string(),
        name: row.require_str("name")?.to_string(),
        email: row.require_str("email")?.to_string(),
        created_at: row_timestamp(row, "created_at")?,
        updated_at: row_timestamp(row, "updated_at")?,
    })
}

impl AuthService {
    /// Register a new account.
    pub fn sign_up(&self, input: SignUp) -> Result<User, AuthError> {
        validate_sign_up(&input)?;

        let now = now_utc();
        let user = User {
            id: new_id(),
            name: input.name.trim().to_string(),
            email: normalize_email(&input.email),
            created_at: now,
            updated_at: now,
        };
        let password_hash = hash_password(&input.password)?;

        self.sql
            .exec(
                "INSERT INTO users (id, name, email, password_hash, created_at, updated_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                &[
                    Value::Text(user.id.clone()),
                    Value::Text(user.name.clone()),
                    Value::Text(user.email.clone()),
                    Value::Text(password_hash),
                    Value::Text(format_timestamp(&now)),
                    Value::Text(format_timestamp(&now)),
                ],
            )
            .map_err(|e| match AuthError::from(e) {
                AuthError::Conflict(_) => AuthError::Conflict("email already registered".into()),
                other => other,
            })?;

        info!(user_id = %user.id, "user signed up");
        Ok(user)
    }

    /// Get a user by id.
    #[cfg(test)]
    pub(crate) fn get_user(&self, id: &str) -> Result<User, AuthError> {
        self.find_user(id)?
            .ok_or_else(|| AuthError::NotFound(format!("user {id}")))
    }

    pub(crate) fn find_user(&self, id: &str) -> Result<Option<User>, AuthError> {
        let rows = self.sql.query(
            "SELECT id, name, email, created_at, updated_at FROM users WHERE id = ?1",
            &[Value::Text(id.to_string())],
        )?;
        rows.first().map(row_to_user).transpose()
    }

    /// Look up a user and their password hash by email.
    pub(crate) fn find_credentials(&self, email: &str) -> Result<Option<(User, String)>, AuthError> {
        let rows = self.sql.query(
            "SELECT id, name, email, password_hash, created_at, updated_at \
             FROM users WHERE email = ?1",
            &[Value::Text(normalize_email(email))],
        )?;
        match rows.first() {
            Some(row) => {
                let user = row_to_user(row)?;
                let hash = row.require_str("password_hash")?.to_string();
                Ok(Some((user, hash)))
            }
            None => Ok(None),
        }
    }

    /// Delete a user. Sessions (and rows other modules own through a
    /// foreign key to `users`) go with it.
    #[cfg(test)]
    pub(crate) fn delete_user(&self, id: &str) -> Result<(), AuthError> {
        let affected = self
            .sql
            .exec("DELETE FROM users WHERE id = ?1", &[Value::Text(id.to_string())])?;
        if affected == 0 {
            return Err(AuthError::NotFound(format!("user {id}")));
        }
        info!(user_id = %id, "user deleted");
        Ok(())
    }
}
