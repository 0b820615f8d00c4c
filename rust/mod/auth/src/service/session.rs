use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use tracing::{debug, info, warn};

use todolist_core::{format_timestamp, new_id, now_utc, AuthSession, SessionUser};
use todolist_sql::{Row, Value};

use crate::model::{Claims, ClientMeta, IssuedSession, Session, SignIn, User};
use crate::service::password::verify_password;
use crate::service::{row_timestamp, AuthError, AuthService};

/// Same message for unknown email and wrong password.
const BAD_CREDENTIALS: &str = "invalid email or password";

fn row_to_session(row: &Row) -> Result<Session, AuthError> {
    Ok(Session {
        id: row.require_str("id")?.to_string(),
        user_id: row.require_str("user_id")?.to_string(),
        created_at: row_timestamp(row, "created_at")?,
        expires_at: row_timestamp(row, "expires_at")?,
        revoked: row.get_bool("revoked").unwrap_or(false),
        user_agent: row.get_str("user_agent").map(str::to_string),
        ip_address: row.get_str("ip_address").map(str::to_string),
    })
}

impl AuthService {
    /// Check credentials and open a new session.
    pub fn sign_in(&self, input: SignIn, meta: ClientMeta) -> Result<IssuedSession, AuthError> {
        let Some((user, hash)) = self.find_credentials(&input.email)? else {
            // Pay the same hashing cost as a wrong password.
            verify_password(&input.password, &self.dummy_hash);
            warn!("sign-in for unknown email");
            return Err(AuthError::Unauthorized(BAD_CREDENTIALS.into()));
        };
        if !verify_password(&input.password, &hash) {
            warn!(user_id = %user.id, "sign-in with wrong password");
            return Err(AuthError::Unauthorized(BAD_CREDENTIALS.into()));
        }

        self.purge_expired_sessions(&user.id)?;
        let issued = self.issue_session(&user, meta)?;
        info!(user_id = %user.id, session_id = %issued.session.id, "user signed in");
        Ok(issued)
    }

    /// Create a session row for `user` and sign the cookie token for it.
    pub fn issue_session(&self, user: &User, meta: ClientMeta) -> Result<IssuedSession, AuthError> {
        let now = now_utc();
        let expires_at = chrono::Duration::try_seconds(self.config.session_ttl)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or_else(|| {
                AuthError::Internal(format!("session ttl out of range: {}", self.config.session_ttl))
            })?;

        let session = Session {
            id: new_id(),
            user_id: user.id.clone(),
            created_at: now,
            expires_at,
            revoked: false,
            user_agent: meta.user_agent,
            ip_address: meta.ip_address,
        };

        self.sql.exec(
            "INSERT INTO sessions (id, user_id, revoked, user_agent, ip_address, created_at, expires_at) \
             VALUES (?1, ?2, 0, ?3, ?4, ?5, ?6)",
            &[
                Value::Text(session.id.clone()),
                Value::Text(session.user_id.clone()),
                Value::opt_text(session.user_agent.as_deref()),
                Value::opt_text(session.ip_address.as_deref()),
                Value::Text(format_timestamp(&session.created_at)),
                Value::Text(format_timestamp(&session.expires_at)),
            ],
        )?;

        let claims = Claims {
            sub: user.id.clone(),
            sid: session.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::Internal(format!("JWT encode failed: {e}")))?;

        Ok(IssuedSession {
            token,
            session,
            user: user.clone(),
        })
    }

    /// Resolve a session token.
    ///
    /// Bad signatures, expired tokens, and revoked, expired or orphaned
    /// session rows all give `Ok(None)`. Only store failures are errors.
    pub fn verify_token(&self, token: &str) -> Result<Option<AuthSession>, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let claims = match decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        ) {
            Ok(data) => data.claims,
            Err(e) => {
                debug!("rejected session token: {e}");
                return Ok(None);
            }
        };

        let Some(session) = self.find_session(&claims.sid)? else {
            debug!(session_id = %claims.sid, "session row missing");
            return Ok(None);
        };
        if session.revoked || session.expires_at <= now_utc() || session.user_id != claims.sub {
            debug!(session_id = %session.id, "session revoked or expired");
            return Ok(None);
        }

        // Re-read the user so renames and deletions take effect immediately.
        let Some(user) = self.find_user(&session.user_id)? else {
            return Ok(None);
        };

        Ok(Some(AuthSession {
            session_id: session.id,
            user: SessionUser::from(&user),
            expires_at: session.expires_at,
        }))
    }

    /// Revoke a session (sign out). Revoking twice is not an error.
    pub fn revoke_session(&self, session_id: &str) -> Result<(), AuthError> {
        let affected = self.sql.exec(
            "UPDATE sessions SET revoked = 1 WHERE id = ?1",
            &[Value::Text(session_id.to_string())],
        )?;
        if affected == 0 {
            return Err(AuthError::NotFound(format!("session {session_id}")));
        }
        info!(session_id = %session_id, "session revoked");
        Ok(())
    }

    /// Get a session by id.
    #[cfg(test)]
    pub(crate) fn get_session_record(&self, id: &str) -> Result<Session, AuthError> {
        self.find_session(id)?
            .ok_or_else(|| AuthError::NotFound(format!("session {id}")))
    }

    fn find_session(&self, id: &str) -> Result<Option<Session>, AuthError> {
        let rows = self.sql.query(
            "SELECT id, user_id, revoked, user_agent, ip_address, created_at, expires_at \
             FROM sessions WHERE id = ?1",
            &[Value::Text(id.to_string())],
        )?;
        rows.first().map(row_to_session).transpose()
    }

    /// Drop a user's sessions that expired or were revoked.
    fn purge_expired_sessions(&self, user_id: &str) -> Result<u64, AuthError> {
        let purged = self.sql.exec(
            "DELETE FROM sessions WHERE user_id = ?1 AND (revoked = 1 OR expires_at <= ?2)",
            &[
                Value::Text(user_id.to_string()),
                Value::Text(format_timestamp(&now_utc())),
            ],
        )?;
        if purged > 0 {
            debug!(user_id = %user_id, purged, "purged stale sessions");
        }
        Ok(purged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testing::{alice, test_service, test_service_with};
    use crate::service::AuthConfig;

    fn credentials(email: &str, password: &str) -> SignIn {
        SignIn {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn sign_in_and_verify() {
        let svc = test_service();
        let user = alice(&svc);

        let issued = svc
            .sign_in(credentials("alice@example.com", "correct horse"), ClientMeta::default())
            .unwrap();
        assert_eq!(issued.user.id, user.id);
        assert!(!issued.token.is_empty());

        let session = svc.verify_token(&issued.token).unwrap().unwrap();
        assert_eq!(session.user.id, user.id);
        assert_eq!(session.user.email, "alice@example.com");
        assert_eq!(session.session_id, issued.session.id);
    }

    #[test]
    fn bad_credentials_look_identical() {
        let svc = test_service();
        alice(&svc);

        let unknown = svc
            .sign_in(credentials("nobody@example.com", "correct horse"), ClientMeta::default())
            .unwrap_err();
        let wrong = svc
            .sign_in(credentials("alice@example.com", "wrong horse"), ClientMeta::default())
            .unwrap_err();

        assert!(matches!(unknown, AuthError::Unauthorized(_)));
        assert!(matches!(wrong, AuthError::Unauthorized(_)));
        assert_eq!(unknown.to_string(), wrong.to_string());
    }

    #[test]
    fn revoked_session_is_no_session() {
        let svc = test_service();
        let user = alice(&svc);
        let issued = svc.issue_session(&user, ClientMeta::default()).unwrap();

        svc.revoke_session(&issued.session.id).unwrap();
        assert!(svc.verify_token(&issued.token).unwrap().is_none());
        assert!(svc.get_session_record(&issued.session.id).unwrap().revoked);
    }

    #[test]
    fn expired_session_is_no_session() {
        let svc = test_service_with(AuthConfig {
            session_ttl: -1,
            ..AuthConfig::default()
        });
        let user = alice(&svc);
        let issued = svc.issue_session(&user, ClientMeta::default()).unwrap();
        assert!(svc.verify_token(&issued.token).unwrap().is_none());
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let svc = test_service();
        let other = test_service_with(AuthConfig {
            jwt_secret: "another-secret".into(),
            ..AuthConfig::default()
        });
        let user = alice(&other);
        let issued = other.issue_session(&user, ClientMeta::default()).unwrap();

        assert!(svc.verify_token(&issued.token).unwrap().is_none());
        assert!(svc.verify_token("this.is.not.a.valid.jwt").unwrap().is_none());
    }

    #[test]
    fn sign_in_records_client_meta_and_purges_revoked() {
        let svc = test_service();
        alice(&svc);
        let meta = ClientMeta {
            user_agent: Some("curl/8.0".into()),
            ip_address: Some("10.0.0.1".into()),
        };

        let first = svc
            .sign_in(credentials("alice@example.com", "correct horse"), meta.clone())
            .unwrap();
        assert_eq!(first.session.user_agent.as_deref(), Some("curl/8.0"));
        svc.revoke_session(&first.session.id).unwrap();

        svc.sign_in(credentials("alice@example.com", "correct horse"), meta)
            .unwrap();
        assert!(matches!(
            svc.get_session_record(&first.session.id),
            Err(AuthError::NotFound(_))
        ));
    }

    #[test]
    fn oversized_ttl_is_an_error() {
        let svc = test_service_with(AuthConfig {
            session_ttl: i64::MAX,
            ..AuthConfig::default()
        });
        let user = alice(&svc);
        let err = svc.issue_session(&user, ClientMeta::default()).unwrap_err();
        assert!(matches!(err, AuthError::Internal(_)));

        let err = svc
            .sign_in(credentials("alice@example.com", "correct horse"), ClientMeta::default())
            .unwrap_err();
        assert!(matches!(err, AuthError::Internal(_)));
    }

    #[test]
    fn unknown_email_runs_the_password_check() {
        let svc = test_service();
        assert!(svc.dummy_hash.starts_with("$argon2id$"));
        assert!(!verify_password("correct horse", &svc.dummy_hash));

        let err = svc
            .sign_in(credentials("nobody@example.com", "correct horse"), ClientMeta::default())
            .unwrap_err();
        assert_eq!(err.to_string(), BAD_CREDENTIALS);
    }
}
