/// Authentication and authorization utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and the password policy
/// - [`jwt`]: access/refresh token issue and validation
/// - [`middleware`]: bearer token middleware producing an [`middleware::AuthContext`]
/// - [`authorization`]: project visibility and account ownership checks
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::auth::password::{hash_password, verify_password};
/// use taskboard_shared::auth::jwt::{issue_token_pair, TokenSettings};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let settings = TokenSettings::new("a-secret-that-is-at-least-32-bytes-long");
/// let pair = issue_token_pair(Uuid::new_v4(), &settings)?;
/// # Ok(())
/// # }
/// ```

pub mod password;
pub mod jwt;
pub mod middleware;
pub mod authorization;
