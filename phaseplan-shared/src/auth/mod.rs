/// Authentication and authorization
///
/// # Modules
///
/// - [`password`]: bcrypt hashing (cost 12)
/// - [`jwt`]: 30 minute session tokens
/// - [`reset_token`]: single-use password reset tokens
/// - [`credentials`]: sign-in, registration and password reset flows
/// - [`middleware`]: Bearer session middleware for Axum
/// - [`authorization`]: ownership checks on projects, phases and tasks
///
/// # Example
///
/// ```no_run
/// use phaseplan_shared::auth::jwt::{create_token, Claims};
/// use phaseplan_shared::auth::password::{hash_password, verify_password};
/// use phaseplan_shared::models::user::UserRole;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let claims = Claims::new(Uuid::new_v4(), UserRole::User);
/// let token = create_token(&claims, "a-secret-of-at-least-32-bytes!!")?;
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod credentials;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod reset_token;
