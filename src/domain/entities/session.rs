use std::env;

/// Authenticated user context. Issued by the authentication collaborator
/// and immutable for the process lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub username: String,
    pub role: String,
    pub display_name: String,
}

impl Session {
    /// Demo session derived from the environment. Defaults to the
    /// view-only role.
    pub fn from_env() -> Session {
        let username = env::var("PAINEL_USER").unwrap_or_else(|_| "colab".to_string());
        let role = env::var("PAINEL_ROLE").unwrap_or_else(|_| "colaborador".to_string());
        let display_name = env::var("PAINEL_NAME").unwrap_or_else(|_| username.clone());
        Session {
            username,
            role,
            display_name,
        }
    }
}
