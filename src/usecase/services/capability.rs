use crate::domain::entities::session::Session;

/// Whether the session's role grants in-place editing of committed rows.
pub fn can_edit(session: &Session) -> bool {
    let role = session.role.trim().to_lowercase();
    role == "admin" || role == "gestor"
}
