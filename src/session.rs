// Signed-in staff session
// Passed explicitly to the API client instead of living in ambient browser storage.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffRole {
    Admin,
    Manager,
    Receptionist,
}

// Status ids the backend assigns to rooms and stays, fetched once at sign-in
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusDefaults {
    pub room_available: Option<i64>,
    pub room_occupied: Option<i64>,
    pub stay_checked_out: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: Option<i64>,
    pub role: Option<StaffRole>,
    pub token: Option<String>,
    #[serde(default)]
    pub status_defaults: StatusDefaults,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn signed_in(user_id: i64, role: StaffRole, token: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id),
            role: Some(role),
            token: Some(token.into()),
            status_defaults: StatusDefaults::default(),
        }
    }

    pub fn is_signed_in(&self) -> bool {
        self.token.is_some()
    }

    // Discounts can only be applied by managers and admins
    pub fn can_apply_discounts(&self) -> bool {
        matches!(self.role, Some(StaffRole::Admin) | Some(StaffRole::Manager))
    }

    pub fn into_handle(self) -> SessionHandle {
        SessionHandle(Arc::new(RwLock::new(self)))
    }
}

// Shared, cheaply cloneable view of the current session
#[derive(Debug, Clone)]
pub struct SessionHandle(Arc<RwLock<Session>>);

impl SessionHandle {
    pub fn snapshot(&self) -> Session {
        self.0.read().clone()
    }

    pub fn token(&self) -> Option<String> {
        self.0.read().token.clone()
    }

    pub fn replace(&self, session: Session) {
        *self.0.write() = session;
    }

    pub fn clear_token(&self) {
        self.0.write().token = None;
    }

    pub fn sign_out(&self) {
        *self.0.write() = Session::anonymous();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_shares_state_between_clones() {
        let handle = Session::signed_in(7, StaffRole::Receptionist, "tok-1").into_handle();
        let other = handle.clone();

        assert_eq!(other.token().as_deref(), Some("tok-1"));
        handle.clear_token();
        assert_eq!(other.token(), None);
        assert_eq!(other.snapshot().user_id, Some(7));

        other.sign_out();
        assert!(!handle.snapshot().is_signed_in());
        assert_eq!(handle.snapshot().user_id, None);
    }

    #[test]
    fn test_discount_permission_by_role() {
        assert!(Session::signed_in(1, StaffRole::Admin, "t").can_apply_discounts());
        assert!(Session::signed_in(1, StaffRole::Manager, "t").can_apply_discounts());
        assert!(!Session::signed_in(1, StaffRole::Receptionist, "t").can_apply_discounts());
        assert!(!Session::anonymous().can_apply_discounts());
    }

    #[test]
    fn test_session_deserializes_without_status_defaults() {
        let session: Session =
            serde_json::from_str(r#"{"user_id": 3, "role": "manager", "token": "abc"}"#).unwrap();
        assert_eq!(session.role, Some(StaffRole::Manager));
        assert_eq!(session.status_defaults, StatusDefaults::default());
    }
}
