//! User identity records issued by the external authentication service.

use serde::{Deserialize, Serialize};

/// The user record returned on login / signup / token verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

/// Response of the auth service's `GET /verify/verifyToken`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyTokenResponse {
    pub success: bool,
    #[serde(default)]
    pub user: Option<UserRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_record_accepts_mongo_id() {
        let user: UserRecord =
            serde_json::from_str(r#"{"_id":"abc123","name":"Ada","email":"ada@example.com"}"#)
                .unwrap();
        assert_eq!(user.id, "abc123");
        assert_eq!(user.name, "Ada");
    }

    #[test]
    fn test_verify_response_without_user() {
        let resp: VerifyTokenResponse = serde_json::from_str(r#"{"success":false}"#).unwrap();
        assert!(!resp.success);
        assert!(resp.user.is_none());
    }
}
