//! Session lifecycle scenarios against the stub server.

mod lifecycle;

use crate::SessionManager;
use orbit_client::testing::StubServer;
use orbit_client::ApiClient;
use orbit_core::{CredentialPair, UserRecord};
use orbit_storage::{MemoryStorage, TokenVault};
use std::sync::Arc;

async fn setup() -> (StubServer, TokenVault, SessionManager) {
    let stub = StubServer::start().await;
    let vault = TokenVault::new(Arc::new(MemoryStorage::new()));
    let api = ApiClient::new(stub.base_url(), vault.clone()).unwrap();
    let manager = SessionManager::new(api, vault.clone());
    (stub, vault, manager)
}

fn test_user(id: &str) -> UserRecord {
    serde_json::from_str(&format!(r#"{{"id":"{id}","email":"a@b.com"}}"#)).unwrap()
}

fn pair(access: &str, refresh: &str) -> CredentialPair {
    CredentialPair {
        access_token: access.to_string(),
        refresh_token: refresh.to_string(),
    }
}

fn auth_body(id: &str, access: &str, refresh: &str) -> String {
    format!(
        r#"{{"success":true,"message":"ok","data":{{"user":{{"id":"{id}","email":"a@b.com"}},"accessToken":"{access}","refreshToken":"{refresh}"}}}}"#
    )
}

fn auth_body_with_picture(id: &str, picture: &str) -> String {
    format!(
        r#"{{"success":true,"message":"ok","data":{{"user":{{"id":"{id}","email":"a@b.com","profilePicture":"{picture}"}},"accessToken":"T1","refreshToken":"R1"}}}}"#
    )
}

fn profile_body(id: &str) -> String {
    format!(
        r#"{{"success":true,"message":"ok","data":{{"user":{{"id":"{id}","email":"a@b.com"}}}}}}"#
    )
}

fn refresh_body(access: &str) -> String {
    format!(r#"{{"success":true,"message":"ok","data":{{"accessToken":"{access}"}}}}"#)
}

fn error_body(message: &str) -> String {
    format!(r#"{{"success":false,"error":"{message}"}}"#)
}
