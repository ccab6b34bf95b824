//! Transport tests against the in-process stub server.


use crate::testing::StubServer;
use crate::ApiClient;
use orbit_core::{CredentialPair, UserRecord};
use orbit_storage::{MemoryStorage, TokenVault};
use std::sync::Arc;

fn vault() -> TokenVault {
    TokenVault::new(Arc::new(MemoryStorage::new()))
}

fn client(stub: &StubServer, vault: &TokenVault) -> ApiClient {
    ApiClient::new(stub.base_url(), vault.clone()).unwrap()
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

fn profile_body(id: &str) -> String {
    format!(
        r#"{{"success":true,"message":"ok","data":{{"user":{{"id":"{id}","email":"a@b.com"}}}}}}"#
    )
}

fn auth_body(id: &str, access: &str, refresh: &str) -> String {
    format!(
        r#"{{"success":true,"message":"ok","data":{{"user":{{"id":"{id}","email":"a@b.com"}},"accessToken":"{access}","refreshToken":"{refresh}"}}}}"#
    )
}

fn refresh_body(access: &str) -> String {
    format!(r#"{{"success":true,"message":"ok","data":{{"accessToken":"{access}"}}}}"#)
}

fn error_body(message: &str) -> String {
    format!(r#"{{"success":false,"error":"{message}"}}"#)
}
