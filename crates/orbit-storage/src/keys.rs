//! Storage key constants.

/// Storage keys used by the SDK
pub struct StorageKeys;

impl StorageKeys {
    /// Access token for API calls
    pub const ACCESS_TOKEN: &'static str = "accessToken";

    /// Refresh token exchanged on 401
    pub const REFRESH_TOKEN: &'static str = "refreshToken";

    /// Serialized user record (JSON)
    pub const USER_RECORD: &'static str = "user";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_keys_unique() {
        let keys = [
            StorageKeys::ACCESS_TOKEN,
            StorageKeys::REFRESH_TOKEN,
            StorageKeys::USER_RECORD,
        ];
        let unique: std::collections::HashSet<_> = keys.iter().collect();
        assert_eq!(unique.len(), keys.len(), "Storage keys must be unique");
    }
}
