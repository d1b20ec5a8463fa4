pub const PULL_ALL_PATH: &str = "/api/v2/pull/all";
pub const NEWS_V2_PATH: &str = "/api/v2/news";
pub const LEGACY_NEWS_PATH: &str = "/api/news";
pub const USER_AGENT: &str = "fmswatch/0.1";

// News v2 `notification_type` values
pub const NOTIFY_ALL: u8 = 2;
pub const NOTIFY_GROUPS: u8 = 3;
pub const NOTIFY_USERS: u8 = 4;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert_eq!(PULL_ALL_PATH, "/api/v2/pull/all");
        assert_eq!(NEWS_V2_PATH, "/api/v2/news");
        assert_eq!(NOTIFY_USERS, 4);
        assert_eq!(NOTIFY_GROUPS, 3);
    }
}
