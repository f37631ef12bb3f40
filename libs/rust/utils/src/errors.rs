//env
pub const GATEWAY_URL_NOT_SET: &str = "DAOPAD_GATEWAY_URL not set!";
pub const TOKEN_ID_NOT_SET: &str = "DAOPAD_TOKEN_ID not set!";
pub const TOKEN_ID_INVALID: &str = "DAOPAD_TOKEN_ID is not a valid principal";

//config
pub const CONFIG_READ_FAILED: &str = "Failed to read feed config";
pub const CONFIG_PARSE_FAILED: &str = "Failed to parse feed config";

//gateway
pub const GATEWAY_CLIENT_BUILD_FAILED: &str = "Failed to build gateway HTTP client";
pub const LIST_REQUESTS_FAILED: &str = "Failed to load requests from Orbit Station";
pub const DECISION_FAILED: &str = "Failed to submit decision";

//feed
pub const REQUEST_ID_NOT_SET: &str = "Request id is required";
pub const SNAPSHOT_CHANNEL_CLOSED: &str = "Feed snapshot channel closed";
