//! Session-related types.

/// Session keys for authentication data.
///
/// The session carries nothing but the user id; the variant and every other
/// attribute are re-read from the directory on each request.
pub mod keys {
    /// Key for the logged-in user's id.
    pub const USER_ID: &str = "user_id";
}
