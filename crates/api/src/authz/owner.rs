//! Which user a request is about.

use serde_json::Value;

use loyalty_core::UserId;

/// The owner id named by a request.
///
/// Read from, in order, the path `id`, the body `_id`, and the body
/// `filter._id`. Any that are present must agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerId {
    /// No location names an owner.
    Absent,
    Present(UserId),
    /// Two locations name different owners.
    Conflict,
    /// A location holds something that is not a user id.
    Malformed,
}

impl OwnerId {
    /// Resolve the owner from the raw path parameter and JSON body.
    #[must_use]
    pub fn resolve(path_id: Option<&str>, body: Option<&Value>) -> Self {
        let mut found: Option<UserId> = None;
        let candidates = [
            path_id.map(|id| Value::String(id.to_owned())),
            body.and_then(|b| b.get("_id")).cloned(),
            match body.and_then(|b| b.get("filter")) {
                None | Some(Value::Null) => None,
                Some(Value::Object(filter)) => filter.get("_id").cloned(),
                Some(_) => return Self::Malformed,
            },
        ];

        for candidate in candidates.into_iter().flatten() {
            let id = match candidate {
                Value::Null => continue,
                Value::String(s) => match s.parse::<UserId>() {
                    Ok(id) => id,
                    Err(_) => return Self::Malformed,
                },
                _ => return Self::Malformed,
            };
            match found {
                Some(existing) if existing != id => return Self::Conflict,
                _ => found = Some(id),
            }
        }

        found.map_or(Self::Absent, Self::Present)
    }

    /// The owner id, if the request named exactly one.
    #[must_use]
    pub const fn present(self) -> Option<UserId> {
        match self {
            Self::Present(id) => Some(id),
            _ => None,
        }
    }
}
