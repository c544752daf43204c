//! Identities borrowed from the surrounding platform.
//!
//! Courses and users are owned by other services; this crate only needs them
//! as scoping keys.

use crate::{define_id_type, define_key_type};

define_key_type!(CourseKey);
define_key_type!(UserId);

define_id_type!(i64, CourseUserGroupId);

/// The grouping object a shift group is built on.
///
/// Unique per (course, name). Deleting it takes the shift group with it.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CourseUserGroup {
    pub id: CourseUserGroupId,
    pub course_key: CourseKey,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_course_key_is_opaque() {
        let key = CourseKey::new("course-v1:edX+DemoX+2026");
        assert_eq!(key.as_str(), "course-v1:edX+DemoX+2026");
        assert_eq!(key.to_string(), "course-v1:edX+DemoX+2026");
        assert_eq!(CourseKey::from("a/b/c"), CourseKey::new("a/b/c".to_string()));
    }

    #[test]
    fn test_keys_serialize_as_plain_strings() {
        let user = UserId::new("test");
        assert_eq!(serde_json::to_string(&user).unwrap(), "\"test\"");
        let back: UserId = serde_json::from_str("\"test\"").unwrap();
        assert_eq!(back, user);
    }
}
