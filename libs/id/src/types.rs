//! Typed ID definitions for timetable resources.

use crate::define_id;

// =============================================================================
// Identities (issued by the identity service)
// =============================================================================

define_id!(ClassId, "class");
define_id!(UserId, "user");

// =============================================================================
// Locally generated
// =============================================================================

define_id!(OverrideId, "override");
define_id!(OutboxEventId, "outbox event");

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_class_id_display_is_hyphenated_lowercase() {
        let id: ClassId = "0190B6A4-6F5E-7C3A-9D1E-2F4B5C6D7E8F".parse().unwrap();
        assert_eq!(id.to_string(), "0190b6a4-6f5e-7c3a-9d1e-2f4b5c6d7e8f");
    }

    #[test]
    fn test_id_empty() {
        let result: Result<UserId, _> = "   ".parse();
        assert!(result.unwrap_err().is_empty());
    }

    #[test]
    fn test_id_rejects_nil() {
        let result: Result<ClassId, _> = "00000000-0000-0000-0000-000000000000".parse();
        assert_eq!(result.unwrap_err(), crate::IdError::Nil { kind: "class" });
    }

    #[test]
    fn test_id_rejects_garbage() {
        let result: Result<ClassId, _> = "class-a".parse();
        assert!(matches!(result, Err(crate::IdError::InvalidUuid(_))));
    }

    #[test]
    fn test_generated_ids_are_time_ordered() {
        let first = OutboxEventId::new();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = OutboxEventId::new();
        assert!(first < second);
    }

    #[test]
    fn test_serde_uses_string_form() {
        let id: ClassId = "0190b6a4-6f5e-7c3a-9d1e-2f4b5c6d7e8f".parse().unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"0190b6a4-6f5e-7c3a-9d1e-2f4b5c6d7e8f\"");

        let bad = serde_json::from_str::<ClassId>("\"nope\"");
        assert!(bad.is_err());
    }

    proptest! {
        #[test]
        fn prop_parse_accepts_any_non_nil_uuid(bytes in any::<[u8; 16]>()) {
            let uuid = crate::Uuid::from_bytes(bytes);
            prop_assume!(!uuid.is_nil());
            let parsed = UserId::parse(&uuid.to_string()).unwrap();
            prop_assert_eq!(parsed.as_uuid(), uuid);
        }
    }
}
