//! Authorization for timetable edits.
//!
//! Faculty may edit any class. A class representative may edit only the
//! class their role is bound to. No other role grants access.

use timetable_id::ClassId;

use super::IdentityUser;

/// Roles that matter for timetable edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Faculty,
    ClassRepresentative,
}

pub fn parse_role(name: &str) -> Option<Role> {
    match name {
        "faculty" => Some(Role::Faculty),
        "cr" => Some(Role::ClassRepresentative),
        _ => None,
    }
}

/// Whether `user` may edit the schedule of `class_id`.
pub fn is_authorized(user: &IdentityUser, class_id: ClassId) -> bool {
    user.roles
        .iter()
        .any(|role| match parse_role(&role.name) {
            Some(Role::Faculty) => true,
            Some(Role::ClassRepresentative) => role.class_id == Some(class_id),
            None => false,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::IdentityRole;
    use timetable_id::UserId;

    fn user(roles: Vec<IdentityRole>) -> IdentityUser {
        IdentityUser {
            id: UserId::new(),
            roles,
        }
    }

    fn role(name: &str, class_id: Option<ClassId>) -> IdentityRole {
        IdentityRole {
            name: name.to_string(),
            class_id,
        }
    }

    #[test]
    fn test_faculty_may_edit_any_class() {
        let faculty = user(vec![role("faculty", None)]);
        assert!(is_authorized(&faculty, ClassId::new()));
    }

    #[test]
    fn test_cr_limited_to_own_class() {
        let class_a = ClassId::new();
        let class_b = ClassId::new();
        let cr = user(vec![role("cr", Some(class_a))]);

        assert!(is_authorized(&cr, class_a));
        assert!(!is_authorized(&cr, class_b));
    }

    #[test]
    fn test_unbound_cr_and_other_roles_denied() {
        let class_id = ClassId::new();
        let others = user(vec![
            role("cr", None),
            role("student", Some(class_id)),
            role("Faculty", None),
        ]);
        assert!(!is_authorized(&others, class_id));
        assert!(!is_authorized(&user(vec![]), class_id));
    }
}
