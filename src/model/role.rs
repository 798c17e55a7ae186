use strum_macros::{AsRefStr, Display};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    Admin = 1,
    Hr = 2,
    Employee = 3,
}

impl Role {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::Admin),
            2 => Some(Role::Hr),
            3 => Some(Role::Employee),
            _ => None,
        }
    }

    /// May edit, create or delete attendance records of other employees.
    pub fn can_correct_attendance(self) -> bool {
        self == Role::Admin
    }

    /// May read recaps of other employees.
    pub fn can_view_recaps(self) -> bool {
        matches!(self, Role::Admin | Role::Hr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_ids_and_permissions() {
        assert_eq!(Role::from_id(1), Some(Role::Admin));
        assert_eq!(Role::from_id(3), Some(Role::Employee));
        assert_eq!(Role::from_id(9), None);

        assert!(Role::Admin.can_correct_attendance());
        assert!(!Role::Hr.can_correct_attendance());
        assert!(Role::Hr.can_view_recaps());
        assert!(!Role::Employee.can_view_recaps());
        assert_eq!(Role::Hr.to_string(), "hr");
    }
}
