/// Caller roles as issued by the external auth service.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Role {
    Admin = 1,
    Hr = 2,
    Employee = 3,
    System = 4,
    ApiUser = 5,
}

impl Role {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::Admin),
            2 => Some(Role::Hr),
            3 => Some(Role::Employee),
            4 => Some(Role::System),
            5 => Some(Role::ApiUser),
            _ => None,
        }
    }

    /// Submit and delete payroll.
    pub fn can_manage_payroll(self) -> bool {
        matches!(self, Role::Admin | Role::Hr)
    }

    /// Create, edit and remove employees.
    pub fn can_manage_employees(self) -> bool {
        self == Role::Admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_map_to_roles() {
        assert_eq!(Role::from_id(1), Some(Role::Admin));
        assert_eq!(Role::from_id(5), Some(Role::ApiUser));
        assert_eq!(Role::from_id(0), None);
        assert_eq!(Role::from_id(6), None);
    }

    #[test]
    fn permissions() {
        assert!(Role::Hr.can_manage_payroll());
        assert!(!Role::Hr.can_manage_employees());
        assert!(Role::Admin.can_manage_employees());
        assert!(!Role::Employee.can_manage_payroll());
    }
}
