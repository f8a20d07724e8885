use super::role::Role;

/// The authenticated caller of an operation.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Actor {
    pub id: u64,
    pub role: Role,
}

impl Actor {
    pub fn new(id: u64, role: Role) -> Self {
        Self { id, role }
    }
}
