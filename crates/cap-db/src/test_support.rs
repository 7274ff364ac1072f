//! Shared fixtures for cap-db unit tests.

#[cfg(test)]
pub(crate) mod helpers {
    use cap_core::enums::{EntityKind, Permission, Role};
    use cap_core::identity::{Actor, Capability, EntityRef, Scope};

    use crate::CapDb;
    use crate::service::CapService;

    /// In-memory service with migrations applied.
    pub async fn test_service() -> CapService {
        let db = CapDb::open_local(":memory:").await.unwrap();
        CapService::from_db(db)
    }

    pub fn admin() -> Actor {
        Actor::new("usr-admin", "admin@example.com", Role::Admin)
    }

    /// Admin capability over every row of `kind`.
    pub fn cap(permission: Permission, kind: EntityKind) -> Capability {
        admin().grant(permission, Scope::Kind(kind)).unwrap()
    }

    /// Admin capability over exactly one row.
    pub fn cap_on(permission: Permission, target: EntityRef) -> Capability {
        admin().grant(permission, Scope::Entity(target)).unwrap()
    }
}
