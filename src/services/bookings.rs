use crate::backend::{select_as, DataService, Relation, Select, Table};
use crate::models::{BookingRow, Role};

pub const DEFAULT_BOOKING_LIMIT: usize = 3;

/// Which bookings a query covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingScope {
    /// Bookings the user made as a client.
    Client(String),
    /// Bookings against any of these service ids.
    Services(Vec<String>),
}

/// Most recently updated bookings in `scope`, with the service title and the
/// service owner's name embedded.
pub fn bookings_query(scope: &BookingScope, limit: usize) -> Select {
    let base = Select::from(Table::Bookings).all().relation(
        Relation::new(Table::Services, "service_id")
            .column("title")
            .relation(Relation::new(Table::Users, "user_id").column("name")),
    );

    let scoped = match scope {
        BookingScope::Client(user_id) => base.eq("client_id", user_id.clone()),
        BookingScope::Services(ids) => base.is_in("service_id", ids.iter().cloned()),
    };

    scoped.order_desc("updated_at").limit(limit)
}

pub fn owned_services_query(user_id: &str) -> Select {
    Select::from(Table::Services).column("id").eq("user_id", user_id)
}

/// Works out the scope for `user_id` acting as `role`. `None` means there is
/// nothing to query.
pub async fn resolve_scope(
    data: &dyn DataService,
    user_id: &str,
    role: Role,
) -> Option<BookingScope> {
    match role {
        Role::Client => Some(BookingScope::Client(user_id.to_string())),
        Role::Practitioner => {
            let owned = match data.select(&owned_services_query(user_id)).await {
                Ok(rows) => rows,
                Err(e) => {
                    tracing::error!(error = %e, user_id, "failed to fetch practitioner services");
                    return None;
                }
            };

            let ids: Vec<String> = owned
                .iter()
                .filter_map(|row| row.get("id").and_then(|v| v.as_str()))
                .map(str::to_string)
                .collect();

            if ids.is_empty() {
                tracing::debug!(user_id, "practitioner owns no services");
                return None;
            }
            Some(BookingScope::Services(ids))
        }
        Role::Unknown => {
            tracing::warn!(user_id, "unknown role, not fetching bookings");
            None
        }
    }
}

/// Role-scoped booking fetch. Any failure yields an empty list, replacing
/// whatever was shown before.
pub async fn fetch_bookings(
    data: &dyn DataService,
    user_id: Option<&str>,
    role: Role,
    limit: usize,
) -> Vec<BookingRow> {
    let Some(user_id) = user_id else {
        return Vec::new();
    };

    let Some(scope) = resolve_scope(data, user_id, role).await else {
        return Vec::new();
    };

    match select_as::<BookingRow>(data, &bookings_query(&scope, limit)).await {
        Ok(rows) => rows,
        Err(e) => {
            tracing::error!(error = %e, user_id, role = role.as_str(), "failed to fetch bookings");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Filter;

    #[test]
    fn test_client_query_filters_by_client_only() {
        let q = bookings_query(&BookingScope::Client("u1".into()), DEFAULT_BOOKING_LIMIT);
        assert_eq!(
            q.filters,
            vec![Filter::Eq {
                column: "client_id".into(),
                value: "u1".into()
            }]
        );
        assert!(q.filter_on("service_id").is_none());
        assert_eq!(q.limit, Some(3));
        assert_eq!(q.select_param(), "*,services(title,users(name))");
    }

    #[test]
    fn test_practitioner_query_uses_service_set() {
        let q = bookings_query(
            &BookingScope::Services(vec!["s1".into(), "s2".into()]),
            DEFAULT_BOOKING_LIMIT,
        );
        assert_eq!(
            q.filters,
            vec![Filter::In {
                column: "service_id".into(),
                values: vec!["s1".into(), "s2".into()]
            }]
        );
        let order = q.order.unwrap();
        assert_eq!(order.column, "updated_at");
        assert!(order.descending);
    }
}
