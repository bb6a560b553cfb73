use crate::backend::{select_as, DataService, Relation, Select, Table};
use crate::models::ServiceWithProvider;

pub fn catalog_query() -> Select {
    Select::from(Table::Services)
        .column("id")
        .column("title")
        .column("description")
        .column("specialties")
        .column("price")
        .column("user_id")
        .relation(Relation::new(Table::Users, "user_id").column("name"))
}

/// All services with their owner's name attached. Failures yield an empty
/// catalog.
pub async fn load_catalog(data: &dyn DataService) -> Vec<ServiceWithProvider> {
    match select_as::<ServiceWithProvider>(data, &catalog_query()).await {
        Ok(services) => {
            tracing::debug!(count = services.len(), "loaded service catalog");
            services
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to load services");
            Vec::new()
        }
    }
}
