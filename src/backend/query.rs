use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Table {
    Users,
    Services,
    Bookings,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Users => "users",
            Table::Services => "services",
            Table::Bookings => "bookings",
        }
    }

    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            Table::Users => &["id", "name", "role"],
            Table::Services => &[
                "id",
                "title",
                "description",
                "specialties",
                "price",
                "user_id",
            ],
            Table::Bookings => &[
                "id",
                "service_id",
                "client_id",
                "booking_date",
                "special_request",
                "status",
                "created_at",
                "updated_at",
            ],
        }
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns().contains(&column)
    }

    /// Columns stored as JSON text and surfaced as structured values.
    pub fn is_json_column(&self, column: &str) -> bool {
        matches!((self, column), (Table::Services, "specialties"))
    }
}

/// One entry of a projection list.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    All,
    Field(String),
    Relation(Relation),
}

/// An embedded to-one relation, resolved by matching `foreign_key` on the
/// parent row against `id` on `table`. Embedded under the table name.
#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    pub table: Table,
    pub foreign_key: String,
    pub columns: Vec<Column>,
}

impl Relation {
    pub fn new(table: Table, foreign_key: impl Into<String>) -> Self {
        Self {
            table,
            foreign_key: foreign_key.into(),
            columns: Vec::new(),
        }
    }

    pub fn column(mut self, name: impl Into<String>) -> Self {
        self.columns.push(Column::Field(name.into()));
        self
    }

    pub fn relation(mut self, relation: Relation) -> Self {
        self.columns.push(Column::Relation(relation));
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq { column: String, value: String },
    In { column: String, values: Vec<String> },
}

impl Filter {
    pub fn column(&self) -> &str {
        match self {
            Filter::Eq { column, .. } | Filter::In { column, .. } => column,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub column: String,
    pub descending: bool,
}

/// A read against one table: projection, filters, ordering and limit.
#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub table: Table,
    pub columns: Vec<Column>,
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    pub limit: Option<usize>,
}

impl Select {
    pub fn from(table: Table) -> Self {
        Self {
            table,
            columns: Vec::new(),
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }

    pub fn all(mut self) -> Self {
        self.columns.push(Column::All);
        self
    }

    pub fn column(mut self, name: impl Into<String>) -> Self {
        self.columns.push(Column::Field(name.into()));
        self
    }

    pub fn relation(mut self, relation: Relation) -> Self {
        self.columns.push(Column::Relation(relation));
        self
    }

    pub fn eq(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push(Filter::Eq {
            column: column.into(),
            value: value.into(),
        });
        self
    }

    pub fn is_in<I, S>(mut self, column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filters.push(Filter::In {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn order_desc(mut self, column: impl Into<String>) -> Self {
        self.order = Some(Order {
            column: column.into(),
            descending: true,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn filter_on(&self, column: &str) -> Option<&Filter> {
        self.filters.iter().find(|f| f.column() == column)
    }

    /// The projection in PostgREST `select=` syntax, e.g.
    /// `*,services(title,users(name))`.
    pub fn select_param(&self) -> String {
        render_columns(&self.columns)
    }

    /// Query-string pairs for a PostgREST-style endpoint.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![("select".to_string(), self.select_param())];

        for filter in &self.filters {
            match filter {
                Filter::Eq { column, value } => {
                    pairs.push((column.clone(), format!("eq.{value}")));
                }
                Filter::In { column, values } => {
                    let quoted: Vec<String> = values.iter().map(|v| quote_value(v)).collect();
                    pairs.push((column.clone(), format!("in.({})", quoted.join(","))));
                }
            }
        }

        if let Some(order) = &self.order {
            let dir = if order.descending { "desc" } else { "asc" };
            pairs.push(("order".to_string(), format!("{}.{dir}", order.column)));
        }

        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }

        pairs
    }
}

/// Double-quotes a list value so `,` and `)` inside it survive.
fn quote_value(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}

fn render_columns(columns: &[Column]) -> String {
    if columns.is_empty() {
        return "*".to_string();
    }
    columns
        .iter()
        .map(|c| match c {
            Column::All => "*".to_string(),
            Column::Field(name) => name.clone(),
            Column::Relation(rel) => {
                format!("{}({})", rel.table.as_str(), render_columns(&rel.columns))
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}
