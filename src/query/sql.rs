use sea_orm::sea_query::{Expr, SimpleExpr, extension::postgres::PgExpr};
use sea_orm::{ColumnTrait, Condition, EntityTrait, Order, QueryFilter, QueryOrder, Select};

use super::{Comparison, Criterion, NumericField, ProductFilter, SortField, TextField};
use crate::entity::products::{Column, Entity as Products};

impl ProductFilter {
    /// Render the filter as a SeaORM condition over the `products` table.
    pub fn to_condition(&self) -> Condition {
        self.criteria
            .iter()
            .fold(Condition::all(), |cond, c| cond.add(criterion_condition(c)))
    }

    /// `Products::find()` with this filter and its ordering applied.
    pub fn select(&self) -> Select<Products> {
        let mut select = Products::find().filter(self.to_condition());
        for key in &self.sort {
            let order = if key.descending { Order::Desc } else { Order::Asc };
            select = select.order_by(sort_column(key.field), order);
        }
        select.order_by_asc(Column::Id)
    }
}

fn criterion_condition(criterion: &Criterion) -> Condition {
    match criterion {
        Criterion::Keyword(keyword) => {
            let pattern = format!("%{}%", escape_like(keyword));
            Condition::any()
                .add(Expr::col(Column::Name).ilike(pattern.clone()))
                .add(Expr::col(Column::Description).ilike(pattern))
        }
        Criterion::Numeric { field, cmp, value } => {
            Condition::all().add(compare(numeric_column(*field), *cmp, *value))
        }
        Criterion::Text { field, value } => {
            Condition::all().add(text_column(*field).eq(value.clone()))
        }
        Criterion::Status(status) => Condition::all().add(Column::Status.eq(status.as_str())),
        Criterion::Featured(flag) => Condition::all().add(Column::IsFeatured.eq(*flag)),
        Criterion::Owner(owner) => Condition::all().add(Column::OwnerId.eq(*owner)),
        Criterion::TagsAny(tags) => tags.iter().fold(Condition::any(), |cond, tag| {
            cond.add(Expr::cust_with_values(
                r#"$1 = ANY("products"."tags")"#,
                [tag.clone()],
            ))
        }),
    }
}

fn compare(column: Column, cmp: Comparison, value: f64) -> SimpleExpr {
    match cmp {
        Comparison::Eq => column.eq(value),
        Comparison::Gt => column.gt(value),
        Comparison::Gte => column.gte(value),
        Comparison::Lt => column.lt(value),
        Comparison::Lte => column.lte(value),
    }
}

fn numeric_column(field: NumericField) -> Column {
    match field {
        NumericField::Price => Column::Price,
        NumericField::Ratings => Column::Ratings,
        NumericField::Stock => Column::Stock,
        NumericField::NumOfReviews => Column::NumOfReviews,
    }
}

fn text_column(field: TextField) -> Column {
    match field {
        TextField::Name => Column::Name,
        TextField::Description => Column::Description,
        TextField::Category => Column::Category,
        TextField::Brand => Column::Brand,
    }
}

fn sort_column(field: SortField) -> Column {
    match field {
        SortField::Price => Column::Price,
        SortField::Ratings => Column::Ratings,
        SortField::Stock => Column::Stock,
        SortField::Name => Column::Name,
        SortField::CreatedAt => Column::CreatedAt,
    }
}

fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}
