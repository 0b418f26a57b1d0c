use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: i64,
    pub category: String,
    pub brand: String,
    pub tags: Vec<String>,
    pub stock: i64,
    pub num_of_reviews: i64,
    #[sea_orm(column_type = "Double")]
    pub ratings: f64,
    pub images: Json,
    pub is_featured: bool,
    pub status: String,
    pub owner_id: Uuid,
    pub reviews: Json,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
