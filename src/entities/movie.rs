use sea_orm::entity::prelude::*;

/// `genre` and `actors` hold the comma separated cells of the seed file.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "movies")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub rank: i32,
    pub title: String,
    pub genre: String,
    pub description: String,
    pub director: String,
    pub actors: String,
    pub year: i32,
    pub runtime: Option<i32>,
    pub rating: Option<f64>,
    pub votes: Option<i64>,
    pub revenue: Option<f64>,
    pub metascore: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
