use sea_orm::{entity::prelude::*, Set};

use super::extension_map;
use crate::ledger::MoneyFlow;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "moneyflow")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub username: String,
    #[sea_orm(column_name = "type")]
    pub kind: String,
    #[sea_orm(column_type = "Double")]
    pub amount: f64,
    pub description: String,
    pub status: String,
    #[sea_orm(column_type = "JsonBinary")]
    pub data: Json,
    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for MoneyFlow {
    fn from(m: Model) -> Self {
        MoneyFlow {
            id: m.id,
            username: m.username,
            kind: m.kind,
            amount: m.amount,
            description: m.description,
            status: m.status,
            created_at: m.created_at,
            extra: extension_map(m.data),
        }
    }
}

impl From<&MoneyFlow> for ActiveModel {
    fn from(f: &MoneyFlow) -> Self {
        ActiveModel {
            id: Set(f.id.clone()),
            username: Set(f.username.clone()),
            kind: Set(f.kind.clone()),
            amount: Set(f.amount),
            description: Set(f.description.clone()),
            status: Set(f.status.clone()),
            data: Set(Json::Object(f.extra.clone())),
            created_at: Set(f.created_at.clone()),
        }
    }
}
