use sea_orm::{entity::prelude::*, Set};

use super::extension_map;
use crate::ledger::CheckDeposit;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "checkdeposits")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub username: String,
    #[sea_orm(column_type = "Double")]
    pub amount: f64,
    pub check_number: String,
    pub description: String,
    pub status: String,
    #[sea_orm(column_type = "Text")]
    pub image: String,
    #[sea_orm(column_type = "JsonBinary")]
    pub data: Json,
    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for CheckDeposit {
    fn from(m: Model) -> Self {
        CheckDeposit {
            id: m.id,
            username: m.username,
            amount: m.amount,
            check_number: m.check_number,
            description: m.description,
            image: m.image,
            status: m.status,
            created_at: m.created_at,
            extra: extension_map(m.data),
        }
    }
}

impl From<&CheckDeposit> for ActiveModel {
    fn from(c: &CheckDeposit) -> Self {
        ActiveModel {
            id: Set(c.id.clone()),
            username: Set(c.username.clone()),
            amount: Set(c.amount),
            check_number: Set(c.check_number.clone()),
            description: Set(c.description.clone()),
            status: Set(c.status.clone()),
            image: Set(c.image.clone()),
            data: Set(Json::Object(c.extra.clone())),
            created_at: Set(c.created_at.clone()),
        }
    }
}
