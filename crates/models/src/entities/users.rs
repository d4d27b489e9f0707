use sea_orm::{entity::prelude::*, Set};

use crate::errors::ModelError;
use crate::lenient;
use crate::user::User;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub username: String,
    pub password: String,
    #[sea_orm(unique)]
    pub email: String,
    pub fullname: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub dob: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub country: String,
    pub ssn: String,
    pub account_type: String,
    pub account_number: String,
    pub routing_number: String,
    #[sea_orm(column_type = "Double")]
    pub balance: f64,
    #[sea_orm(column_type = "Double")]
    pub checking_balance: f64,
    #[sea_orm(column_type = "Double")]
    pub savings_balance: f64,
    #[sea_orm(column_type = "JsonBinary")]
    pub transactions: Json,
    pub marketing: bool,
    pub status: String,
    pub tax_code: String,
    pub status_reason: String,
    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Columns have no catch-all: fields a shallow merge adds outside the schema are not persisted.
impl From<Model> for User {
    fn from(m: Model) -> Self {
        User {
            id: m.id,
            username: m.username,
            password: m.password,
            email: m.email,
            fullname: m.fullname,
            first_name: m.first_name,
            last_name: m.last_name,
            phone: m.phone,
            dob: m.dob,
            address: m.address,
            city: m.city,
            state: m.state,
            zip: m.zip,
            country: m.country,
            ssn: m.ssn,
            account_type: m.account_type,
            account_number: m.account_number,
            routing_number: m.routing_number,
            balance: m.balance,
            checking_balance: m.checking_balance,
            savings_balance: m.savings_balance,
            transactions: lenient::coerce_transactions(&m.transactions),
            marketing: m.marketing,
            status: m.status,
            tax_code: m.tax_code,
            status_reason: Some(m.status_reason).filter(|s| !s.is_empty()),
            created_at: m.created_at,
            extra: Default::default(),
        }
    }
}

/// Full-row image of a user; updates rewrite every column.
pub fn active_model(user: &User) -> Result<ActiveModel, ModelError> {
    Ok(ActiveModel {
        id: Set(user.id.clone()),
        username: Set(user.username.clone()),
        password: Set(user.password.clone()),
        email: Set(user.email.clone()),
        fullname: Set(user.fullname.clone()),
        first_name: Set(user.first_name.clone()),
        last_name: Set(user.last_name.clone()),
        phone: Set(user.phone.clone()),
        dob: Set(user.dob.clone()),
        address: Set(user.address.clone()),
        city: Set(user.city.clone()),
        state: Set(user.state.clone()),
        zip: Set(user.zip.clone()),
        country: Set(user.country.clone()),
        ssn: Set(user.ssn.clone()),
        account_type: Set(user.account_type.clone()),
        account_number: Set(user.account_number.clone()),
        routing_number: Set(user.routing_number.clone()),
        balance: Set(user.balance),
        checking_balance: Set(user.checking_balance),
        savings_balance: Set(user.savings_balance),
        transactions: Set(serde_json::to_value(&user.transactions)?),
        marketing: Set(user.marketing),
        status: Set(user.status.clone()),
        tax_code: Set(user.tax_code.clone()),
        status_reason: Set(user.status_reason.clone().unwrap_or_default()),
        created_at: Set(user.created_at.clone()),
    })
}
