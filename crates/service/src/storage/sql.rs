use async_trait::async_trait;
use configs::{Backend, DatabaseConfig};
use migration::MigratorTrait;
use models::entities::{checkdeposits, moneyflow, users};
use models::{CheckDeposit, LedgerEntry, MoneyFlow, User};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseBackend, DatabaseConnection, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait,
};
use serde_json::Value;
use tracing::info;

use super::{Seeds, SetupReport, Storage, UserPatch};
use crate::errors::{StorageError, UniqueField};

/// Relational adapter: one row per record, targeted INSERT/UPDATE/DELETE by primary key.
///
/// Read-modify-write runs inside a transaction; on Postgres the row is selected
/// `FOR UPDATE` so concurrent updates of one user queue instead of overwriting each other.
/// Username and email uniqueness is enforced by unique indexes as well as a pre-check.
pub struct SqlStorage {
    db: DatabaseConnection,
    seeds: Seeds,
    shared: bool,
}

impl SqlStorage {
    /// Wrap a dedicated connection; `shutdown` closes it.
    pub fn new(db: DatabaseConnection, seeds: Seeds) -> Self {
        Self { db, seeds, shared: false }
    }

    /// Use the process-wide connection, opening it on first use.
    pub async fn connect(cfg: &DatabaseConfig, seeds: Seeds) -> Result<Self, StorageError> {
        let db = models::db::shared(cfg).await?;
        Ok(Self { db, seeds, shared: true })
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

/// Unique-index violations on `username` / `email` become conflicts; anything else, primary-key
/// collisions included, stays a database error.
fn conflict_or_db(e: DbErr) -> StorageError {
    let field = match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(msg)) => {
            let msg = msg.to_lowercase();
            if msg.contains("username") {
                Some(UniqueField::Username)
            } else if msg.contains("email") {
                Some(UniqueField::Email)
            } else {
                None
            }
        }
        _ => None,
    };
    match field {
        Some(field) => StorageError::Conflict(field),
        None => e.into(),
    }
}

fn by_username(username: &str) -> sea_orm::Select<users::Entity> {
    users::Entity::find().filter(users::Column::Username.eq(username))
}

fn locking<E: EntityTrait, C: ConnectionTrait>(query: sea_orm::Select<E>, conn: &C) -> sea_orm::Select<E> {
    if conn.get_database_backend() == DatabaseBackend::Postgres {
        query.lock_exclusive()
    } else {
        query
    }
}

#[async_trait]
impl Storage for SqlStorage {
    fn backend(&self) -> Backend {
        Backend::Sql
    }

    async fn setup(&self) -> Result<SetupReport, StorageError> {
        migration::Migrator::up(&self.db, None).await?;
        let count = users::Entity::find().count(&self.db).await?;
        let mut seeded_users = 0;
        if count == 0 {
            let txn = self.db.begin().await?;
            for user in self.seeds.initial_users().await? {
                users::active_model(&user)?.insert(&txn).await.map_err(conflict_or_db)?;
                seeded_users += 1;
            }
            txn.commit().await?;
            info!(seeded_users, "users table seeded");
        }
        Ok(SetupReport { backend: Backend::Sql, seeded_users })
    }

    async fn list_users(&self) -> Result<Vec<User>, StorageError> {
        let rows = users::Entity::find()
            .order_by_desc(users::Column::CreatedAt)
            .order_by_desc(users::Column::Id)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn find_user(&self, username: &str) -> Result<Option<User>, StorageError> {
        Ok(by_username(username).one(&self.db).await?.map(User::from))
    }

    async fn find_login(&self, identifier: &str, password: &str) -> Result<Option<User>, StorageError> {
        let row = users::Entity::find()
            .filter(
                Condition::any()
                    .add(users::Column::Username.eq(identifier))
                    .add(users::Column::Email.eq(identifier)),
            )
            .filter(users::Column::Password.eq(password))
            .one(&self.db)
            .await?;
        Ok(row.map(User::from))
    }

    async fn insert_user(&self, user: User) -> Result<User, StorageError> {
        let txn = self.db.begin().await?;
        if by_username(&user.username).one(&txn).await?.is_some() {
            return Err(StorageError::Conflict(UniqueField::Username));
        }
        let email_taken = users::Entity::find()
            .filter(users::Column::Email.eq(user.email.as_str()))
            .one(&txn)
            .await?
            .is_some();
        if email_taken {
            return Err(StorageError::Conflict(UniqueField::Email));
        }
        let row = users::active_model(&user)?.insert(&txn).await.map_err(conflict_or_db)?;
        txn.commit().await?;
        Ok(row.into())
    }

    async fn update_user(&self, username: &str, patch: UserPatch) -> Result<Option<User>, StorageError> {
        let txn = self.db.begin().await?;
        let Some(row) = locking(by_username(username), &txn).one(&txn).await? else {
            return Ok(None);
        };
        let row_id = row.id.clone();
        let mut user = User::from(row);
        patch(&mut user)?;
        // full-row rewrite keyed by the original id, so a merged `id` moves the primary key
        users::Entity::update_many()
            .set(users::active_model(&user)?)
            .filter(users::Column::Id.eq(row_id))
            .exec(&txn)
            .await
            .map_err(conflict_or_db)?;
        txn.commit().await?;
        let stored = users::Entity::find_by_id(user.id.clone()).one(&self.db).await?;
        Ok(stored.map(User::from))
    }

    async fn delete_user(&self, username: &str) -> Result<bool, StorageError> {
        let res = users::Entity::delete_many()
            .filter(users::Column::Username.eq(username))
            .exec(&self.db)
            .await?;
        Ok(res.rows_affected > 0)
    }

    async fn list_flows(&self) -> Result<Vec<MoneyFlow>, StorageError> {
        let rows = moneyflow::Entity::find()
            .order_by_asc(moneyflow::Column::CreatedAt)
            .order_by_asc(moneyflow::Column::Id)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(MoneyFlow::from).collect())
    }

    async fn insert_flow(&self, flow: MoneyFlow) -> Result<MoneyFlow, StorageError> {
        let row = moneyflow::ActiveModel::from(&flow).insert(&self.db).await?;
        Ok(row.into())
    }

    async fn update_flow_status(&self, id: &str, status: Value) -> Result<Option<MoneyFlow>, StorageError> {
        let txn = self.db.begin().await?;
        let query = moneyflow::Entity::find_by_id(id.to_string());
        let Some(row) = locking(query, &txn).one(&txn).await? else {
            return Ok(None);
        };
        let mut flow = MoneyFlow::from(row.clone());
        flow.set_status(&status);
        let mut am: moneyflow::ActiveModel = row.into();
        am.status = Set(flow.status);
        let updated = am.update(&txn).await?;
        txn.commit().await?;
        Ok(Some(updated.into()))
    }

    async fn delete_flow(&self, id: &str) -> Result<bool, StorageError> {
        let res = moneyflow::Entity::delete_by_id(id.to_string()).exec(&self.db).await?;
        Ok(res.rows_affected > 0)
    }

    async fn list_checks(&self) -> Result<Vec<CheckDeposit>, StorageError> {
        let rows = checkdeposits::Entity::find()
            .order_by_asc(checkdeposits::Column::CreatedAt)
            .order_by_asc(checkdeposits::Column::Id)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(CheckDeposit::from).collect())
    }

    async fn insert_check(&self, check: CheckDeposit) -> Result<CheckDeposit, StorageError> {
        let row = checkdeposits::ActiveModel::from(&check).insert(&self.db).await?;
        Ok(row.into())
    }

    async fn update_check_status(&self, id: &str, status: Value) -> Result<Option<CheckDeposit>, StorageError> {
        let txn = self.db.begin().await?;
        let query = checkdeposits::Entity::find_by_id(id.to_string());
        let Some(row) = locking(query, &txn).one(&txn).await? else {
            return Ok(None);
        };
        let mut check = CheckDeposit::from(row.clone());
        check.set_status(&status);
        let mut am: checkdeposits::ActiveModel = row.into();
        am.status = Set(check.status);
        let updated = am.update(&txn).await?;
        txn.commit().await?;
        Ok(Some(updated.into()))
    }

    async fn delete_check(&self, id: &str) -> Result<bool, StorageError> {
        let res = checkdeposits::Entity::delete_by_id(id.to_string()).exec(&self.db).await?;
        Ok(res.rows_affected > 0)
    }

    async fn shutdown(&self) -> Result<(), StorageError> {
        if self.shared {
            models::db::shutdown().await?;
        } else {
            self.db.clone().close().await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn sqlite() -> Result<SqlStorage, anyhow::Error> {
        let cfg = DatabaseConfig { url: "sqlite::memory:".into(), ..Default::default() };
        let db = models::db::connect_with_config(&cfg).await?;
        let storage = SqlStorage::new(db, Seeds::new(None, true));
        storage.setup().await?;
        Ok(storage)
    }

    fn user(username: &str, email: &str, created_at: &str) -> User {
        let body = json!({"username": username, "email": email, "password": "pw", "balance": 10});
        User::register(body.as_object().unwrap(), common::ids::uniqid(), created_at.into()).unwrap()
    }

    #[tokio::test]
    async fn setup_is_idempotent_and_seeds_once() -> Result<(), anyhow::Error> {
        let storage = sqlite().await?;
        let again = storage.setup().await?;
        assert_eq!(again.seeded_users, 0);
        let users = storage.list_users().await?;
        assert_eq!(users.len(), 2);
        // newest first
        assert_eq!(users[0].username, "johnsmith");
        assert_eq!(users[1].username, "janedoe");
        assert_eq!(users[1].transactions.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn create_then_fetch_is_field_equal() -> Result<(), anyhow::Error> {
        let storage = sqlite().await?;
        let alice = user("alice", "alice@x.com", "2030-01-01 00:00:00");
        storage.insert_user(alice.clone()).await?;
        let fetched = storage.find_user("alice").await?.expect("alice");
        assert_eq!(fetched, alice);
        assert_eq!(storage.find_login("alice@x.com", "pw").await?.map(|u| u.id), Some(alice.id.clone()));
        assert!(storage.find_login("alice", "bad").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn unique_indexes_surface_as_conflicts() -> Result<(), anyhow::Error> {
        let storage = sqlite().await?;
        storage.insert_user(user("alice", "alice@x.com", "t")).await?;
        assert!(matches!(
            storage.insert_user(user("alice", "z@x.com", "t")).await,
            Err(StorageError::Conflict(UniqueField::Username))
        ));
        assert!(matches!(
            storage.insert_user(user("zed", "alice@x.com", "t")).await,
            Err(StorageError::Conflict(UniqueField::Email))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn update_rewrites_full_row() -> Result<(), anyhow::Error> {
        let storage = sqlite().await?;
        storage.insert_user(user("bob", "bob@x.com", "t")).await?;
        let updated = storage
            .update_user("bob", Box::new(|u: &mut User| -> Result<(), StorageError> {
                u.checking_balance = 75.5;
                u.id = "bob-new-id".into();
                Ok(())
            }))
            .await?
            .expect("bob");
        assert_eq!(updated.id, "bob-new-id");
        assert_eq!(updated.checking_balance, 75.5);
        assert_eq!(updated.balance, 10.0);
        assert!(storage.update_user("ghost", Box::new(|_: &mut User| -> Result<(), StorageError> { Ok(()) })).await?.is_none());
        assert!(storage.delete_user("bob").await?);
        assert!(!storage.delete_user("bob").await?);
        Ok(())
    }

    #[tokio::test]
    async fn only_username_and_email_collisions_are_conflicts() -> Result<(), anyhow::Error> {
        let storage = sqlite().await?;
        let amy = storage.insert_user(user("amy", "amy@x.com", "t")).await?;
        storage.insert_user(user("ben", "ben@x.com", "t")).await?;

        let taken_id = amy.id.clone();
        let res = storage
            .update_user("ben", Box::new(move |u: &mut User| -> Result<(), StorageError> {
                u.id = taken_id;
                Ok(())
            }))
            .await;
        assert!(matches!(res, Err(StorageError::Db(_))), "primary key clash: {res:?}");

        let res = storage
            .update_user("ben", Box::new(|u: &mut User| -> Result<(), StorageError> {
                u.username = "amy".into();
                Ok(())
            }))
            .await;
        assert!(matches!(res, Err(StorageError::Conflict(UniqueField::Username))));

        let res = storage
            .update_user("ben", Box::new(|u: &mut User| -> Result<(), StorageError> {
                u.email = "amy@x.com".into();
                Ok(())
            }))
            .await;
        assert!(matches!(res, Err(StorageError::Conflict(UniqueField::Email))));

        let ben = storage.find_user("ben").await?.expect("ben unchanged");
        assert_eq!(ben.email, "ben@x.com");
        assert_ne!(ben.id, amy.id);
        Ok(())
    }

    #[tokio::test]
    async fn ledger_extension_fields_round_trip() -> Result<(), anyhow::Error> {
        let storage = sqlite().await?;
        let body = json!({"type": "wire", "amount": 99, "username": "alice", "memo": "rent", "tags": ["a"]});
        let flow = MoneyFlow::create(body.as_object().unwrap(), "f1".into(), "2030-01-01 00:00:00".into())?;
        storage.insert_flow(flow.clone()).await?;
        let listed = storage.list_flows().await?;
        assert_eq!(listed, vec![flow.clone()]);

        let updated = storage.update_flow_status("f1", json!("approved")).await?.expect("flow");
        assert_eq!(updated.status, "approved");
        assert_eq!(updated.extra, flow.extra);
        assert!(storage.update_flow_status("nope", json!("x")).await?.is_none());
        assert!(storage.delete_flow("f1").await?);

        let body = json!({"amount": "20", "checkNumber": "77", "image": "https://img/1.png", "branch": "north"});
        let check = CheckDeposit::create(body.as_object().unwrap(), "c1".into(), "t".into())?;
        storage.insert_check(check.clone()).await?;
        assert_eq!(storage.list_checks().await?, vec![check]);
        let rejected = storage.update_check_status("c1", Value::Null).await?.expect("check");
        assert_eq!(rejected.status, "pending");
        assert!(storage.delete_check("c1").await?);
        assert!(storage.list_checks().await?.is_empty());
        Ok(())
    }
}
