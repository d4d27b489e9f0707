//! Maps `(method, endpoint[/sub])` onto one bank operation.

use axum::http::Method;
use serde_json::Value;
use service::bank::{BankError, BankService, Body};
use tracing::debug;

use crate::errors::ApiError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    Register,
    GetUser(String),
    UpdateUser(String),
    DeleteUser(String),
    ListUsers,
    AdminLogin,
    AddTransaction(String),
    Transactions(String),
    UpdateBalance(String),
    ListFlows,
    CreateFlow,
    UpdateFlow(String),
    DeleteFlow(String),
    ListChecks,
    CreateCheck,
    UpdateCheck(String),
    DeleteCheck(String),
    Setup,
}

fn allow(method: &Method, allowed: Method) -> Result<(), ApiError> {
    if *method == allowed { Ok(()) } else { Err(ApiError::MethodNotAllowed) }
}

fn username(sub: Option<&str>) -> Result<String, ApiError> {
    sub.map(str::to_string).ok_or(ApiError::Bank(BankError::MissingParameter("Username")))
}

impl Route {
    /// Resolve an endpoint path. Empty segments are ignored; only the first two matter.
    pub fn resolve(method: &Method, endpoint: &str) -> Result<Route, ApiError> {
        let mut parts = endpoint.split('/').filter(|s| !s.is_empty());
        let head = parts.next().unwrap_or("");
        let sub = parts.next();

        match head {
            "login" => allow(method, Method::POST).map(|_| Route::Login),
            "register" => allow(method, Method::POST).map(|_| Route::Register),
            "user" => {
                let name = username(sub)?;
                match *method {
                    Method::GET => Ok(Route::GetUser(name)),
                    Method::PUT => Ok(Route::UpdateUser(name)),
                    Method::DELETE => Ok(Route::DeleteUser(name)),
                    _ => Err(ApiError::MethodNotAllowed),
                }
            }
            "users" => allow(method, Method::GET).map(|_| Route::ListUsers),
            "admin" => match sub {
                Some("login") => allow(method, Method::POST).map(|_| Route::AdminLogin),
                _ => Err(ApiError::Unroutable),
            },
            "transaction" => {
                allow(method, Method::POST)?;
                Ok(Route::AddTransaction(username(sub)?))
            }
            "transactions" => {
                allow(method, Method::GET)?;
                Ok(Route::Transactions(username(sub)?))
            }
            "balance" => {
                allow(method, Method::PUT)?;
                Ok(Route::UpdateBalance(username(sub)?))
            }
            "moneyflow" => match (method, sub) {
                (&Method::GET, _) => Ok(Route::ListFlows),
                (&Method::POST, _) => Ok(Route::CreateFlow),
                (&Method::PUT, Some(id)) => Ok(Route::UpdateFlow(id.to_string())),
                (&Method::DELETE, Some(id)) => Ok(Route::DeleteFlow(id.to_string())),
                _ => Err(ApiError::MethodNotAllowed),
            },
            "checkdeposit" => match (method, sub) {
                (&Method::GET, _) => Ok(Route::ListChecks),
                (&Method::POST, _) => Ok(Route::CreateCheck),
                (&Method::PUT, Some(id)) => Ok(Route::UpdateCheck(id.to_string())),
                (&Method::DELETE, Some(id)) => Ok(Route::DeleteCheck(id.to_string())),
                _ => Err(ApiError::MethodNotAllowed),
            },
            "setup" => match *method {
                Method::GET | Method::POST => Ok(Route::Setup),
                _ => Err(ApiError::MethodNotAllowed),
            },
            _ => Err(ApiError::Unroutable),
        }
    }
}

pub async fn dispatch(bank: &BankService, route: Route, body: &Body) -> Result<Value, ApiError> {
    debug!(?route, "dispatching");
    let data = match route {
        Route::Login => bank.login(body).await?,
        Route::Register => bank.register(body).await?,
        Route::GetUser(name) => bank.get_user(&name).await?,
        Route::UpdateUser(name) => bank.update_user(&name, body).await?,
        Route::DeleteUser(name) => bank.delete_user(&name).await?,
        Route::ListUsers => bank.list_users().await?,
        Route::AdminLogin => bank.admin_login(body)?,
        Route::AddTransaction(name) => bank.add_transaction(&name, body).await?,
        Route::Transactions(name) => bank.transactions(&name).await?,
        Route::UpdateBalance(name) => bank.update_balance(&name, body).await?,
        Route::ListFlows => bank.list_flows().await?,
        Route::CreateFlow => bank.create_flow(body).await?,
        Route::UpdateFlow(id) => bank.update_flow(&id, body).await?,
        Route::DeleteFlow(id) => bank.delete_flow(&id).await?,
        Route::ListChecks => bank.list_checks().await?,
        Route::CreateCheck => bank.create_check(body).await?,
        Route::UpdateCheck(id) => bank.update_check(&id, body).await?,
        Route::DeleteCheck(id) => bank.delete_check(&id).await?,
        Route::Setup => bank.setup().await?,
    };
    Ok(data)
}
