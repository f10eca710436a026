use std::collections::HashMap;
use std::time::{Duration, SystemTime};

use anyhow::{Context, Result};
use data_encoding::BASE32_NOPAD;
use futures::stream::TryStreamExt;
use mongodb::bson::{DateTime, doc, oid::ObjectId};
use rand::RngCore;

use crate::models::{Session, User, UserRole};

use super::{AppState, SESSION_TTL_SECONDS};

/// Staff member resolved from a session, with a guaranteed id.
#[derive(Debug, Clone)]
pub struct StaffUser {
    pub id: ObjectId,
    pub email: String,
    pub secret: String,
    pub full_name: String,
    pub role: UserRole,
}

impl TryFrom<User> for StaffUser {
    type Error = anyhow::Error;

    fn try_from(user: User) -> Result<Self> {
        Ok(Self {
            id: user.id.context("user missing _id")?,
            email: user.email,
            secret: user.secret,
            full_name: user.full_name,
            role: user.role,
        })
    }
}

pub async fn find_user(state: &AppState, email: &str) -> Result<Option<StaffUser>> {
    state
        .users
        .find_one(doc! { "email": email })
        .await?
        .map(StaffUser::try_from)
        .transpose()
}

pub async fn list_users(state: &AppState) -> Result<Vec<StaffUser>> {
    let mut cursor = state.users.find(doc! {}).sort(doc! { "email": 1 }).await?;
    let mut users = Vec::new();
    while let Some(user) = cursor.try_next().await? {
        users.push(StaffUser::try_from(user)?);
    }
    Ok(users)
}

/// Display names keyed by user id, used to label "served by" and "collected by" columns.
pub async fn user_names(state: &AppState) -> Result<HashMap<ObjectId, String>> {
    Ok(list_users(state)
        .await?
        .into_iter()
        .map(|u| (u.id, u.full_name))
        .collect())
}

pub async fn create_user(
    state: &AppState,
    email: &str,
    secret: &str,
    full_name: &str,
    role: UserRole,
) -> Result<ObjectId> {
    let res = state
        .users
        .insert_one(User {
            id: None,
            email: email.to_string(),
            secret: secret.to_string(),
            full_name: full_name.to_string(),
            role,
        })
        .await?;
    res.inserted_id
        .as_object_id()
        .context("user insert missing _id")
}

pub async fn create_session(state: &AppState, email: &str) -> Result<String> {
    let _ = state
        .sessions
        .delete_many(doc! { "user_email": email.to_string() })
        .await;

    let mut token_bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut token_bytes);
    let token = BASE32_NOPAD.encode(&token_bytes);

    let expires_at =
        DateTime::from_system_time(SystemTime::now() + Duration::from_secs(SESSION_TTL_SECONDS));

    state
        .sessions
        .insert_one(Session {
            id: None,
            token: token.clone(),
            user_email: email.to_string(),
            expires_at,
        })
        .await?;

    Ok(token)
}

pub async fn find_user_by_session(state: &AppState, token: &str) -> Result<Option<StaffUser>> {
    let Some(session) = state.sessions.find_one(doc! { "token": token }).await? else {
        return Ok(None);
    };
    if session.expires_at.to_system_time() <= SystemTime::now() {
        // Remove expired session, ignore result
        let _ = state.sessions.delete_one(doc! { "token": token }).await;
        return Ok(None);
    }
    find_user(state, &session.user_email).await
}

pub async fn delete_session(state: &AppState, token: &str) -> Result<()> {
    state.sessions.delete_one(doc! { "token": token }).await?;
    Ok(())
}
