use std::{error::Error, fmt::Debug};

use anyhow::Context;
use diesel::{Connection, ExpressionMethods, OptionalExtension, QueryDsl, RunQueryDsl, SelectableHelper};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use uuid::Uuid;

use crate::{domain::status::{AccountRole, AccountStatus}, models::{ConfirmationMap, User, UserProfileInfo}, password::compute_password_hash, schema::{confirmation, users}, telemetry::spawn_blocking_with_tracing, utils::{error_fmt_chain, DbConnection}};

// Function to query user from email id
#[tracing::instrument(
    "Getting user by email",
    skip(conn)
)]
pub async fn get_user_from_email(
    mut conn: DbConnection,
    email_string: String
) -> Result<Option<User>, anyhow::Error> {
    spawn_blocking_with_tracing(move || {
        users::table
            .select(User::as_select())
            .filter(users::email.eq(email_string))
            .first::<User>(&mut conn)
            .optional()
            .context("Failed to query user by email")
    })
    .await
    .context("Failed due to threadpool error")?
}

// Error associated with inserting user to users table
#[derive(Error)]
pub enum UserInsertError{
    #[error("email field is not unique")]
    EmailNotUnique(#[source] diesel::result::Error),
    #[error("Failed to run query")]
    RunQueryError(#[from] diesel::result::Error),
    #[error("unexpected database / hashing error occured")]
    UnexpectedError(#[from] anyhow::Error)
}

impl Debug for UserInsertError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)?;
        error_fmt_chain(f, &self.source())
    }
}

// Inserts a pending user and its confirmation row, returns the confirmation id
#[tracing::instrument(
    "Inserting user into the database",
    skip(conn, password)
)]
pub async fn insert_user_into_database(
    mut conn: DbConnection,
    name: String,
    email: String,
    password: SecretString,
    role: AccountRole
) -> Result<Uuid, UserInsertError> {

    let password_hash = spawn_blocking_with_tracing(move || {
        compute_password_hash(password)
    })
    .await
    .context("Failed due to threadpool error")??;

    let user = User{
        user_id: Uuid::new_v4(),
        name,
        email,
        password: password_hash.expose_secret().to_string(),
        status: Some(AccountStatus::Pending.as_str().to_string()),
        role: role.as_str().to_string(),
        phone_number: None
    };

    spawn_blocking_with_tracing(move || {
        conn.transaction::<_, UserInsertError, _>(|conn| {
            diesel::insert_into(users::table)
                .values(&user)
                .execute(conn)
                .map_err(|e| {
                    match e {
                        diesel::result::Error::DatabaseError(
                            diesel::result::DatabaseErrorKind::UniqueViolation,
                            _
                        ) => UserInsertError::EmailNotUnique(e),
                        _ => UserInsertError::UnexpectedError(
                            anyhow::Error::new(e).context("Failed to insert user")
                        )
                    }
                })?;

            let conf = ConfirmationMap{
                confirmation_id: Uuid::new_v4(),
                user_id: Some(user.user_id)
            };

            diesel::insert_into(confirmation::table)
                .values(&conf)
                .execute(conn)
                .context("Failed to insert confirmation mapping")?;

            Ok(conf.confirmation_id)
        })
    })
    .await
    .context("Failed due to threadpool error")?
}

#[tracing::instrument(
    "Get profile data of logged in user",
    skip(conn)
)]
pub async fn get_user_profile_info(
    mut conn: DbConnection,
    user_id: Uuid
) -> Result<UserProfileInfo, anyhow::Error>{
    spawn_blocking_with_tracing(move || {
        users::table
            .select(UserProfileInfo::as_select())
            .filter(users::user_id.eq(user_id))
            .get_result::<UserProfileInfo>(&mut conn)
            .context("Failed to get UserProfileInfo from database")
    })
    .await
    .context("Failed due to threadpool error")?
}

// Errors associated with updating user profile in database
#[derive(thiserror::Error)]
pub enum PostUserProfileInfoError{
    #[error("Failed due to threadpool error")]
    ThreadpoolError(#[from] tokio::task::JoinError),
    #[error("Failed due to database error")]
    QueryError(#[from] diesel::result::Error)
}

impl Debug for PostUserProfileInfoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)?;
        error_fmt_chain(f, &self.source())
    }
}

impl PostUserProfileInfoError {
    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            PostUserProfileInfoError::QueryError(diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                _
            ))
        )
    }
}

#[tracing::instrument(
    "posting user profile info to db",
    skip_all
)]
pub async fn post_user_profile_info(
    mut conn: DbConnection,
    new_info: UserProfileInfo,
    user_id: Uuid
) -> Result<(), PostUserProfileInfoError>{

    spawn_blocking_with_tracing(move || {
        diesel::update(users::table)
            .set((
                users::email.eq(new_info.email),
                users::name.eq(new_info.name),
                users::phone_number.eq(new_info.phone_number)
            ))
            .filter(users::user_id.eq(user_id))
            .execute(&mut conn)
    })
    .await??;

    Ok(())
}

// Confirms the account behind a confirmation id and consumes the id.
// Returns None when the id is unknown or already used.
#[tracing::instrument(
    "Confirming account",
    skip(conn)
)]
pub async fn confirm_account(
    mut conn: DbConnection,
    confirmation_id: Uuid
) -> Result<Option<Uuid>, anyhow::Error> {
    spawn_blocking_with_tracing(move || {
        conn.transaction::<_, anyhow::Error, _>(|conn| {
            let user_id = diesel::delete(confirmation::table)
                .filter(confirmation::confirmation_id.eq(confirmation_id))
                .returning(confirmation::user_id)
                .get_result::<Option<Uuid>>(conn)
                .optional()
                .context("Failed to consume confirmation id")?
                .flatten();

            let Some(user_id) = user_id else {
                return Ok(None)
            };

            diesel::update(users::table)
                .filter(users::user_id.eq(user_id))
                .set(users::status.eq(AccountStatus::Confirmed.as_str()))
                .execute(conn)
                .context("Failed to update user status")?;

            Ok(Some(user_id))
        })
    })
    .await
    .context("Failed due to threadpool error")?
}
