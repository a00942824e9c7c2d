use std::{error::Error, fmt::Debug};

use chrono::Utc;
use diesel::{
    Connection, ExpressionMethods, OptionalExtension, PgConnection, QueryDsl, RunQueryDsl,
    SelectableHelper
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{models::UserAddress, schema::{districts, provinces, user_addresses, users, wards}, telemetry::spawn_blocking_with_tracing, utils::{error_fmt_chain, DbConnection}};

#[derive(Error)]
pub enum AddressError{
    #[error("Tokio threadpool error occured")]
    ThreadpoolError(#[from] tokio::task::JoinError),
    #[error("Failed to run query")]
    RunQueryError(#[from] diesel::result::Error),
    #[error("address not found")]
    NotFound,
    #[error("ward, district and province do not match")]
    InvalidLocation
}

impl Debug for AddressError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)?;
        error_fmt_chain(f, &self.source())
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct AddressInput{
    pub recipient_name: String,
    pub phone_number: String,
    pub street: String,
    pub ward_id: i32,
    pub district_id: i32,
    pub province_id: i32
}

#[derive(Serialize, Deserialize, Debug)]
pub struct AddressView{
    #[serde(flatten)]
    pub address: UserAddress,
    pub ward_name: String,
    pub district_name: String,
    pub province_name: String,
    pub full_address: String
}

pub fn format_address(street: &str, ward: &str, district: &str, province: &str) -> String {
    [street, ward, district, province]
        .iter()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

fn load_address_views(
    conn: &mut PgConnection,
    user_id: Uuid,
    address_id: Option<Uuid>
) -> diesel::QueryResult<Vec<AddressView>> {
    let mut query = user_addresses::table
        .inner_join(wards::table)
        .inner_join(districts::table)
        .inner_join(provinces::table)
        .filter(user_addresses::user_id.eq(user_id))
        .select((UserAddress::as_select(), wards::name, districts::name, provinces::name))
        .into_boxed();

    if let Some(address_id) = address_id {
        query = query.filter(user_addresses::address_id.eq(address_id));
    }

    let rows = query
        .order((user_addresses::is_default.desc(), user_addresses::created_at.desc()))
        .load::<(UserAddress, String, String, String)>(conn)?;

    Ok(rows.into_iter()
        .map(|(address, ward_name, district_name, province_name)| AddressView{
            full_address: format_address(&address.street, &ward_name, &district_name, &province_name),
            address,
            ward_name,
            district_name,
            province_name
        })
        .collect())
}

// Used by checkout: the caller's address with its formatted text
pub fn find_user_address(
    conn: &mut PgConnection,
    user_id: Uuid,
    address_id: Uuid
) -> diesel::QueryResult<Option<AddressView>> {
    Ok(load_address_views(conn, user_id, Some(address_id))?.into_iter().next())
}

fn validate_location(conn: &mut PgConnection, input: &AddressInput) -> Result<(), AddressError> {
    let ward_district = wards::table
        .select(wards::district_id)
        .filter(wards::ward_id.eq(input.ward_id))
        .first::<i32>(conn)
        .optional()?;

    let district_province = districts::table
        .select(districts::province_id)
        .filter(districts::district_id.eq(input.district_id))
        .first::<i32>(conn)
        .optional()?;

    match (ward_district, district_province) {
        (Some(d), Some(p)) if d == input.district_id && p == input.province_id => Ok(()),
        _ => Err(AddressError::InvalidLocation)
    }
}

// Serializes default-address changes of one user behind the user row lock
fn lock_user(conn: &mut PgConnection, user_id: Uuid) -> diesel::QueryResult<()> {
    users::table
        .select(users::user_id)
        .filter(users::user_id.eq(user_id))
        .for_update()
        .first::<Uuid>(conn)
        .optional()?;
    Ok(())
}

#[tracing::instrument(
    "Listing addresses of user",
    skip(conn)
)]
pub async fn list_addresses(
    mut conn: DbConnection,
    user_id: Uuid
) -> Result<Vec<AddressView>, AddressError> {
    Ok(spawn_blocking_with_tracing(move || {
        load_address_views(&mut conn, user_id, None)
    })
    .await??)
}

#[tracing::instrument(
    "Inserting address",
    skip(conn)
)]
pub async fn insert_address(
    mut conn: DbConnection,
    user_id: Uuid,
    input: AddressInput
) -> Result<UserAddress, AddressError> {
    spawn_blocking_with_tracing(move || {
        conn.transaction::<_, AddressError, _>(|conn| {
            validate_location(conn, &input)?;
            lock_user(conn, user_id)?;

            let has_default: bool = diesel::select(diesel::dsl::exists(
                user_addresses::table
                    .filter(user_addresses::user_id.eq(user_id))
                    .filter(user_addresses::is_default.eq(true))
            ))
            .get_result(conn)?;

            let address = UserAddress{
                address_id: Uuid::new_v4(),
                user_id,
                recipient_name: input.recipient_name,
                phone_number: input.phone_number,
                street: input.street,
                ward_id: input.ward_id,
                district_id: input.district_id,
                province_id: input.province_id,
                is_default: !has_default,
                created_at: Utc::now()
            };

            diesel::insert_into(user_addresses::table)
                .values(&address)
                .execute(conn)?;

            Ok(address)
        })
    })
    .await?
}

#[tracing::instrument(
    "Updating address",
    skip(conn)
)]
pub async fn update_address(
    mut conn: DbConnection,
    user_id: Uuid,
    address_id: Uuid,
    input: AddressInput
) -> Result<UserAddress, AddressError> {
    spawn_blocking_with_tracing(move || {
        validate_location(&mut conn, &input)?;

        diesel::update(
            user_addresses::table
                .filter(user_addresses::address_id.eq(address_id))
                .filter(user_addresses::user_id.eq(user_id))
        )
        .set((
            user_addresses::recipient_name.eq(input.recipient_name),
            user_addresses::phone_number.eq(input.phone_number),
            user_addresses::street.eq(input.street),
            user_addresses::ward_id.eq(input.ward_id),
            user_addresses::district_id.eq(input.district_id),
            user_addresses::province_id.eq(input.province_id)
        ))
        .returning(UserAddress::as_returning())
        .get_result::<UserAddress>(&mut conn)
        .optional()?
        .ok_or(AddressError::NotFound)
    })
    .await?
}

#[tracing::instrument(
    "Deleting address",
    skip(conn)
)]
pub async fn delete_address(
    mut conn: DbConnection,
    user_id: Uuid,
    address_id: Uuid
) -> Result<(), AddressError> {
    spawn_blocking_with_tracing(move || {
        conn.transaction::<_, AddressError, _>(|conn| {
            lock_user(conn, user_id)?;

            let was_default = diesel::delete(
                user_addresses::table
                    .filter(user_addresses::address_id.eq(address_id))
                    .filter(user_addresses::user_id.eq(user_id))
            )
            .returning(user_addresses::is_default)
            .get_result::<bool>(conn)
            .optional()?
            .ok_or(AddressError::NotFound)?;

            if was_default {
                let newest = user_addresses::table
                    .select(user_addresses::address_id)
                    .filter(user_addresses::user_id.eq(user_id))
                    .order(user_addresses::created_at.desc())
                    .first::<Uuid>(conn)
                    .optional()?;

                if let Some(newest) = newest {
                    diesel::update(user_addresses::table.filter(user_addresses::address_id.eq(newest)))
                        .set(user_addresses::is_default.eq(true))
                        .execute(conn)?;
                }
            }

            Ok(())
        })
    })
    .await?
}

#[tracing::instrument(
    "Setting default address",
    skip(conn)
)]
pub async fn set_default_address(
    mut conn: DbConnection,
    user_id: Uuid,
    address_id: Uuid
) -> Result<(), AddressError> {
    spawn_blocking_with_tracing(move || {
        conn.transaction::<_, AddressError, _>(|conn| {
            lock_user(conn, user_id)?;

            let exists: bool = diesel::select(diesel::dsl::exists(
                user_addresses::table
                    .filter(user_addresses::address_id.eq(address_id))
                    .filter(user_addresses::user_id.eq(user_id))
            ))
            .get_result(conn)?;

            if !exists {
                return Err(AddressError::NotFound)
            }

            diesel::update(
                user_addresses::table
                    .filter(user_addresses::user_id.eq(user_id))
                    .filter(user_addresses::is_default.eq(true))
            )
            .set(user_addresses::is_default.eq(false))
            .execute(conn)?;

            diesel::update(user_addresses::table.filter(user_addresses::address_id.eq(address_id)))
                .set(user_addresses::is_default.eq(true))
                .execute(conn)?;

            Ok(())
        })
    })
    .await?
}
