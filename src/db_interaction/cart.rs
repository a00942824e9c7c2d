use std::{error::Error, fmt::Debug};

use chrono::Utc;
use diesel::{
    upsert::excluded, Connection, ExpressionMethods, OptionalExtension, PgConnection, QueryDsl,
    RunQueryDsl, SelectableHelper
};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::{db_interaction::find_active_product, domain::pricing::{subtotal, PricedLine}, models::CartItem, schema::{cart_items, products, subcategories}, telemetry::spawn_blocking_with_tracing, utils::{error_fmt_chain, DbConnection}};

// A cart line joined with the product data needed for display and checkout
#[derive(Serialize, Debug, Clone)]
pub struct CartLine{
    pub product_id: Uuid,
    pub name: String,
    pub unit_price: i64,
    pub quantity: i32,
    pub stock: i32,
    pub is_active: bool,
    pub category_id: Uuid,
    pub seller_id: Uuid,
    pub line_total: i64
}

impl CartLine {
    pub fn priced(&self) -> PricedLine {
        PricedLine{
            product_id: self.product_id,
            category_id: self.category_id,
            unit_price: self.unit_price,
            quantity: self.quantity
        }
    }
}

#[derive(Serialize, Debug)]
pub struct CartView{
    pub items: Vec<CartLine>,
    pub subtotal: i64
}

impl CartView {
    pub fn from_lines(items: Vec<CartLine>) -> Self {
        let priced: Vec<PricedLine> = items.iter().map(CartLine::priced).collect();
        Self{ subtotal: subtotal(&priced), items }
    }
}

#[derive(Error)]
pub enum CartError{
    #[error("Tokio threadpool error occured")]
    ThreadpoolError(#[from] tokio::task::JoinError),
    #[error("Failed to run query")]
    RunQueryError(#[from] diesel::result::Error),
    #[error("product not found")]
    ProductNotFound,
    #[error("product is not in the cart")]
    NotInCart,
    #[error("requested quantity {requested} exceeds stock {stock}")]
    InsufficientStock{ requested: i32, stock: i32 }
}

impl Debug for CartError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)?;
        error_fmt_chain(f, &self.source())
    }
}

pub fn load_cart_lines(conn: &mut PgConnection, user_id: Uuid) -> diesel::QueryResult<Vec<CartLine>> {
    let rows = cart_items::table
        .inner_join(products::table.inner_join(subcategories::table))
        .filter(cart_items::user_id.eq(user_id))
        .select((
            products::product_id,
            products::name,
            products::price,
            cart_items::quantity,
            products::stock,
            products::is_active,
            subcategories::category_id,
            products::seller_id
        ))
        .order(cart_items::added_at.asc())
        .load::<(Uuid, String, i64, i32, i32, bool, Uuid, Uuid)>(conn)?;

    Ok(rows.into_iter()
        .map(|(product_id, name, unit_price, quantity, stock, is_active, category_id, seller_id)| CartLine{
            product_id,
            name,
            unit_price,
            quantity,
            stock,
            is_active,
            category_id,
            seller_id,
            line_total: unit_price * i64::from(quantity)
        })
        .collect())
}

#[tracing::instrument(
    "Getting cart of user",
    skip(conn)
)]
pub async fn get_cart(
    mut conn: DbConnection,
    user_id: Uuid
) -> Result<CartView, CartError> {
    let lines = spawn_blocking_with_tracing(move || {
        load_cart_lines(&mut conn, user_id)
    })
    .await??;

    Ok(CartView::from_lines(lines))
}

#[tracing::instrument(
    "Adding product to cart",
    skip(conn)
)]
pub async fn add_to_cart(
    mut conn: DbConnection,
    user_id: Uuid,
    product_id: Uuid,
    quantity: i32
) -> Result<CartItem, CartError> {
    spawn_blocking_with_tracing(move || {
        conn.transaction::<_, CartError, _>(|conn| {
            let product = find_active_product(conn, product_id)?
                .ok_or(CartError::ProductNotFound)?;

            let existing = cart_items::table
                .select(cart_items::quantity)
                .filter(cart_items::user_id.eq(user_id))
                .filter(cart_items::product_id.eq(product_id))
                .first::<i32>(conn)
                .optional()?
                .unwrap_or(0);

            let requested = existing.checked_add(quantity)
                .filter(|requested| *requested <= product.stock)
                .ok_or(CartError::InsufficientStock{
                    requested: existing.saturating_add(quantity),
                    stock: product.stock
                })?;
            tracing::debug!(requested, "Cart line quantity after add");

            let item = CartItem{
                cart_item_id: Uuid::new_v4(),
                user_id,
                product_id,
                quantity,
                added_at: Utc::now()
            };

            let saved = diesel::insert_into(cart_items::table)
                .values(&item)
                .on_conflict((cart_items::user_id, cart_items::product_id))
                .do_update()
                .set(cart_items::quantity.eq(cart_items::quantity + excluded(cart_items::quantity)))
                .returning(CartItem::as_returning())
                .get_result::<CartItem>(conn)?;

            Ok(saved)
        })
    })
    .await?
}

#[tracing::instrument(
    "Setting cart line quantity",
    skip(conn)
)]
pub async fn set_cart_quantity(
    mut conn: DbConnection,
    user_id: Uuid,
    product_id: Uuid,
    quantity: i32
) -> Result<CartItem, CartError> {
    spawn_blocking_with_tracing(move || {
        let product = find_active_product(&mut conn, product_id)?
            .ok_or(CartError::ProductNotFound)?;

        if quantity > product.stock {
            return Err(CartError::InsufficientStock{ requested: quantity, stock: product.stock })
        }

        diesel::update(
            cart_items::table
                .filter(cart_items::user_id.eq(user_id))
                .filter(cart_items::product_id.eq(product_id))
        )
        .set(cart_items::quantity.eq(quantity))
        .returning(CartItem::as_returning())
        .get_result::<CartItem>(&mut conn)
        .optional()?
        .ok_or(CartError::NotInCart)
    })
    .await?
}

#[tracing::instrument(
    "Removing product from cart",
    skip(conn)
)]
pub async fn remove_from_cart(
    mut conn: DbConnection,
    user_id: Uuid,
    product_id: Uuid
) -> Result<(), CartError> {
    let deleted = spawn_blocking_with_tracing(move || {
        diesel::delete(
            cart_items::table
                .filter(cart_items::user_id.eq(user_id))
                .filter(cart_items::product_id.eq(product_id))
        )
        .execute(&mut conn)
    })
    .await??;

    if deleted == 0 {
        return Err(CartError::NotInCart)
    }

    Ok(())
}
