use std::{collections::HashMap, error::Error, fmt::Debug};

use chrono::{DateTime, Utc};
use diesel::{
    Connection, ExpressionMethods, OptionalExtension, PgConnection, QueryDsl, RunQueryDsl,
    SelectableHelper
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{db_interaction::{claim_coupon_use, find_coupon_by_code, find_user_address, load_cart_lines, release_coupon_use, CartLine}, domain::{pricing::{evaluate_coupon, order_totals, CouponRejection, OrderTotals, PricedLine}, status::{OrderStatus, PaymentMethod}}, models::{OrderProduct, Payment, SalesOrder}, schema::{cart_items, order_products, payments, products, provinces, sales_orders}, telemetry::spawn_blocking_with_tracing, utils::{error_fmt_chain, DbConnection, PageQuery}};

#[derive(Deserialize, Debug, Clone)]
pub struct PlaceOrder{
    pub address_id: Uuid,
    pub payment_method: PaymentMethod,
    pub coupon_code: Option<String>
}

#[derive(Error)]
pub enum CheckoutError{
    #[error("Tokio threadpool error occured")]
    ThreadpoolError(#[from] tokio::task::JoinError),
    #[error("Failed to run query")]
    RunQueryError(#[from] diesel::result::Error),
    #[error("cart is empty")]
    EmptyCart,
    #[error("address not found")]
    AddressNotFound,
    #[error("product {0} is no longer available")]
    ProductUnavailable(Uuid),
    #[error("product {product_id} has only {stock} left, {requested} requested")]
    InsufficientStock{ product_id: Uuid, requested: i32, stock: i32 },
    #[error("coupon not found")]
    CouponNotFound,
    #[error(transparent)]
    CouponRejected(#[from] CouponRejection)
}

impl Debug for CheckoutError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)?;
        error_fmt_chain(f, &self.source())
    }
}

#[derive(Error)]
pub enum OrderError{
    #[error("Tokio threadpool error occured")]
    ThreadpoolError(#[from] tokio::task::JoinError),
    #[error("Failed to run query")]
    RunQueryError(#[from] diesel::result::Error),
    #[error("order not found")]
    NotFound,
    #[error("order status {0} is not recognised")]
    UnknownStatus(String),
    #[error("order cannot move from {} to {}", from.as_str(), to.as_str())]
    InvalidTransition{ from: OrderStatus, to: OrderStatus }
}

impl Debug for OrderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)?;
        error_fmt_chain(f, &self.source())
    }
}

fn check_stock(lines: &[CartLine]) -> Result<(), CheckoutError> {
    for line in lines {
        if !line.is_active {
            return Err(CheckoutError::ProductUnavailable(line.product_id))
        }
        if line.stock < line.quantity {
            return Err(CheckoutError::InsufficientStock{
                product_id: line.product_id,
                requested: line.quantity,
                stock: line.stock
            })
        }
    }
    Ok(())
}

// Decrements stock only while enough is left, so concurrent checkouts can't oversell
fn take_stock(conn: &mut PgConnection, line: &CartLine) -> Result<(), CheckoutError> {
    let updated = diesel::update(
        products::table
            .filter(products::product_id.eq(line.product_id))
            .filter(products::stock.ge(line.quantity))
    )
    .set(products::stock.eq(products::stock - line.quantity))
    .execute(conn)?;

    if updated == 0 {
        let stock = products::table
            .select(products::stock)
            .filter(products::product_id.eq(line.product_id))
            .first::<i32>(conn)?;

        return Err(CheckoutError::InsufficientStock{
            product_id: line.product_id,
            requested: line.quantity,
            stock
        })
    }
    Ok(())
}

#[tracing::instrument(
    "Placing order from cart",
    skip(conn)
)]
pub async fn place_order(
    mut conn: DbConnection,
    user_id: Uuid,
    request: PlaceOrder,
    now: DateTime<Utc>
) -> Result<SalesOrder, CheckoutError> {
    spawn_blocking_with_tracing(move || {
        conn.transaction::<_, CheckoutError, _>(|conn| {
            let lines = load_cart_lines(conn, user_id)?;
            if lines.is_empty() {
                return Err(CheckoutError::EmptyCart)
            }

            let address = find_user_address(conn, user_id, request.address_id)?
                .ok_or(CheckoutError::AddressNotFound)?;

            check_stock(&lines)?;
            let priced: Vec<PricedLine> = lines.iter().map(CartLine::priced).collect();

            let (coupon_id, discount) = match request.coupon_code.as_deref() {
                Some(code) if !code.trim().is_empty() => {
                    let coupon = find_coupon_by_code(conn, code)?
                        .ok_or(CheckoutError::CouponNotFound)?;
                    let evaluated = evaluate_coupon(&coupon, &priced, now)?;

                    if !claim_coupon_use(conn, coupon.coupon_id)? {
                        return Err(CouponRejection::UsageExhausted.into())
                    }
                    (Some(coupon.coupon_id), evaluated.discount)
                },
                _ => (None, 0)
            };

            let shipping_fee = provinces::table
                .select(provinces::shipping_fee)
                .filter(provinces::province_id.eq(address.address.province_id))
                .first::<i64>(conn)?;

            let OrderTotals{ subtotal, discount, shipping_fee, total } =
                order_totals(&priced, discount, shipping_fee);

            let order = SalesOrder{
                order_id: Uuid::new_v4(),
                user_id,
                order_date: now,
                status: OrderStatus::Pending.as_str().to_string(),
                payment_method: request.payment_method.as_str().to_string(),
                recipient_name: address.address.recipient_name.clone(),
                phone_number: address.address.phone_number.clone(),
                shipping_address: address.full_address.clone(),
                province_id: address.address.province_id,
                subtotal,
                discount,
                shipping_fee,
                total,
                coupon_id,
                tracking_code: None,
                updated_at: now
            };

            diesel::insert_into(sales_orders::table)
                .values(&order)
                .execute(conn)?;

            let items: Vec<OrderProduct> = lines.iter()
                .map(|line| OrderProduct{
                    order_product_id: Uuid::new_v4(),
                    order_id: order.order_id,
                    product_id: line.product_id,
                    seller_id: line.seller_id,
                    quantity: line.quantity,
                    unit_price: line.unit_price
                })
                .collect();

            diesel::insert_into(order_products::table)
                .values(&items)
                .execute(conn)?;

            for line in &lines {
                take_stock(conn, line)?;
            }

            diesel::delete(cart_items::table.filter(cart_items::user_id.eq(user_id)))
                .execute(conn)?;

            Ok(order)
        })
    })
    .await?
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct OrderItemView{
    pub product_id: Uuid,
    pub product_name: String,
    pub seller_id: Uuid,
    pub quantity: i32,
    pub unit_price: i64,
    pub line_total: i64
}

#[derive(Serialize, Deserialize, Debug)]
pub struct OrderWithItems{
    #[serde(flatten)]
    pub order: SalesOrder,
    pub items: Vec<OrderItemView>
}

#[derive(Serialize, Debug)]
pub struct OrderDetail{
    #[serde(flatten)]
    pub order: SalesOrder,
    pub items: Vec<OrderItemView>,
    pub payments: Vec<Payment>
}

fn load_order_items(
    conn: &mut PgConnection,
    order_ids: Vec<Uuid>
) -> diesel::QueryResult<HashMap<Uuid, Vec<OrderItemView>>> {
    let rows = order_products::table
        .inner_join(products::table)
        .filter(order_products::order_id.eq_any(order_ids))
        .select((OrderProduct::as_select(), products::name))
        .order(products::name.asc())
        .load::<(OrderProduct, String)>(conn)?;

    let mut grouped: HashMap<Uuid, Vec<OrderItemView>> = HashMap::new();
    for (item, product_name) in rows {
        grouped.entry(item.order_id).or_default().push(OrderItemView{
            product_id: item.product_id,
            product_name,
            seller_id: item.seller_id,
            quantity: item.quantity,
            unit_price: item.unit_price,
            line_total: item.unit_price * i64::from(item.quantity)
        });
    }
    Ok(grouped)
}

#[tracing::instrument(
    "Listing orders",
    skip(conn)
)]
pub async fn list_orders(
    mut conn: DbConnection,
    user_id: Uuid,
    is_admin: bool,
    page: PageQuery
) -> Result<Vec<OrderWithItems>, OrderError> {
    spawn_blocking_with_tracing(move || {
        let mut query = sales_orders::table
            .select(SalesOrder::as_select())
            .into_boxed();

        if !is_admin {
            query = query.filter(sales_orders::user_id.eq(user_id));
        }

        let orders = query
            .order(sales_orders::order_date.desc())
            .limit(page.limit)
            .offset(page.offset())
            .load::<SalesOrder>(&mut conn)?;

        let order_ids: Vec<Uuid> = orders.iter().map(|order| order.order_id).collect();
        let mut items = load_order_items(&mut conn, order_ids)?;

        Ok(orders.into_iter()
            .map(|order| OrderWithItems{
                items: items.remove(&order.order_id).unwrap_or_default(),
                order
            })
            .collect())
    })
    .await?
}

fn find_visible_order(
    conn: &mut PgConnection,
    order_id: Uuid,
    user_id: Uuid,
    is_admin: bool
) -> Result<SalesOrder, OrderError> {
    let order = sales_orders::table
        .select(SalesOrder::as_select())
        .filter(sales_orders::order_id.eq(order_id))
        .first::<SalesOrder>(conn)
        .optional()?
        .ok_or(OrderError::NotFound)?;

    if !is_admin && order.user_id != user_id {
        return Err(OrderError::NotFound)
    }
    Ok(order)
}

#[tracing::instrument(
    "Getting order detail",
    skip(conn)
)]
pub async fn get_order(
    mut conn: DbConnection,
    order_id: Uuid,
    user_id: Uuid,
    is_admin: bool
) -> Result<OrderDetail, OrderError> {
    spawn_blocking_with_tracing(move || {
        let order = find_visible_order(&mut conn, order_id, user_id, is_admin)?;

        let items = load_order_items(&mut conn, vec![order_id])?
            .remove(&order_id)
            .unwrap_or_default();

        let order_payments = payments::table
            .select(Payment::as_select())
            .filter(payments::order_id.eq(order_id))
            .order(payments::created_at.asc())
            .load::<Payment>(&mut conn)?;

        Ok(OrderDetail{ order, items, payments: order_payments })
    })
    .await?
}

pub(crate) fn lock_order(conn: &mut PgConnection, order_id: Uuid) -> diesel::QueryResult<Option<SalesOrder>> {
    sales_orders::table
        .select(SalesOrder::as_select())
        .filter(sales_orders::order_id.eq(order_id))
        .for_update()
        .first::<SalesOrder>(conn)
        .optional()
}

fn current_status(order: &SalesOrder) -> Result<OrderStatus, OrderError> {
    OrderStatus::parse(&order.status).ok_or_else(|| OrderError::UnknownStatus(order.status.clone()))
}

// Puts the order's quantities back on the shelf
fn restore_stock(conn: &mut PgConnection, order_id: Uuid) -> diesel::QueryResult<()> {
    let lines = order_products::table
        .select((order_products::product_id, order_products::quantity))
        .filter(order_products::order_id.eq(order_id))
        .load::<(Uuid, i32)>(conn)?;

    for (product_id, quantity) in lines {
        diesel::update(products::table.filter(products::product_id.eq(product_id)))
            .set(products::stock.eq(products::stock + quantity))
            .execute(conn)?;
    }
    Ok(())
}

// Moves a locked order to `next`, releasing stock (and the coupon use on cancel)
pub(crate) fn transition_order(
    conn: &mut PgConnection,
    order: &SalesOrder,
    next: OrderStatus,
    tracking_code: Option<&str>
) -> Result<SalesOrder, OrderError> {
    let from = current_status(order)?;
    if !from.can_transition_to(next) {
        return Err(OrderError::InvalidTransition{ from, to: next })
    }

    let target = sales_orders::table.filter(sales_orders::order_id.eq(order.order_id));
    let updated = match tracking_code {
        Some(code) => diesel::update(target)
            .set((
                sales_orders::status.eq(next.as_str()),
                sales_orders::tracking_code.eq(code),
                sales_orders::updated_at.eq(Utc::now())
            ))
            .returning(SalesOrder::as_returning())
            .get_result::<SalesOrder>(conn)?,
        None => diesel::update(target)
            .set((
                sales_orders::status.eq(next.as_str()),
                sales_orders::updated_at.eq(Utc::now())
            ))
            .returning(SalesOrder::as_returning())
            .get_result::<SalesOrder>(conn)?
    };

    if next.releases_stock() {
        restore_stock(conn, order.order_id)?;
    }
    if next == OrderStatus::Cancelled {
        if let Some(coupon_id) = order.coupon_id {
            release_coupon_use(conn, coupon_id)?;
        }
    }

    tracing::info!(order_id = %order.order_id, from = from.as_str(), to = next.as_str(), "Order status changed");
    Ok(updated)
}

#[tracing::instrument(
    "Cancelling order",
    skip(conn)
)]
pub async fn cancel_order(
    mut conn: DbConnection,
    order_id: Uuid,
    user_id: Uuid
) -> Result<SalesOrder, OrderError> {
    spawn_blocking_with_tracing(move || {
        conn.transaction::<_, OrderError, _>(|conn| {
            let order = lock_order(conn, order_id)?
                .filter(|order| order.user_id == user_id)
                .ok_or(OrderError::NotFound)?;

            let from = current_status(&order)?;
            if from != OrderStatus::Pending {
                return Err(OrderError::InvalidTransition{ from, to: OrderStatus::Cancelled })
            }

            transition_order(conn, &order, OrderStatus::Cancelled, None)
        })
    })
    .await?
}

#[tracing::instrument(
    "Updating order status",
    skip(conn)
)]
pub async fn update_order_status(
    mut conn: DbConnection,
    order_id: Uuid,
    next: OrderStatus
) -> Result<SalesOrder, OrderError> {
    spawn_blocking_with_tracing(move || {
        conn.transaction::<_, OrderError, _>(|conn| {
            let order = lock_order(conn, order_id)?.ok_or(OrderError::NotFound)?;
            transition_order(conn, &order, next, None)
        })
    })
    .await?
}

#[tracing::instrument(
    "Assigning tracking code to order",
    skip(conn)
)]
pub async fn assign_tracking_code(
    mut conn: DbConnection,
    order_id: Uuid,
    tracking_code: String
) -> Result<SalesOrder, OrderError> {
    spawn_blocking_with_tracing(move || {
        conn.transaction::<_, OrderError, _>(|conn| {
            let order = lock_order(conn, order_id)?.ok_or(OrderError::NotFound)?;
            transition_order(conn, &order, OrderStatus::Shipping, Some(&tracking_code))
        })
    })
    .await?
}

#[derive(Serialize, Deserialize, Debug)]
pub struct SellerOrderLine{
    pub order_id: Uuid,
    pub order_date: DateTime<Utc>,
    pub status: String,
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: i64,
    pub recipient_name: String,
    pub shipping_address: String
}

#[tracing::instrument(
    "Listing order lines of seller",
    skip(conn)
)]
pub async fn list_seller_order_lines(
    mut conn: DbConnection,
    seller_id: Uuid,
    page: PageQuery
) -> Result<Vec<SellerOrderLine>, OrderError> {
    let rows = spawn_blocking_with_tracing(move || {
        order_products::table
            .inner_join(sales_orders::table)
            .inner_join(products::table)
            .filter(order_products::seller_id.eq(seller_id))
            .select((
                sales_orders::order_id,
                sales_orders::order_date,
                sales_orders::status,
                order_products::product_id,
                products::name,
                order_products::quantity,
                order_products::unit_price,
                sales_orders::recipient_name,
                sales_orders::shipping_address
            ))
            .order((sales_orders::order_date.desc(), order_products::order_product_id.asc()))
            .limit(page.limit)
            .offset(page.offset())
            .load::<(Uuid, DateTime<Utc>, String, Uuid, String, i32, i64, String, String)>(&mut conn)
    })
    .await??;

    Ok(rows.into_iter()
        .map(|(order_id, order_date, status, product_id, product_name, quantity, unit_price, recipient_name, shipping_address)| {
            SellerOrderLine{
                order_id,
                order_date,
                status,
                product_id,
                product_name,
                quantity,
                unit_price,
                recipient_name,
                shipping_address
            }
        })
        .collect())
}

#[tracing::instrument(
    "Loading shipping orders with tracking codes",
    skip_all
)]
pub async fn shipping_orders_with_tracking(
    mut conn: DbConnection
) -> Result<Vec<(Uuid, String)>, OrderError> {
    let rows = spawn_blocking_with_tracing(move || {
        sales_orders::table
            .filter(sales_orders::status.eq(OrderStatus::Shipping.as_str()))
            .filter(sales_orders::tracking_code.is_not_null())
            .select((sales_orders::order_id, sales_orders::tracking_code))
            .load::<(Uuid, Option<String>)>(&mut conn)
    })
    .await??;

    Ok(rows.into_iter()
        .filter_map(|(order_id, code)| code.map(|code| (order_id, code)))
        .collect())
}

// Returns false when the order already left `shipping`
#[tracing::instrument(
    "Applying carrier status to order",
    skip(conn)
)]
pub async fn apply_tracking_status(
    mut conn: DbConnection,
    order_id: Uuid,
    next: OrderStatus
) -> Result<bool, OrderError> {
    spawn_blocking_with_tracing(move || {
        conn.transaction::<_, OrderError, _>(|conn| {
            let order = lock_order(conn, order_id)?.ok_or(OrderError::NotFound)?;
            if current_status(&order)? != OrderStatus::Shipping {
                return Ok(false)
            }

            transition_order(conn, &order, next, None)?;
            Ok(true)
        })
    })
    .await?
}
