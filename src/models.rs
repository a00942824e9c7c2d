use chrono::{DateTime, Utc};
use diesel::prelude::{AsChangeset, Insertable, Queryable, Selectable};
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::schema::{
    cart_items, categories, confirmation, coupons, districts, order_products, payments,
    popular_products, product_reviews, products, provinces, sales_orders, subcategories,
    user_addresses, users, wards
};

#[derive(Queryable, Selectable, Insertable, Clone, Debug)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct User{
    pub user_id : Uuid,
    pub name: String,
    pub email: String,
    pub password: String,
    pub status: Option<String>,
    pub role: String,
    pub phone_number: Option<String>
}

#[derive(Queryable, Selectable, Serialize, Deserialize, Debug)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserProfileInfo{
    pub name: String,
    pub email: String,
    pub phone_number: Option<String>
}

#[derive(Queryable, Selectable, Insertable)]
#[diesel(table_name = confirmation)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ConfirmationMap{
    pub confirmation_id: Uuid,
    pub user_id: Option<Uuid>
}

#[derive(Queryable, Selectable, Insertable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = categories)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Category{
    pub category_id: Uuid,
    pub name: String
}

#[derive(Queryable, Selectable, Insertable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = subcategories)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Subcategory{
    pub subcategory_id: Uuid,
    pub category_id: Uuid,
    pub name: String
}

#[derive(Queryable, Selectable, Insertable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = products)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Product{
    pub product_id: Uuid,
    pub seller_id: Uuid,
    pub subcategory_id: Uuid,
    pub name: String,
    pub description: String,
    pub price: i64,
    pub stock: i32,
    pub photo_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>
}

// Partial update of a product, None fields are left untouched
#[derive(AsChangeset, Deserialize, Debug, Default)]
#[diesel(table_name = products)]
pub struct ProductChangeset{
    pub subcategory_id: Option<Uuid>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub stock: Option<i32>,
    pub photo_url: Option<String>
}

impl ProductChangeset {
    pub fn is_empty(&self) -> bool {
        self.subcategory_id.is_none()
            && self.name.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.stock.is_none()
            && self.photo_url.is_none()
    }
}

#[derive(Queryable, Selectable, Insertable, Serialize, Deserialize, Debug)]
#[diesel(table_name = popular_products)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PopularProduct{
    pub product_id: Uuid,
    pub sold_quantity: i64,
    pub refreshed_at: DateTime<Utc>
}

#[derive(Queryable, Selectable, Insertable, Serialize, Debug, Clone)]
#[diesel(table_name = cart_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CartItem{
    pub cart_item_id: Uuid,
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub added_at: DateTime<Utc>
}

#[derive(Queryable, Selectable, Insertable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = coupons)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Coupon{
    pub coupon_id: Uuid,
    pub code: String,
    pub description: String,
    pub discount_kind: String,
    pub discount_value: i64,
    pub max_discount: Option<i64>,
    pub min_order_value: i64,
    pub category_id: Option<Uuid>,
    pub usage_limit: i32,
    pub used_count: i32,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub is_active: bool
}

#[derive(Queryable, Selectable, Insertable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = provinces)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Province{
    pub province_id: i32,
    pub name: String,
    pub shipping_fee: i64
}

#[derive(Queryable, Selectable, Insertable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = districts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct District{
    pub district_id: i32,
    pub province_id: i32,
    pub name: String
}

#[derive(Queryable, Selectable, Insertable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = wards)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Ward{
    pub ward_id: i32,
    pub district_id: i32,
    pub name: String
}

#[derive(Queryable, Selectable, Insertable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = user_addresses)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserAddress{
    pub address_id: Uuid,
    pub user_id: Uuid,
    pub recipient_name: String,
    pub phone_number: String,
    pub street: String,
    pub ward_id: i32,
    pub district_id: i32,
    pub province_id: i32,
    pub is_default: bool,
    pub created_at: DateTime<Utc>
}

#[derive(Queryable, Selectable, Insertable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = sales_orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SalesOrder{
    pub order_id: Uuid,
    pub user_id: Uuid,
    pub order_date: DateTime<Utc>,
    pub status: String,
    pub payment_method: String,
    pub recipient_name: String,
    pub phone_number: String,
    pub shipping_address: String,
    pub province_id: i32,
    pub subtotal: i64,
    pub discount: i64,
    pub shipping_fee: i64,
    pub total: i64,
    pub coupon_id: Option<Uuid>,
    pub tracking_code: Option<String>,
    pub updated_at: DateTime<Utc>
}

#[derive(Queryable, Selectable, Insertable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = order_products)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderProduct{
    pub order_product_id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub seller_id: Uuid,
    pub quantity: i32,
    pub unit_price: i64
}

#[derive(Queryable, Selectable, Insertable, Serialize, Debug, Clone)]
#[diesel(table_name = payments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Payment{
    pub payment_id: Uuid,
    pub order_id: Uuid,
    pub amount: i64,
    pub provider: String,
    pub transaction_no: Option<String>,
    pub response_code: String,
    pub status: String,
    pub created_at: DateTime<Utc>
}

#[derive(Queryable, Selectable, Insertable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = product_reviews)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProductReview{
    pub review_id: Uuid,
    pub product_id: Uuid,
    pub user_id: Uuid,
    pub rating: i32,
    pub comment: String,
    pub created_at: DateTime<Utc>
}
