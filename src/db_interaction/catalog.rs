use std::{collections::HashMap, error::Error, fmt::Debug};

use anyhow::Context;
use chrono::{DateTime, Utc};
use diesel::{
    dsl::{count_star, sum}, result::DatabaseErrorKind, ExpressionMethods, OptionalExtension,
    PgConnection, PgTextExpressionMethods, QueryDsl, RunQueryDsl, SelectableHelper
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{models::{Category, Product, ProductChangeset, Subcategory}, schema::{categories, popular_products, product_reviews, products, subcategories}, telemetry::spawn_blocking_with_tracing, utils::{error_fmt_chain, DbConnection, PageQuery}};

#[derive(Error)]
pub enum CatalogError{
    #[error("Tokio threadpool error occured")]
    ThreadpoolError(#[from] tokio::task::JoinError),
    #[error("Failed to run query")]
    RunQueryError(#[source] diesel::result::Error),
    #[error("{0} already exists")]
    Duplicate(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("product belongs to another seller")]
    NotOwner
}

impl Debug for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)?;
        error_fmt_chain(f, &self.source())
    }
}

impl From<diesel::result::Error> for CatalogError {
    fn from(e: diesel::result::Error) -> Self {
        match e {
            diesel::result::Error::NotFound => CatalogError::NotFound("record"),
            diesel::result::Error::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
                CatalogError::NotFound("referenced record")
            },
            e => CatalogError::RunQueryError(e)
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct CategoryWithSubcategories{
    pub category_id: Uuid,
    pub name: String,
    pub subcategories: Vec<Subcategory>
}

#[tracing::instrument(
    "Listing categories with subcategories",
    skip_all
)]
pub async fn list_categories(
    mut conn: DbConnection
) -> Result<Vec<CategoryWithSubcategories>, anyhow::Error> {
    let (all_categories, all_subcategories) = spawn_blocking_with_tracing(move || {
        let all_categories = categories::table
            .select(Category::as_select())
            .order(categories::name.asc())
            .load::<Category>(&mut conn)?;

        let all_subcategories = subcategories::table
            .select(Subcategory::as_select())
            .order(subcategories::name.asc())
            .load::<Subcategory>(&mut conn)?;

        Ok::<_, diesel::result::Error>((all_categories, all_subcategories))
    })
    .await
    .context("Failed due to threadpool error")?
    .context("Failed to load categories")?;

    let mut grouped: HashMap<Uuid, Vec<Subcategory>> = HashMap::new();
    for subcategory in all_subcategories {
        grouped.entry(subcategory.category_id).or_default().push(subcategory);
    }

    Ok(all_categories.into_iter()
        .map(|category| CategoryWithSubcategories{
            subcategories: grouped.remove(&category.category_id).unwrap_or_default(),
            category_id: category.category_id,
            name: category.name
        })
        .collect())
}

fn map_unique_violation(e: diesel::result::Error, what: String) -> CatalogError {
    match e {
        diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            CatalogError::Duplicate(what)
        },
        e => e.into()
    }
}

#[tracing::instrument(
    "Inserting category",
    skip(conn)
)]
pub async fn insert_category(
    mut conn: DbConnection,
    name: String
) -> Result<Category, CatalogError> {
    let category = Category{ category_id: Uuid::new_v4(), name };

    spawn_blocking_with_tracing(move || {
        diesel::insert_into(categories::table)
            .values(&category)
            .execute(&mut conn)
            .map_err(|e| map_unique_violation(e, format!("category {}", category.name)))?;

        Ok(category)
    })
    .await?
}

#[tracing::instrument(
    "Inserting subcategory",
    skip(conn)
)]
pub async fn insert_subcategory(
    mut conn: DbConnection,
    category_id: Uuid,
    name: String
) -> Result<Subcategory, CatalogError> {
    let subcategory = Subcategory{ subcategory_id: Uuid::new_v4(), category_id, name };

    spawn_blocking_with_tracing(move || {
        let category_exists: bool = diesel::select(diesel::dsl::exists(
            categories::table.filter(categories::category_id.eq(category_id))
        ))
        .get_result(&mut conn)?;

        if !category_exists {
            return Err(CatalogError::NotFound("category"))
        }

        diesel::insert_into(subcategories::table)
            .values(&subcategory)
            .execute(&mut conn)
            .map_err(|e| map_unique_violation(e, format!("subcategory {}", subcategory.name)))?;

        Ok(subcategory)
    })
    .await?
}

#[derive(Deserialize, Debug, Default, Clone)]
pub struct ProductFilter{
    pub category_id: Option<Uuid>,
    pub subcategory_id: Option<Uuid>,
    pub seller_id: Option<Uuid>,
    pub search: Option<String>
}

// Escapes LIKE wildcards so the search term matches literally
fn like_pattern(term: &str) -> String {
    let escaped = term.trim()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[tracing::instrument(
    "Listing active products",
    skip(conn)
)]
pub async fn list_products(
    mut conn: DbConnection,
    filter: ProductFilter,
    page: PageQuery
) -> Result<Vec<Product>, anyhow::Error> {
    spawn_blocking_with_tracing(move || {
        let mut query = products::table
            .inner_join(subcategories::table)
            .filter(products::is_active.eq(true))
            .select(Product::as_select())
            .into_boxed();

        if let Some(category_id) = filter.category_id {
            query = query.filter(subcategories::category_id.eq(category_id));
        }
        if let Some(subcategory_id) = filter.subcategory_id {
            query = query.filter(products::subcategory_id.eq(subcategory_id));
        }
        if let Some(seller_id) = filter.seller_id {
            query = query.filter(products::seller_id.eq(seller_id));
        }
        if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
            query = query.filter(products::name.ilike(like_pattern(search)));
        }

        query
            .order((products::created_at.desc(), products::product_id.asc()))
            .limit(page.limit)
            .offset(page.offset())
            .load::<Product>(&mut conn)
            .context("Failed to load products")
    })
    .await
    .context("Failed due to threadpool error")?
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ProductDetail{
    #[serde(flatten)]
    pub product: Product,
    pub category_id: Uuid,
    pub average_rating: Option<f64>,
    pub review_count: i64
}

pub fn find_active_product(conn: &mut PgConnection, product_id: Uuid) -> diesel::QueryResult<Option<Product>> {
    products::table
        .select(Product::as_select())
        .filter(products::product_id.eq(product_id))
        .filter(products::is_active.eq(true))
        .first::<Product>(conn)
        .optional()
}

#[tracing::instrument(
    "Getting product detail",
    skip(conn)
)]
pub async fn get_product_detail(
    mut conn: DbConnection,
    product_id: Uuid
) -> Result<ProductDetail, CatalogError> {
    spawn_blocking_with_tracing(move || {
        let product = find_active_product(&mut conn, product_id)?
            .ok_or(CatalogError::NotFound("product"))?;

        let category_id = subcategories::table
            .select(subcategories::category_id)
            .filter(subcategories::subcategory_id.eq(product.subcategory_id))
            .first::<Uuid>(&mut conn)?;

        let (review_count, rating_sum) = product_reviews::table
            .filter(product_reviews::product_id.eq(product_id))
            .select((count_star(), sum(product_reviews::rating)))
            .first::<(i64, Option<i64>)>(&mut conn)?;

        let average_rating = match (review_count, rating_sum) {
            (0, _) | (_, None) => None,
            (count, Some(total)) => Some(total as f64 / count as f64)
        };

        Ok(ProductDetail{ product, category_id, average_rating, review_count })
    })
    .await?
}

#[derive(Deserialize, Debug)]
pub struct NewProduct{
    pub subcategory_id: Uuid,
    pub name: String,
    pub description: String,
    pub price: i64,
    pub stock: i32,
    pub photo_url: Option<String>
}

#[tracing::instrument(
    "Inserting product",
    skip(conn)
)]
pub async fn insert_product(
    mut conn: DbConnection,
    seller_id: Uuid,
    new_product: NewProduct
) -> Result<Product, CatalogError> {
    let product = Product{
        product_id: Uuid::new_v4(),
        seller_id,
        subcategory_id: new_product.subcategory_id,
        name: new_product.name,
        description: new_product.description,
        price: new_product.price,
        stock: new_product.stock,
        photo_url: new_product.photo_url,
        is_active: true,
        created_at: Utc::now()
    };

    spawn_blocking_with_tracing(move || {
        diesel::insert_into(products::table)
            .values(&product)
            .execute(&mut conn)
            .map_err(|e| match e {
                diesel::result::Error::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
                    CatalogError::NotFound("subcategory")
                },
                e => e.into()
            })?;

        Ok(product)
    })
    .await?
}

// Loads a product the caller may manage (its seller or an admin)
fn owned_product(
    conn: &mut PgConnection,
    product_id: Uuid,
    caller: Uuid,
    is_admin: bool
) -> Result<Product, CatalogError> {
    let product = products::table
        .select(Product::as_select())
        .filter(products::product_id.eq(product_id))
        .first::<Product>(conn)
        .optional()?
        .ok_or(CatalogError::NotFound("product"))?;

    if !is_admin && product.seller_id != caller {
        return Err(CatalogError::NotOwner)
    }

    Ok(product)
}

#[tracing::instrument(
    "Updating product",
    skip(conn)
)]
pub async fn update_product(
    mut conn: DbConnection,
    product_id: Uuid,
    caller: Uuid,
    is_admin: bool,
    changes: ProductChangeset
) -> Result<Product, CatalogError> {
    spawn_blocking_with_tracing(move || {
        owned_product(&mut conn, product_id, caller, is_admin)?;

        diesel::update(products::table.filter(products::product_id.eq(product_id)))
            .set(&changes)
            .returning(Product::as_returning())
            .get_result::<Product>(&mut conn)
            .map_err(|e| match e {
                diesel::result::Error::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
                    CatalogError::NotFound("subcategory")
                },
                e => e.into()
            })
    })
    .await?
}

#[tracing::instrument(
    "Deactivating product",
    skip(conn)
)]
pub async fn deactivate_product(
    mut conn: DbConnection,
    product_id: Uuid,
    caller: Uuid,
    is_admin: bool
) -> Result<(), CatalogError> {
    spawn_blocking_with_tracing(move || {
        owned_product(&mut conn, product_id, caller, is_admin)?;

        diesel::update(products::table.filter(products::product_id.eq(product_id)))
            .set(products::is_active.eq(false))
            .execute(&mut conn)?;

        Ok(())
    })
    .await?
}

#[derive(Serialize, Deserialize, Debug)]
pub struct PopularProductEntry{
    #[serde(flatten)]
    pub product: Product,
    pub sold_quantity: i64,
    pub refreshed_at: DateTime<Utc>
}

#[tracing::instrument(
    "Reading popular products cache",
    skip_all
)]
pub async fn get_popular_products(
    mut conn: DbConnection
) -> Result<Vec<PopularProductEntry>, anyhow::Error> {
    let rows = spawn_blocking_with_tracing(move || {
        popular_products::table
            .inner_join(products::table)
            .filter(products::is_active.eq(true))
            .select((Product::as_select(), popular_products::sold_quantity, popular_products::refreshed_at))
            .order((popular_products::sold_quantity.desc(), products::product_id.asc()))
            .load::<(Product, i64, DateTime<Utc>)>(&mut conn)
            .context("Failed to load popular products")
    })
    .await
    .context("Failed due to threadpool error")??;

    Ok(rows.into_iter()
        .map(|(product, sold_quantity, refreshed_at)| PopularProductEntry{ product, sold_quantity, refreshed_at })
        .collect())
}
