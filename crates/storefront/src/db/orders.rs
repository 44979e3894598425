//! Order repository.
//!
//! Orders and their items are written in one transaction. Item rows keep the
//! product name and price as they were at order time.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use akf_core::{Money, OrderId, OrderItemId, OrderStatus, PaymentMethod, UserId};

use super::{RepositoryError, to_i32, to_u32};
use crate::models::{NewOrder, Order, OrderItem, OrderWithItems};

const ORDER_COLUMNS: &str = r"
    id, user_id, customer_name, customer_phone, customer_email, customer_address,
    total_amount, payment_method, status, payment_screenshot, created_at
";

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: Option<UserId>,
    customer_name: String,
    customer_phone: String,
    customer_email: Option<String>,
    customer_address: String,
    total_amount: Money,
    payment_method: PaymentMethod,
    status: OrderStatus,
    payment_screenshot: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            customer_name: row.customer_name,
            customer_phone: row.customer_phone,
            customer_email: row.customer_email,
            customer_address: row.customer_address,
            total_amount: row.total_amount,
            payment_method: row.payment_method,
            status: row.status,
            payment_screenshot: row.payment_screenshot,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    id: OrderItemId,
    order_id: OrderId,
    product_id: String,
    product_name: String,
    product_price: Money,
    quantity: i32,
    color_name: Option<String>,
    size: Option<String>,
}

impl TryFrom<OrderItemRow> for OrderItem {
    type Error = RepositoryError;

    fn try_from(row: OrderItemRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            order_id: row.order_id,
            product_id: row.product_id,
            product_name: row.product_name,
            product_price: row.product_price,
            quantity: to_u32(row.quantity, "order quantity")?,
            color_name: row.color_name,
            size: row.size,
        })
    }
}

pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert an order and its items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any insert fails; nothing is
    /// written in that case.
    pub async fn create(&self, order: &NewOrder) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "INSERT INTO storefront.customer_order
                (user_id, customer_name, customer_phone, customer_email, customer_address,
                 total_amount, payment_method, status, payment_screenshot)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(order.user_id)
        .bind(&order.customer_name)
        .bind(&order.customer_phone)
        .bind(&order.customer_email)
        .bind(&order.customer_address)
        .bind(order.total_amount)
        .bind(order.payment_method)
        .bind(OrderStatus::Pending)
        .bind(&order.payment_screenshot)
        .fetch_one(&mut *tx)
        .await?;

        for (position, item) in order.items.iter().enumerate() {
            sqlx::query(
                r"
                INSERT INTO storefront.order_item
                    (order_id, product_id, product_name, product_price, quantity,
                     color_name, size, position)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                ",
            )
            .bind(row.id)
            .bind(&item.product_id)
            .bind(&item.product_name)
            .bind(item.product_price)
            .bind(to_i32(item.quantity)?)
            .bind(&item.color_name)
            .bind(&item.size)
            .bind(i32::try_from(position).unwrap_or(i32::MAX))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(Order::from(row))
    }

    /// An order with its items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<OrderWithItems>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM storefront.customer_order WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(row) => Ok(self.attach_items(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    /// A customer's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<OrderWithItems>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM storefront.customer_order
             WHERE user_id = $1
             ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        self.attach_items(rows).await
    }

    /// Every order, newest first, for the admin table.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<OrderWithItems>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM storefront.customer_order ORDER BY created_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        self.attach_items(rows).await
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    pub async fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE storefront.customer_order
            SET status = $2, updated_at = now()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(status)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM storefront.customer_order")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_with_status(&self, status: OrderStatus) -> Result<i64, RepositoryError> {
        let count =
            sqlx::query_scalar("SELECT COUNT(*) FROM storefront.customer_order WHERE status = $1")
                .bind(status)
                .fetch_one(self.pool)
                .await?;
        Ok(count)
    }

    async fn attach_items(
        &self,
        rows: Vec<OrderRow>,
    ) -> Result<Vec<OrderWithItems>, RepositoryError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<uuid::Uuid> = rows.iter().map(|r| r.id.as_uuid()).collect();
        let item_rows = sqlx::query_as::<_, OrderItemRow>(
            r"
            SELECT id, order_id, product_id, product_name, product_price,
                   quantity, color_name, size
            FROM storefront.order_item
            WHERE order_id = ANY($1)
            ORDER BY position
            ",
        )
        .bind(ids)
        .fetch_all(self.pool)
        .await?;

        let mut by_order: HashMap<OrderId, Vec<OrderItem>> = HashMap::new();
        for item in item_rows {
            let item = OrderItem::try_from(item)?;
            by_order.entry(item.order_id).or_default().push(item);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let items = by_order.remove(&row.id).unwrap_or_default();
                OrderWithItems {
                    order: Order::from(row),
                    items,
                }
            })
            .collect())
    }
}
