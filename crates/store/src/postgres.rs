use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{CartId, CartItemId, GuestToken, OrderId, ProductId, UserId, Version};
use domain::{Cart, CartItem, CartOwner, Money, Order, OrderItem, OrderStatus, Product};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};
use uuid::Uuid;

use crate::{
    Result, StoreError,
    store::{CartStore, CheckoutStore, OrderStore, ProductCatalog},
};

const CART_COLUMNS: &str = "id, owner_user_id, guest_token, version";

/// PostgreSQL-backed store implementation.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Inserts a product or replaces the stored one with the same id.
    pub async fn upsert_product(&self, product: &Product) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, description, image_url, unit_price)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE
            SET name = EXCLUDED.name,
                description = EXCLUDED.description,
                image_url = EXCLUDED.image_url,
                unit_price = EXCLUDED.unit_price
            "#,
        )
        .bind(product.id.as_str())
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.image_url)
        .bind(product.unit_price.amount())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    fn row_to_product(row: PgRow) -> Result<Product> {
        Ok(Product {
            id: ProductId::new(row.try_get::<String, _>("id")?),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            image_url: row.try_get("image_url")?,
            unit_price: Money::new(row.try_get::<Decimal, _>("unit_price")?),
        })
    }

    fn row_to_owner(row: &PgRow) -> Result<CartOwner> {
        let user: Option<Uuid> = row.try_get("owner_user_id")?;
        let token: Option<String> = row.try_get("guest_token")?;
        match (user, token) {
            (Some(user), None) => Ok(CartOwner::User(UserId::from_uuid(user))),
            (None, Some(token)) => GuestToken::new(token)
                .map(CartOwner::Guest)
                .map_err(|e| StoreError::Corrupt(e.to_string())),
            _ => Err(StoreError::Corrupt(
                "cart row must have exactly one owner".to_string(),
            )),
        }
    }

    fn row_to_cart_item(row: PgRow) -> Result<CartItem> {
        let quantity = decode_quantity(row.try_get("quantity")?)?;
        CartItem::restore(
            CartItemId::from_uuid(row.try_get("id")?),
            ProductId::new(row.try_get::<String, _>("product_id")?),
            row.try_get("product_name")?,
            row.try_get("image_url")?,
            Money::new(row.try_get::<Decimal, _>("unit_price")?),
            quantity,
        )
        .map_err(|e| StoreError::Corrupt(e.to_string()))
    }

    fn row_to_order_item(row: PgRow) -> Result<OrderItem> {
        Ok(OrderItem {
            product_id: ProductId::new(row.try_get::<String, _>("product_id")?),
            product_name: row.try_get("product_name")?,
            quantity: decode_quantity(row.try_get("quantity")?)?,
            line_total: Money::new(row.try_get::<Decimal, _>("line_total")?),
        })
    }

    /// Loads a cart row and its lines from one snapshot.
    ///
    /// Both reads share a `REPEATABLE READ` transaction, so the version and
    /// the lines always belong to the same committed write.
    async fn load_cart(&self, owner: &CartOwner) -> Result<Option<Cart>> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;

        let row = match owner {
            CartOwner::User(user) => {
                sqlx::query(&format!(
                    "SELECT {CART_COLUMNS} FROM carts WHERE owner_user_id = $1"
                ))
                .bind(user.as_uuid())
                .fetch_optional(&mut *tx)
                .await?
            }
            CartOwner::Guest(token) => {
                sqlx::query(&format!(
                    "SELECT {CART_COLUMNS} FROM carts WHERE guest_token = $1"
                ))
                .bind(token.as_str())
                .fetch_optional(&mut *tx)
                .await?
            }
        };
        let Some(row) = row else {
            tx.commit().await?;
            return Ok(None);
        };

        let cart_id = CartId::from_uuid(row.try_get("id")?);
        let owner = Self::row_to_owner(&row)?;
        let version = Version::new(row.try_get("version")?);

        let items = sqlx::query(
            r#"
            SELECT id, product_id, product_name, image_url, unit_price, quantity
            FROM cart_items
            WHERE cart_id = $1
            "#,
        )
        .bind(cart_id.as_uuid())
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .map(Self::row_to_cart_item)
        .collect::<Result<Vec<_>>>()?;
        tx.commit().await?;

        Cart::restore(cart_id, owner, items, version)
            .map(Some)
            .map_err(|e| StoreError::Corrupt(e.to_string()))
    }

    async fn hydrate_order(&self, row: PgRow) -> Result<Order> {
        let order_id = OrderId::from_uuid(row.try_get("id")?);
        let status: String = row.try_get("status")?;
        let status: OrderStatus = status
            .parse()
            .map_err(|e: domain::UnknownOrderStatus| StoreError::Corrupt(e.to_string()))?;

        let items = sqlx::query(
            r#"
            SELECT product_id, product_name, quantity, line_total
            FROM order_items
            WHERE order_id = $1
            ORDER BY position ASC
            "#,
        )
        .bind(order_id.as_uuid())
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Self::row_to_order_item)
        .collect::<Result<Vec<_>>>()?;

        Ok(Order::restore(
            order_id,
            UserId::from_uuid(row.try_get("owner_user_id")?),
            row.try_get::<DateTime<Utc>, _>("created_at")?,
            status,
            Money::new(row.try_get::<Decimal, _>("total_amount")?),
            items,
        ))
    }

    /// Version-checked rewrite of a cart's lines inside `tx`.
    async fn write_cart(tx: &mut Transaction<'_, Postgres>, mut cart: Cart) -> Result<Cart> {
        let cart_id = cart.id().ok_or(StoreError::UnsavedCart)?;
        let expected = cart.version();

        let bumped: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE carts
            SET version = version + 1, updated_at = NOW()
            WHERE id = $1 AND version = $2
            RETURNING version
            "#,
        )
        .bind(cart_id.as_uuid())
        .bind(expected.as_i64())
        .fetch_optional(&mut **tx)
        .await?;

        let Some(bumped) = bumped else {
            let actual: Option<i64> = sqlx::query_scalar("SELECT version FROM carts WHERE id = $1")
                .bind(cart_id.as_uuid())
                .fetch_optional(&mut **tx)
                .await?;
            return Err(match actual {
                Some(actual) => {
                    tracing::debug!(%cart_id, %expected, actual, "Stale cart write");
                    StoreError::ConcurrencyConflict {
                        cart_id,
                        expected,
                        actual: Version::new(actual),
                    }
                }
                None => StoreError::CartNotFound(cart_id),
            });
        };

        sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
            .bind(cart_id.as_uuid())
            .execute(&mut **tx)
            .await?;

        for item in cart.items_mut() {
            let item_id = match item.id() {
                Some(id) => id,
                None => {
                    let id = CartItemId::generate();
                    item.assign_id(id);
                    id
                }
            };

            sqlx::query(
                r#"
                INSERT INTO cart_items (id, cart_id, product_id, product_name, image_url, unit_price, quantity, line_total)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(item_id.as_uuid())
            .bind(cart_id.as_uuid())
            .bind(item.product_id().as_str())
            .bind(item.product_name())
            .bind(item.image_url())
            .bind(item.unit_price().amount())
            .bind(i64::from(item.quantity()))
            .bind(item.line_total().amount())
            .execute(&mut **tx)
            .await?;
        }

        cart.mark_saved(cart_id, Version::new(bumped));
        Ok(cart)
    }

    async fn insert_order(tx: &mut Transaction<'_, Postgres>, mut order: Order) -> Result<Order> {
        let order_id = OrderId::generate();

        sqlx::query(
            r#"
            INSERT INTO orders (id, owner_user_id, status, total_amount, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(order_id.as_uuid())
        .bind(order.owner().as_uuid())
        .bind(order.status().as_str())
        .bind(order.total_amount().amount())
        .bind(order.created_at())
        .execute(&mut **tx)
        .await?;

        for (position, item) in order.items().iter().enumerate() {
            let position = i32::try_from(position)
                .map_err(|_| StoreError::Corrupt("order has too many lines".to_string()))?;

            sqlx::query(
                r#"
                INSERT INTO order_items (order_id, position, product_id, product_name, quantity, line_total)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(order_id.as_uuid())
            .bind(position)
            .bind(item.product_id.as_str())
            .bind(&item.product_name)
            .bind(i64::from(item.quantity))
            .bind(item.line_total.amount())
            .execute(&mut **tx)
            .await?;
        }

        order.assign_id(order_id);
        Ok(order)
    }
}

fn decode_quantity(raw: i64) -> Result<u32> {
    u32::try_from(raw).map_err(|_| StoreError::Corrupt(format!("quantity out of range: {raw}")))
}

#[async_trait]
impl ProductCatalog for PostgresStore {
    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>> {
        let row = sqlx::query(
            "SELECT id, name, description, image_url, unit_price FROM products WHERE id = $1",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_product).transpose()
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        sqlx::query(
            "SELECT id, name, description, image_url, unit_price FROM products ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Self::row_to_product)
        .collect()
    }
}

#[async_trait]
impl CartStore for PostgresStore {
    async fn find_cart_by_owner(&self, user: UserId) -> Result<Option<Cart>> {
        self.load_cart(&CartOwner::User(user)).await
    }

    async fn find_cart_by_guest_token(&self, token: &GuestToken) -> Result<Option<Cart>> {
        self.load_cart(&CartOwner::Guest(token.clone())).await
    }

    async fn find_or_create_cart(&self, owner: &CartOwner) -> Result<Cart> {
        // Losing a race on the unique owner columns turns the insert into a no-op
        let inserted = sqlx::query(
            r#"
            INSERT INTO carts (id, owner_user_id, guest_token, version)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(CartId::generate().as_uuid())
        .bind(owner.user_id().map(|user| user.as_uuid()))
        .bind(owner.guest_token().map(GuestToken::as_str))
        .bind(Version::first().as_i64())
        .execute(&self.pool)
        .await?
        .rows_affected();

        if inserted > 0 {
            tracing::debug!(%owner, "Created cart");
        }

        self.load_cart(owner)
            .await?
            .ok_or_else(|| StoreError::Corrupt(format!("cart for {owner} vanished after insert")))
    }

    async fn save_cart(&self, cart: Cart) -> Result<Cart> {
        let mut tx = self.pool.begin().await?;
        let cart = Self::write_cart(&mut tx, cart).await?;
        tx.commit().await?;
        Ok(cart)
    }
}

#[async_trait]
impl OrderStore for PostgresStore {
    async fn save_order(&self, order: Order) -> Result<Order> {
        let mut tx = self.pool.begin().await?;
        let order = Self::insert_order(&mut tx, order).await?;
        tx.commit().await?;
        Ok(order)
    }

    async fn find_orders_by_owner(&self, user: UserId) -> Result<Vec<Order>> {
        let rows = sqlx::query(
            r#"
            SELECT id, owner_user_id, status, total_amount, created_at
            FROM orders
            WHERE owner_user_id = $1
            ORDER BY created_at DESC, seq DESC
            "#,
        )
        .bind(user.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            orders.push(self.hydrate_order(row).await?);
        }
        Ok(orders)
    }

    async fn find_order(&self, id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(
            r#"
            SELECT id, owner_user_id, status, total_amount, created_at
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => self.hydrate_order(row).await.map(Some),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl CheckoutStore for PostgresStore {
    async fn checkout(&self, order: Order, cart: Cart) -> Result<(Order, Cart)> {
        let mut tx = self.pool.begin().await?;

        // Cart first: a stale cart aborts before the order row exists
        let cart = Self::write_cart(&mut tx, cart).await?;
        let order = Self::insert_order(&mut tx, order).await?;

        tx.commit().await?;
        Ok((order, cart))
    }
}
