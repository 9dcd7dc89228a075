use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use common::{CartId, CartItemId, GuestToken, OrderId, ProductId, UserId, Version};
use domain::{Cart, CartOwner, Money, Order, Product};
use tokio::sync::RwLock;

use crate::{
    Result, StoreError,
    store::{CartStore, CheckoutStore, OrderStore, ProductCatalog},
};

/// In-memory product catalog.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    products: Arc<RwLock<BTreeMap<ProductId, Product>>>,
}

impl InMemoryCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a catalog holding `products`.
    pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        let products = products
            .into_iter()
            .map(|product| (product.id.clone(), product))
            .collect();
        Self {
            products: Arc::new(RwLock::new(products)),
        }
    }

    /// Catalog used when the server runs without a database.
    pub fn demo() -> Self {
        Self::with_products([
            Product::new("SKU-001", "Mechanical Keyboard", Money::from_cents(8999))
                .with_description("Tenkeyless, brown switches")
                .with_image("/images/keyboard.png"),
            Product::new("SKU-002", "Wireless Mouse", Money::from_cents(2999))
                .with_image("/images/mouse.png"),
            Product::new("SKU-003", "USB-C Hub", Money::from_cents(4550))
                .with_description("7 ports, 100W passthrough"),
            Product::new("SKU-004", "Desk Mat", Money::from_cents(1500)),
        ])
    }

    /// Adds or replaces a product.
    pub async fn insert(&self, product: Product) {
        self.products
            .write()
            .await
            .insert(product.id.clone(), product);
    }

    /// Removes a product, returning it if it was present.
    pub async fn remove(&self, id: &ProductId) -> Option<Product> {
        self.products.write().await.remove(id)
    }
}

#[async_trait]
impl ProductCatalog for InMemoryCatalog {
    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>> {
        Ok(self.products.read().await.get(id).cloned())
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        Ok(self.products.read().await.values().cloned().collect())
    }
}

#[derive(Debug, Default)]
struct State {
    carts: HashMap<CartId, Cart>,
    user_carts: HashMap<UserId, CartId>,
    guest_carts: HashMap<GuestToken, CartId>,
    /// Insertion order.
    orders: Vec<Order>,
    fail_on_checkout: bool,
}

impl State {
    fn cart_id_for(&self, owner: &CartOwner) -> Option<CartId> {
        match owner {
            CartOwner::User(user) => self.user_carts.get(user).copied(),
            CartOwner::Guest(token) => self.guest_carts.get(token).copied(),
        }
    }

    /// Checks the stored version and returns the cart as it will be stored.
    fn prepare_cart_write(&self, mut cart: Cart) -> Result<Cart> {
        let cart_id = cart.id().ok_or(StoreError::UnsavedCart)?;
        let stored = self
            .carts
            .get(&cart_id)
            .ok_or(StoreError::CartNotFound(cart_id))?;

        if stored.version() != cart.version() {
            return Err(StoreError::ConcurrencyConflict {
                cart_id,
                expected: cart.version(),
                actual: stored.version(),
            });
        }

        for item in cart.items_mut() {
            if item.id().is_none() {
                item.assign_id(CartItemId::generate());
            }
        }
        let next = cart.version().next();
        cart.mark_saved(cart_id, next);
        Ok(cart)
    }
}

/// In-memory cart and order store for testing and local runs.
///
/// Provides the same interface and guarantees as the PostgreSQL
/// implementation; every operation runs under a single write lock.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the store to fail the next checkouts before writing anything.
    pub async fn set_fail_on_checkout(&self, fail: bool) {
        self.state.write().await.fail_on_checkout = fail;
    }

    /// Returns the number of carts stored.
    pub async fn cart_count(&self) -> usize {
        self.state.read().await.carts.len()
    }

    /// Returns the number of orders stored.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }

    /// Clears all carts and orders.
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        state.carts.clear();
        state.user_carts.clear();
        state.guest_carts.clear();
        state.orders.clear();
    }
}

#[async_trait]
impl CartStore for InMemoryStore {
    async fn find_cart_by_owner(&self, user: UserId) -> Result<Option<Cart>> {
        let state = self.state.read().await;
        Ok(state
            .user_carts
            .get(&user)
            .and_then(|id| state.carts.get(id))
            .cloned())
    }

    async fn find_cart_by_guest_token(&self, token: &GuestToken) -> Result<Option<Cart>> {
        let state = self.state.read().await;
        Ok(state
            .guest_carts
            .get(token)
            .and_then(|id| state.carts.get(id))
            .cloned())
    }

    async fn find_or_create_cart(&self, owner: &CartOwner) -> Result<Cart> {
        let mut state = self.state.write().await;

        if let Some(cart) = state
            .cart_id_for(owner)
            .and_then(|id| state.carts.get(&id))
        {
            return Ok(cart.clone());
        }

        let cart_id = CartId::generate();
        let mut cart = Cart::new(owner.clone());
        cart.mark_saved(cart_id, Version::first());

        match owner {
            CartOwner::User(user) => {
                state.user_carts.insert(*user, cart_id);
            }
            CartOwner::Guest(token) => {
                state.guest_carts.insert(token.clone(), cart_id);
            }
        }
        state.carts.insert(cart_id, cart.clone());

        tracing::debug!(%cart_id, %owner, "Created cart");
        Ok(cart)
    }

    async fn save_cart(&self, cart: Cart) -> Result<Cart> {
        let mut state = self.state.write().await;
        let cart = state.prepare_cart_write(cart)?;
        if let Some(id) = cart.id() {
            state.carts.insert(id, cart.clone());
        }
        Ok(cart)
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn save_order(&self, mut order: Order) -> Result<Order> {
        let mut state = self.state.write().await;
        order.assign_id(OrderId::generate());
        state.orders.push(order.clone());
        Ok(order)
    }

    async fn find_orders_by_owner(&self, user: UserId) -> Result<Vec<Order>> {
        let state = self.state.read().await;
        let mut orders: Vec<_> = state
            .orders
            .iter()
            .rev()
            .filter(|order| order.is_owned_by(user))
            .cloned()
            .collect();
        // Stable sort keeps later inserts first among equal timestamps
        orders.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(orders)
    }

    async fn find_order(&self, id: OrderId) -> Result<Option<Order>> {
        let state = self.state.read().await;
        Ok(state
            .orders
            .iter()
            .find(|order| order.id() == Some(id))
            .cloned())
    }
}

#[async_trait]
impl CheckoutStore for InMemoryStore {
    async fn checkout(&self, mut order: Order, cart: Cart) -> Result<(Order, Cart)> {
        let mut state = self.state.write().await;

        let cart = state.prepare_cart_write(cart)?;
        if state.fail_on_checkout {
            return Err(StoreError::Unavailable(
                "Checkout rejected by store".to_string(),
            ));
        }

        order.assign_id(OrderId::generate());
        if let Some(id) = cart.id() {
            state.carts.insert(id, cart.clone());
        }
        state.orders.push(order.clone());

        Ok((order, cart))
    }
}
