use async_trait::async_trait;
use common::{GuestToken, OrderId, ProductId, UserId};
use domain::{Cart, CartOwner, Order, Product};

use crate::Result;

/// Read-only view of the product catalog.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Looks up a product by id. Returns None if the catalog has no such product.
    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>>;

    /// Lists every product, ordered by id.
    async fn list_products(&self) -> Result<Vec<Product>>;
}

/// Persistence of cart aggregates.
///
/// All implementations must be thread-safe (Send + Sync). Cart and line ids
/// are minted here and nowhere else.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Retrieves the cart of a registered user.
    async fn find_cart_by_owner(&self, user: UserId) -> Result<Option<Cart>>;

    /// Retrieves the cart of a guest.
    async fn find_cart_by_guest_token(&self, token: &GuestToken) -> Result<Option<Cart>>;

    /// Returns the cart bound to `owner`, creating an empty one if none exists.
    ///
    /// The lookup and the insert form one atomic unit: concurrent callers for
    /// the same owner all receive the same cart. A created cart is returned
    /// at `Version::first()`.
    async fn find_or_create_cart(&self, owner: &CartOwner) -> Result<Cart>;

    /// Writes the lines of an existing cart.
    ///
    /// Fails with `ConcurrencyConflict` unless the stored version equals
    /// `cart.version()`. On success the returned cart carries the next
    /// version and an id on every line.
    async fn save_cart(&self, cart: Cart) -> Result<Cart>;
}

/// Persistence of placed orders.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Inserts a new order and returns it with its assigned id.
    async fn save_order(&self, order: Order) -> Result<Order>;

    /// Retrieves all orders placed by a user, newest first.
    async fn find_orders_by_owner(&self, user: UserId) -> Result<Vec<Order>>;

    /// Retrieves an order by id.
    async fn find_order(&self, id: OrderId) -> Result<Option<Order>>;
}

/// Store able to place an order and empty the source cart as one unit.
#[async_trait]
pub trait CheckoutStore: CartStore + OrderStore {
    /// Inserts `order` and writes the already-emptied `cart` atomically.
    ///
    /// The cart write is version-checked exactly like `save_cart`. If any
    /// part fails, neither the order nor the cart change is visible.
    async fn checkout(&self, order: Order, cart: Cart) -> Result<(Order, Cart)>;
}

/// Extension trait providing convenience methods for cart stores.
#[async_trait]
pub trait CartStoreExt: CartStore {
    /// Looks up the cart bound to `owner` without creating one.
    async fn find_cart(&self, owner: &CartOwner) -> Result<Option<Cart>> {
        match owner {
            CartOwner::User(user) => self.find_cart_by_owner(*user).await,
            CartOwner::Guest(token) => self.find_cart_by_guest_token(token).await,
        }
    }
}

// Blanket implementation for all CartStore implementations
impl<T: CartStore + ?Sized> CartStoreExt for T {}
