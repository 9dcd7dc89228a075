//! Integration tests for cart resolution, mutation and checkout.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use checkout::{CartService, CheckoutService, ServiceError, StorefrontConfig};
use common::{GuestToken, IdentityEvidence, OrderId, ProductId, UserId};
use domain::{Cart, CartOwner, Money, Order, Product};
use rust_decimal_macros::dec;
use store::{CartStore, CheckoutStore, InMemoryCatalog, InMemoryStore, OrderStore, StoreError};

struct TestHarness {
    store: InMemoryStore,
    carts: CartService<InMemoryStore, InMemoryCatalog>,
    checkout: CheckoutService<InMemoryStore>,
}

impl TestHarness {
    fn new() -> Self {
        Self::with_config(StorefrontConfig::default())
    }

    fn with_config(config: StorefrontConfig) -> Self {
        let store = InMemoryStore::new();
        let catalog = InMemoryCatalog::with_products([
            Product::new("P1", "Monitor", Money::new(dec!(100.00))),
            Product::new("LAMP", "Lamp", Money::new(dec!(50.00))),
            Product::new("BULB", "Bulb", Money::new(dec!(30.00))),
            Product::new("PEN", "Pen", Money::new(dec!(0.10))),
        ]);

        Self {
            carts: CartService::new(store.clone(), catalog, config),
            checkout: CheckoutService::new(store.clone(), config),
            store,
        }
    }
}

fn user(id: UserId) -> IdentityEvidence {
    IdentityEvidence::User(id)
}

fn assert_totals_consistent(cart: &Cart) {
    let price = Money::checked_sum(cart.items().map(|item| item.line_total())).unwrap();
    let count: u64 = cart.items().map(|item| u64::from(item.quantity())).sum();
    assert_eq!(cart.total_price(), price);
    assert_eq!(cart.total_items(), count);
}

#[tokio::test]
async fn test_add_merge_update_then_empty_checkout() {
    let h = TestHarness::new();
    let user_id = UserId::generate();
    let p1 = ProductId::new("P1");

    let cart = h.carts.add_item(&user(user_id), &p1, 2).await.unwrap();
    assert_eq!(cart.line_count(), 1);
    assert_eq!(cart.item(&p1).unwrap().line_total(), Money::new(dec!(200.00)));
    assert_eq!(cart.total_price(), Money::new(dec!(200.00)));

    let cart = h.carts.add_item(&user(user_id), &p1, 3).await.unwrap();
    assert_eq!(cart.item(&p1).unwrap().quantity(), 5);
    assert_eq!(cart.item(&p1).unwrap().line_total(), Money::new(dec!(500.00)));

    let cart = h
        .carts
        .update_quantity(&user(user_id), &p1, 0)
        .await
        .unwrap();
    assert!(cart.item(&p1).is_none());
    assert_eq!(cart.total_price(), Money::new(dec!(0.00)));

    let result = h.checkout.checkout(user_id).await;
    assert!(matches!(result, Err(ServiceError::EmptyCart)));
    assert_eq!(h.store.order_count().await, 0);
}

#[tokio::test]
async fn test_checkout_snapshots_cart_and_empties_it() {
    let h = TestHarness::new();
    let user_id = UserId::generate();

    h.carts
        .add_item(&user(user_id), &ProductId::new("LAMP"), 1)
        .await
        .unwrap();
    h.carts
        .add_item(&user(user_id), &ProductId::new("BULB"), 2)
        .await
        .unwrap();

    let order = h.checkout.checkout(user_id).await.unwrap();
    assert_eq!(order.items().len(), 2);
    assert_eq!(order.total_amount(), Money::new(dec!(110.00)));

    let cart = h.carts.get_cart(&user(user_id)).await.unwrap();
    assert!(cart.is_empty());
    assert_eq!(cart.total_price(), Money::zero());

    let history = h.checkout.list_orders(user_id).await.unwrap();
    assert_eq!(history, vec![order]);
}

#[tokio::test]
async fn test_failed_checkout_leaves_cart_untouched() {
    let h = TestHarness::new();
    let user_id = UserId::generate();
    h.carts
        .add_item(&user(user_id), &ProductId::new("LAMP"), 3)
        .await
        .unwrap();
    let before = h.carts.get_cart(&user(user_id)).await.unwrap();

    h.store.set_fail_on_checkout(true).await;
    let result = h.checkout.checkout(user_id).await;

    assert!(matches!(
        result,
        Err(ServiceError::Store(StoreError::Unavailable(_)))
    ));
    assert_eq!(h.carts.get_cart(&user(user_id)).await.unwrap(), before);
    assert!(h.checkout.list_orders(user_id).await.unwrap().is_empty());

    h.store.set_fail_on_checkout(false).await;
    let order = h.checkout.checkout(user_id).await.unwrap();
    assert_eq!(order.total_amount(), Money::new(dec!(150.00)));
}

#[tokio::test]
async fn test_repeated_decimal_additions_are_exact() {
    let h = TestHarness::new();
    let guest = IdentityEvidence::Guest(GuestToken::new("decimal-guest").unwrap());
    let pen = ProductId::new("PEN");

    let mut cart = h.carts.get_cart(&guest).await.unwrap();
    for _ in 0..10 {
        cart = h.carts.add_item(&guest, &pen, 1).await.unwrap();
        assert_totals_consistent(&cart);
    }

    assert_eq!(cart.item(&pen).unwrap().line_total(), Money::new(dec!(1.00)));
    assert_eq!(cart.total_price(), Money::new(dec!(1.00)));
}

#[tokio::test]
async fn test_add_is_associative_on_quantity() {
    let h = TestHarness::new();
    let lamp = ProductId::new("LAMP");
    let split = user(UserId::generate());
    let whole = user(UserId::generate());

    h.carts.add_item(&split, &lamp, 2).await.unwrap();
    let split_cart = h.carts.add_item(&split, &lamp, 5).await.unwrap();
    let whole_cart = h.carts.add_item(&whole, &lamp, 7).await.unwrap();

    let split_item = split_cart.item(&lamp).unwrap();
    let whole_item = whole_cart.item(&lamp).unwrap();
    assert_eq!(split_item.quantity(), whole_item.quantity());
    assert_eq!(split_item.line_total(), whole_item.line_total());
    assert_eq!(split_cart.total_price(), whole_cart.total_price());
}

#[tokio::test]
async fn test_totals_consistent_across_mixed_operations() {
    let h = TestHarness::new();
    let guest = IdentityEvidence::Guest(GuestToken::new("mixed").unwrap());

    let steps: Vec<Cart> = vec![
        h.carts
            .add_item(&guest, &ProductId::new("LAMP"), 2)
            .await
            .unwrap(),
        h.carts
            .add_item(&guest, &ProductId::new("BULB"), 4)
            .await
            .unwrap(),
        h.carts
            .update_quantity(&guest, &ProductId::new("LAMP"), 1)
            .await
            .unwrap(),
        h.carts
            .remove_item(&guest, &ProductId::new("BULB"))
            .await
            .unwrap(),
        h.carts
            .add_item(&guest, &ProductId::new("PEN"), 3)
            .await
            .unwrap(),
        h.carts.clear(&guest).await.unwrap(),
    ];

    for cart in &steps {
        assert_totals_consistent(cart);
    }
    assert!(steps.last().unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_access_resolves_one_cart() {
    let h = Arc::new(TestHarness::new());
    let identity = IdentityEvidence::Guest(GuestToken::new("racer").unwrap());

    let mut handles = Vec::new();
    for _ in 0..16 {
        let h = h.clone();
        let identity = identity.clone();
        handles.push(tokio::spawn(async move {
            h.carts.get_cart(&identity).await.unwrap().id()
        }));
    }

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap());
    }

    assert!(ids.iter().all(|id| id.is_some() && *id == ids[0]));
    assert_eq!(h.store.cart_count().await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_adds_lose_no_updates() {
    let h = Arc::new(TestHarness::with_config(StorefrontConfig {
        max_conflict_retries: 100,
    }));
    let user_id = UserId::generate();
    let lamp = ProductId::new("LAMP");

    let mut handles = Vec::new();
    for _ in 0..10 {
        let h = h.clone();
        let lamp = lamp.clone();
        handles.push(tokio::spawn(async move {
            h.carts.add_item(&user(user_id), &lamp, 1).await.unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let cart = h.carts.get_cart(&user(user_id)).await.unwrap();
    assert_eq!(cart.item(&lamp).unwrap().quantity(), 10);
    assert_eq!(cart.total_price(), Money::new(dec!(500.00)));
}

/// Store whose cart writes and checkouts lose the version race a fixed
/// number of times.
#[derive(Clone)]
struct ContendedStore {
    inner: InMemoryStore,
    save_conflicts: Arc<AtomicU32>,
    checkout_conflicts: Arc<AtomicU32>,
}

impl ContendedStore {
    fn new(save_conflicts: u32) -> Self {
        Self {
            inner: InMemoryStore::new(),
            save_conflicts: Arc::new(AtomicU32::new(save_conflicts)),
            checkout_conflicts: Arc::new(AtomicU32::new(0)),
        }
    }

    fn arm_checkout_conflicts(&self, conflicts: u32) {
        self.checkout_conflicts.store(conflicts, Ordering::SeqCst);
    }
}

fn lose_race(counter: &AtomicU32, cart: &Cart) -> store::Result<()> {
    let lost = counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok();
    if lost {
        return Err(StoreError::ConcurrencyConflict {
            cart_id: cart.id().ok_or(StoreError::UnsavedCart)?,
            expected: cart.version(),
            actual: cart.version().next(),
        });
    }
    Ok(())
}

#[async_trait]
impl CartStore for ContendedStore {
    async fn find_cart_by_owner(&self, user: UserId) -> store::Result<Option<Cart>> {
        self.inner.find_cart_by_owner(user).await
    }

    async fn find_cart_by_guest_token(&self, token: &GuestToken) -> store::Result<Option<Cart>> {
        self.inner.find_cart_by_guest_token(token).await
    }

    async fn find_or_create_cart(&self, owner: &CartOwner) -> store::Result<Cart> {
        self.inner.find_or_create_cart(owner).await
    }

    async fn save_cart(&self, cart: Cart) -> store::Result<Cart> {
        lose_race(&self.save_conflicts, &cart)?;
        self.inner.save_cart(cart).await
    }
}

#[async_trait]
impl OrderStore for ContendedStore {
    async fn save_order(&self, order: Order) -> store::Result<Order> {
        self.inner.save_order(order).await
    }

    async fn find_orders_by_owner(&self, user: UserId) -> store::Result<Vec<Order>> {
        self.inner.find_orders_by_owner(user).await
    }

    async fn find_order(&self, id: OrderId) -> store::Result<Option<Order>> {
        self.inner.find_order(id).await
    }
}

#[async_trait]
impl CheckoutStore for ContendedStore {
    async fn checkout(&self, order: Order, cart: Cart) -> store::Result<(Order, Cart)> {
        lose_race(&self.checkout_conflicts, &cart)?;
        self.inner.checkout(order, cart).await
    }
}

fn contended_config() -> StorefrontConfig {
    StorefrontConfig {
        max_conflict_retries: 3,
    }
}

fn contended_service(conflicts: u32) -> CartService<ContendedStore, InMemoryCatalog> {
    CartService::new(ContendedStore::new(conflicts), lamp_catalog(), contended_config())
}

fn lamp_catalog() -> InMemoryCatalog {
    InMemoryCatalog::with_products([Product::new("LAMP", "Lamp", Money::new(dec!(50.00)))])
}

#[tokio::test]
async fn test_conflicts_within_budget_are_retried() {
    let service = contended_service(3);
    let identity = user(UserId::generate());

    let cart = service
        .add_item(&identity, &ProductId::new("LAMP"), 2)
        .await
        .unwrap();

    assert_eq!(cart.total_items(), 2);
}

#[tokio::test]
async fn test_conflicts_beyond_budget_surface() {
    let service = contended_service(4);
    let identity = user(UserId::generate());

    let result = service
        .add_item(&identity, &ProductId::new("LAMP"), 2)
        .await;

    assert!(matches!(result, Err(ServiceError::Conflict)));
    assert!(service.get_cart(&identity).await.unwrap().is_empty());
}

/// Cart service and checkout service sharing one contended store, with a
/// user whose cart holds two lamps.
async fn contended_checkout() -> (ContendedStore, CheckoutService<ContendedStore>, UserId) {
    let store = ContendedStore::new(0);
    let carts = CartService::new(store.clone(), lamp_catalog(), contended_config());
    let checkout = CheckoutService::new(store.clone(), contended_config());
    let user_id = UserId::generate();

    carts
        .add_item(&user(user_id), &ProductId::new("LAMP"), 2)
        .await
        .unwrap();
    (store, checkout, user_id)
}

#[tokio::test]
async fn test_checkout_conflicts_within_budget_are_retried() {
    let (store, checkout, user_id) = contended_checkout().await;
    store.arm_checkout_conflicts(3);

    let order = checkout.checkout(user_id).await.unwrap();

    assert_eq!(order.total_amount(), Money::new(dec!(100.00)));
    assert_eq!(store.inner.order_count().await, 1);
    let cart = store.find_cart_by_owner(user_id).await.unwrap().unwrap();
    assert!(cart.is_empty());
}

#[tokio::test]
async fn test_checkout_conflicts_beyond_budget_surface() {
    let (store, checkout, user_id) = contended_checkout().await;
    let before = store.find_cart_by_owner(user_id).await.unwrap().unwrap();
    store.arm_checkout_conflicts(4);

    let result = checkout.checkout(user_id).await;

    assert!(matches!(result, Err(ServiceError::Conflict)));
    assert_eq!(store.inner.order_count().await, 0);
    let after = store.find_cart_by_owner(user_id).await.unwrap().unwrap();
    assert_eq!(after, before);
    assert_eq!(after.total_items(), 2);
}

#[tokio::test]
async fn test_orders_belong_to_their_owner() {
    let h = TestHarness::new();
    let alice = UserId::generate();
    let bob = UserId::generate();

    h.carts
        .add_item(&user(alice), &ProductId::new("LAMP"), 1)
        .await
        .unwrap();
    let order = h.checkout.checkout(alice).await.unwrap();

    assert!(h.checkout.list_orders(bob).await.unwrap().is_empty());
    assert!(matches!(
        h.checkout.get_order(bob, order.id().unwrap()).await,
        Err(ServiceError::OrderNotFound(_))
    ));
    assert_eq!(
        h.store.find_orders_by_owner(alice).await.unwrap().len(),
        1
    );
}
