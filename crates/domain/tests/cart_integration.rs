//! Integration tests for the cart service.
//!
//! These tests exercise add/remove against the in-memory store and check
//! stock conservation, line merging, rollback and the last-unit race.

use std::sync::Arc;

use common::{ItemId, Money};
use domain::{Caller, CartError, CartService, DomainError, ErrorKind};
use store::{
    InMemoryStore, InventoryStore, ItemCategory, NewItem, NewUser, Store, Transaction, UserRole,
    UserStatus, UserStore,
};

async fn create_customer(store: &InMemoryStore, email: &str) -> Caller {
    let mut tx = store.begin().await.unwrap();
    let user = tx
        .create_user(NewUser {
            first_name: "Test".to_string(),
            last_name: "Customer".to_string(),
            email: email.to_string(),
            role: UserRole::Customer,
            status: UserStatus::Active,
            password_hash: "hash".to_string(),
        })
        .await
        .unwrap();
    tx.commit().await.unwrap();
    Caller::customer(user.id)
}

async fn create_item(store: &InMemoryStore, name: &str, price_cents: i64, stock: i32) -> ItemId {
    let mut tx = store.begin().await.unwrap();
    let item = tx
        .create_item(NewItem {
            category: ItemCategory::Groceries,
            name: name.to_string(),
            price: Money::from_cents(price_cents),
            description: None,
            image: None,
            quantity: stock,
        })
        .await
        .unwrap();
    tx.commit().await.unwrap();
    item.id
}

struct Fixture {
    store: InMemoryStore,
    service: CartService<InMemoryStore>,
    customer: Caller,
}

async fn fixture() -> Fixture {
    let store = InMemoryStore::new();
    let customer = create_customer(&store, "customer@example.com").await;
    Fixture {
        service: CartService::new(store.clone()),
        store,
        customer,
    }
}

mod adding {
    use super::*;

    #[tokio::test]
    async fn stock_ten_add_two_then_three() {
        let f = fixture().await;
        let item_id = create_item(&f.store, "Coffee beans", 1200, 10).await;

        let cart = f.service.add_item(&f.customer, item_id, 2).await.unwrap();
        assert_eq!(f.store.item_quantity(item_id).await, Some(8));
        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.lines[0].quantity_in_cart, 2);

        let cart = f.service.add_item(&f.customer, item_id, 3).await.unwrap();
        assert_eq!(f.store.item_quantity(item_id).await, Some(5));
        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.lines[0].quantity_in_cart, 5);
        assert_eq!(cart.lines[0].item.quantity, 5);
        assert_eq!(cart.total_price, Money::from_cents(6000));
        assert_eq!(cart.customer_id, f.customer.user_id);
    }

    #[tokio::test]
    async fn identical_adds_consume_stock_twice() {
        let f = fixture().await;
        let item_id = create_item(&f.store, "Tea", 500, 6).await;

        f.service.add_item(&f.customer, item_id, 2).await.unwrap();
        f.service.add_item(&f.customer, item_id, 2).await.unwrap();

        assert_eq!(f.store.item_quantity(item_id).await, Some(2));
        let cart = f.service.get_cart(&f.customer).await.unwrap();
        assert_eq!(cart.lines[0].quantity_in_cart, 4);
    }

    #[tokio::test]
    async fn whole_stock_can_be_taken() {
        let f = fixture().await;
        let item_id = create_item(&f.store, "Rice", 300, 3).await;

        f.service.add_item(&f.customer, item_id, 3).await.unwrap();
        assert_eq!(f.store.item_quantity(item_id).await, Some(0));
    }

    #[tokio::test]
    async fn more_than_stock_is_rejected_without_mutation() {
        let f = fixture().await;
        let item_id = create_item(&f.store, "Flour", 250, 3).await;

        let err = f.service.add_item(&f.customer, item_id, 4).await.unwrap_err();
        assert!(matches!(
            err,
            DomainError::Cart(CartError::InsufficientQuantity {
                requested: 4,
                available: 3
            })
        ));
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(f.store.item_quantity(item_id).await, Some(3));
        assert_eq!(f.store.cart_count().await, 0);
    }

    #[tokio::test]
    async fn zero_stock_is_out_of_stock_for_any_quantity() {
        let f = fixture().await;
        let item_id = create_item(&f.store, "Saffron", 4000, 0).await;

        for quantity in [1, 5, 100] {
            let err = f
                .service
                .add_item(&f.customer, item_id, quantity)
                .await
                .unwrap_err();
            assert_eq!(err.code(), "OUT_OF_STOCK");
        }
        assert_eq!(f.store.item_quantity(item_id).await, Some(0));
    }

    #[tokio::test]
    async fn unknown_item_is_not_found() {
        let f = fixture().await;

        let err = f
            .service
            .add_item(&f.customer, ItemId::new(), 1)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "ITEM_NOT_FOUND");
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn distinct_items_get_distinct_lines() {
        let f = fixture().await;
        let milk = create_item(&f.store, "Milk", 150, 10).await;
        let bread = create_item(&f.store, "Bread", 325, 10).await;

        f.service.add_item(&f.customer, milk, 2).await.unwrap();
        let cart = f.service.add_item(&f.customer, bread, 1).await.unwrap();

        assert_eq!(cart.lines.len(), 2);
        assert_eq!(cart.line_for(milk).map(|l| l.quantity_in_cart), Some(2));
        assert_eq!(cart.line_for(bread).map(|l| l.quantity_in_cart), Some(1));
        assert_eq!(cart.total_price, Money::from_cents(625));
    }
}

mod removing {
    use super::*;

    #[tokio::test]
    async fn full_removal_empties_the_cart() {
        let f = fixture().await;
        let item_id = create_item(&f.store, "Oats", 400, 10).await;

        let cart = f.service.add_item(&f.customer, item_id, 5).await.unwrap();
        let line_id = cart.lines[0].line_item_id;

        let cart = f
            .service
            .remove_item(&f.customer, line_id, 5)
            .await
            .unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.total_price, Money::zero());
        assert_eq!(f.store.item_quantity(item_id).await, Some(10));
        assert_eq!(f.store.line_item_count().await, 0);

        // the line is gone for good
        let err = f
            .service
            .remove_item(&f.customer, line_id, 1)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "CART_LINE_ITEM_NOT_FOUND");
    }

    #[tokio::test]
    async fn partial_removal_decrements_in_place() {
        let f = fixture().await;
        let item_id = create_item(&f.store, "Honey", 900, 10).await;

        let cart = f.service.add_item(&f.customer, item_id, 5).await.unwrap();
        let line_id = cart.lines[0].line_item_id;

        let cart = f
            .service
            .remove_item(&f.customer, line_id, 2)
            .await
            .unwrap();
        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.lines[0].line_item_id, line_id);
        assert_eq!(cart.lines[0].quantity_in_cart, 3);
        assert_eq!(f.store.item_quantity(item_id).await, Some(7));
    }

    #[tokio::test]
    async fn add_then_remove_round_trips() {
        let f = fixture().await;
        let item_id = create_item(&f.store, "Pasta", 199, 7).await;

        let cart = f.service.add_item(&f.customer, item_id, 4).await.unwrap();
        f.service
            .remove_item(&f.customer, cart.lines[0].line_item_id, 4)
            .await
            .unwrap();

        assert_eq!(f.store.item_quantity(item_id).await, Some(7));
        assert_eq!(f.store.line_item_count().await, 0);
    }

    #[tokio::test]
    async fn more_than_in_cart_is_rejected_without_mutation() {
        let f = fixture().await;
        let item_id = create_item(&f.store, "Salt", 99, 10).await;

        let cart = f.service.add_item(&f.customer, item_id, 2).await.unwrap();
        let err = f
            .service
            .remove_item(&f.customer, cart.lines[0].line_item_id, 3)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::Cart(CartError::InsufficientCartQuantity {
                requested: 3,
                in_cart: 2
            })
        ));
        assert_eq!(f.store.item_quantity(item_id).await, Some(8));
        assert_eq!(f.service.get_cart(&f.customer).await.unwrap().lines[0].quantity_in_cart, 2);
    }
}

mod consistency {
    use super::*;

    #[tokio::test]
    async fn failed_line_write_rolls_back_the_stock_decrement() {
        let f = fixture().await;
        let item_id = create_item(&f.store, "Olive oil", 1500, 4).await;

        f.store.fail_next_line_item_write();
        let err = f.service.add_item(&f.customer, item_id, 2).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Data);

        assert_eq!(f.store.item_quantity(item_id).await, Some(4));
        assert_eq!(f.store.line_item_count().await, 0);
        // the lazily created cart went with it
        assert_eq!(f.store.cart_count().await, 0);
    }

    #[tokio::test]
    async fn failed_merge_rolls_back_the_stock_decrement() {
        let f = fixture().await;
        let item_id = create_item(&f.store, "Vinegar", 450, 4).await;
        f.service.add_item(&f.customer, item_id, 1).await.unwrap();

        f.store.fail_next_line_item_write();
        assert!(f.service.add_item(&f.customer, item_id, 2).await.is_err());

        assert_eq!(f.store.item_quantity(item_id).await, Some(3));
        let cart = f.service.get_cart(&f.customer).await.unwrap();
        assert_eq!(cart.lines[0].quantity_in_cart, 1);
    }

    #[tokio::test]
    async fn failed_partial_removal_rolls_back_the_restock() {
        let f = fixture().await;
        let item_id = create_item(&f.store, "Sugar", 220, 5).await;
        let cart = f.service.add_item(&f.customer, item_id, 3).await.unwrap();

        f.store.fail_next_line_item_write();
        assert!(
            f.service
                .remove_item(&f.customer, cart.lines[0].line_item_id, 1)
                .await
                .is_err()
        );

        assert_eq!(f.store.item_quantity(item_id).await, Some(2));
        let cart = f.service.get_cart(&f.customer).await.unwrap();
        assert_eq!(cart.lines[0].quantity_in_cart, 3);
    }

    #[tokio::test]
    async fn unrepresentable_cart_total_is_rejected_without_mutation() {
        let f = fixture().await;
        let item_id = create_item(&f.store, "Truffle", i64::MAX / 2 + 1, 5).await;

        let err = f.service.add_item(&f.customer, item_id, 2).await.unwrap_err();
        assert!(matches!(err, DomainError::Cart(CartError::TotalOverflow)));
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(f.store.item_quantity(item_id).await, Some(5));
        assert_eq!(f.store.cart_count().await, 0);

        // one unit still fits, merging a second does not
        f.service.add_item(&f.customer, item_id, 1).await.unwrap();
        let err = f.service.add_item(&f.customer, item_id, 1).await.unwrap_err();
        assert_eq!(err.code(), "CART_TOTAL_OVERFLOW");
        assert_eq!(f.store.item_quantity(item_id).await, Some(4));
        let cart = f.service.get_cart(&f.customer).await.unwrap();
        assert_eq!(cart.lines[0].quantity_in_cart, 1);
    }

    #[tokio::test]
    async fn item_deleted_before_the_decrement_is_not_found() {
        let f = fixture().await;
        let item_id = create_item(&f.store, "Honey", 900, 5).await;

        f.store.miss_next_stock_update();
        let err = f.service.add_item(&f.customer, item_id, 2).await.unwrap_err();
        assert!(matches!(
            err,
            DomainError::Cart(CartError::ItemNotFound { item_id: id }) if id == item_id
        ));
        assert_eq!(f.store.item_quantity(item_id).await, Some(5));
        assert_eq!(f.store.line_item_count().await, 0);
        assert_eq!(f.store.cart_count().await, 0);
    }

    #[tokio::test]
    async fn removal_of_a_deleted_item_still_reduces_the_line() {
        let f = fixture().await;
        let item_id = create_item(&f.store, "Jam", 400, 5).await;
        let cart = f.service.add_item(&f.customer, item_id, 3).await.unwrap();

        f.store.miss_next_stock_update();
        let cart = f
            .service
            .remove_item(&f.customer, cart.lines[0].line_item_id, 1)
            .await
            .unwrap();
        assert_eq!(cart.lines[0].quantity_in_cart, 2);
        assert_eq!(f.store.item_quantity(item_id).await, Some(2));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn last_unit_goes_to_exactly_one_customer() {
        let store = InMemoryStore::new();
        let item_id = create_item(&store, "Last croissant", 350, 1).await;
        let alice = create_customer(&store, "alice@example.com").await;
        let bob = create_customer(&store, "bob@example.com").await;
        let service = Arc::new(CartService::new(store.clone()));

        let a = tokio::spawn({
            let service = service.clone();
            async move { service.add_item(&alice, item_id, 1).await }
        });
        let b = tokio::spawn({
            let service = service.clone();
            async move { service.add_item(&bob, item_id, 1).await }
        });
        let results = [a.await.unwrap(), b.await.unwrap()];

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        let loser = results
            .into_iter()
            .find_map(Result::err)
            .expect("one add must fail");
        assert!(
            matches!(loser.code(), "OUT_OF_STOCK" | "INSUFFICIENT_QUANTITY" | "DATA_ERROR"),
            "unexpected failure: {loser}"
        );
        assert_eq!(store.item_quantity(item_id).await, Some(0));
        assert_eq!(store.line_item_count().await, 1);
    }

    #[tokio::test]
    async fn units_are_conserved_across_customers() {
        let store = InMemoryStore::new();
        let item_id = create_item(&store, "Eggs", 299, 20).await;
        let service = CartService::new(store.clone());
        let mut in_carts = 0;

        for (n, email) in ["a@example.com", "b@example.com", "c@example.com"]
            .into_iter()
            .enumerate()
        {
            let caller = create_customer(&store, email).await;
            let quantity = n as i32 + 2;
            let cart = service.add_item(&caller, item_id, quantity).await.unwrap();
            in_carts += quantity;

            if n == 1 {
                service
                    .remove_item(&caller, cart.lines[0].line_item_id, 1)
                    .await
                    .unwrap();
                in_carts -= 1;
            }
        }

        assert_eq!(store.item_quantity(item_id).await, Some(20 - in_carts));
    }
}
