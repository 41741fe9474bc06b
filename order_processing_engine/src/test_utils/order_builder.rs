use chrono::Utc;
use ops_common::Cents;
use rand::Rng;

use crate::order_types::{FoodOrder, OrderEvent, OrderId};

const MENU: [(&str, &str, i64); 4] =
    [("pizza", "margherita", 499), ("pizza", "quattro stagioni", 650), ("burger", "smash burger", 550), ("salad", "caesar", 420)];

/// Builds [`OrderEvent`]s for tests without drowning them in field soup.
pub struct OrderBuilder {
    order: OrderEvent,
}

impl OrderBuilder {
    pub fn new(order_id: &str) -> Self {
        let order = OrderEvent {
            order_id: OrderId::from(order_id.to_string()),
            user_id: "user-1".to_string(),
            address: "1 Test Lane".to_string(),
            food: None,
            total_amount: Cents::default(),
            create_time: None,
        };
        Self { order }
    }

    pub fn user_id(mut self, user_id: &str) -> Self {
        self.order.user_id = user_id.to_string();
        self
    }

    pub fn address(mut self, address: &str) -> Self {
        self.order.address = address.to_string();
        self
    }

    pub fn food(mut self, food: FoodOrder) -> Self {
        self.order.food = Some(food);
        self
    }

    pub fn total_amount(mut self, cents: i64) -> Self {
        self.order.total_amount = Cents::from(cents);
        self
    }

    pub fn created_now(mut self) -> Self {
        self.order.create_time = Some(Utc::now());
        self
    }

    pub fn build(self) -> OrderEvent {
        self.order
    }

    /// A fully populated order with a random id and a random item off the menu.
    pub fn random_order() -> OrderEvent {
        let mut rng = rand::thread_rng();
        let (kind, name, price) = MENU[rng.gen_range(0..MENU.len())];
        let quantity = rng.gen_range(1..=3u32);
        let price = Cents::from(price);
        let total: Cents = std::iter::repeat(price).take(quantity as usize).sum();
        let food = FoodOrder {
            kind: kind.to_string(),
            name: name.to_string(),
            toppings: vec![],
            quantity,
            price,
        };
        Self::new(&format!("order-{}", rng.gen::<u32>()))
            .user_id(&format!("user-{}", rng.gen::<u16>()))
            .address("42 Random Ave")
            .food(food)
            .total_amount(total.value())
            .created_now()
            .build()
    }
}
