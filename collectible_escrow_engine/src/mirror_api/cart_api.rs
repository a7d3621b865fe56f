use log::*;

use crate::{
    mirror_api::{order_objects::NewCartLine, OrderFlowError},
    mirror_types::{Cart, CartLine, Product, ProductId},
    order_store::OrderStore,
};

/// The product catalog and the mirror's single shared cart.
#[derive(Debug, Clone)]
pub struct CartApi {
    store: OrderStore,
}

impl CartApi {
    pub fn new(store: OrderStore) -> Self {
        Self { store }
    }

    /// Adds a product to the catalog. Product ids are unique.
    pub async fn register_product(&self, product: Product) -> Result<(), OrderFlowError> {
        self.store
            .write(|state| {
                if state.product(product.id).is_some() {
                    return Err(OrderFlowError::InvalidInput(format!("Product {} is already listed.", product.id)));
                }
                debug!("🛒️ Listing {} ({}) at {}", product.id, product.name, product.price);
                state.products.push(product);
                Ok(())
            })
            .await
    }

    pub async fn products(&self) -> Vec<Product> {
        self.store.read(|state| state.products.clone()).await
    }

    pub async fn product(&self, id: ProductId) -> Result<Product, OrderFlowError> {
        self.store.read(|state| state.product(id).cloned().ok_or(OrderFlowError::ProductNotFound(id))).await
    }

    /// Adds a line to the cart, snapshotting the product as it is now. Adding a product that is already in the cart
    /// increases that line's quantity instead.
    pub async fn add_to_cart(&self, line: NewCartLine) -> Result<Cart, OrderFlowError> {
        self.store
            .write(|state| {
                let product =
                    state.product(line.product_id).cloned().ok_or(OrderFlowError::ProductNotFound(line.product_id))?;
                match state.cart.line_mut(line.product_id) {
                    Some(existing) => {
                        let quantity = existing.quantity.saturating_add(line.quantity);
                        NewCartLine::new(line.product_id, quantity)?;
                        existing.quantity = quantity;
                    },
                    None => state.cart.lines.push(CartLine::from_product(&product, line.quantity)),
                }
                trace!("🛒️ Cart now holds {} line(s)", state.cart.lines.len());
                Ok(state.cart.clone())
            })
            .await
    }

    /// Sets a line's quantity. A quantity of zero removes the line.
    pub async fn update_cart_quantity(&self, product_id: ProductId, quantity: u32) -> Result<Cart, OrderFlowError> {
        if quantity == 0 {
            return self.remove_from_cart(product_id).await;
        }
        let line = NewCartLine::new(product_id, quantity)?;
        self.store
            .write(|state| {
                let existing = state.cart.line_mut(product_id).ok_or(OrderFlowError::ProductNotFound(product_id))?;
                existing.quantity = line.quantity;
                Ok(state.cart.clone())
            })
            .await
    }

    pub async fn remove_from_cart(&self, product_id: ProductId) -> Result<Cart, OrderFlowError> {
        self.store
            .write(|state| {
                state.cart.lines.retain(|l| l.product_id != product_id);
                Ok(state.cart.clone())
            })
            .await
    }

    pub async fn cart(&self) -> Cart {
        self.store.read(|state| state.cart.clone()).await
    }
}
