//! Stock Ledger service
//!
//! Every quantity change runs inside a unit of work that locks the affected
//! product rows first. Multi-product plans lock in product id order so two
//! sales touching the same products cannot deadlock.

use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, instrument};

use core_kernel::{PortError, ProductId, UserId};
use domain_inventory::{
    verify_chain, MovementContext, MovementKind, MovementRequest, PlannedMovement, Product,
    StockMovement,
};

use crate::error::LedgerError;
use crate::ports::{LedgerStore, LedgerUnitOfWork};

/// Applies planned movements in order under product row locks
pub(crate) async fn apply_plan(
    uow: &mut dyn LedgerUnitOfWork,
    plan: &[PlannedMovement],
    description: &str,
    user: Option<UserId>,
    context: &MovementContext,
) -> Result<Vec<StockMovement>, LedgerError> {
    let mut ids: Vec<ProductId> = plan.iter().map(|step| step.product_id).collect();
    ids.sort();
    ids.dedup();

    let mut products = BTreeMap::new();
    for id in ids {
        products.insert(id, uow.lock_product(id).await?);
    }

    let mut movements = Vec::with_capacity(plan.len());
    for step in plan {
        let product = products
            .get_mut(&step.product_id)
            .ok_or_else(|| PortError::not_found("Product", step.product_id))?;
        let mut request = MovementRequest::new(step.kind, step.quantity, description).by(user);
        request.context = context.clone();
        movements.push(product.apply(request)?);
    }

    for product in products.values() {
        uow.save_product_stock(product).await?;
    }
    for movement in &movements {
        uow.append_stock_movement(movement).await?;
    }

    Ok(movements)
}

/// Service for manual stock operations and stock queries
///
/// # Example
///
/// ```rust,ignore
/// use domain_ledger::StockLedger;
///
/// let stock = StockLedger::new(store);
/// let (product, _) = stock.register_product(product, 40, Some(owner)).await?;
/// stock.reduce_stock(product.id, 3, Some(cashier)).await?;
/// stock.verify_product(product.id).await?;
/// ```
#[derive(Clone)]
pub struct StockLedger {
    store: Arc<dyn LedgerStore>,
}

impl StockLedger {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Registers a product and books its opening stock as an `initial` movement
    ///
    /// # Arguments
    ///
    /// * `product` - The product to insert; its `stock` field is ignored
    /// * `opening_stock` - Units on the shelf at registration
    /// * `user` - Who registered it
    ///
    /// # Returns
    ///
    /// The stored product and its opening movement, if the opening stock is non-zero
    #[instrument(skip(self, product), fields(sku = %product.sku))]
    pub async fn register_product(
        &self,
        mut product: Product,
        opening_stock: i64,
        user: Option<UserId>,
    ) -> Result<(Product, Option<StockMovement>), LedgerError> {
        let mut uow = self.store.begin().await?;
        product.stock = 0;
        uow.insert_product(&product).await?;

        let movement = if opening_stock != 0 {
            let movement = product.apply(
                MovementRequest::new(MovementKind::Initial, opening_stock, "Opening stock").by(user),
            )?;
            uow.save_product_stock(&product).await?;
            uow.append_stock_movement(&movement).await?;
            Some(movement)
        } else {
            None
        };

        uow.commit().await?;
        info!(product = %product.id, opening_stock, "Product registered");
        Ok((product, movement))
    }

    /// Records one movement of any kind
    ///
    /// `quantity` is signed and must match the kind's sign rule, so damage is
    /// booked as a negative quantity and intake as a positive one.
    #[instrument(skip(self, description))]
    pub async fn record_movement(
        &self,
        product_id: ProductId,
        kind: MovementKind,
        quantity: i64,
        description: impl Into<String>,
        user: Option<UserId>,
    ) -> Result<StockMovement, LedgerError> {
        let request = MovementRequest::new(kind, quantity, description).by(user);
        self.apply_single(product_id, request).await
    }

    /// Removes `quantity` units, failing rather than going negative
    pub async fn reduce_stock(
        &self,
        product_id: ProductId,
        quantity: i64,
        user: Option<UserId>,
    ) -> Result<StockMovement, LedgerError> {
        self.apply_single(product_id, MovementRequest::sale_out(quantity, "Stock reduced").by(user))
            .await
    }

    /// Puts `quantity` units back with a `return` movement
    pub async fn restore_stock(
        &self,
        product_id: ProductId,
        quantity: i64,
        user: Option<UserId>,
    ) -> Result<StockMovement, LedgerError> {
        self.apply_single(product_id, MovementRequest::returned(quantity, "Stock restored").by(user))
            .await
    }

    pub async fn product(&self, product_id: ProductId) -> Result<Product, LedgerError> {
        Ok(self.store.get_product(product_id).await?)
    }

    pub async fn movements(&self, product_id: ProductId) -> Result<Vec<StockMovement>, LedgerError> {
        Ok(self.store.stock_movements(product_id).await?)
    }

    /// Checks the movement chain and that it ends at the live stock
    ///
    /// # Returns
    ///
    /// The verified movement history, oldest first
    ///
    /// # Errors
    ///
    /// `Chain` when two movements do not link up, `Port(Validation)` when the
    /// last movement disagrees with the product's stock.
    #[instrument(skip(self))]
    pub async fn verify_product(&self, product_id: ProductId) -> Result<Vec<StockMovement>, LedgerError> {
        let product = self.store.get_product(product_id).await?;
        let movements = self.store.stock_movements(product_id).await?;
        verify_chain(&movements)?;

        let chain_end = movements.last().map_or(0, |m| m.stock_after);
        if chain_end != product.stock {
            return Err(PortError::validation(format!(
                "stock of {} is {} but its movements end at {}",
                product.sku, product.stock, chain_end
            ))
            .into());
        }
        Ok(movements)
    }

    async fn apply_single(
        &self,
        product_id: ProductId,
        request: MovementRequest,
    ) -> Result<StockMovement, LedgerError> {
        let mut uow = self.store.begin().await?;
        let mut product = uow.lock_product(product_id).await?;
        let movement = product.apply(request)?;
        uow.save_product_stock(&product).await?;
        uow.append_stock_movement(&movement).await?;
        uow.commit().await?;

        info!(
            product = %product_id,
            kind = %movement.kind,
            quantity = movement.quantity,
            stock_after = movement.stock_after,
            "Stock movement recorded"
        );
        Ok(movement)
    }
}
