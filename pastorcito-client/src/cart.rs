//! 购物车：顾客下单前在本地组装的订单行

use shared::models::Product;
use shared::order::{
    LineItemInput, MAX_QUANTITY, OrderSubmission, PaymentMethod, ServiceType, format_money,
    order_total,
};

use crate::{ClientError, ClientResult};

#[derive(Debug, Clone, Default)]
pub struct Cart {
    items: Vec<LineItemInput>,
}

fn check_quantity(quantity: i32) -> ClientResult<()> {
    if quantity <= 0 || quantity > MAX_QUANTITY {
        return Err(ClientError::Validation(format!(
            "quantity must be between 1 and {MAX_QUANTITY}, got {quantity}"
        )));
    }
    Ok(())
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[LineItemInput] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total number of units across all lines
    pub fn item_count(&self) -> i32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// 运行总价
    pub fn total(&self) -> f64 {
        order_total(&self.items)
    }

    pub fn display_total(&self) -> String {
        format_money(self.total())
    }

    /// Add a product at its current price.
    ///
    /// A line with the same product and sauces and no note is merged.
    pub fn add(&mut self, product: &Product, quantity: i32, sauces: Vec<String>) -> ClientResult<()> {
        check_quantity(quantity)?;

        if let Some(line) = self.items.iter_mut().find(|i| {
            i.product_id == product.id && i.sauces == sauces && i.note.is_none()
        }) {
            let merged = line.quantity + quantity;
            check_quantity(merged)?;
            line.quantity = merged;
            return Ok(());
        }

        self.items.push(LineItemInput {
            product_id: product.id,
            quantity,
            unit_price: product.price,
            sauces,
            note: None,
        });
        Ok(())
    }

    /// Set a line's quantity; zero removes the line
    pub fn set_quantity(&mut self, index: usize, quantity: i32) -> ClientResult<()> {
        if quantity == 0 {
            self.remove(index);
            return Ok(());
        }
        check_quantity(quantity)?;
        let line = self
            .items
            .get_mut(index)
            .ok_or_else(|| ClientError::Validation(format!("no cart line at {index}")))?;
        line.quantity = quantity;
        Ok(())
    }

    pub fn set_note(&mut self, index: usize, note: Option<String>) {
        if let Some(line) = self.items.get_mut(index) {
            line.note = note.filter(|n| !n.trim().is_empty());
        }
    }

    pub fn remove(&mut self, index: usize) -> Option<LineItemInput> {
        (index < self.items.len()).then(|| self.items.remove(index))
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// 生成提交载荷，购物车清空
    pub fn checkout(
        &mut self,
        service_type: ServiceType,
        payment_method: PaymentMethod,
        client_id: Option<i64>,
        table_id: Option<i64>,
    ) -> ClientResult<OrderSubmission> {
        if self.items.is_empty() {
            return Err(ClientError::Validation("cart is empty".into()));
        }
        Ok(OrderSubmission {
            client_id,
            table_id,
            service_type,
            payment_method,
            items: std::mem::take(&mut self.items),
            note: None,
        })
    }
}
