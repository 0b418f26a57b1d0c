//! Stock ledger.
//!
//! Keeps `stock >= 0` and `status == OutOfStock <=> stock == 0` (unless an admin put
//! the product in `Inactive`). All functions mutate a product in place and return the
//! effects the change calls for; nothing here performs I/O.

use uuid::Uuid;

use crate::{
    effects::Effects,
    models::{AdminLogType, MAX_STOCK, NewAdminLog, Product, ProductStatus},
    notify::EmailMessage,
};

/// What drove a zero crossing; only changes the wording of mails and log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockTrigger {
    Order,
    AdminEdit,
}

pub fn out_of_stock_notice(product: &Product, trigger: StockTrigger, operator_email: &str) -> EmailMessage {
    let cause = match trigger {
        StockTrigger::Order => "after an order",
        StockTrigger::AdminEdit => "due to admin update",
    };
    EmailMessage {
        to: operator_email.to_string(),
        subject: format!("Product Out of Stock: {}", product.name),
        body: format!(
            "The product \"{}\" (ID: {}) is now out of stock {cause}.",
            product.name, product.id
        ),
    }
}

/// Decrement stock for a consumed line item.
///
/// Stock floors at zero. Reaching zero from any status other than `OutOfStock`
/// flips the status and queues exactly one notice and one `OUT_OF_STOCK` entry;
/// a product that is already `OutOfStock` produces nothing.
pub fn apply_consumption(
    product: &mut Product,
    quantity: i64,
    acting_user: Uuid,
    operator_email: &str,
) -> Effects {
    let mut effects = Effects::new();
    let previous_stock = product.stock;
    product.stock = (product.stock - quantity).max(0);

    if product.stock == 0 && product.status != ProductStatus::OutOfStock {
        product.status = ProductStatus::OutOfStock;
        effects.notify(out_of_stock_notice(product, StockTrigger::Order, operator_email));
        effects.admin_log(NewAdminLog::for_product(
            AdminLogType::OutOfStock,
            product,
            "Product went out of stock after order.",
            acting_user,
        ));
    } else if product.stock > 0
        && product.status == ProductStatus::OutOfStock
        && previous_stock == 0
    {
        product.status = ProductStatus::Active;
    }

    effects
}

/// Give stock back from a deleted order. Status is left untouched.
pub fn restore_stock(product: &mut Product, quantity: i64) {
    product.stock = product.stock.saturating_add(quantity.max(0));
    if product.stock > MAX_STOCK {
        tracing::debug!(
            product_id = %product.id,
            stock = product.stock,
            max = MAX_STOCK,
            "restored stock exceeds the editable maximum"
        );
    }
}

/// Apply an absolute stock value set by an admin.
///
/// `previous_status` is the status stored before the edit; crossings are detected
/// against it. Going to zero queues a notice and an `OUT_OF_STOCK` entry, coming
/// back from `OutOfStock` reactivates the product and queues a `RESTOCKED` entry.
pub fn apply_admin_stock(
    product: &mut Product,
    requested: i64,
    previous_status: ProductStatus,
    acting_user: Uuid,
    operator_email: &str,
) -> Effects {
    let mut effects = Effects::new();
    let new_stock = requested.max(0);
    product.stock = new_stock;

    if new_stock == 0 && previous_status != ProductStatus::OutOfStock {
        product.status = ProductStatus::OutOfStock;
        effects.notify(out_of_stock_notice(product, StockTrigger::AdminEdit, operator_email));
        effects.admin_log(NewAdminLog::for_product(
            AdminLogType::OutOfStock,
            product,
            "Product manually updated to stock 0 by admin.",
            acting_user,
        ));
    } else if new_stock > 0 && previous_status == ProductStatus::OutOfStock {
        product.status = ProductStatus::Active;
        effects.admin_log(NewAdminLog::for_product(
            AdminLogType::Restocked,
            product,
            "Product manually restocked by admin.",
            acting_user,
        ));
    }

    effects
}

/// True when status and stock agree. `Inactive` is a manual override and always passes.
pub fn status_consistent(product: &Product) -> bool {
    match product.status {
        ProductStatus::Inactive => true,
        ProductStatus::OutOfStock => product.stock == 0,
        ProductStatus::Active => product.stock > 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::product;

    const OPS: &str = "ops@example.com";

    #[test]
    fn consuming_last_units_flips_status_once() {
        let admin = Uuid::new_v4();
        let mut p = product("Lamp", 40, 3);

        let effects = apply_consumption(&mut p, 3, admin, OPS);
        assert_eq!(p.stock, 0);
        assert_eq!(p.status, ProductStatus::OutOfStock);
        assert_eq!(effects.notifications().count(), 1);
        let logs: Vec<_> = effects.admin_logs().collect();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].log_type, AdminLogType::OutOfStock);
        assert_eq!(logs[0].triggered_by, admin);
        assert_eq!(effects.notifications().next().unwrap().to, OPS);

        let again = apply_consumption(&mut p, 1, admin, OPS);
        assert_eq!(p.stock, 0);
        assert!(again.is_empty());
    }

    #[test]
    fn consumption_never_goes_negative() {
        let mut p = product("Lamp", 40, 2);
        apply_consumption(&mut p, 10, Uuid::new_v4(), OPS);
        assert_eq!(p.stock, 0);
        assert!(status_consistent(&p));
    }

    #[test]
    fn partial_consumption_keeps_product_active() {
        let mut p = product("Lamp", 40, 5);
        let effects = apply_consumption(&mut p, 2, Uuid::new_v4(), OPS);
        assert_eq!(p.stock, 3);
        assert_eq!(p.status, ProductStatus::Active);
        assert!(effects.is_empty());
    }

    #[test]
    fn inactive_product_drained_by_order_becomes_out_of_stock() {
        let mut p = product("Lamp", 40, 1);
        p.status = ProductStatus::Inactive;
        let effects = apply_consumption(&mut p, 1, Uuid::new_v4(), OPS);
        assert_eq!(p.status, ProductStatus::OutOfStock);
        assert_eq!(effects.notifications().count(), 1);
    }

    #[test]
    fn restore_does_not_touch_status() {
        let mut p = product("Lamp", 40, 0);
        p.status = ProductStatus::OutOfStock;
        restore_stock(&mut p, 4);
        assert_eq!(p.stock, 4);
        assert_eq!(p.status, ProductStatus::OutOfStock);
    }

    #[test]
    fn restore_may_exceed_the_editable_maximum() {
        let mut p = product("Lamp", 40, MAX_STOCK);
        restore_stock(&mut p, 3);
        assert_eq!(p.stock, MAX_STOCK + 3);
        assert_eq!(p.status, ProductStatus::Active);
    }

    #[test]
    fn admin_zero_on_out_of_stock_product_is_silent() {
        let mut p = product("Lamp", 40, 0);
        p.status = ProductStatus::OutOfStock;
        let effects = apply_admin_stock(&mut p, 0, ProductStatus::OutOfStock, Uuid::new_v4(), OPS);
        assert!(effects.is_empty());
        assert_eq!(p.status, ProductStatus::OutOfStock);
    }

    #[test]
    fn admin_restock_reactivates_and_logs() {
        let mut p = product("Lamp", 40, 0);
        p.status = ProductStatus::OutOfStock;
        let effects = apply_admin_stock(&mut p, 7, ProductStatus::OutOfStock, Uuid::new_v4(), OPS);
        assert_eq!(p.stock, 7);
        assert_eq!(p.status, ProductStatus::Active);
        assert_eq!(effects.notifications().count(), 0);
        let logs: Vec<_> = effects.admin_logs().collect();
        assert_eq!(logs[0].log_type, AdminLogType::Restocked);
    }

    #[test]
    fn admin_negative_stock_clamps_to_zero_and_notifies() {
        let mut p = product("Lamp", 40, 9);
        let effects = apply_admin_stock(&mut p, -3, ProductStatus::Active, Uuid::new_v4(), OPS);
        assert_eq!(p.stock, 0);
        assert_eq!(p.status, ProductStatus::OutOfStock);
        assert_eq!(effects.notifications().count(), 1);
        assert!(effects.notifications().next().unwrap().body.contains("admin update"));
    }

    #[test]
    fn status_consistency_rules() {
        let mut p = product("Lamp", 40, 0);
        p.status = ProductStatus::Active;
        assert!(!status_consistent(&p));
        p.status = ProductStatus::Inactive;
        assert!(status_consistent(&p));
        p.stock = 3;
        p.status = ProductStatus::OutOfStock;
        assert!(!status_consistent(&p));
    }
}
