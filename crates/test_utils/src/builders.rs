//! Test Data Builders
//!
//! Provides builder patterns for constructing sales, purchases and employees
//! with sensible defaults. Tests specify only the relevant fields.

use fake::faker::name::en::Name;
use fake::Fake;

use core_kernel::{Money, ProductId, UserId};
use domain_ledger::{PaymentMethod, Purchase, PurchaseLine, Sale, SaleLine, SaleStatus};
use domain_payroll::{Employee, EmployeeRole};

use crate::fixtures::{MoneyFixtures, StringFixtures};

/// Builder for constructing test sales
pub struct TestSaleBuilder {
    invoice_number: String,
    payment_method: PaymentMethod,
    lines: Vec<SaleLine>,
    status: SaleStatus,
    online: bool,
    cashier: Option<UserId>,
}

impl Default for TestSaleBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestSaleBuilder {
    /// Creates a pending offline cash sale with no lines
    pub fn new() -> Self {
        Self {
            invoice_number: StringFixtures::invoice_number().to_string(),
            payment_method: PaymentMethod::Cash,
            lines: Vec::new(),
            status: SaleStatus::Pending,
            online: false,
            cashier: None,
        }
    }

    pub fn with_invoice_number(mut self, number: impl Into<String>) -> Self {
        self.invoice_number = number.into();
        self
    }

    pub fn paid_with(mut self, method: PaymentMethod) -> Self {
        self.payment_method = method;
        self
    }

    /// Adds a line at the standard rice price without a cost basis
    pub fn with_line(mut self, product: ProductId, quantity: i64) -> Self {
        self.lines.push(SaleLine::new(product, quantity, MoneyFixtures::rice_price()));
        self
    }

    /// Adds a line with an explicit price and unit cost
    pub fn with_costed_line(mut self, product: ProductId, quantity: i64, price: Money, cost: Money) -> Self {
        self.lines.push(SaleLine::new(product, quantity, price).with_unit_cost(cost));
        self
    }

    /// Adds a single line whose subtotal is exactly `amount`
    pub fn with_amount(mut self, product: ProductId, amount: Money) -> Self {
        self.lines.push(SaleLine::new(product, 1, amount));
        self
    }

    pub fn with_status(mut self, status: SaleStatus) -> Self {
        self.status = status;
        self
    }

    pub fn online(mut self) -> Self {
        self.online = true;
        self
    }

    pub fn with_cashier(mut self, cashier: UserId) -> Self {
        self.cashier = Some(cashier);
        self
    }

    pub fn build(self) -> Sale {
        let mut sale = Sale::new(self.invoice_number, self.payment_method, self.lines).with_status(self.status);
        if self.online {
            sale = sale.online();
        }
        if let Some(cashier) = self.cashier {
            sale = sale.with_cashier(cashier);
        }
        sale
    }
}

/// Builder for constructing test purchases
pub struct TestPurchaseBuilder {
    reference_number: String,
    supplier: String,
    payment_method: PaymentMethod,
    lines: Vec<PurchaseLine>,
    buyer: Option<UserId>,
}

impl Default for TestPurchaseBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestPurchaseBuilder {
    pub fn new() -> Self {
        Self {
            reference_number: StringFixtures::purchase_number().to_string(),
            supplier: StringFixtures::supplier().to_string(),
            payment_method: PaymentMethod::Cash,
            lines: Vec::new(),
            buyer: None,
        }
    }

    pub fn paid_with(mut self, method: PaymentMethod) -> Self {
        self.payment_method = method;
        self
    }

    /// Adds a line at the standard rice cost
    pub fn with_line(mut self, product: ProductId, quantity: i64) -> Self {
        self.lines.push(PurchaseLine::new(product, quantity, MoneyFixtures::rice_cost()));
        self
    }

    pub fn with_buyer(mut self, buyer: UserId) -> Self {
        self.buyer = Some(buyer);
        self
    }

    pub fn build(self) -> Purchase {
        let purchase = Purchase::new(self.reference_number, self.supplier, self.payment_method, self.lines);
        match self.buyer {
            Some(buyer) => purchase.with_buyer(buyer),
            None => purchase,
        }
    }
}

/// Builder for constructing test employees
pub struct TestEmployeeBuilder {
    user_id: UserId,
    name: String,
    role: EmployeeRole,
    base_salary: Option<Money>,
    allowance: Option<Money>,
}

impl TestEmployeeBuilder {
    pub fn new(role: EmployeeRole) -> Self {
        Self {
            user_id: UserId::new(),
            name: Name().fake(),
            role,
            base_salary: None,
            allowance: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_base_salary(mut self, salary: Money) -> Self {
        self.base_salary = Some(salary);
        self
    }

    pub fn with_allowance(mut self, allowance: Money) -> Self {
        self.allowance = Some(allowance);
        self
    }

    pub fn build(self) -> Employee {
        let mut employee = Employee::new(self.user_id, self.name, self.role);
        if let Some(salary) = self.base_salary {
            employee = employee.with_base_salary(salary);
        }
        if let Some(allowance) = self.allowance {
            employee = employee.with_allowance(allowance);
        }
        employee
    }
}
