use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus{
    Pending,
    Paid,
    Shipping,
    Delivered,
    Cancelled,
    Returned
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Shipping => "shipping",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Returned => "returned"
        }
    }

    pub fn parse(value: &str) -> Option<OrderStatus> {
        match value {
            "pending" => Some(OrderStatus::Pending),
            "paid" => Some(OrderStatus::Paid),
            "shipping" => Some(OrderStatus::Shipping),
            "delivered" => Some(OrderStatus::Delivered),
            "cancelled" => Some(OrderStatus::Cancelled),
            "returned" => Some(OrderStatus::Returned),
            _ => None
        }
    }

    // Transitions an admin (or a reconciliation job) may apply
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;

        matches!(
            (self, next),
            (Pending, Paid)
                | (Pending, Shipping)
                | (Pending, Cancelled)
                | (Paid, Shipping)
                | (Paid, Cancelled)
                | (Shipping, Delivered)
                | (Shipping, Returned)
        )
    }

    // Stock reserved by the order goes back to the shelf
    pub fn releases_stock(&self) -> bool {
        matches!(self, OrderStatus::Cancelled | OrderStatus::Returned)
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod{
    Cod,
    Vnpay
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cod => "cod",
            PaymentMethod::Vnpay => "vnpay"
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus{
    Success,
    Failed
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Success => "success",
            PaymentStatus::Failed => "failed"
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DiscountKind{
    Percent,
    Fixed
}

impl DiscountKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscountKind::Percent => "percent",
            DiscountKind::Fixed => "fixed"
        }
    }

    pub fn parse(value: &str) -> Option<DiscountKind> {
        match value {
            "percent" => Some(DiscountKind::Percent),
            "fixed" => Some(DiscountKind::Fixed),
            _ => None
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AccountRole{
    Customer,
    Seller,
    Admin
}

impl AccountRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountRole::Customer => "customer",
            AccountRole::Seller => "seller",
            AccountRole::Admin => "admin"
        }
    }

    pub fn parse(value: &str) -> Option<AccountRole> {
        match value {
            "customer" => Some(AccountRole::Customer),
            "seller" => Some(AccountRole::Seller),
            "admin" => Some(AccountRole::Admin),
            _ => None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountStatus{
    Pending,
    Confirmed
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Pending => "pending",
            AccountStatus::Confirmed => "confirmed"
        }
    }
}
