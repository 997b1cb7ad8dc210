//! Customer records mined from label pages

use crate::error::LabelPressError;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// One customer harvested from a label's address block.
///
/// Equality and hashing look only at `name`; `address` and `order_info`
/// ride along for hosts that fill them in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub order_info: String,
}

impl CustomerRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: String::new(),
            order_info: String::new(),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_details(
        name: impl Into<String>,
        address: impl Into<String>,
        order_info: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            order_info: order_info.into(),
        }
    }
}

impl PartialEq for CustomerRecord {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for CustomerRecord {}

impl Hash for CustomerRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

/// Reject an empty customer list or any record without a usable name
pub fn validate_customers(customers: &[CustomerRecord]) -> Result<(), LabelPressError> {
    if customers.is_empty() {
        return Err(LabelPressError::NoCustomersFound);
    }

    if let Some(index) = customers.iter().position(|c| c.name.trim().is_empty()) {
        return Err(LabelPressError::InvalidCustomer(format!(
            "Customer at position {} has an empty name",
            index + 1
        )));
    }

    Ok(())
}
