use serde::{Deserialize, Serialize};

/// Token the ledger replaces with the resource id created by the preceding item.
pub const RESOURCE_ID_PLACEHOLDER: &str = "$.resourceId";

/// One operation of a ledger batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItem {
    pub relative_url: String,
    /// Serialized JSON request body.
    pub body: String,
    /// The item references the resource created by the item right before it.
    pub resource_id_dependent: bool,
}

/// An ordered list of items submitted as a single all-or-nothing unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Batch {
    tenant: String,
    items: Vec<BatchItem>,
}

impl Batch {
    pub fn tenant(&self) -> &str {
        &self.tenant
    }

    pub fn items(&self) -> &[BatchItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Accumulates batch items for one in-flight job.
///
/// A builder is owned by exactly one job and consumed by [`finish`](Self::finish).
#[derive(Debug)]
pub struct BatchItemBuilder {
    tenant: String,
    items: Vec<BatchItem>,
}

impl BatchItemBuilder {
    pub fn begin(tenant: impl Into<String>) -> Self {
        Self {
            tenant: tenant.into(),
            items: Vec::new(),
        }
    }

    /// Appends one item, keeping call order. The body is not inspected.
    pub fn append(
        &mut self,
        relative_url: impl Into<String>,
        body: impl Into<String>,
        resource_id_dependent: bool,
    ) -> &mut Self {
        self.items.push(BatchItem {
            relative_url: relative_url.into(),
            body: body.into(),
            resource_id_dependent,
        });
        self
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn finish(self) -> Batch {
        Batch {
            tenant: self.tenant,
            items: self.items,
        }
    }
}
