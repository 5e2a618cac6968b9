use chrono::Utc;
use rand::{distributions::Alphanumeric, Rng};

/// Document number prefixes, one per document kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Requisition,
    Rfq,
    Quotation,
    PurchaseOrder,
    GoodsReceipt,
}

impl DocumentKind {
    pub fn prefix(self) -> &'static str {
        match self {
            DocumentKind::Requisition => "PR",
            DocumentKind::Rfq => "RFQ",
            DocumentKind::Quotation => "QT",
            DocumentKind::PurchaseOrder => "PO",
            DocumentKind::GoodsReceipt => "GR",
        }
    }
}

/// `PREFIX-YYYYMMDD-XXXXXX`; uniqueness is enforced by a unique index per kind.
pub fn next_document_number(kind: DocumentKind) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(|b| char::from(b).to_ascii_uppercase())
        .collect();
    format!("{}-{}-{}", kind.prefix(), Utc::now().format("%Y%m%d"), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_has_prefix_date_and_suffix() {
        let number = next_document_number(DocumentKind::GoodsReceipt);
        let parts: Vec<&str> = number.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "GR");
        assert_eq!(parts[1].len(), 8);
        assert_eq!(parts[2].len(), 6);
        assert!(parts[2].chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }
}
