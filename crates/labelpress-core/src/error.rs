use thiserror::Error;

#[derive(Error, Debug)]
pub enum LabelPressError {
    #[error("Failed to read source PDF: {0}")]
    UnreadableSource(String),

    #[error("No customer names found in the source PDF")]
    NoCustomersFound,

    #[error("Failed to write output PDF: {0}")]
    WriteFailure(String),

    #[error("Invalid customer record: {0}")]
    InvalidCustomer(String),

    #[error("Invalid layout configuration: {0}")]
    InvalidConfig(String),
}
