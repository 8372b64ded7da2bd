pub mod document_manager;
pub mod signature_format;
