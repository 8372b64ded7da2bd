mod document_ref;
mod macros;
mod session_id;

pub use document_ref::DocumentRef;
pub use session_id::SessionId;
